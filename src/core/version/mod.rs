pub mod installer;
pub mod manifest;
pub mod version_file;

pub use installer::{InstallResult, LoaderRequest, VersionInstaller};
pub use manifest::{ReleaseType, VersionDescriptor, VersionEntry, VersionManifest};
pub use version_file::{evaluate_rules, Library, LibraryArtifact, OsName, VersionDetail};

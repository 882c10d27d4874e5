pub mod context;
pub mod fabric;
pub mod installer;
pub mod versions;

pub use context::InstallContext;
pub use installer::{read_marker, write_marker, Installer, LoaderInstallResult, LoaderInstaller};
pub use versions::{list_loader_versions, LoaderVersion};

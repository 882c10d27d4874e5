pub mod client;
pub mod models;

pub use client::{RegistryClient, SearchQuery};
pub use models::{
    newest_for, Dependency, DependencyType, FileHashes, Project, ProjectVersion, SearchHit,
    SearchResponse, VersionFile,
};

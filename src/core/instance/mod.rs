pub mod model;
pub mod workspace;

pub use model::{LoaderType, Profile};
pub use workspace::{ProfileDirs, WORKSPACE_SUBDIRS};

use std::path::Path;

use crate::core::downloader::FetchClient;
use crate::core::state::Endpoints;

/// Everything a loader installer needs.
/// Grows without breaking the installer signatures.
pub struct InstallContext<'a> {
    pub minecraft_version: &'a str,
    pub loader_version: &'a str,
    pub version_dir: &'a Path,
    pub libs_dir: &'a Path,
    pub fetch: &'a FetchClient,
    pub endpoints: &'a Endpoints,
}

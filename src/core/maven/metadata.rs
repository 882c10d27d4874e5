use quick_xml::de::from_str;
use serde::Deserialize;

use crate::core::error::LauncherResult;

/// `maven-metadata.xml` — only the version listing is read.
#[derive(Debug, Deserialize, Default)]
pub struct MavenMetadata {
    #[serde(default)]
    pub versioning: Versioning,
}

#[derive(Debug, Deserialize, Default)]
pub struct Versioning {
    #[serde(default)]
    pub latest: Option<String>,
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub versions: Versions,
}

#[derive(Debug, Deserialize, Default)]
pub struct Versions {
    #[serde(default, rename = "version")]
    pub items: Vec<String>,
}

impl MavenMetadata {
    pub fn parse(xml: &str) -> LauncherResult<Self> {
        Ok(from_str(xml)?)
    }

    /// Versions in publication order (oldest first, as Maven lists them).
    pub fn versions(&self) -> &[String] {
        &self.versioning.versions.items
    }
}

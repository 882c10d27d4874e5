use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};

/// A parsed Maven coordinate: `group:artifact:version[:classifier][@ext]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MavenArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    /// File extension, `jar` unless the coordinate says otherwise.
    pub extension: String,
}

impl MavenArtifact {
    pub fn parse(coord: &str) -> LauncherResult<Self> {
        let invalid = || LauncherError::InvalidMavenCoordinate(coord.to_string());

        let (gav, extension) = match coord.split_once('@') {
            Some((gav, ext)) if !ext.is_empty() => (gav, ext),
            Some(_) => return Err(invalid()),
            None => (coord, "jar"),
        };

        let mut parts = gav.split(':');
        let group_id = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let artifact_id = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let version = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let classifier = parts.next().map(str::to_string);
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            classifier,
            extension: extension.to_string(),
        })
    }

    pub fn filename(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}-{}-{}.{}", self.artifact_id, self.version, c, self.extension),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.extension),
        }
    }

    /// `net/fabricmc/fabric-loader/0.15.7/fabric-loader-0.15.7.jar`, always with `/`.
    pub fn repository_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group_id.replace('.', "/"),
            self.artifact_id,
            self.version,
            self.filename()
        )
    }

    /// Same layout as `repository_path`, relative to the libraries directory.
    pub fn local_path(&self) -> PathBuf {
        self.repository_path().split('/').collect()
    }

    pub fn url(&self, repo_base: &str) -> String {
        format!("{}/{}", repo_base.trim_end_matches('/'), self.repository_path())
    }
}

impl fmt::Display for MavenArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if let Some(c) = &self.classifier {
            write!(f, ":{}", c)?;
        }
        if self.extension != "jar" {
            write!(f, "@{}", self.extension)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_classified_coordinates() {
        let plain = MavenArtifact::parse("net.fabricmc:intermediary:1.20.1").unwrap();
        assert_eq!(plain.group_id, "net.fabricmc");
        assert_eq!(plain.classifier, None);
        assert_eq!(plain.extension, "jar");

        let native = MavenArtifact::parse("org.lwjgl:lwjgl:3.3.1:natives-linux").unwrap();
        assert_eq!(native.classifier.as_deref(), Some("natives-linux"));
        assert_eq!(native.filename(), "lwjgl-3.3.1-natives-linux.jar");
    }

    #[test]
    fn rejects_malformed_coordinates() {
        assert!(MavenArtifact::parse("net.fabricmc:fabric-loader").is_err());
        assert!(MavenArtifact::parse("a:b:c:d:e").is_err());
        assert!(MavenArtifact::parse("a:b:1.0@").is_err());
    }

    #[test]
    fn builds_repository_url_and_local_path() {
        let a = MavenArtifact::parse("net.fabricmc:fabric-loader:0.15.7").unwrap();
        assert_eq!(
            a.url("https://maven.fabricmc.net/"),
            "https://maven.fabricmc.net/net/fabricmc/fabric-loader/0.15.7/fabric-loader-0.15.7.jar"
        );
        assert_eq!(
            a.local_path(),
            PathBuf::from("net/fabricmc/fabric-loader/0.15.7/fabric-loader-0.15.7.jar")
        );
    }

    #[test]
    fn display_round_trips_the_coordinate() {
        for coord in ["a.b:c:1.0", "a.b:c:1.0:natives", "a.b:c:1.0@zip"] {
            assert_eq!(MavenArtifact::parse(coord).unwrap().to_string(), coord);
        }
    }
}

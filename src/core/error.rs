use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::auth::{AuthFailure, AuthStage};

/// Central error type for the entire launcher core.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} failed: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Network error for {url} after {attempts} attempts: {reason}")]
    TransientNetwork {
        url: String,
        attempts: u32,
        reason: String,
    },

    // ── Integrity ───────────────────────────────────────
    #[error("{algorithm} mismatch for {path:?}: expected {expected}, got {actual}")]
    Integrity {
        path: PathBuf,
        algorithm: &'static str,
        expected: String,
        actual: String,
    },

    // ── Lookup ──────────────────────────────────────────
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} already exists: {id}")]
    Conflict { kind: &'static str, id: String },

    // ── Auth ────────────────────────────────────────────
    #[error("Authentication failed during {stage}: {failure}")]
    Authentication {
        stage: AuthStage,
        failure: AuthFailure,
    },

    // ── Launch ──────────────────────────────────────────
    #[error("[{code}] {message}")]
    Launch {
        code: LaunchErrorCode,
        message: String,
    },

    // ── Mods ────────────────────────────────────────────
    #[error("No compatible version of {mod_id} for Minecraft {game_version}")]
    NoCompatibleVersion {
        mod_id: String,
        game_version: String,
    },

    #[error("{0} is not implemented")]
    NotImplemented(String),

    // ── Maven ───────────────────────────────────────────
    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── XML ─────────────────────────────────────────────
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Loader ──────────────────────────────────────────
    #[error("Loader error: {0}")]
    Loader(String),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LauncherError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        LauncherError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn launch(code: LaunchErrorCode, message: impl Into<String>) -> Self {
        LauncherError::Launch {
            code,
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable machine-readable code for callers that branch on failures.
    pub fn code(&self) -> &'static str {
        match self {
            LauncherError::Io { .. } => "IO_ERROR",
            LauncherError::Http(_) | LauncherError::HttpStatus { .. } => "HTTP_ERROR",
            LauncherError::TransientNetwork { .. } => "NETWORK_UNAVAILABLE",
            LauncherError::Integrity { .. } => "INTEGRITY_ERROR",
            LauncherError::NotFound { .. } => "NOT_FOUND",
            LauncherError::Conflict { .. } => "CONFLICT",
            LauncherError::Authentication { .. } => "AUTHENTICATION_FAILED",
            LauncherError::Launch { code, .. } => code.as_str(),
            LauncherError::NoCompatibleVersion { .. } => "NO_COMPATIBLE_VERSION",
            LauncherError::NotImplemented(_) => "NOT_IMPLEMENTED",
            LauncherError::InvalidMavenCoordinate(_) => "INVALID_MAVEN_COORDINATE",
            LauncherError::Xml(_) | LauncherError::Json(_) => "PARSE_ERROR",
            LauncherError::Loader(_) => "LOADER_ERROR",
            LauncherError::Zip(_) => "ARCHIVE_ERROR",
            LauncherError::Other(_) => "UNKNOWN",
        }
    }

    /// True for 404 responses, so lookups can turn them into `NotFound`.
    pub fn is_http_not_found(&self) -> bool {
        matches!(self, LauncherError::HttpStatus { status: 404, .. })
    }
}

/// Codes attached to failures that abort a launch before the game is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchErrorCode {
    InstanceNotFound,
    NoAccount,
    VersionNotFound,
    InvalidVersionJson,
    ClientJarNotFound,
    ProcessStartFailed,
}

impl LaunchErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchErrorCode::InstanceNotFound => "INSTANCE_NOT_FOUND",
            LaunchErrorCode::NoAccount => "NO_ACCOUNT",
            LaunchErrorCode::VersionNotFound => "VERSION_NOT_FOUND",
            LaunchErrorCode::InvalidVersionJson => "INVALID_VERSION_JSON",
            LaunchErrorCode::ClientJarNotFound => "CLIENT_JAR_NOT_FOUND",
            LaunchErrorCode::ProcessStartFailed => "PROCESS_START_FAILED",
        }
    }
}

impl fmt::Display for LaunchErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Serialization for IPC ───────────────────────────────
// Front-ends receive the display string only.
impl serde::Serialize for LauncherError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_errors_expose_their_code() {
        let err = LauncherError::launch(LaunchErrorCode::NoAccount, "no active account");
        assert_eq!(err.code(), "NO_ACCOUNT");
        assert_eq!(err.to_string(), "[NO_ACCOUNT] no active account");
    }

    #[test]
    fn only_404_counts_as_not_found() {
        let missing = LauncherError::HttpStatus {
            url: "https://example.invalid".into(),
            status: 404,
        };
        let forbidden = LauncherError::HttpStatus {
            url: "https://example.invalid".into(),
            status: 403,
        };
        assert!(missing.is_http_not_found());
        assert!(!forbidden.is_http_not_found());
    }

    #[test]
    fn serializes_as_display_string() {
        let err = LauncherError::not_found("profile", "abc");
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"profile not found: abc\"");
    }
}

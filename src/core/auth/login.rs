use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::error::LauncherResult;

/// Result of the first federation stage.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityGrant {
    pub access_token: String,
    /// Stable handle the login provider can resolve again without user action.
    pub account_handle: String,
    pub expires_at: DateTime<Utc>,
    /// Account name (usually an e-mail) reported by the provider.
    pub username: Option<String>,
}

/// The interactive OAuth flow. Lives outside the core: a browser window,
/// a device-code prompt, or a platform broker all fit behind it.
#[async_trait]
pub trait InteractiveLogin: Send + Sync {
    /// Blocks until the user completes (or abandons) the login.
    async fn login(&self) -> LauncherResult<IdentityGrant>;

    /// Resolve a stored handle without user interaction. `None` means the
    /// provider no longer knows the session.
    async fn acquire_silent(&self, account_handle: &str) -> LauncherResult<Option<IdentityGrant>>;

    /// Drop the cached session for `account_handle`.
    async fn forget(&self, account_handle: &str) -> LauncherResult<()>;
}

// ─── Identity Federation Chain ───
// Interactive login -> user token -> XSTS token -> game token -> profile.
// Each stage consumes the previous token; a failure anywhere ends the attempt.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::account::{Account, AccountKind};
use super::login::{IdentityGrant, InteractiveLogin};
use super::wire::{
    GameLoginRequest, GameLoginResponse, ProfileResponse, SecurityTokenRequest, TokenResponse,
    UserTokenRequest,
};
use crate::core::downloader::{FetchClient, FetchRequest};
use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEndpoints {
    pub user_token: String,
    pub security_token: String,
    pub game_login: String,
    pub profile: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            user_token: "https://user.auth.xboxlive.com/user/authenticate".into(),
            security_token: "https://xsts.auth.xboxlive.com/xsts/authorize".into(),
            game_login: "https://api.minecraftservices.com/authentication/login_with_xbox".into(),
            profile: "https://api.minecraftservices.com/minecraft/profile".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuthStage {
    IdentityLogin,
    UserToken,
    SecurityToken,
    GameService,
    ProfileFetch,
}

impl fmt::Display for AuthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthStage::IdentityLogin => "identity login",
            AuthStage::UserToken => "user token exchange",
            AuthStage::SecurityToken => "security token exchange",
            AuthStage::GameService => "game service login",
            AuthStage::ProfileFetch => "profile fetch",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    Transport(String),
    Rejected { status: u16 },
    MissingClaim(&'static str),
    /// The account authenticated but does not own the game.
    NoEntitlement,
    /// A stored session handle could not be resolved silently.
    SessionUnavailable,
    Malformed(String),
    Provider(String),
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFailure::Transport(reason) => write!(f, "network failure: {}", reason),
            AuthFailure::Rejected { status } => write!(f, "rejected with HTTP {}", status),
            AuthFailure::MissingClaim(claim) => write!(f, "response is missing the {} claim", claim),
            AuthFailure::NoEntitlement => f.write_str("this account does not own Minecraft"),
            AuthFailure::SessionUnavailable => {
                f.write_str("stored session is no longer available, sign in again")
            }
            AuthFailure::Malformed(reason) => write!(f, "malformed response: {}", reason),
            AuthFailure::Provider(reason) => write!(f, "login provider failed: {}", reason),
        }
    }
}

impl AuthFailure {
    fn from_error(err: LauncherError) -> Self {
        match err {
            LauncherError::HttpStatus { status, .. } => AuthFailure::Rejected { status },
            LauncherError::Json(e) => AuthFailure::Malformed(e.to_string()),
            other => AuthFailure::Transport(other.to_string()),
        }
    }
}

/// Where the chain currently is. `Failed` is terminal for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainState {
    Idle,
    IdentityLogin,
    UserToken,
    SecurityToken,
    GameService,
    ProfileFetch,
    Authenticated,
    Failed { stage: AuthStage, failure: AuthFailure },
}

pub struct FederationChain {
    fetch: Arc<FetchClient>,
    endpoints: AuthEndpoints,
    login: Arc<dyn InteractiveLogin>,
    state: ChainState,
}

impl FederationChain {
    pub fn new(
        fetch: Arc<FetchClient>,
        endpoints: AuthEndpoints,
        login: Arc<dyn InteractiveLogin>,
    ) -> Self {
        Self {
            fetch,
            endpoints,
            login,
            state: ChainState::Idle,
        }
    }

    pub fn state(&self) -> &ChainState {
        &self.state
    }

    /// Full interactive sign-in. The returned account is not persisted here.
    pub async fn authenticate(&mut self) -> LauncherResult<Account> {
        self.enter(ChainState::IdentityLogin);
        let grant = match self.login.login().await {
            Ok(grant) => grant,
            Err(e) => {
                return Err(self.fail(AuthStage::IdentityLogin, AuthFailure::Provider(e.to_string())))
            }
        };
        self.run_exchanges(grant).await
    }

    /// Re-run the chain from a stored session handle, without user interaction.
    pub async fn refresh(&mut self, account: &Account) -> LauncherResult<Account> {
        self.enter(ChainState::IdentityLogin);
        let Some(handle) = account.refresh_handle.as_deref() else {
            return Err(self.fail(AuthStage::IdentityLogin, AuthFailure::SessionUnavailable));
        };

        let grant = match self.login.acquire_silent(handle).await {
            Ok(Some(grant)) => grant,
            Ok(None) => {
                return Err(self.fail(AuthStage::IdentityLogin, AuthFailure::SessionUnavailable))
            }
            Err(e) => {
                return Err(self.fail(AuthStage::IdentityLogin, AuthFailure::Provider(e.to_string())))
            }
        };

        let mut refreshed = self.run_exchanges(grant).await?;
        refreshed.id = account.id.clone();
        refreshed.is_active = account.is_active;
        Ok(refreshed)
    }

    /// Forget the interactive session. Upstream tokens are left to expire.
    pub async fn sign_out(&mut self, account: &Account) -> LauncherResult<()> {
        if let Some(handle) = account.refresh_handle.as_deref() {
            self.login.forget(handle).await?;
        }
        self.state = ChainState::Idle;
        info!("Signed out {}", account.username);
        Ok(())
    }

    async fn run_exchanges(&mut self, grant: IdentityGrant) -> LauncherResult<Account> {
        self.enter(ChainState::UserToken);
        let user_token: TokenResponse = self
            .post_stage(
                &self.endpoints.user_token,
                &UserTokenRequest::new(&grant.access_token),
            )
            .await
            .map_err(|f| self.fail(AuthStage::UserToken, f))?;

        self.enter(ChainState::SecurityToken);
        let security: TokenResponse = self
            .post_stage(
                &self.endpoints.security_token,
                &SecurityTokenRequest::new(&user_token.token),
            )
            .await
            .map_err(|f| self.fail(AuthStage::SecurityToken, f))?;
        let Some(user_hash) = security.user_hash().map(str::to_string) else {
            return Err(self.fail(AuthStage::SecurityToken, AuthFailure::MissingClaim("uhs")));
        };

        self.enter(ChainState::GameService);
        let game: GameLoginResponse = self
            .post_stage(
                &self.endpoints.game_login,
                &GameLoginRequest::new(&user_hash, &security.token),
            )
            .await
            .map_err(|f| self.fail(AuthStage::GameService, f))?;

        self.enter(ChainState::ProfileFetch);
        let (game_uuid, username) = self
            .fetch_profile(&game.access_token)
            .await
            .map_err(|f| self.fail(AuthStage::ProfileFetch, f))?;

        self.enter(ChainState::Authenticated);
        info!("Authenticated Minecraft profile {}", username);

        Ok(Account {
            id: Uuid::new_v4().to_string(),
            username,
            game_uuid,
            email: grant.username,
            kind: AccountKind::Microsoft,
            access_token: game.access_token,
            refresh_handle: Some(grant.account_handle),
            token_expiry: Some(grant.expires_at),
            is_active: false,
        })
    }

    async fn post_stage<B, T>(&self, url: &str, body: &B) -> Result<T, AuthFailure>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let request =
            FetchRequest::post_json(url, body).map_err(|e| AuthFailure::Malformed(e.to_string()))?;
        self.fetch
            .fetch_json(request)
            .await
            .map_err(AuthFailure::from_error)
    }

    /// A 2xx without a profile (or a 404) means the game is not owned.
    async fn fetch_profile(&self, access_token: &str) -> Result<(String, String), AuthFailure> {
        let request = FetchRequest::get(self.endpoints.profile.clone()).bearer(access_token);
        let body = match self.fetch.fetch(request).await {
            Ok(body) => body,
            Err(e) if e.is_http_not_found() => return Err(AuthFailure::NoEntitlement),
            Err(e) => return Err(AuthFailure::from_error(e)),
        };

        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(AuthFailure::NoEntitlement);
        }
        let profile: ProfileResponse =
            serde_json::from_slice(&body).map_err(|e| AuthFailure::Malformed(e.to_string()))?;

        match (profile.id, profile.name) {
            (Some(id), Some(name)) if !id.is_empty() && !name.is_empty() => Ok((id, name)),
            _ => Err(AuthFailure::NoEntitlement),
        }
    }

    fn enter(&mut self, next: ChainState) {
        debug!("Auth chain: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, stage: AuthStage, failure: AuthFailure) -> LauncherError {
        warn!("Authentication failed during {}: {}", stage, failure);
        self.state = ChainState::Failed {
            stage,
            failure: failure.clone(),
        };
        LauncherError::Authentication { stage, failure }
    }
}

// ─── Federation Wire Format ───
// Fixed request envelopes and responses of the Xbox Live / Minecraft services.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserTokenRequest {
    properties: UserTokenProperties,
    relying_party: &'static str,
    token_type: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct UserTokenProperties {
    auth_method: &'static str,
    site_name: &'static str,
    rps_ticket: String,
}

impl UserTokenRequest {
    pub fn new(identity_token: &str) -> Self {
        Self {
            properties: UserTokenProperties {
                auth_method: "RPS",
                site_name: "user.auth.xboxlive.com",
                rps_ticket: format!("d={}", identity_token),
            },
            relying_party: "http://auth.xboxlive.com",
            token_type: "JWT",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityTokenRequest {
    properties: SecurityTokenProperties,
    relying_party: &'static str,
    token_type: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SecurityTokenProperties {
    sandbox_id: &'static str,
    user_tokens: Vec<String>,
}

impl SecurityTokenRequest {
    pub fn new(user_token: &str) -> Self {
        Self {
            properties: SecurityTokenProperties {
                sandbox_id: "RETAIL",
                user_tokens: vec![user_token.to_string()],
            },
            relying_party: "rp://api.minecraftservices.com/",
            token_type: "JWT",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GameLoginRequest {
    #[serde(rename = "identityToken")]
    identity_token: String,
}

impl GameLoginRequest {
    pub fn new(user_hash: &str, security_token: &str) -> Self {
        Self {
            identity_token: format!("XBL3.0 x={};{}", user_hash, security_token),
        }
    }
}

/// Response of both Xbox Live exchanges.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(rename = "Token")]
    pub token: String,
    #[serde(rename = "DisplayClaims", default)]
    pub display_claims: Option<DisplayClaims>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DisplayClaims {
    #[serde(default)]
    pub xui: Vec<XuiClaim>,
}

#[derive(Debug, Deserialize)]
pub struct XuiClaim {
    #[serde(default)]
    pub uhs: Option<String>,
}

impl TokenResponse {
    /// User hash from the first claim, if the service sent one.
    pub fn user_hash(&self) -> Option<&str> {
        self.display_claims
            .as_ref()?
            .xui
            .first()?
            .uhs
            .as_deref()
            .filter(|uhs| !uhs.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct GameLoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

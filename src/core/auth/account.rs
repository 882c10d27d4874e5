use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const OFFLINE_ACCESS_TOKEN: &str = "offline_access_token";
const FALLBACK_USERNAME: &str = "Player";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Offline,
    Microsoft,
}

impl AccountKind {
    /// Value passed to the game as `--userType`.
    pub fn user_type(&self) -> &'static str {
        match self {
            AccountKind::Microsoft => "msa",
            AccountKind::Offline => "legacy",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub username: String,
    pub game_uuid: String,
    pub email: Option<String>,
    pub kind: AccountKind,
    pub access_token: String,
    /// Opaque handle of the interactive session, used for silent refresh.
    pub refresh_handle: Option<String>,
    pub token_expiry: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl Account {
    /// Offline account with the same UUID the vanilla server derives for `username`.
    pub fn offline(username: &str) -> Self {
        let username = match username.trim() {
            "" => FALLBACK_USERNAME.to_string(),
            name => name.to_string(),
        };
        Self {
            id: Uuid::new_v4().to_string(),
            game_uuid: offline_uuid(&username),
            username,
            email: None,
            kind: AccountKind::Offline,
            access_token: OFFLINE_ACCESS_TOKEN.into(),
            refresh_handle: None,
            token_expiry: None,
            is_active: false,
        }
    }

    pub fn is_token_expired(&self, now: DateTime<Utc>) -> bool {
        match (self.kind, self.token_expiry) {
            (AccountKind::Offline, _) => false,
            (AccountKind::Microsoft, Some(expiry)) => expiry <= now,
            (AccountKind::Microsoft, None) => true,
        }
    }
}

/// Name-based (v3) UUID of `OfflinePlayer:<username>`, without dashes.
pub fn offline_uuid(username: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(format!("OfflinePlayer:{}", username).as_bytes());
    let digest: [u8; 16] = hasher.finalize().into();
    uuid::Builder::from_md5_bytes(digest)
        .into_uuid()
        .simple()
        .to_string()
}

pub mod account;
pub mod chain;
pub mod login;
pub mod wire;

pub use account::{offline_uuid, Account, AccountKind};
pub use chain::{AuthEndpoints, AuthFailure, AuthStage, ChainState, FederationChain};
pub use login::{IdentityGrant, InteractiveLogin};

pub mod manager;
pub mod model;
pub mod toggle;

pub use manager::ModManager;
pub use model::{
    CompatibilityResult, InstalledMod, ModPlatform, ModSearchPage, ModSummary, ModUpdateInfo,
};
pub use toggle::{disabled_path, DISABLED_SUFFIX};

pub mod asset_index;

pub use asset_index::{ensure_objects, AssetIndex, AssetObject, AssetSyncReport};

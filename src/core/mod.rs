// ─── Craftline Core ───
// Provisioning, authentication, mod management and launch for a modded
// Minecraft client.
//
// Architecture:
//   core/
//     downloader/ — Retrying fetch client, verified downloads, progress
//     auth/       — Identity federation chain + accounts
//     version/    — Version manifest, version JSON, OS rules, installer
//     assets/     — Asset index + object downloads
//     maven/      — Maven coordinates and metadata
//     loaders/    — Fabric/Quilt install, loader version listing
//     modrinth/   — Mod registry client
//     mods/       — Installed mod lifecycle per profile
//     instance/   — Profile model + working directories
//     store/      — Profile, account and mod persistence
//     launch/     — Classpath, arguments, process sessions
//     state/      — Settings + application wiring

pub mod assets;
pub mod auth;
pub mod downloader;
pub mod error;
pub mod http;
pub mod instance;
pub mod launch;
pub mod loaders;
pub mod maven;
pub mod modrinth;
pub mod mods;
pub mod state;
pub mod store;
pub mod version;

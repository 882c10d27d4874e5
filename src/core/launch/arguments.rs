// ─── Launch Arguments ───
// JVM and game argument vectors. Arguments are passed to the process one by
// one, never through a shell.

use std::path::Path;

use crate::core::auth::Account;
use crate::core::instance::Profile;
use crate::core::loaders::LoaderInstallResult;
use crate::core::version::VersionDetail;

use super::classpath::{get_classpath_separator, safe_path_str};

pub const LAUNCHER_NAME: &str = "craftline";

/// G1 tuning applied to every launch.
pub const GC_FLAGS: [&str; 6] = [
    "-XX:+UseG1GC",
    "-XX:+UnlockExperimentalVMOptions",
    "-XX:G1NewSizePercent=20",
    "-XX:G1ReservePercent=20",
    "-XX:MaxGCPauseMillis=50",
    "-XX:G1HeapRegionSize=32M",
];

pub struct LaunchContext<'a> {
    pub profile: &'a Profile,
    pub account: &'a Account,
    pub detail: &'a VersionDetail,
    pub loader: Option<&'a LoaderInstallResult>,
    pub classpath: &'a str,
    pub natives_dir: &'a Path,
    pub libraries_dir: &'a Path,
    pub game_dir: &'a Path,
    pub assets_dir: &'a Path,
    /// Used when the profile leaves its window size unset.
    pub default_window: (u32, u32),
    pub default_fullscreen: bool,
}

impl LaunchContext<'_> {
    /// The loader's entry point replaces the vanilla one.
    pub fn main_class(&self) -> &str {
        self.loader
            .map(|l| l.main_class.as_str())
            .unwrap_or(&self.detail.main_class)
    }
}

pub fn jvm_arguments(ctx: &LaunchContext<'_>) -> Vec<String> {
    let profile = ctx.profile;
    let mut args = vec![
        format!("-Xmx{}M", profile.memory_max_mb),
        format!("-Xms{}M", profile.memory_min_mb),
        format!("-Djava.library.path={}", safe_path_str(ctx.natives_dir)),
    ];
    args.extend(GC_FLAGS.iter().map(|f| f.to_string()));

    if let Some(loader) = ctx.loader {
        args.extend(sanitize_jvm_args(ctx, &loader.extra_jvm_args));
    }
    args.extend(sanitize_jvm_args(ctx, &profile.custom_jvm_args));

    args.push("-cp".into());
    args.push(ctx.classpath.to_string());
    args.push(ctx.main_class().to_string());
    args
}

pub fn game_arguments(ctx: &LaunchContext<'_>) -> Vec<String> {
    let profile = ctx.profile;
    let account = ctx.account;
    let mut args: Vec<String> = vec![
        "--username".into(),
        account.username.clone(),
        "--version".into(),
        profile.version_id.clone(),
        "--gameDir".into(),
        safe_path_str(ctx.game_dir),
        "--assetsDir".into(),
        safe_path_str(ctx.assets_dir),
        "--assetIndex".into(),
        ctx.detail.asset_index_id().to_string(),
        "--uuid".into(),
        account.game_uuid.clone(),
        "--accessToken".into(),
        account.access_token.clone(),
        "--userType".into(),
        account.kind.user_type().into(),
        "--versionType".into(),
        "release".into(),
    ];

    if profile.fullscreen.unwrap_or(ctx.default_fullscreen) {
        args.push("--fullscreen".into());
    } else {
        let (default_w, default_h) = ctx.default_window;
        args.push("--width".into());
        args.push(profile.window_width.unwrap_or(default_w).to_string());
        args.push("--height".into());
        args.push(profile.window_height.unwrap_or(default_h).to_string());
    }

    if let Some(loader) = ctx.loader {
        args.extend(drop_unresolved(&loader.extra_game_args));
    }
    args.extend(drop_unresolved(&profile.custom_game_args));
    args
}

/// Resolve the placeholders loaders use, drop classpath switches (the
/// classpath is always set last) and anything still unresolved.
fn sanitize_jvm_args(ctx: &LaunchContext<'_>, raw_args: &[String]) -> Vec<String> {
    let natives = safe_path_str(ctx.natives_dir);
    let library_dir = safe_path_str(ctx.libraries_dir);
    let game_dir = safe_path_str(ctx.game_dir);
    let mut sanitized = Vec::new();
    let mut i = 0;

    while i < raw_args.len() {
        let arg = &raw_args[i];

        if arg == "-cp" || arg == "-classpath" || arg == "--class-path" {
            i += 2;
            continue;
        }

        let resolved = arg
            .replace("${natives_directory}", &natives)
            .replace("${library_directory}", &library_dir)
            .replace("${classpath_separator}", get_classpath_separator())
            .replace("${game_directory}", &game_dir)
            .replace("${version_name}", &ctx.profile.version_id)
            .replace("${launcher_name}", LAUNCHER_NAME)
            .replace("${launcher_version}", env!("CARGO_PKG_VERSION"));

        if resolved.contains("${") {
            drop_dangling_option(&mut sanitized);
        } else {
            sanitized.push(resolved);
        }
        i += 1;
    }

    sanitized
}

fn drop_unresolved(raw_args: &[String]) -> Vec<String> {
    let mut kept = Vec::new();
    for arg in raw_args {
        if arg.contains("${") {
            drop_dangling_option(&mut kept);
        } else {
            kept.push(arg.clone());
        }
    }
    kept
}

/// An option whose value was dropped must go too.
fn drop_dangling_option(args: &mut Vec<String>) {
    if args.last().is_some_and(|prev| prev.starts_with("--")) {
        args.pop();
    }
}

// ─── Classpath Builder ───
// Constructs the dynamic classpath string for launching Minecraft.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::error::{LaunchErrorCode, LauncherError, LauncherResult};
use crate::core::version::{OsName, VersionDetail};

/// Inputs for one classpath. Order of the result: version libraries,
/// loader libraries, client jar, enabled mods.
pub struct ClasspathPlan<'a> {
    pub detail: &'a VersionDetail,
    pub libraries_dir: &'a Path,
    /// Relative to `libraries_dir`, as recorded by the loader install.
    pub loader_libraries: &'a [String],
    pub client_jar: &'a Path,
    pub mod_files: &'a [PathBuf],
    pub os: OsName,
}

/// Missing libraries are skipped; a missing client jar is fatal.
pub fn build_classpath(plan: &ClasspathPlan<'_>) -> LauncherResult<Vec<PathBuf>> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    let mut push = |path: PathBuf, entries: &mut Vec<PathBuf>| {
        if seen.insert(path.clone()) {
            entries.push(path);
        }
    };

    for library in plan.detail.libraries.iter().filter(|l| l.is_allowed_on(plan.os)) {
        let Some(artifact) = library.artifact() else {
            continue;
        };
        let path = plan.libraries_dir.join(&artifact.path);
        if path.exists() {
            push(path, &mut entries);
        } else {
            debug!("Library not on disk, skipped: {}", library.name);
        }
    }

    for relative in plan.loader_libraries {
        let path = plan.libraries_dir.join(relative);
        if path.exists() {
            push(path, &mut entries);
        } else {
            warn!("Loader library missing: {}", relative);
        }
    }

    if !plan.client_jar.exists() {
        return Err(LauncherError::launch(
            LaunchErrorCode::ClientJarNotFound,
            format!("Client jar not found at {:?}", plan.client_jar),
        ));
    }
    push(plan.client_jar.to_path_buf(), &mut entries);

    for mod_file in plan.mod_files {
        if mod_file.exists() {
            push(mod_file.clone(), &mut entries);
        } else {
            warn!("Enabled mod file missing: {:?}", mod_file);
        }
    }

    Ok(entries)
}

pub fn join_classpath(entries: &[PathBuf]) -> String {
    entries
        .iter()
        .map(|p| safe_path_str(p))
        .collect::<Vec<_>>()
        .join(get_classpath_separator())
}

/// Platform-specific Java classpath separator.
pub fn get_classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

/// Extract `.dll`/`.so`/`.dylib` files from the current OS's native classifier
/// jars into `natives_dir`, replacing what a previous launch left there.
pub async fn extract_natives(
    detail: &VersionDetail,
    libs_dir: &Path,
    natives_dir: &Path,
    os: OsName,
) -> LauncherResult<usize> {
    if tokio::fs::try_exists(natives_dir).await.unwrap_or(false) {
        let _ = tokio::fs::remove_dir_all(natives_dir).await;
    }
    tokio::fs::create_dir_all(natives_dir)
        .await
        .map_err(|e| LauncherError::io(natives_dir, e))?;

    let mut extracted = 0;
    for library in detail.libraries.iter().filter(|l| l.is_allowed_on(os)) {
        let Some(native) = library.native_artifact(os) else {
            continue;
        };
        let jar_path = libs_dir.join(&native.path);
        if !tokio::fs::try_exists(&jar_path).await.unwrap_or(false) {
            warn!("Native jar missing: {:?}", jar_path);
            continue;
        }

        let jar_bytes = tokio::fs::read(&jar_path)
            .await
            .map_err(|e| LauncherError::io(&jar_path, e))?;
        let dest_dir = natives_dir.to_path_buf();
        let count = tokio::task::spawn_blocking(move || unpack_native_jar(jar_bytes, &dest_dir))
            .await
            .map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))??;
        extracted += count;
    }

    debug!("Extracted {} native files into {:?}", extracted, natives_dir);
    Ok(extracted)
}

fn unpack_native_jar(jar_bytes: Vec<u8>, dest_dir: &Path) -> LauncherResult<usize> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(jar_bytes))?;
    let mut count = 0;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let name = file.name().to_string();

        if name.starts_with("META-INF") || name.contains('/') || name.contains('\\') {
            continue;
        }

        let is_native = name.ends_with(".dll")
            || name.ends_with(".so")
            || name.ends_with(".dylib")
            || name.ends_with(".jnilib");
        if !is_native {
            continue;
        }

        let dest = dest_dir.join(&name);
        let mut out = std::fs::File::create(&dest).map_err(|e| LauncherError::io(&dest, e))?;
        std::io::copy(&mut file, &mut out).map_err(|e| LauncherError::io(&dest, e))?;
        debug!("Extracted native: {}", name);
        count += 1;
    }

    Ok(count)
}

/// Convert path to string, stripping the `\\?\` prefix canonicalization adds on Windows.
pub fn safe_path_str(path: &Path) -> String {
    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let text = resolved.to_string_lossy().to_string();

    #[cfg(target_os = "windows")]
    {
        // Java mis-resolves extended-length paths on the classpath.
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn detail(json: &str) -> VersionDetail {
        VersionDetail::parse(json).unwrap()
    }

    const DETAIL: &str = r#"{
        "id": "1.20.1",
        "mainClass": "net.minecraft.client.main.Main",
        "libraries": [
            {"name": "com.mojang:logging:1.1.1",
             "downloads": {"artifact": {"path": "com/mojang/logging/1.1.1/logging-1.1.1.jar",
                                        "sha1": "x", "size": 1, "url": "https://l/1"}}},
            {"name": "org.lwjgl:lwjgl:3.3.1",
             "downloads": {"artifact": {"path": "org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1.jar",
                                        "sha1": "x", "size": 1, "url": "https://l/2"}}},
            {"name": "ca.weblite:java-objc-bridge:1.1",
             "downloads": {"artifact": {"path": "ca/weblite/java-objc-bridge/1.1/java-objc-bridge-1.1.jar",
                                        "sha1": "x", "size": 1, "url": "https://l/3"}},
             "rules": [{"action": "allow", "os": {"name": "osx"}}]}
        ]
    }"#;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn orders_libraries_client_then_mods() {
        let dir = tempfile::tempdir().unwrap();
        let libs = dir.path().join("libraries");
        let detail = detail(DETAIL);
        touch(&libs.join("com/mojang/logging/1.1.1/logging-1.1.1.jar"));
        touch(&libs.join("ca/weblite/java-objc-bridge/1.1/java-objc-bridge-1.1.jar"));
        touch(&libs.join("net/fabricmc/fabric-loader/0.15.7/fabric-loader-0.15.7.jar"));
        let client = dir.path().join("1.20.1.jar");
        touch(&client);
        let mod_a = dir.path().join("mods/a.jar");
        touch(&mod_a);

        let loader_libs = vec!["net/fabricmc/fabric-loader/0.15.7/fabric-loader-0.15.7.jar".to_string()];
        let mods = vec![mod_a.clone()];
        let entries = build_classpath(&ClasspathPlan {
            detail: &detail,
            libraries_dir: &libs,
            loader_libraries: &loader_libs,
            client_jar: &client,
            mod_files: &mods,
            os: OsName::Linux,
        })
        .unwrap();

        // lwjgl is absent on disk, the objc bridge is macOS only.
        assert_eq!(
            entries,
            vec![
                libs.join("com/mojang/logging/1.1.1/logging-1.1.1.jar"),
                libs.join("net/fabricmc/fabric-loader/0.15.7/fabric-loader-0.15.7.jar"),
                client,
                mod_a,
            ]
        );
    }

    #[test]
    fn missing_client_jar_is_a_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let detail = detail(DETAIL);
        let err = build_classpath(&ClasspathPlan {
            detail: &detail,
            libraries_dir: dir.path(),
            loader_libraries: &[],
            client_jar: &dir.path().join("missing.jar"),
            mod_files: &[],
            os: OsName::Linux,
        })
        .unwrap_err();
        assert_eq!(err.code(), "CLIENT_JAR_NOT_FOUND");
    }

    #[tokio::test]
    async fn extracts_only_top_level_native_files() {
        let dir = tempfile::tempdir().unwrap();
        let libs = dir.path().join("libraries");
        let jar = libs.join("org/lwjgl/lwjgl/2.9.4/lwjgl-platform-2.9.4-natives-linux.jar");
        std::fs::create_dir_all(jar.parent().unwrap()).unwrap();
        {
            let mut zip = zip::ZipWriter::new(std::fs::File::create(&jar).unwrap());
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("liblwjgl.so", options).unwrap();
            zip.write_all(b"elf").unwrap();
            zip.start_file("META-INF/MANIFEST.MF", options).unwrap();
            zip.write_all(b"Manifest-Version: 1.0").unwrap();
            zip.finish().unwrap();
        }

        let detail = detail(
            r#"{
                "id": "1.8.9",
                "mainClass": "net.minecraft.client.main.Main",
                "libraries": [{
                    "name": "org.lwjgl.lwjgl:lwjgl-platform:2.9.4",
                    "natives": {"linux": "natives-linux"},
                    "downloads": {"classifiers": {"natives-linux": {
                        "path": "org/lwjgl/lwjgl/2.9.4/lwjgl-platform-2.9.4-natives-linux.jar",
                        "sha1": "x", "size": 1, "url": "https://l/n"}}}
                }]
            }"#,
        );
        let natives = dir.path().join("natives");
        let count = extract_natives(&detail, &libs, &natives, OsName::Linux)
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert!(natives.join("liblwjgl.so").exists());
        assert!(!natives.join("MANIFEST.MF").exists());
    }
}

#![allow(dead_code)]

use craftline::core::auth::AuthEndpoints;
use craftline::core::state::Endpoints;
use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::json;
use sha1::{Digest, Sha1};

pub const GAME_VERSION: &str = "1.20.1";
pub const FABRIC_VERSION: &str = "0.15.7";
pub const CLIENT_JAR: &[u8] = b"client jar bytes";
pub const LIBRARY_JAR: &[u8] = b"logging library bytes";
pub const ASSET_OBJECT: &[u8] = b"icon bytes";
pub const FABRIC_JAR: &[u8] = b"fabric loader bytes";

pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

/// Every endpoint pointed at one mock server.
pub fn endpoints(server: &MockServer) -> Endpoints {
    Endpoints {
        version_manifest: server.url("/mc/version_manifest.json"),
        asset_objects: server.url("/objects"),
        mod_registry: server.url("/v2"),
        fabric_meta: server.url("/fabric/v2"),
        fabric_maven: server.url("/fabric-maven"),
        quilt_meta: server.url("/quilt/v3"),
        quilt_maven: server.url("/quilt-maven"),
        forge_promotions: server.url("/forge/promotions_slim.json"),
        neoforge_metadata: server.url("/neoforge/maven-metadata.xml"),
        auth: AuthEndpoints {
            user_token: server.url("/auth/user"),
            security_token: server.url("/auth/xsts"),
            game_login: server.url("/auth/login_with_xbox"),
            profile: server.url("/auth/profile"),
        },
    }
}

/// Mocks of the downloadable files, kept for hit assertions.
pub struct VanillaUpstream<'a> {
    pub client_jar: Mock<'a>,
    pub library: Mock<'a>,
    pub asset_object: Mock<'a>,
}

/// Serve a manifest with one version, its detail JSON, the client jar, one
/// library, and an asset index holding one object.
pub async fn serve_vanilla(server: &MockServer) -> VanillaUpstream<'_> {
    let object_hash = sha1_hex(ASSET_OBJECT);
    let asset_index = json!({
        "objects": {
            "icons/icon_16x16.png": {"hash": object_hash, "size": ASSET_OBJECT.len()}
        }
    })
    .to_string();

    let detail = json!({
        "id": GAME_VERSION,
        "type": "release",
        "mainClass": "net.minecraft.client.main.Main",
        "assets": "5",
        "assetIndex": {
            "id": "5",
            "sha1": sha1_hex(asset_index.as_bytes()),
            "size": asset_index.len(),
            "totalSize": ASSET_OBJECT.len(),
            "url": server.url("/mc/indexes/5.json")
        },
        "downloads": {
            "client": {
                "sha1": sha1_hex(CLIENT_JAR),
                "size": CLIENT_JAR.len(),
                "url": server.url("/mc/client.jar")
            }
        },
        "libraries": [
            {
                "name": "com.mojang:logging:1.1.1",
                "downloads": {"artifact": {
                    "path": "com/mojang/logging/1.1.1/logging-1.1.1.jar",
                    "sha1": sha1_hex(LIBRARY_JAR),
                    "size": LIBRARY_JAR.len(),
                    "url": server.url("/libraries/com/mojang/logging/1.1.1/logging-1.1.1.jar")
                }}
            },
            {
                "name": "com.example:never-allowed:1.0",
                "downloads": {"artifact": {
                    "path": "com/example/never-allowed/1.0/never-allowed-1.0.jar",
                    "sha1": "0000000000000000000000000000000000000000",
                    "size": 1,
                    "url": server.url("/libraries/never-allowed.jar")
                }},
                "rules": [{"action": "disallow"}]
            }
        ]
    })
    .to_string();

    let manifest = json!({
        "latest": {"release": GAME_VERSION, "snapshot": GAME_VERSION},
        "versions": [
            {
                "id": GAME_VERSION,
                "type": "release",
                "url": server.url("/mc/1.20.1.json"),
                "time": "2023-06-12T13:25:51+00:00",
                "releaseTime": "2023-06-12T13:25:51+00:00",
                "sha1": sha1_hex(detail.as_bytes())
            },
            {
                "id": "23w31a",
                "type": "snapshot",
                "url": server.url("/mc/23w31a.json"),
                "time": "2023-08-01T12:00:00+00:00",
                "releaseTime": "2023-08-01T12:00:00+00:00"
            }
        ]
    });

    server
        .mock_async(|when, then| {
            when.method(GET).path("/mc/version_manifest.json");
            then.status(200).json_body(manifest);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/mc/1.20.1.json");
            then.status(200).body(detail);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/mc/indexes/5.json");
            then.status(200).body(asset_index);
        })
        .await;
    let client_jar = server
        .mock_async(|when, then| {
            when.method(GET).path("/mc/client.jar");
            then.status(200).body(CLIENT_JAR);
        })
        .await;
    let library = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/libraries/com/mojang/logging/1.1.1/logging-1.1.1.jar");
            then.status(200).body(LIBRARY_JAR);
        })
        .await;
    let object_path = format!("/objects/{}/{}", &object_hash[..2], object_hash);
    let asset_object = server
        .mock_async(|when, then| {
            when.method(GET).path(object_path);
            then.status(200).body(ASSET_OBJECT);
        })
        .await;

    VanillaUpstream {
        client_jar,
        library,
        asset_object,
    }
}

/// Fabric meta profile plus the single library it references.
pub async fn serve_fabric(server: &MockServer) -> Mock<'_> {
    let profile = json!({
        "id": format!("fabric-loader-{}-{}", FABRIC_VERSION, GAME_VERSION),
        "mainClass": "net.fabricmc.loader.impl.launch.knot.KnotClient",
        "arguments": {"game": [], "jvm": ["-DFabricMcEmu= net.minecraft.client.main.Main "]},
        "libraries": [{
            "name": format!("net.fabricmc:fabric-loader:{}", FABRIC_VERSION),
            "url": server.url("/fabric-maven/"),
            "sha1": sha1_hex(FABRIC_JAR),
            "size": FABRIC_JAR.len()
        }]
    });

    server
        .mock_async(|when, then| {
            when.method(GET).path(format!(
                "/fabric/v2/versions/loader/{}/{}/profile/json",
                GAME_VERSION, FABRIC_VERSION
            ));
            then.status(200).json_body(profile);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!(
                "/fabric-maven/net/fabricmc/fabric-loader/{0}/fabric-loader-{0}.jar",
                FABRIC_VERSION
            ));
            then.status(200).body(FABRIC_JAR);
        })
        .await
}

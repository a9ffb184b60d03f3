use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ManifestSize {
    width: i32,
    height: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AppManifest {
    schema_version: u32,
    app_id: String,
    display_name: String,
    #[serde(default)]
    desktop_icon_label: Option<String>,
    show_on_desktop: bool,
    resizable: bool,
    window_defaults: ManifestSize,
    #[serde(default)]
    min_size: Option<ManifestSize>,
    #[serde(default)]
    max_size: Option<ManifestSize>,
}

fn app_manifest_paths(root: &Path) -> Vec<PathBuf> {
    let dir = root.join("manifests");
    println!("cargo:rerun-if-changed={}", dir.display());
    let entries = fs::read_dir(&dir)
        .unwrap_or_else(|err| panic!("failed to list {}: {err}", dir.display()));
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("toml"))
        .collect();
    paths.sort();
    paths
}

fn valid_app_id(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= 64
        && raw.as_bytes()[0].is_ascii_lowercase()
        && raw
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !raw.ends_with('-')
}

fn validate(path: &Path, manifest: &AppManifest) {
    if manifest.schema_version != 1 {
        panic!(
            "manifest schema mismatch in {}: expected 1 found {}",
            path.display(),
            manifest.schema_version
        );
    }
    if !valid_app_id(&manifest.app_id) {
        panic!("invalid app id `{}` in {}", manifest.app_id, path.display());
    }
    if manifest.display_name.trim().is_empty() {
        panic!("empty display name in {}", path.display());
    }
    let sizes = [
        Some(manifest.window_defaults),
        manifest.min_size,
        manifest.max_size,
    ];
    for size in sizes.into_iter().flatten() {
        if size.width <= 0 || size.height <= 0 {
            panic!("non-positive window size in {}", path.display());
        }
    }
    if let (Some(min), Some(max)) = (manifest.min_size, manifest.max_size) {
        if min.width > max.width || min.height > max.height {
            panic!("min_size exceeds max_size in {}", path.display());
        }
    }
}

fn main() {
    let crate_root = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));
    let mut manifests = Vec::<AppManifest>::new();

    for path in app_manifest_paths(&crate_root) {
        println!("cargo:rerun-if-changed={}", path.display());
        let raw = fs::read_to_string(&path)
            .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
        let manifest: AppManifest = toml::from_str(&raw)
            .unwrap_or_else(|err| panic!("failed to parse {}: {err}", path.display()));
        validate(&path, &manifest);
        if manifests.iter().any(|m| m.app_id == manifest.app_id) {
            panic!("duplicate app id `{}` in {}", manifest.app_id, path.display());
        }
        manifests.push(manifest);
    }

    manifests.sort_by(|a, b| a.app_id.cmp(&b.app_id));
    let json = serde_json::to_string_pretty(&manifests).expect("serialize app manifest catalog");
    let generated = format!(
        "/// Build-time generated app manifest catalog JSON.\n\
pub const APP_MANIFEST_CATALOG_JSON: &str = r##\"{}\"##;\n",
        json
    );

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR"));
    let out_file = out_dir.join("app_catalog_generated.rs");
    fs::write(&out_file, generated)
        .unwrap_or_else(|err| panic!("failed to write {}: {err}", out_file.display()));
}

//! Built-in application registry baked from `manifests/*.toml` at build time.

use std::sync::OnceLock;

use serde::Deserialize;

use crate::model::{AppDescriptor, AppId, Size};

include!(concat!(env!("OUT_DIR"), "/app_catalog_generated.rs"));

#[derive(Debug, Clone, Copy, Deserialize)]
struct CatalogSize {
    width: i32,
    height: i32,
}

impl From<CatalogSize> for Size {
    fn from(size: CatalogSize) -> Self {
        Size::new(size.width, size.height)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AppCatalogEntry {
    app_id: String,
    display_name: String,
    desktop_icon_label: Option<String>,
    show_on_desktop: bool,
    resizable: bool,
    window_defaults: CatalogSize,
    min_size: Option<CatalogSize>,
    max_size: Option<CatalogSize>,
}

fn catalog_entries() -> &'static [AppCatalogEntry] {
    static CATALOG: OnceLock<Vec<AppCatalogEntry>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        serde_json::from_str(APP_MANIFEST_CATALOG_JSON)
            .expect("generated app manifest catalog should parse")
    })
}

/// Returns the built-in registry in app-id order.
pub fn builtin_app_registry() -> Vec<AppDescriptor> {
    catalog_entries()
        .iter()
        .map(|entry| AppDescriptor {
            app_id: AppId::trusted(entry.app_id.clone()),
            display_name: entry.display_name.clone(),
            desktop_icon_label: entry.desktop_icon_label.clone(),
            default_size: entry.window_defaults.into(),
            min_size: entry.min_size.map(Size::from),
            max_size: entry.max_size.map(Size::from),
            resizable: entry.resizable,
            show_on_desktop: entry.show_on_desktop,
        })
        .collect()
}

pub fn find_descriptor<'a>(registry: &'a [AppDescriptor], app_id: &str) -> Option<&'a AppDescriptor> {
    registry.iter().find(|entry| entry.app_id.as_str() == app_id)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn generated_catalog_parses_into_valid_descriptors() {
        let registry = builtin_app_registry();
        assert!(!registry.is_empty());
        for descriptor in &registry {
            assert!(AppId::new(descriptor.app_id.as_str()).is_ok());
            assert!(descriptor.default_size.w > 0 && descriptor.default_size.h > 0);
        }
        let ids: Vec<&str> = registry.iter().map(|d| d.app_id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn proposal_drafts_carries_both_size_bounds() {
        let registry = builtin_app_registry();
        let drafts = find_descriptor(&registry, "proposal-drafts").expect("proposal drafts app");
        assert_eq!(drafts.min_size, Some(Size::new(480, 400)));
        assert_eq!(drafts.max_size, Some(Size::new(1200, 960)));
        assert!(find_descriptor(&registry, "media-viewer").is_some_and(|d| !d.show_on_desktop));
        assert!(find_descriptor(&registry, "missing").is_none());
    }
}

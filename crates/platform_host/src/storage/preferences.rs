//! Identity-keyed preference snapshots and the backend contract the desktop core saves through.

use std::{cell::RefCell, collections::BTreeMap, future::Future, pin::Pin, rc::Rc};

use futures::lock::Mutex;
use serde::{Deserialize, Serialize};

use crate::storage::prefs::{load_pref_with, save_pref_with, PrefsStore};

/// Schema version stamped on every [`PreferenceSnapshot`].
pub const PREFERENCE_SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Object-safe boxed future used by [`PreferencesBackend`] async methods.
pub type PreferencesFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Saved pixel position of one desktop icon.
pub struct IconPlacement {
    /// Left edge in viewport pixels.
    pub x: i32,
    /// Top edge in viewport pixels.
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Window presentation state worth restoring on the next launch.
pub enum WindowPlacementState {
    /// Regular floating window.
    #[default]
    Normal,
    /// Window filled the usable desktop area.
    Maximized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Saved geometry for the primary window of one application.
pub struct WindowPlacement {
    /// Left edge in viewport pixels.
    pub x: i32,
    /// Top edge in viewport pixels.
    pub y: i32,
    /// Width in pixels.
    pub w: i32,
    /// Height in pixels.
    pub h: i32,
    /// Presentation state; `rect` is the restored (un-maximized) geometry either way.
    #[serde(default)]
    pub state: WindowPlacementState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Serializable projection of the user's desktop preferences.
///
/// Every section is optional: a partial snapshot (for example icon positions only) updates the
/// sections it carries and leaves the others untouched when merged by the store.
pub struct PreferenceSnapshot {
    /// Snapshot schema version.
    pub schema_version: u32,
    /// Monotonic stamp taken when the snapshot was built.
    pub updated_at_unix_ms: u64,
    /// Icon positions keyed by icon id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_positions: Option<BTreeMap<String, IconPlacement>>,
    /// Window geometry keyed by application id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows: Option<BTreeMap<String, WindowPlacement>>,
    /// Selected wallpaper/theme id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,
    /// Pinned application ids in dock order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_apps: Option<Vec<String>>,
}

impl PreferenceSnapshot {
    /// Creates an empty snapshot stamped with `updated_at_unix_ms`.
    pub fn empty(updated_at_unix_ms: u64) -> Self {
        Self {
            schema_version: PREFERENCE_SNAPSHOT_SCHEMA_VERSION,
            updated_at_unix_ms,
            icon_positions: None,
            windows: None,
            theme_id: None,
            pinned_apps: None,
        }
    }

    /// Returns whether no section is present.
    pub fn is_empty(&self) -> bool {
        self.icon_positions.is_none()
            && self.windows.is_none()
            && self.theme_id.is_none()
            && self.pinned_apps.is_none()
    }

    /// Overlays the sections present in `newer` onto `self` and adopts its stamp.
    pub fn merge_from(&mut self, newer: PreferenceSnapshot) {
        self.schema_version = newer.schema_version;
        self.updated_at_unix_ms = newer.updated_at_unix_ms;
        if newer.icon_positions.is_some() {
            self.icon_positions = newer.icon_positions;
        }
        if newer.windows.is_some() {
            self.windows = newer.windows;
        }
        if newer.theme_id.is_some() {
            self.theme_id = newer.theme_id;
        }
        if newer.pinned_apps.is_some() {
            self.pinned_apps = newer.pinned_apps;
        }
    }
}

/// Host service that loads and saves a user's preference snapshot.
///
/// Both calls are plain request/response; the desktop core treats every error as non-fatal.
pub trait PreferencesBackend {
    /// Loads the stored snapshot for `identity`, or `None` when the user has nothing saved.
    fn load<'a>(
        &'a self,
        identity: &'a str,
    ) -> PreferencesFuture<'a, Result<Option<PreferenceSnapshot>, String>>;

    /// Saves `snapshot` for `identity`, merging it over whatever is stored.
    fn save<'a>(
        &'a self,
        identity: &'a str,
        snapshot: &'a PreferenceSnapshot,
    ) -> PreferencesFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Backend that never finds a snapshot and accepts every save.
pub struct NoopPreferencesBackend;

impl PreferencesBackend for NoopPreferencesBackend {
    fn load<'a>(
        &'a self,
        _identity: &'a str,
    ) -> PreferencesFuture<'a, Result<Option<PreferenceSnapshot>, String>> {
        Box::pin(async { Ok(None) })
    }

    fn save<'a>(
        &'a self,
        _identity: &'a str,
        _snapshot: &'a PreferenceSnapshot,
    ) -> PreferencesFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone)]
/// [`PreferencesBackend`] adapter storing one JSON snapshot per identity in a [`PrefsStore`].
///
/// Saves are read-merge-write under a per-identity lock, so overlapping saves for one identity
/// apply one after another and never overwrite each other's sections. A snapshot stamped older
/// than the stored one is dropped, so a slow save cannot roll the store back.
pub struct PrefsStorePreferences<S> {
    store: S,
    key_prefix: String,
    save_locks: Rc<RefCell<BTreeMap<String, Rc<Mutex<()>>>>>,
}

impl<S: PrefsStore> PrefsStorePreferences<S> {
    /// Wraps `store`, keying entries as `{key_prefix}.{identity}`.
    pub fn new(store: S, key_prefix: impl Into<String>) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
            save_locks: Rc::default(),
        }
    }

    fn save_lock(&self, identity: &str) -> Rc<Mutex<()>> {
        Rc::clone(
            self.save_locks
                .borrow_mut()
                .entry(identity.to_string())
                .or_default(),
        )
    }

    /// Returns the storage key used for `identity`.
    pub fn key_for(&self, identity: &str) -> String {
        format!("{}.{}", self.key_prefix, identity)
    }

    /// Returns the wrapped store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: PrefsStore> PreferencesBackend for PrefsStorePreferences<S> {
    fn load<'a>(
        &'a self,
        identity: &'a str,
    ) -> PreferencesFuture<'a, Result<Option<PreferenceSnapshot>, String>> {
        Box::pin(async move {
            let key = self.key_for(identity);
            load_pref_with::<S, PreferenceSnapshot>(&self.store, &key).await
        })
    }

    fn save<'a>(
        &'a self,
        identity: &'a str,
        snapshot: &'a PreferenceSnapshot,
    ) -> PreferencesFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let lock = self.save_lock(identity);
            let _guard = lock.lock().await;
            let key = self.key_for(identity);
            let stored = load_pref_with::<S, PreferenceSnapshot>(&self.store, &key).await?;
            let merged = match stored {
                Some(stored) if stored.updated_at_unix_ms > snapshot.updated_at_unix_ms => {
                    return Ok(());
                }
                Some(mut stored) => {
                    stored.merge_from(snapshot.clone());
                    stored
                }
                None => snapshot.clone(),
            };
            save_pref_with(&self.store, &key, &merged).await
        })
    }
}

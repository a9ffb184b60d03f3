//! Raw preference storage: JSON text stored per string key.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use serde::{de::DeserializeOwned, Serialize};

/// Object-safe boxed future used by [`PrefsStore`] async methods.
pub type PrefsStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host service for lightweight preference values (JSON stored as text per key).
///
/// Browser hosts back this with `localStorage` or a remote profile endpoint; the desktop core
/// only ever reaches it through [`crate::PrefsStorePreferences`].
pub trait PrefsStore {
    /// Loads a raw JSON string for a preference key.
    fn load_pref<'a>(
        &'a self,
        key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<Option<String>, String>>;

    /// Saves a raw JSON string for a preference key.
    fn save_pref<'a>(
        &'a self,
        key: &'a str,
        raw_json: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op preference store for hosts without durable storage.
pub struct NoopPrefsStore;

impl PrefsStore for NoopPrefsStore {
    fn load_pref<'a>(
        &'a self,
        _key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<Option<String>, String>> {
        Box::pin(async { Ok(None) })
    }

    fn save_pref<'a>(
        &'a self,
        _key: &'a str,
        _raw_json: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory preference store keyed by string.
///
/// Clones share the same map, so a test can keep one handle for inspection while the runtime
/// owns another.
pub struct MemoryPrefsStore {
    inner: Rc<RefCell<HashMap<String, String>>>,
    writes: Rc<RefCell<Vec<String>>>,
}

impl MemoryPrefsStore {
    /// Returns the raw JSON currently stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.borrow().get(key).cloned()
    }

    /// Returns every key written so far, in write order (repeats included).
    pub fn write_log(&self) -> Vec<String> {
        self.writes.borrow().clone()
    }
}

impl PrefsStore for MemoryPrefsStore {
    fn load_pref<'a>(
        &'a self,
        key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<Option<String>, String>> {
        Box::pin(async move { Ok(self.inner.borrow().get(key).cloned()) })
    }

    fn save_pref<'a>(
        &'a self,
        key: &'a str,
        raw_json: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner
                .borrow_mut()
                .insert(key.to_string(), raw_json.to_string());
            self.writes.borrow_mut().push(key.to_string());
            Ok(())
        })
    }
}

/// Loads and deserializes a typed preference value through a [`PrefsStore`] implementation.
///
/// # Errors
///
/// Returns an error when the store or JSON deserialization fails.
pub async fn load_pref_with<S: PrefsStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> Result<Option<T>, String> {
    let Some(raw) = store.load_pref(key).await? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
    Ok(Some(value))
}

/// Serializes and saves a typed preference value through a [`PrefsStore`] implementation.
///
/// # Errors
///
/// Returns an error when serialization or store save fails.
pub async fn save_pref_with<S: PrefsStore + ?Sized, T: Serialize>(
    store: &S,
    key: &str,
    value: &T,
) -> Result<(), String> {
    let raw = serde_json::to_string(value).map_err(|e| e.to_string())?;
    store.save_pref(key, &raw).await
}

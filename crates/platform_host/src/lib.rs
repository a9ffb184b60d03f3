//! Typed host-domain contracts shared between the desktop runtime and its embedding host.
//!
//! This crate is the API-first boundary for everything the window/process core consumes from
//! outside: the preference store, the wall clock, and the local task spawner. Concrete browser
//! adapters live with the host; the in-memory adapters here back headless runs and tests.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod host;
pub mod storage;
pub mod time;

pub use host::{HostServices, HostStrategy};
pub use storage::preferences::{
    IconPlacement, NoopPreferencesBackend, PreferenceSnapshot, PreferencesBackend,
    PreferencesFuture, PrefsStorePreferences, WindowPlacement, WindowPlacementState,
    PREFERENCE_SNAPSHOT_SCHEMA_VERSION,
};
pub use storage::prefs::{
    load_pref_with, save_pref_with, MemoryPrefsStore, NoopPrefsStore, PrefsStore, PrefsStoreFuture,
};
pub use time::{next_monotonic_timestamp_ms, unix_time_ms_now, Clock, ManualClock, SystemClock};

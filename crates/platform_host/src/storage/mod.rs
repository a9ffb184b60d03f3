//! Preference storage contracts: the raw key/value store and the identity-keyed snapshot backend.

pub mod preferences;
pub mod prefs;

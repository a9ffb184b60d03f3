//! Executor for reducer-emitted runtime effects.

use tracing::trace;

use crate::{
    event_bus::EventBus,
    persistence::{PersistenceSync, SyncChannel},
    reducer::RuntimeEffect,
};

/// Runs `effects` in emission order.
pub fn run_effects(
    effects: Vec<RuntimeEffect>,
    bus: &EventBus,
    persistence: &mut PersistenceSync,
    now_ms: u64,
) {
    for effect in effects {
        match effect {
            RuntimeEffect::Emit(event) => {
                trace!(event = event.token(), "publishing desktop event");
                bus.publish(event);
            }
            RuntimeEffect::PersistPreferences => {
                persistence.request_save(SyncChannel::General, now_ms);
            }
            RuntimeEffect::PersistIconLayout => {
                persistence.request_save(SyncChannel::Icons, now_ms);
            }
        }
    }
}

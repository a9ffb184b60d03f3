//! Window, process, icon, and preference-sync core for the browser desktop shell.

pub mod a11y;
pub mod apps;
pub mod boot;
pub mod config;
pub mod deep_link;
pub mod effect_executor;
pub mod event_bus;
pub mod events;
pub mod icons;
pub mod model;
pub mod persistence;
pub mod process_manager;
pub mod reducer;
pub mod runtime_context;
pub mod scheduler;
pub mod viewport;
pub mod window_manager;

pub use a11y::A11yAnnouncer;
pub use apps::{builtin_app_registry, find_descriptor};
pub use config::{ConfigError, DesktopConfig};
pub use deep_link::{parse_query, DeepLinkState, UrlStateSync};
pub use event_bus::{EventBus, EventFilter, EventPriority, EventPublisher, Subscription};
pub use events::{DesktopEvent, DesktopEventKind};
pub use model::*;
pub use persistence::{
    apply_snapshot, snapshot_from_state, HydrationOutcome, HydrationStatus, PersistenceSync,
    SyncChannel,
};
pub use reducer::{reduce_desktop, DesktopAction, ReducerError, RuntimeEffect};
pub use runtime_context::DesktopRuntime;
pub use viewport::ViewportContext;

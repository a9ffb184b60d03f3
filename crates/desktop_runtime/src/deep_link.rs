//! `?open=` deep links and the observer that mirrors the focused application into the URL.

use std::{cell::RefCell, rc::Rc};

use tracing::debug;

use crate::{
    event_bus::{EventBus, EventFilter, EventPriority, Subscription},
    events::{DesktopEvent, DesktopEventKind},
    model::{AppId, WindowId},
};

const OPEN_PARAM: &str = "open";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeepLinkState {
    /// Applications to launch, in link order, without duplicates.
    pub open: Vec<AppId>,
}

impl DeepLinkState {
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

/// Parses a query string such as `?open=calculator,text-editor&x=1`.
///
/// Repeated `open` parameters accumulate. Ids that are not valid application ids are dropped.
pub fn parse_query(query: &str) -> DeepLinkState {
    let mut state = DeepLinkState::default();
    let pairs = query.trim_start_matches('?').split('&');
    for (key, value) in pairs.filter_map(|pair| pair.split_once('=')) {
        if key != OPEN_PARAM {
            continue;
        }
        for raw in value.split(',').map(str::trim).filter(|raw| !raw.is_empty()) {
            match AppId::new(raw) {
                Ok(app_id) if !state.open.contains(&app_id) => state.open.push(app_id),
                Ok(_) => {}
                Err(reason) => debug!(target = raw, %reason, "ignoring deep-link target"),
            }
        }
    }
    state
}

/// Query string naming `focused`, or empty when nothing is focused.
pub fn query_for(focused: Option<&AppId>) -> String {
    match focused {
        Some(app_id) => format!("?{OPEN_PARAM}={app_id}"),
        None => String::new(),
    }
}

#[derive(Debug, Default)]
struct UrlState {
    focused: Option<(WindowId, AppId)>,
    query: String,
}

/// Keeps a query string in step with the focused process and reports every change to the host.
pub struct UrlStateSync {
    state: Rc<RefCell<UrlState>>,
    _subscription: Subscription,
}

impl UrlStateSync {
    pub fn attach(bus: &EventBus, mut on_change: impl FnMut(&str) + 'static) -> Self {
        let state = Rc::new(RefCell::new(UrlState::default()));
        let observed = Rc::clone(&state);
        let filter = EventFilter::Kinds(vec![
            DesktopEventKind::WindowFocus,
            DesktopEventKind::WindowMinimize,
            DesktopEventKind::WindowClose,
            DesktopEventKind::SessionReset,
        ]);
        let subscription = bus.subscribe(EventPriority::Low, filter, move |event| {
            let mut url = observed.borrow_mut();
            let focused_window = url.focused.as_ref().map(|(window_id, _)| *window_id);
            match event {
                DesktopEvent::WindowFocused {
                    window_id,
                    process_id,
                } => url.focused = Some((*window_id, process_id.clone())),
                DesktopEvent::WindowMinimized { window_id }
                | DesktopEvent::WindowClosed { window_id, .. }
                    if focused_window == Some(*window_id) =>
                {
                    url.focused = None;
                }
                DesktopEvent::SessionReset => url.focused = None,
                _ => return,
            }
            let next = query_for(url.focused.as_ref().map(|(_, app_id)| app_id));
            if next != url.query {
                url.query = next;
                on_change(&url.query);
            }
        });
        Self {
            state,
            _subscription: subscription,
        }
    }

    pub fn query(&self) -> String {
        self.state.borrow().query.clone()
    }
}

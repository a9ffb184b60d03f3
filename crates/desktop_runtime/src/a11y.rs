//! Screen-reader announcements derived from desktop events.
//!
//! The host drains [`A11yAnnouncer::take_messages`] into a polite live region.

use std::{
    cell::RefCell,
    collections::{BTreeMap, VecDeque},
    rc::Rc,
};

use crate::{
    event_bus::{EventBus, EventFilter, EventPriority, Subscription},
    events::DesktopEvent,
    model::{AppId, WindowId, WindowState},
};

const MAX_PENDING: usize = 32;

#[derive(Debug, Default)]
struct AnnouncerState {
    titles: BTreeMap<WindowId, String>,
    process_names: BTreeMap<AppId, String>,
    pending: VecDeque<String>,
}

impl AnnouncerState {
    fn title(&self, window_id: WindowId) -> String {
        self.titles
            .get(&window_id)
            .cloned()
            .unwrap_or_else(|| format!("Window {window_id}"))
    }

    fn message_for(&mut self, event: &DesktopEvent) -> Option<String> {
        match event {
            DesktopEvent::ProcessLaunched {
                process_id,
                display_name,
            } => {
                self.process_names
                    .insert(process_id.clone(), display_name.clone());
                None
            }
            DesktopEvent::WindowOpened {
                window_id, title, ..
            } => {
                self.titles.insert(*window_id, title.clone());
                Some(format!("{title} opened"))
            }
            DesktopEvent::WindowClosed { window_id, .. } => {
                let title = self.title(*window_id);
                self.titles.remove(window_id);
                Some(format!("{title} closed"))
            }
            DesktopEvent::WindowMinimized { window_id } => {
                Some(format!("{} minimized", self.title(*window_id)))
            }
            DesktopEvent::WindowZoomed { window_id, state } => {
                let verb = if *state == WindowState::Maximized {
                    "maximized"
                } else {
                    "restored"
                };
                Some(format!("{} {verb}", self.title(*window_id)))
            }
            DesktopEvent::WindowShaded { window_id, state } => {
                let verb = if *state == WindowState::Shaded {
                    "rolled up"
                } else {
                    "unrolled"
                };
                Some(format!("{} {verb}", self.title(*window_id)))
            }
            DesktopEvent::ProcessTerminated { process_id } => {
                let name = self
                    .process_names
                    .remove(process_id)
                    .unwrap_or_else(|| process_id.to_string());
                Some(format!("{name} quit"))
            }
            DesktopEvent::BootCompleted => Some("Desktop ready".to_string()),
            DesktopEvent::SessionReset => {
                self.titles.clear();
                self.process_names.clear();
                Some("Desktop reset to defaults".to_string())
            }
            _ => None,
        }
    }
}

pub struct A11yAnnouncer {
    state: Rc<RefCell<AnnouncerState>>,
    _subscription: Subscription,
}

impl A11yAnnouncer {
    pub fn attach(bus: &EventBus) -> Self {
        let state = Rc::new(RefCell::new(AnnouncerState::default()));
        let observed = Rc::clone(&state);
        let subscription = bus.subscribe(EventPriority::Low, EventFilter::All, move |event| {
            let mut state = observed.borrow_mut();
            if let Some(message) = state.message_for(event) {
                if state.pending.len() == MAX_PENDING {
                    state.pending.pop_front();
                }
                state.pending.push_back(message);
            }
        });
        Self {
            state,
            _subscription: subscription,
        }
    }

    /// Drains queued messages, oldest first.
    pub fn take_messages(&self) -> Vec<String> {
        self.state.borrow_mut().pending.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn announces_window_lifecycle_with_titles() {
        let bus = EventBus::new();
        let announcer = A11yAnnouncer::attach(&bus);
        let process_id = AppId::trusted("calculator");
        bus.publish(DesktopEvent::ProcessLaunched {
            process_id: process_id.clone(),
            display_name: "Calculator".to_string(),
        });
        bus.publish(DesktopEvent::WindowOpened {
            window_id: WindowId(4),
            process_id: process_id.clone(),
            title: "Calculator".to_string(),
        });
        bus.publish(DesktopEvent::WindowZoomed {
            window_id: WindowId(4),
            state: WindowState::Maximized,
        });
        bus.publish(DesktopEvent::WindowClosed {
            window_id: WindowId(4),
            process_id: process_id.clone(),
        });
        bus.publish(DesktopEvent::ProcessTerminated { process_id });

        assert_eq!(
            announcer.take_messages(),
            vec![
                "Calculator opened",
                "Calculator maximized",
                "Calculator closed",
                "Calculator quit",
            ]
        );
        assert!(announcer.take_messages().is_empty());
    }

    #[test]
    fn backlog_is_bounded() {
        let bus = EventBus::new();
        let announcer = A11yAnnouncer::attach(&bus);
        for _ in 0..40 {
            bus.publish(DesktopEvent::BootCompleted);
        }
        assert_eq!(announcer.take_messages().len(), MAX_PENDING);
    }
}

//! Running-application registry. One process per application id; a process lives exactly as
//! long as it owns at least one window.

use crate::{
    model::{
        AppDescriptor, AppId, LifecycleState, OpenWindowRequest, ProcessRecord, WindowId,
    },
    viewport::ViewportContext,
    window_manager::{ClosedWindow, FocusChange, WindowManager},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The process was already running; its primary window was focused.
    Focused {
        window_id: WindowId,
        change: FocusChange,
    },
    Launched {
        window_id: WindowId,
    },
}

impl LaunchOutcome {
    pub fn window_id(&self) -> WindowId {
        match self {
            Self::Focused { window_id, .. } | Self::Launched { window_id } => *window_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenedWindow {
    pub window_id: WindowId,
    /// True when the open implicitly started the process.
    pub process_created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessManager {
    /// Launch order.
    processes: Vec<ProcessRecord>,
}

impl ProcessManager {
    pub fn processes(&self) -> &[ProcessRecord] {
        &self.processes
    }

    pub fn get(&self, process_id: &AppId) -> Option<&ProcessRecord> {
        self.processes.iter().find(|p| &p.id == process_id)
    }

    fn get_mut(&mut self, process_id: &AppId) -> Option<&mut ProcessRecord> {
        self.processes.iter_mut().find(|p| &p.id == process_id)
    }

    pub fn is_running(&self, process_id: &AppId) -> bool {
        self.get(process_id).is_some()
    }

    /// Focuses the running instance of `descriptor`, or starts it with one window.
    pub fn launch(
        &mut self,
        descriptor: &AppDescriptor,
        windows: &mut WindowManager,
        viewport: &ViewportContext,
        now_ms: u64,
    ) -> LaunchOutcome {
        if let Some(primary) = self
            .get(&descriptor.app_id)
            .and_then(ProcessRecord::primary_window)
        {
            if let Some(change) = windows.focus(primary) {
                return LaunchOutcome::Focused {
                    window_id: primary,
                    change,
                };
            }
        }

        let request = OpenWindowRequest::from_descriptor(descriptor);
        let opened = self.open_window(request, windows, viewport, now_ms);
        LaunchOutcome::Launched {
            window_id: opened.window_id,
        }
    }

    /// Opens a window for `request.process_id`, creating the process when it is not running.
    pub fn open_window(
        &mut self,
        request: OpenWindowRequest,
        windows: &mut WindowManager,
        viewport: &ViewportContext,
        now_ms: u64,
    ) -> OpenedWindow {
        let process_id = request.process_id.clone();
        let display_name = request.title.clone();
        let window_id = windows.open(request, viewport);

        match self.get_mut(&process_id) {
            Some(process) => {
                process.window_ids.push(window_id);
                OpenedWindow {
                    window_id,
                    process_created: false,
                }
            }
            None => {
                self.processes.push(ProcessRecord {
                    id: process_id,
                    display_name,
                    window_ids: vec![window_id],
                    lifecycle: LifecycleState::Running,
                    launched_at_ms: now_ms,
                });
                OpenedWindow {
                    window_id,
                    process_created: true,
                }
            }
        }
    }

    /// Drops `window_id` from its process and returns true when that ended the process.
    pub fn detach_window(&mut self, process_id: &AppId, window_id: WindowId) -> bool {
        let Some(index) = self.processes.iter().position(|p| &p.id == process_id) else {
            return false;
        };
        let process = &mut self.processes[index];
        process.window_ids.retain(|id| *id != window_id);
        if process.window_ids.is_empty() {
            self.processes.remove(index);
            true
        } else {
            false
        }
    }

    /// Closes every owned window, then drops the record. The primary window's geometry is the
    /// one remembered for the process.
    pub fn terminate(
        &mut self,
        process_id: &AppId,
        windows: &mut WindowManager,
    ) -> Option<Vec<ClosedWindow>> {
        let index = self.processes.iter().position(|p| &p.id == process_id)?;
        let process = self.processes.remove(index);
        let primary = process
            .primary_window()
            .and_then(|window_id| windows.get(window_id))
            .map(WindowManager::geometry_of);
        let closed = process
            .window_ids
            .iter()
            .filter_map(|window_id| windows.close(*window_id))
            .collect();
        if let Some(geometry) = primary {
            windows.remember_geometry(process.id, geometry);
        }
        Some(closed)
    }

    pub fn suspend(&mut self, process_id: &AppId) -> bool {
        self.set_lifecycle(process_id, LifecycleState::Running, LifecycleState::Suspended)
    }

    pub fn resume(&mut self, process_id: &AppId) -> bool {
        self.set_lifecycle(process_id, LifecycleState::Suspended, LifecycleState::Running)
    }

    fn set_lifecycle(
        &mut self,
        process_id: &AppId,
        from: LifecycleState,
        to: LifecycleState,
    ) -> bool {
        match self.get_mut(process_id) {
            Some(process) if process.lifecycle == from => {
                process.lifecycle = to;
                true
            }
            _ => false,
        }
    }
}

//! Window collection, z-order, geometry, and the window lifecycle state machine.
//!
//! Every transition is total: unknown ids and transitions that make no sense for the window's
//! current state return `None`/`false` and leave the collection untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    config::WindowConfig,
    model::{AppId, OpenWindowRequest, Point, Size, WindowId, WindowRecord, WindowRect, WindowState},
    viewport::ViewportContext,
};

/// Last known geometry of a process's window, reused when the process opens a window again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RememberedGeometry {
    /// Restored (un-maximized) bounds.
    pub rect: WindowRect,
    pub maximized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusChange {
    /// Already focused and visible.
    Unchanged,
    Raised,
    /// Was minimized and is now back to normal.
    Restored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedWindow {
    pub record: WindowRecord,
    /// Window that inherited focus because the closed window held it.
    pub refocused: Option<WindowId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleActivation {
    pub focus: FocusChange,
    /// New state when this activation completed a double activation.
    pub shade_toggled: Option<WindowState>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowManager {
    config: WindowConfig,
    /// Open order; stacking order lives in `z_index`.
    windows: Vec<WindowRecord>,
    next_window_id: u64,
    next_z: u32,
    /// z allocations since the last renumbering.
    z_allocations: u32,
    remembered: BTreeMap<AppId, RememberedGeometry>,
    last_title_activation: Option<(WindowId, u64)>,
}

impl WindowManager {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            windows: Vec::new(),
            next_window_id: 0,
            next_z: 0,
            z_allocations: 0,
            remembered: BTreeMap::new(),
            last_title_activation: None,
        }
    }

    /// Drops every window and remembered geometry. Window ids keep counting up so ids handed out
    /// before the reset are never reused.
    pub fn clear(&mut self) {
        self.windows.clear();
        self.next_z = 0;
        self.z_allocations = 0;
        self.remembered.clear();
        self.last_title_activation = None;
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn windows(&self) -> &[WindowRecord] {
        &self.windows
    }

    pub fn get(&self, window_id: WindowId) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| w.id == window_id)
    }

    fn get_mut(&mut self, window_id: WindowId) -> Option<&mut WindowRecord> {
        self.windows.iter_mut().find(|w| w.id == window_id)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn focused_window_id(&self) -> Option<WindowId> {
        self.windows.iter().find(|w| w.is_focused).map(|w| w.id)
    }

    /// Window ids from bottom to top.
    pub fn stacking_order(&self) -> Vec<WindowId> {
        let mut ordered: Vec<&WindowRecord> = self.windows.iter().collect();
        ordered.sort_by_key(|w| w.z_index);
        ordered.into_iter().map(|w| w.id).collect()
    }

    pub fn remembered(&self, process_id: &AppId) -> Option<&RememberedGeometry> {
        self.remembered.get(process_id)
    }

    pub fn remembered_geometries(&self) -> &BTreeMap<AppId, RememberedGeometry> {
        &self.remembered
    }

    pub fn remember_geometry(&mut self, process_id: AppId, geometry: RememberedGeometry) {
        self.remembered.insert(process_id, geometry);
    }

    /// Geometry worth persisting for `window`: restored bounds plus the maximized flag.
    pub fn geometry_of(window: &WindowRecord) -> RememberedGeometry {
        match window.state {
            WindowState::Maximized => RememberedGeometry {
                rect: window.saved_geometry.unwrap_or(window.rect),
                maximized: true,
            },
            _ => RememberedGeometry {
                rect: window.rect,
                maximized: false,
            },
        }
    }

    /// Opens a focused window and returns its id.
    ///
    /// Remembered geometry for the process wins; otherwise tall windows are centred and the rest
    /// are centred then cascaded by the number of open windows. A remembered maximized state
    /// reopens the window zoomed.
    pub fn open(&mut self, request: OpenWindowRequest, viewport: &ViewportContext) -> WindowId {
        self.next_window_id += 1;
        let id = WindowId(self.next_window_id);

        let remembered = self.remembered.get(&request.process_id).copied();
        let rect = match remembered {
            Some(geometry) => {
                let size = viewport.fit_size(constrain(
                    geometry.rect.size(),
                    request.min_size,
                    request.max_size,
                    None,
                ));
                WindowRect::from_parts(viewport.clamp_origin(geometry.rect.origin(), size), size)
            }
            None => {
                let size = viewport.fit_size(constrain(
                    request.size,
                    request.min_size,
                    request.max_size,
                    None,
                ));
                let centred = viewport.centered_origin(size);
                let usable_h = viewport.usable_rect().h;
                let tall = i64::from(size.h) * 100
                    > i64::from(usable_h) * i64::from(self.config.tall_window_percent);
                let origin = if tall {
                    centred
                } else {
                    let step = self
                        .config
                        .cascade_offset
                        .saturating_mul(i32::try_from(self.windows.len()).unwrap_or(i32::MAX));
                    viewport.clamp_origin(centred.offset(step, step), size)
                };
                WindowRect::from_parts(origin, size)
            }
        };

        self.windows.push(WindowRecord {
            id,
            process_id: request.process_id,
            title: request.title,
            rect,
            state: WindowState::Normal,
            z_index: 0,
            is_focused: false,
            resizable: request.resizable,
            min_size: request.min_size,
            max_size: request.max_size,
            saved_geometry: None,
        });
        self.focus(id);

        if remembered.is_some_and(|geometry| geometry.maximized) {
            self.zoom(id, viewport);
        }
        id
    }

    /// Removes a window and remembers its geometry for its process.
    pub fn close(&mut self, window_id: WindowId) -> Option<ClosedWindow> {
        let index = self.windows.iter().position(|w| w.id == window_id)?;
        let record = self.windows.remove(index);
        self.remembered
            .insert(record.process_id.clone(), Self::geometry_of(&record));
        if self
            .last_title_activation
            .is_some_and(|(last, _)| last == window_id)
        {
            self.last_title_activation = None;
        }

        let mut refocused = None;
        if record.is_focused {
            let candidate = self
                .windows
                .iter()
                .filter(|w| w.state != WindowState::Minimized)
                .max_by_key(|w| w.z_index)
                .map(|w| w.id);
            if let Some(candidate) = candidate {
                let covered = self.top_window().is_some_and(|top| top != candidate);
                if covered {
                    self.raise(candidate);
                }
                if let Some(window) = self.get_mut(candidate) {
                    window.is_focused = true;
                }
                refocused = Some(candidate);
            }
        }
        Some(ClosedWindow { record, refocused })
    }

    /// Focuses and raises a window, restoring it when minimized.
    pub fn focus(&mut self, window_id: WindowId) -> Option<FocusChange> {
        let window = self.get(window_id)?;
        if window.is_focused && window.state != WindowState::Minimized {
            return Some(FocusChange::Unchanged);
        }
        let was_minimized = window.state == WindowState::Minimized;

        for window in &mut self.windows {
            window.is_focused = false;
        }
        self.raise(window_id);
        let window = self.get_mut(window_id)?;
        window.is_focused = true;
        if was_minimized {
            window.state = WindowState::Normal;
            Some(FocusChange::Restored)
        } else {
            Some(FocusChange::Raised)
        }
    }

    /// Minimizes a normal window. z-order is left untouched.
    pub fn minimize(&mut self, window_id: WindowId) -> bool {
        let Some(window) = self.get_mut(window_id) else {
            return false;
        };
        if window.state != WindowState::Normal {
            return false;
        }
        window.state = WindowState::Minimized;
        window.is_focused = false;
        true
    }

    /// Toggles normal and maximized for resizable windows and focuses the window.
    pub fn zoom(&mut self, window_id: WindowId, viewport: &ViewportContext) -> Option<WindowState> {
        let max_rect = {
            let window = self.get(window_id)?;
            if !window.resizable {
                return None;
            }
            maximized_rect(viewport, window.max_size)
        };
        let window = self.get_mut(window_id)?;
        let next = match window.state {
            WindowState::Normal => {
                window.saved_geometry = Some(window.rect);
                window.rect = max_rect;
                WindowState::Maximized
            }
            WindowState::Maximized => {
                if let Some(saved) = window.saved_geometry.take() {
                    window.rect = saved;
                }
                WindowState::Normal
            }
            WindowState::Minimized | WindowState::Shaded => return None,
        };
        window.state = next;
        self.focus(window_id);
        Some(next)
    }

    /// Moves a normal or shaded window, clamped to the usable area and optionally edge-snapped.
    pub fn move_to(
        &mut self,
        window_id: WindowId,
        position: Point,
        snap: bool,
        viewport: &ViewportContext,
    ) -> Option<Point> {
        let threshold = self.config.snap_threshold;
        let window = self.get_mut(window_id)?;
        if matches!(window.state, WindowState::Minimized | WindowState::Maximized) {
            return None;
        }
        let size = window.rect.size();
        let mut origin = viewport.clamp_origin(position, size);
        if snap {
            origin = snap_to_edges(viewport.usable_rect(), origin, size, threshold);
        }
        window.rect = WindowRect::from_parts(origin, size);
        Some(origin)
    }

    /// Resizes a resizable normal window within its constraints and the usable area.
    pub fn resize(
        &mut self,
        window_id: WindowId,
        size: Size,
        viewport: &ViewportContext,
    ) -> Option<Size> {
        let (min, max) = {
            let window = self.get(window_id)?;
            if !window.resizable || window.state != WindowState::Normal {
                return None;
            }
            (window.min_size, window.max_size)
        };
        let floor = Size::new(self.config.min_width, self.config.min_height);
        let size = viewport.fit_size(constrain(size, min, max, Some(floor)));
        let window = self.get_mut(window_id)?;
        let origin = viewport.clamp_origin(window.rect.origin(), size);
        window.rect = WindowRect::from_parts(origin, size);
        Some(size)
    }

    /// Toggles normal and shaded.
    pub fn toggle_shade(&mut self, window_id: WindowId) -> Option<WindowState> {
        let window = self.get_mut(window_id)?;
        window.state = match window.state {
            WindowState::Normal => WindowState::Shaded,
            WindowState::Shaded => WindowState::Normal,
            WindowState::Minimized | WindowState::Maximized => return None,
        };
        Some(window.state)
    }

    /// Focuses the window and toggles shade on the second activation inside the shade window.
    pub fn activate_title_bar(&mut self, window_id: WindowId, now_ms: u64) -> Option<TitleActivation> {
        let focus = self.focus(window_id)?;
        let double = self.last_title_activation.is_some_and(|(last, at)| {
            last == window_id
                && now_ms.saturating_sub(at) <= self.config.shade_activation_window_ms
        });
        if double {
            self.last_title_activation = None;
            let shade_toggled = self.toggle_shade(window_id);
            Some(TitleActivation {
                focus,
                shade_toggled,
            })
        } else {
            self.last_title_activation = Some((window_id, now_ms));
            Some(TitleActivation {
                focus,
                shade_toggled: None,
            })
        }
    }

    /// Re-fits every window to a new viewport.
    pub fn reclamp_all(&mut self, viewport: &ViewportContext) {
        for window in &mut self.windows {
            if window.state == WindowState::Maximized {
                window.rect = maximized_rect(viewport, window.max_size);
                if let Some(saved) = window.saved_geometry {
                    window.saved_geometry = Some(viewport.clamp_rect(saved));
                }
            } else {
                let size = constrain(window.rect.size(), window.min_size, window.max_size, None);
                window.rect = viewport.clamp_rect(WindowRect::from_parts(window.rect.origin(), size));
            }
        }
    }

    fn top_window(&self) -> Option<WindowId> {
        self.windows.iter().max_by_key(|w| w.z_index).map(|w| w.id)
    }

    /// Assigns the next z-index, renumbering the stack once the allocations since the last
    /// renumbering reach the threshold.
    fn raise(&mut self, window_id: WindowId) {
        self.next_z = self.next_z.saturating_add(1);
        self.z_allocations = self.z_allocations.saturating_add(1);
        let z = self.next_z;
        if let Some(window) = self.get_mut(window_id) {
            window.z_index = z;
        }
        if self.z_allocations >= self.config.z_normalize_threshold {
            self.normalize_z();
        }
    }

    fn normalize_z(&mut self) {
        let order = self.stacking_order();
        for (rank, id) in order.iter().enumerate() {
            let z = u32::try_from(rank + 1).unwrap_or(u32::MAX);
            if let Some(window) = self.get_mut(*id) {
                window.z_index = z;
            }
        }
        self.next_z = u32::try_from(order.len()).unwrap_or(u32::MAX);
        self.z_allocations = 0;
    }
}

/// Applies `min` (or `floor` when the window has no minimum) then `max`.
fn constrain(size: Size, min: Option<Size>, max: Option<Size>, floor: Option<Size>) -> Size {
    let mut w = size.w;
    let mut h = size.h;
    if let Some(min) = min.or(floor) {
        w = w.max(min.w);
        h = h.max(min.h);
    }
    if let Some(max) = max {
        w = w.min(max.w);
        h = h.min(max.h);
    }
    Size::new(w, h)
}

fn maximized_rect(viewport: &ViewportContext, max_size: Option<Size>) -> WindowRect {
    let usable = viewport.usable_rect();
    let mut size = usable.size();
    if let Some(max) = max_size {
        size = Size::new(size.w.min(max.w), size.h.min(max.h));
    }
    let size = viewport.fit_size(size);
    let origin = Point::new(
        usable.x + usable.w.saturating_sub(size.w) / 2,
        usable.y + usable.h.saturating_sub(size.h) / 2,
    );
    WindowRect::from_parts(origin, size)
}

fn snap_to_edges(usable: WindowRect, origin: Point, size: Size, threshold: i32) -> Point {
    let rect = WindowRect::from_parts(origin, size);
    let mut snapped = origin;
    if rect.x.saturating_sub(usable.x) <= threshold {
        snapped.x = usable.x;
    } else if usable.right().saturating_sub(rect.right()) <= threshold {
        snapped.x = usable.right().saturating_sub(size.w);
    }
    if rect.y.saturating_sub(usable.y) <= threshold {
        snapped.y = usable.y;
    } else if usable.bottom().saturating_sub(rect.bottom()) <= threshold {
        snapped.y = usable.bottom().saturating_sub(size.h);
    }
    snapped
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;

    use super::*;

    fn hd() -> ViewportContext {
        ViewportContext::new(1920, 1080, 20, 80)
    }

    fn request(app: &str, w: i32, h: i32) -> OpenWindowRequest {
        OpenWindowRequest::new(AppId::trusted(app), app, Size::new(w, h))
    }

    fn manager() -> WindowManager {
        WindowManager::new(WindowConfig::default())
    }

    fn assert_focus_invariant(wm: &WindowManager) {
        let z: HashSet<u32> = wm.windows().iter().map(|w| w.z_index).collect();
        assert_eq!(z.len(), wm.len(), "z-indices must be distinct");
        assert!(wm.windows().iter().all(|w| w.z_index > 0));
        if let Some(focused) = wm.focused_window_id() {
            assert_eq!(wm.stacking_order().last().copied(), Some(focused));
        }
    }

    #[test]
    fn first_window_opens_centred_in_usable_area() {
        let mut wm = manager();
        let id = wm.open(request("text-editor", 600, 400), &hd());
        let window = wm.get(id).expect("window");
        assert_eq!(window.rect, WindowRect::new(660, 290, 600, 400));
        assert!(window.is_focused);
        assert_eq!(window.z_index, 1);
    }

    #[test]
    fn later_windows_cascade_and_tall_windows_centre() {
        let mut wm = manager();
        let viewport = hd();
        wm.open(request("a", 600, 400), &viewport);
        let second = wm.open(request("b", 600, 400), &viewport);
        assert_eq!(wm.get(second).expect("second").position(), Point::new(684, 314));

        let tall = wm.open(request("c", 600, 700), &viewport);
        assert_eq!(wm.get(tall).expect("tall").position(), Point::new(660, 140));
        assert_focus_invariant(&wm);
    }

    #[test]
    fn z_indices_stay_distinct_and_focus_holds_the_top() {
        let mut wm = manager();
        let viewport = hd();
        let ids: Vec<WindowId> = (0..6)
            .map(|i| wm.open(request(&format!("app{i}"), 400, 300), &viewport))
            .collect();
        for id in [ids[2], ids[0], ids[4], ids[2]] {
            wm.focus(id);
            assert_eq!(wm.focused_window_id(), Some(id));
            assert_focus_invariant(&wm);
        }
    }

    #[test]
    fn normalization_renumbers_densely_and_keeps_order() {
        let mut wm = WindowManager::new(WindowConfig {
            z_normalize_threshold: 10,
            ..WindowConfig::default()
        });
        let viewport = hd();
        let a = wm.open(request("a", 400, 300), &viewport);
        let b = wm.open(request("b", 400, 300), &viewport);
        let c = wm.open(request("c", 400, 300), &viewport);
        for _ in 0..5 {
            wm.focus(a);
            wm.focus(b);
        }
        let order = wm.stacking_order();
        assert_eq!(order, vec![c, a, b]);
        let mut z: Vec<u32> = wm.windows().iter().map(|w| w.z_index).collect();
        z.sort_unstable();
        assert!(z.iter().all(|value| *value <= 10));
        assert_focus_invariant(&wm);
    }

    #[test]
    fn crossing_the_default_threshold_renumbers_one_to_n_in_stacking_order() {
        let threshold = WindowConfig::default().z_normalize_threshold;
        assert_eq!(threshold, 1000);
        let mut wm = manager();
        let viewport = hd();
        let ids: Vec<WindowId> = (0..4)
            .map(|i| wm.open(request(&format!("app{i}"), 400, 300), &viewport))
            .collect();
        wm.minimize(ids[1]);

        let mut turns = [ids[0], ids[2]].into_iter().cycle();
        while wm.z_allocations + 1 < threshold {
            wm.focus(turns.next().expect("cycle"));
        }
        assert_eq!(
            wm.windows().iter().map(|w| w.z_index).max(),
            Some(threshold - 1)
        );

        let before = wm.stacking_order();
        let crossing = turns.next().expect("cycle");
        wm.focus(crossing);

        let mut expected: Vec<WindowId> = before.into_iter().filter(|id| *id != crossing).collect();
        expected.push(crossing);
        assert_eq!(wm.stacking_order(), expected);
        let mut z: Vec<u32> = wm.windows().iter().map(|w| w.z_index).collect();
        z.sort_unstable();
        assert_eq!(z, vec![1, 2, 3, 4]);
        assert_focus_invariant(&wm);
    }

    #[test]
    fn renumbering_restarts_the_allocation_count() {
        let mut wm = WindowManager::new(WindowConfig {
            z_normalize_threshold: 10,
            ..WindowConfig::default()
        });
        let viewport = hd();
        let a = wm.open(request("a", 400, 300), &viewport);
        let b = wm.open(request("b", 400, 300), &viewport);
        for _ in 0..4 {
            wm.focus(a);
            wm.focus(b);
        }
        assert_eq!(wm.z_allocations, 0);
        assert_eq!(wm.get(b).expect("window").z_index, 2);

        for _ in 0..4 {
            wm.focus(a);
            wm.focus(b);
        }
        assert_eq!(wm.z_allocations, 8);
        assert_eq!(wm.get(b).expect("window").z_index, 10);
    }

    #[test]
    fn closing_focused_window_raises_next_visible_window_above_minimized_ones() {
        let mut wm = manager();
        let viewport = hd();
        let bottom = wm.open(request("a", 400, 300), &viewport);
        let middle = wm.open(request("b", 400, 300), &viewport);
        let top = wm.open(request("c", 400, 300), &viewport);
        assert!(wm.minimize(middle));
        wm.focus(top);

        let closed = wm.close(top).expect("closed");
        assert_eq!(closed.refocused, Some(bottom));
        assert_eq!(wm.stacking_order().last().copied(), Some(bottom));
        assert_focus_invariant(&wm);
        assert_eq!(
            wm.remembered(&AppId::trusted("c")).map(|g| g.maximized),
            Some(false)
        );
    }

    #[test]
    fn minimize_clears_focus_and_keeps_z() {
        let mut wm = manager();
        let id = wm.open(request("a", 400, 300), &hd());
        let z = wm.get(id).expect("window").z_index;
        assert!(wm.minimize(id));
        assert!(!wm.minimize(id));
        let window = wm.get(id).expect("window");
        assert_eq!(window.state, WindowState::Minimized);
        assert_eq!(window.z_index, z);
        assert_eq!(wm.focused_window_id(), None);

        assert_eq!(wm.focus(id), Some(FocusChange::Restored));
        assert_eq!(wm.get(id).expect("window").state, WindowState::Normal);
    }

    #[test]
    fn zoom_twice_restores_exact_geometry() {
        let mut wm = manager();
        let viewport = hd();
        let id = wm.open(request("a", 640, 480), &viewport);
        wm.move_to(id, Point::new(123, 77), false, &viewport);
        let before = wm.get(id).expect("window").rect;

        assert_eq!(wm.zoom(id, &viewport), Some(WindowState::Maximized));
        assert_eq!(wm.get(id).expect("window").rect, WindowRect::new(0, 20, 1920, 980));
        assert_eq!(wm.zoom(id, &viewport), Some(WindowState::Normal));
        assert_eq!(wm.get(id).expect("window").rect, before);
    }

    #[test]
    fn maximize_respects_max_size() {
        let mut wm = manager();
        let viewport = hd();
        let mut req = request("a", 640, 480);
        req.max_size = Some(Size::new(1200, 900));
        let id = wm.open(req, &viewport);
        wm.zoom(id, &viewport);
        assert_eq!(
            wm.get(id).expect("window").rect,
            WindowRect::new(360, 60, 1200, 900)
        );
    }

    #[test]
    fn invalid_transitions_are_noops() {
        let mut wm = manager();
        let viewport = hd();
        let id = wm.open(request("a", 640, 480), &viewport);
        let mut fixed = request("fixed", 320, 420);
        fixed.resizable = false;
        let fixed = wm.open(fixed, &viewport);

        assert_eq!(wm.zoom(fixed, &viewport), None);
        assert_eq!(wm.resize(fixed, Size::new(900, 900), &viewport), None);

        wm.minimize(id);
        assert_eq!(wm.zoom(id, &viewport), None);
        assert_eq!(wm.move_to(id, Point::new(5, 5), false, &viewport), None);

        wm.focus(id);
        wm.zoom(id, &viewport);
        assert_eq!(wm.move_to(id, Point::new(5, 5), false, &viewport), None);
        assert_eq!(wm.toggle_shade(id), None);

        wm.zoom(id, &viewport);
        assert_eq!(wm.toggle_shade(id), Some(WindowState::Shaded));
        assert_eq!(wm.resize(id, Size::new(300, 300), &viewport), None);

        assert!(wm.close(WindowId(999)).is_none());
        assert_eq!(wm.focus(WindowId(999)), None);
    }

    #[test]
    fn resize_honours_min_size_over_the_global_floor() {
        let mut wm = manager();
        let viewport = hd();
        let mut req = request("a", 640, 480);
        req.min_size = Some(Size::new(200, 150));
        let id = wm.open(req, &viewport);
        assert_eq!(wm.resize(id, Size::new(10, 10), &viewport), Some(Size::new(200, 150)));

        let plain = wm.open(request("b", 640, 480), &viewport);
        assert_eq!(wm.resize(plain, Size::new(10, 10), &viewport), Some(Size::new(220, 140)));
        assert_eq!(
            wm.resize(plain, Size::new(i32::MAX, i32::MAX), &viewport),
            Some(Size::new(1920, 980))
        );
        let rect = wm.get(plain).expect("window").rect;
        assert_eq!(rect.origin(), Point::new(0, 20));
    }

    #[test]
    fn small_fixed_window_opens_at_its_requested_size() {
        let mut wm = manager();
        let mut req = request("badge", 180, 100);
        req.resizable = false;
        let id = wm.open(req, &hd());
        assert_eq!(wm.get(id).expect("window").rect.size(), Size::new(180, 100));
    }

    #[test]
    fn move_clamps_and_snaps_to_corners() {
        let mut wm = manager();
        let viewport = hd();
        let id = wm.open(request("a", 400, 300), &viewport);

        assert_eq!(
            wm.move_to(id, Point::new(i32::MIN, i32::MAX), false, &viewport),
            Some(Point::new(0, 700))
        );
        assert_eq!(
            wm.move_to(id, Point::new(1505, 38), true, &viewport),
            Some(Point::new(1520, 20))
        );
        assert_eq!(
            wm.move_to(id, Point::new(700, 500), true, &viewport),
            Some(Point::new(700, 500))
        );
    }

    #[test]
    fn double_title_activation_toggles_shade() {
        let mut wm = manager();
        let viewport = hd();
        let id = wm.open(request("a", 400, 300), &viewport);

        let first = wm.activate_title_bar(id, 1_000).expect("known window");
        assert_eq!(first.shade_toggled, None);
        let second = wm.activate_title_bar(id, 1_250).expect("known window");
        assert_eq!(second.shade_toggled, Some(WindowState::Shaded));

        wm.activate_title_bar(id, 2_000);
        let slow = wm.activate_title_bar(id, 2_400).expect("known window");
        assert_eq!(slow.shade_toggled, None);
        assert_eq!(wm.get(id).expect("window").state, WindowState::Shaded);
    }

    #[test]
    fn reopening_a_process_reuses_remembered_maximized_geometry() {
        let mut wm = manager();
        let viewport = hd();
        let id = wm.open(request("a", 640, 480), &viewport);
        wm.move_to(id, Point::new(100, 100), false, &viewport);
        wm.zoom(id, &viewport);
        wm.close(id);

        let reopened = wm.open(request("a", 640, 480), &viewport);
        let window = wm.get(reopened).expect("window");
        assert_eq!(window.state, WindowState::Maximized);
        assert_eq!(window.saved_geometry, Some(WindowRect::new(100, 100, 640, 480)));
    }

    #[test]
    fn reclamp_pulls_windows_into_a_smaller_viewport() {
        let mut wm = manager();
        let id = wm.open(request("a", 640, 480), &hd());
        wm.move_to(id, Point::new(1200, 500), false, &hd());
        let small = ViewportContext::new(800, 600, 20, 80);
        wm.reclamp_all(&small);
        assert_eq!(wm.get(id).expect("window").rect, WindowRect::new(160, 40, 640, 480));
    }
}

//! Desktop icon layout: default column placement, clamped moves, optional grid snap, and the
//! pointer gesture that tells an icon click from an icon drag.

use std::collections::BTreeMap;

use platform_host::IconPlacement;

use crate::{
    config::IconConfig,
    model::{AppDescriptor, AppId, DesktopIcon, IconId, Point},
    viewport::ViewportContext,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconDragSession {
    pub icon_id: IconId,
    pub pointer_start: Point,
    pub origin: Point,
    pub started_at_ms: u64,
    /// Set once the pointer strays past the click distance; the gesture can no longer be a click.
    pub dragging: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconDragEnd {
    /// Short, near-stationary gesture. The icon stays at its origin.
    Click {
        icon_id: IconId,
        process_id: Option<AppId>,
    },
    Moved {
        icon_id: IconId,
        position: Point,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesktopIconLayout {
    config: IconConfig,
    icons: Vec<DesktopIcon>,
    drag: Option<IconDragSession>,
}

impl DesktopIconLayout {
    pub fn new(config: IconConfig) -> Self {
        Self {
            config,
            icons: Vec::new(),
            drag: None,
        }
    }

    pub fn config(&self) -> &IconConfig {
        &self.config
    }

    pub fn icons(&self) -> &[DesktopIcon] {
        &self.icons
    }

    pub fn get(&self, icon_id: &IconId) -> Option<&DesktopIcon> {
        self.icons.iter().find(|icon| &icon.id == icon_id)
    }

    fn get_mut(&mut self, icon_id: &IconId) -> Option<&mut DesktopIcon> {
        self.icons.iter_mut().find(|icon| &icon.id == icon_id)
    }

    pub fn drag_session(&self) -> Option<&IconDragSession> {
        self.drag.as_ref()
    }

    /// Lays out one icon per desktop-visible descriptor in a single column below the menu bar.
    pub fn initialize(&mut self, registry: &[AppDescriptor], viewport: &ViewportContext) {
        self.drag = None;
        self.icons = registry
            .iter()
            .filter(|descriptor| descriptor.show_on_desktop)
            .enumerate()
            .map(|(index, descriptor)| DesktopIcon {
                id: IconId(descriptor.app_id.as_str().to_string()),
                process_id: Some(descriptor.app_id.clone()),
                label: descriptor.icon_label().to_string(),
                position: self.default_position(index, viewport),
            })
            .collect();
    }

    pub fn default_position(&self, index: usize, viewport: &ViewportContext) -> Point {
        let slot = i32::try_from(index).unwrap_or(i32::MAX);
        let y = viewport
            .menu_bar_height
            .saturating_add(self.config.column_top_margin)
            .saturating_add(slot.saturating_mul(self.config.spacing));
        viewport.clamp_icon(Point::new(self.config.column_x, y), self.config.icon_size)
    }

    /// Clamps, optionally snaps to the grid, then clamps again so snapping cannot leave the bounds.
    pub fn place(&self, position: Point, viewport: &ViewportContext) -> Point {
        let clamped = viewport.clamp_icon(position, self.config.icon_size);
        if !self.config.grid_snap {
            return clamped;
        }
        let cell = self.config.grid_cell.max(1);
        let snapped = Point::new(snap(clamped.x, cell), snap(clamped.y, cell));
        viewport.clamp_icon(snapped, self.config.icon_size)
    }

    pub fn move_icon(
        &mut self,
        icon_id: &IconId,
        position: Point,
        viewport: &ViewportContext,
    ) -> Option<Point> {
        let placed = self.place(position, viewport);
        let icon = self.get_mut(icon_id)?;
        icon.position = placed;
        Some(placed)
    }

    pub fn begin_drag(&mut self, icon_id: &IconId, pointer: Point, now_ms: u64) -> bool {
        let Some(origin) = self.get(icon_id).map(|icon| icon.position) else {
            return false;
        };
        self.drag = Some(IconDragSession {
            icon_id: icon_id.clone(),
            pointer_start: pointer,
            origin,
            started_at_ms: now_ms,
            dragging: false,
        });
        true
    }

    /// Follows the pointer with clamping only; the result is not persisted.
    pub fn update_drag(&mut self, pointer: Point, viewport: &ViewportContext) -> Option<(IconId, Point)> {
        let click_distance = self.config.click_distance_px;
        let icon_size = self.config.icon_size;
        let session = self.drag.as_mut()?;
        let (dx, dy) = delta(session.pointer_start, pointer);
        if !within(dx, dy, click_distance) {
            session.dragging = true;
        }
        let position = viewport.clamp_icon(session.origin.offset(dx, dy), icon_size);
        let icon_id = session.icon_id.clone();
        let icon = self.get_mut(&icon_id)?;
        icon.position = position;
        Some((icon_id, position))
    }

    pub fn end_drag(
        &mut self,
        pointer: Point,
        now_ms: u64,
        viewport: &ViewportContext,
    ) -> Option<IconDragEnd> {
        let session = self.drag.take()?;
        let (dx, dy) = delta(session.pointer_start, pointer);
        let elapsed = now_ms.saturating_sub(session.started_at_ms);
        let is_click = !session.dragging
            && within(dx, dy, self.config.click_distance_px)
            && elapsed < self.config.click_duration_ms;

        if is_click {
            let icon = self.get_mut(&session.icon_id)?;
            icon.position = session.origin;
            return Some(IconDragEnd::Click {
                icon_id: session.icon_id,
                process_id: icon.process_id.clone(),
            });
        }

        let position = self.place(session.origin.offset(dx, dy), viewport);
        let icon = self.get_mut(&session.icon_id)?;
        icon.position = position;
        Some(IconDragEnd::Moved {
            icon_id: session.icon_id,
            position,
        })
    }

    /// Applies persisted positions to known icons; unknown ids are ignored.
    pub fn apply_positions(
        &mut self,
        positions: &BTreeMap<String, IconPlacement>,
        viewport: &ViewportContext,
    ) {
        for (id, placement) in positions {
            let placed = self.place(Point::new(placement.x, placement.y), viewport);
            if let Some(icon) = self.get_mut(&IconId(id.clone())) {
                icon.position = placed;
            }
        }
    }

    pub fn positions(&self) -> BTreeMap<String, IconPlacement> {
        self.icons
            .iter()
            .map(|icon| {
                (
                    icon.id.0.clone(),
                    IconPlacement {
                        x: icon.position.x,
                        y: icon.position.y,
                    },
                )
            })
            .collect()
    }

    pub fn reclamp_all(&mut self, viewport: &ViewportContext) {
        let icon_size = self.config.icon_size;
        for icon in &mut self.icons {
            icon.position = viewport.clamp_icon(icon.position, icon_size);
        }
    }
}

fn delta(from: Point, to: Point) -> (i32, i32) {
    (to.x.saturating_sub(from.x), to.y.saturating_sub(from.y))
}

fn within(dx: i32, dy: i32, distance: i32) -> bool {
    let (dx, dy, distance) = (i64::from(dx), i64::from(dy), i64::from(distance));
    dx * dx + dy * dy < distance * distance
}

fn snap(value: i32, cell: i32) -> i32 {
    let rounded = (i64::from(value) + i64::from(cell) / 2).div_euclid(i64::from(cell))
        * i64::from(cell);
    i32::try_from(rounded).unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Size;

    fn registry() -> Vec<AppDescriptor> {
        let mut calc = AppDescriptor::new(AppId::trusted("calculator"), "Calculator", Size::new(320, 420));
        calc.show_on_desktop = true;
        let mut notes = AppDescriptor::new(AppId::trusted("text-editor"), "Text Editor", Size::new(640, 480));
        notes.show_on_desktop = true;
        notes.desktop_icon_label = Some("Notes".to_string());
        let hidden = AppDescriptor::new(AppId::trusted("media-viewer"), "Media", Size::new(800, 600));
        vec![calc, hidden, notes]
    }

    fn layout(config: IconConfig) -> (DesktopIconLayout, ViewportContext) {
        let viewport = ViewportContext::new(1920, 1080, 20, 80);
        let mut layout = DesktopIconLayout::new(config);
        layout.initialize(&registry(), &viewport);
        (layout, viewport)
    }

    fn calc() -> IconId {
        IconId("calculator".to_string())
    }

    #[test]
    fn initialize_stacks_visible_apps_in_one_column() {
        let (layout, _) = layout(IconConfig::default());
        let placed: Vec<(&str, &str, Point)> = layout
            .icons()
            .iter()
            .map(|icon| (icon.id.0.as_str(), icon.label.as_str(), icon.position))
            .collect();
        assert_eq!(
            placed,
            vec![
                ("calculator", "Calculator", Point::new(16, 36)),
                ("text-editor", "Notes", Point::new(16, 132)),
            ]
        );
    }

    #[test]
    fn move_icon_clamps_for_any_magnitude() {
        let (mut layout, viewport) = layout(IconConfig::default());
        assert_eq!(
            layout.move_icon(&calc(), Point::new(i32::MAX, i32::MIN), &viewport),
            Some(Point::new(1848, 20))
        );
        assert_eq!(
            layout.move_icon(&IconId("nope".to_string()), Point::new(0, 0), &viewport),
            None
        );
    }

    #[test]
    fn grid_snap_rounds_then_reclamps() {
        let (mut layout, viewport) = layout(IconConfig {
            grid_snap: true,
            grid_cell: 50,
            ..IconConfig::default()
        });
        assert_eq!(
            layout.move_icon(&calc(), Point::new(124, 276), &viewport),
            Some(Point::new(100, 300))
        );
        // 1848 rounds up to 1850, past the right bound, and is pulled back.
        assert_eq!(
            layout.move_icon(&calc(), Point::new(5000, 5000), &viewport),
            Some(Point::new(1848, 1000))
        );
    }

    #[test]
    fn short_still_gesture_is_a_click_and_keeps_position() {
        let (mut layout, viewport) = layout(IconConfig::default());
        assert!(layout.begin_drag(&calc(), Point::new(20, 40), 1_000));
        layout.update_drag(Point::new(22, 41), &viewport);
        let end = layout.end_drag(Point::new(23, 42), 1_100, &viewport);
        assert_eq!(
            end,
            Some(IconDragEnd::Click {
                icon_id: calc(),
                process_id: Some(AppId::trusted("calculator")),
            })
        );
        assert_eq!(layout.get(&calc()).map(|icon| icon.position), Some(Point::new(16, 36)));
    }

    #[test]
    fn slow_or_far_gesture_is_a_move() {
        let (mut layout, viewport) = layout(IconConfig::default());
        layout.begin_drag(&calc(), Point::new(20, 40), 1_000);
        let slow = layout.end_drag(Point::new(21, 40), 1_400, &viewport);
        assert_eq!(
            slow,
            Some(IconDragEnd::Moved {
                icon_id: calc(),
                position: Point::new(17, 36),
            })
        );

        layout.begin_drag(&calc(), Point::new(20, 40), 2_000);
        assert_eq!(
            layout.update_drag(Point::new(220, 340), &viewport),
            Some((calc(), Point::new(217, 336)))
        );
        // Coming back near the start does not turn a drag into a click.
        let end = layout.end_drag(Point::new(21, 41), 2_050, &viewport);
        assert!(matches!(end, Some(IconDragEnd::Moved { .. })));
        assert!(layout.drag_session().is_none());
    }

    #[test]
    fn hydrated_positions_are_clamped_and_unknown_ids_ignored() {
        let (mut layout, viewport) = layout(IconConfig::default());
        let positions = BTreeMap::from([
            ("calculator".to_string(), IconPlacement { x: -40, y: 300 }),
            ("ghost".to_string(), IconPlacement { x: 1, y: 1 }),
        ]);
        layout.apply_positions(&positions, &viewport);
        assert_eq!(layout.get(&calc()).map(|icon| icon.position), Some(Point::new(0, 300)));
        assert_eq!(layout.positions().len(), 2);
    }
}

//! Viewport geometry and the clamping rules every window and icon placement goes through.

use serde::{Deserialize, Serialize};

use crate::model::{Point, Size, WindowRect};

/// Viewport size plus the chrome heights reserved at the top (menu bar) and bottom (dock).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportContext {
    pub width: i32,
    pub height: i32,
    pub menu_bar_height: i32,
    pub dock_height: i32,
}

impl Default for ViewportContext {
    fn default() -> Self {
        Self::new(1280, 800, 20, 80)
    }
}

impl ViewportContext {
    /// Builds a context, treating negative dimensions as zero.
    pub fn new(width: i32, height: i32, menu_bar_height: i32, dock_height: i32) -> Self {
        Self {
            width: width.max(0),
            height: height.max(0),
            menu_bar_height: menu_bar_height.max(0),
            dock_height: dock_height.max(0),
        }
    }

    /// Area between the menu bar and the dock.
    pub fn usable_rect(&self) -> WindowRect {
        let h = self
            .height
            .saturating_sub(self.menu_bar_height)
            .saturating_sub(self.dock_height)
            .max(0);
        WindowRect::new(0, self.menu_bar_height, self.width, h)
    }

    /// Caps `size` to the usable area. Sizes never drop below one pixel.
    pub fn fit_size(&self, size: Size) -> Size {
        let usable = self.usable_rect();
        Size::new(
            size.w.min(usable.w).max(1),
            size.h.min(usable.h).max(1),
        )
    }

    /// Clamps an origin so a rect of `size` stays inside the usable area.
    ///
    /// When `size` is larger than the usable area the rect pins to the top-left corner.
    pub fn clamp_origin(&self, origin: Point, size: Size) -> Point {
        let usable = self.usable_rect();
        let max_x = usable.right().saturating_sub(size.w).max(usable.x);
        let max_y = usable.bottom().saturating_sub(size.h).max(usable.y);
        Point::new(
            origin.x.max(usable.x).min(max_x),
            origin.y.max(usable.y).min(max_y),
        )
    }

    /// Fits then clamps a whole rect.
    pub fn clamp_rect(&self, rect: WindowRect) -> WindowRect {
        let size = self.fit_size(rect.size());
        WindowRect::from_parts(self.clamp_origin(rect.origin(), size), size)
    }

    /// Centres `size` horizontally in the viewport and vertically in the usable height.
    pub fn centered_origin(&self, size: Size) -> Point {
        let usable = self.usable_rect();
        let x = usable.w.saturating_sub(size.w) / 2;
        let y = usable.h.saturating_sub(size.h) / 2;
        self.clamp_origin(Point::new(x, y), size)
    }

    /// Clamps an icon origin to `[0, W - icon] x [menu bar, H - icon]`.
    pub fn clamp_icon(&self, origin: Point, icon_size: i32) -> Point {
        let max_x = self.width.saturating_sub(icon_size).max(0);
        let max_y = self
            .height
            .saturating_sub(icon_size)
            .max(self.menu_bar_height);
        Point::new(
            origin.x.max(0).min(max_x),
            origin.y.max(self.menu_bar_height).min(max_y),
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn hd() -> ViewportContext {
        ViewportContext::new(1920, 1080, 20, 80)
    }

    #[test]
    fn centred_window_lands_at_expected_origin() {
        assert_eq!(hd().centered_origin(Size::new(600, 400)), Point::new(660, 290));
    }

    #[test]
    fn clamp_keeps_rect_inside_usable_area_for_extreme_inputs() {
        let viewport = hd();
        let usable = viewport.usable_rect();
        for origin in [
            Point::new(i32::MIN, i32::MIN),
            Point::new(i32::MAX, i32::MAX),
            Point::new(-50, 5000),
        ] {
            let rect = viewport.clamp_rect(WindowRect::from_parts(origin, Size::new(800, 600)));
            assert!(rect.x >= usable.x && rect.right() <= usable.right());
            assert!(rect.y >= usable.y && rect.bottom() <= usable.bottom());
        }
    }

    #[test]
    fn oversized_rect_is_fitted_to_usable_area() {
        let viewport = ViewportContext::new(300, 200, 20, 80);
        let rect = viewport.clamp_rect(WindowRect::new(40, 40, 640, 480));
        assert_eq!(rect, WindowRect::new(0, 20, 300, 100));
    }

    #[test]
    fn icon_clamp_uses_full_height_below_menu_bar() {
        let viewport = hd();
        assert_eq!(
            viewport.clamp_icon(Point::new(5000, -10), 72),
            Point::new(1848, 20)
        );
        assert_eq!(
            viewport.clamp_icon(Point::new(-3, 5000), 72),
            Point::new(0, 1008)
        );
    }
}

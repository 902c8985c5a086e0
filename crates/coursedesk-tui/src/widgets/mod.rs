pub mod modal;

use ratatui::layout::Rect;

/// A `width` x `height` rect centered in `area`, shrunk to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_fits_inside() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(centered(area, 60, 10), Rect::new(20, 15, 60, 10));

        let small = Rect::new(0, 0, 30, 8);
        let rect = centered(small, 60, 10);
        assert!(rect.width <= 26 && rect.height <= 6);
    }
}

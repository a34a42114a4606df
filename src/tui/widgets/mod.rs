pub mod calendar_grid;
pub mod color;
pub mod forms;
pub mod help;
pub mod history_view;
pub mod input;
pub mod month_summary;
pub mod schedule_view;
pub mod status_bar;
pub mod tabs;

use ratatui::layout::{Constraint, Flex, Layout, Rect};

/// Centered rect using a percentage of the available area.
/// Based on ratatui popup example: https://ratatui.rs/examples/apps/popup/
pub fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

/// Centered rect of a fixed size, shrunk to fit the area
pub fn fixed_popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Length(height.min(area.height))]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Length(width.min(area.width))]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_popup_is_centered_and_clamped() {
        let area = Rect::new(0, 0, 80, 24);
        let popup = fixed_popup_area(area, 40, 10);
        assert_eq!((popup.x, popup.y, popup.width, popup.height), (20, 7, 40, 10));

        let small = fixed_popup_area(Rect::new(0, 0, 30, 8), 40, 10);
        assert_eq!((small.width, small.height), (30, 8));
    }

    #[test]
    fn percent_popup_stays_inside() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = popup_area(area, 60, 70);
        assert_eq!((popup.width, popup.height), (60, 35));
    }
}

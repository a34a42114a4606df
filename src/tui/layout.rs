use ratatui::layout::{Rect, Layout as RatLayout, Direction, Constraint};

pub struct Layout {
    pub inner_area: Rect,  // Area inside the outer border
    pub tabs_area: Rect,
    pub main_area: Rect,
    pub side_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Minimum terminal dimensions (inside the outer border).
    /// Width fits the month grid (7 cells of 5 columns plus borders);
    /// height fits a six-week month plus tabs and status.
    pub const MIN_WIDTH: u16 = 40;
    pub const MIN_HEIGHT: u16 = 14;

    /// Width of the month grid including its borders
    pub const CALENDAR_WIDTH: u16 = 37;

    pub fn calculate(size: Rect) -> Self {
        let width = size.width.max(Self::MIN_WIDTH + 2);
        let height = size.height.max(Self::MIN_HEIGHT + 2);
        let size = Rect::new(size.x, size.y, width, height);

        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Tabs
                Constraint::Min(1),    // Content
                Constraint::Length(1), // Status
            ])
            .split(inner_area);

        // Side panel only when there is room next to the grid
        let main_width = if inner_area.width >= Self::CALENDAR_WIDTH + 24 {
            Self::CALENDAR_WIDTH
        } else {
            inner_area.width
        };

        let horizontal = RatLayout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(main_width),
                Constraint::Min(0),
            ])
            .split(vertical[1]);

        Self {
            inner_area,
            tabs_area: vertical[0],
            main_area: horizontal[0],
            side_area: horizontal[1],
            status_area: vertical[2],
        }
    }

    /// Full content area (grid and side panel together)
    pub fn content_area(&self) -> Rect {
        self.main_area.union(self.side_area)
    }
}

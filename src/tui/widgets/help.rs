use ratatui::widgets::{Block, Borders, Paragraph, Clear, Wrap};
use ratatui::style::Style;
use ratatui::Frame;
use ratatui::layout::{Rect, Alignment};
use crate::config::KeyBindings;
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::popup_area;

pub fn render_help(f: &mut Frame, area: Rect, bindings: &KeyBindings, palette: &Palette) {
    let popup_area = popup_area(area, 60, 80);
    f.render_widget(Clear, popup_area);

    let style = Style::default().fg(palette.fg).bg(palette.bg);
    let paragraph = Paragraph::new(build_help_text(bindings))
        .block(Block::default()
            .borders(Borders::ALL)
            .title("Help - Key Bindings")
            .title_alignment(Alignment::Center)
            .style(style))
        .style(style)
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, popup_area);
}

fn build_help_text(b: &KeyBindings) -> String {
    let mut text = String::new();

    text.push_str("Navigation:\n");
    text.push_str(&format!("  {} / {}: Switch tabs\n", b.prev_tab, b.next_tab));
    text.push_str(&format!("  {} / {} / {}: Calendar, Schedule, History\n", b.tab_1, b.tab_2, b.tab_3));
    text.push_str("  Arrows: Move between days (Calendar) or rows\n");
    text.push_str(&format!("  {} / {}: Previous / next month\n", b.prev_month, b.next_month));
    text.push_str(&format!("  {}: Back to today\n", b.today));
    text.push('\n');

    text.push_str("Calendar:\n");
    text.push_str(&format!("  {}: Mark day attended / not attended\n", b.toggle_day));
    text.push_str(&format!("  {}: Day details and custom hours\n", b.edit));
    text.push_str(&format!("  {}: Remove custom hours\n", b.clear_override));
    text.push_str(&format!("  {}: Enter the invoiced amount and save the month\n", b.invoice));
    text.push_str(&format!("  {}: Export the month statement (HTML)\n", b.export));
    text.push('\n');

    text.push_str("Schedule:\n");
    text.push_str(&format!("  {}: Enable / disable weekday\n", b.toggle_day));
    text.push_str(&format!("  {}: Edit weekday hours\n", b.edit));
    text.push('\n');

    text.push_str("Forms:\n");
    text.push_str("  Tab / Shift+Tab: Next / previous field\n");
    text.push_str(&format!("  Enter or {}: Save\n", b.save));
    text.push_str("  Esc: Cancel\n");
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Hourly rate\n", b.rate));
    text.push_str(&format!("  {}: Show/hide help\n", b.help));
    text.push_str(&format!("  {}: Quit\n", b.quit));

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_lists_configured_keys() {
        let mut bindings = KeyBindings::default();
        bindings.export = "e".to_string();
        let text = build_help_text(&bindings);
        assert!(text.contains("e: Export the month statement"));
        assert!(text.contains("[ / ]: Previous / next month"));
        assert!(text.contains("Space: Mark day attended"));
    }
}

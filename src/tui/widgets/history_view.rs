use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use crate::calendar::{self, MONTH_NAMES};
use crate::invoices;
use crate::models::MonthInvoice;
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::month_summary::variance_style;
use crate::tui::App;

const BAR_WIDTH: u16 = 3;
const BAR_GAP: u16 = 1;
const GROUP_GAP: u16 = 2;

/// Axis maximum rounded up to 1, 2 or 5 times a power of ten; 100 for an
/// empty or non-positive series
pub fn nice_max(value: f64) -> f64 {
    if value <= 0.0 {
        return 100.0;
    }
    let magnitude = 10f64.powi(value.log10().floor() as i32);
    let normalized = value / magnitude;
    if normalized <= 1.0 {
        magnitude
    } else if normalized <= 2.0 {
        2.0 * magnitude
    } else if normalized <= 5.0 {
        5.0 * magnitude
    } else {
        10.0 * magnitude
    }
}

/// Short axis label, e.g. "Mar 24"
fn month_label(invoice: &MonthInvoice) -> String {
    let name = MONTH_NAMES.get(invoice.month as usize).copied().unwrap_or("?");
    format!("{} {:02}", name.get(..3).unwrap_or(name), invoice.year.rem_euclid(100))
}

fn to_bar_value(amount: Decimal) -> u64 {
    amount.round().to_u64().unwrap_or(0)
}

pub fn render_history(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let base = Style::default().fg(palette.fg).bg(palette.bg);

    if app.invoices.is_empty() {
        let message = Paragraph::new(format!(
            "No saved month yet.\n\nOpen a month on the Calendar tab and press {} to record what the daycare invoiced.",
            app.config.key_bindings.invoice
        ))
        .style(base)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("History").style(base));
        f.render_widget(message, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Min(4)])
        .split(area);

    render_chart(f, chunks[0], app.invoices.list(), palette);
    render_cards(f, chunks[1], app, palette);
}

/// Calculated vs invoiced amount per month, oldest on the left. Only the
/// most recent months that fit the width are drawn.
fn render_chart(f: &mut Frame, area: Rect, invoices: &[MonthInvoice], palette: &Palette) {
    let base = Style::default().fg(palette.fg).bg(palette.bg);
    let group_width = 2 * BAR_WIDTH + BAR_GAP + GROUP_GAP;
    let fits = (area.width.saturating_sub(2) / group_width).max(1) as usize;
    let shown = &invoices[invoices.len().saturating_sub(fits)..];

    let max = shown
        .iter()
        .flat_map(|i| [i.calculated_amount, i.invoiced_amount])
        .max()
        .and_then(|m| m.to_f64())
        .unwrap_or(0.0);

    let calculated_style = base.fg(palette.highlight_bg);
    let invoiced_style = base.fg(palette.override_fg);

    let mut chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Line::from(vec![
                    Span::styled("■ calculated ", calculated_style),
                    Span::styled("■ invoiced", invoiced_style),
                ]))
                .style(base),
        )
        .bar_width(BAR_WIDTH)
        .bar_gap(BAR_GAP)
        .group_gap(GROUP_GAP)
        .max(nice_max(max) as u64)
        .style(base);

    for invoice in shown {
        let bars = [
            Bar::default()
                .value(to_bar_value(invoice.calculated_amount))
                .text_value(format!("{:.0}", invoice.calculated_amount))
                .style(calculated_style),
            Bar::default()
                .value(to_bar_value(invoice.invoiced_amount))
                .text_value(format!("{:.0}", invoice.invoiced_amount))
                .style(invoiced_style),
        ];
        chart = chart.data(BarGroup::default().label(Line::from(month_label(invoice))).bars(&bars));
    }

    f.render_widget(chart, area);
}

fn card(invoice: &MonthInvoice, palette: &Palette) -> ListItem<'static> {
    let base = Style::default().fg(palette.fg).bg(palette.bg);
    let muted = base.fg(palette.muted_fg);
    let hours = invoice
        .calculated_hours
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{:<16}", calendar::month_title(invoice.year, invoice.month)),
                base.add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("{:>10.2}", invoice.calculated_amount), base.add_modifier(Modifier::BOLD)),
        ]),
        Line::from(Span::styled(
            format!("  {} days, {:.1} h", invoice.calculated_days, hours),
            muted,
        )),
    ];

    let variance = invoices::classify(invoice);
    if variance.is_meaningful() {
        lines.push(Line::from(vec![
            Span::styled(format!("  invoiced {:.2}, ", invoice.invoiced_amount), base),
            Span::styled(variance.to_string(), variance_style(variance, palette)),
        ]));
    }
    if !invoice.comment.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("  \"{}\"", invoice.comment),
            base.add_modifier(Modifier::ITALIC),
        )));
    }
    ListItem::new(Text::from(lines))
}

fn render_cards(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let base = Style::default().fg(palette.fg).bg(palette.bg);
    let items: Vec<ListItem> = app.history_rows().map(|invoice| card(invoice, palette)).collect();

    let list = List::new(items)
        .style(base)
        .block(Block::default().borders(Borders::ALL).title("Saved months").style(base))
        .highlight_symbol("▌");
    let mut state = ListState::default().with_selected(Some(app.ui.history_index));
    f.render_stateful_widget(list, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MonthSummary;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn nice_max_rounds_up_to_1_2_5() {
        assert_eq!(nice_max(0.0), 100.0);
        assert_eq!(nice_max(-3.0), 100.0);
        assert_eq!(nice_max(100.0), 100.0);
        assert_eq!(nice_max(130.0), 200.0);
        assert_eq!(nice_max(604.8), 1000.0);
        assert_eq!(nice_max(450.0), 500.0);
        assert_eq!(nice_max(7.5), 10.0);
    }

    #[test]
    fn labels_and_values() {
        let summary = MonthSummary { total_days: 3, total_hours: dec!(13.25), total_amount: dec!(42.40) };
        let invoice = invoices::commit_month(2024, 2, &summary, "40,6", "", Utc::now()).unwrap();
        assert_eq!(month_label(&invoice), "Mar 24");
        assert_eq!(to_bar_value(invoice.calculated_amount), 42);
        assert_eq!(to_bar_value(invoice.invoiced_amount), 41);
    }

    #[test]
    fn label_for_out_of_range_month() {
        let summary = MonthSummary { total_days: 1, total_hours: dec!(9), total_amount: dec!(28.80) };
        let mut invoice = invoices::commit_month(2024, 2, &summary, "", "", Utc::now()).unwrap();
        invoice.month = 12;
        assert_eq!(month_label(&invoice), "? 24");
    }

    #[test]
    fn card_shows_variance_and_comment() {
        let palette = Palette::from_theme(&crate::config::Theme::default());
        let summary = MonthSummary { total_days: 3, total_hours: dec!(13.25), total_amount: dec!(42.40) };
        let invoice = invoices::commit_month(2024, 2, &summary, "40.60", "short week", Utc::now()).unwrap();
        let item = card(&invoice, &palette);
        assert_eq!(item.height(), 4);

        let matching = invoices::commit_month(2024, 2, &summary, "", "", Utc::now()).unwrap();
        assert_eq!(card(&matching, &palette).height(), 2);
    }
}

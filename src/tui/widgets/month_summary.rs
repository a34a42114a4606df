use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use crate::calendar;
use crate::invoices::{self, Variance};
use crate::models::MonthSummary;
use crate::tui::app::{InvoiceField, Mode};
use crate::tui::widgets::color::Palette;
use crate::tui::App;
use rust_decimal::Decimal;

/// Style for a variance: over/under colors, plain when within tolerance
pub fn variance_style(variance: Variance, palette: &Palette) -> Style {
    let base = Style::default().fg(palette.fg).bg(palette.bg);
    match variance {
        Variance::NoDifference => base,
        Variance::OverInvoiced(_) => base.fg(palette.over_invoiced_fg).add_modifier(Modifier::BOLD),
        Variance::UnderInvoiced(_) => base.fg(palette.under_invoiced_fg).add_modifier(Modifier::BOLD),
    }
}

fn summary_lines(summary: &MonthSummary, rate: Decimal, base: Style) -> Vec<Line<'static>> {
    let row = |label: &str, value: String, style: Style| {
        Line::from(vec![
            Span::styled(format!("{:<10}", label), base),
            Span::styled(value, style),
        ])
    };
    vec![
        row("Days", summary.total_days.to_string(), base),
        row("Hours", format!("{:.2} h", summary.total_hours), base),
        row("Rate", format!("{:.2} /h", rate), base),
        row("Amount", format!("{:.2}", summary.total_amount), base.add_modifier(Modifier::BOLD)),
    ]
}

pub fn render_side_panel(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    if area.width == 0 {
        return;
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);

    let base = Style::default().fg(palette.fg).bg(palette.bg);
    let summary = app.summary();

    let summary_block = Paragraph::new(summary_lines(&summary, app.billing.hourly_rate, base))
        .style(base)
        .block(Block::default().borders(Borders::ALL).title("Month").style(base));
    f.render_widget(summary_block, chunks[0]);

    render_invoice_panel(f, chunks[1], app, &summary, palette);
}

fn render_invoice_panel(f: &mut Frame, area: Rect, app: &App, summary: &MonthSummary, palette: &Palette) {
    let base = Style::default().fg(palette.fg).bg(palette.bg);
    let editing = app.ui.mode == Mode::InvoiceForm;
    let form = &app.invoice_form;

    let label = |text: &str, focused: bool| {
        let style = if focused {
            base.fg(palette.highlight_fg).bg(palette.highlight_bg)
        } else {
            base
        };
        Span::styled(format!("{:<9}", text), style)
    };

    let amount_focused = editing && form.field == InvoiceField::Amount;
    let mut amount_line = vec![label("Invoiced", amount_focused)];
    if form.amount.is_empty() && !amount_focused {
        amount_line.push(Span::styled(
            format!("(blank = {:.2})", summary.total_amount),
            base.fg(palette.muted_fg),
        ));
    } else {
        amount_line.extend(form.amount.spans(amount_focused, base));
    }

    let comment_focused = editing && form.field == InvoiceField::Comment;
    let mut comment_line = vec![label("Comment", comment_focused)];
    comment_line.extend(form.comment.spans(comment_focused, base));

    let mut lines = vec![Line::from(amount_line), Line::from(comment_line), Line::default()];

    if let Some(variance) = app.invoice_preview() {
        lines.push(Line::from(vec![
            Span::styled("Difference ", base),
            Span::styled(variance.to_string(), variance_style(variance, palette)),
        ]));
    }

    match app.stored_invoice() {
        Some(invoice) => {
            let variance = invoices::classify(invoice);
            lines.push(Line::from(Span::styled(
                format!(
                    "Saved {} ({} days, {:.2})",
                    invoice.saved_at.with_timezone(&chrono::Local).format("%d/%m/%Y %H:%M"),
                    invoice.calculated_days,
                    invoice.calculated_amount
                ),
                base.fg(palette.muted_fg),
            )));
            if variance.is_meaningful() {
                lines.push(Line::from(Span::styled(
                    format!("Invoice {}", variance),
                    variance_style(variance, palette),
                )));
            }
            if invoice.calculated_amount != summary.total_amount {
                lines.push(Line::from(Span::styled(
                    "Hours changed since last save",
                    base.fg(palette.over_invoiced_fg),
                )));
            }
        }
        None => lines.push(Line::from(Span::styled("Not saved yet", base.fg(palette.muted_fg)))),
    }

    let border_style = if editing { base.fg(palette.highlight_bg) } else { base };
    let title = format!("Invoice {}", calendar::month_key(app.ui.year, app.ui.month0));
    let paragraph = Paragraph::new(lines)
        .style(base)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).border_style(border_style).title(title).style(base));
    f.render_widget(paragraph, area);
}

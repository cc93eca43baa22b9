//! Shared text formatting helpers for TUI rendering.

use pipedash_core::schema::{cell_text, Column};
use pipedash_core::types::{GeneratedContent, GeneratedDataItem, ReportRow};
use pipedash_core::{Message, Sender};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Label and style for a conversation entry.
pub fn sender_label(sender: Sender) -> (&'static str, Style) {
    match sender {
        Sender::User => ("you", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Sender::Assistant => ("assistant", Style::default().fg(Color::Green)),
    }
}

/// Greedy word wrap on character counts. Line breaks in `text` are kept and
/// words longer than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = text.lines().flat_map(|line| wrap_line(line, width)).collect();
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn wrap_line(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.trim_end().to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        // Hard-split words that can never fit
        while word.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > width && current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Conversation as display lines, pre-wrapped to `width` so scrolling can
/// count them exactly.
pub fn chat_lines(messages: &[Message], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let body_width = width.saturating_sub(2);

    for (idx, msg) in messages.iter().enumerate() {
        if idx > 0 {
            lines.push(Line::raw(""));
        }

        let (label, style) = sender_label(msg.sender);
        lines.push(Line::from(Span::styled(label, style)));

        let text_style = if msg.sender == Sender::Assistant && msg.text.starts_with("Erro") {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        for line in wrap_text(&msg.text, body_width) {
            lines.push(Line::from(Span::styled(format!("  {}", line), text_style)));
        }
    }

    lines
}

/// Rows as aligned text, one line per row plus a header and a rule.
pub fn table_lines(rows: &[ReportRow], columns: &[Column]) -> Vec<Line<'static>> {
    let widths: Vec<usize> = columns
        .iter()
        .map(|col| {
            rows.iter()
                .map(|row| cell_text(row, col).chars().count())
                .chain(std::iter::once(col.header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let pad = |text: &str, width: usize| {
        let len = text.chars().count();
        format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| pad(&col.header, *w))
        .collect();
    lines.push(Line::from(Span::styled(
        format!("  {}", header.join(" │ ")),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )));

    let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    lines.push(Line::from(Span::styled(
        format!("  {}", rule.join("─┼─")),
        Style::default().fg(Color::DarkGray),
    )));

    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| pad(&cell_text(row, col), *w))
            .collect();
        lines.push(Line::raw(format!("  {}", cells.join(" │ "))));
    }

    lines
}

/// Generated data items as display lines.
///
/// `columns_for` picks the columns of each CSV item.
pub fn data_lines(
    items: &[GeneratedDataItem],
    columns_for: impl Fn(&[ReportRow]) -> Vec<Column>,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            lines.push(Line::raw(""));
        }

        lines.push(Line::from(vec![
            Span::styled(
                item.filename.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  [{}]", item.content.kind()),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

        match &item.content {
            GeneratedContent::Csv(rows) => {
                let columns = columns_for(rows);
                if columns.is_empty() {
                    lines.push(Line::styled("  (empty)", Style::default().fg(Color::DarkGray)));
                } else {
                    lines.extend(table_lines(rows, &columns));
                }
            }
            GeneratedContent::Json(value) => {
                let pretty =
                    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                for line in pretty.lines() {
                    lines.push(Line::raw(format!("  {}", line)));
                }
            }
        }
    }

    lines
}

/// Human readable byte count.
pub fn format_bytes(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f < KB {
        format!("{} B", bytes)
    } else if bytes_f < KB * KB {
        format!("{:.1} KB", bytes_f / KB)
    } else {
        format!("{:.1} MB", bytes_f / (KB * KB))
    }
}

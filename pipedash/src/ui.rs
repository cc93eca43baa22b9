//! UI rendering for the TUI.
//!
//! Everything drawn here is derived from the view model plus the app's
//! scroll state; nothing in this module changes the model.

use chrono::Local;
use pipedash_core::chart::ChartHandle;
use pipedash_core::schema::cell_text;
use pipedash_core::{ServerStatus, Tab};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Scrollbar,
        ScrollbarOrientation, ScrollbarState, Table, Wrap,
    },
    Frame,
};

use crate::app::App;
use crate::message_format::{chat_lines, data_lines, format_bytes};

/// Border color for the conversation block
const BORDER_CHAT: Color = Color::Rgb(80, 160, 80);
/// Border color for the report and chart blocks
const BORDER_PIPELINE: Color = Color::Rgb(0, 150, 150);
/// Border color for the chat data block
const BORDER_DATA: Color = Color::Rgb(180, 100, 180);
/// Border color for the acknowledgement popup
const BORDER_NOTICE: Color = Color::Rgb(255, 180, 100);
/// Label color for chart metadata
const LABEL_COLOR: Color = Color::Rgb(100, 180, 180);

/// Render the application UI.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    let active = app.model().active_tab();

    // Layout: tab header, body, input (chat only), footer
    let input_height = if active == Tab::Chat { 3 } else { 0 };
    let chunks = Layout::vertical([
        Constraint::Length(2),            // Tab header
        Constraint::Min(5),               // Body
        Constraint::Length(input_height), // Message input
        Constraint::Length(1),            // Footer
    ])
    .split(area);

    render_tab_header(frame, app, chunks[0]);
    match active {
        Tab::Chat => {
            render_chat(frame, app, chunks[1]);
            render_input(frame, app, chunks[2]);
        }
        Tab::Pipeline => render_pipeline(frame, app, chunks[1]),
        Tab::ChatData => render_chat_data(frame, app, chunks[1]),
    }
    render_footer(frame, app, chunks[3]);

    if let Some(notice) = app.model().notice() {
        render_notice(frame, notice, area);
    }
}

/// Render the app name, tabs, and server status.
fn render_tab_header(frame: &mut Frame, app: &App, area: Rect) {
    // Layout: app name on left, tabs in the middle, status on the right
    let chunks = Layout::horizontal([
        Constraint::Length(11), // App name
        Constraint::Min(1),     // Tabs
        Constraint::Length(40), // Status
    ])
    .split(area);

    let app_name = Paragraph::new(" pipedash").style(Style::default().fg(Color::Cyan).bold());
    frame.render_widget(app_name, chunks[0]);

    let active_style = Style::default()
        .fg(Color::Cyan)
        .bold()
        .add_modifier(Modifier::UNDERLINED);
    let inactive_style = Style::default().fg(Color::DarkGray);

    let mut spans = Vec::new();
    for tab in Tab::ALL {
        if !spans.is_empty() {
            spans.push(Span::raw("  "));
        }
        let style = if tab == app.model().active_tab() {
            active_style
        } else {
            inactive_style
        };
        spans.push(Span::styled(
            format!(" {} {} ", tab.index() + 1, tab.title()),
            style,
        ));
    }
    let tabs = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(tabs, chunks[1]);

    let mut status_spans = Vec::new();
    if let Some(op) = app.model().in_flight() {
        status_spans.push(Span::styled(
            format!("⟳ {}  ", op.label()),
            Style::default().fg(Color::Yellow),
        ));
    }
    status_spans.push(match app.model().status() {
        ServerStatus::Online(_) => Span::styled("● online", Style::default().fg(Color::Green)),
        ServerStatus::Offline => Span::styled("● offline", Style::default().fg(Color::Red)),
        ServerStatus::Unknown => Span::styled("○ connecting", Style::default().fg(Color::DarkGray)),
    });
    let status = Paragraph::new(Line::from(status_spans))
        .alignment(Alignment::Right)
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(status, chunks[2]);
}

// ========== Chat ==========

fn render_chat(frame: &mut Frame, app: &mut App, area: Rect) {
    let inner_width = area.width.saturating_sub(3) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;

    let lines = if app.model().conversation().is_empty() {
        vec![Line::styled(
            "No messages yet. Type below and press Enter.",
            Style::default().fg(Color::DarkGray),
        )]
    } else {
        chat_lines(app.model().conversation(), inner_width)
    };

    // Clamp scroll offset; following pins it to the last page
    let max_scroll = lines.len().saturating_sub(inner_height);
    if app.chat_follow || app.chat_scroll >= max_scroll {
        app.chat_scroll = max_scroll;
        app.chat_follow = true;
    }

    let line_count = lines.len();
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_CHAT))
                .title(" Chat ")
                .title_style(Style::default().fg(BORDER_CHAT).bold()),
        )
        .scroll((scroll_offset(app.chat_scroll), 0));
    frame.render_widget(paragraph, area);

    render_scrollbar(frame, area, line_count, app.chat_scroll);
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let model = app.model();
    let (title, border) = if model.is_busy() {
        (" Message (waiting) ", Style::default().fg(Color::DarkGray))
    } else {
        (" Message ", Style::default().fg(Color::Yellow))
    };

    // Show the tail of long input so the cursor stays visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let input = model.input();
    let visible: String = {
        let count = input.chars().count();
        let skip = count.saturating_sub(inner_width.saturating_sub(1));
        input.chars().skip(skip).collect()
    };
    let cursor_x = area.x + 1 + visible.chars().count() as u16;

    let paragraph = Paragraph::new(visible).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border)
            .title(title),
    );
    frame.render_widget(paragraph, area);

    if model.notice().is_none() {
        frame.set_cursor_position((cursor_x, area.y + 1));
    }
}

// ========== Pipeline ==========

fn render_pipeline(frame: &mut Frame, app: &mut App, area: Rect) {
    // Layout: report table, chart details
    let chunks = Layout::vertical([
        Constraint::Min(5),    // Report
        Constraint::Length(5), // Chart
    ])
    .split(area);

    render_report(frame, app, chunks[0]);
    render_chart(frame, app.model().chart(), chunks[1]);
}

fn render_report(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_PIPELINE))
        .title(format!(" Report ({} rows) ", app.model().report().len()))
        .title_style(Style::default().fg(BORDER_PIPELINE).bold());

    let columns = app.model().report_columns();
    if columns.is_empty() {
        let placeholder = Paragraph::new("No data. Press Ctrl+P to run the pipeline.")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let header_cells = columns
        .iter()
        .map(|col| Cell::from(col.header.clone()).style(Style::default().fg(Color::Yellow).bold()));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .model()
        .report()
        .iter()
        .map(|row| Row::new(columns.iter().map(|col| Cell::from(cell_text(row, col)))))
        .collect();

    let widths = vec![Constraint::Fill(1); columns.len()];
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(table, area, &mut app.report_state);
}

fn render_chart(frame: &mut Frame, chart: Option<&ChartHandle>, area: Rect) {
    let label = Style::default().fg(LABEL_COLOR);
    let lines = match chart {
        Some(chart) => {
            let size = match chart.dimensions() {
                Some((w, h)) => format!("{}×{} · {}", w, h, format_bytes(chart.len())),
                None => format_bytes(chart.len()),
            };
            vec![
                Line::from(vec![
                    Span::styled("File:    ", label),
                    Span::raw(chart.path().display().to_string()),
                ]),
                Line::from(vec![
                    Span::styled("Image:   ", label),
                    Span::raw(size),
                    Span::styled(
                        format!("  sha256 {}", chart.short_digest()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Fetched: ", label),
                    Span::raw(
                        chart
                            .fetched_at()
                            .with_timezone(&Local)
                            .format("%H:%M:%S")
                            .to_string(),
                    ),
                ]),
            ]
        }
        None => vec![Line::styled(
            "No chart available.",
            Style::default().fg(Color::DarkGray),
        )],
    };

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER_PIPELINE))
            .title(" Chart "),
    );
    frame.render_widget(paragraph, area);
}

// ========== Chat data ==========

fn render_chat_data(frame: &mut Frame, app: &mut App, area: Rect) {
    let model = app.model();
    let lines = if model.generated().is_empty() {
        vec![Line::styled(
            "No generated data yet.",
            Style::default().fg(Color::DarkGray),
        )]
    } else {
        data_lines(model.generated(), |rows| model.columns_for(rows))
    };
    let title = format!(" Chat Data ({} items) ", model.generated().len());

    let inner_height = area.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(inner_height);
    if app.data_scroll > max_scroll {
        app.data_scroll = max_scroll;
    }

    let line_count = lines.len();
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_DATA))
                .title(title)
                .title_style(Style::default().fg(BORDER_DATA).bold()),
        )
        .scroll((scroll_offset(app.data_scroll), 0));
    frame.render_widget(paragraph, area);

    render_scrollbar(frame, area, line_count, app.data_scroll);
}

// ========== Shared ==========

/// Paragraph scroll offsets are u16; longer content saturates instead of wrapping.
fn scroll_offset(line: usize) -> u16 {
    u16::try_from(line).unwrap_or(u16::MAX)
}

fn render_scrollbar(frame: &mut Frame, area: Rect, content_length: usize, position: usize) {
    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("↑"))
        .end_symbol(Some("↓"));

    let mut scrollbar_state = ScrollbarState::new(content_length).position(position);

    frame.render_stateful_widget(
        scrollbar,
        area.inner(Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut scrollbar_state,
    );
}

fn render_notice(frame: &mut Frame, notice: &str, area: Rect) {
    let popup = centered_rect(60, 7, area);
    frame.render_widget(Clear, popup);

    let lines = vec![
        Line::raw(notice.to_string()),
        Line::raw(""),
        Line::from(vec![
            Span::styled("Enter", Style::default().fg(Color::Yellow)),
            Span::raw(" ok"),
        ]),
    ];
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_NOTICE))
                .title(" Notice ")
                .title_style(Style::default().fg(BORDER_NOTICE).bold()),
        );
    frame.render_widget(paragraph, popup);
}

/// A `width` x `height` rectangle centered in `area`, shrunk to fit.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let mut spans = match app.model().active_tab() {
        Tab::Chat => vec![
            Span::styled(" Enter", key),
            Span::raw(" send  "),
            Span::styled("Esc", key),
            Span::raw(" clear input  "),
        ],
        Tab::Pipeline | Tab::ChatData => vec![
            Span::styled(" 1-3", key),
            Span::raw(" tabs  "),
            Span::styled("q", key),
            Span::raw(" quit  "),
        ],
    };
    spans.extend([
        Span::styled("Tab", key),
        Span::raw(" switch  "),
        Span::styled("^P", key),
        Span::raw(" run pipeline  "),
        Span::styled("^L", key),
        Span::raw(" clear context  "),
        Span::styled("^R", key),
        Span::raw(" refresh  "),
        Span::styled("^C", key),
        Span::raw(" quit  "),
        Span::raw("│ "),
        Span::styled(app.server_label.clone(), Style::default().fg(Color::DarkGray)),
    ]);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

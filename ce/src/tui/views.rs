//! TUI views and rendering
//!
//! All drawing happens here. Views read the session and the app state and
//! never modify either, apart from the scroll bounds cached in `AppState`
//! that only the renderer can compute.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout as Split, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph, Row, Table,
    TableState, Wrap,
};
use tracing::trace;

use super::state::{AppState, InteractionMode};
use crate::api::SUGGESTED_PROMPTS;
use crate::conversation::ConversationTurn;
use crate::render::{AxisRange, BarChartView, ChartView, RenderedView, ScatterChartView, TableView};
use crate::session::{Layout, SessionController};

mod colors {
    use ratatui::style::Color;

    pub const HEADER: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const KEYBIND: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const QUESTION: Color = Color::Rgb(0, 255, 127); // Spring green
    pub const ANSWER: Color = Color::Rgb(100, 149, 237); // Cornflower blue
    pub const PENDING: Color = Color::Rgb(255, 215, 0); // Gold
    pub const FAILED: Color = Color::Rgb(220, 20, 60); // Crimson
    pub const BAR: Color = Color::Rgb(70, 130, 180); // Steel blue
    pub const POINT: Color = Color::Rgb(255, 165, 0); // Orange
    pub const HIGHLIGHT: Color = Color::Rgb(255, 255, 0); // Yellow
    pub const SELECTED_BG: Color = Color::Rgb(40, 40, 40);
    pub const DIM: Color = Color::DarkGray;
}

/// Main render function
pub fn render(state: &mut AppState, session: &SessionController, frame: &mut Frame) {
    trace!(layout = ?session.layout(), "render: called");
    let chunks = Split::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    render_header(state, session, frame, chunks[0]);
    match session.layout() {
        Layout::Empty => render_empty_layout(state, frame, chunks[1]),
        Layout::Active => render_active_layout(state, session, frame, chunks[1]),
    }
    render_footer(state, session, frame, chunks[2]);

    if state.interaction_mode == InteractionMode::Help {
        render_help_overlay(frame, frame.area());
    }
}

fn render_header(state: &AppState, session: &SessionController, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(
            " Census Data Explorer",
            Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" │ "),
        Span::styled(format!("source: {}", session.client_name()), Style::default().fg(colors::DIM)),
    ];
    if session.layout() == Layout::Active {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            format!("{} questions", session.turns().len()),
            Style::default().fg(colors::DIM),
        ));
    }
    if state.busy {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(thinking_label(state), Style::default().fg(colors::PENDING)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn thinking_label(state: &AppState) -> String {
    let word = if state.thinking_word.is_empty() {
        "Thinking"
    } else {
        state.thinking_word.as_str()
    };
    match state.thinking_start {
        Some(start) => format!("{}... ({}s)", word, start.elapsed().as_secs()),
        None => format!("{}...", word),
    }
}

/// Prompt screen shown before the first question
fn render_empty_layout(state: &AppState, frame: &mut Frame, area: Rect) {
    trace!("render_empty_layout: called");
    let column = centered_rect(70, 80, area);
    let chunks = Split::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Length(2), // Subtitle
            Constraint::Length(3), // Input
            Constraint::Length(1), // Spacer
            Constraint::Min(0),    // Suggestions
        ])
        .split(column);

    let title = Paragraph::new(Line::from(Span::styled(
        "Census Data Explorer",
        Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    let subtitle = Paragraph::new("Ask questions about New York census data and see the answer as a chart.")
        .style(Style::default().fg(colors::DIM))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(subtitle, chunks[1]);

    render_input(state, frame, chunks[2]);

    let mut lines = vec![Line::from(Span::styled(
        "Try one of these:",
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    for (i, prompt) in SUGGESTED_PROMPTS.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("  [{}] ", i + 1), Style::default().fg(colors::KEYBIND)),
            Span::raw(*prompt),
        ]));
    }
    frame.render_widget(Paragraph::new(lines), chunks[4]);
}

/// Log and input on the left, chart and table on the right
fn render_active_layout(state: &mut AppState, session: &SessionController, frame: &mut Frame, area: Rect) {
    trace!("render_active_layout: called");
    let columns = Split::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(42), Constraint::Percentage(58)])
        .split(area);

    let left = Split::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(columns[0]);
    render_log(state, session, frame, left[0]);
    render_input(state, frame, left[1]);

    let right = Split::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(columns[1]);
    match session.displayed_view() {
        Some(view) => {
            render_chart(state, view, frame, right[0]);
            render_table(state, &view.table, frame, right[1]);
        }
        None => {
            let message = if session.log().last_fulfilled().is_some() {
                "The latest answer has no chart."
            } else {
                "The chart for your answer will appear here."
            };
            render_placeholder(frame, right[0], " Chart ", message);
            render_placeholder(frame, right[1], " Data ", "");
        }
    }
}

fn turn_lines<'a>(turn: &'a ConversationTurn, failed: bool, state: &AppState) -> Vec<Line<'a>> {
    let mut lines = vec![Line::from(vec![
        Span::styled("> ", Style::default().fg(colors::QUESTION).add_modifier(Modifier::BOLD)),
        Span::styled(turn.question.as_str(), Style::default().fg(colors::QUESTION)),
    ])];

    match &turn.answer {
        Some(answer) => {
            for text in answer.text_answer.lines() {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(text, Style::default().fg(colors::ANSWER)),
                ]));
            }
            if let Some(detail) = answer.error_detail() {
                lines.push(Line::from(Span::styled(
                    format!("  ✗ {}", detail),
                    Style::default().fg(colors::FAILED),
                )));
            }
            if let Some(payload) = &answer.payload {
                let title = payload.title().filter(|t| !t.is_empty()).unwrap_or(payload.kind());
                lines.push(Line::from(Span::styled(
                    format!("  ▤ {}", title),
                    Style::default().fg(colors::DIM),
                )));
            }
        }
        None if failed => lines.push(Line::from(Span::styled(
            "  ✗ request failed",
            Style::default().fg(colors::FAILED),
        ))),
        None => lines.push(Line::from(Span::styled(
            format!("  {}", thinking_label(state)),
            Style::default().fg(colors::PENDING).add_modifier(Modifier::ITALIC),
        ))),
    }
    lines.push(Line::from(""));
    lines
}

fn render_log(state: &mut AppState, session: &SessionController, frame: &mut Frame, area: Rect) {
    trace!(turns = session.turns().len(), "render_log: called");
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Conversation ")
        .border_style(Style::default().fg(colors::HEADER));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    for turn in session.turns() {
        let failed = session.is_failed(turn.id);
        lines.extend(turn_lines(turn, failed, state));
    }
    if !session.orphans().is_empty() {
        lines.push(Line::from(Span::styled(
            format!("  {} answer(s) arrived for questions no longer waiting", session.orphans().len()),
            Style::default().fg(colors::DIM),
        )));
    }

    // Wrapped height decides how far the log can scroll
    let viewport_height = inner.height as usize;
    let viewport_width = inner.width as usize;
    let content_height: usize = lines
        .iter()
        .map(|line| {
            let width = line.width();
            if viewport_width == 0 || width == 0 { 1 } else { width.div_ceil(viewport_width) }
        })
        .sum();

    let max_scroll = content_height.saturating_sub(viewport_height);
    state.log_max_scroll = max_scroll;
    state.log_page = viewport_height.max(1);
    let scroll = state.log_scroll.unwrap_or(max_scroll).min(max_scroll);

    let log = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll.min(u16::MAX as usize) as u16, 0));
    frame.render_widget(log, inner);
}

fn render_input(state: &AppState, frame: &mut Frame, area: Rect) {
    let focused = state.interaction_mode == InteractionMode::Input;
    let border = if focused { colors::HEADER } else { colors::DIM };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Ask a question ")
        .border_style(Style::default().fg(border));
    let inner = block.inner(area);

    let text_style = if state.busy {
        Style::default().fg(colors::DIM)
    } else {
        Style::default().fg(Color::White)
    };
    let line = if state.input.is_empty() {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(colors::QUESTION).add_modifier(Modifier::BOLD)),
            Span::styled("e.g. Which county has the most people?", Style::default().fg(colors::DIM)),
        ])
    } else {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(colors::QUESTION).add_modifier(Modifier::BOLD)),
            Span::styled(state.input.as_str(), text_style),
        ])
    };
    frame.render_widget(Paragraph::new(line).block(block), area);

    if focused {
        let cursor_col = state.input[..state.cursor_pos.min(state.input.len())].chars().count() as u16;
        let x = inner.x.saturating_add(2).saturating_add(cursor_col);
        if x < inner.right() {
            frame.set_cursor_position((x, inner.y));
        }
    }
}

fn render_chart(state: &AppState, view: &RenderedView, frame: &mut Frame, area: Rect) {
    trace!(points = view.series_len(), "render_chart: called");
    let title = if view.title.is_empty() {
        " Chart ".to_string()
    } else {
        format!(" {} ", view.title)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(colors::HEADER));

    match &view.chart {
        ChartView::Bar(bar) => render_bar_chart(state, bar, block, frame, area),
        ChartView::Scatter(scatter) => render_scatter_chart(state, scatter, block, frame, area),
        ChartView::Unsupported { kind } => {
            let kind = if kind.is_empty() { "(missing)" } else { kind.as_str() };
            let warning = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "⚠ Unsupported chart type",
                    Style::default().fg(colors::PENDING).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(format!("chart_type: {}", kind), Style::default().fg(colors::DIM))),
            ])
            .alignment(Alignment::Center)
            .block(block);
            frame.render_widget(warning, area);
        }
    }
}

/// Height units of the tallest possible bar
const BAR_RESOLUTION: u64 = 1000;

/// Bar height in units of [`BAR_RESOLUTION`] relative to the axis maximum
///
/// Negatives and non-finite values draw as empty bars.
fn bar_height(value: f64, axis_max: f64) -> u64 {
    if !(value.is_finite() && value > 0.0 && axis_max.is_finite() && axis_max > 0.0) {
        return 0;
    }
    ((value / axis_max * BAR_RESOLUTION as f64).round() as u64).min(BAR_RESOLUTION)
}

fn render_bar_chart(state: &AppState, view: &BarChartView, block: Block, frame: &mut Frame, area: Rect) {
    let inner_width = block.inner(area).width as usize;
    let count = view.bars.len().max(1);
    let gap = 1u16;
    let bar_width = (inner_width.saturating_sub(count.saturating_sub(1)) / count).clamp(1, 14) as u16;

    let bars: Vec<Bar> = view
        .bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let color = if state.table_selection == Some(i) {
                colors::HIGHLIGHT
            } else {
                colors::BAR
            };
            Bar::default()
                .value(bar_height(bar.value, view.value_axis.max))
                .label(Line::from(bar.label.clone()))
                .text_value(format_compact(bar.value))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect();

    let block = block.title_bottom(Line::from(Span::styled(
        format!(
            " {} by {} · axis {} to {} ",
            axis_title(&view.y_axis_title, "value"),
            axis_title(&view.x_axis_title, "category"),
            format_compact(view.value_axis.min),
            format_compact(view.value_axis.max),
        ),
        Style::default().fg(colors::DIM),
    )));

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(gap)
        .max(BAR_RESOLUTION);
    frame.render_widget(chart, area);
}

fn render_scatter_chart(state: &AppState, view: &ScatterChartView, block: Block, frame: &mut Frame, area: Rect) {
    let points: Vec<(f64, f64)> = view.points.iter().map(|p| (p.x, p.y)).collect();
    let selected = state.table_selection.and_then(|i| view.points.get(i));
    let highlighted: Vec<(f64, f64)> = selected.iter().map(|p| (p.x, p.y)).collect();

    let mut datasets = vec![
        Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(colors::POINT))
            .data(&points),
    ];
    if !highlighted.is_empty() {
        datasets.push(
            Dataset::default()
                .marker(Marker::Block)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(colors::HIGHLIGHT))
                .data(&highlighted),
        );
    }

    let block = match selected {
        Some(point) => block.title_bottom(Line::from(Span::styled(
            format!(" ► {} ({}, {}) ", point.label, format_compact(point.x), format_compact(point.y)),
            Style::default().fg(colors::HIGHLIGHT),
        ))),
        None => block,
    };

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(numeric_axis(axis_title(&view.x_axis_title, "x"), view.x_axis))
        .y_axis(numeric_axis(axis_title(&view.y_axis_title, "y"), view.y_axis));
    frame.render_widget(chart, area);
}

fn numeric_axis(title: &str, range: AxisRange) -> Axis<'static> {
    let mid = range.min + range.span() / 2.0;
    Axis::default()
        .title(Span::styled(title.to_string(), Style::default().fg(colors::DIM)))
        .style(Style::default().fg(colors::DIM))
        .bounds([range.min, range.max])
        .labels(vec![format_compact(range.min), format_compact(mid), format_compact(range.max)])
}

fn axis_title<'a>(title: &'a str, fallback: &'a str) -> &'a str {
    if title.trim().is_empty() { fallback } else { title }
}

fn render_table(state: &AppState, table: &TableView, frame: &mut Frame, area: Rect) {
    trace!(rows = table.len(), "render_table: called");
    let focused = state.interaction_mode == InteractionMode::Table;
    let border = if focused { colors::HEADER } else { colors::DIM };
    let title = if focused { " Data (j/k to inspect) " } else { " Data (Tab to inspect) " };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(border));

    if table.is_empty() {
        frame.render_widget(
            Paragraph::new("No rows to show.")
                .style(Style::default().fg(colors::DIM))
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let widths: Vec<Constraint> = table
        .column_widths()
        .into_iter()
        .map(|w| Constraint::Length(w.clamp(4, 40) as u16))
        .collect();
    let header = Row::new(table.headers.clone()).style(Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = table.rows.iter().map(|r| Row::new(r.clone())).collect();

    let widget = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(2)
        .row_highlight_style(Style::default().bg(colors::SELECTED_BG).fg(colors::HIGHLIGHT))
        .highlight_symbol("► ");

    let mut table_state = TableState::default().with_selected(state.table_selection);
    frame.render_stateful_widget(widget, area, &mut table_state);
}

fn render_placeholder(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .border_style(Style::default().fg(colors::DIM));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(message.to_string())
            .style(Style::default().fg(colors::DIM))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        centered_rect(90, 30, inner),
    );
}

fn render_footer(state: &AppState, session: &SessionController, frame: &mut Frame, area: Rect) {
    let line = if let Some(error) = &state.error_message {
        Line::from(Span::styled(format!(" {}", error), Style::default().fg(colors::FAILED)))
    } else if let Some(error) = session.submit_error() {
        Line::from(Span::styled(format!(" ✗ {}", error), Style::default().fg(colors::FAILED)))
    } else {
        let keybinds: &[(&str, &str)] = match (state.interaction_mode, session.layout()) {
            (InteractionMode::Table, _) => &[("[j/k]", "Inspect row"), ("[Tab]", "Back"), ("[?]", "Help"), ("[q]", "Quit")],
            (_, Layout::Empty) => &[("[Enter]", "Ask"), ("[1-5]", "Suggestion"), ("[?]", "Help"), ("[Ctrl+C]", "Quit")],
            (_, Layout::Active) => &[
                ("[Enter]", "Ask"),
                ("[↑/↓]", "Scroll"),
                ("[Tab]", "Table"),
                ("[?]", "Help"),
                ("[Ctrl+C]", "Quit"),
            ],
        };
        let mut spans = vec![Span::raw(" ")];
        for (key, desc) in keybinds {
            spans.push(Span::styled(*key, Style::default().fg(colors::KEYBIND)));
            spans.push(Span::raw(format!(" {}  ", desc)));
        }
        Line::from(spans)
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    trace!("render_help_overlay: called");
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                .fg(colors::HEADER),
        )),
        Line::from(""),
        Line::from(Span::styled("Question", Style::default().add_modifier(Modifier::BOLD))),
        key_line("Enter", "Ask the question"),
        key_line("Esc", "Clear the input"),
        key_line("1-5", "Ask a suggested question (start screen)"),
        key_line("←/→ Home End", "Move the cursor"),
        Line::from(""),
        Line::from(Span::styled("Conversation", Style::default().add_modifier(Modifier::BOLD))),
        key_line("↑/↓", "Scroll one line"),
        key_line("PgUp/PgDn", "Scroll one page"),
        Line::from(""),
        Line::from(Span::styled("Data table", Style::default().add_modifier(Modifier::BOLD))),
        key_line("Tab", "Focus the table / back to input"),
        key_line("j/k", "Inspect next / previous row"),
        Line::from(""),
        Line::from(Span::styled("General", Style::default().add_modifier(Modifier::BOLD))),
        key_line("?/F1", "Toggle help"),
        key_line("q", "Quit (when the input is empty)"),
        key_line("Ctrl+C", "Quit"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help (? to close) ")
                .style(Style::default().bg(Color::Black)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(help, popup_area);
}

fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{:<14}", key), Style::default().fg(colors::KEYBIND)),
        Span::raw(desc),
    ])
}

/// Helper to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Split::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Split::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Short number for labels (e.g., "1.6M", "89.3K", "45.2")
fn format_compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000_000.0 {
        format!("{:.1}B", value / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if abs >= 10_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else if value.fract() == 0.0 {
        format!("{}", value)
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::api::{FixtureCensusApi, ScriptedReply};
    use crate::payload::{BarSeries, ChartPayload, ScatterSeries};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let area = buffer.area;
        let mut text = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn draw(state: &mut AppState, session: &SessionController) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| render(state, session, frame)).unwrap();
        buffer_text(&terminal)
    }

    async fn answered(reply: ScriptedReply, question: &str) -> SessionController {
        let mut session = SessionController::new(Arc::new(FixtureCensusApi::scripted(vec![reply])));
        session.submit(question).unwrap();
        session.wait().await;
        session
    }

    #[test]
    fn test_empty_layout_lists_suggestions() {
        let session = SessionController::new(Arc::new(FixtureCensusApi::scripted(vec![])));
        let mut state = AppState::new();
        let text = draw(&mut state, &session);

        assert!(text.contains("Census Data Explorer"));
        for prompt in SUGGESTED_PROMPTS {
            assert!(text.contains(prompt), "missing suggestion: {}", prompt);
        }
    }

    #[tokio::test]
    async fn test_bar_answer_draws_log_chart_and_table() {
        let series = BarSeries::new(
            vec!["New York".into(), "Kings".into(), "Queens".into()],
            vec![1629054.0, 1596273.0, 1472654.0],
            "County",
            "Population",
            "Most Populous",
        )
        .unwrap();
        let session = answered(
            ScriptedReply::answer("Manhattan leads.", Some(series.into())),
            "Show me population by county",
        )
        .await;
        let mut state = AppState::new();
        state.sync_session(&session);
        let text = draw(&mut state, &session);

        assert!(text.contains("> Show me population by county"));
        assert!(text.contains("Manhattan leads."));
        assert!(text.contains("Most Populous"));
        assert!(text.contains("1629054"));
        assert!(text.contains("Queens"));
    }

    #[tokio::test]
    async fn test_fractional_bar_values_draw_visible_bars() {
        let series = BarSeries::new(
            vec!["Hamilton".into(), "Essex".into(), "Putnam".into()],
            vec![0.12, 0.35, 0.08],
            "County",
            "Vacancy Rate",
            "Vacancy Rates",
        )
        .unwrap();
        let session = answered(
            ScriptedReply::answer("Essex has the most vacant homes.", Some(series.into())),
            "Which counties have vacant homes?",
        )
        .await;
        let mut state = AppState::new();
        state.sync_session(&session);
        let text = draw(&mut state, &session);

        assert!(text.contains("Vacancy Rates"));
        assert!(text.contains('█'), "fractional bars should be drawn");
    }

    #[tokio::test]
    async fn test_scatter_selection_shows_point_label() {
        let series = ScatterSeries::new(
            vec!["Erie".into(), "Monroe".into()],
            vec![35.6, 44.1],
            vec![54320.0, 65780.0],
            "College Graduates (%)",
            "Median Income ($)",
            "Income vs Education",
        )
        .unwrap();
        let session = answered(ScriptedReply::answer("Strong correlation.", Some(series.into())), "q").await;
        let mut state = AppState::new();
        state.sync_session(&session);
        state.interaction_mode = InteractionMode::Table;
        state.table_selection = Some(1);
        let text = draw(&mut state, &session);

        assert!(text.contains("► Monroe (44.1, 65.8K)"));
    }

    #[tokio::test]
    async fn test_unsupported_chart_shows_warning() {
        let payload = ChartPayload::from_value(serde_json::json!({"chart_type": "heatmap"})).unwrap();
        let session = answered(ScriptedReply::answer("Here is a heatmap.", Some(payload)), "q").await;
        let mut state = AppState::new();
        let text = draw(&mut state, &session);

        assert!(text.contains("Unsupported chart type"));
        assert!(text.contains("chart_type: heatmap"));
    }

    #[tokio::test]
    async fn test_failed_request_is_marked_in_log() {
        let session = answered(ScriptedReply::Unreachable, "Show me population by county").await;
        let mut state = AppState::new();
        let text = draw(&mut state, &session);

        assert!(text.contains("request failed"));
        assert!(text.contains("Unable to connect to the census data service."));
    }

    #[test]
    fn test_help_overlay() {
        let session = SessionController::new(Arc::new(FixtureCensusApi::scripted(vec![])));
        let mut state = AppState::new();
        state.interaction_mode = InteractionMode::Help;
        let text = draw(&mut state, &session);
        assert!(text.contains("Keyboard Shortcuts"));
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(1629054.0), "1.6M");
        assert_eq!(format_compact(89283.0), "89.3K");
        assert_eq!(format_compact(2850.0), "2850");
        assert_eq!(format_compact(45.26), "45.3");
        assert_eq!(format_compact(0.0), "0");
    }

    #[test]
    fn test_bar_height_clamps_negative() {
        assert_eq!(bar_height(-5.0, 10.0), 0);
        assert_eq!(bar_height(f64::NAN, 10.0), 0);
        assert_eq!(bar_height(5.0, 0.0), 0);
        assert_eq!(bar_height(10.0, 10.0), BAR_RESOLUTION);
    }

    #[test]
    fn test_fractional_bars_scale_to_axis() {
        let heights: Vec<u64> = [0.12, 0.35, 0.08].iter().map(|v| bar_height(*v, 0.35)).collect();
        assert_eq!(heights, vec![343, 1000, 229]);
        assert!(heights.iter().all(|h| *h > 0));

        let heights: Vec<u64> = [1629054.0, 953671.0].iter().map(|v| bar_height(*v, 1629054.0)).collect();
        assert_eq!(heights, vec![1000, 585]);
    }
}

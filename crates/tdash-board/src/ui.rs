use crate::app::App;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tdash_core::{AgeBucket, AgeView, AgedStatus, StatusKey, TableRow};
use tdash_pipeline::project::{pad3, CountBox, PanelCard};
use tdash_pipeline::{AgedCounts, DashboardView, DisplayCell};
use tdash_storage::CacheStore;

const COMPACT_WIDTH: u16 = 92;
const NAME_WIDTH: usize = 22;
const MAX_TABLE_COLUMNS: usize = 6;

#[derive(Clone, Copy)]
pub struct BoardTheme {
    bg: Color,
    surface: Color,
    border: Color,
    title: Color,
    text: Color,
    muted: Color,
    accent: Color,
    ok: Color,
    warn: Color,
    critical: Color,
    info: Color,
}

pub fn board_theme() -> BoardTheme {
    BoardTheme {
        bg: Color::Rgb(11, 18, 32),
        surface: Color::Rgb(17, 26, 46),
        border: Color::Rgb(71, 85, 105),
        title: Color::Rgb(191, 219, 254),
        text: Color::Rgb(226, 232, 240),
        muted: Color::Rgb(148, 163, 184),
        accent: Color::Rgb(56, 189, 248),
        ok: Color::Rgb(34, 197, 94),
        warn: Color::Rgb(245, 158, 11),
        critical: Color::Rgb(239, 68, 68),
        info: Color::Rgb(59, 130, 246),
    }
}

fn status_color(status: StatusKey, theme: BoardTheme) -> Color {
    match status {
        StatusKey::Open => theme.info,
        StatusKey::Hold => theme.warn,
        StatusKey::InProgress => theme.ok,
        StatusKey::Escalated => theme.critical,
        StatusKey::Unassigned => theme.accent,
        StatusKey::Total => theme.title,
    }
}

fn panel_block(title: String, theme: BoardTheme, bg: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .style(Style::default().bg(bg))
        .title(Span::styled(
            title,
            Style::default()
                .fg(theme.title)
                .add_modifier(Modifier::BOLD),
        ))
}

pub fn render_ui<S>(frame: &mut ratatui::Frame, app: &App<S>) {
    let size = frame.size();
    let theme = board_theme();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(size);
    frame.render_widget(render_header(app, theme, size.width), layout[0]);

    let view = &app.view;
    if view.tables.is_empty() {
        frame.render_widget(render_body(view, theme, size.width), layout[1]);
    } else {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(layout[1]);
        frame.render_widget(render_body(view, theme, size.width), split[0]);
        frame.render_widget(render_tables(view, theme, size.width), split[1]);
    }

    frame.render_widget(render_footer(app, theme, size.width), layout[2]);
    if app.help_open {
        render_help_overlay(frame, theme);
    }
}

fn legend_spans(view: &DashboardView, theme: BoardTheme, compact: bool) -> Vec<Span<'static>> {
    let mut statuses = vec![
        StatusKey::Open,
        StatusKey::Hold,
        StatusKey::InProgress,
        StatusKey::Escalated,
        StatusKey::Unassigned,
    ];
    if view.legend.total.is_some() {
        statuses.push(StatusKey::Total);
    }
    let mut spans = Vec::new();
    for status in statuses {
        let Some(value) = view.legend.formatted(status) else {
            continue;
        };
        if !spans.is_empty() {
            spans.push(Span::styled(" | ", Style::default().fg(theme.muted)));
        }
        let label = if compact {
            status.as_str().to_string()
        } else {
            status.label().to_string()
        };
        spans.push(Span::styled(
            format!("{label} "),
            Style::default().fg(theme.muted),
        ));
        spans.push(Span::styled(
            value,
            Style::default()
                .fg(status_color(status, theme))
                .add_modifier(Modifier::BOLD),
        ));
    }
    spans
}

fn render_header<S>(app: &App<S>, theme: BoardTheme, width: u16) -> Paragraph<'static> {
    let compact = is_compact(width);
    let view = &app.view;
    let inner_width = width.saturating_sub(4) as usize;
    let statuses = view
        .projection
        .statuses()
        .iter()
        .map(|status| status.as_str())
        .collect::<Vec<_>>()
        .join(",");
    let fields = vec![
        format!("Unassigned #{}", view.badge),
        format!("Sort: {}", view.sort.label()),
        format!("Statuses: {statuses}"),
        format!("Agents: {}", view.candidate_count()),
    ];
    let mut second = fit_fields(&fields, inner_width.max(12));
    if let Some(note) = app.status_note.as_deref() {
        let candidate = format!("{second} | {note}");
        if candidate.chars().count() <= inner_width {
            second = candidate;
        }
    }

    Paragraph::new(Text::from(vec![
        Line::from(legend_spans(view, theme, compact)),
        Line::from(Span::styled(second, Style::default().fg(theme.muted))),
    ]))
    .style(Style::default().fg(theme.text).bg(theme.bg))
    .block(panel_block("Tickets".to_string(), theme, theme.bg))
}

fn box_spans(boxes: &[CountBox], theme: BoardTheme, compact: bool) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for count_box in boxes {
        let label = if compact {
            count_box.status.as_str().chars().take(1).collect::<String>()
        } else {
            count_box.status.label().to_string()
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!("[{label} {}]", count_box.count),
            Style::default().fg(status_color(count_box.status, theme)),
        ));
    }
    spans
}

fn cell_line(cell: &DisplayCell, theme: BoardTheme, compact: bool) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("{:<width$}", ellipsize(&cell.candidate_name, NAME_WIDTH), width = NAME_WIDTH),
        Style::default().fg(theme.text),
    )];
    spans.extend(box_spans(&cell.boxes, theme, compact));
    Line::from(spans)
}

fn card_line(card: &PanelCard, theme: BoardTheme, compact: bool) -> Line<'static> {
    let name_style = if card.synthesized {
        Style::default().fg(theme.muted)
    } else {
        Style::default().fg(theme.text)
    };
    let mut spans = vec![Span::styled(
        format!("{:<width$}", ellipsize(&card.name, NAME_WIDTH), width = NAME_WIDTH),
        name_style,
    )];
    spans.extend(box_spans(&card.boxes, theme, compact));
    Line::from(spans)
}

fn render_body(view: &DashboardView, theme: BoardTheme, width: u16) -> Paragraph<'static> {
    let compact = is_compact(width);
    let (title, lines) = match &view.department {
        Some(panel) => {
            let title = if view.department_count > 1 {
                format!(
                    "‹ {} ({}/{}) ›",
                    panel.label, view.department_index, view.department_count
                )
            } else {
                panel.label.clone()
            };
            let lines = if panel.cards.is_empty() {
                vec![Line::from(Span::styled(
                    "No agents with tickets in this department",
                    Style::default().fg(theme.muted),
                ))]
            } else {
                panel
                    .cards
                    .iter()
                    .map(|card| card_line(card, theme, compact))
                    .collect()
            };
            (title, lines)
        }
        None => {
            let lines = if view.grid.cells.is_empty() {
                vec![Line::from(Span::styled(
                    "No agents with open tickets",
                    Style::default().fg(theme.muted),
                ))]
            } else {
                view.grid
                    .cells
                    .iter()
                    .map(|cell| cell_line(cell, theme, compact))
                    .collect()
            };
            ("Agents".to_string(), lines)
        }
    };
    Paragraph::new(Text::from(lines))
        .style(Style::default().fg(theme.text).bg(theme.surface))
        .block(panel_block(title, theme, theme.surface))
}

fn section_title(title: &str, theme: BoardTheme) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD),
    ))
}

fn aged_fields(counts: &AgedCounts, buckets: &[AgeBucket]) -> Vec<String> {
    buckets
        .iter()
        .map(|bucket| {
            let per_status = AgedStatus::ALL
                .iter()
                .map(|status| counts.get(*status).get(*bucket).to_string())
                .collect::<Vec<_>>()
                .join("/");
            format!("{} {per_status}", bucket.label())
        })
        .collect()
}

fn table_row_line(row: &TableRow, columns: &[String], max: usize) -> String {
    let fields: Vec<String> = columns
        .iter()
        .map(|column| row.text(column).unwrap_or_else(|| "-".to_string()))
        .collect();
    fit_fields(&fields, max)
}

fn push_generic_table(
    lines: &mut Vec<Line<'static>>,
    title: &str,
    rows: &[TableRow],
    theme: BoardTheme,
    max: usize,
) {
    lines.push(section_title(title, theme));
    let Some(first) = rows.first() else {
        lines.push(Line::from(Span::styled(
            "  no rows",
            Style::default().fg(theme.muted),
        )));
        return;
    };
    let columns: Vec<String> = first
        .fields
        .keys()
        .take(MAX_TABLE_COLUMNS)
        .cloned()
        .collect();
    lines.push(Line::from(Span::styled(
        format!("  {}", fit_fields(&columns, max)),
        Style::default().fg(theme.muted),
    )));
    for row in rows {
        lines.push(Line::from(format!("  {}", table_row_line(row, &columns, max))));
    }
}

fn render_tables(view: &DashboardView, theme: BoardTheme, width: u16) -> Paragraph<'static> {
    let inner_width = width.saturating_sub(6) as usize;
    let tables = &view.tables;
    let mut lines = Vec::new();

    if let Some(rows) = &tables.agents {
        let buckets: Vec<String> = tables
            .agent_buckets
            .iter()
            .map(|bucket| bucket.label().to_string())
            .collect();
        lines.push(section_title(
            &format!("Agent ageing ({}) open/hold/progress/escalated", buckets.join(", ")),
            theme,
        ));
        for row in rows {
            let mut fields = vec![ellipsize(&row.agent_name, NAME_WIDTH)];
            fields.extend(aged_fields(&row.counts, &tables.agent_buckets));
            lines.push(Line::from(format!("  {}", fit_fields(&fields, inner_width))));
        }
    }

    if let Some(rows) = &tables.departments {
        lines.push(section_title("Departments", theme));
        for row in rows {
            let mut fields = vec![
                ellipsize(&row.department_name, NAME_WIDTH),
                format!("agents {}", row.agent_count),
                format!("total {}", pad3(row.counts.total())),
            ];
            fields.extend(aged_fields(&row.counts, &AgeBucket::ALL));
            lines.push(Line::from(format!("  {}", fit_fields(&fields, inner_width))));
        }
    }

    if let Some(rows) = &tables.pending {
        lines.push(section_title("Pending", theme));
        for row in rows {
            let fields = vec![
                ellipsize(&row.agent_name, NAME_WIDTH),
                format!("hold {}", row.hold),
                format!("in progress {}", row.in_progress),
                format!("escalated {}", row.escalated),
                format!("total {}", row.total()),
            ];
            lines.push(Line::from(format!("  {}", fit_fields(&fields, inner_width))));
        }
    }

    if let Some(rows) = &tables.metrics {
        push_generic_table(&mut lines, "Metrics", rows, theme, inner_width);
    }

    if let Some(rows) = &tables.archived {
        push_generic_table(&mut lines, "Archived", rows, theme, inner_width);
    }

    Paragraph::new(Text::from(lines))
        .style(Style::default().fg(theme.text).bg(theme.surface))
        .block(panel_block("Tables".to_string(), theme, theme.surface))
}

fn render_footer<S>(app: &App<S>, theme: BoardTheme, width: u16) -> Paragraph<'static> {
    let view = &app.view;
    let inner_width = width.saturating_sub(4) as usize;
    let refreshed = app
        .status
        .last_refresh
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    let mut fields = vec![
        format!("Page {}/{}", view.grid.page.page, view.total_pages().max(1)),
        format!("Data: {}", app.status.label()),
        format!("Refreshed: {refreshed}"),
    ];
    if view.department_count > 0 {
        fields.insert(
            1,
            format!("Dept {}/{}", view.department_index, view.department_count),
        );
    }
    if !is_compact(width) {
        fields.push("? help".to_string());
    }
    let color = if app.status.is_stale() {
        theme.warn
    } else {
        theme.muted
    };
    Paragraph::new(Line::from(Span::styled(
        fit_fields(&fields, inner_width.max(12)),
        Style::default().fg(color),
    )))
    .style(Style::default().fg(theme.text).bg(theme.bg))
    .block(panel_block("Status".to_string(), theme, theme.bg))
}

fn render_help_overlay(frame: &mut ratatui::Frame, theme: BoardTheme) {
    let area = centered_rect(70, 70, frame.size());
    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ))
    };
    let lines = vec![
        heading("View"),
        Line::from("  s        toggle sort order"),
        Line::from("  t        cycle status columns"),
        Line::from("  ←/→      previous/next department"),
        Line::from("  PgUp/PgDn previous/next page"),
        Line::from(""),
        heading("Tables"),
        Line::from("  a        agent ageing buckets"),
        Line::from("  d        department summary"),
        Line::from("  p        pending tickets"),
        Line::from("  m        metrics"),
        Line::from("  x        archived tickets"),
        Line::from(""),
        heading("Session & Exit"),
        Line::from("  r        refresh now"),
        Line::from("  ? or F1  toggle this help"),
        Line::from("  Esc      close help"),
        Line::from("  q        quit"),
    ];
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .style(Style::default().fg(theme.text).bg(theme.surface))
            .block(panel_block("Help".to_string(), theme, theme.surface))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
        ])
        .split(vertical[1])[1]
}

fn ellipsize(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    if max <= 3 {
        return "...".chars().take(max).collect();
    }
    let prefix: String = input.chars().take(max - 3).collect();
    format!("{prefix}...")
}

fn fit_fields(fields: &[String], max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let mut output = String::new();
    for field in fields {
        if field.trim().is_empty() {
            continue;
        }
        let candidate = if output.is_empty() {
            field.clone()
        } else {
            format!("{output} | {field}")
        };
        if candidate.chars().count() <= max {
            output = candidate;
            continue;
        }
        if output.is_empty() {
            return ellipsize(field, max);
        }
        break;
    }
    output
}

fn is_compact(width: u16) -> bool {
    width < COMPACT_WIDTH
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Quit,
    Refresh,
}

pub fn handle_input<S: CacheStore>(event: Event, app: &mut App<S>) -> KeyAction {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(key, app),
        _ => KeyAction::None,
    }
}

pub fn handle_key<S: CacheStore>(key: KeyEvent, app: &mut App<S>) -> KeyAction {
    if matches!(key.code, KeyCode::Char('?') | KeyCode::F(1)) {
        app.help_open = !app.help_open;
        return KeyAction::None;
    }
    if key.code == KeyCode::Esc && app.help_open {
        app.help_open = false;
        return KeyAction::None;
    }
    if app.help_open {
        return KeyAction::None;
    }

    match key.code {
        KeyCode::Char('q') => return KeyAction::Quit,
        KeyCode::Char('r') => {
            app.status_note = Some("refresh requested".to_string());
            return KeyAction::Refresh;
        }
        KeyCode::Char('s') => app.toggle_sort(),
        KeyCode::Char('t') => app.cycle_status_preset(),
        KeyCode::Right | KeyCode::Char('l') => app.next_department(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_department(),
        KeyCode::PageDown | KeyCode::Char('n') => app.next_page(),
        KeyCode::PageUp | KeyCode::Char('b') => app.prev_page(),
        KeyCode::Char('a') => app.toggle_agent_tables(),
        KeyCode::Char('d') => app.toggle_table(AgeView::Department),
        KeyCode::Char('p') => app.toggle_table(AgeView::Pending),
        KeyCode::Char('m') => app.toggle_table(AgeView::Metrics),
        KeyCode::Char('x') => app.toggle_table(AgeView::Archived),
        _ => {}
    }
    KeyAction::None
}

use ratatui::prelude::*;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Padding, Paragraph};

use crate::app::{App, InputMode, Pane, PendingImage, RowRef};
use crate::store::TodoStore;
use crate::theme::Theme;

const HEADER_HEIGHT: u16 = 3;
const INPUT_HEIGHT: u16 = 3;
const STATUS_HEIGHT: u16 = 3;
const TEXT_PADDING: u16 = 1;
const SELECTED_BG: Color = Color::Rgb(90, 145, 200);
const SELECTED_FG: Color = Color::Black;
const STATUS_HELP_TEXT: &str =
    "Tab focus | Enter add | Space toggle | a subtask | g suggest | e expand | f filter | d delete | Ctrl+O image | Ctrl+C quit";

pub fn render(frame: &mut Frame, app: &App, store: &TodoStore, theme: &Theme) {
    let [header, input, list, status] = Layout::vertical([
        Constraint::Length(HEADER_HEIGHT),
        Constraint::Length(INPUT_HEIGHT),
        Constraint::Min(0),
        Constraint::Length(STATUS_HEIGHT),
    ])
    .areas(frame.area());

    render_header(frame, header, app, store, theme);
    render_input(frame, input, app, store, theme);
    render_list(frame, list, app, store, theme);
    render_status(frame, status, app, theme);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App, store: &TodoStore, theme: &Theme) {
    let text = format!(
        "SmartDo | {} active | Filter: {}",
        store.active_count(),
        app.filter().label()
    );
    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().bg(theme.header_bg).fg(theme.active_fg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.header_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        area,
    );
}

fn render_input(frame: &mut Frame, area: Rect, app: &App, store: &TodoStore, theme: &Theme) {
    let active = app.active_pane == Pane::Input;
    let caption_fg = if active {
        theme.active_fg
    } else {
        theme.muted_fg
    };
    let caption = input_caption(app, store);
    let line = Line::from(vec![
        Span::styled(caption, Style::default().fg(caption_fg)),
        Span::styled(" > ", Style::default().fg(theme.accent_fg)),
        Span::styled(app.input().to_string(), Style::default().fg(theme.text_fg)),
    ]);
    frame.render_widget(
        Paragraph::new(line)
            .style(Style::default().bg(theme.input_bg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.input_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        area,
    );

    if active {
        let prefix_width = display_width(&input_caption(app, store)) + 3;
        let cursor_width: usize = app
            .input()
            .chars()
            .take(app.input_cursor())
            .map(char_display_width)
            .sum();
        let col = area.x
            + TEXT_PADDING
            + u16::try_from(prefix_width + cursor_width).unwrap_or(u16::MAX);
        let max_col = area.x + area.width.saturating_sub(TEXT_PADDING + 1);
        frame.set_cursor_position(Position::new(col.min(max_col), area.y + TEXT_PADDING));
    }
}

fn input_caption(app: &App, store: &TodoStore) -> String {
    let mode = match app.input_mode() {
        InputMode::NewTodo => "New task".to_string(),
        InputMode::Subtask { todo_id } => {
            let title = store
                .find(todo_id)
                .map(|todo| todo.text.as_str())
                .unwrap_or("?");
            format!("Subtask for \"{title}\"")
        }
        InputMode::ImagePath => "Image path".to_string(),
    };
    match app.pending_image() {
        Some(PendingImage { source, .. }) => format!("{mode} [image: {source}]"),
        None => mode,
    }
}

fn render_list(frame: &mut Frame, area: Rect, app: &App, store: &TodoStore, theme: &Theme) {
    let rows = app.visible_rows(store);
    let selected = app.selected_index(rows.len());
    let list_active = app.active_pane == Pane::List;

    let mut lines: Vec<Line> = Vec::with_capacity(rows.len().max(1));
    if rows.is_empty() {
        lines.push(Line::styled(
            "No tasks yet. Type one above and press Enter.",
            Style::default().fg(theme.muted_fg),
        ));
    }
    for (index, row) in rows.iter().enumerate() {
        let highlighted = list_active && index == selected;
        lines.push(row_line(row, app, store, theme, highlighted));
    }

    let visible_height = area.height.saturating_sub(TEXT_PADDING * 2).max(1);
    let scroll = (selected as u16).saturating_sub(visible_height.saturating_sub(1));

    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .style(Style::default().bg(theme.list_bg).fg(theme.text_fg))
            .scroll((scroll, 0))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.list_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        area,
    );
}

fn row_line(
    row: &RowRef,
    app: &App,
    store: &TodoStore,
    theme: &Theme,
    highlighted: bool,
) -> Line<'static> {
    let mut spans: Vec<Span> = Vec::new();
    match row {
        RowRef::Todo { todo_id } => {
            let Some(todo) = store.find(todo_id) else {
                return Line::default();
            };
            let marker = if todo.completed { "[x] " } else { "[ ] " };
            let text_style = if todo.completed {
                Style::default()
                    .fg(theme.done_fg)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(theme.text_fg)
            };
            spans.push(Span::styled(marker, Style::default().fg(theme.accent_fg)));
            spans.push(Span::styled(todo.text.clone(), text_style));
            if todo.image_url.is_some() {
                spans.push(Span::styled(" [img]", Style::default().fg(theme.accent_fg)));
            }
            if !todo.subtasks.is_empty() && !app.is_expanded(todo_id) {
                spans.push(Span::styled(
                    format!(" ({} subtasks)", todo.subtasks.len()),
                    Style::default().fg(theme.muted_fg),
                ));
            }
            if app.is_suggestion_in_flight(todo_id) {
                spans.push(Span::styled(
                    format!(" suggesting {}", working_dots(app.ticks)),
                    Style::default().fg(theme.accent_fg),
                ));
            }
        }
        RowRef::Subtask {
            todo_id,
            subtask_id,
        } => {
            let Some(subtask) = store
                .find(todo_id)
                .and_then(|todo| todo.subtasks.iter().find(|s| &s.id == subtask_id))
            else {
                return Line::default();
            };
            let marker = if subtask.completed {
                "    [x] "
            } else {
                "    [ ] "
            };
            let text_style = if subtask.completed {
                Style::default()
                    .fg(theme.done_fg)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(theme.muted_fg)
            };
            spans.push(Span::styled(marker, Style::default().fg(theme.muted_fg)));
            spans.push(Span::styled(subtask.text.clone(), text_style));
        }
    }

    let mut line = Line::from(spans);
    if highlighted {
        line = line.style(Style::default().bg(SELECTED_BG).fg(SELECTED_FG));
    }
    line
}

fn render_status(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let text = match app.latest_status() {
        Some(line) => format!("{STATUS_HELP_TEXT}\n{line}"),
        None => STATUS_HELP_TEXT.to_string(),
    };
    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().bg(theme.status_bg).fg(theme.muted_fg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.status_bg))
                    .padding(Padding::horizontal(TEXT_PADDING)),
            ),
        area,
    );
}

fn working_dots(ticks: u64) -> &'static str {
    const FRAMES: [&str; 6] = ["[   ]", "[.  ]", "[.. ]", "[...]", "[ ..]", "[  .]"];
    FRAMES[((ticks / 2) as usize) % FRAMES.len()]
}

fn display_width(text: &str) -> usize {
    text.chars().map(char_display_width).sum()
}

// Close enough for cursor placement: CJK ideographs and fullwidth forms
// render two columns wide in the terminal.
fn char_display_width(c: char) -> usize {
    let code = c as u32;
    let wide = matches!(
        code,
        0x1100..=0x115F
            | 0x2E80..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
    );
    if wide { 2 } else { 1 }
}

#[cfg(test)]
#[path = "../tests/unit/ui_tests.rs"]
mod tests;

use std::collections::HashSet;

use crate::store::{Filter, TodoStore};

const MAX_STATUS_LINES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Input,
    List,
}

/// What the input draft currently means. Subtask and image-path modes are
/// transient and fall back to `NewTodo` after a submit or cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    NewTodo,
    Subtask { todo_id: String },
    ImagePath,
}

/// One selectable row in the list pane: a filtered todo, or one of its
/// subtasks when that todo is expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRef {
    Todo {
        todo_id: String,
    },
    Subtask {
        todo_id: String,
        subtask_id: String,
    },
}

impl RowRef {
    pub fn todo_id(&self) -> &str {
        match self {
            Self::Todo { todo_id } | Self::Subtask { todo_id, .. } => todo_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImage {
    pub source: String,
    pub data_url: String,
}

/// Transient view state. Holds no authoritative task data; everything here
/// resets on restart while the todo collection itself lives in `TodoStore`.
#[derive(Debug)]
pub struct App {
    pub running: bool,
    pub ticks: u64,
    pub active_pane: Pane,
    filter: Filter,
    input: String,
    input_cursor: usize,
    input_mode: InputMode,
    pending_image: Option<PendingImage>,
    expanded: HashSet<String>,
    suggest_in_flight: HashSet<String>,
    selected: usize,
    status_lines: Vec<String>,
}

impl Default for App {
    fn default() -> Self {
        Self {
            running: true,
            ticks: 0,
            active_pane: Pane::Input,
            filter: Filter::All,
            input: String::new(),
            input_cursor: 0,
            input_mode: InputMode::NewTodo,
            pending_image: None,
            expanded: HashSet::new(),
            suggest_in_flight: HashSet::new(),
            selected: 0,
            status_lines: Vec::new(),
        }
    }
}

impl App {
    pub fn on_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn next_pane(&mut self) {
        self.active_pane = match self.active_pane {
            Pane::Input => Pane::List,
            Pane::List => Pane::Input,
        };
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_cursor(&self) -> usize {
        self.input_cursor
    }

    pub fn input_mode(&self) -> &InputMode {
        &self.input_mode
    }

    pub fn input_char(&mut self, c: char) {
        let byte_idx = char_to_byte_idx(&self.input, self.input_cursor);
        self.input.insert(byte_idx, c);
        self.input_cursor = self.input_cursor.saturating_add(1);
    }

    pub fn backspace_input(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        let start = char_to_byte_idx(&self.input, self.input_cursor.saturating_sub(1));
        let end = char_to_byte_idx(&self.input, self.input_cursor);
        self.input.drain(start..end);
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn move_cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        let char_len = self.input.chars().count();
        self.input_cursor = (self.input_cursor + 1).min(char_len);
    }

    /// Takes the trimmed draft, clearing the input. Whitespace-only drafts
    /// are swallowed here so the store never sees them.
    pub fn take_draft(&mut self) -> Option<String> {
        let draft = self.input.trim().to_string();
        if draft.is_empty() {
            return None;
        }
        self.input.clear();
        self.input_cursor = 0;
        Some(draft)
    }

    pub fn begin_subtask_input(&mut self, todo_id: String) {
        self.input_mode = InputMode::Subtask { todo_id };
        self.active_pane = Pane::Input;
    }

    pub fn begin_image_input(&mut self) {
        self.input_mode = InputMode::ImagePath;
        self.active_pane = Pane::Input;
    }

    /// Esc: leave a transient input mode without submitting. The typed
    /// draft is discarded along with the mode.
    pub fn cancel_input_mode(&mut self) {
        if self.input_mode != InputMode::NewTodo {
            self.input.clear();
            self.input_cursor = 0;
        }
        self.input_mode = InputMode::NewTodo;
    }

    pub fn finish_input_mode(&mut self) {
        self.input_mode = InputMode::NewTodo;
    }

    pub fn pending_image(&self) -> Option<&PendingImage> {
        self.pending_image.as_ref()
    }

    pub fn set_pending_image(&mut self, image: PendingImage) {
        self.pending_image = Some(image);
    }

    pub fn clear_pending_image(&mut self) {
        self.pending_image = None;
    }

    pub fn take_pending_image(&mut self) -> Option<PendingImage> {
        self.pending_image.take()
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn cycle_filter(&mut self) {
        self.filter = self.filter.next();
        self.selected = 0;
    }

    /// Flattens the filtered collection into selectable rows. Subtask rows
    /// appear directly under their parent only while it is expanded.
    pub fn visible_rows(&self, store: &TodoStore) -> Vec<RowRef> {
        let mut rows = Vec::new();
        for todo in store.filtered_view(self.filter) {
            rows.push(RowRef::Todo {
                todo_id: todo.id.clone(),
            });
            if self.expanded.contains(&todo.id) {
                for subtask in &todo.subtasks {
                    rows.push(RowRef::Subtask {
                        todo_id: todo.id.clone(),
                        subtask_id: subtask.id.clone(),
                    });
                }
            }
        }
        rows
    }

    pub fn selected_index(&self, row_count: usize) -> usize {
        if row_count == 0 {
            return 0;
        }
        self.selected.min(row_count - 1)
    }

    pub fn selected_row(&self, store: &TodoStore) -> Option<RowRef> {
        let rows = self.visible_rows(store);
        if rows.is_empty() {
            return None;
        }
        rows.get(self.selected_index(rows.len())).cloned()
    }

    pub fn move_selection_up(&mut self, row_count: usize) {
        self.selected = self.selected_index(row_count).saturating_sub(1);
    }

    pub fn move_selection_down(&mut self, row_count: usize) {
        if row_count == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected_index(row_count) + 1).min(row_count - 1);
    }

    pub fn is_expanded(&self, todo_id: &str) -> bool {
        self.expanded.contains(todo_id)
    }

    pub fn expand(&mut self, todo_id: String) {
        self.expanded.insert(todo_id);
    }

    pub fn toggle_expanded(&mut self, todo_id: &str) {
        if !self.expanded.remove(todo_id) {
            self.expanded.insert(todo_id.to_string());
        }
    }

    /// Marks a suggestion request in flight. Returns false when one is
    /// already running for the same todo, which blocks duplicate triggers.
    pub fn begin_suggestion(&mut self, todo_id: String) -> bool {
        self.suggest_in_flight.insert(todo_id)
    }

    pub fn finish_suggestion(&mut self, todo_id: &str) {
        self.suggest_in_flight.remove(todo_id);
    }

    pub fn is_suggestion_in_flight(&self, todo_id: &str) -> bool {
        self.suggest_in_flight.contains(todo_id)
    }

    pub fn push_status(&mut self, line: String) {
        self.status_lines.push(line);
        if self.status_lines.len() > MAX_STATUS_LINES {
            let overflow = self.status_lines.len() - MAX_STATUS_LINES;
            self.status_lines.drain(..overflow);
        }
    }

    pub fn latest_status(&self) -> Option<&str> {
        self.status_lines.last().map(String::as_str)
    }
}

fn char_to_byte_idx(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len())
}

#[cfg(test)]
#[path = "../tests/unit/app_tests.rs"]
mod tests;

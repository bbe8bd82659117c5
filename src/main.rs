use std::io;
use std::path::{Path, PathBuf};

use crossterm::cursor::SetCursorStyle;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;

mod app;
mod events;
mod image;
mod store;
mod suggest;
mod theme;
mod ui;

use app::{App, InputMode, Pane, PendingImage, RowRef};
use events::AppEvent;
use store::TodoStore;
use suggest::{SuggestEvent, SuggestionAdapter};
use theme::Theme;

const MAX_SUGGEST_EVENTS_PER_LOOP: usize = 32;

fn main() -> io::Result<()> {
    let launch_options = parse_launch_options(std::env::args().skip(1))?;
    let mut store = match &launch_options.data_dir {
        Some(dir) => TodoStore::open(dir)?,
        None => TodoStore::open_default()?,
    };

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, SetCursorStyle::SteadyBar)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    let theme = Theme::load_or_default("theme.toml");
    let suggest_adapter = SuggestionAdapter::new();
    let result = run_app(
        &mut terminal,
        App::default(),
        &mut store,
        &suggest_adapter,
        &theme,
    );

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        SetCursorStyle::DefaultUserShape,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    store: &mut TodoStore,
    suggest_adapter: &SuggestionAdapter,
    theme: &Theme,
) -> io::Result<()> {
    if !suggest_adapter.has_credential() {
        app.push_status("GEMINI_API_KEY is not set; AI decomposition is disabled.".to_string());
    }

    while app.running {
        for event in suggest_adapter.drain_events_limited(MAX_SUGGEST_EVENTS_PER_LOOP) {
            match event {
                SuggestEvent::System(line) => app.push_status(line),
                SuggestEvent::Completed { todo_id, subtasks } => {
                    apply_suggestion_result(&mut app, store, todo_id, subtasks);
                }
            }
        }

        terminal.draw(|frame| ui::render(frame, &app, store, theme))?;

        match events::next_event()? {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Quit => app.quit(),
            AppEvent::NextPane => app.next_pane(),
            AppEvent::Submit => handle_submit(&mut app, store),
            AppEvent::Cancel => app.cancel_input_mode(),
            AppEvent::AttachImage => handle_attach_image_key(&mut app),
            AppEvent::Backspace => {
                if app.active_pane == Pane::Input {
                    app.backspace_input();
                }
            }
            AppEvent::CursorLeft => {
                if app.active_pane == Pane::Input {
                    app.move_cursor_left();
                }
            }
            AppEvent::CursorRight => {
                if app.active_pane == Pane::Input {
                    app.move_cursor_right();
                }
            }
            AppEvent::MoveUp => {
                if app.active_pane == Pane::List {
                    let row_count = app.visible_rows(store).len();
                    app.move_selection_up(row_count);
                }
            }
            AppEvent::MoveDown => {
                if app.active_pane == Pane::List {
                    let row_count = app.visible_rows(store).len();
                    app.move_selection_down(row_count);
                }
            }
            AppEvent::InputChar(c) => match app.active_pane {
                Pane::Input => app.input_char(c),
                Pane::List => handle_list_key(&mut app, store, suggest_adapter, c),
            },
        }
    }

    Ok(())
}

fn handle_submit(app: &mut App, store: &mut TodoStore) {
    match app.input_mode().clone() {
        InputMode::NewTodo => {
            let Some(text) = app.take_draft() else {
                return;
            };
            let image_url = app.take_pending_image().map(|image| image.data_url);
            if let Err(err) = store.add(&text, image_url) {
                app.push_status(format!("Failed to persist new task: {err}"));
            }
        }
        InputMode::Subtask { todo_id } => {
            let Some(text) = app.take_draft() else {
                return;
            };
            match store.add_subtask(&todo_id, &text) {
                Ok(true) => app.expand(todo_id),
                Ok(false) => app.push_status("That task no longer exists.".to_string()),
                Err(err) => app.push_status(format!("Failed to persist subtask: {err}")),
            }
            app.finish_input_mode();
        }
        InputMode::ImagePath => {
            let Some(path_text) = app.take_draft() else {
                return;
            };
            match image::read_image_as_data_url(Path::new(&path_text)) {
                Ok(data_url) => {
                    app.set_pending_image(PendingImage {
                        source: path_text,
                        data_url,
                    });
                }
                Err(err) => app.push_status(format!("Could not attach image: {err}")),
            }
            app.finish_input_mode();
        }
    }
}

fn handle_attach_image_key(app: &mut App) {
    if app.pending_image().is_some() {
        app.clear_pending_image();
        app.push_status("Removed pending image.".to_string());
        return;
    }
    app.begin_image_input();
}

fn handle_list_key(
    app: &mut App,
    store: &mut TodoStore,
    suggest_adapter: &SuggestionAdapter,
    key: char,
) {
    match key {
        ' ' => toggle_selected_row(app, store),
        'd' => delete_selected_todo(app, store),
        'e' => {
            if let Some(row) = app.selected_row(store) {
                app.toggle_expanded(row.todo_id());
            }
        }
        'a' => {
            if let Some(row) = app.selected_row(store) {
                app.begin_subtask_input(row.todo_id().to_string());
            }
        }
        'f' => app.cycle_filter(),
        'g' => request_suggestion(app, store, suggest_adapter),
        'q' => app.quit(),
        _ => {}
    }
}

fn toggle_selected_row(app: &mut App, store: &mut TodoStore) {
    let Some(row) = app.selected_row(store) else {
        return;
    };
    let result = match &row {
        RowRef::Todo { todo_id } => store.toggle_complete(todo_id),
        RowRef::Subtask {
            todo_id,
            subtask_id,
        } => store.toggle_subtask(todo_id, subtask_id),
    };
    if let Err(err) = result {
        app.push_status(format!("Failed to persist toggle: {err}"));
    }
}

fn delete_selected_todo(app: &mut App, store: &mut TodoStore) {
    let Some(RowRef::Todo { todo_id }) = app.selected_row(store) else {
        return;
    };
    match store.delete(&todo_id) {
        Ok(true) => {
            let row_count = app.visible_rows(store).len();
            app.move_selection_up(row_count.max(1));
        }
        Ok(false) => {}
        Err(err) => app.push_status(format!("Failed to persist delete: {err}")),
    }
}

fn request_suggestion(app: &mut App, store: &TodoStore, suggest_adapter: &SuggestionAdapter) {
    let Some(row) = app.selected_row(store) else {
        return;
    };
    let Some(todo) = store.find(row.todo_id()) else {
        return;
    };
    if todo.completed {
        app.push_status("Completed tasks cannot be decomposed.".to_string());
        return;
    }
    if !app.begin_suggestion(todo.id.clone()) {
        app.push_status("A suggestion request is already running for this task.".to_string());
        return;
    }
    suggest_adapter.request_subtasks(todo.id.clone(), todo.text.clone());
    app.push_status(format!("Requesting subtask suggestions for \"{}\"...", todo.text));
}

fn apply_suggestion_result(
    app: &mut App,
    store: &mut TodoStore,
    todo_id: String,
    subtasks: Vec<String>,
) {
    if subtasks.is_empty() {
        app.push_status("No subtask suggestions were returned.".to_string());
    } else {
        match store.append_generated_subtasks(&todo_id, &subtasks) {
            Ok(0) => {
                // The owning todo was deleted while the request was in
                // flight; the late result must not resurrect state.
            }
            Ok(added) => app.push_status(format!("Added {added} suggested subtasks.")),
            Err(err) => app.push_status(format!("Failed to persist suggested subtasks: {err}")),
        }
    }
    app.finish_suggestion(&todo_id);
    if store.find(&todo_id).is_some() {
        app.expand(todo_id);
    }
}

#[derive(Debug, Default)]
struct LaunchOptions {
    data_dir: Option<PathBuf>,
}

fn parse_launch_options<I>(args: I) -> io::Result<LaunchOptions>
where
    I: IntoIterator<Item = String>,
{
    let mut options = LaunchOptions::default();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--data-dir" => {
                let Some(path) = iter.next() else {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "--data-dir requires a path argument",
                    ));
                };
                options.data_dir = Some(PathBuf::from(path));
            }
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Unknown argument: {arg}"),
                ));
            }
        }
    }
    Ok(options)
}

#[cfg(test)]
#[path = "../tests/unit/main_launch_tests.rs"]
mod launch_tests;

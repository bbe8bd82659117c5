use super::*;
use crate::store::TodoStore;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn open_temp_store(prefix: &str) -> (TodoStore, PathBuf) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let root = std::env::temp_dir().join(format!("smartdo-app-{prefix}-{now}"));
    let store = TodoStore::open(&root).expect("open store");
    (store, root)
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        app.input_char(c);
    }
}

#[test]
fn input_editing_respects_multibyte_cursor_positions() {
    let mut app = App::default();

    type_text(&mut app, "买菜去");
    assert_eq!(app.input(), "买菜去");
    assert_eq!(app.input_cursor(), 3);

    app.move_cursor_left();
    app.backspace_input();
    assert_eq!(app.input(), "买去");
    assert_eq!(app.input_cursor(), 1);

    app.input_char('面');
    assert_eq!(app.input(), "买面去");

    app.move_cursor_right();
    app.move_cursor_right();
    app.move_cursor_right();
    assert_eq!(app.input_cursor(), 3, "cursor clamps at the end");
}

#[test]
fn take_draft_trims_and_clears_the_input() {
    let mut app = App::default();

    type_text(&mut app, "  walk the dog  ");
    assert_eq!(app.take_draft().as_deref(), Some("walk the dog"));
    assert!(app.input().is_empty());
    assert_eq!(app.input_cursor(), 0);
}

#[test]
fn take_draft_swallows_whitespace_only_input() {
    let mut app = App::default();

    type_text(&mut app, "   ");
    assert!(app.take_draft().is_none());
}

#[test]
fn next_pane_toggles_between_input_and_list() {
    let mut app = App::default();
    assert_eq!(app.active_pane, Pane::Input);
    app.next_pane();
    assert_eq!(app.active_pane, Pane::List);
    app.next_pane();
    assert_eq!(app.active_pane, Pane::Input);
}

#[test]
fn cycle_filter_advances_and_resets_selection() {
    let (mut store, root) = open_temp_store("filter");
    store.add("a", None).expect("add a");
    store.add("b", None).expect("add b");

    let mut app = App::default();
    app.move_selection_down(app.visible_rows(&store).len());
    assert_eq!(app.selected_index(2), 1);

    app.cycle_filter();
    assert_eq!(app.filter(), Filter::Active);
    assert_eq!(app.selected_index(2), 0);

    app.cycle_filter();
    app.cycle_filter();
    assert_eq!(app.filter(), Filter::All);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn visible_rows_hide_subtasks_until_expanded() {
    let (mut store, root) = open_temp_store("rows");
    store.add("task", None).expect("add");
    let id = store.todos()[0].id.clone();
    store.add_subtask(&id, "one").expect("subtask one");
    store.add_subtask(&id, "two").expect("subtask two");

    let mut app = App::default();
    assert_eq!(app.visible_rows(&store).len(), 1);

    app.toggle_expanded(&id);
    let rows = app.visible_rows(&store);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], RowRef::Todo { todo_id: id.clone() });
    assert!(matches!(
        &rows[1],
        RowRef::Subtask { todo_id, .. } if todo_id == &id
    ));

    app.toggle_expanded(&id);
    assert_eq!(app.visible_rows(&store).len(), 1);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn visible_rows_respect_the_active_filter() {
    let (mut store, root) = open_temp_store("rows-filter");
    store.add("open", None).expect("add open");
    store.add("done", None).expect("add done");
    let done_id = store.todos()[0].id.clone();
    store.toggle_complete(&done_id).expect("toggle");

    let mut app = App::default();
    assert_eq!(app.visible_rows(&store).len(), 2);

    app.cycle_filter();
    let rows = app.visible_rows(&store);
    assert_eq!(rows.len(), 1);
    assert_ne!(rows[0].todo_id(), done_id);

    app.cycle_filter();
    let rows = app.visible_rows(&store);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].todo_id(), done_id);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn selection_moves_and_clamps_to_row_count() {
    let mut app = App::default();

    app.move_selection_down(3);
    app.move_selection_down(3);
    app.move_selection_down(3);
    assert_eq!(app.selected_index(3), 2, "clamped at the last row");

    app.move_selection_up(3);
    assert_eq!(app.selected_index(3), 1);

    // The collection shrank underneath the selection.
    assert_eq!(app.selected_index(1), 0);
    app.move_selection_down(0);
    assert_eq!(app.selected_index(0), 0);
}

#[test]
fn selected_row_is_none_for_an_empty_list() {
    let (store, root) = open_temp_store("empty");
    let app = App::default();
    assert!(app.selected_row(&store).is_none());
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn begin_suggestion_blocks_duplicate_triggers() {
    let mut app = App::default();

    assert!(app.begin_suggestion("todo-1".to_string()));
    assert!(app.is_suggestion_in_flight("todo-1"));
    assert!(
        !app.begin_suggestion("todo-1".to_string()),
        "a second trigger for the same todo must be blocked"
    );
    assert!(
        app.begin_suggestion("todo-2".to_string()),
        "other todos may run concurrently"
    );

    app.finish_suggestion("todo-1");
    assert!(!app.is_suggestion_in_flight("todo-1"));
    assert!(app.begin_suggestion("todo-1".to_string()));
}

#[test]
fn cancel_discards_transient_mode_and_draft() {
    let mut app = App::default();

    app.begin_subtask_input("todo-1".to_string());
    assert_eq!(app.active_pane, Pane::Input);
    type_text(&mut app, "half-typed subtask");
    app.cancel_input_mode();

    assert_eq!(app.input_mode(), &InputMode::NewTodo);
    assert!(app.input().is_empty());
}

#[test]
fn cancel_in_new_todo_mode_keeps_the_draft() {
    let mut app = App::default();
    type_text(&mut app, "keep me");
    app.cancel_input_mode();
    assert_eq!(app.input(), "keep me");
}

#[test]
fn pending_image_round_trips() {
    let mut app = App::default();
    assert!(app.pending_image().is_none());

    app.set_pending_image(PendingImage {
        source: "cat.png".to_string(),
        data_url: "data:image/png;base64,AAAA".to_string(),
    });
    assert_eq!(app.pending_image().map(|i| i.source.as_str()), Some("cat.png"));

    let taken = app.take_pending_image().expect("image should be pending");
    assert_eq!(taken.data_url, "data:image/png;base64,AAAA");
    assert!(app.pending_image().is_none());
}

#[test]
fn status_log_keeps_only_the_most_recent_lines() {
    let mut app = App::default();
    for index in 0..150 {
        app.push_status(format!("line {index}"));
    }
    assert_eq!(app.latest_status(), Some("line 149"));
    assert_eq!(app.status_lines.len(), MAX_STATUS_LINES);
    assert_eq!(app.status_lines[0], "line 50");
}

#[test]
fn expand_forces_subtask_visibility() {
    let mut app = App::default();
    assert!(!app.is_expanded("todo-1"));
    app.expand("todo-1".to_string());
    assert!(app.is_expanded("todo-1"));
    // Expanding twice is harmless.
    app.expand("todo-1".to_string());
    assert!(app.is_expanded("todo-1"));
}

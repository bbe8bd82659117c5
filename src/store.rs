use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the durable slot the todo collection is serialized into. The
/// snapshot file is `<root_dir>/<SNAPSHOT_SLOT>.json`.
pub const SNAPSHOT_SLOT: &str = "smartdo-todos";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmartDoConfig {
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root_dir: String,
}

impl Default for SmartDoConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: "~/.smartdo".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Active,
            Self::Active => Self::Completed,
            Self::Completed => Self::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Active => "Active",
            Self::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subtask {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at_epoch_millis: u64,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

/// Owns the todo collection and its snapshot file. Every mutation that
/// changes the collection rewrites the full snapshot before returning;
/// mutations that change nothing (empty text, unknown ids, empty suggestion
/// batches) never touch the file.
#[derive(Debug)]
pub struct TodoStore {
    todos: Vec<Todo>,
    snapshot_file: PathBuf,
}

impl TodoStore {
    /// Opens the store under the root directory named by
    /// `~/.smartdo/config.toml`, creating the config with defaults when
    /// missing.
    pub fn open_default() -> io::Result<Self> {
        let config = load_config()?;
        let root_dir = expand_home(&config.storage.root_dir)?;
        Self::open(&root_dir)
    }

    /// Opens the store under an explicit root directory. A missing snapshot
    /// file or one that fails to parse hydrates as an empty collection.
    pub fn open(root_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(root_dir)?;
        let snapshot_file = root_dir.join(format!("{SNAPSHOT_SLOT}.json"));
        let todos = hydrate(&snapshot_file);
        Ok(Self {
            todos,
            snapshot_file,
        })
    }

    pub fn snapshot_file(&self) -> &Path {
        &self.snapshot_file
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn find(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    /// Prepends a new todo. Whitespace-only text is a validation no-op that
    /// returns `Ok(None)` without persisting.
    pub fn add(&mut self, text: &str, image_url: Option<String>) -> io::Result<Option<&Todo>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let todo = Todo {
            id: fresh_id(),
            text: trimmed.to_string(),
            completed: false,
            image_url,
            created_at_epoch_millis: now_millis(),
            subtasks: Vec::new(),
        };
        self.todos.insert(0, todo);
        self.persist()?;
        Ok(self.todos.first())
    }

    /// Removes a todo by id. Unknown ids are a no-op, so repeated deletes
    /// are idempotent.
    pub fn delete(&mut self, id: &str) -> io::Result<bool> {
        let before = self.todos.len();
        self.todos.retain(|todo| todo.id != id);
        if self.todos.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    pub fn toggle_complete(&mut self, id: &str) -> io::Result<bool> {
        let Some(todo) = self.todos.iter_mut().find(|todo| todo.id == id) else {
            return Ok(false);
        };
        todo.completed = !todo.completed;
        self.persist()?;
        Ok(true)
    }

    /// Appends one subtask. Emptiness validation is left to the caller; the
    /// store only guards against unknown parent ids.
    pub fn add_subtask(&mut self, todo_id: &str, text: &str) -> io::Result<bool> {
        let Some(todo) = self.todos.iter_mut().find(|todo| todo.id == todo_id) else {
            return Ok(false);
        };
        todo.subtasks.push(Subtask {
            id: fresh_id(),
            text: text.to_string(),
            completed: false,
        });
        self.persist()?;
        Ok(true)
    }

    pub fn toggle_subtask(&mut self, todo_id: &str, subtask_id: &str) -> io::Result<bool> {
        let Some(todo) = self.todos.iter_mut().find(|todo| todo.id == todo_id) else {
            return Ok(false);
        };
        let Some(subtask) = todo
            .subtasks
            .iter_mut()
            .find(|subtask| subtask.id == subtask_id)
        else {
            return Ok(false);
        };
        subtask.completed = !subtask.completed;
        self.persist()?;
        Ok(true)
    }

    /// Appends one subtask per suggestion string, preserving order after any
    /// existing subtasks. Returns the number appended; an empty batch or a
    /// todo deleted while the request was in flight returns 0 and does not
    /// write the snapshot.
    pub fn append_generated_subtasks(
        &mut self,
        todo_id: &str,
        texts: &[String],
    ) -> io::Result<usize> {
        if texts.is_empty() {
            return Ok(0);
        }
        let Some(todo) = self.todos.iter_mut().find(|todo| todo.id == todo_id) else {
            return Ok(0);
        };
        for text in texts {
            todo.subtasks.push(Subtask {
                id: fresh_id(),
                text: text.clone(),
                completed: false,
            });
        }
        self.persist()?;
        Ok(texts.len())
    }

    /// Pure projection of the collection for the given filter; never mutates
    /// or reorders.
    pub fn filtered_view(&self, filter: Filter) -> Vec<&Todo> {
        self.todos
            .iter()
            .filter(|todo| match filter {
                Filter::All => true,
                Filter::Active => !todo.completed,
                Filter::Completed => todo.completed,
            })
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.todos.iter().filter(|todo| !todo.completed).count()
    }

    fn persist(&self) -> io::Result<()> {
        let text = serde_json::to_string_pretty(&self.todos).map_err(io::Error::other)?;
        fs::write(&self.snapshot_file, text)
    }
}

fn hydrate(snapshot_file: &Path) -> Vec<Todo> {
    let Ok(text) = fs::read_to_string(snapshot_file) else {
        return Vec::new();
    };
    serde_json::from_str::<Vec<Todo>>(&text).unwrap_or_default()
}

fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn load_config() -> io::Result<SmartDoConfig> {
    let home = home_dir()?;
    let config_dir = home.join(".smartdo");
    fs::create_dir_all(&config_dir)?;
    let config_file = config_dir.join("config.toml");

    if !config_file.exists() {
        let default = "[storage]\nroot_dir = \"~/.smartdo\"\n";
        fs::write(&config_file, default)?;
    }

    let text = fs::read_to_string(config_file)?;
    let parsed = toml::from_str::<SmartDoConfig>(&text)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    Ok(parsed)
}

fn expand_home(raw_path: &str) -> io::Result<PathBuf> {
    if raw_path == "~" {
        return home_dir();
    }
    if let Some(rest) = raw_path.strip_prefix("~/") {
        return Ok(home_dir()?.join(rest));
    }
    Ok(PathBuf::from(raw_path))
}

fn home_dir() -> io::Result<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "HOME is not set"))
}

#[cfg(test)]
#[path = "../tests/unit/store_tests.rs"]
mod tests;

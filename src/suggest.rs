use std::env;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use serde_json::{Value, json};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestEvent {
    System(String),
    Completed {
        todo_id: String,
        subtasks: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub struct SuggestionConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl SuggestionConfig {
    pub fn from_env() -> Self {
        let api_key = env::var(API_KEY_ENV)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key,
        }
    }
}

/// Fire-once client for the external generation service. Each request runs
/// on its own thread and reports back over the event channel; the adapter
/// never raises, and every request ends in exactly one `Completed` event so
/// the caller can clear its in-flight state. Failures of any kind collapse
/// to an empty suggestion list plus a `System` diagnostic line.
pub struct SuggestionAdapter {
    config: SuggestionConfig,
    event_tx: Sender<SuggestEvent>,
    event_rx: Receiver<SuggestEvent>,
}

impl SuggestionAdapter {
    pub fn new() -> Self {
        Self::with_config(SuggestionConfig::from_env())
    }

    pub fn with_config(config: SuggestionConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            config,
            event_tx,
            event_rx,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub fn request_subtasks(&self, todo_id: String, task_text: String) {
        let config = self.config.clone();
        let tx = self.event_tx.clone();
        thread::spawn(move || {
            let Some(api_key) = config.api_key.clone() else {
                let _ = tx.send(SuggestEvent::System(
                    "Suggestion credential is missing; set GEMINI_API_KEY to enable AI decomposition.".to_string(),
                ));
                let _ = tx.send(SuggestEvent::Completed {
                    todo_id,
                    subtasks: Vec::new(),
                });
                return;
            };
            let subtasks = match fetch_subtasks(&config, &api_key, &task_text) {
                Ok(subtasks) => subtasks,
                Err(message) => {
                    let _ = tx.send(SuggestEvent::System(message));
                    Vec::new()
                }
            };
            let _ = tx.send(SuggestEvent::Completed { todo_id, subtasks });
        });
    }

    pub fn drain_events_limited(&self, max_events: usize) -> Vec<SuggestEvent> {
        let mut events = Vec::new();
        if max_events == 0 {
            return events;
        }
        while events.len() < max_events {
            let Ok(event) = self.event_rx.try_recv() else {
                break;
            };
            events.push(event);
        }
        events
    }

    #[cfg(test)]
    pub fn wait_events(&self, count: usize, timeout: std::time::Duration) -> Vec<SuggestEvent> {
        let deadline = std::time::Instant::now() + timeout;
        let mut events = Vec::new();
        while events.len() < count {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            let Ok(event) = self.event_rx.recv_timeout(remaining) else {
                break;
            };
            events.push(event);
        }
        events
    }
}

fn fetch_subtasks(
    config: &SuggestionConfig,
    api_key: &str,
    task_text: &str,
) -> Result<Vec<String>, String> {
    let url = generation_url(&config.endpoint, &config.model);
    let body = build_generation_request(task_text);
    let response = ureq::post(&url)
        .set("x-goog-api-key", api_key)
        .set("Content-Type", "application/json")
        .send_string(&body.to_string())
        .map_err(|err| format!("Suggestion request failed: {err}"))?;
    let text = response
        .into_string()
        .map_err(|err| format!("Suggestion response could not be read: {err}"))?;
    parse_generation_response(&text)
}

pub(crate) fn generation_url(endpoint: &str, model: &str) -> String {
    format!(
        "{}/v1beta/models/{model}:generateContent",
        endpoint.trim_end_matches('/')
    )
}

/// Builds the generateContent request body: a prompt asking for 3-5 concise,
/// actionable subtasks plus a response schema pinning the output to a JSON
/// array of strings.
pub(crate) fn build_generation_request(task_text: &str) -> Value {
    let prompt = format!(
        "Break the following task into 3 to 5 concise, actionable subtasks: \"{task_text}\". \
         Reply with the list of subtask strings only."
    );
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            }
        }
    })
}

pub(crate) fn parse_generation_response(body: &str) -> Result<Vec<String>, String> {
    let text = candidate_text(body)
        .ok_or_else(|| "Suggestion response contained no candidate text.".to_string())?;
    parse_subtask_array(&text)
        .ok_or_else(|| "Suggestion response was not a JSON array of strings.".to_string())
}

fn candidate_text(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let parts = value
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let mut text = String::new();
    for part in parts {
        if let Some(piece) = part.get("text").and_then(Value::as_str) {
            text.push_str(piece);
        }
    }
    if text.is_empty() { None } else { Some(text) }
}

/// The model is asked for an array of strings but its output is still free
/// text, so the shape is checked explicitly: anything other than a JSON
/// array whose elements are all strings is rejected wholesale.
pub(crate) fn parse_subtask_array(text: &str) -> Option<Vec<String>> {
    let value = serde_json::from_str::<Value>(text).ok()?;
    let items = value.as_array()?;
    let mut subtasks = Vec::with_capacity(items.len());
    for item in items {
        subtasks.push(item.as_str()?.to_string());
    }
    Some(subtasks)
}

#[cfg(test)]
#[path = "../tests/unit/suggest_tests.rs"]
mod tests;

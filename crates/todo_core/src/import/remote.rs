//! Remote to-do source and wire decoding.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Collection endpoint used when no URL is configured.
pub const DEFAULT_IMPORT_URL: &str = "https://dummyjson.com/todos";

const MIN_TIMEOUT_SECS: u64 = 1;

/// Failures while fetching or decoding the remote collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, timeout, body read).
    Network(String),
    /// Server answered with a non-success status.
    Status(u16),
    /// Body is not the expected JSON shape.
    Decode(String),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(message) => write!(f, "remote request failed: {message}"),
            Self::Status(code) => write!(f, "remote answered with status {code}"),
            Self::Decode(message) => write!(f, "remote payload decode failed: {message}"),
        }
    }
}

impl Error for FetchError {}

/// One decoded remote record.
///
/// `remote_id` is informational only; it never becomes a local id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTask {
    pub remote_id: i64,
    pub title: String,
    pub completed: bool,
    pub owner_ref: i64,
}

#[derive(Debug, Deserialize)]
struct TodoListPayload {
    todos: Vec<TodoPayload>,
}

#[derive(Debug, Deserialize)]
struct TodoPayload {
    id: i64,
    todo: String,
    completed: bool,
    #[serde(rename = "userId")]
    user_id: i64,
}

impl From<TodoPayload> for RemoteTask {
    fn from(value: TodoPayload) -> Self {
        Self {
            remote_id: value.id,
            title: value.todo,
            completed: value.completed,
            owner_ref: value.user_id,
        }
    }
}

/// Decodes `{ "todos": [ { id, todo, completed, userId } ] }`.
///
/// Unknown fields such as `total`/`skip`/`limit` are ignored.
pub fn decode_todo_list(body: &str) -> Result<Vec<RemoteTask>, FetchError> {
    let payload: TodoListPayload =
        serde_json::from_str(body).map_err(|err| FetchError::Decode(err.to_string()))?;
    Ok(payload.todos.into_iter().map(RemoteTask::from).collect())
}

/// Source of the remote to-do collection.
///
/// Implementations run on a worker thread, hence `Send + Sync`.
pub trait RemoteSource: Send + Sync {
    fn fetch_todos(&self) -> Result<Vec<RemoteTask>, FetchError>;
}

/// Blocking HTTP GET source.
pub struct HttpRemoteSource {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpRemoteSource {
    /// Builds a client with the given request timeout (at least one second).
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout.max(Duration::from_secs(MIN_TIMEOUT_SECS)))
            .build()
            .map_err(|err| FetchError::Network(format!("failed to create HTTP client: {err}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RemoteSource for HttpRemoteSource {
    fn fetch_todos(&self) -> Result<Vec<RemoteTask>, FetchError> {
        let response = self
            .client
            .get(self.url.as_str())
            .send()
            .map_err(|err| FetchError::Network(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .map_err(|err| FetchError::Network(err.to_string()))?;
        decode_todo_list(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_todo_list, FetchError, RemoteTask};

    #[test]
    fn decodes_dummyjson_shape_and_keeps_remote_id_separate() {
        let body = r#"{
            "todos": [
                {"id": 1, "todo": "Do something nice", "completed": false, "userId": 152},
                {"id": 2, "todo": "Memorize a poem", "completed": true, "userId": 13}
            ],
            "total": 254,
            "skip": 0,
            "limit": 2
        }"#;

        let tasks = decode_todo_list(body).unwrap();
        assert_eq!(
            tasks,
            vec![
                RemoteTask {
                    remote_id: 1,
                    title: "Do something nice".to_string(),
                    completed: false,
                    owner_ref: 152,
                },
                RemoteTask {
                    remote_id: 2,
                    title: "Memorize a poem".to_string(),
                    completed: true,
                    owner_ref: 13,
                },
            ]
        );
    }

    #[test]
    fn missing_fields_are_decode_errors() {
        let err = decode_todo_list(r#"{"todos": [{"id": 1, "todo": "x"}]}"#).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));

        let err = decode_todo_list("not json").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}

//! Pushover HTTP transport.
//!
//! Posts form-encoded messages to the Pushover messages API. The client is
//! built once and shared by every background send.

use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;

/// Pushover messages endpoint.
pub const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// Upper bound on one transmission, connection setup included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error returned when a notification could not be delivered.
#[derive(Debug)]
pub enum SendError {
    /// The request could not be sent or timed out
    Request(reqwest::Error),
    /// The sink answered with a status other than 200
    Status(StatusCode),
    /// The send was cancelled before it completed
    Cancelled,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Request(e) => write!(f, "sending request: {}", e),
            SendError::Status(status) => {
                write!(f, "pushover returned status {}", status.as_u16())
            }
            SendError::Cancelled => write!(f, "send cancelled"),
        }
    }
}

impl std::error::Error for SendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SendError::Request(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SendError {
    fn from(e: reqwest::Error) -> Self {
        SendError::Request(e)
    }
}

/// One message as it goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushoverMessage<'a> {
    /// Application API token
    pub token: &'a str,
    /// Recipient user or group key
    pub user: &'a str,
    /// Notification title
    pub title: String,
    /// Notification body
    pub message: String,
    /// Pushover priority, omitted when zero
    pub priority: i32,
    /// Sound name, omitted when empty
    pub sound: &'a str,
}

impl PushoverMessage<'_> {
    /// Form fields to post.
    ///
    /// `priority` is only included when non-zero and `sound` only when
    /// non-empty.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("token", self.token.to_string()),
            ("user", self.user.to_string()),
            ("title", self.title.clone()),
            ("message", self.message.clone()),
        ];
        if self.priority != 0 {
            fields.push(("priority", self.priority.to_string()));
        }
        if !self.sound.is_empty() {
            fields.push(("sound", self.sound.to_string()));
        }
        fields
    }
}

/// Reusable Pushover client.
#[derive(Debug, Clone)]
pub struct PushoverClient {
    http: reqwest::Client,
    endpoint: String,
}

impl PushoverClient {
    /// Build a client posting to `endpoint` with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// Endpoint messages are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post one message.
    ///
    /// Only HTTP 200 counts as success.
    pub async fn post(&self, message: &PushoverMessage<'_>) -> Result<(), SendError> {
        let response = self
            .http
            .post(&self.endpoint)
            .form(&message.form_fields())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(SendError::Status(status));
        }
        Ok(())
    }
}

//! Backend calendar API (bearer-token JSON over HTTP).

use crate::lecturecam_core::calendar::event::{
    EventSource, REMOTE_COLOR, REMOTE_ID_PREFIX, UnifiedEvent,
};
use crate::lecturecam_core::error::{LecturecamError, Result};
use crate::lecturecam_core::settings::AuthSession;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use time::OffsetDateTime;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// An event as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendEvent {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of create and update requests.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<&UnifiedEvent> for EventPayload {
    fn from(event: &UnifiedEvent) -> Self {
        EventPayload {
            title: event.title.clone(),
            start_date: event.start_date,
            end_date: event.end_date,
            location: event.location.clone(),
            notes: event.notes.clone(),
        }
    }
}

impl From<BackendEvent> for UnifiedEvent {
    fn from(event: BackendEvent) -> Self {
        UnifiedEvent {
            id: format!("{}{}", REMOTE_ID_PREFIX, event.id),
            original_id: event.id,
            title: event.title,
            start_date: event.start_date,
            end_date: event.end_date,
            source: EventSource::Remote,
            color: event.color.or_else(|| Some(REMOTE_COLOR.to_string())),
            location: event.location,
            notes: event.notes,
            calendar_id: None,
        }
    }
}

/// Backends hand out numeric or string ids; both are kept as strings.
fn id_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("unexpected event id {}", other))),
    }
}

/// Calendar operations offered by the backend.
pub trait RemoteBackend {
    fn login(&self, username: &str, password: &str) -> Result<AuthSession>;
    fn fetch_events(&self, token: &str) -> Result<Vec<BackendEvent>>;
    fn create_event(&self, token: &str, payload: &EventPayload) -> Result<BackendEvent>;
    fn update_event(&self, token: &str, id: &str, payload: &EventPayload) -> Result<BackendEvent>;
    fn delete_event(&self, token: &str, id: &str) -> Result<()>;
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(default)]
    username: Option<String>,
}

/// `RemoteBackend` over HTTP.
pub struct HttpBackend {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        HttpBackend {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

fn map_http_error(e: ureq::Error) -> LecturecamError {
    match e {
        ureq::Error::Status(401, _) | ureq::Error::Status(403, _) => {
            LecturecamError::NotAuthenticated
        }
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            LecturecamError::Remote(format!("backend returned {}: {}", code, body.trim()))
        }
        ureq::Error::Transport(t) => LecturecamError::Remote(t.to_string()),
    }
}

fn decode<T: serde::de::DeserializeOwned>(response: ureq::Response) -> Result<T> {
    response
        .into_json()
        .map_err(|e| LecturecamError::Remote(format!("Failed to parse backend response: {}", e)))
}

impl RemoteBackend for HttpBackend {
    fn login(&self, username: &str, password: &str) -> Result<AuthSession> {
        let response = self
            .agent
            .post(&self.url("/auth/login"))
            .set("Content-Type", "application/json")
            .send_json(serde_json::json!({ "username": username, "password": password }))
            .map_err(map_http_error)?;
        let login: LoginResponse = decode(response)?;
        Ok(AuthSession {
            token: login.token,
            username: login.username.unwrap_or_else(|| username.to_string()),
        })
    }

    fn fetch_events(&self, token: &str) -> Result<Vec<BackendEvent>> {
        let response = self
            .agent
            .get(&self.url("/calendar/events"))
            .set("Authorization", &bearer(token))
            .call()
            .map_err(map_http_error)?;
        decode(response)
    }

    fn create_event(&self, token: &str, payload: &EventPayload) -> Result<BackendEvent> {
        let response = self
            .agent
            .post(&self.url("/calendar/events"))
            .set("Authorization", &bearer(token))
            .send_json(payload)
            .map_err(map_http_error)?;
        decode(response)
    }

    fn update_event(&self, token: &str, id: &str, payload: &EventPayload) -> Result<BackendEvent> {
        let response = self
            .agent
            .put(&self.url(&format!("/calendar/events/{}", id)))
            .set("Authorization", &bearer(token))
            .send_json(payload)
            .map_err(map_http_error)?;
        decode(response)
    }

    fn delete_event(&self, token: &str, id: &str) -> Result<()> {
        self.agent
            .delete(&self.url(&format!("/calendar/events/{}", id)))
            .set("Authorization", &bearer(token))
            .call()
            .map_err(map_http_error)?;
        Ok(())
    }
}

//! HTTP client for the Canyon coverage service.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, UploadError};
use crate::model::{ClientPayload, MapInitPayload, UploadResponse};

pub const MAP_INIT_PATH: &str = "/api/coverage/map/init";
pub const CLIENT_PATH: &str = "/api/coverage/client";

/// The two upload calls the pipeline makes, in order.
pub trait Uploader {
    fn map_init(&self, payload: &MapInitPayload<'_>) -> Result<UploadResponse>;

    fn upload_client(&self, payload: &ClientPayload) -> Result<UploadResponse>;
}

impl<U: Uploader + ?Sized> Uploader for &U {
    fn map_init(&self, payload: &MapInitPayload<'_>) -> Result<UploadResponse> {
        (**self).map_init(payload)
    }

    fn upload_client(&self, payload: &ClientPayload) -> Result<UploadResponse> {
        (**self).upload_client(payload)
    }
}

/// Strip a single trailing slash from the configured base URL.
pub fn endpoint(base_url: &str, path: &str) -> String {
    let base = base_url.strip_suffix('/').unwrap_or(base_url);
    format!("{base}{path}")
}

/// Blocking client bound to one service base URL.
pub struct CanyonClient {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl CanyonClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            agent: ureq::Agent::new(),
            base_url: base_url.to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    fn post<T: Serialize>(&self, path: &str, payload: &T) -> Result<UploadResponse> {
        let url = endpoint(&self.base_url, path);
        let body = serde_json::to_value(payload)?;
        let response = send_request(&self.agent, &url, &body, self.token.as_deref())?;
        serde_json::from_value(response).map_err(|source| UploadError::Response { url, source })
    }
}

impl Uploader for CanyonClient {
    fn map_init(&self, payload: &MapInitPayload<'_>) -> Result<UploadResponse> {
        self.post(MAP_INIT_PATH, payload)
    }

    fn upload_client(&self, payload: &ClientPayload) -> Result<UploadResponse> {
        self.post(CLIENT_PATH, payload)
    }
}

/// POST `payload` as JSON and return the decoded JSON response.
///
/// A non-2xx status becomes [`UploadError::Http`] with the status line and
/// raw body. No retries.
pub fn send_request(
    agent: &ureq::Agent,
    url: &str,
    payload: &Value,
    token: Option<&str>,
) -> Result<Value> {
    let body = serde_json::to_string(payload)?;
    debug!("POST {url} ({} bytes)", body.len());

    let mut request = agent.post(url).set("Content-Type", "application/json");
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        request = request.set("Authorization", &format!("Bearer {token}"));
    }

    let response = match request.send_string(&body) {
        Ok(response) => response,
        Err(ureq::Error::Status(status, response)) => {
            let status_text = response.status_text().to_string();
            let body = response.into_string().unwrap_or_default();
            return Err(UploadError::Http {
                status,
                status_text,
                body,
            });
        }
        Err(e) => {
            return Err(UploadError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })
        }
    };

    let text = response.into_string().map_err(|e| UploadError::Transport {
        url: url.to_string(),
        message: format!("failed to read response body: {e}"),
    })?;
    serde_json::from_str(&text).map_err(|source| UploadError::Response {
        url: url.to_string(),
        source,
    })
}

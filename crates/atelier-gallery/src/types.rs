use serde::{Deserialize, Serialize};

use crate::sync::TriggerOutcome;

/// Body of `POST /api/gallery/list`
#[derive(Debug, Deserialize)]
pub struct ListRequest {
    /// Remote directory to list
    pub path: String,
}

/// Query of the image and download proxies
#[derive(Debug, Deserialize)]
pub struct PathQuery {
    /// Remote file path, e.g. `/photos/a/1.jpg`
    pub path: String,
}

/// Answer to `POST /api/gallery/sync`
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub status: TriggerOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Ok,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlistConnection {
    Connected,
    Error,
    Disconnected,
}

/// Answer to `GET /api/gallery/status`
#[derive(Debug, Clone, Serialize)]
pub struct RemoteStatus {
    pub status: ServiceState,
    pub service: &'static str,
    pub alist_api: AlistConnection,
    pub message: String,
}

impl RemoteStatus {
    pub(crate) fn new(status: ServiceState, alist_api: AlistConnection, message: impl Into<String>) -> Self {
        Self {
            status,
            service: "gallery",
            alist_api,
            message: message.into(),
        }
    }
}

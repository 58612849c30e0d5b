//! crates/civic_portal_core/src/ports.rs
//!
//! Defines the contracts (traits) between the core and the outside world.
//! The core never opens a socket or touches a disk itself; it goes through an
//! `HttpTransport` for the backend and a `SessionStorage` for persisted state.

use async_trait::async_trait;
use std::fmt;

use crate::domain::FileUpload;

//=========================================================================================
// Port Error and Result Types
//=========================================================================================

/// Every failure a portal operation can surface.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    /// The server rejected the credentials; the session has been torn down.
    #[error("Unauthorized")]
    Unauthorized,
    /// The server could not be reached at all.
    #[error("Unable to reach server: {0}")]
    Network(String),
    /// The request was rejected, either locally or by a 4xx from the server.
    #[error("{message}")]
    Validation { status: Option<u16>, message: String },
    /// Any other non-success answer.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// A validation failure detected before any network call.
    pub fn invalid(message: impl Into<String>) -> Self {
        PortError::Validation {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            PortError::Unauthorized => Some(401),
            PortError::Validation { status, .. } => *status,
            PortError::Server { status, .. } => Some(*status),
            PortError::Network(_) | PortError::Unexpected(_) => None,
        }
    }
}

pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// HTTP Transport Port
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
    /// A single file part; the transport names the field `file`.
    Multipart(FileUpload),
}

/// A fully resolved request, ready for the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base, always starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub bearer: Option<String>,
    pub body: RequestBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends one request. Any HTTP status is an `Ok`; only failures to get an
    /// answer at all come back as `PortError::Network`.
    async fn send(&self, request: ApiRequest) -> PortResult<RawResponse>;
}

//=========================================================================================
// Session Storage Port
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageScope {
    /// Survives restarts ("remember me").
    Durable,
    /// Lives as long as the current tab or process.
    Ephemeral,
}

pub trait SessionStorage: Send + Sync {
    fn get(&self, scope: StorageScope, key: &str) -> Option<String>;

    fn set(&self, scope: StorageScope, key: &str, value: &str) -> PortResult<()>;

    fn remove(&self, scope: StorageScope, key: &str);
}

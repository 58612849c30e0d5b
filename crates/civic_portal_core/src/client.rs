//! crates/civic_portal_core/src/client.rs
//!
//! The HTTP client wrapper every facade goes through. It resolves the bearer
//! token from session storage, hands a fully built `ApiRequest` to the
//! transport, and normalizes non-success answers into the `PortError`
//! taxonomy.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::FileUpload;
use crate::ports::{
    ApiRequest, HttpTransport, Method, PortError, PortResult, RequestBody, SessionStorage,
};
use crate::session;

const FALLBACK_ERROR_MESSAGE: &str = "Request failed";

//=========================================================================================
// Call Builder
//=========================================================================================

/// One logical API call before the token is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiCall {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Adds the parameter only when a value is present. Absence means "no
    /// filter", never "filter by empty string".
    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn json<T: Serialize>(mut self, payload: &T) -> PortResult<Self> {
        let value = serde_json::to_value(payload)
            .map_err(|e| PortError::Unexpected(format!("Failed to encode request body: {}", e)))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }

    pub fn multipart(mut self, file: FileUpload) -> Self {
        self.body = RequestBody::Multipart(file);
        self
    }
}

//=========================================================================================
// The Client
//=========================================================================================

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    storage: Arc<dyn SessionStorage>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, storage: Arc<dyn SessionStorage>) -> Self {
        Self { transport, storage }
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    /// Runs one call and returns the raw success body.
    pub async fn execute(&self, call: ApiCall) -> PortResult<Vec<u8>> {
        let request = ApiRequest {
            method: call.method,
            path: call.path,
            query: call.query,
            bearer: session::stored_token(self.storage.as_ref()),
            body: call.body,
        };
        let method = request.method;
        let path = request.path.clone();
        debug!(%method, %path, authenticated = request.bearer.is_some(), "Sending API request");

        let response = self.transport.send(request).await.map_err(|e| {
            warn!(%method, %path, error = %e, "API request did not reach the server");
            e
        })?;

        if response.is_success() {
            return Ok(response.body);
        }

        if response.status == 401 {
            warn!(%method, %path, "Server rejected the session; clearing stored credentials");
            session::clear_stored_session(self.storage.as_ref());
            return Err(PortError::Unauthorized);
        }

        let message = extract_error_message(&response.body);
        warn!(%method, %path, status = response.status, %message, "API request failed");
        if (400..500).contains(&response.status) {
            Err(PortError::Validation {
                status: Some(response.status),
                message,
            })
        } else {
            Err(PortError::Server {
                status: response.status,
                message,
            })
        }
    }

    /// Runs one call and decodes its JSON body.
    pub async fn json<T: DeserializeOwned>(&self, call: ApiCall) -> PortResult<T> {
        let body = self.execute(call).await?;
        decode_body(&body)
    }
}

fn decode_body<T: DeserializeOwned>(body: &[u8]) -> PortResult<T> {
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        body
    };
    serde_json::from_slice(body)
        .map_err(|e| PortError::Unexpected(format!("Malformed response body: {}", e)))
}

/// Pulls a human-readable message out of an error body.
///
/// Order: a `detail` string, then a `detail` list of `{msg}` entries, then a
/// `message` string, then a fixed fallback.
pub fn extract_error_message(body: &[u8]) -> String {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        return FALLBACK_ERROR_MESSAGE.to_string();
    };

    match value.get("detail") {
        Some(serde_json::Value::String(detail)) if !detail.is_empty() => {
            return detail.clone();
        }
        Some(serde_json::Value::Array(entries)) => {
            let joined = entries
                .iter()
                .filter_map(|entry| match entry {
                    serde_json::Value::String(text) => Some(text.as_str()),
                    other => other.get("msg").and_then(serde_json::Value::as_str),
                })
                .collect::<Vec<_>>()
                .join(", ");
            if !joined.is_empty() {
                return joined;
            }
        }
        _ => {}
    }

    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .filter(|message| !message.is_empty())
        .unwrap_or(FALLBACK_ERROR_MESSAGE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StorageScope;
    use crate::testing::{MemoryStorage, ScriptedTransport};

    fn client_with(transport: &Arc<ScriptedTransport>, storage: &Arc<MemoryStorage>) -> ApiClient {
        ApiClient::new(transport.clone(), storage.clone())
    }

    #[test]
    fn error_message_prefers_detail_string() {
        let body = br#"{"detail": "Email already registered", "message": "ignored"}"#;
        assert_eq!(extract_error_message(body), "Email already registered");
    }

    #[test]
    fn error_message_joins_validation_entries() {
        let body = br#"{"detail": [
            {"loc": ["body", "title"], "msg": "title too short", "type": "value_error"},
            {"loc": ["body", "description"], "msg": "description too short", "type": "value_error"}
        ]}"#;
        assert_eq!(
            extract_error_message(body),
            "title too short, description too short"
        );
    }

    #[test]
    fn error_message_falls_back_to_message_then_literal() {
        assert_eq!(extract_error_message(br#"{"message": "Boom"}"#), "Boom");
        assert_eq!(extract_error_message(br#"{"other": 1}"#), "Request failed");
        assert_eq!(extract_error_message(b"<html>502</html>"), "Request failed");
    }

    #[tokio::test]
    async fn attaches_bearer_only_when_token_is_stored() {
        let transport = Arc::new(ScriptedTransport::new());
        let storage = Arc::new(MemoryStorage::default());
        let client = client_with(&transport, &storage);

        transport.respond("/requests/my-requests", 200, "[]");
        let _: Vec<serde_json::Value> = client
            .json(ApiCall::get("/requests/my-requests"))
            .await
            .unwrap();

        storage
            .set(StorageScope::Ephemeral, session::TOKEN_KEY, "tok-1")
            .unwrap();
        transport.respond("/requests/my-requests", 200, "[]");
        let _: Vec<serde_json::Value> = client
            .json(ApiCall::get("/requests/my-requests"))
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].bearer, None);
        assert_eq!(sent[1].bearer.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn unauthorized_clears_both_scopes() {
        let transport = Arc::new(ScriptedTransport::new());
        let storage = Arc::new(MemoryStorage::default());
        for scope in [StorageScope::Durable, StorageScope::Ephemeral] {
            storage.set(scope, session::TOKEN_KEY, "stale").unwrap();
            storage.set(scope, session::PROFILE_KEY, "{}").unwrap();
        }
        transport.respond("/citizens/me", 401, r#"{"detail": "Could not validate credentials"}"#);

        let err = client_with(&transport, &storage)
            .execute(ApiCall::get("/citizens/me"))
            .await
            .unwrap_err();

        assert_eq!(err, PortError::Unauthorized);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn maps_statuses_onto_taxonomy() {
        let transport = Arc::new(ScriptedTransport::new());
        let storage = Arc::new(MemoryStorage::default());
        let client = client_with(&transport, &storage);

        transport.respond("/complaints/", 422, r#"{"detail": [{"msg": "field required"}]}"#);
        let err = client.execute(ApiCall::post("/complaints/")).await.unwrap_err();
        assert_eq!(
            err,
            PortError::Validation {
                status: Some(422),
                message: "field required".to_string()
            }
        );

        transport.respond("/complaints/", 500, r#"{"detail": "Failed to create complaint"}"#);
        let err = client.execute(ApiCall::post("/complaints/")).await.unwrap_err();
        assert_eq!(
            err,
            PortError::Server {
                status: 500,
                message: "Failed to create complaint".to_string()
            }
        );

        transport.fail("/complaints/", "connection refused");
        let err = client.execute(ApiCall::post("/complaints/")).await.unwrap_err();
        assert!(matches!(err, PortError::Network(_)));
    }

    #[tokio::test]
    async fn empty_success_body_decodes_as_unit() {
        let transport = Arc::new(ScriptedTransport::new());
        let storage = Arc::new(MemoryStorage::default());
        transport.respond("/notifications/4", 204, "");

        let decoded: Option<serde_json::Value> = client_with(&transport, &storage)
            .json(ApiCall::delete("/notifications/4"))
            .await
            .unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn optional_query_parameters_are_skipped() {
        let call = ApiCall::get("/requests/all/requests")
            .query_opt("status_filter", None::<&str>)
            .query_opt("limit", Some(20));
        assert_eq!(call.query, vec![("limit".to_string(), "20".to_string())]);
    }
}

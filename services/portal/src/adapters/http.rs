//! services/portal/src/adapters/http.rs
//!
//! This module contains the adapter that carries API requests over HTTP.
//! It implements the `HttpTransport` port from the `core` crate.

use async_trait::async_trait;
use civic_portal_core::domain::FileUpload;
use civic_portal_core::ports::{
    ApiRequest, HttpTransport, Method, PortError, PortResult, RawResponse, RequestBody,
};
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `HttpTransport` port using `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Creates a new `ReqwestTransport` rooted at `base_url` (e.g. `<origin>/api`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

fn network(e: reqwest::Error) -> PortError {
    PortError::Network(e.to_string())
}

/// An unparseable content type is dropped so the part goes out with
/// reqwest's default instead of failing the upload.
fn file_part(file: FileUpload) -> Part {
    let FileUpload {
        file_name,
        content_type,
        bytes,
    } = file;
    let plain = |bytes: Vec<u8>| Part::bytes(bytes).file_name(file_name.clone());
    match content_type {
        None => plain(bytes.to_vec()),
        Some(content_type) => match plain(bytes.to_vec()).mime_str(&content_type) {
            Ok(part) => part,
            Err(e) => {
                warn!(
                    %file_name,
                    %content_type,
                    error = %e,
                    "Ignoring invalid attachment content type"
                );
                plain(bytes.to_vec())
            }
        },
    }
}

//=========================================================================================
// `HttpTransport` Trait Implementation
//=========================================================================================

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> PortResult<RawResponse> {
        let url = self.url_for(&request.path);
        let mut builder = self.client.request(Self::method(request.method), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Multipart(file) => {
                builder.multipart(Form::new().part("file", file_part(file)))
            }
        };

        let response = builder.send().await.map_err(network)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(network)?.to_vec();
        debug!(%url, status, bytes = body.len(), "Received API response");

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_joined_onto_the_api_base() {
        let transport =
            ReqwestTransport::new("http://localhost:8000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            transport.url_for("/requests/my-requests"),
            "http://localhost:8000/api/requests/my-requests"
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let transport =
            ReqwestTransport::new("http://127.0.0.1:9/api", Duration::from_secs(2)).unwrap();
        let request = ApiRequest {
            method: Method::Get,
            path: "/auth/me".to_string(),
            query: Vec::new(),
            bearer: None,
            body: RequestBody::Empty,
        };

        let err = transport.send(request).await.unwrap_err();

        assert!(matches!(err, PortError::Network(_)));
    }

    #[tokio::test]
    async fn invalid_content_type_never_surfaces_as_validation() {
        let transport =
            ReqwestTransport::new("http://127.0.0.1:9/api", Duration::from_secs(2)).unwrap();
        let request = ApiRequest {
            method: Method::Post,
            path: "/files/requests/4/upload".to_string(),
            query: Vec::new(),
            bearer: Some("tok".to_string()),
            body: RequestBody::Multipart(FileUpload {
                file_name: "scan.pdf".to_string(),
                content_type: Some("not a mime type".to_string()),
                bytes: bytes::Bytes::from_static(b"%PDF"),
            }),
        };

        let err = transport.send(request).await.unwrap_err();

        assert!(matches!(err, PortError::Network(_)));
    }
}

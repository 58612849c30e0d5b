//! In-crate fakes for the ports, shared by the unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::ports::{
    ApiRequest, HttpTransport, PortError, PortResult, RawResponse, SessionStorage, StorageScope,
};

#[derive(Clone)]
enum Scripted {
    Respond(u16, String),
    Fail(String),
}

/// Answers by path with whatever was last scripted for it; unscripted paths
/// get a 404. Every request is recorded.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, Scripted>>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, status: u16, body: &str) {
        self.scripts
            .lock()
            .unwrap()
            .insert(path.to_string(), Scripted::Respond(status, body.to_string()));
    }

    pub fn fail(&self, path: &str, reason: &str) {
        self.scripts
            .lock()
            .unwrap()
            .insert(path.to_string(), Scripted::Fail(reason.to_string()));
    }

    pub fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_paths(&self) -> Vec<String> {
        self.sent().into_iter().map(|request| request.path).collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> PortResult<RawResponse> {
        let script = self.scripts.lock().unwrap().get(&request.path).cloned();
        self.sent.lock().unwrap().push(request);
        match script {
            Some(Scripted::Respond(status, body)) => Ok(RawResponse {
                status,
                body: body.into_bytes(),
            }),
            Some(Scripted::Fail(reason)) => Err(PortError::Network(reason)),
            None => Ok(RawResponse {
                status: 404,
                body: br#"{"detail": "Not Found"}"#.to_vec(),
            }),
        }
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<(StorageScope, String), String>>,
}

impl MemoryStorage {
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, scope: StorageScope, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .get(&(scope, key.to_string()))
            .cloned()
    }

    fn set(&self, scope: StorageScope, key: &str, value: &str) -> PortResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert((scope, key.to_string()), value.to_string());
        Ok(())
    }

    fn remove(&self, scope: StorageScope, key: &str) {
        self.entries.lock().unwrap().remove(&(scope, key.to_string()));
    }
}

//! Scripted in-memory transport shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use wprest_core::{ApiError, Config, HttpMethod, HttpRequest, HttpResponse, Transport, WpClient};

pub const BASE_URL: &str = "https://blog.example.com/wp-json";
pub const TOKEN: &str = "header.payload.signature";

pub fn config() -> Config {
    Config::new(&format!("{BASE_URL}/"), "editor", "secret")
}

/// Replays canned responses in order and records every request it receives.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: impl IntoIterator<Item = HttpResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A transport whose first response is a successful login.
    pub fn authenticated(responses: impl IntoIterator<Item = HttpResponse>) -> Self {
        let login = HttpResponse::new(200, format!(r#"{{"token":"{TOKEN}","user_nicename":"editor"}}"#));
        Self::new(std::iter::once(login).chain(responses))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests after the login exchange.
    pub fn api_requests(&self) -> Vec<HttpRequest> {
        self.requests().into_iter().skip(1).collect()
    }

    pub fn count(&self, method: HttpMethod) -> usize {
        self.api_requests().iter().filter(|r| r.method == method).count()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::Transport(format!("no scripted response for {}", request.url)))
    }
}

pub fn connect(transport: &ScriptedTransport) -> WpClient<&ScriptedTransport> {
    WpClient::with_transport(&config(), transport).unwrap()
}

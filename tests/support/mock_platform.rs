#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::Context;
use http_body_util::{BodyExt, Full};
use hyper::{
    Method, Request, Response, StatusCode,
    body::{Bytes, Incoming},
    header::{AUTHORIZATION, CONTENT_TYPE},
    server::conn::http1::Builder as Http1Builder,
    service::service_fn,
};
use hyper_util::rt::tokio::TokioIo;
use serde_json::{Value, json};
use stage_onboard::settings::OnboardSettings;
use tokio::{net::TcpListener, runtime::Runtime, sync::oneshot};

pub const PRODUCT_ID: &str = "749d0000-0194-1005-611c-08d694a6c44f";
pub const ACCESS_TOKEN: &str = "tok-eyJhbGciOiJSUzI1NiJ9.mock";

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub path_and_query: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct MockState {
    /// Responses per route; the last one repeats once the queue drains.
    routes: HashMap<(Method, String), Vec<(u16, String)>>,
    requests: Vec<RecordedRequest>,
}

/// In-process stand-in for the token endpoint and the configuration API.
pub struct MockPlatform {
    addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<thread::JoinHandle<anyhow::Result<()>>>,
}

impl MockPlatform {
    pub fn start() -> anyhow::Result<Self> {
        let listener =
            std::net::TcpListener::bind("127.0.0.1:0").context("failed to bind mock platform")?;
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let state = Arc::new(Mutex::new(MockState::default()));
        let (tx, rx) = oneshot::channel();
        let server_state = state.clone();
        let handle = thread::Builder::new()
            .name("mock-platform".to_string())
            .spawn(move || -> anyhow::Result<()> {
                let runtime = Runtime::new().context("failed to create mock runtime")?;
                runtime.block_on(async move {
                    let listener =
                        TcpListener::from_std(listener).context("failed to adopt listener")?;
                    let mut shutdown = rx;
                    loop {
                        tokio::select! {
                            _ = &mut shutdown => break,
                            accept = listener.accept() => {
                                let Ok((stream, _peer)) = accept else { continue };
                                let connection_state = server_state.clone();
                                tokio::spawn(async move {
                                    let service = service_fn(move |req| {
                                        handle_request(req, connection_state.clone())
                                    });
                                    let _ = Http1Builder::new()
                                        .serve_connection(TokioIo::new(stream), service)
                                        .await;
                                });
                            }
                        }
                    }
                    Ok(())
                })
            })
            .context("failed to spawn mock platform thread")?;

        Ok(Self {
            addr,
            state,
            shutdown: Some(tx),
            handle: Some(handle),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.respond_raw(method, path, status, body.to_string());
    }

    pub fn respond_raw(&self, method: Method, path: &str, status: u16, body: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        state
            .routes
            .entry((method, path.to_string()))
            .or_default()
            .push((status, body.into()));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|req| {
                req.method == method && req.path_and_query.split('?').next() == Some(path)
            })
            .collect()
    }

    /// Register the five endpoints of a successful onboarding.
    pub fn happy_path(&self) {
        self.respond(
            Method::POST,
            "/oauth/token",
            200,
            json!({ "access_token": ACCESS_TOKEN, "token_type": "Bearer", "expires_in": 86400 }),
        );
        self.respond(
            Method::GET,
            "/api/config/products",
            200,
            json!([
                { "id": PRODUCT_ID, "name": "Shopify2Go" },
                { "id": "749d0000-0194-1005-611c-08d694a6c450", "name": "Other" }
            ]),
        );
        self.respond(
            Method::GET,
            &format!("/api/config/new/stage/{PRODUCT_ID}"),
            200,
            configurator_template(),
        );
        self.respond(Method::PUT, "/api/config/stage", 200, self.install_result());
        self.respond(
            Method::GET,
            "/api/notifications/stage-1",
            200,
            json!([
                { "noteType": "Success", "message": "Stage installed for My Test Customer AS" },
                { "noteType": "Info", "message": "older note" }
            ]),
        );
    }

    pub fn install_result(&self) -> Value {
        json!({
            "webhookUrl": "https://hooks.linked2.io/shopify/stage-1",
            "successNotificationResource": self.url("/api/notifications/stage-1?max={max}"),
            "errorNotificationResource": self.url("/api/notifications/stage-1/errors?max={max}")
        })
    }

    /// Settings pointing at this mock with the sample customer data.
    pub fn settings(&self) -> OnboardSettings {
        let yaml = format!(
            r#"
platform:
  base_url: {base}
  token_url: {token}
  audience: https://platform.linked2.io/api
  timeout_secs: 5
credentials:
  client_id: test-client
  client_secret: test-secret
product_id: {PRODUCT_ID}
stage:
  customer:
    name: My Test Customer AS
    identifier: piet-emonkey-no.myshopify.com
  publish_context:
    powerOfficeClientKey: 04ffda34-bb33-4c6b-9205-6b3c8442c239
  support:
    contact_email: at@email.com
    phone: 1234 552 526
    primary_contact: Support Person
notifications:
  page_size: 10
  initial_delay_ms: 0
  poll_attempts: 3
  poll_interval_ms: 0
"#,
            base = self.url("/api/config/"),
            token = self.url("/oauth/token"),
        );
        OnboardSettings::from_yaml(&yaml).unwrap()
    }
}

impl Drop for MockPlatform {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn configurator_template() -> Value {
    json!({
        "stageConfiguration": { "customerName": "", "customerIdentifier": "", "environment": "production" },
        "filterConfiguration": { "skipDrafts": true },
        "transformerConfiguration": { "vatMapping": { "25": "3" } },
        "publishContextConfiguration": { "powerOfficeClientKey": "" },
        "supportConfiguration": { "notificationLevel": "error" },
        "schema": {
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "required": ["stageConfiguration", "supportConfiguration"],
            "properties": {
                "stageConfiguration": {
                    "type": "object",
                    "required": ["customerName", "customerIdentifier"],
                    "properties": {
                        "customerName": { "type": "string", "minLength": 1 },
                        "customerIdentifier": { "type": "string", "minLength": 1 }
                    }
                },
                "filterConfiguration": { "type": "object" },
                "transformerConfiguration": { "type": "object" },
                "publishContextConfiguration": {
                    "type": "object",
                    "required": ["powerOfficeClientKey"]
                },
                "supportConfiguration": {
                    "type": "object",
                    "required": ["supportContactEmail", "phone", "primaryContact"],
                    "properties": {
                        "supportContactEmail": { "type": "string" },
                        "phone": { "type": "string" },
                        "primaryContact": { "type": "string" }
                    }
                }
            }
        }
    })
}

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<Mutex<MockState>>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = req
        .into_body()
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_default();
    let body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice(&body).ok()
    };

    let (status, payload) = {
        let mut state = state.lock().unwrap();
        state.requests.push(RecordedRequest {
            method: method.clone(),
            path_and_query,
            authorization,
            body,
        });
        match state.routes.get_mut(&(method, path)) {
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => (404, json!({ "error": "no route" }).to_string()),
        }
    };

    let response = Response::builder()
        .status(StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
        .header(CONTENT_TYPE, "application/json")
        .body(Full::from(Bytes::from(payload)))
        .unwrap();
    Ok(response)
}

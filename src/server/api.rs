//! Gateway endpoint implementation using rouille.
//!
//! # Purpose
//!
//! Core implementation of the HTTP gateway. Each request walks
//! received → authenticated → encoded → turn acquired → exchanged →
//! responded, with every rejection and failure reported to the caller in
//! the same response cycle.
//!
//! # Key types
//!
//! - [`Gateway`] - HTTP server runner; owns the settings, the gate and the
//!   channel client
//! - `EditRequest` / `EditResponse` - the JSON bodies
//!
//! # Thread safety
//!
//! rouille dispatches each request on its own thread. Settings are
//! immutable behind an `Arc`; the only shared mutable state is the
//! [`ChannelGate`], which is what serializes exchanges.

use log::{debug, info, warn};
use rouille::{Request, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{self, Credentials};
use crate::config::Settings;
use crate::core::channel::{ChannelClient, ControlReply};
use crate::core::command::OverlayEdit;
use crate::core::gate::{AcquireError, CancelFlag, ChannelGate};

/// Headers a browser-based editing surface may send with a request.
const ALLOW_HEADERS: &str = "Cache-Control, X-Proxy-Authorization, X-Requested-With, Content-Type";

/// Request body for overlay edits
#[derive(Debug, Deserialize)]
struct EditRequest {
    #[serde(flatten)]
    credentials: Credentials,
    /// Overlay parameters; a missing or ill-typed map is a malformed request
    data: Option<OverlayEdit>,
}

/// Response body. `Success` carries the peer payload on success, `false`
/// on rejection, or a descriptive failure string.
#[derive(Debug, Serialize)]
struct EditResponse {
    #[serde(rename = "Success")]
    success: serde_json::Value,
}

impl EditResponse {
    fn payload(text: String) -> Self {
        Self { success: serde_json::Value::String(text) }
    }

    fn rejected() -> Self {
        Self { success: serde_json::Value::Bool(false) }
    }

    fn failed(msg: String) -> Self {
        Self { success: serde_json::Value::String(msg) }
    }
}

/// Liveness response
#[derive(Debug, Serialize)]
struct HealthResponse {
    service: &'static str,
    version: &'static str,
    channel: String,
}

/// Gateway HTTP server.
pub struct Gateway {
    settings: Arc<Settings>,
    gate: ChannelGate,
    channel: ChannelClient,
}

impl Gateway {
    pub fn new(settings: Arc<Settings>) -> Self {
        let channel = ChannelClient::new(settings.channel_addr.clone(), settings.reply_timeout());
        Self {
            settings,
            gate: ChannelGate::new(),
            channel,
        }
    }

    /// Run the HTTP server. Blocks forever.
    pub fn run(self) -> ! {
        let addr = self.settings.listen_addr.clone();
        info!("Gateway listening on http://{}", addr);

        let gateway = Arc::new(self);
        rouille::start_server(&addr, move |request| gateway.handle_request(request))
    }

    /// Route one HTTP request. Public so in-process embedders and tests
    /// can drive the gateway without a socket.
    pub fn handle_request(&self, request: &Request) -> Response {
        // Handle preflight
        if request.method() == "OPTIONS" {
            return with_cors(Response::empty_204());
        }

        let response = match (request.method(), request.url().as_str()) {
            ("POST", "/api/overlay") => self.handle_edit(request),
            ("GET", "/api/health") => self.health(),
            // Other verbs on the endpoint: no side effect, nothing touched
            (_, "/api/overlay") => {
                Response::json(&EditResponse::rejected()).with_status_code(405)
            }
            _ => Response::json(&EditResponse::rejected()).with_status_code(404),
        };

        with_cors(response)
    }

    fn handle_edit(&self, request: &Request) -> Response {
        let body: EditRequest = match rouille::input::json_input(request) {
            Ok(body) => body,
            Err(e) => {
                debug!("Malformed request body: {}", e);
                return Response::json(&EditResponse::rejected()).with_status_code(400);
            }
        };

        if !auth::verify(&body.credentials, &self.settings) {
            info!("Rejected edit: bad credentials for user '{}'", body.credentials.user);
            return Response::json(&EditResponse::rejected()).with_status_code(401);
        }

        let Some(edit) = body.data else {
            debug!("Malformed request: missing 'data' field");
            return Response::json(&EditResponse::rejected()).with_status_code(400);
        };

        // Wire-delimiter characters in a key or value would corrupt the
        // command; refuse rather than forward garbage to the renderer
        if let Some(key) = edit.find_unsafe() {
            warn!("Rejected edit: parameter '{}' contains wire delimiters", key);
            return Response::json(&EditResponse::rejected()).with_status_code(400);
        }

        let command = edit.encode(&self.settings.target_node);
        debug!("Encoded command: {:?}", command);

        // rouille gives no client-abort signal; embedders with one pass a
        // live flag through dispatch instead
        self.dispatch(&command, &CancelFlag::new())
    }

    /// Acquire a turn, run one exchange, map the outcome to a response.
    fn dispatch(&self, command: &str, cancel: &CancelFlag) -> Response {
        let turn = match self.gate.acquire(self.settings.max_queue_wait(), cancel) {
            Ok(turn) => turn,
            Err(AcquireError::Busy) => {
                warn!("Busy: no turn within {} ms", self.settings.max_queue_wait_ms);
                return Response::json(&EditResponse::failed(format!(
                    "Busy: control channel did not free up within {} ms",
                    self.settings.max_queue_wait_ms
                )))
                .with_status_code(503);
            }
            Err(AcquireError::Cancelled) => {
                debug!("Edit abandoned while queued; nothing sent");
                return Response::json(&EditResponse::failed(
                    "Cancelled: caller abandoned the request".to_string(),
                ))
                .with_status_code(503);
            }
        };

        let reply = self.channel.exchange(command);
        drop(turn);

        match reply {
            ControlReply::Payload(text) => {
                info!("Edit applied, renderer replied {:?}", text);
                Response::json(&EditResponse::payload(text))
            }
            ControlReply::Timeout => {
                warn!("Timeout: no reply within {} ms", self.settings.reply_timeout_ms);
                Response::json(&EditResponse::failed(format!(
                    "Timeout: no reply from renderer within {} ms",
                    self.settings.reply_timeout_ms
                )))
                .with_status_code(504)
            }
            ControlReply::Transport(detail) => {
                warn!("Transport failure: {}", detail);
                Response::json(&EditResponse::failed(format!("Transport failure: {}", detail)))
                    .with_status_code(502)
            }
        }
    }

    fn health(&self) -> Response {
        Response::json(&HealthResponse {
            service: "chyron gateway",
            version: env!("CARGO_PKG_VERSION"),
            channel: self.settings.channel_addr.clone(),
        })
    }
}

/// Add CORS headers to a response. POST is the only method the endpoint
/// permits to cross-origin callers.
fn with_cors(response: Response) -> Response {
    response
        .with_additional_header("Access-Control-Allow-Origin", "*")
        .with_additional_header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .with_additional_header("Access-Control-Allow-Headers", ALLOW_HEADERS)
}

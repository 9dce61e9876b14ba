//! HTTP gateway for remote overlay control.
//!
//! # Purpose
//!
//! Lets a remote editing surface (web form, script, playout automation)
//! rewrite the text overlay of a live video pipeline by POSTing a
//! parameter map. The gateway authenticates the caller, encodes the map
//! into a `drawtext` reinit command, and runs one bounded request/reply
//! exchange against the renderer's control endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐                       ┌─────────────────────┐
//! │  Gateway (rouille HTTP)  │      ChannelGate      │  Rendering process  │
//! │                          │      (one turn at     │  (ffmpeg/ffplay,    │
//! │  POST /api/overlay       │       a time)         │   drawtext filter)  │
//! │    auth → encode ────────┼──▶ turn ──▶ exchange ─┼──▶ reinit command   │
//! │    ◀─── {"Success": ...} │      ◀── reply/timeout│                     │
//! └──────────────────────────┘                       └─────────────────────┘
//! ```
//!
//! - **rouille** - sync HTTP server, one worker thread per request
//! - **ChannelGate** - serializes exchanges; the control endpoint handles
//!   one command at a time
//! - **ChannelClient** - one fresh session per exchange, closed on every
//!   path
//!
//! # Endpoints
//!
//! | Method | Path           | Description                               |
//! |--------|----------------|-------------------------------------------|
//! | POST   | `/api/overlay` | Apply an overlay edit (auth required)     |
//! | GET    | `/api/health`  | Liveness probe                            |
//! | OPTIONS| any            | CORS preflight                            |
//! | other  | `/api/overlay` | 405, no side effect                       |

mod api;

pub use api::Gateway;

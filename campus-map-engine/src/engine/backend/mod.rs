//! Backend HTTP access for map, company and route data.
//!
//! Requests run off the main schedule (a worker thread natively, a
//! `spawn_local` future on WASM) and push their replies into a shared inbox.
//! `drain_backend_replies` empties the inbox once per frame, decodes each
//! reply and re-emits it as a typed event:
//!
//! ```text
//! BackendClient::request(..)
//!   └─> BackendTransport::get(url)  (thread / future)
//!       └─> ReplyInbox (Arc<Mutex<Vec<BackendReply>>>)
//!           └─> drain_backend_replies()
//!               ├─> MapDataFetched
//!               ├─> CompaniesFetched
//!               └─> RouteFetched
//! ```
//!
//! There are no timeouts, retries or cancellation; a request that never
//! answers simply never produces an event.

/// Backend client resource, reply decoding and the fetched-data events.
pub mod client;

/// reqwest-backed transport for native and WASM targets.
pub mod transport;

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use thiserror::Error;

use crate::engine::assets::company::Company;
use crate::engine::assets::map_data::{MapData, MapDataError, NodeId};

use super::transport::HttpTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendRequest {
    /// `GET /map`, or an explicit url when reloading from another location.
    MapData { url: Option<String> },
    Companies,
    Route { from: NodeId, to: NodeId },
}

impl BackendRequest {
    pub fn endpoint(&self) -> String {
        match self {
            Self::MapData { .. } => "/map".to_string(),
            Self::Companies => "/companies".to_string(),
            Self::Route { from, to } => format!("/routes?fromNodeId={from}&toNodeId={to}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("request to {url} failed: {message}")]
pub struct TransportError {
    pub url: String,
    pub message: String,
}

#[derive(Debug)]
pub struct BackendReply {
    pub request: BackendRequest,
    pub result: Result<HttpResponse, TransportError>,
}

pub type ReplyInbox = Arc<Mutex<Vec<BackendReply>>>;

pub fn push_reply(inbox: &ReplyInbox, reply: BackendReply) {
    match inbox.lock() {
        Ok(mut queue) => queue.push(reply),
        Err(_) => error!("Backend inbox poisoned, dropping reply for {:?}", reply.request),
    }
}

/// Performs GET requests and pushes exactly one reply per request into the inbox.
pub trait BackendTransport: Send + Sync + 'static {
    fn get(&self, request: BackendRequest, url: String, inbox: ReplyInbox);
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("{endpoint} answered HTTP {status}")]
    Status { endpoint: String, status: u16 },
    #[error("invalid map data: {0}")]
    MapData(#[from] MapDataError),
    #[error("invalid {endpoint} payload: {source}")]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },
}

#[derive(Event, Debug)]
pub struct MapDataFetched(pub Result<MapData, BackendError>);

#[derive(Event, Debug)]
pub struct CompaniesFetched(pub Result<Vec<Company>, BackendError>);

/// Route lookup result. `Ok(None)` means the backend knows no route.
#[derive(Event, Debug)]
pub struct RouteFetched {
    pub from: NodeId,
    pub to: NodeId,
    pub result: Result<Option<Vec<NodeId>>, BackendError>,
}

#[derive(Resource, Clone)]
pub struct BackendClient {
    base_url: String,
    transport: Arc<dyn BackendTransport>,
    inbox: ReplyInbox,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, transport: impl BackendTransport) -> Self {
        Self {
            base_url: base_url.into(),
            transport: Arc::new(transport),
            inbox: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn http(base_url: impl Into<String>) -> Self {
        Self::new(base_url, HttpTransport)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into();
    }

    pub fn url_for(&self, request: &BackendRequest) -> String {
        match request {
            BackendRequest::MapData { url: Some(url) } => url.clone(),
            _ => format!(
                "{}{}",
                self.base_url.trim_end_matches('/'),
                request.endpoint()
            ),
        }
    }

    pub fn request(&self, request: BackendRequest) {
        let url = self.url_for(&request);
        debug!("GET {}", url);
        self.transport.get(request, url, self.inbox.clone());
    }

    fn take_replies(&self) -> Vec<BackendReply> {
        match self.inbox.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(_) => Vec::new(),
        }
    }
}

/// Decoded form of a backend reply, one variant per request kind.
#[derive(Debug)]
pub enum BackendEvent {
    MapData(MapDataFetched),
    Companies(CompaniesFetched),
    Route(RouteFetched),
}

pub fn decode_reply(reply: BackendReply) -> BackendEvent {
    let endpoint = reply.request.endpoint();
    match reply.request {
        BackendRequest::MapData { .. } => BackendEvent::MapData(MapDataFetched(
            successful_body(&endpoint, reply.result)
                .and_then(|body| MapData::from_json(&body).map_err(BackendError::from)),
        )),
        BackendRequest::Companies => BackendEvent::Companies(CompaniesFetched(
            successful_body(&endpoint, reply.result).and_then(|body| {
                serde_json::from_str(&body)
                    .map_err(|source| BackendError::Decode { endpoint, source })
            }),
        )),
        BackendRequest::Route { from, to } => {
            let result = match reply.result {
                Ok(response) if response.status == 404 => Ok(None),
                other => successful_body(&endpoint, other).and_then(|body| {
                    serde_json::from_str::<Vec<NodeId>>(&body)
                        .map(Some)
                        .map_err(|source| BackendError::Decode { endpoint, source })
                }),
            };
            BackendEvent::Route(RouteFetched { from, to, result })
        }
    }
}

fn successful_body(
    endpoint: &str,
    result: Result<HttpResponse, TransportError>,
) -> Result<String, BackendError> {
    let response = result?;
    if !response.is_success() {
        return Err(BackendError::Status {
            endpoint: endpoint.to_string(),
            status: response.status,
        });
    }
    Ok(response.body)
}

pub fn drain_backend_replies(
    client: Res<BackendClient>,
    mut map_events: EventWriter<MapDataFetched>,
    mut company_events: EventWriter<CompaniesFetched>,
    mut route_events: EventWriter<RouteFetched>,
) {
    for reply in client.take_replies() {
        match decode_reply(reply) {
            BackendEvent::MapData(event) => {
                map_events.write(event);
            }
            BackendEvent::Companies(event) => {
                company_events.write(event);
            }
            BackendEvent::Route(event) => {
                route_events.write(event);
            }
        }
    }
}

pub struct BackendPlugin;

impl Plugin for BackendPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<BackendClient>() {
            app.insert_resource(BackendClient::http(
                constants::map::DEFAULT_BACKEND_URL,
            ));
        }

        app.add_event::<MapDataFetched>()
            .add_event::<CompaniesFetched>()
            .add_event::<RouteFetched>()
            .add_systems(PreUpdate, drain_backend_replies);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use super::*;

    /// Answers requests synchronously from a fixed url → response table.
    /// Unknown urls fail like an unreachable host.
    #[derive(Default, Clone)]
    pub struct StaticTransport {
        responses: HashMap<String, HttpResponse>,
        pub requested: Arc<Mutex<Vec<String>>>,
    }

    impl StaticTransport {
        pub fn with(mut self, url: &str, status: u16, body: &str) -> Self {
            self.responses.insert(
                url.to_string(),
                HttpResponse {
                    status,
                    body: body.to_string(),
                },
            );
            self
        }
    }

    impl BackendTransport for StaticTransport {
        fn get(&self, request: BackendRequest, url: String, inbox: ReplyInbox) {
            if let Ok(mut requested) = self.requested.lock() {
                requested.push(url.clone());
            }
            let result = self.responses.get(&url).cloned().ok_or(TransportError {
                url,
                message: "connection refused".into(),
            });
            push_reply(&inbox, BackendReply { request, result });
        }
    }
}

//! JSON-RPC 2.0 bridge between the kiosk page and the map viewer.
//!
//! The viewer runs inside an iframe. The page drives it with requests and
//! listens for notifications, both carried over `postMessage`.
//!
//! ## Message Flow
//!
//! ```text
//! Page (Parent Window)   <──postMessage──>  Bevy (iframe)
//!        │                                        │
//!        ├─ Request (with ID) ──────────────────> │
//!        │                                        ├─ dispatch() → MapApi
//!        │ <───────────────── Response (with ID) ─┤
//!        │                                        │
//!        │ <────────── Notification (no ID) ──────┤
//! ```
//!
//! ## Methods
//!
//! ### Highlight
//! - `highlight_building` `{building: id | name}`
//! - `highlight_multiple` `{buildings: [id | name]}`
//! - `clear_highlight`, `get_highlighted_building`
//! - `highlight_category` `{category}`
//!
//! ### Routes
//! - `trace_route` `{nodeIds: [..]}`, `clear_route`, `get_current_route`
//! - `route_to_destination` `{nodeId} | {building}`: backend lookup from the totem
//!
//! ### Camera
//! - `animate_to_top_down` `{durationMs?}`, `reset_camera` `{animate?}`
//! - `cancel_camera_animation`
//! - `camera_set` `{position, target, sourceId}`, `get_last_camera`
//!
//! ### Buildings and destinations
//! - `get_building` `{id} | {name}`, `get_all_buildings`, `get_loaded_building_names`
//! - `get_building_at` `{x, y}`, `get_buildings_in_rect` `{from, to}`
//! - `search_destinations` `{query, limit?}`, `get_categories`, `refresh_companies` `{force?}`
//!
//! ### Flags, lifecycle and diagnostics
//! - `get_feature_flags`, `set_feature_flag` `{flag, enabled}`, `refresh_feature_flags`
//! - `reload_map` `{url?}`, `get_fps`
//!
//! ## Notifications
//!
//! `map_loaded`, `map_load_failed`, `loading_progress`, `building_clicked`,
//! `route_traced`, `route_not_found`, `route_failed`,
//! `camera_animation_finished`, `camera_set`, `feature_flags_changed`,
//! `fps_update`.
//!
//! ## Error Handling
//!
//! Standard JSON-RPC 2.0 error codes:
//! - `-32600`: Invalid request
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error

/// Method table and parameter parsing for every map method.
pub mod map_methods;

/// Notifications raised from engine state changes.
pub mod notifications;

/// JSON-RPC 2.0 transport: message listener, dispatch loop and outgoing queue.
pub mod web_rpc;

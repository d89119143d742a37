use bevy::color::Color;

// Route ribbon
pub const ROUTE_COLOR: Color = Color::srgb(0.0, 90.0 / 255.0, 226.0 / 255.0);
pub const ROUTE_WIDTH: f32 = 2.0;
pub const ROUTE_OPACITY: f32 = 1.0;
pub const ROUTE_HEIGHT: f32 = 0.05;
pub const ROUTE_CAP_SEGMENTS: u32 = 16;
/// Delay between segments when progressive route reveal is enabled.
pub const ROUTE_REVEAL_INTERVAL_SECS: f32 = 0.08;

// Highlight outline
pub const OUTLINE_COLOR: Color = Color::srgb(0.0, 1.0, 1.0);

// Ground
pub const WORLD_SIZE: f32 = 90.0;
pub const ROAD_WIDTH: f32 = 2.5;
pub const ROAD_MASK_SIZE: u32 = 2048;
pub const ROAD_HEIGHT: f32 = 0.01;
pub const ROAD_COLOR: Color = Color::srgb(223.0 / 255.0, 223.0 / 255.0, 223.0 / 255.0);
pub const GRASS_COLOR: Color = Color::srgb(114.0 / 255.0, 196.0 / 255.0, 82.0 / 255.0);
pub const GRASS_TEXTURE_REPEAT: f32 = 30.0;

// Labels
pub const BUILDING_LABEL_HEIGHT: f32 = 12.0;
pub const BUILDING_LABEL_CLEARANCE: f32 = 2.0;
pub const BUILDING_LABEL_FONT_SIZE: f32 = 16.0;
pub const NODE_LABEL_HEIGHT: f32 = 5.0;
pub const NODE_LABEL_FONT_SIZE: f32 = 11.0;
pub const LABEL_TEXT_COLOR: Color = Color::srgb(0.1, 0.1, 0.12);
pub const LABEL_BACKGROUND: Color = Color::srgba(1.0, 1.0, 1.0, 0.85);

// Debug graph
pub const GRAPH_NODE_COLOR: Color = Color::srgba(1.0, 1.0, 0.0, 0.7);
pub const GRAPH_NODE_HEIGHT: f32 = 1.0;
pub const GRAPH_NODE_RADIUS: f32 = 0.6;
pub const GRAPH_EDGE_COLOR: Color = Color::srgba(240.0 / 255.0, 88.0 / 255.0, 61.0 / 255.0, 0.7);
pub const GRAPH_EDGE_HEIGHT: f32 = 0.8;

// Current location pin
pub const LOCATION_MARKER_COLOR: Color = Color::srgb(0.9, 0.1, 0.1);
pub const LOCATION_MARKER_HEIGHT: f32 = 5.0;
pub const LOCATION_MARKER_SCALE: f32 = 4.0;

// Scene
pub const CLEAR_COLOR: Color = Color::srgb(117.0 / 255.0, 181.0 / 255.0, 1.0);
pub const AMBIENT_BRIGHTNESS: f32 = 600.0;
pub const SUN_ILLUMINANCE: f32 = 8_000.0;
pub const FILL_ILLUMINANCE: f32 = 2_500.0;
pub const SHADOW_EXTENT: f32 = 200.0;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
pub const BACKEND_URL_ENV: &str = "TOTEM_BACKEND_URL";

pub const VIEWER_CONFIG_PATH: &str = "config/totem.viewer.json";
pub const MAP_SCHEMA_VERSION: u32 = 1;

// Fixed kiosk location
pub const TOTEM_ID: &str = "totem-99a";
pub const TOTEM_NAME: &str = "Totem - 99A";
pub const TOTEM_NODE_ID: u32 = 47;

/// Buildings sit slightly above the ground plane.
pub const BUILDING_BASE_HEIGHT: f32 = 0.1;

pub const DEFAULT_SEARCH_LIMIT: usize = 5;
pub const ALL_CATEGORY_LABEL: &str = "Todas";
pub const DEFAULT_INSTANCE_ID: &str = "totem-main";

pub const LABEL_EXCLUDED_NAMES: &[&str] = &["tecnopuc"];

pub const GRASS_TEXTURE_PATH: &str = "textures/grass.jpg";

/// Asset source name used for models served from the remote model host.
pub const REMOTE_MODEL_SOURCE: &str = "remote";
pub const DEFAULT_REMOTE_MODELS_URL: &str = "http://localhost:8080/static";

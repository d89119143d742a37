pub mod assets;
pub mod backend;
pub mod camera;
pub mod config;
pub mod core;
pub mod flags;
pub mod loading;
pub mod map_api;
pub mod scene;
pub mod systems;

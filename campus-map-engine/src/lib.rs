pub mod engine;
pub mod rpc;
pub mod tools;

#[cfg(test)]
mod testing;

pub use engine::core::app_setup::create_app;

pub mod binding;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod model;
pub mod pie;
pub mod render;
pub mod scatter;
pub mod server;
pub mod view;

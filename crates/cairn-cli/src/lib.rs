pub mod config;
pub mod diagnostics_layer;
pub mod logging;
pub mod render;
pub mod terminal;

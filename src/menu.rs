pub mod commands;
pub mod common;
pub mod export;
pub mod model;
pub mod render;

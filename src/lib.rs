pub mod app;
pub mod audio;
pub mod config;
pub mod core;
pub mod filter;
pub mod library;
pub mod logging;
pub mod model;
pub mod nav;
pub mod queue;
pub mod ui;

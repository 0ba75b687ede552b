pub mod api;
pub mod cli;
pub mod config;
pub mod debouncer;
pub mod dispatch;
pub mod export;
pub mod logging;
pub mod render;
pub mod search;
pub mod tui_app;

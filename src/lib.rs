pub mod api;
pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod listing;
pub mod logging;
pub mod models;
pub mod render;
pub mod session;
pub mod utils;

#[cfg(test)]
mod tests;

pub mod app;
pub mod cli;
pub mod config;
pub mod download;
pub mod handlers;
pub mod humanize;
pub mod interaction;
pub mod observability;
pub mod plugins;
pub mod search;
pub mod session;
pub mod update;

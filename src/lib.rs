// Club Recruit client - library root

pub mod api;
pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;
pub mod navigation;

pub mod auth;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod models;
pub mod persistence;
pub mod player;
pub mod server;
pub mod sqlite;
pub mod triggers;

pub mod analysis;
pub mod app;
pub mod chat;
pub mod clock;
pub mod commands;
pub mod config;
pub mod discord;
pub mod error;
pub mod event;
pub mod market;
pub mod model;
pub mod scheduler;
pub mod sec;

pub mod auth;
pub mod config;
pub mod formatter;
pub mod history;
pub mod maintenance;
pub mod models;
pub mod policy;
pub mod service;

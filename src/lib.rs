//! Clubsite - bilingual club website backend
//!
//! This library provides the core functionality of the club site: news,
//! photo galleries, the homepage slider and the navigation menu, plus a
//! typed client for the HTTP API.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

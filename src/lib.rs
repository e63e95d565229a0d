//! Meal calorie bot
//!
//! LINE webhook service that runs a YOLO food detector on user photos,
//! publishes the annotated image to Imgur and replies with a calorie
//! estimate looked up in a local SQLite table.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;

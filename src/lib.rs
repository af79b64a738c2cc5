//! Gaffer - personal portfolio content service for a football coach
//!
//! The site's content (the early-life story and the playing and coaching
//! career entries) is served and edited through this crate: an HTTP API
//! with admin-gated writes, and a form engine driving the create and edit
//! flows of every record kind through one shared pipeline.

pub mod api;
pub mod config;
pub mod db;
pub mod form;
pub mod models;
pub mod services;

//! HTTP handlers

pub mod analytics;
pub mod batch;
pub mod health;
pub mod model;
pub mod predict;

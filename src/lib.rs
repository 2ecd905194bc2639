//! Interactive map widget: pick a circular area, type a prompt, and forward
//! both to a processing endpoint.

pub mod app;
pub mod config;
pub mod domain;
pub mod input;
pub mod net;
pub mod platform;
pub mod ui;

//! Batch renderer for RenderForm descriptor files.
//!
//! Every `*.json` file under a directory whose `renderform` field is truthy is
//! sent to the RenderForm API and the resulting image is saved next to it.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;

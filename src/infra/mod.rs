//! Infrastructure adapters: remote service, downloads, filesystem, telemetry.

pub mod assets;
pub mod error;
pub mod http;
pub mod renderform;
pub mod storage;
pub mod telemetry;

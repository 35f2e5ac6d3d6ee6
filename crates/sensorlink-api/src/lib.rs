// sensorlink-api: Async Rust client for the sensor-node backend API

pub mod base;
pub mod client;
pub mod error;
pub mod models;
pub mod node;
pub mod sampling;
pub mod transport;

mod lenient;

pub use client::BackendClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};

//! Serializable data model for the Photoforge culture simulator.

pub mod data_point;
pub mod environment;
pub mod file_formats;
pub mod model;
pub mod request;
pub mod scenario;
pub mod stats;

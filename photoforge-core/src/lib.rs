//! Kinetic simulation of Chlorella vulgaris photobioreactor cultures and the
//! machinery that turns simulated scenarios into train/validation/test datasets.

pub mod analysis;
pub mod dataset;
pub mod error;
pub mod export;
pub mod library;
pub mod logger;
pub mod sampling;
pub mod simulation;

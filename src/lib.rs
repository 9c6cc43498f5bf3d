//! Command-line front end and async service over `roadtsp_core`

pub mod config;
mod error;
pub mod service;

pub use config::{Overrides, load_config};
pub use error::AppError;
pub use service::{NetworkFormat, SessionService};

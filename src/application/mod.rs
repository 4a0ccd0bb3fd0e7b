// Application layer - configuration, orchestration and persistence of runs.

pub mod config;
pub mod error;
pub mod persistence;
pub mod service;
pub mod synthesis;

pub use config::*;
pub use error::*;
pub use persistence::*;
pub use service::*;
pub use synthesis::*;

mod decompose;
mod error;
mod forecast;
mod transaction;

pub use decompose::*;
pub use error::*;
pub use forecast::*;
pub use transaction::*;

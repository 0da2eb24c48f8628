pub mod batch;
pub mod config;
pub mod error;
pub mod error_utils;
pub mod extractor;
pub mod filter;
pub mod types;

pub use batch::*;
pub use config::*;
pub use error::*;
pub use error_utils::*;
pub use extractor::*;
pub use types::*;

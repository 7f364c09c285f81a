//! Core types and service seams for the incremental enrichment engine.

pub mod area;
pub mod error;
pub mod keys;
pub mod records;
pub mod traits;
pub mod window;

pub use area::*;
pub use error::{Error, Result};
pub use keys::*;
pub use records::*;
pub use traits::*;
pub use window::*;

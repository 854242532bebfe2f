//! # Data Loader Crate
//!
//! Record types for the movie catalog and rating history, plus the loader that
//! fills an in-memory `DataIndex` from `.dat` files.
//!
//! ## Main Components
//!
//! - **types**: `MovieRecord`, `RatingRecord`, `Timestamps`, `DataIndex`
//! - **parser**: Parse .dat files into records
//! - **index**: Load and validate a `DataIndex`
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DataIndex;
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_files(Path::new("data/catalog"))?;
//! let history = index.user_history(1);
//! println!("User 1 rated {} of {} movies", history.len(), index.catalog().len());
//! ```

pub mod error;
pub mod types;
pub mod parser;
pub mod index;

pub use error::{DataLoadError, Result};
pub use types::{
    // Type aliases
    UserId,
    MovieId,
    // Records
    MovieRecord,
    RatingRecord,
    Timestamps,
    DataIndex,
    // Helpers
    normalize_genres,
    normalize_tags,
    MAX_STARS,
    MIN_STARS,
};

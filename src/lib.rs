//! ace-check
//!
//! Runs Ace by DAISY against an EPUB, flattens its JSON report into rows and
//! maps each finding's CFI back to a line in the offending content document.
//!
//! # Modules
//!
//! - `cfi`: CFI parsing and resolution against a document tree
//! - `dom`: content documents annotated with source lines
//! - `report`: Ace report schema and flattening
//! - `ace`: invoking the checker
//! - `navigate`: jump-to-location seam

pub mod ace;
pub mod cfi;
pub mod config;
pub mod dom;
pub mod epub;
pub mod error;
pub mod locate;
pub mod navigate;
pub mod output;
pub mod report;

pub use error::{AppError, Result};

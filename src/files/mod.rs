//! Directory walking and text-file filtering.

pub mod filter;
pub mod walk;

pub use walk::{list_files, parse_files};

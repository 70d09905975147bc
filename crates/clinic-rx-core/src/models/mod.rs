//! Domain models for the prescription desk.

mod draft;
mod medicine;
mod patient;
mod prescription;

pub use draft::*;
pub use medicine::*;
pub use patient::*;
pub use prescription::*;

/// Standardize a stored text field: trimmed and upper-cased.
pub fn normalize_text(value: &str) -> String {
    value.trim().to_uppercase()
}

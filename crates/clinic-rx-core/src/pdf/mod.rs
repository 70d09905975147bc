//! Prescription PDF rendering.
//!
//! Rendering is split in two steps: [`plan_document`] computes every page
//! and element, then the plan is emitted as PDF bytes with `printpdf`.

mod layout;
mod render;
mod text;

pub use layout::*;
pub use text::{long_form_date, short_date, wrap_text};

use std::collections::HashMap;

use thiserror::Error;

use crate::config::Letterhead;
use crate::models::{Medicine, Patient, Prescription};
use crate::validation::ValidationError;

/// Medicine identifier to catalog entry, as resolved for one render call.
pub type MedicineIndex = HashMap<String, Medicine>;

/// Render errors.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid render request: {0}")]
    Validation(#[from] ValidationError),

    #[error("PDF font error: {0}")]
    Font(String),

    #[error("PDF save error: {0}")]
    Save(String),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Render `prescriptions` for `patient` into a single PDF document.
pub fn render_prescriptions(
    prescriptions: &[Prescription],
    patient: &Patient,
    medicines: &MedicineIndex,
    letterhead: &Letterhead,
) -> RenderResult<Vec<u8>> {
    let plan = plan_document(prescriptions, patient, medicines, letterhead)?;
    let bytes = render::emit(&plan)?;

    tracing::info!(
        patient_id = %patient.id,
        prescriptions = prescriptions.len(),
        pages = plan.pages.len(),
        bytes = bytes.len(),
        "Rendered prescription document"
    );
    Ok(bytes)
}

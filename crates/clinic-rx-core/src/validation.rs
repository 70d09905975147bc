//! Caller-correctable input errors, reported before any side effect.

use thiserror::Error;

/// Validation errors for expansion and rendering requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no patient selected")]
    NoPatient,

    #[error("empty medicine list")]
    EmptyMedicineList,

    #[error("no date selected")]
    NoDateSelected,

    #[error("no prescriptions to render")]
    NoPrescriptions,

    #[error("prescription {prescription_id} belongs to patient {found}, not {expected}")]
    PatientMismatch {
        prescription_id: String,
        expected: String,
        found: String,
    },
}

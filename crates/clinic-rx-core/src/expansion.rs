//! Multi-date expansion: one persisted prescription per enabled draft date.
//!
//! Every check runs before the first store call. Records are then created
//! strictly one after another in date-entry order, and the first store
//! failure stops the batch. Records created before the failure stay
//! persisted and are handed back in the error.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{NewPrescription, Prescription, PrescriptionDraft};
use crate::store::{PrescriptionStore, StoreError};
use crate::validation::ValidationError;

/// Expansion errors.
#[derive(Error, Debug)]
pub enum ExpansionError {
    #[error("Invalid draft: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to create prescription for {date} after {} created: {source}", .created.len())]
    Store {
        date: NaiveDate,
        created: Vec<Prescription>,
        #[source]
        source: StoreError,
    },
}

impl ExpansionError {
    /// Records that were persisted before the batch stopped.
    pub fn created(&self) -> &[Prescription] {
        match self {
            ExpansionError::Validation(_) => &[],
            ExpansionError::Store { created, .. } => created,
        }
    }
}

pub type ExpansionResult<T> = Result<T, ExpansionError>;

/// Check a draft in the order patient, line items, dates.
pub fn validate_draft(draft: &PrescriptionDraft) -> Result<(), ValidationError> {
    if draft.patient_id.trim().is_empty() {
        return Err(ValidationError::NoPatient);
    }
    if draft.line_items.is_empty() {
        return Err(ValidationError::EmptyMedicineList);
    }
    if !draft.dates.iter().any(|d| d.enabled) {
        return Err(ValidationError::NoDateSelected);
    }
    Ok(())
}

/// Prescription inputs for every enabled date, in entry order.
pub fn plan_expansion(draft: &PrescriptionDraft) -> Vec<NewPrescription> {
    draft
        .enabled_dates()
        .into_iter()
        .map(|date| NewPrescription {
            patient_id: draft.patient_id.clone(),
            date,
            line_items: draft.line_items.clone(),
            observations: draft.observations.clone(),
        })
        .collect()
}

/// Validate `draft` and persist one prescription per enabled date.
pub async fn expand_draft<S: PrescriptionStore>(
    store: &S,
    draft: &PrescriptionDraft,
) -> ExpansionResult<Vec<Prescription>> {
    validate_draft(draft)?;

    let planned = plan_expansion(draft);
    tracing::info!(
        patient_id = %draft.patient_id,
        count = planned.len(),
        items = draft.line_items.len(),
        "Expanding prescription draft"
    );

    let mut created = Vec::with_capacity(planned.len());
    for data in planned {
        let date = data.date;
        match store.create_prescription(data).await {
            Ok(prescription) => created.push(prescription),
            Err(source) => {
                tracing::warn!(
                    %date,
                    created = created.len(),
                    error = %source,
                    "Prescription batch stopped"
                );
                return Err(ExpansionError::Store {
                    date,
                    created,
                    source,
                });
            }
        }
    }

    Ok(created)
}

//! Asynchronous store interface for patients, medicines and prescriptions.
//!
//! The backing store is the sole authority over persisted state and assigns
//! every identifier. Each operation is a fallible call; callers surface
//! failures and never retry on their own.

mod cache;
mod seed;
mod sqlite;

pub use cache::*;
pub use seed::*;
pub use sqlite::*;

use thiserror::Error;

use crate::db::DbError;
use crate::expansion::{self, ExpansionResult};
use crate::models::{
    Medicine, NewMedicine, NewPatient, NewPrescription, Patient, Prescription, PrescriptionDraft,
};

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rejected input: {0}")]
    Rejected(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Patient operations.
#[allow(async_fn_in_trait)]
pub trait PatientStore {
    async fn list_patients(&self) -> StoreResult<Vec<Patient>>;

    async fn patient_by_id(&self, id: &str) -> StoreResult<Option<Patient>>;

    async fn create_patient(&self, data: NewPatient) -> StoreResult<Patient>;

    async fn update_patient(&self, id: &str, data: NewPatient) -> StoreResult<Patient>;

    async fn delete_patient(&self, id: &str) -> StoreResult<()>;

    async fn search_patients(&self, query: &str) -> StoreResult<Vec<Patient>>;
}

/// Medicine catalog operations.
#[allow(async_fn_in_trait)]
pub trait MedicineStore {
    async fn list_medicines(&self) -> StoreResult<Vec<Medicine>>;

    async fn medicine_by_id(&self, id: &str) -> StoreResult<Option<Medicine>>;

    async fn create_medicine(&self, data: NewMedicine) -> StoreResult<Medicine>;

    async fn update_medicine(&self, id: &str, data: NewMedicine) -> StoreResult<Medicine>;

    async fn delete_medicine(&self, id: &str) -> StoreResult<()>;

    async fn search_medicines(&self, query: &str) -> StoreResult<Vec<Medicine>>;
}

/// Prescription operations. Prescriptions are never updated.
#[allow(async_fn_in_trait)]
pub trait PrescriptionStore {
    async fn list_prescriptions(&self) -> StoreResult<Vec<Prescription>>;

    async fn prescriptions_for_patient(&self, patient_id: &str) -> StoreResult<Vec<Prescription>>;

    async fn prescription_by_id(&self, id: &str) -> StoreResult<Option<Prescription>>;

    async fn create_prescription(&self, data: NewPrescription) -> StoreResult<Prescription>;

    async fn delete_prescription(&self, id: &str) -> StoreResult<()>;

    /// Materialize a draft into one prescription per enabled date.
    async fn create_multiple(&self, draft: &PrescriptionDraft) -> ExpansionResult<Vec<Prescription>>
    where
        Self: Sized,
    {
        expansion::expand_draft(self, draft).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_converts() {
        let err: StoreError = DbError::NotFound("p-1".into()).into();
        assert!(matches!(err, StoreError::Database(_)));
        assert_eq!(err.to_string(), "Database error: Record not found: p-1");
    }
}

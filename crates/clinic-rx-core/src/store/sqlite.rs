//! Store implementation over the local SQLite database.

use crate::db::{Database, DbError};
use crate::models::{
    Medicine, NewMedicine, NewPatient, NewPrescription, Patient, Prescription,
};

use super::{MedicineStore, PatientStore, PrescriptionStore, StoreError, StoreResult};

/// Most rows a search returns.
pub const SEARCH_LIMIT: usize = 50;

/// SQLite-backed store. Assigns UUID identifiers on create.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Underlying database (for maintenance tasks).
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Remove every prescription while keeping patients and medicines.
    pub fn purge_prescriptions(&self) -> StoreResult<usize> {
        let removed = self.db.purge_prescriptions()?;
        tracing::info!(removed, "Purged prescriptions");
        Ok(removed)
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn rejected(err: DbError) -> StoreError {
    match err {
        DbError::Constraint(message) => StoreError::Rejected(message),
        other => StoreError::Database(other),
    }
}

impl PatientStore for SqliteStore {
    async fn list_patients(&self) -> StoreResult<Vec<Patient>> {
        Ok(self.db.list_patients()?)
    }

    async fn patient_by_id(&self, id: &str) -> StoreResult<Option<Patient>> {
        Ok(self.db.get_patient(id)?)
    }

    async fn create_patient(&self, data: NewPatient) -> StoreResult<Patient> {
        data.validate().map_err(StoreError::Rejected)?;
        let patient = Patient::from_new(new_id(), &data);
        self.db.insert_patient(&patient)?;
        tracing::debug!(patient_id = %patient.id, "Created patient");
        Ok(patient)
    }

    async fn update_patient(&self, id: &str, data: NewPatient) -> StoreResult<Patient> {
        data.validate().map_err(StoreError::Rejected)?;
        let existing = self
            .db
            .get_patient(id)?
            .ok_or_else(|| StoreError::NotFound(format!("patient {}", id)))?;

        let mut patient = Patient::from_new(existing.id, &data);
        patient.created_at = existing.created_at;
        self.db.update_patient(&patient)?;
        tracing::debug!(patient_id = %patient.id, "Updated patient");
        Ok(patient)
    }

    async fn delete_patient(&self, id: &str) -> StoreResult<()> {
        if !self.db.delete_patient(id)? {
            return Err(StoreError::NotFound(format!("patient {}", id)));
        }
        tracing::debug!(patient_id = %id, "Deleted patient");
        Ok(())
    }

    async fn search_patients(&self, query: &str) -> StoreResult<Vec<Patient>> {
        Ok(self.db.search_patients(query, SEARCH_LIMIT)?)
    }
}

impl MedicineStore for SqliteStore {
    async fn list_medicines(&self) -> StoreResult<Vec<Medicine>> {
        Ok(self.db.list_medicines()?)
    }

    async fn medicine_by_id(&self, id: &str) -> StoreResult<Option<Medicine>> {
        Ok(self.db.get_medicine(id)?)
    }

    async fn create_medicine(&self, data: NewMedicine) -> StoreResult<Medicine> {
        data.validate().map_err(StoreError::Rejected)?;
        let medicine = Medicine::from_new(new_id(), &data);
        self.db.insert_medicine(&medicine).map_err(rejected)?;
        tracing::debug!(medicine_id = %medicine.id, "Created medicine");
        Ok(medicine)
    }

    async fn update_medicine(&self, id: &str, data: NewMedicine) -> StoreResult<Medicine> {
        data.validate().map_err(StoreError::Rejected)?;
        let existing = self
            .db
            .get_medicine(id)?
            .ok_or_else(|| StoreError::NotFound(format!("medicine {}", id)))?;

        let mut medicine = Medicine::from_new(existing.id, &data);
        medicine.created_at = existing.created_at;
        self.db.update_medicine(&medicine).map_err(rejected)?;
        tracing::debug!(medicine_id = %medicine.id, "Updated medicine");
        Ok(medicine)
    }

    async fn delete_medicine(&self, id: &str) -> StoreResult<()> {
        if !self.db.delete_medicine(id)? {
            return Err(StoreError::NotFound(format!("medicine {}", id)));
        }
        tracing::debug!(medicine_id = %id, "Deleted medicine");
        Ok(())
    }

    async fn search_medicines(&self, query: &str) -> StoreResult<Vec<Medicine>> {
        Ok(self.db.search_medicines(query, SEARCH_LIMIT)?)
    }
}

impl PrescriptionStore for SqliteStore {
    async fn list_prescriptions(&self) -> StoreResult<Vec<Prescription>> {
        Ok(self.db.list_prescriptions()?)
    }

    async fn prescriptions_for_patient(&self, patient_id: &str) -> StoreResult<Vec<Prescription>> {
        Ok(self.db.list_prescriptions_for_patient(patient_id)?)
    }

    async fn prescription_by_id(&self, id: &str) -> StoreResult<Option<Prescription>> {
        Ok(self.db.get_prescription(id)?)
    }

    async fn create_prescription(&self, data: NewPrescription) -> StoreResult<Prescription> {
        if self.db.get_patient(&data.patient_id)?.is_none() {
            return Err(StoreError::NotFound(format!("patient {}", data.patient_id)));
        }
        let prescription = Prescription::from_new(new_id(), data);
        self.db.insert_prescription(&prescription)?;
        tracing::debug!(
            prescription_id = %prescription.id,
            date = %prescription.date,
            "Created prescription"
        );
        Ok(prescription)
    }

    async fn delete_prescription(&self, id: &str) -> StoreResult<()> {
        if !self.db.delete_prescription(id)? {
            return Err(StoreError::NotFound(format!("prescription {}", id)));
        }
        tracing::debug!(prescription_id = %id, "Deleted prescription");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DosageForm, LineItem};
    use chrono::NaiveDate;

    fn setup_store() -> SqliteStore {
        SqliteStore::new(Database::open_in_memory().unwrap())
    }

    #[tokio::test]
    async fn test_create_patient_assigns_id() {
        let store = setup_store();

        let a = store.create_patient(NewPatient::new("Maria")).await.unwrap();
        let b = store.create_patient(NewPatient::new("Maria")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 36); // UUID format
    }

    #[tokio::test]
    async fn test_create_patient_rejects_bad_input() {
        let store = setup_store();

        let result = store.create_patient(NewPatient::new(" ")).await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));

        let mut data = NewPatient::new("Maria");
        data.national_id = Some("123.456".into());
        let result = store.create_patient(data).await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_update_patient_keeps_identity() {
        let store = setup_store();

        let created = store.create_patient(NewPatient::new("Maria")).await.unwrap();
        let mut data = NewPatient::new("Maria José");
        data.birth_date = NaiveDate::from_ymd_opt(1975, 12, 1);
        let updated = store.update_patient(&created.id, data).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        let fetched = store.patient_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "MARIA JOSÉ");
        assert_eq!(fetched.birth_date, NaiveDate::from_ymd_opt(1975, 12, 1));
    }

    #[tokio::test]
    async fn test_missing_records_are_not_found() {
        let store = setup_store();

        assert!(matches!(
            store.update_patient("ghost", NewPatient::new("X")).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_patient("ghost").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_medicine("ghost").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_prescription("ghost").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_medicine_rejected() {
        let store = setup_store();

        store
            .create_medicine(NewMedicine::new("Dipirona", "500mg", DosageForm::Tablet))
            .await
            .unwrap();
        let result = store
            .create_medicine(NewMedicine::new("DIPIRONA", "500MG", DosageForm::Tablet))
            .await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_prescription_for_unknown_patient() {
        let store = setup_store();

        let result = store
            .create_prescription(NewPrescription {
                patient_id: "ghost".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                line_items: vec![LineItem::new("m-1", "")],
                observations: String::new(),
            })
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_searches() {
        let store = setup_store();

        store.create_patient(NewPatient::new("Maria Souza")).await.unwrap();
        store
            .create_medicine(NewMedicine::new("Losartana", "50mg", DosageForm::Tablet))
            .await
            .unwrap();

        assert_eq!(store.search_patients("souza").await.unwrap().len(), 1);
        assert_eq!(store.search_medicines("losar").await.unwrap().len(), 1);
        assert!(store.search_medicines("").await.unwrap().is_empty());
    }
}

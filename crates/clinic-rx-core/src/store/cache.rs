//! In-memory identifier cache in front of a store.

use std::collections::HashMap;

use crate::models::{Medicine, NewMedicine, NewPatient, Patient, Prescription};
use crate::pdf::MedicineIndex;

use super::{MedicineStore, PatientStore, StoreResult};

/// Identifier to entity maps for patients and medicines.
///
/// Entries are filled on first fetch and dropped when the entity is updated
/// or deleted through the cache. Mutations made directly on the store are
/// not seen until [`CatalogCache::clear`].
pub struct CatalogCache<S> {
    store: S,
    patients: HashMap<String, Patient>,
    medicines: HashMap<String, Medicine>,
}

impl<S> CatalogCache<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            patients: HashMap::new(),
            medicines: HashMap::new(),
        }
    }

    /// The wrapped store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Drop every cached entry.
    pub fn clear(&mut self) {
        self.patients.clear();
        self.medicines.clear();
    }

    pub fn cached_patients(&self) -> usize {
        self.patients.len()
    }

    pub fn cached_medicines(&self) -> usize {
        self.medicines.len()
    }
}

impl<S: PatientStore> CatalogCache<S> {
    pub async fn patient(&mut self, id: &str) -> StoreResult<Option<Patient>> {
        if let Some(patient) = self.patients.get(id) {
            return Ok(Some(patient.clone()));
        }
        let fetched = self.store.patient_by_id(id).await?;
        if let Some(patient) = &fetched {
            self.patients.insert(patient.id.clone(), patient.clone());
        }
        Ok(fetched)
    }

    pub async fn update_patient(&mut self, id: &str, data: NewPatient) -> StoreResult<Patient> {
        self.patients.remove(id);
        self.store.update_patient(id, data).await
    }

    pub async fn delete_patient(&mut self, id: &str) -> StoreResult<()> {
        self.patients.remove(id);
        self.store.delete_patient(id).await
    }
}

impl<S: MedicineStore> CatalogCache<S> {
    pub async fn medicine(&mut self, id: &str) -> StoreResult<Option<Medicine>> {
        if let Some(medicine) = self.medicines.get(id) {
            return Ok(Some(medicine.clone()));
        }
        let fetched = self.store.medicine_by_id(id).await?;
        if let Some(medicine) = &fetched {
            self.medicines.insert(medicine.id.clone(), medicine.clone());
        }
        Ok(fetched)
    }

    pub async fn update_medicine(&mut self, id: &str, data: NewMedicine) -> StoreResult<Medicine> {
        self.medicines.remove(id);
        self.store.update_medicine(id, data).await
    }

    pub async fn delete_medicine(&mut self, id: &str) -> StoreResult<()> {
        self.medicines.remove(id);
        self.store.delete_medicine(id).await
    }

    /// Resolve every medicine referenced by `prescriptions`. Identifiers the
    /// store no longer knows are left out of the index.
    pub async fn medicine_index(&mut self, prescriptions: &[Prescription]) -> StoreResult<MedicineIndex> {
        let mut index = MedicineIndex::new();
        for item in prescriptions.iter().flat_map(|p| &p.line_items) {
            if index.contains_key(&item.medicine_id) {
                continue;
            }
            match self.medicine(&item.medicine_id).await? {
                Some(medicine) => {
                    index.insert(medicine.id.clone(), medicine);
                }
                None => {
                    tracing::debug!(medicine_id = %item.medicine_id, "Medicine not in catalog");
                }
            }
        }
        Ok(index)
    }
}

//! Clinic Rx Core Library
//!
//! Local prescription desk for a municipal health department: patient
//! records, a medicine catalog, multi-date prescriptions and printable PDFs.
//!
//! # Architecture
//!
//! ```text
//!   PrescriptionDraft ──► Multi-Date Expansion ──► PrescriptionStore
//!   (one editing session)   (one record per date)        │
//!                                                        ▼
//!   CatalogCache ──── medicine index ────────────► PDF Renderer
//!   (patients, medicines)                        (plan → printpdf bytes)
//! ```
//!
//! # Modules
//!
//! - [`models`]: Domain types (Patient, Medicine, Prescription, PrescriptionDraft)
//! - [`db`]: SQLite database layer with FTS5 medicine search
//! - [`store`]: Async store traits, SQLite store, catalog cache
//! - [`expansion`]: Multi-date prescription expansion
//! - [`pdf`]: Page planning and PDF rendering
//! - [`config`]: Startup configuration and letterhead texts
//! - [`validation`]: Caller-correctable input errors

pub mod config;
pub mod db;
pub mod expansion;
pub mod models;
pub mod pdf;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use config::{ClinicConfig, Letterhead};
pub use db::Database;
pub use expansion::{expand_draft, validate_draft, ExpansionError};
pub use models::{
    format_national_id, quick_select_dates, DateSelection, DosageForm, LineItem, Medicine,
    NewMedicine, NewPatient, NewPrescription, Patient, Prescription, PrescriptionDraft,
};
pub use pdf::{plan_document, render_prescriptions, DocumentPlan, MedicineIndex, RenderError};
pub use store::{
    seed_official_catalog, CatalogCache, MedicineStore, PatientStore, PrescriptionStore,
    SeedReport, SqliteStore, StoreError,
};
pub use validation::ValidationError;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A multi-date batch stopped part way. `created_ids` stay persisted.
    #[error("Batch stopped at {failed_date} after {} created: {reason}", .created_ids.len())]
    PartialBatch {
        failed_date: String,
        created_ids: Vec<String>,
        reason: String,
    },
}

impl From<db::DbError> for ClinicError {
    fn from(e: db::DbError) -> Self {
        ClinicError::DatabaseError(e.to_string())
    }
}

impl From<StoreError> for ClinicError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => ClinicError::NotFound(what),
            StoreError::Rejected(reason) => ClinicError::InvalidInput(reason),
            other => ClinicError::DatabaseError(other.to_string()),
        }
    }
}

impl From<ExpansionError> for ClinicError {
    fn from(e: ExpansionError) -> Self {
        match e {
            ExpansionError::Validation(v) => ClinicError::ValidationError(v.to_string()),
            ExpansionError::Store {
                date,
                created,
                source,
            } => ClinicError::PartialBatch {
                failed_date: iso(date),
                created_ids: created.into_iter().map(|p| p.id).collect(),
                reason: source.to_string(),
            },
        }
    }
}

impl From<RenderError> for ClinicError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::Validation(v) => ClinicError::ValidationError(v.to_string()),
            other => ClinicError::RenderError(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for ClinicError {
    fn from(e: config::ConfigError) -> Self {
        ClinicError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, ClinicError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| ClinicError::InvalidInput(format!("invalid date {:?}: {}", value, e)))
}

fn parse_optional_date(value: Option<String>) -> Result<Option<NaiveDate>, ClinicError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_date(&v))
        .transpose()
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a clinic database at the given path.
#[uniffi::export]
pub fn open_clinic(path: String) -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open(&path)?;
    ClinicCore::new(db, ClinicConfig::with_db_path(path.into()))
}

/// Open a clinic database with a custom letterhead (JSON) and PDF filename prefix.
#[uniffi::export]
pub fn open_clinic_with_config(
    path: String,
    letterhead_json: Option<String>,
    pdf_prefix: Option<String>,
) -> Result<Arc<ClinicCore>, ClinicError> {
    let letterhead = match letterhead_json {
        Some(json) => Letterhead::from_json(&json)?,
        None => Letterhead::default(),
    };
    let config = ClinicConfig::new(
        path.clone().into(),
        letterhead,
        pdf_prefix.unwrap_or_else(|| config::DEFAULT_PDF_PREFIX.into()),
    )?;
    let db = Database::open(&path)?;
    ClinicCore::new(db, config)
}

/// Create an in-memory clinic (for testing).
#[uniffi::export]
pub fn open_clinic_in_memory() -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open_in_memory()?;
    ClinicCore::new(db, ClinicConfig::with_db_path(":memory:".into()))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe clinic handle for FFI.
///
/// Store calls are driven on a private current-thread runtime; the cache
/// lock is held for the whole call.
#[derive(uniffi::Object)]
pub struct ClinicCore {
    cache: Mutex<CatalogCache<SqliteStore>>,
    runtime: tokio::runtime::Runtime,
    config: ClinicConfig,
}

impl ClinicCore {
    fn new(db: Database, config: ClinicConfig) -> Result<Arc<Self>, ClinicError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|e| ClinicError::DatabaseError(format!("Runtime error: {}", e)))?;
        Ok(Arc::new(Self {
            cache: Mutex::new(CatalogCache::new(SqliteStore::new(db))),
            runtime,
            config,
        }))
    }
}

#[uniffi::export]
impl ClinicCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, ClinicError> {
        let cache = self.cache.lock()?;
        let patients = self.runtime.block_on(cache.store().list_patients())?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    pub fn get_patient(&self, id: String) -> Result<Option<FfiPatient>, ClinicError> {
        let mut cache = self.cache.lock()?;
        let patient = self.runtime.block_on(cache.patient(&id))?;
        Ok(patient.map(|p| p.into()))
    }

    pub fn create_patient(&self, data: FfiNewPatient) -> Result<FfiPatient, ClinicError> {
        let data = NewPatient::try_from(data)?;
        let cache = self.cache.lock()?;
        let patient = self.runtime.block_on(cache.store().create_patient(data))?;
        Ok(patient.into())
    }

    pub fn update_patient(&self, id: String, data: FfiNewPatient) -> Result<FfiPatient, ClinicError> {
        let data = NewPatient::try_from(data)?;
        let mut cache = self.cache.lock()?;
        let patient = self.runtime.block_on(cache.update_patient(&id, data))?;
        Ok(patient.into())
    }

    /// Delete a patient together with their prescriptions.
    pub fn delete_patient(&self, id: String) -> Result<(), ClinicError> {
        let mut cache = self.cache.lock()?;
        self.runtime.block_on(cache.delete_patient(&id))?;
        Ok(())
    }

    /// Search patients by name or national ID substring.
    pub fn search_patients(&self, query: String) -> Result<Vec<FfiPatient>, ClinicError> {
        let cache = self.cache.lock()?;
        let patients = self.runtime.block_on(cache.store().search_patients(&query))?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Medicine Operations
    // =========================================================================

    pub fn list_medicines(&self) -> Result<Vec<FfiMedicine>, ClinicError> {
        let cache = self.cache.lock()?;
        let medicines = self.runtime.block_on(cache.store().list_medicines())?;
        Ok(medicines.into_iter().map(|m| m.into()).collect())
    }

    pub fn get_medicine(&self, id: String) -> Result<Option<FfiMedicine>, ClinicError> {
        let mut cache = self.cache.lock()?;
        let medicine = self.runtime.block_on(cache.medicine(&id))?;
        Ok(medicine.map(|m| m.into()))
    }

    pub fn create_medicine(&self, data: FfiNewMedicine) -> Result<FfiMedicine, ClinicError> {
        let data = NewMedicine::try_from(data)?;
        let cache = self.cache.lock()?;
        let medicine = self.runtime.block_on(cache.store().create_medicine(data))?;
        Ok(medicine.into())
    }

    pub fn update_medicine(&self, id: String, data: FfiNewMedicine) -> Result<FfiMedicine, ClinicError> {
        let data = NewMedicine::try_from(data)?;
        let mut cache = self.cache.lock()?;
        let medicine = self.runtime.block_on(cache.update_medicine(&id, data))?;
        Ok(medicine.into())
    }

    /// Delete a medicine. Prescriptions that list it are kept.
    pub fn delete_medicine(&self, id: String) -> Result<(), ClinicError> {
        let mut cache = self.cache.lock()?;
        self.runtime.block_on(cache.delete_medicine(&id))?;
        Ok(())
    }

    /// Prefix search over medicine names.
    pub fn search_medicines(&self, query: String) -> Result<Vec<FfiMedicine>, ClinicError> {
        let cache = self.cache.lock()?;
        let medicines = self.runtime.block_on(cache.store().search_medicines(&query))?;
        Ok(medicines.into_iter().map(|m| m.into()).collect())
    }

    /// Load the official municipal medicine list. Entries already in the
    /// catalog are skipped.
    pub fn seed_official_catalog(&self) -> Result<FfiSeedReport, ClinicError> {
        let cache = self.cache.lock()?;
        let report = self.runtime.block_on(seed_official_catalog(cache.store()))?;
        Ok(report.into())
    }

    // =========================================================================
    // Prescription Operations
    // =========================================================================

    pub fn list_prescriptions(&self) -> Result<Vec<FfiPrescription>, ClinicError> {
        let cache = self.cache.lock()?;
        let prescriptions = self.runtime.block_on(cache.store().list_prescriptions())?;
        Ok(prescriptions.into_iter().map(|p| p.into()).collect())
    }

    pub fn prescriptions_for_patient(&self, patient_id: String) -> Result<Vec<FfiPrescription>, ClinicError> {
        let cache = self.cache.lock()?;
        let prescriptions = self
            .runtime
            .block_on(cache.store().prescriptions_for_patient(&patient_id))?;
        Ok(prescriptions.into_iter().map(|p| p.into()).collect())
    }

    pub fn delete_prescription(&self, id: String) -> Result<(), ClinicError> {
        let cache = self.cache.lock()?;
        self.runtime.block_on(cache.store().delete_prescription(&id))?;
        Ok(())
    }

    /// Remove every prescription. Returns how many were removed.
    pub fn purge_prescriptions(&self) -> Result<u32, ClinicError> {
        let cache = self.cache.lock()?;
        let removed = cache.store().purge_prescriptions()?;
        Ok(removed as u32)
    }

    /// Create one prescription per enabled date of `draft`, in date-entry order.
    ///
    /// On a store failure the batch stops; prescriptions created before it
    /// are kept.
    pub fn create_prescriptions(&self, draft: FfiPrescriptionDraft) -> Result<Vec<FfiPrescription>, ClinicError> {
        let draft = PrescriptionDraft::try_from(draft)?;
        let cache = self.cache.lock()?;
        let created = self.runtime.block_on(cache.store().create_multiple(&draft))?;
        Ok(created.into_iter().map(|p| p.into()).collect())
    }

    /// Download filename for a prescription.
    pub fn pdf_filename(&self, prescription_id: String) -> Result<String, ClinicError> {
        let cache = self.cache.lock()?;
        let prescription = self
            .runtime
            .block_on(cache.store().prescription_by_id(&prescription_id))?
            .ok_or_else(|| ClinicError::NotFound(format!("prescription {}", prescription_id)))?;
        Ok(prescription.pdf_filename(self.config.pdf_prefix()))
    }

    /// Render prescriptions of a patient as one PDF.
    ///
    /// With no `prescription_ids`, every prescription of the patient is
    /// rendered in date order.
    pub fn render_patient_pdf(
        &self,
        patient_id: String,
        prescription_ids: Vec<String>,
    ) -> Result<Vec<u8>, ClinicError> {
        let mut cache = self.cache.lock()?;
        self.runtime.block_on(async {
            let patient = cache
                .patient(&patient_id)
                .await?
                .ok_or_else(|| ClinicError::NotFound(format!("patient {}", patient_id)))?;

            let prescriptions = if prescription_ids.is_empty() {
                cache.store().prescriptions_for_patient(&patient_id).await?
            } else {
                let mut selected = Vec::with_capacity(prescription_ids.len());
                for id in &prescription_ids {
                    let prescription = cache
                        .store()
                        .prescription_by_id(id)
                        .await?
                        .ok_or_else(|| ClinicError::NotFound(format!("prescription {}", id)))?;
                    selected.push(prescription);
                }
                selected
            };

            let medicines = cache.medicine_index(&prescriptions).await?;
            let bytes =
                render_prescriptions(&prescriptions, &patient, &medicines, self.config.letterhead())?;
            Ok::<_, ClinicError>(bytes)
        })
    }

    // =========================================================================
    // Draft Helpers
    // =========================================================================

    /// `months` enabled monthly dates starting at `start` (YYYY-MM-DD).
    pub fn quick_select_dates(&self, start: String, months: u32) -> Result<Vec<FfiDateSelection>, ClinicError> {
        let start = parse_date(&start)?;
        Ok(quick_select_dates(start, months)
            .into_iter()
            .map(|d| d.into())
            .collect())
    }

    /// Date entry to append to `dates`, one month after the latest one.
    pub fn next_date(&self, dates: Vec<FfiDateSelection>, start: String) -> Result<String, ClinicError> {
        let start = parse_date(&start)?;
        let dates = dates
            .into_iter()
            .map(DateSelection::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        models::next_date(&dates, start)
            .map(iso)
            .ok_or_else(|| ClinicError::InvalidInput("date out of range".into()))
    }

    /// Format national-ID input as `XXX.XXX.XXX-XX`, partially while typing.
    pub fn format_national_id(&self, input: String) -> String {
        format_national_id(&input)
    }

    /// Dosage forms as (storage code, display label) pairs.
    pub fn dosage_forms(&self) -> Vec<FfiDosageForm> {
        DosageForm::ALL
            .iter()
            .map(|form| FfiDosageForm {
                code: form.as_str().into(),
                label: form.label().into(),
            })
            .collect()
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub name: String,
    pub national_id: Option<String>,
    /// YYYY-MM-DD
    pub birth_date: Option<String>,
    pub created_at: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            national_id: patient.national_id,
            birth_date: patient.birth_date.map(iso),
            created_at: patient.created_at,
        }
    }
}

/// FFI-safe patient input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewPatient {
    pub name: String,
    pub national_id: Option<String>,
    pub birth_date: Option<String>,
}

impl TryFrom<FfiNewPatient> for NewPatient {
    type Error = ClinicError;

    fn try_from(data: FfiNewPatient) -> Result<Self, Self::Error> {
        Ok(NewPatient {
            name: data.name,
            national_id: data.national_id,
            birth_date: parse_optional_date(data.birth_date)?,
        })
    }
}

/// FFI-safe medicine.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicine {
    pub id: String,
    pub name: String,
    pub strength: String,
    /// Storage code, e.g. "tablet"
    pub form: String,
    pub form_label: String,
    pub description: String,
    pub created_at: String,
}

impl From<Medicine> for FfiMedicine {
    fn from(medicine: Medicine) -> Self {
        Self {
            description: medicine.description(),
            form: medicine.form.as_str().into(),
            form_label: medicine.form.label().into(),
            id: medicine.id,
            name: medicine.name,
            strength: medicine.strength,
            created_at: medicine.created_at,
        }
    }
}

/// FFI-safe medicine input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewMedicine {
    pub name: String,
    pub strength: String,
    /// Storage code or display label
    pub form: String,
}

impl TryFrom<FfiNewMedicine> for NewMedicine {
    type Error = ClinicError;

    fn try_from(data: FfiNewMedicine) -> Result<Self, Self::Error> {
        let form: DosageForm = data.form.parse().map_err(ClinicError::InvalidInput)?;
        Ok(NewMedicine::new(data.name, data.strength, form))
    }
}

/// FFI-safe dosage form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSeedReport {
    pub inserted: u32,
    pub skipped: u32,
}

impl From<SeedReport> for FfiSeedReport {
    fn from(report: SeedReport) -> Self {
        Self {
            inserted: report.inserted as u32,
            skipped: report.skipped as u32,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDosageForm {
    pub code: String,
    pub label: String,
}

/// FFI-safe line item.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLineItem {
    pub medicine_id: String,
    pub dosing: String,
}

impl From<LineItem> for FfiLineItem {
    fn from(item: LineItem) -> Self {
        Self {
            medicine_id: item.medicine_id,
            dosing: item.dosing,
        }
    }
}

impl From<FfiLineItem> for LineItem {
    fn from(item: FfiLineItem) -> Self {
        LineItem::new(item.medicine_id, item.dosing)
    }
}

/// FFI-safe prescription.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescription {
    pub id: String,
    pub patient_id: String,
    /// YYYY-MM-DD
    pub date: String,
    pub line_items: Vec<FfiLineItem>,
    pub observations: String,
    pub created_at: String,
}

impl From<Prescription> for FfiPrescription {
    fn from(prescription: Prescription) -> Self {
        Self {
            id: prescription.id,
            patient_id: prescription.patient_id,
            date: iso(prescription.date),
            line_items: prescription.line_items.into_iter().map(|i| i.into()).collect(),
            observations: prescription.observations,
            created_at: prescription.created_at,
        }
    }
}

/// FFI-safe date entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDateSelection {
    pub enabled: bool,
    /// YYYY-MM-DD
    pub date: String,
}

impl From<DateSelection> for FfiDateSelection {
    fn from(selection: DateSelection) -> Self {
        Self {
            enabled: selection.enabled,
            date: iso(selection.date),
        }
    }
}

impl TryFrom<FfiDateSelection> for DateSelection {
    type Error = ClinicError;

    fn try_from(selection: FfiDateSelection) -> Result<Self, Self::Error> {
        Ok(DateSelection {
            enabled: selection.enabled,
            date: parse_date(&selection.date)?,
        })
    }
}

/// FFI-safe prescription draft.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescriptionDraft {
    pub patient_id: String,
    pub line_items: Vec<FfiLineItem>,
    pub observations: String,
    pub dates: Vec<FfiDateSelection>,
}

impl TryFrom<FfiPrescriptionDraft> for PrescriptionDraft {
    type Error = ClinicError;

    fn try_from(draft: FfiPrescriptionDraft) -> Result<Self, Self::Error> {
        Ok(PrescriptionDraft {
            patient_id: draft.patient_id,
            line_items: draft.line_items.into_iter().map(|i| i.into()).collect(),
            observations: draft.observations,
            dates: draft
                .dates
                .into_iter()
                .map(DateSelection::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

//! Multi-date expansion against recording and failing stores.

use std::cell::RefCell;

use chrono::NaiveDate;
use proptest::prelude::*;

use clinic_rx_core::expansion::{expand_draft, ExpansionError};
use clinic_rx_core::models::{
    quick_select_dates, DateSelection, LineItem, NewPrescription, Prescription, PrescriptionDraft,
};
use clinic_rx_core::store::{PrescriptionStore, StoreError, StoreResult};
use clinic_rx_core::validation::ValidationError;
use clinic_rx_core::{Database, NewPatient, PatientStore, SqliteStore};

/// In-memory prescription store that records every create call and can be
/// told to fail on the n-th one.
#[derive(Default)]
struct RecordingStore {
    calls: RefCell<Vec<NaiveDate>>,
    saved: RefCell<Vec<Prescription>>,
    fail_on_call: Option<usize>,
}

impl RecordingStore {
    fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Default::default()
        }
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl PrescriptionStore for RecordingStore {
    async fn list_prescriptions(&self) -> StoreResult<Vec<Prescription>> {
        Ok(self.saved.borrow().clone())
    }

    async fn prescriptions_for_patient(&self, patient_id: &str) -> StoreResult<Vec<Prescription>> {
        Ok(self
            .saved
            .borrow()
            .iter()
            .filter(|p| p.patient_id == patient_id)
            .cloned()
            .collect())
    }

    async fn prescription_by_id(&self, id: &str) -> StoreResult<Option<Prescription>> {
        Ok(self.saved.borrow().iter().find(|p| p.id == id).cloned())
    }

    async fn create_prescription(&self, data: NewPrescription) -> StoreResult<Prescription> {
        self.calls.borrow_mut().push(data.date);
        if self.fail_on_call == Some(self.call_count()) {
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        let id = format!("rx-{}", self.saved.borrow().len() + 1);
        let prescription = Prescription::from_new(id, data);
        self.saved.borrow_mut().push(prescription.clone());
        Ok(prescription)
    }

    async fn delete_prescription(&self, id: &str) -> StoreResult<()> {
        let mut saved = self.saved.borrow_mut();
        let before = saved.len();
        saved.retain(|p| p.id != id);
        if saved.len() == before {
            return Err(StoreError::NotFound(id.into()));
        }
        Ok(())
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn make_draft(items: usize, dates: Vec<DateSelection>) -> PrescriptionDraft {
    let mut draft = PrescriptionDraft::new("p-1", date(2024, 1, 1));
    for i in 0..items {
        draft.add_line_item(LineItem::new(format!("m-{}", i), format!("{} gotas", i)));
    }
    draft.set_observations("Tomar após as refeições");
    draft.dates = dates;
    draft
}

#[tokio::test]
async fn test_one_record_per_enabled_date_in_order() {
    let store = RecordingStore::default();
    let dates = vec![
        DateSelection::enabled(date(2024, 3, 1)),
        DateSelection {
            enabled: false,
            date: date(2024, 4, 1),
        },
        DateSelection::enabled(date(2024, 1, 1)),
        DateSelection::enabled(date(2024, 2, 1)),
    ];
    let draft = make_draft(2, dates);

    let created = expand_draft(&store, &draft).await.unwrap();

    let created_dates: Vec<_> = created.iter().map(|p| p.date).collect();
    assert_eq!(
        created_dates,
        vec![date(2024, 3, 1), date(2024, 1, 1), date(2024, 2, 1)]
    );
    assert_eq!(*store.calls.borrow(), created_dates);
    for prescription in &created {
        assert_eq!(prescription.patient_id, "p-1");
        assert_eq!(prescription.line_items, draft.line_items);
        assert_eq!(prescription.observations, draft.observations);
    }
}

#[tokio::test]
async fn test_validation_failures_make_no_store_calls() {
    let store = RecordingStore::default();

    let mut no_patient = make_draft(1, vec![DateSelection::enabled(date(2024, 1, 1))]);
    no_patient.patient_id.clear();
    let no_items = make_draft(0, vec![DateSelection::enabled(date(2024, 1, 1))]);
    let no_dates = make_draft(
        1,
        vec![DateSelection {
            enabled: false,
            date: date(2024, 1, 1),
        }],
    );
    let empty_dates = make_draft(1, Vec::new());

    let cases = [
        (no_patient, ValidationError::NoPatient),
        (no_items, ValidationError::EmptyMedicineList),
        (no_dates, ValidationError::NoDateSelected),
        (empty_dates, ValidationError::NoDateSelected),
    ];

    for (draft, expected) in cases {
        match expand_draft(&store, &draft).await {
            Err(ExpansionError::Validation(error)) => assert_eq!(error, expected),
            other => panic!("expected {:?}, got {:?}", expected, other),
        }
    }
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_store_failure_stops_batch_without_rollback() {
    let store = RecordingStore::failing_on(3);
    let draft = make_draft(1, quick_select_dates(date(2024, 1, 15), 5));

    let err = expand_draft(&store, &draft).await.unwrap_err();

    match &err {
        ExpansionError::Store {
            date: failed_on,
            created,
            source,
        } => {
            assert_eq!(*failed_on, date(2024, 3, 15));
            assert_eq!(created.len(), 2);
            assert!(matches!(source, StoreError::Unavailable(_)));
        }
        other => panic!("expected store failure, got {:?}", other),
    }

    // Third call failed, fourth and fifth never issued.
    assert_eq!(store.call_count(), 3);
    // Records before the failure are still persisted.
    assert_eq!(store.list_prescriptions().await.unwrap().len(), 2);
    assert_eq!(err.created().len(), 2);
}

#[tokio::test]
async fn test_create_multiple_through_sqlite_store() {
    let store = SqliteStore::new(Database::open_in_memory().unwrap());
    let patient = store.create_patient(NewPatient::new("Maria")).await.unwrap();

    let mut draft = PrescriptionDraft::new(patient.id.clone(), date(2024, 1, 31));
    draft.add_line_item(LineItem::new("m-1", "  1 comprimido  "));
    draft.quick_select(date(2024, 1, 31), 3);

    let created = store.create_multiple(&draft).await.unwrap();
    assert_eq!(created.len(), 3);

    let stored = store.prescriptions_for_patient(&patient.id).await.unwrap();
    let dates: Vec<_> = stored.iter().map(|p| p.date).collect();
    assert_eq!(dates, vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31)]);
    // Dosing text is kept verbatim.
    assert!(stored.iter().all(|p| p.line_items[0].dosing == "  1 comprimido  "));

    draft.reset(date(2024, 1, 31));
    assert_eq!(draft.patient_id, patient.id);
    assert!(draft.line_items.is_empty());
    assert_eq!(draft.dates.len(), 1);
}

#[tokio::test]
async fn test_unknown_patient_stops_at_first_date() {
    let store = SqliteStore::new(Database::open_in_memory().unwrap());
    let mut draft = make_draft(1, quick_select_dates(date(2024, 1, 1), 2));
    draft.patient_id = "ghost".into();

    let err = store.create_multiple(&draft).await.unwrap_err();
    assert!(matches!(
        err,
        ExpansionError::Store {
            source: StoreError::NotFound(_),
            ..
        }
    ));
    assert!(err.created().is_empty());
}

proptest! {
    #[test]
    fn prop_expansion_count_and_content(
        items in 1usize..12,
        enabled in proptest::collection::vec(any::<bool>(), 1..10),
    ) {
        prop_assume!(enabled.iter().any(|e| *e));

        let dates: Vec<DateSelection> = enabled
            .iter()
            .enumerate()
            .map(|(i, on)| DateSelection {
                enabled: *on,
                date: date(2024, 1, 1) + chrono::Days::new(i as u64 * 7),
            })
            .collect();
        let draft = make_draft(items, dates);
        let expected = enabled.iter().filter(|e| **e).count();

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let store = RecordingStore::default();
        let created = runtime.block_on(expand_draft(&store, &draft)).unwrap();

        prop_assert_eq!(created.len(), expected);
        prop_assert_eq!(store.call_count(), expected);
        for prescription in &created {
            prop_assert_eq!(prescription.line_items.len(), items);
            prop_assert_eq!(&prescription.line_items, &draft.line_items);
            prop_assert_eq!(&prescription.observations, &draft.observations);
        }
    }
}

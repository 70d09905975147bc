//! End-to-end use of the FFI facade.

use chrono::NaiveDate;

use clinic_rx_core::{
    open_clinic, open_clinic_in_memory, open_clinic_with_config, ClinicError, ExpansionError,
    FfiDateSelection, FfiLineItem, FfiNewMedicine, FfiNewPatient, FfiPrescriptionDraft,
    LineItem, NewPrescription, Prescription, StoreError,
};

fn new_patient(name: &str) -> FfiNewPatient {
    FfiNewPatient {
        name: name.into(),
        national_id: Some("12345678901".into()),
        birth_date: Some("1990-02-28".into()),
    }
}

#[test]
fn test_patient_and_medicine_crud() {
    let clinic = open_clinic_in_memory().unwrap();

    let patient = clinic.create_patient(new_patient("ana lima")).unwrap();
    assert_eq!(patient.name, "ANA LIMA");
    assert_eq!(patient.national_id.as_deref(), Some("123.456.789-01"));
    assert_eq!(patient.birth_date.as_deref(), Some("1990-02-28"));

    let updated = clinic
        .update_patient(patient.id.clone(), new_patient("Ana Lima Souza"))
        .unwrap();
    assert_eq!(updated.id, patient.id);
    let fetched = clinic.get_patient(patient.id.clone()).unwrap().unwrap();
    assert_eq!(fetched.name, "ANA LIMA SOUZA");
    assert_eq!(clinic.search_patients("souza".into()).unwrap().len(), 1);

    let medicine = clinic
        .create_medicine(FfiNewMedicine {
            name: "Amoxicilina".into(),
            strength: "500mg".into(),
            form: "Cápsula".into(),
        })
        .unwrap();
    assert_eq!(medicine.form, "capsule");
    assert_eq!(medicine.description, "AMOXICILINA 500MG - Cápsula");

    let duplicate = clinic.create_medicine(FfiNewMedicine {
        name: "amoxicilina".into(),
        strength: "500MG".into(),
        form: "capsule".into(),
    });
    assert!(matches!(duplicate, Err(ClinicError::InvalidInput(_))));

    let bad_form = clinic.create_medicine(FfiNewMedicine {
        name: "X".into(),
        strength: "1mg".into(),
        form: "patch".into(),
    });
    assert!(matches!(bad_form, Err(ClinicError::InvalidInput(_))));

    clinic.delete_medicine(medicine.id.clone()).unwrap();
    assert!(clinic.get_medicine(medicine.id).unwrap().is_none());

    clinic.delete_patient(patient.id.clone()).unwrap();
    assert!(matches!(
        clinic.delete_patient(patient.id),
        Err(ClinicError::NotFound(_))
    ));
}

#[test]
fn test_create_and_render_prescriptions() {
    let clinic = open_clinic_in_memory().unwrap();
    let patient = clinic.create_patient(new_patient("Carlos")).unwrap();
    let medicine = clinic
        .create_medicine(FfiNewMedicine {
            name: "Losartana".into(),
            strength: "50mg".into(),
            form: "tablet".into(),
        })
        .unwrap();

    let dates = clinic.quick_select_dates("2024-01-31".into(), 3).unwrap();
    let date_strings: Vec<_> = dates.iter().map(|d| d.date.as_str()).collect();
    assert_eq!(date_strings, vec!["2024-01-31", "2024-02-29", "2024-03-31"]);

    let created = clinic
        .create_prescriptions(FfiPrescriptionDraft {
            patient_id: patient.id.clone(),
            line_items: vec![FfiLineItem {
                medicine_id: medicine.id.clone(),
                dosing: "1 comprimido pela manhã".into(),
            }],
            observations: "Uso contínuo".into(),
            dates,
        })
        .unwrap();
    assert_eq!(created.len(), 3);

    let filename = clinic.pdf_filename(created[1].id.clone()).unwrap();
    assert_eq!(filename, format!("receita_{}_2024-02-29.pdf", created[1].id));

    let all = clinic.render_patient_pdf(patient.id.clone(), Vec::new()).unwrap();
    assert!(all.starts_with(b"%PDF"));

    let one = clinic
        .render_patient_pdf(patient.id.clone(), vec![created[0].id.clone()])
        .unwrap();
    assert!(one.starts_with(b"%PDF"));

    assert_eq!(clinic.purge_prescriptions().unwrap(), 3);
    assert!(clinic.list_prescriptions().unwrap().is_empty());
    assert_eq!(clinic.list_patients().unwrap().len(), 1);

    let nothing = clinic.render_patient_pdf(patient.id, Vec::new());
    assert!(matches!(nothing, Err(ClinicError::ValidationError(_))));
}

#[test]
fn test_invalid_drafts_are_validation_errors() {
    let clinic = open_clinic_in_memory().unwrap();

    let result = clinic.create_prescriptions(FfiPrescriptionDraft {
        patient_id: String::new(),
        line_items: Vec::new(),
        observations: String::new(),
        dates: vec![FfiDateSelection {
            enabled: true,
            date: "2024-05-01".into(),
        }],
    });
    match result {
        Err(ClinicError::ValidationError(message)) => assert_eq!(message, "no patient selected"),
        other => panic!("unexpected {:?}", other),
    }

    let bad_date = clinic.create_prescriptions(FfiPrescriptionDraft {
        patient_id: "p-1".into(),
        line_items: Vec::new(),
        observations: String::new(),
        dates: vec![FfiDateSelection {
            enabled: true,
            date: "05/01/2024".into(),
        }],
    });
    assert!(matches!(bad_date, Err(ClinicError::InvalidInput(_))));
}

#[test]
fn test_batch_failure_reports_created_ids() {
    let clinic = open_clinic_in_memory().unwrap();

    let result = clinic.create_prescriptions(FfiPrescriptionDraft {
        patient_id: "ghost".into(),
        line_items: vec![FfiLineItem {
            medicine_id: "m-1".into(),
            dosing: String::new(),
        }],
        observations: String::new(),
        dates: clinic.quick_select_dates("2024-01-10".into(), 2).unwrap(),
    });
    match result {
        Err(ClinicError::PartialBatch {
            failed_date,
            created_ids,
            ..
        }) => {
            assert_eq!(failed_date, "2024-01-10");
            assert!(created_ids.is_empty());
        }
        other => panic!("unexpected {:?}", other),
    }

    let first = Prescription::from_new(
        "rx-1".into(),
        NewPrescription {
            patient_id: "p-1".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            line_items: vec![LineItem::new("m-1", "")],
            observations: String::new(),
        },
    );
    let err = ClinicError::from(ExpansionError::Store {
        date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
        created: vec![first],
        source: StoreError::Unavailable("disk full".into()),
    });
    match err {
        ClinicError::PartialBatch {
            failed_date,
            created_ids,
            reason,
        } => {
            assert_eq!(failed_date, "2024-02-10");
            assert_eq!(created_ids, vec!["rx-1".to_string()]);
            assert!(reason.contains("disk full"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_seed_official_catalog_is_idempotent() {
    let clinic = open_clinic_in_memory().unwrap();

    let first = clinic.seed_official_catalog().unwrap();
    assert_eq!((first.inserted, first.skipped), (36, 0));
    let second = clinic.seed_official_catalog().unwrap();
    assert_eq!((second.inserted, second.skipped), (0, 36));

    assert_eq!(clinic.list_medicines().unwrap().len(), 36);
    let found = clinic.search_medicines("haloperidol".into()).unwrap();
    assert_eq!(found.len(), 4);
}

#[test]
fn test_draft_helpers() {
    let clinic = open_clinic_in_memory().unwrap();

    assert_eq!(clinic.format_national_id("1234567".into()), "123.456.7");
    assert_eq!(clinic.format_national_id("123456789012345".into()), "123.456.789-01");

    let next = clinic
        .next_date(
            vec![
                FfiDateSelection {
                    enabled: true,
                    date: "2024-03-10".into(),
                },
                FfiDateSelection {
                    enabled: false,
                    date: "2024-01-10".into(),
                },
            ],
            "2024-01-10".into(),
        )
        .unwrap();
    assert_eq!(next, "2024-02-10");

    let forms = clinic.dosage_forms();
    assert_eq!(forms.len(), 10);
    assert_eq!(forms[7].label, "Injeção");
}

#[test]
fn test_on_disk_clinic_with_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clinic.db").to_string_lossy().into_owned();

    {
        let clinic = open_clinic(path.clone()).unwrap();
        clinic.create_patient(new_patient("Persistida")).unwrap();
    }

    let clinic = open_clinic_with_config(
        path.clone(),
        Some(r#"{"city": "Umuarama"}"#.into()),
        Some("rx".into()),
    )
    .unwrap();
    assert_eq!(clinic.list_patients().unwrap().len(), 1);

    let bad = open_clinic_with_config(path, None, Some("  ".into()));
    assert!(matches!(bad, Err(ClinicError::ConfigError(_))));
}

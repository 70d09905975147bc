//! Official municipal medicine list.
//!
//! Presentations are kept as printed on the municipal list and mapped onto
//! [`DosageForm`] when seeding.

use crate::models::{DosageForm, NewMedicine};

use super::{MedicineStore, StoreError, StoreResult};

/// (generic name, strength, presentation) for every medicine on the official
/// list of the Perobal municipal health department.
pub const OFFICIAL_CATALOG: &[(&str, &str, &str)] = &[
    ("AMITRIPTILINA", "25MG", "COMPRIMIDO"),
    ("ÁCIDO VALPROICO", "250MG", "COMPRIMIDO"),
    ("ÁCIDO VALPROICO", "500MG", "COMPRIMIDO"),
    ("ÁCIDO VALPROICO", "50MG/ML", "SUSPENSÃO ORAL"),
    ("BIPERIDENO CLORIDRATO", "2MG", "COMPRIMIDO"),
    ("CARBAMAZEPINA", "200MG", "COMPRIMIDO"),
    ("CARBAMAZEPINA", "20MG/ML", "SUSPENSÃO"),
    ("CARBONATO DE LÍTIO", "300MG", "COMPRIMIDO"),
    ("CLOMIPRAMINA CLORIDRATO", "25MG", "COMPRIMIDO"),
    ("CLONAZEPAM", "2MG", "COMPRIMIDO"),
    ("CLONAZEPAM", "2.5MG/ML", "SOLUÇÃO ORAL"),
    ("CLORPROMAZINA CLORIDRATO", "25MG", "COMPRIMIDO"),
    ("CLORPROMAZINA CLORIDRATO", "100MG", "COMPRIMIDO"),
    ("DESVENLAFAXINA SUCCINATO", "50MG", "COMPRIMIDO"),
    ("DIAZEPAM", "5MG", "COMPRIMIDO"),
    ("DIAZEPAM", "10MG", "COMPRIMIDO"),
    ("ESCITALOPRAM", "10MG", "COMPRIMIDO"),
    ("FENITOÍNA SÓDICA", "100MG", "COMPRIMIDO"),
    ("FENOBARBITAL", "100MG", "COMPRIMIDO"),
    ("FENOBARBITAL", "40MG/ML", "SOLUÇÃO ORAL"),
    ("FLUOXETINA", "20MG", "CÁPSULA/COMPRIMIDO"),
    ("HALOPERIDOL", "1MG", "COMPRIMIDO"),
    ("HALOPERIDOL", "5MG", "COMPRIMIDO"),
    ("HALOPERIDOL", "2MG/ML", "SOLUÇÃO ORAL"),
    ("HALOPERIDOL DECANOATO", "50MG/ML", "SOLUÇÃO INJETÁVEL"),
    ("IMIPRAMINA CLORIDRATO", "25MG", "COMPRIMIDO"),
    ("LEVOMEPROMAZINA", "25MG", "COMPRIMIDO"),
    ("LEVOMEPROMAZINA", "100MG", "COMPRIMIDO"),
    ("MIRTAZAPINA", "30MG", "COMPRIMIDO"),
    ("NORTRIPTILINA CLORIDRATO", "25MG", "COMPRIMIDO"),
    ("OXCARBAZEPINA", "600MG", "COMPRIMIDO"),
    ("OXCARBAZEPINA", "60MG/ML", "SOLUÇÃO ORAL"),
    ("PAROXETINA CLORIDRATO", "20MG", "COMPRIMIDO"),
    ("PREGABALINA", "75MG", "COMPRIMIDO"),
    ("SERTRALINA CLORIDRATO", "50MG", "COMPRIMIDO"),
    ("VENLAFAXINA CLORIDRATO", "75MG", "COMPRIMIDO"),
];

/// Map a free-text presentation onto a dosage form.
///
/// Mixed presentations ("CÁPSULA/COMPRIMIDO") resolve to the first form named.
pub fn form_for_presentation(presentation: &str) -> Option<DosageForm> {
    let text = presentation.trim().to_uppercase();
    let form = if text.starts_with("CÁPSULA") {
        DosageForm::Capsule
    } else if text.starts_with("COMPRIMIDO") {
        DosageForm::Tablet
    } else if text.starts_with("SUSPENSÃO") {
        DosageForm::Suspension
    } else if text == "SOLUÇÃO INJETÁVEL" {
        DosageForm::Injection
    } else if text.starts_with("SOLUÇÃO") {
        DosageForm::Solution
    } else {
        return text.parse().ok();
    };
    Some(form)
}

/// Outcome of a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Insert every medicine of [`OFFICIAL_CATALOG`] that is not already present.
///
/// Entries rejected by the store (already in the catalog under the same
/// name, strength and form) are counted as skipped, so the seed can be
/// re-run safely.
pub async fn seed_official_catalog<S: MedicineStore>(store: &S) -> StoreResult<SeedReport> {
    let mut report = SeedReport::default();

    for (name, strength, presentation) in OFFICIAL_CATALOG {
        let form = form_for_presentation(presentation).ok_or_else(|| {
            StoreError::Rejected(format!("unknown presentation: {}", presentation))
        })?;

        match store
            .create_medicine(NewMedicine::new(*name, *strength, form))
            .await
        {
            Ok(_) => report.inserted += 1,
            Err(StoreError::Rejected(reason)) => {
                tracing::debug!(name, strength, %reason, "Skipping catalog entry");
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        inserted = report.inserted,
        skipped = report.skipped,
        "Seeded official medicine catalog"
    );
    Ok(report)
}

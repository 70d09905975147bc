//! Prescription models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A medicine entry within a prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItem {
    /// Medicine identifier (weak reference; the medicine may be deleted later)
    pub medicine_id: String,
    /// Dosing instructions, may be empty
    #[serde(default)]
    pub dosing: String,
}

impl LineItem {
    pub fn new(medicine_id: impl Into<String>, dosing: impl Into<String>) -> Self {
        Self {
            medicine_id: medicine_id.into(),
            dosing: dosing.into(),
        }
    }

    /// Whether there is dosing text worth printing.
    pub fn has_dosing(&self) -> bool {
        !self.dosing.trim().is_empty()
    }
}

/// Input data for one persisted prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPrescription {
    pub patient_id: String,
    pub date: NaiveDate,
    pub line_items: Vec<LineItem>,
    pub observations: String,
}

/// A persisted prescription. Never updated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    /// Store-assigned identifier
    pub id: String,
    /// Patient identifier
    pub patient_id: String,
    /// Prescription date
    pub date: NaiveDate,
    /// Line items in print order
    pub line_items: Vec<LineItem>,
    /// Free-text observations
    pub observations: String,
    /// Creation timestamp
    pub created_at: String,
}

impl Prescription {
    /// Build a record from input data.
    pub fn from_new(id: String, data: NewPrescription) -> Self {
        Self {
            id,
            patient_id: data.patient_id,
            date: data.date,
            line_items: data.line_items,
            observations: data.observations,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Whether observations should be printed at all.
    pub fn has_observations(&self) -> bool {
        !self.observations.trim().is_empty()
    }

    /// Download filename: `<prefix>_<id>_<YYYY-MM-DD>.pdf`.
    pub fn pdf_filename(&self, prefix: &str) -> String {
        format!("{}_{}_{}.pdf", prefix, self.id, self.date.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_prescription(observations: &str) -> Prescription {
        Prescription::from_new(
            "rx-42".into(),
            NewPrescription {
                patient_id: "p-1".into(),
                date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                line_items: vec![LineItem::new("m-1", "1 comprimido 8/8h")],
                observations: observations.into(),
            },
        )
    }

    #[test]
    fn test_pdf_filename() {
        let rx = make_prescription("");
        assert_eq!(rx.pdf_filename("receita"), "receita_rx-42_2024-03-05.pdf");
    }

    #[test]
    fn test_has_observations() {
        assert!(!make_prescription("").has_observations());
        assert!(!make_prescription(" \n\t ").has_observations());
        assert!(make_prescription("Retornar em 30 dias").has_observations());
    }

    #[test]
    fn test_line_item_dosing() {
        assert!(LineItem::new("m-1", "2x ao dia").has_dosing());
        assert!(!LineItem::new("m-1", "   ").has_dosing());
    }

    #[test]
    fn test_line_item_dosing_defaults_when_missing() {
        let item: LineItem = serde_json::from_str(r#"{"medicine_id":"m-9"}"#).unwrap();
        assert_eq!(item.medicine_id, "m-9");
        assert_eq!(item.dosing, "");
    }
}

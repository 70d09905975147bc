//! Medicine catalog models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Dosage form. Closed set; every medicine carries one of these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DosageForm {
    Tablet,
    Capsule,
    Syrup,
    Suspension,
    Ointment,
    Cream,
    Solution,
    Injection,
    Drops,
    Spray,
}

impl DosageForm {
    pub const ALL: [DosageForm; 10] = [
        DosageForm::Tablet,
        DosageForm::Capsule,
        DosageForm::Syrup,
        DosageForm::Suspension,
        DosageForm::Ointment,
        DosageForm::Cream,
        DosageForm::Solution,
        DosageForm::Injection,
        DosageForm::Drops,
        DosageForm::Spray,
    ];

    /// Stable storage code.
    pub fn as_str(&self) -> &'static str {
        match self {
            DosageForm::Tablet => "tablet",
            DosageForm::Capsule => "capsule",
            DosageForm::Syrup => "syrup",
            DosageForm::Suspension => "suspension",
            DosageForm::Ointment => "ointment",
            DosageForm::Cream => "cream",
            DosageForm::Solution => "solution",
            DosageForm::Injection => "injection",
            DosageForm::Drops => "drops",
            DosageForm::Spray => "spray",
        }
    }

    /// Label printed on prescriptions.
    pub fn label(&self) -> &'static str {
        match self {
            DosageForm::Tablet => "Comprimido",
            DosageForm::Capsule => "Cápsula",
            DosageForm::Syrup => "Xarope",
            DosageForm::Suspension => "Suspensão",
            DosageForm::Ointment => "Pomada",
            DosageForm::Cream => "Creme",
            DosageForm::Solution => "Solução",
            DosageForm::Injection => "Injeção",
            DosageForm::Drops => "Gotas",
            DosageForm::Spray => "Spray",
        }
    }
}

impl fmt::Display for DosageForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DosageForm {
    type Err = String;

    /// Accepts the storage code or the printed label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        DosageForm::ALL
            .iter()
            .copied()
            .find(|form| form.as_str() == wanted || form.label().to_lowercase() == wanted)
            .ok_or_else(|| format!("Unknown dosage form: {}", s))
    }
}

/// A medicine in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medicine {
    /// Store-assigned identifier
    pub id: String,
    /// Generic name
    pub name: String,
    /// Strength/concentration (e.g., "500MG")
    pub strength: String,
    /// Dosage form
    pub form: DosageForm,
    /// Creation timestamp
    pub created_at: String,
}

/// Input data for creating or updating a medicine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMedicine {
    pub name: String,
    pub strength: String,
    pub form: DosageForm,
}

impl NewMedicine {
    pub fn new(name: impl Into<String>, strength: impl Into<String>, form: DosageForm) -> Self {
        Self {
            name: name.into(),
            strength: strength.into(),
            form,
        }
    }

    /// Name and strength are both required.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("medicine name is required".into());
        }
        if self.strength.trim().is_empty() {
            return Err("medicine strength is required".into());
        }
        Ok(())
    }
}

impl Medicine {
    /// Build a catalog record from validated input.
    pub fn from_new(id: String, data: &NewMedicine) -> Self {
        Self {
            id,
            name: super::normalize_text(&data.name),
            strength: super::normalize_text(&data.strength),
            form: data.form,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// One-line description, e.g. `DIPIRONA 500MG - Comprimido`.
    pub fn description(&self) -> String {
        format!("{} {} - {}", self.name, self.strength, self.form.label())
    }
}

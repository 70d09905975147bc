//! Patient models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of digits in a national ID (CPF).
pub const NATIONAL_ID_DIGITS: usize = 11;

/// A patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Store-assigned identifier
    pub id: String,
    /// Full name (stored upper-cased)
    pub name: String,
    /// National ID in `XXX.XXX.XXX-XX` form
    pub national_id: Option<String>,
    /// Date of birth
    pub birth_date: Option<NaiveDate>,
    /// Creation timestamp
    pub created_at: String,
}

/// Input data for creating or updating a patient.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewPatient {
    pub name: String,
    pub national_id: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl NewPatient {
    /// Create input with only the required name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            national_id: None,
            birth_date: None,
        }
    }

    /// Check required fields and the national ID shape.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("patient name is required".into());
        }
        if let Some(national_id) = self.national_id.as_deref() {
            if !national_id.trim().is_empty() && !is_valid_national_id(national_id) {
                return Err(format!(
                    "national ID must have {} digits: {}",
                    NATIONAL_ID_DIGITS, national_id
                ));
            }
        }
        Ok(())
    }
}

impl Patient {
    /// Build a patient record from validated input.
    pub fn from_new(id: String, data: &NewPatient) -> Self {
        Self {
            id,
            name: super::normalize_text(&data.name),
            national_id: data
                .national_id
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(format_national_id),
            birth_date: data.birth_date,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// National ID as it should be displayed, if present.
    pub fn display_national_id(&self) -> Option<String> {
        self.national_id.as_deref().map(format_national_id)
    }
}

/// Format a national ID as `XXX.XXX.XXX-XX`.
///
/// Non-digits are dropped and input is truncated at 11 digits. Partial input
/// gets the separators that apply to the digits typed so far, so this is
/// suitable for live reformatting of a text field.
pub fn format_national_id(input: &str) -> String {
    let digits: Vec<char> = input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(NATIONAL_ID_DIGITS)
        .collect();

    let mut formatted = String::with_capacity(NATIONAL_ID_DIGITS + 3);
    for (i, digit) in digits.iter().enumerate() {
        match i {
            3 | 6 => formatted.push('.'),
            9 => formatted.push('-'),
            _ => {}
        }
        formatted.push(*digit);
    }
    formatted
}

/// A national ID is valid when it carries exactly 11 digits.
pub fn is_valid_national_id(input: &str) -> bool {
    input.chars().filter(|c| c.is_ascii_digit()).count() == NATIONAL_ID_DIGITS
        && input
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | ' '))
}

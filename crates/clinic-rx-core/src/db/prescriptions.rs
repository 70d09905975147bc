//! Prescription database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{date_from_sql, date_to_sql, Database, DbError, DbResult};
use crate::models::{LineItem, Prescription};

const PRESCRIPTION_COLUMNS: &str = "id, patient_id, date, line_items, observations, created_at";

impl Database {
    /// Insert a new prescription.
    pub fn insert_prescription(&self, prescription: &Prescription) -> DbResult<()> {
        let line_items_json = serde_json::to_string(&prescription.line_items)?;

        self.conn.execute(
            r#"
            INSERT INTO prescriptions (
                id, patient_id, date, line_items, observations, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                prescription.id,
                prescription.patient_id,
                date_to_sql(&prescription.date),
                line_items_json,
                prescription.observations,
                prescription.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a prescription by ID.
    pub fn get_prescription(&self, id: &str) -> DbResult<Option<Prescription>> {
        let sql = format!(
            "SELECT {} FROM prescriptions WHERE id = ?",
            PRESCRIPTION_COLUMNS
        );
        self.conn
            .query_row(&sql, [id], PrescriptionRow::from_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all prescriptions, newest first.
    pub fn list_prescriptions(&self) -> DbResult<Vec<Prescription>> {
        let sql = format!(
            "SELECT {} FROM prescriptions ORDER BY created_at DESC, date DESC",
            PRESCRIPTION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], PrescriptionRow::from_row)?;

        let mut prescriptions = Vec::new();
        for row in rows {
            prescriptions.push(row?.try_into()?);
        }
        Ok(prescriptions)
    }

    /// List a patient's prescriptions in date order.
    pub fn list_prescriptions_for_patient(&self, patient_id: &str) -> DbResult<Vec<Prescription>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM prescriptions
            WHERE patient_id = ?
            ORDER BY date, created_at
            "#,
            PRESCRIPTION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([patient_id], PrescriptionRow::from_row)?;

        let mut prescriptions = Vec::new();
        for row in rows {
            prescriptions.push(row?.try_into()?);
        }
        Ok(prescriptions)
    }

    /// Delete a prescription.
    pub fn delete_prescription(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM prescriptions WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Remove every prescription, keeping patients and medicines.
    /// Returns the number of records removed.
    pub fn purge_prescriptions(&self) -> DbResult<usize> {
        Ok(self.conn.execute("DELETE FROM prescriptions", [])?)
    }
}

/// Intermediate row struct for database mapping.
struct PrescriptionRow {
    id: String,
    patient_id: String,
    date: String,
    line_items: String,
    observations: String,
    created_at: String,
}

impl PrescriptionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            date: row.get(2)?,
            line_items: row.get(3)?,
            observations: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl TryFrom<PrescriptionRow> for Prescription {
    type Error = DbError;

    fn try_from(row: PrescriptionRow) -> Result<Self, Self::Error> {
        let line_items: Vec<LineItem> = serde_json::from_str(&row.line_items)?;

        Ok(Prescription {
            id: row.id,
            patient_id: row.patient_id,
            date: date_from_sql(&row.date)?,
            line_items,
            observations: row.observations,
            created_at: row.created_at,
        })
    }
}

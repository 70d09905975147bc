//! Medicine catalog database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{constraint_or, Database, DbError, DbResult};
use crate::models::{DosageForm, Medicine};

impl Database {
    /// Insert a new medicine. (name, strength, form) must be unique.
    pub fn insert_medicine(&self, medicine: &Medicine) -> DbResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO medicines (id, name, strength, form, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    medicine.id,
                    medicine.name,
                    medicine.strength,
                    medicine.form.as_str(),
                    medicine.created_at,
                ],
            )
            .map_err(|e| constraint_or(e, || duplicate_message(medicine)))?;
        Ok(())
    }

    /// Update an existing medicine.
    pub fn update_medicine(&self, medicine: &Medicine) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute(
                r#"
                UPDATE medicines SET
                    name = ?2,
                    strength = ?3,
                    form = ?4
                WHERE id = ?1
                "#,
                params![
                    medicine.id,
                    medicine.name,
                    medicine.strength,
                    medicine.form.as_str(),
                ],
            )
            .map_err(|e| constraint_or(e, || duplicate_message(medicine)))?;
        Ok(rows_affected > 0)
    }

    /// Get a medicine by ID.
    pub fn get_medicine(&self, id: &str) -> DbResult<Option<Medicine>> {
        self.conn
            .query_row(
                "SELECT id, name, strength, form, created_at FROM medicines WHERE id = ?",
                [id],
                MedicineRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Search medicines by name using FTS5 prefix matching.
    pub fn search_medicines(&self, query: &str, limit: usize) -> DbResult<Vec<Medicine>> {
        let escaped_query = escape_fts_query(query);
        if escaped_query.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(
            r#"
            SELECT m.id, m.name, m.strength, m.form, m.created_at
            FROM medicines m
            JOIN medicines_fts fts ON m.rowid = fts.rowid
            WHERE medicines_fts MATCH ?
            ORDER BY m.name, m.strength
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(params![escaped_query, limit as i64], MedicineRow::from_row)?;

        let mut medicines = Vec::new();
        for row in rows {
            medicines.push(row?.try_into()?);
        }
        Ok(medicines)
    }

    /// List the whole catalog ordered by name.
    pub fn list_medicines(&self) -> DbResult<Vec<Medicine>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, strength, form, created_at
            FROM medicines
            ORDER BY name, strength
            "#,
        )?;
        let rows = stmt.query_map([], MedicineRow::from_row)?;

        let mut medicines = Vec::new();
        for row in rows {
            medicines.push(row?.try_into()?);
        }
        Ok(medicines)
    }

    /// Delete a medicine. Prescriptions that reference it are kept.
    pub fn delete_medicine(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM medicines WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn duplicate_message(medicine: &Medicine) -> String {
    format!(
        "Medicine already registered: {} {} ({})",
        medicine.name,
        medicine.strength,
        medicine.form.as_str()
    )
}

/// Intermediate row struct for database mapping.
struct MedicineRow {
    id: String,
    name: String,
    strength: String,
    form: String,
    created_at: String,
}

impl MedicineRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            strength: row.get(2)?,
            form: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl TryFrom<MedicineRow> for Medicine {
    type Error = DbError;

    fn try_from(row: MedicineRow) -> Result<Self, Self::Error> {
        let form: DosageForm = row.form.parse().map_err(DbError::Constraint)?;
        Ok(Medicine {
            id: row.id,
            name: row.name,
            strength: row.strength,
            form,
            created_at: row.created_at,
        })
    }
}

/// Escape special FTS5 characters and prepare query for prefix matching.
fn escape_fts_query(query: &str) -> String {
    // Remove special FTS5 operators and add wildcard for prefix matching
    let cleaned: String = query
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    cleaned
        .split_whitespace()
        .map(|word| format!("{}*", word))
        .collect::<Vec<_>>()
        .join(" ")
}

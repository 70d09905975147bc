//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{date_from_sql, date_to_sql, Database, DbError, DbResult};
use crate::models::Patient;

const PATIENT_COLUMNS: &str = "id, name, national_id, birth_date, created_at";

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patients (id, name, national_id, birth_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                patient.id,
                patient.name,
                patient.national_id,
                patient.birth_date.as_ref().map(date_to_sql),
                patient.created_at,
            ],
        )?;
        Ok(())
    }

    /// Update the display fields of an existing patient.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                name = ?2,
                national_id = ?3,
                birth_date = ?4
            WHERE id = ?1
            "#,
            params![
                patient.id,
                patient.name,
                patient.national_id,
                patient.birth_date.as_ref().map(date_to_sql),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        let sql = format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS);
        self.conn
            .query_row(&sql, [id], PatientRow::from_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Search patients by name substring or national ID substring.
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let name_pattern = format!("%{}%", escape_like(&query.to_uppercase()));
        let id_pattern = format!("%{}%", escape_like(query));
        let sql = format!(
            r#"
            SELECT {}
            FROM patients
            WHERE name LIKE ?1 ESCAPE '\' OR national_id LIKE ?2 ESCAPE '\'
            ORDER BY name
            LIMIT ?3
            "#,
            PATIENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![name_pattern, id_pattern, limit as i64],
            PatientRow::from_row,
        )?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// List all patients.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let sql = format!("SELECT {} FROM patients ORDER BY name", PATIENT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], PatientRow::from_row)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// Delete a patient. Their prescriptions go with them.
    pub fn delete_patient(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct PatientRow {
    id: String,
    name: String,
    national_id: Option<String>,
    birth_date: Option<String>,
    created_at: String,
}

impl PatientRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            national_id: row.get(2)?,
            birth_date: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl TryFrom<PatientRow> for Patient {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        Ok(Patient {
            id: row.id,
            name: row.name,
            national_id: row.national_id,
            birth_date: row.birth_date.as_deref().map(date_from_sql).transpose()?,
            created_at: row.created_at,
        })
    }
}

/// Make `%`, `_` and the escape character itself match literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPatient;
    use chrono::NaiveDate;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn make_patient(id: &str, name: &str, national_id: Option<&str>) -> Patient {
        let mut data = NewPatient::new(name);
        data.national_id = national_id.map(Into::into);
        Patient::from_new(id.into(), &data)
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let mut patient = make_patient("p-1", "Maria Souza", Some("12345678901"));
        patient.birth_date = NaiveDate::from_ymd_opt(1980, 7, 4);
        db.insert_patient(&patient).unwrap();

        let retrieved = db.get_patient("p-1").unwrap().unwrap();
        assert_eq!(retrieved.name, "MARIA SOUZA");
        assert_eq!(retrieved.national_id.as_deref(), Some("123.456.789-01"));
        assert_eq!(retrieved.birth_date, NaiveDate::from_ymd_opt(1980, 7, 4));
    }

    #[test]
    fn test_get_missing() {
        let db = setup_db();
        assert!(db.get_patient("nope").unwrap().is_none());
    }

    #[test]
    fn test_update_patient() {
        let db = setup_db();

        let mut patient = make_patient("p-1", "Maria", None);
        db.insert_patient(&patient).unwrap();

        patient.name = "MARIA APARECIDA".into();
        assert!(db.update_patient(&patient).unwrap());

        let retrieved = db.get_patient("p-1").unwrap().unwrap();
        assert_eq!(retrieved.name, "MARIA APARECIDA");

        let ghost = make_patient("ghost", "Nobody", None);
        assert!(!db.update_patient(&ghost).unwrap());
    }

    #[test]
    fn test_search_by_name_and_national_id() {
        let db = setup_db();

        db.insert_patient(&make_patient("p-1", "Maria Souza", Some("12345678901")))
            .unwrap();
        db.insert_patient(&make_patient("p-2", "Ana Maria Lima", None))
            .unwrap();
        db.insert_patient(&make_patient("p-3", "João Pereira", Some("98765432100")))
            .unwrap();

        let results = db.search_patients("maria", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "ANA MARIA LIMA");

        let results = db.search_patients("987.654", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "p-3");

        assert!(db.search_patients("  ", 10).unwrap().is_empty());
    }

    #[test]
    fn test_search_wildcards_match_literally() {
        let db = setup_db();

        db.insert_patient(&make_patient("p-1", "Maria Souza", None))
            .unwrap();
        db.insert_patient(&make_patient("p-2", "Ana_Lima 100%", None))
            .unwrap();

        let results = db.search_patients("%", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "p-2");
        assert_eq!(db.search_patients("_", 10).unwrap().len(), 1);
        assert_eq!(db.search_patients("a_l", 10).unwrap()[0].id, "p-2");
        assert!(db.search_patients("m_ria", 10).unwrap().is_empty());
    }

    #[test]
    fn test_list_and_delete() {
        let db = setup_db();

        db.insert_patient(&make_patient("p-1", "Zilda", None)).unwrap();
        db.insert_patient(&make_patient("p-2", "Ana", None)).unwrap();

        let names: Vec<_> = db
            .list_patients()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["ANA", "ZILDA"]);

        assert!(db.delete_patient("p-1").unwrap());
        assert!(!db.delete_patient("p-1").unwrap());
        assert_eq!(db.list_patients().unwrap().len(), 1);
    }
}

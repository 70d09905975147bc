//! SQLite schema definition.

/// Complete database schema for the prescription desk.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    national_id TEXT,                            -- XXX.XXX.XXX-XX, optional
    birth_date TEXT,                             -- YYYY-MM-DD, optional
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);
CREATE INDEX IF NOT EXISTS idx_patients_national_id ON patients(national_id);

-- ============================================================================
-- Medicine Catalog
-- ============================================================================

CREATE TABLE IF NOT EXISTS medicines (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    strength TEXT NOT NULL,
    form TEXT NOT NULL CHECK (form IN (
        'tablet', 'capsule', 'syrup', 'suspension', 'ointment',
        'cream', 'solution', 'injection', 'drops', 'spray'
    )),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (name, strength, form)
);

-- FTS5 virtual table for name search
CREATE VIRTUAL TABLE IF NOT EXISTS medicines_fts USING fts5(
    name,
    content='medicines',
    content_rowid='rowid'
);

-- Triggers to keep FTS5 in sync with main table
CREATE TRIGGER IF NOT EXISTS medicines_ai AFTER INSERT ON medicines BEGIN
    INSERT INTO medicines_fts(rowid, name) VALUES (new.rowid, new.name);
END;

CREATE TRIGGER IF NOT EXISTS medicines_ad AFTER DELETE ON medicines BEGIN
    INSERT INTO medicines_fts(medicines_fts, rowid, name)
    VALUES ('delete', old.rowid, old.name);
END;

CREATE TRIGGER IF NOT EXISTS medicines_au AFTER UPDATE ON medicines BEGIN
    INSERT INTO medicines_fts(medicines_fts, rowid, name)
    VALUES ('delete', old.rowid, old.name);
    INSERT INTO medicines_fts(rowid, name) VALUES (new.rowid, new.name);
END;

-- ============================================================================
-- Prescriptions (never updated after creation)
-- ============================================================================

-- Line items reference medicines by id without a foreign key: deleting a
-- medicine leaves historical prescriptions untouched.
CREATE TABLE IF NOT EXISTS prescriptions (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    date TEXT NOT NULL,                          -- YYYY-MM-DD
    line_items TEXT NOT NULL DEFAULT '[]',       -- JSON array of LineItem
    observations TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_prescriptions_patient ON prescriptions(patient_id);
CREATE INDEX IF NOT EXISTS idx_prescriptions_date ON prescriptions(date);
"#;

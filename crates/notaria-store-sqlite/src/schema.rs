//! SQL schema for the notary SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS protocolist_rents (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at    TEXT NOT NULL,   -- RFC 3339 UTC
    complete_name TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    email         TEXT NOT NULL,
    observations  TEXT
);

-- protocolist_id is a weak reference on purpose: deleting a protocolist
-- neither cascades nor is blocked by its cases.
CREATE TABLE IF NOT EXISTS case_rents (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    creation_date  TEXT NOT NULL,  -- YYYY-MM-DD
    document_date  TEXT NOT NULL,  -- YYYY-MM-DD
    escritura      TEXT NOT NULL,
    radicado       TEXT NOT NULL,
    protocolist_id INTEGER NOT NULL,
    observaciones  TEXT,
    status         TEXT NOT NULL DEFAULT 'in_progress'
                   CHECK (status IN ('in_progress', 'finished')),
    last_modified  TEXT NOT NULL   -- RFC 3339 UTC
);

CREATE TABLE IF NOT EXISTS facturas (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    number         INTEGER NOT NULL,
    rentas         REAL    NOT NULL,
    registro       REAL    NOT NULL,
    payment_method TEXT    NOT NULL CHECK (payment_method IN ('pse', 'efectivo')),
    state          TEXT    NOT NULL CHECK (state IN ('cancelado', 'sin cancelar')),
    date           TEXT    NOT NULL,  -- YYYY-MM-DD
    escritura      INTEGER NOT NULL,
    protocolist    TEXT    NOT NULL,
    total          REAL    NOT NULL
);

-- Uniqueness rules for cases and protocolists live here, not only in
-- application lookups.
CREATE UNIQUE INDEX IF NOT EXISTS case_rents_radicado_idx
    ON case_rents(radicado);
CREATE UNIQUE INDEX IF NOT EXISTS case_rents_escritura_date_idx
    ON case_rents(escritura, document_date);
CREATE UNIQUE INDEX IF NOT EXISTS protocolist_rents_email_idx
    ON protocolist_rents(email);

CREATE INDEX IF NOT EXISTS case_rents_protocolist_idx ON case_rents(protocolist_id);
CREATE INDEX IF NOT EXISTS case_rents_status_idx      ON case_rents(status);

PRAGMA user_version = 1;
";

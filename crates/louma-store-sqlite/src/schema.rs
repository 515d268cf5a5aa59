//! SQL schema for the LOUMA SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id            TEXT PRIMARY KEY,
    full_name          TEXT NOT NULL,
    phone              TEXT NOT NULL UNIQUE,
    email              TEXT UNIQUE,
    password_hash      TEXT NOT NULL,
    role               TEXT NOT NULL,   -- 'TENANT' | 'OWNER' | 'AGENCY'
    profession         TEXT,
    household_size     INTEGER,
    completion_percent INTEGER NOT NULL DEFAULT 0,
    is_active          INTEGER NOT NULL DEFAULT 1,
    is_verified        INTEGER NOT NULL DEFAULT 0,
    last_login_at      TEXT,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL
);

-- Enum columns hold the French labels verbatim ('Meublé', 'SEEG fiable', ...).
CREATE TABLE IF NOT EXISTS properties (
    property_id         TEXT PRIMARY KEY,
    owner_id            TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    title               TEXT NOT NULL,
    kind                TEXT NOT NULL,
    commune             TEXT NOT NULL,
    quartier            TEXT NOT NULL,
    description         TEXT NOT NULL,
    bedrooms            INTEGER NOT NULL,
    bathrooms           INTEGER NOT NULL,
    total_rooms         INTEGER NOT NULL,
    surface_m2          REAL,
    furnished           TEXT NOT NULL,
    water_supply        TEXT NOT NULL,
    electricity_type    TEXT NOT NULL,
    generator_included  INTEGER NOT NULL DEFAULT 0,
    accessible_in_rain  INTEGER NOT NULL DEFAULT 0,
    price_gnf           INTEGER NOT NULL CHECK (price_gnf > 0),
    is_verified         INTEGER NOT NULL DEFAULT 0,
    is_active           INTEGER NOT NULL DEFAULT 1,
    is_available        INTEGER NOT NULL DEFAULT 1,
    available_from      TEXT NOT NULL,
    min_duration_months INTEGER NOT NULL DEFAULT 6,
    view_count          INTEGER NOT NULL DEFAULT 0,
    lead_count          INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

-- One lead per (listing, requester); this constraint is the authoritative
-- duplicate guard.
CREATE TABLE IF NOT EXISTS leads (
    lead_id      TEXT PRIMARY KEY,
    property_id  TEXT NOT NULL REFERENCES properties(property_id) ON DELETE CASCADE,
    user_id      TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    message      TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'NEW',
    level        TEXT NOT NULL DEFAULT 'COLD',
    notes        TEXT,
    contact_date TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    UNIQUE (property_id, user_id)
);

CREATE INDEX IF NOT EXISTS properties_owner_idx   ON properties(owner_id);
CREATE INDEX IF NOT EXISTS properties_commune_idx ON properties(commune);
CREATE INDEX IF NOT EXISTS properties_price_idx   ON properties(price_gnf);
CREATE INDEX IF NOT EXISTS properties_created_idx ON properties(created_at);
CREATE INDEX IF NOT EXISTS leads_user_idx         ON leads(user_id);
CREATE INDEX IF NOT EXISTS leads_status_idx       ON leads(status);

PRAGMA user_version = 1;
";

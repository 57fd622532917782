//! SQL DDL for the admin accounts and the model prompts.

/// SQLite schema with:
/// - `admin.email` UNIQUE, passwords stored as Argon2 PHC strings
/// - `prompts.model` UNIQUE so prompt writes can upsert
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS admin (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    fullname TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS prompts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    model TEXT NOT NULL UNIQUE,
    prompt TEXT NOT NULL,
    updated_at TEXT NOT NULL -- RFC3339
);
"#;

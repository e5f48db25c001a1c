//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Intrasearch database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Committed pages, one row per standardized URL
CREATE TABLE IF NOT EXISTS page (
    standard_url TEXT NOT NULL UNIQUE,
    url TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    update_time INTEGER NOT NULL
);

-- Frontier of URLs waiting to be fetched
CREATE TABLE IF NOT EXISTS queue (
    standard_url TEXT NOT NULL UNIQUE,
    url TEXT NOT NULL
);

-- Word postings; repeated rows encode term frequency
CREATE TABLE IF NOT EXISTS word (
    word TEXT NOT NULL,
    standard_url TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_word_word ON word(word);
CREATE INDEX IF NOT EXISTS idx_word_standard_url ON word(standard_url);
"#;

/// Initializes the database schema
///
/// Creates all tables and indexes if they don't already exist.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

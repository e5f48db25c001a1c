//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::{PageRecord, QueueEntry, SearchRow};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;

/// Multiplier that keeps the title tier dominant over the hit count
const TIER_WEIGHT: i64 = 100_000;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path`
    ///
    /// The crawler and the search API each open their own connection to the
    /// same file; WAL mode lets readers proceed while the crawler writes.
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        conn.busy_timeout(Duration::from_secs(5))?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Builds `?, ?, ?` for an `IN (...)` clause with `n` parameters
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Escapes `%`, `_` and `\` so the query is matched literally by LIKE
fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Storage for SqliteStorage {
    // ===== Frontier =====

    fn is_known(&self, standard_url: &str) -> StorageResult<bool> {
        let known: bool = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM page WHERE standard_url = ?1)
                 OR EXISTS (SELECT 1 FROM queue WHERE standard_url = ?1)",
            params![standard_url],
            |row| row.get(0),
        )?;
        Ok(known)
    }

    fn enqueue(&mut self, standard_url: &str, url: &str) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO queue (standard_url, url)
             SELECT ?1, ?2 WHERE NOT EXISTS (SELECT 1 FROM page WHERE standard_url = ?1)",
            params![standard_url, url],
        )?;
        Ok(inserted > 0)
    }

    fn dequeue(&mut self) -> StorageResult<Option<QueueEntry>> {
        let tx = self.conn.transaction()?;

        let entry = tx
            .query_row("SELECT standard_url, url FROM queue LIMIT 1", [], |row| {
                Ok(QueueEntry {
                    standard_url: row.get(0)?,
                    url: row.get(1)?,
                })
            })
            .optional()?;

        if let Some(entry) = &entry {
            tx.execute(
                "DELETE FROM queue WHERE standard_url = ?1",
                params![entry.standard_url],
            )?;
        }

        tx.commit()?;
        Ok(entry)
    }

    fn queue_len(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM queue", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Pages and postings =====

    fn replace_page(&mut self, page: &PageRecord, words: &[String]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "DELETE FROM page WHERE standard_url = ?1",
            params![page.standard_url],
        )?;
        tx.execute(
            "INSERT INTO page (standard_url, url, title, content, update_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                page.standard_url,
                page.url,
                page.title,
                page.content,
                page.update_time
            ],
        )?;

        tx.execute(
            "DELETE FROM word WHERE standard_url = ?1",
            params![page.standard_url],
        )?;
        {
            let mut stmt = tx.prepare("INSERT INTO word (word, standard_url) VALUES (?1, ?2)")?;
            for word in words {
                stmt.execute(params![word, page.standard_url])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn get_page(&self, standard_url: &str) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                "SELECT standard_url, url, title, content, update_time
                 FROM page WHERE standard_url = ?1",
                params![standard_url],
                |row| {
                    Ok(PageRecord {
                        standard_url: row.get(0)?,
                        url: row.get(1)?,
                        title: row.get(2)?,
                        content: row.get(3)?,
                        update_time: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(page)
    }

    fn get_postings(&self, standard_url: &str) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT word FROM word WHERE standard_url = ?1 ORDER BY rowid")?;

        let words = stmt
            .query_map(params![standard_url], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(words)
    }

    // ===== Queries =====

    fn count_matching_pages(&self, words: &[String]) -> StorageResult<u64> {
        if words.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "SELECT COUNT(DISTINCT standard_url) FROM word WHERE word IN ({})",
            placeholders(words.len())
        );
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(words.iter()), |row| row.get(0))?;
        Ok(count as u64)
    }

    fn ranked_pages(
        &self,
        words: &[String],
        query: &str,
        limit: u64,
        offset: u64,
    ) -> StorageResult<Vec<SearchRow>> {
        if words.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT page.standard_url, page.url, page.title, page.content, page.update_time, words.hits
             FROM (
                 SELECT standard_url, COUNT(*) AS hits FROM word
                 WHERE word IN ({})
                 GROUP BY standard_url
             ) AS words
             INNER JOIN page ON words.standard_url = page.standard_url
             ORDER BY (CASE
                 WHEN page.title = ? THEN 1
                 WHEN page.title LIKE ? ESCAPE '\\' THEN 2
                 ELSE 3
             END) * {} - words.hits, page.standard_url
             LIMIT ? OFFSET ?",
            placeholders(words.len()),
            TIER_WEIGHT
        );

        let mut values: Vec<Value> = words.iter().map(|w| Value::Text(w.clone())).collect();
        values.push(Value::Text(query.to_string()));
        values.push(Value::Text(format!("%{}%", escape_like(query))));
        values.push(Value::Integer(limit.min(i64::MAX as u64) as i64));
        values.push(Value::Integer(offset.min(i64::MAX as u64) as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(SearchRow {
                    standard_url: row.get(0)?,
                    url: row.get(1)?,
                    title: row.get(2)?,
                    content: row.get(3)?,
                    update_time: row.get(4)?,
                    word_hit_count: row.get::<_, i64>(5)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    // ===== Statistics =====

    fn count_pages(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM page", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_postings(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM word", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_distinct_words(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(DISTINCT word) FROM word", [], |row| {
                    row.get(0)
                })?;
        Ok(count as u64)
    }
}

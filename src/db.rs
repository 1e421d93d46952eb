//! Database module for the USSD learning gateway
//!
//! Provides persistence for USSD sessions, the resource catalog and cached
//! adapter output.

mod schema;

pub use schema::*;

use crate::state_machine::state::{Grade, MenuLevel, Subject};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Resource not found: {0}")]
    ResourceNotFound(i64),
}

pub type DbResult<T> = Result<T, DbError>;

const RESOURCE_COLUMNS: &str = "id, title, description, file_path, file_type, subject, grade_level, \
     country, language, tags, uploaded_by, upload_date, is_approved, view_count";

const SESSION_COLUMNS: &str = "session_id, phone_number, menu_level, selected_subject, selected_grade, \
     selected_resource_id, input_depth, last_response, created_at, updated_at";

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Run raw SQL, for tests that need to damage the store
    #[cfg(test)]
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.conn.lock().unwrap().execute_batch(sql)?;
        Ok(())
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Session Operations ====================

    /// Fetch the session for `session_id`, creating it at the main menu if absent
    pub fn get_or_create_session(
        &self,
        session_id: &str,
        phone_number: &str,
    ) -> DbResult<UssdSession> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO ussd_sessions (session_id, phone_number, menu_level, input_depth, created_at, updated_at)
             VALUES (?1, ?2, 'main', 0, ?3, ?3)",
            params![session_id, phone_number, now],
        )?;
        if inserted > 0 {
            tracing::debug!(session_id = %session_id, "Created USSD session");
        }

        query_session(&conn, session_id)
    }

    /// Get a session by id
    #[allow(dead_code)] // Used in tests
    pub fn get_session(&self, session_id: &str) -> DbResult<UssdSession> {
        let conn = self.conn.lock().unwrap();
        query_session(&conn, session_id)
    }

    /// Overwrite all mutable fields of a session in one statement
    pub fn save_session(&self, session: &UssdSession) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        let state = &session.state;
        let depth = i64::try_from(session.input_depth).unwrap_or(i64::MAX);

        let updated = conn.execute(
            "UPDATE ussd_sessions
             SET phone_number = ?1, menu_level = ?2, selected_subject = ?3, selected_grade = ?4,
                 selected_resource_id = ?5, input_depth = ?6, last_response = ?7, updated_at = ?8
             WHERE session_id = ?9",
            params![
                session.phone_number,
                state.menu_level().as_str(),
                state.selected_subject().map(Subject::name),
                state.selected_grade().map(Grade::name),
                state.selected_resource_id(),
                depth,
                session.last_response,
                now.to_rfc3339(),
                session.session_id,
            ],
        )?;

        if updated == 0 {
            return Err(DbError::SessionNotFound(session.session_id.clone()));
        }
        Ok(())
    }

    // ==================== Catalog Operations ====================

    /// List approved resources matching `filter`, ordered by id
    pub fn list_approved(
        &self,
        filter: &ResourceFilter,
        offset: usize,
        limit: usize,
    ) -> DbResult<Vec<Resource>> {
        let conn = self.conn.lock().unwrap();

        let mut sql = format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE is_approved = 1");
        let mut args: Vec<String> = Vec::new();

        for (column, value) in [
            ("subject", &filter.subject),
            ("grade_level", &filter.grade_level),
            ("country", &filter.country),
            ("language", &filter.language),
        ] {
            if let Some(value) = value {
                args.push(value.clone());
                sql.push_str(&format!(" AND {column} = ?{} COLLATE NOCASE", args.len()));
            }
        }

        if let Some(text) = filter.text.as_deref() {
            args.push(format!("%{}%", escape_like(text)));
            let n = args.len();
            sql.push_str(&format!(
                " AND (title LIKE ?{n} ESCAPE '\\' OR COALESCE(description, '') LIKE ?{n} ESCAPE '\\' \
                 OR COALESCE(tags, '') LIKE ?{n} ESCAPE '\\')"
            ));
        }

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        sql.push_str(&format!(" ORDER BY id ASC LIMIT {limit} OFFSET {offset}"));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), parse_resource_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Get an approved resource by id
    pub fn get_approved_resource(&self, id: i64) -> DbResult<Option<Resource>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = ?1 AND is_approved = 1"),
            params![id],
            parse_resource_row,
        )
        .optional()
        .map_err(DbError::from)
    }

    /// Insert a resource and return the stored record
    pub fn insert_resource(&self, new: &NewResource) -> DbResult<Resource> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO resources (title, description, file_path, file_type, subject, grade_level,
                                    country, language, tags, uploaded_by, upload_date, is_approved, view_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 0)",
            params![
                new.title,
                new.description,
                new.file_path,
                new.file_type.as_str(),
                new.subject,
                new.grade_level,
                new.country,
                new.language,
                new.tags,
                new.uploaded_by,
                now.to_rfc3339(),
                new.is_approved,
            ],
        )?;

        Ok(Resource {
            id: conn.last_insert_rowid(),
            title: new.title.clone(),
            description: new.description.clone(),
            file_path: new.file_path.clone(),
            file_type: new.file_type,
            subject: new.subject.clone(),
            grade_level: new.grade_level.clone(),
            country: new.country.clone(),
            language: new.language.clone(),
            tags: new.tags.clone(),
            uploaded_by: new.uploaded_by,
            upload_date: now,
            is_approved: new.is_approved,
            view_count: 0,
        })
    }

    /// Approve or withdraw a resource
    #[allow(dead_code)] // Used in tests
    pub fn set_approved(&self, id: i64, approved: bool) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE resources SET is_approved = ?1 WHERE id = ?2",
            params![approved, id],
        )?;
        if updated == 0 {
            return Err(DbError::ResourceNotFound(id));
        }
        Ok(())
    }

    /// Bump the view counter of a resource
    pub fn increment_view_count(&self, id: i64) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE resources SET view_count = view_count + 1 WHERE id = ?1",
            params![id],
        )?;
        if updated == 0 {
            return Err(DbError::ResourceNotFound(id));
        }
        Ok(())
    }

    /// Count all resources, approved or not
    pub fn resource_count(&self) -> DbResult<i64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM resources", [], |row| row.get(0))
            .map_err(DbError::from)
    }

    // ==================== Content Cache Operations ====================

    pub fn get_translation(&self, resource_id: i64, language: &str) -> DbResult<Option<Translation>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, resource_id, language, translated_title, translation_date
             FROM translations WHERE resource_id = ?1 AND language = ?2",
            params![resource_id, language],
            parse_translation_row,
        )
        .optional()
        .map_err(DbError::from)
    }

    pub fn get_translation_by_id(&self, id: i64) -> DbResult<Option<Translation>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, resource_id, language, translated_title, translation_date
             FROM translations WHERE id = ?1",
            params![id],
            parse_translation_row,
        )
        .optional()
        .map_err(DbError::from)
    }

    /// List cached translations for a resource
    pub fn list_translations(&self, resource_id: i64) -> DbResult<Vec<Translation>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, resource_id, language, translated_title, translation_date
             FROM translations WHERE resource_id = ?1 ORDER BY language ASC",
        )?;
        let rows = stmt.query_map(params![resource_id], parse_translation_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    pub fn upsert_translation(
        &self,
        resource_id: i64,
        language: &str,
        translated_title: &str,
    ) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO translations (resource_id, language, translated_title, translation_date)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (resource_id, language)
             DO UPDATE SET translated_title = excluded.translated_title,
                           translation_date = excluded.translation_date",
            params![resource_id, language, translated_title, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_summary(&self, resource_id: i64, language: &str) -> DbResult<Option<Summary>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, resource_id, language, summary_text, created_at
             FROM summaries WHERE resource_id = ?1 AND language = ?2",
            params![resource_id, language],
            |row| {
                Ok(Summary {
                    id: row.get(0)?,
                    resource_id: row.get(1)?,
                    language: row.get(2)?,
                    summary_text: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                })
            },
        )
        .optional()
        .map_err(DbError::from)
    }

    pub fn upsert_summary(&self, resource_id: i64, language: &str, text: &str) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO summaries (resource_id, language, summary_text, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (resource_id, language)
             DO UPDATE SET summary_text = excluded.summary_text, created_at = excluded.created_at",
            params![resource_id, language, text, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

fn query_session(conn: &Connection, session_id: &str) -> DbResult<UssdSession> {
    conn.query_row(
        &format!("SELECT {SESSION_COLUMNS} FROM ussd_sessions WHERE session_id = ?1"),
        params![session_id],
        parse_session_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::SessionNotFound(session_id.to_string()),
        other => DbError::Sqlite(other),
    })
}

/// Parse a session row. Rows whose columns disagree with their menu level
/// are reset to the main menu.
fn parse_session_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UssdSession> {
    let session_id: String = row.get(0)?;
    let level_str: String = row.get(2)?;
    let subject: Option<String> = row.get(3)?;
    let grade: Option<String> = row.get(4)?;
    let resource_id: Option<i64> = row.get(5)?;
    let depth: i64 = row.get(6)?;

    let state = MenuLevel::parse(&level_str).and_then(|level| {
        DialogueState::from_parts(
            level,
            subject.as_deref().and_then(Subject::from_name),
            grade.as_deref().and_then(Grade::from_name),
            resource_id,
        )
    });
    // The stored screen belongs to the discarded state, so a reset drops it
    let (state, last_response) = match state {
        Some(state) => (state, row.get(7)?),
        None => {
            tracing::warn!(
                session_id = %session_id,
                menu_level = %level_str,
                "Inconsistent session row, resetting to main menu"
            );
            (DialogueState::Main, None)
        }
    };

    Ok(UssdSession {
        session_id,
        phone_number: row.get(1)?,
        state,
        input_depth: usize::try_from(depth).unwrap_or(0),
        last_response,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
        updated_at: parse_datetime(&row.get::<_, String>(9)?),
    })
}

fn parse_resource_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        file_path: row.get(3)?,
        file_type: parse_file_type(&row.get::<_, String>(4)?),
        subject: row.get(5)?,
        grade_level: row.get(6)?,
        country: row.get(7)?,
        language: row.get(8)?,
        tags: row.get(9)?,
        uploaded_by: row.get(10)?,
        upload_date: parse_datetime(&row.get::<_, String>(11)?),
        is_approved: row.get(12)?,
        view_count: row.get(13)?,
    })
}

fn parse_translation_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Translation> {
    Ok(Translation {
        id: row.get(0)?,
        resource_id: row.get(1)?,
        language: row.get(2)?,
        translated_title: row.get(3)?,
        translation_date: parse_datetime(&row.get::<_, String>(4)?),
    })
}

/// Escape `LIKE` wildcards so user search terms match literally
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

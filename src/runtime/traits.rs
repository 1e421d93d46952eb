//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::db::{Database, Resource, ResourceFilter, UssdSession};
use async_trait::async_trait;
use std::sync::Arc;

pub use crate::services::{Summarizer, Translator};

/// Durable `session_id -> dialogue state` mapping
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session, creating it at the main menu when unseen
    async fn get_or_create(
        &self,
        session_id: &str,
        phone_number: &str,
    ) -> Result<UssdSession, String>;

    /// Overwrite the mutable fields of a session
    async fn save(&self, session: &UssdSession) -> Result<(), String>;
}

/// Read access to approved catalog resources
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Approved resources matching `filter`, ordered by id, at most `limit`
    async fn list_approved(
        &self,
        filter: &ResourceFilter,
        limit: usize,
    ) -> Result<Vec<Resource>, String>;

    /// One approved resource; `None` if missing or unapproved
    async fn get_resource(&self, id: i64) -> Result<Option<Resource>, String>;
}

/// Cached adapter output keyed by resource and language
#[async_trait]
pub trait ContentCache: Send + Sync {
    async fn cached_translation(
        &self,
        resource_id: i64,
        language: &str,
    ) -> Result<Option<String>, String>;

    async fn store_translation(
        &self,
        resource_id: i64,
        language: &str,
        text: &str,
    ) -> Result<(), String>;

    async fn cached_summary(
        &self,
        resource_id: i64,
        language: &str,
    ) -> Result<Option<String>, String>;

    async fn store_summary(&self, resource_id: i64, language: &str, text: &str)
        -> Result<(), String>;
}

/// Combined storage trait for convenience
pub trait Storage: SessionStore + Catalog + ContentCache {}
impl<T: SessionStore + Catalog + ContentCache> Storage for T {}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn get_or_create(
        &self,
        session_id: &str,
        phone_number: &str,
    ) -> Result<UssdSession, String> {
        (**self).get_or_create(session_id, phone_number).await
    }

    async fn save(&self, session: &UssdSession) -> Result<(), String> {
        (**self).save(session).await
    }
}

#[async_trait]
impl<T: Catalog + ?Sized> Catalog for Arc<T> {
    async fn list_approved(
        &self,
        filter: &ResourceFilter,
        limit: usize,
    ) -> Result<Vec<Resource>, String> {
        (**self).list_approved(filter, limit).await
    }

    async fn get_resource(&self, id: i64) -> Result<Option<Resource>, String> {
        (**self).get_resource(id).await
    }
}

#[async_trait]
impl<T: ContentCache + ?Sized> ContentCache for Arc<T> {
    async fn cached_translation(
        &self,
        resource_id: i64,
        language: &str,
    ) -> Result<Option<String>, String> {
        (**self).cached_translation(resource_id, language).await
    }

    async fn store_translation(
        &self,
        resource_id: i64,
        language: &str,
        text: &str,
    ) -> Result<(), String> {
        (**self).store_translation(resource_id, language, text).await
    }

    async fn cached_summary(
        &self,
        resource_id: i64,
        language: &str,
    ) -> Result<Option<String>, String> {
        (**self).cached_summary(resource_id, language).await
    }

    async fn store_summary(
        &self,
        resource_id: i64,
        language: &str,
        text: &str,
    ) -> Result<(), String> {
        (**self).store_summary(resource_id, language, text).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use Database as Storage
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for DatabaseStorage {
    async fn get_or_create(
        &self,
        session_id: &str,
        phone_number: &str,
    ) -> Result<UssdSession, String> {
        self.db
            .get_or_create_session(session_id, phone_number)
            .map_err(|e| e.to_string())
    }

    async fn save(&self, session: &UssdSession) -> Result<(), String> {
        self.db.save_session(session).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl Catalog for DatabaseStorage {
    async fn list_approved(
        &self,
        filter: &ResourceFilter,
        limit: usize,
    ) -> Result<Vec<Resource>, String> {
        self.db
            .list_approved(filter, 0, limit)
            .map_err(|e| e.to_string())
    }

    async fn get_resource(&self, id: i64) -> Result<Option<Resource>, String> {
        self.db.get_approved_resource(id).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl ContentCache for DatabaseStorage {
    async fn cached_translation(
        &self,
        resource_id: i64,
        language: &str,
    ) -> Result<Option<String>, String> {
        self.db
            .get_translation(resource_id, language)
            .map(|t| t.map(|t| t.translated_title))
            .map_err(|e| e.to_string())
    }

    async fn store_translation(
        &self,
        resource_id: i64,
        language: &str,
        text: &str,
    ) -> Result<(), String> {
        self.db
            .upsert_translation(resource_id, language, text)
            .map_err(|e| e.to_string())
    }

    async fn cached_summary(
        &self,
        resource_id: i64,
        language: &str,
    ) -> Result<Option<String>, String> {
        self.db
            .get_summary(resource_id, language)
            .map(|s| s.map(|s| s.summary_text))
            .map_err(|e| e.to_string())
    }

    async fn store_summary(
        &self,
        resource_id: i64,
        language: &str,
        text: &str,
    ) -> Result<(), String> {
        self.db
            .upsert_summary(resource_id, language, text)
            .map_err(|e| e.to_string())
    }
}

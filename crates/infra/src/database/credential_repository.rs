//! SQLite-backed implementation of the CredentialStore port.

use std::sync::Arc;

use agendasync_core::CredentialStore;
use agendasync_domain::{AgendaSyncError, OAuthCredential, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, ToSql};
use tracing::{debug, instrument};

use super::manager::DbManager;
use crate::errors::InfraError;

/// SQLite implementation of the credential store.
///
/// `upsert` is a single `INSERT ... ON CONFLICT DO UPDATE` statement, so a
/// refreshed access token and its rotated refresh token land in one atomic
/// write.
pub struct SqliteCredentialStore {
    db: Arc<DbManager>,
}

impl SqliteCredentialStore {
    /// Create a new credential store.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    #[instrument(skip(self))]
    async fn load(&self, owner_id: &str) -> Result<Option<OAuthCredential>> {
        let conn = self.db.get_connection()?;

        let row = conn
            .query_row(
                "SELECT owner_id, access_token, refresh_token, expires_at, scopes, redirect_uri
                 FROM oauth_credentials
                 WHERE owner_id = ?1",
                [&owner_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()
            .map_err(InfraError::from)?;

        let Some((owner_id, access_token, refresh_token, expires_ts, scopes, redirect_uri)) = row
        else {
            return Ok(None);
        };

        let expires_at = timestamp_to_datetime(expires_ts)?;

        Ok(Some(OAuthCredential {
            owner_id,
            access_token,
            refresh_token,
            expires_at,
            scopes: split_scopes(&scopes),
            redirect_uri,
        }))
    }

    #[instrument(skip(self, credential), fields(owner_id = %credential.owner_id))]
    async fn upsert(&self, credential: &OAuthCredential) -> Result<()> {
        let conn = self.db.get_connection()?;
        let now = Utc::now().timestamp();
        let scopes = credential.scopes.join(" ");

        conn.execute(
            "INSERT INTO oauth_credentials (
                owner_id, access_token, refresh_token, expires_at, scopes, redirect_uri, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(owner_id) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                expires_at = excluded.expires_at,
                scopes = excluded.scopes,
                redirect_uri = excluded.redirect_uri,
                updated_at = excluded.updated_at",
            [
                &credential.owner_id as &dyn ToSql,
                &credential.access_token,
                &credential.refresh_token,
                &credential.expires_at.timestamp(),
                &scopes,
                &credential.redirect_uri,
                &now,
            ]
            .as_ref(),
        )
        .map_err(InfraError::from)?;

        debug!("credential upserted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, owner_id: &str) -> Result<()> {
        let conn = self.db.get_connection()?;
        conn.execute("DELETE FROM oauth_credentials WHERE owner_id = ?1", [&owner_id])
            .map_err(InfraError::from)?;
        debug!("credential deleted");
        Ok(())
    }
}

fn timestamp_to_datetime(ts: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| AgendaSyncError::Database(format!("invalid stored timestamp: {ts}")))
}

fn split_scopes(scopes: &str) -> Vec<String> {
    scopes.split_whitespace().map(str::to_string).collect()
}

//! Content table access: record selection and metadata updates.
//!
//! [`ContentSelector`] and [`MetaWriter`] are the two storage seams used by
//! the batch runner. [`MySqlContentStore`] implements both over a single
//! long-lived MySQL connection.

use std::fmt;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;
use tracing::{debug, warn};

use crate::config::DatabaseSettings;
use crate::record::ContentRecord;
use crate::{MetagenError, Result};

/// Default Joomla content table.
pub const DEFAULT_TABLE: &str = "cokw3_content";

/// Reads candidate records in id order.
#[async_trait]
pub trait ContentSelector: Send {
    /// Fetches at most `limit` records (all when `None`), ordered by ascending id.
    ///
    /// # Errors
    ///
    /// Returns [`MetagenError::Query`] when the query fails; the caller treats
    /// this as fatal for the batch.
    async fn fetch_records(&mut self, limit: Option<u64>) -> Result<Vec<ContentRecord>>;
}

/// Persists generated metadata for one record.
#[async_trait]
pub trait MetaWriter: Send {
    /// Overwrites `metakey`/`metadesc` of record `id` and commits.
    ///
    /// Returns `true` only after a confirmed commit. Storage failures are
    /// logged and reported as `false`.
    async fn write_meta(&mut self, id: i64, keywords: &str, description: &str) -> bool;
}

/// A store the batch runner can both select from and write to.
pub trait ContentStore: ContentSelector + MetaWriter {}

impl<T: ContentSelector + MetaWriter> ContentStore for T {}

/// A validated SQL table identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName(String);

impl TableName {
    /// Accepts ASCII letters, digits and underscores only.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let valid = !name.is_empty()
            && name.len() <= 64
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid { Ok(Self(name)) } else { Err(MetagenError::InvalidTableName(name)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self(DEFAULT_TABLE.to_string())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Selection statement. The limit, when present, is a bound parameter.
pub fn select_sql(table: &TableName, limited: bool) -> String {
    let mut sql = format!(
        "SELECT CAST(`id` AS SIGNED) AS `id`, `title`, `fulltext`, `introtext`, `metakey`, `metadesc`, \
         CAST(`state` AS SIGNED) AS `state` FROM `{}` ORDER BY `id`",
        table
    );
    if limited {
        sql.push_str(" LIMIT ?");
    }
    sql
}

/// Single-row update statement, bound as `(metakey, metadesc, id)`.
pub fn update_sql(table: &TableName) -> String {
    format!("UPDATE `{}` SET `metakey` = ?, `metadesc` = ? WHERE `id` = ?", table)
}

/// MySQL-backed content store holding one connection for the whole batch.
pub struct MySqlContentStore {
    conn: MySqlConnection,
    table: TableName,
}

impl MySqlContentStore {
    /// Opens the connection described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`MetagenError::Connection`] if the server cannot be reached or
    /// rejects the credentials.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.name);

        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(MetagenError::Connection)?;

        debug!(host = %settings.host, database = %settings.name, table = %settings.table, "connected to content database");

        Ok(Self { conn, table: settings.table.clone() })
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Closes the connection gracefully.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await.map_err(MetagenError::Connection)
    }

    async fn update(&mut self, id: i64, keywords: &str, description: &str) -> std::result::Result<u64, sqlx::Error> {
        let sql = update_sql(&self.table);
        let mut tx = self.conn.begin().await?;
        let result = sqlx::query(&sql)
            .bind(keywords)
            .bind(description)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ContentSelector for MySqlContentStore {
    async fn fetch_records(&mut self, limit: Option<u64>) -> Result<Vec<ContentRecord>> {
        let sql = select_sql(&self.table, limit.is_some());
        let mut query = sqlx::query_as::<_, ContentRecord>(&sql);
        if let Some(limit) = limit {
            query = query.bind(limit);
        }

        let records = query.fetch_all(&mut self.conn).await.map_err(MetagenError::Query)?;
        debug!(count = records.len(), ?limit, "selected content records");
        Ok(records)
    }
}

#[async_trait]
impl MetaWriter for MySqlContentStore {
    async fn write_meta(&mut self, id: i64, keywords: &str, description: &str) -> bool {
        match self.update(id, keywords, description).await {
            Ok(rows) => {
                if rows == 0 {
                    debug!(id, "metadata update matched no rows or left them unchanged");
                }
                true
            }
            Err(e) => {
                warn!(id, error = %e, "metadata update failed");
                false
            }
        }
    }
}

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{Document, DocumentStore, MIGRATION_001_DOCUMENTS};

/// Per-collection document counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStats {
    pub collection: String,
    pub documents: i64,
}

/// Document store backed by a single SQLite table.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_DOCUMENTS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let store = Self::connect(database_url).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Count documents in one collection.
    pub async fn count(&self, collection: &str) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count documents")?;

        Ok(row.get("count"))
    }

    /// List every non-empty collection with its document count.
    pub async fn collection_stats(&self) -> Result<Vec<CollectionStats>> {
        let rows = sqlx::query(
            r#"
            SELECT collection, COUNT(*) as count
            FROM documents
            GROUP BY collection
            ORDER BY collection
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list collections")?;

        Ok(rows
            .iter()
            .map(|row| CollectionStats {
                collection: row.get("collection"),
                documents: row.get("count"),
            })
            .collect())
    }
}

impl DocumentStore for SqliteStore {
    async fn delete_all(&self, collection: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ?")
            .bind(collection)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete documents from '{}'", collection))?;

        Ok(result.rows_affected())
    }

    async fn insert_many(&self, collection: &str, documents: &[Document]) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin insert transaction")?;

        // Next free position in this collection
        let row = sqlx::query(
            "SELECT COALESCE(MAX(position), -1) + 1 as next FROM documents WHERE collection = ?",
        )
        .bind(collection)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to read collection position")?;
        let mut position: i64 = row.get("next");

        let inserted_at = Utc::now().to_rfc3339();
        for document in documents {
            let body = serde_json::to_string(document).context("Failed to encode document")?;

            sqlx::query(
                r#"
                INSERT INTO documents (id, collection, position, body, inserted_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(collection)
            .bind(position)
            .bind(&body)
            .bind(&inserted_at)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert document into '{}'", collection))?;

            position += 1;
        }

        tx.commit()
            .await
            .context("Failed to commit insert transaction")?;

        Ok(documents.len() as u64)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>> {
        let rows = sqlx::query(
            r#"
            SELECT body
            FROM documents
            WHERE collection = ?
            ORDER BY position
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to read documents from '{}'", collection))?;

        rows.iter()
            .map(|row| {
                let body: String = row.get("body");
                serde_json::from_str(&body).context("Invalid document body")
            })
            .collect()
    }
}

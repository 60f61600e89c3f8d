use backlog_core::models::{Item, ItemStatus, NewItem};
use backlog_core::AppError;
use sqlx::{Sqlite, SqlitePool};

/// Repository for backlog items
#[derive(Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, item), fields(db.table = "items", db.operation = "insert"))]
    pub async fn create(&self, item: &NewItem) -> Result<Item, AppError> {
        let created = sqlx::query_as::<Sqlite, Item>(
            r#"
            INSERT INTO items (name, description, status)
            VALUES (?, ?, ?)
            RETURNING id, name, description, status
            "#,
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.status)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(item_id = created.id, "Item created");
        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "items", db.operation = "select", db.record_id = id))]
    pub async fn get(&self, id: i64) -> Result<Option<Item>, AppError> {
        let item = sqlx::query_as::<Sqlite, Item>(
            "SELECT id, name, description, status FROM items WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// List items ordered by id, optionally filtered by status
    #[tracing::instrument(skip(self), fields(db.table = "items", db.operation = "select"))]
    pub async fn list(&self, status: Option<ItemStatus>) -> Result<Vec<Item>, AppError> {
        let items = match status {
            Some(status) => {
                sqlx::query_as::<Sqlite, Item>(
                    "SELECT id, name, description, status FROM items WHERE status = ? ORDER BY id ASC",
                )
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<Sqlite, Item>(
                    "SELECT id, name, description, status FROM items ORDER BY id ASC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(items)
    }

    /// Overwrite all mutable columns of an existing item. Returns `None` if the row is gone.
    #[tracing::instrument(skip(self, item), fields(db.table = "items", db.operation = "update", db.record_id = item.id))]
    pub async fn update(&self, item: &Item) -> Result<Option<Item>, AppError> {
        let updated = sqlx::query_as::<Sqlite, Item>(
            r#"
            UPDATE items
            SET name = ?, description = ?, status = ?
            WHERE id = ?
            RETURNING id, name, description, status
            "#,
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.status)
        .bind(item.id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Delete an item. Returns `true` if a row was removed.
    #[tracing::instrument(skip(self), fields(db.table = "items", db.operation = "delete", db.record_id = id))]
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Cheap round trip used by the readiness probe
    #[tracing::instrument(skip(self), fields(db.operation = "ping"))]
    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query_scalar::<Sqlite, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

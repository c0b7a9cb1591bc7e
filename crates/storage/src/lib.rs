use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use catalog::CatalogStore;
use chrono::{DateTime, Utc};
use shared::domain::{CarId, CatalogEntry, NewCatalogEntry, TintColor};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

const DATA_LOADED_KEY: &str = "isDataLoaded";

const ENTRY_COLUMNS: &str = "id, mark, model, rating, last_started, times_driven, my_choice, image_data, tint_red, tint_green, tint_blue";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!(%database_url, "catalog database ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn list_entries(&self) -> Result<Vec<CatalogEntry>> {
        let rows = sqlx::query(&format!("SELECT {ENTRY_COLUMNS} FROM cars ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(entry_from_row).collect()
    }

    async fn read_setting(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read setting '{key}'"))?;
        Ok(row.map(|r| r.get::<String, _>(0)))
    }

    async fn write_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write setting '{key}'"))?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for Storage {
    async fn insert_entries(&self, entries: &[NewCatalogEntry]) -> Result<Vec<CarId>> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            let rec = sqlx::query(
                "INSERT INTO cars (mark, model, rating, last_started, times_driven, my_choice, image_data, tint_red, tint_green, tint_blue)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 RETURNING id",
            )
            .bind(&entry.mark)
            .bind(&entry.model)
            .bind(entry.rating)
            .bind(entry.last_started)
            .bind(entry.times_driven)
            .bind(entry.my_choice)
            .bind(entry.image_data.as_deref())
            .bind(entry.tint_color.map(|c| c.red))
            .bind(entry.tint_color.map(|c| c.green))
            .bind(entry.tint_color.map(|c| c.blue))
            .fetch_one(&mut *tx)
            .await
            .with_context(|| format!("failed to insert car '{}'", entry.mark))?;
            ids.push(CarId(rec.get::<i64, _>(0)));
        }
        tx.commit().await?;
        Ok(ids)
    }

    async fn find_by_mark(&self, mark: &str) -> Result<Option<CatalogEntry>> {
        let row = sqlx::query(&format!("SELECT {ENTRY_COLUMNS} FROM cars WHERE mark = ?"))
            .bind(mark)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(entry_from_row).transpose()
    }

    async fn find_favorites(&self) -> Result<Vec<CatalogEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM cars WHERE my_choice = 1 ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(entry_from_row).collect()
    }

    async fn save_entry(&self, entry: &CatalogEntry) -> Result<()> {
        self.save_entries(std::slice::from_ref(entry)).await
    }

    async fn save_entries(&self, entries: &[CatalogEntry]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for entry in entries {
            let affected = sqlx::query(
                "UPDATE cars SET rating = ?, last_started = ?, times_driven = ?, my_choice = ?
                 WHERE id = ?",
            )
            .bind(entry.rating)
            .bind(entry.last_started)
            .bind(entry.times_driven)
            .bind(entry.my_choice)
            .bind(entry.id.0)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to save car '{}'", entry.mark))?
            .rows_affected();
            if affected == 0 {
                bail!("car id={} ('{}') does not exist", entry.id.0, entry.mark);
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_marks(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT mark FROM cars ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.get::<String, _>(0)).collect())
    }

    async fn count_entries(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cars")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn is_data_loaded(&self) -> Result<bool> {
        Ok(self
            .read_setting(DATA_LOADED_KEY)
            .await?
            .is_some_and(|value| value == "true"))
    }

    async fn set_data_loaded(&self, loaded: bool) -> Result<()> {
        self.write_setting(DATA_LOADED_KEY, if loaded { "true" } else { "false" })
            .await
    }
}

fn entry_from_row(row: &SqliteRow) -> Result<CatalogEntry> {
    let tint = match (
        row.try_get::<Option<f32>, _>("tint_red")?,
        row.try_get::<Option<f32>, _>("tint_green")?,
        row.try_get::<Option<f32>, _>("tint_blue")?,
    ) {
        (Some(red), Some(green), Some(blue)) => Some(TintColor::new(red, green, blue)),
        _ => None,
    };

    Ok(CatalogEntry {
        id: CarId(row.try_get::<i64, _>("id")?),
        mark: row.try_get("mark")?,
        model: row.try_get("model")?,
        rating: row.try_get::<f32, _>("rating")?,
        last_started: row.try_get::<Option<DateTime<Utc>>, _>("last_started")?,
        times_driven: row.try_get::<i64, _>("times_driven")?,
        my_choice: row.try_get::<bool, _>("my_choice")?,
        image_data: row.try_get::<Option<Vec<u8>>, _>("image_data")?,
        tint_color: tint,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() || path.contains(":memory:") {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

use anyhow::{Result, anyhow};
use chrono::Utc;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use log::{debug, info};

use super::Storage;
use super::schema::kv_store;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Insertable)]
#[diesel(table_name = kv_store)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct NewEntry<'a> {
    namespace: &'a str,
    value: &'a str,
    updated_at: i64,
}

/// SQLite-backed key-value table, one row per namespace.
pub struct SqliteStorage {
    pool: Pool<ConnectionManager<SqliteConnection>>,
}

impl SqliteStorage {
    pub fn open(db_path: &str) -> Result<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(db_path);
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(|e| anyhow!("Failed to create DB pool: {}", e))?;

        let mut pooled = pool.get()?;
        let conn: &mut SqliteConnection = &mut pooled;
        conn.batch_execute(
            "PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL; PRAGMA busy_timeout = 5000;",
        )?;

        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow!("Failed to run migrations on {}: {}", db_path, e))?;
        for version in &applied {
            info!("Applied migration {}", version);
        }
        debug!("Opened sqlite storage at {}", db_path);

        Ok(Self { pool })
    }
}

impl Storage for SqliteStorage {
    fn load(&self, namespace: &str) -> Result<Option<String>> {
        let mut pooled = self.pool.get()?;
        let conn: &mut SqliteConnection = &mut pooled;
        let value = kv_store::table
            .find(namespace)
            .select(kv_store::value)
            .first::<String>(conn)
            .optional()?;
        Ok(value)
    }

    fn save(&self, namespace: &str, value: &str) -> Result<()> {
        let mut pooled = self.pool.get()?;
        let conn: &mut SqliteConnection = &mut pooled;
        diesel::replace_into(kv_store::table)
            .values(&NewEntry {
                namespace,
                value,
                updated_at: Utc::now().timestamp(),
            })
            .execute(conn)?;
        Ok(())
    }

    fn remove(&self, namespace: &str) -> Result<()> {
        let mut pooled = self.pool.get()?;
        let conn: &mut SqliteConnection = &mut pooled;
        diesel::delete(kv_store::table.find(namespace)).execute(conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stride.db");
        let path = path.to_str().unwrap();

        {
            let storage = SqliteStorage::open(path).unwrap();
            assert_eq!(storage.load("workout-storage").unwrap(), None);
            storage.save("workout-storage", "first").unwrap();
            storage.save("workout-storage", "second").unwrap();
        }

        let storage = SqliteStorage::open(path).unwrap();
        assert_eq!(
            storage.load("workout-storage").unwrap().as_deref(),
            Some("second")
        );
        storage.remove("workout-storage").unwrap();
        assert_eq!(storage.load("workout-storage").unwrap(), None);
    }
}

use crate::db::models::{DbAdmin, DbPrompt};
use crate::db::schema::SQLITE_INIT;
use crate::error::DermisError;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database and apply the schema.
    pub async fn connect(database_url: &str) -> Result<Self, DermisError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Waits for in-flight queries, then closes every connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), DermisError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn find_admin_by_email(&self, email: &str) -> Result<Option<DbAdmin>, DermisError> {
        let admin = sqlx::query_as::<_, DbAdmin>(
            "SELECT id, email, password_hash, fullname FROM admin WHERE email = ? LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    pub async fn get_admin(&self, id: i64) -> Result<Option<DbAdmin>, DermisError> {
        let admin = sqlx::query_as::<_, DbAdmin>(
            "SELECT id, email, password_hash, fullname FROM admin WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    /// Returns the new row id.
    pub async fn insert_admin(
        &self,
        email: &str,
        password_hash: &str,
        fullname: &str,
    ) -> Result<i64, DermisError> {
        let result =
            sqlx::query("INSERT INTO admin (email, password_hash, fullname) VALUES (?, ?, ?)")
                .bind(email)
                .bind(password_hash)
                .bind(fullname)
                .execute(&self.pool)
                .await
                .map_err(map_unique_violation)?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update_admin_profile(
        &self,
        id: i64,
        fullname: &str,
        email: &str,
    ) -> Result<(), DermisError> {
        let result = sqlx::query("UPDATE admin SET fullname = ?, email = ? WHERE id = ?")
            .bind(fullname)
            .bind(email)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_unique_violation)?;
        if result.rows_affected() == 0 {
            return Err(DermisError::Unauthorized);
        }
        Ok(())
    }

    pub async fn update_admin_password(
        &self,
        id: i64,
        password_hash: &str,
    ) -> Result<(), DermisError> {
        let result = sqlx::query("UPDATE admin SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DermisError::Unauthorized);
        }
        Ok(())
    }

    pub async fn list_prompts(&self) -> Result<Vec<DbPrompt>, DermisError> {
        let rows =
            sqlx::query("SELECT id, model, prompt, updated_at FROM prompts ORDER BY model")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(Self::row_to_prompt).collect()
    }

    pub async fn get_prompt(&self, model: &str) -> Result<Option<DbPrompt>, DermisError> {
        let row = sqlx::query("SELECT id, model, prompt, updated_at FROM prompts WHERE model = ?")
            .bind(model)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_prompt).transpose()
    }

    /// Upsert by unique model name. Returns the row id.
    pub async fn upsert_prompt(&self, model: &str, prompt: &str) -> Result<i64, DermisError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO prompts (model, prompt, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(model) DO UPDATE SET
                prompt = excluded.prompt,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(model)
        .bind(prompt)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let rec: (i64,) = sqlx::query_as("SELECT id FROM prompts WHERE model = ?")
            .bind(model)
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    fn row_to_prompt(row: SqliteRow) -> Result<DbPrompt, DermisError> {
        let id: i64 = row.try_get("id")?;
        let model: String = row.try_get("model")?;
        let prompt: String = row.try_get("prompt")?;
        let updated_str: String = row.try_get("updated_at")?;

        let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&updated_str)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
            .with_timezone(&Utc);

        Ok(DbPrompt {
            id,
            model,
            prompt,
            updated_at,
        })
    }
}

fn map_unique_violation(e: sqlx::Error) -> DermisError {
    if e
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
    {
        return DermisError::bad_request("An admin with this email already exists");
    }
    e.into()
}

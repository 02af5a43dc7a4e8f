//! PostgreSQL repository.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use super::{LanguageRepository, MenuUser, UserRepository};
use crate::transport::Sender;

/// Users, states and languages in a single `menu_users` table
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the table when missing
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing menu_users schema");

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS menu_users (
                telegram_id BIGINT PRIMARY KEY,
                first_name TEXT NOT NULL,
                username TEXT,
                client_language TEXT,
                chosen_language TEXT,
                state TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create menu_users table")?;

        Ok(())
    }
}

fn user_from_row(row: &PgRow) -> Result<MenuUser> {
    Ok(MenuUser {
        telegram_id: row.try_get("telegram_id")?,
        first_name: row.try_get("first_name")?,
        username: row.try_get("username")?,
        client_language: row.try_get("client_language")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[async_trait]
impl UserRepository<MenuUser> for PgRepository {
    async fn find(&self, user_id: i64) -> Result<Option<MenuUser>> {
        let row = sqlx::query(
            "SELECT telegram_id, first_name, username, client_language, created_at
             FROM menu_users WHERE telegram_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to read user")?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn create(&self, sender: &Sender) -> Result<MenuUser> {
        debug!(user_id = %sender.id, "Creating user");

        let row = sqlx::query(
            "INSERT INTO menu_users (telegram_id, first_name, username, client_language)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (telegram_id) DO UPDATE
                SET first_name = EXCLUDED.first_name,
                    username = EXCLUDED.username,
                    updated_at = NOW()
             RETURNING telegram_id, first_name, username, client_language, created_at",
        )
        .bind(sender.id)
        .bind(&sender.first_name)
        .bind(&sender.username)
        .bind(&sender.language_code)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create user")?;

        user_from_row(&row)
    }

    async fn get_state(&self, user_id: i64) -> Result<Option<String>> {
        let state: Option<Option<String>> =
            sqlx::query_scalar("SELECT state FROM menu_users WHERE telegram_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to read user state")?;

        Ok(state.flatten())
    }

    async fn set_state(&self, user_id: i64, state: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO menu_users (telegram_id, first_name, state)
             VALUES ($1, '', $2)
             ON CONFLICT (telegram_id) DO UPDATE SET state = EXCLUDED.state, updated_at = NOW()",
        )
        .bind(user_id)
        .bind(state)
        .execute(&self.pool)
        .await
        .context("Failed to store user state")?;

        Ok(())
    }
}

#[async_trait]
impl LanguageRepository for PgRepository {
    async fn get_user_language(&self, user_id: i64) -> Result<Option<String>> {
        let language: Option<Option<String>> =
            sqlx::query_scalar("SELECT chosen_language FROM menu_users WHERE telegram_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to read user language")?;

        Ok(language.flatten())
    }

    async fn set_user_language(&self, user_id: i64, tag: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO menu_users (telegram_id, first_name, chosen_language)
             VALUES ($1, '', $2)
             ON CONFLICT (telegram_id) DO UPDATE
                SET chosen_language = EXCLUDED.chosen_language, updated_at = NOW()",
        )
        .bind(user_id)
        .bind(tag)
        .execute(&self.pool)
        .await
        .context("Failed to store user language")?;

        Ok(())
    }
}

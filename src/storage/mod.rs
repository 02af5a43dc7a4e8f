//! Storage module: user, state and language persistence
//!
//! The engine talks to storage through the [`UserRepository`] and
//! [`LanguageRepository`] traits. In-memory implementations are the default;
//! `postgres` provides a sqlx-backed one.

pub mod postgres;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::transport::Sender;

pub use postgres::PgRepository;

/// User record kept by the bundled repositories
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuUser {
    pub telegram_id: i64,
    pub first_name: String,
    pub username: Option<String>,
    /// Language reported by the client, not the chosen one
    pub client_language: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MenuUser {
    pub fn from_sender(sender: &Sender) -> Self {
        Self {
            telegram_id: sender.id,
            first_name: sender.first_name.clone(),
            username: sender.username.clone(),
            client_language: sender.language_code.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Users and their conversation state
#[async_trait]
pub trait UserRepository<U: Send>: Send + Sync {
    async fn find(&self, user_id: i64) -> Result<Option<U>>;

    /// Create the user on first contact
    async fn create(&self, sender: &Sender) -> Result<U>;

    async fn get_state(&self, user_id: i64) -> Result<Option<String>>;

    async fn set_state(&self, user_id: i64, state: &str) -> Result<()>;

    async fn find_or_create(&self, sender: &Sender) -> Result<U> {
        match self.find(sender.id).await? {
            Some(user) => Ok(user),
            None => self.create(sender).await,
        }
    }
}

/// Chosen language tag per user
#[async_trait]
pub trait LanguageRepository: Send + Sync {
    async fn get_user_language(&self, user_id: i64) -> Result<Option<String>>;

    async fn set_user_language(&self, user_id: i64, tag: &str) -> Result<()>;
}

#[derive(Default)]
struct UserRow {
    user: Option<MenuUser>,
    state: Option<String>,
}

/// Process-local user repository
#[derive(Default)]
pub struct InMemoryUserRepository {
    rows: RwLock<HashMap<i64, UserRow>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository<MenuUser> for InMemoryUserRepository {
    async fn find(&self, user_id: i64) -> Result<Option<MenuUser>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&user_id).and_then(|row| row.user.clone()))
    }

    async fn create(&self, sender: &Sender) -> Result<MenuUser> {
        let user = MenuUser::from_sender(sender);
        let mut rows = self.rows.write().await;
        rows.entry(sender.id).or_default().user = Some(user.clone());
        Ok(user)
    }

    async fn get_state(&self, user_id: i64) -> Result<Option<String>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&user_id).and_then(|row| row.state.clone()))
    }

    async fn set_state(&self, user_id: i64, state: &str) -> Result<()> {
        let mut rows = self.rows.write().await;
        rows.entry(user_id).or_default().state = Some(state.to_string());
        Ok(())
    }
}

/// Process-local language repository
#[derive(Default)]
pub struct InMemoryLanguageRepository {
    languages: RwLock<HashMap<i64, String>>,
}

impl InMemoryLanguageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LanguageRepository for InMemoryLanguageRepository {
    async fn get_user_language(&self, user_id: i64) -> Result<Option<String>> {
        Ok(self.languages.read().await.get(&user_id).cloned())
    }

    async fn set_user_language(&self, user_id: i64, tag: &str) -> Result<()> {
        self.languages
            .write()
            .await
            .insert(user_id, tag.to_string());
        Ok(())
    }
}

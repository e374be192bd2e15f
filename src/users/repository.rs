use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{NewUser, UserModel};
use crate::shared::AppError;

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository {
    async fn create_user(&self, new_user: NewUser) -> Result<UserModel, AppError>;
    async fn get_by_id(&self, id: i64) -> Result<Option<UserModel>, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError>;
    /// Updates username, email and (when `image_file` is `Some`) the stored
    /// picture reference. `None` leaves the picture untouched.
    async fn update_account(
        &self,
        id: i64,
        username: &str,
        email: &str,
        image_file: Option<&str>,
    ) -> Result<UserModel, AppError>;
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError>;
}

/// In-memory implementation of UserRepository for development and testing
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<i64, UserModel>>,
    next_id: AtomicI64,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Returns the current number of users in the repository
    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, new_user))]
    async fn create_user(&self, new_user: NewUser) -> Result<UserModel, AppError> {
        let mut users = self.users.lock().unwrap();

        // Mirror the database unique constraints.
        if users.values().any(|u| u.username == new_user.username) {
            return Err(AppError::Database("username already taken".to_string()));
        }
        if users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::Database("email already registered".to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let user = UserModel {
            id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            image_file: new_user.image_file,
            created_at: Utc::now(),
        };
        users.insert(id, user.clone());

        debug!(user_id = id, username = %user.username, "User created in memory");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> Result<Option<UserModel>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.get(&id).cloned())
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    #[instrument(skip(self))]
    async fn update_account(
        &self,
        id: i64,
        username: &str,
        email: &str,
        image_file: Option<&str>,
    ) -> Result<UserModel, AppError> {
        let mut users = self.users.lock().unwrap();

        let Some(user) = users.get_mut(&id) else {
            return Err(AppError::NotFound("User".to_string()));
        };
        user.username = username.to_string();
        user.email = email.to_string();
        if let Some(image_file) = image_file {
            user.image_file = image_file.to_string();
        }

        Ok(user.clone())
    }

    #[instrument(skip(self, password_hash))]
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();

        let Some(user) = users.get_mut(&id) else {
            return Err(AppError::NotFound("User".to_string()));
        };
        user.password_hash = password_hash.to_string();
        Ok(())
    }
}

/// PostgreSQL implementation of user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> UserModel {
    UserModel {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        image_file: row.get("image_file"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, new_user))]
    async fn create_user(&self, new_user: NewUser) -> Result<UserModel, AppError> {
        debug!(username = %new_user.username, "Creating user in database");

        let row = sqlx::query(
            "INSERT INTO users (username, email, password_hash, image_file) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, username, email, password_hash, image_file, created_at",
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.image_file)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create user in database");
            AppError::Database(e.to_string())
        })?;

        Ok(user_from_row(&row))
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> Result<Option<UserModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, image_file, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = id, "Failed to fetch user from database");
            AppError::Database(e.to_string())
        })?;

        Ok(row.as_ref().map(user_from_row))
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, image_file, created_at \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, username = %username, "Failed to fetch user from database");
            AppError::Database(e.to_string())
        })?;

        Ok(row.as_ref().map(user_from_row))
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, image_file, created_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch user by email from database");
            AppError::Database(e.to_string())
        })?;

        Ok(row.as_ref().map(user_from_row))
    }

    #[instrument(skip(self))]
    async fn update_account(
        &self,
        id: i64,
        username: &str,
        email: &str,
        image_file: Option<&str>,
    ) -> Result<UserModel, AppError> {
        let row = sqlx::query(
            "UPDATE users SET username = $2, email = $3, \
             image_file = COALESCE($4, image_file) \
             WHERE id = $1 \
             RETURNING id, username, email, password_hash, image_file, created_at",
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .bind(image_file)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = id, "Failed to update user in database");
            AppError::Database(e.to_string())
        })?;

        row.as_ref()
            .map(user_from_row)
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    #[instrument(skip(self, password_hash))]
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, user_id = id, "Failed to update password in database");
                AppError::Database(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    fn alice() -> NewUser {
        NewUser::new(
            "alice".to_string(),
            "alice@example.com".to_string(),
            "$argon2id$hash".to_string(),
        )
    }

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let repo = InMemoryUserRepository::new();

        let created = repo.create_user(alice()).await.unwrap();
        assert!(created.id > 0);

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        let by_name = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        let by_email = repo
            .find_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.create_user(alice()).await.unwrap();

        let mut duplicate = alice();
        duplicate.email = "other@example.com".to_string();
        let result = repo.create_user(duplicate).await;

        assert!(matches!(result, Err(AppError::Database(_))));
        assert_eq!(repo.user_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.create_user(alice()).await.unwrap();

        let mut duplicate = alice();
        duplicate.username = "alice2".to_string();
        let result = repo.create_user(duplicate).await;

        assert!(matches!(result, Err(AppError::Database(_))));
        assert_eq!(repo.user_count(), 1);
    }

    #[tokio::test]
    async fn test_update_account_keeps_picture_when_none() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create_user(alice()).await.unwrap();

        repo.update_account(user.id, "alice", "alice@example.com", Some("abc123.png"))
            .await
            .unwrap();

        let updated = repo
            .update_account(user.id, "alice-renamed", "new@example.com", None)
            .await
            .unwrap();

        assert_eq!(updated.username, "alice-renamed");
        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.image_file, "abc123.png");
    }

    #[tokio::test]
    async fn test_update_password() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create_user(alice()).await.unwrap();

        repo.update_password(user.id, "$argon2id$newhash")
            .await
            .unwrap();

        let reloaded = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.password_hash, "$argon2id$newhash");
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repo = InMemoryUserRepository::new();

        let result = repo.update_account(99, "ghost", "ghost@example.com", None).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let result = repo.update_password(99, "$hash").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}

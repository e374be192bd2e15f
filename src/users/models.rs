use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Filename given to accounts that never uploaded a picture
pub const DEFAULT_PICTURE: &str = "default.jpg";

/// Database model for the users table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserModel {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// argon2 PHC string; never leaves the server
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Filename of the resized profile picture under the picture directory
    pub image_file: String,
    pub created_at: DateTime<Utc>,
}

/// Fields required to insert a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub image_file: String,
}

impl NewUser {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            username,
            email,
            password_hash,
            image_file: DEFAULT_PICTURE.to_string(),
        }
    }
}

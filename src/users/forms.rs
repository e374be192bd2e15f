use crate::auth::forms::{validate_email, validate_username};

/// Raw bytes of an uploaded profile picture plus the client-side filename
/// (used only for its extension).
#[derive(Debug, Clone)]
pub struct UploadedPicture {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Account settings form, parsed from the multipart body by the handler.
#[derive(Debug, Clone, Default)]
pub struct AccountForm {
    pub username: String,
    pub email: String,
    pub picture: Option<UploadedPicture>,
}

impl AccountForm {
    /// Field-level validation; uniqueness is checked by the service.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        validate_username(&self.username, &mut errors);
        validate_email(&self.email, &mut errors);
        errors
    }
}

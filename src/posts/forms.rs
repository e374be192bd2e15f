use serde::Deserialize;

/// Maximum title length, matching the column width
pub const MAX_TITLE_LEN: usize = 100;

/// Form for creating or editing a post
#[derive(Debug, Clone, Deserialize)]
pub struct PostForm {
    pub title: String,
    pub body: String,
}

impl PostForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push("A title is required.".to_string());
        } else if self.title.len() > MAX_TITLE_LEN {
            errors.push(format!("Titles are limited to {MAX_TITLE_LEN} characters."));
        }
        if self.body.trim().is_empty() {
            errors.push("The post body cannot be empty.".to_string());
        }
        errors
    }
}

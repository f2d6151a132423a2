//! Profile-edit collaborator.
//!
//! Marshals the profile form into the multipart body `PUT /users/{id}`
//! expects. Form field names are the backend's: `username`, `email`,
//! optional `password`, optional `image` file part.

use reqwest::multipart::{Form, Part};

/// Image file attached to a profile update.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Editable profile fields.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub user_name: String,
    pub email: String,
    /// New password; left out of the form when unset.
    pub password: Option<String>,
    /// Replacement profile image; left out of the form when unset.
    pub image: Option<ImageUpload>,
}

impl ProfileUpdate {
    /// Build the multipart form for `PUT /users/{id}`.
    pub(crate) fn into_form(self) -> Form {
        let mut form = Form::new()
            .text("username", self.user_name)
            .text("email", self.email);

        if let Some(password) = self.password {
            form = form.text("password", password);
        }
        if let Some(image) = self.image {
            form = form.part("image", Part::bytes(image.bytes).file_name(image.file_name));
        }

        form
    }
}

/// Up-to-two-letter initials for avatar-style rendering of a display name.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(|c| c.to_uppercase())
        .collect()
}

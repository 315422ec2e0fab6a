use chrono::Utc;

use super::UserError;
use crate::actor_framework::Entity;
use crate::domain::{normalize_email, User, UserCreate, UserPatch};

impl Entity for User {
    type Id = String;
    type CreateParams = UserCreate;
    type Patch = UserPatch;
    type Action = ();
    type ActionResult = ();
    type Error = UserError;

    const KIND: &'static str = "user";

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new User from registration parameters.
    ///
    /// # Notes
    /// The email is stored in its normalized form so that uniqueness is
    /// case-insensitive.
    fn from_create_params(id: String, params: UserCreate) -> Result<Self, UserError> {
        Ok(Self {
            id,
            name: params.name.trim().to_string(),
            email: normalize_email(&params.email),
            role: params.role,
            created_at: Utc::now(),
        })
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.email.clone())
    }

    /// Updates the user's profile information.
    ///
    /// # Fields Updated
    /// - `name`: User's display name
    /// - `email`: User's email address (normalized)
    fn on_update(&mut self, patch: UserPatch) -> Result<(), UserError> {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = patch.email {
            self.email = normalize_email(&email);
        }
        Ok(())
    }

    fn handle_action(&mut self, _action: ()) -> Result<(), UserError> {
        Ok(())
    }
}

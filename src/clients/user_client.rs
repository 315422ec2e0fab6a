use tracing::{debug, info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::domain::{normalize_email, User, UserCreate, UserPatch};
use crate::user_actor::UserError;
use crate::validation::Validate;

/// Client for interacting with the User actor.
#[derive(Clone)]
pub struct UserClient {
    inner: ResourceClient<User>,
}

impl_basic_client!(UserClient, User, UserError, user, users);

impl UserClient {
    /// Registers a user. The email is unique regardless of case.
    #[instrument(skip(self, params), fields(email = %params.email))]
    pub async fn register(&self, params: UserCreate) -> Result<User, UserError> {
        params.validate()?;
        let id = self.inner.create(params).await.inspect_err(|e| {
            warn!(error = %e, "Registration rejected");
        })?;
        info!(user_id = %id, "User registered");
        self.inner.fetch(id).await
    }

    #[instrument(skip(self))]
    pub async fn update_user(&self, id: String, patch: UserPatch) -> Result<User, UserError> {
        debug!("Sending request");
        patch.validate()?;
        self.inner.update(id, patch).await
    }

    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let email = normalize_email(email);
        let mut found = self.inner.list(move |user| user.email == email).await?;
        Ok(found.pop())
    }
}

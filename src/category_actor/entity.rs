use super::CategoryError;
use crate::actor_framework::Entity;
use crate::domain::{Category, CategoryCreate, CategoryPatch};

impl Entity for Category {
    type Id = String;
    type CreateParams = CategoryCreate;
    type Patch = CategoryPatch;
    type Action = ();
    type ActionResult = ();
    type Error = CategoryError;

    const KIND: &'static str = "category";

    fn id(&self) -> &String {
        &self.id
    }

    fn from_create_params(id: String, params: CategoryCreate) -> Result<Self, CategoryError> {
        Ok(Self {
            id,
            name: params.name.trim().to_string(),
            slug: params.slug,
            description: params.description,
        })
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.slug.clone())
    }

    fn on_update(&mut self, patch: CategoryPatch) -> Result<(), CategoryError> {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(slug) = patch.slug {
            self.slug = slug;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        Ok(())
    }

    fn handle_action(&mut self, _action: ()) -> Result<(), CategoryError> {
        Ok(())
    }
}

use std::sync::Arc;

use super::domain::{Category, CategoryId};
use super::error::WorkflowError;
use super::store::{MarketplaceStore, StoreError};

/// Reference-data registry for listing categories.
pub struct CategoryRegistry<S> {
    store: Arc<S>,
}

impl<S> Clone for CategoryRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: MarketplaceStore> CategoryRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<Category, WorkflowError> {
        let category = Category {
            id: CategoryId::new(),
            name,
            description,
        };
        self.store
            .insert_category(category.clone())
            .map_err(|err| match err {
                StoreError::Conflict => WorkflowError::conflict("similar category exists"),
                other => WorkflowError::Store(other),
            })?;
        Ok(category)
    }

    pub fn rename(&self, id: CategoryId, name: String) -> Result<(), WorkflowError> {
        self.store.rename_category(id, name).map_err(|err| match err {
            StoreError::NotFound => WorkflowError::NotFound("category"),
            other => WorkflowError::Store(other),
        })
    }

    /// A category referenced by any listing cannot be deleted; the guard
    /// lives here, not in the store.
    pub fn delete(&self, id: CategoryId) -> Result<(), WorkflowError> {
        if self.store.category(id)?.is_none() {
            return Err(WorkflowError::NotFound("category"));
        }
        if self.store.category_in_use(id)? {
            return Err(WorkflowError::conflict(
                "category is referenced by listings",
            ));
        }
        self.store.delete_category(id).map_err(|err| match err {
            StoreError::NotFound => WorkflowError::NotFound("category"),
            other => WorkflowError::Store(other),
        })
    }

    pub fn get(&self, id: CategoryId) -> Result<Category, WorkflowError> {
        self.store
            .category(id)?
            .ok_or(WorkflowError::NotFound("category"))
    }

    pub fn list(&self) -> Result<Vec<Category>, WorkflowError> {
        Ok(self.store.categories()?)
    }
}

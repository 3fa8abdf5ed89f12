use std::sync::Arc;

use validator::Validate;

use crate::{
    error::AppError,
    models::category::{Category, CreateCategoryRequest, NewCategory},
    repository::{CategoryRepository, RepoError},
    services::SLUG_WRITE_ATTEMPTS,
    utils::slug,
};

#[derive(Clone)]
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.repo.list().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Category, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    /// Creates a category. A lost race on the slug is re-probed, like posts.
    pub async fn create(&self, req: CreateCategoryRequest) -> Result<Category, AppError> {
        let req = CreateCategoryRequest {
            name: req.name.map(|n| n.trim().to_string()),
            description: req
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        };
        let name = req
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::invalid_field("name", "Category name is required"))?;
        req.validate()?;

        let base = slug::base_slug(&name, "category");
        let repo = &self.repo;

        let mut attempt = 1;
        let category = loop {
            let slug = slug::resolve_unique(&base, |candidate| async move {
                repo.slug_exists(&candidate).await
            })
            .await?;
            let new_category = NewCategory {
                name: name.clone(),
                slug,
                description: req.description.clone(),
            };
            match self.repo.insert(new_category).await {
                Ok(category) => break category,
                Err(RepoError::UniqueViolation("slug")) if attempt < SLUG_WRITE_ATTEMPTS => {
                    tracing::warn!(base = %base, attempt, "category slug taken concurrently, retrying");
                    attempt += 1;
                }
                Err(RepoError::UniqueViolation("name")) => {
                    return Err(AppError::Conflict(format!(
                        "Category '{}' already exists",
                        name
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!(category_id = category.id, name = %category.name, "category created");
        Ok(category)
    }
}

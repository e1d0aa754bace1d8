use std::sync::Arc;

use crate::{
    entities::experience::{ExperienceDraft, ExperienceResponse, ExperienceType, NewExperienceRequest},
    errors::AppError,
    repositories::experience::{ExperienceFilter, ExperienceRepository},
};

pub struct ExperienceHandler<R = dyn ExperienceRepository>
where
    R: ExperienceRepository + ?Sized,
{
    pub repo: Arc<R>,
}

impl<R> ExperienceHandler<R>
where
    R: ExperienceRepository + ?Sized,
{
    pub fn new(repo: Arc<R>) -> Self {
        ExperienceHandler { repo }
    }

    pub async fn list(&self, filter: ExperienceFilter) -> Result<Vec<ExperienceResponse>, AppError> {
        let experiences = self.repo.list(&filter).await?;
        Ok(experiences.into_iter().map(|e| e.into_response()).collect())
    }

    pub async fn list_by_type(&self, kind: &str) -> Result<Vec<ExperienceResponse>, AppError> {
        let kind = kind
            .parse::<ExperienceType>()
            .map_err(|e| AppError::validation("type", format!("Invalid experience type. {}", e)))?;
        self.list(ExperienceFilter::Kinds(vec![kind])).await
    }

    pub async fn create(&self, request: NewExperienceRequest) -> Result<ExperienceResponse, AppError> {
        let draft = ExperienceDraft::try_from(request)?;
        let experience = self.repo.create(&draft).await?;

        tracing::info!(experience_id = %experience.id, "Experience created");
        Ok(experience.into_response())
    }
}

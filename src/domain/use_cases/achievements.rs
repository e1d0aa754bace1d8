use std::sync::Arc;

use crate::{
    entities::achievement::{
        recent_limit, AchievementDraft, AchievementResponse, AchievementType, NewAchievementRequest,
    },
    errors::AppError,
    repositories::achievement::{AchievementFilter, AchievementRepository},
    utils::valid_uuid::valid_uuid,
};

pub struct AchievementHandler<R = dyn AchievementRepository>
where
    R: AchievementRepository + ?Sized,
{
    pub repo: Arc<R>,
}

impl<R> AchievementHandler<R>
where
    R: AchievementRepository + ?Sized,
{
    pub fn new(repo: Arc<R>) -> Self {
        AchievementHandler { repo }
    }

    pub async fn list(&self, filter: AchievementFilter) -> Result<Vec<AchievementResponse>, AppError> {
        let achievements = self.repo.list(&filter).await?;
        Ok(achievements.into_iter().map(|a| a.into_response()).collect())
    }

    pub async fn list_by_type(&self, kind: &str) -> Result<Vec<AchievementResponse>, AppError> {
        let kind = kind
            .parse::<AchievementType>()
            .map_err(|e| AppError::validation("type", format!("Invalid achievement type. {}", e)))?;
        self.list(AchievementFilter::Kinds(vec![kind])).await
    }

    pub async fn recent(&self, limit: Option<i64>) -> Result<Vec<AchievementResponse>, AppError> {
        self.list(AchievementFilter::Recent(recent_limit(limit))).await
    }

    pub async fn create(&self, request: NewAchievementRequest) -> Result<AchievementResponse, AppError> {
        let draft = AchievementDraft::try_from(request)?;
        let achievement = self.repo.create(&draft).await?;

        tracing::info!(achievement_id = %achievement.id, "Achievement created");
        Ok(achievement.into_response())
    }

    pub async fn toggle_featured(&self, id: &str) -> Result<AchievementResponse, AppError> {
        let id = valid_uuid(id)?;
        self.repo
            .toggle_featured(&id)
            .await?
            .map(|a| a.into_response())
            .ok_or_else(|| AppError::NotFound("Achievement not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::achievement::MockAchievementRepository;

    #[tokio::test]
    async fn recent_limit_is_clamped() {
        let mut repo = MockAchievementRepository::new();
        repo.expect_list()
            .withf(|filter| *filter == AchievementFilter::Recent(50))
            .times(1)
            .returning(|_| Ok(vec![]));

        let handler = AchievementHandler::new(Arc::new(repo));
        handler.recent(Some(10_000)).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_type_is_rejected() {
        let mut repo = MockAchievementRepository::new();
        repo.expect_list().never();

        let result = AchievementHandler::new(Arc::new(repo)).list_by_type("trophy").await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn toggling_a_missing_achievement_is_not_found() {
        let mut repo = MockAchievementRepository::new();
        repo.expect_toggle_featured().returning(|_| Ok(None));

        let result = AchievementHandler::new(Arc::new(repo))
            .toggle_featured("5f0c6a4e-3d1b-4a62-9a55-0c1f2b3e4d5a")
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}

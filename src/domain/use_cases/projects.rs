use std::sync::Arc;

use crate::{
    entities::{
        pagination::PaginatedResponse,
        project::{
            group_by_category, CategoryGroup, LikeResponse, NewProjectRequest, ProjectResponse,
            ProjectStats, UpdateProjectRequest,
        },
    },
    errors::AppError,
    query::{ProjectListParams, ProjectQuery, QueryEcho},
    repositories::project::ProjectRepository,
    utils::valid_uuid::valid_uuid,
};

const MAX_SLUG_LENGTH: usize = 100;

fn not_found() -> AppError {
    AppError::NotFound("Project not found".to_string())
}

pub struct ProjectHandler<R = dyn ProjectRepository>
where
    R: ProjectRepository + ?Sized,
{
    pub repo: Arc<R>,
}

impl<R> ProjectHandler<R>
where
    R: ProjectRepository + ?Sized,
{
    pub fn new(repo: Arc<R>) -> Self {
        ProjectHandler { repo }
    }

    /// Filtered, sorted and paginated listing of active projects.
    pub async fn list(
        &self,
        params: ProjectListParams,
    ) -> Result<PaginatedResponse<ProjectResponse, QueryEcho>, AppError> {
        let query = ProjectQuery::try_from(params)?;
        let page = self.repo.list(&query).await?;

        Ok(PaginatedResponse::new(
            page.map(|project| project.into_response()),
            query.page,
            query.echo(),
        ))
    }

    pub async fn featured(&self) -> Result<Vec<ProjectResponse>, AppError> {
        let page = self.repo.list(&ProjectQuery::featured()).await?;
        Ok(page.items.into_iter().map(|p| p.into_response()).collect())
    }

    pub async fn categories(&self) -> Result<Vec<CategoryGroup>, AppError> {
        let projects = self.repo.list_active().await?;
        Ok(group_by_category(projects))
    }

    pub async fn stats(&self) -> Result<ProjectStats, AppError> {
        self.repo.stats().await
    }

    /// Returns the project with its view counter already incremented.
    pub async fn view_by_id(&self, id: &str) -> Result<ProjectResponse, AppError> {
        let id = valid_uuid(id)?;
        self.repo
            .record_view_by_id(&id)
            .await?
            .map(|p| p.into_response())
            .ok_or_else(not_found)
    }

    pub async fn view_by_slug(&self, slug: &str) -> Result<ProjectResponse, AppError> {
        let slug = slug.trim();
        if slug.is_empty() || slug.chars().count() > MAX_SLUG_LENGTH {
            return Err(AppError::validation("slug", "Slug must be between 1 and 100 characters"));
        }
        self.repo
            .record_view_by_slug(slug)
            .await?
            .map(|p| p.into_response())
            .ok_or_else(not_found)
    }

    pub async fn like(&self, id: &str) -> Result<LikeResponse, AppError> {
        let id = valid_uuid(id)?;
        let likes = self.repo.like(&id).await?.ok_or_else(not_found)?;
        Ok(LikeResponse { likes })
    }

    pub async fn create(&self, request: NewProjectRequest, author: &str) -> Result<ProjectResponse, AppError> {
        let draft = request.into_draft(author)?;
        let project = self.repo.create(&draft).await?;

        tracing::info!(project_id = %project.id, slug = %project.slug, "Project created");
        Ok(project.into_response())
    }

    /// Applies a partial update. Absent fields keep their value, `null`
    /// clears optional ones.
    pub async fn update(&self, id: &str, patch: UpdateProjectRequest) -> Result<ProjectResponse, AppError> {
        let id = valid_uuid(id)?;
        if patch.is_empty() {
            return Err(AppError::validation("body", "At least one field must be provided"));
        }

        let current = self.repo.get_by_id(&id).await?.ok_or_else(not_found)?;
        let draft = patch.apply_to(current.to_draft())?;

        let project = self.repo.update(&id, &draft).await?.ok_or_else(not_found)?;
        tracing::info!(project_id = %project.id, "Project updated");
        Ok(project.into_response())
    }

    pub async fn toggle_featured(&self, id: &str) -> Result<ProjectResponse, AppError> {
        let id = valid_uuid(id)?;
        let project = self.repo.toggle_featured(&id).await?.ok_or_else(not_found)?;

        tracing::info!(project_id = %project.id, featured = project.featured, "Project featured flag toggled");
        Ok(project.into_response())
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let id = valid_uuid(id)?;
        if !self.repo.soft_delete(&id).await? {
            return Err(not_found());
        }
        tracing::info!(project_id = %id, "Project deactivated");
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        self.repo.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::pagination::Page;
    use crate::entities::project::tests::sample_request;
    use crate::entities::project::Project;
    use crate::repositories::project::MockProjectRepository;
    use chrono::Utc;
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn project_from(request: NewProjectRequest) -> Project {
        let draft = request.into_draft("Owner").unwrap();
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            title: draft.title,
            slug: draft.slug,
            description: draft.description,
            long_description: draft.long_description,
            technologies: draft.technologies,
            category: draft.category,
            status: draft.status,
            priority: draft.priority,
            featured: draft.featured,
            github_url: None,
            live_url: None,
            demo_url: None,
            image: None,
            icon: draft.icon,
            start_date: None,
            end_date: None,
            team_size: draft.team_size,
            my_role: None,
            challenges: vec![],
            solutions: vec![],
            learnings: vec![],
            features: vec![],
            tags: draft.tags,
            metrics: Default::default(),
            seo_overrides: Default::default(),
            is_active: true,
            created_by: draft.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    fn handler(repo: MockProjectRepository) -> ProjectHandler<MockProjectRepository> {
        ProjectHandler::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn invalid_list_params_never_reach_storage() {
        let mut repo = MockProjectRepository::new();
        repo.expect_list().never();

        let params = ProjectListParams { limit: Some("500".into()), ..Default::default() };
        let result = handler(repo).list(params).await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn list_shapes_the_envelope() {
        let mut repo = MockProjectRepository::new();
        repo.expect_list().times(1).returning(|_| {
            Ok(Page { items: vec![project_from(sample_request("Compiler"))], total: 11 })
        });

        let params = ProjectListParams { page: Some("2".into()), limit: Some("10".into()), ..Default::default() };
        let response = handler(repo).list(params).await.unwrap();

        assert_eq!(response.pagination.total_pages, 2);
        assert!(!response.pagination.has_next_page);
        assert!(response.pagination.has_prev_page);
        assert_eq!(response.meta.count, 1);
    }

    #[tokio::test]
    async fn malformed_id_is_rejected_before_lookup() {
        let mut repo = MockProjectRepository::new();
        repo.expect_record_view_by_id().never();

        let result = handler(repo).view_by_id("12345").await;
        assert!(matches!(result, Err(AppError::InvalidId)));
    }

    #[tokio::test]
    async fn missing_project_is_not_found() {
        let id = Uuid::new_v4();
        let mut repo = MockProjectRepository::new();
        repo.expect_like().with(eq(id)).returning(|_| Ok(None));

        let result = handler(repo).like(&id.to_string()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn oversized_slug_is_a_validation_error() {
        let mut repo = MockProjectRepository::new();
        repo.expect_record_view_by_slug().never();

        let result = handler(repo).view_by_slug(&"a".repeat(101)).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn empty_patch_is_rejected() {
        let mut repo = MockProjectRepository::new();
        repo.expect_get_by_id().never();

        let result = handler(repo)
            .update(&Uuid::new_v4().to_string(), UpdateProjectRequest::default())
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn update_merges_patch_onto_current_state() {
        let existing = project_from(sample_request("Old Title"));
        let id = existing.id;
        let mut repo = MockProjectRepository::new();
        repo.expect_get_by_id().returning(move |_| Ok(Some(existing.clone())));
        repo.expect_update()
            .withf(|_, draft| draft.title == "New Title" && draft.slug == "new-title")
            .returning(|_, draft| {
                let mut project = project_from(sample_request(&draft.title));
                project.slug = draft.slug.clone();
                Ok(Some(project))
            });

        let patch: UpdateProjectRequest = serde_json::from_value(serde_json::json!({"title": "New Title"})).unwrap();
        let response = handler(repo).update(&id.to_string(), patch).await.unwrap();

        assert_eq!(response.project.slug, "new-title");
    }

    #[tokio::test]
    async fn delete_of_unknown_project_is_not_found() {
        let mut repo = MockProjectRepository::new();
        repo.expect_soft_delete().returning(|_| Ok(false));

        let result = handler(repo).delete(&Uuid::new_v4().to_string()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}

use async_trait::async_trait;
use uuid::Uuid;
use sqlx::{self, PgPool, Postgres, QueryBuilder};

#[cfg(test)]
use mockall::automock;

use crate::{
    entities::{
        pagination::Page,
        project::{LabelCount, Project, ProjectDraft, ProjectOverview, ProjectRow, ProjectStats, ProjectStatus},
    },
    errors::AppError,
    query::ProjectQuery,
    repositories::sqlx_repo::{begin_snapshot, SqlxProjectRepo},
};

pub const PROJECT_COLUMNS: &str = "id, title, slug, description, long_description, technologies, \
    category, status, priority, featured, github_url, live_url, demo_url, image, icon, \
    start_date, end_date, team_size, my_role, challenges, solutions, learnings, features, tags, \
    views, likes, stars, downloads, seo_meta_title, seo_meta_description, seo_keywords, \
    is_active, created_by, created_at, updated_at";

const TOP_TECHNOLOGIES: i64 = 10;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Count and page for `query`, read from one snapshot.
    async fn list(&self, query: &ProjectQuery) -> Result<Page<Project>, AppError>;
    /// Active projects ordered by priority, newest first.
    async fn list_active(&self) -> Result<Vec<Project>, AppError>;
    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Project>, AppError>;
    /// Atomically bumps `views` on an active project and returns the new state.
    async fn record_view_by_id(&self, id: &Uuid) -> Result<Option<Project>, AppError>;
    async fn record_view_by_slug(&self, slug: &str) -> Result<Option<Project>, AppError>;
    /// Atomically bumps `likes` and returns the new total.
    async fn like(&self, id: &Uuid) -> Result<Option<i64>, AppError>;
    async fn create(&self, draft: &ProjectDraft) -> Result<Project, AppError>;
    async fn update(&self, id: &Uuid, draft: &ProjectDraft) -> Result<Option<Project>, AppError>;
    async fn toggle_featured(&self, id: &Uuid) -> Result<Option<Project>, AppError>;
    /// Marks a project inactive. Returns false when nothing matched.
    async fn soft_delete(&self, id: &Uuid) -> Result<bool, AppError>;
    async fn stats(&self) -> Result<ProjectStats, AppError>;
    async fn ping(&self) -> Result<(), AppError>;
}

impl SqlxProjectRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxProjectRepo { pool }
    }
}

/// Appends the shared predicate of the count and page queries.
fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a ProjectQuery) {
    builder.push(" WHERE is_active = TRUE");
    if let Some(category) = query.category {
        builder.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(featured) = query.featured {
        builder.push(" AND featured = ").push_bind(featured);
    }
    if let Some(search) = &query.search {
        builder
            .push(" AND search_vector @@ plainto_tsquery('english', ")
            .push_bind(search.as_str())
            .push(")");
    }
}

fn push_order<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a ProjectQuery) {
    if let Some(search) = &query.search {
        builder
            .push(" ORDER BY ts_rank(search_vector, plainto_tsquery('english', ")
            .push_bind(search.as_str())
            .push(")) DESC, priority DESC");
        return;
    }

    builder.push(" ORDER BY ");
    for (i, key) in query.sort.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder
            .push(key.field.column())
            .push(if key.descending { " DESC" } else { " ASC" });
    }
    builder.push(", id ASC");
}

pub(crate) fn count_query(query: &ProjectQuery) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM projects");
    push_filters(&mut builder, query);
    builder
}

pub(crate) fn page_query(query: &ProjectQuery) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {PROJECT_COLUMNS} FROM projects"));
    push_filters(&mut builder, query);
    push_order(&mut builder, query);
    builder.push(" LIMIT ").push_bind(query.page.limit as i64);
    builder.push(" OFFSET ").push_bind(query.page.offset());
    builder
}

fn into_projects(rows: Vec<ProjectRow>) -> Result<Vec<Project>, AppError> {
    rows.into_iter().map(Project::try_from).collect()
}

fn slug_conflict(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.constraint() == Some("projects_slug_key") {
            return AppError::Conflict("A project with this title already exists".into());
        }
    }
    AppError::from(e)
}

#[async_trait]
impl ProjectRepository for SqlxProjectRepo {
    async fn list(&self, query: &ProjectQuery) -> Result<Page<Project>, AppError> {
        let mut tx = begin_snapshot(&self.pool).await?;

        let total: i64 = count_query(query)
            .build_query_scalar()
            .fetch_one(&mut *tx)
            .await?;

        let rows: Vec<ProjectRow> = page_query(query)
            .build_query_as()
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Page { items: into_projects(rows)?, total })
    }

    async fn list_active(&self) -> Result<Vec<Project>, AppError> {
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE is_active = TRUE \
             ORDER BY priority DESC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        into_projects(rows)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Project>, AppError> {
        sqlx::query_as::<_, ProjectRow>(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Project::try_from)
            .transpose()
    }

    async fn record_view_by_id(&self, id: &Uuid) -> Result<Option<Project>, AppError> {
        sqlx::query_as::<_, ProjectRow>(&format!(
            "UPDATE projects SET views = views + 1 \
             WHERE id = $1 AND is_active = TRUE \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Project::try_from)
        .transpose()
    }

    async fn record_view_by_slug(&self, slug: &str) -> Result<Option<Project>, AppError> {
        sqlx::query_as::<_, ProjectRow>(&format!(
            "UPDATE projects SET views = views + 1 \
             WHERE slug = $1 AND is_active = TRUE \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .map(Project::try_from)
        .transpose()
    }

    async fn like(&self, id: &Uuid) -> Result<Option<i64>, AppError> {
        let likes = sqlx::query_scalar::<_, i64>(
            "UPDATE projects SET likes = likes + 1 WHERE id = $1 AND is_active = TRUE RETURNING likes",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(likes)
    }

    async fn create(&self, draft: &ProjectDraft) -> Result<Project, AppError> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            r#"
            INSERT INTO projects (
                title, slug, description, long_description, technologies, technologies_text,
                category, status, priority, featured, github_url, live_url, demo_url, image, icon,
                start_date, end_date, team_size, my_role, challenges, solutions, learnings,
                features, tags, seo_meta_title, seo_meta_description, seo_keywords, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(&draft.title)
        .bind(&draft.slug)
        .bind(&draft.description)
        .bind(&draft.long_description)
        .bind(&draft.technologies)
        .bind(draft.technologies.join(" "))
        .bind(draft.category.as_str())
        .bind(draft.status.as_str())
        .bind(draft.priority)
        .bind(draft.featured)
        .bind(&draft.github_url)
        .bind(&draft.live_url)
        .bind(&draft.demo_url)
        .bind(&draft.image)
        .bind(&draft.icon)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(draft.team_size)
        .bind(&draft.my_role)
        .bind(&draft.challenges)
        .bind(&draft.solutions)
        .bind(&draft.learnings)
        .bind(&draft.features)
        .bind(&draft.tags)
        .bind(&draft.seo_meta_title)
        .bind(&draft.seo_meta_description)
        .bind(&draft.seo_keywords)
        .bind(&draft.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(slug_conflict)?;

        Project::try_from(row)
    }

    async fn update(&self, id: &Uuid, draft: &ProjectDraft) -> Result<Option<Project>, AppError> {
        sqlx::query_as::<_, ProjectRow>(&format!(
            r#"
            UPDATE projects SET
                title = $2, slug = $3, description = $4, long_description = $5,
                technologies = $6, technologies_text = $7, category = $8, status = $9,
                priority = $10, featured = $11, github_url = $12, live_url = $13,
                demo_url = $14, image = $15, icon = $16, start_date = $17, end_date = $18,
                team_size = $19, my_role = $20, challenges = $21, solutions = $22,
                learnings = $23, features = $24, tags = $25, seo_meta_title = $26,
                seo_meta_description = $27, seo_keywords = $28, updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.slug)
        .bind(&draft.description)
        .bind(&draft.long_description)
        .bind(&draft.technologies)
        .bind(draft.technologies.join(" "))
        .bind(draft.category.as_str())
        .bind(draft.status.as_str())
        .bind(draft.priority)
        .bind(draft.featured)
        .bind(&draft.github_url)
        .bind(&draft.live_url)
        .bind(&draft.demo_url)
        .bind(&draft.image)
        .bind(&draft.icon)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(draft.team_size)
        .bind(&draft.my_role)
        .bind(&draft.challenges)
        .bind(&draft.solutions)
        .bind(&draft.learnings)
        .bind(&draft.features)
        .bind(&draft.tags)
        .bind(&draft.seo_meta_title)
        .bind(&draft.seo_meta_description)
        .bind(&draft.seo_keywords)
        .fetch_optional(&self.pool)
        .await
        .map_err(slug_conflict)?
        .map(Project::try_from)
        .transpose()
    }

    async fn toggle_featured(&self, id: &Uuid) -> Result<Option<Project>, AppError> {
        sqlx::query_as::<_, ProjectRow>(&format!(
            "UPDATE projects SET featured = NOT featured, updated_at = NOW() \
             WHERE id = $1 AND is_active = TRUE \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Project::try_from)
        .transpose()
    }

    async fn soft_delete(&self, id: &Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE projects SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> Result<ProjectStats, AppError> {
        let mut tx = begin_snapshot(&self.pool).await?;

        let (total, featured, completed, in_progress, views, likes, avg_priority): (
            i64, i64, i64, i64, i64, i64, Option<f64>,
        ) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE featured),
                COUNT(*) FILTER (WHERE status = $1),
                COUNT(*) FILTER (WHERE status = $2),
                COALESCE(SUM(views), 0)::BIGINT,
                COALESCE(SUM(likes), 0)::BIGINT,
                AVG(priority)::FLOAT8
            FROM projects
            WHERE is_active = TRUE
            "#,
        )
        .bind(ProjectStatus::Completed.as_str())
        .bind(ProjectStatus::InProgress.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let categories = sqlx::query_as::<_, LabelCount>(
            "SELECT category AS label, COUNT(*) AS count FROM projects \
             WHERE is_active = TRUE GROUP BY category ORDER BY count DESC, label ASC",
        )
        .fetch_all(&mut *tx)
        .await?;

        let top_technologies = sqlx::query_as::<_, LabelCount>(
            "SELECT tech AS label, COUNT(*) AS count \
             FROM projects, UNNEST(technologies) AS tech \
             WHERE is_active = TRUE GROUP BY tech ORDER BY count DESC, label ASC LIMIT $1",
        )
        .bind(TOP_TECHNOLOGIES)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ProjectStats {
            overview: ProjectOverview {
                total_projects: total,
                featured_projects: featured,
                completed_projects: completed,
                in_progress_projects: in_progress,
                total_views: views,
                total_likes: likes,
                avg_priority: avg_priority.map(round_tenths).unwrap_or(0.0),
            },
            categories,
            top_technologies,
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ProjectListParams, ProjectQuery};

    fn query(search: Option<&str>) -> ProjectQuery {
        ProjectQuery::try_from(ProjectListParams {
            category: Some("AI/ML".into()),
            featured: Some("true".into()),
            search: search.map(str::to_string),
            sort: Some("title,-views".into()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn count_and_page_share_the_predicate() {
        let q = query(None);
        let count = count_query(&q).sql().to_string();
        let page = page_query(&q).sql().to_string();
        let predicate = " WHERE is_active = TRUE AND category = $1 AND featured = $2";
        assert!(count.ends_with(predicate));
        assert!(page.contains(predicate));
        assert!(page.contains("ORDER BY title ASC, views DESC, id ASC LIMIT $3 OFFSET $4"));
    }

    #[test]
    fn search_orders_by_rank_and_ignores_sort() {
        let q = query(Some("machine learning"));
        let page = page_query(&q).sql().to_string();
        assert!(page.contains("search_vector @@ plainto_tsquery('english', $3)"));
        assert!(page.contains("ORDER BY ts_rank(search_vector, plainto_tsquery('english', $4)) DESC, priority DESC"));
        assert!(!page.contains("title ASC"));
    }

    #[test]
    fn default_listing_only_filters_active() {
        let q = ProjectQuery::default();
        assert_eq!(count_query(&q).sql(), "SELECT COUNT(*) FROM projects WHERE is_active = TRUE");
        assert!(page_query(&q).sql().contains("ORDER BY priority DESC, created_at DESC, id ASC"));
    }

    #[test]
    fn averages_round_to_one_decimal() {
        assert_eq!(round_tenths(5.666), 5.7);
    }
}

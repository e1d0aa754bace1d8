use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

#[cfg(test)]
use mockall::automock;

use crate::{
    entities::experience::{Experience, ExperienceDraft, ExperienceRow, ExperienceType},
    errors::AppError,
    repositories::sqlx_repo::SqlxExperienceRepo,
};

const EXPERIENCE_COLUMNS: &str = "id, organization, role, kind, start_date, end_date, location, \
    description, highlights, skills, technologies, achievements, company_url, company_logo, \
    sort_order, created_at, updated_at";

/// Static experience listings. All of them sort by start date, newest first.
#[derive(Debug, Clone, PartialEq)]
pub enum ExperienceFilter {
    All,
    Current,
    Kinds(Vec<ExperienceType>),
}

impl ExperienceFilter {
    pub fn work() -> Self {
        ExperienceFilter::Kinds(ExperienceType::WORK_TYPES.to_vec())
    }

    pub fn education() -> Self {
        ExperienceFilter::Kinds(vec![ExperienceType::Education])
    }

    pub fn matches(&self, experience: &Experience) -> bool {
        match self {
            ExperienceFilter::All => true,
            ExperienceFilter::Current => experience.is_current(),
            ExperienceFilter::Kinds(kinds) => kinds.contains(&experience.kind),
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExperienceRepository: Send + Sync {
    async fn list(&self, filter: &ExperienceFilter) -> Result<Vec<Experience>, AppError>;
    async fn create(&self, draft: &ExperienceDraft) -> Result<Experience, AppError>;
}

impl SqlxExperienceRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxExperienceRepo { pool }
    }
}

pub(crate) fn list_query(filter: &ExperienceFilter) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {EXPERIENCE_COLUMNS} FROM experiences"));
    match filter {
        ExperienceFilter::All => {}
        ExperienceFilter::Current => {
            builder.push(" WHERE end_date IS NULL");
        }
        ExperienceFilter::Kinds(kinds) => {
            let labels: Vec<&'static str> = kinds.iter().map(|k| k.as_str()).collect();
            builder.push(" WHERE kind = ANY(").push_bind(labels).push(")");
        }
    }
    builder.push(" ORDER BY start_date DESC, sort_order ASC");
    builder
}

#[async_trait]
impl ExperienceRepository for SqlxExperienceRepo {
    async fn list(&self, filter: &ExperienceFilter) -> Result<Vec<Experience>, AppError> {
        let rows: Vec<ExperienceRow> = list_query(filter)
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Experience::try_from).collect()
    }

    async fn create(&self, draft: &ExperienceDraft) -> Result<Experience, AppError> {
        let row = sqlx::query_as::<_, ExperienceRow>(&format!(
            r#"
            INSERT INTO experiences (
                organization, role, kind, start_date, end_date, location, description,
                highlights, skills, technologies, achievements, company_url, company_logo, sort_order
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {EXPERIENCE_COLUMNS}
            "#
        ))
        .bind(&draft.organization)
        .bind(&draft.role)
        .bind(draft.kind.as_str())
        .bind(draft.start)
        .bind(draft.end)
        .bind(&draft.location)
        .bind(&draft.description)
        .bind(&draft.highlights)
        .bind(&draft.skills)
        .bind(&draft.technologies)
        .bind(&draft.achievements)
        .bind(&draft.company_url)
        .bind(&draft.company_logo)
        .bind(draft.order)
        .fetch_one(&self.pool)
        .await?;

        Experience::try_from(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_filters_on_missing_end_date() {
        let sql = list_query(&ExperienceFilter::Current).sql().to_string();
        assert!(sql.contains("WHERE end_date IS NULL ORDER BY start_date DESC"));
    }

    #[test]
    fn kinds_bind_one_array() {
        let sql = list_query(&ExperienceFilter::work()).sql().to_string();
        assert!(sql.contains("WHERE kind = ANY($1)"));
    }

    #[test]
    fn all_has_no_predicate() {
        assert!(!list_query(&ExperienceFilter::All).sql().contains("WHERE"));
    }
}

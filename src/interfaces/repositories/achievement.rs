use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

#[cfg(test)]
use mockall::automock;

use crate::{
    entities::achievement::{Achievement, AchievementDraft, AchievementRow, AchievementType},
    errors::AppError,
    repositories::sqlx_repo::SqlxAchievementRepo,
};

const ACHIEVEMENT_COLUMNS: &str = "id, title, organization, kind, achieved_on, description, link, \
    credential_id, credential_url, issue_date, expiry_date, skills, technologies, rank, \
    total_participants, score, max_score, grade, featured, verified, logo, badge, tags, priority, \
    created_at, updated_at";

#[derive(Debug, Clone, PartialEq)]
pub enum AchievementFilter {
    /// Everything, newest first.
    All,
    /// Featured entries by priority, then date.
    Featured,
    Kinds(Vec<AchievementType>),
    /// The `n` most recent entries.
    Recent(i64),
}

impl AchievementFilter {
    pub fn certifications() -> Self {
        AchievementFilter::Kinds(vec![AchievementType::Certification])
    }

    pub fn awards() -> Self {
        AchievementFilter::Kinds(AchievementType::AWARD_TYPES.to_vec())
    }

    pub fn matches(&self, achievement: &Achievement) -> bool {
        match self {
            AchievementFilter::All | AchievementFilter::Recent(_) => true,
            AchievementFilter::Featured => achievement.featured,
            AchievementFilter::Kinds(kinds) => kinds.contains(&achievement.kind),
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait AchievementRepository: Send + Sync {
    async fn list(&self, filter: &AchievementFilter) -> Result<Vec<Achievement>, AppError>;
    async fn create(&self, draft: &AchievementDraft) -> Result<Achievement, AppError>;
    async fn toggle_featured(&self, id: &Uuid) -> Result<Option<Achievement>, AppError>;
}

impl SqlxAchievementRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxAchievementRepo { pool }
    }
}

pub(crate) fn list_query(filter: &AchievementFilter) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {ACHIEVEMENT_COLUMNS} FROM achievements"));
    match filter {
        AchievementFilter::All => {
            builder.push(" ORDER BY achieved_on DESC");
        }
        AchievementFilter::Featured => {
            builder.push(" WHERE featured = TRUE ORDER BY priority DESC, achieved_on DESC");
        }
        AchievementFilter::Kinds(kinds) => {
            let labels: Vec<&'static str> = kinds.iter().map(|k| k.as_str()).collect();
            builder
                .push(" WHERE kind = ANY(")
                .push_bind(labels)
                .push(") ORDER BY achieved_on DESC");
        }
        AchievementFilter::Recent(limit) => {
            builder.push(" ORDER BY achieved_on DESC LIMIT ").push_bind(*limit);
        }
    }
    builder
}

#[async_trait]
impl AchievementRepository for SqlxAchievementRepo {
    async fn list(&self, filter: &AchievementFilter) -> Result<Vec<Achievement>, AppError> {
        let rows: Vec<AchievementRow> = list_query(filter)
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Achievement::try_from).collect()
    }

    async fn create(&self, draft: &AchievementDraft) -> Result<Achievement, AppError> {
        let row = sqlx::query_as::<_, AchievementRow>(&format!(
            r#"
            INSERT INTO achievements (
                title, organization, kind, achieved_on, description, link, credential_id,
                credential_url, issue_date, expiry_date, skills, technologies, rank,
                total_participants, score, max_score, grade, featured, verified, logo, badge,
                tags, priority
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23)
            RETURNING {ACHIEVEMENT_COLUMNS}
            "#
        ))
        .bind(&draft.title)
        .bind(&draft.organization)
        .bind(draft.kind.as_str())
        .bind(draft.date)
        .bind(&draft.description)
        .bind(&draft.link)
        .bind(&draft.credential_id)
        .bind(&draft.credential_url)
        .bind(draft.issue_date)
        .bind(draft.expiry_date)
        .bind(&draft.skills)
        .bind(&draft.technologies)
        .bind(draft.rank)
        .bind(draft.total_participants)
        .bind(draft.score)
        .bind(draft.max_score)
        .bind(&draft.grade)
        .bind(draft.featured)
        .bind(draft.verified)
        .bind(&draft.logo)
        .bind(&draft.badge)
        .bind(&draft.tags)
        .bind(draft.priority)
        .fetch_one(&self.pool)
        .await?;

        Achievement::try_from(row)
    }

    async fn toggle_featured(&self, id: &Uuid) -> Result<Option<Achievement>, AppError> {
        sqlx::query_as::<_, AchievementRow>(&format!(
            "UPDATE achievements SET featured = NOT featured, updated_at = NOW() \
             WHERE id = $1 RETURNING {ACHIEVEMENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Achievement::try_from)
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn featured_orders_by_priority_first() {
        let sql = list_query(&AchievementFilter::Featured).sql().to_string();
        assert!(sql.ends_with("WHERE featured = TRUE ORDER BY priority DESC, achieved_on DESC"));
    }

    #[test]
    fn recent_binds_limit() {
        let sql = list_query(&AchievementFilter::Recent(5)).sql().to_string();
        assert!(sql.ends_with("ORDER BY achieved_on DESC LIMIT $1"));
    }

    #[test]
    fn awards_cover_four_kinds() {
        match AchievementFilter::awards() {
            AchievementFilter::Kinds(kinds) => assert_eq!(kinds.len(), 4),
            other => panic!("unexpected filter {other:?}"),
        }
    }
}

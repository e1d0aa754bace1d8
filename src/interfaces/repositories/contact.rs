use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

#[cfg(test)]
use mockall::automock;

use crate::{
    entities::{
        contact::{
            ContactFilter, ContactMessage, ContactNote, ContactOverview, ContactPriority,
            ContactRow, ContactStats, ContactStatus, DeliveryOutcome, NewContactMessage,
            StatusChange,
        },
        pagination::{Page, PageRequest},
        project::LabelCount,
    },
    errors::AppError,
    repositories::{project::round_tenths, sqlx_repo::{begin_snapshot, SqlxContactRepo}},
};

const CONTACT_COLUMNS: &str = "id, name, email, subject, message, phone, company, website, \
    category, source, priority, status, spam_score, is_spam, user_agent, ip_address, referrer, \
    email_sent, email_sent_at, email_error, responded_at, notes, tags, follow_up_required, \
    follow_up_date, is_archived, archived_at, created_at, updated_at";

/// Urgent first, then high, then normal.
const PRIORITY_RANK: &str = "CASE priority WHEN 'urgent' THEN 0 WHEN 'high' THEN 1 ELSE 2 END";

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create(&self, message: &NewContactMessage) -> Result<ContactMessage, AppError>;
    async fn get(&self, id: &Uuid) -> Result<Option<ContactMessage>, AppError>;
    /// Non-archived messages, newest first.
    async fn list(&self, filter: &ContactFilter, page: PageRequest) -> Result<Page<ContactMessage>, AppError>;
    /// New, non-spam messages, most urgent first.
    async fn unread(&self) -> Result<Vec<ContactMessage>, AppError>;
    /// Open high/urgent messages.
    async fn urgent(&self) -> Result<Vec<ContactMessage>, AppError>;
    /// Writes `change` only while the stored status still equals `change.from()`.
    /// Returns `None` when the record is gone or was moved concurrently.
    async fn apply_status_change(&self, id: &Uuid, change: &StatusChange) -> Result<Option<ContactMessage>, AppError>;
    async fn archive(&self, id: &Uuid) -> Result<Option<ContactMessage>, AppError>;
    async fn add_note(&self, id: &Uuid, note: &ContactNote) -> Result<Option<ContactMessage>, AppError>;
    async fn record_delivery(&self, id: &Uuid, outcome: &DeliveryOutcome, note: &ContactNote) -> Result<(), AppError>;
    async fn stats(&self) -> Result<ContactStats, AppError>;
    /// Archives resolved or closed messages last touched before `before`.
    async fn archive_stale(&self, before: DateTime<Utc>) -> Result<u64, AppError>;
}

impl SqlxContactRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxContactRepo { pool }
    }
}

fn push_list_filter<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &ContactFilter) {
    builder.push(" WHERE is_archived = FALSE");
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
}

pub(crate) fn list_queries(filter: &ContactFilter, page: PageRequest) -> (QueryBuilder<'static, Postgres>, QueryBuilder<'static, Postgres>) {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM contact_messages");
    push_list_filter(&mut count, filter);

    let mut fetch = QueryBuilder::new(format!("SELECT {CONTACT_COLUMNS} FROM contact_messages"));
    push_list_filter(&mut fetch, filter);
    fetch.push(" ORDER BY created_at DESC, id ASC LIMIT ").push_bind(page.limit as i64);
    fetch.push(" OFFSET ").push_bind(page.offset());

    (count, fetch)
}

fn into_messages(rows: Vec<ContactRow>) -> Result<Vec<ContactMessage>, AppError> {
    rows.into_iter().map(ContactMessage::try_from).collect()
}

#[async_trait]
impl ContactRepository for SqlxContactRepo {
    async fn create(&self, message: &NewContactMessage) -> Result<ContactMessage, AppError> {
        let row = sqlx::query_as::<_, ContactRow>(&format!(
            r#"
            INSERT INTO contact_messages (
                name, email, subject, message, phone, company, website, category, source,
                priority, status, spam_score, is_spam, user_agent, ip_address, referrer,
                follow_up_required, follow_up_date, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $19)
            RETURNING {CONTACT_COLUMNS}
            "#
        ))
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.subject)
        .bind(&message.message)
        .bind(&message.phone)
        .bind(&message.company)
        .bind(&message.website)
        .bind(message.category.as_str())
        .bind(message.source.as_str())
        .bind(message.priority.as_str())
        .bind(ContactStatus::New.as_str())
        .bind(message.spam_score)
        .bind(message.is_spam)
        .bind(&message.user_agent)
        .bind(&message.ip_address)
        .bind(&message.referrer)
        .bind(message.follow_up_required)
        .bind(message.follow_up_date)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await?;

        ContactMessage::try_from(row)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<ContactMessage>, AppError> {
        sqlx::query_as::<_, ContactRow>(&format!("SELECT {CONTACT_COLUMNS} FROM contact_messages WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(ContactMessage::try_from)
            .transpose()
    }

    async fn list(&self, filter: &ContactFilter, page: PageRequest) -> Result<Page<ContactMessage>, AppError> {
        let (mut count, mut fetch) = list_queries(filter, page);
        let mut tx = begin_snapshot(&self.pool).await?;

        let total: i64 = count.build_query_scalar().fetch_one(&mut *tx).await?;
        let rows: Vec<ContactRow> = fetch.build_query_as().fetch_all(&mut *tx).await?;

        tx.commit().await?;

        Ok(Page { items: into_messages(rows)?, total })
    }

    async fn unread(&self) -> Result<Vec<ContactMessage>, AppError> {
        let rows = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contact_messages \
             WHERE status = $1 AND is_spam = FALSE AND is_archived = FALSE \
             ORDER BY {PRIORITY_RANK}, created_at DESC"
        ))
        .bind(ContactStatus::New.as_str())
        .fetch_all(&self.pool)
        .await?;

        into_messages(rows)
    }

    async fn urgent(&self) -> Result<Vec<ContactMessage>, AppError> {
        let rows = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contact_messages \
             WHERE priority = ANY($1) AND status <> ALL($2) \
               AND is_spam = FALSE AND is_archived = FALSE \
             ORDER BY {PRIORITY_RANK}, created_at ASC"
        ))
        .bind(vec![ContactPriority::Urgent.as_str(), ContactPriority::High.as_str()])
        .bind(vec![ContactStatus::Resolved.as_str(), ContactStatus::Closed.as_str()])
        .fetch_all(&self.pool)
        .await?;

        into_messages(rows)
    }

    async fn apply_status_change(&self, id: &Uuid, change: &StatusChange) -> Result<Option<ContactMessage>, AppError> {
        sqlx::query_as::<_, ContactRow>(&format!(
            "UPDATE contact_messages SET status = $3, responded_at = $4, updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(id)
        .bind(change.from().as_str())
        .bind(change.to().as_str())
        .bind(change.responded_at())
        .fetch_optional(&self.pool)
        .await?
        .map(ContactMessage::try_from)
        .transpose()
    }

    async fn archive(&self, id: &Uuid) -> Result<Option<ContactMessage>, AppError> {
        sqlx::query_as::<_, ContactRow>(&format!(
            "UPDATE contact_messages \
             SET is_archived = TRUE, archived_at = COALESCE(archived_at, NOW()), updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(ContactMessage::try_from)
        .transpose()
    }

    async fn add_note(&self, id: &Uuid, note: &ContactNote) -> Result<Option<ContactMessage>, AppError> {
        sqlx::query_as::<_, ContactRow>(&format!(
            "UPDATE contact_messages SET notes = notes || $2::jsonb, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(id)
        .bind(Json(vec![note.clone()]))
        .fetch_optional(&self.pool)
        .await?
        .map(ContactMessage::try_from)
        .transpose()
    }

    async fn record_delivery(&self, id: &Uuid, outcome: &DeliveryOutcome, note: &ContactNote) -> Result<(), AppError> {
        let (sent_at, error) = match outcome {
            DeliveryOutcome::Sent { at } => (Some(*at), None),
            DeliveryOutcome::Failed { error } => (None, Some(error.as_str())),
        };

        sqlx::query(
            "UPDATE contact_messages \
             SET email_sent = $2, email_sent_at = $3, email_error = $4, \
                 notes = notes || $5::jsonb, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(sent_at.is_some())
        .bind(sent_at)
        .bind(error)
        .bind(Json(vec![note.clone()]))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn stats(&self) -> Result<ContactStats, AppError> {
        let mut tx = begin_snapshot(&self.pool).await?;

        let (total, unread, spam, avg_hours): (i64, i64, i64, Option<f64>) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = $1),
                COUNT(*) FILTER (WHERE is_spam),
                (AVG(EXTRACT(EPOCH FROM (responded_at - created_at)) / 3600.0)
                    FILTER (WHERE responded_at IS NOT NULL))::FLOAT8
            FROM contact_messages
            "#,
        )
        .bind(ContactStatus::New.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let categories = sqlx::query_as::<_, LabelCount>(
            "SELECT category AS label, COUNT(*) AS count FROM contact_messages \
             WHERE is_spam = FALSE GROUP BY category ORDER BY count DESC, label ASC",
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ContactStats {
            overview: ContactOverview {
                total_messages: total,
                unread_messages: unread,
                spam_messages: spam,
                avg_response_time_hours: avg_hours.map(round_tenths),
            },
            categories,
        })
    }

    async fn archive_stale(&self, before: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE contact_messages SET is_archived = TRUE, archived_at = NOW(), updated_at = NOW() \
             WHERE is_archived = FALSE AND status = ANY($1) AND updated_at < $2",
        )
        .bind(vec![ContactStatus::Resolved.as_str(), ContactStatus::Closed.as_str()])
        .bind(before)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

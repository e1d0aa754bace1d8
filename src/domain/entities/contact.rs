use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{project::LabelCount, validation::{hours_between, trim_optional, validate_http_url}},
    errors::AppError,
};

// ───── Constants ──────────────────────────────────────────────────────
pub const SPAM_THRESHOLD: i32 = 70;
const SUSPICIOUS_PHRASES: [&str; 7] = [
    "viagra", "casino", "lottery", "winner", "congratulations", "urgent", "act now",
];
const URGENT_KEYWORDS: [&str; 4] = ["urgent", "asap", "emergency", "immediately"];
const HIGH_KEYWORDS: [&str; 5] = ["important", "priority", "deadline", "job", "opportunity"];
pub const SYSTEM_AUTHOR: &str = "System";

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z\s\-'\.]+$").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[1-9]\d{0,15}$").unwrap());

labeled_enum! {
    pub enum ContactCategory {
        JobOpportunity => "Job Opportunity",
        FreelanceProject => "Freelance Project",
        Collaboration => "Collaboration",
        GeneralInquiry => "General Inquiry",
        TechnicalSupport => "Technical Support",
        Other => "Other",
    }
}

labeled_enum! {
    pub enum ContactSource {
        PortfolioWebsite => "Portfolio Website",
        LinkedIn => "LinkedIn",
        GitHub => "GitHub",
        Email => "Email",
        Referral => "Referral",
        Other => "Other",
    }
}

labeled_enum! {
    pub enum ContactPriority {
        Normal => "normal",
        High => "high",
        Urgent => "urgent",
    }
}

labeled_enum! {
    pub enum ContactStatus {
        New => "New",
        Read => "Read",
        InProgress => "In Progress",
        Replied => "Replied",
        Resolved => "Resolved",
        Closed => "Closed",
    }
}

labeled_enum! {
    /// Administrative actions that move a message through its lifecycle.
    pub enum StatusAction {
        MarkRead => "read",
        StartProgress => "in-progress",
        MarkReplied => "replied",
        Resolve => "resolve",
        Close => "close",
    }
}

impl ContactStatus {
    /// Target state for `action`, `Ok(None)` when the action is a no-op.
    pub fn next(self, action: StatusAction) -> Result<Option<ContactStatus>, AppError> {
        use ContactStatus::*;

        let target = match (self, action) {
            (New, StatusAction::MarkRead) => Read,
            (_, StatusAction::MarkRead) => return Ok(None),
            (Read | Replied, StatusAction::StartProgress) => InProgress,
            (Read | InProgress, StatusAction::MarkReplied) => Replied,
            (Replied, StatusAction::Resolve) => Resolved,
            (from, StatusAction::Close) if from != Closed => Closed,
            (from, action) => {
                return Err(AppError::Conflict(format!(
                    "Cannot apply '{}' to a message in status '{}'",
                    action, from
                )));
            }
        };
        Ok(Some(target))
    }
}

impl ContactPriority {
    /// Keyword scan over the lowercased message body.
    pub fn detect(message: &str) -> Self {
        let text = message.to_lowercase();
        if URGENT_KEYWORDS.iter().any(|k| text.contains(k)) {
            ContactPriority::Urgent
        } else if HIGH_KEYWORDS.iter().any(|k| text.contains(k)) {
            ContactPriority::High
        } else {
            ContactPriority::Normal
        }
    }

    pub fn follow_up_after(&self) -> Option<Duration> {
        match self {
            ContactPriority::Urgent => Some(Duration::hours(2)),
            ContactPriority::High => Some(Duration::hours(24)),
            ContactPriority::Normal => None,
        }
    }
}

/// Heuristic spam score in `0..=100`.
pub fn spam_score(subject: &str, message: &str, email: &str) -> i32 {
    let mut score = 0;

    let text = format!("{} {}", subject, message).to_lowercase();
    score += 20 * SUSPICIOUS_PHRASES.iter().filter(|p| text.contains(*p)).count() as i32;

    let length = message.chars().count();
    let capitals = message.chars().filter(|c| c.is_ascii_uppercase()).count();
    if length > 0 && capitals * 2 > length {
        score += 30;
    }

    if message.matches('!').count() > 3 {
        score += 20;
    }

    if email.contains("temp") || email.contains("disposable") {
        score += 40;
    }

    score.min(100)
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactNote {
    pub content: String,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ContactRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub website: Option<String>,
    pub category: String,
    pub source: String,
    pub priority: String,
    pub status: String,
    pub spam_score: i32,
    pub is_spam: bool,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub referrer: Option<String>,
    pub email_sent: bool,
    pub email_sent_at: Option<DateTime<Utc>>,
    pub email_error: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub notes: Json<Vec<ContactNote>>,
    pub tags: Vec<String>,
    pub follow_up_required: bool,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub is_archived: bool,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ───── Domain Models ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub website: Option<String>,
    pub category: ContactCategory,
    pub source: ContactSource,
    pub priority: ContactPriority,
    pub status: ContactStatus,
    pub spam_score: i32,
    pub is_spam: bool,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub referrer: Option<String>,
    pub email_sent: bool,
    pub email_sent_at: Option<DateTime<Utc>>,
    pub email_error: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub notes: Vec<ContactNote>,
    pub tags: Vec<String>,
    pub follow_up_required: bool,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub is_archived: bool,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated submission with every creation-time field computed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub website: Option<String>,
    pub category: ContactCategory,
    pub source: ContactSource,
    pub priority: ContactPriority,
    pub spam_score: i32,
    pub is_spam: bool,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub referrer: Option<String>,
    pub follow_up_required: bool,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A status move computed from the current state. Persisted with
/// compare-and-set on `from`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    from: ContactStatus,
    to: ContactStatus,
    responded_at: Option<DateTime<Utc>>,
}

impl StatusChange {
    pub fn from(&self) -> ContactStatus {
        self.from
    }

    pub fn to(&self) -> ContactStatus {
        self.to
    }

    pub fn responded_at(&self) -> Option<DateTime<Utc>> {
        self.responded_at
    }
}

/// Outcome of the notification task, written back onto the record.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    Sent { at: DateTime<Utc> },
    Failed { error: String },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContactFilter {
    pub status: Option<ContactStatus>,
}

// ───── API Models ────────────────────────────────────────────────────

/// Request metadata captured alongside a submission.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    #[validate(
        length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"),
        regex(path = *NAME_RE, message = "Name can only contain letters, spaces, hyphens, apostrophes, and periods")
    )]
    pub name: String,

    #[validate(
        email(message = "Please provide a valid email address"),
        length(max = 100, message = "Email cannot exceed 100 characters")
    )]
    pub email: String,

    #[validate(length(min = 5, max = 100, message = "Subject must be between 5 and 100 characters"))]
    pub subject: String,

    #[validate(length(min = 10, max = 1000, message = "Message must be between 10 and 1000 characters"))]
    pub message: String,

    #[validate(regex(path = *PHONE_RE, message = "Please provide a valid phone number"))]
    pub phone: Option<String>,

    #[validate(length(max = 100, message = "Company name cannot exceed 100 characters"))]
    pub company: Option<String>,

    #[validate(custom(function = "validate_http_url"))]
    pub website: Option<String>,

    pub category: Option<ContactCategory>,
    pub source: Option<ContactSource>,

    #[serde(default)]
    pub honeypot: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NoteRequest {
    #[validate(length(min = 1, max = 500, message = "Note must be between 1 and 500 characters"))]
    pub content: String,

    #[validate(length(max = 100, message = "Author cannot exceed 100 characters"))]
    pub added_by: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    #[serde(flatten)]
    pub contact: ContactMessage,
    pub full_contact: String,
    pub is_urgent: bool,
    pub response_time_hours: Option<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub id: Uuid,
    pub status: &'static str,
    pub email_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContactOverview {
    pub total_messages: i64,
    pub unread_messages: i64,
    pub spam_messages: i64,
    pub avg_response_time_hours: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactStats {
    pub overview: ContactOverview,
    pub categories: Vec<LabelCount>,
}

// ───── Conversions ──────────────────────────────────────────────────

impl ContactForm {
    /// Trims every field and lowercases the address.
    pub fn normalized(self) -> Self {
        ContactForm {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
            phone: trim_optional(self.phone),
            company: trim_optional(self.company),
            website: trim_optional(self.website),
            category: self.category,
            source: self.source,
            honeypot: trim_optional(self.honeypot),
        }
    }

    /// Validates the submission and computes spam, priority and follow-up.
    pub fn into_new_message(self, meta: RequestMeta, now: DateTime<Utc>) -> Result<NewContactMessage, AppError> {
        let form = self.normalized();
        if form.honeypot.is_some() {
            return Err(AppError::validation("honeypot", "Spam detected"));
        }
        form.validate()?;

        let spam_score = spam_score(&form.subject, &form.message, &form.email);
        let priority = ContactPriority::detect(&form.message);
        let follow_up_date = priority.follow_up_after().map(|after| now + after);

        Ok(NewContactMessage {
            name: form.name,
            email: form.email,
            subject: form.subject,
            message: form.message,
            phone: form.phone,
            company: form.company,
            website: form.website,
            category: form.category.unwrap_or(ContactCategory::GeneralInquiry),
            source: form.source.unwrap_or(ContactSource::PortfolioWebsite),
            priority,
            spam_score,
            is_spam: spam_score >= SPAM_THRESHOLD,
            user_agent: meta.user_agent,
            ip_address: meta.ip_address,
            referrer: meta.referrer,
            follow_up_required: follow_up_date.is_some(),
            follow_up_date,
            created_at: now,
        })
    }
}

impl NoteRequest {
    pub fn into_note(self, now: DateTime<Utc>) -> Result<ContactNote, AppError> {
        let request = NoteRequest {
            content: self.content.trim().to_string(),
            added_by: trim_optional(self.added_by),
        };
        request.validate()?;
        Ok(ContactNote {
            content: request.content,
            added_by: request.added_by.unwrap_or_else(|| SYSTEM_AUTHOR.to_string()),
            added_at: now,
        })
    }
}

impl ContactNote {
    pub fn system(content: String, now: DateTime<Utc>) -> Self {
        ContactNote { content, added_by: SYSTEM_AUTHOR.to_string(), added_at: now }
    }
}

impl TryFrom<ContactRow> for ContactMessage {
    type Error = AppError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        fn parse<T: std::str::FromStr>(value: &str, what: &str) -> Result<T, AppError> {
            value
                .parse()
                .map_err(|_| AppError::InternalError(format!("Unknown stored contact {}: {}", what, value)))
        }

        Ok(ContactMessage {
            category: parse(&row.category, "category")?,
            source: parse(&row.source, "source")?,
            priority: parse(&row.priority, "priority")?,
            status: parse(&row.status, "status")?,
            id: row.id,
            name: row.name,
            email: row.email,
            subject: row.subject,
            message: row.message,
            phone: row.phone,
            company: row.company,
            website: row.website,
            spam_score: row.spam_score,
            is_spam: row.is_spam,
            user_agent: row.user_agent,
            ip_address: row.ip_address,
            referrer: row.referrer,
            email_sent: row.email_sent,
            email_sent_at: row.email_sent_at,
            email_error: row.email_error,
            responded_at: row.responded_at,
            notes: row.notes.0,
            tags: row.tags,
            follow_up_required: row.follow_up_required,
            follow_up_date: row.follow_up_date,
            is_archived: row.is_archived,
            archived_at: row.archived_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl ContactMessage {
    /// Builds a record from a fresh submission. The store assigns nothing
    /// beyond what is set here.
    pub fn from_new(id: Uuid, new: NewContactMessage) -> Self {
        ContactMessage {
            id,
            name: new.name,
            email: new.email,
            subject: new.subject,
            message: new.message,
            phone: new.phone,
            company: new.company,
            website: new.website,
            category: new.category,
            source: new.source,
            priority: new.priority,
            status: ContactStatus::New,
            spam_score: new.spam_score,
            is_spam: new.is_spam,
            user_agent: new.user_agent,
            ip_address: new.ip_address,
            referrer: new.referrer,
            email_sent: false,
            email_sent_at: None,
            email_error: None,
            responded_at: None,
            notes: Vec::new(),
            tags: Vec::new(),
            follow_up_required: new.follow_up_required,
            follow_up_date: new.follow_up_date,
            is_archived: false,
            archived_at: None,
            created_at: new.created_at,
            updated_at: new.created_at,
        }
    }

    /// Plans `action` against the current status. `Ok(None)` means nothing
    /// needs to be written.
    pub fn plan(&self, action: StatusAction, now: DateTime<Utc>) -> Result<Option<StatusChange>, AppError> {
        let Some(to) = self.status.next(action)? else {
            return Ok(None);
        };
        let responded_at = match to {
            ContactStatus::Replied => Some(now),
            _ => self.responded_at,
        };
        Ok(Some(StatusChange { from: self.status, to, responded_at }))
    }

    /// Applies a change computed by [`ContactMessage::plan`]. Used by stores
    /// that hold records in memory.
    pub fn apply(&mut self, change: &StatusChange, now: DateTime<Utc>) -> bool {
        if self.status != change.from {
            return false;
        }
        self.status = change.to;
        self.responded_at = change.responded_at;
        self.updated_at = now;
        true
    }

    pub fn full_contact(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self.priority, ContactPriority::High | ContactPriority::Urgent)
    }

    pub fn response_time_hours(&self) -> Option<i64> {
        self.responded_at
            .map(|responded| hours_between(self.created_at, responded).abs().ceil() as i64)
    }

    pub fn into_response(self) -> ContactResponse {
        ContactResponse {
            full_contact: self.full_contact(),
            is_urgent: self.is_urgent(),
            response_time_hours: self.response_time_hours(),
            contact: self,
        }
    }
}

impl SubmissionReceipt {
    pub fn spam(id: Uuid) -> Self {
        SubmissionReceipt { id, status: "received", email_sent: false, email_error: None }
    }

    pub fn delivered(id: Uuid, outcome: Option<&DeliveryOutcome>) -> Self {
        let (email_sent, email_error) = match outcome {
            Some(DeliveryOutcome::Sent { .. }) => (true, None),
            Some(DeliveryOutcome::Failed { error }) => (false, Some(error.clone())),
            None => (false, None),
        };
        SubmissionReceipt { id, status: "received", email_sent, email_error }
    }
}

impl DeliveryOutcome {
    pub fn system_note(&self, ip: Option<&str>, now: DateTime<Utc>) -> ContactNote {
        let result = match self {
            DeliveryOutcome::Sent { .. } => "Email sent successfully",
            DeliveryOutcome::Failed { .. } => "Email failed to send",
        };
        ContactNote::system(
            format!("Contact form submitted from {}. {}.", ip.unwrap_or("unknown"), result),
            now,
        )
    }
}

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    entities::validation::{
        check_entries, tidy_list, today, trim_optional, validate_http_url, validate_image_url,
    },
    errors::AppError,
};

pub const EXPIRY_WARNING_DAYS: i64 = 30;
pub const DEFAULT_RECENT_LIMIT: i64 = 5;
pub const MAX_RECENT_LIMIT: i64 = 50;

labeled_enum! {
    pub enum AchievementType {
        Certification => "certification",
        Award => "award",
        Hackathon => "hackathon",
        Competition => "competition",
        Recognition => "recognition",
        Publication => "publication",
        Patent => "patent",
    }
}

impl AchievementType {
    pub const AWARD_TYPES: &'static [AchievementType] = &[
        AchievementType::Award,
        AchievementType::Recognition,
        AchievementType::Hackathon,
        AchievementType::Competition,
    ];
}

labeled_enum! {
    pub enum CredentialStatus {
        Valid => "valid",
        ExpiringSoon => "expiring-soon",
        Expired => "expired",
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct AchievementRow {
    pub id: Uuid,
    pub title: String,
    pub organization: String,
    pub kind: String,
    pub achieved_on: NaiveDate,
    pub description: Option<String>,
    pub link: Option<String>,
    pub credential_id: Option<String>,
    pub credential_url: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub skills: Vec<String>,
    pub technologies: Vec<String>,
    pub rank: Option<i32>,
    pub total_participants: Option<i32>,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub grade: Option<String>,
    pub featured: bool,
    pub verified: bool,
    pub logo: Option<String>,
    pub badge: Option<String>,
    pub tags: Vec<String>,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: Uuid,
    pub title: String,
    pub organization: String,
    #[serde(rename = "type")]
    pub kind: AchievementType,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub link: Option<String>,
    pub credential_id: Option<String>,
    pub credential_url: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub skills: Vec<String>,
    pub technologies: Vec<String>,
    pub rank: Option<i32>,
    pub total_participants: Option<i32>,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub grade: Option<String>,
    pub featured: bool,
    pub verified: bool,
    pub logo: Option<String>,
    pub badge: Option<String>,
    pub tags: Vec<String>,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementResponse {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub year: i32,
    pub formatted_date: String,
    pub short_date: String,
    pub time_ago: String,
    pub credential_status: CredentialStatus,
    pub expiring_soon: bool,
    pub performance_percentage: Option<i64>,
    pub score_percentage: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAchievementRequest {
    pub title: String,
    #[serde(alias = "org")]
    pub organization: String,
    #[serde(rename = "type")]
    pub kind: AchievementType,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub link: Option<String>,
    pub credential_id: Option<String>,
    pub credential_url: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub rank: Option<i32>,
    pub total_participants: Option<i32>,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub grade: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub verified: bool,
    pub logo: Option<String>,
    pub badge: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub priority: Option<i32>,
}

#[derive(Debug, Clone, Validate)]
pub struct AchievementDraft {
    #[validate(length(min = 1, max = 200, message = "Title is required (max 200 characters)"))]
    pub title: String,

    #[validate(length(min = 1, max = 200, message = "Organization is required (max 200 characters)"))]
    pub organization: String,

    pub kind: AchievementType,
    pub date: NaiveDate,

    #[validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_http_url"))]
    pub link: Option<String>,

    #[validate(length(max = 100, message = "Credential ID cannot exceed 100 characters"))]
    pub credential_id: Option<String>,

    #[validate(custom(function = "validate_http_url"))]
    pub credential_url: Option<String>,

    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,

    #[validate(custom(function = "validate_entries"))]
    pub skills: Vec<String>,

    #[validate(custom(function = "validate_entries"))]
    pub technologies: Vec<String>,

    #[validate(range(min = 1, message = "Rank must be at least 1"))]
    pub rank: Option<i32>,

    #[validate(range(min = 1, message = "Total participants must be at least 1"))]
    pub total_participants: Option<i32>,

    pub score: Option<f64>,
    pub max_score: Option<f64>,

    #[validate(length(max = 10, message = "Grade cannot exceed 10 characters"))]
    pub grade: Option<String>,

    pub featured: bool,
    pub verified: bool,

    #[validate(custom(function = "validate_image_url"))]
    pub logo: Option<String>,

    #[validate(custom(function = "validate_image_url"))]
    pub badge: Option<String>,

    #[validate(custom(function = "validate_entries"))]
    pub tags: Vec<String>,

    #[validate(range(min = 0, max = 10, message = "Priority must be between 0 and 10"))]
    pub priority: i32,
}

fn validate_entries(items: &[String]) -> Result<(), ValidationError> {
    check_entries(items, 50, "Each entry must be between 1 and 50 characters")
}

impl TryFrom<NewAchievementRequest> for AchievementDraft {
    type Error = ValidationErrors;

    fn try_from(value: NewAchievementRequest) -> Result<Self, Self::Error> {
        let draft = AchievementDraft {
            title: value.title.trim().to_string(),
            organization: value.organization.trim().to_string(),
            kind: value.kind,
            date: value.date,
            description: trim_optional(value.description),
            link: trim_optional(value.link),
            credential_id: trim_optional(value.credential_id),
            credential_url: trim_optional(value.credential_url),
            issue_date: value.issue_date,
            expiry_date: value.expiry_date,
            skills: tidy_list(value.skills),
            technologies: tidy_list(value.technologies),
            rank: value.rank,
            total_participants: value.total_participants,
            score: value.score,
            max_score: value.max_score,
            grade: trim_optional(value.grade),
            featured: value.featured,
            verified: value.verified,
            logo: trim_optional(value.logo),
            badge: trim_optional(value.badge),
            tags: tidy_list(value.tags),
            priority: value.priority.unwrap_or(0),
        };
        draft.validate()?;
        Ok(draft)
    }
}

impl TryFrom<AchievementRow> for Achievement {
    type Error = AppError;

    fn try_from(row: AchievementRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse()
            .map_err(|_| AppError::InternalError(format!("Unknown stored achievement type: {}", row.kind)))?;

        Ok(Achievement {
            id: row.id,
            title: row.title,
            organization: row.organization,
            kind,
            date: row.achieved_on,
            description: row.description,
            link: row.link,
            credential_id: row.credential_id,
            credential_url: row.credential_url,
            issue_date: row.issue_date,
            expiry_date: row.expiry_date,
            skills: row.skills,
            technologies: row.technologies,
            rank: row.rank,
            total_participants: row.total_participants,
            score: row.score,
            max_score: row.max_score,
            grade: row.grade,
            featured: row.featured,
            verified: row.verified,
            logo: row.logo,
            badge: row.badge,
            tags: row.tags,
            priority: row.priority,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl Achievement {
    pub fn performance_percentage(&self) -> Option<i64> {
        match (self.rank, self.total_participants) {
            (Some(rank), Some(total)) if rank > 0 && total > 0 => {
                let share = (total - rank + 1) as f64 * 100.0 / total as f64;
                Some(share.round() as i64)
            }
            _ => None,
        }
    }

    pub fn score_percentage(&self) -> Option<i64> {
        match (self.score, self.max_score) {
            (Some(score), Some(max)) if score != 0.0 && max != 0.0 => {
                Some((score * 100.0 / max).round() as i64)
            }
            _ => None,
        }
    }

    fn days_until_expiry(&self, today: NaiveDate) -> Option<i64> {
        self.expiry_date.map(|expiry| (expiry - today).num_days())
    }

    pub fn credential_status(&self, today: NaiveDate) -> CredentialStatus {
        match self.days_until_expiry(today) {
            None => CredentialStatus::Valid,
            Some(days) if days < 0 => CredentialStatus::Expired,
            Some(days) if days < EXPIRY_WARNING_DAYS => CredentialStatus::ExpiringSoon,
            Some(_) => CredentialStatus::Valid,
        }
    }

    pub fn is_expiring_soon(&self, today: NaiveDate) -> bool {
        self.days_until_expiry(today)
            .is_some_and(|days| days > 0 && days <= EXPIRY_WARNING_DAYS)
    }

    pub fn time_ago(&self, today: NaiveDate) -> String {
        let days = (today - self.date).num_days();
        let months = days / 30;
        let years = months / 12;
        let unit = |n: i64, name: &str| {
            if n == 1 { format!("{n} {name} ago") } else { format!("{n} {name}s ago") }
        };
        if years > 0 {
            unit(years, "year")
        } else if months > 0 {
            unit(months, "month")
        } else if days > 0 {
            unit(days, "day")
        } else {
            "Recently".to_string()
        }
    }

    pub fn into_response_at(self, today: NaiveDate) -> AchievementResponse {
        AchievementResponse {
            year: self.date.year(),
            formatted_date: self.date.format("%B %-d, %Y").to_string(),
            short_date: self.date.format("%b %Y").to_string(),
            time_ago: self.time_ago(today),
            credential_status: self.credential_status(today),
            expiring_soon: self.is_expiring_soon(today),
            performance_percentage: self.performance_percentage(),
            score_percentage: self.score_percentage(),
            achievement: self,
        }
    }

    pub fn into_response(self) -> AchievementResponse {
        self.into_response_at(today())
    }
}

/// Clamps the `limit` of the recent-achievements query.
pub fn recent_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn achievement() -> Achievement {
        let request: NewAchievementRequest = serde_json::from_value(serde_json::json!({
            "title": "Regional Hackathon",
            "org": "Dev Guild",
            "type": "hackathon",
            "date": "2024-03-09",
            "rank": 2,
            "totalParticipants": 40,
            "score": 87.0,
            "maxScore": 100.0
        }))
        .unwrap();
        let draft = AchievementDraft::try_from(request).unwrap();
        Achievement {
            id: Uuid::new_v4(),
            title: draft.title,
            organization: draft.organization,
            kind: draft.kind,
            date: draft.date,
            description: None,
            link: None,
            credential_id: None,
            credential_url: None,
            issue_date: None,
            expiry_date: None,
            skills: vec![],
            technologies: vec![],
            rank: draft.rank,
            total_participants: draft.total_participants,
            score: draft.score,
            max_score: draft.max_score,
            grade: None,
            featured: false,
            verified: false,
            logo: None,
            badge: None,
            tags: vec![],
            priority: draft.priority,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn percentages_are_rounded() {
        let a = achievement();
        assert_eq!(a.performance_percentage(), Some(98));
        assert_eq!(a.score_percentage(), Some(87));

        let mut partial = achievement();
        partial.total_participants = None;
        partial.max_score = Some(0.0);
        assert_eq!(partial.performance_percentage(), None);
        assert_eq!(partial.score_percentage(), None);
    }

    #[test]
    fn credential_status_follows_expiry() {
        let mut a = achievement();
        let today = date(2025, 1, 1);
        assert_eq!(a.credential_status(today), CredentialStatus::Valid);

        a.expiry_date = Some(date(2024, 12, 1));
        assert_eq!(a.credential_status(today), CredentialStatus::Expired);
        assert!(!a.is_expiring_soon(today));

        a.expiry_date = Some(date(2025, 1, 20));
        assert_eq!(a.credential_status(today), CredentialStatus::ExpiringSoon);
        assert!(a.is_expiring_soon(today));

        a.expiry_date = Some(date(2026, 1, 1));
        assert_eq!(a.credential_status(today), CredentialStatus::Valid);
    }

    #[test]
    fn read_time_projections() {
        let response = achievement().into_response_at(date(2025, 6, 1));
        assert_eq!(response.year, 2024);
        assert_eq!(response.formatted_date, "March 9, 2024");
        assert_eq!(response.short_date, "Mar 2024");
        assert_eq!(response.time_ago, "1 year ago");
    }

    #[test]
    fn invalid_rank_is_rejected() {
        let request: NewAchievementRequest = serde_json::from_value(serde_json::json!({
            "title": "Award",
            "organization": "Org",
            "type": "award",
            "date": "2024-01-01",
            "rank": 0
        }))
        .unwrap();
        let errors = AchievementDraft::try_from(request).unwrap_err();
        assert!(errors.field_errors().contains_key("rank"));
    }

    #[test]
    fn recent_limit_is_clamped() {
        assert_eq!(recent_limit(None), DEFAULT_RECENT_LIMIT);
        assert_eq!(recent_limit(Some(500)), MAX_RECENT_LIMIT);
        assert_eq!(recent_limit(Some(0)), 1);
    }
}

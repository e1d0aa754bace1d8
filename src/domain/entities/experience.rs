use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    entities::validation::{
        check_entries, new_validation_error, tidy_list, today, trim_optional, validate_http_url,
        validate_image_url,
    },
    errors::AppError,
};

labeled_enum! {
    pub enum ExperienceType {
        Work => "work",
        Internship => "internship",
        Freelance => "freelance",
        Volunteer => "volunteer",
        Education => "education",
    }
}

impl ExperienceType {
    pub const WORK_TYPES: &'static [ExperienceType] =
        &[ExperienceType::Work, ExperienceType::Internship, ExperienceType::Freelance];
}

#[derive(Debug, sqlx::FromRow)]
pub struct ExperienceRow {
    pub id: Uuid,
    pub organization: String,
    pub role: String,
    pub kind: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub highlights: Vec<String>,
    pub skills: Vec<String>,
    pub technologies: Vec<String>,
    pub achievements: Vec<String>,
    pub company_url: Option<String>,
    pub company_logo: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: Uuid,
    pub organization: String,
    pub role: String,
    #[serde(rename = "type")]
    pub kind: ExperienceType,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub highlights: Vec<String>,
    pub skills: Vec<String>,
    pub technologies: Vec<String>,
    pub achievements: Vec<String>,
    pub company_url: Option<String>,
    pub company_logo: Option<String>,
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceResponse {
    #[serde(flatten)]
    pub experience: Experience,
    pub current: bool,
    pub duration: String,
    pub date_range: String,
    pub short_date_range: String,
    pub total_months: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExperienceRequest {
    #[serde(alias = "org")]
    pub organization: String,
    pub role: String,
    #[serde(rename = "type")]
    pub kind: Option<ExperienceType>,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
    pub location: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
    pub company_url: Option<String>,
    pub company_logo: Option<String>,
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Validate)]
pub struct ExperienceDraft {
    #[validate(length(min = 1, max = 200, message = "Organization is required (max 200 characters)"))]
    pub organization: String,

    #[validate(length(min = 1, max = 200, message = "Role is required (max 200 characters)"))]
    pub role: String,

    pub kind: ExperienceType,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,

    #[validate(length(max = 100, message = "Location cannot exceed 100 characters"))]
    pub location: Option<String>,

    #[validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_long_entries"))]
    pub highlights: Vec<String>,

    #[validate(custom(function = "validate_short_entries"))]
    pub skills: Vec<String>,

    #[validate(custom(function = "validate_short_entries"))]
    pub technologies: Vec<String>,

    #[validate(custom(function = "validate_long_entries"))]
    pub achievements: Vec<String>,

    #[validate(custom(function = "validate_http_url"))]
    pub company_url: Option<String>,

    #[validate(custom(function = "validate_image_url"))]
    pub company_logo: Option<String>,

    pub order: i32,
}

fn validate_short_entries(items: &[String]) -> Result<(), ValidationError> {
    check_entries(items, 50, "Each entry must be between 1 and 50 characters")
}

fn validate_long_entries(items: &[String]) -> Result<(), ValidationError> {
    check_entries(items, 500, "Each entry must be between 1 and 500 characters")
}

impl TryFrom<NewExperienceRequest> for ExperienceDraft {
    type Error = ValidationErrors;

    fn try_from(value: NewExperienceRequest) -> Result<Self, Self::Error> {
        let draft = ExperienceDraft {
            organization: value.organization.trim().to_string(),
            role: value.role.trim().to_string(),
            kind: value.kind.unwrap_or(ExperienceType::Work),
            start: value.start,
            end: value.end,
            location: trim_optional(value.location),
            description: trim_optional(value.description),
            highlights: tidy_list(value.highlights),
            skills: tidy_list(value.skills),
            technologies: tidy_list(value.technologies),
            achievements: tidy_list(value.achievements),
            company_url: trim_optional(value.company_url),
            company_logo: trim_optional(value.company_logo),
            order: value.order.unwrap_or(0),
        };

        let mut errors = match draft.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        if draft.end.is_some_and(|end| end < draft.start) {
            errors.add("end", new_validation_error("date_order", "End date cannot be before start date"));
        }
        if errors.errors().is_empty() { Ok(draft) } else { Err(errors) }
    }
}

impl TryFrom<ExperienceRow> for Experience {
    type Error = AppError;

    fn try_from(row: ExperienceRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse()
            .map_err(|_| AppError::InternalError(format!("Unknown stored experience type: {}", row.kind)))?;

        Ok(Experience {
            id: row.id,
            organization: row.organization,
            role: row.role,
            kind,
            start: row.start_date,
            end: row.end_date,
            location: row.location,
            description: row.description,
            highlights: row.highlights,
            skills: row.skills,
            technologies: row.technologies,
            achievements: row.achievements,
            company_url: row.company_url,
            company_logo: row.company_logo,
            order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 { format!("{n} {unit}") } else { format!("{n} {unit}s") }
}

fn month_year(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

impl Experience {
    /// An entry without an end date is ongoing.
    pub fn is_current(&self) -> bool {
        self.end.is_none()
    }

    fn elapsed_days(&self, today: NaiveDate) -> i64 {
        (self.end.unwrap_or(today) - self.start).num_days().abs()
    }

    pub fn total_months(&self, today: NaiveDate) -> i64 {
        self.elapsed_days(today) / 30
    }

    pub fn duration(&self, today: NaiveDate) -> String {
        let days = self.elapsed_days(today);
        let months = days / 30;
        let years = months / 12;
        match (years, months % 12) {
            (0, 0) => plural(days, "day"),
            (0, m) => plural(m, "month"),
            (y, 0) => plural(y, "year"),
            (y, m) => format!("{} {}", plural(y, "year"), plural(m, "month")),
        }
    }

    pub fn date_range(&self) -> String {
        let end = self.end.map(month_year).unwrap_or_else(|| "Present".to_string());
        format!("{} - {}", month_year(self.start), end)
    }

    pub fn short_date_range(&self) -> String {
        match self.end {
            Some(end) if end.year() == self.start.year() => self.start.year().to_string(),
            Some(end) => format!("{} - {}", self.start.year(), end.year()),
            None => format!("{} - Present", self.start.year()),
        }
    }

    pub fn into_response_at(self, today: NaiveDate) -> ExperienceResponse {
        ExperienceResponse {
            current: self.is_current(),
            duration: self.duration(today),
            date_range: self.date_range(),
            short_date_range: self.short_date_range(),
            total_months: self.total_months(today),
            experience: self,
        }
    }

    pub fn into_response(self) -> ExperienceResponse {
        self.into_response_at(today())
    }
}

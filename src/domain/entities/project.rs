use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    entities::{
        option_fields::OptionField,
        validation::{
            check_entries, describe_span, new_validation_error, single_error, tidy_list,
            trim_optional, validate_http_url, validate_slug,
        },
    },
    errors::AppError,
};

// ───── Constants ──────────────────────────────────────────────────────
const MIN_TITLE_LENGTH: u64 = 3;
const MAX_TITLE_LENGTH: u64 = 100;
const MIN_DESCRIPTION_LENGTH: u64 = 10;
const MAX_DESCRIPTION_LENGTH: u64 = 500;
const MAX_LONG_DESCRIPTION_LENGTH: u64 = 2000;
const MAX_TECHNOLOGY_LENGTH: usize = 50;
const MAX_SEO_TITLE_LENGTH: usize = 60;
const MAX_SEO_DESCRIPTION_LENGTH: usize = 160;
const SEO_DESCRIPTION_CUT: usize = 157;
pub const DEFAULT_ICON: &str = "code";
pub const DEFAULT_PRIORITY: i32 = 5;

labeled_enum! {
    pub enum ProjectCategory {
        AiMl => "AI/ML",
        WebDevelopment => "Web Development",
        DataScience => "Data Science",
        CloudComputing => "Cloud Computing",
        MobileApp => "Mobile App",
        Blockchain => "Blockchain",
        Other => "Other",
    }
}

labeled_enum! {
    pub enum ProjectStatus {
        Completed => "Completed",
        InProgress => "In Progress",
        Planned => "Planned",
        OnHold => "On Hold",
    }
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub long_description: Option<String>,
    pub technologies: Vec<String>,
    pub category: String,
    pub status: String,
    pub priority: i32,
    pub featured: bool,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub demo_url: Option<String>,
    pub image: Option<String>,
    pub icon: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub team_size: i32,
    pub my_role: Option<String>,
    pub challenges: Vec<String>,
    pub solutions: Vec<String>,
    pub learnings: Vec<String>,
    pub features: Vec<String>,
    pub tags: Vec<String>,
    pub views: i64,
    pub likes: i64,
    pub stars: i64,
    pub downloads: i64,
    pub seo_meta_title: Option<String>,
    pub seo_meta_description: Option<String>,
    pub seo_keywords: Vec<String>,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ───── Domain Models ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ProjectMetrics {
    pub views: i64,
    pub likes: i64,
    pub stars: i64,
    pub downloads: i64,
}

/// Stored SEO overrides. The served values are derived by [`Project::seo`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeoOverrides {
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub long_description: Option<String>,
    pub technologies: Vec<String>,
    pub category: ProjectCategory,
    pub status: ProjectStatus,
    pub priority: i32,
    pub featured: bool,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub demo_url: Option<String>,
    pub image: Option<String>,
    pub icon: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub team_size: i32,
    pub my_role: Option<String>,
    pub challenges: Vec<String>,
    pub solutions: Vec<String>,
    pub learnings: Vec<String>,
    pub features: Vec<String>,
    pub tags: Vec<String>,
    pub metrics: ProjectMetrics,
    #[serde(skip)]
    pub seo_overrides: SeoOverrides,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeoMetadata {
    pub meta_title: String,
    pub meta_description: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    #[serde(flatten)]
    pub project: Project,
    pub seo: SeoMetadata,
    pub project_duration: String,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub likes: i64,
}

#[derive(Debug, Serialize)]
pub struct CategoryGroup {
    pub category: ProjectCategory,
    pub count: i64,
    pub projects: Vec<ProjectResponse>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOverview {
    pub total_projects: i64,
    pub featured_projects: i64,
    pub completed_projects: i64,
    pub in_progress_projects: i64,
    pub total_views: i64,
    pub total_likes: i64,
    pub avg_priority: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq, sqlx::FromRow)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub overview: ProjectOverview,
    pub categories: Vec<LabelCount>,
    pub top_technologies: Vec<LabelCount>,
}

// ───── Input & Validation Requests ──────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoInput {
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProjectRequest {
    pub title: String,
    pub description: String,
    pub long_description: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub category: ProjectCategory,
    pub status: Option<ProjectStatus>,
    pub priority: Option<i32>,
    #[serde(default)]
    pub featured: bool,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub demo_url: Option<String>,
    pub image: Option<String>,
    pub icon: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub team_size: Option<i32>,
    pub my_role: Option<String>,
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default)]
    pub solutions: Vec<String>,
    #[serde(default)]
    pub learnings: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub seo: SeoInput,
    pub created_by: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub title: OptionField<String>,
    pub description: OptionField<String>,
    pub long_description: OptionField<String>,
    pub technologies: OptionField<Vec<String>>,
    pub category: OptionField<ProjectCategory>,
    pub status: OptionField<ProjectStatus>,
    pub priority: OptionField<i32>,
    pub featured: OptionField<bool>,
    pub github_url: OptionField<String>,
    pub live_url: OptionField<String>,
    pub demo_url: OptionField<String>,
    pub image: OptionField<String>,
    pub icon: OptionField<String>,
    pub start_date: OptionField<NaiveDate>,
    pub end_date: OptionField<NaiveDate>,
    pub team_size: OptionField<i32>,
    pub my_role: OptionField<String>,
    pub challenges: OptionField<Vec<String>>,
    pub solutions: OptionField<Vec<String>>,
    pub learnings: OptionField<Vec<String>>,
    pub features: OptionField<Vec<String>>,
    pub tags: OptionField<Vec<String>>,
    pub seo_meta_title: OptionField<String>,
    pub seo_meta_description: OptionField<String>,
    pub seo_keywords: OptionField<Vec<String>>,
}

/// Every writable project field, normalized and validated. Both create and
/// update persist through this shape.
#[derive(Debug, Clone, Validate)]
pub struct ProjectDraft {
    #[validate(length(
        min = MIN_TITLE_LENGTH,
        max = MAX_TITLE_LENGTH,
        message = "Title must be between 3 and 100 characters"
    ))]
    pub title: String,

    #[validate(custom(function = "validate_slug"))]
    pub slug: String,

    #[validate(length(
        min = MIN_DESCRIPTION_LENGTH,
        max = MAX_DESCRIPTION_LENGTH,
        message = "Description must be between 10 and 500 characters"
    ))]
    pub description: String,

    #[validate(length(max = MAX_LONG_DESCRIPTION_LENGTH, message = "Long description cannot exceed 2000 characters"))]
    pub long_description: Option<String>,

    #[validate(
        length(min = 1, message = "At least one technology is required"),
        custom(function = "validate_technologies")
    )]
    pub technologies: Vec<String>,

    pub category: ProjectCategory,
    pub status: ProjectStatus,

    #[validate(range(min = 1, max = 10, message = "Priority must be between 1 and 10"))]
    pub priority: i32,

    pub featured: bool,

    #[validate(custom(function = "validate_http_url"))]
    pub github_url: Option<String>,

    #[validate(custom(function = "validate_http_url"))]
    pub live_url: Option<String>,

    #[validate(custom(function = "validate_http_url"))]
    pub demo_url: Option<String>,

    pub image: Option<String>,
    pub icon: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    #[validate(range(min = 1, message = "Team size must be at least 1"))]
    pub team_size: i32,

    pub my_role: Option<String>,
    pub challenges: Vec<String>,
    pub solutions: Vec<String>,
    pub learnings: Vec<String>,
    pub features: Vec<String>,
    pub tags: Vec<String>,

    #[validate(length(max = 60, message = "Meta title cannot exceed 60 characters"))]
    pub seo_meta_title: Option<String>,

    #[validate(length(max = 160, message = "Meta description cannot exceed 160 characters"))]
    pub seo_meta_description: Option<String>,

    pub seo_keywords: Vec<String>,
    pub created_by: String,
}

// ───── Validation Helpers ───────────────────────────────────────────

fn validate_technologies(technologies: &[String]) -> Result<(), ValidationError> {
    check_entries(technologies, MAX_TECHNOLOGY_LENGTH, "Each technology must be between 1 and 50 characters")
}

/// Lowercase, runs of anything outside `[a-z0-9]` collapse to one hyphen.
pub fn slug_from_title(title: &str) -> String {
    slug::slugify(title)
}

impl ProjectDraft {
    /// Trims text, deduplicates lists and re-derives the slug from the title.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.slug = slug_from_title(&self.title);
        self.description = self.description.trim().to_string();
        self.long_description = trim_optional(self.long_description);
        self.technologies = tidy_list(self.technologies);
        self.github_url = trim_optional(self.github_url);
        self.live_url = trim_optional(self.live_url);
        self.demo_url = trim_optional(self.demo_url);
        self.image = trim_optional(self.image);
        self.icon = trim_optional(Some(self.icon)).unwrap_or_else(|| DEFAULT_ICON.to_string());
        self.my_role = trim_optional(self.my_role);
        self.challenges = tidy_list(self.challenges);
        self.solutions = tidy_list(self.solutions);
        self.learnings = tidy_list(self.learnings);
        self.features = tidy_list(self.features);
        self.tags = tidy_list(self.tags.into_iter().map(|t| t.to_lowercase()).collect());
        self.seo_meta_title = trim_optional(self.seo_meta_title);
        self.seo_meta_description = trim_optional(self.seo_meta_description);
        self.seo_keywords = tidy_list(self.seo_keywords);
        self
    }

    pub fn validated(self) -> Result<Self, ValidationErrors> {
        let draft = self.normalized();
        let mut errors = match draft.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        if let (Some(start), Some(end)) = (draft.start_date, draft.end_date) {
            if end < start {
                errors.add(
                    "end_date",
                    new_validation_error("date_order", "End date cannot be before start date"),
                );
            }
        }
        if errors.errors().is_empty() { Ok(draft) } else { Err(errors) }
    }
}

// ───── Conversions ──────────────────────────────────────────────────

impl TryFrom<ProjectRow> for Project {
    type Error = AppError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let category = row
            .category
            .parse()
            .map_err(|_| AppError::InternalError(format!("Unknown stored project category: {}", row.category)))?;
        let status = row
            .status
            .parse()
            .map_err(|_| AppError::InternalError(format!("Unknown stored project status: {}", row.status)))?;

        Ok(Project {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            long_description: row.long_description,
            technologies: row.technologies,
            category,
            status,
            priority: row.priority,
            featured: row.featured,
            github_url: row.github_url,
            live_url: row.live_url,
            demo_url: row.demo_url,
            image: row.image,
            icon: row.icon,
            start_date: row.start_date,
            end_date: row.end_date,
            team_size: row.team_size,
            my_role: row.my_role,
            challenges: row.challenges,
            solutions: row.solutions,
            learnings: row.learnings,
            features: row.features,
            tags: row.tags,
            metrics: ProjectMetrics {
                views: row.views,
                likes: row.likes,
                stars: row.stars,
                downloads: row.downloads,
            },
            seo_overrides: SeoOverrides {
                meta_title: row.seo_meta_title,
                meta_description: row.seo_meta_description,
                keywords: row.seo_keywords,
            },
            is_active: row.is_active,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl NewProjectRequest {
    pub fn into_draft(self, default_author: &str) -> Result<ProjectDraft, ValidationErrors> {
        ProjectDraft {
            title: self.title,
            slug: String::new(),
            description: self.description,
            long_description: self.long_description,
            technologies: self.technologies,
            category: self.category,
            status: self.status.unwrap_or(ProjectStatus::Completed),
            priority: self.priority.unwrap_or(DEFAULT_PRIORITY),
            featured: self.featured,
            github_url: self.github_url,
            live_url: self.live_url,
            demo_url: self.demo_url,
            image: self.image,
            icon: self.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
            start_date: self.start_date,
            end_date: self.end_date,
            team_size: self.team_size.unwrap_or(1),
            my_role: self.my_role,
            challenges: self.challenges,
            solutions: self.solutions,
            learnings: self.learnings,
            features: self.features,
            tags: self.tags,
            seo_meta_title: self.seo.meta_title,
            seo_meta_description: self.seo.meta_description,
            seo_keywords: self.seo.keywords,
            created_by: trim_optional(self.created_by).unwrap_or_else(|| default_author.to_string()),
        }
        .validated()
    }
}

macro_rules! required {
    ($patch:expr, $target:expr, $field:literal) => {
        if $patch.apply_required(&mut $target).is_err() {
            return Err(single_error($field, "required", concat!($field, " cannot be null")));
        }
    };
}

impl UpdateProjectRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_unchanged()
            && self.description.is_unchanged()
            && self.long_description.is_unchanged()
            && self.technologies.is_unchanged()
            && self.category.is_unchanged()
            && self.status.is_unchanged()
            && self.priority.is_unchanged()
            && self.featured.is_unchanged()
            && self.github_url.is_unchanged()
            && self.live_url.is_unchanged()
            && self.demo_url.is_unchanged()
            && self.image.is_unchanged()
            && self.icon.is_unchanged()
            && self.start_date.is_unchanged()
            && self.end_date.is_unchanged()
            && self.team_size.is_unchanged()
            && self.my_role.is_unchanged()
            && self.challenges.is_unchanged()
            && self.solutions.is_unchanged()
            && self.learnings.is_unchanged()
            && self.features.is_unchanged()
            && self.tags.is_unchanged()
            && self.seo_meta_title.is_unchanged()
            && self.seo_meta_description.is_unchanged()
            && self.seo_keywords.is_unchanged()
    }

    /// Missing keys leave the draft untouched, `null` clears optional fields
    /// and is rejected for required ones. The result is re-validated.
    pub fn apply_to(self, mut draft: ProjectDraft) -> Result<ProjectDraft, ValidationErrors> {
        required!(self.title, draft.title, "title");
        required!(self.description, draft.description, "description");
        required!(self.technologies, draft.technologies, "technologies");
        required!(self.category, draft.category, "category");
        required!(self.status, draft.status, "status");
        required!(self.priority, draft.priority, "priority");
        required!(self.featured, draft.featured, "featured");
        required!(self.team_size, draft.team_size, "team_size");
        self.long_description.trimmed().apply(&mut draft.long_description);
        self.github_url.trimmed().apply(&mut draft.github_url);
        self.live_url.trimmed().apply(&mut draft.live_url);
        self.demo_url.trimmed().apply(&mut draft.demo_url);
        self.image.trimmed().apply(&mut draft.image);
        self.my_role.trimmed().apply(&mut draft.my_role);
        self.start_date.apply(&mut draft.start_date);
        self.end_date.apply(&mut draft.end_date);
        self.seo_meta_title.trimmed().apply(&mut draft.seo_meta_title);
        self.seo_meta_description.trimmed().apply(&mut draft.seo_meta_description);

        let mut icon = Some(draft.icon);
        self.icon.trimmed().apply(&mut icon);
        draft.icon = icon.unwrap_or_else(|| DEFAULT_ICON.to_string());

        for (patch, target) in [
            (self.challenges, &mut draft.challenges),
            (self.solutions, &mut draft.solutions),
            (self.learnings, &mut draft.learnings),
            (self.features, &mut draft.features),
            (self.tags, &mut draft.tags),
            (self.seo_keywords, &mut draft.seo_keywords),
        ] {
            if let Some(value) = patch.into_option() {
                *target = value.unwrap_or_default();
            }
        }

        draft.validated()
    }
}

impl Project {
    pub fn to_draft(&self) -> ProjectDraft {
        ProjectDraft {
            title: self.title.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            long_description: self.long_description.clone(),
            technologies: self.technologies.clone(),
            category: self.category,
            status: self.status,
            priority: self.priority,
            featured: self.featured,
            github_url: self.github_url.clone(),
            live_url: self.live_url.clone(),
            demo_url: self.demo_url.clone(),
            image: self.image.clone(),
            icon: self.icon.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            team_size: self.team_size,
            my_role: self.my_role.clone(),
            challenges: self.challenges.clone(),
            solutions: self.solutions.clone(),
            learnings: self.learnings.clone(),
            features: self.features.clone(),
            tags: self.tags.clone(),
            seo_meta_title: self.seo_overrides.meta_title.clone(),
            seo_meta_description: self.seo_overrides.meta_description.clone(),
            seo_keywords: self.seo_overrides.keywords.clone(),
            created_by: self.created_by.clone(),
        }
    }

    pub fn seo(&self) -> SeoMetadata {
        let meta_title = self
            .seo_overrides
            .meta_title
            .clone()
            .unwrap_or_else(|| self.title.chars().take(MAX_SEO_TITLE_LENGTH).collect());

        let meta_description = self.seo_overrides.meta_description.clone().unwrap_or_else(|| {
            if self.description.chars().count() <= MAX_SEO_DESCRIPTION_LENGTH {
                self.description.clone()
            } else {
                let cut: String = self.description.chars().take(SEO_DESCRIPTION_CUT).collect();
                format!("{cut}...")
            }
        });

        let keywords = if self.seo_overrides.keywords.is_empty() {
            tidy_list(
                self.technologies
                    .iter()
                    .chain(self.tags.iter())
                    .map(|k| k.to_lowercase())
                    .collect(),
            )
        } else {
            self.seo_overrides.keywords.clone()
        };

        SeoMetadata { meta_title, meta_description, keywords }
    }

    pub fn project_duration(&self) -> String {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => describe_span(start, end),
            _ => "Not specified".to_string(),
        }
    }

    pub fn into_response(self) -> ProjectResponse {
        ProjectResponse {
            seo: self.seo(),
            project_duration: self.project_duration(),
            project: self,
        }
    }
}

/// Groups active projects per category, largest group first.
pub fn group_by_category(projects: Vec<Project>) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    for project in projects {
        match groups.iter_mut().find(|g| g.category == project.category) {
            Some(group) => {
                group.count += 1;
                group.projects.push(project.into_response());
            }
            None => groups.push(CategoryGroup {
                category: project.category,
                count: 1,
                projects: vec![project.into_response()],
            }),
        }
    }
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}

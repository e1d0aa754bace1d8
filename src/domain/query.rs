use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    entities::{
        contact::{ContactFilter, ContactStatus},
        pagination::PageRequest,
        project::{ProjectCategory, ProjectStatus},
    },
    errors::{AppError, FieldError},
};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 50;
pub const MAX_SEARCH_LENGTH: usize = 100;
pub const DEFAULT_SORT: &str = "-priority,-createdAt";
pub const FEATURED_LIMIT: i64 = 6;

/// Raw `GET /api/projects` query string. Everything arrives as text so each
/// field can be reported individually. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectListParams {
    pub category: Option<String>,
    pub status: Option<String>,
    pub featured: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Priority,
    CreatedAt,
    UpdatedAt,
    Title,
    Status,
    Category,
    Featured,
    Views,
    Likes,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Priority => "priority",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Title => "title",
            SortField::Status => "status",
            SortField::Category => "category",
            SortField::Featured => "featured",
            SortField::Views => "views",
            SortField::Likes => "likes",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "priority" => Ok(SortField::Priority),
            "createdAt" => Ok(SortField::CreatedAt),
            "updatedAt" => Ok(SortField::UpdatedAt),
            "title" => Ok(SortField::Title),
            "status" => Ok(SortField::Status),
            "category" => Ok(SortField::Category),
            "featured" => Ok(SortField::Featured),
            "views" => Ok(SortField::Views),
            "likes" => Ok(SortField::Likes),
            other => Err(format!("Unknown sort field '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

/// Predicate, order and window for one project listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectQuery {
    pub category: Option<ProjectCategory>,
    pub status: Option<ProjectStatus>,
    pub featured: Option<bool>,
    pub search: Option<String>,
    pub sort: Vec<SortKey>,
    pub page: PageRequest,
    sort_text: String,
}

/// Effective query echoed back in the list envelope.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueryEcho {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ProjectCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub sort: String,
}

impl Default for ProjectQuery {
    fn default() -> Self {
        ProjectQuery {
            category: None,
            status: None,
            featured: None,
            search: None,
            sort: parse_sort(DEFAULT_SORT).unwrap_or_default(),
            page: PageRequest::new(DEFAULT_PAGE, DEFAULT_LIMIT),
            sort_text: DEFAULT_SORT.to_string(),
        }
    }
}

impl ProjectQuery {
    /// Featured listing: featured + active, newest high-priority first, capped.
    pub fn featured() -> Self {
        ProjectQuery {
            featured: Some(true),
            page: PageRequest::new(1, FEATURED_LIMIT as u32),
            ..ProjectQuery::default()
        }
    }

    pub fn echo(&self) -> QueryEcho {
        QueryEcho {
            category: self.category,
            status: self.status,
            featured: self.featured,
            search: self.search.clone(),
            sort: self.sort_text.clone(),
        }
    }
}

impl TryFrom<ProjectListParams> for ProjectQuery {
    type Error = AppError;

    fn try_from(params: ProjectListParams) -> Result<Self, Self::Error> {
        let mut errors = Vec::new();
        let mut report = |field: &str, message: String| {
            errors.push(FieldError { field: field.to_string(), message });
        };

        let category = params.category.as_deref().and_then(|raw| {
            raw.parse::<ProjectCategory>()
                .map_err(|e| report("category", format!("Invalid category. {}", e)))
                .ok()
        });

        let status = params.status.as_deref().and_then(|raw| {
            raw.parse::<ProjectStatus>()
                .map_err(|e| report("status", format!("Invalid status. {}", e)))
                .ok()
        });

        let featured = params.featured.as_deref().and_then(|raw| match raw {
            "true" => Some(true),
            "false" => Some(false),
            _ => {
                report("featured", "Featured must be true or false".to_string());
                None
            }
        });

        let search = params.search.as_deref().and_then(|raw| match sanitize_search(raw) {
            Ok(term) => Some(term),
            Err(message) => {
                report("search", message.to_string());
                None
            }
        });

        let sort_text = params.sort.unwrap_or_else(|| DEFAULT_SORT.to_string());
        let sort = parse_sort(&sort_text).unwrap_or_else(|message| {
            report("sort", message);
            Vec::new()
        });

        let page = parse_page_request(params.page.as_deref(), params.limit.as_deref())
            .unwrap_or_else(|page_errors| {
                errors.extend(page_errors);
                PageRequest::new(DEFAULT_PAGE, DEFAULT_LIMIT)
            });

        if !errors.is_empty() {
            return Err(AppError::ValidationError(errors));
        }

        Ok(ProjectQuery {
            category,
            status,
            featured,
            search,
            sort,
            page,
            sort_text,
        })
    }
}

/// Parses `page` (>= 1) and `limit` (1..=50), reporting each field separately.
pub fn parse_page_request(page: Option<&str>, limit: Option<&str>) -> Result<PageRequest, Vec<FieldError>> {
    let mut errors = Vec::new();

    let page = match page {
        None => DEFAULT_PAGE,
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(p) if p >= 1 => p,
            _ => {
                errors.push(FieldError { field: "page".into(), message: "Page must be a positive integer".into() });
                DEFAULT_PAGE
            }
        },
    };

    let limit = match limit {
        None => DEFAULT_LIMIT,
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(l) if (1..=MAX_LIMIT).contains(&l) => l,
            _ => {
                errors.push(FieldError {
                    field: "limit".into(),
                    message: format!("Limit must be between 1 and {}", MAX_LIMIT),
                });
                DEFAULT_LIMIT
            }
        },
    };

    if errors.is_empty() { Ok(PageRequest::new(page, limit)) } else { Err(errors) }
}

/// Raw `GET /api/admin/contacts` query string.
#[derive(Debug, Default, Deserialize)]
pub struct ContactListParams {
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ContactListQuery {
    pub filter: ContactFilter,
    pub page: PageRequest,
}

impl TryFrom<ContactListParams> for ContactListQuery {
    type Error = AppError;

    fn try_from(params: ContactListParams) -> Result<Self, Self::Error> {
        let mut errors = Vec::new();

        let status = match params.status.as_deref() {
            None => None,
            Some(raw) => match raw.parse::<ContactStatus>() {
                Ok(status) => Some(status),
                Err(e) => {
                    errors.push(FieldError { field: "status".into(), message: format!("Invalid status. {}", e) });
                    None
                }
            },
        };

        let page = parse_page_request(params.page.as_deref(), params.limit.as_deref())
            .unwrap_or_else(|page_errors| {
                errors.extend(page_errors);
                PageRequest::new(DEFAULT_PAGE, DEFAULT_LIMIT)
            });

        if !errors.is_empty() {
            return Err(AppError::ValidationError(errors));
        }
        Ok(ContactListQuery { filter: ContactFilter { status }, page })
    }
}

/// Parses `-priority,createdAt` style sort strings.
pub fn parse_sort(raw: &str) -> Result<Vec<SortKey>, String> {
    let valid_chars = !raw.is_empty()
        && raw.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ',');
    if !valid_chars {
        return Err("Invalid sort format".to_string());
    }

    let mut keys: Vec<SortKey> = Vec::new();
    for part in raw.split(',').filter(|p| !p.is_empty()) {
        let (descending, name) = match part.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, part),
        };
        let field = name.parse::<SortField>()?;
        if !keys.iter().any(|k| k.field == field) {
            keys.push(SortKey { field, descending });
        }
    }

    if keys.is_empty() {
        return Err("Invalid sort format".to_string());
    }
    Ok(keys)
}

/// Strips control characters, collapses whitespace and enforces the length
/// bounds of a search term. A term needs at least one alphanumeric word.
pub fn sanitize_search(raw: &str) -> Result<String, &'static str> {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    match cleaned.chars().count() {
        0 => Err("Search term cannot be empty"),
        n if n > MAX_SEARCH_LENGTH => Err("Search term must be between 1 and 100 characters"),
        _ if !cleaned.chars().any(char::is_alphanumeric) => {
            Err("Search term must contain at least one word")
        }
        _ => Ok(cleaned),
    }
}

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{
    entities::{
        achievement::{Achievement, AchievementDraft},
        contact::{
            ContactFilter, ContactMessage, ContactNote, ContactOverview, ContactPriority,
            ContactStats, ContactStatus, DeliveryOutcome, NewContactMessage, StatusChange,
        },
        experience::{Experience, ExperienceDraft},
        pagination::{Page, PageRequest},
        project::{
            LabelCount, Project, ProjectDraft, ProjectMetrics, ProjectOverview, ProjectStats,
            ProjectStatus, SeoOverrides,
        },
        validation::hours_between,
    },
    errors::AppError,
    query::{ProjectQuery, SortField, SortKey},
    repositories::{
        achievement::{AchievementFilter, AchievementRepository},
        contact::ContactRepository,
        experience::{ExperienceFilter, ExperienceRepository},
        project::{round_tenths, ProjectRepository},
    },
};

const TOP_TECHNOLOGIES: usize = 10;

#[derive(Default)]
struct Tables {
    projects: Vec<Project>,
    experiences: Vec<Experience>,
    achievements: Vec<Achievement>,
    contacts: Vec<ContactMessage>,
}

/// Process-local storage used when no database is configured. Every
/// operation runs under one lock, so reads see a consistent snapshot and
/// counter updates are atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// ───── Projects ──────────────────────────────────────────────────────

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| stem(&w.to_lowercase()))
}

/// Folds the common English plural endings so `dashboards` meets
/// `Dashboard`, the way the Postgres english configuration does.
fn stem(word: &str) -> String {
    if word.chars().count() <= 3 {
        return word.to_string();
    }
    if let Some(root) = word.strip_suffix("ies") {
        return format!("{root}y");
    }
    for suffix in ["sses", "shes", "ches", "xes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with('s') && !(word.ends_with("ss") || word.ends_with("us") || word.ends_with("is")) {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Term-overlap rank. Every term must occur; title hits weigh double.
fn search_rank(project: &Project, search: &str) -> Option<usize> {
    let title: Vec<String> = words(&project.title).collect();
    let body: Vec<String> = words(&project.description)
        .chain(project.technologies.iter().flat_map(|t| words(t)))
        .collect();

    let terms: Vec<String> = words(search).collect();
    if terms.is_empty() {
        return None;
    }

    let mut rank = 0;
    for term in terms {
        let in_title = title.iter().filter(|w| **w == term).count();
        let in_body = body.iter().filter(|w| **w == term).count();
        if in_title + in_body == 0 {
            return None;
        }
        rank += 2 * in_title + in_body;
    }
    Some(rank)
}

fn compare_by(a: &Project, b: &Project, key: &SortKey) -> Ordering {
    let ordering = match key.field {
        SortField::Priority => a.priority.cmp(&b.priority),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Title => a.title.cmp(&b.title),
        SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        SortField::Category => a.category.as_str().cmp(b.category.as_str()),
        SortField::Featured => a.featured.cmp(&b.featured),
        SortField::Views => a.metrics.views.cmp(&b.metrics.views),
        SortField::Likes => a.metrics.likes.cmp(&b.metrics.likes),
    };
    if key.descending { ordering.reverse() } else { ordering }
}

fn matches_filters(project: &Project, query: &ProjectQuery) -> bool {
    project.is_active
        && query.category.is_none_or(|c| project.category == c)
        && query.status.is_none_or(|s| project.status == s)
        && query.featured.is_none_or(|f| project.featured == f)
}

fn project_from_draft(draft: &ProjectDraft, now: DateTime<Utc>) -> Project {
    let mut project = Project {
        id: Uuid::new_v4(),
        title: String::new(),
        slug: String::new(),
        description: String::new(),
        long_description: None,
        technologies: Vec::new(),
        category: draft.category,
        status: draft.status,
        priority: draft.priority,
        featured: draft.featured,
        github_url: None,
        live_url: None,
        demo_url: None,
        image: None,
        icon: String::new(),
        start_date: None,
        end_date: None,
        team_size: draft.team_size,
        my_role: None,
        challenges: Vec::new(),
        solutions: Vec::new(),
        learnings: Vec::new(),
        features: Vec::new(),
        tags: Vec::new(),
        metrics: ProjectMetrics::default(),
        seo_overrides: SeoOverrides::default(),
        is_active: true,
        created_by: draft.created_by.clone(),
        created_at: now,
        updated_at: now,
    };
    write_draft(&mut project, draft, now);
    project
}

fn write_draft(project: &mut Project, draft: &ProjectDraft, now: DateTime<Utc>) {
    project.title = draft.title.clone();
    project.slug = draft.slug.clone();
    project.description = draft.description.clone();
    project.long_description = draft.long_description.clone();
    project.technologies = draft.technologies.clone();
    project.category = draft.category;
    project.status = draft.status;
    project.priority = draft.priority;
    project.featured = draft.featured;
    project.github_url = draft.github_url.clone();
    project.live_url = draft.live_url.clone();
    project.demo_url = draft.demo_url.clone();
    project.image = draft.image.clone();
    project.icon = draft.icon.clone();
    project.start_date = draft.start_date;
    project.end_date = draft.end_date;
    project.team_size = draft.team_size;
    project.my_role = draft.my_role.clone();
    project.challenges = draft.challenges.clone();
    project.solutions = draft.solutions.clone();
    project.learnings = draft.learnings.clone();
    project.features = draft.features.clone();
    project.tags = draft.tags.clone();
    project.seo_overrides = SeoOverrides {
        meta_title: draft.seo_meta_title.clone(),
        meta_description: draft.seo_meta_description.clone(),
        keywords: draft.seo_keywords.clone(),
    };
    project.updated_at = now;
}

fn slug_taken(projects: &[Project], slug: &str, except: Option<Uuid>) -> Result<(), AppError> {
    if projects.iter().any(|p| p.slug == slug && Some(p.id) != except) {
        return Err(AppError::Conflict("A project with this title already exists".into()));
    }
    Ok(())
}

fn label_counts(counts: HashMap<String, i64>) -> Vec<LabelCount> {
    let mut labels: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect();
    labels.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    labels
}

fn by_priority_then_newest(a: &Project, b: &Project) -> Ordering {
    b.priority.cmp(&a.priority).then_with(|| b.created_at.cmp(&a.created_at))
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn list(&self, query: &ProjectQuery) -> Result<Page<Project>, AppError> {
        let tables = self.tables.read();

        let mut matched: Vec<(usize, &Project)> = tables
            .projects
            .iter()
            .filter(|p| matches_filters(p, query))
            .filter_map(|p| match &query.search {
                Some(search) => search_rank(p, search).map(|rank| (rank, p)),
                None => Some((0, p)),
            })
            .collect();

        if query.search.is_some() {
            matched.sort_by(|(ra, a), (rb, b)| rb.cmp(ra).then_with(|| b.priority.cmp(&a.priority)));
        } else {
            matched.sort_by(|(_, a), (_, b)| {
                query
                    .sort
                    .iter()
                    .map(|key| compare_by(a, b, key))
                    .find(|o| o.is_ne())
                    .unwrap_or_else(|| a.id.cmp(&b.id))
            });
        }

        let total = matched.len() as i64;
        let items = matched
            .into_iter()
            .skip(query.page.offset() as usize)
            .take(query.page.limit as usize)
            .map(|(_, p)| p.clone())
            .collect();

        Ok(Page { items, total })
    }

    async fn list_active(&self) -> Result<Vec<Project>, AppError> {
        let tables = self.tables.read();
        let mut projects: Vec<Project> = tables.projects.iter().filter(|p| p.is_active).cloned().collect();
        projects.sort_by(by_priority_then_newest);
        Ok(projects)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Project>, AppError> {
        Ok(self.tables.read().projects.iter().find(|p| p.id == *id).cloned())
    }

    async fn record_view_by_id(&self, id: &Uuid) -> Result<Option<Project>, AppError> {
        let mut tables = self.tables.write();
        Ok(tables
            .projects
            .iter_mut()
            .find(|p| p.id == *id && p.is_active)
            .map(|p| {
                p.metrics.views += 1;
                p.clone()
            }))
    }

    async fn record_view_by_slug(&self, slug: &str) -> Result<Option<Project>, AppError> {
        let mut tables = self.tables.write();
        Ok(tables
            .projects
            .iter_mut()
            .find(|p| p.slug == slug && p.is_active)
            .map(|p| {
                p.metrics.views += 1;
                p.clone()
            }))
    }

    async fn like(&self, id: &Uuid) -> Result<Option<i64>, AppError> {
        let mut tables = self.tables.write();
        Ok(tables
            .projects
            .iter_mut()
            .find(|p| p.id == *id && p.is_active)
            .map(|p| {
                p.metrics.likes += 1;
                p.metrics.likes
            }))
    }

    async fn create(&self, draft: &ProjectDraft) -> Result<Project, AppError> {
        let mut tables = self.tables.write();
        slug_taken(&tables.projects, &draft.slug, None)?;
        let project = project_from_draft(draft, Utc::now());
        tables.projects.push(project.clone());
        Ok(project)
    }

    async fn update(&self, id: &Uuid, draft: &ProjectDraft) -> Result<Option<Project>, AppError> {
        let mut tables = self.tables.write();
        slug_taken(&tables.projects, &draft.slug, Some(*id))?;
        Ok(tables.projects.iter_mut().find(|p| p.id == *id).map(|p| {
            write_draft(p, draft, Utc::now());
            p.clone()
        }))
    }

    async fn toggle_featured(&self, id: &Uuid) -> Result<Option<Project>, AppError> {
        let mut tables = self.tables.write();
        Ok(tables
            .projects
            .iter_mut()
            .find(|p| p.id == *id && p.is_active)
            .map(|p| {
                p.featured = !p.featured;
                p.updated_at = Utc::now();
                p.clone()
            }))
    }

    async fn soft_delete(&self, id: &Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write();
        match tables.projects.iter_mut().find(|p| p.id == *id && p.is_active) {
            Some(project) => {
                project.is_active = false;
                project.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn stats(&self) -> Result<ProjectStats, AppError> {
        let tables = self.tables.read();
        let active: Vec<&Project> = tables.projects.iter().filter(|p| p.is_active).collect();

        let count = |f: &dyn Fn(&Project) -> bool| active.iter().filter(|&&p| f(p)).count() as i64;
        let total = active.len() as i64;
        let avg_priority = if active.is_empty() {
            0.0
        } else {
            round_tenths(active.iter().map(|p| p.priority as f64).sum::<f64>() / total as f64)
        };

        let mut categories: HashMap<String, i64> = HashMap::new();
        let mut technologies: HashMap<String, i64> = HashMap::new();
        for project in &active {
            *categories.entry(project.category.as_str().to_string()).or_default() += 1;
            for tech in &project.technologies {
                *technologies.entry(tech.clone()).or_default() += 1;
            }
        }
        let mut top_technologies = label_counts(technologies);
        top_technologies.truncate(TOP_TECHNOLOGIES);

        Ok(ProjectStats {
            overview: ProjectOverview {
                total_projects: total,
                featured_projects: count(&|p| p.featured),
                completed_projects: count(&|p| p.status == ProjectStatus::Completed),
                in_progress_projects: count(&|p| p.status == ProjectStatus::InProgress),
                total_views: active.iter().map(|p| p.metrics.views).sum(),
                total_likes: active.iter().map(|p| p.metrics.likes).sum(),
                avg_priority,
            },
            categories: label_counts(categories),
            top_technologies,
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

// ───── Experiences & achievements ───────────────────────────────────

#[async_trait]
impl ExperienceRepository for MemoryStore {
    async fn list(&self, filter: &ExperienceFilter) -> Result<Vec<Experience>, AppError> {
        let tables = self.tables.read();
        let mut experiences: Vec<Experience> = tables
            .experiences
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        experiences.sort_by(|a, b| b.start.cmp(&a.start).then_with(|| a.order.cmp(&b.order)));
        Ok(experiences)
    }

    async fn create(&self, draft: &ExperienceDraft) -> Result<Experience, AppError> {
        let now = Utc::now();
        let experience = Experience {
            id: Uuid::new_v4(),
            organization: draft.organization.clone(),
            role: draft.role.clone(),
            kind: draft.kind,
            start: draft.start,
            end: draft.end,
            location: draft.location.clone(),
            description: draft.description.clone(),
            highlights: draft.highlights.clone(),
            skills: draft.skills.clone(),
            technologies: draft.technologies.clone(),
            achievements: draft.achievements.clone(),
            company_url: draft.company_url.clone(),
            company_logo: draft.company_logo.clone(),
            order: draft.order,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().experiences.push(experience.clone());
        Ok(experience)
    }
}

#[async_trait]
impl AchievementRepository for MemoryStore {
    async fn list(&self, filter: &AchievementFilter) -> Result<Vec<Achievement>, AppError> {
        let tables = self.tables.read();
        let mut achievements: Vec<Achievement> = tables
            .achievements
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();

        match filter {
            AchievementFilter::Featured => achievements
                .sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| b.date.cmp(&a.date))),
            _ => achievements.sort_by(|a, b| b.date.cmp(&a.date)),
        }
        if let AchievementFilter::Recent(limit) = filter {
            achievements.truncate((*limit).max(0) as usize);
        }
        Ok(achievements)
    }

    async fn create(&self, draft: &AchievementDraft) -> Result<Achievement, AppError> {
        let now = Utc::now();
        let achievement = Achievement {
            id: Uuid::new_v4(),
            title: draft.title.clone(),
            organization: draft.organization.clone(),
            kind: draft.kind,
            date: draft.date,
            description: draft.description.clone(),
            link: draft.link.clone(),
            credential_id: draft.credential_id.clone(),
            credential_url: draft.credential_url.clone(),
            issue_date: draft.issue_date,
            expiry_date: draft.expiry_date,
            skills: draft.skills.clone(),
            technologies: draft.technologies.clone(),
            rank: draft.rank,
            total_participants: draft.total_participants,
            score: draft.score,
            max_score: draft.max_score,
            grade: draft.grade.clone(),
            featured: draft.featured,
            verified: draft.verified,
            logo: draft.logo.clone(),
            badge: draft.badge.clone(),
            tags: draft.tags.clone(),
            priority: draft.priority,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().achievements.push(achievement.clone());
        Ok(achievement)
    }

    async fn toggle_featured(&self, id: &Uuid) -> Result<Option<Achievement>, AppError> {
        let mut tables = self.tables.write();
        Ok(tables.achievements.iter_mut().find(|a| a.id == *id).map(|a| {
            a.featured = !a.featured;
            a.updated_at = Utc::now();
            a.clone()
        }))
    }
}

// ───── Contact messages ─────────────────────────────────────────────

fn priority_rank(priority: ContactPriority) -> u8 {
    match priority {
        ContactPriority::Urgent => 0,
        ContactPriority::High => 1,
        ContactPriority::Normal => 2,
    }
}

impl MemoryStore {
    fn update_contact<T>(&self, id: &Uuid, f: impl FnOnce(&mut ContactMessage) -> T) -> Option<T> {
        let mut tables = self.tables.write();
        tables.contacts.iter_mut().find(|c| c.id == *id).map(f)
    }
}

#[async_trait]
impl ContactRepository for MemoryStore {
    async fn create(&self, message: &NewContactMessage) -> Result<ContactMessage, AppError> {
        let contact = ContactMessage::from_new(Uuid::new_v4(), message.clone());
        self.tables.write().contacts.push(contact.clone());
        Ok(contact)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<ContactMessage>, AppError> {
        Ok(self.tables.read().contacts.iter().find(|c| c.id == *id).cloned())
    }

    async fn list(&self, filter: &ContactFilter, page: PageRequest) -> Result<Page<ContactMessage>, AppError> {
        let tables = self.tables.read();
        let mut matched: Vec<&ContactMessage> = tables
            .contacts
            .iter()
            .filter(|c| !c.is_archived && filter.status.is_none_or(|s| c.status == s))
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let total = matched.len() as i64;
        let items = matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect();
        Ok(Page { items, total })
    }

    async fn unread(&self) -> Result<Vec<ContactMessage>, AppError> {
        let tables = self.tables.read();
        let mut unread: Vec<ContactMessage> = tables
            .contacts
            .iter()
            .filter(|c| c.status == ContactStatus::New && !c.is_spam && !c.is_archived)
            .cloned()
            .collect();
        unread.sort_by(|a, b| {
            priority_rank(a.priority)
                .cmp(&priority_rank(b.priority))
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(unread)
    }

    async fn urgent(&self) -> Result<Vec<ContactMessage>, AppError> {
        let tables = self.tables.read();
        let mut urgent: Vec<ContactMessage> = tables
            .contacts
            .iter()
            .filter(|c| {
                c.is_urgent()
                    && !matches!(c.status, ContactStatus::Resolved | ContactStatus::Closed)
                    && !c.is_spam
                    && !c.is_archived
            })
            .cloned()
            .collect();
        urgent.sort_by(|a, b| {
            priority_rank(a.priority)
                .cmp(&priority_rank(b.priority))
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(urgent)
    }

    async fn apply_status_change(&self, id: &Uuid, change: &StatusChange) -> Result<Option<ContactMessage>, AppError> {
        Ok(self
            .update_contact(id, |c| c.apply(change, Utc::now()).then(|| c.clone()))
            .flatten())
    }

    async fn archive(&self, id: &Uuid) -> Result<Option<ContactMessage>, AppError> {
        Ok(self.update_contact(id, |c| {
            let now = Utc::now();
            c.is_archived = true;
            c.archived_at.get_or_insert(now);
            c.updated_at = now;
            c.clone()
        }))
    }

    async fn add_note(&self, id: &Uuid, note: &ContactNote) -> Result<Option<ContactMessage>, AppError> {
        Ok(self.update_contact(id, |c| {
            c.notes.push(note.clone());
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn record_delivery(&self, id: &Uuid, outcome: &DeliveryOutcome, note: &ContactNote) -> Result<(), AppError> {
        self.update_contact(id, |c| {
            match outcome {
                DeliveryOutcome::Sent { at } => {
                    c.email_sent = true;
                    c.email_sent_at = Some(*at);
                    c.email_error = None;
                }
                DeliveryOutcome::Failed { error } => {
                    c.email_sent = false;
                    c.email_sent_at = None;
                    c.email_error = Some(error.clone());
                }
            }
            c.notes.push(note.clone());
            c.updated_at = Utc::now();
        });
        Ok(())
    }

    async fn stats(&self) -> Result<ContactStats, AppError> {
        let tables = self.tables.read();
        let contacts = &tables.contacts;

        let response_hours: Vec<f64> = contacts
            .iter()
            .filter_map(|c| c.responded_at.map(|at| hours_between(c.created_at, at)))
            .collect();
        let avg_response_time_hours = (!response_hours.is_empty())
            .then(|| round_tenths(response_hours.iter().sum::<f64>() / response_hours.len() as f64));

        let mut categories: HashMap<String, i64> = HashMap::new();
        for contact in contacts.iter().filter(|c| !c.is_spam) {
            *categories.entry(contact.category.as_str().to_string()).or_default() += 1;
        }

        Ok(ContactStats {
            overview: ContactOverview {
                total_messages: contacts.len() as i64,
                unread_messages: contacts.iter().filter(|c| c.status == ContactStatus::New).count() as i64,
                spam_messages: contacts.iter().filter(|c| c.is_spam).count() as i64,
                avg_response_time_hours,
            },
            categories: label_counts(categories),
        })
    }

    async fn archive_stale(&self, before: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tables = self.tables.write();
        let now = Utc::now();
        let mut archived = 0;
        for contact in tables.contacts.iter_mut().filter(|c| {
            !c.is_archived
                && matches!(c.status, ContactStatus::Resolved | ContactStatus::Closed)
                && c.updated_at < before
        }) {
            contact.is_archived = true;
            contact.archived_at = Some(now);
            contact.updated_at = now;
            archived += 1;
        }
        Ok(archived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entities::{
            contact::{tests::form, RequestMeta, StatusAction},
            project::tests::sample_request,
        },
        query::ProjectListParams,
    };

    async fn store_with(titles: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for title in titles {
            let draft = sample_request(title).into_draft("Owner").unwrap();
            ProjectRepository::create(&store, &draft).await.unwrap();
        }
        store
    }

    fn search(term: &str) -> ProjectQuery {
        ProjectQuery::try_from(ProjectListParams {
            search: Some(term.into()),
            ..Default::default()
        })
        .unwrap()
    }

    #[actix_rt::test]
    async fn duplicate_slug_conflicts() {
        let store = store_with(&["Portfolio API"]).await;
        let draft = sample_request("portfolio  api!").into_draft("Owner").unwrap();
        let err = ProjectRepository::create(&store, &draft).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_rt::test]
    async fn search_requires_every_term_and_ranks_title_hits() {
        let store = store_with(&["Rust Search Engine", "Weather Dashboard"]).await;

        let page = ProjectRepository::list(&store, &search("rust")).await.unwrap();
        // Both use Rust; only one carries it in the title.
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].title, "Rust Search Engine");

        let page = ProjectRepository::list(&store, &search("weather engine")).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[actix_rt::test]
    async fn search_folds_plurals_and_needs_a_word() {
        let store = store_with(&["Rust Search Engine", "Weather Dashboard"]).await;

        let page = ProjectRepository::list(&store, &search("dashboards")).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Weather Dashboard");

        let projects = ProjectRepository::list_active(&store).await.unwrap();
        assert_eq!(search_rank(&projects[0], "!!!"), None);
        assert_eq!(stem("queries"), "query");
        assert_eq!(stem("boxes"), "box");
        assert_eq!(stem("class"), "class");
    }

    #[actix_rt::test]
    async fn views_and_likes_increment_in_place() {
        let store = store_with(&["Counter"]).await;
        let id = ProjectRepository::list_active(&store).await.unwrap()[0].id;

        let viewed = store.record_view_by_id(&id).await.unwrap().unwrap();
        assert_eq!(viewed.metrics.views, 1);
        assert_eq!(store.like(&id).await.unwrap(), Some(1));
        assert_eq!(store.like(&id).await.unwrap(), Some(2));

        assert!(store.soft_delete(&id).await.unwrap());
        assert!(store.record_view_by_id(&id).await.unwrap().is_none());
        assert!(!store.soft_delete(&id).await.unwrap());
    }

    #[actix_rt::test]
    async fn stale_status_change_is_rejected() {
        let store = MemoryStore::new();
        let new = form("Hello there", "Just wanted to say hi to you.")
            .into_new_message(RequestMeta::default(), Utc::now())
            .unwrap();
        let contact = ContactRepository::create(&store, &new).await.unwrap();

        let read = contact.plan(StatusAction::MarkRead, Utc::now()).unwrap().unwrap();
        let close = contact.plan(StatusAction::Close, Utc::now()).unwrap().unwrap();

        assert!(store.apply_status_change(&contact.id, &read).await.unwrap().is_some());
        // Planned against `New`, but the record is now `Read`.
        assert!(store.apply_status_change(&contact.id, &close).await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn archive_is_idempotent() {
        let store = MemoryStore::new();
        let new = form("Hello there", "Just wanted to say hi to you.")
            .into_new_message(RequestMeta::default(), Utc::now())
            .unwrap();
        let contact = ContactRepository::create(&store, &new).await.unwrap();

        let first = store.archive(&contact.id).await.unwrap().unwrap();
        let second = store.archive(&contact.id).await.unwrap().unwrap();
        assert_eq!(first.archived_at, second.archived_at);

        let page = ContactRepository::list(&store, &ContactFilter::default(), PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }
}

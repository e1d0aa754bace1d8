use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;

use crate::{
    entities::{
        achievement::{AchievementDraft, NewAchievementRequest},
        experience::{ExperienceDraft, NewExperienceRequest},
        project::NewProjectRequest,
    },
    errors::AppError,
    repositories::{
        achievement::AchievementRepository, experience::ExperienceRepository,
        project::ProjectRepository,
    },
};

/// Sample content shipped in `seed/portfolio.json`.
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub projects: Vec<NewProjectRequest>,
    #[serde(default)]
    pub experiences: Vec<NewExperienceRequest>,
    #[serde(default)]
    pub achievements: Vec<NewAchievementRequest>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub projects: usize,
    pub experiences: usize,
    pub achievements: usize,
}

impl SeedData {
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading seed file {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing seed file {}", path.display()))
    }

    /// Validates every entry and writes it through the repositories. The
    /// first invalid entry aborts the load.
    pub async fn load(
        self,
        owner: &str,
        projects: &dyn ProjectRepository,
        experiences: &dyn ExperienceRepository,
        achievements: &dyn AchievementRepository,
    ) -> Result<SeedSummary, AppError> {
        let mut summary = SeedSummary::default();

        for request in self.projects {
            let draft = request.into_draft(owner)?;
            projects.create(&draft).await?;
            summary.projects += 1;
        }

        for request in self.experiences {
            let draft = ExperienceDraft::try_from(request)?;
            experiences.create(&draft).await?;
            summary.experiences += 1;
        }

        for request in self.achievements {
            let draft = AchievementDraft::try_from(request)?;
            achievements.create(&draft).await?;
            summary.achievements += 1;
        }

        tracing::info!(
            projects = summary.projects,
            experiences = summary.experiences,
            achievements = summary.achievements,
            "Seed data loaded"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[actix_rt::test]
    async fn bundled_seed_file_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/seed/portfolio.json");
        let data = SeedData::from_path(path).unwrap();
        let store = MemoryStore::new();

        let summary = data.load("Owner", &store, &store, &store).await.unwrap();

        assert_eq!(summary, SeedSummary { projects: 3, experiences: 3, achievements: 3 });
    }

    #[actix_rt::test]
    async fn invalid_entry_aborts_the_load() {
        let data: SeedData = serde_json::from_value(serde_json::json!({
            "projects": [{ "title": "x", "description": "short", "category": "Other" }]
        }))
        .unwrap();
        let store = MemoryStore::new();

        let result = data.load("Owner", &store, &store, &store).await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }
}

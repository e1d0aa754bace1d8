use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::time::timeout;

use crate::{
    entities::{
        contact::{
            ContactFilter, ContactForm, ContactMessage, ContactResponse, ContactStats,
            DeliveryOutcome, NoteRequest, RequestMeta, StatusAction, SubmissionReceipt,
        },
        pagination::{Page, PageRequest},
    },
    errors::AppError,
    mail::{auto_reply, owner_notification, MailError, Mailer},
    repositories::contact::ContactRepository,
    utils::valid_uuid::valid_uuid,
};

/// Result of a submission as seen by the visitor.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Stored but flagged as spam. No mail goes out.
    Flagged(SubmissionReceipt),
    Received(SubmissionReceipt),
}

/// Everything the delivery task needs, detached from the request.
#[derive(Clone)]
pub struct Notifier {
    pub mailer: Arc<dyn Mailer>,
    pub owner_name: String,
    pub site_url: String,
    pub wait: Duration,
}

pub struct ContactHandler<R = dyn ContactRepository>
where
    R: ContactRepository + ?Sized,
{
    pub repo: Arc<R>,
    pub notifier: Notifier,
}

fn not_found() -> AppError {
    AppError::NotFound("Contact message not found".to_string())
}

impl<R> ContactHandler<R>
where
    R: ContactRepository + ?Sized + 'static,
{
    pub fn new(repo: Arc<R>, notifier: Notifier) -> Self {
        ContactHandler { repo, notifier }
    }

    /// Stores the submission, then sends notifications in a detached task.
    /// The caller waits at most `notifier.wait` for the outcome.
    pub async fn submit(&self, form: ContactForm, meta: RequestMeta) -> Result<Submission, AppError> {
        let new_message = form.into_new_message(meta, Utc::now())?;
        let message = self.repo.create(&new_message).await?;

        if message.is_spam {
            tracing::warn!(
                contact_id = %message.id,
                spam_score = message.spam_score,
                ip = message.ip_address.as_deref().unwrap_or("unknown"),
                "Contact submission flagged as spam"
            );
            return Ok(Submission::Flagged(SubmissionReceipt::spam(message.id)));
        }

        tracing::info!(contact_id = %message.id, priority = %message.priority, "Contact submission stored");

        let id = message.id;
        let task = tokio::spawn(deliver(Arc::clone(&self.repo), self.notifier.clone(), message));

        let outcome = match timeout(self.notifier.wait, task).await {
            Ok(Ok(outcome)) => Some(outcome),
            Ok(Err(e)) => {
                tracing::error!(contact_id = %id, error = %e, "Email delivery task aborted");
                None
            }
            Err(_) => {
                tracing::info!(contact_id = %id, "Email delivery still running, responding without outcome");
                None
            }
        };

        Ok(Submission::Received(SubmissionReceipt::delivered(id, outcome.as_ref())))
    }

    pub async fn list(&self, filter: ContactFilter, page: PageRequest) -> Result<Page<ContactResponse>, AppError> {
        let page_data = self.repo.list(&filter, page).await?;
        Ok(page_data.map(|m| m.into_response()))
    }

    pub async fn unread(&self) -> Result<Vec<ContactResponse>, AppError> {
        Ok(self.repo.unread().await?.into_iter().map(|m| m.into_response()).collect())
    }

    pub async fn urgent(&self) -> Result<Vec<ContactResponse>, AppError> {
        Ok(self.repo.urgent().await?.into_iter().map(|m| m.into_response()).collect())
    }

    pub async fn get(&self, id: &str) -> Result<ContactResponse, AppError> {
        let id = valid_uuid(id)?;
        self.repo.get(&id).await?.map(|m| m.into_response()).ok_or_else(not_found)
    }

    /// Moves a message through its lifecycle. A transition that is already
    /// satisfied returns the message unchanged. A concurrent move between
    /// read and write is reported as a conflict.
    pub async fn transition(&self, id: &str, action: StatusAction) -> Result<ContactResponse, AppError> {
        let id = valid_uuid(id)?;
        let current = self.repo.get(&id).await?.ok_or_else(not_found)?;

        let Some(change) = current.plan(action, Utc::now())? else {
            return Ok(current.into_response());
        };

        let updated = self
            .repo
            .apply_status_change(&id, &change)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("Contact message status changed concurrently, please retry".to_string())
            })?;

        tracing::info!(contact_id = %id, from = %change.from(), to = %change.to(), "Contact status changed");
        Ok(updated.into_response())
    }

    pub async fn archive(&self, id: &str) -> Result<ContactResponse, AppError> {
        let id = valid_uuid(id)?;
        let message = self.repo.archive(&id).await?.ok_or_else(not_found)?;
        tracing::info!(contact_id = %id, "Contact message archived");
        Ok(message.into_response())
    }

    pub async fn add_note(&self, id: &str, request: NoteRequest) -> Result<ContactResponse, AppError> {
        let id = valid_uuid(id)?;
        let note = request.into_note(Utc::now())?;
        self.repo
            .add_note(&id, &note)
            .await?
            .map(|m| m.into_response())
            .ok_or_else(not_found)
    }

    pub async fn stats(&self) -> Result<ContactStats, AppError> {
        self.repo.stats().await
    }
}

async fn deliver<R>(repo: Arc<R>, notifier: Notifier, message: ContactMessage) -> DeliveryOutcome
where
    R: ContactRepository + ?Sized,
{
    let outcome = match send_notifications(&notifier, &message).await {
        Ok(()) => DeliveryOutcome::Sent { at: Utc::now() },
        Err(e) => {
            tracing::error!(contact_id = %message.id, error = %e, "Contact email delivery failed");
            DeliveryOutcome::Failed { error: e.to_string() }
        }
    };

    let note = outcome.system_note(message.ip_address.as_deref(), Utc::now());
    if let Err(e) = repo.record_delivery(&message.id, &outcome, &note).await {
        tracing::error!(contact_id = %message.id, error = %e, "Failed to record email delivery outcome");
    }
    outcome
}

async fn send_notifications(notifier: &Notifier, message: &ContactMessage) -> Result<(), MailError> {
    let owner = notifier.mailer.owner_address().ok_or(MailError::NotConfigured)?;

    notifier.mailer.send(owner_notification(message, &owner)).await?;
    notifier
        .mailer
        .send(auto_reply(message, &notifier.owner_name, &notifier.site_url))
        .await
}

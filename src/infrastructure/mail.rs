use async_trait::async_trait;
use derive_more::Display;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

#[cfg(test)]
use mockall::automock;

use crate::{entities::contact::ContactMessage, settings::AppConfig};

#[derive(Debug, Display, Clone, PartialEq)]
pub enum MailError {
    #[display("Email transport not configured")]
    NotConfigured,
    #[display("Invalid email address: {_0}")]
    Address(String),
    #[display("Email build error: {_0}")]
    Build(String),
    #[display("SMTP transport error: {_0}")]
    Transport(String),
}

impl std::error::Error for MailError {}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Address owner notifications go to, if any.
    fn owner_address(&self) -> Option<String>;
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// STARTTLS relay with credentials from configuration.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    owner: String,
}

impl SmtpMailer {
    pub fn new(host: &str, port: u16, user: &str, pass: &str, owner: &str) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(port)
            .credentials(Credentials::new(user.to_string(), pass.to_string()))
            .build();
        let from = user.parse().map_err(|e: lettre::address::AddressError| MailError::Address(e.to_string()))?;

        Ok(SmtpMailer { transport, from, owner: owner.to_string() })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn owner_address(&self) -> Option<String> {
        Some(self.owner.clone())
    }

    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let to: Mailbox = email.to.parse().map_err(|e: lettre::address::AddressError| MailError::Address(e.to_string()))?;

        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML);
        if let Some(reply_to) = email.reply_to {
            let reply_to: Mailbox = reply_to
                .parse()
                .map_err(|e: lettre::address::AddressError| MailError::Address(e.to_string()))?;
            builder = builder.reply_to(reply_to);
        }
        let message = builder.body(email.html).map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Stand-in used when no SMTP credentials are configured. Every send fails.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    fn owner_address(&self) -> Option<String> {
        None
    }

    async fn send(&self, _email: OutgoingEmail) -> Result<(), MailError> {
        Err(MailError::NotConfigured)
    }
}

/// Picks the SMTP mailer when credentials are present.
pub fn mailer_from_config(config: &AppConfig) -> Box<dyn Mailer> {
    let (Some(user), Some(pass), Some(owner)) = (
        config.email_user.as_deref(),
        config.email_pass.as_deref(),
        config.notification_recipient(),
    ) else {
        tracing::warn!("Email credentials missing, contact notifications are disabled");
        return Box::new(DisabledMailer);
    };

    match SmtpMailer::new(&config.smtp_host, config.smtp_port, user, pass, owner) {
        Ok(mailer) => Box::new(mailer),
        Err(e) => {
            tracing::error!(error = %e, "Failed to configure SMTP transport");
            Box::new(DisabledMailer)
        }
    }
}

// ───── Templates ────────────────────────────────────────────────────

fn escape(text: &str) -> String {
    ammonia::clean_text(text)
}

fn row(label: &str, value: Option<&str>) -> String {
    value
        .map(|v| format!("<p><strong>{}:</strong> {}</p>", label, escape(v)))
        .unwrap_or_default()
}

/// Notification sent to the site owner for a new submission.
pub fn owner_notification(contact: &ContactMessage, to: &str) -> OutgoingEmail {
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
<h2 style="color: #2563eb;">New Contact Form Submission</h2>
<div style="background: #f8fafc; padding: 20px; border-radius: 8px;">
{name}{email}{phone}{company}{website}{category}{priority}
</div>
<h3>Message</h3>
<p style="white-space: pre-wrap;">{message}</p>
<p style="color: #64748b; font-size: 12px;">Submitted {submitted} from {ip}</p>
</div>"#,
        name = row("Name", Some(&contact.name)),
        email = row("Email", Some(&contact.email)),
        phone = row("Phone", contact.phone.as_deref()),
        company = row("Company", contact.company.as_deref()),
        website = row("Website", contact.website.as_deref()),
        category = row("Category", Some(contact.category.as_str())),
        priority = row("Priority", Some(contact.priority.as_str())),
        message = escape(&contact.message),
        submitted = contact.created_at.format("%Y-%m-%d %H:%M UTC"),
        ip = escape(contact.ip_address.as_deref().unwrap_or("unknown")),
    );

    OutgoingEmail {
        to: to.to_string(),
        reply_to: Some(contact.email.clone()),
        subject: format!("New Contact Form Submission: {}", contact.subject),
        html,
    }
}

/// Acknowledgement sent back to the sender.
pub fn auto_reply(contact: &ContactMessage, owner_name: &str, site_url: &str) -> OutgoingEmail {
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
<h2 style="color: #2563eb;">Thank you for reaching out!</h2>
<p>Hi {name},</p>
<p>Thanks for your message about "{subject}". I have received it and will get back to you within 24 hours.</p>
<blockquote style="border-left: 4px solid #2563eb; padding-left: 12px; color: #475569;">{message}</blockquote>
<p>Best regards,<br>{owner}</p>
<p><a href="{site}">{site}</a></p>
</div>"#,
        name = escape(&contact.name),
        subject = escape(&contact.subject),
        message = escape(&contact.message),
        owner = escape(owner_name),
        site = escape(site_url),
    );

    OutgoingEmail {
        to: contact.email.clone(),
        reply_to: None,
        subject: format!("Thank you for contacting {}", owner_name),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::contact::{tests::form, RequestMeta};
    use chrono::Utc;
    use uuid::Uuid;

    fn contact(message: &str) -> ContactMessage {
        let new = form("Project inquiry", message)
            .into_new_message(RequestMeta::default(), Utc::now())
            .unwrap();
        ContactMessage::from_new(Uuid::new_v4(), new)
    }

    #[test]
    fn user_text_is_escaped() {
        let contact = contact("<script>alert('x')</script> please reply");
        let email = owner_notification(&contact, "owner@example.com");
        assert!(!email.html.contains("<script>"));
        assert!(email.html.contains("&lt;script&gt;"));
        assert_eq!(email.reply_to.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn auto_reply_goes_to_sender() {
        let contact = contact("Would love to work together on this.");
        let email = auto_reply(&contact, "Jane Doe", "https://jane.dev");
        assert_eq!(email.to, "ada@example.com");
        assert!(email.subject.contains("Jane Doe"));
    }

    #[actix_rt::test]
    async fn disabled_mailer_reports_missing_transport() {
        let contact = contact("Would love to work together on this.");
        let err = DisabledMailer
            .send(auto_reply(&contact, "Jane", "https://jane.dev"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Email transport not configured");
    }
}

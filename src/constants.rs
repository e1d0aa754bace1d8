use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

/// Process start. Forced in `main` so `/health` uptime counts from boot.
pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

pub const SERVICE_NAME: &str = "Portfolio API";

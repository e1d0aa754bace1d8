pub mod achievements;
pub mod auth;
pub mod contact;
pub mod experiences;
pub mod extractors;
pub mod projects;

pub mod achievement;
pub mod contact;
pub mod experience;
pub mod project;
pub mod sqlx_repo;
pub mod token;

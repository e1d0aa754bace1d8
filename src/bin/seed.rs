//! Operator tool. `seed [path]` loads sample content into the configured
//! database, `seed hash-password <password>` prints an `ADMIN_PASSWORD_HASH`.

use std::process::ExitCode;

use portfolio_api::{
    auth::password::hash_password,
    db::postgres::{create_pool, run_migrations},
    seed::SeedData,
    settings::AppConfig,
    Repositories,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_SEED_PATH: &str = "seed/portfolio.json";

fn usage() -> ExitCode {
    eprintln!("usage: seed [path/to/seed.json]");
    eprintln!("       seed hash-password <password>");
    ExitCode::FAILURE
}

async fn load(path: &str) -> anyhow::Result<()> {
    let config = AppConfig::new()?;
    if !config.uses_database() {
        anyhow::bail!("DATABASE_URL must be set to seed the database");
    }

    let data = SeedData::from_path(path)?;
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let repos = Repositories::postgres(pool);
    let summary = data
        .load(
            &config.owner_name,
            repos.projects.as_ref(),
            repos.experiences.as_ref(),
            repos.achievements.as_ref(),
        )
        .await
        .map_err(|e| anyhow::anyhow!("seeding failed: {}", e))?;

    println!(
        "Seeded {} projects, {} experiences, {} achievements",
        summary.projects, summary.experiences, summary.achievements
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [cmd, password] if cmd == "hash-password" => match hash_password(password) {
            Ok(hash) => {
                println!("{}", hash);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::FAILURE
            }
        },
        [cmd, ..] if cmd == "hash-password" => usage(),
        [] | [_] => {
            let path = args.first().map(String::as_str).unwrap_or(DEFAULT_SEED_PATH);
            match load(path).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!("{:#}", e);
                    ExitCode::FAILURE
                }
            }
        }
        _ => usage(),
    }
}

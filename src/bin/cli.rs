use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use marketplace_authz::authz::{
    Action, Actor, AuthorizationEngine, Capability, PermissionTable, PolicyEvaluator, ResourceContext, Role,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "marketplace authorization admin tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new empty migration with the provided name
    MakeMigration { name: String },
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Roll back the last applied migration
    MigrateRollback,
    /// Set the role of an existing account
    Promote {
        #[arg(long)]
        email: String,
        #[arg(long)]
        role: String,
    },
    /// Evaluate one decision against the configured permission table
    Check {
        #[arg(long)]
        role: String,
        #[arg(long)]
        capability: String,
        #[arg(long)]
        actor_id: Option<Uuid>,
        #[arg(long)]
        target_id: Option<Uuid>,
    },
    /// Print the effective role -> capability table
    Table,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Try to load env from CWD; when running in Docker the binary CWD may differ,
    // so fall back to the crate-local `.env` using CARGO_MANIFEST_DIR.
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MakeMigration { name } => {
            let path = make_migration_file(&name)?;
            println!("Created migration: {}", path.display());
        }
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            print_status(&pool, &migrator).await?;
        }
        Commands::MigrateRollback => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator
                .undo(&pool, 1)
                .await
                .context("no migrations were rolled back")?;
            println!("Rolled back last migration");
        }
        Commands::Promote { email, role } => {
            let role: Role = role.parse()?;
            let pool = get_pool().await?;
            promote(&pool, &email, role).await?;
            println!("{} is now {}", email, role);
        }
        Commands::Check { role, capability, actor_id, target_id } => {
            let engine = AuthorizationEngine::new(PermissionTable::from_env()?);
            let actor = Actor::parse(actor_id.unwrap_or_else(Uuid::new_v4), &role)?;
            let mut action = Action::parse(&capability)?;
            action.target_id = target_id;

            let decision = engine.evaluate(&actor, &action, &ResourceContext::new());
            match decision.reason() {
                None => println!("allow"),
                Some(reason) => println!("deny: {} ({})", reason.as_str(), reason),
            }
        }
        Commands::Table => {
            let table = PermissionTable::from_env()?;
            for role in Role::ALL {
                let caps: Vec<&str> = table.capabilities_for(role).iter().map(Capability::as_str).collect();
                println!("{:<8} {}", role, caps.join(", "));
            }
            let guarded: Vec<&str> = Capability::ALL
                .iter()
                .filter(|cap| table.is_non_self_applicable(**cap))
                .map(Capability::as_str)
                .collect();
            println!("{:<8} {}", "no-self", guarded.join(", "));
        }
    }

    Ok(())
}

async fn promote(pool: &SqlitePool, email: &str, role: Role) -> anyhow::Result<()> {
    let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE email = ?")
        .bind(role.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(email.trim().to_lowercase())
        .execute(pool)
        .await
        .context("failed to update role")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("no account with email {email}");
    }
    Ok(())
}

fn make_migration_file(name: &str) -> anyhow::Result<PathBuf> {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let sanitized = sanitize_name(name);
    let filename = format!("{}_{}.sql", timestamp, sanitized);
    let path = Path::new("migrations").join(filename);

    if path.exists() {
        anyhow::bail!("migration already exists: {}", path.display());
    }

    fs::write(&path, "-- Write your migration SQL here\n")
        .with_context(|| format!("failed to create migration at {}", path.display()))?;

    Ok(path)
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to database")
}

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    // If the migrations table doesn't exist, nothing is applied yet
    let tracked: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'")
            .fetch_optional(pool)
            .await?;
    let applied_versions: HashSet<i64> = if tracked.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in migrator.iter() {
        let status = if applied_versions.contains(&migration.version) { "applied" } else { "pending" };
        let desc = migration.description.as_ref().trim();
        let name = if desc.is_empty() { "unknown" } else { desc };
        println!("{:<8} {:<20} {}", status, migration.version, name);
    }

    Ok(())
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect()
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    // Prefer ./migrations when run from the repo root, else the crate-local folder.
    let local = Path::new("./migrations");
    let migrator_path = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let migrator_path_display = migrator_path.display().to_string();
    sqlx::migrate::Migrator::new(migrator_path)
        .await
        .with_context(|| format!("failed to load migrations from {}", migrator_path_display))
}

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::{fs::File, io, net::SocketAddr, path::PathBuf, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fixture_scheduler::{
    clock::SystemClock,
    config::AppConfig,
    export::write_fixtures_csv,
    postgres::PostgresMatchRepository,
    repository::{InMemoryMatchRepository, MatchRepository},
    teams::{CsvTeamSource, TeamSource},
    web::{self, AppState},
    FixtureService,
};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate and store the double round-robin calendar of a division
    Generate {
        /// CSV file with columns id,name,short_name,city,division_id
        #[arg(short, long)]
        teams: PathBuf,
        /// Division to schedule
        #[arg(short, long)]
        division: i64,
        /// First possible kick-off (RFC 3339); defaults to now plus the lead time
        #[arg(short, long)]
        start: Option<DateTime<Utc>>,
        /// Where to write the fixtures CSV; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Serve the fixture HTTP API
    Serve,
    /// Print the effective scheduler configuration as JSON
    Config,
}

async fn build_repository(config: &AppConfig) -> Result<Arc<dyn MatchRepository>> {
    match &config.database.url {
        Some(url) => {
            let repo = PostgresMatchRepository::connect(url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            repo.ensure_schema().await.context("Failed to create schema")?;
            info!("Using Postgres match store");
            Ok(Arc::new(repo))
        }
        None => {
            warn!("DATABASE_URL not set, fixtures are kept in memory only");
            Ok(Arc::new(InMemoryMatchRepository::new()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Commands::Generate {
            teams,
            division,
            start,
            output,
        } => {
            let source = CsvTeamSource::from_path(&teams)
                .with_context(|| format!("Failed to load teams from {:?}", teams))?;
            let division_teams = source.teams_in_division(division)?;
            info!("Loaded {} teams for division {}", division_teams.len(), division);

            let repository = build_repository(&config).await?;
            let service = FixtureService::new(repository, Arc::new(SystemClock), config.scheduler);
            let records = service
                .generate_for_teams(division, &division_teams, start)
                .await?;

            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {:?}", path))?;
                    write_fixtures_csv(file, &records, &division_teams)?;
                    info!("Wrote {} fixtures to {:?}", records.len(), path);
                }
                None => write_fixtures_csv(io::stdout().lock(), &records, &division_teams)?,
            }
        }
        Commands::Serve => {
            let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
                .parse()
                .context("Invalid SERVER_HOST/SERVER_PORT")?;
            let repository = build_repository(&config).await?;
            let service = FixtureService::new(repository, Arc::new(SystemClock), config.scheduler);
            web::serve(
                AppState {
                    service: Arc::new(service),
                },
                addr,
            )
            .await?;
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config.scheduler)?);
        }
    }

    Ok(())
}

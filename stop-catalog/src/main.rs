use std::process::ExitCode;

use stop_catalog::config::AppConfig;
use stop_catalog::domain::{RoutePatternId, Stop, StopId};
use stop_catalog::repository::{RepositoryError, StopRepository};
use stop_catalog::store::{SqliteStore, StopStore};
use stop_catalog::upstream::{DigitransitClient, StopSource};
use tracing::error;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: stop-catalog <command> [args]

Commands:
  list                                      List all stops in the catalog
  get <stop-id>                             Show one stored stop
  ensure <stop-id>...                       Fetch and store stops not yet in the catalog
  add-route-pattern <route-pattern-id>      Register a route pattern
  associate <stop-id> <route-pattern-id>    Link a stop to a route pattern

Environment:
  DIGITRANSIT_API_KEY   Subscription key (required)
  DIGITRANSIT_URL       GraphQL endpoint override
  DATABASE_URL          sqlx SQLite URL (default sqlite://stops.db?mode=rwc)
  RUST_LOG              Log filter (default stop_catalog=info)";

type BoxError = Box<dyn std::error::Error>;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stop_catalog=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args[0] == "-h" || args[0] == "--help" {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &[String]) -> Result<(), BoxError> {
    let config = AppConfig::from_env()?;

    let upstream = DigitransitClient::new(config.upstream)?;
    let store = SqliteStore::connect(&config.store).await?;
    store.migrate().await?;

    let repo = StopRepository::new(upstream, store);

    match (args[0].as_str(), &args[1..]) {
        ("list", []) => {
            for stop in repo.list().await? {
                print_stop(&stop)?;
            }
        }
        ("get", [id]) => {
            let stop = repo.get_by_id(&StopId::parse(id.as_str())?).await?;
            print_stop(&stop)?;
        }
        ("ensure", ids) if !ids.is_empty() => {
            for id in ids {
                let stop = ensure(&repo, &StopId::parse(id.as_str())?).await?;
                print_stop(&stop)?;
            }
        }
        ("add-route-pattern", [id]) => {
            let pattern = repo
                .store()
                .insert_route_pattern(&RoutePatternId::parse(id.as_str())?)
                .await?;
            println!("{}", pattern.id);
        }
        ("associate", [stop_id, route_pattern_id]) => {
            repo.associate_to_route_pattern(
                &StopId::parse(stop_id.as_str())?,
                &RoutePatternId::parse(route_pattern_id.as_str())?,
            )
            .await?;
        }
        _ => {
            eprintln!("{USAGE}");
            return Err("unrecognised command".into());
        }
    }

    Ok(())
}

/// Return the stored stop, creating it from upstream on first reference.
async fn ensure<U: StopSource, S: StopStore>(
    repo: &StopRepository<U, S>,
    stop_id: &StopId,
) -> Result<Stop, RepositoryError> {
    match repo.get_by_id(stop_id).await {
        Err(e) if e.is_no_such_stop() => repo.create_by_id(stop_id).await,
        other => other,
    }
}

fn print_stop(stop: &Stop) -> Result<(), BoxError> {
    println!("{}", serde_json::to_string(stop)?);
    Ok(())
}

use casewhat::config::AppConfig;
use casewhat::{run, RallyService, RunOutcome, WalkOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load()?;
    let service = RallyService::from_config(&config)?;
    log::debug!("using {}", service.api_base());

    // A missing argument is reported by the resolver as "ID missing"
    let folder_id = std::env::args().nth(1);

    match run(&service, folder_id.as_deref()).await {
        RunOutcome::Walked(WalkOutcome::Completed { updated }) => {
            log::info!("updated {} test cases", updated);
        }
        RunOutcome::Walked(WalkOutcome::Halted { updated, test_case, .. }) => {
            log::info!("stopped at {} after updating {} test cases", test_case, updated);
        }
        RunOutcome::FolderUnresolved | RunOutcome::FetchFailed => {}
    }

    Ok(())
}

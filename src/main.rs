use clap::{Arg, Command};
use humanflow::{
    run_session, ChromeEngine, Credentials, ProxyConfig, RunConfig, SessionConfig,
    SimulationTuning, StorefrontAutomation,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let matches = Command::new("humanflow")
        .about("Human-paced storefront automation")
        .arg(
            Arg::new("headed")
                .long("headed")
                .help("Run the browser with a visible window")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("products")
                .long("products")
                .value_parser(clap::value_parser!(usize))
                .help("How many products to interact with (defaults to a random 1..=3)"),
        )
        .arg(
            Arg::new("url")
                .long("url")
                .default_value("https://www.saucedemo.com")
                .help("Storefront origin"),
        )
        .arg(
            Arg::new("screenshot-dir")
                .long("screenshot-dir")
                .default_value("screenshots")
                .help("Where checkpoint screenshots are written"),
        )
        .get_matches();

    // Demo-account defaults match the target site's published test user.
    let credentials = Credentials::new(
        std::env::var("HUMANFLOW_USERNAME").unwrap_or_else(|_| "standard_user".to_string()),
        std::env::var("HUMANFLOW_PASSWORD").unwrap_or_else(|_| "secret_sauce".to_string()),
    );

    let proxy = match std::env::var("HUMANFLOW_PROXY_SERVER") {
        Ok(server) => {
            let mut proxy = ProxyConfig::new(server)?;
            if let Ok(username) = std::env::var("HUMANFLOW_PROXY_USERNAME") {
                let password = std::env::var("HUMANFLOW_PROXY_PASSWORD").unwrap_or_default();
                proxy = proxy.with_basic_auth(username, password);
            }
            Some(proxy)
        }
        Err(_) => None,
    };

    let run_config = RunConfig {
        base_url: matches
            .get_one::<String>("url")
            .cloned()
            .unwrap_or_default(),
        credentials: Some(credentials),
        num_products: matches.get_one::<usize>("products").copied(),
        tuning: SimulationTuning::default(),
        screenshot_dir: matches
            .get_one::<String>("screenshot-dir")
            .cloned()
            .unwrap_or_else(|| "screenshots".to_string())
            .into(),
    };
    run_config.validate()?;

    let session_config = SessionConfig {
        headless: !matches.get_flag("headed"),
        proxy,
        ..Default::default()
    };

    info!(
        "Starting storefront automation against {}",
        run_config.base_url
    );

    let engine = ChromeEngine::new();
    match run_session(engine, &session_config, |page| {
        StorefrontAutomation::new(page, &run_config)
    })
    .await
    {
        Ok(summary) => {
            info!("Run complete: {}", summary.report());
            Ok(())
        }
        Err(err) => {
            error!("Run failed: {}", err);
            Err(err.into())
        }
    }
}

use campaignhub::config::Config;
use campaignhub::metadata::{ContentAddress, MetadataSource};
use campaignhub::AppState;
use dotenvy::dotenv;
use std::env;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Prints aggregated campaign views as JSON.
///
///   inspect               every campaign
///   inspect --id 3        one campaign, metadata looked up by id
///   inspect --id 3 --ipfs ipfs://<hash>
#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let _ = dotenv();

    let args: Vec<String> = env::args().collect();
    let flag_value = |flag: &str| {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .cloned()
    };

    let state = match Config::from_env().and_then(AppState::from_config) {
        Ok(state) => state,
        Err(e) => {
            error!("failed to load configuration: {}", e);
            std::process::exit(2);
        }
    };

    let output = match flag_value("--id") {
        Some(raw_id) => {
            let id: u64 = match raw_id.parse() {
                Ok(id) => id,
                Err(e) => {
                    error!("invalid --id '{}': {}", raw_id, e);
                    std::process::exit(2);
                }
            };
            let source = match flag_value("--ipfs").map(|raw| ContentAddress::parse(&raw)) {
                Some(Ok(address)) => MetadataSource::ByAddress(address),
                Some(Err(e)) => {
                    error!("invalid --ipfs value: {}", e);
                    std::process::exit(2);
                }
                None => MetadataSource::ById,
            };
            state
                .aggregator
                .aggregate(id, source)
                .await
                .and_then(|view| serde_json::to_string_pretty(&view).map_err(Into::into))
        }
        None => {
            info!("listing all campaigns");
            state
                .aggregator
                .list()
                .await
                .and_then(|views| serde_json::to_string_pretty(&views).map_err(Into::into))
        }
    };

    match output {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!(?e, "inspection failed");
            std::process::exit(1);
        }
    }
}

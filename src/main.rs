use chrono::Local;
use clap::Parser;
use event_chart::cli::{Cli, Commands, SubmitArgs, parse_entry};
use event_chart::{ApiClient, HtmlChartRenderer, Poller, Settings, Submitter};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let settings = cli.settings()?;
    info!(base_url = %settings.base_url, output = %settings.output_path.display(), "starting");

    match cli.command {
        Commands::Watch => watch(settings).await,
        Commands::Submit(args) => submit_once(settings, args).await,
    }

    Ok(())
}

async fn watch(settings: Settings) {
    let client = Arc::new(ApiClient::new(&settings.base_url, settings.token.clone()));
    let renderer = HtmlChartRenderer::new(&settings.output_path);
    let (poller, reload) = Poller::new(client.clone(), renderer, settings.interval);
    let submitter = Submitter::new(client, reload);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match parse_entry(&line, Local::now().naive_local()) {
                    Ok(form) => {
                        submitter.submit(&form).await;
                    }
                    Err(err) => warn!("{err}"),
                },
                Ok(None) => break,
                Err(err) => {
                    warn!("failed to read stdin: {err}");
                    break;
                }
            }
        }
    });

    poller
        .run(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for shutdown signal: {err}");
                std::future::pending::<()>().await;
            }
        })
        .await;
}

async fn submit_once(settings: Settings, args: SubmitArgs) {
    let client = Arc::new(ApiClient::new(&settings.base_url, settings.token.clone()));
    let renderer = HtmlChartRenderer::new(&settings.output_path);
    let (mut poller, reload) = Poller::new(client.clone(), renderer, settings.interval);
    let submitter = Submitter::new(client, reload);

    let form = args.to_form(Local::now().naive_local());
    submitter.submit(&form).await;
    poller.run_pending().await;
}

//! news-digest — binary entrypoint.
//!
//! Commands:
//!   serve               intake server + both workers on their cron schedules
//!   daily | summary     one run of a worker, then exit
//!   preview <digest>    print the payload for the current pending set

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_digest::app::App;
use news_digest::config::{Needs, PublisherConfig};
use news_digest::publish::RunOutcome;

const USAGE: &str = "usage: news-digest <serve|daily|summary|preview daily|preview summary>";

/// JSON logs when LOG_FORMAT=json, compact text otherwise.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("news_digest=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = ?e, "news-digest failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &[String]) -> Result<ExitCode> {
    let cmd: Vec<&str> = args.iter().map(String::as_str).collect();
    match cmd.as_slice() {
        ["serve"] => {
            App::from_config(load(Needs::All)?).serve().await?;
            Ok(ExitCode::SUCCESS)
        }
        ["daily"] => {
            let app = App::from_config(load(Needs::Daily)?);
            let outcome = app.daily_worker()?.run().await.context("daily run")?;
            Ok(report(outcome))
        }
        ["summary"] => {
            let app = App::from_config(load(Needs::Summary)?);
            let outcome = app.summary_worker()?.run().await.context("summary run")?;
            Ok(report(outcome))
        }
        ["preview", digest] => {
            let prepared = match *digest {
                "daily" => {
                    let app = App::from_config(load(Needs::Daily)?);
                    app.daily_worker()?.prepare().await?
                }
                "summary" => {
                    let app = App::from_config(load(Needs::Summary)?);
                    app.summary_worker()?.prepare().await?
                }
                other => bail!("unknown digest `{other}`\n{USAGE}"),
            };
            match prepared {
                Some((_, payload)) => println!("{}", serde_json::to_string_pretty(&payload)?),
                None => println!("nothing pending"),
            }
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            eprintln!("{USAGE}");
            Ok(ExitCode::from(2))
        }
    }
}

fn load(needs: Needs) -> Result<PublisherConfig> {
    PublisherConfig::from_env(needs).context("loading configuration")
}

fn report(outcome: RunOutcome) -> ExitCode {
    if outcome.is_complete() {
        tracing::info!(?outcome, "run finished");
        ExitCode::SUCCESS
    } else {
        tracing::error!(?outcome, "run finished with partial commit");
        ExitCode::FAILURE
    }
}

mod check;
mod cli;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::{info, warn};

use courier_core::config::{load_dotenv, Config};
use courier_llm::Encourager;
use courier_mail::{Delivery, MailTransport, OperatorAlert, SmtpMailer};
use courier_scheduler::cron::{parse_cron, time_to_next};
use courier_scheduler::{CycleOutcome, DailyCycle, RetryPolicy};

use crate::cli::{CliArgs, Mode};

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    if args.check {
        check::print_report(&config);
        let missing = config.missing_settings();
        if !missing.is_empty() {
            bail!("missing required settings: {}", missing.join(", "));
        }
        return Ok(());
    }

    let missing = config.missing_settings();
    if !missing.is_empty() {
        bail!(
            "missing required settings: {} (run with --check for a report)",
            missing.join(", ")
        );
    }

    config.log_summary();

    let cycle = build_cycle(&config).context("failed to assemble delivery pipeline")?;

    match args.mode {
        Mode::Once => run_once(&cycle, &config).await,
        Mode::Daemon => run_daemon(&cycle, &config, &args.cron).await,
    }
}

fn build_cycle(config: &Config) -> Result<DailyCycle> {
    let generator = Encourager::from_config(&config.llm)?;
    let transport: Arc<dyn MailTransport> = Arc::new(SmtpMailer::from_config(&config.mail)?);
    let deliverer = Delivery::from_config(&config.mail, config.target, transport.clone())?;
    let alert = OperatorAlert::from_config(&config.mail, transport)?;

    Ok(DailyCycle::new(
        Arc::new(generator),
        Arc::new(deliverer),
        Arc::new(alert),
        RetryPolicy::from(&config.retry),
    ))
}

async fn run_once(cycle: &DailyCycle, config: &Config) -> Result<()> {
    match cycle.run(Local::now().naive_local(), config.target).await {
        CycleOutcome::Delivered { attempts } => {
            info!(attempts, "countdown mail sent");
            Ok(())
        }
        CycleOutcome::TargetReached => Ok(()),
        CycleOutcome::Exhausted { attempts, alerted } => {
            bail!(
                "delivery failed after {} attempts (operator alerted: {})",
                attempts,
                alerted
            )
        }
    }
}

async fn run_daemon(cycle: &DailyCycle, config: &Config, cron_expr: &str) -> Result<()> {
    let schedule =
        parse_cron(cron_expr).with_context(|| format!("invalid cron expression {:?}", cron_expr))?;

    info!(cron = %cron_expr, "daemon started");

    loop {
        let Some(wait) = time_to_next(&schedule, Local::now()) else {
            bail!("cron schedule {:?} has no upcoming fire time", cron_expr);
        };
        info!(wait_secs = wait.as_secs(), "sleeping until next send");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                return Ok(());
            }
        }

        let outcome = tokio::select! {
            outcome = cycle.run(Local::now().naive_local(), config.target) => outcome,
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested mid-cycle");
                return Ok(());
            }
        };

        match outcome {
            CycleOutcome::Delivered { attempts } => info!(attempts, "cycle delivered"),
            CycleOutcome::TargetReached => {
                info!("target date reached, daemon exiting");
                return Ok(());
            }
            CycleOutcome::Exhausted { attempts, alerted } => {
                warn!(attempts, alerted, "cycle exhausted, next try at the coming fire time");
            }
        }
    }
}

#[macro_use]
extern crate log;

mod campaign;
mod config;
mod error;
mod report;
mod schedule;
mod tools;

use crate::campaign::recipients::{RecipientGroup, load_recipient_groups};
use crate::campaign::template::{Template, load_template};
use crate::campaign::{CampaignSummary, report_summary, run_campaign};
use crate::config::Config;
use crate::error::Result;
use crate::report::Reporter;
use crate::schedule::clock::{Clock, SystemClock};
use crate::schedule::{parse_scheduled_time, report_invalid_schedule, report_schedule, wait_until};
use crate::tools::email::SmtpMailer;
use env_logger::Env;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(error::ApplicationError::from(e).exit_status());
        }
    };

    match run(&config, &SystemClock, interrupted()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_status())
        }
    }
}

/// Schedule, load, send, summarize.
/// Fails before any message is sent, or not at all.
async fn run<C, F>(config: &Config, clock: &C, cancellation: F) -> Result<CampaignSummary>
where
    C: Clock,
    F: Future<Output = ()>,
{
    // Console only: nothing is written to the log file until the configuration is valid.
    let now = clock.now();
    let scheduled_time = parse_scheduled_time(config.send_at(), now)
        .inspect_err(|_| report_invalid_schedule(config.send_at(), &Reporter::default()))?;

    let reporter = Reporter::new(config.log_file().clone());
    reporter.header("EMAIL AUTOMATION SCRIPT STARTED");
    report_config(config, &reporter);

    if let Some(target) = report_schedule(scheduled_time, now, &reporter) {
        wait_until(target, clock, &reporter, cancellation).await?;
    }

    let (groups, template) = load_campaign_files(config, &reporter).inspect_err(|e| {
        reporter.error(&format!("Failed to load required files: {e}"));
    })?;

    let mailer = SmtpMailer::from_config(config);
    let summary = run_campaign(config, &groups, &template, &mailer, &reporter).await;
    report_summary(&summary, *config.dry_run(), &reporter);

    Ok(summary)
}

fn report_config(config: &Config, reporter: &Reporter) {
    reporter.info(&format!("Sender: {}", config.sender_address()));
    reporter.info(&format!("SMTP server: {}:{}", config.smtp_server(), config.smtp_port()));
    reporter.info(&format!("Template: {}", config.template_file().display()));
    reporter.info(&format!("Recipients: {}", config.recipients_file().display()));
    reporter.info(&format!("Subject: {}", config.subject()));
    reporter.info(&format!("Sender Name: {}", config.sender_name()));
    reporter.info(&format!("Affiliation: {}", config.affiliation()));

    if *config.dry_run() {
        reporter.warning("DRY RUN MODE: No emails will be sent!");
    }
    if let Some(log_file) = config.log_file() {
        reporter.info(&format!("Logging to file: {}", log_file.display()));
    }
}

fn load_campaign_files(config: &Config, reporter: &Reporter) -> Result<(Vec<RecipientGroup>, Template)> {
    reporter.info(&format!("Loading recipients from: {}", config.recipients_file().display()));
    let groups = load_recipient_groups(config.recipients_file())?;
    reporter.success(&format!("Loaded {} recipient group(s)", groups.len()));

    reporter.info(&format!("Loading email template: {}", config.template_file().display()));
    let template = load_template(config.template_file())?;
    reporter.success("Email template loaded successfully");
    for token in template.unrecognized_tokens() {
        reporter.warning(&format!("Unrecognized placeholder left as is: {token}"));
    }

    Ok((groups, template))
}

/// Completes on Ctrl-C. Never completes if the handler can't be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Ctrl-C handler unavailable, the scheduled wait can't be interrupted.\n{e:#?}");
        std::future::pending::<()>().await;
    }
}

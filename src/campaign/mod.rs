use crate::campaign::recipients::{RecipientGroup, count_recipients};
use crate::campaign::template::{Personalization, Template};
use crate::config::Config;
use crate::report::Reporter;
use crate::tools::email::{Mailer, OutgoingEmail, is_valid_address};
use derive_getters::Getters;
use std::time::Duration;

pub mod error;
pub mod recipients;
pub mod template;

/// Pause after every real send, to stay under provider rate limits.
const DELAY_BETWEEN_SENDS: Duration = Duration::from_secs(1);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Getters)]
pub struct CampaignSummary {
    sent: usize,
    failed: usize,
}

impl CampaignSummary {
    pub fn total(&self) -> usize {
        self.sent + self.failed
    }
}

/// Personalize the template for every address of every group, in file order,
/// and hand each message to `mailer`, unless running dry.
/// A failed delivery is counted and reported, then the campaign goes on.
pub async fn run_campaign<M: Mailer>(
    config: &Config,
    groups: &[RecipientGroup],
    template: &Template,
    mailer: &M,
    reporter: &Reporter,
) -> CampaignSummary {
    reporter.header("STARTING EMAIL CAMPAIGN");
    reporter.info(&format!("Total emails to send: {}", count_recipients(groups)));
    if !config.bcc().is_empty() {
        reporter.info(&format!("BCC recipients: {}", config.bcc().len()));
    }

    let mut summary = CampaignSummary::default();
    for group in groups {
        reporter.info(&format!(
            "Processing {} ({} emails)",
            group.organization(),
            group.emails().len()
        ));
        let personalization = Personalization::new(
            group.organization(),
            config.sender_name(),
            config.affiliation(),
        );

        for address in group.emails() {
            let html_body = template.personalize(&personalization);

            if *config.dry_run() {
                reporter.warning(&format!("[DRY RUN] Would send to: {address}"));
                if !is_valid_address(address) {
                    reporter.warning(&format!("[DRY RUN] {address} doesn't look like an email address"));
                }
                summary.sent += 1;
                continue;
            }

            let email = OutgoingEmail::new(
                config.sender_address().to_owned(),
                address.to_owned(),
                config.bcc().clone(),
                config.subject().to_owned(),
                html_body,
            );
            match mailer.send(&email).await {
                Ok(()) => {
                    reporter.success(&format!("Sent to: {address}"));
                    summary.sent += 1;
                }
                Err(e) => {
                    reporter.error(&format!("Failed to send email to {address}: {e}"));
                    summary.failed += 1;
                }
            }

            tokio::time::sleep(DELAY_BETWEEN_SENDS).await;
        }
    }

    summary
}

/// Final counts, once every group has been processed.
pub fn report_summary(summary: &CampaignSummary, dry_run: bool, reporter: &Reporter) {
    reporter.header("CAMPAIGN SUMMARY");
    reporter.success(&format!("Successfully sent: {}", summary.sent));
    if summary.failed > 0 {
        reporter.error(&format!("Failed to send: {}", summary.failed));
    }
    reporter.success(&format!("Total processed: {}", summary.total()));

    if dry_run {
        reporter.warning("This was a DRY RUN - no actual emails were sent");
        reporter.info("Set DRY_RUN=false in .env to send real emails");
    }

    reporter.success(&format!(
        "Email campaign completed. Sent: {}, Failed: {}",
        summary.sent, summary.failed
    ));
}

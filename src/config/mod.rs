use crate::config::error::ConfigError;
use crate::config::error::ConfigError::{InvalidValue, MissingVariables};
use crate::tools::env_vars::{retrieve_var_value, retrieve_var_value_or};
use derive_getters::Getters;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;

pub mod error;

type Result<T, E = ConfigError> = std::result::Result<T, E>;

pub const SENDER_ADDRESS_VAR: &str = "YOUR_EMAIL";
pub const SENDER_PASSWORD_VAR: &str = "YOUR_PASSWORD";
const SMTP_SERVER_VAR: &str = "SMTP_SERVER";
const SMTP_PORT_VAR: &str = "SMTP_PORT";
const SMTP_IMPLICIT_TLS_VAR: &str = "SMTP_IMPLICIT_TLS";
const SUBJECT_LINE_VAR: &str = "SUBJECT_LINE";
const SENDER_NAME_VAR: &str = "SENDER_NAME";
const AFFILIATION_VAR: &str = "AFFILIATION";
const BCC_EMAILS_VAR: &str = "BCC_EMAILS";
const RECIPIENTS_FILE_VAR: &str = "JSON_FILE";
const TEMPLATE_FILE_VAR: &str = "HTML_TEMPLATE_FILE";
const DRY_RUN_VAR: &str = "DRY_RUN";
const LOG_TO_FILE_VAR: &str = "LOG_TO_FILE";
const LOG_FILE_VAR: &str = "LOG_FILE";
const SEND_AT_VAR: &str = "SEND_AT";

const REQUIRED_VARS: [&str; 2] = [SENDER_ADDRESS_VAR, SENDER_PASSWORD_VAR];

const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 465;
const DEFAULT_SUBJECT_LINE: &str = "Subject Not Set";
const DEFAULT_SENDER_NAME: &str = "Your Name";
const DEFAULT_AFFILIATION: &str = "Your Affiliation";
const DEFAULT_RECIPIENTS_FILE: &str = "email_recipients.json";
const DEFAULT_TEMPLATE_FILE: &str = "email_template.html";
const DEFAULT_LOG_FILE: &str = "log.txt";

/// Every setting of a run, resolved once at startup.
#[derive(Getters, Clone)]
pub struct Config {
    sender_address: String,
    sender_password: String,
    smtp_server: String,
    smtp_port: u16,
    implicit_tls: bool,
    subject: String,
    sender_name: String,
    affiliation: String,
    bcc: Vec<String>,
    recipients_file: PathBuf,
    template_file: PathBuf,
    dry_run: bool,
    log_file: Option<PathBuf>,
    send_at: String,
}

impl Config {
    /// Read the configuration from the environment.
    /// Every missing required variable is reported at once.
    pub fn load() -> Result<Self> {
        let missing_vars = REQUIRED_VARS
            .iter()
            .filter(|name| retrieve_var_value(name).is_none())
            .map(|name| name.to_string())
            .collect::<Vec<_>>();
        if !missing_vars.is_empty() {
            return Err(MissingVariables(missing_vars));
        }

        let log_to_file = retrieve_flag(LOG_TO_FILE_VAR)?;

        Ok(Self {
            sender_address: retrieve_var_value_or(SENDER_ADDRESS_VAR, ""),
            sender_password: retrieve_var_value_or(SENDER_PASSWORD_VAR, ""),
            smtp_server: retrieve_var_value_or(SMTP_SERVER_VAR, DEFAULT_SMTP_SERVER),
            smtp_port: retrieve_smtp_port()?,
            implicit_tls: retrieve_flag_or(SMTP_IMPLICIT_TLS_VAR, true)?,
            subject: retrieve_var_value_or(SUBJECT_LINE_VAR, DEFAULT_SUBJECT_LINE),
            sender_name: retrieve_var_value_or(SENDER_NAME_VAR, DEFAULT_SENDER_NAME),
            affiliation: retrieve_var_value_or(AFFILIATION_VAR, DEFAULT_AFFILIATION),
            bcc: retrieve_var_value(BCC_EMAILS_VAR)
                .map(|bcc| parse_address_list(&bcc))
                .unwrap_or_default(),
            recipients_file: retrieve_var_value_or(RECIPIENTS_FILE_VAR, DEFAULT_RECIPIENTS_FILE).into(),
            template_file: retrieve_var_value_or(TEMPLATE_FILE_VAR, DEFAULT_TEMPLATE_FILE).into(),
            dry_run: retrieve_flag(DRY_RUN_VAR)?,
            log_file: log_to_file.then(|| retrieve_var_value_or(LOG_FILE_VAR, DEFAULT_LOG_FILE).into()),
            send_at: retrieve_var_value_or(SEND_AT_VAR, ""),
        })
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("sender_address", &self.sender_address)
            .field("sender_password", &"***")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("implicit_tls", &self.implicit_tls)
            .field("subject", &self.subject)
            .field("sender_name", &self.sender_name)
            .field("affiliation", &self.affiliation)
            .field("bcc", &self.bcc)
            .field("recipients_file", &self.recipients_file)
            .field("template_file", &self.template_file)
            .field("dry_run", &self.dry_run)
            .field("log_file", &self.log_file)
            .field("send_at", &self.send_at)
            .finish()
    }
}

/// Split a comma-separated list, trimming entries and dropping blank ones.
fn parse_address_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_owned)
        .collect()
}

fn retrieve_smtp_port() -> Result<u16> {
    match retrieve_var_value(SMTP_PORT_VAR) {
        None => Ok(DEFAULT_SMTP_PORT),
        Some(port) => port.trim().parse::<u16>().map_err(|_| InvalidValue {
            name: SMTP_PORT_VAR.to_owned(),
            value: port,
        }),
    }
}

fn retrieve_flag(name: &str) -> Result<bool> {
    retrieve_flag_or(name, false)
}

fn retrieve_flag_or(name: &str, default: bool) -> Result<bool> {
    let Some(value) = retrieve_var_value(name) else {
        return Ok(default);
    };
    match value.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(InvalidValue {
            name: name.to_owned(),
            value,
        }),
    }
}

use crate::campaign::error::LoadError;
use crate::campaign::error::LoadError::CantReadTemplateFile;
use crate::tools::log_error_and_message;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

pub const ORGANIZATION_TOKEN: &str = "{{Recipient Department/Office}}";
pub const SENDER_NAME_TOKEN: &str = "{{Your Name/Project Name}}";
pub const AFFILIATION_TOKEN: &str = "{{Your Affiliation/Study Area}}";

const KNOWN_TOKENS: [&str; 3] = [ORGANIZATION_TOKEN, SENDER_NAME_TOKEN, AFFILIATION_TOKEN];

static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[^{}]*\}\}").expect("Token regex should be valid."));

/// Values substituted for one recipient.
#[derive(Debug)]
pub struct Personalization<'a> {
    organization: &'a str,
    sender_name: &'a str,
    affiliation: &'a str,
}

impl<'a> Personalization<'a> {
    pub fn new(organization: &'a str, sender_name: &'a str, affiliation: &'a str) -> Self {
        Self {
            organization,
            sender_name,
            affiliation,
        }
    }
}

/// HTML body loaded once and shared by every recipient.
/// Markup isn't validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    content: String,
}

impl Template {
    pub fn new(content: String) -> Self {
        Self { content }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// A personalized copy of the template. Tokens are matched literally and case-sensitively;
    /// unknown ones are left as they are.
    pub fn personalize(&self, personalization: &Personalization) -> String {
        self.content
            .replace(ORGANIZATION_TOKEN, personalization.organization)
            .replace(SENDER_NAME_TOKEN, personalization.sender_name)
            .replace(AFFILIATION_TOKEN, personalization.affiliation)
    }

    /// `{{...}}` tokens that [`Template::personalize`] will leave untouched.
    pub fn unrecognized_tokens(&self) -> Vec<&str> {
        let mut tokens = vec![];
        for token in TOKEN_REGEX.find_iter(&self.content).map(|token| token.as_str()) {
            if !KNOWN_TOKENS.contains(&token) && !tokens.contains(&token) {
                tokens.push(token);
            }
        }

        tokens
    }
}

pub fn load_template(path: &Path) -> Result<Template, LoadError> {
    let display_path = path.display().to_string();
    fs::read_to_string(path)
        .map(Template::new)
        .map_err(log_error_and_message(
            &format!("Can't read template file `{display_path}`."),
            CantReadTemplateFile(display_path.clone()),
        ))
}

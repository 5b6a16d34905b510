use crate::campaign::error::LoadError;
use crate::campaign::error::LoadError::{CantReadRecipientsFile, EmptyGroup, MalformedRecipientsFile};
use crate::tools::log_error_and_message;
use derive_getters::Getters;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Addresses sharing one organization name.
#[derive(Debug, Clone, Deserialize, Getters, PartialEq, Eq)]
pub struct RecipientGroup {
    #[serde(rename = "university", alias = "organization")]
    organization: String,
    #[serde(deserialize_with = "address_list_format::deserialize")]
    emails: Vec<String>,
}

impl RecipientGroup {
    pub fn new(organization: String, emails: Vec<String>) -> Self {
        Self {
            organization,
            emails,
        }
    }
}

mod address_list_format {
    use serde::{Deserialize, Deserializer};

    /// Surrounding whitespace is dropped from every address, nothing else is changed.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let addresses = Vec::<String>::deserialize(deserializer)?;
        Ok(addresses.into_iter().map(|address| address.trim().to_owned()).collect())
    }
}

/// Load every group, in file order. Nothing is returned unless the whole file is valid.
pub fn load_recipient_groups(path: &Path) -> Result<Vec<RecipientGroup>, LoadError> {
    let display_path = path.display().to_string();
    let content = fs::read_to_string(path).map_err(log_error_and_message(
        &format!("Can't read recipients file `{display_path}`."),
        CantReadRecipientsFile(display_path.clone()),
    ))?;

    let groups: Vec<RecipientGroup> = serde_json::from_str(&content).map_err(log_error_and_message(
        &format!("Can't parse recipients file `{display_path}`."),
        MalformedRecipientsFile(display_path.clone()),
    ))?;

    if let Some(group) = groups.iter().find(|group| group.emails.is_empty()) {
        return Err(EmptyGroup(group.organization.clone()));
    }

    Ok(groups)
}

/// How many messages a campaign over `groups` would address.
pub fn count_recipients(groups: &[RecipientGroup]) -> usize {
    groups.iter().map(|group| group.emails.len()).sum()
}

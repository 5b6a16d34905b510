use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LoadError {
    #[error("Recipients file can't be read [path: {0}]")]
    CantReadRecipientsFile(String),
    #[error("Invalid JSON format in recipients file [path: {0}]")]
    MalformedRecipientsFile(String),
    #[error("Recipient group has no email address [organization: {0}]")]
    EmptyGroup(String),
    #[error("Template file can't be read [path: {0}]")]
    CantReadTemplateFile(String),
}

use crate::config::Config;
use crate::tools::email::DispatchError::{
    CantBuildMessage, CantConnectToSmtpServer, CantSendMessage, InvalidAddress,
};
use async_trait::async_trait;
use derive_getters::Getters;
use mail_send::SmtpClientBuilder;
use mail_send::mail_builder::MessageBuilder;
use mail_send::smtp::message::Message;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

type Result<T, E = DispatchError> = std::result::Result<T, E>;

/// Shown by mail clients that can't render the HTML part.
pub const PLAIN_TEXT_FALLBACK: &str = "This email requires an HTML viewer.";

static ADDRESS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Address regex should be valid.")
});

/// One personalized message, addressed to a single recipient.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct OutgoingEmail {
    from: String,
    to: String,
    bcc: Vec<String>,
    subject: String,
    html_body: String,
}

impl OutgoingEmail {
    pub fn new(from: String, to: String, bcc: Vec<String>, subject: String, html_body: String) -> Self {
        Self {
            from,
            to,
            bcc,
            subject,
            html_body,
        }
    }
}

/// Delivers a single message. Implement this trait to plug another transport in.
#[async_trait]
pub trait Mailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

/// Opens one implicit-TLS (or STARTTLS) connection per message,
/// authenticates with the sender credential, sends, then closes.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    host: String,
    port: u16,
    implicit_tls: bool,
    login: String,
    password: String,
}

impl SmtpMailer {
    pub fn new(host: String, port: u16, implicit_tls: bool, login: String, password: String) -> Self {
        Self {
            host,
            port,
            implicit_tls,
            login,
            password,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.smtp_server().to_owned(),
            *config.smtp_port(),
            *config.implicit_tls(),
            config.sender_address().to_owned(),
            config.sender_password().to_owned(),
        )
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let message = create_message(email)?;
        let smtp_client = SmtpClientBuilder::new(self.host.as_str(), self.port)
            .implicit_tls(self.implicit_tls)
            .credentials((self.login.as_str(), self.password.as_str()))
            .connect()
            .await;

        smtp_client
            .map_err(|e| {
                debug!("Couldn't connect to SMTP server [host: {}:{}]\n{e:#?}", self.host, self.port);
                CantConnectToSmtpServer(e.to_string())
            })?
            .send(message)
            .await
            .map_err(|e| {
                debug!("Couldn't send message [to: {}]\n{e:#?}", email.to());
                CantSendMessage(e.to_string())
            })
    }
}

/// Whether an address looks like `local@domain.tld`.
/// Anything finer is left to the SMTP server.
pub fn is_valid_address(address: &str) -> bool {
    ADDRESS_REGEX.is_match(address)
}

/// MIME content as every recipient sees it. BCC addresses never appear here.
fn create_body(email: &OutgoingEmail) -> Result<MessageBuilder<'_>> {
    if !is_valid_address(email.to()) {
        return Err(InvalidAddress(email.to().to_owned()));
    }

    Ok(MessageBuilder::new()
        .from(email.from().as_str())
        .to(email.to().as_str())
        .subject(email.subject().as_str())
        .text_body(PLAIN_TEXT_FALLBACK)
        .html_body(email.html_body().as_str()))
}

/// Envelope for the SMTP transaction: the recipient then every BCC address
/// go to `RCPT TO`, the body is [`create_body`] as is.
fn create_message(email: &OutgoingEmail) -> Result<Message<'_>> {
    let body = create_body(email)?.write_to_vec().map_err(|e| {
        debug!("Couldn't write message [to: {}]\n{e:#?}", email.to());
        CantBuildMessage(e.to_string())
    })?;
    let recipients = std::iter::once(email.to()).chain(email.bcc()).map(String::as_str);

    Ok(Message::new(email.from().as_str(), recipients, body))
}

#[derive(Debug, PartialEq, Error)]
pub enum DispatchError {
    #[error("Invalid recipient address [address: {0}]")]
    InvalidAddress(String),
    #[error("Can't build message: {0}")]
    CantBuildMessage(String),
    #[error("Can't connect to SMTP server: {0}")]
    CantConnectToSmtpServer(String),
    #[error("Can't send message: {0}")]
    CantSendMessage(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use mail_send::mail_builder::mime::BodyPart;
    use parameterized::{ide, parameterized};

    ide!();

    const TEST_SENDER_ADDRESS: &str = "sender@address.com";
    const TEST_RECIPIENT: &str = "recipient@address.com";
    const TEST_SUBJECT: &str = "This is a subject";
    const TEST_HTML_BODY: &str = "<p>Dear Acme,</p>";

    fn get_email(to: &str, bcc: Vec<String>) -> OutgoingEmail {
        OutgoingEmail::new(
            TEST_SENDER_ADDRESS.to_owned(),
            to.to_owned(),
            bcc,
            TEST_SUBJECT.to_owned(),
            TEST_HTML_BODY.to_owned(),
        )
    }

    fn rcpt_to(message: &Message) -> Vec<String> {
        message.rcpt_to.iter().map(|address| address.email.to_string()).collect()
    }

    fn headers(message: &Message) -> String {
        let body = String::from_utf8_lossy(&message.body);
        body.split("\r\n\r\n").next().unwrap_or_default().to_owned()
    }

    // region create_body
    #[test]
    fn should_create_body() {
        let email = get_email(TEST_RECIPIENT, vec![]);

        let result = create_body(&email).unwrap();

        let BodyPart::Text(text) = result.clone().text_body.unwrap().contents else {
            panic!("Unexpected non-text part");
        };
        assert_eq!(PLAIN_TEXT_FALLBACK, text);
        let BodyPart::Text(html) = result.html_body.unwrap().contents else {
            panic!("Unexpected non-text part");
        };
        assert_eq!(TEST_HTML_BODY, html);
    }

    #[test]
    fn should_fail_to_create_body_for_malformed_address() {
        let email = get_email("bad", vec![]);

        let error = create_body(&email).unwrap_err();

        assert_eq!(InvalidAddress("bad".to_owned()), error);
    }
    // endregion

    // region create_message
    #[test]
    fn should_create_message() {
        let email = get_email(TEST_RECIPIENT, vec![]);

        let result = create_message(&email).unwrap();

        assert_eq!(TEST_SENDER_ADDRESS, result.mail_from.email);
        assert_eq!(vec![TEST_RECIPIENT], rcpt_to(&result));
        assert!(headers(&result).contains(TEST_RECIPIENT));
    }

    #[test]
    fn should_only_put_bcc_in_envelope() {
        let email = get_email(
            TEST_RECIPIENT,
            vec!["audit@address.com".to_owned(), "boss@address.com".to_owned()],
        );

        let result = create_message(&email).unwrap();

        assert_eq!(
            vec![TEST_RECIPIENT, "audit@address.com", "boss@address.com"],
            rcpt_to(&result)
        );
        let headers = headers(&result);
        assert!(headers.contains(TEST_RECIPIENT));
        assert!(!headers.to_lowercase().contains("bcc:"));
        let body = String::from_utf8_lossy(&result.body);
        assert!(!body.contains("audit@address.com"));
        assert!(!body.contains("boss@address.com"));
    }

    #[test]
    fn should_fail_to_create_message_for_malformed_address() {
        let email = get_email("bad", vec!["audit@address.com".to_owned()]);

        let error = create_message(&email).unwrap_err();

        assert_eq!(InvalidAddress("bad".to_owned()), error);
    }
    // endregion

    // region is_valid_address
    #[parameterized(
        address = {"a@x.com", "first.last+tag@sub.domain.org", "bad", "a@x", "@x.com", "a b@x.com", "a@@x.com", ""},
        expected_result = {true, true, false, false, false, false, false, false}
    )]
    fn should_check_address(address: &str, expected_result: bool) {
        assert_eq!(expected_result, is_valid_address(address));
    }
    // endregion

    // region send
    #[tokio::test]
    async fn should_not_connect_when_address_is_malformed() {
        // Nothing listens there: reaching the network would give another error.
        let mailer = SmtpMailer::new("127.0.0.1".to_owned(), 1, true, TEST_SENDER_ADDRESS.to_owned(), "password".to_owned());

        let error = mailer.send(&get_email("bad", vec![])).await.unwrap_err();

        assert_eq!(InvalidAddress("bad".to_owned()), error);
    }

    #[tokio::test]
    async fn should_fail_to_connect_to_unreachable_server() {
        let mailer = SmtpMailer::new("127.0.0.1".to_owned(), 1, true, TEST_SENDER_ADDRESS.to_owned(), "password".to_owned());

        let error = mailer.send(&get_email(TEST_RECIPIENT, vec![])).await.unwrap_err();

        assert!(matches!(error, CantConnectToSmtpServer(_)));
    }
    // endregion
}

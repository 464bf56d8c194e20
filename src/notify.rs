//! Delivery transports. Each notifier makes exactly one outbound call per
//! invocation and never lets a transport error escape: auth failures,
//! network errors, malformed destinations, and remote 4xx/5xx all come
//! back as a failed `DeliveryResult` so one recipient cannot take down
//! the rest of the run.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use crate::config::{SmtpConfig, TwilioConfig, WhatsAppConfig};
use crate::models::{Channel, DeliveryResult, MessageBody};

#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> Channel;

    async fn send(&self, destination: &str, body: &MessageBody) -> DeliveryResult;
}

/// SMTP delivery via a STARTTLS relay.
pub struct EmailNotifier {
    config: SmtpConfig,
}

impl EmailNotifier {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    async fn deliver(&self, destination: &str, subject: &str, html: &str) -> Result<(), String> {
        let from: Mailbox = format!("{} <{}>", self.config.from_name, self.config.username)
            .parse()
            .map_err(|e| format!("invalid sender address: {e}"))?;
        let to: Mailbox = destination
            .parse()
            .map_err(|e| format!("invalid recipient address: {e}"))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| format!("build email: {e}"))?;

        let credentials = Credentials::new(
            self.config.username.clone(),
            self.config.password.clone(),
        );
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
            .map_err(|e| format!("SMTP relay: {e}"))?
            .port(self.config.port)
            .credentials(credentials)
            .build();

        mailer
            .send(email)
            .await
            .map_err(|e| format!("SMTP send: {e}"))?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(&self, destination: &str, body: &MessageBody) -> DeliveryResult {
        let MessageBody::Html { subject, html } = body else {
            return DeliveryResult::failed(destination, "email notifier given a non-HTML body");
        };

        match self.deliver(destination, subject, html).await {
            Ok(()) => {
                debug!(destination, "email delivered");
                DeliveryResult::sent(destination)
            }
            Err(detail) => DeliveryResult::failed(destination, detail),
        }
    }
}

/// Twilio Messages API.
pub struct SmsNotifier {
    config: TwilioConfig,
    client: reqwest::Client,
}

impl SmsNotifier {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn deliver(&self, destination: &str, text: &str) -> Result<(), String> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", destination),
                ("From", self.config.from_number.as_str()),
                ("Body", text),
            ])
            .send()
            .await
            .map_err(|e| format!("Twilio request failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(format!("Twilio API error {status}: {text}"));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| format!("invalid Twilio response: {e}"))?;
        debug!(
            sid = result["sid"].as_str().unwrap_or("unknown"),
            destination, "SMS accepted"
        );
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmsNotifier {
    fn channel(&self) -> Channel {
        Channel::Sms
    }

    async fn send(&self, destination: &str, body: &MessageBody) -> DeliveryResult {
        let MessageBody::Text(text) = body else {
            return DeliveryResult::failed(destination, "sms notifier given a non-text body");
        };

        match self.deliver(destination, text).await {
            Ok(()) => DeliveryResult::sent(destination),
            Err(detail) => DeliveryResult::failed(destination, detail),
        }
    }
}

/// WhatsApp Business Cloud API, free-text messages.
pub struct WhatsAppTextNotifier {
    config: WhatsAppConfig,
    client: reqwest::Client,
}

impl WhatsAppTextNotifier {
    pub fn new(config: WhatsAppConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WhatsAppTextNotifier {
    fn channel(&self) -> Channel {
        Channel::Whatsapp
    }

    async fn send(&self, destination: &str, body: &MessageBody) -> DeliveryResult {
        let MessageBody::Text(text) = body else {
            return DeliveryResult::failed(destination, "whatsapp notifier given a non-text body");
        };

        let payload = serde_json::json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": destination,
            "type": "text",
            "text": {
                "preview_url": false,
                "body": text
            }
        });

        match post_cloud_api(&self.client, &self.config, destination, &payload).await {
            Ok(()) => DeliveryResult::sent(destination),
            Err(detail) => DeliveryResult::failed(destination, detail),
        }
    }
}

/// WhatsApp Business Cloud API, pre-approved structured templates with
/// positional body parameters.
pub struct WhatsAppTemplateNotifier {
    config: WhatsAppConfig,
    client: reqwest::Client,
}

impl WhatsAppTemplateNotifier {
    pub fn new(config: WhatsAppConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WhatsAppTemplateNotifier {
    fn channel(&self) -> Channel {
        Channel::WhatsappTemplate
    }

    async fn send(&self, destination: &str, body: &MessageBody) -> DeliveryResult {
        let MessageBody::Template { parameters } = body else {
            return DeliveryResult::failed(
                destination,
                "whatsapp template notifier given a non-template body",
            );
        };

        let payload = template_payload(&self.config, destination, parameters);
        match post_cloud_api(&self.client, &self.config, destination, &payload).await {
            Ok(()) => DeliveryResult::sent(destination),
            Err(detail) => DeliveryResult::failed(destination, detail),
        }
    }
}

/// Cloud API template payload. The template name and language come from
/// configuration so a renamed or translated template needs no code change.
fn template_payload(
    config: &WhatsAppConfig,
    destination: &str,
    parameters: &[String],
) -> serde_json::Value {
    let body_parameters: Vec<serde_json::Value> = parameters
        .iter()
        .map(|text| serde_json::json!({ "type": "text", "text": text }))
        .collect();

    serde_json::json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": destination,
        "type": "template",
        "template": {
            "name": config.template_name,
            "language": { "code": config.template_language },
            "components": [
                { "type": "body", "parameters": body_parameters }
            ]
        }
    })
}

async fn post_cloud_api(
    client: &reqwest::Client,
    config: &WhatsAppConfig,
    destination: &str,
    payload: &serde_json::Value,
) -> Result<(), String> {
    let url = format!(
        "https://graph.facebook.com/v21.0/{}/messages",
        config.phone_number_id
    );

    let response = client
        .post(&url)
        .bearer_auth(&config.access_token)
        .json(payload)
        .send()
        .await
        .map_err(|e| format!("WhatsApp API request failed: {e}"))?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(format!("WhatsApp API error {status}: {text}"));
    }

    let result: serde_json::Value = response
        .json()
        .await
        .map_err(|e| format!("invalid WhatsApp response: {e}"))?;
    debug!(
        message_id = result["messages"][0]["id"].as_str().unwrap_or("unknown"),
        destination, "WhatsApp message accepted"
    );
    Ok(())
}

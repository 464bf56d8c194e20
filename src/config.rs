use anyhow::Context;

/// Google Sheets read access. The token is a pre-issued OAuth bearer token
/// for the spreadsheets.readonly scope; minting it from service-account
/// credentials happens outside this binary.
#[derive(Debug, Clone)]
pub struct SheetConfig {
    pub spreadsheet_id: String,
    pub range: String,
    pub access_token: String,
}

impl SheetConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            spreadsheet_id: std::env::var("SPREADSHEET_ID")
                .context("SPREADSHEET_ID must be set to the schedule spreadsheet")?,
            range: std::env::var("SHEET_RANGE").unwrap_or_else(|_| "Time_Table_2".to_string()),
            access_token: std::env::var("SHEETS_ACCESS_TOKEN")
                .context("SHEETS_ACCESS_TOKEN must be set to a readonly bearer token")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_name: String,
}

impl SmtpConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match std::env::var("SMTP_PORT") {
            Ok(raw) => raw.parse().context("SMTP_PORT must be a port number")?,
            Err(_) => 587,
        };
        Ok(Self {
            host: std::env::var("SMTP_SERVER").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            port,
            username: std::env::var("EMAIL_USER").context("EMAIL_USER must be set")?,
            password: std::env::var("EMAIL_PASSWORD").context("EMAIL_PASSWORD must be set")?,
            from_name: std::env::var("EMAIL_FROM_NAME")
                .unwrap_or_else(|_| "New Dimension Academy".to_string()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

impl TwilioConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            account_sid: std::env::var("TWILIO_ACCOUNT_SID")
                .context("TWILIO_ACCOUNT_SID must be set")?,
            auth_token: std::env::var("TWILIO_AUTH_TOKEN")
                .context("TWILIO_AUTH_TOKEN must be set")?,
            from_number: std::env::var("TWILIO_FROM_NUMBER")
                .context("TWILIO_FROM_NUMBER must be set")?,
        })
    }
}

/// WhatsApp Business Cloud API credentials, shared by the free-text and
/// template channels.
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub access_token: String,
    pub phone_number_id: String,
    pub template_name: String,
    pub template_language: String,
}

impl WhatsAppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            access_token: std::env::var("WHATSAPP_ACCESS_TOKEN")
                .context("WHATSAPP_ACCESS_TOKEN must be set")?,
            phone_number_id: std::env::var("WHATSAPP_PHONE_NUMBER_ID")
                .context("WHATSAPP_PHONE_NUMBER_ID must be set")?,
            template_name: std::env::var("WHATSAPP_TEMPLATE_NAME")
                .unwrap_or_else(|_| "class_reminder".to_string()),
            template_language: std::env::var("WHATSAPP_TEMPLATE_LANGUAGE")
                .unwrap_or_else(|_| "en".to_string()),
        })
    }
}

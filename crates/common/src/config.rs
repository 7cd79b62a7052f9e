//! Application configuration.

use serde::Deserialize;
use std::path::Path;

use crate::storage::StorageConfig;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Blob storage for photos, consent letters and payment proofs.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Outgoing email.
    #[serde(default)]
    pub email: EmailConfig,
    /// Outgoing WhatsApp messages.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    /// Payment and voting settings.
    #[serde(default)]
    pub payment: PaymentConfig,
    /// Admin access.
    pub admin: AdminConfig,
    /// Registration workflow tuning.
    #[serde(default)]
    pub registration: RegistrationConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this deployment.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// SMTP settings. When `smtp_host` is unset, mail is only logged.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host.
    #[serde(default)]
    pub smtp_host: Option<String>,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// Sender address.
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Address that receives admin copies of new registrations.
    #[serde(default = "default_admin_email")]
    pub admin_address: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            from_address: default_from_address(),
            from_name: default_from_name(),
            admin_address: default_admin_email(),
        }
    }
}

/// WhatsApp gateway settings. When `api_key` is unset, messages are only logged.
#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppConfig {
    /// Gateway endpoint that accepts `target` and `message` form fields.
    #[serde(default = "default_whatsapp_url")]
    pub api_url: String,
    /// Gateway token sent in the `Authorization` header.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Admin contact number shown to applicants.
    #[serde(default = "default_admin_whatsapp")]
    pub admin_number: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_url: default_whatsapp_url(),
            api_key: None,
            admin_number: default_admin_whatsapp(),
        }
    }
}

/// Payment settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Bank name shown on the invoice.
    #[serde(default = "default_bank_name")]
    pub bank_name: String,
    /// Bank account number shown on the invoice.
    #[serde(default)]
    pub bank_account_number: String,
    /// Bank account holder shown on the invoice.
    #[serde(default)]
    pub bank_account_holder: String,
    /// Price of a single vote in rupiah.
    #[serde(default = "default_vote_price")]
    pub vote_price: i64,
    /// Saweria page used for vote payments.
    #[serde(default = "default_saweria_username")]
    pub saweria_username: String,
    /// Shared secret for Saweria webhook signatures. Unset disables verification.
    #[serde(default)]
    pub saweria_webhook_secret: Option<String>,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            bank_name: default_bank_name(),
            bank_account_number: String::new(),
            bank_account_holder: String::new(),
            vote_price: default_vote_price(),
            saweria_username: default_saweria_username(),
            saweria_webhook_secret: None,
        }
    }
}

/// Admin access configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Bearer token required by admin endpoints and the admin stream.
    pub token: String,
}

/// Which sequence allocator backs invoice generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceBackend {
    /// Atomic counter row in the database.
    #[default]
    Database,
    /// Process-local counter seeded from existing registrations.
    Memory,
}

/// Registration workflow configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationConfig {
    /// Sequence allocator backend.
    #[serde(default)]
    pub sequence_backend: SequenceBackend,
    /// Attempts made when an insert collides on a unique identifier.
    #[serde(default = "default_insert_attempts")]
    pub max_insert_attempts: u32,
    /// Maximum decoded size of a single uploaded document in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            sequence_backend: SequenceBackend::default(),
            max_insert_attempts: default_insert_attempts(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "noreply@movementwithbenefit.id".to_string()
}

fn default_from_name() -> String {
    "Movement With Benefit".to_string()
}

fn default_admin_email() -> String {
    "movementwithbenefit@gmail.com".to_string()
}

fn default_whatsapp_url() -> String {
    "https://api.fonnte.com/send".to_string()
}

fn default_admin_whatsapp() -> String {
    "082315660007".to_string()
}

fn default_bank_name() -> String {
    "BCA".to_string()
}

const fn default_vote_price() -> i64 {
    1500
}

fn default_saweria_username() -> String {
    "movementwithbenefit".to_string()
}

const fn default_insert_attempts() -> u32 {
    3
}

const fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `MWB_ENV`)
    /// 3. Environment variables with `MWB__` prefix, including any from `.env`
    pub fn load() -> Result<Self, config::ConfigError> {
        // A missing .env is the normal case in production.
        let _ = dotenvy::dotenv();
        let env = std::env::var("MWB_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("MWB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("MWB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

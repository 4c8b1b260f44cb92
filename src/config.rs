// ⚙️ Configuration - command-line flags with environment fallbacks
// Credentials are injected at runtime and never baked into the binary.

use clap::{Args, Parser};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_RECORDS_URL: &str = "https://xtend.online/Voter/fetch_voter_data1.php";
pub const DEFAULT_UPDATE_URL: &str = "https://xtend.online/Voter/update_mobile.php";
pub const DEFAULT_NOTIFY_URL: &str = "http://127.0.0.1:3001/api/whatsapp-send";
pub const DEFAULT_PROVIDER_URL: &str = "https://waba.xtendonline.com";

// ============================================================================
// CLIENT
// ============================================================================

/// Settings for the lookup client (TUI and CLI subcommands).
/// No `Debug`: it would print the API key.
#[derive(Clone, Args)]
pub struct ClientConfig {
    /// Endpoint returning the full voter list
    #[arg(long, env = "VOTER_RECORDS_URL", default_value = DEFAULT_RECORDS_URL)]
    pub records_url: String,

    /// Endpoint accepting mobile/address updates
    #[arg(long, env = "VOTER_UPDATE_URL", default_value = DEFAULT_UPDATE_URL)]
    pub update_url: String,

    /// Messaging proxy endpoint
    #[arg(long, env = "VOTER_NOTIFY_URL", default_value = DEFAULT_NOTIFY_URL)]
    pub notify_url: String,

    /// Sender phone-number id registered with the messaging provider
    #[arg(long, env = "WHATSAPP_PHONE_NUMBER_ID")]
    pub phone_number_id: Option<String>,

    /// Messaging provider API key
    #[arg(long, env = "WHATSAPP_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, default_value_t = 90)]
    pub fetch_timeout_secs: u64,

    #[arg(long, default_value_t = 15)]
    pub update_timeout_secs: u64,

    #[arg(long, default_value_t = 30)]
    pub notify_timeout_secs: u64,

    /// Pause between consecutive notification messages
    #[arg(long, default_value_t = 2000)]
    pub notify_pause_ms: u64,

    /// Quiet period after a search before auto-notify starts
    #[arg(long, default_value_t = 1500)]
    pub notify_debounce_ms: u64,

    /// Do not send notifications automatically after a search
    #[arg(long)]
    pub no_auto_notify: bool,

    /// Log file for the interactive UI (the terminal is owned by the UI)
    #[arg(long, default_value = "voter-lookup.log")]
    pub log_file: PathBuf,
}

/// Messaging credentials; Debug never prints the key
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub phone_number_id: String,
    pub api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("phone_number_id", &self.phone_number_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ClientConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn update_timeout(&self) -> Duration {
        Duration::from_secs(self.update_timeout_secs)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }

    pub fn notify_pause(&self) -> Duration {
        Duration::from_millis(self.notify_pause_ms)
    }

    pub fn notify_debounce(&self) -> Duration {
        Duration::from_millis(self.notify_debounce_ms)
    }

    /// Both halves present and non-blank, or nothing
    pub fn credentials(&self) -> Option<Credentials> {
        let phone_number_id = self.phone_number_id.as_deref().map(str::trim).unwrap_or("");
        let api_key = self.api_key.as_deref().map(str::trim).unwrap_or("");

        if phone_number_id.is_empty() || api_key.is_empty() {
            return None;
        }

        Some(Credentials {
            phone_number_id: phone_number_id.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            records_url: DEFAULT_RECORDS_URL.to_string(),
            update_url: DEFAULT_UPDATE_URL.to_string(),
            notify_url: DEFAULT_NOTIFY_URL.to_string(),
            phone_number_id: None,
            api_key: None,
            fetch_timeout_secs: 90,
            update_timeout_secs: 15,
            notify_timeout_secs: 30,
            notify_pause_ms: 2000,
            notify_debounce_ms: 1500,
            no_auto_notify: false,
            log_file: PathBuf::from("voter-lookup.log"),
        }
    }
}

// ============================================================================
// SERVER
// ============================================================================

/// Relay server settings
#[derive(Debug, Clone, Parser)]
#[command(name = "voter-server", version, about = "Messaging proxy and voter update relay")]
pub struct ServerConfig {
    #[arg(long, env = "VOTER_SERVER_BIND", default_value = "0.0.0.0:3001")]
    pub bind: SocketAddr,

    /// Messaging provider base URL
    #[arg(long, env = "WHATSAPP_PROVIDER_URL", default_value = DEFAULT_PROVIDER_URL)]
    pub provider_url: String,

    #[arg(long, default_value_t = 30)]
    pub provider_timeout_secs: u64,

    /// Persist updates here; without it updates are only simulated
    #[arg(long, env = "VOTER_DATABASE")]
    pub database: Option<PathBuf>,
}

impl ServerConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        client: ClientConfig,
    }

    #[test]
    fn test_client_defaults() {
        let parsed = Harness::try_parse_from(["voter-lookup"]).unwrap().client;
        let defaults = ClientConfig::default();

        assert_eq!(parsed.records_url, defaults.records_url);
        assert_eq!(parsed.notify_pause(), Duration::from_secs(2));
        assert_eq!(parsed.notify_debounce(), Duration::from_millis(1500));
        assert_eq!(parsed.fetch_timeout(), Duration::from_secs(90));
        assert!(!parsed.no_auto_notify);
    }

    #[test]
    fn test_credentials_need_both_halves() {
        let mut config = ClientConfig {
            phone_number_id: Some("1234".into()),
            ..Default::default()
        };
        assert!(config.credentials().is_none());

        config.api_key = Some("   ".into());
        assert!(config.credentials().is_none());

        config.api_key = Some("secret".into());
        let creds = config.credentials().unwrap();
        assert_eq!(creds.api_key, "secret");
        assert!(!format!("{:?}", creds).contains("secret"));
    }

    #[test]
    fn test_server_flags() {
        let config = ServerConfig::try_parse_from([
            "voter-server",
            "--bind",
            "127.0.0.1:8080",
            "--database",
            "contacts.db",
        ])
        .unwrap();

        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.database, Some(PathBuf::from("contacts.db")));
        assert_eq!(config.provider_timeout(), Duration::from_secs(30));
    }
}

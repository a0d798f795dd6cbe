use serde::{Deserialize, Serialize};

/// Name sent in `X-RallyIntegrationName` on every request
pub const INTEGRATION_NAME: &str = "CaseWhat";
/// Vendor sent in `X-RallyIntegrationVendor` on every request
pub const INTEGRATION_VENDOR: &str = "";
/// Version sent in `X-RallyIntegrationVersion` on every request
pub const INTEGRATION_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: String,
    pub api_version: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub page_size: u32,
}

/// How requests authenticate against the service
#[derive(Debug, Clone, PartialEq)]
pub enum Credentials {
    ApiKey(String),
    Basic { username: String, password: String },
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: "https://rally1.rallydev.com".to_string(),
            api_version: "v2.0".to_string(),
            username: None,
            password: None,
            api_key: None,
            page_size: 200,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional `casewhat` file and `RALLY_*` variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        config = config.add_source(config::File::with_name("casewhat").required(false));

        // RALLY_USERNAME, RALLY_PASSWORD, RALLY_API_KEY, RALLY_PAGE_SIZE, ...
        config = config.add_source(
            config::Environment::with_prefix("RALLY").prefix_separator("_"),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// Base URL of the web services API, without a trailing slash
    pub fn api_base(&self) -> String {
        format!(
            "{}/slm/webservice/{}",
            self.server.trim_end_matches('/'),
            self.api_version
        )
    }

    /// Pick the credentials to authenticate with; an API key wins over a password
    pub fn credentials(&self) -> anyhow::Result<Credentials> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(Credentials::ApiKey(key.clone()));
        }

        match (&self.username, &self.password) {
            (Some(username), Some(password)) if !username.is_empty() => Ok(Credentials::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => anyhow::bail!(
                "no credentials configured: set RALLY_API_KEY or RALLY_USERNAME and RALLY_PASSWORD"
            ),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.clamp(1, 2000)
    }
}

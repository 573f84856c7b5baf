use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub browser: BrowserConfig,
    pub yahoo: SiteConfig,
    pub amazon: SiteConfig,
    pub fetch: FetchConfig,
    pub scheduler: SchedulerConfig,
    pub notifications: NotificationsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub chrome_path: Option<String>,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub locale: String,
    pub timezone: String,
    pub accept_language: String,
    pub user_agents: Vec<String>,
}

/// Human-pacing bounds for one marketplace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub delay_min_secs: f64,
    pub delay_max_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_step_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub interval_minutes: u64,
    pub auto_start: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    pub max_stored: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<String>,
}

pub const DEFAULT_USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
];

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://auction_watch.db?mode=rwc".to_string(),
                max_connections: 5,
            },
            browser: BrowserConfig::default(),
            yahoo: SiteConfig::default(),
            amazon: SiteConfig::default(),
            fetch: FetchConfig {
                timeout_secs: 30,
                max_retries: 3,
                backoff_step_secs: 5,
            },
            scheduler: SchedulerConfig {
                interval_minutes: 10,
                auto_start: false,
            },
            notifications: NotificationsConfig { max_stored: 100 },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: None,
            },
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            locale: "ja-JP".to_string(),
            timezone: "Asia/Tokyo".to_string(),
            accept_language: "ja-JP,ja;q=0.9".to_string(),
            user_agents: DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            delay_min_secs: 3.0,
            delay_max_secs: 8.0,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Compiled defaults so every file is optional
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            // Environment variables with prefix "AUCTION_WATCH_"
            .add_source(Environment::with_prefix("AUCTION_WATCH").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        if config.browser.chrome_path.is_none() {
            config.browser.chrome_path = env::var("CHROME_PATH").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Message("Database max_connections must be greater than 0".into()));
        }

        if self.browser.user_agents.is_empty() {
            return Err(ConfigError::Message("Browser user_agents pool must not be empty".into()));
        }

        if self.browser.viewport_width == 0 || self.browser.viewport_height == 0 {
            return Err(ConfigError::Message("Browser viewport must be non-zero".into()));
        }

        for (name, site) in [("yahoo", &self.yahoo), ("amazon", &self.amazon)] {
            if site.delay_min_secs < 0.0 || site.delay_min_secs > site.delay_max_secs {
                return Err(ConfigError::Message(format!(
                    "{} delay_min_secs must be between 0 and delay_max_secs",
                    name
                )));
            }
        }

        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Message("Fetch timeout_secs must be greater than 0".into()));
        }

        if self.fetch.max_retries == 0 {
            return Err(ConfigError::Message("Fetch max_retries must be greater than 0".into()));
        }

        if self.scheduler.interval_minutes == 0 {
            return Err(ConfigError::Message("Scheduler interval_minutes must be greater than 0".into()));
        }

        if self.notifications.max_stored == 0 {
            return Err(ConfigError::Message("Notifications max_stored must be greater than 0".into()));
        }

        Ok(())
    }
}

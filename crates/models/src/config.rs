use crate::analysis::RiskTier;
use crate::error::EngineError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment names read without prefix, mapped to their config key. Values are kept
/// verbatim as strings.
const PLAIN_ENV_STRINGS: &[(&str, &str)] = &[
    ("FINNHUB_API_KEY", "providers.finnhub_api_key"),
    ("TWELVEDATA_API_KEY", "providers.twelvedata_api_key"),
    ("NEWSDATA_API_KEY", "providers.newsdata_api_key"),
    ("OPENROUTER_API_KEY", "providers.openrouter_api_key"),
    ("SMTP_SERVER", "email.smtp_server"),
    ("SMTP_USERNAME", "email.smtp_username"),
    ("SMTP_PASSWORD", "email.smtp_password"),
    ("SENDER_EMAIL", "email.sender_email"),
    ("DATABASE_URL", "data.db_url"),
    ("CORS_ALLOW_ORIGINS", "server.cors_allow_origins"),
];

/// Unprefixed names whose values are parsed.
const PLAIN_ENV_VALUES: &[(&str, &str)] = &[("SMTP_PORT", "email.smtp_port")];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub providers: ProvidersConfig,
    pub email: EmailConfig,
    pub analysis: AnalysisConfig,
    pub schedule: ScheduleConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Comma separated list; `*` allows any origin.
    pub cors_allow_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    pub db_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    pub finnhub_api_key: Option<String>,
    pub twelvedata_api_key: Option<String>,
    pub newsdata_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub finnhub_base_url: String,
    pub twelvedata_base_url: String,
    pub newsdata_base_url: String,
    pub openrouter_base_url: String,
    pub openrouter_model: String,
    /// Calls per rolling minute.
    pub finnhub_rate_limit: u32,
    /// Candle resolution in minutes.
    pub resolution_minutes: u32,
    pub candle_count: usize,
    pub lookback_days: i64,
    pub max_headlines: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    pub smtp_server: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub sender_email: Option<String>,
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        fn present(v: &Option<String>) -> bool {
            v.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
        }
        present(&self.smtp_server) && present(&self.smtp_username) && present(&self.smtp_password)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    pub default_risk_tier: RiskTier,
    pub reward_risk_ratio: f64,
    pub stop_loss_ratio: f64,
    pub momentum: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    pub enabled: bool,
    pub jobs: Vec<SessionJob>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

/// Daily run at a fixed UTC wall-clock time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SessionJob {
    pub id: String,
    pub hour: u32,
    pub minute: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind: "0.0.0.0".to_string(),
                port: 8000,
                cors_allow_origins: "*".to_string(),
            },
            data: DataConfig {
                db_url: "sqlite://data/jetbuddy.db".to_string(),
            },
            providers: ProvidersConfig {
                finnhub_api_key: None,
                twelvedata_api_key: None,
                newsdata_api_key: None,
                openrouter_api_key: None,
                finnhub_base_url: "https://finnhub.io/api/v1".to_string(),
                twelvedata_base_url: "https://api.twelvedata.com".to_string(),
                newsdata_base_url: "https://newsdata.io/api/1".to_string(),
                openrouter_base_url: "https://openrouter.ai/api/v1".to_string(),
                openrouter_model: "mistralai/mistral-7b-instruct:free".to_string(),
                finnhub_rate_limit: 25,
                resolution_minutes: 15,
                candle_count: 200,
                lookback_days: 30,
                max_headlines: 10,
                request_timeout_secs: 20,
            },
            email: EmailConfig {
                smtp_server: None,
                smtp_port: 587,
                smtp_username: None,
                smtp_password: None,
                sender_email: None,
            },
            analysis: AnalysisConfig {
                default_risk_tier: RiskTier::Medium,
                reward_risk_ratio: 2.0,
                stop_loss_ratio: 1.5,
                momentum: 1.0,
            },
            schedule: ScheduleConfig {
                enabled: true,
                jobs: vec![
                    SessionJob { id: "pre_london".to_string(), hour: 6, minute: 55 },
                    SessionJob { id: "pre_ny".to_string(), hour: 12, minute: 55 },
                    SessionJob { id: "pre_asian".to_string(), hour: 22, minute: 55 },
                ],
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
        }
    }
}

impl Config {
    /// Defaults, then the TOML file (if present), then `JETBUDDY_*` env, then plain env names.
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("JETBUDDY_").ignore(&["config"]).split("__"));

        for (var, key) in PLAIN_ENV_VALUES {
            let key = *key;
            figment = figment.merge(Env::raw().only(&[*var]).map(move |_| key.into()));
        }
        for (var, key) in PLAIN_ENV_STRINGS {
            if let Ok(value) = std::env::var(*var) {
                figment = figment.merge(Serialized::default(*key, value));
            }
        }

        figment
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let config: Config = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for job in &self.schedule.jobs {
            if job.hour > 23 || job.minute > 59 {
                return Err(EngineError::ConfigError {
                    reason: format!("schedule job '{}' has invalid time {:02}:{:02}", job.id, job.hour, job.minute),
                });
            }
        }
        if self.providers.resolution_minutes == 0 {
            return Err(EngineError::ConfigError {
                reason: "providers.resolution_minutes must be positive".to_string(),
            });
        }
        if self.analysis.reward_risk_ratio <= 0.0 || self.analysis.stop_loss_ratio <= 0.0 {
            return Err(EngineError::ConfigError {
                reason: "analysis ratios must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.server
            .cors_allow_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}

mod app_config;

pub use app_config::{
    AppConfig, LogFormat, LoggingConfig, SchedulerConfig, ServerConfig, WebhookConfig,
    DATABASE_URL_MISSING,
};

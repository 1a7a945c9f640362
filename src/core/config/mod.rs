mod parsing;
mod secret;
mod settings;
mod types;

#[allow(unused_imports)]
pub(crate) use types::{
    AdminSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, Environment,
    LimitsSettings, RuntimeSettings, SecuritySettings, Settings, TelemetrySettings,
};

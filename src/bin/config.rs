use geopost::NotificationBehavior;
use once_cell::sync::Lazy;
use serde_derive::Deserialize;

pub static CONFIG: Lazy<Config> = Lazy::new(|| Config::new().expect("Config could not be loaded."));

#[derive(Debug, Deserialize)]
pub struct General {
    pub log_level: log::Level,
}

#[derive(Debug, Deserialize)]
pub struct Simulation {
    pub start_latitude: f64,
    pub start_longitude: f64,
    pub step_degrees: f64,
    pub grant_notifications: bool,
    pub grant_foreground: bool,
    pub grant_background: bool,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub general: General,
    pub notifications: NotificationBehavior,
    pub simulation: Simulation,
}

impl Config {
    pub fn new() -> Result<Self, config::ConfigError> {
        let mut s = config::Config::new();

        s.merge(config::File::with_name("config/default"))?;

        // Local overrides, not checked in.
        s.merge(config::File::with_name("config/local").required(false))?;

        s.try_into()
    }
}

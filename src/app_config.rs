use crate::domain::Coordinate;
use config::Config;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    auth: Auth,
    backend: Backend,
    traccar: Traccar,
    tracking: Tracking,
    map: MapConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(config::File::with_name("config_local").required(false))
            .add_source(config::Environment::with_prefix("ROUTEWATCH").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn traccar(&self) -> &Traccar {
        &self.traccar
    }

    pub fn tracking(&self) -> &Tracking {
        &self.tracking
    }

    pub fn map(&self) -> &MapConfig {
        &self.map
    }
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    session_file: String,
    token: Option<String>,
}

impl Auth {
    pub fn session_file(&self) -> &str {
        &self.session_file
    }

    /// A freshly issued token, takes precedence over the persisted session.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|token| !token.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct Backend {
    url: String,
    retry_ms: u64,
    retry_max_delay_ms: u64,
    retry_attempts: usize,
}

impl Backend {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn retry_ms(&self) -> u64 {
        self.retry_ms
    }

    pub fn retry_max_delay_ms(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    pub fn retry_attempts(&self) -> usize {
        self.retry_attempts
    }
}

#[derive(Debug, Deserialize)]
pub struct Traccar {
    url: String,
    email: String,
    password: String,
}

impl Traccar {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

#[derive(Debug, Deserialize)]
pub struct Tracking {
    run_file: String,
    #[serde(with = "humantime_serde")]
    poll_interval: Duration,
}

impl Tracking {
    pub fn run_file(&self) -> &str {
        &self.run_file
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct MapConfig {
    default_center: Coordinate,
    default_zoom: f64,
    max_fit_zoom: f64,
    fly_to_min_zoom: f64,
    fit_padding_px: f64,
    width_px: f64,
    height_px: f64,
}

impl MapConfig {
    pub fn default_center(&self) -> Coordinate {
        self.default_center
    }

    pub fn default_zoom(&self) -> f64 {
        self.default_zoom
    }

    pub fn max_fit_zoom(&self) -> f64 {
        self.max_fit_zoom
    }

    pub fn fly_to_min_zoom(&self) -> f64 {
        self.fly_to_min_zoom
    }

    pub fn fit_padding_px(&self) -> f64 {
        self.fit_padding_px
    }

    pub fn width_px(&self) -> f64 {
        self.width_px
    }

    pub fn height_px(&self) -> f64 {
        self.height_px
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                auth: Auth {
                    session_file: "session.json".to_string(),
                    token: None,
                },
                backend: Backend {
                    url: "http://localhost:8080".to_string(),
                    retry_ms: 10,
                    retry_max_delay_ms: 20,
                    retry_attempts: 2,
                },
                traccar: Traccar {
                    url: "http://localhost:8082".to_string(),
                    email: "dispatch@example.com".to_string(),
                    password: "secret".to_string(),
                },
                tracking: Tracking {
                    run_file: "run.json".to_string(),
                    poll_interval: Duration::from_millis(20),
                },
                map: MapConfig {
                    default_center: Coordinate::new(-16.4897, -68.1193),
                    default_zoom: 13.0,
                    max_fit_zoom: 16.0,
                    fly_to_min_zoom: 15.0,
                    fit_padding_px: 80.0,
                    width_px: 1024.0,
                    height_px: 768.0,
                },
            },
        }
    }

    pub fn backend_url(mut self, url: String) -> Self {
        self.config.backend.url = url;
        self
    }

    pub fn traccar_url(mut self, url: String) -> Self {
        self.config.traccar.url = url;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

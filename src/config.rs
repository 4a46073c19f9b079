//! Runtime settings: stop subscription, cadence, time zone and feed URLs

use crate::types::{NavajaError, Result, SubscriptionList};
use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder substituted in the bus-stop URL template
pub const STOP_ID_PLACEHOLDER: &str = "{stop_id}";

/// Upstream feed URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub usd: String,
    pub uf: String,
    pub metro: String,
    pub seismic: String,
    /// Template containing `{stop_id}`
    pub bus_stop: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            usd: "https://mindicador.cl/api/dolar".to_string(),
            uf: "https://mindicador.cl/api/uf".to_string(),
            metro: "https://www.metro.cl/api/estado-red".to_string(),
            seismic: "https://api.gael.cl/general/public/sismos".to_string(),
            bus_stop: "https://api.xor.cl/red/bus-stop/{stop_id}".to_string(),
        }
    }
}

impl Endpoints {
    /// Every endpoint rooted at `base` (used against local mock servers)
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            usd: format!("{}/api/dolar", base),
            uf: format!("{}/api/uf", base),
            metro: format!("{}/api/estado-red", base),
            seismic: format!("{}/general/public/sismos", base),
            bus_stop: format!("{}/red/bus-stop/{}", base, STOP_ID_PLACEHOLDER),
        }
    }

    pub fn bus_stop_url(&self, stop_id: &str) -> String {
        stop_url(&self.bus_stop, stop_id)
    }
}

/// Interpolate a stop identifier into a URL template
pub fn stop_url(template: &str, stop_id: &str) -> String {
    template.replace(STOP_ID_PLACEHOLDER, stop_id)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Comma-separated bus-stop codes
    pub stop_ids: String,
    pub update_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// IANA zone used for naive upstream timestamps
    pub timezone: String,
    pub endpoints: Endpoints,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stop_ids: "PA433".to_string(),
            update_interval_secs: 60,
            request_timeout_secs: 20,
            timezone: "America/Santiago".to_string(),
            endpoints: Endpoints::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_path() {
                Some(path) => match Self::from_file(&path) {
                    Err(NavajaError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                        Self::default()
                    }
                    other => other?,
                },
                None => Self::default(),
            },
        };
        settings.validate()?;
        Ok(settings)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
            .map_err(|e| NavajaError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| NavajaError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.update_interval_secs == 0 {
            return Err(NavajaError::Config(
                "update_interval_secs must be greater than zero".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(NavajaError::Config(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        if !self.endpoints.bus_stop.contains(STOP_ID_PLACEHOLDER) {
            return Err(NavajaError::Config(format!(
                "endpoints.bus_stop must contain {}",
                STOP_ID_PLACEHOLDER
            )));
        }
        self.reference_tz()?;
        Ok(())
    }

    pub fn subscription(&self) -> SubscriptionList {
        SubscriptionList::parse(&self.stop_ids)
    }

    pub fn reference_tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| NavajaError::Config(format!("unknown time zone: {}", self.timezone)))
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// `config.toml` under the platform config directory
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("cl", "navaja", "navaja").map(|dirs| dirs.config_dir().join("config.toml"))
}

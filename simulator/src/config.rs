use crate::error::SimulatorError;
use crate::timing::Timing;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

/// Main configuration structure for the simulator. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub runtime: Runtime,
    #[serde(default)]
    pub timing: TimingSettings,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub http: HttpServer,
}

#[derive(Debug, Default, Deserialize)]
pub struct Runtime {
    pub threads: Option<usize>,
}

/// Segment and fragment durations of the simulated stream
#[derive(Debug, Deserialize)]
pub struct TimingSettings {
    #[serde(default = "TimingSettings::default_segment", with = "humantime_serde")]
    pub segment_duration: Duration,
    #[serde(default = "TimingSettings::default_fragment", with = "humantime_serde")]
    pub fragment_duration: Duration,
}

impl TimingSettings {
    fn default_segment() -> Duration {
        Duration::from_millis(Timing::default().segment_duration())
    }

    fn default_fragment() -> Duration {
        Duration::from_millis(Timing::default().fragment_duration())
    }

    pub fn build(&self) -> Result<Timing, SimulatorError> {
        Timing::from_durations(self.segment_duration, self.fragment_duration)
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            segment_duration: Self::default_segment(),
            fragment_duration: Self::default_fragment(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Availability {
    /// Longest a request may wait for its segment; unbounded when unset.
    #[serde(default, with = "humantime_serde")]
    pub max_wait: Option<Duration>,
}

/// HTTP server configuration, used by `serve`
#[derive(Debug, Deserialize)]
pub struct HttpServer {
    #[serde(default = "HttpServer::default_addr")]
    pub addr: String,
}

impl HttpServer {
    fn default_addr() -> String {
        ":9090".to_string()
    }
}

impl Default for HttpServer {
    fn default() -> Self {
        Self {
            addr: Self::default_addr(),
        }
    }
}

impl Settings {
    /// Loads settings from `path`, or the defaults when no path is given.
    pub fn load(path: Option<&str>) -> Result<Self, SimulatorError> {
        let Some(path) = path else {
            return Ok(Settings::default());
        };

        let data = fs::read_to_string(path).map_err(|_| {
            SimulatorError::ConfigError(format!("Config file '{}' does not exist", path))
        })?;

        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self, SimulatorError> {
        let settings: Settings = toml::from_str(data)
            .map_err(|e| SimulatorError::ConfigError(format!("Invalid configuration: {}", e)))?;
        settings.timing.build()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings.timing.build().unwrap(), Timing::default());
        assert_eq!(settings.availability.max_wait, None);
        assert_eq!(settings.http.addr, ":9090");
        assert_eq!(settings.runtime.threads, None);
    }

    #[test]
    fn parses_full_config() {
        let settings = Settings::parse(
            r#"
            [runtime]
            threads = 2

            [timing]
            segment_duration = "2s"
            fragment_duration = "500ms"

            [availability]
            max_wait = "30s"

            [http]
            addr = "127.0.0.1:8080"
            "#,
        )
        .unwrap();

        assert_eq!(settings.runtime.threads, Some(2));
        let timing = settings.timing.build().unwrap();
        assert_eq!(timing.segment_duration(), 2000);
        assert_eq!(timing.fragments_per_segment(), 4);
        assert_eq!(settings.availability.max_wait, Some(Duration::from_secs(30)));
        assert_eq!(settings.http.addr, "127.0.0.1:8080");
    }

    #[test]
    fn rejects_invalid_timing() {
        let err = Settings::parse(
            r#"
            [timing]
            segment_duration = "1s"
            fragment_duration = "300ms"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, SimulatorError::ConfigError(_)));
    }

    #[test]
    fn rejects_unknown_sections() {
        assert!(Settings::parse("[cache]\nname = \"x\"").is_err());
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = Settings::load(Some("/nonexistent/simulator.toml")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(Settings::load(None).is_ok());
    }
}

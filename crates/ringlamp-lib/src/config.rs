//! Application configuration — TOML-based, platform-aware paths.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::protocol::{BASE_TOPIC, DEFAULT_GLOBAL_BRIGHTNESS};

/// Header comment prepended to saved config files.
const CONFIG_HEADER: &str =
    "# ringlamp configuration — changes made outside the app may be overwritten.\n\n";

/// Highest MQTT quality-of-service level.
pub const MAX_QOS: u8 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Broker address, `mqtt://IP:PORT` or `ws://IP:PORT`. Empty = not set.
    #[serde(default)]
    pub broker_address: String,

    /// Broker requires a username and password.
    #[serde(default)]
    pub requires_auth: bool,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Topic prefix for both channels. Default: "topic/lamp/".
    #[serde(default = "default_base_topic")]
    pub base_topic: String,

    /// Command run once per message, e.g.
    /// `mosquitto_pub -h 192.168.1.10 -t {topic} -m {payload}`. Empty = disabled.
    #[serde(default)]
    pub publish_command: String,

    /// Quality of service passed to the publisher (0-2).
    #[serde(default)]
    pub qos: u8,

    /// Ask the broker to retain published messages.
    #[serde(default)]
    pub retain: bool,

    /// Global brightness sent with every envelope (0-255).
    #[serde(default = "default_global_brightness")]
    pub global_brightness: u8,

    /// Color for the fill-to-empty preset. Default: "#FF0000".
    #[serde(default = "default_fill_to_empty_color")]
    pub fill_to_empty_color: String,

    /// Color offered by "fill all". Default: "#3366FF".
    #[serde(default = "default_fill_all_color")]
    pub fill_all_color: String,

    /// Color offered for multi-element fills. Default: "#00FF00".
    #[serde(default = "default_fill_color")]
    pub fill_color: String,
}

fn default_base_topic() -> String {
    BASE_TOPIC.into()
}
fn default_global_brightness() -> u8 {
    DEFAULT_GLOBAL_BRIGHTNESS
}
fn default_fill_to_empty_color() -> String {
    "#FF0000".into()
}
fn default_fill_all_color() -> String {
    "#3366FF".into()
}
fn default_fill_color() -> String {
    "#00FF00".into()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            broker_address: String::new(),
            requires_auth: false,
            username: String::new(),
            password: String::new(),
            base_topic: default_base_topic(),
            publish_command: String::new(),
            qos: 0,
            retain: false,
            global_brightness: default_global_brightness(),
            fill_to_empty_color: default_fill_to_empty_color(),
            fill_all_color: default_fill_all_color(),
            fill_color: default_fill_color(),
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// `broker_address` is not `ws://IP:PORT` after normalization.
    InvalidBrokerAddress(String),
    /// Authentication is required but a credential is empty.
    MissingCredentials,
    /// A color field could not be parsed.
    InvalidColor { field: &'static str, reason: String },
    /// `qos` is above [`MAX_QOS`].
    InvalidQos(u8),
    /// `base_topic` is empty or whitespace-only.
    EmptyBaseTopic,
    /// `publish_command` cannot be split into arguments.
    InvalidPublishCommand(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidBrokerAddress(a) => {
                write!(f, "Invalid broker address: {a} (use ws://IP:PORT)")
            }
            ValidationError::MissingCredentials => {
                write!(f, "Authentication requires both username and password")
            }
            ValidationError::InvalidColor { field, reason } => {
                write!(f, "Invalid {field}: {reason}")
            }
            ValidationError::InvalidQos(q) => write!(f, "Invalid qos: {q} (use 0-{MAX_QOS})"),
            ValidationError::EmptyBaseTopic => write!(f, "Base topic cannot be empty"),
            ValidationError::InvalidPublishCommand(e) => write!(f, "Invalid publish_command: {e}"),
        }
    }
}

/// Rewrite `mqtt://` to `ws://` and check the result is `ws://IP:PORT`.
///
/// The host part may only contain digits and dots; the port must be decimal.
pub fn normalize_broker_address(address: &str) -> crate::error::Result<String> {
    let address = address.trim();
    let formatted = address.replacen("mqtt://", "ws://", 1);
    let invalid = || {
        crate::RinglampError::Config(format!(
            "Invalid broker address: {address} (use ws://IP:PORT)"
        ))
    };
    let rest = formatted.strip_prefix("ws://").ok_or_else(invalid)?;
    let (host, port) = rest.rsplit_once(':').ok_or_else(invalid)?;
    let host_ok = !host.is_empty() && host.chars().all(|c| c.is_ascii_digit() || c == '.');
    let port_ok = !port.is_empty() && port.chars().all(|c| c.is_ascii_digit());
    if host_ok && port_ok {
        Ok(formatted)
    } else {
        Err(invalid())
    }
}

/// Split a broker address into host and port after normalization.
pub fn broker_endpoint(address: &str) -> crate::error::Result<(String, u16)> {
    let normalized = normalize_broker_address(address)?;
    let invalid = || {
        crate::RinglampError::Config(format!(
            "Invalid broker address: {} (use ws://IP:PORT)",
            address.trim()
        ))
    };
    let rest = normalized.strip_prefix("ws://").ok_or_else(invalid)?;
    let (host, port) = rest.rsplit_once(':').ok_or_else(invalid)?;
    let port: u16 = port.parse().map_err(|_| invalid())?;
    Ok((host.to_string(), port))
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ringlamp"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Load config from disk, or return defaults if not found.
    pub fn load() -> Self {
        let (config, warnings) = Self::load_with_warnings();
        for w in &warnings {
            log::warn!("{w}");
        }
        config
    }

    /// Save config to an arbitrary path atomically (write to temp file, then rename).
    ///
    /// A header comment is prepended to warn that manual edits may be overwritten.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let serialized = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = format!("{CONFIG_HEADER}{serialized}");
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &contents)?;
        match std::fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(_) => {
                // Rename can fail across filesystems; fall back to direct write + cleanup
                let result = std::fs::write(path, &contents);
                let _ = std::fs::remove_file(&tmp);
                result
            }
        }
    }

    /// Save config to the default platform path.
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config directory",
            ));
        };
        self.save_to(&path)
    }

    /// Load config from an arbitrary path, returning the config and any parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Publish options derived from `qos` and `retain`.
    pub fn publish_options(&self) -> crate::publish::PublishOptions {
        crate::publish::PublishOptions {
            qos: self.qos,
            retain: self.retain,
        }
    }

    /// Publisher for `publish_command`, with the broker endpoint and (when
    /// `requires_auth` is set) the credentials filled in.
    pub fn publisher(&self) -> crate::error::Result<crate::publish::CommandPublisher> {
        if self.publish_command.trim().is_empty() {
            return Err(crate::RinglampError::Config(
                "publish_command is not set".into(),
            ));
        }
        let mut publisher = crate::publish::CommandPublisher::from_template(&self.publish_command)?;
        if !self.broker_address.trim().is_empty() {
            let (host, port) = broker_endpoint(&self.broker_address)?;
            publisher = publisher.with_broker(host, port);
        }
        if self.requires_auth {
            publisher = publisher.with_credentials(&self.username, &self.password);
        }
        Ok(publisher)
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !self.broker_address.trim().is_empty()
            && normalize_broker_address(&self.broker_address).is_err()
        {
            errors.push(ValidationError::InvalidBrokerAddress(
                self.broker_address.clone(),
            ));
        }

        if self.requires_auth && (self.username.is_empty() || self.password.is_empty()) {
            errors.push(ValidationError::MissingCredentials);
        }

        for (field, value) in [
            ("fill_to_empty_color", &self.fill_to_empty_color),
            ("fill_all_color", &self.fill_all_color),
            ("fill_color", &self.fill_color),
        ] {
            if let Err(e) = crate::led::parse_color(value) {
                errors.push(ValidationError::InvalidColor {
                    field,
                    reason: e.to_string(),
                });
            }
        }

        if self.qos > MAX_QOS {
            errors.push(ValidationError::InvalidQos(self.qos));
        }

        if self.base_topic.trim().is_empty() {
            errors.push(ValidationError::EmptyBaseTopic);
        }

        if !self.publish_command.trim().is_empty()
            && let Err(e) = crate::publish::CommandPublisher::from_template(&self.publish_command)
        {
            errors.push(ValidationError::InvalidPublishCommand(e.to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── defaults ──

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.base_topic, "topic/lamp/");
        assert_eq!(c.global_brightness, 255);
        assert_eq!(c.fill_to_empty_color, "#FF0000");
        assert_eq!(c.fill_all_color, "#3366FF");
        assert_eq!(c.fill_color, "#00FF00");
        assert_eq!(c.qos, 0);
        assert!(!c.retain);
        assert!(!c.requires_auth);
        assert!(c.publish_command.is_empty());
    }

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    // ── TOML ──

    #[test]
    fn serialize_roundtrip() {
        let c = Config {
            broker_address: "ws://192.168.1.100:9001".into(),
            base_topic: "home/ring/".into(),
            qos: 1,
            retain: true,
            global_brightness: 80,
            ..Config::default()
        };
        let toml_str = toml::to_string_pretty(&c).unwrap();
        let c2: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(c2.broker_address, "ws://192.168.1.100:9001");
        assert_eq!(c2.base_topic, "home/ring/");
        assert_eq!(c2.qos, 1);
        assert!(c2.retain);
        assert_eq!(c2.global_brightness, 80);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c: Config = toml::from_str("global_brightness = 10").unwrap();
        assert_eq!(c.global_brightness, 10);
        assert_eq!(c.base_topic, "topic/lamp/");
        assert_eq!(c.fill_to_empty_color, "#FF0000");
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let c: Config = toml::from_str("").unwrap();
        assert_eq!(c.base_topic, "topic/lamp/");
        assert_eq!(c.global_brightness, 255);
    }

    #[test]
    fn out_of_range_brightness_is_parse_error() {
        let result: std::result::Result<Config, _> = toml::from_str("global_brightness = 300");
        assert!(result.is_err());
    }

    #[test]
    fn load_from_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (c, warnings) = Config::load_from(&dir.path().join("absent.toml"));
        assert!(warnings.is_empty());
        assert_eq!(c.base_topic, "topic/lamp/");
    }

    #[test]
    fn load_from_malformed_file_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is { not valid toml").unwrap();
        let (c, warnings) = Config::load_from(&path);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("config parse error"));
        assert_eq!(c.global_brightness, 255);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let c = Config {
            publish_command: "mosquitto_pub -t {topic} -m {payload}".into(),
            ..Config::default()
        };
        c.save_to(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# ringlamp configuration"));
        let (loaded, warnings) = Config::load_from(&path);
        assert!(warnings.is_empty());
        assert_eq!(loaded.publish_command, c.publish_command);
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn config_path_ends_with_toml() {
        if let Some(path) = Config::path() {
            assert_eq!(path.file_name().unwrap(), "config.toml");
        }
    }

    // ── broker address ──

    #[test]
    fn broker_mqtt_scheme_rewritten() {
        assert_eq!(
            normalize_broker_address("mqtt://192.168.1.100:1883").unwrap(),
            "ws://192.168.1.100:1883"
        );
    }

    #[test]
    fn broker_ws_kept() {
        assert_eq!(
            normalize_broker_address(" ws://10.0.0.2:9001 ").unwrap(),
            "ws://10.0.0.2:9001"
        );
    }

    #[test]
    fn broker_invalid_forms() {
        for bad in [
            "192.168.1.100:1883",
            "ws://broker.local:1883",
            "ws://10.0.0.2",
            "ws://10.0.0.2:",
            "ws://:1883",
            "http://10.0.0.2:80",
            "ws://10.0.0.2:80a",
        ] {
            assert!(normalize_broker_address(bad).is_err(), "{bad} should be rejected");
        }
    }

    // ── validate ──

    #[test]
    fn validate_collects_all_errors() {
        let c = Config {
            broker_address: "broker.local".into(),
            requires_auth: true,
            username: "lamp".into(),
            fill_color: "chartreuse".into(),
            qos: 3,
            base_topic: "  ".into(),
            publish_command: "pub 'unterminated".into(),
            ..Config::default()
        };
        let errors = c.validate().unwrap_err();
        assert_eq!(errors.len(), 6, "got: {errors:?}");
        assert!(errors.contains(&ValidationError::MissingCredentials));
        assert!(errors.contains(&ValidationError::InvalidQos(3)));
        assert!(errors.contains(&ValidationError::EmptyBaseTopic));
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::InvalidColor { field: "fill_color", .. }))
        );
    }

    #[test]
    fn validate_auth_with_credentials_ok() {
        let c = Config {
            requires_auth: true,
            username: "lamp".into(),
            password: "secret".into(),
            ..Config::default()
        };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn broker_endpoint_splits_host_and_port() {
        assert_eq!(
            broker_endpoint("mqtt://10.0.0.5:1883").unwrap(),
            ("10.0.0.5".to_string(), 1883)
        );
        assert!(broker_endpoint("ws://10.0.0.5:99999").is_err());
        assert!(broker_endpoint("10.0.0.5:1883").is_err());
    }

    #[test]
    fn publisher_fills_broker_and_credentials() {
        let c = Config {
            broker_address: "mqtt://192.168.1.10:1883".into(),
            requires_auth: true,
            username: "lamp".into(),
            password: "pw".into(),
            publish_command: "pub -h {host} -p {port} -u {username} -P {password} -t {topic}"
                .into(),
            ..Config::default()
        };
        let argv = c
            .publisher()
            .unwrap()
            .render("t/x", "m", &c.publish_options());
        assert_eq!(
            argv,
            vec!["pub", "-h", "192.168.1.10", "-p", "1883", "-u", "lamp", "-P", "pw", "-t", "t/x"]
        );
    }

    #[test]
    fn publisher_omits_credentials_without_auth() {
        let c = Config {
            requires_auth: false,
            username: "lamp".into(),
            password: "pw".into(),
            publish_command: "pub [{username}] [{host}]".into(),
            ..Config::default()
        };
        let argv = c.publisher().unwrap().render("t", "m", &c.publish_options());
        assert_eq!(argv, vec!["pub", "[]", "[]"]);
    }

    #[test]
    fn publisher_requires_command_and_valid_broker() {
        assert!(Config::default().publisher().is_err());
        let c = Config {
            broker_address: "ws://lamp.local:1883".into(),
            publish_command: "pub".into(),
            ..Config::default()
        };
        assert!(c.publisher().is_err());
    }

    #[test]
    fn publish_options_from_config() {
        let c = Config {
            qos: 1,
            retain: true,
            ..Config::default()
        };
        let opts = c.publish_options();
        assert_eq!(opts.qos, 1);
        assert!(opts.retain);
    }

    #[test]
    fn validation_error_display() {
        assert_eq!(
            ValidationError::InvalidQos(5).to_string(),
            "Invalid qos: 5 (use 0-2)"
        );
        assert_eq!(
            ValidationError::MissingCredentials.to_string(),
            "Authentication requires both username and password"
        );
    }
}

use anyhow::Result;
use hireflow_core::script::InterviewScript;
use std::{fmt::Display, path::PathBuf, str::FromStr, time::Duration};
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub log_level: Level,
    pub script_path: Option<PathBuf>,
    pub thinking_pause: Duration,
    pub words_per_minute: u32,
    pub speech_output: bool,
    pub speech_input: bool,
    pub recognition_continuous: bool,
    pub chat_reply_delay: Duration,
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("'{}': {}", raw, e))),
        Err(_) => Ok(default),
    }
}

fn parse_switch(name: &str, default: bool) -> Result<bool, ConfigError> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not one of on/off/true/false/1/0/yes/no", raw),
        )),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let script_path = std::env::var("INTERVIEW_SCRIPT_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let words_per_minute = parse_var("SPEECH_WORDS_PER_MINUTE", 180u32)?;
        if words_per_minute == 0 {
            return Err(ConfigError::InvalidValue(
                "SPEECH_WORDS_PER_MINUTE".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            log_level,
            script_path,
            thinking_pause: Duration::from_millis(parse_var("THINKING_PAUSE_MS", 1000u64)?),
            words_per_minute,
            speech_output: parse_switch("SPEECH_OUTPUT", true)?,
            speech_input: parse_switch("SPEECH_INPUT", true)?,
            recognition_continuous: parse_switch("RECOGNITION_CONTINUOUS", false)?,
            chat_reply_delay: Duration::from_millis(parse_var("CHAT_REPLY_DELAY_MS", 800u64)?),
        })
    }

    /// The configured question bank, or the built-in one.
    pub fn load_script(&self) -> Result<InterviewScript> {
        match &self.script_path {
            Some(path) => InterviewScript::from_file(path),
            None => Ok(InterviewScript::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::io::Write;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("RUST_LOG");
            env::remove_var("INTERVIEW_SCRIPT_PATH");
            env::remove_var("THINKING_PAUSE_MS");
            env::remove_var("SPEECH_WORDS_PER_MINUTE");
            env::remove_var("SPEECH_OUTPUT");
            env::remove_var("SPEECH_INPUT");
            env::remove_var("RECOGNITION_CONTINUOUS");
            env::remove_var("CHAT_REPLY_DELAY_MS");
        }
    }

    #[test]
    fn test_config_error_display() {
        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_env_vars();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.script_path, None);
        assert_eq!(config.thinking_pause, Duration::from_millis(1000));
        assert_eq!(config.words_per_minute, 180);
        assert!(config.speech_output);
        assert!(config.speech_input);
        assert!(!config.recognition_continuous);
        assert_eq!(config.chat_reply_delay, Duration::from_millis(800));
    }

    #[test]
    #[serial]
    fn test_config_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("RUST_LOG", "debug");
            env::set_var("INTERVIEW_SCRIPT_PATH", "/custom/questions.txt");
            env::set_var("THINKING_PAUSE_MS", "250");
            env::set_var("SPEECH_WORDS_PER_MINUTE", "240");
            env::set_var("SPEECH_OUTPUT", "off");
            env::set_var("SPEECH_INPUT", "No");
            env::set_var("RECOGNITION_CONTINUOUS", "true");
            env::set_var("CHAT_REPLY_DELAY_MS", "0");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(
            config.script_path,
            Some(PathBuf::from("/custom/questions.txt"))
        );
        assert_eq!(config.thinking_pause, Duration::from_millis(250));
        assert_eq!(config.words_per_minute, 240);
        assert!(!config.speech_output);
        assert!(!config.speech_input);
        assert!(config.recognition_continuous);
        assert_eq!(config.chat_reply_delay, Duration::ZERO);
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_pause() {
        clear_env_vars();
        unsafe {
            env::set_var("THINKING_PAUSE_MS", "soon");
        }

        let ConfigError::InvalidValue(var, reason) = Config::from_env().unwrap_err();
        assert_eq!(var, "THINKING_PAUSE_MS");
        assert!(reason.contains("soon"));
    }

    #[test]
    #[serial]
    fn test_config_invalid_switch() {
        clear_env_vars();
        unsafe {
            env::set_var("SPEECH_OUTPUT", "maybe");
        }

        let ConfigError::InvalidValue(var, _) = Config::from_env().unwrap_err();
        assert_eq!(var, "SPEECH_OUTPUT");
    }

    #[test]
    #[serial]
    fn test_config_zero_speaking_rate() {
        clear_env_vars();
        unsafe {
            env::set_var("SPEECH_WORDS_PER_MINUTE", "0");
        }

        let ConfigError::InvalidValue(var, _) = Config::from_env().unwrap_err();
        assert_eq!(var, "SPEECH_WORDS_PER_MINUTE");
    }

    #[test]
    #[serial]
    fn test_load_script_from_configured_path() {
        clear_env_vars();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Why this role?").unwrap();
        unsafe {
            env::set_var("INTERVIEW_SCRIPT_PATH", file.path());
        }

        let config = Config::from_env().unwrap();
        let script = config.load_script().unwrap();
        assert_eq!(script.prompts(), ["Why this role?"]);
    }

    #[test]
    #[serial]
    fn test_load_default_script() {
        clear_env_vars();
        let config = Config::from_env().unwrap();
        assert_eq!(config.load_script().unwrap().len(), 5);
    }
}

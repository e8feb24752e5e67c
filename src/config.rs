//! # Bot Configuration Module
//!
//! This module defines configuration structures for the webhook service,
//! including media download limits, classifier parameters and conversation
//! tracking bounds. Every value has a default and can be overridden from the
//! environment (a `.env` file is loaded by the binary before this runs).

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// Constants for bot configuration
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;
pub const DEFAULT_INPUT_SIZE: u32 = 224;
pub const DEFAULT_MEDIA_TIMEOUT_SECS: u64 = 15;
pub const MAX_MEDIA_BYTES: u64 = 10 * 1024 * 1024; // 10MB limit for inbound photos
pub const DEFAULT_MAX_CONVERSATIONS: u64 = 10_000;
pub const DEFAULT_CONVERSATION_IDLE_SECS: u64 = 24 * 60 * 60;

/// HTTP listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port bound on all interfaces
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

/// Credentials used to authenticate media downloads against the messaging platform
#[derive(Clone, Default)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
}

impl std::fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// Media download configuration
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Whole-request timeout for a media download in seconds
    pub timeout_secs: u64,
    /// Largest accepted payload in bytes
    pub max_bytes: u64,
    /// Basic-auth credentials, `None` for unauthenticated fetches
    pub credentials: Option<TwilioCredentials>,
}

impl MediaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_MEDIA_TIMEOUT_SECS,
            max_bytes: MAX_MEDIA_BYTES,
            credentials: None,
        }
    }
}

/// Classifier and static data configuration
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// ONNX model artifact
    pub model_path: PathBuf,
    /// JSON object mapping class indices to scientific names
    pub class_mapping_path: PathBuf,
    /// JSON array of plant records
    pub plant_data_path: PathBuf,
    /// Minimum confidence required to report an identification
    pub confidence_threshold: f32,
    /// Edge of the square input the model expects
    pub input_size: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("dr_roots_model.onnx"),
            class_mapping_path: PathBuf::from("data/class_mapping.json"),
            plant_data_path: PathBuf::from("data/plant_data.json"),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            input_size: DEFAULT_INPUT_SIZE,
        }
    }
}

/// Bounds for the per-sender conversation tracker
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Maximum number of tracked senders before eviction kicks in
    pub max_conversations: u64,
    /// Idle time after which a conversation is forgotten, in seconds
    pub idle_secs: u64,
}

impl ConversationConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_secs)
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_conversations: DEFAULT_MAX_CONVERSATIONS,
            idle_secs: DEFAULT_CONVERSATION_IDLE_SECS,
        }
    }
}

/// Configuration structure for the whole service
#[derive(Debug, Clone, Default)]
pub struct BotConfig {
    pub server: ServerConfig,
    pub media: MediaConfig,
    pub classifier: ClassifierConfig,
    pub conversation: ConversationConfig,
}

impl BotConfig {
    /// Build the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    ///
    /// Unset keys keep their default; set but malformed keys are an error
    /// naming the offending variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = parse_var(&lookup, "PORT")? {
            config.server.port = port;
        }

        let sid = lookup("TWILIO_ACCOUNT_SID").filter(|v| !v.trim().is_empty());
        let token = lookup("TWILIO_AUTH_TOKEN").filter(|v| !v.trim().is_empty());
        config.media.credentials = match (sid, token) {
            (Some(account_sid), Some(auth_token)) => Some(TwilioCredentials {
                account_sid,
                auth_token,
            }),
            (None, None) => None,
            _ => {
                return Err(anyhow!(
                    "TWILIO_ACCOUNT_SID and TWILIO_AUTH_TOKEN must be set together"
                ))
            }
        };
        if let Some(timeout) = parse_var(&lookup, "MEDIA_TIMEOUT_SECS")? {
            config.media.timeout_secs = timeout;
        }
        if let Some(max_bytes) = parse_var(&lookup, "MAX_MEDIA_BYTES")? {
            config.media.max_bytes = max_bytes;
        }

        if let Some(path) = lookup("MODEL_PATH") {
            config.classifier.model_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("CLASS_MAPPING_PATH") {
            config.classifier.class_mapping_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("PLANT_DATA_PATH") {
            config.classifier.plant_data_path = PathBuf::from(path);
        }
        if let Some(threshold) = parse_var::<f32, _>(&lookup, "CONFIDENCE_THRESHOLD")? {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(anyhow!(
                    "CONFIDENCE_THRESHOLD must be within [0, 1], got {threshold}"
                ));
            }
            config.classifier.confidence_threshold = threshold;
        }
        if let Some(size) = parse_var::<u32, _>(&lookup, "CLASSIFIER_INPUT_SIZE")? {
            if size == 0 {
                return Err(anyhow!("CLASSIFIER_INPUT_SIZE must be positive"));
            }
            config.classifier.input_size = size;
        }

        if let Some(max) = parse_var(&lookup, "MAX_CONVERSATIONS")? {
            config.conversation.max_conversations = max;
        }
        if let Some(idle) = parse_var(&lookup, "CONVERSATION_IDLE_SECS")? {
            config.conversation.idle_secs = idle;
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Invalid value for {key}: {raw:?}")),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.classifier.confidence_threshold, 0.7);
        assert_eq!(config.classifier.input_size, 224);
        assert_eq!(config.media.max_bytes, 10 * 1024 * 1024);
        assert!(config.media.credentials.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = BotConfig::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("CONFIDENCE_THRESHOLD", "0.5"),
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "secret"),
            ("MAX_CONVERSATIONS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.classifier.confidence_threshold, 0.5);
        assert_eq!(config.conversation.max_conversations, 3);
        let creds = config.media.credentials.unwrap();
        assert_eq!(creds.account_sid, "AC123");
        assert!(!format!("{creds:?}").contains("secret"));
    }

    #[test]
    fn test_malformed_value_names_variable() {
        let err = BotConfig::from_lookup(lookup_from(&[("PORT", "fifty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_threshold_out_of_range() {
        assert!(BotConfig::from_lookup(lookup_from(&[("CONFIDENCE_THRESHOLD", "1.5")])).is_err());
    }

    #[test]
    fn test_half_configured_credentials_rejected() {
        assert!(BotConfig::from_lookup(lookup_from(&[("TWILIO_ACCOUNT_SID", "AC123")])).is_err());
    }
}

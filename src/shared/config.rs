use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub pin: PinPolicyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub url: String,
    pub api_key: String,
    pub records_table: String,
    pub profiles_table: String,
    pub photos_bucket: String,
    /// Private buckets return no public URL and callers fall back to signed URLs.
    pub photos_bucket_public: bool,
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub silent_cooldown_secs: u64,
    pub max_photo_bytes: u64,
    pub upload_prefix: String,
    pub max_long_edge: u32,
    pub jpeg_quality: u8,
    pub error_preview: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinPolicyConfig {
    pub min_length: usize,
    pub max_length: usize,
    pub max_failed_attempts: u32,
    pub lock_window_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig {
                url: String::new(),
                api_key: String::new(),
                records_table: "activations".to_string(),
                profiles_table: "activators".to_string(),
                photos_bucket: "activation-photos".to_string(),
                photos_bucket_public: true,
                request_timeout: 30,
            },
            storage: StorageConfig {
                data_dir: default_data_dir(),
            },
            sync: SyncConfig {
                silent_cooldown_secs: 10,
                max_photo_bytes: 6 * 1024 * 1024, // 6MB
                upload_prefix: "activations/".to_string(),
                max_long_edge: 1600,
                jpeg_quality: 60,
                error_preview: 3,
            },
            pin: PinPolicyConfig {
                min_length: 4,
                max_length: 6,
                max_failed_attempts: 5,
                lock_window_secs: 300, // 5 minutes
            },
        }
    }
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|dir| dir.join("fieldkit"))
        .unwrap_or_else(|| PathBuf::from("./data"))
        .to_string_lossy()
        .into_owned()
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("FIELDKIT_REMOTE_URL") {
            if !v.trim().is_empty() {
                cfg.remote.url = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("FIELDKIT_REMOTE_ANON_KEY") {
            if !v.trim().is_empty() {
                cfg.remote.api_key = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("FIELDKIT_RECORDS_TABLE") {
            if !v.trim().is_empty() {
                cfg.remote.records_table = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("FIELDKIT_PHOTOS_BUCKET") {
            if !v.trim().is_empty() {
                cfg.remote.photos_bucket = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("FIELDKIT_PHOTOS_BUCKET_PUBLIC") {
            cfg.remote.photos_bucket_public = parse_bool(&v, cfg.remote.photos_bucket_public);
        }
        if let Ok(v) = std::env::var("FIELDKIT_REQUEST_TIMEOUT") {
            if let Some(value) = parse_u64(&v) {
                cfg.remote.request_timeout = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("FIELDKIT_DATA_DIR") {
            if !v.trim().is_empty() {
                cfg.storage.data_dir = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("FIELDKIT_SILENT_COOLDOWN_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.silent_cooldown_secs = value;
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.remote.url.trim().is_empty() || self.remote.api_key.trim().is_empty() {
            return Err(
                "Missing remote backend configuration (URL or anon key). Check FIELDKIT_REMOTE_* variables.".to_string(),
            );
        }
        if self.remote.request_timeout == 0 {
            return Err("Remote request_timeout must be greater than 0".to_string());
        }
        if self.sync.max_photo_bytes == 0 {
            return Err("Sync max_photo_bytes must be greater than 0".to_string());
        }
        if !self.sync.upload_prefix.ends_with('/') {
            return Err("Sync upload_prefix must end with '/'".to_string());
        }
        if self.pin.min_length == 0 || self.pin.min_length > self.pin.max_length {
            return Err("PIN length policy is inconsistent".to_string());
        }
        if self.pin.max_failed_attempts == 0 {
            return Err("PIN max_failed_attempts must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_fails_validation_without_remote() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn configured_remote_passes_validation() {
        let mut cfg = AppConfig::default();
        cfg.remote.url = "https://example.supabase.co".to_string();
        cfg.remote.api_key = "anon-key".to_string();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn upload_prefix_must_be_a_directory() {
        let mut cfg = AppConfig::default();
        cfg.remote.url = "https://example.supabase.co".to_string();
        cfg.remote.api_key = "anon-key".to_string();
        cfg.sync.upload_prefix = "activations".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parse_bool_falls_back_on_garbage() {
        assert!(parse_bool("yes", false));
        assert!(!parse_bool("off", true));
        assert!(parse_bool("banana", true));
    }
}

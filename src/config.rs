use std::env;
use std::path::PathBuf;

use anyhow::Result;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: String,
    pub card_storage_path: PathBuf,
    pub public_dir: PathBuf,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_chat_model: String,
    pub openai_image_model: String,
    pub openai_image_size: String,
    pub openai_image_quality: String,
    pub portrait_session_ttl_seconds: u64,
    pub max_upload_bytes: usize,
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(default)
}

fn normalize_base_url(value: String) -> String {
    value.trim_end_matches('/').to_string()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            host: env_string("HOST", "0.0.0.0"),
            port: env_u16("PORT", 3000),
            log_level: env_string("LOG_LEVEL", "info"),
            database_url: env_string("DATABASE_URL", "sqlite://cards.db?mode=rwc"),
            card_storage_path: PathBuf::from(env_string("CARD_STORAGE_PATH", "card-images")),
            public_dir: PathBuf::from(env_string("PUBLIC_DIR", "public")),
            openai_api_key: env_string("OPENAI_API_KEY", ""),
            openai_base_url: normalize_base_url(env_string(
                "OPENAI_BASE_URL",
                "https://api.openai.com/v1",
            )),
            openai_chat_model: env_string("OPENAI_CHAT_MODEL", "gpt-4o-mini"),
            openai_image_model: env_string("OPENAI_IMAGE_MODEL", "dall-e-3"),
            openai_image_size: env_string("OPENAI_IMAGE_SIZE", "1024x1024"),
            openai_image_quality: env_string("OPENAI_IMAGE_QUALITY", "standard"),
            portrait_session_ttl_seconds: env_u64("PORTRAIT_SESSION_TTL_SECONDS", 1800),
            max_upload_bytes: env_usize("MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
        })
    }

    pub fn ai_configured(&self) -> bool {
        !self.openai_api_key.trim().is_empty()
    }
}

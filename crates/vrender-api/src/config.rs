//! API configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second
    pub rate_limit_rps: u32,
    /// Rate limit burst
    pub rate_limit_burst: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Directory served under `public_uploads_prefix`
    pub uploads_dir: PathBuf,
    /// URL prefix of the uploads directory
    pub public_uploads_prefix: String,
    /// FFmpeg binary name or path
    pub ffmpeg_path: String,
    /// Kill renders running longer than this
    pub render_timeout_secs: Option<u64>,
    /// Forget finished jobs after this long
    pub job_retention: Option<Duration>,
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            rate_limit_burst: 20,
            max_body_size: 50 * 1024 * 1024, // 50MB
            environment: "development".to_string(),
            uploads_dir: PathBuf::from("uploads"),
            public_uploads_prefix: "/uploads".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            render_timeout_secs: None,
            job_retention: None,
            metrics_enabled: true,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            rate_limit_burst: env_parse("RATE_LIMIT_BURST").unwrap_or(defaults.rate_limit_burst),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            uploads_dir: std::env::var("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.uploads_dir),
            public_uploads_prefix: std::env::var("PUBLIC_UPLOADS_PREFIX")
                .unwrap_or(defaults.public_uploads_prefix),
            ffmpeg_path: std::env::var("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            render_timeout_secs: env_parse::<u64>("RENDER_TIMEOUT_SECS").filter(|s| *s > 0),
            job_retention: env_parse::<u64>("JOB_RETENTION_SECS")
                .filter(|s| *s > 0)
                .map(Duration::from_secs),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Directory rendered files are written to.
    pub fn videos_dir(&self) -> PathBuf {
        self.uploads_dir.join("videos")
    }

    /// Public URL of a rendered file.
    pub fn public_video_url(&self, file_name: &str) -> String {
        format!(
            "{}/videos/{}",
            self.public_uploads_prefix.trim_end_matches('/'),
            file_name
        )
    }
}

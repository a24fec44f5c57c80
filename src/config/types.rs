use serde::Deserialize;

/// Main configuration structure for strippi
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub http: HttpConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    pub schedule: ScheduleConfig,
}

/// Comic archive site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the newspaper site (e.g. "https://www.hs.fi")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the comics frontpage listing, relative to the base URL
    #[serde(rename = "comics-path")]
    pub comics_path: String,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User agent string sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Total request timeout in seconds
    #[serde(rename = "timeout-seconds")]
    pub timeout_seconds: u64,

    /// Connection timeout in seconds
    #[serde(rename = "connect-timeout-seconds")]
    pub connect_timeout_seconds: u64,
}

/// Storage locations configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory where downloaded strip images are kept
    #[serde(rename = "image-dir")]
    pub image_dir: String,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrawlConfig {
    /// Maximum number of pages to walk backward per source in one pass.
    /// Unset means unlimited; the dedup stop condition bounds steady-state
    /// runs either way.
    #[serde(rename = "max-depth")]
    pub max_depth: Option<u32>,
}

/// Daily schedule configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Local wall-clock time at which the index refresh runs ("HH:MM")
    #[serde(rename = "refresh-time")]
    pub refresh_time: String,

    /// Local wall-clock time at which daily posts go out ("HH:MM")
    #[serde(rename = "post-time")]
    pub post_time: String,

    /// Fire only Monday through Friday
    #[serde(rename = "weekdays-only", default = "default_weekdays_only")]
    pub weekdays_only: bool,
}

fn default_weekdays_only() -> bool {
    true
}

use serde::Deserialize;

/// Main configuration structure for Intrasearch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Root URL enqueued when it is not yet known to the store
    #[serde(rename = "seed-url", default = "default_seed_url")]
    pub seed_url: String,

    /// Ceiling on fetches in flight at the same time
    #[serde(rename = "max-concurrent-fetches", default = "default_max_concurrent")]
    pub max_concurrent_fetches: u32,

    /// Timeout applied to each individual HTTP call (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Wall-clock budget for fetching and processing one URL (seconds)
    #[serde(rename = "page-deadline-secs", default = "default_page_deadline")]
    pub page_deadline_secs: u64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed_url: default_seed_url(),
            max_concurrent_fetches: default_max_concurrent(),
            request_timeout_secs: default_request_timeout(),
            page_deadline_secs: default_page_deadline(),
            user_agent: default_user_agent(),
        }
    }
}

/// Link admission rules
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Hosts under this domain are admitted (e.g. "seu.edu.cn")
    #[serde(rename = "institution-domain", default = "default_institution_domain")]
    pub institution_domain: String,

    /// Hosts under the institution domain that are never crawled
    #[serde(rename = "excluded-hosts", default = "default_excluded_hosts")]
    pub excluded_hosts: Vec<String>,

    /// Leading IPv4 octets of admitted address ranges (e.g. "58.192")
    #[serde(rename = "private-prefixes", default = "default_private_prefixes")]
    pub private_prefixes: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            institution_domain: default_institution_domain(),
            excluded_hosts: default_excluded_hosts(),
            private_prefixes: default_private_prefixes(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Search API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the search API listens on
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Optional file that receives a copy of every log line
    pub file: Option<String>,
}

fn default_seed_url() -> String {
    "http://www.seu.edu.cn".to_string()
}

fn default_max_concurrent() -> u32 {
    10
}

fn default_request_timeout() -> u64 {
    3
}

fn default_page_deadline() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("intrasearch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_institution_domain() -> String {
    "seu.edu.cn".to_string()
}

fn default_excluded_hosts() -> Vec<String> {
    vec!["bbs.seu.edu.cn".to_string(), "sbbs.seu.edu.cn".to_string()]
}

fn default_private_prefixes() -> Vec<String> {
    vec!["58.192".to_string(), "223.3".to_string()]
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

use clap::Parser;

/// Shroud: resolves private transaction payloads through a private transaction manager.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Private transaction manager base URL. If omitted, no manager is
    /// configured and every transaction resolves as public.
    #[arg(long, env = "SHROUD_PTM_URL")]
    pub ptm_url: Option<String>,

    /// Per-request timeout for the private transaction manager, in seconds.
    #[arg(long, default_value = "30", env = "SHROUD_PTM_TIMEOUT_SECS")]
    pub ptm_timeout_secs: u64,

    /// Maximum outbound requests per second to the manager (optional).
    #[arg(long, env = "SHROUD_PTM_REQUESTS_PER_SECOND")]
    pub ptm_requests_per_second: Option<u32>,

    /// Upper bound for one payload lookup, in milliseconds (optional).
    #[arg(long, env = "SHROUD_LOOKUP_TIMEOUT_MS")]
    pub lookup_timeout_ms: Option<u64>,

    /// Maximum number of resolved payloads kept in memory. 0 disables caching.
    #[arg(long, default_value = "10000")]
    pub payload_cache_cap: usize,

    /// Maximum concurrent lookups for batch resolution.
    #[arg(long, default_value = "8")]
    pub resolve_concurrency: usize,

    /// Address to bind the web server to.
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: String,

    /// Port to listen on.
    #[arg(long, default_value = "3090")]
    pub port: u16,
}

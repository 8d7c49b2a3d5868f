use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the Whalefall binary.
#[derive(Debug, Parser)]
#[command(name = "whalefall", version, about = "Whalefall blog presentation server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "WHALEFALL_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve the page shells and the `/api` proxy routes.
    Serve(Box<ServeArgs>),
    /// Search a running site; each stdin line is treated as a new query.
    Search(SearchArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Origin of the blog backend the proxy routes forward to.
    #[arg(long = "backend-url", env = "BLOG_BACKEND_URL", value_name = "URL")]
    pub backend_url: Option<String>,

    /// Override the upstream request timeout.
    #[arg(long = "upstream-timeout-seconds", value_name = "SECONDS")]
    pub upstream_timeout_seconds: Option<u64>,

    /// Override the number of posts per blog listing page.
    #[arg(long = "blog-page-size", value_name = "COUNT")]
    pub blog_page_size: Option<u32>,

    /// Override the default number of recent posts.
    #[arg(long = "recent-limit", value_name = "COUNT")]
    pub recent_limit: Option<u32>,
}

#[derive(Debug, Args, Clone)]
pub struct SearchArgs {
    /// Base URL of the running Whalefall site.
    #[arg(
        long = "site",
        env = "WHALEFALL_SITE_URL",
        value_name = "URL",
        default_value = "http://127.0.0.1:3000"
    )]
    pub site: String,

    /// Restrict results to a tag.
    #[arg(long = "tag", value_name = "TAG")]
    pub tag: Option<String>,

    /// Results per page.
    #[arg(long = "page-size", value_name = "COUNT", default_value_t = 10)]
    pub page_size: u32,

    /// Delay before a typed query is sent.
    #[arg(long = "debounce-ms", value_name = "MILLIS", default_value_t = 300)]
    pub debounce_ms: u64,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,
}

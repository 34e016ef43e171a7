use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the leafdoc binary.
#[derive(Debug, Parser)]
#[command(name = "leafdoc", version, about = "Markdown documentation renderer")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "LEAFDOC_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve documents over HTTP.
    Serve(Box<ServeArgs>),
    /// Render one document to stdout.
    Render(RenderArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct DocumentOverrides {
    /// Override the directory documents are loaded from.
    #[arg(long = "docs-root", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub docs_root: Option<PathBuf>,

    /// Toggle the line-number gutter on code blocks.
    #[arg(
        long = "line-numbers",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub line_numbers: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub documents: DocumentOverrides,

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

    /// Toggle the rendered-document cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the number of rendered documents kept in memory.
    #[arg(long = "cache-capacity", value_name = "COUNT")]
    pub cache_capacity: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub documents: DocumentOverrides,

    /// Slug of the document to render.
    #[arg(value_name = "SLUG")]
    pub slug: String,

    /// Wrap code blocks with a language label and copy button.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub enhance: bool,

    /// Print the outline as JSON instead of HTML.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub outline: bool,
}

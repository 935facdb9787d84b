use std::num::NonZeroU32;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::logging::LogLevel;

#[derive(Parser, Debug, Clone)]
#[command(name = "dbtree", version, about = "Dropbox folder tree as JSON")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    /// Access token; overrides DROPBOX_ACCESS_TOKEN.
    #[arg(long, global = true)]
    pub token: Option<String>,
    /// Stop after the first delta page even if the feed has more.
    #[arg(long, global = true)]
    pub first_page_only: bool,
    /// Upper bound on fetched delta pages.
    #[arg(long, global = true)]
    pub max_pages: Option<NonZeroU32>,
    /// Resume the delta feed from a previously returned cursor.
    #[arg(long, global = true)]
    pub cursor: Option<String>,
    /// Sort siblings by id before printing.
    #[arg(long, global = true)]
    pub sorted: bool,
    #[arg(long, global = true)]
    pub pretty: bool,
    #[arg(long, short, global = true, default_value = "warn", value_enum)]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Aggregate the delta feed and print the folder tree.
    Tree,
    /// Aggregate the delta feed and print the flat path mapping.
    Raw,
    /// Print the tree of a built-in sample mapping.
    Sample,
    /// Build the tree from a JSON mapping file.
    File { path: PathBuf },
    /// Print account name and quota usage.
    Quota,
    /// Print the OAuth authorize URL.
    AuthUrl {
        #[arg(long)]
        redirect_uri: String,
        #[arg(long)]
        state: Option<String>,
    },
    /// Exchange an authorization code for an access token.
    Exchange {
        #[arg(long)]
        code: String,
        #[arg(long)]
        redirect_uri: Option<String>,
    },
}

impl Cli {
    /// Applies command-line overrides on top of environment configuration.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(token) = self.token.as_deref().map(str::trim)
            && !token.is_empty()
        {
            config.access_token = Some(token.to_string());
        }
        if self.first_page_only {
            config.full_sync = false;
        }
        if self.max_pages.is_some() {
            config.max_pages = self.max_pages;
        }
        if self.cursor.is_some() {
            config.initial_cursor = self.cursor.clone();
        }
    }
}

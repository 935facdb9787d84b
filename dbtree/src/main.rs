use std::io::Write;

use anyhow::Context;
use clap::Parser;
use dbtree::cli::{Cli, Command};
use dbtree::config::AppConfig;
use dbtree::logging::init_logging;
use dbtree::sample::sample_mapping;
use dbtree::service::{self, ServiceError};
use dbtree_core::{TreeNode, build_tree};
use serde::Serialize;
use tracing::{debug, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.log_level);
    let mut config = AppConfig::from_env();
    cli.apply_overrides(&mut config);
    debug!(command = ?cli.command, full_sync = config.full_sync, "starting");

    match &cli.command {
        Command::Tree => {
            let fetched = service::fetch_tree(&config).await.map_err(with_hint)?;
            warn_if_truncated(fetched.truncated, fetched.cursor.as_deref());
            print_tree(fetched.tree, &cli)?;
        }
        Command::Raw => {
            let outcome = service::fetch_mapping(&config).await.map_err(with_hint)?;
            warn_if_truncated(outcome.truncated, outcome.cursor.as_deref());
            print_json(&outcome.mapping, cli.pretty)?;
        }
        Command::Sample => {
            let tree = build_tree(&sample_mapping()).context("sample mapping is inconsistent")?;
            print_tree(tree, &cli)?;
        }
        Command::File { path } => {
            let mapping = service::load_mapping_file(path)
                .await
                .with_context(|| format!("failed to load mapping from {}", path.display()))?;
            let tree = build_tree(&mapping)
                .with_context(|| format!("mapping in {} is inconsistent", path.display()))?;
            print_tree(tree, &cli)?;
        }
        Command::Quota => {
            let summary = service::quota_summary(&config).await.map_err(with_hint)?;
            if cli.pretty {
                println!("{}", summary.display_name);
                println!("{}", summary.line());
            } else {
                print_json(&summary, false)?;
            }
        }
        Command::AuthUrl {
            redirect_uri,
            state,
        } => {
            let client = service::oauth_client(&config)?;
            let url = client.authorize_url(redirect_uri, state.as_deref())?;
            println!("{url}");
        }
        Command::Exchange { code, redirect_uri } => {
            let client = service::oauth_client(&config)?;
            let token = client
                .exchange_code(code, redirect_uri.as_deref())
                .await
                .context("failed to exchange authorization code")?;
            print_json(&token, cli.pretty)?;
        }
    }
    Ok(())
}

fn with_hint(err: ServiceError) -> anyhow::Error {
    let auth_failure = matches!(&err, ServiceError::Aggregation(inner) if inner.is_auth());
    let err = anyhow::Error::new(err);
    if auth_failure {
        err.context("dropbox rejected the access token")
    } else {
        err
    }
}

fn warn_if_truncated(truncated: bool, cursor: Option<&str>) {
    if !truncated {
        return;
    }
    match cursor {
        Some(cursor) => warn!("feed has more pages; rerun with --cursor {cursor} to continue"),
        None => warn!("feed has more pages but returned no cursor"),
    }
}

fn print_tree(mut tree: TreeNode, cli: &Cli) -> anyhow::Result<()> {
    if cli.sorted {
        tree.sort_children_recursive();
    }
    print_json(&tree, cli.pretty)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if pretty {
        serde_json::to_writer_pretty(&mut out, value)?;
    } else {
        serde_json::to_writer(&mut out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use stagecast_cache::{
    CacheKind, ClearSession, HttpConnector, LogoutHandler, RefreshLoop, RefreshOutcome,
    RefreshScheduler,
};
use stagecast_notify::{QueueReporter, TracingAnalytics};
use stagecast_settings::{ConfigStore, default_config_path, keys};
use stagecast_share::{ShareRequest, ShareWorkflow, StagingProvisioner};
use tracing::info;

use crate::cli::{Cli, Commands};

pub async fn run(cli: Cli, reporter: Arc<QueueReporter>) -> Result<()> {
    let store = Arc::new(open_store(cli.config.as_deref())?);

    match cli.command {
        Commands::Share { path } => {
            let workflow = share_workflow(cli.staging_root, reporter);
            let source = std::path::absolute(&path)
                .with_context(|| format!("invalid path {}", path.display()))?;
            let area = workflow.share(ShareRequest::new(source)).await?;
            println!("{}", area.path().display());
        }
        Commands::Discard { path } => {
            let workflow = share_workflow(cli.staging_root, reporter);
            let source = std::path::absolute(&path)
                .with_context(|| format!("invalid path {}", path.display()))?;
            if workflow.discard(&source).await? {
                println!("removed staging area for {}", source.display());
            } else {
                println!("nothing staged for {}", source.display());
            }
        }
        Commands::Login { token } => {
            if token.trim().is_empty() {
                bail!("token must not be empty");
            }
            store
                .set(keys::USER_TOKEN, Value::String(token))
                .context("failed to store token")?;
            println!("logged in");
        }
        Commands::Logout => {
            ClearSession::new(store).logout().await;
            println!("logged out");
        }
        Commands::Refresh { kind, token } => {
            let scheduler = scheduler(store, &cli.api_url, token, reporter)?;
            match scheduler.refresh_cache(kind.as_deref(), None).await {
                RefreshOutcome::Refreshed => println!("cache refreshed"),
                outcome => return Err(outcome_error(outcome)),
            }
        }
        Commands::Watch {
            interval_secs,
            token,
        } => {
            let scheduler = Arc::new(scheduler(store, &cli.api_url, token, reporter)?);
            watch(scheduler, Duration::from_secs(interval_secs.max(1))).await?;
        }
        Commands::Status => print_status(&store),
    }

    Ok(())
}

fn open_store(path: Option<&Path>) -> Result<ConfigStore> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path().context("could not determine config directory")?,
    };
    ConfigStore::open(path.clone())
        .with_context(|| format!("failed to open configuration {}", path.display()))
}

fn share_workflow(staging_root: Option<PathBuf>, reporter: Arc<QueueReporter>) -> ShareWorkflow {
    let provisioner = match staging_root {
        Some(root) => StagingProvisioner::new(root),
        None => StagingProvisioner::in_temp_dir(),
    };
    ShareWorkflow::with_default_collaborators(provisioner, reporter, Arc::new(TracingAnalytics))
}

fn scheduler(
    store: Arc<ConfigStore>,
    api_url: &str,
    token: Option<String>,
    reporter: Arc<QueueReporter>,
) -> Result<RefreshScheduler> {
    let connector = HttpConnector::new()
        .context("failed to build HTTP client")?
        .with_base_url(api_url);
    let scheduler = RefreshScheduler::new(
        store.clone(),
        Arc::new(connector),
        reporter,
        Arc::new(ClearSession::new(store)),
    );
    Ok(match token {
        Some(t) => scheduler.with_token(t),
        None => scheduler,
    })
}

/// Refreshes once, then keeps refreshing until Ctrl-C or the loop stops.
async fn watch(scheduler: Arc<RefreshScheduler>, period: Duration) -> Result<()> {
    let first = scheduler.refresh_cache(None, None).await;
    if matches!(
        first,
        RefreshOutcome::SessionMissing | RefreshOutcome::Revoked
    ) {
        return Err(outcome_error(first));
    }

    let (refresh_loop, task) = RefreshLoop::start(scheduler, period);
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for Ctrl-C")?;
            info!("interrupted");
            refresh_loop.stop();
        }
        _ = refresh_loop.stopped() => {}
    }
    task.await.context("refresh loop panicked")?;

    Ok(())
}

fn outcome_error(outcome: RefreshOutcome) -> anyhow::Error {
    match outcome {
        RefreshOutcome::SessionMissing => anyhow::anyhow!("not logged in"),
        RefreshOutcome::Revoked => anyhow::anyhow!("session revoked, logged out"),
        RefreshOutcome::Failed => anyhow::anyhow!("cache refresh failed"),
        RefreshOutcome::Refreshed => anyhow::anyhow!("unexpected refresh outcome"),
    }
}

fn print_status(store: &ConfigStore) {
    let logged_in = store
        .get_str(keys::USER_TOKEN)
        .is_some_and(|t| !t.is_empty());
    println!("session: {}", if logged_in { "logged in" } else { "logged out" });

    for kind in CacheKind::ALL {
        println!("{kind}: {}", describe_entry(store.get(&keys::cache_key(kind.name()))));
    }
}

fn describe_entry(entry: Option<Value>) -> String {
    match entry {
        None => "not cached".to_string(),
        Some(Value::Array(items)) => format!("{} entries", items.len()),
        Some(_) => "cached".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn describe_cache_entries() {
        assert_eq!(describe_entry(None), "not cached");
        assert_eq!(describe_entry(Some(json!([1, 2, 3]))), "3 entries");
        assert_eq!(describe_entry(Some(json!({"x": 1}))), "cached");
    }

    #[test]
    fn outcome_errors_are_descriptive() {
        assert_eq!(
            outcome_error(RefreshOutcome::SessionMissing).to_string(),
            "not logged in"
        );
        assert!(
            outcome_error(RefreshOutcome::Revoked)
                .to_string()
                .contains("revoked")
        );
    }

    #[test]
    fn open_store_uses_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = open_store(Some(&path)).unwrap();
        store.set(keys::USER_TOKEN, json!("tok")).unwrap();
        assert!(path.is_file());
    }
}

//! Command handlers: wire the collaborators from config and drive the
//! scheduler.

use std::sync::Arc;

use slotwatch_core::{load_targets, AppConfig, TargetEnumerator};
use slotwatch_notify::{EmailNotifier, JsonLinesLog, Notifier, TracingNotifier};
use slotwatch_poller::{FetchWorkerPool, PollingScheduler, SchedulerConfig};
use slotwatch_scraper::{CalendarExtractor, TorTransport};
use tokio_util::sync::CancellationToken;

pub(crate) async fn watch(config: &AppConfig, dry_run: bool) -> anyhow::Result<()> {
    let scheduler = build_scheduler(config, dry_run)?;
    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown(cancel.clone()));

    let summary = scheduler.run(&cancel).await?;
    println!(
        "stopped after {} sweep(s), {} slot(s) found ({:?})",
        summary.sweeps, summary.slots_found, summary.stop_reason
    );
    Ok(())
}

pub(crate) async fn sweep(config: &AppConfig, dry_run: bool) -> anyhow::Result<()> {
    let scheduler = build_scheduler(config, dry_run)?;
    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown(cancel.clone()));

    let report = scheduler.run_once(&cancel).await?;
    println!("succeeded:             {}", report.succeeded);
    println!("failed:                {}", report.fatal_failures);
    println!("interrupted:           {}", report.interrupted);
    println!("slots found:           {}", report.slots_found);
    println!("notification failures: {}", report.notification_failures);
    println!("log failures:          {}", report.log_failures);
    println!("elapsed:               {:.1}s", report.elapsed.as_secs_f64());
    Ok(())
}

pub(crate) fn print_targets(config: &AppConfig) -> anyhow::Result<()> {
    let enumerator = load_enumerator(config)?;
    for target in enumerator.enumerate() {
        println!("{target}\t{}", target.url(&config.base_url));
    }
    Ok(())
}

fn load_enumerator(config: &AppConfig) -> anyhow::Result<TargetEnumerator> {
    let targets = load_targets(&config.targets_path)?;
    Ok(TargetEnumerator::new(targets))
}

fn build_notifier(config: &AppConfig, dry_run: bool) -> anyhow::Result<Arc<dyn Notifier>> {
    if dry_run {
        return Ok(Arc::new(TracingNotifier));
    }
    match &config.mail {
        Some(mail) => Ok(Arc::new(EmailNotifier::from_config(mail)?)),
        None => {
            tracing::warn!("SMTP_HOST is not set; slots are only logged");
            Ok(Arc::new(TracingNotifier))
        }
    }
}

fn build_scheduler(config: &AppConfig, dry_run: bool) -> anyhow::Result<PollingScheduler> {
    let enumerator = load_enumerator(config)?;
    let transport = TorTransport::new(&config.tor, config.request_timeout_secs)?;
    let notifier = build_notifier(config, dry_run)?;

    tracing::info!(
        targets = enumerator.len(),
        workers = config.workers,
        proxy = %config.tor.socks_proxy,
        result_log = %config.result_log_path.display(),
        channel = notifier.channel_name(),
        "starting slot watch"
    );

    let pool = FetchWorkerPool::from_config(
        config,
        Arc::new(transport),
        Arc::new(CalendarExtractor::new()),
        notifier,
        Arc::new(JsonLinesLog::new(config.result_log_path.clone())),
    );
    Ok(PollingScheduler::new(
        pool,
        enumerator,
        SchedulerConfig::from_config(config),
    ))
}

/// Cancels `cancel` on Ctrl-C or SIGTERM. In-flight targets drain before
/// the scheduler stops.
async fn cancel_on_shutdown(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, draining in-flight targets");
    cancel.cancel();
}

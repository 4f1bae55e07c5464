//! topup-console: back-office daemon
//!
//! Runs the background rules of the admin console against the document
//! store until Ctrl-C:
//! - settings sync (auto-refund switch, timeout, notification toggles)
//! - dashboard projector, logging every change of the figures
//! - order expiry watcher
//!
//! ## Configuration
//! - `config.yaml` in the working directory, or the file named by
//!   TOPUP_CONFIG
//! - TOPUP__* environment overrides (e.g. TOPUP__STORE__SEED_PATH)
//! - TOPUP_LOG: tracing filter (default: info)

use std::sync::Arc;

use tracing::{error, info};

use topup_console::config::Config;
use topup_console::expiry::{ExpiryScheduler, ExpiryWatcher};
use topup_console::interfaces::DocumentStore;
use topup_console::ledger::Ledger;
use topup_console::projectors::{Dashboard, DashboardProjector};
use topup_console::services::{settings_sync, NotificationService, OrderService};
use topup_console::storage::init_store;
use topup_console::utils::bootstrap::{init_tracing, shutdown_signal};
use topup_console::utils::task::{stopped, TaskHandle};
use topup_console::utils::time::{Clock, SystemClock};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::load(None)?;
    let store: Arc<dyn DocumentStore> = Arc::new(init_store(&config.store).await?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let (settings, settings_task) = settings_sync::start(Arc::clone(&store)).await?;

    let projector = DashboardProjector::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        config.dashboard.clone(),
    );
    let (mut dashboard, dashboard_task) = projector.start().await?;
    let reporter = TaskHandle::spawn("dashboard-log", move |mut shutdown| async move {
        loop {
            let changed = tokio::select! {
                _ = stopped(&mut shutdown) => false,
                changed = dashboard.changed() => changed.is_ok(),
            };
            if !changed {
                break;
            }
            log_dashboard(&dashboard.borrow_and_update());
        }
    });

    let scheduler = Arc::new(ExpiryScheduler::new());
    let ledger = Ledger::new(Arc::clone(&store));
    let notifier = NotificationService::new(Arc::clone(&store), settings.clone(), Arc::clone(&clock));
    let orders = OrderService::new(
        Arc::clone(&store),
        ledger,
        notifier,
        Arc::clone(&scheduler),
        Arc::clone(&clock),
    );
    let watcher = ExpiryWatcher::new(
        Arc::clone(&store),
        orders,
        scheduler,
        settings,
        clock,
        config.watcher.clone(),
    )
    .start()
    .await?;

    info!(
        poll_interval_secs = config.watcher.poll_interval_secs,
        "topup-console started"
    );

    shutdown_signal().await;
    info!("Shutting down");

    for task in [watcher, reporter, dashboard_task, settings_task] {
        let name = task.name();
        if task.is_finished() {
            error!(task = name, "Task exited before shutdown");
        }
        task.stop().await;
    }

    info!("topup-console stopped");
    Ok(())
}

fn log_dashboard(d: &Dashboard) {
    info!(
        users = d.users.total_users,
        active_gamers = d.users.active_gamers,
        active_ai_users = d.users.active_ai_users,
        pending_orders = d.orders.pending_orders,
        pending_deposits = d.deposits.pending_deposits,
        today_purchase = %d.orders.today_purchase,
        today_deposit = %d.deposits.today_deposit,
        today_ad_revenue = %d.deposits.today_ad_revenue,
        total_deposit = %d.deposits.total_deposit,
        users_total_balance = %d.users.users_total_balance,
        "Dashboard"
    );
}

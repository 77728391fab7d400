use servisoft_api::RestClient;
use servisoft_core::{CoreConfig, EnvOverrides, FileConfig, Reminder, SessionStore, TaskBoard};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, interval_at};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn log_reminder(reminder: Reminder) {
    match reminder.message() {
        Some(message) => tracing::info!(
            pendientes = reminder.pendientes,
            en_progreso = reminder.en_progreso,
            "{message}"
        ),
        None => tracing::debug!("no open tasks"),
    }
}

/// Re-evaluate the reminder over the loaded board once per `period` until `shutdown`
/// resolves. The first evaluation happens one full period after the call.
///
/// Returns the number of evaluations.
async fn run_reminders(
    board: &TaskBoard,
    period: Duration,
    shutdown: impl Future<Output = ()>,
    mut on_tick: impl FnMut(Reminder),
) -> usize {
    let mut ticker = interval_at(Instant::now() + period, period);
    let mut ticks = 0;
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                ticks += 1;
                on_tick(board.reminder());
            }
            _ = &mut shutdown => break,
        }
    }
    ticks
}

/// Background reminder runner.
///
/// Loads the task board once with the stored session, shows the reminder, then repeats it
/// every reminder interval over the same board until Ctrl-C.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("servisoft=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let env = EnvOverrides::from_lookup(|k| std::env::var(k).ok());
    let file = FileConfig::load_optional(env.config_file.as_deref())?;
    let config = CoreConfig::resolve(file, env)?;

    let store = SessionStore::new(config.session_path());
    let session = store.require()?;
    tracing::info!(
        "++ Starting reminder for {} every {:?}",
        session.display_name(),
        config.reminder_interval()
    );

    let api = RestClient::new(&config, session.token)?;
    let board = TaskBoard::load(&api, &store).await?;
    log_reminder(board.reminder());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    run_reminders(&board, config.reminder_interval(), shutdown, log_reminder).await;
    tracing::info!("-- Stopping reminder");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_evaluation_waits_a_full_period() {
        let board = TaskBoard::new(Vec::new());
        let period = Duration::from_secs(7200);
        let started = Instant::now();
        let mut seen = Vec::new();
        let ticks = run_reminders(
            &board,
            period,
            tokio::time::sleep(period * 2 + Duration::from_secs(1)),
            |reminder| seen.push((started.elapsed(), reminder)),
        )
        .await;
        assert_eq!(ticks, 2);
        assert_eq!(seen[0].0, period);
        assert_eq!(seen[1].0, period * 2);
        assert!(seen.iter().all(|(_, r)| *r == Reminder::default()));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_before_first_period_evaluates_nothing() {
        let board = TaskBoard::new(Vec::new());
        let ticks = run_reminders(
            &board,
            Duration::from_secs(60),
            tokio::time::sleep(Duration::from_secs(59)),
            |_| panic!("no evaluation expected"),
        )
        .await;
        assert_eq!(ticks, 0);
    }
}

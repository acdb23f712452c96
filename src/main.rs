//! slotrace: races delivery reservation slots on a grocery platform
//!
//! Loads layered configuration, resolves the shopper's session, waits for the
//! daily launch time and then supervises flow cycles until a slot is won, the
//! run deadline passes, or nothing is left to race for.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error, info};

use slotrace_api::{normalize_cookie, BarkNotifier, ClientProfile, HttpTransport};
use slotrace_config::{validate_config, AppConfig, ConfigLoader, ENV_PREFIX};
use slotrace_metrics::{init_tracing, MetricsCollector};
use slotrace_orchestrator::gate::LaunchSchedule;
use slotrace_orchestrator::{
    ExecutionGateway, ProcessSupervisor, RaceControl, RaceSettings, Session, SessionOptions,
};
use slotrace_ratelimit::{JitterBackoff, SubmissionThrottle};

/// Delivery slot racer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (toml, yaml or json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Session cookie
    #[arg(long)]
    cookie: Option<String>,

    /// Bark push notification key
    #[arg(long)]
    bark_key: Option<String>,

    /// Request interval in milliseconds
    #[arg(long)]
    interval: Option<u64>,

    /// Submissions per open window
    #[arg(long)]
    multiplier: Option<u32>,

    /// Concurrent flow loops
    #[arg(long)]
    parallel: Option<u32>,

    /// Skip the launch wait and start right away
    #[arg(long)]
    now: bool,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(cookie) = &self.cookie {
            config.session.cookie = cookie.clone();
        }
        if let Some(key) = &self.bark_key {
            config.notify.bark_key = Some(key.clone());
        }
        if let Some(interval) = self.interval {
            config.race.interval_ms = interval;
        }
        if let Some(multiplier) = self.multiplier {
            config.race.slot_multiplier = multiplier;
        }
        if let Some(parallel) = self.parallel {
            config.race.parallelism = parallel;
        }
    }
}

fn race_settings(config: &AppConfig) -> RaceSettings {
    RaceSettings {
        interval: config.race.interval(),
        slot_multiplier: config.race.slot_multiplier,
        parallelism: config.race.parallelism,
        stagger: config.race.stagger(),
        fatal_cooldown: config.race.fatal_cooldown(),
        max_run: config.race.max_run(),
        poll_interval: config.daemon.poll_interval(),
        template_refresh: config.daemon.template_refresh(),
        max_in_flight_submissions: config.race.max_in_flight_submissions,
        banner_repeats: config.notify.banner_repeats,
        notify_attempts: config.notify.attempts,
        notify_spacing: config.notify.spacing(),
    }
}

fn load_config(args: &Args) -> anyhow::Result<AppConfig> {
    let mut config = ConfigLoader::load(args.config.as_deref(), ENV_PREFIX)
        .context("failed to load configuration")?;
    args.apply(&mut config);
    validate_config(&config)?;
    Ok(config)
}

async fn run(args: Args, config: AppConfig) -> anyhow::Result<()> {
    let settings = race_settings(&config);

    let gate_at = config.race.start_gate_time().map_err(anyhow::Error::msg)?;
    let launch_at = if args.now {
        None
    } else {
        config.race.launch_time().map_err(anyhow::Error::msg)?
    };
    let schedule = LaunchSchedule::local(launch_at, gate_at);
    let start_gate = schedule.gate(tokio::time::Instant::now());
    schedule.wait_for_launch().await;

    let transport = HttpTransport::new(
        &normalize_cookie(&config.session.cookie),
        config.session.api_base_url.as_str(),
        config.session.user_base_url.as_str(),
    )?;
    let gateway = Arc::new(ExecutionGateway::new(
        Arc::new(transport),
        JitterBackoff::new(settings.interval),
        SubmissionThrottle::new(settings.max_in_flight_submissions),
    ));

    let options = SessionOptions {
        profile: ClientProfile {
            api_version: config.session.api_version.clone(),
            app_version: config.session.app_version.clone(),
            channel: config.session.channel.clone(),
            app_client_id: config.session.app_client_id.clone(),
        },
        pay_type: config.session.pay_type,
        cart_mode: config.session.cart_mode,
        address_index: config.session.address_index.unwrap_or(0),
    };
    let session = Session::prepare(gateway.clone(), options)
        .await
        .context("failed to prepare session")?;

    let notifier = BarkNotifier::new(
        config.notify.bark_url.as_str(),
        config.notify.bark_key.clone(),
    );
    let (control, signals) = RaceControl::new(start_gate);
    let supervisor = ProcessSupervisor::new(
        Arc::new(session),
        control,
        Arc::new(notifier),
        settings,
    );

    info!(
        parallelism = config.race.parallelism,
        multiplier = config.race.slot_multiplier,
        interval_ms = config.race.interval_ms,
        gate_open = start_gate.is_open(),
        "Starting slot race"
    );
    let win = supervisor.run(signals).await?;
    info!(
        window = %win.window,
        price = %win.price,
        calls = gateway.call_count(),
        backoffs = gateway.backoff_count(),
        peak_submissions = gateway.peak_submissions(),
        "Run finished with a won slot"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("slotrace: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(&config.log.level, config.log.json) {
        eprintln!("slotrace: {e}");
        return ExitCode::FAILURE;
    }

    let result = run(args, config).await;

    match MetricsCollector::new().render() {
        Ok(metrics) => debug!(%metrics, "Final metrics"),
        Err(e) => debug!(error = %e, "Failed to render metrics"),
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "slotrace exited without a slot");
            ExitCode::FAILURE
        }
    }
}

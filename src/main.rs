//! interview-notify - push notifications for IRC interview queues.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use interview_notify::analytics::AnalyticsBridge;
use interview_notify::config::{ConfigLoader, Mode, NotifierConfig};
use interview_notify::detect::EventDetector;
use interview_notify::display;
use interview_notify::monitor::{LinePipeline, Monitor};
use interview_notify::notification::{
    spawn_telemetry, Dispatcher, NotificationLog, NtfyTransport, RateLimiter,
};
use interview_notify::stats::{default_database_path, InterviewStore};
use interview_notify::watcher::LineHandler;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Red,
    Ops,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Red => Mode::Red,
            ModeArg::Ops => Mode::Ops,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "interview-notify",
    about = "Push notifications when it's your turn to interview",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (default: ./.interview-notify.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch IRC logs and send notifications.
    Run(RunArgs),
    /// Show interview statistics from the analytics database.
    Stats(StatsArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// ntfy topic name to POST notifications to.
    #[arg(long)]
    topic: Option<String>,
    /// ntfy server to POST notifications to.
    #[arg(long)]
    server: Option<String>,
    /// Path to IRC logs (repeat for multiple channels).
    #[arg(long = "log-dir")]
    log_dirs: Vec<PathBuf>,
    /// Your IRC nick.
    #[arg(long)]
    nick: Option<String>,
    /// Comma-separated bot nicks to watch.
    #[arg(long, value_delimiter = ',')]
    bot_nicks: Option<Vec<String>>,
    /// Only honour interview triggers said by a bot.
    #[arg(long, overrides_with = "no_check_bot_nicks")]
    check_bot_nicks: bool,
    /// Match interview triggers anywhere in the line.
    #[arg(long, overrides_with = "check_bot_nicks")]
    no_check_bot_nicks: bool,
    /// Interview mode.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// File to append every sent notification to.
    #[arg(long)]
    notification_log: Option<PathBuf>,
    /// Seconds between duplicate non-critical notifications.
    #[arg(long = "rate-limit")]
    rate_limit: Option<u64>,
    /// Record interview statistics.
    #[arg(long)]
    enable_analytics: bool,
    /// Analytics database path.
    #[arg(long)]
    analytics_db: Option<PathBuf>,
    /// Send an anonymous start-up ping.
    #[arg(long)]
    telemetry: bool,
}

impl RunArgs {
    fn apply(self, config: &mut NotifierConfig) {
        if let Some(topic) = self.topic {
            config.ntfy.topic = topic;
        }
        if let Some(server) = self.server {
            config.ntfy.server = server;
        }
        if !self.log_dirs.is_empty() {
            config.log_dirs = self.log_dirs;
        }
        if let Some(nick) = self.nick {
            config.nick = nick;
        }
        if let Some(bot_nicks) = self.bot_nicks {
            config.bot_nicks = bot_nicks;
        }
        if self.check_bot_nicks {
            config.check_bot_nicks = true;
        }
        if self.no_check_bot_nicks {
            config.check_bot_nicks = false;
        }
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if let Some(path) = self.notification_log {
            config.notification_log = Some(path);
        }
        if let Some(secs) = self.rate_limit {
            config.rate_limit_secs = secs;
        }
        if self.enable_analytics {
            config.analytics.enabled = true;
        }
        if let Some(path) = self.analytics_db {
            config.analytics.database = Some(path);
        }
        if self.telemetry {
            config.telemetry = true;
        }
    }
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Analytics database path.
    #[arg(long)]
    db: Option<PathBuf>,
    /// Statistics window in days.
    #[arg(long, default_value_t = 30)]
    days: u32,
    /// Only show one channel.
    #[arg(long)]
    channel: Option<String>,
    /// Number of recent interviews to list.
    #[arg(long, default_value_t = 15)]
    limit: usize,
    /// Show one user's history instead.
    #[arg(long)]
    user: Option<String>,
    /// Show queue length trends for the last HOURS.
    #[arg(long, value_name = "HOURS")]
    trends: Option<u32>,
    /// Delete records older than DAYS.
    #[arg(long, value_name = "DAYS")]
    purge: Option<u32>,
    /// Print JSON instead of a report.
    #[arg(long)]
    json: bool,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<NotifierConfig, String> {
    let loader = path.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    loader.load().map_err(|e| e.to_string())
}

async fn run(mut config: NotifierConfig, args: RunArgs) -> Result<(), String> {
    args.apply(&mut config);
    config.validate().map_err(|e| e.to_string())?;

    let detector = EventDetector::new(config.detector_config()).map_err(|e| e.to_string())?;
    let transport = NtfyTransport::new().map_err(|e| e.to_string())?;
    let mut dispatcher = Dispatcher::new(
        Arc::new(transport),
        config.destination(),
        RateLimiter::new(config.rate_limit()),
    );
    if let Some(path) = &config.notification_log {
        tracing::info!(path = %path.display(), "Logging notifications");
        dispatcher = dispatcher.with_log(NotificationLog::new(path.clone()));
    }
    let dispatcher = Arc::new(dispatcher);

    let mut pipeline = LinePipeline::new(detector, Arc::clone(&dispatcher));
    if config.analytics.enabled {
        let path = config
            .analytics
            .database
            .clone()
            .unwrap_or_else(default_database_path);
        let store = InterviewStore::open(&path).await.map_err(|e| e.to_string())?;
        tracing::info!(path = %path.display(), "Analytics enabled");
        pipeline = pipeline.with_analytics(AnalyticsBridge::new(Arc::new(store)));
    } else {
        tracing::debug!("Analytics disabled");
    }

    let handler: Arc<dyn LineHandler> = Arc::new(pipeline);
    let monitor = Monitor::new(config.log_dirs.clone(), handler)
        .with_intervals(config.scan_interval(), config.tail_interval());
    monitor.validate().map_err(|e| e.to_string())?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutting down"),
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
        }
        signal_token.cancel();
    });

    tracing::info!(
        nick = %config.nick,
        topic = %config.ntfy.topic,
        mode = %config.mode,
        "Starting interview notifier"
    );
    if config.telemetry {
        spawn_telemetry(
            Arc::clone(&dispatcher),
            config.nick.clone(),
            config.mode.as_str().to_string(),
        );
    }
    monitor.run(shutdown).await.map_err(|e| e.to_string())?;
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| e.to_string())
}

async fn stats(config: &NotifierConfig, args: StatsArgs) -> Result<(), String> {
    let path = args
        .db
        .or_else(|| config.analytics.database.clone())
        .unwrap_or_else(default_database_path);
    let store = InterviewStore::open(&path).await.map_err(|e| e.to_string())?;
    let channel = args.channel.as_deref();

    if let Some(days) = args.purge {
        let deleted = store.clear_old_data(days).await.map_err(|e| e.to_string())?;
        if args.json {
            println!("{}", to_json(&serde_json::json!({ "deleted": deleted }))?);
        } else {
            display::print_purged(days, deleted);
        }
        return Ok(());
    }

    if let Some(user) = &args.user {
        let records = store
            .user_history(user, args.limit)
            .await
            .map_err(|e| e.to_string())?;
        if args.json {
            println!("{}", to_json(&records)?);
        } else {
            display::print_user_history(user, &records);
        }
        return Ok(());
    }

    if let Some(hours) = args.trends {
        let samples = store
            .queue_trends(hours, channel)
            .await
            .map_err(|e| e.to_string())?;
        if args.json {
            println!("{}", to_json(&samples)?);
        } else {
            display::print_trends(hours, &samples);
        }
        return Ok(());
    }

    let statistics = store
        .statistics(args.days, channel)
        .await
        .map_err(|e| e.to_string())?;
    let recent = store
        .recent_interviews(args.limit, channel)
        .await
        .map_err(|e| e.to_string())?;
    if args.json {
        println!(
            "{}",
            to_json(&serde_json::json!({ "statistics": statistics, "recent": recent }))?
        );
    } else {
        display::print_report(args.days, channel, &statistics, &recent);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match load_config(cli.config) {
        Ok(config) => match cli.command {
            Commands::Run(args) => run(config, args).await,
            Commands::Stats(args) => stats(&config, args).await,
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            tracing::error!(error = %message, "Fatal error");
            display::print_error(&message);
            ExitCode::FAILURE
        }
    }
}

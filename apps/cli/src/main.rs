use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use smartskip_core::{
    CATEGORIES, CategoryView, Command, ConfigStore, FetchError, Intent, PageContext, Playhead,
    ProviderConfig, SegmentFetcher, Session, SkipKind, StoredConfig, VideoId, format_segment_list,
    format_timestamp, skippable_seconds, types::category_info, video_id_from_url,
};
use tracing::{debug, info, warn};

use crate::player::SimulatedPlayer;

mod logging;
mod player;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

#[derive(Parser)]
#[command(name = "smartskip")]
#[command(
    about = "Look up SponsorBlock segments, manage skip settings, and simulate auto-skip playback"
)]
struct Cli {
    /// Segment provider endpoint. Defaults to SponsorBlock or $SMARTSKIP_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Settings file. Defaults to the platform config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// List the segments of a video
    Segments {
        /// Video URL or id
        video: String,

        /// Only ask for these categories (repeatable). Defaults to the visible ones.
        #[arg(short, long = "category")]
        categories: Vec<String>,

        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Play a video in simulation and print what the watcher does
    Simulate {
        /// Video URL or id
        video: String,

        /// Force auto-skip on for this run
        #[arg(long)]
        auto_skip: bool,

        /// Simulated video length in seconds
        #[arg(long, default_value_t = 600.0)]
        duration: f64,

        /// Seconds of video per position sample
        #[arg(long, default_value_t = 0.5)]
        step: f64,

        /// Wall-clock milliseconds between samples
        #[arg(long, default_value_t = 5)]
        tick_ms: u64,

        /// Press a button at a video time, e.g. `95:skip`, `10:next`, `300:prev`
        #[arg(long = "action", value_parser = parse_action)]
        actions: Vec<ScheduledAction>,
    },

    /// Show or change saved settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print current settings
    Show,
    /// Print where settings are stored
    Path,
    /// Turn auto-skip on or off
    AutoSkip { state: Toggle },
    /// Show segments of a category
    Enable { category: String },
    /// Hide segments of a category
    Disable { category: String },
    /// Set the overlay color of a category
    Color { category: String, hex: String },
    /// Forget all settings
    Reset,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SegmentAction {
    Skip,
    Next,
    Prev,
}

#[derive(Clone, Debug)]
struct ScheduledAction {
    at: f64,
    action: SegmentAction,
}

impl ScheduledAction {
    fn command(&self) -> Command {
        match self.action {
            SegmentAction::Skip => Command::SkipCurrent,
            SegmentAction::Next => Command::JumpToNext,
            SegmentAction::Prev => Command::JumpToPrevious,
        }
    }
}

fn parse_action(s: &str) -> Result<ScheduledAction, String> {
    let (at, action) = s
        .split_once(':')
        .ok_or_else(|| format!("expected <seconds>:<skip|next|prev>, got {s}"))?;
    let at: f64 = at
        .trim()
        .parse()
        .map_err(|_| format!("invalid time {at:?}"))?;
    let action = SegmentAction::from_str(action.trim(), true)?;
    Ok(ScheduledAction { at, action })
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Accept a watch/shorts URL or a bare video id.
fn resolve_target(input: &str) -> Result<VideoId> {
    if let Some(id) = video_id_from_url(input) {
        return Ok(id);
    }
    if input.contains("://") {
        bail!("no video id found in {input}");
    }
    VideoId::new(input).context("video id is empty")
}

fn check_category(category: &str) -> Result<()> {
    if category_info(category).is_none() {
        let known: Vec<_> = CATEGORIES.iter().map(|c| c.name).collect();
        bail!("unknown category {category:?}, expected one of: {}", known.join(", "));
    }
    Ok(())
}

fn check_color(hex: &str) -> Result<()> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    let valid = matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        bail!("invalid color {hex:?}, expected #rgb or #rrggbb");
    }
    Ok(())
}

fn print_header(subtitle: &str) {
    println!(
        "\n{}  {}\n",
        style("smartskip").cyan().bold(),
        style(subtitle).dim()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let store = match cli.config {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::default_location()?,
    };

    let provider = match cli.api_url {
        Some(url) => ProviderConfig::from_env().with_api_url(url),
        None => ProviderConfig::from_env(),
    };

    match cli.command {
        CliCommand::Segments {
            video,
            categories,
            json,
        } => {
            let fetcher = SegmentFetcher::http(provider.clone())?;
            run_segments(&fetcher, &store, &provider, &video, categories, json).await
        }
        CliCommand::Simulate {
            video,
            auto_skip,
            duration,
            step,
            tick_ms,
            actions,
        } => {
            if !(duration > 0.0) || !(step > 0.0) {
                bail!("--duration and --step must be positive");
            }
            let fetcher = SegmentFetcher::http(provider)?;
            let run = SimulateRun {
                auto_skip,
                duration,
                step,
                tick: Duration::from_millis(tick_ms.max(1)),
                actions,
            };
            run_simulate(fetcher, &store, &video, run).await
        }
        CliCommand::Config { action } => run_config(&store, action.unwrap_or(ConfigAction::Show)),
    }
}

async fn run_segments(
    fetcher: &SegmentFetcher,
    store: &ConfigStore,
    provider: &ProviderConfig,
    video: &str,
    categories: Vec<String>,
    json: bool,
) -> Result<()> {
    let video = resolve_target(video)?;
    let categories = if categories.is_empty() {
        CategoryView::derive(&store.load())
            .visible_categories()
            .to_vec()
    } else {
        for category in &categories {
            check_category(category)?;
        }
        categories
    };

    debug!(%video, ?categories, api_url = %provider.api_url, "segments lookup");

    let started = Instant::now();
    let spinner = create_spinner(&format!(
        "Looking up {} on {}...",
        video,
        provider.name()
    ));

    let segments = match fetcher.try_fetch(&video, &categories).await {
        Ok(segments) => segments,
        // SponsorBlock answers 404 when nobody submitted anything.
        Err(FetchError::Status(404)) => Default::default(),
        Err(err) => {
            spinner.finish_and_clear();
            return Err(err).with_context(|| format!("lookup failed for {video}"));
        }
    };
    spinner.finish_and_clear();
    info!(%video, count = segments.len(), elapsed = ?started.elapsed(), "segments resolved");

    if json {
        println!("{}", serde_json::to_string_pretty(&*segments)?);
        return Ok(());
    }

    print_header("Segments");
    if segments.is_empty() {
        println!("{} No segments for {}", style("·").dim(), style(&video).yellow());
        return Ok(());
    }

    println!("{}", format_segment_list(&segments));
    println!(
        "\n{} {} segments, {} skippable {}",
        style("✓").green().bold(),
        segments.len(),
        style(format_timestamp(skippable_seconds(&segments))).cyan(),
        style(format!("[{}]", format_duration(started.elapsed()))).dim()
    );
    Ok(())
}

struct SimulateRun {
    auto_skip: bool,
    duration: f64,
    step: f64,
    tick: Duration,
    actions: Vec<ScheduledAction>,
}

fn print_intent(position: f64, intent: &Intent) {
    let marker = match intent {
        Intent::SkipPerformed {
            kind: SkipKind::Auto,
        } => style("»").green().bold(),
        Intent::SkipPerformed { .. } | Intent::JumpPerformed { .. } => style("»").cyan().bold(),
        Intent::SegmentEntered { .. } => style("▶").yellow().bold(),
        Intent::SegmentExited => style("■").dim(),
        _ => style("·").dim(),
    };
    println!(
        "{} {} {}",
        style(format!("[{}]", format_timestamp(position))).dim(),
        marker,
        intent.message()
    );
}

async fn run_simulate(
    fetcher: SegmentFetcher,
    store: &ConfigStore,
    video: &str,
    mut run: SimulateRun,
) -> Result<()> {
    let video = resolve_target(video)?;
    let mut config = store.load();
    if run.auto_skip {
        config.auto_skip_enabled = true;
    }

    let player = SimulatedPlayer::new(run.duration);
    let (session, mut intents) = Session::new(fetcher, player.clone(), &config);
    info!(session = %session.id(), %video, auto_skip = config.auto_skip_enabled, "simulation starting");
    let handle = session.spawn();

    print_header("Playback simulation");
    let spinner = create_spinner(&format!("Looking up segments for {}...", video));
    handle
        .navigate(PageContext::from_location(format!(
            "https://www.youtube.com/watch?v={video}"
        )))
        .await?;

    let count = loop {
        match intents.recv().await {
            Some(Intent::SegmentsLoaded { count }) => break count,
            Some(_) => continue,
            None => bail!("session stopped before segments loaded"),
        }
    };
    spinner.finish_with_message(format!(
        "{} {} segments, auto-skip {}",
        style("✓").green().bold(),
        count,
        if config.auto_skip_enabled { "on" } else { "off" }
    ));

    let snapshot = handle.inspect().await?;
    for (segment, marker) in snapshot.segments.iter().zip(&snapshot.markers) {
        println!(
            "  {} {:<12} {}–{}  {:>5.1}% +{:.1}%",
            style("█").color256(ansi256(marker.color)),
            segment.category,
            format_timestamp(segment.start),
            format_timestamp(segment.end),
            marker.left_pct,
            marker.width_pct
        );
    }
    println!("{}", style("─".repeat(60)).dim());

    run.actions.sort_by(|a, b| a.at.total_cmp(&b.at));
    for action in run.actions.iter().filter(|a| a.at > run.duration) {
        warn!(at = action.at, duration = run.duration, action = ?action.action, "action scheduled after the end, it will not fire");
    }
    let mut pending = run.actions.into_iter().peekable();

    let started = Instant::now();
    let clock = tokio::spawn(player.clone().play(run.step, run.tick));
    let mut poll = tokio::time::interval(run.tick);

    loop {
        tokio::select! {
            intent = intents.recv() => match intent {
                Some(intent) => print_intent(player.position(), &intent),
                None => break,
            },
            _ = poll.tick() => {
                if let Some(next) = pending.peek() {
                    if player.position() >= next.at {
                        println!(
                            "{} {} pressed {:?}",
                            style(format!("[{}]", format_timestamp(player.position()))).dim(),
                            style("⌨").magenta(),
                            next.action
                        );
                        handle.send(next.command()).await?;
                        pending.next();
                    }
                }
                if player.finished() {
                    break;
                }
            }
        }
    }

    let _ = clock.await;
    while let Ok(intent) = intents.try_recv() {
        print_intent(player.position(), &intent);
    }
    handle.shutdown().await;

    println!(
        "\n{} {} {}\n",
        style("Played").dim(),
        style(format_timestamp(run.duration)).cyan().bold(),
        style(format!("[{}]", format_duration(started.elapsed()))).dim()
    );
    Ok(())
}

// Nearest xterm-256 color cube entry.
fn ansi256(rgb: smartskip_core::Rgb) -> u8 {
    let level = |c: u8| ((c as u16 * 5 + 127) / 255) as u8;
    16 + 36 * level(rgb.r) + 6 * level(rgb.g) + level(rgb.b)
}

fn run_config(store: &ConfigStore, action: ConfigAction) -> Result<()> {
    let mut config = store.load();

    match action {
        ConfigAction::Show => {
            print_config(&config);
            return Ok(());
        }
        ConfigAction::Path => {
            println!("{}", store.path().display());
            return Ok(());
        }
        ConfigAction::AutoSkip { state } => {
            config.auto_skip_enabled = matches!(state, Toggle::On);
        }
        ConfigAction::Enable { category } => {
            check_category(&category)?;
            config.set_visible(&category, true);
        }
        ConfigAction::Disable { category } => {
            check_category(&category)?;
            config.set_visible(&category, false);
        }
        ConfigAction::Color { category, hex } => {
            check_category(&category)?;
            check_color(&hex)?;
            let hex = if hex.starts_with('#') {
                hex.to_lowercase()
            } else {
                format!("#{}", hex.to_lowercase())
            };
            config.set_color(&category, hex);
        }
        ConfigAction::Reset => {
            config = StoredConfig::default();
        }
    }

    store.save(&config)?;
    debug!(path = %store.path().display(), "settings saved");
    println!(
        "{} Saved {}",
        style("✓").green().bold(),
        style(store.path().display()).dim()
    );
    print_config(&config);
    Ok(())
}

fn print_config(config: &StoredConfig) {
    let view = CategoryView::derive(config);
    print_header("Settings");
    println!(
        "Auto skip: {}\n",
        if config.auto_skip_enabled {
            style("on").green().bold()
        } else {
            style("off").dim()
        }
    );
    for info in CATEGORIES.iter() {
        let color = view.color_for(info.name);
        let rgb = smartskip_core::Rgb::from_hex(color);
        let visibility = if view.is_visible(info.name) {
            style("visible").green()
        } else {
            style("hidden").dim()
        };
        println!(
            "  {} {:<40} {:<8} {}",
            style("█").color256(ansi256(rgb)),
            info.label,
            color,
            visibility
        );
    }
}

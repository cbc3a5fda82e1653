//! Headless consumer: connects to the pose stream, reconciles frames into a
//! scene at a fixed tick rate and logs what it sees. Useful to check a
//! producer without opening a window.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use pose_receiver::config::Config;
use pose_receiver::render::{SceneState, SkeletonPreset};
use pose_receiver::stream::StreamClient;
use pose_receiver::tracker::{KeypointProbe, SkeletonPool};

#[derive(Debug, Parser)]
#[command(name = "stream_probe", about = "Logs reconciled pose frames without rendering")]
struct Args {
    #[arg(long, env = "POSE_CONFIG", default_value = "config.toml")]
    config: String,
    #[arg(long, env = "POSE_HOST")]
    host: Option<String>,
    #[arg(long, env = "POSE_PORT")]
    port: Option<u16>,
    #[arg(long)]
    preset: Option<SkeletonPreset>,
    /// 1秒あたりの tick 数
    #[arg(long, default_value_t = 30)]
    tick_rate: u32,
    /// 指定秒数で終了 (省略時は接続が切れるまで)
    #[arg(long)]
    duration: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load_optional(&args.config)?;
    if let Some(host) = args.host {
        config.connection.host = host;
    }
    if let Some(port) = args.port {
        config.connection.port = port;
    }
    if let Some(preset) = args.preset {
        config.skeleton.preset = preset;
    }
    let env = env_logger::Env::default().default_filter_or(&config.debug.log_level);
    env_logger::Builder::from_env(env).init();
    config.validate()?;

    let mut pool = SkeletonPool::from_config(&config);
    let probe = KeypointProbe::new(config.debug.probe_interval, *pool.transform());
    let mut scene = SceneState::new();

    let mut client = StreamClient::connect(&config.connection)
        .with_context(|| format!("failed to reach pose producer at {}", config.connection.addr()))?;

    let tick = Duration::from_secs_f64(1.0 / args.tick_rate.max(1) as f64);
    let deadline = args.duration.map(|s| Instant::now() + Duration::from_secs(s));
    let mut reconciled = 0u64;

    loop {
        let tick_start = Instant::now();

        if let Some(frame) = client.take() {
            probe.observe(&frame);
            let summary = pool.reconcile(&frame, &mut scene);
            reconciled += 1;
            log::info!(
                "frame {} t={:.3}s: {} persons, pool {}, {} segments, {} markers visible",
                summary.frame_index,
                frame.timestamp,
                summary.active_slots,
                summary.pool_size,
                summary.visible_segments,
                summary.visible_markers
            );
        } else if !client.is_running() {
            log::warn!("stream ended: {:?}", client.status());
            break;
        }

        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }

        let spent = tick_start.elapsed();
        if spent < tick {
            std::thread::sleep(tick - spent);
        }
    }

    let stats = client.mailbox_stats();
    log::info!(
        "reconciled {} frames, {} received, {} skipped by mailbox",
        reconciled,
        stats.stored,
        stats.overwritten
    );
    client.close();
    Ok(())
}

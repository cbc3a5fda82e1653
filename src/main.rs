use anyhow::{Context, Result};
use clap::Parser;
use std::time::{Duration, Instant};

use pose_receiver::config::Config;
use pose_receiver::render::{MinifbRenderer, SceneState, SkeletonPreset};
use pose_receiver::stream::StreamClient;
use pose_receiver::tracker::{KeypointProbe, SkeletonPool};

#[derive(Debug, Parser)]
#[command(name = "pose_viewer", about = "Draws skeletons received from a pose stream")]
struct Args {
    /// 設定ファイル
    #[arg(long, env = "POSE_CONFIG", default_value = "config.toml")]
    config: String,
    #[arg(long, env = "POSE_HOST")]
    host: Option<String>,
    #[arg(long, env = "POSE_PORT")]
    port: Option<u16>,
    /// barebones | mid | full
    #[arg(long)]
    preset: Option<SkeletonPreset>,
    #[arg(long, default_value_t = 960)]
    width: usize,
    #[arg(long, default_value_t = 540)]
    height: usize,
    #[arg(long, default_value_t = 60)]
    fps: u32,
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

    log::info!("Pose Viewer {}", env!("CARGO_PKG_VERSION"));
    log::info!("Server: {}", config.connection.addr());
    log::info!(
        "Skeleton: {} (face bones: {}), markers: {:?}",
        config.skeleton.preset.name(),
        config.skeleton.full_face_bones,
        config.skeleton.markers
    );

    let mut pool = SkeletonPool::from_config(&config);
    let probe = KeypointProbe::new(config.debug.probe_interval, *pool.transform());
    let mut scene = SceneState::new();

    let mut client = StreamClient::connect(&config.connection)
        .with_context(|| format!("is the pose producer listening on {}?", config.connection.addr()))?;
    let mut renderer = MinifbRenderer::new("Pose Viewer", args.width, args.height)?;

    let frame_duration = Duration::from_secs_f64(1.0 / args.fps.max(1) as f64);
    let mut frame_count = 0u32;
    let mut fps_timer = Instant::now();
    let mut last_status = client.status();

    while renderer.is_open() {
        let tick_start = Instant::now();

        if let Some(frame) = client.take() {
            probe.observe(&frame);
            let summary = pool.reconcile(&frame, &mut scene);
            log::trace!("{:?}", summary);
            frame_count += 1;
        }

        let status = client.status();
        if status != last_status {
            // 受信が止まっても最後の姿勢を表示し続ける
            log::warn!("stream status: {:?}", status);
            renderer.set_title(&format!("Pose Viewer - {:?}", status));
            last_status = status;
        }

        renderer.clear();
        renderer.draw_scene(&scene, pool.transform());
        renderer.update()?;

        let elapsed = fps_timer.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            let stats = client.mailbox_stats();
            log::info!(
                "frames/s: {:.1}, persons: {}, pool: {}, skipped: {}",
                frame_count as f32 / elapsed,
                scene.active_count(),
                pool.len(),
                stats.overwritten
            );
            frame_count = 0;
            fps_timer = Instant::now();
        }

        let spent = tick_start.elapsed();
        if spent < frame_duration {
            std::thread::sleep(frame_duration - spent);
        }
    }

    log::info!("Shutting down...");
    client.close();
    Ok(())
}

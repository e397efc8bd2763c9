use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use mapworld::{
    Animation, Camera2D, CanvasRect, Character, FrameTiming, MapId, PointerEvent,
    RecordingCanvas, SilentMusicPlayer, Viewport, World, XmlAssetStore,
};
use tracing::{error, info, warn};

use super::bootstrap::{AppWiring, ViewerConfig};
use super::metrics::MetricsAccumulator;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "runtime_start_failed");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_viewer(&app.config, app.map_id, app.asset_root)) {
        Ok(report) => {
            info!(
                ticks = report.ticks,
                frames = report.frames,
                updated_ticks = report.updated_ticks,
                last_frame_images = report.last_frame_images,
                last_frame_lines = report.last_frame_lines,
                demo_click_hits = report.demo_click_hits,
                "shutdown"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "viewer_failed");
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RunReport {
    pub(crate) ticks: u32,
    /// Ticks that ran with the world's gate open.
    pub(crate) updated_ticks: u32,
    pub(crate) frames: u32,
    pub(crate) last_frame_images: usize,
    pub(crate) last_frame_lines: usize,
    pub(crate) demo_click_hits: usize,
}

pub(crate) async fn run_viewer(
    config: &ViewerConfig,
    map_id: MapId,
    asset_root: std::path::PathBuf,
) -> Result<RunReport, String> {
    let assets = Arc::new(XmlAssetStore::new(asset_root));
    let mut world = World::new(assets, Arc::new(SilentMusicPlayer), config.world.clone());
    let mut camera = Camera2D::new(Viewport {
        width: config.viewport_width,
        height: config.viewport_height,
    });

    world
        .load(map_id, &mut camera)
        .await
        .map_err(|err| format!("load map {map_id}: {err}"))?;
    let spawn = world.boundaries().center();
    world.set_player(Some(Character::new("viewer", spawn, Animation::empty())));
    camera.look_at(spawn.x, spawn.y);
    info!(
        map_id = %map_id,
        map_name = %world.names().map_name,
        street_name = %world.names().street_name,
        npcs = world.npcs().len(),
        monsters = world.monsters().len(),
        spawn_x = spawn.x,
        spawn_y = spawn.y,
        "map_loaded"
    );

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta(), Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_interval =
        normalize_non_zero_duration(config.metrics_interval(), Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let tick_ms = fixed_dt.as_secs_f32() * 1000.0;
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_interval_ms = metrics_interval.as_millis() as u64,
        ticks = config.ticks,
        "loop_config"
    );

    let mut report = RunReport::default();
    let mut canvas = RecordingCanvas::new();
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut metrics = MetricsAccumulator::new(metrics_interval);
    let mut clicked = false;
    let mut pacing = tokio::time::interval(fixed_dt);

    while report.ticks < config.ticks {
        pacing.tick().await;
        let now = Instant::now();
        let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
        last_frame_instant = now;

        accumulator = accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));
        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
        let ticks_left = config.ticks - report.ticks;
        for _ in 0..step_plan.ticks_to_run.min(ticks_left) {
            if world.done_loading() {
                report.updated_ticks += 1;
            }
            world.update(tick_ms);
            metrics.record_tick();
            report.ticks += 1;
        }
        accumulator = step_plan.remaining_accumulator;

        if step_plan.dropped_backlog > Duration::ZERO {
            warn!(
                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame, "sim_clamp_triggered"
            );
        }

        if !clicked && world.done_loading() {
            clicked = true;
            report.demo_click_hits = click_first_npc(&mut world, &camera);
        }

        canvas.clear();
        let timing = FrameTiming {
            lag: accumulator.as_secs_f32() * 1000.0,
            tick_ms,
            tdelta: accumulator.as_secs_f32() / fixed_dt.as_secs_f32(),
        };
        world.render(&mut canvas, &camera, &timing);
        report.frames += 1;
        report.last_frame_images = canvas.image_count();
        report.last_frame_lines = canvas.line_count();
        metrics.record_frame(raw_frame_dt, canvas.image_count(), canvas.line_count());

        if let Some(snapshot) = metrics.maybe_snapshot(now) {
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                frame_time_ms = snapshot.frame_time_ms,
                images_per_frame = snapshot.images_per_frame,
                lines_per_frame = snapshot.lines_per_frame,
                done_loading = world.done_loading(),
                monsters = world.monsters().len(),
                "loop_metrics"
            );
        }
    }

    Ok(report)
}

/// Clicks where the first NPC stands, the way a player would to open its
/// dialog. Returns the number of hitboxes hit.
fn click_first_npc(world: &mut World, camera: &Camera2D) -> usize {
    let Some(target) = world
        .npcs()
        .iter()
        .find(|npc| npc.is_clickable())
        .map(|npc| npc.position())
    else {
        return 0;
    };
    let event = PointerEvent {
        client_x: target.x - camera.x(),
        client_y: target.y - camera.y() - 10.0,
    };
    let Some(outcome) = world.handle_click(event, CanvasRect::default(), camera) else {
        return 0;
    };
    info!(
        npc = ?outcome.npc,
        dialog = ?outcome.dialog,
        hits = outcome.hits,
        "demo_click"
    );
    outcome.hits
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

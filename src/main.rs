//! Headless CLI for exercising the stitch trail pipeline
//!
//! Drives the renderer with a synthetic pointer path at 60 Hz simulated time
//! and reports what the backend was asked to do.
//!
//! Run with: cargo run --features cli --bin stitch-cli [config.json]

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use stitch_trail::time::now_ms;
    use stitch_trail::core::{
        pointer_channel, FrameInput, FrameStatus, HeadlessBackend, Jitter, TrailConfig, TrailRenderer,
    };
    use glam::Vec2;
    use tracing::{info, warn};
    use tracing_subscriber::{fmt, EnvFilter};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const VIEWPORT: (u32, u32) = (1920, 1080);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stitch_trail=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("STITCH_CONFIG").ok());
    let config = match &config_path {
        Some(path) => {
            info!(path = %path, "Loading config");
            TrailConfig::from_json(&std::fs::read_to_string(path)?)?
        }
        None => TrailConfig::default(),
    };

    let duration_ms: f64 = std::env::var("STITCH_DURATION_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(20_000.0);

    let (writer, reader) = pointer_channel(config.idle_timeout_ms);
    let mut renderer =
        TrailRenderer::initialize(config, HeadlessBackend::new(), VIEWPORT.0, VIEWPORT.1)?
            .with_jitter(Jitter::with_seed(0x5717_C4));
    renderer.start();

    info!(duration_ms, "Simulating pointer path");
    let wall_start = now_ms();

    let mut now = 0.0;
    let mut next_report = 1_000.0;
    let mut peak_points = 0;
    let mut peak_lines = 0;
    while now < duration_ms {
        // Move for 3 s, rest for 1 s
        if now % 4_000.0 < 3_000.0 {
            let t = (now / 1000.0) as f32;
            let position = Vec2::new((t * 1.7).sin() * 0.8, (t * 2.3).cos() * 0.6);
            writer.record_ndc(position, now);
        }

        let input = FrameInput {
            now_ms: now,
            pointer: reader.sample(now),
            scroll_offset: 0.0,
        };
        match renderer.frame(input) {
            FrameStatus::Drawn => {}
            FrameStatus::Skipped => warn!(now, "Frame skipped"),
            FrameStatus::Stopped => {
                warn!(now, "Renderer stopped");
                break;
            }
        }

        let stats = renderer.stats();
        peak_points = peak_points.max(stats.points);
        peak_lines = peak_lines.max(stats.lines);

        if now >= next_report {
            info!(
                t = format!("{:.1}s", now / 1000.0),
                fps = format!("{:.0}", stats.fps),
                points = stats.points,
                lines = stats.lines,
                markers = stats.markers,
                line_vertices = stats.line_vertices,
                "tick"
            );
            next_report += 1_000.0;
        }
        now += FRAME_MS;
    }

    let draws = renderer.backend().draw_calls();
    let created = renderer.backend().markers_created();
    renderer.dispose();
    let released = renderer.backend().markers_released();

    let wall_ms = format!("{:.1}", now_ms() - wall_start);
    info!(draws, created, released, peak_points, peak_lines, wall_ms = %wall_ms, "Simulation finished");
    if created != released {
        return Err(format!("leaked {} marker resources", created - released).into());
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}

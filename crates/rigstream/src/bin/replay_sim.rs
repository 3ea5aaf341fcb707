//! # RIGSTREAM Replay Simulator
//!
//! Replays a synthetic capture through the full pipeline on a producer
//! thread and plays it back at 60 host ticks per second.
//!
//! ```bash
//! # Defaults: 4 players, a referee and a ball over 300 frames
//! RUST_LOG=info ./replay_sim
//!
//! # Custom config and roster
//! RUST_LOG=rigstream_ingest=debug ./replay_sim rigstream.toml manifest.toml
//! ```

use std::time::{Duration, Instant};

use rigstream::ingest::{ReplayMode, SimulatedSource, SimulationScript};
use rigstream::playback::{PoseBuffer, HUMANOID_JOINTS};
use rigstream::shared::{RigDescriptor, SessionHeader, StreamManifest};
use rigstream::{load_manifest, RigstreamConfig, RigstreamResult, StreamPlayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HOST_TICK: Duration = Duration::from_micros(16_666);
/// Host ticks to keep playing after the stream completes.
const TAIL_TICKS: u32 = 120;
/// Gives up if the stream never completes.
const MAX_RUNTIME: Duration = Duration::from_secs(60);

fn default_manifest() -> StreamManifest {
    let mut rigs: Vec<_> = (1..=5).map(|i| RigDescriptor::new(format!("player{i}"), "player")).collect();
    rigs.push(RigDescriptor::new("ball", "solidObject"));
    StreamManifest {
        header: Some(SessionHeader::new(0, 299)),
        rigs,
    }
}

fn main() -> RigstreamResult<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => RigstreamConfig::load(path)?,
        None => RigstreamConfig::default(),
    };
    let manifest = match args.next() {
        Some(path) => load_manifest(path)?,
        None => default_manifest(),
    };

    let script = SimulationScript::from_manifest(&manifest, HUMANOID_JOINTS)
        .with_delay(Duration::from_micros(200))
        .with_info("frameRate", "30");
    tracing::info!(events = script.len(), rigs = manifest.rigs.len(), "replaying simulated capture");

    let started = Instant::now();
    let mut player = StreamPlayer::new(&config, manifest, started)?;
    player.start(Box::new(SimulatedSource::new(script, ReplayMode::Threaded)), "simulated", started)?;
    tracing::info!(frame_rate = ?player.stream_info("frameRate")?, "source metadata");

    let mut sink = PoseBuffer::new();
    let mut last = Instant::now();
    let mut tail = 0;
    while tail < TAIL_TICKS && started.elapsed() < MAX_RUNTIME {
        std::thread::sleep(HOST_TICK);
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32().min(0.1);
        last = now;

        player.update_at(now, dt, &mut sink);
        if player.is_finished() {
            tail += 1;
        }
        if player.updates() % 60 == 0 {
            tracing::info!(
                frame = player.director().absolute_frame(),
                visible = sink.visible_count(),
                placed = player.stats().frames_placed,
                "playback"
            );
        }
    }

    if !player.is_finished() {
        tracing::warn!(elapsed = ?started.elapsed(), "stream did not complete, cancelling");
        player.cancel();
    }

    let stats = player.stats();
    tracing::info!(
        ticks = stats.ticks,
        frames = stats.frames_placed,
        requeued = stats.ordering_anomalies,
        errors = stats.errors_reported,
        poses = sink.writes(),
        "done"
    );
    Ok(())
}

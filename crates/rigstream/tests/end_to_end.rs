//! End-to-end: simulated native source → player → poses.

use std::time::{Duration, Instant};

use rigstream::ingest::{CharacterRole, ReplayMode, SessionState, SimulatedSource, SimulationScript, StreamError};
use rigstream::playback::{PoseBuffer, TimeSourceConfig};
use rigstream::shared::{ReturnCode, RigDescriptor, SessionHeader, StreamManifest};
use rigstream::{RigstreamConfig, RigstreamError, StreamPlayer};

fn quick_config() -> RigstreamConfig {
    let mut config = RigstreamConfig::default();
    config.playback.ticker_initial_delay_secs = 0.0;
    config
}

fn blocking(script: SimulationScript) -> Box<SimulatedSource> {
    Box::new(SimulatedSource::new(script, ReplayMode::Blocking))
}

#[test]
fn test_completion_keeps_playback_running() {
    let config = quick_config();
    let interval = config.playback.ticker_interval_secs;
    let t0 = Instant::now();
    let mut player = StreamPlayer::new(&config, StreamManifest::default(), t0).unwrap();
    player
        .start(blocking(SimulationScript::new().character("p1", 0, 9, 4)), "sim", t0)
        .unwrap();

    let mut sink = PoseBuffer::new();
    let first = player.update_at(t0, 0.0, &mut sink);
    assert_eq!(first.drain.frames, 10);
    assert!(!first.drain.finished, "grace period has not elapsed");

    let second = player.update_at(t0 + Duration::from_secs(1), 0.0, &mut sink);
    assert!(second.drain.finished);
    assert!(player.is_finished());
    assert_eq!(player.state(), SessionState::Finished);

    let third = player.update_at(t0 + Duration::from_secs(2), interval * 1.001, &mut sink);
    assert_eq!(third.steps, 1);
    let pose = sink.get("p1").unwrap();
    assert!(pose.visible);
    assert_eq!(pose.timestamp, Some(0));
    assert!(player.session().assembler().all_complete());
}

#[test]
fn test_stream_info_only_while_streaming() {
    let t0 = Instant::now();
    let mut player = StreamPlayer::new(&quick_config(), StreamManifest::default(), t0).unwrap();
    assert!(matches!(
        player.stream_info("frameRate"),
        Err(RigstreamError::Stream(StreamError::NotStarted))
    ));

    let script = SimulationScript::new().character("p1", 0, 1, 0).with_info("frameRate", "30");
    player.start(blocking(script), "sim", t0).unwrap();
    assert_eq!(player.stream_info("frameRate").unwrap().as_deref(), Some("30"));

    player.cancel();
    assert!(player.stream_info("frameRate").is_err());
}

#[test]
fn test_threaded_stream_completes_and_plays() {
    let mut config = quick_config();
    config.ingest.completion_grace_secs = 0.2;
    let manifest = StreamManifest {
        header: Some(SessionHeader::new(0, 19)),
        rigs: vec![RigDescriptor::new("p1", "player"), RigDescriptor::new("ball", "solidObject")],
    };
    let script = SimulationScript::from_manifest(&manifest, 4);
    let expected = script.len() - manifest.rigs.len();

    let mut player = StreamPlayer::new(&config, manifest, Instant::now()).unwrap();
    player
        .start(Box::new(SimulatedSource::new(script, ReplayMode::Threaded)), "sim", Instant::now())
        .unwrap();

    let mut sink = PoseBuffer::new();
    let deadline = Instant::now() + Duration::from_secs(10);
    while !player.is_finished() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
        player.update(0.005, &mut sink);
    }

    assert!(player.is_finished(), "stream did not complete before the deadline");
    assert_eq!(player.stats().frames_placed, expected as u64);
    assert_eq!(player.director().character_count(), 2);
    assert_eq!(sink.get("ball").map(|p| p.role), Some(CharacterRole::Ball));
    assert!(player.reported_errors().is_empty());
}

#[test]
fn test_time_source_drives_the_cursor() {
    let mut config = quick_config();
    config.playback.time_source = Some(TimeSourceConfig {
        frames_per_second: 10.0,
        loop_delay_secs: 0.0,
        ..TimeSourceConfig::default()
    });
    let manifest = StreamManifest {
        header: Some(SessionHeader::new(0, 9)),
        rigs: Vec::new(),
    };
    let t0 = Instant::now();
    let mut player = StreamPlayer::new(&config, manifest, t0).unwrap();
    player
        .start(blocking(SimulationScript::new().character("p1", 0, 9, 2)), "sim", t0)
        .unwrap();

    let mut sink = PoseBuffer::new();
    player.update_at(t0, 0.25, &mut sink);
    assert_eq!(sink.get("p1").unwrap().timestamp, Some(0));
    assert_eq!(player.director().cursor().current(), 3);

    player.update_at(t0, 0.27, &mut sink);
    assert_eq!(sink.get("p1").unwrap().timestamp, Some(3));
    assert_eq!(player.director().cursor().current(), 6);
}

#[test]
fn test_seek_jumps_playback() {
    let config = quick_config();
    let interval = config.playback.ticker_interval_secs;
    let t0 = Instant::now();
    let mut player = StreamPlayer::new(&config, StreamManifest::default(), t0).unwrap();
    player
        .start(blocking(SimulationScript::new().character("p1", 100, 119, 2)), "sim", t0)
        .unwrap();

    let mut sink = PoseBuffer::new();
    player.update_at(t0, 0.0, &mut sink);
    player.seek(15);
    player.update_at(t0, interval * 1.001, &mut sink);
    assert_eq!(sink.get("p1").unwrap().timestamp, Some(115));
}

#[test]
fn test_failed_start_surfaces_init_error() {
    let t0 = Instant::now();
    let mut player = StreamPlayer::new(&quick_config(), StreamManifest::default(), t0).unwrap();
    let err = player
        .start(Box::new(SimulatedSource::failing(ReturnCode::BadPath)), "missing.rig", t0)
        .unwrap_err();
    assert!(matches!(
        err,
        RigstreamError::Stream(StreamError::InitFailed {
            code: ReturnCode::BadPath,
            ..
        })
    ));
    assert_eq!(player.state(), SessionState::Failed);

    let mut sink = PoseBuffer::new();
    let stats = player.update_at(t0, 1.0, &mut sink);
    assert_eq!(stats.drain.frames, 0);
    assert!(sink.is_empty());
}

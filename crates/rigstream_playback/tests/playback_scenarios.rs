//! Integration tests: assembled buffers played back through the director.

use rigstream_ingest::{
    AnnouncedCharacter, Announcement, CharacterClassifier, CharacterKind, CharacterRole, FrameAssembler,
    IngestConfig,
};
use rigstream_playback::{blend_factor, Activity, PlaybackConfig, PlaybackDirector, PoseBuffer};
use rigstream_shared::{BoundsRecord, FrameRecord, SessionHeader, Vec3};

fn assembler() -> FrameAssembler {
    FrameAssembler::new(CharacterClassifier::new(&IngestConfig::default(), Vec::new()))
}

fn announce(assembler: &mut FrameAssembler, id: &str, begin: i32, end: i32) -> AnnouncedCharacter {
    match assembler.announce(BoundsRecord::new(id, "", begin, end)) {
        Announcement::New(c) => c,
        Announcement::Duplicate(_) => panic!("{id} announced twice"),
    }
}

fn fill(assembler: &mut FrameAssembler, id: &str, begin: i32, end: i32) {
    for ts in begin..=end {
        assembler.place(FrameRecord::root_only(id, ts, Vec3::new(ts as f32 * 10.0, 0.0, 0.0)));
    }
}

#[test]
fn test_blend_factor_at_reference_rate_drives_lerp() {
    let b = blend_factor(0.4, 1.0 / 30.0, 30.0);
    assert!((b - 0.4).abs() < 1e-5);

    let prev = Vec3::new(0.0, 0.0, 0.0);
    let cur = Vec3::new(10.0, -5.0, 2.5);
    let p = prev.lerp(cur, b);
    assert!(p.distance(Vec3::new(4.0, -2.0, 1.0)) < 1e-4);
}

#[test]
fn test_overlapping_bounds_pick_active_character_and_slot() {
    let mut asm = assembler();
    let first = announce(&mut asm, "c1", 0, 9);
    let second = announce(&mut asm, "c2", 5, 14);
    fill(&mut asm, "c1", 0, 9);
    fill(&mut asm, "c2", 5, 14);

    let config = PlaybackConfig {
        ticker_initial_delay_secs: 0.0,
        ..PlaybackConfig::default()
    };
    let interval = config.ticker_interval_secs;
    let mut director = PlaybackDirector::new(config, Some(SessionHeader::new(0, 14))).unwrap();
    director.add_character(first);
    director.add_character(second);

    director.seek(12);
    assert_eq!(director.absolute_frame(), 12);
    let mut sink = PoseBuffer::new();
    assert_eq!(director.tick(interval * 1.01, &asm, &mut sink), 1);

    let c1 = sink.get("c1").unwrap();
    let c2 = sink.get("c2").unwrap();
    assert!(!c1.visible);
    assert!(c2.visible);
    assert_eq!(director.character("c1").unwrap().activity(), Activity::Inactive);
    assert_eq!(director.character("c2").unwrap().activity(), Activity::Active);

    // Slot 7 of c2's buffer is timestamp 12.
    assert_eq!(asm.buffer("c2").unwrap().get(7).unwrap().timestamp, 12);
    assert_eq!(c2.timestamp, Some(12));
    assert!(c2.root_position.distance(Vec3::new(120.0, 0.0, 0.0)) < 1e-3);
}

#[test]
fn test_full_loop_toggles_visibility() {
    let mut asm = assembler();
    let early = announce(&mut asm, "early", 0, 4);
    let late = announce(&mut asm, "late", 5, 9);
    fill(&mut asm, "early", 0, 4);
    fill(&mut asm, "late", 5, 9);

    let config = PlaybackConfig {
        ticker_initial_delay_secs: 0.0,
        ..PlaybackConfig::default()
    };
    let interval = config.ticker_interval_secs;
    let mut director = PlaybackDirector::new(config, None).unwrap();
    director.add_character(early);
    director.add_character(late);
    assert_eq!(director.cursor().frame_count(), 10);

    let mut sink = PoseBuffer::new();
    let mut visible = Vec::new();
    for _ in 0..12 {
        director.tick(interval * 1.001, &asm, &mut sink);
        visible.push((sink.get("early").unwrap().visible, sink.get("late").unwrap().visible));
    }
    assert!(visible[..5].iter().all(|v| *v == (true, false)));
    assert!(visible[5..10].iter().all(|v| *v == (false, true)));
    // Wrapped back to the start.
    assert_eq!(visible[10], (true, false));
}

#[test]
fn test_missing_slots_do_not_stop_playback() {
    let mut asm = assembler();
    let c = announce(&mut asm, "gappy", 0, 9);
    for ts in [0, 1, 5] {
        asm.place(FrameRecord::root_only("gappy", ts, Vec3::new(ts as f32, 0.0, 0.0)));
    }

    let config = PlaybackConfig {
        ticker_initial_delay_secs: 0.0,
        ..PlaybackConfig::default()
    };
    let interval = config.ticker_interval_secs;
    let mut director = PlaybackDirector::new(config, Some(SessionHeader::new(0, 9))).unwrap();
    director.add_character(c);

    let mut sink = PoseBuffer::new();
    for _ in 0..8 {
        director.tick(interval * 1.001, &asm, &mut sink);
    }
    let state = director.character("gappy").unwrap();
    assert_eq!(state.activity(), Activity::Active);
    assert_eq!(state.prev_frame().unwrap().timestamp, 1);
    assert_eq!(state.current_frame().unwrap().timestamp, 5);
}

#[test]
fn test_object_role_survives_into_pose() {
    let mut asm = FrameAssembler::new(CharacterClassifier::new(
        &IngestConfig::default(),
        vec![rigstream_shared::RigDescriptor::new("ball", "solidObject")],
    ));
    let ball = announce(&mut asm, "ball", 0, 1);
    assert_eq!(ball.kind, CharacterKind::Object);
    fill(&mut asm, "ball", 0, 1);

    let config = PlaybackConfig {
        ticker_initial_delay_secs: 0.0,
        ..PlaybackConfig::default()
    };
    let interval = config.ticker_interval_secs;
    let mut director = PlaybackDirector::new(config, None).unwrap();
    director.add_character(ball);
    let mut sink = PoseBuffer::new();
    director.tick(interval * 1.001, &asm, &mut sink);
    let pose = sink.get("ball").unwrap();
    assert_eq!(pose.role, CharacterRole::Ball);
    assert!(pose.joint_rotations.is_empty());
}

#[test]
fn test_empty_first_slot_stays_hidden_across_loops() {
    let mut asm = assembler();
    let c = announce(&mut asm, "late_start", 0, 4);
    for ts in 1..=4 {
        asm.place(FrameRecord::root_only("late_start", ts, Vec3::new((ts - 1) as f32 * 25.0, 0.0, 0.0)));
    }

    let config = PlaybackConfig {
        ticker_initial_delay_secs: 0.0,
        ..PlaybackConfig::default()
    };
    let interval = config.ticker_interval_secs;
    let mut director = PlaybackDirector::new(config, Some(SessionHeader::new(0, 9))).unwrap();
    director.add_character(c);
    let mut sink = PoseBuffer::new();

    director.tick(interval * 1.001, &asm, &mut sink);
    let pose = sink.get("late_start").unwrap();
    assert!(!pose.visible);
    assert_eq!(pose.timestamp, None);
    assert_eq!(director.character("late_start").unwrap().activity(), Activity::Inactive);

    // Rest of the first loop, then frame 0 of the second.
    for _ in 0..10 {
        director.tick(interval * 1.001, &asm, &mut sink);
    }
    assert!(!sink.get("late_start").unwrap().visible);

    // Frame 1 again: snapped, not blended from the end of the last visit.
    director.tick(interval * 1.001, &asm, &mut sink);
    let pose = sink.get("late_start").unwrap();
    assert!(pose.visible);
    assert_eq!(pose.timestamp, Some(1));
    assert!(pose.root_position.distance(Vec3::ZERO) < 1e-4);
}

//! Integration tests for the PIR → presence FSM → latch → outputs pipeline.
//!
//! Every scenario is driven through `AgentService` exactly as the
//! scheduler slots drive it, with scripted sensors and a hand-advanced
//! clock.

use std::sync::Arc;
use std::time::Duration;

use crate::mock_hw::{ActuatorCall, MockPir, RecordingSink, Rig, ScriptedRange};

use occupancy::adapters::time::MonotonicClock;
use occupancy::app::commands::ControlCommand;
use occupancy::app::events::AgentEvent;
use occupancy::app::ports::Clock;
use occupancy::app::service::{AgentService, ServiceTuning};
use occupancy::config::{PresenceConfig, RearmPolicy, TrackingMode};
use occupancy::error::RangeFault;
use occupancy::fsm::Phase;
use occupancy::runtime::{spawn_tracker, MainLoop};
use occupancy::scheduler::{FrameScheduler, SlotTask};

fn presence(rearm: RearmPolicy) -> PresenceConfig {
    PresenceConfig {
        rearm,
        ..PresenceConfig::default()
    }
}

/// PIR rises, two 80 cm readings follow, everything after that is far.
fn triggered_rig(rearm: RearmPolicy) -> Rig {
    let mut rig = Rig::new(presence(rearm));
    rig.range = ScriptedRange::new(Ok(300.0));
    rig.range.push(Ok(80.0));
    rig.range.push(Ok(80.0));
    rig.pir.set(true);
    rig.run_for_ms(200);
    rig
}

// ── End-to-end: cooldown re-arm ───────────────────────────────

#[test]
fn person_triggers_then_tracking_resumes_without_edge() {
    let mut rig = triggered_rig(RearmPolicy::Cooldown);

    let snap = rig.shared().snapshot();
    assert_eq!(snap.phase, Phase::Cooldown);
    assert!(snap.indicator_on, "indicator should latch within one debounce window");
    assert_eq!(rig.outputs.calls(), vec![ActuatorCall::Drive(true)]);

    // Cooldown runs 3000 ms from the trigger at t=200.
    rig.run_for_ms(2900);
    assert_eq!(rig.shared().snapshot().phase, Phase::Cooldown);
    assert!(rig.outputs.lit());

    rig.step();
    let snap = rig.shared().snapshot();
    assert_eq!(snap.phase, Phase::Tracking);
    assert!(snap.armed);
    assert!(!snap.indicator_on);
    assert_eq!(
        rig.outputs.calls(),
        vec![ActuatorCall::Drive(true), ActuatorCall::Drive(false)]
    );
    assert_eq!(rig.sink.count(|e| *e == AgentEvent::MotionDetected), 1);
    assert_eq!(rig.sink.count(|e| *e == AgentEvent::MotionCleared), 0);
}

// ── Edge re-arm ───────────────────────────────────────────────

#[test]
fn edge_policy_waits_for_fresh_pir_edge() {
    let mut rig = triggered_rig(RearmPolicy::Edge);
    rig.run_for_ms(3000);

    let snap = rig.shared().snapshot();
    assert_eq!(snap.phase, Phase::Idle);
    assert!(!snap.armed);
    assert!(!snap.indicator_on);

    // PIR still high: nothing happens.
    rig.run_for_ms(1000);
    assert_eq!(rig.shared().snapshot().phase, Phase::Idle);

    rig.pir.set(false);
    rig.step();
    assert!(rig.shared().snapshot().armed);
    assert_eq!(rig.shared().snapshot().phase, Phase::Idle);

    rig.pir.set(true);
    rig.step();
    assert_eq!(rig.shared().snapshot().phase, Phase::Tracking);
}

// ── Debounce ──────────────────────────────────────────────────

#[test]
fn alternating_near_far_never_triggers() {
    let mut rig = Rig::new(presence(RearmPolicy::Cooldown));
    rig.range = ScriptedRange::new(Ok(300.0));
    for cm in [80.0, 300.0, 80.0, 300.0, 80.0, 500.0] {
        rig.range.push(Ok(cm));
    }
    rig.pir.set(true);
    rig.run_for_ms(1000);
    assert_eq!(rig.shared().snapshot().phase, Phase::Tracking);
    assert!(rig.outputs.calls().is_empty());
}

#[test]
fn fault_between_near_readings_resets_streak() {
    let mut rig = Rig::new(presence(RearmPolicy::Cooldown));
    rig.range = ScriptedRange::new(Ok(300.0));
    rig.range.push(Ok(80.0));
    rig.range.push(Err(RangeFault::EchoLowTimeout));
    rig.range.push(Ok(80.0));
    rig.pir.set(true);
    rig.run_for_ms(500);

    assert_eq!(rig.shared().snapshot().phase, Phase::Tracking);
    assert_eq!(
        rig.sink
            .count(|e| *e == AgentEvent::RangeFault(RangeFault::EchoLowTimeout)),
        1
    );
    assert!(rig.outputs.calls().is_empty());
}

// ── Control flags ─────────────────────────────────────────────

#[test]
fn sleep_pauses_tracking_and_wake_resumes() {
    let mut rig = Rig::new(presence(RearmPolicy::Cooldown));
    rig.range = ScriptedRange::new(Ok(300.0));
    rig.pir.set(true);
    rig.step();
    assert_eq!(rig.shared().snapshot().phase, Phase::Tracking);

    rig.shared().apply_command(ControlCommand::Sleep);
    rig.step();
    assert_eq!(rig.shared().snapshot().phase, Phase::Idle);
    rig.run_for_ms(500);
    assert_eq!(rig.shared().snapshot().phase, Phase::Idle);

    rig.shared().apply_command(ControlCommand::Wake);
    rig.step();
    assert_eq!(rig.shared().snapshot().phase, Phase::Tracking);
}

#[test]
fn quit_mid_cooldown_forces_outputs_off() {
    let mut rig = triggered_rig(RearmPolicy::Cooldown);
    assert!(rig.outputs.lit());

    rig.shared().apply_command(ControlCommand::Quit);
    rig.service.shutdown(&mut rig.sink);

    assert_eq!(rig.outputs.calls().last(), Some(&ActuatorCall::AllOff));
    let snap = rig.shared().snapshot();
    assert_eq!(snap.phase, Phase::Idle);
    assert!(!snap.indicator_on);
    assert!(snap.flags.shutdown_requested);
}

// ── Execution contexts ────────────────────────────────────────

#[test]
fn main_loop_dispatches_slots_and_exits_on_shutdown() {
    let rig = Rig::new(presence(RearmPolicy::Cooldown));
    let shared = rig.shared();
    let clock: Arc<dyn Clock> = rig.clock.clone();
    let pir = MockPir::default();
    pir.set(true);

    let sched = FrameScheduler::main_frame(50, 4, TrackingMode::Slotted, 0);
    let mut main_loop = MainLoop::new(rig.service, sched, clock, pir, RecordingSink::default())
        .with_range(Box::new(ScriptedRange::new(Ok(80.0))));

    rig.clock.set_ms(100);
    main_loop.dispatch(SlotTask::PirSample);
    main_loop.dispatch(SlotTask::RangeTrack);
    rig.clock.set_ms(200);
    main_loop.dispatch(SlotTask::RangeTrack);
    assert_eq!(shared.snapshot().phase, Phase::Cooldown);
    assert!(rig.outputs.lit());

    shared.request_shutdown();
    let sink = main_loop.run();
    assert_eq!(rig.outputs.calls().last(), Some(&ActuatorCall::AllOff));
    assert!(sink.events.contains(&AgentEvent::IndicatorChanged { on: false }));
}

#[test]
fn tracker_thread_stops_when_shutdown_requested() {
    let rig = Rig::new(presence(RearmPolicy::Cooldown));
    let shared = rig.shared();
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let service = AgentService::new(
        shared.clone(),
        clock.clone(),
        ServiceTuning {
            median_every: 5,
            median_samples: 3,
            heartbeat_ms: 1000,
        },
    );

    let handle = spawn_tracker(
        service,
        ScriptedRange::new(Ok(300.0)),
        RecordingSink::default(),
        clock,
        20,
    )
    .unwrap();

    std::thread::sleep(Duration::from_millis(100));
    shared.request_shutdown();
    handle.join().unwrap();
    assert_eq!(rig.outputs.calls().last(), Some(&ActuatorCall::AllOff));
}

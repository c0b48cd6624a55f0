//! Execution contexts.
//!
//! ```text
//!   main thread      MainLoop: PowerPoll · PirSample · [RangeTrack] · ActuatorHeartbeat
//!   range-tracker    spawn_tracker: RangeTrack every track_period_ms   (background mode)
//!   tokio runtime    control endpoint, report sends, power fetches
//! ```
//!
//! Both sensing contexts poll `shutdown_requested` once per iteration and,
//! on the way out, force every output off.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::info;

use crate::app::ports::{Clock, EventSink, MotionSensor, RangeSensor};
use crate::app::service::AgentService;
use crate::power::PowerPoller;
use crate::scheduler::{FrameScheduler, Poll, SlotTask};

/// Main sensing loop on the slot grid.
pub struct MainLoop<P, S> {
    service: AgentService,
    scheduler: FrameScheduler,
    clock: Arc<dyn Clock>,
    pir: P,
    /// Present only when range tracking owns a slot in this frame.
    range: Option<Box<dyn RangeSensor + Send>>,
    power: Option<PowerPoller>,
    sink: S,
}

impl<P, S> MainLoop<P, S>
where
    P: MotionSensor,
    S: EventSink,
{
    pub fn new(
        service: AgentService,
        scheduler: FrameScheduler,
        clock: Arc<dyn Clock>,
        pir: P,
        sink: S,
    ) -> Self {
        Self {
            service,
            scheduler,
            clock,
            pir,
            range: None,
            power: None,
            sink,
        }
    }

    /// Run range tracking in this loop's `RangeTrack` slot.
    pub fn with_range(mut self, range: Box<dyn RangeSensor + Send>) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_power(mut self, power: PowerPoller) -> Self {
        self.power = Some(power);
        self
    }

    /// Execute one slot task.
    pub fn dispatch(&mut self, task: SlotTask) {
        match task {
            SlotTask::PowerPoll => {
                if let Some(power) = &mut self.power {
                    power.tick(self.clock.now_ms(), self.service.shared(), &mut self.sink);
                }
            }
            SlotTask::PirSample => self.service.sample_pir(&mut self.pir, &mut self.sink),
            SlotTask::RangeTrack => {
                if let Some(range) = &mut self.range {
                    self.service.track_range(range.as_mut(), &mut self.sink);
                }
            }
            SlotTask::ActuatorHeartbeat => self.service.service_actuators(&mut self.sink),
            SlotTask::Idle => {}
        }
    }

    /// Loop until shutdown is requested, then release the outputs.
    pub fn run(mut self) -> S {
        info!(
            "main loop: {} slots x {} ms",
            self.scheduler.slots().len(),
            self.scheduler.slot_ms()
        );
        while !self.service.shared().shutdown_requested() {
            match self.scheduler.poll(self.clock.now_ms()) {
                Poll::Sleep(ms) => thread::sleep(Duration::from_millis(ms)),
                Poll::Run(task) => self.dispatch(task),
            }
        }
        self.service.shutdown(&mut self.sink);
        info!("main loop: exited ({} resyncs)", self.scheduler.resyncs());
        self.sink
    }
}

/// Start the fast range-tracking context on its own thread.
pub fn spawn_tracker<R, S>(
    mut service: AgentService,
    mut range: R,
    mut sink: S,
    clock: Arc<dyn Clock>,
    period_ms: u64,
) -> std::io::Result<JoinHandle<()>>
where
    R: RangeSensor + Send + 'static,
    S: EventSink + Send + 'static,
{
    thread::Builder::new()
        .name("range-tracker".into())
        .spawn(move || {
            let mut sched = FrameScheduler::periodic(period_ms, SlotTask::RangeTrack, clock.now_ms());
            info!("range tracker: every {} ms", sched.slot_ms());
            while !service.shared().shutdown_requested() {
                match sched.poll(clock.now_ms()) {
                    Poll::Sleep(ms) => thread::sleep(Duration::from_millis(ms)),
                    Poll::Run(_) => service.track_range(&mut range, &mut sink),
                }
            }
            service.shutdown(&mut sink);
            info!("range tracker: exited");
        })
}

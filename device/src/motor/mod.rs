//! Motor control: homing, the hall-edge interrupt path and the periodic
//! motion controller.
//!
//! Three execution contexts touch the motor.  The hall watcher runs on the
//! high-priority interrupt executor and owns the six gate lines.  The
//! controller runs on the medium-priority executor and owns the torque
//! duty (through the shared duty mutex).  Everything else only posts
//! commands or reports.

pub mod duty;
pub mod phases;

use core::sync::atomic::Ordering;

use embassy_futures::select::select3;
use embassy_stm32::exti::ExtiInput;
use embassy_time::{Duration, Ticker, Timer};
use halldrive_control::commutation;
use halldrive_control::controller::{MotionController, Setpoints};
use halldrive_control::rotor::{self, Sector};
use halldrive_control::status::StatusEvent;
use halldrive_control::tracker::PositionTracker;

use crate::report::StatusSender;
use crate::{
    CONTROL_TICK, LEAD_OFFSET, STEP_COUNT, SharedDuty, SharedParams, store_velocity,
};
use self::phases::PhaseOutputs;

/// Controller tick period.
const TICK_PERIOD: Duration = Duration::from_millis(100);
/// Mechanical settle time for the homing park.
const SETTLE: Duration = Duration::from_secs(2);

/// The three hall-effect sensor lines.
pub struct HallInputs {
    pub h1: ExtiInput<'static>,
    pub h2: ExtiInput<'static>,
    pub h3: ExtiInput<'static>,
}

impl HallInputs {
    /// Decode the current line levels.  `None` for the two combinations a
    /// working sensor set cannot produce.
    pub fn read_sector(&self) -> Option<Sector> {
        rotor::decode(self.h1.is_high(), self.h2.is_high(), self.h3.is_high())
    }
}

/// Park the rotor at the sector-0 drive state, wait for it to settle
/// mechanically and record where it came to rest.
///
/// There is no failure path: a stalled or miswired rotor simply records
/// whatever state is observed after the settle time.
pub async fn home(phases: &mut PhaseOutputs<'_>, halls: &HallInputs) -> Sector {
    phases.apply(commutation::pattern_for(Sector::ZERO));
    Timer::after(SETTLE).await;
    halls.read_sector().unwrap_or(Sector::ZERO)
}

/// Interrupt-path position tracker.
///
/// Woken on every edge of any hall line: decodes the new sector, steps the
/// shared counter and re-drives the gate lines with the current lead.  No
/// locks, no allocation, nothing that can block.
#[embassy_executor::task]
pub async fn hall_watcher(
    mut halls: HallInputs,
    mut phases: PhaseOutputs<'static>,
    origin: Sector,
) {
    let mut tracker = PositionTracker::new(origin);
    loop {
        if let Some(state) = halls.read_sector() {
            let step = tracker.observe(state);
            if step.delta != 0 {
                STEP_COUNT.fetch_add(step.delta as i32, Ordering::Relaxed);
            }
            if step.changed {
                let lead = LEAD_OFFSET.load(Ordering::Relaxed);
                phases.apply(commutation::drive_pattern(state, origin, lead));
                defmt::trace!("hall edge: sector {}", state.index());
            }
        }
        // An undecodable state drives nothing: the previous pattern stays
        // latched on the gate lines.

        select3(
            halls.h1.wait_for_any_edge(),
            halls.h2.wait_for_any_edge(),
            halls.h3.wait_for_any_edge(),
        )
        .await;
    }
}

/// Raises the controller tick from a periodic timer.
#[embassy_executor::task]
pub async fn tick_task() {
    let mut ticker = Ticker::every(TICK_PERIOD);
    loop {
        ticker.next().await;
        CONTROL_TICK.signal(());
    }
}

/// Periodic motion controller.  Blocks only on the tick signal; never
/// polls, and holds at most one parameter lock at a time.
#[embassy_executor::task]
pub async fn control_task(params: &'static SharedParams, duty: &'static SharedDuty) {
    let mut controller = MotionController::new();
    let mut sender = StatusSender::new();

    loop {
        CONTROL_TICK.wait().await;

        let velocity = { *params.target_velocity.lock().await };
        let rotations = { *params.target_rotations.lock().await };
        let setpoints = Setpoints {
            velocity,
            rotations,
        };

        let steps = STEP_COUNT.load(Ordering::Relaxed);
        let out = controller.update(steps, setpoints);

        if out.reset_counter {
            // Rotation tracking restarts at the new target.  An edge
            // between the load above and this store is absorbed into the
            // next tick's estimate.
            STEP_COUNT.store(0, Ordering::Relaxed);
            defmt::debug!("rotation target changed, step count reset");
        }

        LEAD_OFFSET.store(out.lead.offset(), Ordering::Relaxed);
        store_velocity(out.velocity);
        duty.lock().await.set_torque(out.duty);

        if out.report_velocity {
            sender.post(StatusEvent::Velocity(out.velocity)).await;
        }
    }
}

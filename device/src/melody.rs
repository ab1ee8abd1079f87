//! Melody playback over the motor PWM period.
//!
//! Consumes the shared melody string set by the `T` command.  Each note
//! retunes the PWM period through the shared duty owner; the lock is not
//! held while the note sounds, so the control loop keeps writing torque
//! at the new period in the meantime.

use embassy_time::{Duration, Timer};
use halldrive_control::melody::parse_melody;

use crate::{SharedDuty, SharedParams};

/// One beat of playback.
const BEAT: Duration = Duration::from_secs(1);
/// Poll interval while no melody is pending.
const IDLE_POLL: Duration = Duration::from_millis(250);

#[embassy_executor::task]
pub async fn melody_task(params: &'static SharedParams, duty: &'static SharedDuty) {
    loop {
        let pending = { params.melody.lock().await.clone() };
        if pending.is_empty() {
            Timer::after(IDLE_POLL).await;
            continue;
        }

        defmt::info!("playing melody: {}", pending.as_str());
        for note in parse_melody(&pending) {
            duty.lock().await.set_period_for(note.freq);
            Timer::after(BEAT * note.beats as u32).await;
        }
        duty.lock().await.restore_default_period();

        // Consume the string, unless a new T command already replaced it;
        // the next pass plays that one.
        {
            let mut slot = params.melody.lock().await;
            if *slot == pending {
                slot.clear();
            }
        }
    }
}

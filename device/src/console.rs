//! Serial command console: line assembly and dispatch.

use core::sync::atomic::Ordering;

use embassy_stm32::usart::BufferedUartRx;
use embassy_time::Instant;
use embedded_io_async::Read;
use halldrive_control::command::{self, Command};
use halldrive_control::status::StatusEvent;
use heapless::Vec;

use crate::report::StatusSender;
use crate::{HASH_COUNT, SharedDuty, SharedParams, load_velocity};

/// Longest accepted command line; bytes beyond it are dropped until the
/// next terminator.
const LINE_MAX: usize = 64;

/// Assembles CR/LF-terminated lines from the serial stream and dispatches
/// each one.
#[embassy_executor::task]
pub async fn console_task(
    mut rx: BufferedUartRx<'static>,
    params: &'static SharedParams,
    duty: &'static SharedDuty,
) {
    let mut line: Vec<u8, LINE_MAX> = Vec::new();
    let mut sender = StatusSender::new();
    let mut buf = [0u8; 16];

    loop {
        let read = match rx.read(&mut buf).await {
            Ok(read) => read,
            Err(_) => {
                defmt::warn!("serial read error");
                continue;
            }
        };
        for &byte in &buf[..read] {
            if byte == b'\r' || byte == b'\n' {
                if !line.is_empty() {
                    dispatch(&line, params, duty, &mut sender).await;
                    line.clear();
                }
            } else {
                let _ = line.push(byte);
            }
        }
    }
}

/// Parse one line and apply it under the matching parameter lock.
///
/// Unknown tags and malformed arguments are dropped without a report; the
/// previous parameter value stays in place.
async fn dispatch(
    line: &[u8],
    params: &'static SharedParams,
    duty: &'static SharedDuty,
    sender: &mut StatusSender,
) {
    let Ok(text) = core::str::from_utf8(line) else {
        return;
    };
    let Some(cmd) = command::parse(text) else {
        defmt::debug!("command ignored: {}", text);
        return;
    };

    match cmd {
        Command::SetKey(key) => {
            *params.key.lock().await = key;
            sender.post(StatusEvent::KeyUpdated(key)).await;
        }
        Command::SetDuty(value) => {
            *params.duty_override.lock().await = value;
            duty.lock().await.set_torque(value);
            sender.post(StatusEvent::DutyUpdated(value)).await;
        }
        Command::ReportHashRate => {
            let elapsed = Instant::now().as_micros() as f32 / 1_000_000.0;
            let rate = HASH_COUNT.load(Ordering::Relaxed) as f32 / elapsed;
            sender.post(StatusEvent::HashRate(rate)).await;
        }
        Command::ReportStatus => {
            sender.post(StatusEvent::Velocity(load_velocity())).await;
        }
        Command::SetVelocity(velocity) => {
            *params.target_velocity.lock().await = velocity;
            sender.post(StatusEvent::MaxVelocity(velocity)).await;
        }
        Command::SetRotations(rotations) => {
            *params.target_rotations.lock().await = rotations;
            sender.post(StatusEvent::RotationTarget(rotations)).await;
        }
        Command::SetMelody(melody) => {
            *params.melody.lock().await = melody.clone();
            sender.post(StatusEvent::MelodyUpdated(melody)).await;
        }
    }
}

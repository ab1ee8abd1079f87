//! Status mailbox and reporter task.

use embassy_stm32::usart::BufferedUartTx;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Instant, Timer};
use embedded_io_async::Write;
use halldrive_control::status::StatusEvent;

/// Mailbox depth.
pub const MAILBOX_DEPTH: usize = 16;

/// Minimum spacing between posts from one producer, to bound the load on
/// the reporting channel.
pub const POST_SPACING: Duration = Duration::from_secs(1);

/// Multi-producer, single-consumer status mailbox.  Events are consumed
/// in insertion order, exactly once.
pub static MAILBOX: Channel<CriticalSectionRawMutex, StatusEvent, MAILBOX_DEPTH> =
    Channel::new();

/// Posting handle with the pacing applied per producer.
///
/// Each producer task owns its own sender, so a burst from one producer is
/// spread out without delaying reports from the others.
pub struct StatusSender {
    last_post: Option<Instant>,
}

impl StatusSender {
    pub const fn new() -> Self {
        Self { last_post: None }
    }

    /// Post one event, waiting out the pacing interval first.
    pub async fn post(&mut self, event: StatusEvent) {
        if let Some(last) = self.last_post {
            Timer::at(last + POST_SPACING).await;
        }
        MAILBOX.send(event).await;
        self.last_post = Some(Instant::now());
    }
}

/// Drains the mailbox and writes one line per event to the serial port.
#[embassy_executor::task]
pub async fn reporter_task(mut tx: BufferedUartTx<'static>) {
    loop {
        let event = MAILBOX.receive().await;
        let line = event.format_line();
        if tx.write_all(line.as_bytes()).await.is_err() {
            defmt::warn!("status line dropped: serial write failed");
        }
    }
}

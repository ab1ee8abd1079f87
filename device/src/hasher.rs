//! Background SHA-256 nonce search.
//!
//! The lowest-urgency work in the system: one hash per pass with a yield
//! between rounds, so the console, reporter and melody tasks always get
//! the executor first.

use core::sync::atomic::Ordering;

use embassy_futures::yield_now;
use halldrive_control::status::StatusEvent;
use sha2::{Digest, Sha256};

use crate::report::StatusSender;
use crate::{HASH_COUNT, SharedParams};

/// First 48 bytes of the hashed block; the key sits at 48..56 and the
/// little-endian nonce at 56..64.
const PREAMBLE: &[u8; 48] = b"Embedded Systems are fun and do awesome things! ";

/// A nonce counts when the digest starts with two zero bytes.
fn is_winner(digest: &[u8]) -> bool {
    digest[0] == 0 && digest[1] == 0
}

#[embassy_executor::task]
pub async fn hasher_task(params: &'static SharedParams) {
    let mut sender = StatusSender::new();
    let mut block = [0u8; 64];
    block[..PREAMBLE.len()].copy_from_slice(PREAMBLE);
    let mut nonce: u64 = 0;

    defmt::info!("nonce search running");

    loop {
        {
            let key = *params.key.lock().await;
            block[48..56].copy_from_slice(&key.to_le_bytes());
        }
        block[56..64].copy_from_slice(&nonce.to_le_bytes());

        let digest = Sha256::digest(block);
        if is_winner(&digest) {
            defmt::info!("nonce found: {}", nonce as u32);
            sender.post(StatusEvent::NonceFound(nonce as u32)).await;
        }

        nonce = nonce.wrapping_add(1);
        HASH_COUNT.fetch_add(1, Ordering::Relaxed);
        yield_now().await;
    }
}

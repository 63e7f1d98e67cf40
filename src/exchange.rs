//! Double-buffered producer/consumer frame handoff.
//!
//! The capture side extracts each completed transfer into whichever slot
//! was *not* last published, then publishes `(sequence, slot)` as the
//! final step ("data first, signal last"). The driver reads the published
//! pair and locks that slot, so it can never observe a plane that is
//! mid-overwrite, no matter how slowly it polls.
//!
//! Single producer, single consumer. If the producer laps the consumer
//! twice while the consumer still holds a read guard, the producer blocks
//! on that slot's mutex until the read finishes; the handoff degrades to
//! frame drops, never to torn reads.

use anyhow::{anyhow, Result};
use std::ops::Deref;
use std::sync::{Mutex, MutexGuard};

use crate::extract::extract_luma;
use crate::plane::LumaPlane;

#[derive(Clone, Copy, Debug)]
struct Published {
    /// Monotonically increasing, one increment per completed capture.
    /// Zero means nothing has been published yet.
    seq: u64,
    slot: usize,
}

/// Two full-resolution planes plus the published `(seq, slot)` pair.
pub struct PlaneExchange {
    slots: [Mutex<LumaPlane>; 2],
    published: Mutex<Published>,
}

impl PlaneExchange {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            slots: [
                Mutex::new(LumaPlane::new(width, height)),
                Mutex::new(LumaPlane::new(width, height)),
            ],
            // slot 1 marked "last published" so the first write lands in 0.
            published: Mutex::new(Published { seq: 0, slot: 1 }),
        }
    }

    /// Producer side: consume a completed 4:2:2 transfer.
    ///
    /// Extracts the luma plane into the inactive slot, then publishes.
    /// Runs synchronously in the capture completion path; the capture
    /// buffer is not referenced after this returns. Returns the new
    /// sequence number.
    pub fn publish_capture(&self, yuv: &[u8]) -> Result<u64> {
        let write_slot = {
            let published = self
                .published
                .lock()
                .map_err(|_| anyhow!("exchange publish lock poisoned"))?;
            1 - published.slot
        };

        {
            let mut plane = self.slots[write_slot]
                .lock()
                .map_err(|_| anyhow!("exchange slot lock poisoned"))?;
            extract_luma(yuv, &mut plane);
        }

        let mut published = self
            .published
            .lock()
            .map_err(|_| anyhow!("exchange publish lock poisoned"))?;
        published.seq += 1;
        published.slot = write_slot;
        Ok(published.seq)
    }

    /// Consumer side: lock the most recently published plane, if it is
    /// newer than `last_seq`.
    ///
    /// The returned view holds the slot lock for its lifetime; the
    /// producer will never overwrite the plane underneath it.
    pub fn latest_since(&self, last_seq: u64) -> Result<Option<FrameView<'_>>> {
        let published = self
            .published
            .lock()
            .map_err(|_| anyhow!("exchange publish lock poisoned"))?;
        if published.seq == 0 || published.seq == last_seq {
            return Ok(None);
        }
        let seq = published.seq;
        // Lock the slot before releasing `published` so the view's seq
        // always matches the plane contents. The producer never writes
        // the published slot, so this cannot deadlock.
        let plane = self.slots[published.slot]
            .lock()
            .map_err(|_| anyhow!("exchange slot lock poisoned"))?;
        drop(published);
        Ok(Some(FrameView { seq, plane }))
    }
}

/// A locked view of one published full-resolution plane.
pub struct FrameView<'a> {
    pub seq: u64,
    plane: MutexGuard<'a, LumaPlane>,
}

impl Deref for FrameView<'_> {
    type Target = LumaPlane;

    fn deref(&self) -> &LumaPlane {
        &self.plane
    }
}

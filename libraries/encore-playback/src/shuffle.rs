//! Shuffle selection
//!
//! With shuffle on, the next track is drawn uniformly from the whole queue.
//! The current track may be drawn again.

use rand::Rng;

/// Uniformly random index into a queue of `len` tracks
pub fn pick_index<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(rng.gen_range(0..len))
}

//! Queue position calculation
//!
//! Given a strategy, a snapshot of the queue and the item currently playing,
//! returns the index a new item would be inserted at. The result is always in
//! `0..=queue.len()`, where `queue.len()` means "append". The queue itself is
//! never touched.

use crate::enqueue_location::EnqueueLocation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Computes insertion indexes
///
/// Holds the random source used by [`EnqueueLocation::Random`]. Production code
/// uses [`EnqueuePositionCalculator::new`]; tests hand in a seeded generator via
/// [`EnqueuePositionCalculator::with_rng`].
#[derive(Debug, Clone)]
pub struct EnqueuePositionCalculator<R = StdRng> {
    rng: R,
}

impl EnqueuePositionCalculator<StdRng> {
    /// Calculator backed by an entropy-seeded generator
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for EnqueuePositionCalculator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> EnqueuePositionCalculator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Index at which a new item goes
    ///
    /// An unresolved `Global` is treated as `Back`. A `currently_playing` item that
    /// is not in `queue` counts as nothing playing.
    pub fn calculate_position<T: PartialEq>(
        &mut self,
        strategy: EnqueueLocation,
        queue: &[T],
        currently_playing: Option<&T>,
    ) -> usize {
        let position = match strategy {
            EnqueueLocation::Global | EnqueueLocation::Back => queue.len(),
            EnqueueLocation::Front => 0,
            EnqueueLocation::AfterCurrentlyPlaying => {
                position_after(queue, currently_playing)
            }
            // Inclusive range: queue.len() + 1 equally likely slots
            EnqueueLocation::Random => self.rng.gen_range(0..=queue.len()),
        };

        debug!(
            "Enqueue position {} of {} for strategy {}",
            position,
            queue.len(),
            strategy
        );
        position
    }
}

/// Slot right after `currently_playing`, or the head when it is absent or stale
fn position_after<T: PartialEq>(queue: &[T], currently_playing: Option<&T>) -> usize {
    currently_playing
        .and_then(|current| queue.iter().position(|item| item == current))
        .map(|index| index + 1)
        .unwrap_or(0)
}

use crate::slots::RecurringSlot;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces the enrollment count shown for a slot on a given date.
///
/// Implementations must return a value in `0..=slot.capacity()` and must not
/// mutate anything visible to the projector. The random sampler stands in for
/// an enrollment-record query.
pub trait OccupancySampler {
    fn sample(&mut self, slot: &RecurringSlot, date: NaiveDate) -> u32;
}

impl<F> OccupancySampler for F
where
    F: FnMut(&RecurringSlot, NaiveDate) -> u32,
{
    fn sample(&mut self, slot: &RecurringSlot, date: NaiveDate) -> u32 {
        self(slot, date)
    }
}

/// Uniform draw from `0..=capacity`.
pub struct RandomOccupancy<R: Rng> {
    rng: R,
}

impl RandomOccupancy<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> OccupancySampler for RandomOccupancy<R> {
    fn sample(&mut self, slot: &RecurringSlot, _date: NaiveDate) -> u32 {
        self.rng.gen_range(0..=slot.capacity())
    }
}

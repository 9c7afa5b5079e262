//! Random choice behind an injectable seam.
//!
//! Provider selection and reprompt choice both go through [`Picker`], so
//! tests can replace randomness with a script.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Chooses one index out of `len` options.
pub trait Picker: Send + Sync {
    /// Return an index in `0..len`, or `None` when `len` is zero.
    fn pick_index(&self, len: usize) -> Option<usize>;
}

/// Pick one element of `items` with `picker`.
pub fn pick<'a, T>(picker: &dyn Picker, items: &'a [T]) -> Option<&'a T> {
    let index = picker.pick_index(items.len())?;
    items.get(index)
}

/// Uniform choice from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPicker;

impl Picker for RandomPicker {
    fn pick_index(&self, len: usize) -> Option<usize> {
        (len > 0).then(|| rand::thread_rng().gen_range(0..len))
    }
}

/// Uniform choice from a seeded RNG, for reproducible runs.
pub struct SeededPicker {
    rng: Mutex<StdRng>,
}

impl SeededPicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Picker for SeededPicker {
    fn pick_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Some(rng.gen_range(0..len))
    }
}

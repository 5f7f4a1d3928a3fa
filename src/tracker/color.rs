use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplies `#RRGGBB` colors for overlay lines. Colors carry no meaning.
pub struct ColorGenerator {
    rng: StdRng,
}

impl ColorGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next_color(&mut self) -> String {
        format!("#{:06X}", self.rng.gen_range(0..=0xFF_FFFFu32))
    }
}

impl Default for ColorGenerator {
    fn default() -> Self {
        Self::new()
    }
}

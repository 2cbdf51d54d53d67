use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/*
White noise: every sample is an independent draw, uniform in [-1.0, +1.0].

Snares, hats, claps and rimshots get their "air" from it. A seeded source
makes every rendered voice reproducible, which the tests and offline renders
rely on; an unseeded one pulls its seed from the OS.
*/

#[derive(Debug, Clone)]
pub struct Noise {
    rng: SmallRng,
}

impl Noise {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Seeded when `seed` is set, OS entropy otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::new(),
        }
    }

    #[inline]
    pub fn sample(&mut self) -> f32 {
        self.rng.random_range(-1.0..=1.0)
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.sample();
        }
    }
}

impl Default for Noise {
    fn default() -> Self {
        Self::new()
    }
}

use std::f32::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
| type       | passes          | rejects      | extra                       |
| ---------- | --------------- | ------------ | --------------------------- |
| low-pass   | below cutoff    | above cutoff |                             |
| high-pass  | above cutoff    | below cutoff |                             |
| peaking    | everything      | nothing      | ±gain_db bell around cutoff |
| all-pass   | everything      | nothing      | phase shift around cutoff   |

All four come out of the same trapezoidal state-variable core:

    low  = v2
    band = v1
    high = x - k*v1 - v2
    all  = x - 2k*v1
    bell = x + k*(A² - 1)*v1      (A = 10^(gain_db/40), k = 1/(Q*A))

with g = tan(π * cutoff / sample_rate) and k = 1/Q.
*/

/// Highest usable cutoff as a fraction of the sample rate.
const MAX_CUTOFF_RATIO: f32 = 0.49;
const MIN_CUTOFF_HZ: f32 = 1.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterType {
    LowPass,
    HighPass,
    Peaking { gain_db: f32 },
    AllPass,
}

#[derive(Debug, Clone)]
pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    cutoff_hz: f32,
    q: f32,
    filter_type: FilterType,
    sample_rate: f32,

    // Coefficients, recomputed whenever a parameter changes
    g: f32,
    k: f32,
    bell: f32,
}

impl SVFilter {
    pub fn new(filter_type: FilterType, cutoff_hz: f32, q: f32, sample_rate: f32) -> Self {
        let mut filter = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
            q: q.max(0.01),
            filter_type,
            sample_rate,
            g: 0.0,
            k: 0.0,
            bell: 0.0,
        };
        filter.update_coefficients();
        filter
    }

    pub fn lowpass(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff_hz, 1.0, sample_rate)
    }

    pub fn highpass(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self::new(FilterType::HighPass, cutoff_hz, 1.0, sample_rate)
    }

    pub fn peaking(cutoff_hz: f32, gain_db: f32, sample_rate: f32) -> Self {
        Self::new(FilterType::Peaking { gain_db }, cutoff_hz, 1.0, sample_rate)
    }

    pub fn allpass(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self::new(FilterType::AllPass, cutoff_hz, 1.0, sample_rate)
    }

    fn update_coefficients(&mut self) {
        let nyquist_guard = self.sample_rate * MAX_CUTOFF_RATIO;
        let cutoff = self.cutoff_hz.clamp(MIN_CUTOFF_HZ, nyquist_guard);
        self.g = (PI * cutoff / self.sample_rate).tan();

        match self.filter_type {
            FilterType::Peaking { gain_db } => {
                let a = 10f32.powf(gain_db / 40.0);
                self.k = 1.0 / (self.q * a);
                self.bell = self.k * (a * a - 1.0);
            }
            _ => {
                self.k = 1.0 / self.q;
                self.bell = 0.0;
            }
        }
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let (g, k) = (self.g, self.k);

        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        match self.filter_type {
            FilterType::LowPass => v2,
            FilterType::HighPass => sample - k * v1 - v2,
            FilterType::Peaking { .. } => sample + self.bell * v1,
            FilterType::AllPass => sample - 2.0 * k * v1,
        }
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff_hz = cutoff;
        self.update_coefficients();
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }
}

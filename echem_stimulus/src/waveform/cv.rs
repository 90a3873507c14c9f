//! Cyclic voltammetry: triangular sweep between two code bounds.
//!
//! Position is held in 16.16 fixed-point code units. A step of 0.0025 V is
//! about 3.1 codes, and accumulating the rounded value would drift the
//! vertices over a long scan.

use echem_common::consts::{CODE_MAX, DEFAULT_CV_TICK_SECONDS, VREF_VOLTS};
use echem_common::waveform::{CvParams, CvVoltParams, ScanDirection, volt_to_code};

const FRAC_BITS: u32 = 16;
const HALF: i32 = 1 << (FRAC_BITS - 1);

#[inline]
const fn to_q16(code: u16) -> i32 {
    (code as i32) << FRAC_BITS
}

#[inline]
fn q16_to_code(q: i32) -> u16 {
    (((q + HALF) >> FRAC_BITS).clamp(0, CODE_MAX as i32)) as u16
}

/// Runtime state of a CV sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CvScan {
    low_q: i32,
    high_q: i32,
    step_q: i32,
    pos_q: i32,
    rising: bool,
    period: f32,
}

impl CvScan {
    /// Compute bounds, step and start position.
    ///
    /// Vertices are `volt_offset + low_volt` and `volt_offset + high_volt`,
    /// swapped if given in the wrong order. `Forward` starts at the low bound
    /// rising, `Reverse` at the high bound falling. A non-positive duration
    /// falls back to 1 ms; the step is at least one fixed-point unit.
    pub fn new(volt: &CvVoltParams, params: &CvParams) -> Self {
        let a = volt_to_code(volt.volt_offset + volt.low_volt);
        let b = volt_to_code(volt.volt_offset + volt.high_volt);
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let (low_q, high_q) = (to_q16(low), to_q16(high));

        let period = if params.duration > 0.0 {
            params.duration
        } else {
            DEFAULT_CV_TICK_SECONDS
        };
        let step_volts = f64::from((params.rate * period).abs());
        let step_codes = step_volts / f64::from(VREF_VOLTS) * f64::from(CODE_MAX);
        // NaN and infinity saturate through `as`; then clamp into range.
        let step_q = ((step_codes * f64::from(1u32 << FRAC_BITS)).round() as i64)
            .clamp(1, i64::from((high_q - low_q).max(1))) as i32;

        let (pos_q, rising) = match params.direction {
            ScanDirection::Forward => (low_q, true),
            ScanDirection::Reverse => (high_q, false),
        };

        Self {
            low_q,
            high_q,
            step_q,
            pos_q,
            rising,
            period,
        }
    }

    /// Advance one tick. Returns `true` if the output code changed.
    #[inline]
    pub fn advance(&mut self) -> bool {
        let before = self.code();
        if self.rising {
            self.pos_q += self.step_q;
            if self.pos_q >= self.high_q {
                self.pos_q = self.high_q;
                self.rising = false;
            }
        } else {
            self.pos_q -= self.step_q;
            if self.pos_q <= self.low_q {
                self.pos_q = self.low_q;
                self.rising = true;
            }
        }
        self.code() != before
    }

    /// Current output code.
    #[inline]
    pub fn code(&self) -> u16 {
        q16_to_code(self.pos_q)
    }

    /// `(low, high)` code bounds.
    pub fn bounds(&self) -> (u16, u16) {
        (q16_to_code(self.low_q), q16_to_code(self.high_q))
    }

    pub fn is_rising(&self) -> bool {
        self.rising
    }

    /// Timer interval [s].
    pub fn period(&self) -> f32 {
        self.period
    }
}

impl Default for CvScan {
    fn default() -> Self {
        Self::new(&CvVoltParams::default(), &CvParams::default())
    }
}

//! Differential pulse voltammetry: staircase with a pulse at the end of each step.
//!
//! Each staircase step lasts `pulse_period_ms` ticks of 1 ms:
//!
//! ```text
//!  phase  1 ............ baseline ........ period
//!         |<-- baseline level -->|<- pulse ->|
//!                       ^ pre-pulse sample   ^ pulse sample
//! ```
//!
//! The pre-pulse sample instant lies `sample_lead_ms` before the baseline ends
//! and the pulse sample instant on the tick that ends the pulse. The two
//! readings differ only by the faradaic response to the pulse.

use super::SampleFlagLatch;
use echem_common::consts::{CODE_MAX, VREF_VOLTS};
use echem_common::waveform::{DpvParams, SampleFlags, volts_per_code};

const Q16_ONE: f64 = 65_536.0;

#[inline]
fn volts_to_q16(volts: f32) -> i64 {
    // NaN saturates to 0 through `as`.
    (f64::from(volts) / f64::from(VREF_VOLTS) * f64::from(CODE_MAX) * Q16_ONE).round() as i64
}

/// Runtime state of a DPV staircase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DpvPulse {
    start_q: i64,
    step_q: i64,
    pulse_q: i64,
    steps: u32,
    period: u16,
    baseline: u16,
    pre_sample: u16,
    index: u32,
    phase: u16,
    finished: bool,
    code: u16,
}

impl DpvPulse {
    /// Precompute the staircase and reset to the first baseline level.
    ///
    /// The period is at least 2 ticks, the pulse occupies between 1 tick and
    /// `period - 1` ticks, and the pre-pulse instant is kept inside the
    /// baseline phase.
    pub fn new(params: &DpvParams) -> Self {
        let period = params.pulse_period_ms.max(2);
        let width = params.pulse_width_ms.clamp(1, period - 1);
        let baseline = period - width;
        let pre_sample = baseline.saturating_sub(params.sample_lead_ms).max(1);

        let step_volts = params.step_volt.abs().max(volts_per_code());
        let step_q = if params.end_volt < params.start_volt {
            -volts_to_q16(step_volts)
        } else {
            volts_to_q16(step_volts)
        };

        let mut dpv = Self {
            start_q: volts_to_q16(params.mid_volt + params.start_volt),
            step_q,
            pulse_q: volts_to_q16(params.pulse_amp),
            steps: params.step_count(),
            period,
            baseline,
            pre_sample,
            index: 0,
            phase: 0,
            finished: false,
            code: 0,
        };
        dpv.code = dpv.level(0, false);
        dpv
    }

    fn level(&self, index: u32, pulse: bool) -> u16 {
        let mut q = self.start_q + i64::from(index) * self.step_q;
        if pulse {
            q += self.pulse_q;
        }
        ((q + (1 << 15)) >> 16).clamp(0, i64::from(CODE_MAX)) as u16
    }

    /// Advance one 1 ms tick, raising sample flags at their instants.
    ///
    /// Returns `true` if the output code changed.
    pub fn advance(&mut self, flags: &SampleFlagLatch) -> bool {
        if self.finished {
            return false;
        }
        let before = self.code;
        self.phase += 1;

        if self.phase == self.pre_sample {
            flags.raise(SampleFlags::PRE_PULSE);
        }
        if self.phase == self.baseline {
            self.code = self.level(self.index, true);
        }
        if self.phase >= self.period {
            flags.raise(SampleFlags::PULSE);
            self.phase = 0;
            if self.index >= self.steps {
                self.finished = true;
                self.code = self.level(self.steps, false);
            } else {
                self.index += 1;
                self.code = self.level(self.index, false);
            }
        }
        self.code != before
    }

    /// Current output code.
    #[inline]
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Staircase index of the current step (`0..=step_count`).
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Number of staircase increments.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Ticks per staircase step.
    pub fn period_ticks(&self) -> u16 {
        self.period
    }

    /// Last level's pulse has ended.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Default for DpvPulse {
    fn default() -> Self {
        Self::new(&DpvParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use echem_common::waveform::volt_to_code;

    #[test]
    fn first_level_is_start_volt() {
        let dpv = DpvPulse::default();
        assert_eq!(dpv.code(), volt_to_code(1.65 - 0.5));
        assert_eq!(dpv.steps(), 200);
        assert_eq!(dpv.period_ticks(), 50);
    }

    #[test]
    fn one_step_has_pulse_then_next_level() {
        let flags = SampleFlagLatch::new();
        let mut dpv = DpvPulse::default();
        let base0 = dpv.code();

        let mut pre_at = None;
        let mut pulse_at = None;
        for tick in 1..=50u16 {
            dpv.advance(&flags);
            let f = flags.consume();
            if f.contains(SampleFlags::PRE_PULSE) {
                pre_at = Some(tick);
            }
            if f.contains(SampleFlags::PULSE) {
                pulse_at = Some(tick);
            }
            if tick == 40 {
                // baseline ends, pulse on
                assert!(dpv.code() > base0);
            }
        }
        assert_eq!(pre_at, Some(39));
        assert_eq!(pulse_at, Some(50));
        assert_eq!(dpv.index(), 1);
        assert!(dpv.code() > base0);
    }

    #[test]
    fn descending_staircase() {
        let params = DpvParams {
            start_volt: 0.5,
            end_volt: -0.5,
            ..Default::default()
        };
        let flags = SampleFlagLatch::new();
        let mut dpv = DpvPulse::new(&params);
        let first = dpv.code();
        for _ in 0..50 {
            dpv.advance(&flags);
        }
        assert!(dpv.code() < first);
    }

    #[test]
    fn holds_after_last_level() {
        let params = DpvParams {
            start_volt: 0.0,
            end_volt: 0.01,
            step_volt: 0.005,
            pulse_period_ms: 4,
            pulse_width_ms: 2,
            ..Default::default()
        };
        let flags = SampleFlagLatch::new();
        let mut dpv = DpvPulse::new(&params);
        assert_eq!(dpv.steps(), 2);

        for _ in 0..12 {
            dpv.advance(&flags);
        }
        assert!(dpv.is_finished());
        let held = dpv.code();
        flags.consume();

        for _ in 0..20 {
            assert!(!dpv.advance(&flags));
        }
        assert_eq!(dpv.code(), held);
        assert!(flags.consume().is_empty());
    }

    #[test]
    fn degenerate_timing_is_clamped() {
        let params = DpvParams {
            pulse_period_ms: 0,
            pulse_width_ms: 0,
            sample_lead_ms: 100,
            ..Default::default()
        };
        let dpv = DpvPulse::new(&params);
        assert_eq!(dpv.period, 2);
        assert_eq!(dpv.baseline, 1);
        assert_eq!(dpv.pre_sample, 1);
    }
}

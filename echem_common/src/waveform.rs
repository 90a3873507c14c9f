//! Waveform parameter types and the output encoding.
//!
//! Parameters are plain `Copy` values cached by the orchestrator and
//! handed to a channel on every start. All of them deserialize from TOML
//! with the compiled defaults filling missing fields.

use crate::consts::{CODE_MAX, MAX_TIMER_TICKS, TIMER_TICK_HZ, VREF_VOLTS};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Measurement technique selected for the Scan channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum RunMode {
    /// Cyclic voltammetry: triangular sweep.
    #[default]
    Cv = 0,
    /// Differential pulse voltammetry: staircase with pulses.
    Dpv = 1,
    /// Amperometric i-t: constant scan output.
    It = 2,
}

impl RunMode {
    /// Short upper-case label used in reports.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cv => "CV",
            Self::Dpv => "DPV",
            Self::It => "IT",
        }
    }

    /// Whether the mode needs the scan timer running.
    #[inline]
    pub const fn is_periodic(&self) -> bool {
        matches!(self, Self::Cv | Self::Dpv)
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cv" => Ok(Self::Cv),
            "dpv" => Ok(Self::Dpv),
            "it" => Ok(Self::It),
            other => Err(format!("unknown mode '{other}' (expected cv, dpv or it)")),
        }
    }
}

/// Initial sweep direction of a CV scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanDirection {
    /// Start at the low bound, ramp up first.
    #[default]
    Forward,
    /// Start at the high bound, ramp down first.
    Reverse,
}

/// CV potential window.
///
/// `high_volt` / `low_volt` are relative to `volt_offset`, which is the
/// absolute mid bias applied to the cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvVoltParams {
    /// Upper vertex relative to the offset [V].
    pub high_volt: f32,
    /// Lower vertex relative to the offset [V].
    pub low_volt: f32,
    /// Absolute mid bias [V].
    pub volt_offset: f32,
}

impl CvVoltParams {
    /// Build a window from relative vertices and an absolute offset.
    pub const fn new(high_volt: f32, low_volt: f32, volt_offset: f32) -> Self {
        Self {
            high_volt,
            low_volt,
            volt_offset,
        }
    }
}

impl Default for CvVoltParams {
    fn default() -> Self {
        Self::new(0.8, -0.8, 1.65)
    }
}

/// CV timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvParams {
    /// Timer interval between two steps [s].
    pub duration: f32,
    /// Scan rate [V/s].
    pub rate: f32,
    /// Initial direction.
    pub direction: ScanDirection,
}

impl CvParams {
    /// Build CV timing parameters.
    pub const fn new(duration: f32, rate: f32, direction: ScanDirection) -> Self {
        Self {
            duration,
            rate,
            direction,
        }
    }

    /// Potential change per step [V] (unsigned).
    #[inline]
    pub fn step_volts(&self) -> f32 {
        (self.rate * self.duration).abs()
    }
}

impl Default for CvParams {
    fn default() -> Self {
        Self::new(0.05, 0.05, ScanDirection::Forward)
    }
}

/// DPV staircase and pulse shape.
///
/// Potentials are relative to `mid_volt`; times are in DPV ticks (1 ms).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DpvParams {
    /// First staircase level [V].
    pub start_volt: f32,
    /// Last staircase level [V].
    pub end_volt: f32,
    /// Staircase increment magnitude [V].
    pub step_volt: f32,
    /// Pulse height added to the baseline [V].
    pub pulse_amp: f32,
    /// Length of one staircase step [ms].
    pub pulse_period_ms: u16,
    /// Length of the pulse at the end of each step [ms].
    pub pulse_width_ms: u16,
    /// Pre-pulse sample taken this long before the baseline ends [ms].
    pub sample_lead_ms: u16,
    /// Absolute mid bias [V].
    pub mid_volt: f32,
}

impl DpvParams {
    /// Staircase step count `(end - start) / step`, rounded, unsigned.
    ///
    /// A zero step is treated as one code LSB.
    pub fn step_count(&self) -> u32 {
        let step = self.step_volt.abs().max(volts_per_code());
        let steps = ((self.end_volt - self.start_volt) / step).abs().round();
        // NaN and overflow both saturate through `as`.
        (steps as u32).min(u16::MAX as u32)
    }
}

impl Default for DpvParams {
    fn default() -> Self {
        Self {
            start_volt: -0.5,
            end_volt: 0.5,
            step_volt: 0.005,
            pulse_amp: 0.05,
            pulse_period_ms: 50,
            pulse_width_ms: 10,
            sample_lead_ms: 1,
            mid_volt: 1.65,
        }
    }
}

bitflags! {
    /// DPV sample-ready marks, consumed by the foreground reporter.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SampleFlags: u8 {
        /// Pre-pulse (background) current ready to sample.
        const PRE_PULSE = 0x01;
        /// Pulse-response current ready to sample.
        const PULSE     = 0x02;
    }
}

/// Size of one code step in volts.
#[inline]
pub fn volts_per_code() -> f32 {
    VREF_VOLTS / CODE_MAX as f32
}

/// Linear voltage→code mapping over `[0, VREF]`, clamped to `[0, CODE_MAX]`.
///
/// NaN maps to code 0.
pub fn volt_to_code(volts: f32) -> u16 {
    let v = volts.clamp(0.0, VREF_VOLTS);
    if v.is_nan() {
        return 0;
    }
    let code = (v / VREF_VOLTS * CODE_MAX as f32 + 0.5) as u32;
    code.min(CODE_MAX as u32) as u16
}

/// Inverse of [`volt_to_code`] for display purposes.
pub fn code_to_volt(code: u16) -> f32 {
    code.min(CODE_MAX) as f32 * volts_per_code()
}

/// Convert a requested interval into timer base ticks.
///
/// `round(period × TIMER_TICK_HZ)`, clamped to `[1, MAX_TIMER_TICKS]`.
pub fn period_to_ticks(period_s: f32) -> u32 {
    // Negative and NaN saturate to 0 through `as`.
    let ticks = (period_s * TIMER_TICK_HZ as f32 + 0.5) as u32;
    ticks.clamp(1, MAX_TIMER_TICKS)
}

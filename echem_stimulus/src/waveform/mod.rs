//! Per-channel waveform engine.
//!
//! The engine produces the next output code once per timer tick. It is
//! written by interrupt context only; the foreground reads the published code
//! through the shared [`CodeMirror`] and drains DPV sample marks through the
//! [`SampleFlagLatch`]. Neither path takes a lock.

pub mod cv;
pub mod dpv;

pub use cv::CvScan;
pub use dpv::DpvPulse;

use echem_common::consts::{CODE_MAX, DPV_TICK_SECONDS};
use echem_common::hal::types::CodeMirror;
use echem_common::waveform::{CvParams, CvVoltParams, DpvParams, SampleFlags};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Active step algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GenMode {
    /// Fixed code, no progression.
    #[default]
    Constant,
    /// Triangular sweep.
    CvScan,
    /// Staircase with pulses.
    DpvPulse,
}

impl GenMode {
    /// Whether the mode needs a running timer.
    #[inline]
    pub const fn is_periodic(&self) -> bool {
        !matches!(self, Self::Constant)
    }
}

/// Single-producer / single-consumer sample mark byte.
///
/// The tick context sets bits with `fetch_or`; the foreground reads and clears
/// with one `swap`, so a bit set between a read and a clear cannot be lost.
#[derive(Debug, Default)]
pub struct SampleFlagLatch {
    bits: AtomicU8,
}

impl SampleFlagLatch {
    pub const fn new() -> Self {
        Self {
            bits: AtomicU8::new(0),
        }
    }

    /// Set marks (tick context).
    #[inline]
    pub fn raise(&self, flags: SampleFlags) {
        self.bits.fetch_or(flags.bits(), Ordering::Release);
    }

    /// Read and clear all marks atomically.
    #[inline]
    pub fn consume(&self) -> SampleFlags {
        SampleFlags::from_bits_truncate(self.bits.swap(0, Ordering::AcqRel))
    }

    /// Marks currently set, without clearing.
    #[inline]
    pub fn peek(&self) -> SampleFlags {
        SampleFlags::from_bits_truncate(self.bits.load(Ordering::Acquire))
    }
}

/// Read-only view of an engine for the boundary layer.
///
/// Cloneable and `Send`; holds no reference to the engine itself.
#[derive(Debug, Clone)]
pub struct ScanMonitor {
    mirror: Arc<CodeMirror>,
    flags: Arc<SampleFlagLatch>,
}

impl ScanMonitor {
    /// Latest published code, masked to 12 bits.
    #[inline]
    pub fn code(&self) -> u16 {
        self.mirror.load()
    }

    /// Read and clear the DPV sample marks.
    #[inline]
    pub fn consume_sample_flags(&self) -> SampleFlags {
        self.flags.consume()
    }
}

/// Waveform generator of one output channel.
#[derive(Debug)]
pub struct WaveformEngine {
    mode: GenMode,
    code: u16,
    constant: u16,
    cv: CvScan,
    dpv: DpvPulse,
    mirror: Arc<CodeMirror>,
    flags: Arc<SampleFlagLatch>,
}

impl WaveformEngine {
    /// Engine in `Constant` mode holding code 0.
    pub fn new() -> Self {
        Self {
            mode: GenMode::Constant,
            code: 0,
            constant: 0,
            cv: CvScan::default(),
            dpv: DpvPulse::default(),
            mirror: Arc::new(CodeMirror::new(0)),
            flags: Arc::new(SampleFlagLatch::new()),
        }
    }

    /// Reset CV state: bounds, start vertex and per-tick step.
    pub fn setup_cv(&mut self, volt: &CvVoltParams, params: &CvParams) {
        self.cv = CvScan::new(volt, params);
        self.reset_runtime(self.cv.code());
    }

    /// Reset DPV state to the first baseline level.
    pub fn setup_dpv(&mut self, params: &DpvParams) {
        self.dpv = DpvPulse::new(params);
        self.reset_runtime(self.dpv.code());
    }

    /// Fix the output at `code` (clamped to 12 bits).
    pub fn setup_constant(&mut self, code: u16) {
        self.constant = code.min(CODE_MAX);
        self.reset_runtime(self.constant);
    }

    fn reset_runtime(&mut self, code: u16) {
        self.code = code;
        self.mirror.store(code);
        self.flags.consume();
    }

    /// Select the step algorithm. State is not reset: call the matching
    /// `setup_*` first.
    #[inline]
    pub fn switch_mode(&mut self, mode: GenMode) {
        self.mode = mode;
    }

    /// Advance one tick. Returns `true` iff the output code changed.
    ///
    /// Interrupt context: bounded, no allocation, no logging.
    #[inline]
    pub fn update_next_step(&mut self) -> bool {
        let changed = match self.mode {
            GenMode::Constant => return false,
            GenMode::CvScan => self.cv.advance(),
            GenMode::DpvPulse => self.dpv.advance(&self.flags),
        };
        if changed {
            self.code = match self.mode {
                GenMode::CvScan => self.cv.code(),
                _ => self.dpv.code(),
            };
            self.mirror.store(self.code);
        }
        changed
    }

    /// Current output code.
    #[inline]
    pub fn current_data(&self) -> u16 {
        self.code
    }

    /// Location an autonomous transfer reads the code from.
    ///
    /// Kept current in every mode, whether or not a transfer is armed.
    pub fn mirror(&self) -> &Arc<CodeMirror> {
        &self.mirror
    }

    /// Read and clear the DPV sample marks.
    pub fn consume_sample_flags(&self) -> SampleFlags {
        self.flags.consume()
    }

    /// Active algorithm.
    pub fn mode(&self) -> GenMode {
        self.mode
    }

    /// Timer interval required by the active mode [s], `None` when constant.
    pub fn tick_period(&self) -> Option<f32> {
        match self.mode {
            GenMode::Constant => None,
            GenMode::CvScan => Some(self.cv.period()),
            GenMode::DpvPulse => Some(DPV_TICK_SECONDS),
        }
    }

    pub fn cv(&self) -> &CvScan {
        &self.cv
    }

    pub fn dpv(&self) -> &DpvPulse {
        &self.dpv
    }

    /// Handle for the boundary layer.
    pub fn monitor(&self) -> ScanMonitor {
        ScanMonitor {
            mirror: Arc::clone(&self.mirror),
            flags: Arc::clone(&self.flags),
        }
    }
}

impl Default for WaveformEngine {
    fn default() -> Self {
        Self::new()
    }
}

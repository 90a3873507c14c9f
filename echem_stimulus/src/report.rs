//! Periodic report line.
//!
//! One JSON object per line:
//!
//! ```text
//! {"Ms":1250,"Mode":"DPV","Uric":812,"Ascorbic":640,"Glucose":1502,"Code12":1431,"Mark":1}
//! ```
//!
//! `Ms` is time since start, the three readings are raw sampling counts,
//! `Code12` is the live Scan code and `Mark` the DPV sample marks consumed
//! since the previous line.

use echem_common::consts::CODE_MASK;
use echem_common::sampling::Readings;
use echem_common::waveform::{RunMode, SampleFlags};
use serde::{Deserialize, Serialize};

/// Snapshot written once per report interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLine {
    #[serde(rename = "Ms")]
    pub ms: u32,
    #[serde(rename = "Mode")]
    pub mode: String,
    #[serde(rename = "Uric")]
    pub uric: u16,
    #[serde(rename = "Ascorbic")]
    pub ascorbic: u16,
    #[serde(rename = "Glucose")]
    pub glucose: u16,
    #[serde(rename = "Code12")]
    pub code12: u16,
    #[serde(rename = "Mark")]
    pub mark: u8,
}

impl ReportLine {
    /// Assemble a line; `code` is masked to 12 bits.
    pub fn new(ms: u32, mode: RunMode, readings: &Readings, code: u16, mark: SampleFlags) -> Self {
        let [uric, ascorbic, glucose] = *readings;
        Self {
            ms,
            mode: mode.as_str().to_string(),
            uric,
            ascorbic,
            glucose,
            code12: code & CODE_MASK,
            mark: mark.bits(),
        }
    }

    /// Encode as a single JSON line (no trailing newline).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

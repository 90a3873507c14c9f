//! Application configuration (`stimulus.toml`).
//!
//! Every section is optional; missing fields take the compiled defaults.
//!
//! ```toml
//! [shared]
//! log_level = "info"
//! service_name = "echem-stimulus"
//!
//! [channels]
//! scan = { dac = "ch2", timer = "tim2" }
//! bias = { dac = "ch1" }
//!
//! [defaults]
//! mode = "cv"
//! scan_constant = 2048
//! bias_constant = 2048
//!
//! [defaults.cv]
//! high_volt = 0.8
//! low_volt = -0.8
//! volt_offset = 1.65
//! duration = 0.05
//! rate = 0.05
//! direction = "forward"
//!
//! [defaults.dpv]
//! start_volt = -0.5
//! end_volt = 0.5
//!
//! [report]
//! interval_ms = 50
//! ```

use crate::system::{DEFAULT_BIAS_BINDING, DEFAULT_SCAN_BINDING, SystemOrchestrator};
use echem_common::config::{ConfigError, ConfigLoader, SharedConfig};
use echem_common::consts::CODE_MID;
use echem_common::hal::driver::StimulusHal;
use echem_common::hal::types::ChannelBinding;
use echem_common::sampling::SamplingSubsystem;
use echem_common::waveform::{CvParams, CvVoltParams, DpvParams, RunMode, ScanDirection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root of `stimulus.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StimulusConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// DAC / timer bindings of the two roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    pub scan: ChannelBinding,
    pub bias: ChannelBinding,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            scan: DEFAULT_SCAN_BINDING,
            bias: DEFAULT_BIAS_BINDING,
        }
    }
}

/// CV section: window and timing in one table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvSection {
    pub high_volt: f32,
    pub low_volt: f32,
    pub volt_offset: f32,
    pub duration: f32,
    pub rate: f32,
    pub direction: ScanDirection,
}

impl CvSection {
    /// Split into the orchestrator's parameter pair.
    pub fn split(&self) -> (CvVoltParams, CvParams) {
        (
            CvVoltParams::new(self.high_volt, self.low_volt, self.volt_offset),
            CvParams::new(self.duration, self.rate, self.direction),
        )
    }
}

impl Default for CvSection {
    fn default() -> Self {
        let volt = CvVoltParams::default();
        let timing = CvParams::default();
        Self {
            high_volt: volt.high_volt,
            low_volt: volt.low_volt,
            volt_offset: volt.volt_offset,
            duration: timing.duration,
            rate: timing.rate,
            direction: timing.direction,
        }
    }
}

/// Parameters loaded into the orchestrator at boot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub mode: RunMode,
    pub scan_constant: u16,
    pub bias_constant: u16,
    pub cv: CvSection,
    pub dpv: DpvParams,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Cv,
            scan_constant: CODE_MID,
            bias_constant: CODE_MID,
            cv: CvSection::default(),
            dpv: DpvParams::default(),
        }
    }
}

/// Periodic report line settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Report period [ms].
    pub interval_ms: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { interval_ms: 50 }
    }
}

impl StimulusConfig {
    /// Semantic checks beyond what TOML parsing enforces.
    ///
    /// # Errors
    ///
    /// `ConfigError::ValidationError` naming the first failing rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.channels.scan.dac == self.channels.bias.dac {
            return Err(ConfigError::ValidationError(format!(
                "scan and bias share DAC channel {:?}",
                self.channels.scan.dac
            )));
        }
        if self.report.interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "report.interval_ms must be > 0".to_string(),
            ));
        }
        if self.defaults.mode.is_periodic() && self.channels.scan.timer.is_none() {
            return Err(ConfigError::ValidationError(format!(
                "mode {} needs a timer on the scan channel",
                self.defaults.mode
            )));
        }
        Ok(())
    }

    /// Push the boot defaults into an idle orchestrator.
    pub fn apply_defaults<H: StimulusHal, S: SamplingSubsystem>(
        &self,
        orchestrator: &mut SystemOrchestrator<H, S>,
    ) {
        let d = &self.defaults;
        let (volt, cv) = d.cv.split();
        orchestrator.set_mode(d.mode);
        orchestrator.set_cv_params(volt, cv);
        orchestrator.set_dpv_params(d.dpv);
        orchestrator.set_scan_constant(d.scan_constant);
        orchestrator.set_bias_constant(d.bias_constant);
    }
}

/// Parse and validate a configuration document.
pub fn load_config_from_str(content: &str) -> Result<StimulusConfig, ConfigError> {
    let config = StimulusConfig::load_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate `stimulus.toml`.
pub fn load_config(path: &Path) -> Result<StimulusConfig, ConfigError> {
    let config = StimulusConfig::load(path)?;
    config.validate()?;
    info!(
        "Config OK: {} (mode {}, scan {:?}, bias {:?})",
        path.display(),
        config.defaults.mode,
        config.channels.scan,
        config.channels.bias
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use echem_common::hal::types::{DacChannel, TimerId};

    #[test]
    fn empty_document_is_all_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.channels, ChannelsConfig::default());
        assert_eq!(config.defaults, DefaultsConfig::default());
        assert_eq!(config.report.interval_ms, 50);
        assert_eq!(config.shared.service_name, "echem-stimulus");
    }

    #[test]
    fn partial_sections_fill_in() {
        let config = load_config_from_str(
            r#"
[channels]
scan = { dac = "ch1", timer = "tim6" }
bias = { dac = "ch2" }

[defaults]
mode = "dpv"

[defaults.dpv]
pulse_width_ms = 20
"#,
        )
        .unwrap();
        assert_eq!(
            config.channels.scan,
            ChannelBinding::timed(DacChannel::Ch1, TimerId::Tim6)
        );
        assert_eq!(config.channels.bias.timer, None);
        assert_eq!(config.defaults.mode, RunMode::Dpv);
        assert_eq!(config.defaults.dpv.pulse_width_ms, 20);
        assert_eq!(config.defaults.dpv.pulse_period_ms, 50);
    }

    #[test]
    fn shared_dac_is_rejected() {
        let err = load_config_from_str(
            r#"
[channels]
scan = { dac = "ch1", timer = "tim2" }
bias = { dac = "ch1" }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn periodic_mode_needs_scan_timer() {
        let doc = r#"
[channels]
scan = { dac = "ch2" }
"#;
        assert!(load_config_from_str(doc).is_err());

        let it = format!("{doc}\n[defaults]\nmode = \"it\"\n");
        assert!(load_config_from_str(&it).is_ok());
    }

    #[test]
    fn zero_report_interval_is_rejected() {
        assert!(load_config_from_str("[report]\ninterval_ms = 0").is_err());
    }

    #[test]
    fn unknown_timer_is_a_parse_error() {
        let err = load_config_from_str("[channels]\nscan = { dac = \"ch2\", timer = \"tim9\" }")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}

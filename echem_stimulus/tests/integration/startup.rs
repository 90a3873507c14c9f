//! Integration test: configuration file → boot defaults → first output.

use super::default_system;
use echem_common::config::ConfigError;
use echem_common::hal::types::{DacChannel, DacTrigger, DmaChannel, IrqEvent, TimerId};
use echem_common::state::RunState;
use echem_common::waveform::RunMode;
use echem_hal::drivers::simulation::HalOp;
use echem_stimulus::channel::Delivery;
use echem_stimulus::config::load_config;
use echem_stimulus::sim::SimulationBoard;
use echem_stimulus::system::ChannelRole;
use std::io::Write;
use tempfile::NamedTempFile;

const STIMULUS_TOML: &str = r#"
[shared]
log_level = "debug"
service_name = "bench-cell-3"

[channels]
scan = { dac = "ch2", timer = "tim2" }
bias = { dac = "ch1" }

[defaults]
mode = "dpv"
bias_constant = 1800

[defaults.dpv]
start_volt = -0.2
end_volt = 0.2
step_volt = 0.01
pulse_period_ms = 20
pulse_width_ms = 5

[report]
interval_ms = 20
"#;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn config_file_drives_boot_defaults() {
    let file = write_config(STIMULUS_TOML);
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.shared.service_name, "bench-cell-3");
    assert_eq!(config.report.interval_ms, 20);

    let board = SimulationBoard::new(&config);
    let system = board.system();
    assert_eq!(system.state(), RunState::Idle);
    assert_eq!(system.mode(), RunMode::Dpv);
    assert_eq!(system.constant(ChannelRole::Bias), 1800);
    assert_eq!(system.dpv_params().pulse_period_ms, 20);
    assert_eq!(system.dpv_params().step_count(), 40);
}

#[test]
fn missing_config_file_is_reported() {
    let err = load_config(std::path::Path::new("/nonexistent/stimulus.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound));
}

#[test]
fn invalid_config_file_is_rejected() {
    let file = write_config("[channels]\nscan = { dac = \"ch1\", timer = \"tim2\" }\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn cv_start_brings_up_push_path() {
    let mut system = default_system();
    system.start();

    let hal = system.hal();
    let setup = hal.dac_setup(DacChannel::Ch2).unwrap();
    assert_eq!(setup.trigger, DacTrigger::TimerTrgo(TimerId::Tim2));
    assert!(setup.dma_requests);
    assert!(hal.armed_transfer(DmaChannel::new(1, 2)).is_some());
    assert_eq!(hal.timer_config(TimerId::Tim2).map(|c| c.ticks()), Some(500));
    assert!(hal.timer_enabled(TimerId::Tim2));
    assert!(hal.timer_irq_enabled(TimerId::Tim2));
    assert!(hal.is_analog(DacChannel::Ch1));
    assert!(hal.is_analog(DacChannel::Ch2));

    assert_eq!(system.scan().delivery(), Delivery::Push);
    assert_eq!(hal.dac_output(DacChannel::Ch2), Some(1055));
    assert_eq!(hal.dac_output(DacChannel::Ch1), Some(2048));
    assert!(system.sampler().is_converting());
}

#[test]
fn handler_registered_before_timer_runs() {
    let mut system = default_system();
    system.start();

    let ops = system.hal().journal();
    let enable = ops
        .iter()
        .position(|op| *op == HalOp::TimerEnable(TimerId::Tim2, true))
        .unwrap();
    // The orchestrator acknowledges stale events right after registering,
    // before any channel touches the hardware.
    assert_eq!(ops.first(), Some(&HalOp::TimerClearPending(TimerId::Tim2)));
    assert!(enable > 0);
    assert!(system.irq_registry().lookup(TimerId::Tim2, IrqEvent::Update).is_some());

    // Channel prime plus the orchestrator's extra prime.
    let primes = ops
        .iter()
        .filter(|op| **op == HalOp::TimerGenerateUpdate(TimerId::Tim2))
        .count();
    assert_eq!(primes, 2);
    assert_eq!(ops.last(), Some(&HalOp::TimerGenerateUpdate(TimerId::Tim2)));
}

#[test]
fn dpv_start_uses_software_trigger() {
    let mut system = default_system();
    system.set_mode(RunMode::Dpv);
    system.start();

    let hal = system.hal();
    assert_eq!(
        hal.dac_setup(DacChannel::Ch2).map(|s| s.trigger),
        Some(DacTrigger::Software)
    );
    assert!(hal.armed_transfer(DmaChannel::new(1, 2)).is_none());
    assert_eq!(hal.timer_config(TimerId::Tim2).map(|c| c.ticks()), Some(10));
    assert_eq!(hal.dac_output(DacChannel::Ch2), Some(system.scan_code()));
}

#[test]
fn it_start_writes_constant_immediately() {
    let mut system = default_system();
    system.set_mode(RunMode::It);
    system.set_scan_constant(2048);
    system.start();

    assert_eq!(system.scan().current_data(), 2048);
    assert_eq!(system.hal().dac_output(DacChannel::Ch2), Some(2048));
    assert!(system.hal().timer_config(TimerId::Tim2).is_none());
}

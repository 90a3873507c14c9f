//! Integration test: run-state control and stop/start reproducibility.

use super::default_system;
use echem_common::hal::types::{DacChannel, IrqEvent, TimerId};
use echem_common::state::RunState;
use echem_common::waveform::{DpvParams, RunMode};
use echem_stimulus::config::StimulusConfig;
use echem_stimulus::sim::SimulationBoard;
use echem_stimulus::state::machine::TransitionResult;

#[test]
fn pause_twice_changes_nothing() {
    let mut system = default_system();
    system.start();

    assert_eq!(system.pause(), TransitionResult::Ok(RunState::Paused));
    assert!(!system.hal().timer_enabled(TimerId::Tim2));
    assert!(system.sampler().is_paused());

    system.hal_mut().clear_journal();
    assert!(!system.pause().is_ok());
    assert!(system.hal().journal().is_empty());
    assert_eq!(system.sampler().pauses(), 1);
}

#[test]
fn resume_twice_changes_nothing() {
    let mut system = default_system();
    system.start();
    system.pause();

    assert_eq!(system.resume(), TransitionResult::Ok(RunState::Running));
    assert!(system.hal().timer_enabled(TimerId::Tim2));
    assert!(system.sampler().is_converting());

    system.hal_mut().clear_journal();
    assert!(!system.resume().is_ok());
    assert!(system.hal().journal().is_empty());
    assert_eq!(system.sampler().resumes(), 1);
}

#[test]
fn paused_output_is_frozen() {
    let mut board = SimulationBoard::new(&StimulusConfig::default());
    board.system_mut().start();
    board.run_ms(500);

    board.system_mut().pause();
    let frozen_code = board.system().scan_code();
    let frozen_output = board.system().hal().dac_output(DacChannel::Ch2);
    assert_eq!(board.run_ms(1000), 0);
    assert_eq!(board.system().scan_code(), frozen_code);
    assert_eq!(board.system().hal().dac_output(DacChannel::Ch2), frozen_output);

    board.system_mut().resume();
    board.run_ms(100);
    assert_ne!(board.system().scan_code(), frozen_code);
}

#[test]
fn stop_disarms_everything() {
    let mut board = SimulationBoard::new(&StimulusConfig::default());
    board.system_mut().start();
    board.run_ms(120);

    assert_eq!(
        board.system_mut().stop(),
        TransitionResult::Ok(RunState::Idle)
    );
    let hal = board.system().hal();
    assert!(!hal.timer_enabled(TimerId::Tim2));
    assert!(!hal.timer_pending(TimerId::Tim2));
    assert_eq!(hal.dac_output(DacChannel::Ch1), None);
    assert_eq!(hal.dac_output(DacChannel::Ch2), None);

    let code = board.system().scan_code();
    assert_eq!(board.run_ms(200), 0);
    assert_eq!(board.system().scan_code(), code);
}

#[test]
fn stop_from_paused_returns_to_idle() {
    let mut system = default_system();
    system.start();
    system.pause();
    assert_eq!(system.stop(), TransitionResult::Ok(RunState::Idle));
    assert!(system.set_mode(RunMode::It));
}

#[test]
fn restart_reproduces_trajectory() {
    for mode in [RunMode::Cv, RunMode::Dpv] {
        let mut system = default_system();
        system.set_mode(mode);
        system.set_dpv_params(DpvParams {
            pulse_period_ms: 10,
            pulse_width_ms: 3,
            ..Default::default()
        });

        let record = |system: &mut super::TestSystem| {
            system.start();
            let first = system.scan_code();
            let codes: Vec<u16> = (0..750)
                .map(|_| {
                    system.handle_interrupt(TimerId::Tim2, IrqEvent::Update);
                    system.scan_code()
                })
                .collect();
            let marks = system.consume_sample_flags();
            system.stop();
            (first, codes, marks)
        };

        let first_run = record(&mut system);
        let second_run = record(&mut system);
        assert_eq!(first_run, second_run, "{mode} trajectory differs after restart");
    }
}

#[test]
fn start_while_running_is_ignored() {
    let mut system = default_system();
    system.start();
    system.hal_mut().clear_journal();
    assert_eq!(
        system.start(),
        TransitionResult::Rejected("Running: already started")
    );
    assert!(system.hal().journal().is_empty());
    assert_eq!(system.sampler().starts(), 1);
}

#[test]
fn display_ticks_follow_run_state() {
    let mut system = default_system();
    system.start();
    for _ in 0..5 {
        system.update_tick();
    }
    system.pause();
    system.update_tick();
    system.resume();
    system.update_tick();
    assert_eq!(system.tick_count(), 6);

    system.stop();
    system.start();
    assert_eq!(system.tick_count(), 0);
}

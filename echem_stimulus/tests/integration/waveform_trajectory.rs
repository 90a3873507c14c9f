//! Integration test: waveform trajectories observed through the boundary layer.

use super::{TestSystem, default_system};
use echem_common::consts::CODE_MAX;
use echem_common::hal::types::{ChannelBinding, DacChannel, IrqEvent, TimerId};
use echem_common::waveform::{
    CvParams, CvVoltParams, DpvParams, RunMode, SampleFlags, ScanDirection,
};
use echem_hal::drivers::simulation::SimulatedHal;
use echem_stimulus::channel::ChannelController;
use echem_stimulus::config::StimulusConfig;
use echem_stimulus::sim::SimulationBoard;

const LOW: u16 = 1055;
const HIGH: u16 = 3040;

/// Dispatch `n` scan ticks and record the published code after each.
fn trace(system: &mut TestSystem, n: usize) -> Vec<u16> {
    (0..n)
        .map(|_| {
            assert!(system.handle_interrupt(TimerId::Tim2, IrqEvent::Update));
            system.scan_code()
        })
        .collect()
}

fn cv_system(direction: ScanDirection) -> TestSystem {
    let mut system = default_system();
    system.set_cv_params(
        CvVoltParams::new(0.8, -0.8, 1.65),
        CvParams::new(0.05, 0.05, direction),
    );
    system.start();
    system
}

#[test]
fn cv_forward_is_a_triangle_between_bounds() {
    let mut system = cv_system(ScanDirection::Forward);
    assert_eq!(system.scan_code(), LOW);

    let codes = trace(&mut system, 3000);
    assert!(codes.iter().all(|&c| (LOW..=HIGH).contains(&c) && c <= CODE_MAX));

    // Direction changes happen only at the bounds.
    let mut rising = true;
    let mut prev = LOW;
    let mut reversals = Vec::new();
    for &code in &codes {
        if rising {
            assert!(code >= prev, "rising sweep went down at {code}");
        } else {
            assert!(code <= prev, "falling sweep went up at {code}");
        }
        if code == HIGH && rising {
            rising = false;
            reversals.push(code);
        } else if code == LOW && !rising {
            rising = true;
            reversals.push(code);
        }
        prev = code;
    }
    assert_eq!(&reversals[..3], &[HIGH, LOW, HIGH]);
}

#[test]
fn cv_reverse_starts_high_and_falls() {
    let mut system = cv_system(ScanDirection::Reverse);
    assert_eq!(system.scan_code(), HIGH);

    let codes = trace(&mut system, 700);
    let bottom = codes.iter().position(|&c| c == LOW).unwrap();
    assert!(codes[..bottom].windows(2).all(|w| w[1] <= w[0]));
    assert!(codes[bottom + 1] > LOW);
}

#[test]
fn cv_step_is_about_three_codes() {
    let mut system = cv_system(ScanDirection::Forward);
    let codes = trace(&mut system, 10);
    // 0.0025 V per tick ≈ 3.10 codes
    assert_eq!(codes[9], LOW + 31);
}

#[test]
fn dpv_every_step_raises_two_marks() {
    let mut system = default_system();
    system.set_mode(RunMode::Dpv);
    system.start();
    assert!(system.consume_sample_flags().is_empty());

    let period = DpvParams::default().pulse_period_ms as usize;
    for step in 0..20 {
        let mut rises = Vec::new();
        for tick in 0..period {
            assert!(system.handle_interrupt(TimerId::Tim2, IrqEvent::Update));
            let marks = system.consume_sample_flags();
            if !marks.is_empty() {
                rises.push((tick, marks));
            }
        }
        assert_eq!(
            rises,
            vec![
                (period - 12, SampleFlags::PRE_PULSE),
                (period - 1, SampleFlags::PULSE)
            ],
            "step {step}"
        );
    }
}

#[test]
fn consume_twice_returns_empty() {
    let mut system = default_system();
    system.set_mode(RunMode::Dpv);
    system.start();

    let monitor = system.scan_monitor();
    for _ in 0..50 {
        system.handle_interrupt(TimerId::Tim2, IrqEvent::Update);
    }
    assert_eq!(
        monitor.consume_sample_flags(),
        SampleFlags::PRE_PULSE | SampleFlags::PULSE
    );
    assert!(monitor.consume_sample_flags().is_empty());
    assert!(system.consume_sample_flags().is_empty());
}

#[test]
fn dpv_pulse_sits_on_staircase() {
    let mut system = default_system();
    system.set_mode(RunMode::Dpv);
    system.start();
    let base0 = system.scan_code();

    let codes = trace(&mut system, 100);
    // Baseline of step 0 up to tick 39, pulse on ticks 40..=49.
    assert!(codes[..39].iter().all(|&c| c == base0));
    let pulse0 = codes[39];
    assert!(pulse0 > base0 + 50);
    assert!(codes[39..49].iter().all(|&c| c == pulse0));
    // Step 1 baseline one increment above step 0.
    let base1 = codes[49];
    assert!(base1 > base0 && base1 < base0 + 10);
    assert!(codes[89] > pulse0);
}

#[test]
fn constant_channel_never_moves() {
    let mut hal = SimulatedHal::new();
    let mut channel =
        ChannelController::new(&ChannelBinding::timed(DacChannel::Ch2, TimerId::Tim2));
    channel.init_as_constant(2048);
    channel.start(&mut hal);
    assert_eq!(channel.current_data(), 2048);

    for _ in 0..10_000 {
        channel.tim_irq_handler(&mut hal);
    }
    assert_eq!(channel.current_data(), 2048);
    assert_eq!(hal.dac_output(DacChannel::Ch2), Some(2048));
}

#[test]
fn push_output_follows_mirror_one_update_late() {
    let mut board = SimulationBoard::new(&StimulusConfig::default());
    board.system_mut().start();

    // Priming interrupt advances the engine once; the DAC still holds LOW.
    board.step();
    let after_prime = board.system().scan_code();
    assert!(after_prime > LOW);
    assert_eq!(board.system().hal().dac_output(DacChannel::Ch2), Some(LOW));

    // Next real update transfers the advanced code.
    board.run_ticks(499);
    assert_eq!(
        board.system().hal().dac_output(DacChannel::Ch2),
        Some(after_prime)
    );
}

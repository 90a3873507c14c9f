//! Static timer → DMA channel / DAC trigger lookup.
//!
//! The table is immutable and queried by value once per channel
//! construction. A miss is not an error: the channel falls back to
//! software triggering without a transfer channel.

use echem_common::hal::types::{
    ChannelBinding, DacChannel, DacTrigger, DmaChannel, TIMER_COUNT, TimerEventSource, TimerId,
};
use static_assertions::const_assert;
use tracing::{debug, warn};

/// Resources hanging off one timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerResources {
    /// Timer identity.
    pub timer: TimerId,
    /// DMA channel serving the timer's update request.
    pub dma: DmaChannel,
    /// DAC trigger selecting the timer's trigger output.
    pub trigger: DacTrigger,
}

impl TimerResources {
    const fn new(timer: TimerId, controller: u8, channel: u8) -> Self {
        Self {
            timer,
            dma: DmaChannel::new(controller, channel),
            trigger: DacTrigger::TimerTrgo(timer),
        }
    }
}

/// Number of timers with a DAC trigger route.
pub const TIMER_ROUTE_COUNT: usize = 6;

/// Timer routes usable for paced DAC output.
///
/// TIM1 and TIM8 have no DAC trigger route and are absent.
pub static TIMER_RESOURCES: [TimerResources; TIMER_ROUTE_COUNT] = [
    TimerResources::new(TimerId::Tim2, 1, 2),
    TimerResources::new(TimerId::Tim3, 1, 3),
    TimerResources::new(TimerId::Tim4, 1, 7),
    TimerResources::new(TimerId::Tim5, 2, 2),
    TimerResources::new(TimerId::Tim6, 1, 3),
    TimerResources::new(TimerId::Tim7, 2, 4),
];

const_assert!(TIMER_ROUTE_COUNT < TIMER_COUNT);

/// Look up the resources of a timer.
pub fn lookup(timer: TimerId) -> Option<&'static TimerResources> {
    TIMER_RESOURCES.iter().find(|r| r.timer == timer)
}

/// Hardware owned by one channel controller, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedHardware {
    /// Output channel.
    pub output: DacChannel,
    /// Pacing timer.
    pub timer: Option<TimerId>,
    /// Transfer channel for push delivery.
    pub dma: Option<DmaChannel>,
    /// Hardware trigger for push delivery (`Software` when unresolved).
    pub trigger: DacTrigger,
    /// Timer event feeding the trigger output and DMA request.
    pub event_source: TimerEventSource,
}

impl ResolvedHardware {
    /// Resolve a binding against [`TIMER_RESOURCES`].
    pub fn resolve(binding: &ChannelBinding) -> Self {
        let mut hw = Self {
            output: binding.dac,
            timer: binding.timer,
            dma: None,
            trigger: DacTrigger::Software,
            event_source: TimerEventSource::Update,
        };

        let Some(timer) = binding.timer else {
            debug!("{:?}: no timer, software trigger only", binding.dac);
            return hw;
        };

        match lookup(timer) {
            Some(res) => {
                hw.dma = Some(res.dma);
                hw.trigger = res.trigger;
                debug!(
                    "{:?}: {} → {} / {:?}",
                    binding.dac, timer, res.dma, res.trigger
                );
            }
            None => {
                warn!(
                    "{:?}: {} has no DAC trigger route, falling back to software trigger",
                    binding.dac, timer
                );
            }
        }
        hw
    }

    /// Both a transfer channel and a hardware trigger are available.
    #[inline]
    pub const fn supports_push(&self) -> bool {
        self.dma.is_some() && !matches!(self.trigger, DacTrigger::Software)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tim2_resolves_to_dma1_ch2() {
        let hw = ResolvedHardware::resolve(&ChannelBinding::timed(DacChannel::Ch2, TimerId::Tim2));
        assert_eq!(hw.output, DacChannel::Ch2);
        assert_eq!(hw.timer, Some(TimerId::Tim2));
        assert_eq!(hw.dma, Some(DmaChannel::new(1, 2)));
        assert_eq!(hw.trigger, DacTrigger::TimerTrgo(TimerId::Tim2));
        assert!(hw.supports_push());
    }

    #[test]
    fn every_entry_is_its_own_trigger() {
        for res in &TIMER_RESOURCES {
            assert_eq!(res.trigger, DacTrigger::TimerTrgo(res.timer));
            assert_eq!(lookup(res.timer), Some(res));
        }
    }

    #[test]
    fn no_timer_is_software_only() {
        let hw = ResolvedHardware::resolve(&ChannelBinding::untimed(DacChannel::Ch1));
        assert_eq!(hw.timer, None);
        assert_eq!(hw.dma, None);
        assert_eq!(hw.trigger, DacTrigger::Software);
        assert!(!hw.supports_push());
    }

    #[test]
    fn unmapped_timer_falls_back() {
        let hw = ResolvedHardware::resolve(&ChannelBinding::timed(DacChannel::Ch2, TimerId::Tim8));
        assert_eq!(hw.timer, Some(TimerId::Tim8));
        assert_eq!(hw.dma, None);
        assert_eq!(hw.trigger, DacTrigger::Software);
        assert!(!hw.supports_push());
    }

    #[test]
    fn tim3_and_tim6_share_a_dma_channel() {
        assert_eq!(
            lookup(TimerId::Tim3).map(|r| r.dma),
            lookup(TimerId::Tim6).map(|r| r.dma)
        );
    }
}

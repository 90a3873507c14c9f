mod run_state;
mod startup;
mod waveform_trajectory;

use echem_hal::drivers::simulation::{SimulatedHal, SimulatedSampler};
use echem_stimulus::system::SystemOrchestrator;

pub type TestSystem = SystemOrchestrator<SimulatedHal, SimulatedSampler>;

pub fn default_system() -> TestSystem {
    SystemOrchestrator::with_default_bindings(SimulatedHal::new(), SimulatedSampler::new())
}

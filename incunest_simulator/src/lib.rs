//! Headless incubator visualization shell and simulation harness.

pub mod harness;
pub mod readout;
pub mod shell;
pub mod wokwi;

pub use harness::{HarnessError, RunOptions, RunSummary, ScheduledAction, run};
pub use readout::Readouts;
pub use shell::{DoorAnimator, UserAction, VisualizationShell};

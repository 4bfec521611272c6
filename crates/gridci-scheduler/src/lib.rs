//! Trigger evaluation and run coordination for gridci.

pub mod coordinator;
pub mod matrix;
pub mod triggers;

pub use coordinator::RunCoordinator;
pub use matrix::JobExpander;
pub use triggers::TriggerEvaluator;

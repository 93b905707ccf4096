//! Work items, workers, and the assignment audit trail.

pub mod manual;
pub mod model;

pub use manual::{ManualAssignment, manual_assign};
pub use model::{AssignmentDecisionRecord, DecisionStatus, Priority, WorkItem, WorkStatus, Worker};

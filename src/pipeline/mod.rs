//! Task assignment pipeline.
//!
//! Every run flows through five stages, in order:
//! 1. `extractor::extract()`: task text → features (backend, else tokenization)
//! 2. `matcher::rank()`: skill overlap and keyword hits against the pool
//! 3. `workload::adjust()`: availability-weighted re-ranking
//! 4. `scorer::score()`: per-candidate confidence (backend, else heuristic)
//! 5. `DecisionEngine::decide()`: commit, recommend, or record no candidates
//!
//! Stages 1-4 never fail. Only the commit in stage 5 can abort a run.

pub mod decision;
pub mod extractor;
pub mod matcher;
pub mod orchestrator;
pub mod scorer;
pub mod types;
pub mod workload;

pub use orchestrator::AssignmentPipeline;

//! Stages and the orchestrator that applies them to a run's records.
//!
//! A stage is one [`StageKind`](crate::samples::StageKind) performed by one
//! external [`Tool`]. Stages run in whatever order the caller asks for, as
//! long as the [`Plan`] is valid.

pub mod command;
pub mod descriptor;
pub mod naming;
pub mod orchestrator;
pub mod step;
pub mod tools;

pub use descriptor::DataKind;
pub use descriptor::Plan;
pub use orchestrator::Orchestrator;
pub use orchestrator::RunContext;
pub use step::Step;
pub use step::Task;
pub use tools::Tool;
pub use tools::ToolParams;
pub use tools::ToolSpec;

//! Content-production pipeline for CopyForge.
//!
//! A fixed sequence of stages (analyse the request, dispatch the brief,
//! research, draft, revise, finalise) runs over a shared [`PipelineContext`].
//! [`ContentCrew`] adds the formatting pass that turns the last stage's text
//! into the published document.

pub mod author;
pub mod checkpoint;
pub mod context;
pub mod crew;
pub mod evaluation;
pub mod pipeline;
pub mod stage;
pub mod training;

pub use author::{LlmAuthor, StageAuthor, StagePrompt};
pub use checkpoint::CheckpointStore;
pub use context::{ContentBrief, PipelineContext, StageOutput, ToolUsage};
pub use crew::{ContentCrew, CrewOutput};
pub use evaluation::{EvaluationReport, Evaluator, IterationScore, evaluate, parse_score};
pub use pipeline::StagePipeline;
pub use stage::{AgentRole, Capability, StageDescriptor, default_stages, resolve_stage};
pub use training::{TrainingReport, TrainingRun, train};

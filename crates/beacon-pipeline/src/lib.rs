//! Pipeline orchestrator (spec §4.10, C10): the ordered daily run over
//! crawl + domain processors, plus index generation (spec §4.10 stage 7).

pub mod index;
pub mod orchestrator;
pub mod stage;

pub use index::{generate_index, IndexDocument};
pub use orchestrator::Pipeline;
pub use stage::{overall_status, timed_stage, PipelineStatus, StageRecord, StageStatus};

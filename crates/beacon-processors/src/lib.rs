//! Domain processors (spec §4.11): the analytical pipeline stages that
//! turn raw crawled artifacts into the per-dimension feeds consumers
//! read. Each processor is independently runnable (the CLI's
//! `process-<module>` subcommands) and independently idempotent via its
//! own [`hash_tracker::HashTracker`].

pub mod briefing;
pub mod extraction;
pub mod hash_tracker;
pub mod oracle;
pub mod output;
pub mod personnel;
pub mod policy;
pub mod tech;
pub mod types;
pub mod university;

pub use briefing::BriefingProcessor;
pub use oracle::{MockOracle, NullOracle, OracleRequest, OracleResponse, OracleTask, TextAnalysisOracle};
pub use personnel::PersonnelProcessor;
pub use policy::PolicyProcessor;
pub use tech::TechProcessor;
pub use types::{Importance, ProcessSummary};
pub use university::UniversityProcessor;

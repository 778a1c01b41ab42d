//! `Pipeline::run_daily` (spec §4.10, C10): the ordered 8-stage daily run.
//! Each stage is wrapped by [`crate::stage::timed_stage`] so a failure in
//! one stage never cancels the rest (spec §4.10 "the orchestrator
//! continues past failed stages by default"). Modeled on
//! `riptide-workers`' job-runner shape: a struct holding the already-
//! constructed collaborators, one method per stage, a final summary
//! record written to disk.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, instrument};

use beacon_config::RuntimeConfig;
use beacon_processors::{
    BriefingProcessor, NullOracle, PersonnelProcessor, PolicyProcessor, TechProcessor,
    TextAnalysisOracle, UniversityProcessor,
};
use beacon_scheduler::Scheduler;
use beacon_storage::atomic::write_json_atomic;
use beacon_storage::paths::{pipeline_status_path, processed_path};
use beacon_storage::SourceStateStore;
use beacon_types::CrawlStatus;

use crate::index::generate_index;
use crate::stage::{timed_stage, PipelineStatus, StageRecord, StageStatus};

/// Collaborators the orchestrator drives through one daily run. Built once
/// at process start and reused across runs (the admin CLI's
/// `generate-index`/`process-<module>` subcommands build these same
/// processors directly rather than going through `Pipeline`, since each
/// is independently runnable per spec §4.11).
pub struct Pipeline {
    data_root: PathBuf,
    scheduler: Arc<Scheduler>,
    states: Arc<SourceStateStore>,
    oracle: Arc<dyn TextAnalysisOracle>,
    oracle_enabled: bool,
}

impl Pipeline {
    pub fn new(
        data_root: impl Into<PathBuf>,
        scheduler: Arc<Scheduler>,
        states: Arc<SourceStateStore>,
        oracle: Arc<dyn TextAnalysisOracle>,
        oracle_enabled: bool,
    ) -> Self {
        Self {
            data_root: data_root.into(),
            scheduler,
            states,
            oracle,
            oracle_enabled,
        }
    }

    /// The common case: oracle gating taken straight from
    /// `RuntimeConfig::oracle_enabled()` (spec §4.10 stage 6 "gated by
    /// `ENABLE_LLM_ENRICHMENT=true` AND availability of an
    /// `ORACLE_API_KEY`"), with `NullOracle` standing in when it's off.
    pub fn with_runtime_config(
        data_root: impl Into<PathBuf>,
        scheduler: Arc<Scheduler>,
        states: Arc<SourceStateStore>,
        runtime: &RuntimeConfig,
    ) -> Self {
        Self::new(data_root, scheduler, states, Arc::new(NullOracle), runtime.oracle_enabled())
    }

    pub fn policy_processor(&self) -> PolicyProcessor {
        PolicyProcessor::new(self.data_root.as_path(), Arc::clone(&self.oracle), self.oracle_enabled)
    }

    pub fn personnel_processor(&self) -> PersonnelProcessor {
        PersonnelProcessor::new(self.data_root.as_path(), Arc::clone(&self.oracle), self.oracle_enabled)
    }

    pub fn university_processor(&self) -> UniversityProcessor {
        UniversityProcessor::new(self.data_root.as_path())
    }

    pub fn tech_processor(&self) -> TechProcessor {
        TechProcessor::new(self.data_root.as_path(), Arc::clone(&self.oracle), self.oracle_enabled)
    }

    pub fn briefing_processor(&self) -> BriefingProcessor {
        BriefingProcessor::new(self.data_root.as_path(), Arc::clone(&self.oracle), self.oracle_enabled)
    }

    /// Any output a briefing could summarize (spec §4.10 stage 8 "depends
    /// on stages 2-5 producing any output, else skipped").
    fn any_feed_output_exists(&self) -> bool {
        [
            processed_path(&self.data_root, "policy", "feed.json"),
            processed_path(&self.data_root, "personnel", "feed.json"),
            processed_path(&self.data_root, "university", "feed.json"),
            processed_path(&self.data_root, "tech", "topics.json"),
        ]
        .iter()
        .any(|p| p.exists())
    }

    #[instrument(skip(self))]
    pub async fn run_daily(&self) -> PipelineStatus {
        let mut stages = Vec::with_capacity(8);

        let (record, _) = timed_stage("crawl_all_sources", || async {
            let results = self.scheduler.crawl_all().await;
            let failed = results
                .iter()
                .filter(|(_, result)| matches!(result, Some(r) if r.status == CrawlStatus::Failed))
                .count();
            if failed > 0 && failed == results.len() {
                Err(format!("all {failed} source(s) failed during crawl"))
            } else {
                Ok(results.len())
            }
        })
        .await;
        stages.push(record);

        let (record, _) = timed_stage("policy_processing", || async {
            self.policy_processor().process(false, false).await.map_err(|e| e.to_string())
        })
        .await;
        stages.push(record);

        let (record, _) = timed_stage("personnel_extraction", || async {
            self.personnel_processor().process(false, false).await.map_err(|e| e.to_string())
        })
        .await;
        stages.push(record);

        let (record, _) = timed_stage("university_ecosystem_classification", || async {
            self.university_processor().process(false, false).await.map_err(|e| e.to_string())
        })
        .await;
        stages.push(record);

        let (record, _) = timed_stage("tech_frontier_topic_binning", || async {
            self.tech_processor().process(false, false).await.map_err(|e| e.to_string())
        })
        .await;
        stages.push(record);

        // Stage 6 is bookkeeping only: every processor above already folds
        // its own Tier-2 oracle pass in behind `oracle_enabled`, so there is
        // nothing further to invoke here — just record whether the gate
        // was open for this run (spec §4.10 stage 6).
        stages.push(if self.oracle_enabled {
            StageRecord {
                name: "oracle_enrichment",
                status: StageStatus::Success,
                duration_seconds: 0.0,
                error: None,
            }
        } else {
            StageRecord::skipped("oracle_enrichment")
        });

        let (record, _) = timed_stage("index_generation", || async {
            generate_index(&self.data_root, &self.states, self.scheduler.sources().len())
                .await
                .map_err(|e| e.to_string())
        })
        .await;
        stages.push(record);

        if self.any_feed_output_exists() {
            let (record, _) = timed_stage("daily_briefing", || async {
                self.briefing_processor().process(false, false).await.map_err(|e| e.to_string())
            })
            .await;
            stages.push(record);
        } else {
            stages.push(StageRecord::skipped("daily_briefing"));
        }

        let status = PipelineStatus::new(stages);
        let _ = write_json_atomic(&pipeline_status_path(&self.data_root), &status).await;
        info!(overall = status.overall, "pipeline run finished");
        status
    }
}

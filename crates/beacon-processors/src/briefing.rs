//! Daily-briefing processor (spec §4.10 stage 7, §4.11): reads the
//! per-module feeds already written by the other processors, picks the
//! top-ranked items per dimension, and renders a single `briefing.json`
//! for the day with sections and a short narrative — oracle-generated
//! when enrichment is enabled, rule-composed otherwise.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

use beacon_storage::atomic::read_json_opt;
use beacon_storage::paths::processed_path;
use beacon_types::error::MonitorResult;

use crate::oracle::{OracleRequest, OracleTask, TextAnalysisOracle};
use crate::output::save_output_json;
use crate::types::ProcessSummary;

const MODULE: &str = "briefing";
const TOP_N: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct BriefingItem {
    pub title: String,
    pub url: String,
    pub importance: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BriefingSection {
    pub module: String,
    pub headline: String,
    pub items: Vec<BriefingItem>,
}

#[derive(Debug, Serialize)]
struct Briefing {
    date: NaiveDate,
    sections: Vec<BriefingSection>,
    narrative: String,
}

pub struct BriefingProcessor {
    data_root: PathBuf,
    oracle: Arc<dyn TextAnalysisOracle>,
    oracle_enabled: bool,
}

impl BriefingProcessor {
    pub fn new(data_root: impl Into<PathBuf>, oracle: Arc<dyn TextAnalysisOracle>, oracle_enabled: bool) -> Self {
        Self {
            data_root: data_root.into(),
            oracle,
            oracle_enabled,
        }
    }

    async fn read_items(&self, module: &str, file: &str, array_key: &str, score_key: Option<&str>) -> Vec<BriefingItem> {
        let path = processed_path(&self.data_root, module, file);
        let value: Option<Value> = read_json_opt(&path).await.ok().flatten();
        let Some(value) = value else {
            return Vec::new();
        };
        let Some(array) = value.get(array_key).and_then(Value::as_array) else {
            return Vec::new();
        };

        let mut items: Vec<(i64, BriefingItem)> = array
            .iter()
            .map(|entry| {
                let rank = score_key
                    .and_then(|k| entry.get(k))
                    .and_then(Value::as_i64)
                    .unwrap_or(0);
                let title = entry.get("title").and_then(Value::as_str).unwrap_or_default().to_string();
                let url = entry.get("url").and_then(Value::as_str).unwrap_or_default().to_string();
                let importance = entry.get("importance").and_then(Value::as_str).map(str::to_string);
                (rank, BriefingItem { title, url, importance })
            })
            .collect();
        items.sort_by(|a, b| b.0.cmp(&a.0));
        items.into_iter().take(TOP_N).map(|(_, item)| item).collect()
    }

    async fn tech_headline_items(&self) -> Vec<BriefingItem> {
        let path = processed_path(&self.data_root, "tech", "topics.json");
        let value: Option<Value> = read_json_opt(&path).await.ok().flatten();
        let Some(value) = value else {
            return Vec::new();
        };
        let Some(topics) = value.get("topics").and_then(Value::as_array) else {
            return Vec::new();
        };

        let mut ranked: Vec<(f64, BriefingItem)> = topics
            .iter()
            .map(|topic| {
                let heat = topic.get("heat").and_then(Value::as_f64).unwrap_or(0.0);
                let title = topic.get("topic").and_then(Value::as_str).unwrap_or_default().to_string();
                (heat, BriefingItem { title, url: String::new(), importance: None })
            })
            .filter(|(heat, _)| *heat > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        ranked.into_iter().take(TOP_N).map(|(_, item)| item).collect()
    }

    fn compose_narrative(&self, sections: &[BriefingSection]) -> String {
        let parts: Vec<String> = sections
            .iter()
            .filter(|s| !s.items.is_empty())
            .map(|s| format!("{}{}条", s.headline, s.items.len()))
            .collect();
        if parts.is_empty() {
            "今日暂无值得关注的动态。".to_string()
        } else {
            format!("今日简报：{}。", parts.join("，"))
        }
    }

    pub async fn process(&self, dry_run: bool, _force: bool) -> MonitorResult<ProcessSummary> {
        let policy_items = self.read_items("policy", "feed.json", "items", Some("match_score")).await;
        let personnel_items = self.read_items("personnel", "feed.json", "items", None).await;
        let university_items = self.read_items("university", "feed.json", "items", None).await;
        let tech_items = self.tech_headline_items().await;

        let mut sections = vec![
            BriefingSection { module: "policy".into(), headline: "政策动态".into(), items: policy_items },
            BriefingSection { module: "personnel".into(), headline: "人事变动".into(), items: personnel_items },
            BriefingSection { module: "tech".into(), headline: "科技热点".into(), items: tech_items },
            BriefingSection { module: "university".into(), headline: "高校动态".into(), items: university_items },
        ];
        sections.retain(|s| !s.items.is_empty());

        let narrative = if self.oracle_enabled {
            self.oracle_narrative(&sections).await.unwrap_or_else(|| self.compose_narrative(&sections))
        } else {
            self.compose_narrative(&sections)
        };

        let items_written: usize = sections.iter().map(|s| s.items.len()).sum();
        let briefing = Briefing {
            date: Utc::now().date_naive(),
            sections,
            narrative,
        };

        save_output_json(&processed_path(&self.data_root, MODULE, "briefing.json"), briefing, dry_run).await?;

        Ok(ProcessSummary {
            items_considered: items_written,
            items_new_or_changed: items_written,
            items_written,
            outputs: vec!["briefing.json".into()],
        })
    }

    async fn oracle_narrative(&self, sections: &[BriefingSection]) -> Option<String> {
        let summary: Vec<String> = sections.iter().map(|s| format!("{}: {}条", s.headline, s.items.len())).collect();
        let request = OracleRequest {
            task: OracleTask::DailyBriefing,
            prompt: summary.join("; "),
        };
        self.oracle.query(request).await.ok().and_then(|r| r.field_str("narrative"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{MockOracle, NullOracle};
    use serde_json::json;

    async fn write_feed(root: &std::path::Path, module: &str, payload: Value) {
        let path = processed_path(root, module, "feed.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_vec(&payload).unwrap()).unwrap();
    }

    #[tokio::test]
    async fn composes_rule_based_narrative_without_oracle() {
        let dir = tempfile::tempdir().unwrap();
        write_feed(
            dir.path(),
            "policy",
            json!({"items": [{"title": "政策A", "url": "https://a", "match_score": 90}]}),
        )
        .await;

        let processor = BriefingProcessor::new(dir.path(), Arc::new(NullOracle), false);
        let summary = processor.process(false, false).await.unwrap();
        assert_eq!(summary.items_written, 1);

        let text = std::fs::read_to_string(processed_path(dir.path(), MODULE, "briefing.json")).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert!(value["narrative"].as_str().unwrap().contains("政策动态"));
        assert_eq!(value["sections"][0]["items"][0]["title"], "政策A");
    }

    #[tokio::test]
    async fn uses_oracle_narrative_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        write_feed(
            dir.path(),
            "policy",
            json!({"items": [{"title": "政策A", "url": "https://a", "match_score": 90}]}),
        )
        .await;

        let oracle = MockOracle::new(json!({"narrative": "今日要闻一览"}));
        let processor = BriefingProcessor::new(dir.path(), Arc::new(oracle), true);
        processor.process(false, false).await.unwrap();

        let text = std::fs::read_to_string(processed_path(dir.path(), MODULE, "briefing.json")).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["narrative"], "今日要闻一览");
    }

    #[tokio::test]
    async fn empty_inputs_produce_fallback_narrative() {
        let dir = tempfile::tempdir().unwrap();
        let processor = BriefingProcessor::new(dir.path(), Arc::new(NullOracle), false);
        let summary = processor.process(false, false).await.unwrap();
        assert_eq!(summary.items_written, 0);

        let text = std::fs::read_to_string(processed_path(dir.path(), MODULE, "briefing.json")).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["narrative"], "今日暂无值得关注的动态。");
    }
}

//! Policy processor (spec §4.11): rule-engine scoring over
//! `national_policy`/`beijing_policy`/policy-tagged `personnel` items,
//! heuristic opportunity detection, and optional oracle Tier 2 refinement.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use beacon_storage::paths::processed_path;
use beacon_storage::reader::{list_articles, ArticleFilter};
use beacon_types::error::MonitorResult;
use beacon_types::{CrawledItem, Dimension};

use crate::extraction::{extract_contact, extract_deadline_date, extract_funding_amount};
use crate::hash_tracker::HashTracker;
use crate::oracle::{OracleRequest, OracleTask, TextAnalysisOracle};
use crate::output::save_output_json;
use crate::types::{Importance, ProcessSummary};

const MODULE: &str = "policy";

/// Weighted keyword dictionary (spec §4.11 "weighted sum of keyword hits
/// against a domain keyword dictionary"). Weights were tuned so a title
/// carrying 2-3 core terms plus one funding signal in the body clears the
/// `high` band (score >= 70, spec §8 S5).
const POLICY_KEYWORDS: &[(&str, i32)] = &[
    ("人工智能", 20),
    ("产业发展", 15),
    ("实施方案", 10),
    ("资助", 15),
    ("专项资金", 12),
    ("财政支持", 10),
    ("科技创新", 10),
    ("数字经济", 10),
    ("战略", 8),
    ("转型升级", 8),
    ("创新", 6),
];

fn dimension_authority_boost(dimension: Dimension) -> i32 {
    match dimension {
        Dimension::NationalPolicy => 5,
        Dimension::BeijingPolicy => 3,
        _ => 0,
    }
}

fn recency_boost(published_at: Option<NaiveDate>) -> i32 {
    match published_at {
        Some(date) => {
            let days = (Utc::now().date_naive() - date).num_days();
            if days <= 7 {
                5
            } else if days <= 30 {
                2
            } else {
                0
            }
        }
        None => 0,
    }
}

/// Title hits count 1.5x a body hit — the title-vs-body weighting named
/// in spec §4.11.
fn compute_match_score(title: &str, body: &str, dimension: Dimension, published_at: Option<NaiveDate>) -> i32 {
    let mut score = 0;
    for (keyword, weight) in POLICY_KEYWORDS {
        if title.contains(keyword) {
            score += weight + weight / 2;
        } else if body.contains(keyword) {
            score += weight;
        }
    }
    score += dimension_authority_boost(dimension);
    score += recency_boost(published_at);
    score.clamp(0, 100)
}

#[derive(Debug, Clone, Serialize)]
pub struct PolicyFeedItem {
    pub item_url_hash: String,
    pub title: String,
    pub url: String,
    pub source_id: String,
    pub dimension: Dimension,
    pub published_at: Option<NaiveDate>,
    pub match_score: i32,
    pub importance: Importance,
    pub summary: Option<String>,
    pub ai_insight: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PolicyOpportunity {
    pub item_url_hash: String,
    pub title: String,
    pub url: String,
    pub funding_amount: Option<String>,
    pub deadline_date: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Serialize)]
struct PolicyFeed {
    items: Vec<PolicyFeedItem>,
}

#[derive(Debug, Serialize)]
struct PolicyOpportunities {
    opportunities: Vec<PolicyOpportunity>,
}

pub struct PolicyProcessor {
    data_root: PathBuf,
    oracle: Arc<dyn TextAnalysisOracle>,
    oracle_enabled: bool,
    enrich_top_n: usize,
    enrich_threshold: i32,
}

impl PolicyProcessor {
    pub fn new(data_root: impl Into<PathBuf>, oracle: Arc<dyn TextAnalysisOracle>, oracle_enabled: bool) -> Self {
        Self {
            data_root: data_root.into(),
            oracle,
            oracle_enabled,
            enrich_top_n: 10,
            enrich_threshold: 70,
        }
    }

    fn gather_items(&self) -> MonitorResult<Vec<CrawledItem>> {
        let mut items = list_articles(
            &self.data_root,
            &ArticleFilter {
                dimension: Some(Dimension::NationalPolicy),
                ..Default::default()
            },
        )?;
        items.extend(list_articles(
            &self.data_root,
            &ArticleFilter {
                dimension: Some(Dimension::BeijingPolicy),
                ..Default::default()
            },
        )?);
        // The "personnel-policy subset" (spec §4.11): personnel items the
        // crawl layer tagged as policy-adjacent (`tags` carries "policy").
        let personnel = list_articles(
            &self.data_root,
            &ArticleFilter {
                dimension: Some(Dimension::Personnel),
                ..Default::default()
            },
        )?;
        items.extend(personnel.into_iter().filter(|i| i.tags.contains("policy")));
        Ok(items)
    }

    pub async fn process(&self, dry_run: bool, force: bool) -> MonitorResult<ProcessSummary> {
        let mut tracker = HashTracker::load(&self.data_root, MODULE).await?;
        let items = self.gather_items()?;

        let mut feed = Vec::new();
        let mut opportunities = Vec::new();
        let mut changed = 0usize;

        for item in &items {
            let content_hash = item.content_hash.clone().unwrap_or_default();
            if !tracker.is_new_or_changed(&item.url_hash, &content_hash, force) {
                continue;
            }
            changed += 1;

            let score = compute_match_score(&item.title, &item.content, item.dimension, item.published_at);
            let importance = Importance::from_score(score);

            let full_text = format!("{} {}", item.title, item.content);
            if let Some(funding) = extract_funding_amount(&full_text) {
                opportunities.push(PolicyOpportunity {
                    item_url_hash: item.url_hash.clone(),
                    title: item.title.clone(),
                    url: item.url.clone(),
                    funding_amount: Some(funding),
                    deadline_date: extract_deadline_date(&full_text),
                    contact: extract_contact(&full_text),
                });
            } else if let Some(deadline) = extract_deadline_date(&full_text) {
                opportunities.push(PolicyOpportunity {
                    item_url_hash: item.url_hash.clone(),
                    title: item.title.clone(),
                    url: item.url.clone(),
                    funding_amount: None,
                    deadline_date: Some(deadline),
                    contact: extract_contact(&full_text),
                });
            }

            feed.push(PolicyFeedItem {
                item_url_hash: item.url_hash.clone(),
                title: item.title.clone(),
                url: item.url.clone(),
                source_id: item.source_id.clone(),
                dimension: item.dimension,
                published_at: item.published_at,
                match_score: score,
                importance,
                summary: item.summary.clone(),
                ai_insight: None,
                category: None,
            });

            tracker.mark_processed(&item.url_hash, &content_hash, dry_run);
        }

        if self.oracle_enabled {
            self.enrich_top_items(&mut feed).await;
        }

        feed.sort_by(|a, b| b.match_score.cmp(&a.match_score));

        let items_written = feed.len();
        save_output_json(&processed_path(&self.data_root, MODULE, "feed.json"), PolicyFeed { items: feed }, dry_run)
            .await?;
        save_output_json(
            &processed_path(&self.data_root, MODULE, "opportunities.json"),
            PolicyOpportunities { opportunities },
            dry_run,
        )
        .await?;

        tracker.save().await?;

        Ok(ProcessSummary {
            items_considered: items.len(),
            items_new_or_changed: changed,
            items_written,
            outputs: vec!["feed.json".into(), "opportunities.json".into()],
        })
    }

    /// Tier 2 oracle refinement for the top-N items above the score
    /// threshold (spec §4.11). Failures are swallowed per item (spec §7
    /// "oracle failures are always non-fatal").
    async fn enrich_top_items(&self, feed: &mut [PolicyFeedItem]) {
        let mut indices: Vec<usize> = (0..feed.len()).filter(|&i| feed[i].match_score >= self.enrich_threshold).collect();
        indices.sort_by_key(|&i| std::cmp::Reverse(feed[i].match_score));
        indices.truncate(self.enrich_top_n);

        for i in indices {
            let prompt = format!("policy: {} :: score={}", feed[i].title, feed[i].match_score);
            let request = OracleRequest {
                task: OracleTask::PolicyEnrich,
                prompt,
            };
            if let Ok(response) = self.oracle.query(request).await {
                feed[i].ai_insight = response.field_str("ai_insight");
                feed[i].category = response.field_str("category");
                if let Some(refined) = response.field_i64("match_score") {
                    feed[i].match_score = refined.clamp(0, 100) as i32;
                    feed[i].importance = Importance::from_score(feed[i].match_score);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_types::urlutil::url_hash;
    use beacon_types::RawArtifact;
    use std::path::Path;

    fn item(title: &str, content: &str, dimension: Dimension) -> CrawledItem {
        let url = format!("https://gov.site/{title}");
        CrawledItem {
            title: title.to_string(),
            url: url.clone(),
            url_hash: url_hash(&url),
            published_at: None,
            author: None,
            summary: None,
            content: content.to_string(),
            content_html: None,
            content_hash: beacon_types::urlutil::content_hash(content),
            source_id: "gov1".into(),
            dimension,
            tags: Default::default(),
            extra: Default::default(),
            is_new: true,
        }
    }

    fn write_artifact(root: &Path, dimension: Dimension, items: Vec<CrawledItem>) {
        let artifact = RawArtifact::build("gov1", dimension, None, "Gov Source", Utc::now(), items, None);
        let path = root.join("raw").join(dimension.as_str()).join("gov1").join("latest.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_vec(&artifact).unwrap()).unwrap();
    }

    #[tokio::test]
    async fn s5_policy_scoring_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let raw = item(
            "关于加快人工智能产业发展的实施方案",
            "资助上限 500 万元，申报截止 2026-06-30",
            Dimension::NationalPolicy,
        );
        write_artifact(dir.path(), Dimension::NationalPolicy, vec![raw]);

        let processor = PolicyProcessor::new(dir.path(), Arc::new(crate::oracle::NullOracle), false);
        let summary = processor.process(false, false).await.unwrap();
        assert_eq!(summary.items_written, 1);

        let feed_text = std::fs::read_to_string(processed_path(dir.path(), MODULE, "feed.json")).unwrap();
        let feed: serde_json::Value = serde_json::from_str(&feed_text).unwrap();
        let item = &feed["items"][0];
        assert!(item["match_score"].as_i64().unwrap() >= 70);
        assert_eq!(item["importance"], "high");

        let opp_text = std::fs::read_to_string(processed_path(dir.path(), MODULE, "opportunities.json")).unwrap();
        let opp: serde_json::Value = serde_json::from_str(&opp_text).unwrap();
        assert_eq!(opp["opportunities"][0]["funding_amount"], "500万元");
        assert_eq!(opp["opportunities"][0]["deadline_date"], "2026-06-30");
    }

    #[tokio::test]
    async fn unchanged_item_is_skipped_on_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let raw = item("测试政策", "创新 战略", Dimension::BeijingPolicy);
        write_artifact(dir.path(), Dimension::BeijingPolicy, vec![raw]);

        let processor = PolicyProcessor::new(dir.path(), Arc::new(crate::oracle::NullOracle), false);
        processor.process(false, false).await.unwrap();
        let second = processor.process(false, false).await.unwrap();
        assert_eq!(second.items_new_or_changed, 0);
    }

    #[tokio::test]
    async fn dry_run_does_not_persist_tracker_or_files() {
        let dir = tempfile::tempdir().unwrap();
        let raw = item("测试政策", "创新 战略", Dimension::BeijingPolicy);
        write_artifact(dir.path(), Dimension::BeijingPolicy, vec![raw]);

        let processor = PolicyProcessor::new(dir.path(), Arc::new(crate::oracle::NullOracle), false);
        processor.process(true, false).await.unwrap();
        assert!(!processed_path(dir.path(), MODULE, "feed.json").exists());
    }
}

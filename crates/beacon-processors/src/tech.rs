//! Tech-frontier processor (spec §4.11): aggregates `technology`,
//! `industry`, `twitter`, and the AI-institute subset of `universities`
//! into 8 fixed topic bins, with per-topic heat, top signals, and KOL
//! voices.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use beacon_storage::paths::processed_path;
use beacon_storage::reader::{list_articles, ArticleFilter};
use beacon_types::error::MonitorResult;
use beacon_types::{CrawledItem, Dimension};

use crate::extraction::{extract_deadline_date, extract_funding_amount};
use crate::hash_tracker::HashTracker;
use crate::oracle::{OracleRequest, OracleTask, TextAnalysisOracle};
use crate::output::save_output_json;
use crate::types::ProcessSummary;

const MODULE: &str = "tech";

/// The 8 fixed topic bins (spec §4.11 "bins each raw item into one of 8
/// fixed topics by keyword matching").
const TOPICS: &[(&str, &[&str])] = &[
    ("大模型", &["大模型", "LLM", "GPT", "预训练"]),
    ("生成式AI应用", &["生成式", "AIGC", "应用落地"]),
    ("芯片与算力", &["芯片", "算力", "GPU", "半导体"]),
    ("机器人与具身智能", &["机器人", "具身智能", "人形机器人"]),
    ("自动驾驶", &["自动驾驶", "无人驾驶", "智能网联"]),
    ("AI安全与治理", &["安全治理", "监管", "伦理风险"]),
    ("开源生态", &["开源"]),
    ("资本与产业并购", &["融资", "并购", "IPO"]),
];

fn topic_for(text: &str) -> Option<&'static str> {
    TOPICS
        .iter()
        .map(|(topic, keywords)| (*topic, keywords.iter().filter(|k| text.contains(**k)).count()))
        .filter(|(_, hits)| *hits > 0)
        .max_by_key(|(_, hits)| *hits)
        .map(|(topic, _)| topic)
}

fn recency_weight(item: &CrawledItem) -> f64 {
    match item.published_at {
        Some(date) => {
            let days = (Utc::now().date_naive() - date).num_days().max(0) as f64;
            1.0 / (1.0 + days)
        }
        None => 0.3,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TechSignal {
    pub item_url_hash: String,
    pub title: String,
    pub url: String,
    pub source_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TechTopic {
    pub topic: String,
    pub heat: f64,
    pub related_news: Vec<TechSignal>,
    pub kol_voices: Vec<TechSignal>,
    pub ai_insight: Option<String>,
    pub refined_label: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TechOpportunity {
    pub item_url_hash: String,
    pub title: String,
    pub url: String,
    pub funding_amount: Option<String>,
    pub deadline_date: Option<String>,
}

#[derive(Debug, Serialize)]
struct TopicsPayload {
    topics: Vec<TechTopic>,
}

#[derive(Debug, Serialize)]
struct OpportunitiesPayload {
    opportunities: Vec<TechOpportunity>,
}

#[derive(Debug, Serialize)]
struct StatsPayload {
    total_items: usize,
    total_sources: usize,
    top_topic: Option<String>,
}

pub struct TechProcessor {
    data_root: PathBuf,
    oracle: Arc<dyn TextAnalysisOracle>,
    oracle_enabled: bool,
}

impl TechProcessor {
    pub fn new(data_root: impl Into<PathBuf>, oracle: Arc<dyn TextAnalysisOracle>, oracle_enabled: bool) -> Self {
        Self {
            data_root: data_root.into(),
            oracle,
            oracle_enabled,
        }
    }

    fn gather_items(&self) -> MonitorResult<Vec<CrawledItem>> {
        let mut items = Vec::new();
        for dimension in [Dimension::Technology, Dimension::Industry, Dimension::Twitter] {
            items.extend(list_articles(
                &self.data_root,
                &ArticleFilter {
                    dimension: Some(dimension),
                    ..Default::default()
                },
            )?);
        }
        let universities = list_articles(
            &self.data_root,
            &ArticleFilter {
                dimension: Some(Dimension::Universities),
                ..Default::default()
            },
        )?;
        items.extend(universities.into_iter().filter(|i| i.tags.contains("ai_institute")));
        Ok(items)
    }

    pub async fn process(&self, dry_run: bool, force: bool) -> MonitorResult<ProcessSummary> {
        let mut tracker = HashTracker::load(&self.data_root, MODULE).await?;
        let items = self.gather_items()?;

        let mut heat: HashMap<&'static str, f64> = HashMap::new();
        let mut related: HashMap<&'static str, Vec<TechSignal>> = HashMap::new();
        let mut kol: HashMap<&'static str, Vec<TechSignal>> = HashMap::new();
        let mut opportunities = Vec::new();
        let mut changed = 0usize;
        let mut sources = std::collections::HashSet::new();

        for item in &items {
            let content_hash = item.content_hash.clone().unwrap_or_default();
            if !tracker.is_new_or_changed(&item.url_hash, &content_hash, force) {
                continue;
            }
            changed += 1;
            sources.insert(item.source_id.clone());

            let text = format!("{} {}", item.title, item.content);
            if let Some(topic) = topic_for(&text) {
                *heat.entry(topic).or_insert(0.0) += 1.0 + recency_weight(item);
                let signal = TechSignal {
                    item_url_hash: item.url_hash.clone(),
                    title: item.title.clone(),
                    url: item.url.clone(),
                    source_id: item.source_id.clone(),
                };
                if item.dimension == Dimension::Twitter {
                    kol.entry(topic).or_default().push(signal);
                } else {
                    related.entry(topic).or_default().push(signal);
                }
            }

            if item.dimension == Dimension::Industry {
                if let Some(funding) = extract_funding_amount(&text) {
                    opportunities.push(TechOpportunity {
                        item_url_hash: item.url_hash.clone(),
                        title: item.title.clone(),
                        url: item.url.clone(),
                        funding_amount: Some(funding),
                        deadline_date: extract_deadline_date(&text),
                    });
                }
            }

            tracker.mark_processed(&item.url_hash, &content_hash, dry_run);
        }

        let mut topics: Vec<TechTopic> = TOPICS
            .iter()
            .map(|(name, _)| TechTopic {
                topic: name.to_string(),
                heat: heat.get(name).copied().unwrap_or(0.0),
                related_news: related.remove(name).unwrap_or_default(),
                kol_voices: kol.remove(name).unwrap_or_default(),
                ai_insight: None,
                refined_label: None,
            })
            .collect();

        if self.oracle_enabled {
            self.enrich_topics(&mut topics).await;
        }

        let top_topic = topics
            .iter()
            .max_by(|a, b| a.heat.partial_cmp(&b.heat).unwrap_or(std::cmp::Ordering::Equal))
            .filter(|t| t.heat > 0.0)
            .map(|t| t.topic.clone());

        save_output_json(&processed_path(&self.data_root, MODULE, "topics.json"), TopicsPayload { topics }, dry_run)
            .await?;
        save_output_json(
            &processed_path(&self.data_root, MODULE, "opportunities.json"),
            OpportunitiesPayload { opportunities },
            dry_run,
        )
        .await?;
        save_output_json(
            &processed_path(&self.data_root, MODULE, "stats.json"),
            StatsPayload {
                total_items: items.len(),
                total_sources: sources.len(),
                top_topic,
            },
            dry_run,
        )
        .await?;

        tracker.save().await?;

        Ok(ProcessSummary {
            items_considered: items.len(),
            items_new_or_changed: changed,
            items_written: changed,
            outputs: vec!["topics.json".into(), "opportunities.json".into(), "stats.json".into()],
        })
    }

    async fn enrich_topics(&self, topics: &mut [TechTopic]) {
        for topic in topics.iter_mut() {
            if topic.heat <= 0.0 {
                continue;
            }
            let prompt = format!("tech topic: {} heat={:.2}", topic.topic, topic.heat);
            let request = OracleRequest {
                task: OracleTask::TechEnrich,
                prompt,
            };
            if let Ok(response) = self.oracle.query(request).await {
                topic.ai_insight = response.field_str("ai_insight");
                topic.refined_label = response.field_str("category");
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
        let url = format!("https://tech.site/{title}");
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
            source_id: "tech1".into(),
            dimension,
            tags: Default::default(),
            extra: Default::default(),
            is_new: true,
        }
    }

    fn write_artifact(root: &Path, dimension: Dimension, items: Vec<CrawledItem>) {
        let artifact = RawArtifact::build("tech1", dimension, None, "Tech Source", Utc::now(), items, None);
        let path = root.join("raw").join(dimension.as_str()).join("tech1").join("latest.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_vec(&artifact).unwrap()).unwrap();
    }

    #[tokio::test]
    async fn bins_item_into_matching_topic() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(
            dir.path(),
            Dimension::Technology,
            vec![item("国产大模型发布新版本", "预训练规模持续扩大", Dimension::Technology)],
        );

        let processor = TechProcessor::new(dir.path(), Arc::new(crate::oracle::NullOracle), false);
        processor.process(false, false).await.unwrap();

        let text = std::fs::read_to_string(processed_path(dir.path(), MODULE, "topics.json")).unwrap();
        let topics: serde_json::Value = serde_json::from_str(&text).unwrap();
        let llm_topic = topics["topics"].as_array().unwrap().iter().find(|t| t["topic"] == "大模型").unwrap();
        assert_eq!(llm_topic["related_news"].as_array().unwrap().len(), 1);
        assert!(llm_topic["heat"].as_f64().unwrap() > 0.0);
    }
}

//! University processor (spec §4.11): keyword classification of
//! `universities`-dimension items into {personnel, research_outputs,
//! events, general}. No oracle pass by default — this dimension is
//! lower-stakes than policy/personnel so enrichment stays off unless a
//! future revision of the spec asks for it.

use std::path::PathBuf;

use serde::Serialize;

use beacon_storage::paths::processed_path;
use beacon_storage::reader::{list_articles, ArticleFilter};
use beacon_types::error::MonitorResult;
use beacon_types::{CrawledItem, Dimension};

use crate::hash_tracker::HashTracker;
use crate::output::save_output_json;
use crate::types::ProcessSummary;

const MODULE: &str = "university";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UniversityCategory {
    Personnel,
    ResearchOutputs,
    Events,
    General,
}

const PERSONNEL_KEYWORDS: &[&str] = &["任命", "聘任", "入职", "离职", "当选", "院士"];
const RESEARCH_KEYWORDS: &[&str] = &["论文", "发表", "成果", "专利", "获奖", "研究"];
const EVENT_KEYWORDS: &[&str] = &["会议", "论坛", "活动", "讲座", "研讨会"];

fn classify(text: &str) -> UniversityCategory {
    if PERSONNEL_KEYWORDS.iter().any(|k| text.contains(k)) {
        UniversityCategory::Personnel
    } else if RESEARCH_KEYWORDS.iter().any(|k| text.contains(k)) {
        UniversityCategory::ResearchOutputs
    } else if EVENT_KEYWORDS.iter().any(|k| text.contains(k)) {
        UniversityCategory::Events
    } else {
        UniversityCategory::General
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UniversityFeedItem {
    pub item_url_hash: String,
    pub title: String,
    pub url: String,
    pub source_id: String,
    pub category: UniversityCategory,
    pub published_at: Option<chrono::NaiveDate>,
}

#[derive(Debug, Serialize)]
struct FeedPayload {
    items: Vec<UniversityFeedItem>,
}

#[derive(Debug, Serialize)]
struct ResearchOutputsPayload {
    items: Vec<UniversityFeedItem>,
}

#[derive(Debug, Serialize)]
struct OverviewPayload {
    total: usize,
    personnel: usize,
    research_outputs: usize,
    events: usize,
    general: usize,
}

pub struct UniversityProcessor {
    data_root: PathBuf,
}

impl UniversityProcessor {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    fn gather_items(&self) -> MonitorResult<Vec<CrawledItem>> {
        list_articles(
            &self.data_root,
            &ArticleFilter {
                dimension: Some(Dimension::Universities),
                ..Default::default()
            },
        )
    }

    pub async fn process(&self, dry_run: bool, force: bool) -> MonitorResult<ProcessSummary> {
        let mut tracker = HashTracker::load(&self.data_root, MODULE).await?;
        let items = self.gather_items()?;

        let mut feed = Vec::new();
        let mut changed = 0usize;

        for item in &items {
            let content_hash = item.content_hash.clone().unwrap_or_default();
            if !tracker.is_new_or_changed(&item.url_hash, &content_hash, force) {
                continue;
            }
            changed += 1;

            let text = format!("{} {}", item.title, item.content);
            feed.push(UniversityFeedItem {
                item_url_hash: item.url_hash.clone(),
                title: item.title.clone(),
                url: item.url.clone(),
                source_id: item.source_id.clone(),
                category: classify(&text),
                published_at: item.published_at,
            });

            tracker.mark_processed(&item.url_hash, &content_hash, dry_run);
        }

        let research_outputs: Vec<UniversityFeedItem> = feed
            .iter()
            .filter(|i| i.category == UniversityCategory::ResearchOutputs)
            .cloned()
            .collect();

        let overview = OverviewPayload {
            total: feed.len(),
            personnel: feed.iter().filter(|i| i.category == UniversityCategory::Personnel).count(),
            research_outputs: research_outputs.len(),
            events: feed.iter().filter(|i| i.category == UniversityCategory::Events).count(),
            general: feed.iter().filter(|i| i.category == UniversityCategory::General).count(),
        };

        let items_written = feed.len();
        save_output_json(&processed_path(&self.data_root, MODULE, "feed.json"), FeedPayload { items: feed }, dry_run)
            .await?;
        save_output_json(&processed_path(&self.data_root, MODULE, "overview.json"), overview, dry_run).await?;
        save_output_json(
            &processed_path(&self.data_root, MODULE, "research_outputs.json"),
            ResearchOutputsPayload { items: research_outputs },
            dry_run,
        )
        .await?;

        tracker.save().await?;

        Ok(ProcessSummary {
            items_considered: items.len(),
            items_new_or_changed: changed,
            items_written,
            outputs: vec!["feed.json".into(), "overview.json".into(), "research_outputs.json".into()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_types::urlutil::url_hash;
    use beacon_types::RawArtifact;
    use chrono::Utc;
    use std::path::Path;

    fn item(title: &str, content: &str) -> CrawledItem {
        let url = format!("https://univ.site/{title}");
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
            source_id: "univ1".into(),
            dimension: Dimension::Universities,
            tags: Default::default(),
            extra: Default::default(),
            is_new: true,
        }
    }

    fn write_artifact(root: &Path, items: Vec<CrawledItem>) {
        let artifact = RawArtifact::build("univ1", Dimension::Universities, None, "Univ Source", Utc::now(), items, None);
        let path = root.join("raw").join("universities").join("univ1").join("latest.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_vec(&artifact).unwrap()).unwrap();
    }

    #[tokio::test]
    async fn classifies_research_output() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), vec![item("团队发表重要论文", "该研究成果已在期刊发表")]);

        let processor = UniversityProcessor::new(dir.path());
        let summary = processor.process(false, false).await.unwrap();
        assert_eq!(summary.items_written, 1);

        let overview_text = std::fs::read_to_string(processed_path(dir.path(), MODULE, "overview.json")).unwrap();
        let overview: serde_json::Value = serde_json::from_str(&overview_text).unwrap();
        assert_eq!(overview["research_outputs"], 1);
    }

    #[tokio::test]
    async fn general_category_when_no_keywords_match() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), vec![item("校园新闻速览", "今天天气晴朗")]);

        let processor = UniversityProcessor::new(dir.path());
        processor.process(false, false).await.unwrap();

        let feed_text = std::fs::read_to_string(processed_path(dir.path(), MODULE, "feed.json")).unwrap();
        let feed: serde_json::Value = serde_json::from_str(&feed_text).unwrap();
        assert_eq!(feed["items"][0]["category"], "general");
    }
}

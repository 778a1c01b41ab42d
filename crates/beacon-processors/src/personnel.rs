//! Personnel processor (spec §4.11): Chinese-job-title regex extraction of
//! structured appointment/election/retirement records, one article
//! potentially yielding several.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Serialize;

use beacon_storage::paths::processed_path;
use beacon_storage::reader::{list_articles, ArticleFilter};
use beacon_types::error::MonitorResult;
use beacon_types::{CrawledItem, Dimension};

use crate::hash_tracker::HashTracker;
use crate::oracle::{OracleRequest, OracleTask, TextAnalysisOracle};
use crate::output::save_output_json;
use crate::types::{Importance, ProcessSummary};

const MODULE: &str = "personnel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonnelAction {
    Appointed,
    Elected,
    Removed,
    Retired,
    Other,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonnelChange {
    pub item_url_hash: String,
    pub name: String,
    pub action: PersonnelAction,
    pub position: String,
    pub organization: Option<String>,
    pub effective_date: Option<chrono::NaiveDate>,
    pub relevance: Option<String>,
    pub importance: Option<Importance>,
    pub group: Option<String>,
    pub note: Option<String>,
    pub action_suggestion: Option<String>,
    pub background: Option<String>,
    pub signals: Vec<String>,
    pub ai_insight: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonnelFeedItem {
    pub item_url_hash: String,
    pub title: String,
    pub url: String,
    pub source_id: String,
    pub published_at: Option<chrono::NaiveDate>,
    pub importance: Importance,
    pub change_count: usize,
}

fn appointed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(.{1,20}?)任命(.{1,10}?)为(.{2,30})").unwrap())
}

fn elected_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(.{1,10}?)当选(.{2,30})").unwrap())
}

fn retired_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(.{1,10}?)卸任(.{2,30})").unwrap())
}

fn removed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(.{1,10}?)免去(.{2,30}?)职务").unwrap())
}

/// One text (title or a body sentence) may match at most one pattern
/// (first-match-wins, checked in the order a change is most likely to be
/// unambiguous: explicit appointment first, vague "elected"/"retired"
/// phrasing last).
fn extract_changes_from_text(text: &str) -> Vec<(String, PersonnelAction, String, Option<String>)> {
    let mut out = Vec::new();

    if let Some(c) = appointed_re().captures(text) {
        out.push((c[2].trim().to_string(), PersonnelAction::Appointed, c[3].trim().to_string(), Some(c[1].trim().to_string())));
        return out;
    }
    if let Some(c) = removed_re().captures(text) {
        out.push((c[1].trim().to_string(), PersonnelAction::Removed, c[2].trim().to_string(), None));
        return out;
    }
    if let Some(c) = retired_re().captures(text) {
        out.push((c[1].trim().to_string(), PersonnelAction::Retired, c[2].trim().to_string(), None));
        return out;
    }
    if let Some(c) = elected_re().captures(text) {
        out.push((c[1].trim().to_string(), PersonnelAction::Elected, c[2].trim().to_string(), None));
        return out;
    }
    out
}

fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['。', '；', '\n']).map(str::trim).filter(|s| !s.is_empty()).collect()
}

pub struct PersonnelProcessor {
    data_root: PathBuf,
    oracle: Arc<dyn TextAnalysisOracle>,
    oracle_enabled: bool,
}

impl PersonnelProcessor {
    pub fn new(data_root: impl Into<PathBuf>, oracle: Arc<dyn TextAnalysisOracle>, oracle_enabled: bool) -> Self {
        Self {
            data_root: data_root.into(),
            oracle,
            oracle_enabled,
        }
    }

    fn gather_items(&self) -> MonitorResult<Vec<CrawledItem>> {
        list_articles(
            &self.data_root,
            &ArticleFilter {
                dimension: Some(Dimension::Personnel),
                ..Default::default()
            },
        )
    }

    pub async fn process(&self, dry_run: bool, force: bool) -> MonitorResult<ProcessSummary> {
        let mut tracker = HashTracker::load(&self.data_root, MODULE).await?;
        let items = self.gather_items()?;

        let mut feed = Vec::new();
        let mut changes = Vec::new();
        let mut changed_items = 0usize;

        for item in &items {
            let content_hash = item.content_hash.clone().unwrap_or_default();
            if !tracker.is_new_or_changed(&item.url_hash, &content_hash, force) {
                continue;
            }
            changed_items += 1;

            let mut item_changes = extract_changes_from_text(&item.title);
            for sentence in split_sentences(&item.content) {
                item_changes.extend(extract_changes_from_text(sentence));
            }

            let importance = if item_changes.is_empty() {
                Importance::Low
            } else {
                Importance::Medium
            };

            for (name, action, position, organization) in &item_changes {
                changes.push(PersonnelChange {
                    item_url_hash: item.url_hash.clone(),
                    name: name.clone(),
                    action: *action,
                    position: position.clone(),
                    organization: organization.clone(),
                    effective_date: item.published_at,
                    relevance: None,
                    importance: None,
                    group: None,
                    note: None,
                    action_suggestion: None,
                    background: None,
                    signals: Vec::new(),
                    ai_insight: None,
                });
            }

            feed.push(PersonnelFeedItem {
                item_url_hash: item.url_hash.clone(),
                title: item.title.clone(),
                url: item.url.clone(),
                source_id: item.source_id.clone(),
                published_at: item.published_at,
                importance,
                change_count: item_changes.len(),
            });

            tracker.mark_processed(&item.url_hash, &content_hash, dry_run);
        }

        if self.oracle_enabled {
            self.enrich_changes(&mut changes).await;
        }

        let items_written = feed.len();
        save_output_json(
            &processed_path(&self.data_root, MODULE, "feed.json"),
            FeedPayload { items: feed },
            dry_run,
        )
        .await?;
        save_output_json(
            &processed_path(&self.data_root, MODULE, "changes.json"),
            ChangesPayload { changes: changes.clone() },
            dry_run,
        )
        .await?;
        if self.oracle_enabled {
            save_output_json(
                &processed_path(&self.data_root, MODULE, "enriched_feed.json"),
                ChangesPayload { changes },
                dry_run,
            )
            .await?;
        }

        tracker.save().await?;

        Ok(ProcessSummary {
            items_considered: items.len(),
            items_new_or_changed: changed_items,
            items_written,
            outputs: vec!["feed.json".into(), "changes.json".into()],
        })
    }

    async fn enrich_changes(&self, changes: &mut [PersonnelChange]) {
        for change in changes.iter_mut() {
            let prompt = format!("personnel change: {} {:?} {}", change.name, change.action, change.position);
            let request = OracleRequest {
                task: OracleTask::PersonnelEnrich,
                prompt,
            };
            if let Ok(response) = self.oracle.query(request).await {
                change.relevance = response.field_str("relevance");
                change.group = response.field_str("group");
                change.note = response.field_str("note");
                change.action_suggestion = response.field_str("action_suggestion");
                change.background = response.field_str("background");
                change.ai_insight = response.field_str("ai_insight");
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct FeedPayload {
    items: Vec<PersonnelFeedItem>,
}

#[derive(Debug, Serialize)]
struct ChangesPayload {
    changes: Vec<PersonnelChange>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_types::urlutil::url_hash;
    use beacon_types::RawArtifact;
    use chrono::Utc;
    use std::path::Path;

    fn item(title: &str, content: &str) -> CrawledItem {
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
            dimension: Dimension::Personnel,
            tags: Default::default(),
            extra: Default::default(),
            is_new: true,
        }
    }

    fn write_artifact(root: &Path, items: Vec<CrawledItem>) {
        let artifact = RawArtifact::build("gov1", Dimension::Personnel, None, "Gov Source", Utc::now(), items, None);
        let path = root.join("raw").join("personnel").join("gov1").join("latest.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_vec(&artifact).unwrap()).unwrap();
    }

    #[tokio::test]
    async fn s6_personnel_extraction_scenario() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), vec![item("国务院任命张三为教育部副部长", "")]);

        let processor = PersonnelProcessor::new(dir.path(), Arc::new(crate::oracle::NullOracle), false);
        let summary = processor.process(false, false).await.unwrap();
        assert_eq!(summary.items_written, 1);

        let changes_text = std::fs::read_to_string(processed_path(dir.path(), MODULE, "changes.json")).unwrap();
        let changes: serde_json::Value = serde_json::from_str(&changes_text).unwrap();
        let change = &changes["changes"][0];
        assert_eq!(change["name"], "张三");
        assert_eq!(change["action"], "appointed");
        assert_eq!(change["position"], "教育部副部长");
        assert_eq!(change["organization"], "国务院");

        let feed_text = std::fs::read_to_string(processed_path(dir.path(), MODULE, "feed.json")).unwrap();
        let feed: serde_json::Value = serde_json::from_str(&feed_text).unwrap();
        assert_eq!(feed["items"][0]["importance"], "medium");
    }
}

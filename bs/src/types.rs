//! Dataset types for the retrieval store

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::store::StoreError;

/// A historical blocker from the blockers dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockerCandidate {
    pub id: String,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl BlockerCandidate {
    /// Text used for embedding this candidate
    pub fn embed_text(&self) -> String {
        format!("{} {} {}", self.title, self.summary, self.tags.join(" "))
    }
}

/// A ticket from the task-management dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Ticket {
    /// Text used for embedding this ticket
    pub fn embed_text(&self) -> String {
        format!("{} {}", self.title, self.tags.join(" "))
    }
}

/// Contact details for a team member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Contact {
    #[serde(default)]
    pub slack: String,
    #[serde(default)]
    pub email: String,
}

/// A team member from the team dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub contact: Contact,
}

/// A retrieved item with its ranking score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scored<T> {
    pub item: T,
    pub score: f32,
}

/// The full set of datasets the store serves
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Datasets {
    #[serde(default)]
    pub blockers: Vec<BlockerCandidate>,
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    #[serde(default)]
    pub team: Vec<TeamMember>,
    #[serde(default)]
    pub glossary: BTreeMap<String, String>,
}

impl Datasets {
    /// Load datasets from a directory of JSON files
    ///
    /// Expects `blockers.json`, `tickets.json`, `team.json`, and
    /// `glossary.json`. Missing files load as empty collections so a
    /// partial data directory still produces a usable store.
    pub fn load_dir(dir: &Path) -> Result<Self, StoreError> {
        debug!(dir = %dir.display(), "Datasets::load_dir: called");

        let blockers = load_json_file(&dir.join("blockers.json"))?.unwrap_or_default();
        let tickets = load_json_file(&dir.join("tickets.json"))?.unwrap_or_default();
        let team = load_json_file(&dir.join("team.json"))?.unwrap_or_default();
        let glossary = load_json_file(&dir.join("glossary.json"))?.unwrap_or_default();

        let datasets = Self {
            blockers,
            tickets,
            team,
            glossary,
        };

        info!(
            blockers = datasets.blockers.len(),
            tickets = datasets.tickets.len(),
            team = datasets.team.len(),
            glossary = datasets.glossary.len(),
            "Loaded datasets from {}",
            dir.display()
        );

        Ok(datasets)
    }

    /// Bundled sample data for demo mode and tests
    pub fn sample() -> Self {
        debug!("Datasets::sample: called");
        Self {
            blockers: vec![
                BlockerCandidate {
                    id: "b-101".to_string(),
                    title: "Sentiment widget renders blank in staging".to_string(),
                    summary: "Widget container mounts but ML service returns empty payload".to_string(),
                    resolution: Some("Stale model artifact; redeployed ml-service v2.3.1".to_string()),
                    tags: vec!["sentiment-widget".to_string(), "ml-service".to_string(), "staging".to_string()],
                },
                BlockerCandidate {
                    id: "b-102".to_string(),
                    title: "Feature flag hides checkout banner in non-prod".to_string(),
                    summary: "Banner gated behind checkout_v2 flag, off by default in staging".to_string(),
                    resolution: Some("Enabled flag for staging cohort".to_string()),
                    tags: vec!["feature-flag".to_string(), "staging".to_string()],
                },
                BlockerCandidate {
                    id: "b-103".to_string(),
                    title: "API gateway 502s under load test".to_string(),
                    summary: "Upstream timeout too low for batch inference endpoint".to_string(),
                    resolution: None,
                    tags: vec!["gateway".to_string(), "ml-service".to_string()],
                },
            ],
            tickets: vec![
                Ticket {
                    id: "t-501".to_string(),
                    title: "Roll out sentiment widget to staging".to_string(),
                    status: "in-progress".to_string(),
                    tags: vec!["sentiment-widget".to_string()],
                },
                Ticket {
                    id: "t-502".to_string(),
                    title: "Upgrade ml-service model pipeline".to_string(),
                    status: "open".to_string(),
                    tags: vec!["ml-service".to_string()],
                },
            ],
            team: vec![
                TeamMember {
                    name: "Priya Raman".to_string(),
                    role: "ML Engineer".to_string(),
                    skills: vec!["NLP".to_string(), "Model Debugging".to_string(), "Python".to_string()],
                    contact: Contact {
                        slack: "@priya".to_string(),
                        email: "priya@example.com".to_string(),
                    },
                },
                TeamMember {
                    name: "Dan Okafor".to_string(),
                    role: "Backend Engineer".to_string(),
                    skills: vec!["Flask API".to_string(), "Postgres".to_string()],
                    contact: Contact {
                        slack: "@dan".to_string(),
                        email: "dan@example.com".to_string(),
                    },
                },
            ],
            glossary: BTreeMap::from([
                (
                    "sentiment-widget".to_string(),
                    "Frontend widget showing per-message sentiment scores".to_string(),
                ),
                (
                    "ml-service".to_string(),
                    "Internal inference service backing sentiment and ranking features".to_string(),
                ),
            ]),
        }
    }
}

/// Read and parse one JSON dataset file, `None` if it does not exist
fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    if !path.exists() {
        debug!(path = %path.display(), "load_json_file: missing, skipping");
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| StoreError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let parsed = serde_json::from_str(&content).map_err(|e| StoreError::Json {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(parsed))
}

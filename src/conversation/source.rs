//! Citation sources attached to assistant answers

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::SourcesConfig;

/// A document excerpt the backend used to answer a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Document identifier, usually a file name
    pub source: String,

    #[serde(rename = "type", default)]
    pub source_type: String,

    /// Relevance score in [0, 1]
    #[serde(default)]
    pub relevance: f64,

    #[serde(default)]
    pub content_preview: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    #[serde(default)]
    pub section: String,
}

impl Source {
    /// Page number usable as an anchor; a zero page counts as absent.
    pub fn page_number(&self) -> Option<u32> {
        self.page.filter(|page| *page > 0)
    }

    /// Path of the served document: `{base}/{source}[.ext][#page=N]`.
    pub fn resource_path(&self, config: &SourcesConfig) -> String {
        let mut path = format!(
            "{}/{}",
            config.pdf_base_path.trim_end_matches('/'),
            self.source
        );
        if Path::new(&self.source).extension().is_none() && !config.default_extension.is_empty() {
            path.push('.');
            path.push_str(&config.default_extension);
        }
        if let Some(page) = self.page_number() {
            path.push_str(&format!("#page={page}"));
        }
        path
    }

    fn same_citation(&self, other: &Source) -> bool {
        self.source == other.source && self.page == other.page
    }
}

/// Collapse sources sharing the same (identifier, page), keeping the first occurrence.
pub fn dedup_sources(sources: &[Source]) -> Vec<Source> {
    let mut unique: Vec<Source> = Vec::with_capacity(sources.len());
    for source in sources {
        if !unique.iter().any(|kept| kept.same_citation(source)) {
            unique.push(source.clone());
        }
    }
    unique
}

/// How strongly a listed source matched the question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelevanceTier {
    High,
    Medium,
    Low,
}

impl RelevanceTier {
    pub fn classify(relevance: f64, config: &SourcesConfig) -> Self {
        if relevance > config.high_relevance {
            Self::High
        } else if relevance > config.medium_relevance {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// A source prepared for display below an answer
#[derive(Debug, Clone, Serialize)]
pub struct ListedSource {
    pub source: Source,
    pub href: String,
    pub tier: RelevanceTier,
    /// e.g. "87% match"
    pub match_label: String,
    /// e.g. "Page 3"
    pub page_label: Option<String>,
}

/// De-duplicate, then keep only sources relevant enough to show.
pub fn listed_sources(sources: &[Source], config: &SourcesConfig) -> Vec<ListedSource> {
    dedup_sources(sources)
        .into_iter()
        .filter(|source| source.relevance >= config.min_relevance)
        .map(|source| ListedSource {
            href: source.resource_path(config),
            tier: RelevanceTier::classify(source.relevance, config),
            match_label: format!("{:.0}% match", source.relevance * 100.0),
            page_label: source.page_number().map(|page| format!("Page {page}")),
            source,
        })
        .collect()
}

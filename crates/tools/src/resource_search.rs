//! Best-effort verified-resource search. The supervisor folds the
//! result into its prompt; on any error the caller substitutes a
//! fallback string and carries on.

use async_trait::async_trait;

use cc_domain::Result;

#[async_trait]
pub trait ResourceSearch: Send + Sync {
    /// Search for verified resources matching `query`, biased by the
    /// caller's identity `context`.
    async fn search(&self, query: &str, context: &str) -> Result<String>;
}

/// A small built-in catalog, keyword-filtered. Stands in for the real
/// semantic search service behind the same trait.
pub struct StaticResourceSearch {
    catalog: Vec<CatalogEntry>,
}

struct CatalogEntry {
    tags: &'static [&'static str],
    text: &'static str,
}

impl Default for StaticResourceSearch {
    fn default() -> Self {
        Self {
            catalog: vec![
                CatalogEntry {
                    tags: &["veteran", "military", "transition"],
                    text: "Organization: Clean Energy Veterans Network\n\
                           Contact: programs@cevn.example\n\
                           Offers MOS-to-civilian skill translation and paid solar apprenticeships.",
                },
                CatalogEntry {
                    tags: &["international", "credential", "visa"],
                    text: "Organization: Credential Bridge Center\n\
                           Website: credentialbridge.example\n\
                           Evaluates international degrees and maps them to state licensing tracks.",
                },
                CatalogEntry {
                    tags: &["community", "justice", "equity", "environmental"],
                    text: "Organization: Frontline Communities Coalition\n\
                           Contact: organize@fcc.example\n\
                           Grassroots organizing fellowships and community-benefit project roles.",
                },
                CatalogEntry {
                    tags: &["career", "resume", "training", "skills", "job"],
                    text: "Organization: Climate Careers Hub\n\
                           Website: climatecareershub.example\n\
                           Resume clinics, skills-gap reviews, and a clean-energy job board.",
                },
            ],
        }
    }
}

impl StaticResourceSearch {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceSearch for StaticResourceSearch {
    async fn search(&self, query: &str, context: &str) -> Result<String> {
        let haystack = format!("{query} {context}").to_lowercase();
        let hits: Vec<&str> = self
            .catalog
            .iter()
            .filter(|e| e.tags.iter().any(|t| haystack.contains(t)))
            .map(|e| e.text)
            .collect();

        if hits.is_empty() {
            // Generalist fallback entry rather than an empty result.
            return Ok(self.catalog.last().map(|e| e.text).unwrap_or("").to_owned());
        }
        Ok(hits.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn veteran_query_finds_veteran_resources() {
        let search = StaticResourceSearch::new();
        let text = search
            .search("military veteran solar jobs", "identity: veteran")
            .await
            .unwrap();
        assert!(text.contains("Clean Energy Veterans Network"));
    }

    #[tokio::test]
    async fn unmatched_query_falls_back_to_generalist_entry() {
        let search = StaticResourceSearch::new();
        let text = search.search("zzz", "zzz").await.unwrap();
        assert!(text.contains("Climate Careers Hub"));
    }
}

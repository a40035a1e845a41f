//! Registry for managing search source plugins.

use std::collections::HashMap;
use std::sync::Arc;

use super::{
    ArxivSource, CrossRefSource, DblpSource, DoajSource, ElsevierSource, IeeeXploreSource,
    LensSource, OpenAlexSource, PlosSource, PubMedSource, SemanticScholarSource, Source,
    SourceError, SpringerSource,
};
use crate::config::Config;

bitflags::bitflags! {
    /// Capabilities that a source can support
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SourceCapabilities: u32 {
        const SEARCH = 1 << 0;
        const DOI_LOOKUP = 1 << 1;
        const OPEN_ACCESS = 1 << 2;
    }
}

impl SourceCapabilities {
    /// Flag names joined with `|`, e.g. `SEARCH|DOI_LOOKUP`
    pub fn describe(&self) -> String {
        self.iter_names()
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Registry for all available search sources
///
/// Sources keep their registration order, which is also the order the
/// search tool queries them and concatenates their results.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
    index: HashMap<String, usize>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in source, configured from `config`
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let email = config.contact_email().map(str::to_string);
        let keys = &config.api_keys;
        let timeout = config.fetch.search_timeout();

        let mut registry = Self::new();
        registry.register(Arc::new(
            OpenAlexSource::new(email.clone())?.with_timeout(timeout),
        ));
        registry.register(Arc::new(ArxivSource::new()?));
        registry.register(Arc::new(PlosSource::new()?.with_timeout(timeout)));
        registry.register(Arc::new(
            CrossRefSource::new(email)?
                .with_timeout(timeout)
                .with_lookup_timeout(config.fetch.lookup_timeout()),
        ));
        registry.register(Arc::new(DoajSource::new()?.with_timeout(timeout)));
        registry.register(Arc::new(DblpSource::new()?.with_timeout(timeout)));
        registry.register(Arc::new(
            PubMedSource::new(keys.pubmed.clone())?.with_timeout(timeout),
        ));
        registry.register(Arc::new(
            SemanticScholarSource::new(keys.semantic_scholar.clone())?.with_timeout(timeout),
        ));
        registry.register(Arc::new(
            SpringerSource::new(keys.springer.clone())?.with_timeout(timeout),
        ));
        registry.register(Arc::new(
            IeeeXploreSource::new(keys.ieee.clone())?.with_timeout(timeout),
        ));
        registry.register(Arc::new(
            ElsevierSource::new(keys.elsevier.clone())?.with_timeout(timeout),
        ));
        registry.register(Arc::new(
            LensSource::new(keys.lens.clone())?.with_timeout(timeout),
        ));

        Ok(registry)
    }

    /// Register a new source, replacing any source with the same id in place
    pub fn register(&mut self, source: Arc<dyn Source>) {
        let id = source.id().to_string();
        match self.index.get(&id) {
            Some(&pos) => self.sources[pos] = source,
            None => {
                self.index.insert(id, self.sources.len());
                self.sources.push(source);
            }
        }
    }

    /// Get all registered sources in registration order
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.iter()
    }

    /// Get all source IDs in registration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.id())
    }

    /// Get sources that support a specific capability
    pub fn with_capability(&self, capability: SourceCapabilities) -> Vec<&Arc<dyn Source>> {
        self.all()
            .filter(|s| s.capabilities().contains(capability))
            .collect()
    }

    /// Get sources that support search
    pub fn searchable(&self) -> Vec<&Arc<dyn Source>> {
        self.with_capability(SourceCapabilities::SEARCH)
    }

    /// Searchable sources selected by id, in registration order.
    ///
    /// An empty `requested` list selects every searchable source. Unknown
    /// ids select nothing.
    pub fn select(&self, requested: &[String]) -> Vec<Arc<dyn Source>> {
        self.searchable()
            .into_iter()
            .filter(|s| requested.is_empty() || requested.iter().any(|r| r == s.id()))
            .cloned()
            .collect()
    }

    /// Get the number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockSource;

    fn registry() -> SourceRegistry {
        SourceRegistry::from_config(&Config::default()).unwrap()
    }

    #[test]
    fn test_registry_order() {
        let registry = registry();
        let ids: Vec<&str> = registry.ids().collect();
        assert_eq!(
            ids,
            vec![
                "openalex",
                "arxiv",
                "plos",
                "crossref",
                "doaj",
                "dblp",
                "pubmed",
                "semantic_scholar",
                "springer",
                "ieee",
                "elsevier",
                "lens"
            ]
        );
    }

    #[test]
    fn test_select_by_id() {
        let registry = registry();

        let arxiv = registry.select(&["arxiv".to_string()]);
        assert_eq!(arxiv.len(), 1);
        assert_eq!(arxiv[0].name(), "arXiv");
    }

    #[test]
    fn test_capabilities() {
        let registry = registry();
        assert_eq!(registry.searchable().len(), 12);

        let lookups = registry.with_capability(SourceCapabilities::DOI_LOOKUP);
        assert_eq!(lookups.len(), 1);
        assert_eq!(lookups[0].id(), "crossref");
        assert_eq!(lookups[0].capabilities().describe(), "SEARCH|DOI_LOOKUP");
    }

    #[test]
    fn test_select() {
        let registry = registry();

        assert_eq!(registry.select(&[]).len(), 12);

        let picked = registry.select(&["dblp".to_string(), "arxiv".to_string()]);
        let ids: Vec<&str> = picked.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["arxiv", "dblp"]);

        assert!(registry.select(&["nope".to_string()]).is_empty());
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut registry = SourceRegistry::new();
        registry.register(Arc::new(MockSource::new("a")));
        registry.register(Arc::new(MockSource::new("b")));
        registry.register(Arc::new(MockSource::new("a")));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}

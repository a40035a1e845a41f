//! `academic_search`: one query fanned out over every selected source.

use futures_util::future::BoxFuture;
use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{ToolError, ToolResult};
use crate::fs::FileSystem;
use crate::models::{
    PaperResult, SearchQuery, SearchResponse, DEFAULT_MAX_RESULTS, MAX_RESULTS_LIMIT,
};
use crate::sources::{Source, SourceError, SourceRegistry};

type SourceOutcome = (Arc<dyn Source>, Result<SearchResponse, SourceError>);

/// Arguments accepted by [`SearchTool::execute`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchArgs {
    #[serde(default)]
    pub query: String,

    /// Source ids to query; empty or absent means the configured default
    #[serde(default)]
    pub sources: Option<Vec<String>>,

    /// Per-source cap, honoured only within 1..=20
    #[serde(default)]
    pub max_results: Option<i64>,

    #[serde(default)]
    pub save_to: Option<String>,
}

/// Fans a query out over the registry and merges the results
#[derive(Debug, Clone)]
pub struct SearchTool {
    registry: Arc<SourceRegistry>,
    fs: Arc<dyn FileSystem>,
    default_max_results: usize,
    max_concurrent: usize,
    default_sources: Vec<String>,
}

impl SearchTool {
    pub fn new(registry: Arc<SourceRegistry>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            registry,
            fs,
            default_max_results: DEFAULT_MAX_RESULTS,
            max_concurrent: 4,
            default_sources: Vec::new(),
        }
    }

    pub fn with_default_max_results(mut self, max: usize) -> Self {
        self.default_max_results = max.clamp(1, MAX_RESULTS_LIMIT);
        self
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    pub fn with_default_sources(mut self, sources: Vec<String>) -> Self {
        self.default_sources = sources;
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub async fn execute(&self, args: SearchArgs, cancel: &CancellationToken) -> ToolResult {
        match self.run(args, cancel).await {
            Ok(result) => result,
            Err(e) => e.into(),
        }
    }

    async fn run(
        &self,
        args: SearchArgs,
        cancel: &CancellationToken,
    ) -> Result<ToolResult, ToolError> {
        let query_text = args.query.trim();
        if query_text.is_empty() {
            return Err(ToolError::MissingArgument("query"));
        }

        let max_results = match args.max_results {
            Some(n) if n >= 1 && n <= MAX_RESULTS_LIMIT as i64 => n as usize,
            _ => self.default_max_results,
        };

        let requested = match args.sources {
            Some(sources) if !sources.is_empty() => sources,
            _ => self.default_sources.clone(),
        };
        let selected = self.registry.select(&requested);

        tracing::info!(
            query = query_text,
            sources = selected.len(),
            max_results,
            "searching"
        );

        let query = SearchQuery::new(query_text).max_results(max_results);
        let query = &query;

        // Boxed up front so the fan-out stays Send inside async-trait handlers
        let searches: Vec<BoxFuture<'_, SourceOutcome>> = selected
            .into_iter()
            .map(|source| {
                Box::pin(async move {
                    let result = source.search(query).await;
                    (source, result)
                }) as BoxFuture<'_, SourceOutcome>
            })
            .collect();

        // buffered keeps invocation order while running up to max_concurrent at once
        let fan_out = stream::iter(searches)
            .buffered(self.max_concurrent)
            .collect::<Vec<_>>();

        let outcomes = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ToolError::Cancelled("search")),
            outcomes = fan_out => outcomes,
        };

        let mut papers: Vec<PaperResult> = Vec::new();
        let mut errors: Vec<String> = Vec::new();
        for (source, result) in outcomes {
            match result {
                Ok(response) => {
                    tracing::debug!(source = source.id(), found = response.len(), "source answered");
                    papers.extend(response.papers);
                }
                Err(e) => {
                    tracing::warn!(source = source.id(), error = %e, "source search failed");
                    errors.push(format!("{}: {}", source.id(), e));
                }
            }
        }

        if papers.is_empty() && !errors.is_empty() {
            return Err(ToolError::AllSourcesFailed(errors));
        }

        let text = render_results(query_text, &papers, &errors);

        match args.save_to.as_deref().filter(|p| !p.is_empty()) {
            Some(save_to) => {
                self.fs
                    .write_file(Path::new(save_to), text.as_bytes())
                    .await
                    .map_err(|source| ToolError::Write {
                        context: "search succeeded but failed to save results",
                        source,
                    })?;
                tracing::info!(path = save_to, papers = papers.len(), "saved search results");
                Ok(ToolResult::success(
                    format!(
                        "Found {} papers for {:?}. Results saved to {}",
                        papers.len(),
                        query_text,
                        save_to
                    ),
                    text,
                ))
            }
            None => Ok(ToolResult::text(text)),
        }
    }
}

fn render_results(query: &str, papers: &[PaperResult], errors: &[String]) -> String {
    let mut out = format!(
        "Academic search results for: {:?}\nFound {} papers\n",
        query,
        papers.len()
    );
    if !errors.is_empty() {
        out.push_str(&format!("Errors: {}\n", errors.join("; ")));
    }
    out.push('\n');

    for (i, paper) in papers.iter().enumerate() {
        out.push_str(&format!("--- Paper {} ---\n", i + 1));
        out.push_str(&paper.format());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::HostFs;
    use crate::sources::mock::make_paper;
    use crate::sources::MockSource;

    fn tool(sources: Vec<MockSource>) -> SearchTool {
        let mut registry = SourceRegistry::new();
        for source in sources {
            registry.register(Arc::new(source));
        }
        SearchTool::new(Arc::new(registry), Arc::new(HostFs))
    }

    fn args(query: &str) -> SearchArgs {
        SearchArgs {
            query: query.to_string(),
            ..SearchArgs::default()
        }
    }

    #[tokio::test]
    async fn test_missing_query() {
        let result = tool(vec![]).execute(args("  "), &CancellationToken::new()).await;
        assert!(result.is_error);
        assert_eq!(result.for_llm, "query is required");
    }

    #[tokio::test]
    async fn test_results_keep_source_order_and_note_errors() {
        let tool = tool(vec![
            MockSource::new("first").with_papers(vec![make_paper("A1", "First")]),
            MockSource::new("broken").failing("boom"),
            MockSource::new("second").with_papers(vec![
                make_paper("B1", "Second"),
                make_paper("B2", "Second"),
            ]),
        ]);

        let result = tool.execute(args("q"), &CancellationToken::new()).await;
        assert!(!result.is_error);
        let text = &result.for_llm;
        assert!(text.starts_with("Academic search results for: \"q\"\nFound 3 papers\n"));
        assert!(text.contains("Errors: broken: API error: boom\n"));
        let a1 = text.find("Title: A1").unwrap();
        let b1 = text.find("Title: B1").unwrap();
        let b2 = text.find("Title: B2").unwrap();
        assert!(a1 < b1 && b1 < b2);
        assert!(text.contains("--- Paper 3 ---"));
    }

    #[tokio::test]
    async fn test_all_failed() {
        let tool = tool(vec![
            MockSource::new("a").failing("x"),
            MockSource::new("b").failing("y"),
        ]);
        let result = tool.execute(args("q"), &CancellationToken::new()).await;
        assert!(result.is_error);
        assert_eq!(
            result.for_llm,
            "all searches failed: a: API error: x; b: API error: y"
        );
    }

    #[tokio::test]
    async fn test_unknown_sources_find_nothing() {
        let tool = tool(vec![MockSource::new("a").with_papers(vec![make_paper("A", "a")])]);
        let result = tool
            .execute(
                SearchArgs {
                    sources: Some(vec!["nope".to_string()]),
                    ..args("q")
                },
                &CancellationToken::new(),
            )
            .await;
        assert!(!result.is_error);
        assert!(result.for_llm.contains("Found 0 papers"));
    }

    #[tokio::test]
    async fn test_max_results_out_of_range_uses_default() {
        let papers: Vec<_> = (0..30).map(|i| make_paper(&format!("P{}", i), "m")).collect();
        let tool = tool(vec![MockSource::new("m").with_papers(papers)]);

        let result = tool
            .execute(
                SearchArgs {
                    max_results: Some(50),
                    ..args("q")
                },
                &CancellationToken::new(),
            )
            .await;
        assert!(result.for_llm.contains("Found 5 papers"));

        let result = tool
            .execute(
                SearchArgs {
                    max_results: Some(7),
                    ..args("q")
                },
                &CancellationToken::new(),
            )
            .await;
        assert!(result.for_llm.contains("Found 7 papers"));
    }

    #[tokio::test]
    async fn test_save_to_writes_full_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/results.txt");
        let tool = tool(vec![MockSource::new("a").with_papers(vec![make_paper("A", "a")])]);

        let result = tool
            .execute(
                SearchArgs {
                    save_to: Some(path.to_string_lossy().to_string()),
                    ..args("q")
                },
                &CancellationToken::new(),
            )
            .await;

        assert!(!result.is_error);
        assert!(result.for_llm.starts_with("Found 1 papers for \"q\". Results saved to "));
        let saved = std::fs::read_to_string(&path).unwrap();
        assert_eq!(saved, result.for_user);
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn test_execute_future_is_send() {
        let tool = tool(vec![MockSource::new("a")]);
        let cancel = CancellationToken::new();
        let fut = tool.execute(args("q"), &cancel);
        assert_send(&fut);
    }

    #[tokio::test]
    async fn test_cancelled_search() {
        let tool = tool(vec![MockSource::new("a")]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = tool.execute(args("q"), &cancel).await;
        assert!(result.is_error);
        assert_eq!(result.for_llm, "search was cancelled");
    }
}

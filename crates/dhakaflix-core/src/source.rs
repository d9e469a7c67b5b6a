//! Main API for the DhakaFlix mirrors
//!
//! Combines the HTTP client, the fan-out search, the crawl resolver and the
//! page parsers behind the four calls a media host needs.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use crate::client::DhakaflixClient;
use crate::config::{ServerDescriptor, SourceConfig};
use crate::crawl::CrawlResolver;
use crate::error::{DhakaflixError, Result};
use crate::parser::{
    EpisodePage, parse_catalog_page, parse_episode_number, parse_movie_episode,
    parse_series_episodes,
};
use crate::parser::listing::is_video_file;
use crate::relevance::Relevance;
use crate::search::SearchCoordinator;
use crate::types::{Entry, Episode, EpisodeCandidate, VideoLink};
use crate::url::{host_root, sanitize_url};

/// Main API for the DhakaFlix mirrors
///
/// Holds one pooled client and one search cache for its whole lifetime;
/// share it behind an `Arc` rather than building one per call.
pub struct DhakaflixSource {
    config: SourceConfig,
    client: DhakaflixClient,
    coordinator: SearchCoordinator,
    resolver: CrawlResolver,
    relevance: Arc<Relevance>,
}

impl DhakaflixSource {
    /// Create a source for the stock DhakaFlix mirror set
    ///
    /// # Errors
    /// Returns error if HTTP client initialization fails
    pub fn new() -> Result<Self> {
        Self::with_config(SourceConfig::dhakaflix())
    }

    /// Create a source from a custom configuration
    ///
    /// The configuration is validated up front.
    ///
    /// # Errors
    /// - `InvalidConfig` if the configuration is unusable
    /// - `HttpError` if HTTP client initialization fails
    pub fn with_config(config: SourceConfig) -> Result<Self> {
        config.validate()?;

        let client = DhakaflixClient::with_config(&config.client)?;
        let relevance = Arc::new(Relevance::new(config.relevance.clone()));
        let coordinator = SearchCoordinator::new(
            client.clone(),
            config.servers.clone(),
            config.search.clone(),
            Arc::clone(&relevance),
        );
        let resolver = CrawlResolver::new(
            client.clone(),
            config.crawl.clone(),
            Arc::clone(&relevance),
        );

        Ok(Self {
            config,
            client,
            coordinator,
            resolver,
            relevance,
        })
    }

    pub fn servers(&self) -> &[ServerDescriptor] {
        &self.config.servers
    }

    /// Search every mirror for a title
    ///
    /// A blank query falls back to [`DhakaflixSource::list_popular`].
    ///
    /// # Errors
    /// `NoResults` if no mirror answered in time
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> dhakaflix_core::Result<()> {
    /// use dhakaflix_core::DhakaflixSource;
    /// let source = DhakaflixSource::new()?;
    /// for entry in source.search("interstellar").await? {
    ///     println!("{}: {}", entry.title, entry.location);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn search(&self, query: &str) -> Result<Vec<Entry>> {
        if query.trim().is_empty() {
            debug!("blank query, browsing instead");
            return self.list_popular().await;
        }
        self.coordinator.search(query).await
    }

    /// Browse listing from every mirror's popular folder
    ///
    /// Mirrors are fetched concurrently and their entries concatenated in
    /// configuration order. A mirror that fails contributes nothing.
    ///
    /// # Errors
    /// `NoResults` if every mirror failed
    pub async fn list_popular(&self) -> Result<Vec<Entry>> {
        let pages = join_all(self.config.servers.iter().map(|server| self.popular_page(server))).await;

        let mut entries = Vec::new();
        let mut answered = 0;
        for (server, page) in self.config.servers.iter().zip(pages) {
            match page {
                Ok(found) => {
                    answered += 1;
                    entries.extend(found);
                }
                Err(e) => warn!(server = %server.name, error = %e, "popular page failed"),
            }
        }

        if answered == 0 {
            return Err(DhakaflixError::NoResults(
                "no server returned a popular page".to_string(),
            ));
        }
        info!(entries = entries.len(), answered, "popular listing complete");
        Ok(entries)
    }

    async fn popular_page(&self, server: &ServerDescriptor) -> Result<Vec<Entry>> {
        let address = sanitize_url(&format!(
            "{}/{}",
            server.base_url.trim_end_matches('/'),
            server.popular_path
        ));
        let page_url = Url::parse(&address)
            .map_err(|e| DhakaflixError::InvalidUrl(format!("{}: {}", address, e)))?;

        let html = self.client.fetch(page_url.as_str(), server.timeout).await?;
        parse_catalog_page(&html, &page_url, &server.thumbnail_file, &self.relevance)
    }

    /// Playable items behind a search or browse entry
    ///
    /// Structured movie and series pages are read directly; plain listings
    /// are crawled. The whole call is bounded by the episode deadline.
    ///
    /// # Errors
    /// - `InvalidUrl` if `location` is not an absolute address
    /// - `NoResults` if nothing playable was found in time
    pub async fn list_episodes(&self, location: &str) -> Result<Vec<Episode>> {
        let address = sanitize_url(location);
        let start = Url::parse(&address)
            .map_err(|e| DhakaflixError::InvalidUrl(format!("{}: {}", address, e)))?;
        let deadline = self.resolver.config().episode_deadline;

        match timeout(deadline, self.resolve_episodes(start)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(location = %address, ?deadline, "episode listing timed out");
                Err(DhakaflixError::NoResults(format!(
                    "timed out listing {}",
                    address
                )))
            }
        }
    }

    async fn resolve_episodes(&self, start: Url) -> Result<Vec<Episode>> {
        let extensions = &self.resolver.config().video_extensions;
        if is_video_file(start.path(), extensions) {
            return Ok(self
                .resolver
                .resolve(start.as_str())
                .await?
                .into_iter()
                .map(to_episode)
                .collect());
        }

        let html = match self.client.fetch(start.as_str(), self.resolver.config().fetch_timeout).await {
            Ok(html) => html,
            Err(e) => {
                warn!(location = %start, error = %e, "could not open entry");
                return Err(DhakaflixError::NoResults(format!("{}: {}", start, e)));
            }
        };

        match EpisodePage::detect(&html)? {
            EpisodePage::Movie => {
                if let Some(episode) = parse_movie_episode(&html, &start)? {
                    return Ok(vec![episode]);
                }
            }
            EpisodePage::Series => {
                let episodes = parse_series_episodes(&html, &start)?;
                if !episodes.is_empty() {
                    return Ok(episodes);
                }
            }
            EpisodePage::Listing => {}
        }

        let candidates = self.resolver.crawl(start, Some(html)).await?;
        Ok(candidates.into_iter().map(to_episode).collect())
    }

    /// Stream description for an episode address
    ///
    /// Mirrors check the `Referer` header, so the link carries the mirror's
    /// root as referer along with the client's user agent.
    ///
    /// # Errors
    /// `InvalidUrl` if `episode_url` has no host
    pub fn playable_links(&self, episode_url: &str) -> Result<Vec<VideoLink>> {
        let url = sanitize_url(episode_url);
        let root = host_root(&url).ok_or_else(|| DhakaflixError::InvalidUrl(url.clone()))?;

        let headers = HashMap::from([
            ("Referer".to_string(), format!("{}/", root)),
            ("User-Agent".to_string(), self.config.client.user_agent.clone()),
        ]);

        Ok(vec![VideoLink {
            url,
            label: "Video".to_string(),
            headers,
        }])
    }
}

fn to_episode(candidate: EpisodeCandidate) -> Episode {
    let number = parse_episode_number(&candidate.display_name);
    Episode {
        episode_number: Some(number),
        ..Episode::from(candidate)
    }
}

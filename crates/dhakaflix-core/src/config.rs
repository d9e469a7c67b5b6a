//! Configuration for the DhakaFlix source
//!
//! Every tunable the engine uses lives here as a named field with a
//! `Default`. A [`SourceConfig`] is built once, validated, and never
//! mutated afterwards.

use std::time::Duration;

use url::Url;

use crate::error::{DhakaflixError, Result};
use crate::relevance::MAX_FOLDER_BONUS;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Wire format a server answers search RPCs with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVariant {
    /// JSON object with a `search` array of `{href}` objects; folders are
    /// recognised by a trailing `/` on `href`
    SearchArray,
    /// Loosely structured body scanned for repeated `"href"`/`"size"`
    /// pairs; `size: null` marks a folder
    SizedPairs,
}

/// One mirror and the places on it worth searching
#[derive(Debug, Clone)]
pub struct ServerDescriptor {
    /// Human readable name (e.g., "DhakaFlix (Anime & Documentary)")
    pub name: String,
    /// Scheme and host, no trailing slash (e.g., "http://172.16.50.9")
    pub base_url: String,
    /// First path segment identifying the share (e.g., "DHAKA-FLIX-9")
    pub server_id: String,
    /// Path prefixes the search RPC is scoped to; the share root plus any
    /// hot sub-folders that are faster to search directly
    pub search_paths: Vec<String>,
    /// Already-escaped path of the listing used for the popular page
    pub popular_path: String,
    pub protocol: ProtocolVariant,
    /// Per-request timeout for this server
    pub timeout: Duration,
    /// Folder-art file the server keeps inside each folder
    pub thumbnail_file: String,
}

impl ServerDescriptor {
    /// Descriptor with the share root as its only search path
    pub fn new(name: &str, base_url: &str, server_id: &str, protocol: ProtocolVariant) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            server_id: server_id.to_string(),
            search_paths: vec![format!("/{}/", server_id)],
            popular_path: format!("{}/", server_id),
            protocol,
            timeout: Duration::from_secs(10),
            thumbnail_file: "a_AL_.jpg".to_string(),
        }
    }

    /// Add a sub-folder (relative to the share root) to search
    pub fn with_search_path(mut self, sub_folder: &str) -> Self {
        self.search_paths
            .push(format!("/{}/{}/", self.server_id, sub_folder.trim_matches('/')));
        self
    }

    pub fn with_popular_path(mut self, escaped_path: &str) -> Self {
        self.popular_path = format!("{}/{}", self.server_id, escaped_path.trim_start_matches('/'));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_thumbnail_file(mut self, file: &str) -> Self {
        self.thumbnail_file = file.to_string();
        self
    }
}

/// How uploader tags are matched against titles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMatch {
    /// Tag at the end of the title, or followed by `.` or a space
    Suffix,
    /// Tag anywhere in the title
    Contains,
}

/// Noise filtering and ranking knobs
#[derive(Debug, Clone)]
pub struct RelevanceConfig {
    /// Entries scoring below this are dropped (0.0 disables the cutoff)
    pub min_score: f64,
    /// Added to folder scores so containers win ties against files
    pub folder_bonus: f64,
    /// Listing chrome, matched as case-insensitive substrings
    pub chrome_phrases: Vec<String>,
    /// Listing column headers, matched as whole titles (case-insensitive)
    pub column_headers: Vec<String>,
    /// Release-group tags including their leading marker (e.g., "-YIFY")
    pub uploader_tags: Vec<String>,
    pub tag_match: TagMatch,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            min_score: 0.15,
            folder_bonus: 0.1,
            chrome_phrases: to_strings(&[
                "Parent Directory",
                "Index of",
                "powered by",
                "modern browsers",
                "JavaScript",
                "_h5ai",
            ]),
            column_headers: to_strings(&["Name", "Size", "Last modified", "Description"]),
            uploader_tags: to_strings(&[
                "-LOKI", "-LOKiHD", "-TDoc", "-Tuna", "-PSA", "-Pahe", "-QxR", "-YIFY", "-RARBG",
            ]),
            tag_match: TagMatch::Suffix,
        }
    }
}

/// Fan-out search knobs
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Budget for the whole fan-out; partial results are used on expiry
    pub overall_deadline: Duration,
    /// How long a completed result set is served from cache
    pub cache_ttl: Duration,
    /// Drop files that live inside a folder present in the same result set
    pub collapse_nested: bool,
    /// Suffixes appended to the query as extra search tasks
    pub query_suffixes: Vec<String>,
    /// Upper bound on query variants per (server, path), excluding the
    /// plain query
    pub max_query_variants: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            overall_deadline: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(30 * 60),
            collapse_nested: true,
            query_suffixes: Vec::new(),
            max_query_variants: 2,
        }
    }
}

/// Ordering applied to crawled episodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeSort {
    NameDescending,
    NameAscending,
}

/// Directory crawl knobs
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Sub-directory levels below the start location the walk may enter
    pub max_depth: u32,
    /// Directory fetches allowed in flight at once
    pub max_concurrent_fetches: usize,
    /// Lower-case extensions, without the dot, that count as playable
    pub video_extensions: Vec<String>,
    /// Budget for a whole episode listing
    pub episode_deadline: Duration,
    /// Timeout for a single directory fetch
    pub fetch_timeout: Duration,
    pub sort: EpisodeSort,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_concurrent_fetches: 10,
            video_extensions: to_strings(&["mkv", "mp4", "avi", "ts", "m4v", "webm", "mov"]),
            episode_deadline: Duration::from_secs(45),
            fetch_timeout: Duration::from_secs(15),
            sort: EpisodeSort::NameDescending,
        }
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// TCP connect timeout (default: 5s)
    pub connect_timeout: Duration,
    /// Extra attempts for transient failures (default: 1)
    pub max_retries: u32,
    /// Fixed pause before each retry (default: 500ms)
    pub retry_backoff: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            max_retries: 1,
            retry_backoff: Duration::from_millis(500),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// Everything a [`crate::DhakaflixSource`] needs, fixed for its lifetime
#[derive(Debug, Clone, Default)]
pub struct SourceConfig {
    pub servers: Vec<ServerDescriptor>,
    pub client: ClientConfig,
    pub search: SearchConfig,
    pub relevance: RelevanceConfig,
    pub crawl: CrawlConfig,
}

impl SourceConfig {
    /// Configuration with the given servers and default tunables
    pub fn with_servers(servers: Vec<ServerDescriptor>) -> Self {
        Self {
            servers,
            ..Self::default()
        }
    }

    /// The four known DhakaFlix mirrors
    pub fn dhakaflix() -> Self {
        Self::with_servers(vec![
            ServerDescriptor::new(
                "DhakaFlix (Hindi & South Indian)",
                "http://172.16.50.14",
                "DHAKA-FLIX-14",
                ProtocolVariant::SearchArray,
            )
            .with_popular_path("Hindi%20Movies/%282026%29/"),
            ServerDescriptor::new(
                "DhakaFlix (TV & Web Series)",
                "http://172.16.50.12",
                "DHAKA-FLIX-12",
                ProtocolVariant::SearchArray,
            )
            .with_search_path("TV-WEB-Series")
            .with_search_path("Hindi Movies")
            .with_popular_path(
                "TV-WEB-Series/TV%20Series%20%E2%99%A5%20%20A%20%20%E2%80%94%20%20L/",
            ),
            ServerDescriptor::new(
                "DhakaFlix (Anime & Documentary)",
                "http://172.16.50.9",
                "DHAKA-FLIX-9",
                ProtocolVariant::SearchArray,
            )
            .with_search_path("Anime & Cartoon TV Series")
            .with_search_path("Anime & Cartoon Movies")
            .with_popular_path(
                "Anime%20%26%20Cartoon%20TV%20Series/Anime-TV%20Series%20%E2%99%A5%20%20A%20%20%E2%80%94%20%20F/",
            )
            .with_thumbnail_file("a11.jpg"),
            ServerDescriptor::new(
                "DhakaFlix (English & International)",
                "http://172.16.50.7",
                "DHAKA-FLIX-7",
                ProtocolVariant::SizedPairs,
            )
            .with_popular_path("English%20Movies/%282026%29/")
            .with_timeout(Duration::from_secs(20)),
        ])
    }

    /// Reject configurations that could only fail later, at call time
    pub fn validate(&self) -> Result<()> {
        if self.servers.is_empty() {
            return Err(invalid("no servers configured"));
        }

        for server in &self.servers {
            Url::parse(&server.base_url).map_err(|e| {
                invalid(&format!("server {}: bad base url {}: {}", server.name, server.base_url, e))
            })?;
            if server.server_id.trim().is_empty() {
                return Err(invalid(&format!("server {}: empty server id", server.name)));
            }
            if server.search_paths.is_empty() {
                return Err(invalid(&format!("server {}: no search paths", server.name)));
            }
            if server.timeout.is_zero() {
                return Err(invalid(&format!("server {}: zero timeout", server.name)));
            }
        }

        if self.search.overall_deadline.is_zero() {
            return Err(invalid("overall search deadline is zero"));
        }
        if self.crawl.max_concurrent_fetches == 0 {
            return Err(invalid("crawl concurrency limit is zero"));
        }
        if self.crawl.episode_deadline.is_zero() || self.crawl.fetch_timeout.is_zero() {
            return Err(invalid("crawl timeouts must be non-zero"));
        }
        if !(0.0..MAX_FOLDER_BONUS).contains(&self.relevance.folder_bonus) {
            return Err(invalid(&format!(
                "folder bonus must be in [0, {}), got {}",
                MAX_FOLDER_BONUS, self.relevance.folder_bonus
            )));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> DhakaflixError {
    DhakaflixError::InvalidConfig(message.to_string())
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

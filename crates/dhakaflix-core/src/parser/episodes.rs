//! Structured episode page parsers
//!
//! Some mirrors render a catalog entry as a page with lazy-loaded media
//! instead of a bare listing. Movie pages reference `/m/lazyload/` in their
//! scripts, series pages `/s/lazyload/`.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use url::Url;

use crate::error::Result;
use crate::parser::{own_text, selector};
use crate::types::Episode;
use crate::url::resolve_link;

static EPISODE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Episode|Ep|E|Vol)\.?\s*(\d+(?:\.\d+)?)").expect("static pattern")
});
static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)").expect("static pattern"));
static BADGE_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+ [GM]B|\d+ [GM]B).*").expect("static pattern"));

/// What kind of page a catalog entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodePage {
    Movie,
    Series,
    /// Plain directory listing; needs crawling
    Listing,
}

impl EpisodePage {
    /// Classifies a page by the lazy-load endpoints its scripts reference
    pub fn detect(html: &str) -> Result<Self> {
        let document = Html::parse_document(html);
        let script = selector("script")?;
        let scripts: String = document
            .select(&script)
            .map(|s| s.text().collect::<String>())
            .collect();

        Ok(if scripts.contains("/m/lazyload/") {
            EpisodePage::Movie
        } else if scripts.contains("/s/lazyload/") {
            EpisodePage::Series
        } else {
            EpisodePage::Listing
        })
    }
}

/// Extracts the single playable item from a movie page
///
/// Uses the last download button on the page and the last quality badge.
pub fn parse_movie_episode(html: &str, page_url: &Url) -> Result<Option<Episode>> {
    let document = Html::parse_document(html);
    let buttons = selector(
        "div.col-md-12 a.btn, .movie-buttons a, a[href*='/m/lazyload/'], a[href*='/s/lazyload/'], .download-link a",
    )?;
    let badge = selector(".badge-wrapper .badge-fill")?;

    let Some(href) = document
        .select(&buttons)
        .filter_map(|a| a.value().attr("href"))
        .last()
    else {
        return Ok(None);
    };
    let Some(url) = resolve_link(page_url, href) else {
        return Ok(None);
    };

    let quality = document
        .select(&badge)
        .last()
        .map(|b| b.text().collect::<String>().replace('|', "").trim().to_string())
        .filter(|q| !q.is_empty());

    Ok(Some(Episode {
        name: "Movie".to_string(),
        url: url.to_string().replace(' ', "%20"),
        episode_number: Some(1.0),
        quality,
    }))
}

/// Extracts episode cards from a series page
///
/// Each card carries an `h5` with the season/episode label and link
/// (plus an optional size badge) and an `h4` with the episode name and
/// an optional outline badge. Episodes are returned newest first.
pub fn parse_series_episodes(html: &str, page_url: &Url) -> Result<Vec<Episode>> {
    let document = Html::parse_document(html);
    let card = selector("div.card, div.episode-item, div.download-link")?;
    let heading = selector("h5")?;
    let link = selector("a[href]")?;
    let size_badge = selector("h5 .badge-fill")?;
    let name_heading = selector("h4")?;
    let outline_badge = selector("h4 .badge-outline")?;

    let mut parsed: Vec<(f32, String, Episode)> = Vec::new();

    for element in document.select(&card) {
        let Some(h5) = element.select(&heading).next() else {
            continue;
        };
        let label = own_text(&h5)
            .split(['\u{00A0}'])
            .next()
            .unwrap_or_default()
            .replace("&nbsp;", "")
            .trim()
            .to_string();
        let Some(url) = h5
            .select(&link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve_link(page_url, href))
        else {
            continue;
        };
        if label.is_empty() {
            continue;
        }

        let size = element
            .select(&size_badge)
            .next()
            .map(|b| BADGE_SIZE.replace(&b.text().collect::<String>(), "$1").trim().to_string())
            .unwrap_or_default();
        let episode_name = element
            .select(&name_heading)
            .next()
            .map(|h4| own_text(&h4).trim().to_string())
            .unwrap_or_default();
        let outline = element
            .select(&outline_badge)
            .next()
            .map(|b| b.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let number = parse_episode_number(&label);
        let name = if episode_name.is_empty() {
            label.clone()
        } else {
            format!("{} - {}", label, episode_name)
        };
        let quality = format!("{} {}", size, outline).trim().to_string();

        parsed.push((
            number,
            label,
            Episode {
                name,
                url: url.to_string(),
                episode_number: Some(number),
                quality: (!quality.is_empty()).then_some(quality),
            },
        ));
    }

    parsed.sort_by(|(num_a, label_a, _), (num_b, label_b, _)| {
        num_b.total_cmp(num_a).then_with(|| label_b.cmp(label_a))
    });

    Ok(parsed.into_iter().map(|(_, _, episode)| episode).collect())
}

/// Pulls an episode number out of a label like "S02E07" or "Episode 3"
///
/// Prefers a number after an episode marker, falls back to the first
/// number in the text, and yields 0 when there is none.
///
/// # Example
/// ```
/// use dhakaflix_core::parser::parse_episode_number;
/// assert_eq!(parse_episode_number("S02E07"), 7.0);
/// assert_eq!(parse_episode_number("Part 12"), 12.0);
/// ```
pub fn parse_episode_number(text: &str) -> f32 {
    EPISODE_MARKER
        .captures(text)
        .or_else(|| FIRST_NUMBER.captures(text))
        .and_then(|caps| caps[1].parse::<f32>().ok())
        .unwrap_or(0.0)
}

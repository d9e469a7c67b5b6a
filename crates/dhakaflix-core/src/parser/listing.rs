//! Directory listing parsers
//!
//! Mirrors serve plain autoindex pages (anchors only) or h5ai-style pages
//! with `div.card` tiles. The crawler needs the former split into playable
//! files and sub-directories; the popular page needs either turned into
//! catalog entries.

use std::collections::HashSet;

use scraper::Html;
use url::Url;

use crate::error::Result;
use crate::parser::selector;
use crate::relevance::Relevance;
use crate::types::{Entry, EpisodeCandidate};
use crate::url::{folder_thumbnail, is_within, resolve_link, sanitize_url, title_from_href};

/// One directory page split into what the crawler can use
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    pub files: Vec<EpisodeCandidate>,
    pub subdirs: Vec<Url>,
}

/// Splits a directory page into playable files and sub-directories
///
/// Links are resolved against `page_url` and kept only when they stay
/// strictly inside `root`. Parent links, query-string navigation and
/// listing chrome are dropped.
///
/// # Arguments
/// * `html` - Raw HTML of the directory page
/// * `page_url` - Address the page was fetched from
/// * `root` - Start of the crawl; nothing outside it is returned
/// * `video_extensions` - Lower-case extensions without the dot
/// * `relevance` - Supplies the chrome denylist
pub fn parse_directory(
    html: &str,
    page_url: &Url,
    root: &Url,
    video_extensions: &[String],
    relevance: &Relevance,
) -> Result<DirectoryListing> {
    let document = Html::parse_document(html);
    let anchor = selector("a[href]")?;

    let mut listing = DirectoryListing::default();
    let mut seen = HashSet::new();

    for element in document.select(&anchor) {
        let Some(href) = element.value().attr("href").map(str::trim) else {
            continue;
        };
        let text = element.text().collect::<String>().trim().to_string();

        if href.is_empty() || href.contains("..") || href.starts_with('?') || href.starts_with('#') {
            continue;
        }
        if !text.is_empty() && relevance.is_chrome(&text) {
            continue;
        }

        let Some(absolute) = resolve_link(page_url, href) else {
            continue;
        };
        if !is_within(root, &absolute) || !seen.insert(absolute.to_string()) {
            continue;
        }

        if is_video_file(href, video_extensions) {
            let display_name = if text.is_empty() {
                title_from_href(href)
            } else {
                urlencoding::decode(&text)
                    .map(|decoded| decoded.into_owned())
                    .unwrap_or(text)
            };
            listing.files.push(EpisodeCandidate {
                display_name,
                file_location: absolute.to_string(),
            });
        } else if href.ends_with('/') || absolute.path().ends_with('/') {
            listing.subdirs.push(absolute);
        }
    }

    Ok(listing)
}

/// Checks an href against the playable extension set
///
/// Matches `name.ext` and `name.ext?query`.
pub fn is_video_file(href: &str, video_extensions: &[String]) -> bool {
    let lower = href.to_lowercase();
    video_extensions.iter().any(|ext| {
        let dotted = format!(".{}", ext);
        lower.ends_with(&dotted) || lower.contains(&format!("{}?", dotted))
    })
}

/// Turns a browse page into catalog entries
///
/// Uses `div.card` tiles when present (title from `h5 a`, poster from the
/// first image) and otherwise every non-chrome anchor on the page.
pub fn parse_catalog_page(
    html: &str,
    page_url: &Url,
    thumbnail_file: &str,
    relevance: &Relevance,
) -> Result<Vec<Entry>> {
    let document = Html::parse_document(html);
    let card = selector("div.card")?;
    let card_link = selector("h5 a[href]")?;
    let image = selector("img")?;
    let anchor = selector("a[href]")?;

    let mut entries = Vec::new();

    for tile in document.select(&card) {
        let Some(link) = tile.select(&card_link).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(absolute) = resolve_link(page_url, href) else {
            continue;
        };

        let title = link.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }
        let location = sanitize_url(absolute.as_str());

        let poster = tile.select(&image).next().and_then(|img| {
            ["data-src", "data-lazy-src", "src"]
                .iter()
                .find_map(|attr| img.value().attr(attr).filter(|v| !v.is_empty()))
                .and_then(|src| resolve_link(page_url, src))
                .map(|src| sanitize_url(src.as_str()))
        });

        entries.push(Entry {
            title,
            preview_image: poster.or_else(|| folder_thumbnail(&location, thumbnail_file)),
            location,
            is_folder: None,
        });
    }

    if !entries.is_empty() {
        return Ok(entries);
    }

    for element in document.select(&anchor) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let text = element.text().collect::<String>().trim().to_string();
        if text.is_empty() || relevance.is_chrome(&text) || href.contains('?') || href.ends_with("../") {
            continue;
        }
        let Some(absolute) = resolve_link(page_url, href) else {
            continue;
        };

        let location = sanitize_url(absolute.as_str());
        if entries.iter().any(|e: &Entry| e.location == location) {
            continue;
        }
        entries.push(Entry {
            title: text.trim_end_matches('/').to_string(),
            preview_image: folder_thumbnail(&location, thumbnail_file),
            location,
            is_folder: None,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlConfig;

    fn extensions() -> Vec<String> {
        CrawlConfig::default().video_extensions
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_parse_directory_splits_files_and_subdirs() {
        let html = r#"
        <html><body>
        <h1>Index of /share/Show/</h1>
        <a href="../">Parent Directory</a>
        <a href="?C=N;O=D">Name</a>
        <a href="Season%201/">Season 1/</a>
        <a href="Show%20E01.mkv">Show%20E01.mkv</a>
        <a href="Show%20E02.mp4?dl=1">Show E02.mp4</a>
        <a href="notes.txt">notes.txt</a>
        </body></html>
        "#;
        let page = url("http://h/share/Show/");
        let listing =
            parse_directory(html, &page, &page, &extensions(), &Relevance::default()).unwrap();

        assert_eq!(listing.subdirs, vec![url("http://h/share/Show/Season%201/")]);
        assert_eq!(listing.files.len(), 2);
        assert_eq!(listing.files[0].display_name, "Show E01.mkv");
        assert_eq!(listing.files[0].file_location, "http://h/share/Show/Show%20E01.mkv");
        assert_eq!(listing.files[1].display_name, "Show E02.mp4");
    }

    #[test]
    fn test_parse_directory_rejects_links_outside_root() {
        let html = r#"
        <a href="/share/Other/">Other/</a>
        <a href="http://elsewhere/share/Show/x/">x/</a>
        <a href="/share/Show/Extras/">Extras/</a>
        "#;
        let page = url("http://h/share/Show/");
        let listing =
            parse_directory(html, &page, &page, &extensions(), &Relevance::default()).unwrap();
        assert_eq!(listing.subdirs, vec![url("http://h/share/Show/Extras/")]);
    }

    #[test]
    fn test_parse_directory_dedupes_icon_and_text_links() {
        let html = r#"
        <a href="E01.mkv"><img src="/icons/movie.gif"></a>
        <a href="E01.mkv">E01.mkv</a>
        "#;
        let page = url("http://h/s/");
        let listing =
            parse_directory(html, &page, &page, &extensions(), &Relevance::default()).unwrap();
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].display_name, "E01.mkv");
    }

    #[test]
    fn test_uploader_tagged_files_are_kept() {
        let html = r#"<a href="Show.S01E01-PSA.mkv">Show.S01E01-PSA.mkv</a>"#;
        let page = url("http://h/s/");
        let listing =
            parse_directory(html, &page, &page, &extensions(), &Relevance::default()).unwrap();
        assert_eq!(listing.files.len(), 1);
    }

    #[test]
    fn test_is_video_file() {
        let exts = extensions();
        assert!(is_video_file("a/B.MKV", &exts));
        assert!(is_video_file("movie.mp4?token=1", &exts));
        assert!(is_video_file("ep.ts", &exts));
        assert!(!is_video_file("poster.jpg", &exts));
        assert!(!is_video_file("folder/", &exts));
    }

    #[test]
    fn test_parse_catalog_page_cards() {
        let html = r#"
        <div class="card">
            <img src="/DHAKA-FLIX-14/Movie A (2026)/a_AL_.jpg">
            <h5><a href="/DHAKA-FLIX-14/Movie A (2026)/">Movie A (2026)</a></h5>
        </div>
        <div class="card"><h5>no link</h5></div>
        "#;
        let page = url("http://172.16.50.14/DHAKA-FLIX-14/Hindi%20Movies/");
        let entries =
            parse_catalog_page(html, &page, "a_AL_.jpg", &Relevance::default()).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Movie A (2026)");
        assert_eq!(
            entries[0].location,
            "http://172.16.50.14/DHAKA-FLIX-14/Movie%20A%20(2026)/"
        );
        assert_eq!(
            entries[0].preview_image.as_deref(),
            Some("http://172.16.50.14/DHAKA-FLIX-14/Movie%20A%20(2026)/a_AL_.jpg")
        );
    }

    #[test]
    fn test_parse_catalog_page_plain_anchors() {
        let html = r#"
        <a href="../">Parent Directory</a>
        <a href="?C=M;O=A">Last modified</a>
        <a href="Heat%20(1995)/">Heat (1995)/</a>
        <a href="Heat.1995.mkv">Heat.1995.mkv</a>
        "#;
        let page = url("http://h/share/Movies/");
        let entries = parse_catalog_page(html, &page, "a11.jpg", &Relevance::default()).unwrap();

        let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Heat (1995)", "Heat.1995.mkv"]);
        assert_eq!(
            entries[0].preview_image.as_deref(),
            Some("http://h/share/Movies/Heat%20(1995)/a11.jpg")
        );
        assert_eq!(entries[1].preview_image, None);
    }
}

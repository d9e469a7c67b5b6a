//! Directory crawl against mock listings

use std::sync::Arc;
use std::time::{Duration, Instant};

use dhakaflix_core::{
    ClientConfig, CrawlConfig, CrawlResolver, DhakaflixClient, DhakaflixError, Relevance,
};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver(config: CrawlConfig) -> CrawlResolver {
    let client = DhakaflixClient::with_config(&ClientConfig {
        max_retries: 0,
        retry_backoff: Duration::from_millis(10),
        ..Default::default()
    })
    .unwrap();
    CrawlResolver::new(client, config, Arc::new(Relevance::default()))
}

fn listing(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{0}">{0}</a>"#, href))
        .collect();
    format!(
        r#"<html><body><h1>Index of</h1><a href="../">Parent Directory</a>{}</body></html>"#,
        anchors
    )
}

async fn serve(mock: &MockServer, dir: &str, links: &[&str]) {
    Mock::given(method("GET"))
        .and(path(dir))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(links)))
        .mount(mock)
        .await;
}

async fn never_fetched(mock: &MockServer, dir: &str) {
    Mock::given(method("GET"))
        .and(path(dir))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&["Trap.mkv"])))
        .expect(0)
        .mount(mock)
        .await;
}

#[tokio::test]
async fn test_directory_with_files_is_a_leaf() {
    let mock = MockServer::start().await;
    serve(&mock, "/show/", &["E01.mkv", "E02.mkv", "Extras/"]).await;
    never_fetched(&mock, "/show/Extras/").await;

    let files = resolver(CrawlConfig::default())
        .resolve(&format!("{}/show/", mock.uri()))
        .await
        .unwrap();

    let names: Vec<&str> = files.iter().map(|f| f.display_name.as_str()).collect();
    assert_eq!(names, vec!["E02.mkv", "E01.mkv"]);
    assert_eq!(files[0].file_location, format!("{}/show/E02.mkv", mock.uri()));
}

#[tokio::test]
async fn test_descends_until_files_found() {
    let mock = MockServer::start().await;
    serve(&mock, "/show/", &["Season%201/", "Season%202/"]).await;
    serve(&mock, "/show/Season%201/", &["S01E01.mkv", "S01E02.mkv"]).await;
    serve(&mock, "/show/Season%202/", &["S02E01.mp4"]).await;

    let files = resolver(CrawlConfig::default())
        .resolve(&format!("{}/show/", mock.uri()))
        .await
        .unwrap();

    let names: Vec<&str> = files.iter().map(|f| f.display_name.as_str()).collect();
    assert_eq!(names, vec!["S02E01.mp4", "S01E02.mkv", "S01E01.mkv"]);
}

#[tokio::test]
async fn test_depth_limit_stops_descent() {
    let mock = MockServer::start().await;
    serve(&mock, "/d/", &["1/"]).await;
    serve(&mock, "/d/1/", &["2/"]).await;
    serve(&mock, "/d/1/2/", &["3/"]).await;
    never_fetched(&mock, "/d/1/2/3/").await;

    let result = resolver(CrawlConfig::default())
        .resolve(&format!("{}/d/", mock.uri()))
        .await;

    assert!(matches!(result, Err(DhakaflixError::NoResults(_))));
}

#[tokio::test]
async fn test_each_directory_fetched_once() {
    let mock = MockServer::start().await;
    serve(&mock, "/r/", &["a/", "b/"]).await;
    Mock::given(method("GET"))
        .and(path("/r/a/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&["/r/b/", "/r/a/", "/r/"])))
        .expect(1)
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/b/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&["E01.mkv"])))
        .expect(1)
        .mount(&mock)
        .await;

    let files = resolver(CrawlConfig::default())
        .resolve(&format!("{}/r/", mock.uri()))
        .await
        .unwrap();

    assert_eq!(files.len(), 1);
}

#[tokio::test]
async fn test_links_outside_start_folder_are_ignored() {
    let mock = MockServer::start().await;
    serve(
        &mock,
        "/c/",
        &["/other/", "http://elsewhere.invalid/c/x/", "sub/"],
    )
    .await;
    serve(&mock, "/c/sub/", &["E01.mkv"]).await;
    never_fetched(&mock, "/other/").await;

    let files = resolver(CrawlConfig::default())
        .resolve(&format!("{}/c/", mock.uri()))
        .await
        .unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_location, format!("{}/c/sub/E01.mkv", mock.uri()));
}

#[tokio::test]
async fn test_failed_branch_does_not_abort_siblings() {
    let mock = MockServer::start().await;
    serve(&mock, "/f/", &["a/", "b/"]).await;
    Mock::given(method("GET"))
        .and(path("/f/a/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock)
        .await;
    serve(&mock, "/f/b/", &["E01.mkv"]).await;

    let files = resolver(CrawlConfig::default())
        .resolve(&format!("{}/f/", mock.uri()))
        .await
        .unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].display_name, "E01.mkv");
}

#[tokio::test]
async fn test_unreachable_start_is_no_results() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock)
        .await;

    let result = resolver(CrawlConfig::default())
        .resolve(&format!("{}/gone/", mock.uri()))
        .await;

    assert!(matches!(result, Err(DhakaflixError::NoResults(_))));
}

#[tokio::test]
async fn test_concurrent_fetches_are_bounded() {
    let mock = MockServer::start().await;
    let subdirs: Vec<String> = (0..6).map(|i| format!("s{}/", i)).collect();
    let links: Vec<&str> = subdirs.iter().map(String::as_str).collect();
    serve(&mock, "/p/", &links).await;
    for i in 0..6 {
        Mock::given(method("GET"))
            .and(path(format!("/p/s{}/", i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(listing(&[&format!("E0{}.mkv", i)]))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&mock)
            .await;
    }

    let config = CrawlConfig {
        max_concurrent_fetches: 2,
        ..Default::default()
    };
    let started = Instant::now();
    let files = resolver(config)
        .resolve(&format!("{}/p/", mock.uri()))
        .await
        .unwrap();

    // six delayed fetches, two at a time
    assert!(started.elapsed() >= Duration::from_millis(550));
    assert_eq!(files.len(), 6);
    assert_eq!(files[0].display_name, "E05.mkv");
}

#[tokio::test]
async fn test_prefetched_start_page_is_not_fetched_again() {
    let mock = MockServer::start().await;
    never_fetched(&mock, "/show/").await;
    serve(&mock, "/show/Season%201/", &["E01.mkv"]).await;

    let start = Url::parse(&format!("{}/show/", mock.uri())).unwrap();
    let files = resolver(CrawlConfig::default())
        .crawl(start, Some(listing(&["Season%201/"])))
        .await
        .unwrap();

    assert_eq!(files.len(), 1);
}

//! End-to-end aggregation against mocked providers.
//!
//! Every test starts its own wiremock server and points the adapters at it
//! through configuration overrides, so the full path (config, HTTP client,
//! adapter, aggregator) is exercised.

use std::time::{Duration, Instant};

use jobfeed::aggregate::{run, run_all};
use jobfeed::config::Config;
use jobfeed::feed::{FeedClient, DEFAULT_USER_AGENT};
use jobfeed::model::Source;
use jobfeed::sources::{adapter_for, all_adapters, JobsCollider, SourceAdapter};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(timeout: Duration) -> FeedClient {
    FeedClient::new(timeout, DEFAULT_USER_AGENT).unwrap()
}

fn config_for(server: &MockServer, overrides: &[(Source, &str)]) -> Config {
    let mut config = Config::default();
    config.subfeed_delay_min_ms = 0;
    config.subfeed_delay_max_ms = 0;
    for (source, route) in overrides {
        config
            .endpoints
            .insert(source.to_string(), format!("{}{}", server.uri(), route));
    }
    config
}

fn rss(items: &[(&str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(title, guid)| {
            format!(
                "<item><title>{title}</title><guid>{guid}</guid>\
                 <pubDate>Wed, 12 Mar 2025 08:00:00 +0000</pubDate></item>"
            )
        })
        .collect();
    format!(r#"<rss version="2.0" xmlns:job_listing="https://aijobs.net"><channel>{items}</channel></rss>"#)
}

async fn mount(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

// ============================================================================
// Multi-category source
// ============================================================================

#[tokio::test]
async fn test_jobscollider_unreachable_subfeed_is_skipped() {
    let server = MockServer::start().await;
    let mut feeds = Vec::new();
    for n in 1..=5 {
        let route = format!("/remote-cat{n}-jobs.rss");
        if n != 3 {
            let title = format!("Role {n} at Employer {n}");
            mount(
                &server,
                &route,
                ResponseTemplate::new(200).set_body_string(rss(&[(title.as_str(), "g")])),
            )
            .await;
            feeds.push((format!("cat{n}"), format!("{}{}", server.uri(), route)));
        } else {
            // Nothing listens on port 1
            feeds.push((format!("cat{n}"), format!("http://127.0.0.1:1{route}")));
        }
    }

    let adapter = JobsCollider::new()
        .with_feeds(feeds)
        .with_delay(Duration::ZERO..=Duration::ZERO);
    let result = run(&adapter, &client(Duration::from_secs(5))).await;

    assert!(result.ok());
    let employers: Vec<&str> = result.postings.iter().map(|p| p.company.as_str()).collect();
    assert_eq!(employers, vec!["Employer 1", "Employer 2", "Employer 4", "Employer 5"]);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].category, "cat3");
}

#[tokio::test]
async fn test_jobscollider_base_url_override() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/mirror/remote-design-jobs.rss",
        ResponseTemplate::new(200).set_body_string(rss(&[("Designer at Studio", "d-1")])),
    )
    .await;
    mount(
        &server,
        "/mirror/remote-qa-jobs.rss",
        ResponseTemplate::new(200).set_body_string(rss(&[("Tester at Bugs Inc", "q-1")])),
    )
    .await;
    // Every other category answers 404 (wiremock default)

    let config = config_for(&server, &[(Source::JobsCollider, "/mirror")]);
    let adapter = adapter_for(Source::JobsCollider, &config);
    let result = run(adapter.as_ref(), &client(Duration::from_secs(5))).await;

    assert!(result.ok());
    let ids: Vec<&str> = result.postings.iter().map(|p| p.source_id.as_str()).collect();
    assert_eq!(ids, vec!["d-1", "q-1"]);
    assert_eq!(result.postings[0].categories, vec!["design"]);
    assert_eq!(result.postings[1].categories, vec!["qa"]);
    assert_eq!(result.skipped.len(), 14);
}

// ============================================================================
// Failure classes
// ============================================================================

#[tokio::test]
async fn test_remoteok_single_element_is_failure() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/api",
        ResponseTemplate::new(200).set_body_string(r#"[{"legal": "terms"}]"#),
    )
    .await;

    let config = config_for(&server, &[(Source::RemoteOk, "/api")]);
    let adapter = adapter_for(Source::RemoteOk, &config);
    let result = run(adapter.as_ref(), &client(Duration::from_secs(5))).await;

    assert!(!result.ok());
    assert!(result.postings.is_empty());
    assert!(result.failure.unwrap().starts_with("Parse error"));
}

#[tokio::test]
async fn test_timeout_fails_within_bound() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/feed/newjobs",
        ResponseTemplate::new(200)
            .set_body_string("<jobs/>")
            .set_delay(Duration::from_secs(5)),
    )
    .await;

    let config = config_for(&server, &[(Source::Jobicy, "/feed/newjobs")]);
    let adapter = adapter_for(Source::Jobicy, &config);

    let started = Instant::now();
    let result = run(adapter.as_ref(), &client(Duration::from_millis(300))).await;

    assert!(!result.ok());
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(result.failure.unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_http_status_failure() {
    let server = MockServer::start().await;
    mount(&server, "/remote-jobs/feed", ResponseTemplate::new(403)).await;

    let config = config_for(&server, &[(Source::Remotive, "/remote-jobs/feed")]);
    let adapter = adapter_for(Source::Remotive, &config);
    let result = run(adapter.as_ref(), &client(Duration::from_secs(5))).await;

    assert_eq!(result.failure.as_deref(), Some("HTTP error: status 403"));
}

#[tokio::test]
async fn test_empty_feed_is_ok() {
    let server = MockServer::start().await;
    mount(&server, "/feed", ResponseTemplate::new(200).set_body_string(rss(&[]))).await;

    let config = config_for(&server, &[(Source::AiJobs, "/feed")]);
    let adapter = adapter_for(Source::AiJobs, &config);
    let result = run(adapter.as_ref(), &client(Duration::from_secs(5))).await;

    assert!(result.ok());
    assert!(result.postings.is_empty());
}

// ============================================================================
// All sources together
// ============================================================================

#[tokio::test]
async fn test_run_all_isolates_failures() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/aijobs",
        ResponseTemplate::new(200).set_body_string(rss(&[("ML Engineer", "a-1")])),
    )
    .await;
    mount(&server, "/remotive", ResponseTemplate::new(500)).await;
    mount(
        &server,
        "/remoteok",
        ResponseTemplate::new(200)
            .set_body_string(r#"[{"legal": "terms"}, {"id": 7, "position": "SRE"}]"#),
    )
    .await;
    mount(
        &server,
        "/jobicy",
        ResponseTemplate::new(200)
            .set_body_string(r#"<jobs><job id="9"><name>Analyst</name></job></jobs>"#),
    )
    .await;

    let config = config_for(
        &server,
        &[
            (Source::AiJobs, "/aijobs"),
            (Source::Remotive, "/remotive"),
            (Source::RemoteOk, "/remoteok"),
            (Source::Jobicy, "/jobicy"),
            (Source::JobsCollider, "/jobscollider"),
        ],
    );
    let adapters: Vec<Box<dyn SourceAdapter>> = all_adapters(&config);
    let results = run_all(&adapters, &client(Duration::from_secs(5))).await;

    let outcome: Vec<(Source, bool, usize)> = results
        .iter()
        .map(|r| (r.source, r.ok(), r.postings.len()))
        .collect();
    assert_eq!(
        outcome,
        vec![
            (Source::AiJobs, true, 1),
            (Source::Remotive, false, 0),
            (Source::RemoteOk, true, 1),
            (Source::Jobicy, true, 1),
            // Every category 404s on the mock
            (Source::JobsCollider, false, 0),
        ]
    );
    assert!(results[4]
        .failure
        .as_deref()
        .unwrap()
        .starts_with("All 16 sub-feeds failed"));
}

//! Integration tests for the acquisition facade
//!
//! These tests use wiremock to stand in for the job boards and run complete
//! acquisitions end-to-end, including the Lagou browser-to-API fallback.

use async_trait::async_trait;
use intern_scout::config::Config;
use intern_scout::crawler::{BrowserError, BrowserLauncher, BrowserSession};
use intern_scout::identity::Identity;
use intern_scout::output::{JsonLinesSink, RecordSink, RunSummary};
use intern_scout::{Acquisition, SourceName, Termination};
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Launcher for a machine without Chrome
struct NoBrowser;

#[async_trait]
impl BrowserLauncher for NoBrowser {
    async fn launch(&self, _identity: &Identity) -> Result<Box<dyn BrowserSession>, BrowserError> {
        Err(BrowserError::Launch("no Chrome/Chromium binary found on PATH".to_string()))
    }
}

/// Creates a test configuration with every board pointed at the mock server
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    let base = format!("{}/", base_url);
    config.sources.shixiseng_base_url = base.clone();
    config.sources.lagou_base_url = base.clone();
    config.sources.lagou_api_base_url = base;
    config.pacing.min_delay_ms = 0;
    config.pacing.max_delay_ms = 0;
    config.timeouts.request_secs = 5;
    config
}

fn acquisition(config: Config) -> Acquisition {
    Acquisition::with_launcher(config, Arc::new(NoBrowser)).expect("acquisition should build")
}

fn listing_page(links: &[&str]) -> String {
    let items: String = links
        .iter()
        .map(|href| {
            format!(
                r#"<div class="intern-wrap intern-item">
                     <div class="f-l intern-detail__job"><a href="{}">岗位</a></div>
                   </div>"#,
                href
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", items)
}

fn detail_page(title: &str, company: &str, salary: &str) -> String {
    format!(
        r#"<html><body>
             <div class="new_job_name">{}</div>
             <span class="job_money cutom_font">{}</span>
             <div class="job_good_list"><span>弹性工作</span><span>导师带教</span></div>
             <div class="com_intro"><a class="com-name">{}</a></div>
             <div class="com-type">互联网</div>
           </body></html>"#,
        title, salary, company
    )
}

#[tokio::test]
async fn test_shixiseng_acquisition_decodes_salary() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/interns"))
        .and(query_param("keyword", "数据"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&["/intern/inn_1", "/intern/inn_2"])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/interns"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[])))
        .mount(&mock_server)
        .await;

    // Salary digits are private-use glyphs: "60-70/天"
    Mock::given(method("GET"))
        .and(path("/intern/inn_1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(
            "数据分析实习生",
            "字节跳动",
            "\u{e1b8}\u{e0a8}-\u{e1c7}\u{e0a8}/天",
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/intern/inn_2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let report = acquisition(create_test_config(&base_url))
        .acquire("数据", SourceName::Shixiseng, 3)
        .await
        .expect("acquisition should succeed");

    assert_eq!(report.termination(), Termination::EndOfResults);
    assert_eq!(report.delivered.pages_fetched, 2);
    assert_eq!(report.delivered.strategy, "http");
    assert!(!report.fallback_attempted);

    let records = report.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title(), "数据分析实习生");
    assert_eq!(records[0].company(), "字节跳动");
    assert_eq!(records[0].salary_raw(), "60-70/天");
    assert_eq!(records[0].skills_raw(), "弹性工作, 导师带教");
    assert_eq!(records[0].company_type(), "互联网");
    assert_eq!(
        records[0].detail_url(),
        Some(format!("{}/intern/inn_1", base_url).as_str())
    );
}

#[tokio::test]
async fn test_shixiseng_server_error_yields_empty_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/interns"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let report = acquisition(create_test_config(&mock_server.uri()))
        .acquire("java", SourceName::Shixiseng, 2)
        .await
        .expect("a failing board is not an error");

    assert!(report.records().is_empty());
    assert_eq!(report.termination(), Termination::EndOfResults);
    assert_eq!(report.delivered.pages_fetched, 1);
}

#[tokio::test]
async fn test_lagou_falls_back_to_api_when_browser_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/jobs/v2/positionAjax.json"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .and(body_string_contains("pn=1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"success": true, "content": {"positionResult": {"result": [
                {"positionName": "Java实习生", "companyShortName": "美团",
                 "industryField": "消费生活", "salary": "4k-6k",
                 "positionAdvantage": "大平台"},
                {"positionName": "前端实习生", "companyShortName": "滴滴"}
            ]}}}"#,
        ))
        .mount(&mock_server)
        .await;

    let report = acquisition(create_test_config(&mock_server.uri()))
        .acquire("java", SourceName::Lagou, 1)
        .await
        .expect("acquisition should succeed");

    assert_eq!(report.requested, SourceName::Lagou);
    assert!(report.fallback_attempted);
    assert!(report.fallback_used());
    assert_eq!(report.delivered.source, SourceName::LagouApi);
    assert_eq!(report.delivered.strategy, "api");
    assert_eq!(report.termination(), Termination::PageLimitReached);

    let primary = report.primary.as_ref().expect("primary run is kept");
    assert_eq!(primary.termination, Termination::ResourceFailure);
    assert!(primary.records.is_empty());

    let records = report.records();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.source_name() == SourceName::LagouApi));
    assert_eq!(records[0].company_type(), "消费生活");
    assert_eq!(records[0].skills_raw(), "大平台");
    assert_eq!(records[1].salary_raw(), "未公布");
}

#[tokio::test]
async fn test_failed_fallback_delivers_primary_outcome() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/jobs/v2/positionAjax.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let report = acquisition(create_test_config(&mock_server.uri()))
        .acquire("java", SourceName::Lagou, 2)
        .await
        .expect("acquisition should succeed");

    assert!(report.records().is_empty());
    assert!(report.fallback_attempted);
    assert!(!report.fallback_used());
    assert_eq!(report.delivered.source, SourceName::Lagou);
    assert_eq!(report.termination(), Termination::ResourceFailure);

    let fallback = report
        .discarded_fallback
        .as_ref()
        .expect("empty fallback run is kept");
    assert_eq!(fallback.source, SourceName::LagouApi);
    assert_eq!(fallback.termination, Termination::EndOfResults);
    assert_eq!(
        report.total_duration(),
        report.delivered.duration() + fallback.duration()
    );
}

#[tokio::test]
async fn test_concurrent_sources_write_json_lines() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/interns"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page(&["/intern/inn_9"])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/intern/inn_9"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(detail_page("产品实习生", "小红书", "")),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/jobs/v2/positionAjax.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"content": {"positionResult": {"result": [
                {"positionName": "产品经理实习生", "companyShortName": "拉勾"}
            ]}}}"#,
        ))
        .mount(&mock_server)
        .await;

    let acquisition = acquisition(create_test_config(&mock_server.uri()));
    let (shixiseng, lagou_api) = tokio::join!(
        acquisition.acquire("产品", SourceName::Shixiseng, 1),
        acquisition.acquire("产品", SourceName::LagouApi, 1),
    );
    let shixiseng = shixiseng.unwrap();
    let lagou_api = lagou_api.unwrap();

    let mut summary = RunSummary::new("产品");
    summary.add_report(&shixiseng);
    summary.add_report(&lagou_api);
    assert_eq!(summary.total_records(), 2);
    assert!(!summary.any_interdicted());

    let mut sink = JsonLinesSink::new(Vec::new());
    sink.write_all(shixiseng.records()).unwrap();
    sink.write_all(lagou_api.records()).unwrap();
    sink.finish().unwrap();

    let output = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<serde_json::Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["sourceName"], "shixiseng");
    assert_eq!(lines[0]["salaryRaw"], "未公布");
    assert_eq!(lines[1]["sourceName"], "lagou-api");
}

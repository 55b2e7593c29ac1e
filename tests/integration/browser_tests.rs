//! Integration tests for the browser-automation strategy
//!
//! These tests drive `BrowserStrategy` through the pagination controller
//! against a scripted browser that serves canned DOM snapshots, so the whole
//! launch / navigate / paginate / release cycle runs without Chromium.

use async_trait::async_trait;
use intern_scout::crawler::{
    BrowserError, BrowserLauncher, BrowserSession, BrowserStrategy, BrowserTimings,
};
use intern_scout::extract::BrowserSiteProfile;
use intern_scout::identity::{Identity, IdentityProvider};
use intern_scout::pacing::Pacer;
use intern_scout::record::SALARY_UNPUBLISHED;
use intern_scout::{SourceName, Termination};
use scraper::{Html, Selector};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const HOME_PAGE: &str = r#"<html><head><title>拉勾招聘</title></head>
<body><div id="lg_header"></div></body></html>"#;

const BLOCK_PAGE: &str = r#"<html><head><title>安全验证 - 拉勾</title></head>
<body><div class="captcha"></div></body></html>"#;

const BARE_PAGE: &str = r#"<html><head><title>拉勾招聘</title></head><body></body></html>"#;

/// What the scripted browser does
#[derive(Clone, Default)]
struct Script {
    home: String,
    results: Vec<String>,
    fail_launch: bool,
    fail_stealth: bool,
    /// Number of scrolls that still make the page taller
    growing_scrolls: usize,
}

/// Counters shared between the test and every session it launches
#[derive(Clone, Default)]
struct Recorder {
    launches: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    scrolls: Arc<AtomicUsize>,
    visited: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn scrolls(&self) -> usize {
        self.scrolls.load(Ordering::SeqCst)
    }

    fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

struct ScriptedLauncher {
    script: Script,
    recorder: Recorder,
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    async fn launch(&self, _identity: &Identity) -> Result<Box<dyn BrowserSession>, BrowserError> {
        self.recorder.launches.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_launch {
            return Err(BrowserError::Launch("no browser binary".to_string()));
        }
        Ok(Box::new(ScriptedSession {
            script: self.script.clone(),
            recorder: self.recorder.clone(),
            current: BARE_PAGE.to_string(),
            result_index: 0,
        }))
    }
}

struct ScriptedSession {
    script: Script,
    recorder: Recorder,
    current: String,
    result_index: usize,
}

impl ScriptedSession {
    /// Class attribute of the first element matching `selector` on the current page
    fn first_match(&self, selector: &str) -> Option<String> {
        let document = Html::parse_document(&self.current);
        let selector = Selector::parse(selector).ok()?;
        let element = document.select(&selector).next()?;
        Some(element.value().attr("class").unwrap_or_default().to_string())
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn apply_stealth(&mut self, _identity: &Identity) -> Result<(), BrowserError> {
        if self.script.fail_stealth {
            return Err(BrowserError::Protocol("stealth rejected".to_string()));
        }
        Ok(())
    }

    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.recorder.visited.lock().unwrap().push(url.to_string());
        self.current = if url.contains("wn/jobs") {
            self.result_index = 0;
            self.script
                .results
                .first()
                .cloned()
                .unwrap_or_else(|| BARE_PAGE.to_string())
        } else {
            self.script.home.clone()
        };
        Ok(())
    }

    async fn has_element(&mut self, selector: &str) -> Result<bool, BrowserError> {
        Ok(self.first_match(selector).is_some())
    }

    async fn title(&mut self) -> Result<String, BrowserError> {
        let document = Html::parse_document(&self.current);
        let selector = Selector::parse("title").unwrap();
        Ok(document
            .select(&selector)
            .next()
            .map(|t| t.text().collect::<String>())
            .unwrap_or_default())
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        Ok(self.current.clone())
    }

    async fn scroll_height(&mut self) -> Result<i64, BrowserError> {
        let grown = self.recorder.scrolls().min(self.script.growing_scrolls);
        Ok(2400 + 800 * grown as i64)
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError> {
        self.recorder.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn class_of(&mut self, selector: &str) -> Result<Option<String>, BrowserError> {
        Ok(self.first_match(selector))
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        if self.first_match(selector).is_none() {
            return Err(BrowserError::ElementMissing(selector.to_string()));
        }
        self.result_index += 1;
        self.current = self
            .script
            .results
            .get(self.result_index)
            .cloned()
            .ok_or_else(|| BrowserError::Protocol("no page behind next".to_string()))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.recorder.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn card(title: &str, company: &str, salary: Option<&str>) -> String {
    let salary = salary
        .map(|s| format!(r#"<span class="money__3Lkgq">{}</span>"#, s))
        .unwrap_or_default();
    format!(
        r#"<div class="item__10RTO">
             <div class="p-top__1F7CL"><a>{}</a></div>
             <div class="company-name__2-SjF"><a>{}</a></div>
             {}
             <div class="ir___QwEG">移动互联网 · A轮 · 50-150人</div>
             <span class="il__18pLK">Python</span><span class="il__18pLK">SQL</span>
           </div>"#,
        title, company, salary
    )
}

/// A search results page with an advertisement card first
fn results_page(cards: &[String], next_disabled: bool) -> String {
    let next_class = if next_disabled {
        "lg-pagination-next lg-pagination-disabled"
    } else {
        "lg-pagination-next"
    };
    format!(
        r#"<html><head><title>实习招聘-拉勾招聘</title></head><body>
           <div class="item__10RTO ad-box"><div class="p-top__1F7CL"><a>推广职位</a></div></div>
           {}
           <button class="{}">下一页</button>
           </body></html>"#,
        cards.join("\n"),
        next_class
    )
}

fn timings() -> BrowserTimings {
    BrowserTimings {
        landmark_wait: Duration::from_millis(300),
        element_wait: Duration::from_millis(300),
        page_turn_settle: Duration::ZERO,
        scroll_settle: Duration::ZERO,
        max_scrolls: 3,
    }
}

fn strategy(script: Script, recorder: &Recorder) -> BrowserStrategy {
    let launcher = ScriptedLauncher {
        script,
        recorder: recorder.clone(),
    };
    BrowserStrategy::new(
        SourceName::Lagou,
        "https://www.lagou.com/",
        BrowserSiteProfile::lagou(),
        timings(),
        Arc::new(launcher),
        IdentityProvider::default(),
        Pacer::immediate(),
    )
    .expect("strategy should build")
}

fn three_pages() -> Vec<String> {
    vec![
        results_page(
            &[
                card("数据分析实习生", "美团", Some("150-200/天")),
                card("算法实习生", "字节跳动", None),
            ],
            false,
        ),
        results_page(&[card("后端实习生", "快手", Some("4k-6k"))], false),
        results_page(&[card("测试实习生", "京东", Some("3k-4k"))], true),
    ]
}

#[tokio::test]
async fn test_crawl_reaches_page_limit() {
    let recorder = Recorder::default();
    let script = Script {
        home: HOME_PAGE.to_string(),
        results: three_pages(),
        ..Script::default()
    };

    let report = strategy(script, &recorder).crawl("数据分析", 3).await.unwrap();

    assert_eq!(report.termination, Termination::PageLimitReached);
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.strategy, "browser");

    let titles: Vec<&str> = report.records.iter().map(|r| r.title()).collect();
    assert_eq!(
        titles,
        vec!["数据分析实习生", "算法实习生", "后端实习生", "测试实习生"]
    );
    assert!(report.records.iter().all(|r| r.source_name() == SourceName::Lagou));
    assert!(!titles.contains(&"推广职位"));

    assert_eq!(report.records[0].salary_raw(), "150-200/天");
    assert_eq!(report.records[0].company_type(), "移动互联网");
    assert_eq!(report.records[0].skills_raw(), "Python,SQL");
    assert_eq!(report.records[1].salary_raw(), SALARY_UNPUBLISHED);

    let visited = recorder.visited();
    assert_eq!(visited[0], "https://www.lagou.com/");
    assert_eq!(
        visited[1],
        "https://www.lagou.com/wn/jobs?kd=%E6%95%B0%E6%8D%AE%E5%88%86%E6%9E%90"
    );
    assert_eq!(recorder.launches(), 1);
    assert_eq!(recorder.closes(), 1);
}

#[tokio::test]
async fn test_disabled_next_ends_crawl_early() {
    let recorder = Recorder::default();
    let mut pages = three_pages();
    pages[1] = results_page(&[card("后端实习生", "快手", Some("4k-6k"))], true);
    let script = Script {
        home: HOME_PAGE.to_string(),
        results: pages,
        ..Script::default()
    };

    let report = strategy(script, &recorder).crawl("后端", 3).await.unwrap();

    assert_eq!(report.termination, Termination::EndOfResults);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.records.len(), 3);
    assert_eq!(recorder.closes(), 1);
}

#[tokio::test]
async fn test_launch_failure_yields_resource_failure() {
    let recorder = Recorder::default();
    let script = Script {
        fail_launch: true,
        ..Script::default()
    };

    let report = strategy(script, &recorder).crawl("java", 2).await.unwrap();

    assert_eq!(report.termination, Termination::ResourceFailure);
    assert!(report.records.is_empty());
    assert_eq!(report.pages_fetched, 0);
    assert_eq!(recorder.launches(), 1);
    assert_eq!(recorder.closes(), 0);
}

#[tokio::test]
async fn test_stealth_failure_still_releases_browser() {
    let recorder = Recorder::default();
    let script = Script {
        home: HOME_PAGE.to_string(),
        results: three_pages(),
        fail_stealth: true,
        ..Script::default()
    };

    let report = strategy(script, &recorder).crawl("java", 2).await.unwrap();

    assert_eq!(report.termination, Termination::ResourceFailure);
    assert!(report.records.is_empty());
    assert!(recorder.visited().is_empty());
    assert_eq!(recorder.closes(), 1);
}

#[tokio::test]
async fn test_verification_wall_on_home_page_is_interdiction() {
    let recorder = Recorder::default();
    let script = Script {
        home: BLOCK_PAGE.to_string(),
        results: three_pages(),
        ..Script::default()
    };

    let report = strategy(script, &recorder).crawl("java", 3).await.unwrap();

    assert_eq!(report.termination, Termination::Interdicted);
    assert!(report.records.is_empty());
    assert_eq!(recorder.visited().len(), 1);
    assert_eq!(recorder.closes(), 1);
}

#[tokio::test]
async fn test_missing_landmark_without_wall_ends_run() {
    let recorder = Recorder::default();
    let script = Script {
        home: BARE_PAGE.to_string(),
        results: three_pages(),
        ..Script::default()
    };

    let report = strategy(script, &recorder).crawl("java", 3).await.unwrap();

    assert_eq!(report.termination, Termination::EndOfResults);
    assert!(report.records.is_empty());
    assert_eq!(recorder.closes(), 1);
}

#[tokio::test]
async fn test_interdiction_mid_crawl_keeps_earlier_records() {
    let recorder = Recorder::default();
    let mut pages = three_pages();
    pages[1] = BLOCK_PAGE.to_string();
    let script = Script {
        home: HOME_PAGE.to_string(),
        results: pages,
        ..Script::default()
    };

    let report = strategy(script, &recorder).crawl("java", 3).await.unwrap();

    assert_eq!(report.termination, Termination::Interdicted);
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.records[0].title(), "数据分析实习生");
    assert_eq!(recorder.closes(), 1);
}

#[tokio::test]
async fn test_verification_wall_on_search_page_is_interdiction() {
    let recorder = Recorder::default();
    let mut pages = three_pages();
    pages[0] = BLOCK_PAGE.to_string();
    let script = Script {
        home: HOME_PAGE.to_string(),
        results: pages,
        ..Script::default()
    };

    let report = strategy(script, &recorder).crawl("java", 3).await.unwrap();

    assert_eq!(report.termination, Termination::Interdicted);
    assert!(report.records.is_empty());
    assert_eq!(report.pages_fetched, 0);
    assert_eq!(recorder.visited().len(), 2);
    assert_eq!(recorder.scrolls(), 0);
    assert_eq!(recorder.closes(), 1);
}

#[tokio::test]
async fn test_growing_page_scrolls_up_to_limit() {
    let recorder = Recorder::default();
    let script = Script {
        home: HOME_PAGE.to_string(),
        results: three_pages(),
        growing_scrolls: usize::MAX,
        ..Script::default()
    };

    let report = strategy(script, &recorder).crawl("java", 1).await.unwrap();

    assert_eq!(report.termination, Termination::PageLimitReached);
    assert_eq!(report.records.len(), 2);
    assert_eq!(recorder.scrolls(), timings().max_scrolls as usize);
}

#[tokio::test]
async fn test_settled_page_stops_scrolling() {
    let recorder = Recorder::default();
    let script = Script {
        home: HOME_PAGE.to_string(),
        results: three_pages(),
        ..Script::default()
    };

    strategy(script, &recorder).crawl("java", 1).await.unwrap();
    assert_eq!(recorder.scrolls(), 1);

    let recorder = Recorder::default();
    let script = Script {
        home: HOME_PAGE.to_string(),
        results: three_pages(),
        growing_scrolls: 1,
        ..Script::default()
    };

    strategy(script, &recorder).crawl("java", 1).await.unwrap();
    assert_eq!(recorder.scrolls(), 2);
}

//! Link scraper: the independent task source.
//!
//! A configured [`ScrapeSource`] names a public course web page and a regex
//! selecting the links on it that are tasks (labs, MPs, problem sets). Only
//! links on the page's own host are kept.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use coursevault_core::ScrapeSource;

use crate::backoff::with_backoff;
use crate::error::CanvasError;
use crate::urls::is_allowed_url;

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// A task found on a scraped page. Scraped tasks carry no due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedTask {
    /// The source's label, shown as the task's course.
    pub source: String,
    pub title: String,
    pub url: String,
}

/// Anything that can turn a [`ScrapeSource`] into tasks.
pub trait TaskScraper {
    fn scrape(&self, source: &ScrapeSource) -> Result<Vec<ScrapedTask>, CanvasError>;
}

/// Title for a link with no anchor text: the last non-empty path segment.
fn title_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|segs| segs.filter(|s| !s.is_empty()).last())
        .unwrap_or_default()
        .to_string()
}

/// Links in `html` whose `href` matches `pattern`, resolved against
/// `page_url`, restricted to its host, deduplicated in document order.
pub fn parse_task_links(
    html: &str,
    page_url: &Url,
    pattern: &Regex,
    source_label: &str,
) -> Vec<ScrapedTask> {
    let Some(host) = page_url.host_str() else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut tasks = Vec::new();
    for anchor in document.select(&ANCHOR) {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        if !pattern.is_match(href) {
            continue;
        }
        let Ok(resolved) = page_url.join(href) else {
            continue;
        };
        if !is_allowed_url(resolved.as_str(), host) {
            tracing::warn!("skipping off-site task link {resolved}");
            continue;
        }
        if !seen.insert(resolved.to_string()) {
            continue;
        }
        let text = anchor.text().collect::<String>();
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let title = if text.is_empty() { title_from_url(&resolved) } else { text };
        if title.is_empty() {
            continue;
        }
        tasks.push(ScrapedTask {
            source: source_label.to_string(),
            title,
            url: resolved.to_string(),
        });
    }
    tasks
}

/// Fetches scrape sources over plain HTTP(S), unauthenticated.
pub struct HttpScraper {
    agent: ureq::Agent,
}

impl HttpScraper {
    pub fn new() -> Self {
        HttpScraper {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(30))
                .redirects(0)
                .build(),
        }
    }
}

impl Default for HttpScraper {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskScraper for HttpScraper {
    fn scrape(&self, source: &ScrapeSource) -> Result<Vec<ScrapedTask>, CanvasError> {
        let page_url =
            Url::parse(&source.url).map_err(|_| CanvasError::InvalidUrl(source.url.clone()))?;
        if !matches!(page_url.scheme(), "http" | "https") {
            return Err(CanvasError::InvalidUrl(source.url.clone()));
        }
        let pattern = Regex::new(&source.link_pattern)?;
        let html = with_backoff(|| {
            let resp = self.agent.get(page_url.as_str()).call().map_err(|e| match e {
                ureq::Error::Status(429, _) => CanvasError::RateLimited,
                ureq::Error::Status(status, _) => CanvasError::Http {
                    status,
                    url: source.url.clone(),
                },
                ureq::Error::Transport(t) => CanvasError::Transport {
                    url: source.url.clone(),
                    message: t.to_string(),
                },
            })?;
            resp.into_string().map_err(|err| CanvasError::Decode {
                url: source.url.clone(),
                source: err,
            })
        })?;
        let tasks = parse_task_links(&html, &page_url, &pattern, &source.label);
        tracing::info!("scraped {} task link(s) from {}", tasks.len(), source.label);
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <ul>
          <li><a href="/cs225/sp2026/labs/lab_intro/">Lab: <b>Intro</b></a></li>
          <li><a href="/cs225/sp2026/mps/mp_stickers/">MP Stickers</a></li>
          <li><a href="/cs225/sp2026/labs/lab_intro/">duplicate</a></li>
          <li><a href="https://other.example.com/cs225/sp2026/labs/lab_evil/">off-site</a></li>
          <li><a href="/cs225/sp2026/labs/lab_debug/"></a></li>
          <li><a href="/cs225/sp2026/resources/">Resources</a></li>
        </ul>"#;

    fn page_url() -> Url {
        Url::parse("https://courses.example.edu/cs225/sp2026/assignments/").unwrap()
    }

    #[test]
    fn matching_same_host_links_in_order() {
        let pattern = Regex::new(r"/(labs|mps)/").unwrap();
        let tasks = parse_task_links(PAGE, &page_url(), &pattern, "CS 225");
        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Lab: Intro", "MP Stickers", "lab_debug"]);
        assert!(tasks.iter().all(|t| t.url.starts_with("https://courses.example.edu/")));
        assert!(tasks.iter().all(|t| t.source == "CS 225"));
    }

    #[test]
    fn quotes_inside_href_survive() {
        let page = r#"<a href="/cs225/labs/O'Brien/">Lab: O'Brien</a><a href='/cs225/labs/say-"hi"/'>Say hi</a>"#;
        let pattern = Regex::new(r"/labs/").unwrap();
        let tasks = parse_task_links(page, &page_url(), &pattern, "CS 225");
        let urls: Vec<&str> = tasks.iter().map(|t| t.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://courses.example.edu/cs225/labs/O'Brien/",
                "https://courses.example.edu/cs225/labs/say-%22hi%22/",
            ]
        );
    }

    #[test]
    fn nothing_matches() {
        let pattern = Regex::new(r"/quizzes/").unwrap();
        assert!(parse_task_links(PAGE, &page_url(), &pattern, "CS 225").is_empty());
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let scraper = HttpScraper::new();
        let source = ScrapeSource {
            label: "x".to_string(),
            url: "https://courses.example.edu/".to_string(),
            link_pattern: "(".to_string(),
        };
        assert!(matches!(scraper.scrape(&source), Err(CanvasError::Pattern(_))));
    }

    #[test]
    fn non_http_source_rejected() {
        let scraper = HttpScraper::new();
        let source = ScrapeSource {
            label: "x".to_string(),
            url: "file:///etc/passwd".to_string(),
            link_pattern: ".".to_string(),
        };
        assert!(matches!(scraper.scrape(&source), Err(CanvasError::InvalidUrl(_))));
    }
}

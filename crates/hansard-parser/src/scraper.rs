use std::collections::HashSet;
use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};

use crate::types::{House, TranscriptType};

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("invalid selector: a[href]"));

const NEXT_SECTION: &str = "Next Section";
const NOT_FOUND_MARKERS: &[&str] = &["Page cannot be found", "Page Not Found"];

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Transcript not found: {0}")]
    NotFound(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    /// Parliamentary session label such as `201011`. Derived from the sitting
    /// date when unset.
    pub session: Option<String>,
    pub timeout: Duration,
    /// Upper bound on pages followed per transcript stream.
    pub max_pages: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: crate::BASE_URL.to_string(),
            session: None,
            timeout: Duration::from_secs(30),
            max_pages: 250,
        }
    }
}

impl ScraperConfig {
    /// Defaults, with `HANSARD_BASE_URL` overriding the base URL when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var("HANSARD_BASE_URL")
            && !base_url.trim().is_empty()
        {
            config.base_url = base_url.trim().trim_end_matches('/').to_string();
        }
        config
    }
}

/// One fetched page of a transcript stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub url: String,
    pub html: String,
}

impl Page {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

/// Yields the pages of one transcript stream in reading order.
pub trait DocumentSource {
    fn fetch_transcript(
        &self,
        date: NaiveDate,
        house: House,
        transcript: TranscriptType,
    ) -> impl Future<Output = Result<Vec<Page>, ScraperError>> + Send;
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    config: ScraperConfig,
}

impl WebScraper {
    pub fn new(config: ScraperConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// The first page of a transcript stream.
    pub fn transcript_url(
        &self,
        date: NaiveDate,
        house: House,
        transcript: TranscriptType,
    ) -> Result<String, ScraperError> {
        let session = self
            .config
            .session
            .clone()
            .unwrap_or_else(|| default_session(date));
        let day = date.format("%y%m%d");
        let base = self.config.base_url.trim_end_matches('/');

        match house {
            House::Commons => {
                let dir = match transcript {
                    TranscriptType::Debates => "debtext",
                    TranscriptType::WestminsterHall => "halltext",
                    TranscriptType::WrittenStatements => "wmstext",
                    TranscriptType::Petitions => "petntext",
                    TranscriptType::WrittenAnswers => "text",
                    TranscriptType::MinisterialCorrections => "corrtext",
                    TranscriptType::GrandCommittee => {
                        return Err(ScraperError::InvalidUrl(format!(
                            "{} has no {} transcript",
                            house, transcript
                        )));
                    }
                };
                Ok(format!(
                    "{}/pa/cm{}/cmhansrd/cm{}/{}/{}-0001.htm",
                    base, session, day, dir, day
                ))
            }
            House::Lords => {
                let prefix = match transcript {
                    TranscriptType::Debates => "",
                    TranscriptType::GrandCommittee => "gc",
                    TranscriptType::WrittenStatements => "wms",
                    TranscriptType::WrittenAnswers => "wa",
                    TranscriptType::WestminsterHall
                    | TranscriptType::Petitions
                    | TranscriptType::MinisterialCorrections => {
                        return Err(ScraperError::InvalidUrl(format!(
                            "{} has no {} transcript",
                            house, transcript
                        )));
                    }
                };
                Ok(format!(
                    "{}/pa/ld{}/ldhansrd/text/{}-{}0001.htm",
                    base, session, day, prefix
                ))
            }
        }
    }

    async fn get_html(&self, url: &str) -> Result<String, ScraperError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound(url.to_string()));
        }

        let html = response
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        if NOT_FOUND_MARKERS.iter().any(|marker| html.contains(marker)) {
            return Err(ScraperError::NotFound(url.to_string()));
        }
        Ok(html)
    }
}

impl DocumentSource for WebScraper {
    async fn fetch_transcript(
        &self,
        date: NaiveDate,
        house: House,
        transcript: TranscriptType,
    ) -> Result<Vec<Page>, ScraperError> {
        let mut next = Some(self.transcript_url(date, house, transcript)?);
        let mut seen = HashSet::new();
        let mut pages = Vec::new();

        while let Some(url) = next.take() {
            if pages.len() >= self.config.max_pages {
                log::warn!(
                    "Stopped {} {} after {} pages",
                    date,
                    transcript,
                    self.config.max_pages
                );
                break;
            }
            if !seen.insert(url.clone()) {
                break;
            }

            log::info!("Fetching {} {} page {}: {}", date, transcript, pages.len() + 1, url);
            let html = self.get_html(&url).await?;
            next = next_section_link(&html, &url);
            pages.push(Page { url, html });
        }

        Ok(pages)
    }
}

/// Sessions open in the autumn; a sitting before November belongs to the
/// session that opened the previous year.
pub fn default_session(date: NaiveDate) -> String {
    let start = if date.month() >= 11 {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{}{:02}", start, (start + 1).rem_euclid(100))
}

/// The absolute URL of the page's "Next Section" link, if it has one.
pub fn next_section_link(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let href = document
        .select(&LINK_SELECTOR)
        .find(|a| a.text().collect::<String>().trim() == NEXT_SECTION)
        .and_then(|a| a.value().attr("href"))?;
    resolve_url(page_url, href)
}

fn resolve_url(page_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }

    let scheme_end = page_url.find("://")? + 3;
    let origin_end = page_url[scheme_end..]
        .find('/')
        .map_or(page_url.len(), |i| scheme_end + i);

    if href.starts_with('/') {
        return Some(format!("{}{}", &page_url[..origin_end], href));
    }

    let dir_end = page_url.rfind('/').filter(|&i| i >= origin_end)?;
    Some(format!("{}/{}", &page_url[..dir_end], href))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scraper(session: Option<&str>) -> WebScraper {
        WebScraper::new(ScraperConfig {
            base_url: "https://publications.parliament.uk".to_string(),
            session: session.map(str::to_string),
            ..ScraperConfig::default()
        })
        .unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2011, 7, 19).unwrap()
    }

    #[test]
    fn test_default_session() {
        assert_eq!(default_session(date()), "201011");
        assert_eq!(
            default_session(NaiveDate::from_ymd_opt(2012, 11, 6).unwrap()),
            "201213"
        );
        assert_eq!(
            default_session(NaiveDate::from_ymd_opt(1999, 12, 1).unwrap()),
            "199900"
        );
    }

    #[test]
    fn test_commons_transcript_urls() {
        let scraper = scraper(None);
        assert_eq!(
            scraper
                .transcript_url(date(), House::Commons, TranscriptType::Debates)
                .unwrap(),
            "https://publications.parliament.uk/pa/cm201011/cmhansrd/cm110719/debtext/110719-0001.htm"
        );
        assert_eq!(
            scraper
                .transcript_url(date(), House::Commons, TranscriptType::WestminsterHall)
                .unwrap(),
            "https://publications.parliament.uk/pa/cm201011/cmhansrd/cm110719/halltext/110719-0001.htm"
        );
        assert!(
            scraper
                .transcript_url(date(), House::Commons, TranscriptType::GrandCommittee)
                .is_err()
        );
    }

    #[test]
    fn test_lords_transcript_urls() {
        let scraper = scraper(Some("201012"));
        assert_eq!(
            scraper
                .transcript_url(date(), House::Lords, TranscriptType::Debates)
                .unwrap(),
            "https://publications.parliament.uk/pa/ld201012/ldhansrd/text/110719-0001.htm"
        );
        assert_eq!(
            scraper
                .transcript_url(date(), House::Lords, TranscriptType::WrittenAnswers)
                .unwrap(),
            "https://publications.parliament.uk/pa/ld201012/ldhansrd/text/110719-wa0001.htm"
        );
    }

    #[test]
    fn test_next_section_link_from_fixture() {
        let html = std::fs::read_to_string("fixtures/commons_debates.htm")
            .expect("Failed to read sample file");
        let url = "https://publications.parliament.uk/pa/cm201011/cmhansrd/cm110719/debtext/110719-0001.htm";
        assert_eq!(
            next_section_link(&html, url).as_deref(),
            Some(
                "https://publications.parliament.uk/pa/cm201011/cmhansrd/cm110719/debtext/110719-0002.htm"
            )
        );
    }

    #[test]
    fn test_next_section_link_relative_and_missing() {
        let url = "https://example.org/pa/text/110719-0001.htm";
        let html = r#"<p><a href="110719-0002.htm">Next Section</a> <a href="index.htm">Index</a></p>"#;
        assert_eq!(
            next_section_link(html, url).as_deref(),
            Some("https://example.org/pa/text/110719-0002.htm")
        );

        let html = r#"<p><a href="index.htm">Index</a></p>"#;
        assert_eq!(next_section_link(html, url), None);
    }

    #[test]
    fn test_config_defaults() {
        let config = ScraperConfig::default();
        assert_eq!(config.base_url, crate::BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_pages, 250);
    }
}

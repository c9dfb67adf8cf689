use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::document::{Component, DailyPart};
use crate::extract::Segmenter;
use crate::ids;
use crate::member::MemberResolver;
use crate::node::parse_nodes;
use crate::scraper::{DocumentSource, Page};
use crate::store::{Store, StoreError};
use crate::types::{House, TranscriptType, UnrecognizedTranscriptType};

static RE_VOLUME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Volume No\.\s*(\d+)").expect("invalid regex: volume"));
static RE_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Part No\.\s*(\d+)").expect("invalid regex: part"));

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    UnrecognizedTranscriptType(#[from] UnrecognizedTranscriptType),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Runs every transcript stream of one day through the segmenter and keeps the
/// result in a [`Store`].
#[derive(Debug)]
pub struct HansardParser<S, T> {
    source: S,
    store: T,
}

impl<S: DocumentSource, T: Store> HansardParser<S, T> {
    pub fn new(source: S, store: T) -> Self {
        Self { source, store }
    }

    pub fn store(&self) -> &T {
        &self.store
    }

    pub fn into_store(self) -> T {
        self.store
    }

    /// Parses every component of the day. A stream that cannot be fetched is
    /// skipped with a warning; the rest of the day still parses.
    pub async fn parse_daily_part(
        &mut self,
        date: NaiveDate,
        house: House,
    ) -> Result<DailyPart, ParseError> {
        let id = ids::daily_part_id(date, house);
        let mut daily_part = self
            .store
            .find_or_create(&id, || DailyPart::new(&id, date, house))?;
        let mut resolver = MemberResolver::new();

        for spec in house.components() {
            let pages = match self
                .source
                .fetch_transcript(date, house, spec.transcript)
                .await
            {
                Ok(pages) if !pages.is_empty() => pages,
                Ok(_) => {
                    log::warn!("No pages for {} {} on {}, skipping", house, spec.transcript, date);
                    continue;
                }
                Err(e) => {
                    log::warn!(
                        "Skipping {} {} on {}: {}",
                        house,
                        spec.transcript,
                        date,
                        e
                    );
                    continue;
                }
            };

            if spec.transcript == TranscriptType::Debates
                && let Some(first) = pages.first()
            {
                read_volume(&mut daily_part, &first.html);
            }

            let component = segment(&id, house, spec.transcript, &pages, &mut resolver)?;
            log::info!(
                "Parsed {} with {} section(s)",
                component.id,
                component.all_sections().len()
            );
            daily_part.upsert_component(component);
        }

        log::debug!("Resolved {} distinct member(s)", resolver.len());
        self.store.save(&daily_part)?;
        Ok(daily_part)
    }
}

/// Segments caller-supplied pages of one transcript stream.
pub fn parse_pages(
    date: NaiveDate,
    house: House,
    transcript: TranscriptType,
    pages: &[Page],
) -> Result<Component, ParseError> {
    let id = ids::daily_part_id(date, house);
    let mut resolver = MemberResolver::new();
    segment(&id, house, transcript, pages, &mut resolver)
}

fn segment(
    daily_part_id: &str,
    house: House,
    transcript: TranscriptType,
    pages: &[Page],
    resolver: &mut MemberResolver,
) -> Result<Component, ParseError> {
    let spec = house.component(transcript)?;
    let mut segmenter = Segmenter::new(daily_part_id, spec, resolver);
    for page in pages {
        segmenter.feed_page(&page.url, &parse_nodes(&page.html));
    }
    Ok(segmenter.finish())
}

fn read_volume(daily_part: &mut DailyPart, html: &str) {
    if let Some(caps) = RE_VOLUME.captures(html) {
        daily_part.volume = Some(caps[1].to_string());
    }
    if let Some(caps) = RE_PART.captures(html) {
        daily_part.part = Some(caps[1].to_string());
    }
}

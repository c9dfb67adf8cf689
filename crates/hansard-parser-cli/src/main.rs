use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use futures::stream::{FuturesUnordered, StreamExt};
use hansard_parser::document::DailyPart;
use hansard_parser::parser::{ParseError, parse_pages};
use hansard_parser::scraper::{Page, ScraperConfig};
use hansard_parser::store::{JsonStore, MemoryStore, Store};
use hansard_parser::types::{House, TranscriptType};
use hansard_parser::{HansardParser, WebScraper};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "hansard-parser")]
#[command(about = "Fetches and segments parliamentary record transcripts", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(clap::Args)]
struct SourceArgs {
    #[arg(long, help = "Base URL of the published record (overrides HANSARD_BASE_URL)")]
    base_url: Option<String>,

    #[arg(long, help = "Parliamentary session label, e.g. 201011")]
    session: Option<String>,

    #[arg(
        long,
        help = "Maximum number of pages to follow per transcript",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    max_pages: Option<u16>,

    #[arg(long, value_name = "DIR", help = "Keep parsed days as JSON files in this directory")]
    store: Option<PathBuf>,
}

impl SourceArgs {
    fn config(&self) -> ScraperConfig {
        let mut config = ScraperConfig::from_env();
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(session) = &self.session {
            config.session = Some(session.clone());
        }
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages as usize;
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and segment every transcript of one sitting day
    Parse {
        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "Sitting date",
            value_parser = parse_date,
        )]
        date: NaiveDate,

        #[arg(long, value_parser = parse_house, help = "House: commons or lords")]
        house: House,

        #[command(flatten)]
        source: SourceArgs,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Fetch and segment a range of sitting days concurrently
    Range {
        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "First day of the range",
            value_parser = parse_date,
        )]
        start_date: NaiveDate,

        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "Last day of the range",
            value_parser = parse_date,
        )]
        end_date: NaiveDate,

        #[arg(long, value_parser = parse_house, help = "House: commons or lords")]
        house: House,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// Segment transcript pages saved on disk, in the order given
    File {
        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "Sitting date the pages belong to",
            value_parser = parse_date,
        )]
        date: NaiveDate,

        #[arg(long, value_parser = parse_house, help = "House: commons or lords")]
        house: House,

        #[arg(long, value_parser = parse_transcript, help = "Transcript type, e.g. debates or wa")]
        transcript: TranscriptType,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,

        #[arg(required = true, help = "HTML pages to segment")]
        paths: Vec<PathBuf>,
    },
    /// Print the JSON Schema of a parsed sitting day
    Schema,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string())
}

fn parse_house(s: &str) -> Result<House, String> {
    House::from_str(s).map_err(|e| e.to_string())
}

fn parse_transcript(s: &str) -> Result<TranscriptType, String> {
    TranscriptType::from_str(s).map_err(|e| e.to_string())
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn scraper(source: &SourceArgs) -> WebScraper {
    WebScraper::new(source.config()).unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    })
}

fn json_store(dir: &Path) -> JsonStore {
    JsonStore::new(dir).unwrap_or_else(|e| {
        log::error!("Error opening store {}: {}", dir.display(), e);
        process::exit(1);
    })
}

async fn run_day<T: Store>(
    scraper: WebScraper,
    store: T,
    date: NaiveDate,
    house: House,
) -> Result<DailyPart, ParseError> {
    HansardParser::new(scraper, store)
        .parse_daily_part(date, house)
        .await
}

async fn parse_day(
    scraper: WebScraper,
    store: Option<&JsonStore>,
    date: NaiveDate,
    house: House,
) -> Result<DailyPart, ParseError> {
    match store {
        Some(store) => run_day(scraper, store.clone(), date, house).await,
        None => run_day(scraper, MemoryStore::new(), date, house).await,
    }
}

fn section_count(daily_part: &DailyPart) -> usize {
    daily_part
        .components
        .iter()
        .map(|c| c.all_sections().len())
        .sum()
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    match cli.command {
        Commands::Parse {
            date,
            house,
            source,
            format,
        } => {
            let scraper = scraper(&source);
            let store = source.store.as_deref().map(json_store);

            log::info!("Parsing {} for {}...", house, date);

            let daily_part = parse_day(scraper, store.as_ref(), date, house)
                .await
                .unwrap_or_else(|e| {
                    log::error!("Error parsing {} for {}: {}", house, date, e);
                    process::exit(1);
                });

            match format {
                OutputFormat::Json => serialize_json(&daily_part),
                OutputFormat::Text => print!("{}", daily_part),
            }
        }

        Commands::Range {
            start_date,
            end_date,
            house,
            source,
        } => {
            if end_date < start_date {
                log::error!("Invalid args: end date {end_date} is before start date {start_date}");
                process::exit(1);
            }

            let scraper = scraper(&source);
            let store = source.store.as_deref().map(json_store);
            let days: Vec<NaiveDate> = start_date
                .iter_days()
                .take_while(|day| *day <= end_date)
                .collect();

            log::info!("Parsing {} day(s) of {}...", days.len(), house);

            let mut futures: FuturesUnordered<_> = days
                .iter()
                .map(|&date| {
                    let scraper = scraper.clone();
                    let store = store.as_ref();
                    async move { (date, parse_day(scraper, store, date, house).await) }
                })
                .collect();

            let mut parsed = Vec::new();
            while let Some((date, result)) = futures.next().await {
                match result {
                    Ok(daily_part) => parsed.push(daily_part),
                    Err(e) => log::warn!("Failed to parse {}: {}", date, e),
                }
            }

            parsed.sort_by_key(|d| d.date);
            if parsed.is_empty() {
                println!("No sitting days parsed.");
            }
            for daily_part in &parsed {
                println!(
                    "{}  {:>2} component(s)  {:>4} section(s)",
                    daily_part.date,
                    daily_part.components.len(),
                    section_count(daily_part)
                );
            }
        }

        Commands::File {
            date,
            house,
            transcript,
            format,
            paths,
        } => {
            let pages: Vec<Page> = paths
                .iter()
                .map(|path| {
                    let html = fs::read_to_string(path).unwrap_or_else(|e| {
                        log::error!("Error reading {}: {}", path.display(), e);
                        process::exit(1);
                    });
                    Page::new(path.display().to_string(), html)
                })
                .collect();

            let component =
                parse_pages(date, house, transcript, &pages).unwrap_or_else(|e| {
                    log::error!("Error segmenting {}: {}", transcript, e);
                    process::exit(1);
                });

            match format {
                OutputFormat::Json => serialize_json(&component),
                OutputFormat::Text => print!("{}", component),
            }
        }

        Commands::Schema => serialize_json(&schemars::schema_for!(DailyPart)),
    }
}

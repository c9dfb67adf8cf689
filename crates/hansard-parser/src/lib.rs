pub mod columns;
pub mod document;
pub mod extract;
pub mod ids;
pub mod member;
pub mod node;
pub mod parser;
pub mod scraper;
pub mod state;
pub mod store;
pub mod text;
pub mod types;

pub use parser::HansardParser;
pub use scraper::WebScraper;

pub(crate) const BASE_URL: &str = "https://publications.parliament.uk";

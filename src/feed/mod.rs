mod fetch;
mod parse;

pub use fetch::{Classification, classify, fetch_document, is_url, read_document_file};
pub use parse::{Episode, extract_episodes};

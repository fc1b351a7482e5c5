mod fetcher;
mod models;
mod parser;
mod source;

pub use fetcher::{FeedFetcher, HttpFeedFactory, RssFeedSource};
pub use models::{Article, Item, NewArticle, NewSource, Source};
pub use parser::parse_items;
pub use source::{FeedSource, FeedSourceFactory};

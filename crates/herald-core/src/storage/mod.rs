mod article_repo;
mod database;
mod source_repo;
mod traits;

pub use article_repo::ArticleRepository;
pub use database::Database;
pub use source_repo::SourceRepository;
pub use traits::{ArticleStore, SourceRegistry};

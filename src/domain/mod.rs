pub mod article;
pub mod filter;

pub use article::{
    export_filename, sort_by_recency, title_from_filename, Article, ArticleDraft,
    ArticleMetadata, ArticleUpdate, ExportedArticle, UNCATEGORIZED,
};
pub use filter::ArticleFilter;

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::ArticleMetadata;

/// List-view filter. All set criteria must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    /// Case-insensitive substring over title, excerpt and tags.
    pub query: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    /// Exact tag match.
    pub tag: Option<String>,
}

impl ArticleFilter {
    pub fn is_empty(&self) -> bool {
        self.query_text().is_none() && self.category.is_none() && self.tag.is_none()
    }

    fn query_text(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty())
    }

    pub fn matches(&self, article: &ArticleMetadata) -> bool {
        if let Some(query) = self.query_text() {
            let in_title = article.title.to_lowercase().contains(&query);
            let in_excerpt = article
                .excerpt
                .as_deref()
                .map(|e| e.to_lowercase().contains(&query))
                .unwrap_or(false);
            let in_tags = article
                .tags
                .iter()
                .any(|t| t.to_lowercase().contains(&query));
            if !(in_title || in_excerpt || in_tags) {
                return false;
            }
        }

        if let Some(ref category) = self.category {
            if &article.category != category {
                return false;
            }
        }

        if let Some(ref tag) = self.tag {
            if !article.tags.iter().any(|t| t == tag) {
                return false;
            }
        }

        true
    }

    /// Keeps the input order.
    pub fn apply(&self, articles: &[ArticleMetadata]) -> Vec<ArticleMetadata> {
        articles
            .iter()
            .filter(|a| self.matches(a))
            .cloned()
            .collect()
    }
}

/// Articles bucketed by category, buckets sorted by name. Empty categories
/// land in the "Uncategorized" bucket.
pub fn group_by_category(articles: &[ArticleMetadata]) -> Vec<(String, Vec<ArticleMetadata>)> {
    let mut groups: BTreeMap<String, Vec<ArticleMetadata>> = BTreeMap::new();
    for article in articles {
        groups
            .entry(article.display_category().to_string())
            .or_default()
            .push(article.clone());
    }
    groups.into_iter().collect()
}

pub fn categories(articles: &[ArticleMetadata]) -> Vec<String> {
    articles
        .iter()
        .filter(|a| !a.category.is_empty())
        .map(|a| a.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn tags(articles: &[ArticleMetadata]) -> Vec<String> {
    articles
        .iter()
        .flat_map(|a| a.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Article, ArticleDraft};

    fn sample() -> Vec<ArticleMetadata> {
        vec![
            Article::new(
                ArticleDraft::new("Rust ownership", "Borrowing explained")
                    .with_category("Programming")
                    .with_tags(["rust", "memory"]),
            )
            .metadata(),
            Article::new(
                ArticleDraft::new("Sourdough", "Bread at home")
                    .with_category("Cooking")
                    .with_tags(["baking"]),
            )
            .metadata(),
            Article::new(ArticleDraft::new("Loose note", "Nothing to file").with_tags(["Rustic"]))
                .metadata(),
        ]
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let list = sample();
        let filter = ArticleFilter {
            query: Some("   ".into()),
            ..Default::default()
        };
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&list).len(), 3);
    }

    #[test]
    fn test_query_matches_title_excerpt_and_tags() {
        let list = sample();
        let by_tag = ArticleFilter {
            query: Some("RUST".into()),
            ..Default::default()
        };
        let titles: Vec<_> = by_tag.apply(&list).into_iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["Rust ownership", "Loose note"]);

        let by_excerpt = ArticleFilter {
            query: Some("bread".into()),
            ..Default::default()
        };
        assert_eq!(by_excerpt.apply(&list)[0].title, "Sourdough");
    }

    #[test]
    fn test_category_and_tag_are_exact() {
        let list = sample();
        let filter = ArticleFilter {
            category: Some("Cooking".into()),
            tag: Some("baking".into()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&list).len(), 1);

        let partial_tag = ArticleFilter {
            tag: Some("bak".into()),
            ..Default::default()
        };
        assert!(partial_tag.apply(&list).is_empty());
    }

    #[test]
    fn test_grouping_and_distinct_values() {
        let list = sample();
        let groups = group_by_category(&list);
        let names: Vec<_> = groups.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Cooking", "Programming", "Uncategorized"]);

        assert_eq!(categories(&list), vec!["Cooking", "Programming"]);
        assert_eq!(tags(&list), vec!["Rustic", "baking", "memory", "rust"]);
    }
}

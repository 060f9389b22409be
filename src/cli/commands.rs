use std::io::Read;
use std::path::Path;

use crate::app::{AppContext, FolioError, Result};
use crate::domain::filter::{categories, group_by_category, tags};
use crate::domain::{ArticleDraft, ArticleFilter, ArticleMetadata, ArticleUpdate};
use crate::reading::ReadingAids;

pub async fn list_articles(ctx: &AppContext, filter: &ArticleFilter, grouped: bool) -> Result<()> {
    ctx.store.list().await?;
    let articles = ctx.store.filtered(filter);

    if articles.is_empty() {
        println!("No articles");
        return Ok(());
    }

    if grouped {
        for (category, group) in group_by_category(&articles) {
            println!("{} ({})", category, group.len());
            for article in &group {
                print_metadata(article, "  ");
            }
        }
    } else {
        for article in &articles {
            print_metadata(article, "");
        }
    }

    Ok(())
}

pub async fn list_categories(ctx: &AppContext) -> Result<Vec<String>> {
    let names = categories(&ctx.store.list().await?);
    print_names(&names, "No categories");
    Ok(names)
}

pub async fn list_tags(ctx: &AppContext) -> Result<Vec<String>> {
    let names = tags(&ctx.store.list().await?);
    print_names(&names, "No tags");
    Ok(names)
}

fn print_names(names: &[String], empty: &str) {
    if names.is_empty() {
        println!("{}", empty);
    }
    for name in names {
        println!("{}", name);
    }
}

fn print_metadata(article: &ArticleMetadata, indent: &str) {
    let tags = if article.tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", article.tags.join(", "))
    };
    println!(
        "{}{} {} {}{}",
        indent,
        article.updated_at.format("%Y-%m-%d"),
        article.id,
        article.title,
        tags
    );
    if let Some(excerpt) = article.excerpt.as_deref().filter(|e| !e.is_empty()) {
        println!("{}    {}", indent, excerpt);
    }
}

pub async fn show_article(ctx: &AppContext, id: &str, html: bool) -> Result<()> {
    let article = ctx
        .store
        .get(id)
        .await?
        .ok_or_else(|| FolioError::NotFound(id.to_string()))?;

    if html {
        println!("{}", ctx.renderer.render_to_html(&article.content));
    } else {
        println!("{}", article.content);
    }
    Ok(())
}

pub async fn new_article(
    ctx: &AppContext,
    title: &str,
    file: &Path,
    category: Option<String>,
    tags: Vec<String>,
) -> Result<()> {
    let content = read_content(file)?;
    let draft = ArticleDraft::new(title, content)
        .with_category(category.unwrap_or_default())
        .with_tags(tags);

    let article = ctx.store.create(draft).await?;
    println!("Created article: {} ({})", article.title, article.id);
    Ok(())
}

pub async fn edit_article(ctx: &AppContext, id: &str, update: ArticleUpdate) -> Result<()> {
    if update.is_empty() {
        println!("Nothing to change");
        return Ok(());
    }

    let article = ctx.store.update(id, update).await?;
    println!("Updated article: {} ({})", article.title, article.id);
    Ok(())
}

pub async fn delete_article(ctx: &AppContext, id: &str) -> Result<()> {
    ctx.store.delete(id).await?;
    println!("Deleted article: {}", id);
    Ok(())
}

pub async fn export_article(ctx: &AppContext, id: &str, out_dir: &Path) -> Result<()> {
    let exported = ctx.store.export(id).await?;
    tokio::fs::create_dir_all(out_dir).await?;
    let path = out_dir.join(&exported.filename);
    tokio::fs::write(&path, &exported.bytes).await?;
    println!("Exported to {}", path.display());
    Ok(())
}

pub async fn import_articles(ctx: &AppContext, paths: &[impl AsRef<Path>]) -> Result<()> {
    let mut imported = 0;
    let mut errors = 0;

    for path in paths {
        let path = path.as_ref();
        match ctx.store.import_file(path).await {
            Ok(article) => {
                println!("  + {} ({})", article.title, article.id);
                imported += 1;
            }
            Err(e) => {
                eprintln!("  ! {} - {}", path.display(), e);
                errors += 1;
            }
        }
    }

    println!("\nImport complete: {} imported, {} errors", imported, errors);
    Ok(())
}

pub async fn print_toc(ctx: &AppContext, id: &str) -> Result<()> {
    let aids = reading_aids(ctx, id).await?;

    if aids.toc.is_empty() {
        println!("No headings");
        return Ok(());
    }

    for item in &aids.toc {
        let indent = "  ".repeat(usize::from(item.level.saturating_sub(1)));
        println!("{}{} #{}", indent, item.text, item.id);
    }
    Ok(())
}

pub async fn print_stats(ctx: &AppContext, id: &str) -> Result<()> {
    let aids = reading_aids(ctx, id).await?;
    println!("Words: {}", aids.word_count);
    println!("Headings: {}", aids.toc.len());
    println!(
        "Reading time: {} min at {} words/min",
        aids.reading_minutes, ctx.config.reading.words_per_minute
    );
    Ok(())
}

async fn reading_aids(ctx: &AppContext, id: &str) -> Result<ReadingAids> {
    let article = ctx
        .store
        .get(id)
        .await?
        .ok_or_else(|| FolioError::NotFound(id.to_string()))?;
    Ok(ReadingAids::prepare(
        ctx.renderer.as_ref(),
        &article.content,
        ctx.config.reading.words_per_minute,
    ))
}

/// Read Markdown from `path`, or stdin when it is `-`.
fn read_content(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        return Ok(content);
    }
    Ok(std::fs::read_to_string(path)?)
}

pub fn read_optional_content(path: Option<&Path>) -> Result<Option<String>> {
    path.map(read_content).transpose()
}

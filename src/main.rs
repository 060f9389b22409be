use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use folio::app::AppContext;
use folio::cli::{commands, Cli, Commands};
use folio::config::{BackendKind, Config};
use folio::domain::{ArticleFilter, ArticleUpdate};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(db) = cli.db {
        config.storage.backend = BackendKind::Local;
        config.storage.db_path = Some(db);
    }
    if let Some(remote) = cli.remote {
        config.storage.backend = BackendKind::Remote;
        config.storage.remote_url = Some(remote);
    }

    let ctx = AppContext::new(config).await?;

    match cli.command {
        Commands::List {
            search,
            category,
            tag,
            grouped,
        } => {
            let filter = ArticleFilter {
                query: search,
                category,
                tag,
            };
            commands::list_articles(&ctx, &filter, grouped).await?;
        }
        Commands::Categories => {
            commands::list_categories(&ctx).await?;
        }
        Commands::Tags => {
            commands::list_tags(&ctx).await?;
        }
        Commands::Show { id, html } => {
            commands::show_article(&ctx, &id, html).await?;
        }
        Commands::New {
            title,
            file,
            category,
            tags,
        } => {
            commands::new_article(&ctx, &title, &file, category, tags).await?;
        }
        Commands::Edit {
            id,
            title,
            file,
            category,
            tags,
        } => {
            let update = ArticleUpdate {
                title,
                content: commands::read_optional_content(file.as_deref())?,
                category,
                tags,
            };
            commands::edit_article(&ctx, &id, update).await?;
        }
        Commands::Delete { id } => {
            commands::delete_article(&ctx, &id).await?;
        }
        Commands::Export { id, out } => {
            commands::export_article(&ctx, &id, &out).await?;
        }
        Commands::Import { paths } => {
            commands::import_articles(&ctx, paths.as_slice()).await?;
        }
        Commands::Toc { id } => {
            commands::print_toc(&ctx, &id).await?;
        }
        Commands::Stats { id } => {
            commands::print_stats(&ctx, &id).await?;
        }
    }

    Ok(())
}

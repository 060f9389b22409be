pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Write, keep and read Markdown articles", long_about = None)]
pub struct Cli {
    /// Use this SQLite database instead of the configured backend
    #[arg(long, global = true, conflicts_with = "remote")]
    pub db: Option<PathBuf>,

    /// Use the article service at this base URL instead of the configured backend
    #[arg(long, global = true)]
    pub remote: Option<String>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List articles, most recently updated first
    List {
        /// Only articles whose title, excerpt or tags contain this text
        #[arg(short, long)]
        search: Option<String>,
        /// Only articles in this category
        #[arg(short, long)]
        category: Option<String>,
        /// Only articles with this tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Group the listing by category
        #[arg(long)]
        grouped: bool,
    },
    /// List the categories in use
    Categories,
    /// List the tags in use
    Tags,
    /// Print an article's Markdown
    Show {
        id: String,
        /// Print rendered HTML instead of Markdown
        #[arg(long)]
        html: bool,
    },
    /// Create an article
    New {
        #[arg(short, long)]
        title: String,
        /// Markdown file with the content ("-" reads stdin)
        #[arg(short, long)]
        file: PathBuf,
        #[arg(short, long)]
        category: Option<String>,
        /// Tag to attach; repeat for several
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Change an article's fields
    Edit {
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        /// Markdown file with the new content ("-" reads stdin)
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[arg(short, long)]
        category: Option<String>,
        /// Replace the tags; repeat for several
        #[arg(long = "tag")]
        tags: Option<Vec<String>>,
    },
    /// Delete an article
    Delete { id: String },
    /// Write an article to a Markdown file named after its title
    Export {
        id: String,
        /// Directory to write into
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Create articles from Markdown files, titled after the file names
    Import {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print an article's table of contents
    Toc { id: String },
    /// Print word count and estimated reading time
    Stats { id: String },
}

//! # Folio
//!
//! A personal Markdown article library: write, keep, list and read articles.
//!
//! ## Architecture
//!
//! ```text
//! Backend (SQLite | REST) → ArticleStore → metadata projection → list views
//!                                 ↓
//!              Renderer → headings → TOC / reading metrics → reading view
//! ```
//!
//! - [`store`]: the article collection behind one contract, with an embedded
//!   SQLite backend and a REST client backend
//! - [`excerpt`]: plain-text summaries derived from Markdown
//! - [`reading`]: table of contents, reading time and scroll progress
//! - [`render`]: Markdown to safe HTML with heading anchors
//!
//! ## Quick Start
//!
//! ```bash
//! # Create an article from a file
//! folio new --title "Hello" --file hello.md
//!
//! # List articles
//! folio list --search rust
//!
//! # Table of contents and reading time
//! folio toc <id>
//! folio stats <id>
//!
//! # Use a remote article service instead of the local database
//! folio --remote http://localhost:3000/api list
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires the configured backend,
/// the article store and the renderer together.
pub mod app;

/// Command-line interface using clap.
///
/// - `list [--search] [--category] [--tag] [--grouped]`
/// - `categories` / `tags`
/// - `show <id> [--html]`
/// - `new --title <t> --file <path>` / `edit <id>` / `delete <id>`
/// - `export <id>` / `import <paths>...`
/// - `toc <id>` / `stats <id>`
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/folio/config.toml`:
/// - Storage backend selection (local database or remote service)
/// - Reading speed
pub mod config;

/// Core domain models.
///
/// - [`Article`](domain::Article): the canonical record
/// - [`ArticleMetadata`](domain::ArticleMetadata): list projection without content
/// - [`ArticleFilter`](domain::ArticleFilter): search/category/tag filtering
pub mod domain;

/// Excerpt generation from raw Markdown.
pub mod excerpt;

/// Reading aids.
///
/// - [`TocBuilder`](reading::TocBuilder): heading outline with stable ids
/// - [`estimate_reading_time`](reading::estimate_reading_time) and
///   [`calculate_reading_progress`](reading::calculate_reading_progress)
/// - [`ReadingSession`](reading::ReadingSession): view-scoped scroll tracking
pub mod reading;

/// Markdown rendering and heading extraction.
pub mod render;

/// Article persistence.
///
/// - [`ArticleBackend`](store::ArticleBackend): trait implemented by each storage variant
/// - [`SqliteBackend`](store::SqliteBackend): embedded SQLite database
/// - [`RemoteBackend`](store::RemoteBackend): REST article service client
/// - [`ArticleStore`](store::ArticleStore): validation, export/import and the
///   reactive metadata projection
pub mod store;

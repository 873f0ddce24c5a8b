//! # Sitekit
//!
//! A small static site builder whose centerpiece is an image helper: page
//! templates reference source images by path, and the build swaps each
//! reference for an optimized WebP rendition. Processing failures never abort
//! a page; the reference degrades to the original file instead.
//!
//! # Build Lifecycle
//!
//! ```text
//! 1. Before build   css/style.css  →  css/style.min.css   (external minifier)
//! 2. Render         *.html, *.md   →  _site/**/index.html (image helpers resolve here)
//! 3. Passthrough    css/ js/ images/ fonts/  →  _site/    (verbatim copy)
//! ```
//!
//! The CSS task runs once per build, inline by default or on a background
//! thread. Either way it is joined before passthrough copy, so the minified
//! stylesheet is always part of the output.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`site`] | Build orchestration: task scheduling, parallel page render, passthrough |
//! | [`helper`] | The `image` filter and shortcode with their fallback behavior |
//! | [`processor`] | Resolves a source path to WebP renditions, memoized per build |
//! | [`imaging`] | Pixel work behind the [`imaging::ImageBackend`] trait |
//! | [`cache`] | Content hashes that name renditions and make rebuilds cheap |
//! | [`html`] | `<img>` markup for processed and fallback images (Maud) |
//! | [`templates`] | Page discovery, permalinks, global data, Tera rendering |
//! | [`tasks`] | Pre-build tasks: the CSS minifier and its scheduler |
//! | [`passthrough`] | Static path copy into the output tree |
//! | [`config`] | `site.toml` loading, stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Content-Addressed Renditions
//!
//! A rendition's filename is derived from a hash of the source bytes and the
//! encode parameters. An unchanged image at unchanged settings maps to a file
//! that already exists, so it is never re-encoded; editing either one yields a
//! new name, which doubles as cache busting for deployed sites.
//!
//! ## Errors Stay Inside the Helper
//!
//! The helper's return type is a plain string. Any failure to read, decode or
//! encode an image is logged with the offending path and turned into a
//! reference to the original asset, so a typo in one template costs one
//! unoptimized image rather than the whole build.

pub mod cache;
pub mod config;
pub mod helper;
pub mod html;
pub mod imaging;
pub mod output;
pub mod passthrough;
pub mod processor;
pub mod site;
pub mod tasks;
pub mod templates;

#[cfg(test)]
pub(crate) mod test_helpers;

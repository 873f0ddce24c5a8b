//! `<img>` markup for processed and fallback images.
//!
//! Rendered with [maud](https://maud.lambda.xyz/), so attribute values are
//! always HTML-escaped.

use crate::processor::ImageStats;
use maud::{Markup, html};

/// Attributes for a generated `<img>` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttributes {
    pub alt: String,
    pub loading: String,
    pub decoding: String,
    pub class: Option<String>,
    /// Only emitted alongside a `srcset`.
    pub sizes: Option<String>,
}

impl ImageAttributes {
    /// `alt` plus lazy loading and async decoding.
    pub fn lazy(alt: &str) -> Self {
        Self {
            alt: alt.to_string(),
            loading: "lazy".to_string(),
            decoding: "async".to_string(),
            class: None,
            sizes: None,
        }
    }

    pub fn with_class(mut self, class: &str) -> Self {
        if !class.is_empty() {
            self.class = Some(class.to_string());
        }
        self
    }

    pub fn with_sizes(mut self, sizes: Option<&str>) -> Self {
        self.sizes = sizes.map(str::to_string);
        self
    }
}

/// Default `sizes` when several widths are emitted and none was given.
pub const DEFAULT_SIZES: &str = "100vw";

/// Render a complete `<img>` for processed renditions.
///
/// `src`, `width` and `height` come from the largest rendition. With more
/// than one rendition the tag also carries `srcset` and `sizes`.
/// Returns `None` when `stats` holds no renditions.
pub fn generate_html(stats: &ImageStats, attrs: &ImageAttributes) -> Option<Markup> {
    let largest = stats.largest()?;
    let srcset = stats.srcset();
    let sizes = srcset
        .as_ref()
        .map(|_| attrs.sizes.as_deref().unwrap_or(DEFAULT_SIZES));

    Some(html! {
        img alt=(attrs.alt)
            loading=(attrs.loading)
            decoding=(attrs.decoding)
            class=[attrs.class.as_deref()]
            src=(largest.url)
            width=(largest.width)
            height=(largest.height)
            srcset=[srcset]
            sizes=[sizes];
    })
}

/// Minimal `<img>` pointing at the unprocessed source.
pub fn fallback_html(src: &str, alt: &str, class: Option<&str>) -> Markup {
    html! {
        img src=(src) alt=(alt) class=[class];
    }
}

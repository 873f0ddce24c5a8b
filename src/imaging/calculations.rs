//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// A single rendition width to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSize {
    /// Output width.
    pub width: u32,
    /// Output height, scaled to preserve the source aspect ratio.
    pub height: u32,
}

/// Decide which widths to generate and their dimensions.
///
/// Widths larger than the original are dropped, duplicates collapse, and the
/// result is sorted ascending. An empty request, or one where every width
/// exceeds the original, yields the original size as the only entry.
///
/// # Examples
/// ```
/// # use sitekit::imaging::plan_sizes;
/// let sizes = plan_sizes((1200, 800), &[600, 2400]);
/// assert_eq!(sizes.len(), 1);
/// assert_eq!((sizes[0].width, sizes[0].height), (600, 400));
/// ```
pub fn plan_sizes(original: (u32, u32), widths: &[u32]) -> Vec<PlannedSize> {
    let (orig_w, orig_h) = original;

    let mut targets: Vec<u32> = widths
        .iter()
        .copied()
        .filter(|&w| w > 0 && w <= orig_w)
        .collect();
    targets.sort_unstable();
    targets.dedup();

    if targets.is_empty() {
        return vec![PlannedSize {
            width: orig_w,
            height: orig_h,
        }];
    }

    targets
        .into_iter()
        .map(|width| PlannedSize {
            width,
            height: scaled_height(original, width),
        })
        .collect()
}

/// Height for `width` that preserves the aspect ratio of `original`.
///
/// Never returns zero, so extremely wide images still produce a 1px strip.
fn scaled_height(original: (u32, u32), width: u32) -> u32 {
    let (orig_w, orig_h) = original;
    if width == orig_w {
        return orig_h;
    }
    let ratio = width as f64 / orig_w as f64;
    ((orig_h as f64 * ratio).round() as u32).max(1)
}

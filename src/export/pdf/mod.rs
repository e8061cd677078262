/// PDF report rendering
///
/// Two layouts share one page furniture: the letterhead in the top-left
/// corner, the project title centered, and a "Generated on:" stamp on the
/// right. The table itself is laid out by [`table`], page by page.
pub mod document;
pub mod note_report;
pub mod table;
pub mod text;
pub mod wide_report;

use chrono::{Local, NaiveDateTime};
use std::collections::HashMap;

use document::{Align, Canvas, Document, ImageRef, Rgb};
use text::{Font, Fonts};

use crate::import::bundle::{ImageBundle, ResolvedImage};

/// Snapshots are downscaled to at most this many pixels per side
const EMBED_MAX_PX: u32 = 600;

/// Page furniture shared by every page of a report
#[derive(Debug, Clone)]
pub struct Decorations {
    pub title: String,
    /// Encoded letterhead image, if one is configured and readable
    pub letterhead: Option<Vec<u8>>,
    pub generated_at: NaiveDateTime,
    pub fonts: Fonts,
}

impl Decorations {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            letterhead: None,
            generated_at: Local::now().naive_local(),
            fonts: Fonts::builtin(),
        }
    }

    pub fn with_letterhead(mut self, data: Option<Vec<u8>>) -> Self {
        self.letterhead = data;
        self
    }

    pub fn with_fonts(mut self, fonts: Fonts) -> Self {
        self.fonts = fonts;
        self
    }
}

/// Where each piece of furniture goes on a given layout
#[derive(Debug, Clone, Copy)]
pub(crate) struct MastheadLayout {
    pub left: f32,
    pub right: f32,
    /// Top edge of the letterhead
    pub letterhead_top: f32,
    pub letterhead_height: f32,
    pub title_baseline: f32,
    pub title_size: f32,
    pub stamp_baseline: f32,
    pub stamp_size: f32,
    pub stamp_format: &'static str,
}

/// Page furniture with the letterhead already embedded
pub(crate) struct Masthead {
    layout: MastheadLayout,
    title: String,
    stamp: String,
    letterhead: Option<ImageRef>,
}

impl Masthead {
    pub fn new(doc: &mut Document, decorations: &Decorations, layout: MastheadLayout) -> Self {
        let letterhead = decorations.letterhead.as_deref().and_then(|data| {
            doc.embed_image(data, EMBED_MAX_PX)
                .map_err(|e| tracing::warn!(error = %e, "letterhead could not be embedded"))
                .ok()
        });

        Self {
            layout,
            title: decorations.title.clone(),
            stamp: format!(
                "Generated on: {}",
                decorations.generated_at.format(layout.stamp_format)
            ),
            letterhead,
        }
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        let l = &self.layout;
        if let Some(logo) = &self.letterhead {
            let h = l.letterhead_height;
            let w = h * logo.aspect();
            canvas.image(logo, l.left, l.letterhead_top - h, w, h);
        }

        let center = (l.left + l.right) / 2.0;
        canvas.text(center, l.title_baseline, Font::Bold, l.title_size, Rgb::BLACK, Align::Center, &self.title);
        canvas.text(l.right, l.stamp_baseline, Font::Regular, l.stamp_size, Rgb::BLACK, Align::Right, &self.stamp);
    }
}

/// Embeds each bundle image at most once per document
pub(crate) struct ImageCache<'a> {
    bundle: &'a ImageBundle,
    embedded: HashMap<String, Option<ImageRef>>,
}

impl<'a> ImageCache<'a> {
    pub fn new(bundle: &'a ImageBundle) -> Self {
        Self {
            bundle,
            embedded: HashMap::new(),
        }
    }

    /// Embedded image for a record's reference; None renders as "not found"
    ///
    /// Images that fail to decode are treated like missing ones.
    pub fn get(&mut self, doc: &mut Document, name: Option<&str>) -> Option<ImageRef> {
        let name = name?;
        if let Some(cached) = self.embedded.get(name) {
            return cached.clone();
        }

        let embedded = match self.bundle.resolve(Some(name)) {
            ResolvedImage::Found(data) => match doc.embed_image(data, EMBED_MAX_PX) {
                Ok(image) => Some(image),
                Err(e) => {
                    tracing::warn!(image = name, error = %e, "image could not be embedded");
                    None
                }
            },
            ResolvedImage::NotFound => {
                tracing::debug!(image = name, "image not in bundle");
                None
            }
        };
        self.embedded.insert(name.to_string(), embedded.clone());
        embedded
    }
}

#[cfg(test)]
mod tests {
    use super::document::{test_support::png_bytes, PageSize};
    use super::*;

    #[test]
    fn test_image_cache_embeds_once() {
        let mut bundle = ImageBundle::new();
        bundle.insert("a.png", png_bytes(20, 10));
        bundle.insert("broken.png", b"nope".to_vec());

        let mut doc = Document::new(PageSize::A4_PORTRAIT);
        let mut cache = ImageCache::new(&bundle);
        let first = cache.get(&mut doc, Some("a.png")).unwrap();
        let second = cache.get(&mut doc, Some("a.png")).unwrap();
        assert_eq!(first, second);
        assert!(cache.get(&mut doc, Some("broken.png")).is_none());
        assert!(cache.get(&mut doc, Some("missing.png")).is_none());
        assert!(cache.get(&mut doc, None).is_none());
    }

    #[test]
    fn test_unreadable_letterhead_is_skipped() {
        let mut doc = Document::new(PageSize::A4_PORTRAIT);
        let decorations = Decorations::new("Tower B").with_letterhead(Some(b"junk".to_vec()));
        let masthead = Masthead::new(&mut doc, &decorations, note_report::MASTHEAD);
        assert!(masthead.letterhead.is_none());
        assert!(masthead.stamp.starts_with("Generated on: "));
    }
}

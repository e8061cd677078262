/// Minimal PDF document builder over pdf-writer
///
/// Pages are drawn on a [`Canvas`] and appended in order. Fonts are the
/// builtin Helvetica faces unless TrueType programs were supplied, which
/// are embedded as Identity-H Type 0 fonts. Images are re-encoded as
/// baseline JPEG so every embedded image uses the same DCT filter
/// regardless of the uploaded format.
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageFormat};
use pdf_writer::types::{CidFontType, FontFlags, SystemInfo, UnicodeCmap};
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str};
use std::io::Cursor;

use super::text::{Font, Fonts, TrueType};
use crate::error::Result;

/// Page size in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const A4_PORTRAIT: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };

    pub const A3_LANDSCAPE: PageSize = PageSize {
        width: 1190.55,
        height: 841.89,
    };
}

/// RGB color, components in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
    pub const WHITE_SMOKE: Rgb = Rgb(0.96, 0.96, 0.96);
    pub const PURPLE: Rgb = Rgb(0.5, 0.0, 0.5);

    /// From a 0xRRGGBB literal
    pub fn hex(value: u32) -> Rgb {
        Rgb(
            ((value >> 16) & 0xFF) as f32 / 255.0,
            ((value >> 8) & 0xFF) as f32 / 255.0,
            (value & 0xFF) as f32 / 255.0,
        )
    }
}

/// Horizontal text alignment relative to the given x
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// An image object already written to the document
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    name: String,
    id: Ref,
    /// Pixel size, used for aspect ratio
    pub width: u32,
    pub height: u32,
}

impl ImageRef {
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Largest size with this aspect ratio inside `max_w` x `max_h`
    pub fn fit(&self, max_w: f32, max_h: f32) -> (f32, f32) {
        let aspect = self.aspect();
        if max_w / aspect <= max_h {
            (max_w, max_w / aspect)
        } else {
            (max_h * aspect, max_h)
        }
    }
}

const IDENTITY: SystemInfo = SystemInfo {
    registry: Str(b"Adobe"),
    ordering: Str(b"Identity"),
    supplement: 0,
};

fn font_name(font: Font) -> Name<'static> {
    match font {
        Font::Regular => Name(b"F1"),
        Font::Bold => Name(b"F2"),
    }
}

/// Drawing surface for one page (origin bottom-left, units in points)
pub struct Canvas {
    content: Content,
    fonts: Fonts,
    images: Vec<ImageRef>,
}

impl Canvas {
    pub fn new(fonts: Fonts) -> Self {
        Self {
            content: Content::new(),
            fonts,
            images: Vec::new(),
        }
    }

    /// Draw one line of text with its baseline at `y`
    pub fn text(&mut self, x: f32, y: f32, font: Font, size: f32, color: Rgb, align: Align, value: &str) {
        let x = match align {
            Align::Left => x,
            Align::Center => x - self.fonts.width(value, font, size) / 2.0,
            Align::Right => x - self.fonts.width(value, font, size),
        };
        let encoded = self.fonts.encode(value, font);
        self.content.set_fill_rgb(color.0, color.1, color.2);
        self.content.begin_text();
        self.content.set_font(font_name(font), size);
        self.content.next_line(x, y);
        self.content.show(Str(&encoded));
        self.content.end_text();
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        self.content.set_fill_rgb(color.0, color.1, color.2);
        self.content.rect(x, y, w, h);
        self.content.fill_nonzero();
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb, line_width: f32) {
        self.content.set_stroke_rgb(color.0, color.1, color.2);
        self.content.set_line_width(line_width);
        self.content.rect(x, y, w, h);
        self.content.stroke();
    }

    /// Draw an image stretched to `w` x `h` with its lower-left corner at (x, y)
    pub fn image(&mut self, image: &ImageRef, x: f32, y: f32, w: f32, h: f32) {
        self.content.save_state();
        self.content.transform([w, 0.0, 0.0, h, x, y]);
        self.content.x_object(Name(image.name.as_bytes()));
        self.content.restore_state();
        if !self.images.iter().any(|i| i.id == image.id) {
            self.images.push(image.clone());
        }
    }

    /// Restrict drawing to a rectangle until the matching [`Canvas::restore`]
    pub fn clip(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.content.save_state();
        self.content.rect(x, y, w, h);
        self.content.clip_nonzero();
        self.content.end_path();
    }

    pub fn restore(&mut self) {
        self.content.restore_state();
    }
}

/// Accumulates pages and writes the finished file
pub struct Document {
    pdf: Pdf,
    size: PageSize,
    fonts: Fonts,
    next_id: i32,
    catalog_id: Ref,
    page_tree_id: Ref,
    regular_id: Ref,
    bold_id: Ref,
    pages: Vec<Ref>,
}

impl Document {
    pub fn new(size: PageSize) -> Self {
        let mut doc = Self {
            pdf: Pdf::new(),
            size,
            fonts: Fonts::builtin(),
            next_id: 1,
            catalog_id: Ref::new(1),
            page_tree_id: Ref::new(1),
            regular_id: Ref::new(1),
            bold_id: Ref::new(1),
            pages: Vec::new(),
        };
        doc.catalog_id = doc.alloc();
        doc.page_tree_id = doc.alloc();
        doc.regular_id = doc.alloc();
        doc.bold_id = doc.alloc();
        doc
    }

    /// Set the text in `fonts`; call before drawing any page
    pub fn with_fonts(mut self, fonts: Fonts) -> Self {
        if fonts.shares_face() {
            self.bold_id = self.regular_id;
        }
        self.fonts = fonts;
        self
    }

    pub fn fonts(&self) -> &Fonts {
        &self.fonts
    }

    /// A blank page surface using this document's fonts
    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.fonts.clone())
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn alloc(&mut self) -> Ref {
        let id = Ref::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Decode, downscale and embed an image
    ///
    /// Images larger than `max_px` on either side are resized first;
    /// anything with an alpha channel is flattened to RGB.
    pub fn embed_image(&mut self, data: &[u8], max_px: u32) -> Result<ImageRef> {
        let mut img = image::load_from_memory(data)?;
        let (w, h) = img.dimensions();
        if w > max_px || h > max_px {
            img = img.resize(max_px, max_px, FilterType::Lanczos3);
        }

        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let (width, height) = rgb.dimensions();
        let mut jpeg = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)?;

        let id = self.alloc();
        let mut xobject = self.pdf.image_xobject(id, &jpeg);
        xobject.filter(Filter::DctDecode);
        xobject.width(width as i32);
        xobject.height(height as i32);
        xobject.color_space().device_rgb();
        xobject.bits_per_component(8);
        xobject.finish();

        Ok(ImageRef {
            name: format!("Im{}", id.get()),
            id,
            width,
            height,
        })
    }

    /// Append a finished page
    pub fn add_page(&mut self, canvas: Canvas) {
        let page_id = self.alloc();
        let content_id = self.alloc();
        self.pdf.stream(content_id, &canvas.content.finish());

        let mut page = self.pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, self.size.width, self.size.height));
        page.parent(self.page_tree_id);
        page.contents(content_id);

        let mut resources = page.resources();
        resources
            .fonts()
            .pair(font_name(Font::Regular), self.regular_id)
            .pair(font_name(Font::Bold), self.bold_id);
        if !canvas.images.is_empty() {
            let mut x_objects = resources.x_objects();
            for image in &canvas.images {
                x_objects.pair(Name(image.name.as_bytes()), image.id);
            }
        }
        resources.finish();
        page.finish();

        self.pages.push(page_id);
    }

    /// Write the catalog, page tree and fonts; return the file bytes
    pub fn finish(mut self) -> Vec<u8> {
        self.pdf.catalog(self.catalog_id).pages(self.page_tree_id);
        self.pdf
            .pages(self.page_tree_id)
            .kids(self.pages.iter().copied())
            .count(self.pages.len() as i32);

        let fonts = self.fonts.clone();
        if fonts.is_embedded() {
            let mut faces = vec![(Font::Regular, self.regular_id)];
            if self.bold_id != self.regular_id {
                faces.push((Font::Bold, self.bold_id));
            }
            for (font, id) in faces {
                if let Some(face) = fonts.face(font) {
                    self.write_true_type(id, face);
                }
            }
        } else {
            for (id, base) in [(self.regular_id, "Helvetica"), (self.bold_id, "Helvetica-Bold")] {
                self.pdf
                    .type1_font(id)
                    .base_font(Name(base.as_bytes()))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
            }
        }

        self.pdf.finish()
    }

    /// Type 0 font over a whole embedded TrueType program
    ///
    /// Character codes are glyph ids (Identity-H with an identity CID to
    /// GID map); the ToUnicode map keeps the text extractable.
    fn write_true_type(&mut self, id: Ref, face: &TrueType) {
        let cid_id = self.alloc();
        let descriptor_id = self.alloc();
        let cmap_id = self.alloc();
        let file_id = self.alloc();
        let name = Name(face.postscript_name().as_bytes());

        self.pdf
            .type0_font(id)
            .base_font(name)
            .encoding_predefined(Name(b"Identity-H"))
            .descendant_font(cid_id)
            .to_unicode(cmap_id);

        let mut cid = self.pdf.cid_font(cid_id);
        cid.subtype(CidFontType::Type2)
            .base_font(name)
            .system_info(IDENTITY)
            .font_descriptor(descriptor_id)
            .default_width(0.0)
            .cid_to_gid_map_predefined(Name(b"Identity"));
        cid.widths().consecutive(0, face.advances().iter().map(|&w| f32::from(w)));
        cid.finish();

        let metrics = face.metrics();
        let [x_min, y_min, x_max, y_max] = metrics.bbox;
        self.pdf
            .font_descriptor(descriptor_id)
            .name(name)
            .flags(FontFlags::SYMBOLIC)
            .bbox(Rect::new(x_min, y_min, x_max, y_max))
            .italic_angle(0.0)
            .ascent(metrics.ascent)
            .descent(metrics.descent)
            .cap_height(metrics.cap_height)
            .stem_v(80.0)
            .font_file2(file_id);

        let mut cmap = UnicodeCmap::new(Name(b"Custom"), IDENTITY);
        for (glyph, c) in face.to_unicode() {
            cmap.pair(glyph, c);
        }
        self.pdf.cmap(cmap_id, &cmap.finish());

        self.pdf
            .stream(file_id, face.data())
            .pair(Name(b"Length1"), face.data().len() as i32);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    /// A small encoded image for embedding tests
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 128]));
        let mut data = Vec::new();
        img.write_to(&mut Cursor::new(&mut data), ImageFormat::Png).unwrap();
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::export::pdf::text::test_support::font_bytes;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_empty_document_is_pdf() {
        let mut doc = Document::new(PageSize::A4_PORTRAIT);
        doc.add_page(doc.canvas());
        let bytes = doc.finish();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(contains(&bytes, b"/Helvetica-Bold"));
    }

    #[test]
    fn test_embedded_font_is_written_once_per_face() {
        let fonts = Fonts::embedded(font_bytes(), None).unwrap();
        let mut doc = Document::new(PageSize::A4_PORTRAIT).with_fonts(fonts);
        let mut canvas = doc.canvas();
        canvas.text(10.0, 10.0, Font::Bold, 12.0, Rgb::BLACK, Align::Left, "ท่อ");
        doc.add_page(canvas);
        let bytes = doc.finish();

        assert!(contains(&bytes, b"/Identity-H"));
        assert!(contains(&bytes, b"/FontFile2"));
        assert!(contains(&bytes, b"/ToUnicode"));
        assert!(!contains(&bytes, b"/Helvetica"));
        assert_eq!(bytes.windows(10).filter(|w| w == b"/FontFile2").count(), 1);
    }

    #[test]
    fn test_embed_downscales_and_keeps_aspect() {
        let mut doc = Document::new(PageSize::A4_PORTRAIT);
        let image = doc.embed_image(&test_support::png_bytes(400, 200), 100).unwrap();
        assert_eq!((image.width, image.height), (100, 50));
        assert_eq!(image.fit(50.0, 50.0), (50.0, 25.0));
        assert_eq!(image.fit(200.0, 50.0), (100.0, 50.0));

        let mut canvas = doc.canvas();
        canvas.image(&image, 10.0, 10.0, 50.0, 25.0);
        canvas.image(&image, 70.0, 10.0, 50.0, 25.0);
        assert_eq!(canvas.images.len(), 1);
        doc.add_page(canvas);
        assert!(doc.finish().starts_with(b"%PDF"));
    }

    #[test]
    fn test_garbage_image_is_error() {
        let mut doc = Document::new(PageSize::A3_LANDSCAPE);
        assert!(matches!(doc.embed_image(b"not an image", 100), Err(Error::Image(_))));
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(Rgb::hex(0xFFFFFF), Rgb(1.0, 1.0, 1.0));
        assert_eq!(Rgb::hex(0x000000), Rgb::BLACK);
    }
}

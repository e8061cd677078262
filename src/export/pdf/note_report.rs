/// Clash note report (A4 portrait)
///
/// One row per record: sequence number, snapshot, a label/value details
/// block and the reviewer's notes.
use super::document::{Align, Document, PageSize, Rgb};
use super::table::{self, Cell, Frame, Span, TableStyle};
use super::{Decorations, ImageCache, Masthead, MastheadLayout};
use crate::import::bundle::ImageBundle;
use crate::state::data::{status_label, Record, DATE_FORMAT};

const PAGE: PageSize = PageSize::A4_PORTRAIT;

/// Top and bottom margins as a share of the page height
const MARGIN_RATIO: f32 = 0.1;

/// Column shares of the page width: No., Image, Details, Note
const COLUMN_RATIOS: [f32; 4] = [0.05, 0.30, 0.30, 0.30];

const HEADER: [&str; 4] = ["No.", "Image", "Details", "Note"];

/// 2.4 inches
const IMAGE_HEIGHT: f32 = 2.4 * 72.0;

const TABLE_LEFT: f32 = PAGE.width * (1.0 - 0.95) / 2.0;

pub(crate) const MASTHEAD: MastheadLayout = MastheadLayout {
    left: TABLE_LEFT,
    right: PAGE.width - TABLE_LEFT,
    letterhead_top: PAGE.height - 18.0,
    letterhead_height: 18.0,
    title_baseline: PAGE.height - 72.0,
    title_size: 26.0,
    stamp_baseline: PAGE.height - 30.0,
    stamp_size: 10.0,
    stamp_format: "%Y/%m/%d",
};

fn style() -> TableStyle {
    TableStyle {
        header_fill: Rgb::hex(0xF0CEFF),
        header_text: Rgb::hex(0x2B2B2B),
        body_fill: Some(Rgb::hex(0xF5F5F5)),
        body_text: Rgb::BLACK,
        grid: Rgb::hex(0x2B2B2B),
        grid_width: 1.0,
        header_size: 11.0,
        body_size: 9.0,
        padding: 4.0,
    }
}

fn frame() -> Frame {
    Frame {
        left: TABLE_LEFT,
        top: PAGE.height * (1.0 - MARGIN_RATIO),
        bottom: PAGE.height * MARGIN_RATIO,
        widths: COLUMN_RATIOS.iter().map(|r| r * PAGE.width).collect(),
    }
}

fn details(record: &Record) -> Vec<Span> {
    let fields = [
        ("Clash ID", record.clash_id.clone()),
        ("Date Found", record.date_found.format(DATE_FORMAT).to_string()),
        ("Main Zone", record.main_zone.clone()),
        ("Sub Zone", record.sub_zone.clone()),
        ("Level", record.level.clone()),
        ("Description", record.description.clone()),
        ("Discipline", record.discipline.clone()),
        ("Issue Type", record.issue_type.clone()),
        ("Issue Status", status_label(record.status).to_string()),
        ("Due Date", record.due_date.format(DATE_FORMAT).to_string()),
    ];

    fields
        .into_iter()
        .flat_map(|(label, value)| [Span::bold(format!("{}:", label)), Span::regular(value)])
        .collect()
}

/// Render the note report for `records`
pub fn render(records: &[Record], images: &ImageBundle, decorations: &Decorations) -> Vec<u8> {
    let mut doc = Document::new(PAGE).with_fonts(decorations.fonts.clone());
    let masthead = Masthead::new(&mut doc, decorations, MASTHEAD);
    let mut cache = ImageCache::new(images);

    let rows: Vec<Vec<Cell>> = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            vec![
                Cell::centered((i + 1).to_string()),
                Cell::Image {
                    image: cache.get(&mut doc, record.image.as_deref()),
                    max_height: IMAGE_HEIGHT,
                },
                Cell::spans(details(record)),
                Cell::Text {
                    spans: vec![Span::regular(record.notes.clone())],
                    align: Align::Left,
                },
            ]
        })
        .collect();

    table::render(&mut doc, &frame(), &style(), &HEADER, &rows, |canvas| masthead.draw(canvas));
    tracing::info!(records = records.len(), pages = doc.page_count(), "rendered note report");
    doc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::pdf::document::test_support::png_bytes;
    use crate::export::pdf::text::test_support::font_bytes;
    use crate::export::pdf::text::Fonts;
    use crate::state::data::fixtures::record;
    use crate::state::data::Status;

    fn decorations() -> Decorations {
        Decorations::new("Tower B").with_letterhead(Some(png_bytes(40, 10)))
    }

    #[test]
    fn test_empty_report() {
        let pdf = render(&[], &ImageBundle::new(), &decorations());
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn test_missing_image_and_blank_notes() {
        let mut records = vec![record("C001", Some(Status::New)), record("C002", None)];
        records[0].notes = String::new();
        records[1].notes = "first\nsecond".to_string();
        records[1].image = None;

        let mut images = ImageBundle::new();
        images.insert("c001.jpg", png_bytes(64, 48));

        let pdf = render(&records, &images, &decorations());
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn test_many_records_span_pages() {
        let records: Vec<Record> = (0..12).map(|i| record(&format!("C{:03}", i), None)).collect();
        let mut images = ImageBundle::new();
        images.insert("c000.jpg", png_bytes(64, 64));

        let one = render(&records[..1], &images, &decorations());
        let many = render(&records, &images, &decorations());
        assert!(many.starts_with(b"%PDF"));
        assert!(many.len() > one.len());
    }

    #[test]
    fn test_thai_note_is_kept_with_embedded_font() {
        let mut records = vec![record("C001", None)];
        records[0].notes = "ท่อ".to_string();
        records[0].description = "กก".to_string();

        let builtin = render(&records, &ImageBundle::new(), &decorations());
        assert!(builtin.windows(5).any(|w| w == b"(???)"));

        let fonts = Fonts::embedded(font_bytes(), None).unwrap();
        let pdf = render(&records, &ImageBundle::new(), &decorations().with_fonts(fonts));
        assert!(pdf.starts_with(b"%PDF"));
        assert!(!pdf.windows(5).any(|w| w == b"(???)"));
        assert!(pdf.windows(11).any(|w| w == b"/Identity-H"));

        // Glyph ids for ท, mark, อ in the text-showing operator
        let text = String::from_utf8_lossy(&pdf).to_lowercase();
        let literal = String::from_utf8_lossy(&[0, 4, 0, 6, 0, 5]).to_lowercase();
        assert!(
            text.contains("<000400060005>")
                || text.contains(&format!("({})", literal))
                || text.contains(r"(\000\004\000\006\000\005)")
        );
        // and mapped back to the Thai code points for extraction
        assert!(text.contains("0e17"));
        assert!(text.contains("0e48"));
    }

    #[test]
    fn test_details_block_order() {
        let spans = details(&record("C001", Some(Status::Resolved)));
        assert_eq!(spans.len(), 20);
        assert_eq!(spans[0], Span::bold("Clash ID:"));
        assert_eq!(spans[1], Span::regular("C001"));
        assert_eq!(spans[17], Span::regular("Resolved"));
        assert_eq!(spans[19], Span::regular("2024-02-01"));
    }

    #[test]
    fn test_columns_fit_page() {
        let frame = frame();
        assert!(frame.left + frame.width() <= PAGE.width);
        assert!((frame.height() - PAGE.height * 0.8).abs() < 1e-3);
    }
}

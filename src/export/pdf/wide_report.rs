/// Wide clash report (A3 landscape)
///
/// The parsed columns laid out side by side, one record per row, with the
/// snapshot in the second column.
use super::document::{Document, PageSize, Rgb};
use super::table::{self, Cell, Frame, TableStyle};
use super::{Decorations, ImageCache, Masthead, MastheadLayout};
use crate::import::bundle::ImageBundle;
use crate::state::data::{Column, Record};

const PAGE: PageSize = PageSize::A3_LANDSCAPE;

/// 0.7 inch
const MARGIN: f32 = 50.4;

/// Room above the table for the letterhead, title and stamp
const TOP_MARGIN: f32 = 100.0;

const COLUMNS: [Column; 11] = [
    Column::ClashId,
    Column::Image,
    Column::ViewName,
    Column::DateFound,
    Column::MainZone,
    Column::SubZone,
    Column::Level,
    Column::IssuesType,
    Column::IssuesStatus,
    Column::Description,
    Column::Discipline,
];

const WIDTHS: [f32; 11] = [100.0, 170.0, 80.0, 80.0, 80.0, 80.0, 80.0, 80.0, 80.0, 90.0, 80.0];

const IMAGE_SIZE: f32 = 150.0;

const TABLE_WIDTH: f32 = 1000.0;

const TABLE_LEFT: f32 = (PAGE.width - TABLE_WIDTH) / 2.0;

const MASTHEAD: MastheadLayout = MastheadLayout {
    left: MARGIN,
    right: PAGE.width - MARGIN,
    letterhead_top: PAGE.height - 20.0,
    letterhead_height: 24.0,
    title_baseline: PAGE.height - 58.0,
    title_size: 26.0,
    stamp_baseline: PAGE.height - 82.0,
    stamp_size: 10.0,
    stamp_format: "%Y/%m/%d %H:%M:%S",
};

fn style() -> TableStyle {
    TableStyle {
        header_fill: Rgb::PURPLE,
        header_text: Rgb::WHITE_SMOKE,
        body_fill: None,
        body_text: Rgb::BLACK,
        grid: Rgb::BLACK,
        grid_width: 0.75,
        header_size: 10.0,
        body_size: 9.0,
        padding: 5.0,
    }
}

fn frame() -> Frame {
    Frame {
        left: TABLE_LEFT,
        top: PAGE.height - TOP_MARGIN,
        bottom: MARGIN,
        widths: WIDTHS.to_vec(),
    }
}

/// Render the wide report for `records`
pub fn render(records: &[Record], images: &ImageBundle, decorations: &Decorations) -> Vec<u8> {
    let mut doc = Document::new(PAGE).with_fonts(decorations.fonts.clone());
    let masthead = Masthead::new(&mut doc, decorations, MASTHEAD);
    let mut cache = ImageCache::new(images);

    let rows: Vec<Vec<Cell>> = records
        .iter()
        .map(|record| {
            COLUMNS
                .iter()
                .map(|&column| match column {
                    Column::Image => Cell::Image {
                        image: cache.get(&mut doc, record.image.as_deref()),
                        max_height: IMAGE_SIZE,
                    },
                    other => Cell::text(record.value(other)),
                })
                .collect()
        })
        .collect();

    let header: Vec<&str> = COLUMNS.iter().map(|c| c.name()).collect();
    table::render(&mut doc, &frame(), &style(), &header, &rows, |canvas| masthead.draw(canvas));
    tracing::info!(records = records.len(), pages = doc.page_count(), "rendered wide report");
    doc.finish()
}

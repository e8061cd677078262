/// Paged table layout
///
/// Lays out rows top to bottom inside a frame, starting a new page (with
/// the header row repeated) whenever the next row does not fit. A row
/// taller than an entire frame is clipped to the frame rather than
/// pushed forward forever.
use super::document::{Align, Canvas, Document, ImageRef, Rgb};
use super::text::{Font, Fonts, LEADING};
use crate::import::bundle::ResolvedImage;

/// A run of text in one font, wrapped to the cell width
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub font: Font,
}

impl Span {
    pub fn regular(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: Font::Regular,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: Font::Bold,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text { spans: Vec<Span>, align: Align },
    /// Aspect-fit into the cell width and `max_height`; None draws the
    /// not-found text instead
    Image {
        image: Option<ImageRef>,
        max_height: f32,
    },
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text {
            spans: vec![Span::regular(value)],
            align: Align::Left,
        }
    }

    pub fn centered(value: impl Into<String>) -> Self {
        Cell::Text {
            spans: vec![Span::regular(value)],
            align: Align::Center,
        }
    }

    pub fn spans(spans: Vec<Span>) -> Self {
        Cell::Text {
            spans,
            align: Align::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableStyle {
    pub header_fill: Rgb,
    pub header_text: Rgb,
    pub body_fill: Option<Rgb>,
    pub body_text: Rgb,
    pub grid: Rgb,
    pub grid_width: f32,
    pub header_size: f32,
    pub body_size: f32,
    pub padding: f32,
}

/// Where the table goes on each page
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub top: f32,
    pub bottom: f32,
    pub widths: Vec<f32>,
}

impl Frame {
    pub fn width(&self) -> f32 {
        self.widths.iter().sum()
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }
}

/// Text settings for drawing one row
#[derive(Debug, Clone, Copy, PartialEq)]
struct RowStyle {
    size: f32,
    padding: f32,
    color: Rgb,
}

/// One cell after wrapping, ready to draw
enum Laid {
    Lines(Vec<(Font, String)>, Align),
    Image(ImageRef, f32, f32),
}

struct LaidRow {
    cells: Vec<Laid>,
    height: f32,
}

fn lay_out(fonts: &Fonts, cells: &[Cell], widths: &[f32], size: f32, padding: f32) -> LaidRow {
    let mut laid = Vec::with_capacity(cells.len());
    let mut content_height: f32 = size * LEADING;

    for (cell, &width) in cells.iter().zip(widths) {
        let inner = (width - 2.0 * padding).max(1.0);
        let (cell_laid, height) = match cell {
            Cell::Text { spans, align } => {
                let lines: Vec<(Font, String)> = spans
                    .iter()
                    .flat_map(|span| {
                        fonts
                            .wrap(&span.text, span.font, size, inner)
                            .into_iter()
                            .map(move |line| (span.font, line))
                    })
                    .collect();
                let height = lines.len() as f32 * size * LEADING;
                (Laid::Lines(lines, *align), height)
            }
            Cell::Image {
                image: Some(image),
                max_height,
            } => {
                let (w, h) = image.fit(inner, *max_height);
                (Laid::Image(image.clone(), w, h), h)
            }
            Cell::Image { image: None, .. } => {
                let lines = fonts
                    .wrap(ResolvedImage::NOT_FOUND_TEXT, Font::Regular, size, inner)
                    .into_iter()
                    .map(|line| (Font::Regular, line))
                    .collect::<Vec<_>>();
                let height = lines.len() as f32 * size * LEADING;
                (Laid::Lines(lines, Align::Center), height)
            }
        };
        content_height = content_height.max(height);
        laid.push(cell_laid);
    }

    LaidRow {
        cells: laid,
        height: content_height + 2.0 * padding,
    }
}

fn draw_row(canvas: &mut Canvas, frame: &Frame, row: &LaidRow, top: f32, height: f32, style: RowStyle) {
    let RowStyle { size, padding, color } = style;
    let mut x = frame.left;
    for (cell, &width) in row.cells.iter().zip(&frame.widths) {
        match cell {
            Laid::Lines(lines, align) => {
                let anchor = match align {
                    Align::Left => x + padding,
                    Align::Center => x + width / 2.0,
                    Align::Right => x + width - padding,
                };
                let mut baseline = top - padding - size;
                for (font, line) in lines {
                    if baseline < top - height {
                        break;
                    }
                    canvas.text(anchor, baseline, *font, size, color, *align, line);
                    baseline -= size * LEADING;
                }
            }
            Laid::Image(image, w, h) => {
                let left = x + (width - w) / 2.0;
                canvas.image(image, left, top - padding - h, *w, *h);
            }
        }
        x += width;
    }
}

fn draw_grid(canvas: &mut Canvas, frame: &Frame, top: f32, height: f32, style: &TableStyle) {
    let mut x = frame.left;
    for &width in &frame.widths {
        canvas.stroke_rect(x, top - height, width, height, style.grid, style.grid_width);
        x += width;
    }
}

/// Draw `header` and `rows` across as many pages as needed
///
/// `decorate` runs on every new page before the table is drawn. At least
/// one page is always produced, even with no rows.
pub fn render<F>(doc: &mut Document, frame: &Frame, style: &TableStyle, header: &[&str], rows: &[Vec<Cell>], mut decorate: F)
where
    F: FnMut(&mut Canvas),
{
    let header_cells: Vec<Cell> = header
        .iter()
        .map(|h| Cell::Text {
            spans: vec![Span::bold(*h)],
            align: Align::Center,
        })
        .collect();
    let fonts = doc.fonts().clone();
    let header_row = lay_out(&fonts, &header_cells, &frame.widths, style.header_size, style.padding);
    let header_style = RowStyle {
        size: style.header_size,
        padding: style.padding,
        color: style.header_text,
    };
    let body_style = RowStyle {
        size: style.body_size,
        padding: style.padding,
        color: style.body_text,
    };

    let start_page = |decorate: &mut F| {
        let mut canvas = Canvas::new(fonts.clone());
        decorate(&mut canvas);
        let top = frame.top;
        canvas.fill_rect(frame.left, top - header_row.height, frame.width(), header_row.height, style.header_fill);
        draw_row(&mut canvas, frame, &header_row, top, header_row.height, header_style);
        draw_grid(&mut canvas, frame, top, header_row.height, style);
        (canvas, top - header_row.height)
    };

    let (mut canvas, mut y) = start_page(&mut decorate);
    let mut rows_on_page = 0;
    let body_space = frame.height() - header_row.height;

    for cells in rows {
        let row = lay_out(&fonts, cells, &frame.widths, style.body_size, style.padding);
        if rows_on_page > 0 && y - row.height < frame.bottom {
            doc.add_page(canvas);
            (canvas, y) = start_page(&mut decorate);
            rows_on_page = 0;
        }

        let clipped = row.height > body_space;
        let height = row.height.min(body_space);
        if clipped {
            tracing::warn!(height = row.height, available = body_space, "table row clipped to page");
            canvas.clip(frame.left, y - height, frame.width(), height);
        }
        if let Some(fill) = style.body_fill {
            canvas.fill_rect(frame.left, y - height, frame.width(), height, fill);
        }
        draw_row(&mut canvas, frame, &row, y, height, body_style);
        if clipped {
            canvas.restore();
        }
        draw_grid(&mut canvas, frame, y, height, style);

        y -= height;
        rows_on_page += 1;
    }

    doc.add_page(canvas);
}

/// Text measurement and encoding for report fonts
///
/// Without a configured font, reports use the standard Type 1 Helvetica
/// pair with WinAnsi encoding and no font program is embedded. A
/// configured TrueType font is embedded whole and addressed by glyph id,
/// which is what Thai and other non-Latin text needs. Widths are in
/// thousandths of the font size either way.
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

/// The two report typefaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

/// Advance widths for ' ' through '~'
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // '0'..'?'
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 'P'..'_'
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // '`'..'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 'p'..'~'
];

/// Width used for characters outside printable ASCII
const FALLBACK_WIDTH: u16 = 556;

/// Line height as a multiple of the font size
pub const LEADING: f32 = 1.2;

fn helvetica_width(font: Font, c: char) -> u16 {
    let table = match font {
        Font::Regular => &HELVETICA,
        Font::Bold => &HELVETICA_BOLD,
    };
    match c as u32 {
        code @ 0x20..=0x7E => table[(code - 0x20) as usize],
        _ => FALLBACK_WIDTH,
    }
}

/// Encode text as WinAnsi bytes
///
/// Latin-1 passes through, the common typographic punctuation is mapped
/// into the 0x80..0x9F block, and anything else becomes '?'.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' | '\n' | '\r' => b' ',
            c if (c as u32) < 0x20 => b'?',
            c if (c as u32) <= 0x7E => c as u8,
            c if (0xA0..=0xFF).contains(&(c as u32)) => c as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            _ => b'?',
        })
        .collect()
}

/// Vertical metrics and bounding box, in thousandths of an em
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub cap_height: f32,
    pub bbox: [f32; 4],
}

/// A parsed TrueType font program ready to embed
pub struct TrueType {
    data: Vec<u8>,
    postscript_name: String,
    glyphs: HashMap<char, u16>,
    /// Advance per glyph id, in thousandths of an em
    advances: Vec<u16>,
    metrics: FontMetrics,
}

impl fmt::Debug for TrueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrueType")
            .field("postscript_name", &self.postscript_name)
            .field("glyphs", &self.glyphs.len())
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl TrueType {
    pub fn parse(data: Vec<u8>) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, 0).map_err(|e| Error::Font(e.to_string()))?;
        let scale = 1000.0 / f32::from(face.units_per_em());
        let units = |v: i16| f32::from(v) * scale;

        let mut glyphs = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables {
                if !subtable.is_unicode() {
                    continue;
                }
                subtable.codepoints(|code| {
                    if let (Some(c), Some(id)) = (char::from_u32(code), subtable.glyph_index(code)) {
                        glyphs.entry(c).or_insert(id.0);
                    }
                });
            }
        }
        if glyphs.is_empty() {
            return Err(Error::Font("font has no Unicode character map".to_string()));
        }

        let advances = (0..face.number_of_glyphs())
            .map(|id| {
                face.glyph_hor_advance(ttf_parser::GlyphId(id))
                    .map_or(0, |advance| (f32::from(advance) * scale).round() as u16)
            })
            .collect();

        let postscript_name = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .find_map(|name| name.to_string())
            .map(|name| name.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '-').collect::<String>())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "ReportFont".to_string());

        let bbox = face.global_bounding_box();
        let metrics = FontMetrics {
            ascent: units(face.ascender()),
            descent: units(face.descender()),
            cap_height: units(face.capital_height().unwrap_or_else(|| face.ascender())),
            bbox: [units(bbox.x_min), units(bbox.y_min), units(bbox.x_max), units(bbox.y_max)],
        };

        Ok(Self {
            data,
            postscript_name,
            glyphs,
            advances,
            metrics,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn postscript_name(&self) -> &str {
        &self.postscript_name
    }

    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    pub fn advances(&self) -> &[u16] {
        &self.advances
    }

    /// Glyph id for a character; .notdef (0) when the font lacks it
    fn glyph(&self, c: char) -> u16 {
        let c = if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c };
        self.glyphs.get(&c).copied().unwrap_or(0)
    }

    fn width(&self, c: char) -> u16 {
        self.advances.get(usize::from(self.glyph(c))).copied().unwrap_or(FALLBACK_WIDTH)
    }

    /// Glyph id → character, lowest character first when several share a glyph
    pub fn to_unicode(&self) -> BTreeMap<u16, char> {
        let mut map = BTreeMap::new();
        let mut chars: Vec<(&char, &u16)> = self.glyphs.iter().collect();
        chars.sort();
        for (&c, &id) in chars {
            map.entry(id).or_insert(c);
        }
        map
    }
}

/// The fonts a report is set in
///
/// Cheap to clone; the embedded programs are shared.
#[derive(Debug, Clone, Default)]
pub struct Fonts {
    embedded: Option<(Arc<TrueType>, Arc<TrueType>)>,
}

impl Fonts {
    /// Builtin Helvetica and Helvetica-Bold
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Embedded TrueType fonts; without a bold face the regular one sets both
    pub fn embedded(regular: Vec<u8>, bold: Option<Vec<u8>>) -> Result<Self> {
        let regular = Arc::new(TrueType::parse(regular)?);
        let bold = match bold {
            Some(data) => Arc::new(TrueType::parse(data)?),
            None => Arc::clone(&regular),
        };
        Ok(Self {
            embedded: Some((regular, bold)),
        })
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded.is_some()
    }

    pub fn face(&self, font: Font) -> Option<&TrueType> {
        self.embedded.as_ref().map(|(regular, bold)| match font {
            Font::Regular => regular.as_ref(),
            Font::Bold => bold.as_ref(),
        })
    }

    /// Both typefaces are the same embedded program
    pub fn shares_face(&self) -> bool {
        self.embedded
            .as_ref()
            .is_some_and(|(regular, bold)| Arc::ptr_eq(regular, bold))
    }

    /// Rendered width of `text` in points
    pub fn width(&self, text: &str, font: Font, size: f32) -> f32 {
        let units: u32 = match self.face(font) {
            Some(face) => text.chars().map(|c| u32::from(face.width(c))).sum(),
            None => text.chars().map(|c| u32::from(helvetica_width(font, c))).sum(),
        };
        units as f32 * size / 1000.0
    }

    /// Bytes for a text-showing operator in `font`
    ///
    /// Builtin fonts take WinAnsi bytes; embedded fonts take big-endian
    /// glyph ids.
    pub fn encode(&self, text: &str, font: Font) -> Vec<u8> {
        match self.face(font) {
            Some(face) => text.chars().flat_map(|c| face.glyph(c).to_be_bytes()).collect(),
            None => win_ansi(text),
        }
    }

    /// Break text into lines no wider than `max_width`
    ///
    /// Every input line is its own paragraph. Words wider than a whole line
    /// are split between characters. A blank paragraph yields an empty line.
    pub fn wrap(&self, text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.lines() {
            let mut current = String::new();
            for word in paragraph.split_whitespace() {
                let candidate = if current.is_empty() {
                    word.to_string()
                } else {
                    format!("{} {}", current, word)
                };
                if self.width(&candidate, font, size) <= max_width {
                    current = candidate;
                    continue;
                }

                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                // Hard-break words that do not fit on a line of their own
                for c in word.chars() {
                    current.push(c);
                    if self.width(&current, font, size) > max_width && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::replace(&mut current, c.to_string()));
                    }
                }
            }
            lines.push(current);
        }
        lines
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    /// Characters in the test font with their advances; glyph ids follow
    /// this order starting at 1
    pub const GLYPHS: [(char, u16); 6] = [
        (' ', 250),
        ('A', 600),
        ('ก', 500),
        ('ท', 520),
        ('อ', 480),
        ('่', 0),
    ];

    /// A tiny but well-formed TrueType file with a Unicode cmap and
    /// horizontal metrics for [`GLYPHS`] (no outlines)
    pub fn font_bytes() -> Vec<u8> {
        let num_glyphs = GLYPHS.len() as u16 + 1;

        let mut head = Vec::new();
        head.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        head.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        head.extend_from_slice(&0u32.to_be_bytes());
        head.extend_from_slice(&0x5F0F_3CF5u32.to_be_bytes());
        head.extend_from_slice(&0u16.to_be_bytes());
        head.extend_from_slice(&1000u16.to_be_bytes());
        head.extend_from_slice(&[0; 16]);
        for v in [0i16, -200, 1000, 800] {
            head.extend_from_slice(&v.to_be_bytes());
        }
        head.extend_from_slice(&[0; 10]);

        let mut hhea = Vec::new();
        hhea.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        for v in [800i16, -200, 0] {
            hhea.extend_from_slice(&v.to_be_bytes());
        }
        hhea.extend_from_slice(&600u16.to_be_bytes());
        hhea.extend_from_slice(&[0; 22]);
        hhea.extend_from_slice(&num_glyphs.to_be_bytes());

        let mut maxp = Vec::new();
        maxp.extend_from_slice(&0x0000_5000u32.to_be_bytes());
        maxp.extend_from_slice(&num_glyphs.to_be_bytes());

        let mut hmtx = Vec::new();
        for advance in std::iter::once(500).chain(GLYPHS.iter().map(|(_, a)| *a)) {
            hmtx.extend_from_slice(&advance.to_be_bytes());
            hmtx.extend_from_slice(&0i16.to_be_bytes());
        }

        // Format 12 subtable, Windows platform, full Unicode
        let mut cmap = Vec::new();
        cmap.extend_from_slice(&0u16.to_be_bytes());
        cmap.extend_from_slice(&1u16.to_be_bytes());
        cmap.extend_from_slice(&3u16.to_be_bytes());
        cmap.extend_from_slice(&10u16.to_be_bytes());
        cmap.extend_from_slice(&12u32.to_be_bytes());
        cmap.extend_from_slice(&12u16.to_be_bytes());
        cmap.extend_from_slice(&0u16.to_be_bytes());
        cmap.extend_from_slice(&(16 + 12 * GLYPHS.len() as u32).to_be_bytes());
        cmap.extend_from_slice(&0u32.to_be_bytes());
        cmap.extend_from_slice(&(GLYPHS.len() as u32).to_be_bytes());
        for (id, (c, _)) in GLYPHS.iter().enumerate() {
            let code = *c as u32;
            cmap.extend_from_slice(&code.to_be_bytes());
            cmap.extend_from_slice(&code.to_be_bytes());
            cmap.extend_from_slice(&(id as u32 + 1).to_be_bytes());
        }

        let tables: [(&[u8; 4], Vec<u8>); 5] =
            [(b"cmap", cmap), (b"head", head), (b"hhea", hhea), (b"hmtx", hmtx), (b"maxp", maxp)];

        let mut font = Vec::new();
        font.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        font.extend_from_slice(&(tables.len() as u16).to_be_bytes());
        font.extend_from_slice(&[0; 6]);
        let mut offset = 12 + 16 * tables.len();
        for (tag, data) in &tables {
            font.extend_from_slice(&tag[..]);
            font.extend_from_slice(&0u32.to_be_bytes());
            font.extend_from_slice(&(offset as u32).to_be_bytes());
            font.extend_from_slice(&(data.len() as u32).to_be_bytes());
            offset += (data.len() + 3) & !3;
        }
        for (_, data) in &tables {
            font.extend_from_slice(data);
            font.resize((font.len() + 3) & !3, 0);
        }
        font
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thai() -> Fonts {
        Fonts::embedded(test_support::font_bytes(), None).unwrap()
    }

    #[test]
    fn test_width() {
        let fonts = Fonts::builtin();
        assert_eq!(fonts.width("", Font::Regular, 10.0), 0.0);
        // 'H' 722 + 'i' 222
        assert!((fonts.width("Hi", Font::Regular, 10.0) - 9.44).abs() < 1e-4);
        assert!(fonts.width("Hi", Font::Bold, 10.0) > fonts.width("Hi", Font::Regular, 10.0));
    }

    #[test]
    fn test_encode() {
        let fonts = Fonts::builtin();
        assert_eq!(fonts.encode("Zone A", Font::Regular), b"Zone A".to_vec());
        assert_eq!(fonts.encode("café", Font::Regular), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(fonts.encode("a–b", Font::Bold), vec![b'a', 0x96, b'b']);
        assert_eq!(fonts.encode("ท่อ", Font::Regular), b"???".to_vec());
        assert_eq!(fonts.encode("a\tb", Font::Regular), b"a b".to_vec());
    }

    #[test]
    fn test_embedded_font_measures_and_encodes_thai() {
        let fonts = thai();
        assert!(fonts.is_embedded());
        assert!(fonts.shares_face());

        // ท 520 + mark 0 + อ 480
        assert!((fonts.width("ท่อ", Font::Regular, 10.0) - 10.0).abs() < 1e-4);
        assert_eq!(fonts.width("ท่อ", Font::Bold, 10.0), fonts.width("ท่อ", Font::Regular, 10.0));
        assert_eq!(fonts.encode("ท่อ", Font::Regular), vec![0, 4, 0, 6, 0, 5]);
        assert_eq!(fonts.encode("A\tZ", Font::Bold), vec![0, 2, 0, 1, 0, 0]);
        // Missing characters measure as .notdef
        assert!((fonts.width("Z", Font::Regular, 10.0) - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_embedded_font_tables() {
        let face = TrueType::parse(test_support::font_bytes()).unwrap();
        assert_eq!(face.advances(), &[500, 250, 600, 500, 520, 480, 0]);
        assert_eq!(face.postscript_name(), "ReportFont");
        assert_eq!(face.metrics().ascent, 800.0);
        assert_eq!(face.to_unicode().get(&4), Some(&'ท'));
        assert_eq!(face.to_unicode().len(), test_support::GLYPHS.len());
    }

    #[test]
    fn test_unparsable_font_is_error() {
        assert!(matches!(Fonts::embedded(b"not a font".to_vec(), None), Err(Error::Font(_))));
        assert!(matches!(
            Fonts::embedded(test_support::font_bytes(), Some(Vec::new())),
            Err(Error::Font(_))
        ));
    }

    #[test]
    fn test_wrap_words() {
        let fonts = Fonts::builtin();
        let lines = fonts.wrap("pipe clashes with beam at grid C4", Font::Regular, 10.0, 80.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(fonts.width(line, Font::Regular, 10.0) <= 80.0);
        }
        assert_eq!(lines.join(" "), "pipe clashes with beam at grid C4");
    }

    #[test]
    fn test_wrap_paragraphs_and_long_words() {
        let fonts = Fonts::builtin();
        assert_eq!(fonts.wrap("a\n\nb", Font::Regular, 10.0, 100.0), vec!["a", "", "b"]);
        assert!(fonts.wrap("", Font::Regular, 10.0, 100.0).is_empty());

        let lines = fonts.wrap("WWWWWWWWWWWW", Font::Bold, 10.0, 30.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "WWWWWWWWWWWW");
    }

    #[test]
    fn test_wrap_keeps_marks_with_their_base() {
        // 3pt per line fits one base glyph at 5pt size (ท is 2.6pt)
        let lines = thai().wrap("ท่อท่อ", Font::Regular, 5.0, 3.0);
        assert_eq!(lines, vec!["ท่", "อ", "ท่", "อ"]);
    }
}

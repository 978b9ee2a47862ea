// Font metrics and text encoding for the document backend.
//
// Two modes: the built-in Helvetica (WinAnsi-encoded, standard advance
// widths, no embedding) or a TrueType file supplied through the options,
// embedded as an Identity-H CID font so scripts outside Latin-1 render.
// Characters a font cannot represent are dropped by both the measurement
// and the encoding paths, so wrapping always agrees with what is shown.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::info;

use crate::config::ReportError;

pub enum DocumentFont {
    Builtin,
    Embedded(EmbeddedFont),
}

pub struct GlyphMetrics {
    pub gid: u16,
    /// Horizontal advance in font units.
    pub advance: u16,
}

pub struct EmbeddedFont {
    pub data: Vec<u8>,
    pub units_per_em: u16,
    pub ascent: i16,
    pub descent: i16,
    pub cap_height: i16,
    pub bbox: [i16; 4],
    pub postscript_name: String,
    pub glyphs: HashMap<char, GlyphMetrics>,
}

impl DocumentFont {
    /// Loads and indexes a TrueType font from disk. The whole Unicode cmap
    /// is flattened into a per-character table up front, so measurement does
    /// not need to reparse the face.
    pub fn load(path: &Path) -> Result<DocumentFont, ReportError> {
        let data = fs::read(path).map_err(|source| ReportError::FontLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let (units_per_em, ascent, descent, cap_height, bbox, postscript_name, glyphs) = {
            let face = ttf_parser::Face::parse(&data, 0).map_err(|_| ReportError::FontParse {
                path: path.to_path_buf(),
            })?;
            let mut glyphs: HashMap<char, GlyphMetrics> = HashMap::new();
            if let Some(cmap) = face.tables().cmap {
                for subtable in cmap.subtables {
                    if !subtable.is_unicode() {
                        continue;
                    }
                    subtable.codepoints(|cp| {
                        if let Some(c) = char::from_u32(cp) {
                            if let Some(gid) = face.glyph_index(c) {
                                let advance = face.glyph_hor_advance(gid).unwrap_or(0);
                                glyphs.entry(c).or_insert(GlyphMetrics {
                                    gid: gid.0,
                                    advance,
                                });
                            }
                        }
                    });
                }
            }
            let bbox = face.global_bounding_box();
            (
                face.units_per_em(),
                face.ascender(),
                face.descender(),
                face.capital_height().unwrap_or(face.ascender()),
                [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
                postscript_name(&face),
                glyphs,
            )
        };
        info!(
            "loaded font {:?}: {} glyphs mapped, {} units/em",
            path,
            glyphs.len(),
            units_per_em
        );
        Ok(DocumentFont::Embedded(EmbeddedFont {
            data,
            units_per_em,
            ascent,
            descent,
            cap_height,
            bbox,
            postscript_name,
            glyphs,
        }))
    }

    /// Advance width of `text` in points at `size`.
    pub fn text_width(&self, text: &str, size: f64) -> f64 {
        let em_fraction: f64 = match self {
            DocumentFont::Builtin => {
                text.chars()
                    .filter_map(helvetica_advance)
                    .map(f64::from)
                    .sum::<f64>()
                    / 1000.0
            }
            DocumentFont::Embedded(font) => {
                text.chars()
                    .filter_map(|c| font.glyphs.get(&c))
                    .map(|g| f64::from(g.advance))
                    .sum::<f64>()
                    / f64::from(font.units_per_em)
            }
        };
        em_fraction * size
    }

    /// String bytes for the content stream: WinAnsi bytes for the built-in
    /// font, big-endian glyph ids for an embedded one.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            DocumentFont::Builtin => text.chars().filter_map(winansi_byte).collect(),
            DocumentFont::Embedded(font) => {
                let mut out = Vec::with_capacity(text.len() * 2);
                for c in text.chars() {
                    if let Some(glyph) = font.glyphs.get(&c) {
                        out.extend_from_slice(&glyph.gid.to_be_bytes());
                    }
                }
                out
            }
        }
    }
}

fn postscript_name(face: &ttf_parser::Face) -> String {
    let names = face.names();
    let raw = (0..names.len())
        .filter_map(|i| names.get(i))
        .find(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME && n.is_unicode())
        .and_then(|n| n.to_string())
        .unwrap_or_default();
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_graphic() && *c != '/' && *c != '#')
        .collect();
    if cleaned.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        cleaned
    }
}

/// Standard Helvetica advance widths (thousandths of the point size) for the
/// printable ASCII range, 0x20 through 0x7E.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Helvetica advance for one character, or None when WinAnsi cannot encode
/// it (the character is then dropped from output and measurement alike).
fn helvetica_advance(c: char) -> Option<u16> {
    winansi_byte(c)?;
    let width = match c {
        ' '..='~' => HELVETICA_WIDTHS[c as usize - 0x20],
        '\u{00A0}' => 278,                                  // no-break space
        '¡' => 333,
        '¢' | '£' | '¤' | '¥' => 556,
        '¦' => 260,
        '§' => 556,
        '¨' | '¯' | '´' | '¸' => 333,
        '©' | '®' => 737,
        'ª' => 370,
        '«' | '»' => 556,
        '¬' | '±' | '×' | '÷' => 584,
        '\u{00AD}' => 333,                                  // soft hyphen
        '°' => 400,
        '²' | '³' | '¹' => 333,
        'µ' => 556,
        '¶' => 537,
        '·' => 278,
        'º' => 365,
        '¼' | '½' | '¾' => 834,
        '¿' => 611,
        'À'..='Å' => 667,
        'Æ' => 1000,
        'Ç' => 722,
        'È'..='Ë' => 667,
        'Ì'..='Ï' => 278,
        'Ð' | 'Ñ' => 722,
        'Ò'..='Ö' | 'Ø' => 778,
        'Ù'..='Ü' => 722,
        'Ý' | 'Þ' => 667,
        'ß' => 611,
        'à'..='å' => 556,
        'æ' => 889,
        'ç' => 500,
        'è'..='ë' => 556,
        'ì'..='ï' => 278,
        'ð' | 'ñ' => 556,
        'ò'..='ö' => 556,
        'ø' => 611,
        'ù'..='ü' => 556,
        'ý' | 'ÿ' => 500,
        'þ' => 556,
        '\u{2013}' => 556,                                  // en dash
        '\u{2014}' => 1000,                                 // em dash
        '\u{2018}' | '\u{2019}' | '\u{201A}' => 222,
        '\u{201C}' | '\u{201D}' | '\u{201E}' => 333,
        '\u{2020}' | '\u{2021}' => 556,
        '\u{2022}' => 350,                                  // bullet
        '\u{2026}' => 1000,                                 // ellipsis
        '\u{2030}' => 1000,
        '\u{2039}' | '\u{203A}' => 333,
        '\u{02C6}' | '\u{02DC}' => 333,
        '\u{0152}' => 1000,
        '\u{0153}' => 944,
        '\u{0160}' => 667,
        '\u{0161}' => 500,
        '\u{017D}' => 611,
        '\u{017E}' => 500,
        '\u{0178}' => 667,
        '\u{0192}' => 556,
        '\u{20AC}' => 556,                                  // euro
        '\u{2122}' => 1000,                                 // trademark
        _ => 556,
    };
    Some(width)
}

/// Maps a character to its WinAnsi (CP1252) byte, if it has one.
fn winansi_byte(c: char) -> Option<u8> {
    let cp = c as u32;
    match c {
        '\u{20}'..='\u{7E}' => Some(cp as u8),
        '\u{A0}'..='\u{FF}' => Some(cp as u8),
        '\u{20AC}' => Some(0x80),
        '\u{201A}' => Some(0x82),
        '\u{0192}' => Some(0x83),
        '\u{201E}' => Some(0x84),
        '\u{2026}' => Some(0x85),
        '\u{2020}' => Some(0x86),
        '\u{2021}' => Some(0x87),
        '\u{02C6}' => Some(0x88),
        '\u{2030}' => Some(0x89),
        '\u{0160}' => Some(0x8A),
        '\u{2039}' => Some(0x8B),
        '\u{0152}' => Some(0x8C),
        '\u{017D}' => Some(0x8E),
        '\u{2018}' => Some(0x91),
        '\u{2019}' => Some(0x92),
        '\u{201C}' => Some(0x93),
        '\u{201D}' => Some(0x94),
        '\u{2022}' => Some(0x95),
        '\u{2013}' => Some(0x96),
        '\u{2014}' => Some(0x97),
        '\u{02DC}' => Some(0x98),
        '\u{2122}' => Some(0x99),
        '\u{0161}' => Some(0x9A),
        '\u{203A}' => Some(0x9B),
        '\u{0153}' => Some(0x9C),
        '\u{017E}' => Some(0x9E),
        '\u{0178}' => Some(0x9F),
        _ => None,
    }
}

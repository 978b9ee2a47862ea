// The real drawing surface: assembles the report into PDF bytes.
//
// Pages are accumulated as content streams while the composer runs; charts
// arrive as raw RGB buffers and are embedded as image XObjects. Everything
// is wired together (catalog, page tree, font, resources) in `finish`.

use log::debug;
use miniz_oxide::deflate::compress_to_vec_zlib;
use pdf_writer::types::{CidFontType, FontFlags, SystemInfo};
use pdf_writer::writers::Widths;
use pdf_writer::{Content, Filter, Name, Pdf, Rect as PdfRect, Ref, Str};

use crate::chart::RasterImage;
use crate::fonts::{DocumentFont, EmbeddedFont};
use crate::layout::{self, PageSurface, Rect, Rgb};

const MM_TO_PT: f32 = 72.0 / 25.4;
const PT_TO_MM: f64 = 25.4 / 72.0;

const FONT_NAME: Name = Name(b"F1");

pub struct PdfSurface {
    font: DocumentFont,
    current: Content,
    done: Vec<Content>,
    started: bool,
    images: Vec<RasterImage>,
}

impl PdfSurface {
    pub fn new(font: DocumentFont) -> PdfSurface {
        PdfSurface {
            font,
            current: Content::new(),
            done: Vec::new(),
            started: false,
            images: Vec::new(),
        }
    }

    fn set_fill(&mut self, color: Rgb) {
        self.current.set_fill_rgb(
            f32::from(color.0) / 255.0,
            f32::from(color.1) / 255.0,
            f32::from(color.2) / 255.0,
        );
    }

    /// Serializes everything accumulated so far into the document bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.done.push(self.current);
        let page_total = self.done.len();
        debug!(
            "assembling document: {} pages, {} chart images",
            page_total,
            self.images.len()
        );

        let mut pdf = Pdf::new();
        let mut next_id = 1i32;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };

        let catalog_id = alloc();
        let pages_id = alloc();
        let font_id = alloc();

        match &self.font {
            DocumentFont::Builtin => {
                pdf.type1_font(font_id)
                    .base_font(Name(b"Helvetica"))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
            }
            DocumentFont::Embedded(font) => embed_cid_font(&mut pdf, &mut alloc, font_id, font),
        }

        let mut image_refs: Vec<(String, Ref)> = Vec::new();
        for (index, image) in self.images.iter().enumerate() {
            let image_id = alloc();
            let compressed = compress_to_vec_zlib(&image.pixels, 6);
            let mut xobject = pdf.image_xobject(image_id, &compressed);
            xobject.filter(Filter::FlateDecode);
            xobject.width(image.width as i32);
            xobject.height(image.height as i32);
            xobject.color_space().device_rgb();
            xobject.bits_per_component(8);
            drop(xobject);
            image_refs.push((format!("Im{}", index + 1), image_id));
        }

        let page_ids: Vec<Ref> = (0..page_total).map(|_| alloc()).collect();
        let content_ids: Vec<Ref> = (0..page_total).map(|_| alloc()).collect();

        for (index, content) in self.done.into_iter().enumerate() {
            let raw = content.finish();
            let compressed = compress_to_vec_zlib(&raw, 6);
            pdf.stream(content_ids[index], &compressed)
                .filter(Filter::FlateDecode);
        }

        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_ids.iter().copied())
            .count(page_total as i32);

        let page_width = layout::PAGE_WIDTH as f32 * MM_TO_PT;
        let page_height = layout::PAGE_HEIGHT as f32 * MM_TO_PT;
        for index in 0..page_total {
            let mut page = pdf.page(page_ids[index]);
            page.media_box(PdfRect::new(0.0, 0.0, page_width, page_height))
                .parent(pages_id)
                .contents(content_ids[index]);
            let mut resources = page.resources();
            resources.fonts().pair(FONT_NAME, font_id);
            if !image_refs.is_empty() {
                let mut xobjects = resources.x_objects();
                for (name, image_id) in &image_refs {
                    xobjects.pair(Name(name.as_bytes()), *image_id);
                }
            }
        }

        pdf.finish()
    }
}

impl PageSurface for PdfSurface {
    fn begin_page(&mut self) {
        if self.started {
            let finished = std::mem::replace(&mut self.current, Content::new());
            self.done.push(finished);
        }
        self.started = true;
    }

    fn text_width(&self, text: &str, size: f64) -> f64 {
        self.font.text_width(text, size) * PT_TO_MM
    }

    fn fill_rect(&mut self, rect: Rect, fill: Rgb, stroke: Option<(Rgb, f64)>) {
        let x = rect.x as f32 * MM_TO_PT;
        let y = (layout::PAGE_HEIGHT - rect.y - rect.height) as f32 * MM_TO_PT;
        let width = rect.width as f32 * MM_TO_PT;
        let height = rect.height as f32 * MM_TO_PT;
        self.current.save_state();
        self.set_fill(fill);
        match stroke {
            Some((color, line_width)) => {
                self.current.set_stroke_rgb(
                    f32::from(color.0) / 255.0,
                    f32::from(color.1) / 255.0,
                    f32::from(color.2) / 255.0,
                );
                self.current.set_line_width(line_width as f32 * MM_TO_PT);
                self.current.rect(x, y, width, height);
                self.current.fill_nonzero_and_stroke();
            }
            None => {
                self.current.rect(x, y, width, height);
                self.current.fill_nonzero();
            }
        }
        self.current.restore_state();
    }

    fn draw_text(&mut self, x: f64, y: f64, size: f64, color: Rgb, text: &str) {
        let encoded = self.font.encode(text);
        if encoded.is_empty() {
            return;
        }
        self.current.save_state();
        self.set_fill(color);
        self.current.begin_text();
        self.current.set_font(FONT_NAME, size as f32);
        self.current.next_line(
            x as f32 * MM_TO_PT,
            (layout::PAGE_HEIGHT - y) as f32 * MM_TO_PT,
        );
        self.current.show(Str(&encoded));
        self.current.end_text();
        self.current.restore_state();
    }

    fn draw_image(&mut self, x: f64, y: f64, width: f64, image: &RasterImage) {
        if image.width == 0 || image.height == 0 {
            return;
        }
        let height = width * image.height as f64 / image.width as f64;
        let name = format!("Im{}", self.images.len() + 1);
        self.images.push(image.clone());
        self.current.save_state();
        self.current.transform([
            width as f32 * MM_TO_PT,
            0.0,
            0.0,
            height as f32 * MM_TO_PT,
            x as f32 * MM_TO_PT,
            (layout::PAGE_HEIGHT - y - height) as f32 * MM_TO_PT,
        ]);
        self.current.x_object(Name(name.as_bytes()));
        self.current.restore_state();
    }
}

/// Embeds a TrueType font as a Type0/CIDFontType2 with Identity-H encoding:
/// string bytes are big-endian glyph ids, widths come straight from the
/// font's advance table.
fn embed_cid_font(pdf: &mut Pdf, alloc: &mut dyn FnMut() -> Ref, font_id: Ref, font: &EmbeddedFont) {
    let cid_id = alloc();
    let descriptor_id = alloc();
    let data_id = alloc();
    let base_name = Name(font.postscript_name.as_bytes());
    let scale = 1000.0 / f64::from(font.units_per_em);

    pdf.type0_font(font_id)
        .base_font(base_name)
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_id);

    {
        let mut cid = pdf.cid_font(cid_id);
        cid.subtype(CidFontType::Type2);
        cid.base_font(base_name);
        cid.system_info(SystemInfo {
            registry: Str(b"Adobe"),
            ordering: Str(b"Identity"),
            supplement: 0,
        });
        cid.font_descriptor(descriptor_id);
        cid.default_width(1000.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));

        let mut by_gid: Vec<(u16, f32)> = font
            .glyphs
            .values()
            .map(|g| (g.gid, (f64::from(g.advance) * scale) as f32))
            .collect();
        by_gid.sort_by_key(|(gid, _)| *gid);
        by_gid.dedup_by_key(|(gid, _)| *gid);
        write_width_runs(&mut cid.widths(), &by_gid);
    }

    {
        let mut descriptor = pdf.font_descriptor(descriptor_id);
        descriptor.name(base_name);
        descriptor.flags(FontFlags::SYMBOLIC);
        descriptor.bbox(PdfRect::new(
            f64::from(font.bbox[0]) as f32 * scale as f32,
            f64::from(font.bbox[1]) as f32 * scale as f32,
            f64::from(font.bbox[2]) as f32 * scale as f32,
            f64::from(font.bbox[3]) as f32 * scale as f32,
        ));
        descriptor.italic_angle(0.0);
        descriptor.ascent(f64::from(font.ascent) as f32 * scale as f32);
        descriptor.descent(f64::from(font.descent) as f32 * scale as f32);
        descriptor.cap_height(f64::from(font.cap_height) as f32 * scale as f32);
        descriptor.stem_v(90.0);
        descriptor.font_file2(data_id);
    }

    let compressed = compress_to_vec_zlib(&font.data, 6);
    let mut stream = pdf.stream(data_id, &compressed);
    stream.filter(Filter::FlateDecode);
    stream.pair(Name(b"Length1"), font.data.len() as i32);
}

/// Writes /W entries, grouping consecutive glyph ids into runs.
fn write_width_runs(widths: &mut Widths, by_gid: &[(u16, f32)]) {
    let mut i = 0;
    while i < by_gid.len() {
        let start = i;
        while i + 1 < by_gid.len() && by_gid[i + 1].0 == by_gid[i].0 + 1 {
            i += 1;
        }
        widths.consecutive(by_gid[start].0, by_gid[start..=i].iter().map(|(_, w)| *w));
        i += 1;
    }
}

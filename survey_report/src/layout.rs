// Flow layout and pagination of the report document.
//
// All geometry is in millimetres on an A4 portrait page, y growing downward
// from the top edge. The composer owns the cursor state and calls into an
// injected `PageSurface` for the drawing primitives, so the arithmetic can
// be exercised against a recording fake.

use log::debug;

use crate::chart::RasterImage;
use crate::tally::QuestionKind;

pub const PAGE_WIDTH: f64 = 210.0;
pub const PAGE_HEIGHT: f64 = 297.0;
/// Bottom margin where the automatic page break triggers.
pub const BREAK_MARGIN: f64 = 15.0;
/// Fixed buffer above the break line, independent of the element height, so
/// near-boundary elements never clip into the footer.
pub const SAFE_MARGIN: f64 = 20.0;
const HEADER_BAND_HEIGHT: f64 = 28.0;
/// First usable y below the running header band.
pub const CONTENT_TOP: f64 = 45.0;

const BANNER_X: f64 = 10.0;
const BANNER_WIDTH: f64 = PAGE_WIDTH - 20.0;
const BANNER_PAD_X: f64 = 5.0;
const BANNER_PAD_Y: f64 = 4.0;
const BANNER_MIN_HEIGHT: f64 = 15.0;
const TITLE_SIZE: f64 = 14.0;
const TITLE_LINE_HEIGHT: f64 = 7.0;

const CHART_X: f64 = 15.0;
const CHART_WIDTH: f64 = 180.0;

const LIST_X: f64 = 15.0;
const LIST_WIDTH: f64 = 180.0;
const LIST_TEXT_X: f64 = 20.0;
const LIST_TEXT_WIDTH: f64 = 170.0;
const ITEM_MIN_HEIGHT: f64 = 12.0;
const BODY_SIZE: f64 = 10.0;
const BODY_LINE_HEIGHT: f64 = 5.0;

/// Reserved together with the banner of a chartable question: the chart
/// height is only known after rendering, so a generous fixed amount keeps
/// the title and its chart on the same page.
const CHART_BLOCK_RESERVE: f64 = 150.0;
const TEXT_BLOCK_RESERVE: f64 = 50.0;

/// Conversion from point sizes to millimetres.
const PT: f64 = 25.4 / 72.0;

const CHART_ICON: &str = "\u{1F4CA}";
const TEXT_ICON: &str = "\u{1F4DD}";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub u8, pub u8, pub u8);

const WHITE: Rgb = Rgb(255, 255, 255);
const BLACK: Rgb = Rgb(0, 0, 0);
const MUTED: Rgb = Rgb(128, 128, 128);
const BAND_FILL: Rgb = Rgb(99, 102, 241);
const BAND_BORDER: Rgb = Rgb(67, 56, 202);
const BANNER_CHART_FILL: Rgb = Rgb(139, 92, 246);
const BANNER_TEXT_FILL: Rgb = Rgb(59, 130, 246);
const BANNER_BORDER: Rgb = Rgb(75, 85, 99);
const ITEM_FILL_EVEN: Rgb = Rgb(243, 244, 246);
const ITEM_FILL_ODD: Rgb = Rgb(255, 255, 255);
const ITEM_BORDER: Rgb = Rgb(229, 231, 235);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The page-drawing capability the composer runs against. Implemented once
/// for the real document backend and by a recording fake in tests.
pub trait PageSurface {
    /// Opens a fresh blank page; subsequent drawing goes to it.
    fn begin_page(&mut self);
    /// Width in millimetres of `text` set at `size` points, from real font
    /// metrics. Line counts are derived from this, never from a fixed
    /// characters-per-line estimate.
    fn text_width(&self, text: &str, size: f64) -> f64;
    fn fill_rect(&mut self, rect: Rect, fill: Rgb, stroke: Option<(Rgb, f64)>);
    /// A single pre-wrapped line; `y` is the baseline position.
    fn draw_text(&mut self, x: f64, y: f64, size: f64, color: Rgb, text: &str);
    /// Image scaled to `width` with its aspect ratio preserved, top-left
    /// corner at (x, y).
    fn draw_image(&mut self, x: f64, y: f64, width: f64, image: &RasterImage);
}

/// Mutable pagination state: the current page and the vertical offset on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    pub page: u32,
    pub y: f64,
}

/// Lays question blocks out onto pages, breaking to a new page whenever a
/// block would not fit above the safe margin. Blocks are never split in a
/// way that clips their drawn height.
pub struct ReportComposer<'a> {
    surface: &'a mut dyn PageSurface,
    cursor: LayoutCursor,
    title: String,
}

impl<'a> ReportComposer<'a> {
    /// Starts the document on page 1 with the cursor at the top of the
    /// content area.
    pub fn new(surface: &'a mut dyn PageSurface, title: &str) -> ReportComposer<'a> {
        let mut composer = ReportComposer {
            surface,
            cursor: LayoutCursor {
                page: 0,
                y: CONTENT_TOP,
            },
            title: title.to_string(),
        };
        composer.start_page();
        composer
    }

    pub fn cursor(&self) -> LayoutCursor {
        self.cursor
    }

    pub fn page_count(&self) -> u32 {
        self.cursor.page
    }

    fn start_page(&mut self) {
        self.surface.begin_page();
        self.cursor.page += 1;
        self.cursor.y = CONTENT_TOP;

        // Running header band with the report title.
        self.surface.fill_rect(
            Rect {
                x: 0.0,
                y: 0.0,
                width: PAGE_WIDTH,
                height: HEADER_BAND_HEIGHT,
            },
            BAND_FILL,
            Some((BAND_BORDER, 1.0)),
        );
        let title = self.title.clone();
        let title_size = 18.0;
        let title_width = self.surface.text_width(&title, title_size);
        self.surface.draw_text(
            (PAGE_WIDTH - title_width) / 2.0,
            HEADER_BAND_HEIGHT / 2.0 + title_size * PT * 0.35,
            title_size,
            WHITE,
            &title,
        );

        // Running footer with the page number.
        let footer = format!("Page {}", self.cursor.page);
        let footer_width = self.surface.text_width(&footer, BODY_SIZE);
        self.surface.draw_text(
            (PAGE_WIDTH - footer_width) / 2.0,
            PAGE_HEIGHT - BREAK_MARGIN + 5.0,
            BODY_SIZE,
            MUTED,
            &footer,
        );
    }

    /// Breaks to a new page if `height` does not fit between the cursor and
    /// the safe margin.
    pub fn ensure_room(&mut self, height: f64) {
        if self.cursor.y + height > PAGE_HEIGHT - BREAK_MARGIN - SAFE_MARGIN {
            debug!(
                "page break before element: y={:.1}mm needed={:.1}mm",
                self.cursor.y, height
            );
            self.start_page();
        }
    }

    /// The colored title box of one question. For chartable questions this
    /// also reserves room for the chart below, so the title is never
    /// reconsidered once the chart height is known.
    pub fn question_banner(&mut self, header: &str, kind: QuestionKind) {
        let reserve = match kind {
            QuestionKind::Chart => CHART_BLOCK_RESERVE,
            QuestionKind::FreeText => TEXT_BLOCK_RESERVE,
        };
        self.ensure_room(reserve);

        let icon = match kind {
            QuestionKind::Chart => CHART_ICON,
            QuestionKind::FreeText => TEXT_ICON,
        };
        let text = format!("{} Q. {}", icon, header);
        let lines = wrap_text(&text, BANNER_WIDTH - 2.0 * BANNER_PAD_X, &|s| {
            self.surface.text_width(s, TITLE_SIZE)
        });
        let height =
            (lines.len() as f64 * TITLE_LINE_HEIGHT + 2.0 * BANNER_PAD_Y).max(BANNER_MIN_HEIGHT);

        let fill = match kind {
            QuestionKind::Chart => BANNER_CHART_FILL,
            QuestionKind::FreeText => BANNER_TEXT_FILL,
        };
        let top = self.cursor.y;
        self.surface.fill_rect(
            Rect {
                x: BANNER_X,
                y: top,
                width: BANNER_WIDTH,
                height,
            },
            fill,
            Some((BANNER_BORDER, 0.5)),
        );
        for (index, line) in lines.iter().enumerate() {
            let baseline =
                top + BANNER_PAD_Y + index as f64 * TITLE_LINE_HEIGHT + TITLE_LINE_HEIGHT * 0.75;
            self.surface
                .draw_text(BANNER_X + BANNER_PAD_X, baseline, TITLE_SIZE, WHITE, line);
        }
        self.cursor.y = top + height + 8.0;
    }

    /// Places a chart at a fixed left offset and width. The banner already
    /// reserved the space, so no page break can happen here.
    pub fn chart_image(&mut self, image: &RasterImage) {
        let height = CHART_WIDTH * image.height as f64 / image.width.max(1) as f64;
        self.surface
            .draw_image(CHART_X, self.cursor.y, CHART_WIDTH, image);
        self.cursor.y += height + 10.0;
    }

    /// The banded listing of free-text answers. Each item reserves its real
    /// wrapped height before anything is drawn, so an item either fits
    /// entirely or moves to the next page.
    pub fn answer_list(&mut self, answers: &[String], max_display: usize, max_len: usize) {
        for (index, answer) in answers.iter().take(max_display).enumerate() {
            let text = format!("\u{2022} {}", clip_answer(answer, max_len));
            let lines = wrap_text(&text, LIST_TEXT_WIDTH, &|s| {
                self.surface.text_width(s, BODY_SIZE)
            });
            let height =
                (lines.len() as f64 * BODY_LINE_HEIGHT + 6.0).max(ITEM_MIN_HEIGHT);
            self.ensure_room(height);

            let fill = if index % 2 == 0 {
                ITEM_FILL_EVEN
            } else {
                ITEM_FILL_ODD
            };
            let top = self.cursor.y;
            self.surface.fill_rect(
                Rect {
                    x: LIST_X,
                    y: top,
                    width: LIST_WIDTH,
                    height,
                },
                fill,
                Some((ITEM_BORDER, 0.2)),
            );
            for (line_index, line) in lines.iter().enumerate() {
                let baseline = top
                    + 3.0
                    + line_index as f64 * BODY_LINE_HEIGHT
                    + BODY_LINE_HEIGHT * 0.75;
                self.surface
                    .draw_text(LIST_TEXT_X, baseline, BODY_SIZE, BLACK, line);
            }
            self.cursor.y = top + height + 2.0;
        }

        if answers.len() > max_display {
            let line = format!("... {} more", answers.len() - max_display);
            self.ensure_room(8.0);
            let width = self.surface.text_width(&line, BODY_SIZE);
            self.surface.draw_text(
                (PAGE_WIDTH - width) / 2.0,
                self.cursor.y + 5.5,
                BODY_SIZE,
                MUTED,
                &line,
            );
            self.cursor.y += 8.0;
        }
        self.cursor.y += 5.0;
    }
}

/// Greedy word wrap against a real measurement function. Words wider than a
/// whole line (URLs, unspaced CJK runs) are broken per character, which is
/// what makes the measured widths matter.
pub fn wrap_text(text: &str, max_width: f64, measure: &dyn Fn(&str) -> f64) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", line, word)
        };
        if measure(&candidate) <= max_width {
            line = candidate;
            continue;
        }
        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if measure(word) <= max_width {
            line = word.to_string();
            continue;
        }
        for c in word.chars() {
            let mut grown = line.clone();
            grown.push(c);
            if !line.is_empty() && measure(&grown) > max_width {
                lines.push(std::mem::take(&mut line));
                line.push(c);
            } else {
                line = grown;
            }
        }
    }
    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

/// Collapses internal whitespace to single spaces and truncates to
/// `max_len` characters, marking the cut with an ellipsis. An answer of
/// exactly `max_len` characters is left untouched.
pub fn clip_answer(answer: &str, max_len: usize) -> String {
    let cleaned: String = answer.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() > max_len {
        let mut clipped: String = cleaned.chars().take(max_len).collect();
        clipped.push_str("...");
        clipped
    } else {
        cleaned
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Page,
        Rect(Rect),
        Text(String),
        Image,
    }

    /// Records drawing calls and measures text at a fixed width per
    /// character, which makes expected line counts easy to state.
    pub struct RecordingSurface {
        pub char_width: f64,
        pub calls: Vec<Call>,
        pub pages: u32,
    }

    impl RecordingSurface {
        pub fn new(char_width: f64) -> RecordingSurface {
            RecordingSurface {
                char_width,
                calls: Vec::new(),
                pages: 0,
            }
        }

        pub fn texts(&self) -> Vec<&str> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Text(t) => Some(t.as_str()),
                    _ => None,
                })
                .collect()
        }
    }

    impl PageSurface for RecordingSurface {
        fn begin_page(&mut self) {
            self.pages += 1;
            self.calls.push(Call::Page);
        }

        fn text_width(&self, text: &str, _size: f64) -> f64 {
            text.chars().count() as f64 * self.char_width
        }

        fn fill_rect(&mut self, rect: Rect, _fill: Rgb, _stroke: Option<(Rgb, f64)>) {
            self.calls.push(Call::Rect(rect));
        }

        fn draw_text(&mut self, _x: f64, _y: f64, _size: f64, _color: Rgb, text: &str) {
            self.calls.push(Call::Text(text.to_string()));
        }

        fn draw_image(&mut self, _x: f64, _y: f64, _width: f64, _image: &RasterImage) {
            self.calls.push(Call::Image);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Call, RecordingSurface};
    use super::*;

    fn one_mm_per_char(s: &str) -> f64 {
        s.chars().count() as f64
    }

    #[test]
    fn wrap_breaks_at_measured_width() {
        let lines = wrap_text("aaaa bbbb cc", 9.0, &one_mm_per_char);
        assert_eq!(lines, vec!["aaaa bbbb", "cc"]);
    }

    #[test]
    fn wrap_hard_breaks_oversized_words() {
        let lines = wrap_text("abcdefghij", 4.0, &one_mm_per_char);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn wrap_of_empty_text_is_one_line() {
        assert_eq!(wrap_text("", 10.0, &one_mm_per_char), vec![""]);
    }

    #[test]
    fn clip_keeps_exact_length_answers() {
        assert_eq!(clip_answer("abcde", 5), "abcde");
        assert_eq!(clip_answer("abcdef", 5), "abcde...");
    }

    #[test]
    fn clip_counts_characters_not_bytes() {
        assert_eq!(clip_answer("あいうえお", 5), "あいうえお");
        assert_eq!(clip_answer("あいうえおか", 5), "あいうえお...");
    }

    #[test]
    fn clip_collapses_internal_whitespace() {
        assert_eq!(clip_answer("a\n b\t\tc", 20), "a b c");
    }

    // Banner boxes start at x=10; answer items at x=15.
    fn banner_rects(surface: &RecordingSurface) -> Vec<Rect> {
        surface
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Rect(r) if r.x == 10.0 => Some(*r),
                _ => None,
            })
            .collect()
    }

    fn item_rects(surface: &RecordingSurface) -> Vec<Rect> {
        surface
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Rect(r) if r.x == 15.0 => Some(*r),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn banner_height_follows_wrapped_line_count() {
        let mut surface = RecordingSurface::new(1.0);
        let mut composer = ReportComposer::new(&mut surface, "Title");
        // With 1mm per character the banner text width is 180mm per line.
        // The icon prefix ends line one, and the unbroken 300-character
        // header hard-wraps into 180 + 120: three lines in total.
        let header = "x".repeat(300);
        composer.question_banner(&header, QuestionKind::FreeText);
        let rects = banner_rects(&surface);
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].height, 3.0 * 7.0 + 8.0);
    }

    #[test]
    fn short_banner_keeps_minimum_height() {
        let mut surface = RecordingSurface::new(1.0);
        let mut composer = ReportComposer::new(&mut surface, "Title");
        composer.question_banner("Short", QuestionKind::Chart);
        let rects = banner_rects(&surface);
        assert_eq!(rects[0].height, 15.0);
    }

    #[test]
    fn list_items_fit_between_the_margins() {
        let mut surface = RecordingSurface::new(1.0);
        let mut composer = ReportComposer::new(&mut surface, "Title");
        let answers: Vec<String> = (0..40).map(|i| format!("answer number {}", i)).collect();
        composer.answer_list(&answers, 100, 200);
        for rect in item_rects(&surface) {
            assert!(
                rect.y + rect.height <= PAGE_HEIGHT - BREAK_MARGIN - SAFE_MARGIN,
                "item at y={} height={} crosses the safe margin",
                rect.y,
                rect.height
            );
        }
    }

    #[test]
    fn overflowing_list_starts_a_new_page_once_per_overflow() {
        let mut surface = RecordingSurface::new(1.0);
        let mut composer = ReportComposer::new(&mut surface, "Title");
        // Items are 12mm + 2mm gap; the first page fits (262-45)/14 = 15 of
        // them, so 20 answers need exactly two pages.
        let answers: Vec<String> = (0..20).map(|i| format!("a{}", i)).collect();
        composer.answer_list(&answers, 100, 200);
        assert_eq!(composer.page_count(), 2);
    }

    #[test]
    fn list_cap_adds_a_summary_line() {
        let mut surface = RecordingSurface::new(1.0);
        let mut composer = ReportComposer::new(&mut surface, "Title");
        let answers: Vec<String> = (0..8).map(|i| format!("a{}", i)).collect();
        composer.answer_list(&answers, 5, 200);
        let texts = surface.texts();
        assert!(texts.contains(&"... 3 more"));
        // Only the first five answers are drawn.
        assert!(texts.contains(&"\u{2022} a4"));
        assert!(!texts.iter().any(|t| t.contains("a5")));
    }

    #[test]
    fn chartable_banner_reserves_room_for_the_chart() {
        let mut surface = RecordingSurface::new(1.0);
        let mut composer = ReportComposer::new(&mut surface, "Title");
        // Push the cursor past 262 - 150 = 112mm.
        let answers: Vec<String> = (0..6).map(|i| format!("a{}", i)).collect();
        composer.answer_list(&answers, 100, 200);
        assert!(composer.cursor().y > 112.0);
        assert_eq!(composer.page_count(), 1);
        composer.question_banner("Pick one", QuestionKind::Chart);
        assert_eq!(composer.page_count(), 2);
    }

    #[test]
    fn chart_advances_by_scaled_height() {
        let mut surface = RecordingSurface::new(1.0);
        let mut composer = ReportComposer::new(&mut surface, "Title");
        let before = composer.cursor().y;
        let image = RasterImage {
            width: 1000,
            height: 600,
            pixels: Vec::new(),
        };
        composer.chart_image(&image);
        // 180mm wide at 10:6 is 108mm tall, plus the 10mm gap.
        assert!((composer.cursor().y - before - 118.0).abs() < 1e-9);
        assert_eq!(surface.calls.iter().filter(|c| **c == Call::Image).count(), 1);
    }

    #[test]
    fn every_page_gets_header_and_footer() {
        let mut surface = RecordingSurface::new(1.0);
        let mut composer = ReportComposer::new(&mut surface, "My Survey");
        let answers: Vec<String> = (0..20).map(|i| format!("a{}", i)).collect();
        composer.answer_list(&answers, 100, 200);
        assert_eq!(composer.page_count(), 2);
        let texts = surface.texts();
        assert_eq!(texts.iter().filter(|&&t| t == "My Survey").count(), 2);
        assert!(texts.contains(&"Page 1"));
        assert!(texts.contains(&"Page 2"));
    }
}

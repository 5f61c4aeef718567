//! Rendering Backend Module
//!
//! The seam between templates and whatever paints pages. Templates hand an
//! ordered element list plus page geometry to a [`RenderBackend`]; the
//! backend paginates, calls the page callbacks once per page in page order,
//! and returns the encoded bytes with the page count.

use std::fmt::Write as _;

use crate::error::{GenerationError, Result};
use crate::style::Margins;
use crate::template::{DocumentElement, PageSize};

const LINE_HEIGHT_FACTOR: f32 = 1.2;
const CHAR_WIDTH_FACTOR: f32 = 0.5;
const TABLE_FONT_SIZE: f32 = 10.0;

// == Drawing Surface ==
/// Handle given to page callbacks for drawing on the current page.
pub trait Surface {
    /// 1-based page number
    fn page_number(&self) -> usize;
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    fn draw_text(&mut self, x: f32, y: f32, text: &str);
}

/// Per-page hooks invoked synchronously by the backend during rendering.
pub trait PageCallbacks {
    fn on_first_page(&mut self, surface: &mut dyn Surface);
    fn on_later_pages(&mut self, surface: &mut dyn Surface);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

// == Render Backend ==
pub trait RenderBackend: Send + Sync {
    fn render(
        &self,
        elements: &[DocumentElement],
        page_size: PageSize,
        margins: &Margins,
        callbacks: &mut dyn PageCallbacks,
    ) -> Result<RenderOutput>;

    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn file_extension(&self) -> &'static str {
        "pdf"
    }
}

// == Text Backend ==
/// Paginates elements into fixed-height plain-text pages.
///
/// Line height is `size * 1.2`, a glyph is `size * 0.5` wide. Output is
/// UTF-8 with a `=== page N/M ===` marker before each page.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextBackend;

impl TextBackend {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Default)]
struct TextPage {
    lines: Vec<String>,
    used: f32,
}

struct TextSurface<'a> {
    page_number: usize,
    width: f32,
    height: f32,
    marks: &'a mut Vec<String>,
}

impl Surface for TextSurface<'_> {
    fn page_number(&self) -> usize {
        self.page_number
    }

    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn draw_text(&mut self, x: f32, y: f32, text: &str) {
        self.marks.push(format!("[{x:.0},{y:.0}] {text}"));
    }
}

/// Accumulates wrapped lines into pages of a fixed usable height.
struct Paginator {
    frame_width: f32,
    frame_height: f32,
    pages: Vec<TextPage>,
}

impl Paginator {
    fn new(frame_width: f32, frame_height: f32) -> Self {
        Self {
            frame_width,
            frame_height,
            pages: vec![TextPage::default()],
        }
    }

    fn current(&mut self) -> &mut TextPage {
        if self.pages.is_empty() {
            self.pages.push(TextPage::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn break_page(&mut self) {
        if !self.current().lines.is_empty() {
            self.pages.push(TextPage::default());
        }
    }

    fn push_line(&mut self, line: String, height: f32) {
        let frame_height = self.frame_height;
        if self.current().used + height > frame_height && !self.current().lines.is_empty() {
            self.pages.push(TextPage::default());
        }
        let page = self.current();
        page.used += height;
        page.lines.push(line);
    }

    fn push_wrapped(&mut self, text: &str, size: f32) {
        let height = size * LINE_HEIGHT_FACTOR;
        let columns = ((self.frame_width / (size * CHAR_WIDTH_FACTOR)).floor() as usize).max(1);
        for line in wrap(text, columns) {
            self.push_line(line, height);
        }
    }

    fn push_space(&mut self, height: f32) {
        let frame_height = self.frame_height;
        let page = self.current();
        if page.used + height > frame_height {
            // Space never carries over to the next page
            page.used = frame_height;
        } else {
            page.used += height;
        }
    }
}

fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word;
            while word.chars().count() > columns {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let split = word.char_indices().nth(columns).map_or(word.len(), |(i, _)| i);
                lines.push(word[..split].to_string());
                word = &word[split..];
            }
            if word.is_empty() {
                continue;
            }
            let needed = if line.is_empty() { word.chars().count() } else { line.chars().count() + 1 + word.chars().count() };
            if needed > columns {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn table_lines(rows: &[Vec<String>], header_rows: usize) -> Vec<String> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            rows.iter()
                .filter_map(|row| row.get(c))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    for (i, row) in rows.iter().enumerate() {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(c, width)| format!("{:<width$}", row.get(c).map_or("", String::as_str)))
            .collect();
        lines.push(cells.join(" | ").trim_end().to_string());
        if i + 1 == header_rows {
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            lines.push(rule.join("-+-"));
        }
    }
    lines
}

impl RenderBackend for TextBackend {
    fn render(
        &self,
        elements: &[DocumentElement],
        page_size: PageSize,
        margins: &Margins,
        callbacks: &mut dyn PageCallbacks,
    ) -> Result<RenderOutput> {
        let (width, height) = page_size.dimensions();
        let frame_width = width - margins.left - margins.right;
        let frame_height = height - margins.top - margins.bottom;
        if frame_width <= 0.0 || frame_height <= 0.0 {
            return Err(GenerationError::Render(format!(
                "margins leave no printable area on a {width}x{height} page"
            )));
        }

        let mut paginator = Paginator::new(frame_width, frame_height);
        for element in elements {
            match element {
                DocumentElement::Text { content, style } => paginator.push_wrapped(content, style.size),
                DocumentElement::Table { rows, header_rows } => {
                    for line in table_lines(rows, *header_rows) {
                        paginator.push_wrapped(&line, TABLE_FONT_SIZE);
                    }
                }
                DocumentElement::Spacer { height } => paginator.push_space(height.max(0.0)),
                DocumentElement::PageBreak => paginator.break_page(),
            }
        }

        let page_count = paginator.pages.len();
        let mut out = String::new();
        for (index, page) in paginator.pages.into_iter().enumerate() {
            let mut marks = Vec::new();
            let mut surface = TextSurface {
                page_number: index + 1,
                width,
                height,
                marks: &mut marks,
            };
            if index == 0 {
                callbacks.on_first_page(&mut surface);
            } else {
                callbacks.on_later_pages(&mut surface);
            }

            let _ = writeln!(out, "=== page {}/{} ===", index + 1, page_count);
            for line in page.lines.iter().chain(marks.iter()) {
                let _ = writeln!(out, "{line}");
            }
        }

        Ok(RenderOutput {
            bytes: out.into_bytes(),
            page_count,
        })
    }

    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }
}

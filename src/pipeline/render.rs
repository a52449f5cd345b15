//! PDF rendering: lay the translated text out on pages and write a new PDF.
//!
//! Rendering is split in two so each half can be tested on its own:
//!
//! 1. [`layout_text`] turns the translated text into a [`TextLayout`]
//!    (pages of placed, already-encoded lines) plus a [`RenderReport`].
//! 2. [`build_pdf`] serialises a [`TextLayout`] with lopdf into bytes, and
//!    [`write_pdf`] commits those bytes to disk in one atomic rename.
//!
//! ## Paragraphs
//!
//! Paragraphs are separated by a blank line (CRLF line ends are accepted).
//! A single `\n` inside a paragraph is a hard line break. Each paragraph is
//! fully laid out before any of its lines are committed, so a paragraph that
//! fails (for example on a character Helvetica cannot encode) leaves nothing
//! behind on the page.

use crate::config::PageLayout;
use crate::error::{ParagraphError, PdfTranslateError};
use crate::output::RenderReport;
use crate::pipeline::font;
use crate::substitutions::PunctuationTable;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Resource name of the single font used on every page.
const FONT_RESOURCE: &str = "F1";

/// One line of text at a fixed position on its page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    /// Line text after punctuation substitution.
    pub text: String,
    /// WinAnsi bytes written into the content stream.
    pub encoded: Vec<u8>,
    pub x: f32,
    /// Baseline, measured from the bottom of the page.
    pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidOutPage {
    pub lines: Vec<PlacedLine>,
}

/// The positioned content of the output document.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub layout: PageLayout,
    /// Always holds at least one (possibly empty) page.
    pub pages: Vec<LaidOutPage>,
}

impl TextLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All line texts in reading order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.pages
            .iter()
            .flat_map(|p| p.lines.iter().map(|l| l.text.as_str()))
    }
}

/// Non-blank paragraphs of `text`, in order.
pub fn split_paragraphs(text: &str) -> impl Iterator<Item = &str> {
    text.split("\n\n").filter(|p| !p.trim().is_empty())
}

/// Lay out `text` on pages described by `layout`.
pub fn layout_text(
    text: &str,
    layout: &PageLayout,
    punctuation: &PunctuationTable,
) -> (TextLayout, RenderReport) {
    let mut cursor = PageCursor::new(layout);
    let mut report = RenderReport::default();
    let text = text.replace("\r\n", "\n");

    for (i, paragraph) in split_paragraphs(&text).enumerate() {
        let number = i + 1;
        let substituted = punctuation.apply(paragraph);
        match prepare_paragraph(number, &substituted, layout) {
            Ok(lines) => {
                cursor.place_paragraph(lines);
                report.paragraphs_written += 1;
            }
            Err(e) => {
                warn!("Skipping paragraph: {}", e);
                report.paragraphs_skipped += 1;
                report.skipped.push(e);
            }
        }
    }

    let text_layout = cursor.finish();
    report.pages = text_layout.page_count();
    debug!(
        "Laid out {} paragraphs ({} skipped) on {} pages",
        report.paragraphs_written, report.paragraphs_skipped, report.pages
    );
    (text_layout, report)
}

/// Wrap and encode one paragraph. Nothing is placed until this succeeds.
fn prepare_paragraph(
    number: usize,
    paragraph: &str,
    layout: &PageLayout,
) -> Result<Vec<(String, Vec<u8>)>, ParagraphError> {
    let max_width = layout.content_width();
    let mut lines = Vec::new();

    for hard_line in paragraph.trim_matches('\n').split('\n') {
        let wrapped = word_wrap(hard_line, max_width, layout.font_size).map_err(|detail| {
            ParagraphError::Layout {
                paragraph: number,
                detail,
            }
        })?;
        for line in wrapped {
            let encoded = font::encode(&line).map_err(|ch| ParagraphError::UnsupportedCharacter {
                paragraph: number,
                ch,
            })?;
            lines.push((line, encoded));
        }
    }

    Ok(lines)
}

/// Word-wrap one hard line to `max_width` points using Helvetica metrics.
///
/// Words wider than `max_width` are broken at character boundaries. An empty
/// input yields one empty line.
pub fn word_wrap(text: &str, max_width: f32, font_size: f32) -> Result<Vec<String>, String> {
    let space_width = font::string_width(" ", font_size);
    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_width: f32 = 0.0;

    for word in text.split_whitespace() {
        let word_width = font::string_width(word, font_size);

        if word_width > max_width {
            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
            }
            let mut piece = String::new();
            let mut piece_width: f32 = 0.0;
            for c in word.chars() {
                let char_width = font::string_width(c.encode_utf8(&mut [0; 4]), font_size);
                if char_width > max_width {
                    return Err(format!(
                        "glyph {c:?} is {char_width:.1}pt wide, line is {max_width:.1}pt"
                    ));
                }
                if piece_width + char_width > max_width && !piece.is_empty() {
                    lines.push(std::mem::take(&mut piece));
                    piece_width = 0.0;
                }
                piece.push(c);
                piece_width += char_width;
            }
            current_line = piece;
            current_width = piece_width;
            continue;
        }

        if current_line.is_empty() {
            current_line = word.to_string();
            current_width = word_width;
        } else if current_width + space_width + word_width <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
            current_width += space_width + word_width;
        } else {
            lines.push(std::mem::replace(&mut current_line, word.to_string()));
            current_width = word_width;
        }
    }

    if !current_line.is_empty() || lines.is_empty() {
        lines.push(current_line);
    }

    Ok(lines)
}

/// Tracks the write position while lines are placed.
struct PageCursor<'a> {
    layout: &'a PageLayout,
    pages: Vec<LaidOutPage>,
    current: LaidOutPage,
    /// Top of the next line box.
    y: f32,
}

impl<'a> PageCursor<'a> {
    fn new(layout: &'a PageLayout) -> Self {
        Self {
            layout,
            pages: Vec::new(),
            current: LaidOutPage::default(),
            y: layout.content_top(),
        }
    }

    fn place_paragraph(&mut self, lines: Vec<(String, Vec<u8>)>) {
        for (text, encoded) in lines {
            let mut baseline = self.y - self.layout.line_height;
            if baseline < self.layout.margin_bottom {
                self.new_page();
                baseline = self.y - self.layout.line_height;
            }
            if !encoded.is_empty() {
                self.current.lines.push(PlacedLine {
                    text,
                    encoded,
                    x: self.layout.margin_left,
                    y: baseline,
                });
            }
            self.y = baseline;
        }
        self.y -= self.layout.paragraph_gap;
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = self.layout.content_top();
    }

    fn finish(mut self) -> TextLayout {
        self.pages.push(self.current);
        TextLayout {
            layout: *self.layout,
            pages: self.pages,
        }
    }
}

/// Serialise a laid-out document into PDF bytes.
pub fn build_pdf(text_layout: &TextLayout) -> Result<Vec<u8>, PdfTranslateError> {
    let layout = &text_layout.layout;
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(font::BASE_FONT.as_bytes().to_vec())),
        ("Encoding", Object::Name(font::ENCODING.as_bytes().to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter([(
        "Font",
        Object::Dictionary(Dictionary::from_iter([(
            FONT_RESOURCE,
            Object::Reference(font_id),
        )])),
    )]));

    let media_box = Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(layout.page_width),
        Object::Real(layout.page_height),
    ]);

    let mut kids = Vec::with_capacity(text_layout.pages.len());
    for page in &text_layout.pages {
        let content = page_content(page, layout.font_size);
        let bytes = content
            .encode()
            .map_err(|e| PdfTranslateError::PdfSerialization(format!("content stream: {e}")))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), bytes));
        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
            ("MediaBox", media_box.clone()),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ])),
    );

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    let info_id = doc.add_object(Dictionary::from_iter([(
        "Producer",
        Object::string_literal(concat!("edgequake-pdf-translate ", env!("CARGO_PKG_VERSION"))),
    )]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.trailer.set("Info", Object::Reference(info_id));

    doc.compress();
    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| PdfTranslateError::PdfSerialization(e.to_string()))?;
    Ok(out)
}

fn page_content(page: &LaidOutPage, font_size: f32) -> Content {
    let mut operations = Vec::with_capacity(page.lines.len() * 2 + 3);
    if !page.lines.is_empty() {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![
                Object::Name(FONT_RESOURCE.as_bytes().to_vec()),
                Object::Real(font_size),
            ],
        ));
        for line in &page.lines {
            operations.push(Operation::new(
                "Tm",
                vec![
                    Object::Integer(1),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(1),
                    Object::Real(line.x),
                    Object::Real(line.y),
                ],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(line.encoded.clone(), StringFormat::Literal)],
            ));
        }
        operations.push(Operation::new("ET", vec![]));
    }
    Content { operations }
}

/// Atomically write `bytes` to `path`.
///
/// The bytes go to a temporary file in the destination directory, which is
/// then renamed over `path`. Missing parent directories are created.
pub fn write_pdf(bytes: &[u8], path: &Path) -> Result<(), PdfTranslateError> {
    let write_err = |source: std::io::Error| PdfTranslateError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Lay out, serialise and atomically write `text` as a PDF at `path`.
pub fn render_pdf(
    text: &str,
    path: &Path,
    layout: &PageLayout,
    punctuation: &PunctuationTable,
) -> Result<RenderReport, PdfTranslateError> {
    let (text_layout, report) = layout_text(text, layout, punctuation);
    let bytes = build_pdf(&text_layout)?;
    write_pdf(&bytes, path)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(text: &str) -> (TextLayout, RenderReport) {
        layout_text(text, &PageLayout::default(), &PunctuationTable::default())
    }

    #[test]
    fn two_paragraphs_written() {
        let (layout, report) = render("Hola mundo.\n\nSegundo párrafo.");
        assert_eq!(report.paragraphs_written, 2);
        assert_eq!(report.paragraphs_skipped, 0);
        assert_eq!(report.pages, 1);
        let lines: Vec<&str> = layout.lines().collect();
        assert_eq!(lines, vec!["Hola mundo.", "Segundo párrafo."]);
    }

    #[test]
    fn paragraph_gap_between_blocks() {
        let (layout, _) = render("uno\n\ndos");
        let page = &layout.pages[0];
        let step = page.lines[0].y - page.lines[1].y;
        let expected = layout.layout.line_height + layout.layout.paragraph_gap;
        assert!((step - expected).abs() < 1e-3, "step={step}");
    }

    #[test]
    fn blank_paragraphs_ignored() {
        let (_, report) = render("\n\nuno\n\n   \n\n\n\ndos\n\n");
        assert_eq!(report.paragraphs_written, 2);
        assert_eq!(report.paragraphs_skipped, 0);
    }

    #[test]
    fn smart_punctuation_substituted_not_skipped() {
        let (layout, report) = render("\u{201C}Hola\u{201D} \u{2014} dijo\u{2026} l\u{2019}ami");
        assert_eq!(report.paragraphs_skipped, 0);
        assert_eq!(layout.lines().next(), Some("\"Hola\" - dijo... l'ami"));
    }

    #[test]
    fn unsupported_paragraph_skipped_others_kept() {
        let (layout, report) = render("Primero.\n\n日本語のテキスト\n\nTercero.");
        assert_eq!(report.paragraphs_written, 2);
        assert_eq!(report.paragraphs_skipped, 1);
        assert_eq!(
            report.skipped,
            vec![ParagraphError::UnsupportedCharacter {
                paragraph: 2,
                ch: '日'
            }]
        );
        let lines: Vec<&str> = layout.lines().collect();
        assert_eq!(lines, vec!["Primero.", "Tercero."]);
    }

    #[test]
    fn layout_error_skips_only_that_paragraph() {
        // 11pt of line width at 11pt: every glyph fits except '@'.
        let narrow = PageLayout {
            page_width: 100.0,
            margin_left: 44.5,
            margin_right: 44.5,
            ..PageLayout::default()
        };
        assert!(narrow.validate().is_ok());
        let (layout, report) =
            layout_text("ok\n\n@@@\n\nok", &narrow, &PunctuationTable::default());
        assert_eq!(report.paragraphs_written, 2);
        assert_eq!(report.paragraphs_skipped, 1);
        assert!(
            matches!(report.skipped[..], [ParagraphError::Layout { paragraph: 2, .. }]),
            "got: {:?}",
            report.skipped
        );
        let lines: Vec<&str> = layout.lines().collect();
        assert_eq!(lines, vec!["o", "k", "o", "k"]);
    }

    #[test]
    fn crlf_blank_line_separates_paragraphs() {
        let (layout, report) = render("Uno.\r\n\r\nDos.\r\nTres.");
        assert_eq!(report.paragraphs_written, 2);
        let lines: Vec<&str> = layout.lines().collect();
        assert_eq!(lines, vec!["Uno.", "Dos.", "Tres."]);
    }

    #[test]
    fn failing_paragraph_leaves_no_partial_lines() {
        let long = "palabra ".repeat(200);
        let text = format!("{long}\nfin 漢");
        let (layout, report) = render(&text);
        assert_eq!(report.paragraphs_skipped, 1);
        assert_eq!(layout.lines().count(), 0);
        assert_eq!(report.pages, 1);
    }

    #[test]
    fn single_newline_is_hard_break() {
        let (layout, _) = render("línea uno\nlínea dos");
        let lines: Vec<&str> = layout.lines().collect();
        assert_eq!(lines, vec!["línea uno", "línea dos"]);
    }

    #[test]
    fn long_paragraph_wraps_within_width() {
        let text = "El veloz murciélago hindú comía feliz cardillo y kiwi. ".repeat(20);
        let (layout, _) = render(&text);
        let max = layout.layout.content_width();
        assert!(layout.lines().count() > 1);
        for line in layout.lines() {
            assert!(font::string_width(line, layout.layout.font_size) <= max + 1e-3);
        }
    }

    #[test]
    fn overlong_word_broken() {
        let lines = word_wrap(&"x".repeat(50), 40.0, 10.0).unwrap();
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "x".repeat(50));
    }

    #[test]
    fn empty_hard_line_kept_as_blank() {
        assert_eq!(word_wrap("", 100.0, 10.0).unwrap(), vec![String::new()]);
    }

    #[test]
    fn pagination_respects_bottom_margin() {
        let text = (1..=200)
            .map(|i| format!("Párrafo número {i}."))
            .collect::<Vec<_>>()
            .join("\n\n");
        let (layout, report) = render(&text);
        assert_eq!(report.paragraphs_written, 200);
        assert!(report.pages > 1);
        let l = layout.layout;
        for page in &layout.pages {
            for line in &page.lines {
                assert!(line.y >= l.margin_bottom);
                assert!(line.y <= l.content_top());
            }
        }
        // Reading order survives pagination.
        let last = layout.pages.last().unwrap().lines.last().unwrap();
        assert_eq!(last.text, "Párrafo número 200.");
    }

    #[test]
    fn empty_text_still_has_one_page() {
        let (layout, report) = render("");
        assert_eq!(report.pages, 1);
        assert_eq!(report.paragraphs_written, 0);
        let bytes = build_pdf(&layout).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn built_pdf_loads_with_matching_page_count() {
        let text = "Un párrafo con ñ y €.\n\n".repeat(150);
        let (layout, report) = render(&text);
        let bytes = build_pdf(&layout).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), report.pages);
    }

    #[test]
    fn write_pdf_creates_parents_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/doc.pdf");
        write_pdf(b"%PDF-first", &path).unwrap();
        write_pdf(b"%PDF-second", &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-second");
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn render_pdf_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let report = render_pdf(
            "Hola.\n\nAdiós.",
            &path,
            &PageLayout::default(),
            &PunctuationTable::default(),
        )
        .unwrap();
        assert_eq!(report.paragraphs_written, 2);
        let doc = Document::load(&path).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }
}

use crate::domain::models::{Block, Field, GroupReport, Rendered};
use crate::error::ReportError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN_LEFT: i64 = 50;
const TOP: i64 = 792;
const BOTTOM: i64 = 60;
const FOOTER_Y: i64 = 30;
const CONTENT_WIDTH: i64 = PAGE_WIDTH - 2 * MARGIN_LEFT;
const VALUE_X: i64 = 230;

// Courier glyphs are 600/1000 em wide.
const MONO_EM: f64 = 0.6;
const TABLE_SIZES: [i64; 3] = [8, 7, 6];
const TITLE_WRAP: usize = 45;
const FIELD_WRAP: usize = 60;
const NOTE_WRAP: usize = 95;
const MAX_CELL: usize = 40;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
    Italic,
    Mono,
    MonoBold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Italic => "F3",
            Font::Mono => "F4",
            Font::MonoBold => "F5",
        }
    }
}

const FONTS: [(Font, &str); 5] = [
    (Font::Regular, "Helvetica"),
    (Font::Bold, "Helvetica-Bold"),
    (Font::Italic, "Helvetica-Oblique"),
    (Font::Mono, "Courier"),
    (Font::MonoBold, "Courier-Bold"),
];

struct Run {
    font: Font,
    size: i64,
    x: i64,
    text: String,
}

struct Line {
    height: i64,
    runs: Vec<Run>,
}

impl Line {
    fn text(font: Font, size: i64, x: i64, text: impl Into<String>) -> Self {
        Self {
            height: size + size / 2,
            runs: vec![Run {
                font,
                size,
                x,
                text: text.into(),
            }],
        }
    }

    fn gap(height: i64) -> Self {
        Self {
            height,
            runs: Vec::new(),
        }
    }
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn clip(cell: &str, width: usize) -> String {
    if cell.chars().count() <= width {
        return cell.to_string();
    }
    let mut out: String = cell.chars().take(width.saturating_sub(1)).collect();
    out.push('~');
    out
}

fn layout_fields(fields: &[Field], out: &mut Vec<Line>) {
    for f in fields {
        let values = wrap(&f.value, FIELD_WRAP);
        for (idx, value) in values.into_iter().enumerate() {
            let mut line = Line::text(Font::Regular, 10, VALUE_X, value);
            if idx == 0 {
                line.runs.push(Run {
                    font: Font::Bold,
                    size: 10,
                    x: MARGIN_LEFT,
                    text: format!("{}:", f.label),
                });
            }
            out.push(line);
        }
    }
}

/// Returns whether any line was cut at the right margin.
fn layout_table(headers: &[String], rows: &[Vec<String>], out: &mut Vec<Line>) -> bool {
    let columns = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(columns) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    for w in &mut widths {
        *w = (*w).min(MAX_CELL);
    }
    let total: usize = widths.iter().sum::<usize>() + 2 * columns.saturating_sub(1);

    let size = TABLE_SIZES
        .iter()
        .copied()
        .find(|s| total as f64 * *s as f64 * MONO_EM <= CONTENT_WIDTH as f64)
        .unwrap_or(TABLE_SIZES[TABLE_SIZES.len() - 1]);
    let max_chars = (CONTENT_WIDTH as f64 / (size as f64 * MONO_EM)) as usize;

    let format_row = |cells: &[String]| -> String {
        let mut line = String::new();
        for (i, width) in widths.iter().enumerate() {
            if i > 0 {
                line.push_str("  ");
            }
            let cell = clip(cells.get(i).map(String::as_str).unwrap_or(""), *width);
            line.push_str(&format!("{:<width$}", cell, width = *width));
        }
        clip(line.trim_end(), max_chars)
    };

    out.push(Line::text(Font::MonoBold, size, MARGIN_LEFT, format_row(headers)));
    out.push(Line::text(
        Font::Mono,
        size,
        MARGIN_LEFT,
        "-".repeat(total.min(max_chars)),
    ));
    for row in rows {
        out.push(Line::text(Font::Mono, size, MARGIN_LEFT, format_row(row)));
    }
    total > max_chars
}

fn layout(report: &GroupReport) -> Vec<Line> {
    let mut out: Vec<Line> = wrap(&report.title, TITLE_WRAP)
        .into_iter()
        .map(|l| Line::text(Font::Bold, 18, MARGIN_LEFT, l))
        .collect();
    out.push(Line::text(
        Font::Regular,
        11,
        MARGIN_LEFT,
        format!(
            "Group {} (gid {}), {}",
            report.group,
            report.gid,
            report.period.label()
        ),
    ));
    for section in &report.sections {
        out.push(Line::gap(12));
        out.push(Line::text(Font::Bold, 14, MARGIN_LEFT, section.title.clone()));
        for block in &section.blocks {
            out.push(Line::gap(4));
            match block {
                Block::Fields { fields } => layout_fields(fields, &mut out),
                Block::Table { headers, rows } => {
                    if layout_table(headers, rows, &mut out) {
                        tracing::warn!(
                            section = %section.title,
                            columns = headers.len(),
                            "table is wider than the page, rightmost columns are clipped"
                        );
                    }
                }
                Block::Note { text } => {
                    for l in wrap(text, NOTE_WRAP) {
                        out.push(Line::text(Font::Italic, 10, MARGIN_LEFT, l));
                    }
                }
            }
        }
    }
    out
}

fn paginate(lines: Vec<Line>) -> Vec<Vec<(i64, Run)>> {
    let mut pages = Vec::new();
    let mut page = Vec::new();
    let mut y = TOP;
    for line in lines {
        if y - line.height < BOTTOM {
            pages.push(std::mem::take(&mut page));
            y = TOP;
            // Gaps are dropped at the top of a page.
            if line.runs.is_empty() {
                continue;
            }
        }
        y -= line.height;
        for run in line.runs {
            page.push((y, run));
        }
    }
    pages.push(page);
    pages
}

fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7e | 0xa0..=0xff => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

fn text_ops(ops: &mut Vec<Operation>, font: Font, size: i64, x: i64, y: i64, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![font.resource().into(), Object::Integer(size)],
    ));
    ops.push(Operation::new(
        "Td",
        vec![Object::Integer(x), Object::Integer(y)],
    ));
    ops.push(Operation::new(
        "Tj",
        vec![Object::string_literal(encode_text(text))],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn render_err(e: impl std::fmt::Display) -> ReportError {
    ReportError::RenderError(e.to_string())
}

pub fn render_pdf(report: &GroupReport) -> Result<(Vec<u8>, usize), ReportError> {
    let pages = paginate(layout(report));
    let page_count = pages.len();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut font_dict = lopdf::Dictionary::new();
    for (font, base) in FONTS {
        let id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base,
            "Encoding" => "WinAnsiEncoding",
        });
        font_dict.set(font.resource(), id);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => font_dict,
    });

    let footer_label = format!("{}: {}", report.title, report.group);
    let mut kids: Vec<Object> = Vec::with_capacity(page_count);
    for (idx, runs) in pages.into_iter().enumerate() {
        let mut ops = Vec::new();
        for (y, run) in &runs {
            text_ops(&mut ops, run.font, run.size, run.x, *y, &run.text);
        }
        text_ops(&mut ops, Font::Regular, 8, MARGIN_LEFT, FOOTER_Y, &footer_label);
        text_ops(
            &mut ops,
            Font::Regular,
            8,
            PAGE_WIDTH - MARGIN_LEFT - 60,
            FOOTER_Y,
            &format!("Page {} of {}", idx + 1, page_count),
        );
        let content = Content { operations: ops };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().map_err(render_err)?,
        ));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(encode_text(&report.title)),
        "Subject" => Object::string_literal(encode_text(&format!(
            "{} {}",
            report.group,
            report.period.label()
        ))),
        "Producer" => Object::string_literal("group-report"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(render_err)?;
    Ok((bytes, page_count))
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

pub fn write_pdf(report: &GroupReport, path: &Path) -> Result<Rendered, ReportError> {
    let (bytes, pages) = render_pdf(report)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| ReportError::RenderError(format!("{}: {}", parent.display(), e)))?;
    }
    let partial = partial_path(path);
    let written = std::fs::write(&partial, &bytes).and_then(|_| std::fs::rename(&partial, path));
    if let Err(e) = written {
        let _ = std::fs::remove_file(&partial);
        return Err(ReportError::RenderError(format!("{}: {}", path.display(), e)));
    }

    let sha256 = hex::encode(Sha256::digest(&bytes));
    tracing::info!(path = %path.display(), bytes = bytes.len(), pages, "wrote report");
    Ok(Rendered {
        path: path.to_string_lossy().to_string(),
        bytes: bytes.len(),
        sha256,
        pages,
    })
}

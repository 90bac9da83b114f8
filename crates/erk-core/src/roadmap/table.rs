//! Line-level scanner for phase headings and markdown tables.
//!
//! The parser and the mutator both walk the document through [`scan`] so
//! they agree on which rows belong to the roadmap. Every row keeps the byte
//! offset of its line and the byte span of each cell, which is what lets the
//! mutator rewrite a single cell without touching anything around it.

use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// Number of columns in a roadmap table: step, description, status, pr.
pub const ROADMAP_COLUMNS: usize = 4;

static PHASE_HEADING_RE: OnceLock<Regex> = OnceLock::new();
static DELIMITER_CELL_RE: OnceLock<Regex> = OnceLock::new();

fn phase_heading_re() -> &'static Regex {
    PHASE_HEADING_RE.get_or_init(|| {
        Regex::new(r"^###\s+Phase\s+(\d+)([A-Za-z]*)\s*:\s*(.*?)\s*$").unwrap()
    })
}

fn delimiter_cell_re() -> &'static Regex {
    DELIMITER_CELL_RE.get_or_init(|| Regex::new(r"^:?-+:?$").unwrap())
}

// ---------------------------------------------------------------------------
// Lines and cells
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    pub index: usize,
    /// Byte offset of the first character of the line in the document.
    pub offset: usize,
    /// Line content without its terminator.
    pub text: &'a str,
}

/// Split into lines, remembering offsets. `\n` and `\r\n` terminators are
/// both stripped from `text` but counted in the offsets.
pub fn lines(doc: &str) -> Vec<Line<'_>> {
    let mut out = Vec::new();
    let mut offset = 0;
    for (index, raw) in doc.split_inclusive('\n').enumerate() {
        let text = raw
            .strip_suffix('\n')
            .map(|t| t.strip_suffix('\r').unwrap_or(t))
            .unwrap_or(raw);
        out.push(Line {
            index,
            offset,
            text,
        });
        offset += raw.len();
    }
    out
}

/// One table cell, as a byte span inside its line (pipes excluded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub span: Range<usize>,
}

impl Cell {
    pub fn raw<'a>(&self, line: &'a str) -> &'a str {
        &line[self.span.clone()]
    }

    /// Trimmed cell text with `\|` escapes resolved.
    pub fn text(&self, line: &str) -> String {
        self.raw(line).trim().replace("\\|", "|")
    }

    /// Span of the trimmed content, still relative to the line.
    pub fn content_span(&self, line: &str) -> Range<usize> {
        let raw = self.raw(line);
        let lead = raw.len() - raw.trim_start().len();
        let trimmed_len = raw.trim().len();
        let start = self.span.start + lead;
        start..start + trimmed_len
    }
}

/// Split a `| a | b |` line into cells. Returns `None` when the line is not
/// a table row. A missing trailing pipe is tolerated.
pub fn split_cells(line: &str) -> Option<Vec<Cell>> {
    let first = line.find(|c: char| !c.is_whitespace())?;
    if line.as_bytes()[first] != b'|' {
        return None;
    }

    let bytes = line.as_bytes();
    let mut cells = Vec::new();
    let mut start = first + 1;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if bytes.get(i + 1) == Some(&b'|') => i += 2,
            b'|' => {
                cells.push(Cell { span: start..i });
                start = i + 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    if !line[start..].trim().is_empty() {
        cells.push(Cell {
            span: start..line.len(),
        });
    }
    Some(cells)
}

fn is_delimiter_row(line: &str, cells: &[Cell]) -> bool {
    !cells.is_empty()
        && cells
            .iter()
            .all(|c| delimiter_cell_re().is_match(c.raw(line).trim()))
}

fn is_fence(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("```") || t.starts_with("~~~")
}

// ---------------------------------------------------------------------------
// Document scan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PhaseHeading {
    pub number: u32,
    pub suffix: String,
    pub name: String,
    pub line: usize,
}

/// A data row of a four-column table, or a row with the wrong cell count.
#[derive(Debug, Clone)]
pub struct ScannedRow<'a> {
    pub line: Line<'a>,
    pub cells: Vec<Cell>,
}

impl ScannedRow<'_> {
    pub fn is_well_formed(&self) -> bool {
        self.cells.len() == ROADMAP_COLUMNS
    }

    pub fn cell_text(&self, col: usize) -> String {
        self.cells
            .get(col)
            .map(|c| c.text(self.line.text))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct ScannedPhase<'a> {
    pub heading: PhaseHeading,
    pub tables: usize,
    pub rows: Vec<ScannedRow<'a>>,
}

/// Walk the document and collect every phase heading together with the
/// data rows of the four-column tables beneath it. Tables outside a phase,
/// tables with a different column count, and anything inside a fenced code
/// block are ignored.
pub fn scan(doc: &str) -> Vec<ScannedPhase<'_>> {
    let lines = lines(doc);
    let mut phases: Vec<ScannedPhase<'_>> = Vec::new();
    let mut in_fence = false;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if is_fence(line.text) {
            in_fence = !in_fence;
            i += 1;
            continue;
        }
        if in_fence {
            i += 1;
            continue;
        }

        if let Some(heading) = parse_heading(line) {
            phases.push(ScannedPhase {
                heading,
                tables: 0,
                rows: Vec::new(),
            });
            i += 1;
            continue;
        }

        let Some(header) = split_cells(line.text) else {
            i += 1;
            continue;
        };
        let delimiter = lines
            .get(i + 1)
            .and_then(|next| split_cells(next.text).map(|cells| (next, cells)));
        let Some((delim_line, delim_cells)) = delimiter else {
            i += 1;
            continue;
        };
        if !is_delimiter_row(delim_line.text, &delim_cells) {
            i += 1;
            continue;
        }

        // Header + delimiter found; consume the body rows.
        let mut j = i + 2;
        let mut body = Vec::new();
        while let Some(row_line) = lines.get(j) {
            match split_cells(row_line.text) {
                Some(cells) => body.push(ScannedRow {
                    line: *row_line,
                    cells,
                }),
                None => break,
            }
            j += 1;
        }

        if header.len() == ROADMAP_COLUMNS {
            if let Some(phase) = phases.last_mut() {
                phase.tables += 1;
                phase.rows.extend(body);
            }
        }
        i = j;
    }

    phases
}

fn parse_heading(line: Line<'_>) -> Option<PhaseHeading> {
    let caps = phase_heading_re().captures(line.text)?;
    let number = caps.get(1)?.as_str().parse::<u32>().ok()?;
    Some(PhaseHeading {
        number,
        suffix: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
        name: caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default(),
        line: line.index,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

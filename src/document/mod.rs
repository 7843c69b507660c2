//! Pipe-table documents
//!
//! A document is split into alternating text and table blocks. Joining every
//! block's lines with `\n` gives back the original text byte for byte, which
//! is what lets the line operations in [`lines`] rewrite one row and leave
//! everything else untouched.

use std::{fmt, sync::LazyLock};

use serde::Serialize;

mod config_block;
pub mod lines;

pub use config_block::{CONFIG_SIGNALS, load_configuration};

pub(crate) static ROW_LINE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^\|.*?\|$").unwrap());

pub(crate) static SEPARATOR_LINE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^\|\s*-[-\s|]*?-\s*\|$").unwrap());

/// Matching ignores a trailing `\r`; the line itself is kept verbatim.
fn without_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

pub(crate) fn is_row_line(line: &str) -> bool {
    ROW_LINE.is_match(without_cr(line))
}

pub(crate) fn is_separator_line(line: &str) -> bool {
    SEPARATOR_LINE.is_match(without_cr(line))
}

/// Split a pipe-delimited line into its cells.
///
/// Cells are returned verbatim, padding included. A `|` inside a cell is
/// always a boundary; there is no escaping.
pub fn split_cells(line: &str) -> Vec<String> {
    let line = without_cr(line);
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(str::to_owned).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Text,
    Table,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    kind: BlockKind,
    lines: Vec<String>,
}

impl Block {
    fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            lines: Vec::new(),
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_table(&self) -> bool {
        self.kind == BlockKind::Table
    }

    pub fn as_table(&self) -> Option<TableBlock<'_>> {
        self.is_table().then_some(TableBlock { lines: &self.lines })
    }
}

/// Header and rows of a table with cells trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawTableData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Same shape as `rows`, with cells exactly as written between the pipes.
    #[serde(skip)]
    pub source_rows: Vec<Vec<String>>,
}

/// A borrowed view over the lines of a table block.
///
/// Line 0 is the header, line 1 the separator, and logical row `r` lives at
/// line `r + 2`.
#[derive(Debug, Clone, Copy)]
pub struct TableBlock<'a> {
    lines: &'a [String],
}

impl<'a> TableBlock<'a> {
    pub fn lines(&self) -> &'a [String] {
        self.lines
    }

    pub fn header(&self) -> &'a str {
        &self.lines[0]
    }

    pub fn separator(&self) -> &'a str {
        &self.lines[1]
    }

    pub fn rows(&self) -> &'a [String] {
        &self.lines[2..]
    }

    pub fn row_count(&self) -> usize {
        self.lines.len() - 2
    }

    pub fn row(&self, index: usize) -> Option<&'a str> {
        self.rows().get(index).map(String::as_str)
    }

    pub fn column_names(&self) -> Vec<String> {
        split_cells(self.header())
            .into_iter()
            .map(|cell| cell.trim().to_owned())
            .collect()
    }

    /// Cells of every row, padded or truncated to the header width.
    pub fn raw_data(&self) -> RawTableData {
        let columns = self.column_names();
        let width = columns.len();
        let source_rows = self
            .rows()
            .iter()
            .map(|line| {
                let mut cells = split_cells(line);
                cells.resize(width, String::new());
                cells
            })
            .collect::<Vec<_>>();
        let rows = source_rows
            .iter()
            .map(|cells| cells.iter().map(|cell| cell.trim().to_owned()).collect())
            .collect();
        RawTableData {
            columns,
            rows,
            source_rows,
        }
    }
}

/// A parsed document: an owned, indexable sequence of blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn parse(src: &str) -> Self {
        let lines = src.split('\n').collect::<Vec<_>>();
        let mut blocks = Vec::new();
        let mut current = Block::new(BlockKind::Text);
        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            if current.is_table() {
                if is_row_line(line) {
                    current.lines.push(line.to_owned());
                    i += 1;
                    continue;
                }
                blocks.push(std::mem::replace(&mut current, Block::new(BlockKind::Text)));
            } else if is_row_line(line) && lines.get(i + 1).is_some_and(|next| is_separator_line(next))
            {
                let text = std::mem::replace(&mut current, Block::new(BlockKind::Table));
                if !text.lines.is_empty() {
                    blocks.push(text);
                }
                current.lines.push(line.to_owned());
                current.lines.push(lines[i + 1].to_owned());
                i += 2;
                continue;
            }
            current.lines.push(line.to_owned());
            i += 1;
        }
        blocks.push(current);
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn has_tables(&self) -> bool {
        self.blocks.iter().any(Block::is_table)
    }

    pub fn table_count(&self) -> usize {
        self.blocks.iter().filter(|block| block.is_table()).count()
    }

    pub fn tables(&self) -> impl Iterator<Item = TableBlock<'_>> {
        self.blocks.iter().filter_map(Block::as_table)
    }

    /// The `index`-th table block in document order.
    pub fn table(&self, index: usize) -> Option<TableBlock<'_>> {
        self.tables().nth(index)
    }

    /// Position in [`Self::blocks`] of the `index`-th table.
    pub fn table_block_index(&self, index: usize) -> Option<usize> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| block.is_table())
            .nth(index)
            .map(|(position, _)| position)
    }

    pub(crate) fn table_lines_mut(&mut self, index: usize) -> Option<&mut Vec<String>> {
        let position = self.table_block_index(index)?;
        Some(&mut self.blocks[position].lines)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for line in self.blocks.iter().flat_map(|block| block.lines.iter()) {
            if !first {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
            first = false;
        }
        Ok(())
    }
}

pub fn parse_document(src: &str) -> Document {
    Document::parse(src)
}

pub fn has_tables(src: &str) -> bool {
    Document::parse(src).has_tables()
}

//! Configuration blocks attached to tables
//!
//! A table is configured by a fenced YAML block right above it:
//!
//! ````text
//! ```yaml enhanced-tables
//! columns:
//!   Price:
//!     type: number
//! ```
//!
//! | Item | Price |
//! | ---- | ----- |
//! ````

use crate::{Error, config::Configuration};

use super::Document;

/// Opening fences that mark a configuration block.
pub const CONFIG_SIGNALS: [&str; 2] = ["```yaml enhanced-tables", "```yaml atc"];

fn is_signal(line: &str) -> bool {
    let line = line.trim();
    CONFIG_SIGNALS.iter().any(|signal| {
        line.strip_prefix(signal)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
    })
}

fn is_closing_fence(line: &str) -> bool {
    let line = line.trim();
    line.len() >= 3 && line.chars().all(|c| c == '`')
}

impl Document {
    /// YAML source of the configuration block attached to the `index`-th
    /// table, if any.
    ///
    /// Only blank lines may separate the closing fence from the table.
    pub fn configuration_source(&self, index: usize) -> Option<String> {
        let position = self.table_block_index(index)?;
        let text = self.blocks[..position].last()?;
        let mut lines = text
            .lines()
            .iter()
            .rev()
            .skip_while(|line| line.trim().is_empty());
        if !is_closing_fence(lines.next()?) {
            return None;
        }
        let mut body = Vec::new();
        for line in lines {
            if is_signal(line) {
                body.reverse();
                return Some(body.join("\n"));
            }
            if is_closing_fence(line) {
                return None;
            }
            body.push(line.strip_suffix('\r').unwrap_or(line));
        }
        None
    }
}

/// Parsed and validated configuration of the `index`-th table.
///
/// `None` when the table has no configuration block.
pub fn load_configuration(
    document: &Document,
    index: usize,
) -> Option<Result<Configuration, Error>> {
    let source = document.configuration_source(index)?;
    Some(Configuration::from_yaml(&source))
}

pub mod config;
pub mod document;
pub mod edit;
pub mod expr;
pub mod format;
pub mod project;
pub mod schema;
pub mod validate;
pub mod value;
pub mod view;

#[cfg(test)]
mod tests;

pub use config::Configuration;
pub use document::{
    Document, has_tables, load_configuration,
    lines::{insert_line, modify_header, modify_line, read_line, read_table_lines, remove_line},
    parse_document,
};
pub use edit::{EditInput, EditorKind, edit_cell, encode_edit, set_cell};
pub use format::{FormatContext, FormatterRegistry};
pub use project::{Pagination, Projection, RowQuery, SortSpec, project_rows};
pub use schema::{ResolvedColumn, resolve_columns};
pub use value::CellValue;
pub use view::TableView;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to parse YAML configuration: {0}")]
    ParseYaml(serde_yaml::Error),
    #[error("{0}")]
    Validation(validate::ValidationErrors),
    #[error("Failed to decode configuration: {0}")]
    Decode(serde_json::Error),
}

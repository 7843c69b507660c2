use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use enhanced_tables::{
    Configuration, Document, EditInput, FormatterRegistry, RowQuery, SortSpec, TableView,
    document::BlockKind, edit, insert_line, load_configuration, remove_line,
    schema::lookup_column,
};
use tracing::{error, info};
use unicode_width::UnicodeWidthStr;

#[derive(Parser)]
#[clap(version, about = "Typed views and edits of markdown tables")]
struct Opts {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the blocks of a document.
    Blocks { file: PathBuf },
    /// Print the rows of a table.
    Show(ShowOpts),
    /// Check a configuration file.
    Validate { config: PathBuf },
    /// Replace one cell.
    Set(SetOpts),
    /// Insert a row.
    Insert(RowOpts),
    /// Remove a row.
    Remove(RowOpts),
}

#[derive(Args)]
struct TableOpts {
    file: PathBuf,
    #[clap(short, long, default_value_t = 0)]
    table: usize,
    /// Configuration used instead of the block attached to the table.
    #[clap(short, long, env = "ENHANCED_TABLES_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct ShowOpts {
    #[clap(flatten)]
    table: TableOpts,
    /// Column alias, `-alias` for descending order.
    #[clap(long)]
    sort: Option<String>,
    #[clap(long)]
    filter: Option<String>,
    #[clap(long)]
    page: Option<usize>,
    #[clap(long)]
    page_size: Option<usize>,
    #[clap(long)]
    json: bool,
}

#[derive(Args)]
struct SetOpts {
    #[clap(flatten)]
    table: TableOpts,
    #[clap(short, long)]
    row: usize,
    /// Column alias or header text.
    #[clap(long)]
    column: String,
    value: String,
    #[clap(long)]
    dry_run: bool,
}

#[derive(Args)]
struct RowOpts {
    file: PathBuf,
    #[clap(short, long, default_value_t = 0)]
    table: usize,
    /// Logical row; `-1` is the last row.
    #[clap(short, long, allow_hyphen_values = true)]
    row: i64,
    values: Vec<String>,
    #[clap(long)]
    dry_run: bool,
}

fn read_document(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

fn read_configuration(path: &Path) -> anyhow::Result<Configuration> {
    let src = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Configuration::from_yaml(&src).with_context(|| format!("configuration {}", path.display()))
}

fn table_configuration(opts: &TableOpts, document: &Document) -> anyhow::Result<Configuration> {
    if let Some(path) = &opts.config {
        return read_configuration(path);
    }
    match load_configuration(document, opts.table) {
        Some(configuration) => configuration
            .with_context(|| format!("configuration block of table {}", opts.table)),
        None => Ok(Configuration::default()),
    }
}

fn write_document(path: &Path, before: &str, after: String, dry_run: bool) -> anyhow::Result<()> {
    if dry_run {
        print!("{after}");
        return Ok(());
    }
    if before == after {
        info!(path = %path.display(), "nothing changed");
        return Ok(());
    }
    std::fs::write(path, after).with_context(|| format!("write {}", path.display()))
}

fn print_table(header: &[&str], rows: &[Vec<&str>]) {
    let mut widths = header.iter().map(|cell| cell.width()).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }
    let line = |cells: &[&str]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell}{}", " ".repeat(width - cell.width())))
            .collect::<Vec<_>>()
            .join("  ")
    };
    println!("{}", line(header).trim_end());
    for row in rows {
        println!("{}", line(row).trim_end());
    }
}

fn show(opts: ShowOpts) -> anyhow::Result<()> {
    let src = read_document(&opts.table.file)?;
    let document = Document::parse(&src);
    let configuration = table_configuration(&opts.table, &document)?;
    let mut query = RowQuery::from_configuration(&configuration);
    if let Some(sort) = &opts.sort {
        query.sort = Some(sort.parse::<SortSpec>().with_context(|| "parse sort")?);
    }
    if let Some(filter) = opts.filter {
        query.filter = Some(filter);
    }
    if opts.page.is_some() || opts.page_size.is_some() {
        let mut pagination = query.pagination.take().unwrap_or_default();
        if let Some(page_size) = opts.page_size {
            pagination = pagination.with_page_size(page_size);
        }
        if let Some(page) = opts.page {
            pagination = pagination.with_page(page);
        }
        query.pagination = Some(pagination);
    }
    let view = TableView::build(
        &document,
        opts.table.table,
        &configuration,
        query,
        &FormatterRegistry::new(),
    )
    .ok_or_else(|| anyhow!("no table {} in {}", opts.table.table, opts.table.file.display()))?;
    let page = view.page();
    if opts.json {
        let json = serde_json::to_string_pretty(&page).with_context(|| "serialize rows")?;
        println!("{json}");
        return Ok(());
    }
    print_table(&page.columns, &page.rows);
    if let Some(pagination) = page.page {
        println!(
            "page {}/{} ({} rows)",
            pagination.page_number.max(1),
            page.page_count,
            page.total
        );
    }
    Ok(())
}

fn validate(path: &Path) -> anyhow::Result<()> {
    read_configuration(path)?;
    println!("{} is valid", path.display());
    Ok(())
}

fn set(opts: SetOpts) -> anyhow::Result<()> {
    let src = read_document(&opts.table.file)?;
    let document = Document::parse(&src);
    let configuration = table_configuration(&opts.table, &document)?;
    let registry = FormatterRegistry::new();
    let view = TableView::build_default(&document, opts.table.table, &configuration, &registry)
        .ok_or_else(|| anyhow!("no table {}", opts.table.table))?;
    let column = lookup_column(&view.columns, &opts.column)
        .ok_or_else(|| anyhow!("no column {}", opts.column))?;
    let input = EditInput::from_text(&column.editor(), &opts.value)
        .ok_or_else(|| anyhow!("{:?} is not a valid {:?} input", opts.value, column.editor()))?;
    let edited = edit::edit_cell(&src, opts.table.table, opts.row, column, &input)
        .ok_or_else(|| anyhow!("column {} rejects {:?}", column.name, opts.value))?;
    write_document(&opts.table.file, &src, edited, opts.dry_run)
}

fn insert(opts: RowOpts) -> anyhow::Result<()> {
    let src = read_document(&opts.file)?;
    let edited = insert_line(&src, opts.row, opts.values.as_slice(), opts.table);
    write_document(&opts.file, &src, edited, opts.dry_run)
}

fn remove(opts: RowOpts) -> anyhow::Result<()> {
    let src = read_document(&opts.file)?;
    let edited = remove_line(&src, opts.row, opts.table);
    write_document(&opts.file, &src, edited, opts.dry_run)
}

fn blocks(path: &Path) -> anyhow::Result<()> {
    let src = read_document(path)?;
    let document = Document::parse(&src);
    for (index, block) in document.blocks().iter().enumerate() {
        let kind = match block.kind() {
            BlockKind::Table => "table",
            BlockKind::Text => "text",
        };
        let first = block.lines().first().map(String::as_str).unwrap_or_default();
        println!("{index}\t{kind}\t{}\t{}", block.lines().len(), first.trim_end());
    }
    Ok(())
}

fn run(opts: Opts) -> anyhow::Result<()> {
    match opts.command {
        Command::Blocks { file } => blocks(&file),
        Command::Show(opts) => show(opts),
        Command::Validate { config } => validate(&config),
        Command::Set(opts) => set(opts),
        Command::Insert(opts) => insert(opts),
        Command::Remove(opts) => remove(opts),
    }
}

fn main() {
    let opts = Opts::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    if let Err(e) = run(opts) {
        error!(?e, "critical error");
        std::process::exit(1);
    }
}

//! Boekenbeheer CLI
//!
//! Command-line tool for listing, searching, editing and exporting the book list.

use boek_core::{
    apply_edits, distinct_values, open_store, render_catalog, Catalog, CatalogStats, Config,
    DataSource, Edit, EditFile, FieldValues, Filter, Role, Table, TableStore,
};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "boek")]
#[command(about = "Manage a personal book list", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file
    #[arg(short, long, global = true, default_value = "settings.json")]
    config: PathBuf,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Default)]
struct FilterArgs {
    /// Text to look for in any column (case-insensitive)
    #[arg(short, long)]
    query: Option<String>,

    /// Only books in this category
    #[arg(long)]
    category: Option<String>,

    /// Only books at this location
    #[arg(long)]
    location: Option<String>,
}

impl From<FilterArgs> for Filter {
    fn from(args: FilterArgs) -> Self {
        Filter {
            query: args.query,
            category: args.category,
            location: args.location,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a settings file
    InitConfig {
        /// Where the list lives (local or remote)
        #[arg(long, default_value = "local")]
        source: DataSource,

        /// CSV file for the local source
        #[arg(long)]
        data_path: Option<PathBuf>,

        /// Values endpoint for the remote source
        #[arg(long)]
        remote_url: Option<String>,

        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },

    /// Show which column plays which role
    Roles,

    /// Show totals per language, category and location
    Stats,

    /// List the known values for a role (language, category, location, ...)
    Options {
        #[arg(short, long)]
        role: Role,
    },

    /// List books, optionally filtered
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Maximum number of rows to display
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a single book
    Show {
        /// Exact title
        #[arg(short, long)]
        title: String,
    },

    /// Add a new book
    Add {
        /// Field values (column=value)
        #[arg(short, long = "set", value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,

        /// Only report books with a similar title, do not add
        #[arg(long)]
        check: bool,
    },

    /// Change fields of a book
    Edit {
        /// Exact title of the book to change
        #[arg(short, long)]
        title: String,

        /// Field values (column=value)
        #[arg(short, long = "set", value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,

        /// Fail on columns that do not exist
        #[arg(long)]
        strict: bool,
    },

    /// Delete a book permanently
    Delete {
        /// Exact title of the book to delete
        #[arg(short, long)]
        title: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Export the (filtered) list to PDF
    ExportPdf {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Heading shown above the table
        #[arg(long, default_value = "Huidige selectie")]
        heading: String,
    },

    /// Apply an edit file
    Apply {
        /// Path to edit file (JSON)
        #[arg(short, long)]
        edits: PathBuf,

        /// Fail edits that name columns that do not exist
        #[arg(long)]
        strict: bool,
    },

    /// Create an edit file template
    CreateEdits {
        /// Output path for the edit file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> boek_core::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    execute(cli)
}

fn execute(cli: Cli) -> boek_core::Result<()> {
    match cli.command {
        Commands::InitConfig {
            source,
            data_path,
            remote_url,
            force,
        } => cmd_init_config(&cli.config, source, data_path, remote_url, force),
        command => run_with_store(&cli.config, command),
    }
}

fn run_with_store(config_path: &Path, command: Commands) -> boek_core::Result<()> {
    let config = Config::load(config_path)?;
    let store = open_store(&config)?;
    info!("Using {}", store.describe());
    let store = store.as_ref();

    match command {
        Commands::InitConfig { .. } => unreachable!("init-config does not open a store"),
        Commands::Roles => cmd_roles(store),
        Commands::Stats => cmd_stats(store),
        Commands::Options { role } => cmd_options(store, role),
        Commands::List { filter, limit, json } => cmd_list(store, filter.into(), limit, json),
        Commands::Show { title } => cmd_show(store, &title),
        Commands::Add { fields, check } => {
            cmd_add(store, &config, to_field_values(fields), check)
        }
        Commands::Edit {
            title,
            fields,
            strict,
        } => cmd_edit(
            store,
            &title,
            to_field_values(fields),
            strict || config.strict_fields,
        ),
        Commands::Delete { title, yes } => cmd_delete(store, &title, yes),
        Commands::ExportPdf {
            filter,
            output,
            heading,
        } => cmd_export_pdf(store, filter.into(), &output, &heading),
        Commands::Apply { edits, strict } => cmd_apply(store, &edits, strict || config.strict_fields),
        Commands::CreateEdits { output } => cmd_create_edits(&output),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_init_config(
    path: &Path,
    source: DataSource,
    data_path: Option<PathBuf>,
    remote_url: Option<String>,
    force: bool,
) -> boek_core::Result<()> {
    if path.exists() && !force {
        println!("{} already exists, use --force to overwrite", path.display());
        return Ok(());
    }

    let defaults = Config::default();
    let config = Config {
        data_source: source,
        data_path: data_path.unwrap_or_else(|| defaults.data_path.clone()),
        remote_url: remote_url.unwrap_or_default(),
        ..defaults
    };
    config.save(path)?;

    println!("Created settings file: {}", path.display());
    match config.data_source {
        DataSource::Local => println!("Books are read from {}", config.data_path.display()),
        DataSource::Remote => {
            println!("Books are read from {}", config.remote_url);
            println!("Set {} to the access token for the sheet", config.remote_token_env);
        }
    }
    Ok(())
}

fn cmd_roles(store: &dyn TableStore) -> boek_core::Result<()> {
    let catalog = Catalog::open(store)?;

    println!("Columns: {}", catalog.table().column_names().join(", "));
    println!();
    for role in Role::ALL {
        let column = catalog.roles().get(role).unwrap_or("(none)");
        println!("  {:<10} {}", role, column);
    }
    Ok(())
}

fn cmd_stats(store: &dyn TableStore) -> boek_core::Result<()> {
    let catalog = Catalog::open(store)?;
    let stats = CatalogStats::compute(catalog.table(), catalog.roles());

    println!("Books:      {}", stats.total);
    println!("Languages:  {}", stats.languages);
    println!("Categories: {}", stats.categories);
    println!("Locations:  {}", stats.locations);
    Ok(())
}

fn cmd_options(store: &dyn TableStore, role: Role) -> boek_core::Result<()> {
    let catalog = Catalog::open(store)?;

    let Some(column) = catalog.roles().get(role) else {
        println!("No column for role '{}'", role);
        return Ok(());
    };
    for value in distinct_values(catalog.table(), column) {
        println!("{}", value);
    }
    Ok(())
}

fn cmd_list(
    store: &dyn TableStore,
    filter: Filter,
    limit: Option<usize>,
    json: bool,
) -> boek_core::Result<()> {
    let catalog = Catalog::open(store)?;
    let positions = filter.apply(catalog.table(), catalog.roles());

    if json {
        let selection = catalog.table().select(&positions);
        println!("{}", serde_json::to_string_pretty(&selection)?);
        return Ok(());
    }

    if positions.is_empty() {
        println!("No books found. Adjust the filters.");
        return Ok(());
    }

    print_rows(catalog.table(), &positions, limit);
    Ok(())
}

fn cmd_show(store: &dyn TableStore, title: &str) -> boek_core::Result<()> {
    let catalog = Catalog::open(store)?;
    let position = catalog
        .find_by_title(title)
        .ok_or_else(|| boek_core::Error::TitleNotFound(title.to_string()))?;

    print_record(catalog.table(), position);

    let duplicates = catalog.find_duplicates(title);
    if duplicates.len() > 1 {
        println!();
        println!("Note: {} books share this title (positions {:?})", duplicates.len(), duplicates);
    }
    Ok(())
}

fn cmd_add(
    store: &dyn TableStore,
    config: &Config,
    fields: FieldValues,
    check: bool,
) -> boek_core::Result<()> {
    let mut catalog = Catalog::open(store)?.with_strict_fields(config.strict_fields);

    let title = catalog
        .title_column()
        .and_then(|col| fields.get(col))
        .map(|t| t.trim().to_string())
        .unwrap_or_default();

    if !title.is_empty() {
        let matches = catalog.find_duplicates(&title);
        if !matches.is_empty() {
            println!("Warning: books with a similar title already exist:");
            print_rows(catalog.table(), &matches, None);
            println!();
        } else if check {
            println!("No books titled '{}' yet", title);
        }
    }

    if check {
        return Ok(());
    }

    let (position, ignored) = catalog.insert(&fields)?;
    if !ignored.is_empty() {
        println!("Warning: unknown column(s) skipped: {}", ignored.join(", "));
    }
    catalog.save(store)?;

    println!("Added book at position {}", position);
    print_record(catalog.table(), position);
    Ok(())
}

fn cmd_edit(
    store: &dyn TableStore,
    title: &str,
    fields: FieldValues,
    strict: bool,
) -> boek_core::Result<()> {
    let mut catalog = Catalog::open(store)?.with_strict_fields(strict);
    let position = catalog
        .find_by_title(title)
        .ok_or_else(|| boek_core::Error::TitleNotFound(title.to_string()))?;

    let ignored = catalog.update(position, &fields)?;
    if !ignored.is_empty() {
        println!("Warning: unknown column(s) skipped: {}", ignored.join(", "));
    }
    catalog.save(store)?;

    println!("Saved '{}'", catalog.title_of(position).unwrap_or(title));
    print_record(catalog.table(), position);
    Ok(())
}

fn cmd_delete(store: &dyn TableStore, title: &str, yes: bool) -> boek_core::Result<()> {
    let mut catalog = Catalog::open(store)?;
    let position = catalog
        .find_by_title(title)
        .ok_or_else(|| boek_core::Error::TitleNotFound(title.to_string()))?;

    if !yes {
        print_record(catalog.table(), position);
        println!();
        println!("Not deleted. Re-run with --yes to confirm.");
        return Ok(());
    }

    catalog.delete(position)?;
    catalog.save(store)?;
    println!("Deleted '{}' ({} books left)", title, catalog.len());
    Ok(())
}

fn cmd_export_pdf(
    store: &dyn TableStore,
    filter: Filter,
    output: &Path,
    heading: &str,
) -> boek_core::Result<()> {
    let catalog = Catalog::open(store)?;
    let positions = filter.apply(catalog.table(), catalog.roles());

    if positions.is_empty() {
        println!("No books found, nothing exported.");
        return Ok(());
    }

    let pdf = render_catalog(&catalog.table().select(&positions), heading);
    fs::write(output, pdf)?;

    println!("Exported {} books to {}", positions.len(), output.display());
    Ok(())
}

fn cmd_apply(store: &dyn TableStore, edits_path: &Path, strict: bool) -> boek_core::Result<()> {
    let file = EditFile::load(edits_path)?;
    println!("Loaded {} edits from {}", file.edits.len(), edits_path.display());

    let mut catalog = Catalog::open(store)?.with_strict_fields(strict);
    let result = apply_edits(&mut catalog, &file);

    if !result.failed.is_empty() {
        println!("\nWarning: {} edits could not be applied:", result.failed.len());
        for (edit, reason) in &result.failed {
            println!("  - {}: {}", edit.describe(&catalog), reason);
        }
    }

    if !result.ignored_fields.is_empty() {
        println!("\nUnknown columns skipped: {}", result.ignored_fields.join(", "));
    }

    if result.applied == 0 {
        println!("\nNothing to save.");
        return Ok(());
    }

    catalog.save(store)?;
    println!("\n{} edits applied, {} books in the list", result.applied, catalog.len());
    Ok(())
}

fn cmd_create_edits(output: &Path) -> boek_core::Result<()> {
    let mut file = EditFile::new();
    file.add_edit(Edit::Update {
        title: "Titel van het boek".to_string(),
        fields: FieldValues::from([("locatie".to_string(), "Nieuwe locatie".to_string())]),
    });
    file.add_edit(Edit::Insert {
        fields: FieldValues::from([
            ("titel".to_string(), "Nieuw boek".to_string()),
            ("schrijver".to_string(), "Naam".to_string()),
        ]),
    });

    file.save(output)?;
    println!("Created edit file: {}", output.display());
    println!();
    println!("Edit the file to add your changes, then run:");
    println!("  boek apply --edits {}", output.display());
    Ok(())
}

fn print_rows(table: &Table, positions: &[usize], limit: Option<usize>) {
    let mut header = vec!["#"];
    header.extend(table.column_names());
    println!("{}", header.join("\t"));
    println!("{}", "-".repeat(header.len() * 12));

    let row_limit = limit.unwrap_or(positions.len());
    for &p in positions.iter().take(row_limit) {
        if let Some(record) = table.get(p) {
            println!("{}\t{}", p, record.cells.join("\t"));
        }
    }

    if positions.len() > row_limit {
        println!("... ({} more rows)", positions.len() - row_limit);
    }
}

fn print_record(table: &Table, position: usize) {
    let Some(record) = table.get(position) else {
        return;
    };
    let width = table.columns.iter().map(|c| c.name.len()).max().unwrap_or(0);
    for column in &table.columns {
        let value = record.get(column.index).unwrap_or("");
        println!("  {:<width$}  {}", column.name, value, width = width);
    }
}

fn to_field_values(pairs: Vec<(String, String)>) -> FieldValues {
    pairs
        .into_iter()
        .map(|(k, v)| (k.trim().to_lowercase(), v))
        .collect()
}

/// Parse a `column=value` argument
fn parse_field(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid field '{}', expected column=value", s))?;
    if key.trim().is_empty() {
        return Err(format!("invalid field '{}', column name is empty", s));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

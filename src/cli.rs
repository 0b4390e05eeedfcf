use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import itineraries from a CSV export into the content store.
    Import(ImportArgs),
    /// Inspect and maintain the tag taxonomy.
    Tags {
        #[command(subcommand)]
        command: TagsCommand,
    },
    /// Move content between content store instances.
    Migrate {
        #[command(subcommand)]
        command: MigrateCommand,
    },
    /// Verify that the content store is reachable.
    Check(CheckArgs),
}

/// What to do when an itinerary with the same title already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DuplicatePolicy {
    /// Leave the existing itinerary alone and count the row as skipped.
    #[default]
    Skip,
    /// Delete the existing itinerary, then create the new one.
    Replace,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// CSV file to import.
    pub file: String,

    /// Content store base URL (default: $STRAPI_URL, then http://localhost:1337).
    pub base_url: Option<String>,

    /// Parse the CSV and print the assembled itineraries without writing anything.
    #[arg(short = 't', long)]
    pub test: bool,

    /// Rows to print in test mode.
    #[arg(long, default_value_t = 5)]
    pub max_test_rows: usize,

    /// Handling of rows whose title already exists in the store.
    #[arg(long, value_enum, default_value_t = DuplicatePolicy::Skip)]
    pub on_duplicate: DuplicatePolicy,
}

#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    /// Content store base URL (default: $STRAPI_URL, then http://localhost:1337).
    #[arg(long)]
    pub base_url: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum TagsCommand {
    /// List tags in display order.
    List(StoreArgs),
    /// Apply the default display order (requires STRAPI_API_TOKEN).
    Reorder(StoreArgs),
    /// Create tags from a JSON seed file, skipping names that already exist.
    Seed(TagSeedArgs),
}

#[derive(Debug, Args)]
pub struct TagSeedArgs {
    /// JSON array of `{ name, slug, description?, order? }` objects.
    #[arg(long)]
    pub file: String,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Export itineraries and page content from a store into JSON files.
    Export(MigrateExportArgs),
    /// Re-create exported itineraries on the production store.
    Import(MigrateImportArgs),
}

#[derive(Debug, Args)]
pub struct MigrateExportArgs {
    /// Store to export from (default: $STRAPI_URL, then http://localhost:1337).
    #[arg(long)]
    pub source: Option<String>,

    /// Output directory for exported JSON files.
    #[arg(long, default_value = "data-export")]
    pub out: String,
}

#[derive(Debug, Args)]
pub struct MigrateImportArgs {
    /// Directory written by `migrate export`.
    #[arg(long, default_value = "data-export")]
    pub dir: String,

    /// Target store (default: $PRODUCTION_STRAPI_URL).
    #[arg(long)]
    pub target: Option<String>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Also create and delete a throwaway draft itinerary.
    #[arg(long)]
    pub write_probe: bool,
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "shelf",
    about = "Shelf: JSON collections in plain files",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Storage root directory (overrides the config file)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add a record given as a JSON object
    Add(AddArgs),
    /// Show one record, or every record when no id is given
    Get(GetArgs),
    /// Overwrite existing fields of a record from a JSON object
    Update(UpdateArgs),
    /// Remove a record
    Remove(RecordArgs),
    /// Count records
    Count(CollectionArgs),
    /// Query records
    Find(FindArgs),
    /// Replace all records with the contents of a JSON file
    Sync(SyncArgs),
    /// List collections
    Collections,
    /// Delete every record of a collection
    Empty(CollectionArgs),
    /// Delete a collection and its storage
    Drop(CollectionArgs),
    /// Delete everything under the storage root
    Reset(ResetArgs),
}

#[derive(Args)]
pub struct CollectionArgs {
    pub collection: String,
}

#[derive(Args)]
pub struct AddArgs {
    pub collection: String,
    pub record: String,
}

#[derive(Args)]
pub struct GetArgs {
    pub collection: String,
    pub id: Option<String>,
    /// Whitespace-separated field names to keep
    #[arg(long)]
    pub fields: Option<String>,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub collection: String,
    pub id: String,
    pub patch: String,
}

#[derive(Args)]
pub struct RecordArgs {
    pub collection: String,
    pub id: String,
}

#[derive(Args)]
pub struct FindArgs {
    pub collection: String,
    /// Field equals a JSON value (bare words are strings)
    #[arg(long, value_name = "FIELD=VALUE", value_parser = parse_condition)]
    pub eq: Vec<(String, String)>,
    /// Field differs from a JSON value, or is missing
    #[arg(long, value_name = "FIELD=VALUE", value_parser = parse_condition)]
    pub ne: Vec<(String, String)>,
    #[arg(long, value_name = "FIELD=NUMBER", value_parser = parse_condition)]
    pub gt: Vec<(String, String)>,
    #[arg(long, value_name = "FIELD=NUMBER", value_parser = parse_condition)]
    pub gte: Vec<(String, String)>,
    #[arg(long, value_name = "FIELD=NUMBER", value_parser = parse_condition)]
    pub lt: Vec<(String, String)>,
    #[arg(long, value_name = "FIELD=NUMBER", value_parser = parse_condition)]
    pub lte: Vec<(String, String)>,
    /// Field matches a regular expression
    #[arg(long = "match", value_name = "FIELD=PATTERN", value_parser = parse_condition)]
    pub matches: Vec<(String, String)>,
    /// Match patterns without regard to case
    #[arg(short = 'i', long)]
    pub ignore_case: bool,
    /// Order by creation time: asc or desc
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long)]
    pub page_size: Option<usize>,
    /// 1-based page to show; all pages when omitted
    #[arg(long, requires = "page_size")]
    pub page: Option<usize>,
    /// Keep only the first match
    #[arg(long)]
    pub one: bool,
    /// Whitespace-separated field names to keep
    #[arg(long)]
    pub fields: Option<String>,
    /// Print every value stored under this key, at any depth
    #[arg(long, conflicts_with_all = ["page_size", "fields"])]
    pub pluck: Option<String>,
}

#[derive(Args)]
pub struct SyncArgs {
    pub collection: String,
    /// JSON file holding an array of records, each with an `_id`
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ResetArgs {
    /// Confirm that everything under the storage root may be deleted
    #[arg(long)]
    pub yes: bool,
}

fn parse_condition(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((field, value)) if !field.is_empty() => Ok((field.to_string(), value.to_string())),
        _ => Err(format!("expected FIELD=VALUE, got {s:?}")),
    }
}

use std::fs;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::Value;
use shelf_db::{Collection, Db, DbConfig, Page, Predicate, Projection, Record, SortOrder};
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let db = open_db(&cli)?;
    let out = Printer { format: cli.format };
    match cli.command {
        Command::Add(args) => cmd_add(&db, &out, args),
        Command::Get(args) => cmd_get(&db, &out, args),
        Command::Update(args) => cmd_update(&db, &out, args),
        Command::Remove(args) => cmd_remove(&db, &out, args),
        Command::Count(args) => {
            let count = existing(&db, &args.collection)?.count()?;
            out.value(&Value::from(count), || println!("{count}"));
            Ok(())
        }
        Command::Find(args) => cmd_find(&db, &out, args),
        Command::Sync(args) => cmd_sync(&db, &out, args),
        Command::Collections => {
            let names = db.collections()?;
            out.value(&Value::from(names.clone()), || {
                if names.is_empty() {
                    println!("No collections.");
                }
                for name in &names {
                    println!("{}", name.bold());
                }
            });
            Ok(())
        }
        Command::Empty(args) => {
            let done = db.empty_collection(&args.collection)?;
            out.status(done, || format!("Emptied {}", args.collection.yellow()));
            Ok(())
        }
        Command::Drop(args) => {
            let done = db.remove_collection(&args.collection)?;
            out.status(done, || format!("Dropped {}", args.collection.yellow()));
            Ok(())
        }
        Command::Reset(args) => {
            if !args.yes {
                bail!("reset deletes everything under the storage root; pass --yes to confirm");
            }
            db.reset()?;
            let root = db.storage_root()?;
            out.status(true, || format!("Reset {}", root.display().to_string().bold()));
            Ok(())
        }
    }
}

fn open_db(cli: &Cli) -> anyhow::Result<Db> {
    let mut config = match &cli.config {
        Some(path) => DbConfig::load(path)
            .with_context(|| format!("cannot load configuration {}", path.display()))?,
        None => DbConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.storage_root = root.clone();
    }
    debug!(?config, "resolved configuration");
    let root = config.storage_root.clone();
    Db::open(config).with_context(|| format!("cannot open storage root {}", root.display()))
}

/// A registered collection; reads never provision.
fn existing(db: &Db, name: &str) -> anyhow::Result<Arc<Collection>> {
    match db.get(name)? {
        Some(collection) => Ok(collection),
        None => bail!("no collection named {name:?}"),
    }
}

fn cmd_add(db: &Db, out: &Printer, args: AddArgs) -> anyhow::Result<()> {
    let record = parse_json(&args.record).context("record must be a JSON object")?;
    let collection = db.select(&args.collection, None)?;
    let id = collection.add(record)?;
    out.value(&Value::from(id.as_str()), || {
        println!("{} Added {} to {}", "✓".green().bold(), id.as_str().cyan(), collection.name().yellow());
    });
    Ok(())
}

fn cmd_get(db: &Db, out: &Printer, args: GetArgs) -> anyhow::Result<()> {
    let collection = existing(db, &args.collection)?;
    let projection = args.fields.as_deref().map(Projection::parse).unwrap_or_default();
    match &args.id {
        Some(id) => match collection.get(id, &projection)? {
            Some(record) => out.record(&record),
            None => bail!("no record {id} in {}", collection.name()),
        },
        None => {
            let records: Vec<Record> = collection.all()?.iter().map(|r| projection.apply(r)).collect();
            out.records(&records);
        }
    }
    Ok(())
}

fn cmd_update(db: &Db, out: &Printer, args: UpdateArgs) -> anyhow::Result<()> {
    let patch = parse_json(&args.patch).context("patch must be a JSON object")?;
    let collection = existing(db, &args.collection)?;
    match collection.update(&args.id, patch)? {
        Some(record) => out.record(&record),
        None => bail!("no record {} in {}", args.id, collection.name()),
    }
    Ok(())
}

fn cmd_remove(db: &Db, out: &Printer, args: RecordArgs) -> anyhow::Result<()> {
    let collection = existing(db, &args.collection)?;
    let removed = collection.remove(&args.id)?;
    out.status(removed.is_some(), || format!("Removed {}", args.id.cyan()));
    Ok(())
}

fn cmd_sync(db: &Db, out: &Printer, args: SyncArgs) -> anyhow::Result<()> {
    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let entries: Vec<Record> = serde_json::from_str(&text)
        .with_context(|| format!("{} must hold a JSON array of objects", args.file.display()))?;
    let collection = db.select(&args.collection, None)?;
    let written = collection.sync(entries)?;
    out.value(&Value::from(written), || {
        if written {
            println!("{} Synced {}", "✓".green().bold(), collection.name().yellow());
        } else {
            println!("{} already up to date", collection.name().yellow());
        }
    });
    Ok(())
}

fn cmd_find(db: &Db, out: &Printer, args: FindArgs) -> anyhow::Result<()> {
    let collection = existing(db, &args.collection)?;
    let mut finder = collection.find()?;

    for (field, value) in &args.eq {
        finder = finder.equals(field, condition_value(value));
    }
    for (field, value) in &args.ne {
        finder = finder.not_equal(field, condition_value(value));
    }
    for (field, value) in &args.gt {
        finder = finder.greater_than(field, condition_number(field, value)?);
    }
    for (field, value) in &args.gte {
        finder = finder.greater_or_equal(field, condition_number(field, value)?);
    }
    for (field, value) in &args.lt {
        finder = finder.less_than(field, condition_number(field, value)?);
    }
    for (field, value) in &args.lte {
        finder = finder.less_or_equal(field, condition_number(field, value)?);
    }
    for (field, pattern) in &args.matches {
        finder = finder.apply(&Predicate::pattern(field.as_str(), pattern, args.ignore_case)?);
    }
    if args.one {
        finder = finder.one();
    }
    debug!(collection = collection.name(), ?finder, "query built");

    if let Some(key) = &args.pluck {
        out.values(&finder.pluck_deep(key));
        return Ok(());
    }

    let sort = args.sort.as_deref().map(SortOrder::from);
    let projection = args.fields.as_deref().map(Projection::parse).unwrap_or_default();

    let Some(per_page) = args.page_size else {
        if let Some(order) = sort {
            finder = finder.sort_by_ts(order);
        }
        out.records(&finder.run_projected(&projection));
        return Ok(());
    };

    let pages: Vec<Page<Record>> = finder
        .paginate(per_page, sort)?
        .into_iter()
        .map(|page| Page {
            items: page.items.iter().map(|r| projection.apply(r)).collect(),
            ..page
        })
        .collect();

    match args.page {
        Some(n) => match n.checked_sub(1).and_then(|i| pages.get(i)) {
            Some(page) => out.page(page, pages.len()),
            None => bail!("page {n} out of range, {} page(s)", pages.len()),
        },
        None => {
            if pages.is_empty() {
                out.records(&[]);
            }
            for page in &pages {
                out.page(page, pages.len());
            }
        }
    }
    Ok(())
}

fn parse_json(text: &str) -> anyhow::Result<Value> {
    let value: Value = serde_json::from_str(text)?;
    if !value.is_object() {
        bail!("expected a JSON object");
    }
    Ok(value)
}

/// JSON if it parses, otherwise the raw text as a string.
fn condition_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn condition_number(field: &str, raw: &str) -> anyhow::Result<f64> {
    raw.parse()
        .with_context(|| format!("bound for {field} must be a number, got {raw:?}"))
}

struct Printer {
    format: OutputFormat,
}

impl Printer {
    /// Print `value` as JSON, or run `text` in text mode.
    fn value(&self, value: &Value, text: impl FnOnce()) {
        match self.format {
            OutputFormat::Json => println!("{value}"),
            OutputFormat::Text => text(),
        }
    }

    fn status(&self, done: bool, message: impl FnOnce() -> String) {
        self.value(&Value::from(done), || {
            if done {
                println!("{} {}", "✓".green().bold(), message());
            } else {
                println!("{} nothing to do", "-".dimmed());
            }
        });
    }

    fn record(&self, record: &Record) {
        match self.format {
            OutputFormat::Json => println!("{}", Value::Object(record.clone())),
            OutputFormat::Text => print_record(record),
        }
    }

    fn records(&self, records: &[Record]) {
        match self.format {
            OutputFormat::Json => println!("{}", Value::from(records.to_vec())),
            OutputFormat::Text => {
                if records.is_empty() {
                    println!("No records.");
                }
                for record in records {
                    print_record(record);
                }
            }
        }
    }

    fn values(&self, values: &[Value]) {
        match self.format {
            OutputFormat::Json => println!("{}", Value::from(values.to_vec())),
            OutputFormat::Text => values.iter().for_each(|v| println!("{v}")),
        }
    }

    fn page(&self, page: &Page<Record>, pages: usize) {
        match self.format {
            OutputFormat::Json => match serde_json::to_string(page) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("cannot encode page: {e}"),
            },
            OutputFormat::Text => {
                println!(
                    "{} {}/{}  (items {}-{} of {})",
                    "Page".bold(),
                    page.number(),
                    pages,
                    page.start,
                    page.end,
                    page.total
                );
                for record in &page.items {
                    print_record(record);
                }
            }
        }
    }
}

fn print_record(record: &Record) {
    let id = record.get("_id").and_then(Value::as_str).unwrap_or("-");
    println!("{}", id.cyan().bold());
    for (key, value) in record.iter().filter(|(k, _)| !k.starts_with('_')) {
        println!("  {}: {}", key.bold(), value);
    }
}

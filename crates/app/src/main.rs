//! group-former: form student groups from a roster.
//!
//! Thin driver over `group-former-core`: reads a roster, checks the request,
//! partitions, prints the groups and their statistics, and records the
//! formation in the history store.

mod config;
mod input_gen;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use config::{
    apply_config_set, Cli, Command, ConfigCommand, DataCommand, FormArgs, FormConfig, HistoryCommand, RosterSource,
};
use group_former_core::export::{suggested_file_name, to_csv, to_text, to_xlsx, ExportKind};
use group_former_core::normalize::{find_duplicates, normalize_text, CsvRoster, DuplicateInfo};
use group_former_core::qr::QrPayload;
use group_former_core::stats::HistorySummary;
use group_former_core::{
    partition, AppConfig, DisplayFormat, Group, GroupStats, HistoryEntry, PartitionRequest, Store, Student,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let store = Store::new(&cli.data_dir);

    match cli.command {
        Command::Form(args) => run_form(&store, args),
        Command::History(cmd) => run_history(&store, cmd),
        Command::Config(cmd) => run_config(&store, cmd),
        Command::Data(cmd) => run_data(&store, cmd),
        Command::Sample { out, count, seed } => {
            input_gen::write_roster_file(&out, seed, count)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Wrote {count} students to {} (seed {seed})", out.display());
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("failed to install tracing subscriber")
}

// === form ===

fn run_form(store: &Store, args: FormArgs) -> Result<()> {
    let print_config = args.print_config;
    let cfg = FormConfig::resolve(args, &store.load_config());
    if print_config {
        cfg.print();
    }

    let students = load_roster(&cfg.source)?;

    let request = PartitionRequest {
        students,
        group_size: cfg.group_size,
        method: cfg.method,
        redistribute_singles: cfg.redistribute_singles,
        allow_larger_groups: cfg.allow_larger_groups,
        seed: cfg.seed,
    };
    request.validate()?;

    let groups = partition(&request);
    println!("{}", to_text(&groups, cfg.display));
    GroupStats::from_groups(&groups).print_summary();

    if let Some((kind, out)) = &cfg.export {
        let path = write_export(&groups, *kind, out.as_deref())?;
        println!("Exported to {}", path.display());
    }

    if cfg.save {
        let entry = HistoryEntry::new(&request, groups, &cfg.description);
        let description = entry.description.clone();
        store
            .try_append_entry(entry)
            .with_context(|| format!("could not save history to {}", store.history_path().display()))?;
        info!(description = %description, "formation saved");
    }

    Ok(())
}

fn load_roster(source: &RosterSource) -> Result<Vec<Student>> {
    match source {
        RosterSource::Text(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
            let input = normalize_text(&text);
            for err in &input.errors {
                warn!(line = err.line_number, content = %err.raw_content, "skipped line: {}", err.reason);
            }
            report_duplicates(&input.duplicates);
            Ok(input.students)
        }
        RosterSource::Csv {
            path,
            id_column,
            name_column,
        } => {
            let file = fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            let roster = CsvRoster::from_reader(file)?;

            let report = roster.validate(id_column, name_column);
            for message in report.messages() {
                warn!("{message}");
            }

            let students = roster.students(id_column, name_column)?;
            let dropped = roster.row_count() - students.len();
            if dropped > 0 {
                warn!(dropped, "dropped rows with an empty id or name");
            }
            report_duplicates(&find_duplicates(&students));
            Ok(students)
        }
        RosterSource::Sample { seed, size } => {
            info!(seed, size, "no roster given; using a generated sample");
            Ok(input_gen::generate_roster(*seed, *size))
        }
    }
}

fn report_duplicates(duplicates: &BTreeMap<String, DuplicateInfo>) {
    for (id, info) in duplicates {
        warn!(id = %id, count = info.count, names = ?info.names, "duplicate student id");
    }
}

fn write_export(groups: &[Group], kind: ExportKind, out: Option<&Path>) -> Result<PathBuf> {
    let bytes = match kind {
        ExportKind::Csv => to_csv(groups)?,
        ExportKind::Xlsx => to_xlsx(groups)?,
        ExportKind::Text => to_text(groups, DisplayFormat::Full).into_bytes(),
        ExportKind::QrSvg => QrPayload::for_all(groups).render_svg()?.svg.into_bytes(),
        ExportKind::QrJson => QrPayload::for_all(groups).to_json()?.into_bytes(),
    };

    let path = match out {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(suggested_file_name(kind, Local::now().naive_local())),
    };
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

// === history ===

fn run_history(store: &Store, cmd: HistoryCommand) -> Result<()> {
    match cmd {
        HistoryCommand::List => {
            let entries = store.load_history();
            if entries.is_empty() {
                println!("No saved formations.");
                return Ok(());
            }

            for (i, entry) in entries.iter().enumerate() {
                println!(
                    "{:>3}. {} - {} ({} grupos, {} estudantes, {}, tamanho {})",
                    i + 1,
                    entry.timestamp,
                    entry.description,
                    entry.groups.len(),
                    entry.original_students.len(),
                    entry.method,
                    entry.group_size,
                );
            }

            let summary = HistorySummary::from_entries(&entries);
            println!();
            println!("Formations: {}", summary.formations);
            println!("Groups formed: {}", summary.total_groups);
            println!("Students grouped: {}", summary.total_students);
            println!("Distinct students: {}", summary.unique_students);
        }
        HistoryCommand::Show { number } => {
            let entries = store.load_history();
            let Some(entry) = number.checked_sub(1).and_then(|i| entries.get(i)) else {
                bail!("no formation number {number} (have {})", entries.len());
            };

            println!("{} - {}", entry.timestamp, entry.description);
            println!("Method: {}, target size: {}", entry.method, entry.group_size);
            println!();
            println!("{}", to_text(&entry.groups, DisplayFormat::Full));
            entry.stats().print_summary();
        }
        HistoryCommand::Remove { number } => {
            let Some(index) = number.checked_sub(1) else {
                bail!("formation numbers start at 1");
            };
            let removed = store.try_remove_entry(index)?;
            println!("Removed: {} - {}", removed.timestamp, removed.description);
        }
        HistoryCommand::Clear => {
            if !store.clear_history() {
                bail!("could not clear {}", store.history_path().display());
            }
            println!("History cleared.");
        }
    }
    Ok(())
}

// === config ===

fn run_config(store: &Store, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => print_app_config(&store.load_config()),
        ConfigCommand::Set(args) => {
            let updated = apply_config_set(args, store.load_config());
            if updated.group_size < 2 {
                bail!("group size must be at least 2, got {}", updated.group_size);
            }
            if !store.save_config(&updated) {
                bail!("could not save {}", store.config_path().display());
            }
            print_app_config(&updated);
        }
    }
    Ok(())
}

fn print_app_config(cfg: &AppConfig) {
    println!("=== Defaults ===");
    println!("Group size: {}", cfg.group_size);
    println!("Method: {}", cfg.method);
    println!("Redistribute lone students: {}", cfg.redistribute_singles);
    println!("Allow larger groups: {}", cfg.allow_larger_groups);
    println!("Show animation: {}", cfg.show_animation);
    println!("Theme: {}", cfg.theme);
}

// === data ===

fn run_data(store: &Store, cmd: DataCommand) -> Result<()> {
    match cmd {
        DataCommand::Export { name } => match store.export_all(name.as_deref()) {
            Some(path) => println!("Exported to {}", path.display()),
            None => bail!("export failed"),
        },
        DataCommand::Import { path } => {
            let outcome = store.import_all(&path);
            if !outcome.success {
                bail!(outcome.message);
            }
            println!("{}", outcome.message);
        }
        DataCommand::Reset => {
            if !store.reset_all() {
                bail!("could not reset {}", store.root().display());
            }
            println!("History and defaults deleted.");
        }
    }
    Ok(())
}

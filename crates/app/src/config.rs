//! Command-line configuration for the group-former application.
//!
//! Options given on the command line override the defaults persisted in the
//! data directory, which in turn fall back to built-in defaults.
//!
//! # Philosophy
//!
//! `group-former form` works with ZERO arguments: with no roster given it
//! generates a sample class from a seed, and prints that seed so the run
//! can be reproduced.

use clap::{Args, Parser, Subcommand, ValueEnum};
use group_former_core::config::Theme;
use group_former_core::export::ExportKind;
use group_former_core::{AppConfig, DisplayFormat, Method};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "group-former", version, about = "Form student groups from a roster")]
pub struct Cli {
    /// Data directory holding history.json, config.json and backups/
    #[arg(long, global = true, default_value = "./data", value_name = "DIR")]
    pub data_dir: PathBuf,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Form groups from a roster and save them to history
    Form(FormArgs),

    /// Inspect or edit saved formations
    #[command(subcommand)]
    History(HistoryCommand),

    /// Show or change the persisted defaults
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Export, import or reset all saved data
    #[command(subcommand)]
    Data(DataCommand),

    /// Write a generated sample roster to a file
    Sample {
        /// Destination file
        out: PathBuf,
        #[arg(long, default_value_t = 24)]
        count: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[derive(Debug, Args)]
pub struct FormArgs {
    /// Roster text file, one "id, name" or "id name" per line
    #[arg(long = "in", value_name = "PATH", conflicts_with = "csv")]
    pub input: Option<PathBuf>,

    /// Roster CSV file with a header row
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// CSV column holding the student id
    #[arg(long, default_value = "Matricula")]
    pub id_column: String,

    /// CSV column holding the student name
    #[arg(long, default_value = "Nome")]
    pub name_column: String,

    /// Students in the generated sample roster when no roster is given
    #[arg(long, default_value_t = 24)]
    pub sample_size: usize,

    /// Target students per group
    #[arg(short = 's', long = "size")]
    pub group_size: Option<usize>,

    #[arg(short, long, value_enum)]
    pub method: Option<MethodArg>,

    /// Seed for random ordering and the sample roster
    #[arg(long)]
    pub seed: Option<u64>,

    /// Move a student left alone into the smallest group
    #[arg(long, overrides_with = "no_redistribute")]
    pub redistribute: bool,

    /// Keep students who end up alone in their own group
    #[arg(long, overrides_with = "redistribute")]
    pub no_redistribute: bool,

    /// Let redistribution grow a group past the target size
    #[arg(long, overrides_with = "no_larger")]
    pub allow_larger: bool,

    /// Never grow a group past the target size when redistributing
    #[arg(long, overrides_with = "allow_larger")]
    pub no_larger: bool,

    /// Description stored with the history entry
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// How students are printed
    #[arg(long, value_enum, default_value_t = DisplayArg::Full)]
    pub display: DisplayArg,

    /// Also write the groups in this format
    #[arg(long, value_enum)]
    pub export: Option<ExportArg>,

    /// Export destination (default: a timestamped name in the current directory)
    #[arg(long, value_name = "PATH", requires = "export")]
    pub out: Option<PathBuf>,

    /// Do not append the result to history
    #[arg(long)]
    pub no_save: bool,

    /// Print the resolved configuration
    #[arg(long)]
    pub print_config: bool,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List saved formations, most recent first
    List,
    /// Print the groups of one formation (1 = most recent)
    Show { number: usize },
    /// Delete one formation (1 = most recent)
    Remove { number: usize },
    /// Delete all formations
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the persisted defaults
    Show,
    /// Change persisted defaults; unspecified values are kept
    Set(ConfigSetArgs),
}

#[derive(Debug, Args)]
pub struct ConfigSetArgs {
    #[arg(short = 's', long = "size")]
    pub group_size: Option<usize>,
    #[arg(short, long, value_enum)]
    pub method: Option<MethodArg>,
    #[arg(long)]
    pub redistribute: Option<bool>,
    #[arg(long)]
    pub allow_larger: Option<bool>,
    #[arg(long)]
    pub animation: Option<bool>,
    #[arg(long, value_enum)]
    pub theme: Option<ThemeArg>,
}

#[derive(Debug, Subcommand)]
pub enum DataCommand {
    /// Write history and defaults into one JSON file in the data directory
    Export {
        #[arg(long)]
        name: Option<String>,
    },
    /// Replace history and defaults from an exported file
    Import { path: PathBuf },
    /// Delete history and defaults
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    Random,
    Sequential,
    Balanced,
}

impl From<MethodArg> for Method {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Random => Method::Random,
            MethodArg::Sequential => Method::Sequential,
            MethodArg::Balanced => Method::Balanced,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DisplayArg {
    Full,
    Name,
    Id,
}

impl From<DisplayArg> for DisplayFormat {
    fn from(arg: DisplayArg) -> Self {
        match arg {
            DisplayArg::Full => DisplayFormat::Full,
            DisplayArg::Name => DisplayFormat::NameOnly,
            DisplayArg::Id => DisplayFormat::IdOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportArg {
    Csv,
    Xlsx,
    Txt,
    /// One SVG code holding every group
    QrSvg,
    /// The JSON payload of the all-groups code
    QrJson,
}

impl From<ExportArg> for ExportKind {
    fn from(arg: ExportArg) -> Self {
        match arg {
            ExportArg::Csv => ExportKind::Csv,
            ExportArg::Xlsx => ExportKind::Xlsx,
            ExportArg::Txt => ExportKind::Text,
            ExportArg::QrSvg => ExportKind::QrSvg,
            ExportArg::QrJson => ExportKind::QrJson,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Default,
    Light,
    Dark,
    Blue,
    Green,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Default => Theme::Default,
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Blue => Theme::Blue,
            ThemeArg::Green => Theme::Green,
        }
    }
}

/// Where the roster comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterSource {
    Text(PathBuf),
    Csv {
        path: PathBuf,
        id_column: String,
        name_column: String,
    },
    Sample { seed: u64, size: usize },
}

/// Fully resolved settings for one `form` run.
#[derive(Debug, Clone)]
pub struct FormConfig {
    pub source: RosterSource,
    pub group_size: usize,
    pub method: Method,
    pub redistribute_singles: bool,
    pub allow_larger_groups: bool,
    pub seed: Option<u64>,
    pub description: String,
    pub display: DisplayFormat,
    pub export: Option<(ExportKind, Option<PathBuf>)>,
    pub save: bool,
}

impl FormConfig {
    /// Layer command-line options over persisted defaults.
    pub fn resolve(args: FormArgs, defaults: &AppConfig) -> Self {
        let source = match (args.input, args.csv) {
            (Some(path), _) => RosterSource::Text(path),
            (None, Some(path)) => RosterSource::Csv {
                path,
                id_column: args.id_column,
                name_column: args.name_column,
            },
            (None, None) => RosterSource::Sample {
                seed: args.seed.unwrap_or_else(time_seed),
                size: args.sample_size,
            },
        };

        Self {
            source,
            group_size: args.group_size.unwrap_or(defaults.group_size),
            method: args.method.map(Method::from).unwrap_or(defaults.method),
            redistribute_singles: toggle(args.redistribute, args.no_redistribute, defaults.redistribute_singles),
            allow_larger_groups: toggle(args.allow_larger, args.no_larger, defaults.allow_larger_groups),
            seed: args.seed,
            description: args.description,
            display: args.display.into(),
            export: args.export.map(|kind| (kind.into(), args.out)),
            save: !args.no_save,
        }
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Configuration ===");
        match &self.source {
            RosterSource::Text(path) => println!("Roster: {}", path.display()),
            RosterSource::Csv {
                path,
                id_column,
                name_column,
            } => println!("Roster: {} (id: {id_column}, name: {name_column})", path.display()),
            RosterSource::Sample { seed, size } => println!("Roster: sample of {size} (seed {seed})"),
        }
        println!("Group size: {}", self.group_size);
        println!("Method: {}", self.method);
        match self.seed {
            Some(seed) => println!("Seed: {seed}"),
            None => println!("Seed: (none)"),
        }
        println!("Redistribute lone students: {}", self.redistribute_singles);
        println!("Allow larger groups: {}", self.allow_larger_groups);
        println!();
    }
}

/// Apply `config set` changes to the persisted defaults.
pub fn apply_config_set(args: ConfigSetArgs, mut config: AppConfig) -> AppConfig {
    if let Some(size) = args.group_size {
        config.group_size = size;
    }
    if let Some(method) = args.method {
        config.method = method.into();
    }
    if let Some(v) = args.redistribute {
        config.redistribute_singles = v;
    }
    if let Some(v) = args.allow_larger {
        config.allow_larger_groups = v;
    }
    if let Some(v) = args.animation {
        config.show_animation = v;
    }
    if let Some(theme) = args.theme {
        config.theme = theme.into();
    }
    config
}

/// Resolve an on/off flag pair against a persisted default.
fn toggle(on: bool, off: bool, default: bool) -> bool {
    match (on, off) {
        (true, _) => true,
        (_, true) => false,
        _ => default,
    }
}

fn time_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("group-former").chain(args.iter().copied())).unwrap()
    }

    fn form_args(args: &[&str]) -> FormArgs {
        let mut full = vec!["form"];
        full.extend_from_slice(args);
        match parse(&full).command {
            Command::Form(args) => args,
            other => panic!("expected form, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_args_uses_sample_and_defaults() {
        let cfg = FormConfig::resolve(form_args(&["--seed", "42"]), &AppConfig::default());

        assert_eq!(cfg.source, RosterSource::Sample { seed: 42, size: 24 });
        assert_eq!(cfg.group_size, 3);
        assert_eq!(cfg.method, Method::Random);
        assert!(cfg.redistribute_singles);
        assert!(cfg.allow_larger_groups);
        assert!(cfg.save);
    }

    #[test]
    fn test_flags_override_persisted_defaults() {
        let defaults = AppConfig {
            group_size: 5,
            method: Method::Balanced,
            ..AppConfig::default()
        };
        let cfg = FormConfig::resolve(
            form_args(&["--in", "roster.txt", "-s", "4", "-m", "sequential", "--no-larger"]),
            &defaults,
        );

        assert_eq!(cfg.source, RosterSource::Text(PathBuf::from("roster.txt")));
        assert_eq!(cfg.group_size, 4);
        assert_eq!(cfg.method, Method::Sequential);
        assert!(!cfg.allow_larger_groups);
    }

    #[test]
    fn test_flags_reenable_disabled_defaults() {
        let defaults = AppConfig {
            redistribute_singles: false,
            allow_larger_groups: false,
            ..AppConfig::default()
        };

        let kept = FormConfig::resolve(form_args(&["--seed", "1"]), &defaults);
        assert!(!kept.redistribute_singles);
        assert!(!kept.allow_larger_groups);

        let cfg = FormConfig::resolve(form_args(&["--redistribute", "--allow-larger"]), &defaults);
        assert!(cfg.redistribute_singles);
        assert!(cfg.allow_larger_groups);

        let last_wins = FormConfig::resolve(form_args(&["--redistribute", "--no-redistribute"]), &AppConfig::default());
        assert!(!last_wins.redistribute_singles);
    }

    #[test]
    fn test_csv_source() {
        let cfg = FormConfig::resolve(
            form_args(&["--csv", "turma.csv", "--id-column", "RA"]),
            &AppConfig::default(),
        );
        assert_eq!(
            cfg.source,
            RosterSource::Csv {
                path: PathBuf::from("turma.csv"),
                id_column: "RA".to_string(),
                name_column: "Nome".to_string(),
            }
        );
    }

    #[test]
    fn test_in_conflicts_with_csv() {
        let result = Cli::try_parse_from(["group-former", "form", "--in", "a.txt", "--csv", "b.csv"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_set_keeps_unspecified() {
        let cli = parse(&["config", "set", "--size", "6", "--theme", "dark"]);
        let Command::Config(ConfigCommand::Set(args)) = cli.command else {
            panic!("expected config set");
        };
        let updated = apply_config_set(args, AppConfig::default());

        assert_eq!(updated.group_size, 6);
        assert_eq!(updated.theme, Theme::Dark);
        assert_eq!(updated.method, Method::Random);
    }
}

//! Flat-file persistence for formation history and settings.
//!
//! A [`Store`] owns one data directory:
//!
//! ```text
//! <root>/history.json     {lastUpdated, version, count, entries[]}
//! <root>/config.json      {lastUpdated, version, config{...}}
//! <root>/backups/         history_<timestamp>.json, newest 10 kept
//! ```
//!
//! Documents are read and rewritten whole. Each write goes to a temporary
//! file that is then renamed over the target, so readers never see a torn
//! document. A save touching several documents stages all of them before
//! renaming any, and puts back the previous contents if a later rename
//! fails. Two processes saving at once is not coordinated: the last writer
//! wins.
//!
//! # Failure reporting
//!
//! The `try_*` methods return [`Result`]. The plain methods are the
//! boundary used by front ends: they log the failure and fall back to an
//! empty or default document, or report `false`.

use crate::config::AppConfig;
use crate::error::{Result, StoreError};
use crate::export::sanitize_file_name;
use crate::partition::{Method, PartitionRequest};
use crate::stats::GroupStats;
use crate::student::{GroupSet, Student};
use chrono::Local;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Version tag written into every document.
pub const DOCUMENT_VERSION: &str = "2.0";

/// Number of history backups retained.
pub const MAX_BACKUPS: usize = 10;

const HISTORY_FILE: &str = "history.json";
const CONFIG_FILE: &str = "config.json";
const BACKUP_DIR: &str = "backups";
const BACKUP_PREFIX: &str = "history_";

/// One saved formation. Entries are never edited once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Local time of formation, `dd/mm/yyyy HH:MM`
    pub timestamp: String,
    pub description: String,
    #[serde(rename = "groupSet")]
    pub groups: GroupSet,
    /// Roster in the order it was supplied
    pub original_students: Vec<Student>,
    pub group_size: usize,
    pub method: Method,
}

impl HistoryEntry {
    /// Record a completed partition. A blank description becomes
    /// `"Grupos de <group size>"`.
    pub fn new(request: &PartitionRequest, groups: GroupSet, description: &str) -> Self {
        let description = match description.trim() {
            "" => format!("Grupos de {}", request.group_size),
            d => d.to_string(),
        };

        Self {
            timestamp: Local::now().format("%d/%m/%Y %H:%M").to_string(),
            description,
            groups,
            original_students: request.students.clone(),
            group_size: request.group_size,
            method: request.method,
        }
    }

    pub fn stats(&self) -> GroupStats {
        GroupStats::from_groups(&self.groups)
    }
}

/// On-disk history document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDocument {
    pub last_updated: String,
    pub version: String,
    pub count: usize,
    #[serde(default)]
    pub entries: Vec<HistoryEntry>,
}

/// On-disk settings document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    pub last_updated: String,
    pub version: String,
    #[serde(default)]
    pub config: AppConfig,
}

/// Full dump of history and settings, used by export and import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub export_date: String,
    pub version: String,
    #[serde(default)]
    pub history: Option<Vec<HistoryEntry>>,
    #[serde(default)]
    pub config: Option<AppConfig>,
}

/// Result of an action reported back to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Persistence rooted at a data directory.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Create a store. Directories are created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn history_path(&self) -> PathBuf {
        self.root.join(HISTORY_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join(BACKUP_DIR)
    }

    fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.backup_dir())?;
        Ok(())
    }

    // === History ===

    /// Read the history, most recent first. A missing file is an empty
    /// history.
    pub fn try_load_history(&self) -> Result<Vec<HistoryEntry>> {
        let doc: Option<HistoryDocument> = read_json(&self.history_path())?;
        Ok(doc.map(|d| d.entries).unwrap_or_default())
    }

    /// Read the history, falling back to empty on any failure.
    pub fn load_history(&self) -> Vec<HistoryEntry> {
        self.try_load_history().unwrap_or_else(|e| {
            warn!(path = %self.history_path().display(), error = %e, "failed to load history");
            Vec::new()
        })
    }

    /// Overwrite the history and write a timestamped backup of it.
    ///
    /// The history file only changes once the backup is on disk.
    pub fn try_save_history(&self, entries: &[HistoryEntry]) -> Result<()> {
        self.ensure_dirs()?;
        let doc = history_document(entries);
        let staged = Staged::write(&self.history_path(), &doc)?;
        self.commit_with_backup(vec![staged], &doc)?;
        info!(entries = entries.len(), "saved history");
        Ok(())
    }

    /// Write a backup of `doc`, then commit `staged`. A failed commit removes
    /// the backup again. Pruning runs last and only logs on failure.
    fn commit_with_backup(&self, staged: Vec<Staged>, doc: &HistoryDocument) -> Result<()> {
        let backup = self.next_backup_path();
        if let Err(e) = write_json_atomic(&backup, doc) {
            staged.into_iter().for_each(Staged::discard);
            return Err(e);
        }

        if let Err(e) = commit_all(staged) {
            if let Err(cleanup) = remove_if_exists(&backup) {
                warn!(path = %backup.display(), error = %cleanup, "failed to remove orphan backup");
            }
            return Err(e);
        }

        debug!(backup = %backup.display(), "wrote history backup");
        if let Err(e) = self.prune_backups(MAX_BACKUPS) {
            warn!(error = %e, "failed to prune history backups");
        }
        Ok(())
    }

    pub fn save_history(&self, entries: &[HistoryEntry]) -> bool {
        report("save history", self.try_save_history(entries))
    }

    /// Insert an entry at the head of the history and save.
    ///
    /// An unreadable history blocks the append and is left untouched.
    pub fn try_append_entry(&self, entry: HistoryEntry) -> Result<()> {
        let mut entries = self.try_load_history()?;
        entries.insert(0, entry);
        self.try_save_history(&entries)
    }

    pub fn append_entry(&self, entry: HistoryEntry) -> bool {
        report("append history entry", self.try_append_entry(entry))
    }

    /// Remove the entry at `index` (0 = most recent) and save.
    pub fn try_remove_entry(&self, index: usize) -> Result<HistoryEntry> {
        let mut entries = self.try_load_history()?;
        if index >= entries.len() {
            return Err(StoreError::IndexOutOfRange {
                index,
                len: entries.len(),
            }
            .into());
        }
        let removed = entries.remove(index);
        self.try_save_history(&entries)?;
        Ok(removed)
    }

    pub fn remove_entry(&self, index: usize) -> bool {
        report("remove history entry", self.try_remove_entry(index).map(|_| ()))
    }

    /// Delete the history file. Backups are kept.
    pub fn clear_history(&self) -> bool {
        report("clear history", remove_if_exists(&self.history_path()))
    }

    // === Config ===

    /// Read saved settings; `None` when nothing has been saved yet.
    pub fn try_load_config(&self) -> Result<Option<AppConfig>> {
        let doc: Option<ConfigDocument> = read_json(&self.config_path())?;
        Ok(doc.map(|d| d.config))
    }

    /// Read saved settings, falling back to defaults.
    pub fn load_config(&self) -> AppConfig {
        match self.try_load_config() {
            Ok(cfg) => cfg.unwrap_or_default(),
            Err(e) => {
                warn!(path = %self.config_path().display(), error = %e, "failed to load config");
                AppConfig::default()
            }
        }
    }

    pub fn try_save_config(&self, config: &AppConfig) -> Result<()> {
        self.ensure_dirs()?;
        write_json_atomic(&self.config_path(), &config_document(config))?;
        info!("saved config");
        Ok(())
    }

    pub fn save_config(&self, config: &AppConfig) -> bool {
        report("save config", self.try_save_config(config))
    }

    // === Export / import ===

    /// Dump history and settings into one file inside the data directory.
    ///
    /// Returns the written path, or `None` on failure.
    pub fn export_all(&self, file_name: Option<&str>) -> Option<PathBuf> {
        let name = match file_name {
            Some(name) => sanitize_file_name(name),
            None => format!("group_former_export_{}.json", Local::now().format("%Y%m%d_%H%M%S")),
        };
        let path = self.root.join(name);

        let result = self.ensure_dirs().and_then(|_| {
            let doc = ExportDocument {
                export_date: Local::now().to_rfc3339(),
                version: DOCUMENT_VERSION.to_string(),
                history: Some(self.load_history()),
                config: Some(self.load_config()),
            };
            write_json_atomic(&path, &doc)
        });

        match result {
            Ok(()) => {
                info!(path = %path.display(), "exported data");
                Some(path)
            }
            Err(e) => {
                warn!(error = %e, "failed to export data");
                None
            }
        }
    }

    /// Replace history and settings with those of an exported document.
    ///
    /// The whole document is parsed and both files are staged before either
    /// is replaced. On failure neither the history nor the settings change.
    pub fn try_import_all(&self, path: &Path) -> Result<()> {
        let bytes = fs::read(path)?;
        let doc: ExportDocument = serde_json::from_slice(&bytes)?;

        if doc.history.is_none() && doc.config.is_none() {
            return Err(StoreError::EmptyImport.into());
        }
        self.ensure_dirs()?;

        let history = doc.history.as_deref().map(history_document);
        let mut staged = Vec::new();
        if let Some(history) = &history {
            staged.push(Staged::write(&self.history_path(), history)?);
        }
        if let Some(config) = &doc.config {
            match Staged::write(&self.config_path(), &config_document(config)) {
                Ok(s) => staged.push(s),
                Err(e) => {
                    staged.into_iter().for_each(Staged::discard);
                    return Err(e);
                }
            }
        }

        match &history {
            Some(history) => self.commit_with_backup(staged, history)?,
            None => commit_all(staged)?,
        }
        info!(path = %path.display(), "imported data");
        Ok(())
    }

    pub fn import_all(&self, path: &Path) -> Outcome {
        match self.try_import_all(path) {
            Ok(()) => Outcome::ok("data imported"),
            Err(e) => Outcome::failed(format!("failed to import data: {e}")),
        }
    }

    /// Delete both history and settings.
    pub fn reset_all(&self) -> bool {
        let result = remove_if_exists(&self.history_path()).and_then(|_| remove_if_exists(&self.config_path()));
        report("reset data", result)
    }

    // === Backups ===

    /// Backup files, newest first.
    pub fn backups(&self) -> Result<Vec<PathBuf>> {
        let dir = self.backup_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_backup = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(BACKUP_PREFIX) && n.ends_with(".json"));
            if is_backup {
                found.push(path);
            }
        }

        // Names embed the timestamp, so name order is age order.
        found.sort();
        found.reverse();
        Ok(found)
    }

    fn next_backup_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
        let dir = self.backup_dir();

        let mut path = dir.join(format!("{BACKUP_PREFIX}{stamp}.json"));
        let mut n = 1;
        while path.exists() {
            path = dir.join(format!("{BACKUP_PREFIX}{stamp}_{n:03}.json"));
            n += 1;
        }
        path
    }

    fn prune_backups(&self, keep: usize) -> Result<()> {
        for old in self.backups()?.into_iter().skip(keep) {
            fs::remove_file(&old)?;
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path)?;
    Ok(Some(serde_json::from_slice(&bytes)?))
}

fn history_document(entries: &[HistoryEntry]) -> HistoryDocument {
    HistoryDocument {
        last_updated: Local::now().to_rfc3339(),
        version: DOCUMENT_VERSION.to_string(),
        count: entries.len(),
        entries: entries.to_vec(),
    }
}

fn config_document(config: &AppConfig) -> ConfigDocument {
    ConfigDocument {
        last_updated: Local::now().to_rfc3339(),
        version: DOCUMENT_VERSION.to_string(),
        config: config.clone(),
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    Staged::write(path, value)?.commit()
}

/// A document written next to its target, waiting to be renamed over it.
#[derive(Debug)]
struct Staged {
    tmp: PathBuf,
    target: PathBuf,
}

impl Staged {
    fn write<T: Serialize>(target: &Path, value: &T) -> Result<Self> {
        let bytes = serde_json::to_vec_pretty(value)?;
        let tmp = target.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        Ok(Self {
            tmp,
            target: target.to_path_buf(),
        })
    }

    fn commit(self) -> Result<()> {
        fs::rename(&self.tmp, &self.target)?;
        Ok(())
    }

    fn discard(self) {
        if let Err(e) = fs::remove_file(&self.tmp) {
            debug!(path = %self.tmp.display(), error = %e, "failed to remove staged file");
        }
    }
}

/// Rename every staged file over its target, or none of them.
///
/// Current contents are read before the first rename. If a rename fails,
/// targets already replaced get their old contents back.
fn commit_all(staged: Vec<Staged>) -> Result<()> {
    let previous: Result<Vec<_>> = staged.iter().map(|s| read_previous(&s.target)).collect();
    let previous = match previous {
        Ok(previous) => previous,
        Err(e) => {
            staged.into_iter().for_each(Staged::discard);
            return Err(e);
        }
    };

    let mut committed: Vec<(PathBuf, Option<Vec<u8>>)> = Vec::new();
    let mut pending = staged.into_iter().zip(previous);
    while let Some((s, before)) = pending.next() {
        let target = s.target.clone();
        if let Err(e) = s.commit() {
            for (rest, _) in pending.by_ref() {
                rest.discard();
            }
            for (path, bytes) in committed.into_iter().rev() {
                restore(&path, bytes);
            }
            return Err(e);
        }
        committed.push((target, before));
    }
    Ok(())
}

fn read_previous(path: &Path) -> Result<Option<Vec<u8>>> {
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(fs::read(path)?))
}

fn restore(path: &Path, bytes: Option<Vec<u8>>) {
    let result: Result<()> = match bytes {
        Some(bytes) => fs::write(path, bytes).map_err(Into::into),
        None => remove_if_exists(path),
    };
    if let Err(e) = result {
        warn!(path = %path.display(), error = %e, "failed to restore file after aborted save");
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

fn report(action: &str, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "failed to {action}");
            false
        }
    }
}

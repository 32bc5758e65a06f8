use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use std::path::{Path, PathBuf};

const TIMESTAMP_TOKEN: &str = "{{timestamp}}";

/// Copies the sled directory into timestamped snapshots and restores them.
///
/// The database must be flushed (or closed) before a snapshot is taken and
/// must not be open while a restore runs.
pub struct BackupManager {
    db_path: PathBuf,
    backup_dir: PathBuf,
    name_template: String,
}

impl BackupManager {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(db_path: P, backup_dir: Q, name_template: &str) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            backup_dir: backup_dir.as_ref().to_path_buf(),
            name_template: name_template.to_string(),
        }
    }

    /// Takes a snapshot now and prunes down to `retention` snapshots.
    pub fn backup_now(&self, retention: usize) -> Result<PathBuf> {
        let ts = Utc::now().format("%Y%m%dT%H%M%S%3fZ").to_string();
        let name = self.name_template.replace(TIMESTAMP_TOKEN, &ts);
        let mut dst = self.backup_dir.join(&name);
        // same-millisecond backups get a numeric suffix instead of merging
        let mut n = 1;
        while dst.exists() {
            dst = self.backup_dir.join(format!("{}-{}", name, n));
            n += 1;
        }

        std::fs::create_dir_all(&dst)
            .with_context(|| format!("creating backup directory {}", dst.display()))?;
        copy_dir_recursive(&self.db_path, &dst)
            .with_context(|| format!("copying {} to {}", self.db_path.display(), dst.display()))?;
        info!("Sled backup written to {:?}", dst);

        let removed = self.prune_old_backups(retention)?;
        if removed > 0 {
            info!("Pruned {} old backup(s)", removed);
        }
        Ok(dst)
    }

    fn name_prefix(&self) -> String {
        self.name_template
            .split(TIMESTAMP_TOKEN)
            .next()
            .unwrap_or_default()
            .to_string()
    }

    /// Backup directories we created, oldest first.
    pub fn list_backups(&self) -> Result<Vec<PathBuf>> {
        let prefix = self.name_prefix();
        let entries = match std::fs::read_dir(&self.backup_dir) {
            Ok(e) => e,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut items: Vec<(String, PathBuf)> = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    warn!("Error reading backup directory entry: {}", err);
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().to_string();
            if !prefix.is_empty() && !name.starts_with(&prefix) {
                continue;
            }
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                items.push((name, entry.path()));
            }
        }
        // timestamp is embedded in the name
        items.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(items.into_iter().map(|(_, path)| path).collect())
    }

    fn prune_old_backups(&self, keep: usize) -> Result<usize> {
        let items = self.list_backups()?;
        let remove_count = items.len().saturating_sub(keep);
        for path in items.iter().take(remove_count) {
            if let Err(err) = std::fs::remove_dir_all(path) {
                warn!("Failed to remove old backup {:?}: {}", path, err);
            }
        }
        Ok(remove_count)
    }

    pub fn latest_backup(&self) -> Result<Option<PathBuf>> {
        Ok(self.list_backups()?.pop())
    }

    /// Restores the newest snapshot into an empty or missing database
    /// directory. Returns `false` when nothing was restored.
    pub fn restore_from_latest(&self) -> Result<bool> {
        let Some(backup_path) = self.latest_backup()? else {
            info!("No backups found to restore from");
            return Ok(false);
        };

        let db_has_data = match std::fs::read_dir(&self.db_path) {
            Ok(mut entries) => entries.next().is_some(),
            Err(_) => false,
        };
        if db_has_data {
            warn!("Database at {:?} already has data, skipping restore", self.db_path);
            return Ok(false);
        }

        std::fs::create_dir_all(&self.db_path)?;
        copy_dir_recursive(&backup_path, &self.db_path)
            .with_context(|| format!("restoring from {}", backup_path.display()))?;
        info!("Database restored successfully from backup: {:?}", backup_path);
        Ok(true)
    }
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry_res in std::fs::read_dir(src)? {
        let entry = entry_res?;
        let ty = entry.file_type()?;
        let dst_path = dst.join(entry.file_name());
        if ty.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&entry.path(), &dst_path)?;
        } else if ty.is_file() {
            std::fs::copy(entry.path(), &dst_path)?;
        }
    }
    Ok(())
}

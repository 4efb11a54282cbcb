//! Export directories

use std::fs;
use std::path::PathBuf;

use time::OffsetDateTime;

use super::exporter::DestinationResolver;
use super::filename::filename_date;

/// Every GPX on the same directory
pub struct FlatDirectory {
    root: PathBuf,
}

impl FlatDirectory {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

impl DestinationResolver for FlatDirectory {
    fn directory_for(&self, _start: OffsetDateTime) -> Result<PathBuf, String> {
        writable_dir(self.root.clone())
    }
}

/// One sub directory per track, named by its start date
pub struct PerTrackDirectory {
    root: PathBuf,
}

impl PerTrackDirectory {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

impl DestinationResolver for PerTrackDirectory {
    fn directory_for(&self, start: OffsetDateTime) -> Result<PathBuf, String> {
        writable_dir(self.root.join(filename_date(start)))
    }
}

fn writable_dir(dir: PathBuf) -> Result<PathBuf, String> {
    fs::create_dir_all(&dir)
        .map_err(|e| format!("Failed on create the directory {}: {}", dir.display(), e))?;

    let meta = fs::metadata(&dir)
        .map_err(|e| format!("Failed on access the directory {}: {}", dir.display(), e))?;
    if meta.permissions().readonly() {
        return Err(format!("Directory {} is not writable", dir.display()));
    }

    Ok(dir)
}

//! Record sources API

use std::path::PathBuf;

use time::OffsetDateTime;

use crate::{TrackMetadata, TrackPointRecord, WaypointRecord};

/// Source of the tracks to export
pub trait RecordSource {
    /// Track info, `None` when the track doesn't exist
    fn track_metadata(&mut self, track_id: i64) -> Result<Option<TrackMetadata>, String>;

    /// Points of the track, sorted by time
    fn track_points(&mut self, track_id: i64) -> Result<Vec<TrackPointRecord>, String>;

    /// Waypoints of the track, sorted by time
    fn waypoints(&mut self, track_id: i64) -> Result<Vec<WaypointRecord>, String>;

    /// Directory holding the media (photos, sounds) of the track
    fn media_directory(&mut self, _track_id: i64) -> Option<PathBuf> {
        None
    }

    /// Record that the track was exported
    fn mark_exported(&mut self, _track_id: i64, _at: OffsetDateTime) -> Result<(), String> {
        Ok(())
    }
}

mod memory;

pub use memory::MemorySource;

#[cfg(feature = "csv")]
mod csv_file;

#[cfg(feature = "csv")]
pub use csv_file::CsvSource;

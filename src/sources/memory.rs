//! In memory source

use std::collections::BTreeMap;
use std::path::PathBuf;

use time::OffsetDateTime;

use super::RecordSource;
use crate::{TrackMetadata, TrackPointRecord, WaypointRecord};

/// Tracks kept in memory
#[derive(Default)]
pub struct MemorySource {
    tracks: BTreeMap<i64, TrackMetadata>,
    points: BTreeMap<i64, Vec<TrackPointRecord>>,
    waypoints: BTreeMap<i64, Vec<WaypointRecord>>,
    media: BTreeMap<i64, PathBuf>,
    exported: BTreeMap<i64, OffsetDateTime>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a track, records are kept on the given order
    pub fn track(
        &mut self,
        meta: TrackMetadata,
        points: Vec<TrackPointRecord>,
        waypoints: Vec<WaypointRecord>,
    ) -> &mut Self {
        let id = meta.id;
        self.tracks.insert(id, meta);
        self.points.insert(id, points);
        self.waypoints.insert(id, waypoints);

        self
    }

    pub fn media(&mut self, track_id: i64, dir: PathBuf) -> &mut Self {
        self.media.insert(track_id, dir);

        self
    }

    pub fn track_ids(&self) -> Vec<i64> {
        self.tracks.keys().copied().collect()
    }

    /// Export time of the track, when marked
    pub fn exported_at(&self, track_id: i64) -> Option<OffsetDateTime> {
        self.exported.get(&track_id).copied()
    }
}

impl RecordSource for MemorySource {
    fn track_metadata(&mut self, track_id: i64) -> Result<Option<TrackMetadata>, String> {
        Ok(self.tracks.get(&track_id).cloned())
    }

    fn track_points(&mut self, track_id: i64) -> Result<Vec<TrackPointRecord>, String> {
        Ok(self.points.get(&track_id).cloned().unwrap_or_default())
    }

    fn waypoints(&mut self, track_id: i64) -> Result<Vec<WaypointRecord>, String> {
        Ok(self.waypoints.get(&track_id).cloned().unwrap_or_default())
    }

    fn media_directory(&mut self, track_id: i64) -> Option<PathBuf> {
        self.media.get(&track_id).cloned()
    }

    fn mark_exported(&mut self, track_id: i64, at: OffsetDateTime) -> Result<(), String> {
        self.exported.insert(track_id, at);

        Ok(())
    }
}

//! CSV files source integration
//!
//! Three files, each one with a header line: the tracks, the track points and
//! the waypoints. Columns are found by name, so their order doesn't matter.
//! Empty cells are absent values.

use std::collections::BTreeMap;
use std::io::Read;

use csv::{Reader, StringRecord};
use geo::geometry::Point;
use time::format_description::well_known;
use time::OffsetDateTime;

use super::RecordSource;
use crate::{Compass, TrackMetadata, TrackPointRecord, WaypointRecord};

/// Tracks loaded from CSV files
pub struct CsvSource {
    tracks: BTreeMap<i64, TrackMetadata>,
    points: BTreeMap<i64, Vec<TrackPointRecord>>,
    waypoints: BTreeMap<i64, Vec<WaypointRecord>>,
}

impl CsvSource {
    /// Read the whole files. Records are sorted by time, per track
    pub fn load<T, P, W>(
        tracks: Reader<T>,
        points: Reader<P>,
        waypoints: Reader<W>,
    ) -> Result<Self, String>
    where
        T: Read,
        P: Read,
        W: Read,
    {
        let mut source = Self {
            tracks: BTreeMap::new(),
            points: BTreeMap::new(),
            waypoints: BTreeMap::new(),
        };

        for meta in read_rows(tracks, parse_track)? {
            source.tracks.insert(meta.id, meta);
        }

        for (track_id, point) in read_rows(points, parse_point)? {
            source.points.entry(track_id).or_insert(vec![]).push(point);
        }
        for points in source.points.values_mut() {
            points.sort_by_key(|p| p.time);
        }

        for (track_id, wpt) in read_rows(waypoints, parse_waypoint)? {
            source.waypoints.entry(track_id).or_insert(vec![]).push(wpt);
        }
        for wpts in source.waypoints.values_mut() {
            wpts.sort_by_key(|w| w.time);
        }

        Ok(source)
    }

    pub fn track_ids(&self) -> Vec<i64> {
        self.tracks.keys().copied().collect()
    }
}

impl RecordSource for CsvSource {
    fn track_metadata(&mut self, track_id: i64) -> Result<Option<TrackMetadata>, String> {
        Ok(self.tracks.get(&track_id).cloned())
    }

    fn track_points(&mut self, track_id: i64) -> Result<Vec<TrackPointRecord>, String> {
        Ok(self.points.get(&track_id).cloned().unwrap_or_default())
    }

    fn waypoints(&mut self, track_id: i64) -> Result<Vec<WaypointRecord>, String> {
        Ok(self.waypoints.get(&track_id).cloned().unwrap_or_default())
    }
}

/// Header names to index
struct Columns {
    names: Vec<String>,
}

impl Columns {
    fn new(header: &mut StringRecord) -> Self {
        header.trim();

        Self {
            names: header.iter().map(|h| h.to_lowercase()).collect(),
        }
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|h| h == name)
    }

    fn require(&self, name: &str) -> Result<usize, String> {
        match self.find(name) {
            Some(p) => Ok(p),
            None => Err(format!("Header `{}` not found", name)),
        }
    }
}

fn read_rows<R, O, F>(mut rdr: Reader<R>, parse: F) -> Result<Vec<O>, String>
where
    R: Read,
    F: Fn(&Columns, &StringRecord) -> Result<O, String>,
{
    let mut header = rdr
        .headers()
        .map_err(|e| format!("Failed on read the header: {}", e))?
        .clone();
    let columns = Columns::new(&mut header);

    let mut rows = vec![];
    for row in rdr.records() {
        let mut rec = row.map_err(|e| format!("Failed on read some row: {}", e))?;
        rec.trim();

        if rec.iter().all(|f| f.is_empty()) {
            continue;
        }

        let parsed = match parse(&columns, &rec) {
            Ok(p) => Ok(p),
            Err(e) => Err(format!("Error with row {:?}: {}", rec, e)),
        }?;
        rows.push(parsed);
    }

    Ok(rows)
}

fn parse_track(columns: &Columns, row: &StringRecord) -> Result<TrackMetadata, String> {
    let id = required(row, columns.require("id")?, "id")?
        .parse::<i64>()
        .map_err(|e| format!("Invalid track id: {}", e))?;
    let start = parse_time(required(row, columns.require("start")?, "start")?)?;

    let mut meta = TrackMetadata::basic(id, start);
    meta.name = text(row, columns.find("name"));
    meta.tags = text(row, columns.find("tags"));
    meta.description = text(row, columns.find("description"));

    Ok(meta)
}

fn parse_point(columns: &Columns, row: &StringRecord) -> Result<(i64, TrackPointRecord), String> {
    let (track_id, coordinates, time) = parse_position(columns, row)?;

    let mut point = TrackPointRecord::basic(coordinates, time);
    point.elevation = number(row, columns.find("ele"));
    point.accuracy = number(row, columns.find("accuracy"));
    point.speed = number(row, columns.find("speed"));
    point.compass = compass(columns, row);
    point.pressure = number(row, columns.find("pressure"));

    Ok((track_id, point))
}

fn parse_waypoint(columns: &Columns, row: &StringRecord) -> Result<(i64, WaypointRecord), String> {
    let (track_id, coordinates, time) = parse_position(columns, row)?;
    let name = text(row, columns.find("name")).unwrap_or_default();

    let mut wpt = WaypointRecord::basic(coordinates, time, name);
    wpt.elevation = number(row, columns.find("ele"));
    wpt.accuracy = number(row, columns.find("accuracy"));
    wpt.compass = compass(columns, row);
    wpt.satellites = cell(row, columns.find("sat")).and_then(|s| s.parse::<u32>().ok());
    wpt.link = text(row, columns.find("link"));

    Ok((track_id, wpt))
}

fn parse_position(
    columns: &Columns,
    row: &StringRecord,
) -> Result<(i64, Point, OffsetDateTime), String> {
    let track_id = required(row, columns.require("track_id")?, "track_id")?
        .parse::<i64>()
        .map_err(|e| format!("Invalid track id: {}", e))?;

    let lat = required(row, columns.require("lat")?, "lat")?
        .parse::<f64>()
        .map_err(|e| format!("Invalid latitude format: {}", e))?;
    let lng = required(row, columns.require("lon")?, "lon")?
        .parse::<f64>()
        .map_err(|e| format!("Invalid longitude format: {}", e))?;

    let time = parse_time(required(row, columns.require("time")?, "time")?)?;

    Ok((track_id, Point::new(lng, lat), time))
}

fn compass(columns: &Columns, row: &StringRecord) -> Option<Compass> {
    let heading = number(row, columns.find("compass"))?;

    Some(Compass::new(
        heading,
        number(row, columns.find("compass_accuracy")),
    ))
}

/// RFC3339 or unix time in milliseconds
fn parse_time(value: &str) -> Result<OffsetDateTime, String> {
    if let Ok(ms) = value.parse::<i64>() {
        return OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000)
            .map_err(|e| format!("Failed on parse the time timestamp: {}", e));
    }

    OffsetDateTime::parse(value, &well_known::Rfc3339)
        .map_err(|e| format!("Failed on parse the time: {}", e))
}

fn cell(row: &StringRecord, idx: Option<usize>) -> Option<&str> {
    match row.get(idx?) {
        Some(d) if !d.is_empty() => Some(d),
        _ => None,
    }
}

fn required<'r>(row: &'r StringRecord, idx: usize, name: &str) -> Result<&'r str, String> {
    match cell(row, Some(idx)) {
        Some(d) => Ok(d),
        None => Err(format!("Field `{}` not found", name)),
    }
}

fn text(row: &StringRecord, idx: Option<usize>) -> Option<String> {
    cell(row, idx).map(|d| d.to_string())
}

fn number(row: &StringRecord, idx: Option<usize>) -> Option<f64> {
    cell(row, idx).and_then(|d| d.parse::<f64>().ok())
}

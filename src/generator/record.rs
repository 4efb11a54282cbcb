//! Track and waypoint records

use geo::geometry::Point;
use time::OffsetDateTime;

/// Track info, read once per export
#[derive(Clone, Debug, PartialEq)]
pub struct TrackMetadata {
    pub id: i64,
    pub start: OffsetDateTime,
    pub name: Option<String>,
    /// Comma separated tags, as stored
    pub tags: Option<String>,
    pub description: Option<String>,
}

impl TrackMetadata {
    pub fn basic(id: i64, start: OffsetDateTime) -> Self {
        Self {
            id,
            start,
            name: None,
            tags: None,
            description: None,
        }
    }

    /// Tags split on `,`, trimmed, empty ones skipped
    pub fn tag_list(&self) -> Vec<String> {
        match &self.tags {
            Some(tags) => tags
                .split(',')
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(|t| t.to_string())
                .collect(),
            None => vec![],
        }
    }

    /// Raw tags, when not blank
    pub fn tags(&self) -> Option<&str> {
        non_blank(&self.tags)
    }

    /// Description, when not blank
    pub fn description(&self) -> Option<&str> {
        non_blank(&self.description)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    match value {
        Some(v) if !v.is_empty() => Some(v.as_str()),
        _ => None,
    }
}

/// Compass reading taken with a position
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Compass {
    /// Heading in degrees
    pub heading: f64,
    pub accuracy: Option<f64>,
}

impl Compass {
    pub fn new(heading: f64, accuracy: Option<f64>) -> Self {
        Self { heading, accuracy }
    }

    pub(crate) fn accuracy_or_zero(&self) -> f64 {
        self.accuracy.unwrap_or(0.0)
    }
}

/// Recorded position of a track
#[derive(Clone, Debug, PartialEq)]
pub struct TrackPointRecord {
    /// x = longitude, y = latitude
    pub coordinates: Point,
    pub time: OffsetDateTime,
    /// Meters
    pub elevation: Option<f64>,
    /// Horizontal accuracy, meters
    pub accuracy: Option<f64>,
    /// m/s
    pub speed: Option<f64>,
    pub compass: Option<Compass>,
    /// hPa
    pub pressure: Option<f64>,
}

impl TrackPointRecord {
    pub fn basic(coordinates: Point, time: OffsetDateTime) -> Self {
        Self {
            coordinates,
            time,
            elevation: None,
            accuracy: None,
            speed: None,
            compass: None,
            pressure: None,
        }
    }
}

/// User marked point of a track
#[derive(Clone, Debug, PartialEq)]
pub struct WaypointRecord {
    /// x = longitude, y = latitude
    pub coordinates: Point,
    pub time: OffsetDateTime,
    pub elevation: Option<f64>,
    pub accuracy: Option<f64>,
    pub compass: Option<Compass>,
    pub name: String,
    pub satellites: Option<u32>,
    pub link: Option<String>,
}

impl WaypointRecord {
    pub fn basic(coordinates: Point, time: OffsetDateTime, name: String) -> Self {
        Self {
            coordinates,
            time,
            elevation: None,
            accuracy: None,
            compass: None,
            name,
            satellites: None,
            link: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::TrackMetadata;

    #[test]
    fn tags() {
        let mut meta = TrackMetadata::basic(1, datetime!(2021-05-24 0:00 UTC));
        assert!(meta.tag_list().is_empty());
        assert_eq!(None, meta.tags());

        meta.tags = Some(" hike, sunset ,,".to_string());
        assert_eq!(vec!["hike".to_string(), "sunset".to_string()], meta.tag_list());
        assert_eq!(Some(" hike, sunset ,,"), meta.tags());

        meta.tags = Some("".to_string());
        assert!(meta.tag_list().is_empty());
        assert_eq!(None, meta.tags());
    }

    #[test]
    fn description() {
        let mut meta = TrackMetadata::basic(1, datetime!(2021-05-24 0:00 UTC));
        assert_eq!(None, meta.description());

        meta.description = Some("".to_string());
        assert_eq!(None, meta.description());

        meta.description = Some("Evening walk".to_string());
        assert_eq!(Some("Evening walk"), meta.description());
    }
}

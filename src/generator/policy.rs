//! Output options
//!
//! Raw settings come from the YAML config (or any other settings store) as
//! plain strings and booleans. They are resolved once per export batch into a
//! [`FormattingPolicy`], so the per record encoding never looks them up again.

use serde::Deserialize;

/// Divisor used to approximate the HDOP from the location accuracy
pub const HDOP_APPROXIMATION_FACTOR: f64 = 4.0;

/// Where the accuracy of a waypoint goes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccuracyMode {
    None,
    /// Appended to the waypoint name
    NameSuffix,
    /// Written on the waypoint `<cmt>`
    CommentTag,
    /// Unknown setting value, only the name is rendered
    Unrecognized(String),
}

impl AccuracyMode {
    pub fn from_setting(value: &str) -> Self {
        match value {
            "none" => Self::None,
            "wpt_name" => Self::NameSuffix,
            "wpt_cmt" => Self::CommentTag,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

/// How the compass heading is written
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompassMode {
    None,
    Comment,
    Extension,
}

impl CompassMode {
    pub fn from_setting(value: &str) -> Self {
        match value {
            "comment" => Self::Comment,
            "extension" => Self::Extension,
            _ => Self::None,
        }
    }
}

/// Which components make the GPX filename
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilenamePolicy {
    Name,
    Date,
    NameDate,
}

impl FilenamePolicy {
    pub fn from_setting(value: &str) -> Self {
        match value {
            "name" => Self::Name,
            "date" => Self::Date,
            _ => Self::NameDate,
        }
    }
}

/// Texts written along the data
#[derive(Clone, Debug, PartialEq)]
pub struct OutputLabels {
    /// Used when the track has no name
    pub track_name: String,
    pub meter_unit: String,
    pub accuracy: String,
    pub hdop_comment: String,
}

/// Resolved output options of an export batch
#[derive(Clone, Debug, PartialEq)]
pub struct FormattingPolicy {
    pub accuracy: AccuracyMode,
    pub fill_hdop: bool,
    pub compass: CompassMode,
    pub labels: OutputLabels,
}

impl FormattingPolicy {
    /// Policy of the default settings
    pub fn new() -> Self {
        OutputSettings::default().resolve()
    }

    pub fn accuracy(mut self, mode: AccuracyMode) -> Self {
        self.accuracy = mode;
        self
    }

    pub fn fill_hdop(mut self, fill: bool) -> Self {
        self.fill_hdop = fill;
        self
    }

    pub fn compass(mut self, mode: CompassMode) -> Self {
        self.compass = mode;
        self
    }
}

impl Default for FormattingPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw output settings, as stored on the config file
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub accuracy: String,
    pub hdop_approximation: bool,
    pub compass: String,
    pub filename: String,
    pub track_name: String,
    pub meter_unit: String,
    pub accuracy_label: String,
    pub hdop_comment: String,
    pub one_dir_per_track: bool,
    pub export_media: bool,
    pub update_export_date: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            accuracy: "none".to_string(),
            hdop_approximation: false,
            compass: "none".to_string(),
            filename: "name_date".to_string(),
            track_name: "Tracked with track2gpx".to_string(),
            meter_unit: "m".to_string(),
            accuracy_label: "Accuracy".to_string(),
            hdop_comment: "HDOP values approximated from location accuracy".to_string(),
            one_dir_per_track: false,
            export_media: false,
            update_export_date: false,
        }
    }
}

impl OutputSettings {
    /// Resolve the settings into the policy used by the writers
    pub fn resolve(&self) -> FormattingPolicy {
        FormattingPolicy {
            accuracy: AccuracyMode::from_setting(&self.accuracy),
            fill_hdop: self.hdop_approximation,
            compass: CompassMode::from_setting(&self.compass),
            labels: OutputLabels {
                track_name: self.track_name.clone(),
                meter_unit: self.meter_unit.clone(),
                accuracy: self.accuracy_label.clone(),
                hdop_comment: self.hdop_comment.clone(),
            },
        }
    }

    pub fn filename_policy(&self) -> FilenamePolicy {
        FilenamePolicy::from_setting(&self.filename)
    }
}

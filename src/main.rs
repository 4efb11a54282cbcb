//! track2gpx cli - Export recorded tracks into GPX files

use std::fs::{self, File};
use std::sync::atomic::{AtomicU64, Ordering};

use argopt::{cmd_group, subcmd};
use csv::{Reader, ReaderBuilder};
use serde::Deserialize;

use track2gpx::sources::CsvSource;
use track2gpx::{
    DestinationResolver, ExportObserver, ExportOptions, ExportOrchestrator, ExportOutcome,
    FlatDirectory, OutputSettings, PerTrackDirectory,
};

/// CLI of track2gpx - Export your recorded tracks into GPX files
#[cmd_group(commands = [csv])]
fn main() -> Result<(), String> {}

/// Export the tracks of CSV files, one GPX per track
#[subcmd]
fn csv(
    /// Tracks CSV file: id, start, name, tags, description
    tracks: String,
    /// Track points CSV file
    trackpoints: String,
    /// Waypoints CSV file
    waypoints: String,
    /// Directory destination of the GPX files
    destination: String,
    /// Tracks to export. Default: all
    track_ids: Vec<i64>,
    /// Output configuration. Default: .track2gpx.yaml, ~/.track2gpx.yaml
    #[opt(long)]
    config: Option<String>,
) -> Result<(), String> {
    init_logging();

    let settings = load_configs(config);

    let source = CsvSource::load(
        open_csv(&tracks)?,
        open_csv(&trackpoints)?,
        open_csv(&waypoints)?,
    )?;

    let track_ids = if track_ids.is_empty() {
        source.track_ids()
    } else {
        track_ids
    };

    let outcome = if settings.one_dir_per_track {
        export(source, PerTrackDirectory::new(destination), &settings, track_ids)?
    } else {
        export(source, FlatDirectory::new(destination), &settings, track_ids)?
    };

    let exported = outcome.into_result().map_err(|e| e.to_string())?;
    for track in exported {
        println!("{}", track.path.display());
    }

    Ok(())
}

fn export<D>(
    source: CsvSource,
    destination: D,
    settings: &OutputSettings,
    track_ids: Vec<i64>,
) -> Result<ExportOutcome, String>
where
    D: DestinationResolver + Send + 'static,
{
    ExportOrchestrator::new(source, destination, settings.resolve())
        .options(ExportOptions::from(settings))
        .observer(Box::new(LogProgress::default()))
        .spawn(track_ids)
        .join()
}

fn open_csv(path: &str) -> Result<Reader<File>, String> {
    let file =
        File::open(path).map_err(|e| format!("Failed on open the CSV file {}: {}", path, e))?;

    Ok(ReaderBuilder::new().flexible(true).from_reader(file))
}

fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Logs the export progress every 10%
#[derive(Default)]
struct LogProgress {
    total: AtomicU64,
    done: AtomicU64,
}

impl ExportObserver for LogProgress {
    fn on_progress_init(&self, track_id: i64, points: usize, waypoints: usize) {
        log::info!(
            "Exporting track {}: {} points, {} waypoints",
            track_id,
            points,
            waypoints
        );
        self.total
            .store((points + waypoints) as u64, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
    }

    fn on_progress_tick(&self, n: u64) {
        let total = self.total.load(Ordering::Relaxed).max(1);
        let before = self.done.fetch_add(n, Ordering::Relaxed);

        let (from, to) = (before * 10 / total, (before + n) * 10 / total);
        if to > from {
            log::info!("{}%", (to * 10).min(100));
        }
    }

    fn on_complete(&self, outcome: &ExportOutcome) {
        match &outcome.failure {
            None => log::info!("{} tracks exported", outcome.exported.len()),
            Some(failure) => log::error!("Export aborted: {}", failure),
        }
    }
}

/// Load the current config
fn load_configs(provided: Option<String>) -> OutputSettings {
    let mut options = vec![];

    if let Some(sprovided) = provided {
        options.push(sprovided);
    }

    options.push(".track2gpx.yaml".to_string());

    if let Some(home) = dirs::home_dir() {
        if let Some(shome) = home.to_str() {
            options.push(format!("{}/.track2gpx.yaml", shome));
        }
    }

    let mut yaml: Option<String> = None;
    for fi in options {
        if let Ok(s) = fs::read_to_string(&fi) {
            log::debug!("Using the config {}", fi);
            yaml = Some(s);
            break;
        }
    }

    if let Some(s) = yaml {
        match serde_yaml::from_str::<Configs>(&s) {
            Ok(conf) => return conf.output,
            Err(e) => log::warn!("Invalid config, using the defaults: {}", e),
        }
    }

    OutputSettings::default()
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct Configs {
    pub output: OutputSettings,
}

#[test]
fn parse_configs() -> Result<(), String> {
    let yaml = "output:\n  accuracy: wpt_name";

    let conf: Configs = serde_yaml::from_str(&yaml).map_err(|e| e.to_string())?;

    assert_eq!(
        Configs {
            output: OutputSettings {
                accuracy: "wpt_name".to_string(),
                ..OutputSettings::default()
            }
        },
        conf
    );

    let yaml = "output:\n  hdop_approximation: true\n  compass: comment\n  \
                filename: date\n  one_dir_per_track: true";

    let conf: Configs = serde_yaml::from_str(&yaml).map_err(|e| e.to_string())?;

    assert_eq!(
        Configs {
            output: OutputSettings {
                hdop_approximation: true,
                compass: "comment".to_string(),
                filename: "date".to_string(),
                one_dir_per_track: true,
                ..OutputSettings::default()
            }
        },
        conf
    );

    let conf: Configs = serde_yaml::from_str("{}").map_err(|e| e.to_string())?;
    assert_eq!(Configs::default(), conf);

    Ok(())
}

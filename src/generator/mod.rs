//! GPX export core

pub mod destination;
pub mod encoder;
pub mod exporter;
pub mod filename;
pub mod gpx;
pub mod policy;
pub mod record;

//! Export module
//!
//! Profile text files and TIFF snapshots of the latest frame.

mod exporter;
mod profile_text;
mod snapshot_writer;
pub mod types;

pub use exporter::Exporter;
pub use profile_text::{load_profile, read_profile, save_profile, write_profile};
pub use snapshot_writer::{SnapshotWriter, TiffSnapshotWriter};
pub use types::{ExportConfig, ExportConfigBuilder, TiffCompression};

#![warn(missing_docs)]

//! OrcaSlicer to FlashForge G-code metadata transcoder.
//!
//! This crate rewrites the metadata comments an OrcaSlicer G-code file
//! carries into the header dialect FlashForge firmware reads, and adds a
//! layer progress annotation after every layer marker. Motion commands and
//! every other line of the body are left untouched.
//!
//! # Example
//!
//! ```ignore
//! use orcaflash::{MaterialTable, TranscodeOptions, Transcoder};
//!
//! let gcode = std::fs::read_to_string("benchy.gcode")?;
//!
//! let transcoder = Transcoder::new(TranscodeOptions {
//!     materials: MaterialTable::builtin(),
//!     add_md5: true,
//! });
//!
//! let out = transcoder.transcode(&gcode)?;
//! if !out.already_converted {
//!     std::fs::write("benchy.gcode", out.text)?;
//! }
//! ```

pub mod annotate;
pub mod dialect;
pub mod document;
pub mod duration;
pub mod encoder;
pub mod error;
pub mod material;
pub mod metrics;
pub mod parser;
pub mod settings;
pub mod transcode;

pub use annotate::{LayerCountMismatch, LayerEvent};
pub use document::Document;
pub use error::{Result, TranscodeError};
pub use material::{Material, MaterialTable};
pub use metrics::{Calculator, LayerProgress};
pub use settings::{SettingKey, SettingValue, SettingsMap};
pub use transcode::{convert, TranscodeOptions, Transcoded, Transcoder};

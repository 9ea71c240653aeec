//! Stamp a fixed text label onto newly stored images and write labeled copies back.
//!
//! A batch of [`NotificationRecord`]s is processed by [`BatchProcessor`]: each
//! record whose key names a JPEG or PNG is fetched from an [`ObjectStore`],
//! decoded, labeled, re-encoded in its original format and stored under
//! `labeled-images/<file name>` in the same bucket.
#![forbid(unsafe_code)]

pub mod annotate;
pub mod codec;
pub mod config;
pub mod event;
pub mod font;
pub mod format;
pub mod pipeline;
pub mod store;

mod foundation {
    pub mod core;
    pub mod error;
}

pub use foundation::{core, error};

pub use annotate::{Label, WATERMARK_TEXT, annotate, placement_for};
pub use codec::{DecodedImage, MismatchPolicy, OutputFormat, decode, encode, encode_for_extension};
pub use config::PipelineConfig;
pub use crate::core::{Fixed26_6, Point, Rgba8, SubPixelPoint};
pub use error::{LabelError, LabelResult};
pub use event::{NotificationRecord, parse_event_json, read_event_file};
pub use font::BitmapFace;
pub use format::{Classification, Codec, ImageExt, classify, classify_key};
pub use pipeline::{
    BatchOptions, BatchProcessor, BatchReport, CancelFlag, FailurePolicy, OUTPUT_PREFIX,
    RecordOutcome, RecordReport, output_key, process_record,
};
pub use store::{FsStore, MemoryStore, ObjectStore, StorageError, StoredObject};

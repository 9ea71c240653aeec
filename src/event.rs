use std::path::Path;

use anyhow::Context;

use crate::error::{LabelError, LabelResult};

/// One new object to process.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NotificationRecord {
    pub bucket: String,
    pub key: String,
}

impl NotificationRecord {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum EventDocument {
    Notification {
        #[serde(rename = "Records")]
        records: Vec<S3Record>,
    },
    Plain(Vec<NotificationRecord>),
}

#[derive(serde::Deserialize)]
struct S3Record {
    s3: S3Entity,
}

#[derive(serde::Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(serde::Deserialize)]
struct S3Bucket {
    name: String,
}

#[derive(serde::Deserialize)]
struct S3Object {
    key: String,
}

/// Parse either a storage notification document (`{"Records": [...]}`) or a
/// plain array of `{bucket, key}` objects.
pub fn parse_event_json(json: &str) -> LabelResult<Vec<NotificationRecord>> {
    let doc: EventDocument = serde_json::from_str(json)
        .map_err(|e| LabelError::validation(format!("invalid event document: {e}")))?;
    Ok(match doc {
        EventDocument::Notification { records } => records
            .into_iter()
            .map(|r| NotificationRecord {
                bucket: r.s3.bucket.name,
                key: r.s3.object.key,
            })
            .collect(),
        EventDocument::Plain(records) => records,
    })
}

pub fn read_event_file(path: &Path) -> LabelResult<Vec<NotificationRecord>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("read event file '{}'", path.display()))?;
    parse_event_json(&json)
}

// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0
//! Object Storage URLs
//!
//! Parsing of COS object URLs into `(bucket, region, key)` and the URL
//! conventions the thumbnail handler relies on.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Keep the storage provider's host naming scheme out of handlers
//!
//! Recognised hosts:
//!
//! | Host | Network |
//! |------|---------|
//! | `<bucket>.cos.<region>.myqcloud.com` | public |
//! | `<bucket>.cos-internal.<region>.myqcloud.com` | internal |
//! | `<bucket>.cos.<region>.tencentcos.cn` | public |
//! | `<bucket>.cos-internal.<region>.tencentcos.cn` | internal |
//!
//! Any other host parses with empty bucket and region; the key is still
//! extracted from the path.

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

use crate::domain::handler::HandlerError;
use crate::domain::invocation::ObjectRecord;

static COS_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^.]*)\.(cos|cos-internal)\.([^.]*)\.(myqcloud\.com|tencentcos\.cn)$")
        .expect("cos host pattern is valid")
});

/// Quality used when `THUMBNAIL_QUALITY` is unset.
pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub url: String,
    pub bucket: String,
    pub region: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn parse(raw: &str) -> Result<Self, HandlerError> {
        let url = Url::parse(raw)
            .map_err(|e| HandlerError::InvalidEvent(format!("invalid object url {}: {}", raw, e)))?;
        let host = url.host_str().unwrap_or_default();

        let (bucket, region) = match COS_HOST.captures(host) {
            Some(caps) => (caps[1].to_string(), caps[3].to_string()),
            None => (String::new(), String::new()),
        };

        let path = url.path().trim_start_matches('/');
        let mut key = percent_decode_str(path).decode_utf8_lossy().into_owned();
        // An encoded '?' survives decoding; everything after it is not part of the key.
        if let Some(idx) = key.find('?') {
            key.truncate(idx);
        }

        Ok(Self {
            url: raw.to_string(),
            bucket,
            region,
            key,
        })
    }

    pub fn is_cos(&self) -> bool {
        !self.bucket.is_empty()
    }

    /// Location of the object a record points at. Inventory reports carry a
    /// `/<appid>/<bucket>/<key>` object key and a queue whose fourth
    /// `:`-separated segment is the region; the URL is rebuilt from those.
    pub fn from_record(record: &ObjectRecord) -> Result<Self, HandlerError> {
        if !record.is_inventory_report() {
            return Self::parse(&record.url);
        }
        let queue = record.event_queue.as_deref().unwrap_or_default();
        let region = queue.split(':').nth(3).ok_or_else(|| {
            HandlerError::InvalidEvent(format!("event queue {} carries no region", queue))
        })?;
        let key = record.key.as_deref().unwrap_or_default();
        Self::parse(&inventory_object_url(key, region)?)
    }
}

/// Rebuild the public URL of an inventory-report object from its key.
pub fn inventory_object_url(key: &str, region: &str) -> Result<String, HandlerError> {
    let mut parts = key.trim_start_matches('/').splitn(3, '/');
    let (Some(appid), Some(bucket)) = (parts.next(), parts.next()) else {
        return Err(HandlerError::InvalidEvent(format!(
            "inventory key {} is not /<appid>/<bucket>/<key>",
            key
        )));
    };
    let object_key = parts.next().unwrap_or_default();
    Ok(format!(
        "https://{}-{}.cos.{}.myqcloud.com/{}",
        bucket, appid, region, object_key
    ))
}

/// Thumbnail URL using the provider's on-the-fly image processing.
pub fn thumbnail_url(object_url: &str, quality: u8) -> String {
    let separator = if object_url.contains('?') { '&' } else { '?' };
    format!("{}{}imageMogr2/rquality/{}", object_url, separator, quality)
}

/// Parse a quality setting, accepting 1 to 100.
pub fn parse_quality(raw: Option<&str>) -> Result<u8, HandlerError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_THUMBNAIL_QUALITY);
    };
    match raw.parse::<u8>() {
        Ok(q) if (1..=100).contains(&q) => Ok(q),
        _ => Err(HandlerError::InvalidEvent(format!(
            "thumbnail quality must be between 1 and 100, got {}",
            raw
        ))),
    }
}

//! DICOM JSON (PS3.18 F.2) datasets as returned by the metadata service.
//!
//! Each dataset is an object keyed by 8-hex-digit tag, each attribute a
//! `{ "vr": ..., "Value": [...] }` object. Only the first value of an
//! attribute is ever read.

use std::collections::HashMap;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod tags {
    pub const SOP_INSTANCE_UID: &str = "00080018";
    pub const STUDY_DATE: &str = "00080020";
    pub const STUDY_TIME: &str = "00080030";
    pub const MODALITY: &str = "00080060";
    pub const STUDY_DESCRIPTION: &str = "00081030";
    pub const SERIES_DESCRIPTION: &str = "0008103E";
    pub const RETRIEVE_URL: &str = "00081190";
    pub const PATIENT_NAME: &str = "00100010";
    pub const PATIENT_ID: &str = "00100020";
    pub const STUDY_INSTANCE_UID: &str = "0020000D";
    pub const SERIES_INSTANCE_UID: &str = "0020000E";
    pub const SERIES_NUMBER: &str = "00200011";
    pub const INSTANCE_NUMBER: &str = "00200013";
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DicomAttribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vr: Option<String>,
    #[serde(rename = "Value", default)]
    pub value: Vec<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DicomDataset(HashMap<String, DicomAttribute>);

impl DicomDataset {
    pub fn first(&self, tag: &str) -> Option<&Value> {
        self.0
            .get(tag)
            .or_else(|| self.0.get(&tag.to_ascii_lowercase()))
            .and_then(|attr| attr.value.first())
    }

    pub fn string(&self, tag: &str) -> Option<&str> {
        self.first(tag).and_then(Value::as_str)
    }

    /// Integer value; IS attributes may arrive as JSON numbers or strings.
    pub fn int(&self, tag: &str) -> Option<i64> {
        match self.first(tag)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// PN attributes carry an object; the alphabetic form is used.
    pub fn person_name(&self, tag: &str) -> Option<&str> {
        match self.first(tag)? {
            Value::Object(map) => map.get("Alphabetic").and_then(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn date(&self, tag: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.string(tag)?.trim(), "%Y%m%d").ok()
    }

    /// TM values may carry fractional seconds, which are dropped.
    pub fn time(&self, tag: &str) -> Option<NaiveTime> {
        let raw = self.string(tag)?.trim();
        let whole = raw.split('.').next().unwrap_or(raw);
        NaiveTime::parse_from_str(whole, "%H%M%S").ok()
    }

    pub fn insert(&mut self, tag: &str, vr: Option<&str>, value: Value) {
        self.0.insert(
            tag.to_string(),
            DicomAttribute { vr: vr.map(str::to_string), value: vec![value] },
        );
    }
}

/// One row of the study listing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StudySummary {
    pub study_uid: String,
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub study_date: Option<NaiveDate>,
    pub study_time: Option<NaiveTime>,
    pub modality: Option<String>,
    pub description: Option<String>,
}

impl StudySummary {
    pub fn from_dataset(ds: &DicomDataset) -> Option<Self> {
        Some(Self {
            study_uid: ds.string(tags::STUDY_INSTANCE_UID)?.to_string(),
            patient_id: ds.string(tags::PATIENT_ID).map(str::to_string),
            patient_name: ds.person_name(tags::PATIENT_NAME).map(str::to_string),
            study_date: ds.date(tags::STUDY_DATE),
            study_time: ds.time(tags::STUDY_TIME),
            modality: ds.string(tags::MODALITY).map(str::to_string),
            description: ds.string(tags::STUDY_DESCRIPTION).map(str::to_string),
        })
    }

    /// `YYYY-MM-DD HH:MM`, or whichever half is known.
    pub fn acquired_label(&self) -> String {
        match (self.study_date, self.study_time) {
            (Some(d), Some(t)) => format!("{} {}", d.format("%Y-%m-%d"), t.format("%H:%M")),
            (Some(d), None) => d.format("%Y-%m-%d").to_string(),
            (None, Some(t)) => t.format("%H:%M").to_string(),
            (None, None) => "unknown date".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub series_uid: String,
    pub number: Option<i64>,
    pub modality: Option<String>,
    pub description: Option<String>,
}

impl SeriesSummary {
    pub fn from_dataset(ds: &DicomDataset) -> Option<Self> {
        Some(Self {
            series_uid: ds.string(tags::SERIES_INSTANCE_UID)?.to_string(),
            number: ds.int(tags::SERIES_NUMBER),
            modality: ds.string(tags::MODALITY).map(str::to_string),
            description: ds.string(tags::SERIES_DESCRIPTION).map(str::to_string),
        })
    }
}

//! Content items as the item store describes them.
//!
//! The store is authoritative; everything here is a cached copy that gets
//! replaced wholesale on the next refresh.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Opaque item identifier assigned by the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of content a submission is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "Exam_Information")]
    ExamInformation,

    /// Regular content; requires a content subcategory
    #[serde(rename = "Content")]
    Content,

    #[serde(rename = "Motivational_or_Fun")]
    MotivationalOrFun,
}

impl ContentType {
    pub const ALL: [ContentType; 3] = [
        ContentType::ExamInformation,
        ContentType::Content,
        ContentType::MotivationalOrFun,
    ];

    /// Wire spelling used by the store
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::ExamInformation => "Exam_Information",
            ContentType::Content => "Content",
            ContentType::MotivationalOrFun => "Motivational_or_Fun",
        }
    }

    /// Whether items of this type must carry a content subcategory
    pub fn requires_subcategory(&self) -> bool {
        matches!(self, ContentType::Content)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "exam_information" | "exam" => Ok(ContentType::ExamInformation),
            "content" => Ok(ContentType::Content),
            "motivational_or_fun" | "motivational" | "fun" => Ok(ContentType::MotivationalOrFun),
            _ => anyhow::bail!("Unknown content type: {}", s),
        }
    }
}

/// Editorial status of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Draft,
    Pending,
    /// Sent back for re-editing; evidence is an uploaded video file
    #[serde(rename = "Re-edit")]
    ReEdit,
    Final,
    Published,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Draft,
        Status::Pending,
        Status::ReEdit,
        Status::Final,
        Status::Published,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "Draft",
            Status::Pending => "Pending",
            Status::ReEdit => "Re-edit",
            Status::Final => "Final",
            Status::Published => "Published",
        }
    }

    /// Re-edit items prove themselves with a file instead of a link
    pub fn requires_video_file(&self) -> bool {
        matches!(self, Status::ReEdit)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "draft" => Ok(Status::Draft),
            "pending" => Ok(Status::Pending),
            "re-edit" | "reedit" => Ok(Status::ReEdit),
            "final" => Ok(Status::Final),
            "published" => Ok(Status::Published),
            _ => anyhow::bail!("Unknown status: {}", s),
        }
    }
}

/// A content submission as returned by the item store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ItemId,

    #[serde(rename = "verificationLink", default, deserialize_with = "blank_is_none")]
    pub verification_link: Option<String>,

    /// Video identifier the store derived from the link
    #[serde(default, deserialize_with = "blank_is_none")]
    pub youtube_id: Option<String>,

    /// Storage key of the uploaded video, if any
    #[serde(rename = "videoFile", default, deserialize_with = "blank_is_none")]
    pub video_file: Option<String>,

    /// Storage keys of additional attachments
    #[serde(default)]
    pub files: Vec<String>,

    /// `None` when blank or outside the known set
    #[serde(rename = "contentType", default, deserialize_with = "known_or_none")]
    pub content_type: Option<ContentType>,

    #[serde(rename = "contentSubcategory", default, deserialize_with = "blank_is_none")]
    pub content_subcategory: Option<String>,

    #[serde(default)]
    pub vertical: String,

    #[serde(default, deserialize_with = "blank_is_none")]
    pub exam: Option<String>,

    #[serde(default, deserialize_with = "blank_is_none")]
    pub subject: Option<String>,

    /// `None` when blank or outside the known set
    #[serde(default, deserialize_with = "known_or_none")]
    pub status: Option<Status>,

    #[serde(default, deserialize_with = "blank_is_none")]
    pub email: Option<String>,

    #[serde(default)]
    pub created_by: String,

    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<NaiveDateTime>,

    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<NaiveDateTime>,
}

impl ContentItem {
    /// Whether `identity` is the submitter (and so allowed to mutate it)
    pub fn is_owned_by(&self, identity: &str) -> bool {
        self.created_by == identity
    }

    /// "Type / category" column: subcategory for `Content`, the type otherwise
    pub fn type_label(&self) -> String {
        match self.content_type {
            Some(ContentType::Content) => self.content_subcategory.clone().unwrap_or_default(),
            Some(other) => other.to_string(),
            None => "-".to_string(),
        }
    }

    /// Evidence column: the link if present, else the uploaded file key
    pub fn evidence_label(&self) -> String {
        if let Some(link) = &self.verification_link {
            link.clone()
        } else if let Some(key) = &self.video_file {
            format!("[video file] {}", key)
        } else {
            "-".to_string()
        }
    }
}

/// Reads `""` and `null` as `None`; anything else through `T`'s own impl.
///
/// The store writes unset fields as empty strings.
fn blank_is_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        Some(s) if !s.trim().is_empty() => {
            let de: serde::de::value::StringDeserializer<D::Error> = s.into_deserializer();
            T::deserialize(de).map(Some)
        }
        _ => Ok(None),
    }
}

/// Like [`blank_is_none`], but a value `T` does not recognise is logged and
/// read as `None` instead of failing the whole row.
///
/// The store keeps whatever strings it was sent, and the spreadsheet import
/// seeds statuses from free text.
fn known_or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };

    let de: serde::de::value::StringDeserializer<serde::de::value::Error> =
        raw.clone().into_deserializer();
    match T::deserialize(de) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(value = %raw, error = %e, "ignoring unrecognised value in stored item");
            Ok(None)
        }
    }
}

/// Accepts RFC 3339 and naive ISO-8601 timestamps
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(dt.naive_utc()));
    }

    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(Some)
        .map_err(serde::de::Error::custom)
}

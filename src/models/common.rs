//! Types shared by every content entity: language, record status and the
//! 0/1 flags the front-end exchanges.

use serde::{Deserialize, Serialize};

/// Content language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    /// French is the site's primary language
    #[default]
    Fr,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Fr];

    /// Value stored in `language_id` columns
    pub fn id(self) -> i32 {
        match self {
            Self::En => 1,
            Self::Fr => 2,
        }
    }

    /// Two-letter code used in URLs and form field suffixes
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Self::En),
            2 => Some(Self::Fr),
            _ => None,
        }
    }

    /// Parse a language code, falling back to French for anything unknown
    pub fn from_code_or_default(code: Option<&str>) -> Self {
        match code.map(|c| c.trim().to_ascii_lowercase()).as_deref() {
            Some("en") => Self::En,
            _ => Self::Fr,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Lifecycle state of a row. Deleted rows are kept but hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum RecordStatus {
    Inactive,
    #[default]
    Active,
    Deleted,
}

impl From<RecordStatus> for i32 {
    fn from(status: RecordStatus) -> i32 {
        match status {
            RecordStatus::Inactive => 0,
            RecordStatus::Active => 1,
            RecordStatus::Deleted => 2,
        }
    }
}

impl TryFrom<i32> for RecordStatus {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Inactive),
            1 => Ok(Self::Active),
            2 => Ok(Self::Deleted),
            other => Err(format!("Invalid record status: {}", other)),
        }
    }
}

impl RecordStatus {
    /// Database value for this status
    pub fn as_i32(self) -> i32 {
        self.into()
    }
}

/// Interpret a form value as a boolean flag (`1`, `true`, `on`)
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on"
    )
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl RawFlag {
    fn into_bool(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Int(n) => n != 0,
            Self::Text(s) => parse_flag(&s),
        }
    }
}

/// Serde adapter for flags written as `0`/`1` and read from numbers,
/// booleans or strings.
pub mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(super::RawFlag::deserialize(deserializer)?.into_bool())
    }
}

/// Optional variant of [`flag`]
pub mod option_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&u8::from(*v)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
        Ok(Option::<super::RawFlag>::deserialize(deserializer)?.map(super::RawFlag::into_bool))
    }
}

/// Body of the `PUT .../order` endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub order: i32,
}

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::EntryId;

/// characters a tag name may never contain
pub const FORBIDDEN_TAG_CHARS: &str = " .:;'#+*~";

/// a named, mutable pointer to the head of a chain
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ID")]
    pub id: EntryId,
}

impl Tag {
    pub fn new(name: impl Into<String>, id: EntryId) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

/// validate tag name
pub fn validate_tag_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidTagName("empty tag name".to_string()));
    }

    if let Some(c) = name.chars().find(|c| FORBIDDEN_TAG_CHARS.contains(*c)) {
        return Err(Error::InvalidTagName(format!(
            "'{}' contains forbidden character {:?}",
            name, c
        )));
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(Error::InvalidTagName(format!(
            "'{}' contains a control character",
            name.escape_default()
        )));
    }

    Ok(())
}

use glob::Pattern;

use crate::error::{Error, Result};
use crate::hive::MetaHive;
use crate::types::Tag;

/// list tags sorted by name, optionally filtered by a glob pattern
pub fn tags(meta: &dyn MetaHive, pattern: Option<&str>) -> Result<Vec<Tag>> {
    let pattern = pattern
        .map(|p| Pattern::new(p).map_err(|e| Error::InvalidPattern(format!("{}: {}", p, e))))
        .transpose()?;

    let mut tags: Vec<Tag> = meta
        .list_tags()?
        .into_iter()
        .filter(|t| pattern.as_ref().map_or(true, |p| p.matches(&t.name)))
        .collect();
    tags.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(tags)
}

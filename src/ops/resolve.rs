use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::hive::MetaHive;
use crate::types::{EntryId, Tag};

/// look up a tag, failing with `TagNotFound` if it does not exist
pub fn find_tag(meta: &dyn MetaHive, name: &str) -> Result<Tag> {
    meta.find_tag(name)?
        .ok_or_else(|| Error::TagNotFound(name.to_string()))
}

/// walk parent edges from `head` back to the root sentinel
///
/// returns the chain root-first. a missing edge or a revisited id means the
/// chain is broken.
pub fn resolve_chain(meta: &dyn MetaHive, head: EntryId) -> Result<Vec<EntryId>> {
    if head.is_root() {
        return Err(Error::BrokenChain(head));
    }

    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut current = head;

    loop {
        if !seen.insert(current) {
            return Err(Error::BrokenChain(current));
        }
        chain.push(current);

        match meta.find_parent(&current)? {
            Some(parent) if parent.is_root() => break,
            Some(parent) => current = parent,
            None => return Err(Error::BrokenChain(current)),
        }
    }

    chain.reverse();
    tracing::debug!(%head, length = chain.len(), "resolved chain");
    Ok(chain)
}

/// resolve the chain a tag points at
pub fn resolve_tag(meta: &dyn MetaHive, name: &str) -> Result<Vec<EntryId>> {
    let tag = find_tag(meta, name)?;
    resolve_chain(meta, tag.id)
}

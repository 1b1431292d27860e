//! Identity matching between a node and a candidate identifier.

use crate::canonical::canonicalize;
use crate::models::Node;

/// Returns `true` if `identifier` names `node`.
///
/// The identifier is canonicalized first, then compared against the
/// node's canonical name, lower-cased raw name, uid, and canonicalized
/// synonyms. Terms also match when the identifier parses as an integer
/// equal to their `idx`. Empty identifiers never match.
pub fn matches(node: &Node, identifier: &str) -> bool {
    let identifier = canonicalize(identifier);
    if identifier.is_empty() {
        return false;
    }

    if identifier == node.canonical_name {
        return true;
    }

    if identifier == node.raw_name.to_lowercase() {
        return true;
    }

    if identifier == node.uid.hyphenated().to_string() {
        return true;
    }

    if node.synonyms.iter().any(|s| canonicalize(s) == identifier) {
        return true;
    }

    match node.idx() {
        Some(idx) => identifier.parse::<u32>().is_ok_and(|n| n == idx),
        None => false,
    }
}

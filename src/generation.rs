//! Generation depth from the dot-notation person id.
//!
//! "0" is the progenitor (generation 1), "0.1" one of his children
//! (generation 2), and so on: the depth is simply the segment count.
//! Segment contents are not validated here.

/// Generation number of a person id. Always ≥ 1.
pub fn generation_of(external_id: &str) -> u32 {
    external_id.split('.').count() as u32
}

/// The id one generation up ("1.2.3" → "1.2"), or `None` for a single segment.
pub fn parent_id_of(external_id: &str) -> Option<&str> {
    external_id.rsplit_once('.').map(|(parent, _)| parent)
}

/// True when `child` extends `parent` by exactly one segment.
pub fn is_direct_extension(parent: &str, child: &str) -> bool {
    parent_id_of(child) == Some(parent)
}

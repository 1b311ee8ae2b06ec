//! Composite ids for Steam community guides.
//!
//! A guide id encodes its owning game: `guide_<appId>_<n>`, with `n`
//! counting from 1 in the order the guides were returned.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::tutorial::TutorialError;

pub const GUIDE_ID_PREFIX: &str = "guide_";

static GUIDE_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^guide_([^_]+)_(\d+)$").unwrap()
});

/// Build the id of the `sequence`-th guide of a game.
pub fn encode_guide_id(app_id: &str, sequence: usize) -> String {
    format!("{}{}_{}", GUIDE_ID_PREFIX, app_id, sequence)
}

/// Recover `(app_id, sequence)` from a guide id.
pub fn decode_guide_id(id: &str) -> Result<(String, usize), TutorialError> {
    let invalid = || TutorialError::InvalidIdentifier(id.to_string());
    let caps = GUIDE_ID_RE.captures(id).ok_or_else(invalid)?;
    let sequence = caps[2].parse::<usize>().map_err(|_| invalid())?;
    Ok((caps[1].to_string(), sequence))
}

/// Whether an id belongs to the guide namespace rather than a game.
pub fn is_guide_id(id: &str) -> bool {
    id.starts_with(GUIDE_ID_PREFIX)
}

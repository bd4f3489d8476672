//! Superset naming conventions.
//!
//! Two string contracts link the halves of a superset in older data:
//! - the combined display name `Superset (<primary>+<partner>)`
//! - the partner exercise id, which trainer-assigned history builds by
//!   appending [`PARTNER_ID_SUFFIX`] to the primary's exercise id
//!
//! Live sessions never write the suffix; they link halves with a
//! [`crate::PairLink`] instead.

const PREFIX: &str = "Superset (";

/// Reserved suffix marking a legacy partner exercise id. Generated ids are
/// UUIDs, which never contain an underscore.
pub const PARTNER_ID_SUFFIX: &str = "_partner";

/// Build the combined display name of a superset
pub fn display_name(primary: &str, partner: &str) -> String {
    format!("{}{}+{})", PREFIX, primary, partner)
}

/// Extract the primary movement name from a combined superset name
///
/// Captures everything between `Superset (` and the first `+`. Returns
/// `None` when the name does not follow the convention.
pub fn parse_primary(name: &str) -> Option<&str> {
    let rest = name.strip_prefix(PREFIX)?;
    if !rest.ends_with(')') {
        return None;
    }
    let plus = rest.find('+')?;
    let primary = rest[..plus].trim();
    if primary.is_empty() {
        None
    } else {
        Some(primary)
    }
}

/// The name a progress entry for this exercise is recorded under
pub fn primary_display_name(name: &str) -> &str {
    parse_primary(name).unwrap_or(name)
}

/// Whether a movement name can be embedded in a combined name and parsed back
pub fn is_embeddable(name: &str) -> bool {
    !name.contains('+') && !name.contains(')')
}

/// Legacy partner id for a primary exercise id
pub fn partner_exercise_id(primary_id: &str) -> String {
    format!("{}{}", primary_id, PARTNER_ID_SUFFIX)
}

/// Primary exercise id if `exercise_id` carries the partner suffix
pub fn strip_partner_suffix(exercise_id: &str) -> Option<&str> {
    exercise_id
        .strip_suffix(PARTNER_ID_SUFFIX)
        .filter(|base| !base.is_empty())
}

//! Status derivation from Steam presence codes.

use crate::models::{PlayerSummary, Status, VISIBILITY_PUBLIC};

/// Maps a Steam `personastate` code to a status. Unrecognized codes are
/// `Unknown`.
pub fn status_from_persona_state(persona_state: i32) -> Status {
    match persona_state {
        0 => Status::Offline,
        1 => Status::Online,
        2 => Status::Busy,
        3 => Status::Away,
        4 => Status::Snooze,
        5 => Status::LookingToTrade,
        6 => Status::LookingToPlay,
        _ => Status::Unknown,
    }
}

/// Status for a presence code pair. A non-public profile is `Private`
/// whatever its persona state.
pub fn derive_status_from_codes(persona_state: i32, visibility: i32) -> Status {
    if visibility != VISIBILITY_PUBLIC {
        return Status::Private;
    }
    status_from_persona_state(persona_state)
}

/// Status for an optional summary; no summary means `Unknown`.
pub fn derive_status(summary: Option<&PlayerSummary>) -> Status {
    match summary {
        None => Status::Unknown,
        Some(summary) => derive_status_from_codes(summary.persona_state, summary.visibility),
    }
}

//! Opaque invite tokens granting self-service join access to an event or folder.

use rand::distr::Alphanumeric;
use rand::Rng;

/// Length of generated invite tokens.
pub const INVITE_TOKEN_LEN: usize = 10;

/// Generate a random alphanumeric invite token.
///
/// Uniqueness is enforced by the `uq_events_invite_token` and
/// `uq_folders_invite_token` constraints, not here.
pub fn generate_invite_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(INVITE_TOKEN_LEN)
        .map(char::from)
        .collect()
}

//! Friend-code generation.

use rand::Rng;

/// Number of characters in a friend code.
pub const FRIEND_CODE_CHARS: usize = 6;

const CHARSET: &[u8] = b"0123456789ABCDEF";

/// Generate a random 6-character uppercase-hex friend code.
///
/// Uniqueness is enforced by the database; callers retry on collision.
pub fn generate_friend_code() -> String {
    let mut rng = rand::thread_rng();
    (0..FRIEND_CODE_CHARS)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

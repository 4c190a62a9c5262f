//! Join code generation for game sessions.
//!
//! Join codes are 6-character uppercase alphanumeric strings (base-36
//! alphabet) drawn from the OS's cryptographically secure RNG. Uniqueness
//! is enforced by the database's unique index plus a bounded regeneration
//! loop in the lobby service, not here.

use rand::distributions::Uniform;
use rand::prelude::*;
use rand::rngs::OsRng;

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub const JOIN_CODE_LEN: usize = 6;

/// Generate a shareable join code for a game session.
pub fn generate_join_code() -> String {
    let mut rng = OsRng;
    let dist = Uniform::from(0..ALPHABET.len());

    let mut s = String::with_capacity(JOIN_CODE_LEN);
    for _ in 0..JOIN_CODE_LEN {
        s.push(ALPHABET[dist.sample(&mut rng)] as char);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_code_has_correct_length() {
        assert_eq!(generate_join_code().len(), JOIN_CODE_LEN);
    }

    #[test]
    fn generated_code_is_uppercase_alphanumeric() {
        let code = generate_join_code();
        assert!(code
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn consecutive_codes_differ() {
        // 36^6 possibilities; a collision here would be astronomically unlucky.
        assert_ne!(generate_join_code(), generate_join_code());
    }
}

//! Session key generation

use rand::Rng;

/// Random 64 character hex key identifying a server-side session.
pub fn generate_session_key() -> String {
    let key: [u8; 32] = rand::rng().random();
    hex::encode(key)
}

/// Rejects cookie values that could never have been issued.
pub fn is_well_formed_session_key(key: &str) -> bool {
    key.len() == 64 && key.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_keys_are_unique_hex() {
        let a = generate_session_key();
        let b = generate_session_key();
        assert_ne!(a, b);
        assert!(is_well_formed_session_key(&a));
        assert!(!is_well_formed_session_key("../etc/passwd"));
    }
}

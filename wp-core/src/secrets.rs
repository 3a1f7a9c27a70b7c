//! Credential generation for instance databases.

use rand::prelude::*;

/// Default length of generated database passwords.
pub const PASSWORD_LENGTH: usize = 24;

/// URL-safe alphabet: passwords end up in DSNs and env files unescaped.
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                        abcdefghijklmnopqrstuvwxyz\
                        0123456789-_";

/// Generate a random password.
pub fn generate_random_password(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Generate a password with the default length.
pub fn generate_password() -> String {
    generate_random_password(PASSWORD_LENGTH)
}

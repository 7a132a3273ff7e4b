//! Shared-key comparison.

/// Compare two secrets without short-circuiting on the first mismatch.
///
/// Length differences still return early; only the contents are compared
/// in constant time.
pub fn secrets_match(expected: &str, provided: &str) -> bool {
    let (a, b) = (expected.as_bytes(), provided.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("k3y", "k3y"));
        assert!(!secrets_match("k3y", "k3z"));
        assert!(!secrets_match("k3y", "k3y "));
        assert!(!secrets_match("k3y", ""));
    }
}

/// Prefix carried by every client-generated (not yet acknowledged) id.
pub const PROVISIONAL_ID_PREFIX: &str = "temp-";

/// Generate a fresh provisional id for a thread or message.
pub fn provisional_id() -> String {
    format!("{}{}", PROVISIONAL_ID_PREFIX, uuid::Uuid::new_v4())
}

pub fn is_provisional_id(id: &str) -> bool {
    id.starts_with(PROVISIONAL_ID_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provisional_ids_are_unique_and_tagged() {
        let a = provisional_id();
        let b = provisional_id();
        assert_ne!(a, b);
        assert!(is_provisional_id(&a));
        assert!(!is_provisional_id("6f1c2a"));
    }
}

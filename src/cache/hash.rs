use xxhash_rust::xxh3::xxh3_64;

/// Content fingerprint function used for change detection.
pub type HashFn = fn(&[u8]) -> String;

/// XXH3-64 of the content as 16 lowercase hex digits.
pub fn content_hash(content: &[u8]) -> String {
    format!("{:016x}", xxh3_64(content))
}

pub fn get_hash_function() -> HashFn {
    content_hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_deterministic() {
        let content = b"import a from './a';";
        assert_eq!(content_hash(content), content_hash(content));
    }

    #[test]
    fn test_content_hash_different_content() {
        assert_ne!(content_hash(b"export {}"), content_hash(b"export { }"));
    }

    #[test]
    fn test_content_hash_format() {
        let hash = content_hash(b"");
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_get_hash_function() {
        let hash = get_hash_function();
        assert_eq!(hash(b"abc"), content_hash(b"abc"));
    }
}

//! Caller language names to remote runtime identifiers.

/// Fixed alias table, caller name on the left.
pub const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("java", "java"),
    ("python", "python3"),
    ("python3", "python3"),
    ("javascript", "javascript"),
    ("js", "javascript"),
    ("cpp", "cpp"),
    ("c", "c"),
    ("csharp", "csharp"),
    ("go", "go"),
    ("rust", "rust"),
];

/// Map a caller-supplied language name to the remote identifier.
///
/// Unknown names pass through unchanged; whether the remote actually
/// supports them is only known once it answers.
pub fn map_language(name: &str) -> &str {
    LANGUAGE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, target)| *target)
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_aliases() {
        assert_eq!(map_language("python"), "python3");
        assert_eq!(map_language("js"), "javascript");
        assert_eq!(map_language("csharp"), "csharp");
        assert_eq!(map_language("java"), "java");
    }

    #[test]
    fn test_unknown_language_passes_through() {
        assert_eq!(map_language("unknown-lang"), "unknown-lang");
        assert_eq!(map_language(""), "");
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert_eq!(map_language("Python"), "Python");
    }

    #[test]
    fn test_mapping_is_idempotent() {
        for (alias, _) in LANGUAGE_ALIASES {
            let once = map_language(alias);
            assert_eq!(map_language(once), once, "alias {alias}");
        }
    }
}

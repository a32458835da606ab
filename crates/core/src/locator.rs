//! Source locator comparison
//!
//! Locators are stored as plain strings: either filesystem paths or URIs with
//! a scheme and authority. Two locators name the same source when they match
//! exactly, when their last path segments match, or when their path
//! components match.

/// Returns true when both locators refer to the same source
pub fn same_location(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }

    if let (Some(left), Some(right)) = (last_segment(a), last_segment(b)) {
        if left == right {
            return true;
        }
    }

    match (path_of(a), path_of(b)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

/// Returns true when `candidate` matches any of `existing`
pub fn is_known(candidate: &str, existing: &[String]) -> bool {
    existing.iter().any(|known| same_location(candidate, known))
}

/// Last non-empty path segment of a locator
pub fn last_segment(locator: &str) -> Option<&str> {
    path_of(locator)?
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .last()
}

/// Path component of a locator with scheme, authority, query and fragment removed
fn path_of(locator: &str) -> Option<&str> {
    let rest = match locator.find("://") {
        Some(idx) => {
            let after_scheme = &locator[idx + 3..];
            match after_scheme.find('/') {
                Some(slash) => &after_scheme[slash..],
                None => "",
            }
        }
        None => locator,
    };

    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    let path = &rest[..end];

    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(same_location("/books/a.mp3", "/books/a.mp3"));
    }

    #[test]
    fn test_last_segment_match() {
        assert!(same_location(
            "content://media/tree/books/a.mp3",
            "/storage/emulated/0/books/a.mp3"
        ));
    }

    #[test]
    fn test_path_match_ignores_scheme_and_query() {
        assert!(same_location(
            "file://localhost/books/a.mp3?x=1",
            "file:///books/a.mp3"
        ));
    }

    #[test]
    fn test_different_files_do_not_match() {
        assert!(!same_location("/books/a.mp3", "/books/b.mp3"));
        assert!(!same_location("/books/a.mp3", ""));
    }

    #[test]
    fn test_locators_without_paths_only_match_exactly() {
        assert!(!same_location("content://a", "content://b"));
        assert!(!same_location("content://a?x=1", "content://b?x=1"));
        assert!(same_location("content://a", "content://a"));
    }

    #[test]
    fn test_last_segment_trailing_slash() {
        assert_eq!(last_segment("/books/Dune/"), Some("Dune"));
        assert_eq!(last_segment("C:\\books\\Dune"), Some("Dune"));
        assert_eq!(last_segment("content://authority"), None);
    }

    #[test]
    fn test_is_known() {
        let existing = vec!["/music/a.mp3".to_string()];
        assert!(is_known("/music/a.mp3", &existing));
        assert!(!is_known("/music/b.mp3", &existing));
    }
}

// Decides which columns of the input table are survey questions and which
// are metadata to skip.

/// Returns true when a column header should not appear in the report.
///
/// A header is ignored when it is blank, equals one of the `exact` entries,
/// or contains one of the `contains` entries as a substring. All comparisons
/// are case-insensitive on the trimmed header. The result depends only on
/// the arguments, so the set of processed columns is fully determined by the
/// configuration.
pub fn should_ignore(header: &str, exact: &[String], contains: &[String]) -> bool {
    let header_lower = header.trim().to_lowercase();
    if header_lower.is_empty() {
        return true;
    }
    if exact
        .iter()
        .any(|entry| entry.trim().to_lowercase() == header_lower)
    {
        return true;
    }
    if contains
        .iter()
        .any(|term| !term.is_empty() && header_lower.contains(&term.to_lowercase()))
    {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::should_ignore;

    fn list(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn blank_headers_are_ignored() {
        assert!(should_ignore("", &[], &[]));
        assert!(should_ignore("   ", &[], &[]));
    }

    #[test]
    fn exact_match_is_case_insensitive() {
        let exact = list(&["School Name"]);
        assert!(should_ignore("school name", &exact, &[]));
        assert!(should_ignore("  SCHOOL NAME ", &exact, &[]));
        assert!(!should_ignore("school name (optional)", &exact, &[]));
    }

    #[test]
    fn substring_match_is_not_word_bound() {
        let contains = list(&["timestamp"]);
        assert!(should_ignore("Created Timestamp (UTC)", &[], &contains));
        assert!(!should_ignore("How long did it take?", &[], &contains));
    }

    #[test]
    fn list_order_does_not_matter() {
        let a = list(&["url", "tags"]);
        let b = list(&["tags", "url"]);
        for header in ["Page URL", "Tags", "Favorite color"] {
            assert_eq!(
                should_ignore(header, &[], &a),
                should_ignore(header, &[], &b)
            );
        }
    }

    #[test]
    fn regular_questions_pass() {
        let exact = list(&["School Name"]);
        let contains = list(&["submission id", "submit date"]);
        assert!(!should_ignore(
            "How satisfied are you with the event?",
            &exact,
            &contains
        ));
    }
}

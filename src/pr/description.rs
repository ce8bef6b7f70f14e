//! Pull request description template enforcement.

use lazy_static::lazy_static;
use regex::Regex;

const REQUIRED_SECTIONS: [&str; 3] = ["## Summary", "## Changes", "## Testing"];

const SUMMARY_SECTION: &str = "## Summary\n<!-- Provide a brief summary of your changes -->\n\n";
const CHANGES_SECTION: &str = "\n\n## Changes\n<!-- List the changes you've made -->\n- ";
const TESTING_SECTION: &str = "\n\n## Testing\n<!-- Describe how you tested your changes -->";

const EMPTY_TEMPLATE: &str = "## Summary
<!-- Provide a brief summary of your changes -->

## Changes
<!-- List the changes you've made -->
-

## Testing
<!-- Describe how you tested your changes -->
";

lazy_static! {
    static ref SUMMARY_HEADING: Regex = Regex::new(r"(?i)##\s*Summary").unwrap();
    static ref CHANGES_HEADING: Regex = Regex::new(r"(?i)##\s*Changes").unwrap();
    static ref TESTING_HEADING: Regex = Regex::new(r"(?i)##\s*Testing").unwrap();
}

/// A description needs formatting when it is empty or lacks any of the
/// `## Summary`, `## Changes` and `## Testing` headings verbatim.
pub fn needs_description_formatting(description: &str) -> bool {
    if description.trim().is_empty() {
        return true;
    }
    !REQUIRED_SECTIONS
        .iter()
        .all(|section| description.contains(section))
}

/// Add whichever sections are missing. Summary goes on top, the others at
/// the bottom; existing text is kept as is.
pub fn format_pr_description(description: &str) -> String {
    if description.trim().is_empty() {
        return EMPTY_TEMPLATE.to_string();
    }

    let mut formatted = String::with_capacity(description.len() + 256);

    if !SUMMARY_HEADING.is_match(description) {
        formatted.push_str(SUMMARY_SECTION);
    }
    formatted.push_str(description);
    if !CHANGES_HEADING.is_match(description) {
        formatted.push_str(CHANGES_SECTION);
    }
    if !TESTING_HEADING.is_match(description) {
        formatted.push_str(TESTING_SECTION);
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_description_gets_template() {
        assert!(needs_description_formatting(""));
        assert!(needs_description_formatting("  \n"));
        let formatted = format_pr_description("");
        for section in REQUIRED_SECTIONS {
            assert!(formatted.contains(section));
        }
    }

    #[test]
    fn test_complete_description_left_alone() {
        let body = "## Summary\nFix\n\n## Changes\n- x\n\n## Testing\nran it";
        assert!(!needs_description_formatting(body));
    }

    #[test]
    fn test_missing_sections_added_around_body() {
        let formatted = format_pr_description("Fixes the login bug.");
        assert!(formatted.starts_with(SUMMARY_SECTION));
        assert!(formatted.contains("Fixes the login bug."));
        assert!(formatted.ends_with(TESTING_SECTION));
        assert!(formatted.contains("## Changes"));
        assert!(!needs_description_formatting(&formatted));
    }

    #[test]
    fn test_case_insensitive_detection_prevents_duplicates() {
        // "##summary" isn't the exact heading, so formatting is still needed,
        // but no second summary section is added.
        let body = "##summary\nthing\n\n## changes\n- a";
        assert!(needs_description_formatting(body));

        let formatted = format_pr_description(body);
        assert!(formatted.starts_with("##summary"));
        assert!(!formatted.contains("## Changes"));
        assert!(formatted.ends_with(TESTING_SECTION));
    }
}

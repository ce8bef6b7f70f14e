//! File statistics for a pull request and the comment that reports them.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::github::PullRequestFile;

/// Above this many changed lines a PR is flagged as large.
pub const LARGE_PR_THRESHOLD: u64 = 500;

/// Extension bucket for files without one.
const NO_EXTENSION: &str = "no_extension";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Analysis {
    pub file_count: usize,
    /// Extension -> number of files, sorted by extension
    pub file_types: BTreeMap<String, usize>,
    pub additions: u64,
    pub deletions: u64,
    pub total_changes: u64,
    pub is_large_pr: bool,
    pub has_tests: bool,
}

/// What the AI reviewer produced for the comment, if one is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    Review(String),
    Failed(String),
}

pub fn analyze_files(files: &[PullRequestFile]) -> Analysis {
    let mut analysis = Analysis {
        file_count: files.len(),
        ..Analysis::default()
    };

    for file in files {
        *analysis
            .file_types
            .entry(extension_of(&file.filename).to_string())
            .or_insert(0) += 1;
        analysis.additions += file.additions;
        analysis.deletions += file.deletions;
        analysis.total_changes += file.changes;
    }

    analysis.is_large_pr = analysis.total_changes > LARGE_PR_THRESHOLD;
    analysis.has_tests = files
        .iter()
        .any(|f| f.filename.to_lowercase().contains("test"));
    analysis
}

/// Text after the last dot of the path, or `no_extension`.
fn extension_of(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => NO_EXTENSION,
    }
}

pub fn create_pr_comment(analysis: &Analysis, review: Option<&ReviewOutcome>) -> String {
    let mut comment = String::from("## PR Analysis Results\n\n");

    // Writing to a String cannot fail
    let _ = writeln!(comment, "**Files changed:** {}", analysis.file_count);
    let _ = writeln!(
        comment,
        "**Total changes:** {} (+{}, -{})\n",
        analysis.total_changes, analysis.additions, analysis.deletions
    );

    comment.push_str("**File types:**\n");
    for (ext, count) in &analysis.file_types {
        let _ = writeln!(comment, "- {}: {}", ext, count);
    }

    comment.push_str("\n### Suggestions\n");
    if analysis.is_large_pr {
        comment.push_str(
            "⚠️ **This is a large PR.** Consider breaking it down into smaller PRs.\n",
        );
    }
    if !analysis.has_tests && analysis.file_count > 1 {
        comment.push_str(
            "📝 **No test files detected.** Consider adding tests for your changes.\n",
        );
    }

    match review {
        Some(ReviewOutcome::Review(text)) => {
            let _ = write!(comment, "\n### AI Review\n\n{}\n", text.trim());
        }
        Some(ReviewOutcome::Failed(reason)) => {
            let _ = write!(
                comment,
                "\n### AI Review\n\n_AI review unavailable: {}_\n",
                reason
            );
        }
        None => {}
    }

    comment
}

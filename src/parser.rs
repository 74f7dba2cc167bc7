//! JSONL persistence for issue sets: one `Issue` per line, `#`-comments and
//! blank lines skipped on read.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::error::ParseError;
use crate::graph::Issue;

/// Load an issue set from a JSONL file.
pub fn load_issues<P: AsRef<Path>>(path: P) -> Result<Vec<Issue>, ParseError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut issues = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let issue: Issue = serde_json::from_str(trimmed).map_err(|e| ParseError::Json {
            line: line_num + 1,
            source: e,
        })?;
        issues.push(issue);
    }

    Ok(issues)
}

/// Save an issue set to a JSONL file, one issue per line in slice order.
pub fn save_issues<P: AsRef<Path>>(issues: &[Issue], path: P) -> Result<(), ParseError> {
    let mut file = OpenOptions::new().write(true).create(true).truncate(true).open(path)?;

    for issue in issues {
        let json = serde_json::to_string(issue).map_err(|e| ParseError::Json { line: 0, source: e })?;
        writeln!(file, "{}", json)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let issues = load_issues(file.path()).unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn load_single_issue() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"id":"t1","title":"Test","status":"open","created_at":"2025-01-01T00:00:00Z","updated_at":"2025-01-01T00:00:00Z"}}"#
        )
        .unwrap();

        let issues = load_issues(file.path()).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, "t1");
    }

    #[test]
    fn load_skips_empty_lines_and_comments() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# a comment").unwrap();
        writeln!(file, "").unwrap();
        writeln!(
            file,
            r#"{{"id":"t1","title":"Test","status":"open","created_at":"2025-01-01T00:00:00Z","updated_at":"2025-01-01T00:00:00Z"}}"#
        )
        .unwrap();
        writeln!(file, "   ").unwrap();

        let issues = load_issues(file.path()).unwrap();
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn load_invalid_json_reports_line_number() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let result = load_issues(file.path());
        assert!(matches!(result, Err(ParseError::Json { line: 1, .. })));
    }

    #[test]
    fn save_and_load_roundtrip() {
        use crate::graph::{IssueType, Status};
        use chrono::Utc;

        let issues = vec![
            Issue {
                id: "t1".to_string(),
                title: "Task 1".to_string(),
                description: None,
                status: Status::Open,
                priority: 2,
                issue_type: IssueType::Task,
                labels: vec![],
                estimated_minutes: None,
                content_hash: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                closed_at: None,
                dependencies: vec![],
            },
            Issue {
                id: "t2".to_string(),
                title: "Task 2".to_string(),
                description: None,
                status: Status::Closed,
                priority: 2,
                issue_type: IssueType::Task,
                labels: vec![],
                estimated_minutes: None,
                content_hash: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                closed_at: Some(Utc::now()),
                dependencies: vec![],
            },
        ];

        let file = NamedTempFile::new().unwrap();
        save_issues(&issues, file.path()).unwrap();
        let loaded = load_issues(file.path()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].status, crate::graph::Status::Closed);
    }

    #[test]
    fn load_nonexistent_file_returns_error() {
        let result = load_issues("/nonexistent/path/issues.jsonl");
        assert!(matches!(result, Err(ParseError::Io(_))));
    }
}

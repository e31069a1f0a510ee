use std::{io, path::Path, thread};

use tracing::debug;

use crate::{
    error::ValidationError,
    parser::{self, Rule},
    report::{UnusedRule, ValidationReport},
};

/// Supplies the regular files found under one tracked folder by recursive
/// traversal. Symlink and permission-error policy belongs to the
/// implementation, not to the engine.
pub trait FileSource {
    fn files_under(&self, folder: &str) -> io::Result<Vec<String>>;
}

/// Run a full consistency check of the manifest at `manifest` against the
/// trees rooted at `folders`. The manifest is parsed while the folders are
/// being enumerated; matching starts once both are done.
///
/// Succeeds only when every file is covered by at least one rule and every
/// relevant rule matched at least one file. Any inconsistency is returned as
/// a single [`ValidationError::Inconsistent`] carrying the complete report.
pub fn validate<S>(manifest: &Path, folders: &[String], source: &S) -> Result<(), ValidationError>
where
    S: FileSource + Sync,
{
    let (rules, files) = thread::scope(|scope| {
        let files = scope.spawn(|| enumerate(folders, source));
        let rules =
            parser::parse_file(manifest).map_err(|source| ValidationError::ManifestUnreadable {
                path: manifest.to_path_buf(),
                source,
            });
        let files = files.join().expect("file enumeration thread panicked");
        Ok::<_, ValidationError>((rules?, files?))
    })?;

    debug!(
        rules = rules.len(),
        files = files.len(),
        "manifest loaded, tracked folders enumerated"
    );

    let report = check(&rules, folders, &files);
    if report.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Inconsistent(report))
    }
}

/// The pure matching and aggregation phase: every file is tested against
/// every rule, crediting all matching rules; files with zero matches are
/// uncovered, and rules with zero credit that are relevant to one of the
/// folders are orphans.
pub fn check(rules: &[Rule], folders: &[String], files: &[String]) -> ValidationReport {
    let (counts, uncovered_files) = match_files(rules, files);

    let unused_rules = rules
        .iter()
        .zip(&counts)
        .filter(|&(_, &count)| count == 0)
        .filter(|(rule, _)| folders.iter().any(|f| rule.pattern.is_relevant_to(f)))
        .map(|(rule, _)| UnusedRule {
            pattern: rule.pattern.text().to_owned(),
            line: rule.line,
            owners: rule.owners.clone(),
        })
        .collect();

    let report = ValidationReport {
        uncovered_files,
        unused_rules,
    };
    debug!(
        uncovered = report.uncovered_files.len(),
        unused = report.unused_rules.len(),
        "matching complete"
    );
    report
}

fn enumerate<S>(folders: &[String], source: &S) -> Result<Vec<String>, ValidationError>
where
    S: FileSource + ?Sized,
{
    let mut files = Vec::new();
    for folder in folders {
        let found =
            source
                .files_under(folder)
                .map_err(|source| ValidationError::FolderUnreadable {
                    folder: folder.clone(),
                    source,
                })?;
        debug!(folder = folder.as_str(), files = found.len(), "enumerated");
        files.extend(found);
    }
    Ok(files)
}

fn match_one(rules: &[Rule], counts: &mut [u64], uncovered: &mut Vec<String>, file: &str) {
    let mut matched = false;
    for (idx, rule) in rules.iter().enumerate() {
        if rule.pattern.matches(file) {
            counts[idx] += 1;
            matched = true;
        }
    }
    if !matched {
        uncovered.push(file.to_owned());
    }
}

// Matching fans out across files with per-task (counts, uncovered)
// accumulators merged at the end, so rule counters are never shared
// between tasks.
#[cfg(feature = "parallel")]
fn match_files(rules: &[Rule], files: &[String]) -> (Vec<u64>, Vec<String>) {
    use rayon::prelude::*;

    files
        .par_iter()
        .fold(
            || (vec![0u64; rules.len()], Vec::new()),
            |(mut counts, mut uncovered), file| {
                match_one(rules, &mut counts, &mut uncovered, file);
                (counts, uncovered)
            },
        )
        .reduce(
            || (vec![0u64; rules.len()], Vec::new()),
            |(mut counts, mut uncovered), (task_counts, task_uncovered)| {
                for (total, part) in counts.iter_mut().zip(task_counts) {
                    *total += part;
                }
                uncovered.extend(task_uncovered);
                (counts, uncovered)
            },
        )
}

#[cfg(not(feature = "parallel"))]
fn match_files(rules: &[Rule], files: &[String]) -> (Vec<u64>, Vec<String>) {
    let mut counts = vec![0u64; rules.len()];
    let mut uncovered = Vec::new();
    for file in files {
        match_one(rules, &mut counts, &mut uncovered, file);
    }
    (counts, uncovered)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    struct StaticSource(Vec<(&'static str, Vec<&'static str>)>);

    impl FileSource for StaticSource {
        fn files_under(&self, folder: &str) -> io::Result<Vec<String>> {
            self.0
                .iter()
                .find(|(root, _)| *root == folder)
                .map(|(_, files)| files.iter().map(|f| f.to_string()).collect())
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, folder.to_owned()))
        }
    }

    fn rules(manifest: &[&str]) -> Vec<Rule> {
        parser::parse(&manifest.join("\n"))
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_all_files_covered_and_all_rules_used() {
        let report = check(
            &rules(&["/pkg/lib @owner", "/pkg/utils @owner"]),
            &strings(&["pkg"]),
            &strings(&["pkg/lib/index.ts", "pkg/utils/helper.ts"]),
        );
        assert!(report.is_empty(), "unexpected report: {}", report);
    }

    #[test]
    fn test_uncovered_file_is_reported() {
        let report = check(
            &rules(&["/pkg/lib @owner"]),
            &strings(&["pkg"]),
            &strings(&["pkg/lib/index.ts", "pkg/unowned/file.ts"]),
        );
        assert_eq!(report.uncovered_files, vec!["pkg/unowned/file.ts"]);
        assert!(report.unused_rules.is_empty());
    }

    #[test]
    fn test_orphaned_rule_is_reported() {
        let report = check(
            &rules(&["/pkg/lib @owner", "/pkg/removed @owner"]),
            &strings(&["pkg"]),
            &strings(&["pkg/lib/index.ts"]),
        );
        assert!(report.uncovered_files.is_empty());
        assert_eq!(report.unused_rules.len(), 1);
        assert_eq!(report.unused_rules[0].pattern, "pkg/removed");
        assert_eq!(report.unused_rules[0].line, 2);
        assert_eq!(report.unused_rules[0].owners, vec!["@owner"]);
    }

    #[test]
    fn test_irrelevant_rule_is_not_reported() {
        let report = check(
            &rules(&["/pkg/lib @owner", "/docs @owner"]),
            &strings(&["pkg"]),
            &strings(&["pkg/lib/index.ts"]),
        );
        assert!(report.is_empty(), "unexpected report: {}", report);
    }

    #[test]
    fn test_basename_glob_covers_nested_files() {
        let report = check(
            &rules(&["*.ts @owner"]),
            &strings(&["pkg"]),
            &strings(&["pkg/lib/index.ts", "pkg/lib/utils.ts"]),
        );
        assert!(report.is_empty(), "unexpected report: {}", report);
    }

    #[test]
    fn test_both_failure_kinds_in_one_report() {
        let report = check(
            &rules(&["/pkg/lib @owner", "/pkg/removed @owner"]),
            &strings(&["pkg"]),
            &strings(&["pkg/lib/index.ts", "pkg/stray.md"]),
        );
        assert_eq!(report.uncovered_files, vec!["pkg/stray.md"]);
        assert_eq!(report.unused_rules.len(), 1);
    }

    #[test]
    fn test_overlapping_rules_all_credited() {
        let rules = rules(&["/pkg", "*.ts", "/pkg/lib"]);
        let files = strings(&["pkg/lib/a.ts", "pkg/lib/b.ts", "pkg/readme.md"]);

        let (counts, uncovered) = match_files(&rules, &files);

        // Strictly sequential reference aggregation.
        let mut expected = vec![0u64; rules.len()];
        for file in &files {
            for (idx, rule) in rules.iter().enumerate() {
                if rule.pattern.matches(file) {
                    expected[idx] += 1;
                }
            }
        }
        assert_eq!(counts, expected);
        assert_eq!(counts, vec![3, 2, 2]);
        assert!(uncovered.is_empty());
    }

    #[test]
    fn test_no_rules_means_everything_uncovered() {
        let report = check(&[], &strings(&["pkg"]), &strings(&["pkg/a", "pkg/b"]));
        assert_eq!(report.uncovered_files.len(), 2);
        assert!(report.unused_rules.is_empty());
    }

    #[test]
    fn test_missing_manifest_is_fatal() {
        let source = StaticSource(vec![("pkg", vec![])]);
        let err = validate(
            &PathBuf::from("does/not/exist/CODEOWNERS"),
            &strings(&["pkg"]),
            &source,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::ManifestUnreadable { .. }));
    }

    #[test]
    fn test_unreadable_folder_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("CODEOWNERS");
        std::fs::write(&manifest, "/pkg @owner\n").unwrap();

        let source = StaticSource(vec![("pkg", vec!["pkg/a.ts"])]);
        let err = validate(&manifest, &strings(&["missing"]), &source).unwrap_err();
        assert!(matches!(err, ValidationError::FolderUnreadable { .. }));
    }

    #[test]
    fn test_validate_reports_inconsistency() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("CODEOWNERS");
        std::fs::write(&manifest, "/pkg/lib @owner\n").unwrap();

        let source = StaticSource(vec![("pkg", vec!["pkg/lib/a.ts", "pkg/stray.md"])]);
        let err = validate(&manifest, &strings(&["pkg"]), &source).unwrap_err();
        match err {
            ValidationError::Inconsistent(report) => {
                assert_eq!(report.uncovered_files, vec!["pkg/stray.md"]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}

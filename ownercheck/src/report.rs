use std::fmt;

/// The aggregated outcome of one validation run. Both collections empty
/// means the manifest and the tracked trees are consistent; anything else is
/// a failure, and the report is the complete diagnostic for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Files matched by zero rules.
    pub uncovered_files: Vec<String>,
    /// Rules that matched zero files but are relevant to the tracked
    /// folders.
    pub unused_rules: Vec<UnusedRule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedRule {
    pub pattern: String,
    pub line: usize,
    /// Owner tokens from the manifest line, echoed in diagnostics so the
    /// team that wrote the rule is visible in the failure output.
    pub owners: Vec<String>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.uncovered_files.is_empty() && self.unused_rules.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.uncovered_files.is_empty() {
            writeln!(
                f,
                "{} file(s) not covered by any ownership rule:",
                self.uncovered_files.len()
            )?;
            for file in &self.uncovered_files {
                writeln!(f, "  {}", file)?;
            }
        }
        if !self.unused_rules.is_empty() {
            writeln!(
                f,
                "{} ownership rule(s) matching no files:",
                self.unused_rules.len()
            )?;
            for rule in &self.unused_rules {
                if rule.owners.is_empty() {
                    writeln!(f, "  line {}: {}", rule.line, rule.pattern)?;
                } else {
                    writeln!(
                        f,
                        "  line {}: {}  ({})",
                        rule.line,
                        rule.pattern,
                        rule.owners.join(" ")
                    )?;
                }
            }
        }
        Ok(())
    }
}

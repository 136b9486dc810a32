use colored::Colorize;
use std::io::IsTerminal;

use crate::core::config::{ConfigSource, SourceKind};
use crate::core::engine::{AuditReport, Finding, short_sha};

/// Sink for the human-readable diagnostics every command prints.
///
/// Errors always go out; everything else respects `--quiet`.
pub trait Reporter {
    fn error(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn info(&self, msg: &str);
    fn hint(&self, msg: &str);
    /// Rings the terminal bell after a blocked check.
    fn bell(&self);
}

/// Writes `snag:`-prefixed lines to stderr and reports to stdout.
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Reports a blocked check with the matched pattern and where it was found.
    pub fn violation(&self, finding: &Finding) {
        self.error(&format!(
            "match {:?} in {}",
            finding.violation.pattern, finding.target
        ));
        self.bell();
    }

    /// Prints each offending commit with its violations, then a summary line.
    pub fn print_audit(&self, report: &AuditReport) {
        if !self.quiet {
            for commit in &report.reports {
                println!();
                println!("  {} - {:?}", short_sha(&commit.sha).yellow(), commit.subject);
                for violation in &commit.violations {
                    println!(
                        "    {} match {} in commit {}",
                        format!("{}:", violation.phase).dimmed(),
                        format!("{:?}", violation.pattern).red().bold(),
                        violation.phase
                    );
                }
            }
            if !report.reports.is_empty() {
                println!();
            }
        }

        let total = report.total_violations();
        if total > 0 {
            self.info(&format!(
                "{} violations found in {} of {} commits",
                total,
                report.reports.len(),
                report.commits_scanned
            ));
        } else {
            self.info(&format!(
                "0 violations found in {} commits",
                report.commits_scanned
            ));
        }
    }

    /// Provenance listing for `snag config`.
    pub fn print_sources(&self, sources: &[ConfigSource]) {
        for (i, source) in sources.iter().enumerate() {
            if i > 0 {
                println!();
            }
            println!("{}", format!("# {}", source.label).dimmed());

            match source.kind {
                SourceKind::Legacy => print_section("patterns", &source.diff),
                SourceKind::Environment if source.branch.is_empty() => {
                    print_section("patterns", &source.diff)
                }
                SourceKind::Suppression => {
                    let entries: Vec<String> =
                        source.suppressions.iter().map(ToString::to_string).collect();
                    print_section("ignore", &entries);
                }
                _ => {
                    print_section("diff", &source.diff);
                    print_section("msg", &source.msg);
                    if let Some(push) = &source.push {
                        // An explicit empty list is meaningful, show it.
                        if push.is_empty() {
                            println!("  {:<8} (none)", "push:");
                        } else {
                            print_section("push", push);
                        }
                    }
                    print_section("branch", &source.branch);
                }
            }
        }

        if sources.iter().all(|s| s.push.is_none()) {
            println!();
            println!("{}", "# push: inherits union of diff + msg".dimmed());
        }
    }
}

fn print_section(name: &str, patterns: &[String]) {
    if patterns.is_empty() {
        return;
    }
    println!("  {:<8} {}", format!("{name}:"), patterns.join(", "));
}

impl Reporter for ConsoleReporter {
    fn error(&self, msg: &str) {
        eprintln!("{} {}", "snag:".red().bold(), msg);
    }

    fn warn(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{} {}", "snag:".yellow(), msg);
        }
    }

    fn info(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{} {}", "snag:".green(), msg);
        }
    }

    fn hint(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{}", format!("  {msg}").dimmed());
        }
    }

    fn bell(&self) {
        if !self.quiet && std::io::stderr().is_terminal() {
            eprint!("\x07");
        }
    }
}

//! Test-runner compaction: pytest, `cargo test` and `go test`.
//!
//! All three keep failures with their assertion context and a one-line
//! summary, and drop per-test success lines. When the runner printed no
//! summary, one is synthesized from the markers counted on the way.

use ctk_core::FilterConfig;
use regex::Regex;
use std::sync::LazyLock;

/// Join the non-zero counts, e.g. `"1 failed, 50 passed"`.
pub fn count_summary(counts: &[(usize, &str)]) -> Option<String> {
    let parts: Vec<String> = counts
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, label)| format!("{n} {label}"))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Line budget for one failure or captured-output block.
#[derive(Debug)]
struct Budget {
    limit: usize,
    used: usize,
    overflow: usize,
}

impl Budget {
    fn new(limit: usize) -> Self {
        Self { limit, used: 0, overflow: 0 }
    }

    fn keep(&mut self) -> bool {
        if self.used < self.limit {
            self.used += 1;
            true
        } else {
            self.overflow += 1;
            false
        }
    }

    /// Emit the overflow annotation, if any, and reset.
    fn close(&mut self, out: &mut Vec<String>) {
        if self.overflow > 0 {
            out.push(format!("... ({} more lines)", self.overflow));
        }
        self.used = 0;
        self.overflow = 0;
    }
}

// ==================== pytest ====================

static RE_PY_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^={3,} ?(.*?) ?={3,}$").unwrap());
static RE_PY_TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^_{3,} (.+?) _{3,}$").unwrap());
static RE_PY_CAPTURED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-{3,} (Captured .+?|Captured) -{3,}$").unwrap());
static RE_PY_RESULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+::\S.*?) (PASSED|FAILED|ERROR|SKIPPED|XFAIL|XPASS)\b.*?(\s+\[\s*\d+%\])?$")
        .unwrap()
});
static RE_PY_PROGRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+\.py) ([.sFExX]+)(\s+\[\s*\d+%\])?$").unwrap());
/// `-q` progress: markers without a file prefix, always with a percentage.
static RE_PY_QUIET_PROGRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([.sFExX]+)\s+\[\s*\d+%\]$").unwrap());
/// `-q` final summary, printed without `=` decoration.
static RE_PY_BARE_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+ [a-z]+|no tests ran)(, \d+ [a-z]+)* in \d+(\.\d+)?s\b").unwrap()
});
static RE_PY_COLLECTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^collect(ed|ing) \d+ items?").unwrap());
static RE_PY_LOCATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\S+:\d+: \S").unwrap());
static RE_PY_COUNTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d+ (passed|failed|errors?|skipped|xfailed|xpassed|warnings?|deselected)\b")
        .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PySection {
    Body,
    Failures,
    ShortSummary,
    Discard,
}

#[derive(Debug, Default)]
struct PyCounts {
    passed: usize,
    failed: usize,
    errors: usize,
    skipped: usize,
}

impl PyCounts {
    fn record(&mut self, outcome: &str) {
        match outcome {
            "PASSED" | "XPASS" | "." | "X" => self.passed += 1,
            "FAILED" | "F" => self.failed += 1,
            "ERROR" | "E" => self.errors += 1,
            "SKIPPED" | "XFAIL" | "s" | "x" => self.skipped += 1,
            _ => {}
        }
    }

    fn summary(&self) -> Option<String> {
        count_summary(&[
            (self.failed, "failed"),
            (self.errors, "errors"),
            (self.passed, "passed"),
            (self.skipped, "skipped"),
        ])
    }
}

/// Result markers of a progress line, verbose (`file.py ..F`) or quiet.
fn progress_markers(line: &str) -> Option<&str> {
    if let Some(caps) = RE_PY_PROGRESS.captures(line) {
        return caps.get(2).map(|m| m.as_str());
    }
    RE_PY_QUIET_PROGRESS.captures(line).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

/// Compact pytest output. `None` when no pytest structure is present.
pub fn compact_pytest(text: &str, config: &FilterConfig) -> Option<String> {
    let mut out: Vec<String> = Vec::new();
    let mut section = PySection::Body;
    let mut counts = PyCounts::default();
    let mut summary: Option<String> = None;
    let mut recognized = false;
    let mut failure_budget = Budget::new(config.max_failure_lines);
    let mut capture_budget: Option<Budget> = None;
    // Indexes of verbose `FAILED` lines, dropped if the short summary repeats them.
    let mut verbose_failures: Vec<(usize, String)> = Vec::new();
    let mut short_summary: Vec<String> = Vec::new();

    for line in text.lines() {
        if let Some(caps) = RE_PY_SECTION.captures(line) {
            recognized = true;
            if let Some(mut b) = capture_budget.take() {
                b.close(&mut out);
            }
            failure_budget.close(&mut out);
            let title = caps[1].trim();
            if title.is_empty() {
                continue;
            }
            let lower = title.to_ascii_lowercase();
            section = if lower.contains("test session starts") {
                PySection::Body
            } else if title == "FAILURES" || title == "ERRORS" {
                out.push(title.to_string());
                PySection::Failures
            } else if lower.contains("short test summary") {
                PySection::ShortSummary
            } else if RE_PY_COUNTS.is_match(title) {
                summary = Some(title.to_string());
                PySection::Body
            } else if lower.contains("warnings summary") || title == "PASSES" {
                PySection::Discard
            } else {
                out.push(title.to_string());
                PySection::Body
            };
            continue;
        }

        match section {
            PySection::Discard => {}
            PySection::ShortSummary => {
                if RE_PY_BARE_SUMMARY.is_match(line) {
                    summary = Some(line.trim().to_string());
                } else if line.starts_with("FAILED ") || line.starts_with("ERROR ") {
                    short_summary.push(line.to_string());
                    out.push(line.to_string());
                }
            }
            PySection::Failures => {
                if let Some(caps) = RE_PY_TITLE.captures(line) {
                    if let Some(mut b) = capture_budget.take() {
                        b.close(&mut out);
                    }
                    failure_budget.close(&mut out);
                    out.push(format!("__ {} __", &caps[1]));
                } else if let Some(caps) = RE_PY_CAPTURED.captures(line) {
                    if let Some(mut b) = capture_budget.take() {
                        b.close(&mut out);
                    }
                    out.push(format!("-- {} --", &caps[1]));
                    capture_budget = Some(Budget::new(config.max_captured_lines));
                } else if let Some(b) = capture_budget.as_mut() {
                    if b.keep() {
                        out.push(line.to_string());
                    }
                } else if line.starts_with('>')
                    || line == "E"
                    || line.starts_with("E ")
                    || RE_PY_LOCATION.is_match(line)
                {
                    if failure_budget.keep() {
                        out.push(line.to_string());
                    }
                }
            }
            PySection::Body => {
                if let Some(caps) = RE_PY_RESULT.captures(line) {
                    recognized = true;
                    let outcome = &caps[2];
                    counts.record(outcome);
                    if outcome == "FAILED" || outcome == "ERROR" {
                        let kept = format!("{} {}", &caps[1], outcome);
                        verbose_failures.push((out.len(), caps[1].to_string()));
                        out.push(kept);
                    }
                } else if let Some(markers) = progress_markers(line) {
                    recognized = true;
                    let mut buf = [0u8; 4];
                    for c in markers.chars() {
                        counts.record(c.encode_utf8(&mut buf));
                    }
                } else if RE_PY_BARE_SUMMARY.is_match(line) {
                    recognized = true;
                    summary = Some(line.trim().to_string());
                } else if RE_PY_COLLECTED.is_match(line) {
                    recognized = true;
                } else if !line.trim().is_empty() {
                    out.push(line.to_string());
                }
            }
        }
    }

    if let Some(mut b) = capture_budget.take() {
        b.close(&mut out);
    }
    failure_budget.close(&mut out);

    if !recognized {
        return None;
    }

    if !short_summary.is_empty() {
        let repeated: Vec<usize> = verbose_failures
            .iter()
            .filter(|(_, id)| {
                short_summary
                    .iter()
                    .any(|s| s.split_whitespace().nth(1) == Some(id.as_str()))
            })
            .map(|(idx, _)| *idx)
            .collect();
        out = out
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !repeated.contains(i))
            .map(|(_, l)| l)
            .collect();
    }

    if let Some(s) = summary.or_else(|| counts.summary()) {
        out.push(s);
    }
    Some(out.join("\n"))
}

// ==================== cargo test ====================

static RE_CARGO_RUNNING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^running \d+ tests?$").unwrap());
static RE_CARGO_TEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^test (.+?) \.\.\. (ok|ignored|FAILED)\b").unwrap());
static RE_CARGO_STDOUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^---- (.+) (stdout|stderr) ----$").unwrap());
static RE_CARGO_RESULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^test result: (ok|FAILED)\. (.*)$").unwrap());
static RE_CARGO_FIELD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+) (.+)$").unwrap());
static RE_BACKTRACE_NOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^note: run with `RUST_BACKTRACE=").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CargoSection {
    Body,
    Failures,
    FailureList,
}

/// Rewrite a `test result:` line without its zero-valued fields. `None` when
/// nothing ran.
fn compact_cargo_result(status: &str, fields: &str) -> Option<String> {
    let mut passed = 0usize;
    let mut failed = 0usize;
    let mut kept = Vec::new();
    for field in fields.split("; ") {
        match RE_CARGO_FIELD.captures(field) {
            Some(caps) => {
                let n: usize = caps[1].parse().unwrap_or(0);
                match &caps[2] {
                    "passed" => passed = n,
                    "failed" => failed = n,
                    _ => {}
                }
                if n > 0 {
                    kept.push(field.to_string());
                }
            }
            None => kept.push(field.to_string()),
        }
    }
    if passed == 0 && failed == 0 {
        return None;
    }
    Some(format!("test result: {status}. {}", kept.join("; ")))
}

/// Compact `cargo test` output. `None` when no libtest output is present.
pub fn compact_cargo_test(text: &str, config: &FilterConfig) -> Option<String> {
    let mut out: Vec<String> = Vec::new();
    let mut section = CargoSection::Body;
    let mut recognized = false;
    let mut saw_result = false;
    let mut budget = Budget::new(config.max_failure_lines);
    let mut in_block = false;
    let (mut passed, mut failed) = (0usize, 0usize);

    for line in text.lines() {
        if RE_CARGO_RUNNING.is_match(line) {
            recognized = true;
            budget.close(&mut out);
            in_block = false;
            section = CargoSection::Body;
            continue;
        }
        if let Some(caps) = RE_CARGO_RESULT.captures(line) {
            recognized = true;
            saw_result = true;
            budget.close(&mut out);
            in_block = false;
            section = CargoSection::Body;
            if let Some(compacted) = compact_cargo_result(&caps[1], &caps[2]) {
                out.push(compacted);
            }
            continue;
        }
        if line == "failures:" {
            budget.close(&mut out);
            in_block = false;
            section = match section {
                CargoSection::Body => {
                    out.push(line.to_string());
                    CargoSection::Failures
                }
                _ => CargoSection::FailureList,
            };
            continue;
        }

        match section {
            CargoSection::FailureList => {
                if !line.starts_with(char::is_whitespace) && !line.trim().is_empty() {
                    section = CargoSection::Body;
                    out.push(line.to_string());
                }
            }
            CargoSection::Failures => {
                if RE_CARGO_STDOUT.is_match(line) {
                    budget.close(&mut out);
                    in_block = true;
                    out.push(line.to_string());
                } else if RE_BACKTRACE_NOTE.is_match(line) {
                    continue;
                } else if in_block {
                    if line.trim().is_empty() {
                        out.push(String::new());
                    } else if budget.keep() {
                        out.push(line.to_string());
                    }
                } else {
                    out.push(line.to_string());
                }
            }
            CargoSection::Body => {
                if let Some(caps) = RE_CARGO_TEST.captures(line) {
                    recognized = true;
                    match &caps[2] {
                        "ok" => passed += 1,
                        "FAILED" => {
                            failed += 1;
                            out.push(line.to_string());
                        }
                        _ => {}
                    }
                } else if !RE_BACKTRACE_NOTE.is_match(line) {
                    out.push(line.to_string());
                }
            }
        }
    }
    budget.close(&mut out);

    if !recognized {
        return None;
    }
    if !saw_result && passed + failed > 0 {
        let status = if failed > 0 { "FAILED" } else { "ok" };
        let fields = count_summary(&[(passed, "passed"), (failed, "failed")]).unwrap_or_default();
        out.push(format!("test result: {status}. {}", fields.replace(", ", "; ")));
    }
    Some(out.join("\n"))
}

// ==================== go test ====================

static RE_GO_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^=== (RUN|PAUSE|CONT|NAME)\b").unwrap());
static RE_GO_RESULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*--- (PASS|FAIL|SKIP): ").unwrap());
static RE_GO_PKG_OK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ok\s+\S+").unwrap());
static RE_GO_PKG_FAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^FAIL\s+\S+").unwrap());
static RE_GO_NO_TESTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\?\s+\S+\s+\[no test files\]").unwrap());

/// Compact `go test` output. Log lines are held until the test they belong
/// to reports: kept for failures, dropped for passes and skips.
pub fn compact_go_test(text: &str, config: &FilterConfig) -> Option<String> {
    let mut out: Vec<String> = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let mut recognized = false;
    let (mut passed, mut failed, mut skipped) = (0usize, 0usize, 0usize);
    let (mut pkg_ok, mut pkg_failed) = (0usize, 0usize);

    let flush = |pending: &mut Vec<String>, out: &mut Vec<String>| {
        let mut budget = Budget::new(config.max_failure_lines);
        for line in pending.drain(..) {
            if budget.keep() {
                out.push(line);
            }
        }
        budget.close(out);
    };

    for line in text.lines() {
        if RE_GO_RUN.is_match(line) {
            recognized = true;
        } else if let Some(caps) = RE_GO_RESULT.captures(line) {
            recognized = true;
            match &caps[1] {
                "FAIL" => {
                    failed += 1;
                    flush(&mut pending, &mut out);
                    out.push(line.to_string());
                }
                "PASS" => {
                    passed += 1;
                    pending.clear();
                }
                _ => {
                    skipped += 1;
                    pending.clear();
                }
            }
        } else if line == "PASS" || line == "FAIL" {
            recognized = true;
            if line == "FAIL" {
                flush(&mut pending, &mut out);
            }
        } else if RE_GO_PKG_OK.is_match(line) || RE_GO_NO_TESTS.is_match(line) {
            recognized = true;
            if line.starts_with("ok") {
                pkg_ok += 1;
            }
            pending.clear();
        } else if RE_GO_PKG_FAIL.is_match(line) {
            recognized = true;
            pkg_failed += 1;
            flush(&mut pending, &mut out);
            out.push(line.to_string());
        } else if !line.trim().is_empty() {
            pending.push(line.to_string());
        }
    }
    flush(&mut pending, &mut out);

    if !recognized {
        return None;
    }
    let summary = if passed + failed + skipped > 0 {
        count_summary(&[(failed, "failed"), (passed, "passed"), (skipped, "skipped")])
    } else {
        count_summary(&[(pkg_failed, "packages failed"), (pkg_ok, "packages ok")])
    };
    if let Some(s) = summary {
        out.push(s);
    }
    Some(out.join("\n"))
}

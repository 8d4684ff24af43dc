//! `git status` long format → one line per changed path.
//!
//! ```text
//! On branch main                          ## main [ahead 2]
//! Changes not staged for commit:    →     M src/app.rs
//!   (use "git add <file>..." ...)         ?? notes.txt
//!         modified:   src/app.rs
//! Untracked files:
//!         notes.txt
//! ```

use ctk_core::FilterConfig;
use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Staged,
    Unstaged,
    Unmerged,
    Untracked,
    Ignored,
}

static RE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s+(new file|modified|deleted|renamed|copied|typechange|type changed|both modified|both added|both deleted|added by us|added by them|deleted by us|deleted by them):\s+(\S.*)$",
    )
    .unwrap()
});
static RE_HINT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\(.*\)\s*$").unwrap());
static RE_AHEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Your branch is ahead of .* by (\d+) commits?").unwrap());
static RE_BEHIND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Your branch is behind .* by (\d+) commits?").unwrap());
static RE_DIVERGED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^and have (\d+) and (\d+) different commits").unwrap());

/// Two-letter codes for unmerged states, one letter for everything else.
fn status_code(label: &str) -> &'static str {
    match label {
        "new file" => "A",
        "modified" => "M",
        "deleted" => "D",
        "renamed" => "R",
        "copied" => "C",
        "typechange" | "type changed" => "T",
        "both modified" => "UU",
        "both added" => "AA",
        "both deleted" => "DD",
        "added by us" => "AU",
        "added by them" => "UA",
        "deleted by us" => "DU",
        "deleted by them" => "UD",
        _ => "?",
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

#[derive(Debug, Default)]
struct Status {
    branch: Option<String>,
    ahead: usize,
    behind: usize,
    clean: Option<String>,
    notes: Vec<String>,
    staged: Vec<String>,
    unstaged: Vec<String>,
    unmerged: Vec<String>,
    untracked: Vec<String>,
    ignored: usize,
}

/// Compact long-format status output. `None` when the text is not
/// recognizably long-format `git status`.
pub fn compact_status(text: &str, config: &FilterConfig) -> Option<String> {
    let mut st = Status::default();
    let mut section = Section::None;
    let mut recognized = false;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let header = match line.trim_end_matches(':') {
            "Changes to be committed" => Some(Section::Staged),
            "Changes not staged for commit" => Some(Section::Unstaged),
            "Unmerged paths" => Some(Section::Unmerged),
            "Untracked files" => Some(Section::Untracked),
            "Ignored files" => Some(Section::Ignored),
            _ => None,
        };
        if let Some(next) = header {
            section = next;
            recognized = true;
            continue;
        }

        if RE_HINT.is_match(line) {
            continue;
        }

        let indented = line.starts_with(char::is_whitespace);
        if indented && section != Section::None {
            match section {
                Section::Staged | Section::Unstaged | Section::Unmerged => {
                    if let Some(caps) = RE_ENTRY.captures(line) {
                        let entry = format!("{} {}", status_code(&caps[1]), &caps[2]);
                        match section {
                            Section::Staged => st.staged.push(entry),
                            Section::Unstaged => st.unstaged.push(entry),
                            _ => st.unmerged.push(entry),
                        }
                    } else {
                        st.notes.push(line.trim().to_string());
                    }
                }
                Section::Untracked => st.untracked.push(line.trim().to_string()),
                Section::Ignored => st.ignored += 1,
                Section::None => {}
            }
            continue;
        }
        section = Section::None;

        if let Some(branch) = line.strip_prefix("On branch ") {
            st.branch = Some(branch.trim().to_string());
            recognized = true;
        } else if let Some(at) = line.strip_prefix("HEAD detached ") {
            st.branch = Some(format!("HEAD (detached {})", at.trim()));
            recognized = true;
        } else if let Some(caps) = RE_AHEAD.captures(line) {
            st.ahead = caps[1].parse().unwrap_or(0);
        } else if let Some(caps) = RE_BEHIND.captures(line) {
            st.behind = caps[1].parse().unwrap_or(0);
        } else if let Some(caps) = RE_DIVERGED.captures(line) {
            st.ahead = caps[1].parse().unwrap_or(0);
            st.behind = caps[2].parse().unwrap_or(0);
        } else if line.starts_with("Your branch is up to date")
            || line.starts_with("Your branch and ")
            || line.starts_with("no changes added to commit")
            || line.starts_with("nothing added to commit but untracked files present")
        {
            recognized = true;
        } else if line.starts_with("nothing to commit") {
            st.clean = Some(line.trim_end().to_string());
            recognized = true;
        } else {
            st.notes.push(line.trim_end().to_string());
        }
    }

    if !recognized {
        return None;
    }
    Some(render(st, config))
}

fn render(st: Status, config: &FilterConfig) -> String {
    let mut out = Vec::new();

    if st.ahead > 0 || st.behind > 0 {
        let mut tracking = Vec::new();
        if st.ahead > 0 {
            tracking.push(format!("ahead {}", st.ahead));
        }
        if st.behind > 0 {
            tracking.push(format!("behind {}", st.behind));
        }
        let branch = st.branch.as_deref().unwrap_or("HEAD");
        out.push(format!("## {} [{}]", branch, tracking.join(", ")));
    }

    out.extend(st.notes);

    let has_entries = !st.staged.is_empty()
        || !st.unstaged.is_empty()
        || !st.unmerged.is_empty()
        || !st.untracked.is_empty()
        || st.ignored > 0;
    let both = !st.staged.is_empty() && !st.unstaged.is_empty();
    if !st.staged.is_empty() {
        out.push("staged:".to_string());
        out.extend(st.staged);
    }
    if !st.unstaged.is_empty() {
        if both {
            out.push("unstaged:".to_string());
        }
        out.extend(st.unstaged);
    }
    out.extend(st.unmerged);

    if st.untracked.len() > config.untracked_limit {
        out.push(format!("?? {}", plural(st.untracked.len(), "untracked file")));
    } else {
        out.extend(st.untracked.into_iter().map(|p| format!("?? {p}")));
    }
    if st.ignored > 0 {
        out.push(format!("!! {}", plural(st.ignored, "ignored file")));
    }

    if let Some(clean) = st.clean {
        if !has_entries {
            out.push(clean);
        }
    }
    out.join("\n")
}

//! Reduce a segment to the command that actually runs.
//!
//! `FOO=1 sudo -E /usr/bin/git  status` normalizes to `git status`: words are
//! dequoted, leading assignments and wrapper programs are dropped and the
//! program is reduced to its basename.

use regex::Regex;
use std::sync::LazyLock;

/// A normalized command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCommand {
    /// Dequoted words, starting at the program.
    pub words: Vec<String>,
    /// Wrappers that were stripped, outermost first.
    pub stripped_wrappers: Vec<&'static str>,
}

impl NormalizedCommand {
    pub fn program(&self) -> &str {
        &self.words[0]
    }

    /// Single-space joined form used for matching.
    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    pub fn was_unwrapped(&self) -> bool {
        !self.stripped_wrappers.is_empty()
    }
}

static RE_ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*\+?=").unwrap());

/// `NAME=value` (or `NAME+=value`) shell assignment.
pub fn is_env_assignment(word: &str) -> bool {
    RE_ASSIGNMENT.is_match(word)
}

/// Dequote one raw shell word. Words carrying command substitution are kept
/// verbatim; `None` when the quoting is malformed.
pub fn dequote(raw: &str) -> Option<String> {
    if raw.contains("$(") || raw.contains('`') {
        return Some(raw.to_string());
    }
    if !raw.contains(['\'', '"', '\\']) {
        return Some(raw.to_string());
    }
    shlex::split(raw).map(|parts| parts.join(" "))
}

/// Basename of a program path: `/usr/bin/git` → `git`.
pub fn basename(program: &str) -> &str {
    program.rsplit('/').next().unwrap_or(program)
}

/// Options of `sudo` that consume the following word.
const SUDO_VALUE_OPTS: &[&str] = &["-u", "-g", "-h", "-p", "-C", "-r", "-t", "-U", "-D", "-T", "-R"];
const ENV_VALUE_OPTS: &[&str] = &["-u", "-C", "-S", "--unset", "--chdir", "--split-string"];

/// Skip `opts` options (and their values) starting at `i`; stops at `--`
/// (consumed) or the first non-option word.
fn skip_options(words: &[String], mut i: usize, value_opts: &[&str]) -> usize {
    while i < words.len() {
        let w = words[i].as_str();
        if w == "--" {
            return i + 1;
        }
        if !w.starts_with('-') || w == "-" {
            break;
        }
        if value_opts.contains(&w) {
            i += 2;
        } else {
            i += 1;
        }
    }
    i.min(words.len())
}

/// Strip one wrapper at `i`, returning its name and the index of the wrapped
/// command.
fn strip_wrapper(words: &[String], i: usize) -> Option<(&'static str, usize)> {
    let next = words.get(i + 1).map(String::as_str);
    match basename(&words[i]) {
        "sudo" => Some(("sudo", skip_options(words, i + 1, SUDO_VALUE_OPTS))),
        "env" => {
            let mut j = skip_options(words, i + 1, ENV_VALUE_OPTS);
            while j < words.len() && is_env_assignment(&words[j]) {
                j += 1;
            }
            Some(("env", j))
        }
        // `command -v`/`-V` looks a program up instead of running it.
        "command" if matches!(next, Some("-v") | Some("-V")) => None,
        "command" => Some(("command", skip_options(words, i + 1, &[]))),
        "time" => Some(("time", skip_options(words, i + 1, &["-f", "--format", "-o", "--output"]))),
        "nice" => Some(("nice", skip_options(words, i + 1, &["-n", "--adjustment"]))),
        "nohup" => Some(("nohup", skip_options(words, i + 1, &[]))),
        _ => None,
    }
}

/// Normalize already-split raw words. `None` when nothing runs (only
/// assignments, or a bare wrapper) or the quoting is malformed.
pub fn normalize_words<S: AsRef<str>>(raw_words: &[S]) -> Option<NormalizedCommand> {
    let mut stripped = Vec::new();
    let mut words = Vec::with_capacity(raw_words.len());
    for raw in raw_words {
        let raw = raw.as_ref();
        if raw == "\\\n" {
            continue;
        }
        if words.is_empty() && raw.starts_with('\\') && raw.len() > 1 && !raw.starts_with("\\\\") {
            stripped.push("backslash");
        }
        words.push(dequote(raw)?);
    }

    let mut i = 0;
    loop {
        while i < words.len() && is_env_assignment(&words[i]) {
            i += 1;
        }
        if i >= words.len() {
            return None;
        }
        match strip_wrapper(&words, i) {
            Some((name, next)) => {
                stripped.push(name);
                i = next;
            }
            None => break,
        }
    }

    let mut words = words.split_off(i);
    let program = basename(&words[0]).to_string();
    if program.is_empty() {
        return None;
    }
    words[0] = program;
    Some(NormalizedCommand { words, stripped_wrappers: stripped })
}

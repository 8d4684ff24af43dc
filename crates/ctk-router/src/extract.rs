//! Subcommand extractors: find the command nested in a compound invocation.
//!
//! Input is the normalized word list of the whole invocation, output the
//! words of the nested command. Each extractor is a plain function so its
//! contract can be tested on its own.

use ctk_core::ExtractorKind;

use crate::types::Extraction;

/// Per-kind extraction, with "no extraction" as the default.
pub trait SubcommandExtractor {
    fn extract(&self, words: &[String]) -> Extraction;
}

impl SubcommandExtractor for ExtractorKind {
    fn extract(&self, words: &[String]) -> Extraction {
        let inner = match self {
            ExtractorKind::None => return Extraction::NotApplicable,
            ExtractorKind::ComposeExec => compose_exec(words),
            ExtractorKind::DockerExec => docker_exec(words),
            ExtractorKind::KubectlExec => kubectl_exec(words),
        };
        match inner {
            Ok(words) => Extraction::Inner(words),
            Err(reason) => Extraction::Malformed(reason),
        }
    }
}

const COMPOSE_GLOBAL_VALUE_OPTS: &[&str] = &[
    "-f",
    "--file",
    "-p",
    "--project-name",
    "--profile",
    "--env-file",
    "--project-directory",
    "--ansi",
    "--progress",
    "--parallel",
];
const COMPOSE_EXEC_VALUE_OPTS: &[&str] = &["-e", "--env", "-u", "--user", "-w", "--workdir", "--index"];
const DOCKER_EXEC_VALUE_OPTS: &[&str] = &[
    "-e",
    "--env",
    "--env-file",
    "-u",
    "--user",
    "-w",
    "--workdir",
    "--detach-keys",
];

type Extracted = Result<Vec<String>, &'static str>;

/// Skip options from `i`; `--opt=value` is one word, listed value options
/// take the next word. Stops after `--` or at the first operand.
fn skip_options(words: &[String], mut i: usize, value_opts: &[&str]) -> Result<usize, &'static str> {
    while i < words.len() {
        let w = words[i].as_str();
        if w == "--" {
            return Ok(i + 1);
        }
        if !w.starts_with('-') || w == "-" {
            return Ok(i);
        }
        if value_opts.contains(&w) {
            if i + 1 >= words.len() {
                return Err("option is missing its value");
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    Ok(i)
}

fn expect_word(words: &[String], i: usize, word: &str) -> Result<usize, &'static str> {
    match words.get(i) {
        Some(w) if w == word => Ok(i + 1),
        _ => Err("unexpected subcommand"),
    }
}

/// Operand at `i` (service, container), then a non-empty command.
fn target_then_command(words: &[String], i: usize) -> Extracted {
    if i >= words.len() {
        return Err("missing target");
    }
    let command = &words[i + 1..];
    if command.is_empty() {
        return Err("missing command");
    }
    Ok(command.to_vec())
}

/// `docker compose|docker-compose [global opts] exec [opts] <service> <cmd..>`
pub fn compose_exec(words: &[String]) -> Extracted {
    let mut i = match words.first().map(String::as_str) {
        Some("docker-compose") => 1,
        Some("docker") => expect_word(words, 1, "compose")?,
        _ => return Err("not a compose invocation"),
    };
    i = skip_options(words, i, COMPOSE_GLOBAL_VALUE_OPTS)?;
    i = expect_word(words, i, "exec")?;
    i = skip_options(words, i, COMPOSE_EXEC_VALUE_OPTS)?;
    target_then_command(words, i)
}

/// `docker [container] exec [opts] <container> <cmd..>`
pub fn docker_exec(words: &[String]) -> Extracted {
    let mut i = expect_word(words, 0, "docker")?;
    if words.get(i).map(String::as_str) == Some("container") {
        i += 1;
    }
    i = expect_word(words, i, "exec")?;
    i = skip_options(words, i, DOCKER_EXEC_VALUE_OPTS)?;
    target_then_command(words, i)
}

/// `kubectl [opts] exec [opts] <pod> -- <cmd..>`: everything after `--`.
pub fn kubectl_exec(words: &[String]) -> Extracted {
    if words.first().map(String::as_str) != Some("kubectl") {
        return Err("not a kubectl invocation");
    }
    let dashes = words.iter().position(|w| w == "--").ok_or("missing `--` before command")?;
    let command = &words[dashes + 1..];
    if command.is_empty() {
        return Err("missing command");
    }
    Ok(command.to_vec())
}

//! Ordered category registry and the built-in catalog.
//!
//! Registration order is match precedence: the first category whose patterns
//! accept a command wins, so specific families come before general ones.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::category::{CategorySpec, CommandCategory, CompactRule, ExtractorKind, Similarity};
use crate::error::{CtkError, Result};

/// Version of the built-in catalog. Bump when categories or patterns change.
pub const BUILTIN_VERSION: u32 = 1;

/// Serialized, versioned list of category definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySpec {
    pub version: u32,
    pub categories: Vec<CategorySpec>,
}

/// Read-only, ordered set of compiled categories.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    version: u32,
    categories: Vec<CommandCategory>,
}

impl CategoryRegistry {
    /// Compile a spec. Names must be unique.
    pub fn from_spec(spec: &RegistrySpec) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut categories = Vec::with_capacity(spec.categories.len());
        for c in &spec.categories {
            if !seen.insert(c.name.as_str()) {
                return Err(CtkError::DuplicateCategory { name: c.name.clone() });
            }
            categories.push(CommandCategory::compile(c)?);
        }
        tracing::debug!(version = spec.version, count = categories.len(), "compiled category registry");
        Ok(Self { version: spec.version, categories })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let spec: RegistrySpec = serde_json::from_str(text)?;
        Self::from_spec(&spec)
    }

    /// The process-wide built-in registry.
    pub fn builtin() -> &'static CategoryRegistry {
        &BUILTIN_REGISTRY
    }

    /// Copy of this registry without the named categories; order is kept.
    pub fn without(&self, names: &[String]) -> Self {
        Self {
            version: self.version,
            categories: self
                .categories
                .iter()
                .filter(|c| !names.iter().any(|n| n == c.name()))
                .cloned()
                .collect(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Categories in precedence order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandCategory> {
        self.categories.iter()
    }

    pub fn get(&self, name: &str) -> Option<&CommandCategory> {
        self.categories.iter().find(|c| c.name() == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name()).collect()
    }
}

/// Global compose options may precede `exec`.
const COMPOSE_EXEC: &str = r"^(docker compose|docker-compose)( (-f|--file|-p|--project-name|--profile|--env-file|--project-directory|--ansi|--progress) \S+| --?[a-z][\w-]*(=\S+)?)* exec( |$)";

const KUBECTL_EXEC: &str = r"^kubectl( (-n|--namespace|--context|--kubeconfig|--cluster|--user) \S+| --?[a-z][\w-]*(=\S+)?)* exec( |$)";

const SEPARATOR_NOISE: &[&str] = &[r"^\s*(?:={3,}|-{3,}|\+{3,}|\*{3,}|~{3,}|#{3,}|_{3,})\s*$"];

const PROGRESS_NOISE: &[&str] = &[
    r"^\s*\d{1,3}%\s*\|",
    r"(?i)^\s*\d{1,3}%\s+complete",
    r"^\s*\[\d+/\d+\]",
    r"^\s*\.{3,}\s*$",
    r"(?i)^\s*(please wait|loading)\b.*\.{3}\s*$",
];

const TIMING_NOISE: &[&str] = &[
    r"(?i)^\s*(done|completed|finished|took) in\s+\d",
    r"^\s*(real|user|sys)\s+\d+m\d",
];

const GIT_HINTS: &[&str] = &[
    r#"^\s*\(use "git [^"]*"[^)]*\)\s*$"#,
    r"^\s*\(commit or discard the untracked or modified content in submodules\)\s*$",
    r"^hint: ",
];

const GIT_TRANSFER: &[&str] = &[
    r"^(remote: )?(Enumerating|Counting|Compressing|Writing|Receiving|Resolving) (objects|deltas):",
    r"^remote: Total \d+",
    r"^Total \d+ \(delta \d+\)",
    r"^Delta compression using",
];

const CARGO_BUILD: &[&str] = &[
    r"^\s*(Compiling|Checking|Downloaded|Downloading|Updating|Locking|Adding|Blocking|Fresh|Documenting|Packaging|Verifying|Unpacking) ",
];

const CARGO_TEST_RUNNER: &[&str] = &[
    r"^\s*Finished .*(profile|target)",
    r"^\s*Running (unittests |tests/|benches/|`)",
    r"^\s*Doc-tests ",
];

const PYTEST_HEADER: &[&str] = &[
    r"^platform \S+ -- Python",
    r"^(rootdir|cachedir|configfile|plugins|testpaths): ",
    r"^collecting \.\.\.",
];

const GO_FETCH: &[&str] = &[r"^go: (downloading|finding|extracting) "];

const NODE_NOISE: &[&str] = &[
    r"(?i)^npm (warn|notice)\b",
    r"(?i)^(yarn|pnpm) warn\b",
    r"(?i)^\s*up to date\b",
    r"(?i)^\s*audited \d+ packages?",
    r"(?i)^\s*\d+ packages? (are|is) looking for funding",
    r"(?i)^\s*run `npm fund` for details",
    r"(?i)^\s*found 0 vulnerabilities",
    r"(?i)^\s*Progress: resolved \d+",
];

const PIP_NOISE: &[&str] = &[
    r"^\s*Requirement already satisfied: ",
    r"^\s*(Collecting|Downloading|Using cached|Obtaining) ",
    r"(?i)^\s*(Preparing metadata|Building wheels? for|Created wheel for|Stored in directory|Installing build dependencies|Getting requirements to build)",
    r"^\s*[\d.]+/[\d.]+ [kMG]?B .*eta",
];

const PSQL_NOISE: &[&str] = &[r"^-+(\+-+)*$"];

const DOCKER_PULL: &[&str] = &[
    r"^\s*[0-9a-f]{12}: (Pulling fs layer|Waiting|Downloading|Verifying Checksum|Download complete|Extracting|Pull complete|Already exists)",
    r"^#\d+ (DONE|CACHED)\b",
    r"^#\d+ (\[internal\]|transferring|resolve |sha256:|extracting |naming to |exporting )",
    r"(?i)^\s*What's next:",
    r"(?i)^\s*View a summary of image vulnerabilities",
];

const COMPOSE_LIFECYCLE: &[&str] = &[
    r"(?i)^\s*(Network|Volume|Container) \S+ +(Creating|Created|Starting|Started|Stopping|Stopped|Removing|Removed|Running|Recreate|Recreated|Healthy|Waiting)\s*$",
    r"^\s*\[\+\] (Running|Building|Pulling) \d+/\d+",
    r"(?i)^\s*Attaching to ",
];

fn noise(groups: &[&[&str]]) -> Vec<String> {
    groups.iter().flat_map(|g| g.iter().map(|p| p.to_string())).collect()
}

fn with_skip(mut spec: CategorySpec, groups: &[&[&str]]) -> CategorySpec {
    spec.skip = noise(groups);
    spec
}

/// The built-in catalog, in precedence order.
pub fn builtin_spec() -> RegistrySpec {
    let categories = vec![
        with_skip(
            CategorySpec::new("docker-compose-exec")
                .regex(COMPOSE_EXEC)
                .extractor(ExtractorKind::ComposeExec),
            &[TIMING_NOISE],
        ),
        with_skip(
            CategorySpec::new("docker-exec")
                .regex(r"^docker (container )?exec( |$)")
                .extractor(ExtractorKind::DockerExec),
            &[TIMING_NOISE],
        ),
        with_skip(
            CategorySpec::new("kubectl-exec")
                .regex(KUBECTL_EXEC)
                .extractor(ExtractorKind::KubectlExec),
            &[TIMING_NOISE],
        ),
        with_skip(
            CategorySpec::new("git-status")
                .regex(r"^git ((-C|-c) \S+ |--no-pager |--no-optional-locks )*status\b")
                .compact(CompactRule::GitStatus),
            &[GIT_HINTS],
        ),
        with_skip(CategorySpec::new("git").prefix("git"), &[GIT_HINTS, GIT_TRANSFER]),
        with_skip(
            CategorySpec::new("pytest")
                .regex(r"^(py\.test|pytest)\b")
                .regex(r"^python[0-9.]* -m pytest\b")
                .regex(r"^(uv|poetry|pipenv|hatch|pdm) run (python[0-9.]* -m )?pytest\b")
                .compact(CompactRule::Pytest)
                .multi_segment(),
            &[PYTEST_HEADER, TIMING_NOISE],
        ),
        with_skip(
            CategorySpec::new("cargo-test")
                .regex(r"^cargo (\+\S+ )?(test|t|nextest run)\b")
                .compact(CompactRule::CargoTest)
                .multi_segment(),
            &[CARGO_BUILD, CARGO_TEST_RUNNER],
        ),
        with_skip(
            CategorySpec::new("cargo").prefix("cargo"),
            &[CARGO_BUILD],
        ),
        with_skip(
            CategorySpec::new("go-test")
                .prefix("go test")
                .compact(CompactRule::GoTest)
                .multi_segment(),
            &[GO_FETCH],
        ),
        with_skip(CategorySpec::new("go").prefix("go"), &[GO_FETCH]),
        with_skip(
            CategorySpec::new("nodejs")
                .regex(r"^(npm|npx|pnpm|yarn|bun)\b")
                .dedupe(Similarity::MaskNumbers, 3),
            &[NODE_NOISE, PROGRESS_NOISE, TIMING_NOISE, SEPARATOR_NOISE],
        ),
        with_skip(
            CategorySpec::new("pip")
                .regex(r"^(pip[0-9.]*|python[0-9.]* -m pip|uv pip) install\b"),
            &[PIP_NOISE, PROGRESS_NOISE],
        ),
        with_skip(
            CategorySpec::new("psql").regex(r"^psql\b.* (-c|-f|--command|--file)\b"),
            &[PSQL_NOISE],
        ),
        with_skip(
            CategorySpec::new("docker-compose")
                .regex(r"^(docker compose|docker-compose)\b")
                .compact(CompactRule::ContainerTable)
                .dedupe(Similarity::MaskNumbers, 3),
            &[COMPOSE_LIFECYCLE, DOCKER_PULL, PROGRESS_NOISE],
        ),
        with_skip(
            CategorySpec::new("docker")
                .prefix("docker")
                .compact(CompactRule::ContainerTable)
                .dedupe(Similarity::MaskNumbers, 3),
            &[DOCKER_PULL, PROGRESS_NOISE],
        ),
        CategorySpec::new("kubectl")
            .prefix("kubectl")
            .compact(CompactRule::ContainerTable)
            .dedupe(Similarity::MaskNumbers, 3),
    ];

    RegistrySpec { version: BUILTIN_VERSION, categories }
}

/// The built-in registry instance.
pub static BUILTIN_REGISTRY: LazyLock<CategoryRegistry> = LazyLock::new(|| {
    CategoryRegistry::from_spec(&builtin_spec()).expect("built-in category patterns compile")
});

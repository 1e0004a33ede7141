//! Base image version selection.
//!
//! Tags are parsed leniently (`v?N(.N)*(-pre)?(+build)?`), filtered by
//! variant, sorted newest first and matched against the constraint declared by
//! the project. Constraint syntax accepts the dialects found in manifests:
//! `||` alternatives, comma or space separated comparators, bare versions
//! (`2.0` means any `2.0.x`) and the pessimistic `~>` operator.

use crate::error::{Error, Result};
use crate::sources::TagSource;
use regex::Regex;
use semver::{Prerelease, Version, VersionReq};
use std::cmp::Ordering;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Constraint used when a project does not declare one.
pub const ANY_VERSION: &str = ">0";

const OPERATORS: &[&str] = &["~>", ">=", "<=", "!=", "==", ">", "<", "=", "~", "^"];

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^v?(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:\.\d+)*(?:-([0-9A-Za-z][0-9A-Za-z.\-]*))?(?:\+[0-9A-Za-z.\-]+)?$",
        )
        .expect("valid regex")
    })
}

/// Parses a tag into a semantic version, padding missing components with zero
/// and dropping components past the third.
pub fn parse_tag(tag: &str) -> Option<Version> {
    let caps = tag_regex().captures(tag)?;
    let number = |i: usize| -> Option<u64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };

    let mut version = Version::new(number(1)?, number(2)?, number(3)?);
    if let Some(pre) = caps.get(4) {
        version.pre = Prerelease::new(pre.as_str()).ok()?;
    }
    Some(version)
}

/// Text before the first `-`, i.e. the tag without its variant.
pub fn base_of(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

/// Trims whitespace and trailing wildcard residue (`,` `.` `x` `*`); an empty
/// result means any version.
pub fn normalize_constraint(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches([',', '.', 'x', '*']).trim();
    if trimmed.is_empty() {
        ANY_VERSION.to_string()
    } else {
        trimmed.to_string()
    }
}

/// A parsed constraint: satisfied when any alternative is.
#[derive(Debug, Clone)]
pub struct Constraint {
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone)]
struct Alternative {
    req: VersionReq,
    excluded: Vec<Version>,
}

impl Constraint {
    pub fn parse(expr: &str) -> std::result::Result<Self, String> {
        let alternatives = expr
            .split("||")
            .map(parse_alternative)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { alternatives })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives
            .iter()
            .any(|alt| alt.req.matches(version) && !alt.excluded.contains(version))
    }
}

fn parse_alternative(expr: &str) -> std::result::Result<Alternative, String> {
    let mut comparators = Vec::new();
    let mut excluded = Vec::new();

    for (op, version) in tokenize(expr)? {
        let version = trim_segments(version.trim_start_matches('v'));
        match op {
            "!=" => excluded.push(
                parse_tag(&version).ok_or_else(|| format!("invalid version {:?}", version))?,
            ),
            "~>" if version.split('.').count() <= 2 => comparators.push(format!("^{}", version)),
            "~>" => comparators.push(format!("~{}", version)),
            "==" => comparators.push(format!("={}", version)),
            "" if version.contains('*') || version.contains('x') => comparators.push(version),
            "" => comparators.push(format!("={}", version)),
            op => comparators.push(format!("{}{}", op, version)),
        }
    }

    let req = if comparators.is_empty() {
        VersionReq::STAR
    } else {
        VersionReq::parse(&comparators.join(", ")).map_err(|e| e.to_string())?
    };
    Ok(Alternative { req, excluded })
}

/// Splits an alternative into `(operator, version)` pairs. An operator may be
/// separated from its version by whitespace.
fn tokenize(expr: &str) -> std::result::Result<Vec<(&str, String)>, String> {
    let mut pairs = Vec::new();
    let mut pending: Option<&str> = None;

    for token in expr.split([',', ' ', '\t']).filter(|t| !t.is_empty()) {
        let op = OPERATORS
            .iter()
            .copied()
            .find(|op| token.starts_with(op))
            .unwrap_or("");
        let rest = &token[op.len()..];

        match (pending.take(), op, rest.is_empty()) {
            (Some(prev), "", false) => pairs.push((prev, rest.to_string())),
            (Some(prev), _, _) => return Err(format!("operator {:?} without version", prev)),
            (None, op, true) if !op.is_empty() => pending = Some(op),
            (None, _, true) => return Err(format!("unexpected token {:?}", token)),
            (None, op, false) => pairs.push((op, rest.to_string())),
        }
    }

    match pending {
        Some(op) => Err(format!("operator {:?} without version", op)),
        None => Ok(pairs),
    }
}

/// Drops numeric components past the third (`9.2.9.0` -> `9.2.9`).
fn trim_segments(version: &str) -> String {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() > 3 && parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())) {
        parts[..3].join(".")
    } else {
        version.to_string()
    }
}

fn precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch)
        .cmp(&(b.major, b.minor, b.patch))
        .then_with(|| a.pre.cmp(&b.pre))
}

/// Tags carrying exactly `variant`, newest first. Equal versions order by
/// descending raw tag.
pub fn sort_tags(tags: &[String], variant: &str) -> Vec<String> {
    let mut parsed: Vec<(Version, &String)> = tags
        .iter()
        .filter_map(|tag| parse_tag(tag).map(|v| (v, tag)))
        .filter(|(v, _)| v.pre.as_str() == variant)
        .collect();

    parsed.sort_by(|(va, ta), (vb, tb)| precedence(vb, va).then_with(|| tb.cmp(ta)));
    parsed.into_iter().map(|(_, tag)| tag.clone()).collect()
}

/// Lower bound of a constraint written as a plain dotted version (`3.11`).
/// Tags below it are skipped before matching.
fn bare_floor(normalized: &str) -> Option<Version> {
    let dotted = normalized
        .split('.')
        .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));
    if dotted {
        parse_tag(normalized)
    } else {
        None
    }
}

/// Picks the newest tag satisfying `constraint` from an unordered tag list.
pub fn select(stack: &str, variant: &str, constraint: &str, tags: &[String]) -> Result<String> {
    let normalized = normalize_constraint(constraint);
    let parsed = Constraint::parse(&normalized).map_err(|reason| Error::InvalidConstraint {
        stack: stack.to_string(),
        constraint: normalized.clone(),
        reason,
    })?;
    let floor = bare_floor(&normalized);

    for tag in sort_tags(tags, variant) {
        let Some(version) = parse_tag(base_of(&tag)) else {
            continue;
        };
        if floor.as_ref().is_some_and(|floor| version < *floor) {
            continue;
        }

        if parsed.matches(&version) {
            debug!("Selected {}:{} for constraint {}", stack, tag, normalized);
            return Ok(tag);
        }
    }

    Err(Error::UnknownVersion {
        stack: stack.to_string(),
        constraint: normalized,
    })
}

/// Resolves base image tags against a [`TagSource`].
#[derive(Clone)]
pub struct VersionResolver {
    tags: Arc<dyn TagSource>,
}

impl VersionResolver {
    pub fn new(tags: Arc<dyn TagSource>) -> Self {
        Self { tags }
    }

    pub fn resolve(&self, stack: &str, variant: &str, constraint: &str) -> Result<String> {
        let tags = self.tags.fetch_tags(stack)?;
        debug!("{} candidate tags for {}", tags.len(), stack);
        select(stack, variant, constraint, &tags)
    }
}

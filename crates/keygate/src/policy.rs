//! attribute policies
//!
//! a policy is an AND of groups, each group an OR of `key:value` tokens:
//!
//! ```text
//! (role:admin OR role:manager) AND dept:IT AND clearance:high
//! ```
//!
//! requester attributes and policy tokens go through the same
//! normalization: keys are lowercased and synonym keys (`dept`,
//! `department`) collapse onto one canonical key, so either spelling on
//! either side matches. values are compared as written, except that runs
//! of whitespace collapse to one space (`dept:Human Resources`).
//!
//! evaluation fails closed: a policy that does not parse is never
//! satisfied.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::{Error, Result};

const AND: &str = " AND ";
const OR: &str = " OR ";

/// keys that name the same attribute, (alias, canonical)
const KEY_SYNONYMS: &[(&str, &str)] = &[("dept", "department")];

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_operator(word: &str) -> bool {
    word == AND.trim() || word == OR.trim()
}

fn canonical_key(key: &str) -> String {
    let key = key.to_lowercase();
    KEY_SYNONYMS
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(key)
}

/// a normalized `key:value` credential
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Attribute {
    key: String,
    value: String,
}

impl Attribute {
    /// normalize a key/value pair, None if either side is empty.
    /// inner whitespace is kept, collapsed to single spaces.
    pub fn new(key: &str, value: &str) -> Option<Self> {
        let key = collapse_whitespace(key);
        let value = collapse_whitespace(value);
        if key.is_empty() || value.is_empty() {
            return None;
        }
        Some(Self {
            key: canonical_key(&key),
            value,
        })
    }

    /// parse a `key:value` token
    pub fn parse(token: &str) -> Option<Self> {
        let (key, value) = token.trim().split_once(':')?;
        Self::new(key, value)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.value)
    }
}

/// the requester's attributes for one evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet(BTreeSet<Attribute>);

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// build from `key:value` tokens, dropping malformed ones
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for token in tokens {
            match Attribute::parse(token.as_ref()) {
                Some(attr) => {
                    set.insert(attr);
                }
                None => debug!(token = token.as_ref(), "ignoring malformed attribute"),
            }
        }
        Self(set)
    }

    /// build from a key -> value map such as {role, department, clearance}
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self(
            pairs
                .into_iter()
                .filter_map(|(k, v)| Attribute::new(k.as_ref(), v.as_ref()))
                .collect(),
        )
    }

    pub fn insert(&mut self, attr: Attribute) -> bool {
        self.0.insert(attr)
    }

    pub fn contains(&self, attr: &Attribute) -> bool {
        self.0.contains(attr)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }
}

impl<S: AsRef<str>> FromIterator<S> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_tokens(iter)
    }
}

/// parsed AND-of-OR policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    groups: Vec<Vec<Attribute>>,
}

impl Policy {
    /// strict parse; malformed input is `InvalidParameters`
    pub fn parse(policy: &str) -> Result<Self> {
        let normalized = collapse_whitespace(policy);
        if normalized.is_empty() {
            return Ok(Self { groups: Vec::new() });
        }

        let groups = normalized
            .split(AND)
            .map(parse_group)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { groups })
    }

    /// true iff every group has at least one token held by the requester
    pub fn evaluate(&self, attributes: &AttributeSet) -> bool {
        self.groups
            .iter()
            .all(|group| group.iter().any(|token| attributes.contains(token)))
    }

    /// distinct attribute keys mentioned, in order of appearance
    pub fn required_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for attr in self.groups.iter().flatten() {
            if !keys.iter().any(|k| k == attr.key()) {
                keys.push(attr.key().to_string());
            }
        }
        keys
    }

    pub fn groups(&self) -> &[Vec<Attribute>] {
        &self.groups
    }

    /// no groups: satisfied by anyone
    pub fn is_unrestricted(&self) -> bool {
        self.groups.is_empty()
    }
}

fn parse_group(group: &str) -> Result<Vec<Attribute>> {
    let group = group.trim();
    let inner = match group.strip_prefix('(').and_then(|g| g.strip_suffix(')')) {
        Some(inner) => inner.trim(),
        None => group,
    };

    if inner.contains(['(', ')']) {
        return Err(Error::InvalidParameters(format!(
            "unbalanced or nested parentheses in group '{}'",
            group
        )));
    }

    inner
        .split(OR)
        .map(|token| {
            let token = token.trim();
            if token.is_empty() {
                return Err(Error::InvalidParameters("empty policy token".into()));
            }
            let mut words = token.split_whitespace();
            if words.next().is_some_and(is_operator) || words.last().is_some_and(is_operator) {
                return Err(Error::InvalidParameters(format!(
                    "dangling operator in policy token '{}'",
                    token
                )));
            }
            Attribute::parse(token).ok_or_else(|| {
                Error::InvalidParameters(format!("malformed policy token '{}'", token))
            })
        })
        .collect()
}

impl FromStr for Policy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .groups
            .iter()
            .map(|group| {
                let tokens: Vec<String> = group.iter().map(|a| a.to_string()).collect();
                if tokens.len() > 1 {
                    format!("({})", tokens.join(OR))
                } else {
                    tokens.join(OR)
                }
            })
            .collect();
        f.write_str(&rendered.join(AND))
    }
}

/// does `attributes` satisfy `policy`? malformed policies never do.
pub fn satisfies(policy: &str, attributes: &AttributeSet) -> bool {
    match Policy::parse(policy) {
        Ok(parsed) => parsed.evaluate(attributes),
        Err(e) => {
            debug!(error = %e, "policy rejected, failing closed");
            false
        }
    }
}

/// string-level entry point: evaluate against raw `key:value` tokens
pub fn evaluate_policy<I, S>(policy: &str, attributes: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    satisfies(policy, &AttributeSet::from_tokens(attributes))
}

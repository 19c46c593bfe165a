//! Maven version ordering and ranges.
//!
//! Maven orders versions by `.`/`-`-separated tokens: numbers compare
//! numerically, known qualifiers rank
//! `alpha < beta < milestone < rc < snapshot < <release> < sp`, and a
//! missing token counts as the release. Unknown words sort below the
//! release. This differs from semver, so relver carries its own
//! comparator.

use std::cmp::Ordering;
use std::fmt;

/// A Maven version, comparable by Maven's rules.
#[derive(Debug, Clone)]
pub struct MavenVersion {
    original: String,
    tokens: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Number(u64),
    Qualifier(Rank),
    Word(String),
}

/// Well-known qualifiers in ranking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    Alpha,
    Beta,
    Milestone,
    Rc,
    Snapshot,
    Release,
    Sp,
}

impl MavenVersion {
    pub fn parse(version: &str) -> Self {
        let tokens = version
            .split(['.', '-'])
            .filter(|t| !t.is_empty())
            .map(classify)
            .collect();
        Self {
            original: version.to_string(),
            tokens,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }

    pub fn is_snapshot(&self) -> bool {
        self.original.ends_with("-SNAPSHOT")
    }
}

fn classify(token: &str) -> Token {
    if let Ok(n) = token.parse::<u64>() {
        return Token::Number(n);
    }
    match token.to_lowercase().as_str() {
        "alpha" | "a" => Token::Qualifier(Rank::Alpha),
        "beta" | "b" => Token::Qualifier(Rank::Beta),
        "milestone" | "m" => Token::Qualifier(Rank::Milestone),
        "rc" | "cr" => Token::Qualifier(Rank::Rc),
        "snapshot" => Token::Qualifier(Rank::Snapshot),
        "ga" | "final" | "release" => Token::Qualifier(Rank::Release),
        "sp" => Token::Qualifier(Rank::Sp),
        _ => Token::Word(token.to_string()),
    }
}

impl fmt::Display for MavenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MavenVersion {}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.tokens.len().max(other.tokens.len());
        for i in 0..len {
            let ord = match (self.tokens.get(i), other.tokens.get(i)) {
                (None, None) => Ordering::Equal,
                (Some(t), None) => cmp_to_release(t),
                (None, Some(t)) => cmp_to_release(t).reverse(),
                (Some(a), Some(b)) => cmp_tokens(a, b),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// A token compared against the implicit padding of a shorter version.
fn cmp_to_release(token: &Token) -> Ordering {
    match token {
        Token::Number(n) => n.cmp(&0),
        Token::Qualifier(rank) => rank.cmp(&Rank::Release),
        Token::Word(_) => Ordering::Less,
    }
}

fn cmp_tokens(a: &Token, b: &Token) -> Ordering {
    use Token::*;
    match (a, b) {
        (Number(a), Number(b)) => a.cmp(b),
        (Qualifier(a), Qualifier(b)) => a.cmp(b),
        (Word(a), Word(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Number(_), _) => Ordering::Greater,
        (_, Number(_)) => Ordering::Less,
        (Qualifier(q), Word(_)) => {
            if *q >= Rank::Release {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (Word(_), Qualifier(q)) => {
            if *q >= Rank::Release {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
    }
}

/// A Maven version range: `[1.0,2.0)`, `[1.0,]`, `(,2.0)`, or `[1.0]`.
#[derive(Debug, Clone)]
pub struct VersionRange {
    lower: Option<(MavenVersion, bool)>,
    upper: Option<(MavenVersion, bool)>,
}

impl VersionRange {
    /// Parse a range expression. Bare versions are not ranges and return
    /// `None`.
    pub fn parse(spec: &str) -> Option<Self> {
        let s = spec.trim();
        let open_inclusive = s.starts_with('[');
        if !open_inclusive && !s.starts_with('(') {
            return None;
        }
        if !s.ends_with(']') && !s.ends_with(')') {
            return None;
        }
        let close_inclusive = s.ends_with(']');
        let inner = &s[1..s.len() - 1];

        if let Some((lower, upper)) = inner.split_once(',') {
            let bound = |text: &str, inclusive: bool| {
                let text = text.trim();
                (!text.is_empty()).then(|| (MavenVersion::parse(text), inclusive))
            };
            Some(Self {
                lower: bound(lower, open_inclusive),
                upper: bound(upper, close_inclusive),
            })
        } else {
            let exact = MavenVersion::parse(inner.trim());
            Some(Self {
                lower: Some((exact.clone(), true)),
                upper: Some((exact, true)),
            })
        }
    }

    pub fn contains(&self, version: &MavenVersion) -> bool {
        if let Some((ref bound, inclusive)) = self.lower {
            match version.cmp(bound) {
                Ordering::Less => return false,
                Ordering::Equal if !inclusive => return false,
                _ => {}
            }
        }
        if let Some((ref bound, inclusive)) = self.upper {
            match version.cmp(bound) {
                Ordering::Greater => return false,
                Ordering::Equal if !inclusive => return false,
                _ => {}
            }
        }
        true
    }
}

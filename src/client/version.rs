//! Server version parsing and range checks.

use std::cmp::Ordering;
use std::fmt;

/// A server version such as `22.7` or `23.8.1.2`.
///
/// Missing trailing components are zero; comparisons against a range bound
/// only look at the components the bound spells out, so `22.7.5` lies
/// within `[22.7,22.7]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerVersion {
    parts: Vec<u32>,
}

impl ServerVersion {
    /// Parses `major[.minor[.patch[.build]]]`.
    pub fn parse(s: &str) -> Option<ServerVersion> {
        let parts = s
            .trim()
            .split('.')
            .map(|p| p.parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()?;
        if parts.is_empty() || parts.len() > 4 {
            return None;
        }
        Some(ServerVersion { parts })
    }

    pub fn major(&self) -> u32 {
        self.part(0)
    }

    pub fn minor(&self) -> u32 {
        self.part(1)
    }

    pub fn patch(&self) -> u32 {
        self.part(2)
    }

    fn part(&self, i: usize) -> u32 {
        self.parts.get(i).copied().unwrap_or(0)
    }

    /// Compares against `bound` using only the components `bound` has.
    fn compare_prefix(&self, bound: &ServerVersion) -> Ordering {
        (0..bound.parts.len())
            .map(|i| self.part(i).cmp(&bound.part(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Checks this version against a range expression.
    ///
    /// Accepts interval notation (`[22.7,)`, `(21.3,22.8]`, `[,23)`) or a
    /// plain version, which matches on the components it names. Malformed
    /// expressions never match.
    pub fn check(&self, range: &str) -> bool {
        let range = range.trim();
        let (Some(open), Some(close)) = (range.chars().next(), range.chars().last()) else {
            return false;
        };
        if !matches!(open, '[' | '(') {
            return ServerVersion::parse(range)
                .is_some_and(|v| self.compare_prefix(&v).is_eq());
        }
        if !matches!(close, ']' | ')') || range.len() < 2 {
            return false;
        }

        let Some((lower, upper)) = range[1..range.len() - 1].split_once(',') else {
            return false;
        };
        let bound = |s: &str| -> Result<Option<ServerVersion>, ()> {
            match s.trim() {
                "" => Ok(None),
                s => ServerVersion::parse(s).map(Some).ok_or(()),
            }
        };
        let (Ok(lower), Ok(upper)) = (bound(lower), bound(upper)) else {
            return false;
        };

        let above = lower.is_none_or(|v| match self.compare_prefix(&v) {
            Ordering::Greater => true,
            Ordering::Equal => open == '[',
            Ordering::Less => false,
        });
        let below = upper.is_none_or(|v| match self.compare_prefix(&v) {
            Ordering::Less => true,
            Ordering::Equal => close == ']',
            Ordering::Greater => false,
        });
        above && below
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

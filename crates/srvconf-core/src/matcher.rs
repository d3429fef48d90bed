//! Candidate matching and ranking.
//!
//! Two matching modes are supported:
//!
//! - [`MatchMode::Prefix`]: case-insensitive prefix match, used while the
//!   user is typing a key or a fresh value. An empty fragment matches
//!   everything.
//! - [`MatchMode::Substring`]: case-insensitive containment anywhere in the
//!   name, used for variable completion and for repairing an identifier
//!   that is already known to be invalid.
//!
//! Matching never reorders: results come out in the order the candidates
//! went in, which is the dictionary or store declaration order.

use std::collections::HashSet;

use crate::entry::IdentifierEntry;
use crate::variables::VariableEntry;

/// How a fragment is matched against candidate names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// Case-insensitive prefix match.
    Prefix,
    /// Case-insensitive substring match.
    Substring,
}

/// Anything with a name that can be matched.
pub trait Candidate {
    /// The name matched against the fragment.
    fn name(&self) -> &str;
}

impl Candidate for str {
    fn name(&self) -> &str {
        self
    }
}

impl Candidate for String {
    fn name(&self) -> &str {
        self
    }
}

impl Candidate for IdentifierEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Candidate for VariableEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

impl<T: Candidate + ?Sized> Candidate for &T {
    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: Candidate + ?Sized> Candidate for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Check whether `name` matches `fragment` in the given mode.
pub fn matches(fragment: &str, name: &str, mode: MatchMode) -> bool {
    if fragment.is_empty() {
        return true;
    }
    let needle = fragment.to_lowercase();
    matches_folded(&needle, name, mode)
}

/// Match against an already case-folded fragment.
fn matches_folded(needle: &str, name: &str, mode: MatchMode) -> bool {
    if needle.is_empty() {
        return true;
    }
    let haystack = name.to_lowercase();
    match mode {
        MatchMode::Prefix => haystack.starts_with(needle),
        MatchMode::Substring => haystack.contains(needle),
    }
}

/// Lazily filter candidates by fragment, preserving input order.
pub fn filter<I, T>(fragment: &str, candidates: I, mode: MatchMode) -> impl Iterator<Item = T>
where
    I: IntoIterator<Item = T>,
    T: Candidate,
{
    let needle = fragment.to_lowercase();
    candidates
        .into_iter()
        .filter(move |candidate| matches_folded(&needle, candidate.name(), mode))
}

/// A ranked match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranked<T> {
    /// The matched candidate.
    pub candidate: T,
    /// Whether this is the preselected default.
    pub preselect: bool,
}

/// Ranking configuration: mode, exclusions and default preselection.
#[derive(Debug, Clone)]
pub struct Ranker {
    mode: MatchMode,
    /// Case-folded names that must never be offered.
    excluded: HashSet<String>,
    preselect_default: bool,
}

impl Ranker {
    /// Create a ranker for the given mode.
    pub fn new(mode: MatchMode) -> Self {
        Self {
            mode,
            excluded: HashSet::new(),
            preselect_default: false,
        }
    }

    /// Exclude names (compared case-insensitively) from the results.
    #[must_use]
    pub fn excluding<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded
            .extend(names.into_iter().map(|n| n.as_ref().trim().to_lowercase()));
        self
    }

    /// Flag the first surviving candidate (canonical order) as the default.
    #[must_use]
    pub const fn preselecting_default(mut self) -> Self {
        self.preselect_default = true;
        self
    }

    /// The configured match mode.
    pub const fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Whether a name is in the exclusion set.
    pub fn is_excluded(&self, name: &str) -> bool {
        !self.excluded.is_empty() && self.excluded.contains(&name.to_lowercase())
    }

    /// Rank candidates against a fragment.
    ///
    /// The default, when requested, is the first candidate in input order
    /// that survives both the exclusion set and the fragment filter; it is
    /// always placed first.
    pub fn rank<I, T>(&self, fragment: &str, candidates: I) -> Vec<Ranked<T>>
    where
        I: IntoIterator<Item = T>,
        T: Candidate,
    {
        let mut ranked: Vec<Ranked<T>> = filter(fragment, candidates, self.mode)
            .filter(|candidate| !self.is_excluded(candidate.name()))
            .map(|candidate| Ranked {
                candidate,
                preselect: false,
            })
            .collect();

        if self.preselect_default {
            if let Some(first) = ranked.first_mut() {
                first.preselect = true;
            }
        }

        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCES: &[&str] = &["message", "trace", "accessLog", "ffdc", "audit"];

    #[test]
    fn test_prefix_is_case_insensitive() {
        let found: Vec<_> = filter("ACC", SOURCES.iter().copied(), MatchMode::Prefix).collect();
        assert_eq!(found, vec!["accessLog"]);
    }

    #[test]
    fn test_empty_fragment_matches_all() {
        let found: Vec<_> = filter("", SOURCES.iter().copied(), MatchMode::Prefix).collect();
        assert_eq!(found.len(), SOURCES.len());
        let found: Vec<_> = filter("", SOURCES.iter().copied(), MatchMode::Substring).collect();
        assert_eq!(found.len(), SOURCES.len());
    }

    #[test]
    fn test_substring_mode() {
        let names = ["default.http.port", "default.https.port", "app.name"];
        let found: Vec<_> = filter("HTTPS", names.iter().copied(), MatchMode::Substring).collect();
        assert_eq!(found, vec!["default.https.port"]);

        let found: Vec<_> = filter("https", names.iter().copied(), MatchMode::Prefix).collect();
        assert!(found.is_empty());
    }

    #[test]
    fn test_rank_excludes_case_insensitively() {
        let ranked = Ranker::new(MatchMode::Prefix)
            .excluding(["TRACE"])
            .rank("", SOURCES.iter().copied());
        let names: Vec<_> = ranked.iter().map(|r| r.candidate).collect();
        assert_eq!(names, vec!["message", "accessLog", "ffdc", "audit"]);
        assert!(ranked.iter().all(|r| !r.preselect));
    }

    #[test]
    fn test_rank_preselects_first_survivor() {
        let ranked = Ranker::new(MatchMode::Prefix)
            .excluding(["message"])
            .preselecting_default()
            .rank("", SOURCES.iter().copied());
        assert_eq!(ranked[0].candidate, "trace");
        assert!(ranked[0].preselect);
        assert_eq!(ranked.iter().filter(|r| r.preselect).count(), 1);
    }

    #[test]
    fn test_rank_preselect_with_no_matches() {
        let ranked = Ranker::new(MatchMode::Prefix)
            .preselecting_default()
            .rank("zzz", SOURCES.iter().copied());
        assert!(ranked.is_empty());
    }
}

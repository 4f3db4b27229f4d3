//! Entity resolution: finds players, teams and ranking criteria in an
//! utterance.
//!
//! Matching runs in three phases, each only over text the previous phases
//! left unclaimed:
//!
//! 1. **Exact**: case- and whitespace-normalized alias occurrences in the
//!    compacted utterance. Players and teams must begin at a word start;
//!    criteria may sit inside a word ("홈런왕"). Confidence 1.0.
//! 2. **Partial**: a word core (particles stripped) that is a substring of
//!    a longer alias. Confidence `0.5 + 0.4 * coverage`.
//! 3. **Fuzzy**: jamo-level edit similarity at or above the threshold.
//!
//! Role keywords ("타자", "투수", ...) are claimed before any phase so they
//! qualify a team instead of ever resolving as a player.
//!
//! Within a span, candidates rank by team context, then score, then catalog
//! order. The catalog stores teams before criteria before players, so an
//! alias shared by a team and a player resolves to the team.

use std::collections::BTreeMap;
use std::ops::Range;

use dugout_catalog::EntityCatalog;
use dugout_core::{EntityKind, PlayerRole};
use serde::Serialize;
use tracing::debug;

use crate::fuzzy::similarity;
use crate::lexicon::is_stop_word;
use crate::text::{self, ascii_boundaries_ok, has_hangul, overlaps, Compacted};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Partial,
    Fuzzy,
}

/// One candidate reading of a span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEntity {
    pub kind: EntityKind,
    pub canonical_id: String,
    pub display_name: String,
    /// In `[0, 1]`; exact matches are 1.0.
    pub confidence: f64,
    /// Substring of the original utterance.
    pub source_span: String,
    /// Byte range of `source_span` in the utterance.
    pub range: Range<usize>,
    pub match_kind: MatchKind,
}

/// All candidates for one span, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanMatch {
    pub span: String,
    pub range: Range<usize>,
    pub candidates: Vec<ResolvedEntity>,
}

impl SpanMatch {
    pub fn best(&self) -> Option<&ResolvedEntity> {
        self.candidates.first()
    }

    pub fn is_ambiguous(&self) -> bool {
        self.candidates.len() > 1
    }
}

/// A role keyword found in the utterance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleMention {
    pub role: PlayerRole,
    pub span: String,
    pub range: Range<usize>,
}

/// Everything recognized in one utterance, in utterance order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    pub spans: Vec<SpanMatch>,
    pub roles: Vec<RoleMention>,
}

impl Resolution {
    /// Best candidate of every span.
    pub fn entities(&self) -> impl Iterator<Item = &ResolvedEntity> {
        self.spans.iter().filter_map(SpanMatch::best)
    }

    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &ResolvedEntity> {
        self.entities().filter(move |e| e.kind == kind)
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.of_kind(kind).count()
    }

    /// First role qualifier mentioned.
    pub fn role(&self) -> Option<PlayerRole> {
        self.roles.first().map(|r| r.role)
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn ambiguous(&self) -> impl Iterator<Item = &SpanMatch> {
        self.spans.iter().filter(|s| s.is_ambiguous())
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    range: Range<usize>,
    entry: usize,
    score: f64,
    kind: MatchKind,
}

struct Group {
    range: Range<usize>,
    candidates: Vec<Candidate>,
}

/// Pure function of utterance and catalog snapshot.
#[derive(Debug, Clone)]
pub struct EntityResolver {
    fuzzy_threshold: f64,
}

impl EntityResolver {
    pub fn new(fuzzy_threshold: f64) -> Self {
        Self { fuzzy_threshold }
    }

    pub fn resolve(&self, utterance: &str, catalog: &EntityCatalog) -> Resolution {
        let compacted = Compacted::new(utterance);
        let mut claimed: Vec<Range<usize>> = Vec::new();
        let mut groups: Vec<Group> = Vec::new();

        let roles = role_mentions(utterance, &compacted, catalog, &mut claimed);

        let exact = exact_candidates(utterance, &compacted, catalog);
        accept(exact, &mut claimed, &mut groups);

        let partial = partial_candidates(utterance, catalog, &claimed);
        accept(partial, &mut claimed, &mut groups);

        let fuzzy = self.fuzzy_candidates(utterance, catalog, &claimed);
        accept(fuzzy, &mut claimed, &mut groups);

        let spans = rank(utterance, catalog, groups);
        for span in &spans {
            debug!(
                "Span '{}': {}",
                span.span,
                span.candidates
                    .iter()
                    .map(|c| format!("{}:{} ({:.2})", c.kind, c.canonical_id, c.confidence))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        Resolution { spans, roles }
    }

    fn fuzzy_candidates(
        &self,
        utterance: &str,
        catalog: &EntityCatalog,
        claimed: &[Range<usize>],
    ) -> Vec<Candidate> {
        let mut out = Vec::new();
        for word in text::words(utterance) {
            if claimed.iter().any(|r| overlaps(r, &word.range)) {
                continue;
            }
            let core = text::strip_particles(word.text);
            if !is_candidate_core(core) || !has_hangul(core) {
                continue;
            }
            let forms = [text::compact(word.text), text::compact(core)];
            let range = word.range.start..word.range.start + core.len();

            for (idx, entry) in catalog.entries.iter().enumerate() {
                let best = entry
                    .names()
                    .filter(|n| has_hangul(n))
                    .map(text::compact)
                    .flat_map(|name| forms.iter().map(move |f| similarity(f, &name)))
                    .fold(0.0_f64, f64::max);
                if best >= self.fuzzy_threshold {
                    out.push(Candidate {
                        range: range.clone(),
                        entry: idx,
                        score: best,
                        kind: MatchKind::Fuzzy,
                    });
                }
            }
        }
        out
    }
}

fn role_mentions(
    utterance: &str,
    compacted: &Compacted,
    catalog: &EntityCatalog,
    claimed: &mut Vec<Range<usize>>,
) -> Vec<RoleMention> {
    let mut keywords: Vec<(String, PlayerRole)> = catalog
        .role_keywords()
        .map(|(k, role)| (text::compact(k), role))
        .collect();
    keywords.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut out = Vec::new();
    for (keyword, role) in keywords {
        for range in compacted.find_all(&keyword, |_| true) {
            if claimed.iter().any(|r| overlaps(r, &range)) {
                continue;
            }
            claimed.push(range.clone());
            out.push(RoleMention {
                role,
                span: span_text(utterance, &range),
                range,
            });
        }
    }
    out.sort_by_key(|m| m.range.start);
    out
}

fn exact_candidates(utterance: &str, compacted: &Compacted, catalog: &EntityCatalog) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (idx, entry) in catalog.entries.iter().enumerate() {
        let anywhere = entry.kind == EntityKind::Criterion;
        for name in entry.names() {
            let needle = text::compact(name);
            let hits = compacted.find_all(&needle, |start| anywhere || compacted.is_word_start(start));
            for range in hits {
                if ascii_boundaries_ok(utterance, &range) {
                    out.push(Candidate {
                        range,
                        entry: idx,
                        score: 1.0,
                        kind: MatchKind::Exact,
                    });
                }
            }
        }
    }
    out
}

fn partial_candidates(utterance: &str, catalog: &EntityCatalog, claimed: &[Range<usize>]) -> Vec<Candidate> {
    let mut out = Vec::new();
    for word in text::words(utterance) {
        if claimed.iter().any(|r| overlaps(r, &word.range)) {
            continue;
        }
        let core = text::strip_particles(word.text);
        if !is_candidate_core(core) {
            continue;
        }
        let needle = text::compact(core);
        let needle_chars = needle.chars().count();
        let range = word.range.start..word.range.start + core.len();

        for (idx, entry) in catalog.entries.iter().enumerate() {
            let best = entry
                .names()
                .map(text::compact)
                .filter(|name| name.chars().count() > needle_chars && name.contains(&needle))
                .map(|name| 0.5 + 0.4 * needle_chars as f64 / name.chars().count() as f64)
                .reduce(f64::max);
            if let Some(score) = best {
                out.push(Candidate {
                    range: range.clone(),
                    entry: idx,
                    score,
                    kind: MatchKind::Partial,
                });
            }
        }
    }
    out
}

/// Words worth trying as partial or fuzzy names.
fn is_candidate_core(core: &str) -> bool {
    let chars = core.chars().count();
    chars >= 2
        && (has_hangul(core) || chars >= 3)
        && !core.chars().any(|c| c.is_ascii_digit())
        && !is_stop_word(core)
}

/// Claim spans from one phase: longer first, then leftmost, skipping any
/// that overlap earlier claims.
fn accept(candidates: Vec<Candidate>, claimed: &mut Vec<Range<usize>>, groups: &mut Vec<Group>) {
    let mut by_range: BTreeMap<(usize, usize), Vec<Candidate>> = BTreeMap::new();
    for c in candidates {
        let slot = by_range.entry((c.range.start, c.range.end)).or_default();
        match slot.iter_mut().find(|existing| existing.entry == c.entry) {
            Some(existing) if existing.score < c.score => *existing = c,
            Some(_) => {}
            None => slot.push(c),
        }
    }

    let mut ranges: Vec<(usize, usize)> = by_range.keys().copied().collect();
    ranges.sort_by(|a, b| (b.1 - b.0).cmp(&(a.1 - a.0)).then(a.0.cmp(&b.0)));

    for key in ranges {
        let range = key.0..key.1;
        if claimed.iter().any(|r| overlaps(r, &range)) {
            continue;
        }
        if let Some(candidates) = by_range.remove(&key) {
            claimed.push(range.clone());
            groups.push(Group { range, candidates });
        }
    }
}

fn rank(utterance: &str, catalog: &EntityCatalog, mut groups: Vec<Group>) -> Vec<SpanMatch> {
    let by_score = |a: &Candidate, b: &Candidate| b.score.total_cmp(&a.score).then(a.entry.cmp(&b.entry));
    for group in &mut groups {
        group.candidates.sort_by(by_score);
    }

    // Teams that win their own span give context to player spans elsewhere.
    let team_mentions: Vec<(usize, String)> = groups
        .iter()
        .enumerate()
        .filter_map(|(i, g)| {
            let top = catalog.entries.get(g.candidates.first()?.entry)?;
            (top.kind == EntityKind::Team).then(|| (i, top.canonical_id.clone()))
        })
        .collect();

    let mut spans: Vec<SpanMatch> = groups
        .into_iter()
        .enumerate()
        .map(|(i, mut group)| {
            let in_context = |c: &Candidate| {
                catalog
                    .entries
                    .get(c.entry)
                    .and_then(|e| e.player_team())
                    .is_some_and(|team| team_mentions.iter().any(|(j, id)| *j != i && id == team))
            };
            group
                .candidates
                .sort_by(|a, b| in_context(b).cmp(&in_context(a)).then(by_score(a, b)));

            let span = span_text(utterance, &group.range);
            let candidates = group
                .candidates
                .iter()
                .filter_map(|c| {
                    let entry = catalog.entries.get(c.entry)?;
                    Some(ResolvedEntity {
                        kind: entry.kind,
                        canonical_id: entry.canonical_id.clone(),
                        display_name: entry.display_name.clone(),
                        confidence: c.score.clamp(0.0, 1.0),
                        source_span: span.clone(),
                        range: c.range.clone(),
                        match_kind: c.kind,
                    })
                })
                .collect();
            SpanMatch {
                span,
                range: group.range,
                candidates,
            }
        })
        .collect();

    spans.sort_by_key(|s| s.range.start);
    spans
}

fn span_text(utterance: &str, range: &Range<usize>) -> String {
    utterance.get(range.clone()).unwrap_or_default().to_string()
}

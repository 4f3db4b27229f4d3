use std::collections::{HashMap, HashSet};

use chrono::Utc;
use dugout_core::EntityKind;
use tracing::{info, warn};

use super::seed::CatalogSeed;
use super::types::{CatalogEntry, EntityCatalog, EntryMetadata};
use crate::manifest::{hash_content_keys, short_version};
use crate::source::PlayerListing;

/// Assembles an [`EntityCatalog`] from the seed and the store's player listing.
pub struct CatalogBuilder<'a> {
    seed: &'a CatalogSeed,
    players: Vec<PlayerListing>,
}

impl<'a> CatalogBuilder<'a> {
    pub fn new(seed: &'a CatalogSeed) -> Self {
        Self {
            seed,
            players: Vec::new(),
        }
    }

    pub fn with_players(mut self, players: Vec<PlayerListing>) -> Self {
        self.players = players;
        self
    }

    /// Insert teams, then criteria, then players. A repeated `(kind, id)`
    /// is dropped with a warning; the first occurrence wins.
    pub fn build(self) -> EntityCatalog {
        let mut entries: Vec<CatalogEntry> = Vec::new();
        let mut seen: HashSet<(EntityKind, String)> = HashSet::new();

        let mut push = |entry: CatalogEntry| {
            if seen.insert((entry.kind, entry.canonical_id.clone())) {
                entries.push(entry);
            } else {
                warn!(
                    "Duplicate catalog id {}:{} ('{}') dropped",
                    entry.kind, entry.canonical_id, entry.display_name
                );
            }
        };

        for team in &self.seed.teams {
            let extra = team.aliases.iter().chain(std::iter::once(&team.full_name));
            push(CatalogEntry {
                canonical_id: team.code.clone(),
                aliases: dedup_aliases(&team.name, extra),
                display_name: team.name.clone(),
                kind: EntityKind::Team,
                metadata: EntryMetadata::Team {
                    code: team.code.clone(),
                    full_name: team.full_name.clone(),
                    stadium: team.stadium.clone(),
                },
            });
        }

        for criterion in &self.seed.criteria {
            push(CatalogEntry {
                canonical_id: criterion.id.clone(),
                aliases: dedup_aliases(&criterion.name, criterion.aliases.iter()),
                display_name: criterion.name.clone(),
                kind: EntityKind::Criterion,
                metadata: EntryMetadata::Criterion {
                    mapping: criterion.mapping.clone(),
                },
            });
        }

        let nicknames: HashMap<&str, _> = self
            .seed
            .player_aliases
            .iter()
            .map(|a| (a.player_id.as_str(), a))
            .collect();

        for player in self.players {
            let seeded = nicknames.get(player.player_id.as_str());
            let extra = player
                .aliases
                .iter()
                .chain(seeded.into_iter().flat_map(|s| s.aliases.iter()));
            let role = player.role.or_else(|| seeded.and_then(|s| s.role));
            push(CatalogEntry {
                aliases: dedup_aliases(&player.name, extra),
                canonical_id: player.player_id,
                display_name: player.name,
                kind: EntityKind::Player,
                metadata: EntryMetadata::Player {
                    team: player.team,
                    role,
                },
            });
        }

        let mut catalog = EntityCatalog {
            version: String::new(),
            built_at: Utc::now().to_rfc3339(),
            entries,
            tables: self.seed.tables.clone(),
            roles: self.seed.roles.clone(),
        };
        catalog.version = hash_content_keys(&catalog.content_keys());

        info!(
            "Catalog built: {} teams, {} criteria, {} players (version {})",
            catalog.entries_of(EntityKind::Team).count(),
            catalog.entries_of(EntityKind::Criterion).count(),
            catalog.entries_of(EntityKind::Player).count(),
            short_version(&catalog.version)
        );

        catalog
    }
}

fn dedup_aliases<'s>(display_name: &str, aliases: impl Iterator<Item = &'s String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for alias in aliases {
        let alias = alias.trim();
        if alias.is_empty() || alias.eq_ignore_ascii_case(display_name) {
            continue;
        }
        if !out.iter().any(|a| a.eq_ignore_ascii_case(alias)) {
            out.push(alias.to_string());
        }
    }
    out
}

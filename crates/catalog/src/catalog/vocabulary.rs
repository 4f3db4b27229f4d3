use dugout_core::EntityKind;

use super::types::{EntityCatalog, EntryMetadata};

/// Cap on player names listed in the vocabulary; the rest are summarized.
const MAX_VOCABULARY_PLAYERS: usize = 40;

impl EntityCatalog {
    /// Compact description of the domain vocabulary for the fallback
    /// classifier's system prompt.
    pub fn vocabulary_prompt(&self) -> String {
        let mut lines = Vec::new();

        lines.push("Teams:".to_string());
        for team in self.entries_of(EntityKind::Team) {
            let stadium = match &team.metadata {
                EntryMetadata::Team {
                    stadium: Some(s), ..
                } => format!(", home {}", s),
                _ => String::new(),
            };
            lines.push(format!(
                "  - {} ({}{}) aka {}",
                team.display_name,
                team.canonical_id,
                stadium,
                team.aliases.join(", ")
            ));
        }

        lines.push(String::new());
        lines.push("Ranking criteria:".to_string());
        for criterion in self.entries_of(EntityKind::Criterion) {
            let note = match criterion.mapping() {
                Some(m) => format!("{} {}", m.column, m.direction),
                None => "no stat column".to_string(),
            };
            lines.push(format!("  - {} [{}]", criterion.display_name, note));
        }

        if !self.roles.is_empty() {
            lines.push(String::new());
            lines.push("Role words:".to_string());
            for role in &self.roles {
                lines.push(format!("  - {}: {}", role.role, role.keywords.join(", ")));
            }
        }

        let players: Vec<&str> = self
            .entries_of(EntityKind::Player)
            .map(|p| p.display_name.as_str())
            .collect();
        if !players.is_empty() {
            lines.push(String::new());
            let shown = players.len().min(MAX_VOCABULARY_PLAYERS);
            let mut line = format!("Players ({} known): {}", players.len(), players[..shown].join(", "));
            if players.len() > shown {
                line.push_str(", ...");
            }
            lines.push(line);
        }

        lines.join("\n")
    }
}

use dugout_core::{EntityKind, PlayerRole, SortDirection, TargetKind};
use serde::{Deserialize, Serialize};

/// A single resolvable domain object: player, team or ranking criterion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub canonical_id: String,
    pub display_name: String,
    /// Alternate surface forms, deduplicated, insertion order kept.
    #[serde(default)]
    pub aliases: Vec<String>,
    pub kind: EntityKind,
    pub metadata: EntryMetadata,
}

impl CatalogEntry {
    /// Display name followed by every alias.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.display_name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn player_team(&self) -> Option<&str> {
        match &self.metadata {
            EntryMetadata::Player { team, .. } => team.as_deref(),
            _ => None,
        }
    }

    pub fn player_role(&self) -> Option<PlayerRole> {
        match &self.metadata {
            EntryMetadata::Player { role, .. } => *role,
            _ => None,
        }
    }

    pub fn mapping(&self) -> Option<&CriterionMapping> {
        match &self.metadata {
            EntryMetadata::Criterion { mapping } => mapping.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntryMetadata {
    Player {
        team: Option<String>,
        role: Option<PlayerRole>,
    },
    Team {
        code: String,
        full_name: String,
        stadium: Option<String>,
    },
    Criterion {
        mapping: Option<CriterionMapping>,
    },
}

/// How a ranking criterion maps onto a stat column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionMapping {
    pub column: String,
    /// Natural "best first" order for this stat (ERA ascends, home runs descend).
    pub direction: SortDirection,
    #[serde(default = "default_target")]
    pub target: TargetKind,
    /// Role implied by the stat when the user names none (ERA implies pitchers).
    #[serde(default)]
    pub role: Option<PlayerRole>,
    /// Decimal places used when rendering values.
    #[serde(default)]
    pub precision: Option<usize>,
}

fn default_target() -> TargetKind {
    TargetKind::Player
}

/// A column exposed by a store table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

/// Logical table backing one plan target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub target: TargetKind,
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.name == column)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleKeywords {
    pub role: PlayerRole,
    pub keywords: Vec<String>,
}

/// Immutable snapshot of everything the resolver and planner know about.
///
/// Entries are stored teams first, then criteria, then players. Resolver
/// tie-breaks fall back to this order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCatalog {
    /// SHA-256 over the sorted content keys, see [`EntityCatalog::content_keys`].
    pub version: String,
    pub built_at: String,
    pub entries: Vec<CatalogEntry>,
    pub tables: Vec<TableSchema>,
    pub roles: Vec<RoleKeywords>,
}

impl EntityCatalog {
    /// Placeholder before the first successful build. Providers refuse it.
    pub fn empty() -> Self {
        Self {
            version: String::new(),
            built_at: String::new(),
            entries: Vec::new(),
            tables: Vec::new(),
            roles: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries_of(&self, kind: EntityKind) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    pub fn get(&self, kind: EntityKind, canonical_id: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == kind && e.canonical_id == canonical_id)
    }

    /// Position of an entry in insertion order.
    pub fn position(&self, kind: EntityKind, canonical_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.kind == kind && e.canonical_id == canonical_id)
    }

    pub fn team_name(&self, code: &str) -> Option<&str> {
        self.get(EntityKind::Team, code).map(|e| e.display_name.as_str())
    }

    pub fn table(&self, target: TargetKind) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.target == target)
    }

    /// Criterion whose mapping points at `column` on `target`.
    pub fn criterion_for_column(&self, target: TargetKind, column: &str) -> Option<&CatalogEntry> {
        self.entries_of(EntityKind::Criterion).find(|e| {
            e.mapping()
                .map(|m| m.target == target && m.column == column)
                .unwrap_or(false)
        })
    }

    /// Keys the content version is hashed from: one per entry, table and
    /// role group, each carrying its serialized content.
    pub fn content_keys(&self) -> Vec<String> {
        let entries = self
            .entries
            .iter()
            .map(|e| format!("{}:{}:{}", e.kind, e.canonical_id, to_json(e)));
        let tables = self
            .tables
            .iter()
            .map(|t| format!("TABLE:{}:{}", t.target, to_json(t)));
        let roles = self
            .roles
            .iter()
            .map(|r| format!("ROLE:{}:{}", r.role, to_json(r)));
        entries.chain(tables).chain(roles).collect()
    }

    pub fn role_keywords(&self) -> impl Iterator<Item = (&str, PlayerRole)> {
        self.roles
            .iter()
            .flat_map(|r| r.keywords.iter().map(move |k| (k.as_str(), r.role)))
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

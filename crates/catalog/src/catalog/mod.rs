mod builder;
mod seed;
mod types;
mod vocabulary;

pub use builder::CatalogBuilder;
pub use seed::{CatalogSeed, CriterionSeed, PlayerAliasSeed, TeamSeed};
pub use types::{
    CatalogEntry, ColumnSchema, CriterionMapping, EntityCatalog, EntryMetadata, RoleKeywords,
    TableSchema,
};

#[cfg(test)]
mod tests;

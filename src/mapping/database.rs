use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A pathway database. Custom databases are user-submitted and keep their own name.
///
/// Databases order by their key (`kegg`, `reactome`, ...), which is the column order used by
/// the consensus tables before DecoPath is moved to the end.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Database {
    Kegg,
    Reactome,
    WikiPathways,
    PathBank,
    DecoPath,
    Custom(String),
}

impl Database {
    /// Parse a database key or resource label, case-insensitively.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "kegg" => Database::Kegg,
            "reactome" => Database::Reactome,
            "wikipathways" => Database::WikiPathways,
            "pathbank" => Database::PathBank,
            "decopath" => Database::DecoPath,
            _ => Database::Custom(name.trim().to_string()),
        }
    }

    /// Infer the database from the identifier prefix of one of its pathways.
    pub fn from_identifier(pathway_id: &str) -> Self {
        if pathway_id.starts_with("hsa") {
            Database::Kegg
        } else if pathway_id.starts_with("PW") {
            Database::PathBank
        } else if pathway_id.starts_with("R-HSA") {
            Database::Reactome
        } else if pathway_id.starts_with("WP") {
            Database::WikiPathways
        } else if pathway_id.starts_with("DC") {
            Database::DecoPath
        } else {
            Database::Custom("custom".to_string())
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Database::Kegg => "kegg",
            Database::Reactome => "reactome",
            Database::WikiPathways => "wikipathways",
            Database::PathBank => "pathbank",
            Database::DecoPath => "decopath",
            Database::Custom(name) => name,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Database::Kegg => "KEGG",
            Database::Reactome => "Reactome",
            Database::WikiPathways => "WikiPathways",
            Database::PathBank => "PathBank",
            Database::DecoPath => "DecoPath",
            Database::Custom(name) => name,
        }
    }

    pub fn is_decopath(&self) -> bool {
        matches!(self, Database::DecoPath)
    }
}

impl Ord for Database {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(other.key())
    }
}

impl PartialOrd for Database {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for Database {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for Database {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Database::parse(&name))
    }
}

/// Columns of a consensus table: the sorted databases, with DecoPath forced last.
pub fn column_order<'a, I>(databases: I) -> Vec<Database>
where
    I: IntoIterator<Item = &'a Database>,
{
    let mut columns: Vec<Database> = databases.into_iter().cloned().collect();
    columns.sort();
    columns.dedup();

    if let Some(pos) = columns.iter().position(Database::is_decopath) {
        let decopath = columns.remove(pos);
        columns.push(decopath);
    }

    columns
}

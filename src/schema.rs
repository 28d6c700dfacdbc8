use sea_query::Iden;

/// Metadata table - key-value store for database configuration
#[derive(Iden)]
pub enum Metadata {
    Table,
    Key,
    Value,
}

/// Records table - one row per listed object
#[derive(Iden, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Records {
    Table,
    Id,
    Name,
    Description,
    Level,
    Location,
    /// JSON array of image URLs
    Images,
    CreatedAtMs,
}

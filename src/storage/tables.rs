use redb::TableDefinition;

/// Key-value preferences: key -> string value (the photo index lives here as JSON)
pub const PREFERENCES: TableDefinition<&str, &str> = TableDefinition::new("preferences");

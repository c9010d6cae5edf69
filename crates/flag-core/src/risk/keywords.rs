//! Tablas fijas palabra clave -> peso.
//!
//! El orden de las tablas (critical > high > medium > routine) y el orden de
//! las entradas dentro de cada tabla determinan el orden de `detected_issues`.

/// Tier de una tabla de palabras clave; da el prefijo de los tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordTier {
    Critical,
    High,
    Medium,
    Routine,
}

impl KeywordTier {
    pub fn prefix(&self) -> &'static str {
        match self {
            KeywordTier::Critical => "critical",
            KeywordTier::High => "high",
            KeywordTier::Medium => "medium",
            KeywordTier::Routine => "routine",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KeywordTable {
    pub tier: KeywordTier,
    pub keywords: &'static [(&'static str, u32)],
}

impl KeywordTable {
    /// Tag de una palabra clave: `{tier}_{keyword_with_underscores}`.
    pub fn tag(&self, keyword: &str) -> String {
        format!("{}_{}", self.tier.prefix(), keyword.replace(' ', "_"))
    }
}

const CRITICAL: KeywordTable = KeywordTable { tier: KeywordTier::Critical,
                                              keywords: &[("payment", 35),
                                                          ("billing", 35),
                                                          ("delete user", 40),
                                                          ("delete data", 35),
                                                          ("drop table", 45),
                                                          ("production data", 40),
                                                          ("user password", 35),
                                                          ("credit card", 40)] };

const HIGH: KeywordTable = KeywordTable { tier: KeywordTier::High,
                                          keywords: &[("authentication", 25),
                                                      ("security", 25),
                                                      ("database schema", 25),
                                                      ("migration", 25),
                                                      ("alter table", 28),
                                                      ("oauth", 20),
                                                      ("redis", 12),
                                                      ("cache", 10)] };

const MEDIUM: KeywordTable = KeywordTable { tier: KeywordTier::Medium,
                                            keywords: &[("database", 15),
                                                        ("sql", 15),
                                                        ("backend api", 12),
                                                        ("third-party service", 12),
                                                        ("external api", 12),
                                                        ("webhook", 10),
                                                        ("ml model", 15),
                                                        ("tensorflow", 12),
                                                        ("algorithm", 12)] };

const ROUTINE: KeywordTable = KeywordTable { tier: KeywordTier::Routine,
                                             keywords: &[("api", 5),
                                                         ("backend", 4),
                                                         ("integration", 8),
                                                         ("email", 6),
                                                         ("notification", 5),
                                                         ("template", 3),
                                                         ("user", 3),
                                                         ("data", 3),
                                                         ("retry", 4),
                                                         ("queue", 6),
                                                         ("async", 5)] };

/// Tablas en orden de prioridad.
pub const KEYWORD_TABLES: [KeywordTable; 4] = [CRITICAL, HIGH, MEDIUM, ROUTINE];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_in_priority_order() {
        let tiers: Vec<KeywordTier> = KEYWORD_TABLES.iter().map(|t| t.tier).collect();
        assert_eq!(tiers,
                   vec![KeywordTier::Critical, KeywordTier::High, KeywordTier::Medium, KeywordTier::Routine]);
    }

    #[test]
    fn tag_replaces_spaces() {
        assert_eq!(KEYWORD_TABLES[0].tag("drop table"), "critical_drop_table");
        assert_eq!(KEYWORD_TABLES[2].tag("third-party service"), "medium_third-party_service");
    }
}

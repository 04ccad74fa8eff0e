use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Service tier reported by the account. Tags the table doesn't know about are
/// kept verbatim (upper-cased) instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlanTag {
    Pro,
    Max,
    Ultra,
    Unknown(String),
}

impl PlanTag {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pro => "PRO",
            Self::Max => "MAX",
            Self::Ultra => "ULTRA",
            Self::Unknown(tag) => tag,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for PlanTag {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<&str> for PlanTag {
    fn from(raw: &str) -> Self {
        let tag = raw.trim().to_uppercase();
        match tag.as_str() {
            "PRO" => Self::Pro,
            "MAX" => Self::Max,
            "ULTRA" => Self::Ultra,
            _ => Self::Unknown(tag),
        }
    }
}

impl From<PlanTag> for String {
    fn from(tag: PlanTag) -> Self {
        tag.as_str().to_string()
    }
}

impl std::fmt::Display for PlanTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPolicy {
    /// Maximum credits an account on this plan can hold
    pub credit_ceiling: u64,
    /// Credits per hour, used only when the service doesn't report a rate
    pub fallback_recovery_rate: u32,
}

/// Plan ceilings and fallback rates, keyed by plan tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanTable(BTreeMap<PlanTag, PlanPolicy>);

impl Default for PlanTable {
    fn default() -> Self {
        Self::from_entries([
            (
                PlanTag::Pro,
                PlanPolicy {
                    credit_ceiling: 8_000,
                    fallback_recovery_rate: 200,
                },
            ),
            (
                PlanTag::Max,
                PlanPolicy {
                    credit_ceiling: 20_000,
                    fallback_recovery_rate: 500,
                },
            ),
            (
                PlanTag::Ultra,
                PlanPolicy {
                    credit_ceiling: 50_000,
                    fallback_recovery_rate: 1_250,
                },
            ),
        ])
    }
}

impl PlanTable {
    pub fn from_entries(entries: impl IntoIterator<Item = (PlanTag, PlanPolicy)>) -> Self {
        Self(entries.into_iter().collect())
    }

    pub fn get(&self, plan: &PlanTag) -> Option<&PlanPolicy> {
        self.0.get(plan)
    }

    /// Ceiling for `plan`, or 0 when the plan isn't in the table.
    pub fn ceiling_for(&self, plan: &PlanTag) -> u64 {
        self.get(plan).map(|p| p.credit_ceiling).unwrap_or(0)
    }

    pub fn fallback_rate_for(&self, plan: &PlanTag) -> Option<u32> {
        self.get(plan).map(|p| p.fallback_recovery_rate)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlanTag, &PlanPolicy)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply per-plan overrides on top of this table. Fields an override
    /// leaves out keep their current value (0 for plans not yet in the table).
    pub fn merge(&mut self, overrides: BTreeMap<PlanTag, PlanOverride>) {
        for (tag, patch) in overrides {
            let entry = self.0.entry(tag).or_insert(PlanPolicy {
                credit_ceiling: 0,
                fallback_recovery_rate: 0,
            });
            if let Some(ceiling) = patch.credit_ceiling {
                entry.credit_ceiling = ceiling;
            }
            if let Some(rate) = patch.fallback_recovery_rate {
                entry.fallback_recovery_rate = rate;
            }
        }
    }
}

/// One `[plans.<TAG>]` table from the config file.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PlanOverride {
    pub credit_ceiling: Option<u64>,
    pub fallback_recovery_rate: Option<u32>,
}

/// Deserialize configured plans as overrides of [`PlanTable::default`], so
/// configuring one plan leaves the built-in ones in place.
pub fn deserialize_over_defaults<'de, D>(de: D) -> Result<PlanTable, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let overrides = BTreeMap::<PlanTag, PlanOverride>::deserialize(de)?;
    let mut table = PlanTable::default();
    table.merge(overrides);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_tag_parses_case_insensitively() {
        assert_eq!(PlanTag::from("pro"), PlanTag::Pro);
        assert_eq!(PlanTag::from(" Max "), PlanTag::Max);
        assert_eq!(PlanTag::from("ULTRA"), PlanTag::Ultra);
    }

    #[test]
    fn plan_tag_keeps_unknown_tags() {
        let tag = PlanTag::from("enterprise");
        assert_eq!(tag, PlanTag::Unknown("ENTERPRISE".to_string()));
        assert!(!tag.is_known());
        assert_eq!(tag.to_string(), "ENTERPRISE");
    }

    #[test]
    fn plan_tag_deserializes_from_json_string() {
        let tag: PlanTag = serde_json::from_str(r#""max""#).unwrap();
        assert_eq!(tag, PlanTag::Max);
        let json = serde_json::to_string(&PlanTag::Ultra).unwrap();
        assert_eq!(json, r#""ULTRA""#);
    }

    #[test]
    fn default_table_ceilings() {
        let table = PlanTable::default();
        assert_eq!(table.ceiling_for(&PlanTag::Pro), 8_000);
        assert_eq!(table.ceiling_for(&PlanTag::Max), 20_000);
        assert_eq!(table.fallback_rate_for(&PlanTag::Max), Some(500));
    }

    #[test]
    fn unknown_plan_has_zero_ceiling() {
        let table = PlanTable::default();
        let tag = PlanTag::from("free");
        assert_eq!(table.ceiling_for(&tag), 0);
        assert_eq!(table.fallback_rate_for(&tag), None);
    }

    #[test]
    fn merge_overrides_single_field() {
        let mut table = PlanTable::default();
        let mut overrides = BTreeMap::new();
        overrides.insert(
            PlanTag::Ultra,
            PlanOverride {
                credit_ceiling: Some(60_000),
                fallback_recovery_rate: None,
            },
        );
        table.merge(overrides);
        assert_eq!(table.ceiling_for(&PlanTag::Ultra), 60_000);
        assert_eq!(table.fallback_rate_for(&PlanTag::Ultra), Some(1_250));
        assert_eq!(table.ceiling_for(&PlanTag::Pro), 8_000);
    }

    #[test]
    fn table_parses_from_toml_keys() {
        let toml = r#"
[PRO]
credit_ceiling = 1000
fallback_recovery_rate = 10

[custom]
credit_ceiling = 42
fallback_recovery_rate = 1
"#;
        let table: PlanTable = toml::from_str(toml).unwrap();
        assert_eq!(table.ceiling_for(&PlanTag::Pro), 1000);
        assert_eq!(table.ceiling_for(&PlanTag::from("CUSTOM")), 42);
        assert_eq!(table.ceiling_for(&PlanTag::Max), 0);
    }
}

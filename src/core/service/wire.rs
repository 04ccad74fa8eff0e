use serde::{Deserialize, Deserializer};

use crate::core::models::plan::PlanTag;

/// The service is loose about numeric types: counts arrive as integers,
/// floats, or numeric strings depending on the endpoint.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(i64),
    Float(f64),
    Text(String),
}

fn finite_int<E: serde::de::Error>(f: f64) -> Result<i64, E> {
    if !f.is_finite() {
        return Err(E::custom(format!("not a finite number: {}", f)));
    }
    Ok(f.trunc() as i64)
}

fn loose_int<'de, D: Deserializer<'de>>(de: D) -> Result<i64, D::Error> {
    match Loose::deserialize(de)? {
        Loose::Int(n) => Ok(n),
        Loose::Float(f) => finite_int(f),
        Loose::Text(s) => {
            let f = s
                .trim()
                .parse::<f64>()
                .map_err(|_| serde::de::Error::custom(format!("not a number: {:?}", s)))?;
            finite_int(f)
        }
    }
}

fn loose_opt_int<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i64>, D::Error> {
    #[derive(Deserialize)]
    struct Wrap(#[serde(deserialize_with = "loose_int")] i64);

    Ok(Option::<Wrap>::deserialize(de)?.map(|Wrap(n)| n))
}

fn loose_string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(match Loose::deserialize(de)? {
        Loose::Int(n) => n.to_string(),
        Loose::Float(f) => f.to_string(),
        Loose::Text(s) => s,
    })
}

/// `GET /api/user/credits`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditInfo {
    #[serde(deserialize_with = "loose_string")]
    pub user_id: String,
    pub plan: PlanTag,
    #[serde(deserialize_with = "loose_int")]
    pub credits: i64,
}

/// `GET /api/user/credit-recovery`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryInfo {
    #[serde(default, deserialize_with = "loose_opt_int")]
    pub recovery_rate: Option<i64>,
}

/// `GET /api/user/credit-reset`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetInfo {
    #[serde(deserialize_with = "loose_int")]
    pub remaining_resets: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_credit_info() {
        let json = r#"{
            "userId": "abc123",
            "plan": "PRO",
            "credits": 4321,
            "email": "ignored@example.com"
        }"#;
        let info: CreditInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.user_id, "abc123");
        assert_eq!(info.plan, PlanTag::Pro);
        assert_eq!(info.credits, 4321);
    }

    #[test]
    fn deserialize_credit_info_numeric_user_and_unknown_plan() {
        let json = r#"{ "userId": 42, "plan": "starter", "credits": 10.9 }"#;
        let info: CreditInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.user_id, "42");
        assert_eq!(info.plan, PlanTag::Unknown("STARTER".to_string()));
        assert_eq!(info.credits, 10);
    }

    #[test]
    fn deserialize_recovery_rate_as_string() {
        let info: RecoveryInfo = serde_json::from_str(r#"{ "recoveryRate": "500" }"#).unwrap();
        assert_eq!(info.recovery_rate, Some(500));
    }

    #[test]
    fn deserialize_recovery_rate_missing_or_null() {
        let info: RecoveryInfo = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(info.recovery_rate, None);
        let info: RecoveryInfo = serde_json::from_str(r#"{ "recoveryRate": null }"#).unwrap();
        assert_eq!(info.recovery_rate, None);
    }

    #[test]
    fn deserialize_recovery_rate_rejects_garbage() {
        assert!(serde_json::from_str::<RecoveryInfo>(r#"{ "recoveryRate": "fast" }"#).is_err());
    }

    #[test]
    fn deserialize_rejects_non_finite_strings() {
        for raw in ["NaN", "inf", "-infinity"] {
            let json = format!(r#"{{ "userId": "u", "plan": "PRO", "credits": "{}" }}"#, raw);
            assert!(serde_json::from_str::<CreditInfo>(&json).is_err(), "{} accepted", raw);
        }
        let json = r#"{ "remainingResets": "NaN" }"#;
        assert!(serde_json::from_str::<ResetInfo>(json).is_err());
    }

    #[test]
    fn deserialize_reset_info() {
        let info: ResetInfo =
            serde_json::from_str(r#"{ "remainingResets": 2, "maxResets": 3 }"#).unwrap();
        assert_eq!(info.remaining_resets, 2);
    }

    #[test]
    fn deserialize_reset_info_requires_count() {
        assert!(serde_json::from_str::<ResetInfo>(r#"{}"#).is_err());
    }
}

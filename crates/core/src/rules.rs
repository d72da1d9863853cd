//! Fidelity rule configuration.
//!
//! Rules arrive as loosely-typed records (the shape staff tooling and
//! the `fidelity_rules` table produce, where every discriminator field
//! is optional) and are compiled into a closed [`RuleTrigger`] sum type
//! before the engine matches against them. A record that fails to
//! compile is a configuration error: the engine skips it and keeps
//! evaluating the remaining rules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validity window applied when a record does not specify one.
pub const DEFAULT_VALIDITY_DAYS: u32 = 30;

/// Trigger strategy discriminator, as stored in configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    /// Cumulative lifetime spend crosses a money threshold.
    /// `VALUE_ACCUMULATION` is a legacy spelling of the same strategy.
    #[serde(alias = "VALUE_ACCUMULATION")]
    ComboValue,
    /// Points balance crosses a threshold; converts into a credit.
    PointsConversion,
    /// Count of services in one category crosses a quantity threshold.
    QuantityAccumulation,
    /// Count of one exact service crosses a quantity threshold.
    ServiceSpecific,
}

/// What a fired rule grants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardKind {
    FreeService,
    DiscountPercent,
    DiscountFixed,
    Credit,
}

/// Raw rule row. Field meanings depend on `rule_type`:
/// `threshold_value` is cents for value rules and points for
/// `PointsConversion`; `reward_value` is cents for `Credit` and
/// `DiscountFixed`, and a percentage for `DiscountPercent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub threshold_value: Option<u64>,
    #[serde(default)]
    pub threshold_quantity: Option<u64>,
    pub reward_type: RewardKind,
    #[serde(default)]
    pub reward_value: Option<u64>,
    #[serde(default)]
    pub reward_service_name: Option<String>,
    #[serde(default)]
    pub validity_days: Option<u32>,
    pub is_active: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule {0}: missing threshold_value")]
    MissingThresholdValue(String),

    #[error("rule {0}: threshold must be greater than zero")]
    ZeroThreshold(String),

    #[error("rule {0}: missing threshold_quantity")]
    MissingThresholdQuantity(String),

    #[error("rule {0}: missing reward_value")]
    MissingRewardValue(String),

    #[error("rule {0}: missing category_id")]
    MissingCategory(String),

    #[error("rule {0}: needs service_id or service_name")]
    MissingServiceTarget(String),

    #[error("rule {0}: validity_days must be at least 1")]
    InvalidValidity(String),
}

/// Compiled trigger condition. One variant per matching strategy, so an
/// unhandled strategy is a compile-time error in the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTrigger {
    ComboValue {
        threshold_cents: u64,
    },
    PointsConversion {
        threshold_points: u64,
        credit_cents: u64,
    },
    QuantityAccumulation {
        category_id: String,
        threshold_quantity: u64,
    },
    ServiceSpecific {
        service_id: Option<String>,
        service_name: Option<String>,
        threshold_quantity: u64,
    },
}

/// Reward half of a compiled rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardTemplate {
    pub kind: RewardKind,
    pub value: Option<u64>,
    pub service_name: Option<String>,
}

/// A validated fidelity rule ready for evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FidelityRule {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub trigger: RuleTrigger,
    pub reward: RewardTemplate,
    pub validity_days: u32,
    pub is_active: bool,
}

impl RuleRecord {
    /// Compile into a [`FidelityRule`], enforcing the fields each
    /// trigger strategy requires.
    pub fn compile(&self, default_validity_days: u32) -> Result<FidelityRule, RuleError> {
        let validity_days = self.validity_days.unwrap_or(default_validity_days);
        if validity_days == 0 {
            return Err(RuleError::InvalidValidity(self.id.clone()));
        }

        let threshold_value = || {
            match self.threshold_value {
                Some(0) => Err(RuleError::ZeroThreshold(self.id.clone())),
                Some(v) => Ok(v),
                None => Err(RuleError::MissingThresholdValue(self.id.clone())),
            }
        };
        let threshold_quantity = || {
            match self.threshold_quantity {
                Some(0) => Err(RuleError::ZeroThreshold(self.id.clone())),
                Some(q) => Ok(q),
                None => Err(RuleError::MissingThresholdQuantity(self.id.clone())),
            }
        };

        let trigger = match self.rule_type {
            RuleType::ComboValue => RuleTrigger::ComboValue {
                threshold_cents: threshold_value()?,
            },
            RuleType::PointsConversion => RuleTrigger::PointsConversion {
                threshold_points: threshold_value()?,
                credit_cents: self
                    .reward_value
                    .ok_or_else(|| RuleError::MissingRewardValue(self.id.clone()))?,
            },
            RuleType::QuantityAccumulation => RuleTrigger::QuantityAccumulation {
                category_id: self
                    .category_id
                    .clone()
                    .ok_or_else(|| RuleError::MissingCategory(self.id.clone()))?,
                threshold_quantity: threshold_quantity()?,
            },
            RuleType::ServiceSpecific => {
                if self.service_id.is_none() && self.service_name.is_none() {
                    return Err(RuleError::MissingServiceTarget(self.id.clone()));
                }
                RuleTrigger::ServiceSpecific {
                    service_id: self.service_id.clone(),
                    service_name: self.service_name.clone(),
                    threshold_quantity: threshold_quantity()?,
                }
            }
        };

        Ok(FidelityRule {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            trigger,
            reward: RewardTemplate {
                kind: self.reward_type,
                value: self.reward_value,
                service_name: self.reward_service_name.clone(),
            },
            validity_days,
            is_active: self.is_active,
        })
    }
}

impl TryFrom<&RuleRecord> for FidelityRule {
    type Error = RuleError;

    fn try_from(record: &RuleRecord) -> Result<Self, Self::Error> {
        record.compile(DEFAULT_VALIDITY_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_record() -> RuleRecord {
        RuleRecord {
            id: "rule-1".to_string(),
            name: "Combo Ouro".to_string(),
            description: None,
            rule_type: RuleType::ComboValue,
            category_id: None,
            service_id: None,
            service_name: None,
            threshold_value: Some(100_000),
            threshold_quantity: None,
            reward_type: RewardKind::DiscountPercent,
            reward_value: Some(20),
            reward_service_name: None,
            validity_days: Some(60),
            is_active: true,
        }
    }

    #[test]
    fn test_compile_combo_value() {
        let rule = FidelityRule::try_from(&base_record()).unwrap();
        assert_eq!(
            rule.trigger,
            RuleTrigger::ComboValue {
                threshold_cents: 100_000
            }
        );
        assert_eq!(rule.validity_days, 60);
    }

    #[test]
    fn test_combo_value_requires_threshold() {
        let mut record = base_record();
        record.threshold_value = None;
        assert_eq!(
            FidelityRule::try_from(&record),
            Err(RuleError::MissingThresholdValue("rule-1".to_string()))
        );
    }

    #[test]
    fn test_points_conversion_requires_reward_value() {
        let mut record = base_record();
        record.rule_type = RuleType::PointsConversion;
        record.reward_type = RewardKind::Credit;
        record.reward_value = None;
        assert_eq!(
            FidelityRule::try_from(&record),
            Err(RuleError::MissingRewardValue("rule-1".to_string()))
        );
    }

    #[test]
    fn test_quantity_requires_category() {
        let mut record = base_record();
        record.rule_type = RuleType::QuantityAccumulation;
        record.threshold_quantity = Some(10);
        assert_eq!(
            FidelityRule::try_from(&record),
            Err(RuleError::MissingCategory("rule-1".to_string()))
        );
    }

    #[test]
    fn test_service_specific_accepts_name_only() {
        let mut record = base_record();
        record.rule_type = RuleType::ServiceSpecific;
        record.threshold_quantity = Some(5);
        record.service_name = Some("Limpeza de Pele".to_string());
        let rule = FidelityRule::try_from(&record).unwrap();
        assert!(matches!(
            rule.trigger,
            RuleTrigger::ServiceSpecific {
                service_id: None,
                ..
            }
        ));
    }

    #[test]
    fn test_default_validity_applied() {
        let mut record = base_record();
        record.validity_days = None;
        let rule = FidelityRule::try_from(&record).unwrap();
        assert_eq!(rule.validity_days, DEFAULT_VALIDITY_DAYS);
    }

    #[test]
    fn test_value_accumulation_alias_deserializes() {
        let json = r#"{
            "id": "rule-9",
            "name": "Acúmulo",
            "type": "VALUE_ACCUMULATION",
            "threshold_value": 50000,
            "reward_type": "CREDIT",
            "reward_value": 2500,
            "is_active": true
        }"#;
        let record: RuleRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.rule_type, RuleType::ComboValue);
    }
}

use glob::Pattern;
use serde::Serialize;
use serde_json::Value;

use crate::config::{ConflictPolicy, PolicyConfig};
use crate::error::MergeError;
use crate::normalize::value_len;

/// Outcome of a single collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    KeepExisting,
    TakeIncoming,
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeepExisting => write!(f, "keep_existing"),
            Self::TakeIncoming => write!(f, "take_incoming"),
        }
    }
}

/// Decides which value survives when two sources disagree on one key.
///
/// Ties always keep the existing value.
#[derive(Debug, Clone)]
pub struct ConflictResolver {
    policy: ConflictPolicy,
    rules: Vec<Pattern>,
}

impl ConflictResolver {
    pub fn new(policy: ConflictPolicy, rules: &[String]) -> Result<Self, MergeError> {
        Ok(Self {
            policy,
            rules: compile_rules(rules)?,
        })
    }

    pub fn from_config(config: &PolicyConfig) -> Result<Self, MergeError> {
        Self::new(config.strategy, &config.rules)
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Priority score of a source: the first matching rule at index `i`
    /// scores `rules.len() - i`; no match scores 0.
    pub fn priority(&self, source: &str) -> usize {
        self.rules
            .iter()
            .position(|p| p.matches(source))
            .map_or(0, |i| self.rules.len() - i)
    }

    pub fn resolve(
        &self,
        existing: &Value,
        incoming: &Value,
        existing_source: &str,
        incoming_source: &str,
    ) -> Resolution {
        let take = match self.policy {
            ConflictPolicy::FirstWins => false,
            ConflictPolicy::LastWins => true,
            ConflictPolicy::LongestWins => value_len(incoming) > value_len(existing),
            ConflictPolicy::PriorityRanked => {
                self.priority(incoming_source) > self.priority(existing_source)
            }
        };

        if take {
            Resolution::TakeIncoming
        } else {
            Resolution::KeepExisting
        }
    }
}

pub(crate) fn compile_rules(rules: &[String]) -> Result<Vec<Pattern>, MergeError> {
    rules
        .iter()
        .enumerate()
        .map(|(index, rule)| {
            Pattern::new(rule).map_err(|e| MergeError::InvalidPattern {
                index,
                pattern: rule.clone(),
                message: e.to_string(),
            })
        })
        .collect()
}

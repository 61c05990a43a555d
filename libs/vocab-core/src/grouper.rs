//! Skill assignment for dataset rows.
//!
//! A skill's ordinal is taken from the first row of that skill that carries a
//! parseable ordinal and reused for every later row with the same skill name,
//! whatever their own ordinal column says.

use crate::error::DataQualityError;
use crate::source::SourceRow;
use crate::types::{SkillGroup, VocabularyRecord};
use std::collections::HashMap;

/// How to treat a malformed ordinal on a skill that has none yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrdinalPolicy {
    /// Reject the row.
    #[default]
    Strict,
    /// Borrow the most recently parsed ordinal, whichever skill it came from.
    CarryForward,
}

/// A record together with how its ordinal was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assigned {
    pub record: VocabularyRecord,
    /// Set when the ordinal was borrowed under [`OrdinalPolicy::CarryForward`].
    pub carried_forward: bool,
}

/// Stateful grouper; feed rows in source order.
#[derive(Debug, Default)]
pub struct SkillGrouper {
    policy: OrdinalPolicy,
    established: HashMap<String, i64>,
    last_parsed: Option<i64>,
}

impl SkillGrouper {
    pub fn new(policy: OrdinalPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    #[cfg(test)]
    fn ordinal_of(&self, skill: &str) -> Option<i64> {
        self.established.get(skill).copied()
    }

    /// Assign a row to its skill group.
    ///
    /// Rows with a blank skill or one named like the notes deck are rejected:
    /// their decks could never be recognized again on a later run.
    pub fn assign(&mut self, row: SourceRow) -> Result<Assigned, DataQualityError> {
        if !SkillGroup::is_valid_name(&row.skill) {
            return Err(DataQualityError::InvalidSkill {
                line: row.line,
                skill: row.skill,
            });
        }

        let (ordinal, carried_forward) = match self.established.get(&row.skill).copied() {
            Some(ordinal) => (ordinal, false),
            None => {
                let resolved = self.resolve_new(&row)?;
                self.established.insert(row.skill.clone(), resolved.0);
                resolved
            }
        };

        Ok(Assigned {
            record: VocabularyRecord {
                skill: SkillGroup::new(ordinal, row.skill),
                hebrew: row.hebrew,
                niqqud: row.niqqud,
                transliteration: row.transliteration,
                translation: row.translation,
                gender: row.gender,
                number: row.number,
                form: row.form,
                word_type: row.word_type,
            },
            carried_forward,
        })
    }

    fn resolve_new(&mut self, row: &SourceRow) -> Result<(i64, bool), DataQualityError> {
        if let Ok(ordinal) = row.ordinal.trim().parse::<i64>() {
            self.last_parsed = Some(ordinal);
            return Ok((ordinal, false));
        }

        match (self.policy, self.last_parsed) {
            (OrdinalPolicy::CarryForward, Some(previous)) => Ok((previous, true)),
            _ => Err(DataQualityError::InvalidOrdinal {
                line: row.line,
                skill: row.skill.clone(),
                value: row.ordinal.clone(),
            }),
        }
    }
}

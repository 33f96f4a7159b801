//! Flat arithmetic operations over mixed numbers
//!
//! An operation is an ordered list of operands with one operator between
//! each pair. Evaluation always runs left to right with no precedence:
//! `((op0 OP op1) OP op2) ...`.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use crate::core::mixed_number::MixedNumber;
use crate::core::notation;
use crate::{CombatError, Result};

/// Operator between two operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Subtract,
}

impl Operator {
    pub fn apply(self, lhs: MixedNumber, rhs: MixedNumber) -> MixedNumber {
        match self {
            Operator::Add => lhs + rhs,
            Operator::Subtract => lhs - rhs,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
        }
    }
}

/// One term of an operation
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Authored value, drawn once per instance from the candidate set
    Fixed {
        candidates: SmallVec<[MixedNumber; 4]>,
        pick: Option<usize>,
    },
    /// Player-fillable slot
    Slot(Option<MixedNumber>),
}

impl Operand {
    /// An unfilled slot
    pub fn empty() -> Self {
        Operand::Slot(None)
    }

    /// Fixed operand with a single value
    pub fn number(number: MixedNumber) -> Self {
        Operand::fixed(vec![number])
    }

    /// Fixed operand drawn from `candidates`; no candidates means an empty slot
    pub fn fixed(candidates: impl IntoIterator<Item = MixedNumber>) -> Self {
        let candidates: SmallVec<[MixedNumber; 4]> = candidates.into_iter().collect();
        match candidates.len() {
            0 => Operand::Slot(None),
            1 => Operand::Fixed {
                candidates,
                pick: Some(0),
            },
            _ => Operand::Fixed {
                candidates,
                pick: None,
            },
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, Operand::Fixed { .. })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Operand::Slot(None))
    }

    /// Candidate set of a fixed operand (empty for slots)
    pub fn candidates(&self) -> &[MixedNumber] {
        match self {
            Operand::Fixed { candidates, .. } => candidates,
            Operand::Slot(_) => &[],
        }
    }

    /// Current value; an undrawn candidate set reports its first candidate
    pub fn value(&self) -> Option<MixedNumber> {
        match self {
            Operand::Fixed { candidates, pick } => candidates.get(pick.unwrap_or(0)).copied(),
            Operand::Slot(number) => *number,
        }
    }

    /// Draw the pick of a candidate set if not drawn yet
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if let Operand::Fixed { candidates, pick } = self {
            if pick.is_none() {
                *pick = Some(rng.gen_range(0..candidates.len()));
            }
        }
    }

    /// Fill with a number; the operand becomes a player slot
    pub fn apply_number(&mut self, number: MixedNumber) {
        *self = Operand::Slot(Some(number));
    }

    /// Empty the operand; the operand becomes a player slot
    pub fn remove_number(&mut self) {
        *self = Operand::Slot(None);
    }
}

/// Ordered operands and operators
#[derive(Debug, Clone, PartialEq)]
pub struct MixedNumberOps {
    operands: SmallVec<[Operand; 4]>,
    operators: SmallVec<[Operator; 4]>,
}

impl MixedNumberOps {
    /// Build an operation; there must be exactly one operator fewer than operands
    pub fn new(operands: Vec<Operand>, operators: Vec<Operator>) -> Result<Self> {
        if operands.is_empty() {
            return Err(CombatError::InvalidOperation(
                "operation needs at least one operand".to_string(),
            ));
        }
        if operators.len() + 1 != operands.len() {
            return Err(CombatError::InvalidOperation(format!(
                "{} operands need {} operators, got {}",
                operands.len(),
                operands.len() - 1,
                operators.len()
            )));
        }
        Ok(MixedNumberOps {
            operands: operands.into_iter().collect(),
            operators: operators.into_iter().collect(),
        })
    }

    /// `count` empty slots joined by the same operator
    pub fn uniform(count: usize, operator: Operator) -> Self {
        MixedNumberOps {
            operands: (0..count).map(|_| Operand::empty()).collect(),
            operators: (0..count.saturating_sub(1)).map(|_| operator).collect(),
        }
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn operand(&self, index: usize) -> Option<&Operand> {
        self.operands.get(index)
    }

    pub fn len(&self) -> usize {
        self.operands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }

    /// Fill operand `index`; returns false when the index is out of range
    pub fn apply_number(&mut self, index: usize, number: MixedNumber) -> bool {
        match self.operands.get_mut(index) {
            Some(operand) => {
                operand.apply_number(number);
                true
            }
            None => false,
        }
    }

    /// Empty operand `index`; returns false when the index is out of range
    pub fn remove_number(&mut self, index: usize) -> bool {
        match self.operands.get_mut(index) {
            Some(operand) => {
                operand.remove_number();
                true
            }
            None => false,
        }
    }

    /// Empty every player slot, leaving fixed operands in place
    pub fn clear_slots(&mut self) {
        for operand in self.operands.iter_mut().filter(|o| !o.is_fixed()) {
            operand.remove_number();
        }
    }

    /// True if any operand has no value; gates answer submission
    pub fn is_any_operand_empty(&self) -> bool {
        self.operands.iter().any(Operand::is_empty)
    }

    /// True if any operand is authored rather than player-filled
    pub fn has_fixed_operands(&self) -> bool {
        self.operands.iter().any(Operand::is_fixed)
    }

    /// Left-to-right evaluation that skips empty operands
    ///
    /// An empty first operand counts as zero and an empty later operand is
    /// skipped, so a partially filled operation still yields a preview.
    pub fn evaluate(&self) -> MixedNumber {
        match self.operands.len() {
            0 => return MixedNumber::ZERO,
            1 => return self.operands[0].value().unwrap_or_default(),
            _ => {}
        }

        let mut result = self.operands[0].value().unwrap_or_default();
        for (operator, operand) in self.operators.iter().zip(self.operands.iter().skip(1)) {
            if let Some(number) = operand.value() {
                result = operator.apply(result, number);
            }
        }
        result
    }

    /// Evaluation that refuses partially filled operations
    pub fn evaluate_strict(&self) -> Option<MixedNumber> {
        if self.is_empty() || self.is_any_operand_empty() {
            None
        } else {
            Some(self.evaluate())
        }
    }

    /// Check a submitted answer against the evaluated operation
    pub fn is_answer_correct(&self, answer: MixedNumber) -> bool {
        match self.evaluate_strict() {
            Some(expected) => answer.is_valid() && answer == expected,
            None => false,
        }
    }

    /// Deep copy keeping at most `count` operands (and the operators between them)
    pub fn truncated(&self, count: usize) -> Self {
        let operand_count = count.min(self.operands.len());
        let operator_count = operand_count
            .saturating_sub(1)
            .min(self.operators.len());
        MixedNumberOps {
            operands: self.operands[..operand_count].iter().cloned().collect(),
            operators: self.operators[..operator_count].iter().copied().collect(),
        }
    }

    /// Deep copy with every candidate set drawn
    pub fn instantiate<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut instance = self.clone();
        for operand in instance.operands.iter_mut() {
            operand.draw(rng);
        }
        instance
    }
}

impl fmt::Display for MixedNumberOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, operand) in self.operands.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", self.operators[i - 1].symbol())?;
            }
            match operand {
                Operand::Slot(None) => write!(f, "_")?,
                Operand::Fixed {
                    candidates,
                    pick: None,
                } => {
                    write!(f, "{{")?;
                    for (j, candidate) in candidates.iter().enumerate() {
                        if j > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", candidate)?;
                    }
                    write!(f, "}}")?;
                }
                other => {
                    if let Some(number) = other.value() {
                        write!(f, "{}", number)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl FromStr for MixedNumberOps {
    type Err = CombatError;

    fn from_str(s: &str) -> Result<Self> {
        notation::parse_operation(s)
    }
}

impl Serialize for MixedNumberOps {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MixedNumberOps {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Authored pool of candidate numbers for one deck fill or operand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberGroup {
    #[serde(default)]
    pub name: String,
    pub numbers: Vec<MixedNumber>,
}

impl NumberGroup {
    pub fn new(name: impl Into<String>, numbers: Vec<MixedNumber>) -> Self {
        NumberGroup {
            name: name.into(),
            numbers,
        }
    }

    /// Random member of the group, or zero for an empty group
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> MixedNumber {
        self.numbers.choose(rng).copied().unwrap_or_default()
    }
}

/// Round-robin cursor over a list of number groups
#[derive(Debug, Clone, Default)]
pub struct GroupRotation {
    index: usize,
}

impl GroupRotation {
    pub fn new() -> Self {
        GroupRotation { index: 0 }
    }

    /// Next group in turn, wrapping around; `None` when there are no groups
    pub fn next<'a>(&mut self, groups: &'a [NumberGroup]) -> Option<&'a NumberGroup> {
        if groups.is_empty() {
            return None;
        }
        let group = &groups[self.index % groups.len()];
        self.index = (self.index + 1) % groups.len();
        Some(group)
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

/// Constraints on the numbers offered in a deck fill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateFilter {
    /// Largest magnitude allowed
    #[serde(default)]
    pub max_value: Option<f64>,
    /// Allowed denominators (whole numbers always pass); empty allows all
    #[serde(default)]
    pub denominators: Vec<u32>,
}

impl CandidateFilter {
    pub fn accepts(&self, number: &MixedNumber) -> bool {
        if !number.is_valid() {
            return false;
        }
        if let Some(max) = self.max_value {
            if number.value().abs() > max {
                return false;
            }
        }
        if self.denominators.is_empty() || number.numerator() == 0 {
            return true;
        }
        self.denominators.contains(&number.denominator())
    }

    /// Filter and optionally shuffle a group's numbers for a deck fill
    ///
    /// If the filter rejects every number the group is used unfiltered.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        group: &NumberGroup,
        shuffle: bool,
        rng: &mut R,
    ) -> Vec<MixedNumber> {
        let mut numbers: Vec<MixedNumber> =
            group.numbers.iter().copied().filter(|n| self.accepts(n)).collect();
        if numbers.is_empty() {
            numbers = group.numbers.clone();
        }
        if shuffle {
            numbers.shuffle(rng);
        }
        numbers
    }
}

//! Text notation for mixed numbers and flat operations
//!
//! Numbers: `2`, `3/4`, `1 1/2`, `-1 3/4`.
//! Operations: operands joined by `+` or `-`, where an operand is a number,
//! `_` for an empty slot, or `{a, b, ...}` for a fixed operand drawn from a
//! candidate set. E.g. `{1/2, 3/4} + _ - 1/4`.

use nom::{
    branch::alt,
    character::complete::{char, digit1, multispace0, multispace1},
    combinator::{all_consuming, map, map_res, opt, value},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    IResult,
};

use crate::core::mixed_number::MixedNumber;
use crate::core::ops::{MixedNumberOps, Operand, Operator};
use crate::{CombatError, Result};

fn unsigned(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse::<u32>)(input)
}

fn fraction(input: &str) -> IResult<&str, (u32, u32)> {
    separated_pair(unsigned, char('/'), unsigned)(input)
}

fn magnitude(input: &str) -> IResult<&str, MixedNumber> {
    alt((
        map(
            tuple((unsigned, multispace1, fraction)),
            |(whole, _, (numerator, denominator))| {
                MixedNumber::new(false, whole, numerator, denominator)
            },
        ),
        map(fraction, |(numerator, denominator)| {
            MixedNumber::from_fraction(numerator, denominator)
        }),
        map(unsigned, MixedNumber::from_whole),
    ))(input)
}

fn signed_number(input: &str) -> IResult<&str, MixedNumber> {
    map(
        pair(opt(terminated(char('-'), multispace0)), magnitude),
        |(minus, number)| number.with_negative(minus.is_some()),
    )(input)
}

fn candidate_set(input: &str) -> IResult<&str, Vec<MixedNumber>> {
    delimited(
        terminated(char('{'), multispace0),
        separated_list1(delimited(multispace0, char(','), multispace0), signed_number),
        preceded(multispace0, char('}')),
    )(input)
}

fn operand(input: &str) -> IResult<&str, Operand> {
    alt((
        value(Operand::empty(), char('_')),
        map(candidate_set, Operand::fixed),
        map(signed_number, Operand::number),
    ))(input)
}

fn operator(input: &str) -> IResult<&str, Operator> {
    alt((
        value(Operator::Add, char('+')),
        value(Operator::Subtract, char('-')),
    ))(input)
}

fn operation(input: &str) -> IResult<&str, (Operand, Vec<(Operator, Operand)>)> {
    pair(
        operand,
        many0(pair(
            delimited(multispace0, operator, multispace0),
            operand,
        )),
    )(input)
}

/// Parse a single mixed number such as `-1 3/4`
pub fn parse_mixed_number(input: &str) -> Result<MixedNumber> {
    all_consuming(signed_number)(input.trim())
        .map(|(_, number)| number)
        .map_err(|e| CombatError::InvalidNotation(format!("'{}': {}", input, e)))
}

/// Parse a flat operation such as `3/4 + _`
pub fn parse_operation(input: &str) -> Result<MixedNumberOps> {
    let (_, (first, rest)) = all_consuming(operation)(input.trim())
        .map_err(|e| CombatError::InvalidNotation(format!("'{}': {}", input, e)))?;

    let mut operands = Vec::with_capacity(rest.len() + 1);
    let mut operators = Vec::with_capacity(rest.len());
    operands.push(first);
    for (op, operand) in rest {
        operators.push(op);
        operands.push(operand);
    }

    MixedNumberOps::new(operands, operators)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers() {
        let n = parse_mixed_number("1 1/2").unwrap();
        assert_eq!((n.whole(), n.numerator(), n.denominator()), (1, 1, 2));

        let n = parse_mixed_number("-3/4").unwrap();
        assert!(n.is_negative());
        assert_eq!(n.value(), -0.75);

        let n = parse_mixed_number("  7 ").unwrap();
        assert_eq!(n, MixedNumber::from_whole(7));

        let n = parse_mixed_number("- 2 1/3").unwrap();
        assert!(n.is_negative());
        assert_eq!(n.whole(), 2);
    }

    #[test]
    fn test_parse_invalid_numbers() {
        assert!(parse_mixed_number("").is_err());
        assert!(parse_mixed_number("1/").is_err());
        assert!(parse_mixed_number("a/b").is_err());
        assert!(parse_mixed_number("1 1/2 3").is_err());
    }

    #[test]
    fn test_zero_denominator_parses_as_invalid_value() {
        let n = parse_mixed_number("3/0").unwrap();
        assert!(!n.is_valid());
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["0", "5", "3/4", "-3/4", "2 1/3", "-1 5/8"] {
            let n = parse_mixed_number(text).unwrap();
            assert_eq!(n.to_string(), text);
        }
    }

    #[test]
    fn test_parse_operation() {
        let ops = parse_operation("3/4 + 1/4").unwrap();
        assert_eq!(ops.operands().len(), 2);
        assert_eq!(ops.operators(), &[Operator::Add]);
        assert_eq!(ops.evaluate().value(), 1.0);

        let ops = parse_operation("-1/2 - _ + 2").unwrap();
        assert_eq!(ops.operators(), &[Operator::Subtract, Operator::Add]);
        assert!(ops.is_any_operand_empty());
    }

    #[test]
    fn test_parse_candidate_sets() {
        let ops = parse_operation("{1/2, 3/4} + _").unwrap();
        let first = &ops.operands()[0];
        assert!(first.is_fixed());
        assert_eq!(first.candidates().len(), 2);
    }

    #[test]
    fn test_parse_operation_errors() {
        assert!(parse_operation("3/4 +").is_err());
        assert!(parse_operation("3/4 * 2").is_err());
        assert!(parse_operation("{}").is_err());
    }
}

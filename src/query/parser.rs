//! Filter expression parser
//!
//! Reads a flat, human-typed filter expression into an ordered condition
//! list, so the command line can feed the same model the form does.
//!
//! # Supported Syntax
//!
//! ```text
//! field op value [AND|OR field op value ...]
//! ```
//!
//! Operators: `= != <> > < >= <= LIKE IN NOT IN` (word operators are case
//! insensitive). A value runs until the next standalone `AND`/`OR` or the
//! end of input; wrap it in single or double quotes to keep a literal
//! `AND`/`OR` inside it. The quotes are stripped, the formatter adds its own.
//!
//! # Examples
//!
//! ```text
//! Name LIKE Acme
//! Industry IN Tech, Retail OR AnnualRevenue > 1000000
//! StageName = 'Closed Won' AND Amount >= $minAmount
//! ```
//!
//! Grouping is not written by the user: the expression is a flat list and
//! the grouper infers parentheses from AND/OR transitions.

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{map_res, peek, recognize},
    multi::many0,
    sequence::{delimited, pair, terminated, tuple},
    IResult,
};

use crate::query::ast::{Condition, Conjunction, Direction, Operator, OrderBy};
use crate::query::error::{QueryError, QueryResult};

/// Parse a filter expression into conditions
///
/// An empty (or all-whitespace) expression yields no conditions.
pub fn parse_filter(input: &str) -> QueryResult<Vec<Condition>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Vec::new());
    }

    match parse_filter_expr(input) {
        Ok((remaining, conditions)) => {
            if remaining.trim().is_empty() {
                Ok(conditions)
            } else {
                Err(QueryError::Parse(format!(
                    "Unexpected input after filter: '{}'",
                    remaining.trim()
                )))
            }
        }
        Err(e) => Err(QueryError::Parse(format!("Parse error: {:?}", e))),
    }
}

/// Parse `field [ASC|DESC]`
pub fn parse_order_by(input: &str) -> QueryResult<OrderBy> {
    let mut parts = input.split_whitespace();
    let field = parts
        .next()
        .ok_or_else(|| QueryError::InvalidOrderBy("missing field".to_string()))?;

    let direction = match parts.next().map(|d| d.to_ascii_uppercase()) {
        None => Direction::Asc,
        Some(d) if d == "ASC" => Direction::Asc,
        Some(d) if d == "DESC" => Direction::Desc,
        Some(d) => return Err(QueryError::InvalidOrderBy(format!("unknown direction {}", d))),
    };

    if let Some(extra) = parts.next() {
        return Err(QueryError::InvalidOrderBy(format!(
            "unexpected '{}' after direction",
            extra
        )));
    }

    Ok(OrderBy::new(field, direction))
}

/// Parse the whole expression
fn parse_filter_expr(input: &str) -> IResult<&str, Vec<Condition>> {
    let (input, first) = parse_condition(input)?;
    let (input, rest) = many0(pair(parse_conjunction, parse_condition))(input)?;

    let mut conditions = vec![first];
    for (conjunction, condition) in rest {
        if let Some(last) = conditions.last_mut() {
            last.conjunction = Some(conjunction);
        }
        conditions.push(condition);
    }

    Ok((input, conditions))
}

/// Parse a standalone AND/OR between two conditions
fn parse_conjunction(input: &str) -> IResult<&str, Conjunction> {
    delimited(
        multispace1,
        map_res(alt((tag_no_case("AND"), tag_no_case("OR"))), str::parse::<Conjunction>),
        multispace1,
    )(input)
}

/// Parse `field op value`
fn parse_condition(input: &str) -> IResult<&str, Condition> {
    let (input, field) = parse_field(input)?;
    let (input, _) = multispace0(input)?;
    let (input, operator) = parse_operator(input)?;
    let (input, _) = multispace0(input)?;
    let (input, raw_value) = alt((parse_quoted_value, parse_raw_value))(input)?;

    Ok((input, Condition::new(field, operator, raw_value)))
}

/// Parse a field name, allowing relationship paths like `Account.Name`
fn parse_field(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '.')(input)
}

/// Parse a comparison operator
fn parse_operator(input: &str) -> IResult<&str, Operator> {
    let word = |keyword: &'static str| terminated(tag_no_case(keyword), peek(multispace1));
    map_res(
        alt((
            recognize(terminated(
                tuple((tag_no_case("NOT"), multispace1, tag_no_case("IN"))),
                peek(multispace1),
            )),
            word("LIKE"),
            word("IN"),
            tag(">="),
            tag("<="),
            tag("!="),
            tag("<>"),
            tag("="),
            tag(">"),
            tag("<"),
        )),
        str::parse::<Operator>,
    )(input)
}

/// Parse a value wrapped in single or double quotes
fn parse_quoted_value(input: &str) -> IResult<&str, String> {
    let (input, text) = alt((
        delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
    ))(input)?;
    Ok((input, text.to_string()))
}

/// Parse an unquoted value up to the next conjunction or end of input
fn parse_raw_value(input: &str) -> IResult<&str, String> {
    if input.starts_with('\'') || input.starts_with('"') {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )));
    }

    let end = input
        .char_indices()
        .filter(|(_, c)| c.is_whitespace())
        .map(|(i, _)| i)
        .find(|&i| parse_conjunction(&input[i..]).is_ok())
        .unwrap_or(input.len());

    let text = input[..end].trim_end();
    if text.is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::TakeWhile1,
        )));
    }

    Ok((&input[end..], text.to_string()))
}

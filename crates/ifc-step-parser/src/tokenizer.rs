// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity content tokenizer using nom combinators
//!
//! Parses attribute lists such as `('guid',#2,(0.,1.),.T.,IFCLABEL('x'),$)`
//! into tokens, then converts them into owned [`Attribute`] values. Commas
//! inside quoted strings and nested lists are handled by the grammar itself.

use ifc_step_model::error::format_for_log;
use ifc_step_model::{
    Attribute, BigDecimal, Entity, EntityId, EnumValue, IfcError, Interner, Result, TypeName,
};
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, opt, recognize},
    multi::separated_list0,
    sequence::{delimited, pair},
    IResult, Parser,
};
use std::str::FromStr;

/// Raw token from entity content (before conversion to Attribute)
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'a> {
    /// Entity reference (#123), digits not yet validated
    EntityRef(&'a str),
    /// String value ('text'), escapes not yet decoded
    String(&'a str),
    /// Number literal
    Number(&'a str),
    /// Enumeration (.VALUE.)
    Enum(&'a str),
    /// List of tokens
    List(Vec<Token<'a>>),
    /// Typed value like IFCLABEL('text')
    TypedValue(&'a str, Vec<Token<'a>>),
    /// Unset value ($)
    Null,
    /// Derived value (*)
    Derived,
}

impl<'a> Token<'a> {
    /// Convert token to an owned Attribute, validating ids, names and enums
    pub fn to_attribute(&self, interner: &Interner) -> Result<Attribute> {
        Ok(match self {
            Token::EntityRef(digits) => Attribute::EntityRef(parse_entity_ref(digits)?),
            Token::String(s) => Attribute::String(s.replace("''", "'")),
            Token::Number(n) => Attribute::Number(parse_number(n)?),
            Token::Enum(s) => Attribute::Enum(EnumValue::intern(s, interner)?),
            Token::List(items) => Attribute::List(to_attributes(items, interner)?),
            Token::TypedValue(name, args) => Attribute::Entity(Entity::new(
                TypeName::intern(name, interner)?,
                to_attributes(args, interner)?,
            )),
            Token::Null => Attribute::Unset,
            Token::Derived => Attribute::Derived,
        })
    }
}

fn to_attributes(tokens: &[Token<'_>], interner: &Interner) -> Result<Vec<Attribute>> {
    tokens.iter().map(|t| t.to_attribute(interner)).collect()
}

fn parse_entity_ref(digits: &str) -> Result<EntityId> {
    let invalid = || IfcError::InvalidEntityId(format!("#{}", digits));
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    digits.parse::<u32>().map(EntityId).map_err(|_| invalid())
}

/// Parse a STEP number literal into an exact decimal
///
/// Accepts `1`, `-1.5`, `0.`, `1.5E-3`. Precision and exponent range are
/// unbounded, and the scale of the literal is kept.
pub fn parse_number(literal: &str) -> Result<BigDecimal> {
    let (mantissa, exponent) = match literal.find(['e', 'E']) {
        Some(pos) => (&literal[..pos], Some(&literal[pos + 1..])),
        None => (literal, None),
    };
    let mantissa = mantissa.strip_prefix('+').unwrap_or(mantissa);
    let mantissa = mantissa.strip_suffix('.').unwrap_or(mantissa);
    let value = match exponent {
        None => BigDecimal::from_str(mantissa),
        Some(exp) => BigDecimal::from_str(&format!("{}e{}", mantissa, exp)),
    };
    value.map_err(|_| IfcError::InvalidNumber(literal.to_string()))
}

// ============================================================================
// Parsing Primitives
// ============================================================================

fn ws(input: &str) -> IResult<&str, ()> {
    let (input, _) = multispace0(input)?;
    Ok((input, ()))
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Parse an entity reference (#123)
fn entity_ref(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('#')(input)?;
    // Take any identifier characters so that `#12a` reports an invalid id
    let (input, digits) = take_while1(is_name_char)(input)?;
    Ok((input, Token::EntityRef(digits)))
}

/// Parse a STEP string ('text' with '' for escaped quotes)
fn step_string(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('\'')(input)?;

    let mut end = 0;
    let bytes = input.as_bytes();
    while end < bytes.len() {
        if bytes[end] == b'\'' {
            if end + 1 < bytes.len() && bytes[end + 1] == b'\'' {
                end += 2;
                continue;
            }
            let content = &input[..end];
            let remaining = &input[end + 1..];
            return Ok((remaining, Token::String(content)));
        }
        end += 1;
    }

    // No closing quote
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

fn digits(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_digit())(input)
}

/// Parse a number (integer or real)
fn number(input: &str) -> IResult<&str, Token<'_>> {
    let (input, num_str) = recognize((
        opt(alt((char('-'), char('+')))),
        digits,
        opt(pair(char('.'), take_while(|c: char| c.is_ascii_digit()))),
        opt((
            alt((char('e'), char('E'))),
            opt(alt((char('+'), char('-')))),
            digits,
        )),
    ))
    .parse(input)?;
    Ok((input, Token::Number(num_str)))
}

/// Parse an enumeration (.VALUE.)
fn enumeration(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('.')(input)?;
    let (input, name) = take_while1(is_name_char)(input)?;
    let (input, _) = char('.')(input)?;
    Ok((input, Token::Enum(name)))
}

fn null_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('$')(input)?;
    Ok((input, Token::Null))
}

fn derived_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('*')(input)?;
    Ok((input, Token::Derived))
}

/// Parse a parenthesized, comma separated token list
fn token_list(input: &str) -> IResult<&str, Vec<Token<'_>>> {
    delimited(
        pair(char('('), ws),
        separated_list0((ws, char(','), ws), token),
        pair(ws, char(')')),
    )
    .parse(input)
}

fn list(input: &str) -> IResult<&str, Token<'_>> {
    let (input, items) = token_list(input)?;
    Ok((input, Token::List(items)))
}

/// Parse a typed value like IFCLABEL('text')
fn typed_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, type_name) = take_while1(is_name_char)(input)?;
    let (input, _) = ws(input)?;
    let (input, args) = token_list(input)?;
    Ok((input, Token::TypedValue(type_name, args)))
}

/// Parse any token
fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        entity_ref,
        step_string,
        null_value,
        derived_value,
        enumeration,
        number,
        list,
        typed_value,
    ))
    .parse(input)
}

fn syntax_error(content: &str, err: nom::Err<nom::error::Error<&str>>) -> IfcError {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => IfcError::attribute_syntax(format!(
            "unexpected input at '{}' in {}",
            format_for_log(e.input),
            format_for_log(content)
        )),
        nom::Err::Incomplete(_) => {
            IfcError::attribute_syntax(format!("incomplete input: {}", format_for_log(content)))
        }
    }
}

// ============================================================================
// Content Parsing
// ============================================================================

/// Parse a parenthesized attribute list: `('x',1.5,$)`
pub fn parse_attributes(content: &str, interner: &Interner) -> Result<Vec<Attribute>> {
    let (_, tokens) = all_consuming(delimited(ws, token_list, ws))
        .parse(content)
        .map_err(|e| syntax_error(content, e))?;
    to_attributes(&tokens, interner)
}

/// Parse entity content: a name followed by its attribute list, `BAR('x',1.5,$)`
pub fn parse_entity_content(content: &str, interner: &Interner) -> Result<Entity> {
    let (_, (name, tokens)) = all_consuming(delimited(
        ws,
        pair(take_while1(is_name_char), delimited(ws, token_list, ws)),
        ws,
    ))
    .parse(content)
    .map_err(|e| syntax_error(content, e))?;

    Ok(Entity::new(
        TypeName::intern(name, interner)?,
        to_attributes(&tokens, interner)?,
    ))
}

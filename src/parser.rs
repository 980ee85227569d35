//! This module provides the parser for rule table files, utilizing the `pest` crate.
//! It defines the grammar for `.tm` files and functions to parse the input into a
//! validated [`RuleTable`].

use crate::{rules::RuleTable, types::MachineError};
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::HashSet;

/// Derives a `PestParser` for the table grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct TableParser;

/// Parses the given input string into a `RuleTable`.
///
/// This is the main entry point for parsing table definitions. The input is
/// parsed with `TableParser`, the sections are collected, and the rows are handed
/// to [`RuleTable::from_rows`] for validation.
///
/// # Returns
///
/// * `Ok(RuleTable)` if the input is successfully parsed and validated.
/// * `Err(MachineError::ParseError)` if there are syntax errors or missing/duplicate sections.
/// * `Err(MachineError::MalformedTable)` if the rows do not form a valid table.
pub fn parse(input: &str) -> Result<RuleTable, MachineError> {
    let root = TableParser::parse(Rule::program, input.trim())
        .map_err(|e| MachineError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| MachineError::FileError("Empty parse tree".to_string()))?;

    parse_program(root)
}

/// Collects the top-level sections of a table from a `Pair<Rule::program>`.
fn parse_program(pair: Pair<Rule>) -> Result<RuleTable, MachineError> {
    let whole = pair.as_span();
    let mut name: Option<String> = None;
    let mut symbols: Option<usize> = None;
    let mut rows: Option<Vec<Vec<i64>>> = None;
    let mut seen = HashSet::new();

    for p in pair.into_inner() {
        let span = p.as_span();
        let rule = p.as_rule();

        check_unique_rule(rule, span, &mut seen)?;

        match rule {
            Rule::name => name = Some(parse_name(p)),
            Rule::symbols => symbols = Some(parse_symbols(p)?),
            Rule::rules => rows = Some(parse_rows(p)?),
            _ => {} // EOI
        }
    }

    let name = check_required_rule(name, "name", whole)?;
    let rows = check_required_rule(rows, "rules", whole)?;
    let symbols = symbols.unwrap_or_else(|| infer_symbols(&rows));

    RuleTable::from_rows(name, symbols, &rows)
}

fn parse_name(pair: Pair<Rule>) -> String {
    match pair.into_inner().next() {
        Some(p) if p.as_rule() == Rule::quoted => unquote(p.as_str()),
        Some(p) => p.as_str().trim().to_string(),
        None => String::new(),
    }
}

/// Strips the surrounding quotes of a `quoted` name and resolves its escapes.
fn unquote(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut name = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            name.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => name.push('\n'),
            Some('r') => name.push('\r'),
            Some('t') => name.push('\t'),
            Some(other) => name.push(other),
            None => {}
        }
    }

    name
}

fn parse_symbols(pair: Pair<Rule>) -> Result<usize, MachineError> {
    let span = pair.as_span();
    let value = pair
        .into_inner()
        .next()
        .map(|p| p.as_str())
        .unwrap_or_default();

    match value.parse::<usize>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(parse_error(
            &format!("Symbol count must be a positive integer, found {value}"),
            span,
        )),
    }
}

/// Parses every `[...]` row of the `rules:` section.
fn parse_rows(pair: Pair<Rule>) -> Result<Vec<Vec<i64>>, MachineError> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::row)
        .map(|row| {
            row.into_inner()
                .map(|integer| {
                    integer.as_str().parse::<i64>().map_err(|_| {
                        parse_error(
                            &format!("Integer out of range: {}", integer.as_str()),
                            integer.as_span(),
                        )
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}

/// Derives the alphabet size from the first row's arity (`1 + 3K`).
fn infer_symbols(rows: &[Vec<i64>]) -> usize {
    rows.first()
        .map(|row| row.len().saturating_sub(1) / 3)
        .unwrap_or(0)
}

/// Creates a `MachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> MachineError {
    MachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Checks if a given section has already been declared.
fn check_unique_rule(rule: Rule, span: Span, seen: &mut HashSet<Rule>) -> Result<(), MachineError> {
    if !matches!(rule, Rule::name | Rule::symbols | Rule::rules) {
        return Ok(());
    }

    if !seen.insert(rule) {
        return Err(parse_error(
            &format!("Duplicate \"{rule:?}:\" declaration"),
            span,
        ));
    }

    Ok(())
}

/// Checks if a required section is present.
fn check_required_rule<T>(value: Option<T>, name: &str, span: Span) -> Result<T, MachineError> {
    value.ok_or_else(|| parse_error(&format!("Missing '{name}' section"), span))
}

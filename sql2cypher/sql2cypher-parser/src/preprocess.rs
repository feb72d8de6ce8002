//! Token-level rewrites applied before handing the token stream to
//! `sqlparser`.
//!
//! A few constructs we support are either unknown to `sqlparser` or dropped
//! by it: `ON DUPLICATE KEY IGNORE`, `BETWEEN SYMMETRIC`, qualified column
//! names in an `INSERT` column list and mapping hints written as block
//! comments. They are removed (or read) here and reported next to the
//! remaining tokens.

use std::collections::HashMap;

use itertools::Itertools;
use sqlparser::ast::Ident;
use sqlparser::dialect::Dialect as SqlDialect;
use sqlparser::tokenizer::{Location, Token, TokenWithSpan, Tokenizer, Whitespace};

use crate::ast::TableAnnotation;
use crate::error::{Error, Reason, Result};

#[derive(Debug, Default)]
pub(crate) struct Preprocessed {
    pub tokens: Vec<TokenWithSpan>,
    /// Annotations keyed by the table name or alias they follow.
    pub annotations: HashMap<String, TableAnnotation>,
    /// Start of every `BETWEEN` keyword and whether it was `SYMMETRIC`.
    pub betweens: Vec<((u64, u64), bool)>,
    pub duplicate_key_ignore: bool,
    /// Qualifiers stripped from an `INSERT` column list, by column position.
    pub insert_column_qualifiers: Vec<Option<Ident>>,
}

pub(crate) fn position(location: Location) -> (u64, u64) {
    (location.line, location.column)
}

fn parse_error(sql: &str, message: impl ToString) -> Error {
    Error::new(Reason::Parse {
        sql: sql.to_string(),
        message: message.to_string(),
    })
}

fn tokenize(dialect: &dyn SqlDialect, sql: &str) -> Result<Vec<TokenWithSpan>> {
    Tokenizer::new(dialect, sql)
        .tokenize_with_location()
        .map_err(|e| parse_error(sql, e))
}

fn is_significant(token: &Token) -> bool {
    !matches!(token, Token::Whitespace(_) | Token::EOF)
}

fn is_keyword(token: &Token, keyword: &str) -> bool {
    matches!(token, Token::Word(w) if w.quote_style.is_none() && w.value.eq_ignore_ascii_case(keyword))
}

/// True when `sql` holds nothing but whitespace, semicolons and comments.
/// `//` line comments are accepted here even though no dialect tokenizes them.
pub(crate) fn is_blank(dialect: &dyn SqlDialect, sql: &str) -> bool {
    let without_slash_comments = sql
        .lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .join("\n");

    match tokenize(dialect, &without_slash_comments) {
        Ok(tokens) => tokens
            .iter()
            .all(|t| !is_significant(&t.token) || t.token == Token::SemiColon),
        Err(_) => false,
    }
}

pub(crate) fn preprocess(dialect: &dyn SqlDialect, sql: &str) -> Result<Preprocessed> {
    let tokens = tokenize(dialect, sql)?;

    let mut result = Preprocessed {
        annotations: collect_annotations(&tokens),
        ..Default::default()
    };

    let significant: Vec<usize> = (tokens.iter().enumerate())
        .filter(|(_, t)| is_significant(&t.token))
        .map(|(i, _)| i)
        .collect();
    let mut removed = vec![false; tokens.len()];

    for (pos, &i) in significant.iter().enumerate() {
        let next = |n: usize| significant.get(pos + n).map(|&j| &tokens[j].token);

        if is_keyword(&tokens[i].token, "BETWEEN") {
            let symmetric = next(1).is_some_and(|t| is_keyword(t, "SYMMETRIC"));
            if symmetric || next(1).is_some_and(|t| is_keyword(t, "ASYMMETRIC")) {
                removed[significant[pos + 1]] = true;
            }
            result
                .betweens
                .push((position(tokens[i].span.start), symmetric));
        }

        if is_keyword(&tokens[i].token, "ON")
            && next(1).is_some_and(|t| is_keyword(t, "DUPLICATE"))
            && next(2).is_some_and(|t| is_keyword(t, "KEY"))
            && next(3).is_some_and(|t| is_keyword(t, "IGNORE"))
        {
            for n in 0..4 {
                removed[significant[pos + n]] = true;
            }
            result.duplicate_key_ignore = true;
        }
    }

    if significant
        .first()
        .is_some_and(|&i| is_keyword(&tokens[i].token, "INSERT"))
    {
        result.insert_column_qualifiers =
            strip_insert_qualifiers(&tokens, &significant, &mut removed);
    }

    result.tokens = (tokens.into_iter().zip(removed))
        .filter(|(_, removed)| !removed)
        .map(|(t, _)| t)
        .collect();

    Ok(result)
}

/// Finds `INSERT INTO t (a.x, b.y)` and rewrites the list to `(x, y)`.
fn strip_insert_qualifiers(
    tokens: &[TokenWithSpan],
    significant: &[usize],
    removed: &mut [bool],
) -> Vec<Option<Ident>> {
    let Some(open) = significant.iter().position(|&i| {
        tokens[i].token == Token::LParen
            || is_keyword(&tokens[i].token, "VALUES")
            || is_keyword(&tokens[i].token, "SELECT")
    }) else {
        return Vec::new();
    };
    if tokens[significant[open]].token != Token::LParen {
        return Vec::new();
    }

    // split the column list into its entries
    let mut entries: Vec<Vec<usize>> = vec![Vec::new()];
    let mut depth = 0;
    for &i in &significant[open + 1..] {
        match &tokens[i].token {
            Token::LParen => depth += 1,
            Token::RParen if depth == 0 => break,
            Token::RParen => depth -= 1,
            Token::Comma if depth == 0 => {
                entries.push(Vec::new());
                continue;
            }
            _ => {}
        }
        if let Some(entry) = entries.last_mut() {
            entry.push(i);
        }
    }

    let qualifiers: Vec<Option<Ident>> = entries
        .iter()
        .map(|entry| {
            let is_dotted_name = entry.len() >= 3
                && entry.len() % 2 == 1
                && entry.iter().enumerate().all(|(n, &i)| match n % 2 {
                    0 => matches!(tokens[i].token, Token::Word(_)),
                    _ => tokens[i].token == Token::Period,
                });
            if !is_dotted_name {
                return None;
            }

            let (_, init) = entry.split_last()?;
            for &i in init {
                removed[i] = true;
            }
            let qualifier = &tokens[init[init.len() - 2]];
            match &qualifier.token {
                Token::Word(w) => Some(Ident {
                    value: w.value.clone(),
                    quote_style: w.quote_style,
                    span: qualifier.span,
                }),
                _ => None,
            }
        })
        .collect();

    if qualifiers.iter().all(Option::is_none) {
        return Vec::new();
    }
    qualifiers
}

fn collect_annotations(tokens: &[TokenWithSpan]) -> HashMap<String, TableAnnotation> {
    let mut annotations = HashMap::new();
    let mut previous_word: Option<&str> = None;

    for token in tokens {
        match &token.token {
            Token::Whitespace(Whitespace::MultiLineComment(text)) => {
                if let (Some(word), Some(annotation)) = (previous_word, parse_annotation(text)) {
                    log::debug!("table annotation for {word}: {annotation:?}");
                    annotations.insert(word.to_string(), annotation);
                }
            }
            Token::Whitespace(_) => {}
            Token::Word(w) => previous_word = Some(&w.value),
            _ => previous_word = None,
        }
    }
    annotations
}

/// Parses `label=Person` or `start=Person, type=ACTED_IN, end=Movie`.
fn parse_annotation(text: &str) -> Option<TableAnnotation> {
    let mut annotation = TableAnnotation::default();

    for pair in text.split(',') {
        let (key, value) = pair.split_once('=')?;
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let slot = match key.trim().to_ascii_lowercase().as_str() {
            "label" => &mut annotation.label,
            "type" => &mut annotation.rel_type,
            "start" => &mut annotation.start,
            "end" => &mut annotation.end,
            _ => return None,
        };
        *slot = Some(value.to_string());
    }

    if annotation.label.is_none() && annotation.rel_type.is_none() {
        return None;
    }
    Some(annotation)
}

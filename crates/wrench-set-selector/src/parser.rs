//! Selector syntax parser using the `cssparser` crate.
//!
//! The tokenizer does the lexing; this module builds [`SelectorList`] values
//! from the token stream. Whitespace is significant between compound parts
//! (it is the descendant combinator), so the complex-selector loop reads
//! tokens with `next_including_whitespace`.

use cssparser::{
    BasicParseErrorKind, Delimiter, ParseError, ParseErrorKind, Parser, ParserInput,
    SourceLocation, Token,
};

use crate::types::{
    AttrOperator, AttributeSelector, Combinator, NthExpr, PseudoClass, Selector, SelectorList,
    SelectorPart, TypeSelector,
};
use crate::{Error, Result};

/// Custom error kinds raised while walking the token stream.
#[derive(Debug, Clone)]
enum SyntaxError {
    Message(&'static str),
    UnsupportedPseudoClass(String),
}

type PResult<'i, T> = std::result::Result<T, ParseError<'i, SyntaxError>>;

/// Parse a comma-separated selector list (e.g., `".a > b, [data-x]"`).
///
/// # Errors
///
/// Returns [`Error::Empty`] for blank input, [`Error::UnsupportedPseudoClass`]
/// for pseudo-classes outside the supported set, and [`Error::Parse`] with a
/// 1-indexed location for any other syntax error.
pub fn parse_selector_list(input: &str) -> Result<SelectorList> {
    if input.trim().is_empty() {
        return Err(Error::Empty);
    }

    let mut parser_input = ParserInput::new(input);
    let mut parser = Parser::new(&mut parser_input);
    let mut selectors = Vec::new();

    loop {
        let selector = parser
            .parse_until_before(Delimiter::Comma, parse_complex_selector)
            .map_err(|e| to_error(input, e))?;
        selectors.push(selector);

        match parser.next() {
            Ok(&Token::Comma) => continue,
            Ok(token) => {
                let message = format!("unexpected token {:?}", token);
                let location = parser.current_source_location();
                return Err(Error::parse(input, message, location.line + 1, location.column));
            }
            Err(_) => break,
        }
    }

    tracing::trace!(target: "wrench_set_selector::parser", selector = input, count = selectors.len(), "parsed selector list");
    Ok(SelectorList { selectors })
}

/// Parse exactly one complex selector (no commas).
pub fn parse_selector(input: &str) -> Result<Selector> {
    let mut list = parse_selector_list(input)?;
    if list.selectors.len() != 1 {
        return Err(Error::parse(input, "expected a single selector", 1, 1));
    }
    Ok(list.selectors.remove(0))
}

fn parse_complex_selector<'i>(p: &mut Parser<'i, '_>) -> PResult<'i, Selector> {
    p.skip_whitespace();

    let mut parts = Vec::new();
    let mut combinators = Vec::new();
    let mut current = SelectorPart::default();
    // Combinator waiting for the next compound part.
    let mut pending: Option<Combinator> = None;

    loop {
        let location = p.current_source_location();
        let token = match p.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        let explicit = match token {
            Token::WhiteSpace(_) => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                    pending = Some(Combinator::Descendant);
                }
                continue;
            }
            Token::Delim('>') => Some(Combinator::Child),
            Token::Delim('+') => Some(Combinator::AdjacentSibling),
            Token::Delim('~') => Some(Combinator::GeneralSibling),
            _ => None,
        };

        if let Some(combinator) = explicit {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            } else if parts.is_empty() {
                return Err(custom(location, "selector cannot start with a combinator"));
            } else if pending != Some(Combinator::Descendant) {
                return Err(custom(location, "consecutive combinators"));
            }
            pending = Some(combinator);
            continue;
        }

        if current.is_empty() && !parts.is_empty() {
            combinators.push(pending.take().unwrap_or(Combinator::Descendant));
        }
        parse_component(p, token, location, &mut current)?;
    }

    if !current.is_empty() {
        parts.push(current);
    } else if matches!(pending, Some(c) if c != Combinator::Descendant) {
        return Err(custom(p.current_source_location(), "selector ends with a combinator"));
    }

    if parts.is_empty() {
        return Err(custom(p.current_source_location(), "empty selector"));
    }

    Ok(Selector { parts, combinators })
}

/// Parse a compound selector with no combinators (the argument of `:not()`).
fn parse_compound_selector<'i>(p: &mut Parser<'i, '_>) -> PResult<'i, SelectorPart> {
    p.skip_whitespace();
    let mut part = SelectorPart::default();

    loop {
        let location = p.current_source_location();
        let token = match p.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        if let Token::WhiteSpace(_) = token {
            if p.is_exhausted() {
                break;
            }
            return Err(custom(location, "combinators are not allowed in :not()"));
        }
        parse_component(p, token, location, &mut part)?;
    }

    if part.is_empty() {
        return Err(custom(p.current_source_location(), "empty :not() argument"));
    }
    Ok(part)
}

/// Apply one simple selector token to the compound part being built.
fn parse_component<'i>(
    p: &mut Parser<'i, '_>,
    token: Token<'i>,
    location: SourceLocation,
    part: &mut SelectorPart,
) -> PResult<'i, ()> {
    match token {
        Token::Ident(name) => {
            if !part.is_empty() {
                return Err(custom(location, "type selector must come first"));
            }
            part.type_selector = Some(TypeSelector::Type(name.to_ascii_lowercase()));
        }

        Token::Delim('*') => {
            if !part.is_empty() {
                return Err(custom(location, "universal selector must come first"));
            }
            part.type_selector = Some(TypeSelector::Universal);
        }

        Token::Delim('.') => {
            let class = p.expect_ident_cloned()?;
            part.classes.push(class.to_string());
        }

        Token::IDHash(id) => {
            if part.id.is_some() {
                return Err(custom(location, "more than one ID selector"));
            }
            part.id = Some(id.to_string());
        }

        Token::Hash(_) => {
            return Err(custom(location, "ID selector is not a valid identifier"));
        }

        Token::SquareBracketBlock => {
            let attribute = p.parse_nested_block(parse_attribute)?;
            part.attributes.push(attribute);
        }

        Token::Colon => {
            let pseudo = parse_pseudo_class(p)?;
            part.pseudo_classes.push(pseudo);
        }

        other => return Err(unexpected(location, other)),
    }
    Ok(())
}

/// Parse the inside of `[...]`.
fn parse_attribute<'i>(p: &mut Parser<'i, '_>) -> PResult<'i, AttributeSelector> {
    let name = p.expect_ident()?.to_ascii_lowercase();
    if p.is_exhausted() {
        return Ok(AttributeSelector::exists(name));
    }

    let location = p.current_source_location();
    let operator = match p.next()?.clone() {
        Token::Delim('=') => AttrOperator::Equals,
        Token::IncludeMatch => AttrOperator::Includes,
        Token::DashMatch => AttrOperator::DashMatch,
        Token::PrefixMatch => AttrOperator::Prefix,
        Token::SuffixMatch => AttrOperator::Suffix,
        Token::SubstringMatch => AttrOperator::Substring,
        other => return Err(unexpected(location, other)),
    };
    let value = p.expect_ident_or_string()?.to_string();

    Ok(AttributeSelector::with_operator(name, operator, value))
}

/// Parse what follows a `:`.
fn parse_pseudo_class<'i>(p: &mut Parser<'i, '_>) -> PResult<'i, PseudoClass> {
    let location = p.current_source_location();
    match p.next_including_whitespace()?.clone() {
        Token::Ident(name) => PseudoClass::from_css(&name).ok_or_else(|| unsupported(location, &name)),
        Token::Function(name) => match name.to_ascii_lowercase().as_str() {
            "not" => {
                let inner = p.parse_nested_block(parse_compound_selector)?;
                Ok(PseudoClass::Not(Box::new(inner)))
            }
            "nth-child" => Ok(PseudoClass::NthChild(p.parse_nested_block(parse_nth_argument)?)),
            _ => Err(unsupported(location, &name)),
        },
        Token::Colon => Err(custom(location, "pseudo-elements are not supported")),
        other => Err(unexpected(location, other)),
    }
}

/// Parse an `An+B` argument (e.g., "odd", "3", "2n+1").
fn parse_nth_argument<'i>(p: &mut Parser<'i, '_>) -> PResult<'i, NthExpr> {
    let (a, b) = cssparser::parse_nth(p)?;
    Ok(NthExpr::new(a, b))
}

fn custom<'i>(location: SourceLocation, message: &'static str) -> ParseError<'i, SyntaxError> {
    ParseError {
        kind: ParseErrorKind::Custom(SyntaxError::Message(message)),
        location,
    }
}

fn unsupported<'i>(location: SourceLocation, name: &str) -> ParseError<'i, SyntaxError> {
    ParseError {
        kind: ParseErrorKind::Custom(SyntaxError::UnsupportedPseudoClass(name.to_string())),
        location,
    }
}

fn unexpected<'i>(location: SourceLocation, token: Token<'i>) -> ParseError<'i, SyntaxError> {
    ParseError {
        kind: ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(token)),
        location,
    }
}

fn to_error(input: &str, error: ParseError<'_, SyntaxError>) -> Error {
    let message = match error.kind {
        ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(token)) => {
            format!("unexpected token {:?}", token)
        }
        ParseErrorKind::Basic(BasicParseErrorKind::EndOfInput) => {
            "unexpected end of input".to_string()
        }
        ParseErrorKind::Basic(other) => format!("{:?}", other),
        ParseErrorKind::Custom(SyntaxError::UnsupportedPseudoClass(name)) => {
            return Error::UnsupportedPseudoClass(name);
        }
        ParseErrorKind::Custom(SyntaxError::Message(message)) => message.to_string(),
    };
    Error::parse(input, message, error.location.line + 1, error.location.column)
}

use std::cell::Cell;

use winnow::{
    Parser as _,
    ascii::{digit1, multispace0},
    combinator::{alt, opt, separated},
    token::{one_of, take_while},
};

use crate::value::CellValue;

use super::{BinaryOp, Binding, Expr, ParseError, UnaryOp};

type ParseResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

fn backtrack<T>() -> ParseResult<T> {
    Err(winnow::error::ErrMode::Backtrack(
        winnow::error::ContextError::new(),
    ))
}

/// Deepest nesting of groups, unary operators and conditionals accepted.
const MAX_DEPTH: usize = 64;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
    static TOO_DEEP: Cell<bool> = const { Cell::new(false) };
}

/// Counts one level of recursion while alive.
struct Nesting;

impl Nesting {
    fn enter() -> ParseResult<Self> {
        let depth = DEPTH.with(Cell::get);
        if depth >= MAX_DEPTH {
            TOO_DEEP.with(|flag| flag.set(true));
            return Err(winnow::error::ErrMode::Cut(
                winnow::error::ContextError::new(),
            ));
        }
        DEPTH.with(|cell| cell.set(depth + 1));
        Ok(Nesting)
    }
}

impl Drop for Nesting {
    fn drop(&mut self) {
        DEPTH.with(|cell| cell.set(cell.get().saturating_sub(1)));
    }
}

fn ws(input: &mut &str) -> ParseResult<()> {
    multispace0.void().parse_next(input)
}

fn identifier<'a>(input: &mut &'a str) -> ParseResult<&'a str> {
    (
        one_of(|c: char| c.is_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

fn number(input: &mut &str) -> ParseResult<f64> {
    (
        digit1,
        opt(('.', digit1)),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    )
        .take()
        .try_map(str::parse::<f64>)
        .parse_next(input)
}

fn quoted_string(input: &mut &str) -> ParseResult<String> {
    let quote = one_of(['"', '\'']).parse_next(input)?;
    let mut result = String::new();

    loop {
        let ch: char = winnow::token::any.parse_next(input)?;
        if ch == quote {
            break;
        }
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        let escaped_char: char = winnow::token::any.parse_next(input)?;
        match escaped_char {
            'n' => result.push('\n'),
            't' => result.push('\t'),
            'r' => result.push('\r'),
            // quotes and backslashes stand for themselves
            _ => result.push(escaped_char),
        }
    }

    Ok(result)
}

fn keyword(input: &mut &str) -> ParseResult<Expr> {
    let literal = match identifier.parse_next(input)? {
        "true" => CellValue::Bool(true),
        "false" => CellValue::Bool(false),
        "null" | "undefined" => CellValue::Null,
        _ => return backtrack(),
    };
    Ok(Expr::Literal(literal))
}

fn binding(input: &mut &str) -> ParseResult<Binding> {
    let _: char = '$'.parse_next(input)?;
    match identifier.parse_next(input)? {
        "row" => Ok(Binding::Row),
        "cell" => Ok(Binding::Cell),
        "data" => Ok(Binding::Data),
        "ctx" => Ok(Binding::Context),
        _ => backtrack(),
    }
}

fn arguments(input: &mut &str) -> ParseResult<Vec<Expr>> {
    let _: char = '('.parse_next(input)?;
    let args: Vec<Expr> = separated(0.., expression, (multispace0, ',')).parse_next(input)?;
    ws(input)?;
    let _: char = ')'.parse_next(input)?;
    Ok(args)
}

fn list(input: &mut &str) -> ParseResult<Expr> {
    let _: char = '['.parse_next(input)?;
    let items: Vec<Expr> = separated(0.., expression, (multispace0, ',')).parse_next(input)?;
    ws(input)?;
    let _: char = ']'.parse_next(input)?;
    Ok(Expr::List(items))
}

fn parenthesized(input: &mut &str) -> ParseResult<Expr> {
    let _: char = '('.parse_next(input)?;
    let inner = expression(input)?;
    ws(input)?;
    let _: char = ')'.parse_next(input)?;
    Ok(inner)
}

fn primary(input: &mut &str) -> ParseResult<Expr> {
    ws(input)?;
    alt((
        number.map(|n| Expr::Literal(CellValue::Number(n))),
        quoted_string.map(|s| Expr::Literal(CellValue::String(s))),
        binding.map(Expr::Binding),
        parenthesized,
        list,
        keyword,
    ))
    .parse_next(input)
}

fn postfix(input: &mut &str) -> ParseResult<Expr> {
    let mut expr = primary(input)?;
    loop {
        ws(input)?;
        if input.starts_with('.') {
            let _: char = '.'.parse_next(input)?;
            ws(input)?;
            let name = identifier.parse_next(input)?.to_owned();
            ws(input)?;
            expr = if input.starts_with('(') {
                Expr::Call {
                    target: Box::new(expr),
                    method: name,
                    args: arguments(input)?,
                }
            } else {
                Expr::Member(Box::new(expr), name)
            };
        } else if input.starts_with('[') {
            let _: char = '['.parse_next(input)?;
            let index = expression(input)?;
            ws(input)?;
            let _: char = ']'.parse_next(input)?;
            expr = Expr::Index(Box::new(expr), Box::new(index));
        } else {
            break;
        }
    }
    Ok(expr)
}

fn unary(input: &mut &str) -> ParseResult<Expr> {
    let _nesting = Nesting::enter()?;
    ws(input)?;
    let op = opt(alt(('!'.value(UnaryOp::Not), '-'.value(UnaryOp::Neg)))).parse_next(input)?;
    match op {
        Some(op) => Ok(Expr::Unary(op, Box::new(unary(input)?))),
        None => postfix(input),
    }
}

/// One left-associative precedence level.
fn binary_level(
    input: &mut &str,
    operand: fn(&mut &str) -> ParseResult<Expr>,
    operator: fn(&mut &str) -> ParseResult<BinaryOp>,
) -> ParseResult<Expr> {
    let mut lhs = operand(input)?;
    loop {
        ws(input)?;
        let Some(op) = opt(operator).parse_next(input)? else {
            break;
        };
        let rhs = operand(input)?;
        lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn multiplicative(input: &mut &str) -> ParseResult<Expr> {
    binary_level(input, unary, |input| {
        alt((
            '*'.value(BinaryOp::Mul),
            '/'.value(BinaryOp::Div),
            '%'.value(BinaryOp::Rem),
        ))
        .parse_next(input)
    })
}

fn additive(input: &mut &str) -> ParseResult<Expr> {
    binary_level(input, multiplicative, |input| {
        alt(('+'.value(BinaryOp::Add), '-'.value(BinaryOp::Sub))).parse_next(input)
    })
}

fn relational(input: &mut &str) -> ParseResult<Expr> {
    binary_level(input, additive, |input| {
        alt((
            "<=".value(BinaryOp::Le),
            ">=".value(BinaryOp::Ge),
            "<".value(BinaryOp::Lt),
            ">".value(BinaryOp::Gt),
        ))
        .parse_next(input)
    })
}

fn equality(input: &mut &str) -> ParseResult<Expr> {
    binary_level(input, relational, |input| {
        alt((
            "===".value(BinaryOp::StrictEq),
            "!==".value(BinaryOp::StrictNe),
            "==".value(BinaryOp::Eq),
            "!=".value(BinaryOp::Ne),
        ))
        .parse_next(input)
    })
}

fn and(input: &mut &str) -> ParseResult<Expr> {
    binary_level(input, equality, |input| {
        "&&".value(BinaryOp::And).parse_next(input)
    })
}

fn or(input: &mut &str) -> ParseResult<Expr> {
    binary_level(input, and, |input| "||".value(BinaryOp::Or).parse_next(input))
}

fn conditional(input: &mut &str) -> ParseResult<Expr> {
    let _nesting = Nesting::enter()?;
    let test = or(input)?;
    ws(input)?;
    if opt('?').parse_next(input)?.is_none() {
        return Ok(test);
    }
    let then = conditional(input)?;
    ws(input)?;
    let _: char = ':'.parse_next(input)?;
    let otherwise = conditional(input)?;
    Ok(Expr::Conditional(
        Box::new(test),
        Box::new(then),
        Box::new(otherwise),
    ))
}

fn expression(input: &mut &str) -> ParseResult<Expr> {
    conditional(input)
}

pub(super) fn parse(src: &str) -> Result<Expr, ParseError> {
    let mut input = src;
    DEPTH.with(|cell| cell.set(0));
    TOO_DEEP.with(|flag| flag.set(false));
    let result = expression.parse_next(&mut input);
    if TOO_DEEP.with(Cell::get) {
        return Err(ParseError {
            offset: src.len() - input.len(),
            message: format!("nesting deeper than {MAX_DEPTH} levels"),
        });
    }
    match result {
        Ok(expr) if input.trim().is_empty() => Ok(expr),
        Ok(_) => Err(ParseError {
            offset: src.len() - input.trim_start().len(),
            message: "unexpected trailing input".to_owned(),
        }),
        Err(e) => Err(ParseError {
            offset: src.len() - input.len(),
            message: e.to_string(),
        }),
    }
}

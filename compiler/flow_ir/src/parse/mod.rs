//! Line-oriented textual IR.
//!
//! ```text
//! ; comments run to end of line
//! func @sum(%n) {
//! entry:
//!   %a = load @x          ; named location
//!   %b = load @0          ; unnamed location (numeric slot)
//!   %s = add %a, %b
//!   store %s, @y
//!   store 7, @x           ; integer literals are uniqued constants
//!   %c = icmp %s, %n      ; unknown opcodes become `Instr::Other`
//!   br %c, entry, done
//! done:
//!   ret %s
//! }
//! ```
//!
//! Terminators are `ret [v]`, `jmp label`, `br v, label, label` and
//! `unreachable`. Labels and values may be referenced before they are
//! defined; both are resolved when the closing `}` is reached.

use std::fmt;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{
    BinOp, BlockId, Function, FunctionBuilder, Instr, IrError, LocationId, Terminator, ValueId,
};

/// What went wrong on a line.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected {expected}, found {found}")]
    Unexpected {
        expected: &'static str,
        found: String,
    },
    #[error("integer literal `{0}` is out of range")]
    BadInteger(String),
    #[error("label `{0}` is defined twice")]
    DuplicateLabel(String),
    #[error("unknown label `{0}`")]
    UnknownLabel(String),
    #[error("value `%{0}` is defined twice")]
    DuplicateValue(String),
    #[error("value `%{0}` is used but never defined")]
    UndefinedValue(String),
    #[error("instruction outside of a block")]
    OutsideBlock,
    #[error("instruction after the terminator of block `{0}`")]
    AfterTerminator(String),
    #[error("block `{0}` has no terminator")]
    MissingTerminator(String),
    #[error("function `@{0}` is never closed")]
    UnclosedFunction(String),
}

/// Error from [`parse_module`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: {kind}")]
    Syntax { line: usize, kind: ParseErrorKind },
    #[error(transparent)]
    Invalid(#[from] IrError),
}

impl ParseError {
    /// The syntax error kind, if this is a syntax error.
    pub fn kind(&self) -> Option<&ParseErrorKind> {
        match self {
            ParseError::Syntax { kind, .. } => Some(kind),
            ParseError::Invalid(_) => None,
        }
    }
}

fn syntax(line: usize, kind: ParseErrorKind) -> ParseError {
    ParseError::Syntax { line, kind }
}

fn unexpected(line: usize, expected: &'static str, found: Option<&Token<'_>>) -> ParseError {
    let found = match found {
        Some(token) => format!("`{token}`"),
        None => "end of line".to_string(),
    };
    syntax(line, ParseErrorKind::Unexpected { expected, found })
}

/// Parse every function in `src`, in source order.
pub fn parse_module(src: &str) -> Result<Vec<Function>, ParseError> {
    let mut functions = Vec::new();
    let mut current: Option<FunctionParser<'_>> = None;
    let mut last_line = 0;

    for (idx, raw_line) in src.lines().enumerate() {
        let line = idx + 1;
        last_line = line;
        let text = strip_comment(raw_line).trim();
        if text.is_empty() {
            continue;
        }
        let tokens = tokenize(text, line)?;

        if current.is_none() {
            current = Some(FunctionParser::header(&tokens, line)?);
            continue;
        }

        if tokens == [Token::Punct('}')] {
            if let Some(parser) = current.take() {
                functions.push(parser.finish(line)?);
            }
            continue;
        }

        if let Some(parser) = current.as_mut() {
            parser.body_line(&tokens, line)?;
        }
    }

    if let Some(parser) = current {
        return Err(syntax(
            last_line,
            ParseErrorKind::UnclosedFunction(parser.name.to_string()),
        ));
    }

    Ok(functions)
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

// ── Tokens ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token<'s> {
    /// `%name`
    Value(&'s str),
    /// `@name`
    Location(&'s str),
    Ident(&'s str),
    Int(&'s str),
    Punct(char),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Value(name) => write!(f, "%{name}"),
            Token::Location(name) => write!(f, "@{name}"),
            Token::Ident(text) | Token::Int(text) => f.write_str(text),
            Token::Punct(c) => write!(f, "{c}"),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$')
}

fn tokenize(text: &str, line: usize) -> Result<Vec<Token<'_>>, ParseError> {
    let mut tokens = Vec::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
            continue;
        }

        let (token, len) = match c {
            '=' | ',' | '(' | ')' | '{' | '}' | ':' => (Token::Punct(c), 1),
            '%' | '@' => {
                let len = word_len(&rest[1..]);
                if len == 0 {
                    return Err(unexpected(line, "a name", Some(&Token::Punct(c))));
                }
                let word = &rest[1..=len];
                let token = if c == '%' {
                    Token::Value(word)
                } else {
                    Token::Location(word)
                };
                (token, len + 1)
            }
            '-' | '0'..='9' => {
                let digits = rest[1..]
                    .chars()
                    .take_while(char::is_ascii_digit)
                    .count();
                let len = 1 + digits;
                if c == '-' && digits == 0 {
                    return Err(unexpected(line, "an integer", Some(&Token::Punct('-'))));
                }
                (Token::Int(&rest[..len]), len)
            }
            c if is_ident_char(c) => {
                let len = word_len(rest);
                (Token::Ident(&rest[..len]), len)
            }
            other => {
                return Err(syntax(
                    line,
                    ParseErrorKind::Unexpected {
                        expected: "a token",
                        found: format!("`{other}`"),
                    },
                ));
            }
        };

        tokens.push(token);
        rest = &rest[len..];
    }

    Ok(tokens)
}

fn word_len(text: &str) -> usize {
    text.chars()
        .take_while(|&c| is_ident_char(c))
        .map(char::len_utf8)
        .sum()
}

// ── Function bodies ─────────────────────────────────────────────────

struct ValueSlot {
    id: ValueId,
    defined: bool,
    first_use: usize,
}

/// Terminator whose labels are resolved at the closing brace.
enum PendingTerm<'s> {
    Return(Option<ValueId>),
    Jump(&'s str),
    Branch(ValueId, &'s str, &'s str),
    Unreachable,
}

struct FunctionParser<'s> {
    name: &'s str,
    builder: FunctionBuilder,
    values: FxHashMap<&'s str, ValueSlot>,
    labels: FxHashMap<&'s str, BlockId>,
    terminators: Vec<(BlockId, usize, PendingTerm<'s>)>,
    current: Option<(BlockId, &'s str)>,
    current_terminated: bool,
}

impl<'s> FunctionParser<'s> {
    /// `func @name(%a, %b) {`
    fn header(tokens: &[Token<'s>], line: usize) -> Result<Self, ParseError> {
        let mut cursor = Cursor::new(tokens, line);
        cursor.keyword("func")?;
        let name = match cursor.next() {
            Some(Token::Location(name)) => name,
            other => return Err(unexpected(line, "a function name", other.as_ref())),
        };

        let mut parser = Self {
            name,
            builder: FunctionBuilder::new(name),
            values: FxHashMap::default(),
            labels: FxHashMap::default(),
            terminators: Vec::new(),
            current: None,
            current_terminated: false,
        };

        cursor.punct('(')?;
        if cursor.peek() != Some(Token::Punct(')')) {
            loop {
                match cursor.next() {
                    Some(Token::Value(param)) => {
                        if parser.values.contains_key(param) {
                            return Err(syntax(
                                line,
                                ParseErrorKind::DuplicateValue(param.to_string()),
                            ));
                        }
                        let id = parser.builder.param(param);
                        parser.values.insert(
                            param,
                            ValueSlot {
                                id,
                                defined: true,
                                first_use: line,
                            },
                        );
                    }
                    other => return Err(unexpected(line, "a parameter", other.as_ref())),
                }
                if cursor.peek() == Some(Token::Punct(',')) {
                    cursor.next();
                } else {
                    break;
                }
            }
        }
        cursor.punct(')')?;
        cursor.punct('{')?;
        cursor.end()?;

        Ok(parser)
    }

    fn body_line(&mut self, tokens: &[Token<'s>], line: usize) -> Result<(), ParseError> {
        if let [Token::Ident(label), Token::Punct(':')] = tokens {
            return self.start_block(*label, line);
        }

        let Some((block, label)) = self.current else {
            return Err(syntax(line, ParseErrorKind::OutsideBlock));
        };
        if self.current_terminated {
            return Err(syntax(
                line,
                ParseErrorKind::AfterTerminator(label.to_string()),
            ));
        }

        let mut cursor = Cursor::new(tokens, line);
        match cursor.next() {
            Some(Token::Value(dst)) => {
                cursor.punct('=')?;
                let opcode = cursor.ident()?;
                let instr = self.defining_instr(dst, opcode, &mut cursor)?;
                self.builder.push(block, instr);
            }
            Some(Token::Ident("store")) => {
                let value = self.operand(&mut cursor)?;
                cursor.punct(',')?;
                let dst = self.location(&mut cursor)?;
                cursor.end()?;
                self.builder.push(block, Instr::Store { value, dst });
            }
            Some(Token::Ident("ret")) => {
                let value = if cursor.peek().is_some() {
                    Some(self.operand(&mut cursor)?)
                } else {
                    None
                };
                cursor.end()?;
                self.terminate(block, line, PendingTerm::Return(value));
            }
            Some(Token::Ident("jmp")) => {
                let target = cursor.ident()?;
                cursor.end()?;
                self.terminate(block, line, PendingTerm::Jump(target));
            }
            Some(Token::Ident("br")) => {
                let cond = self.operand(&mut cursor)?;
                cursor.punct(',')?;
                let then_label = cursor.ident()?;
                cursor.punct(',')?;
                let else_label = cursor.ident()?;
                cursor.end()?;
                self.terminate(block, line, PendingTerm::Branch(cond, then_label, else_label));
            }
            Some(Token::Ident("unreachable")) => {
                cursor.end()?;
                self.terminate(block, line, PendingTerm::Unreachable);
            }
            Some(Token::Ident(opcode)) => {
                let args = self.operand_list(&mut cursor)?;
                self.builder.push(
                    block,
                    Instr::Other {
                        dst: None,
                        opcode: opcode.into(),
                        args,
                    },
                );
            }
            other => return Err(unexpected(line, "an instruction", other.as_ref())),
        }

        Ok(())
    }

    /// Everything after `%dst = opcode`.
    fn defining_instr(
        &mut self,
        dst: &'s str,
        opcode: &'s str,
        cursor: &mut Cursor<'_, 's>,
    ) -> Result<Instr, ParseError> {
        let line = cursor.line;
        if opcode == "load" {
            let src = self.location(cursor)?;
            cursor.end()?;
            let dst = self.define_value(dst, line)?;
            return Ok(Instr::Load { dst, src });
        }

        if let Some(op) = BinOp::from_name(opcode) {
            let lhs = self.operand(cursor)?;
            cursor.punct(',')?;
            let rhs = self.operand(cursor)?;
            cursor.end()?;
            let dst = self.define_value(dst, line)?;
            return Ok(Instr::Binary { op, lhs, rhs, dst });
        }

        let args = self.operand_list(cursor)?;
        let dst = self.define_value(dst, line)?;
        Ok(Instr::Other {
            dst: Some(dst),
            opcode: opcode.into(),
            args,
        })
    }

    fn start_block(&mut self, label: &'s str, line: usize) -> Result<(), ParseError> {
        self.check_terminated(line)?;
        if self.labels.contains_key(label) {
            return Err(syntax(
                line,
                ParseErrorKind::DuplicateLabel(label.to_string()),
            ));
        }
        let block = self.builder.block(Some(label));
        self.labels.insert(label, block);
        self.current = Some((block, label));
        self.current_terminated = false;
        Ok(())
    }

    fn terminate(&mut self, block: BlockId, line: usize, term: PendingTerm<'s>) {
        self.terminators.push((block, line, term));
        self.current_terminated = true;
    }

    fn check_terminated(&self, line: usize) -> Result<(), ParseError> {
        match self.current {
            Some((_, label)) if !self.current_terminated => Err(syntax(
                line,
                ParseErrorKind::MissingTerminator(label.to_string()),
            )),
            _ => Ok(()),
        }
    }

    fn operand(&mut self, cursor: &mut Cursor<'_, 's>) -> Result<ValueId, ParseError> {
        let line = cursor.line;
        match cursor.next() {
            Some(Token::Value(name)) => Ok(self.use_value(name, line)),
            Some(Token::Int(text)) => {
                let value: i64 = text
                    .parse()
                    .map_err(|_| syntax(line, ParseErrorKind::BadInteger(text.to_string())))?;
                Ok(self.builder.constant(value))
            }
            other => Err(unexpected(line, "an operand", other.as_ref())),
        }
    }

    /// Zero or more comma-separated operands running to end of line.
    fn operand_list(&mut self, cursor: &mut Cursor<'_, 's>) -> Result<Vec<ValueId>, ParseError> {
        let mut args = Vec::new();
        if cursor.peek().is_none() {
            return Ok(args);
        }
        loop {
            args.push(self.operand(cursor)?);
            if cursor.peek().is_none() {
                return Ok(args);
            }
            cursor.punct(',')?;
        }
    }

    /// `@name`, or `@N` for the unnamed location in slot `N`.
    fn location(&mut self, cursor: &mut Cursor<'_, 's>) -> Result<LocationId, ParseError> {
        match cursor.next() {
            Some(Token::Location(name)) => Ok(self.builder.location(name)),
            other => Err(unexpected(cursor.line, "a location", other.as_ref())),
        }
    }

    fn use_value(&mut self, name: &'s str, line: usize) -> ValueId {
        if let Some(slot) = self.values.get(name) {
            return slot.id;
        }
        let id = self.builder.value(Some(name));
        self.values.insert(
            name,
            ValueSlot {
                id,
                defined: false,
                first_use: line,
            },
        );
        id
    }

    fn define_value(&mut self, name: &'s str, line: usize) -> Result<ValueId, ParseError> {
        match self.values.get_mut(name) {
            Some(slot) if slot.defined => Err(syntax(
                line,
                ParseErrorKind::DuplicateValue(name.to_string()),
            )),
            Some(slot) => {
                slot.defined = true;
                Ok(slot.id)
            }
            None => {
                let id = self.builder.value(Some(name));
                self.values.insert(
                    name,
                    ValueSlot {
                        id,
                        defined: true,
                        first_use: line,
                    },
                );
                Ok(id)
            }
        }
    }

    /// Resolve labels and values at the closing brace.
    fn finish(mut self, line: usize) -> Result<Function, ParseError> {
        self.check_terminated(line)?;

        let undefined = self
            .values
            .iter()
            .filter(|(_, slot)| !slot.defined)
            .min_by_key(|(name, slot)| (slot.first_use, **name));
        if let Some((name, slot)) = undefined {
            return Err(syntax(
                slot.first_use,
                ParseErrorKind::UndefinedValue((*name).to_string()),
            ));
        }

        for (block, term_line, term) in std::mem::take(&mut self.terminators) {
            let terminator = match term {
                PendingTerm::Return(value) => Terminator::Return { value },
                PendingTerm::Jump(target) => Terminator::Jump {
                    target: self.resolve_label(target, term_line)?,
                },
                PendingTerm::Branch(cond, then_label, else_label) => Terminator::Branch {
                    cond,
                    then_block: self.resolve_label(then_label, term_line)?,
                    else_block: self.resolve_label(else_label, term_line)?,
                },
                PendingTerm::Unreachable => Terminator::Unreachable,
            };
            self.builder.terminate(block, terminator);
        }

        Ok(self.builder.finish()?)
    }

    fn resolve_label(&self, label: &str, line: usize) -> Result<BlockId, ParseError> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| syntax(line, ParseErrorKind::UnknownLabel(label.to_string())))
    }
}

// ── Token cursor ────────────────────────────────────────────────────

struct Cursor<'t, 's> {
    tokens: &'t [Token<'s>],
    pos: usize,
    line: usize,
}

impl<'t, 's> Cursor<'t, 's> {
    fn new(tokens: &'t [Token<'s>], line: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            line,
        }
    }

    fn peek(&self) -> Option<Token<'s>> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token<'s>> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn punct(&mut self, c: char) -> Result<(), ParseError> {
        match self.next() {
            Some(Token::Punct(found)) if found == c => Ok(()),
            other => Err(unexpected(self.line, punct_name(c), other.as_ref())),
        }
    }

    fn ident(&mut self) -> Result<&'s str, ParseError> {
        match self.next() {
            Some(Token::Ident(text)) => Ok(text),
            other => Err(unexpected(self.line, "a name", other.as_ref())),
        }
    }

    fn keyword(&mut self, keyword: &'static str) -> Result<(), ParseError> {
        match self.next() {
            Some(Token::Ident(text)) if text == keyword => Ok(()),
            other => Err(unexpected(self.line, keyword, other.as_ref())),
        }
    }

    fn end(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            other => Err(unexpected(self.line, "end of line", other.as_ref())),
        }
    }
}

fn punct_name(c: char) -> &'static str {
    match c {
        '=' => "`=`",
        ',' => "`,`",
        '(' => "`(`",
        ')' => "`)`",
        '{' => "`{`",
        '}' => "`}`",
        _ => "`:`",
    }
}

#[cfg(test)]
mod tests;

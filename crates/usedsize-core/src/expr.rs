//! Object expressions.
//!
//! The commands take the object to measure as a C-like expression:
//!
//! ```text
//! expression := '*' expression
//!             | '*' '(' type-name '*' ')' integer
//!             | postfix
//! postfix    := primary ( '.' identifier | '->' identifier )*
//! primary    := identifier ( '::' identifier )* | '(' expression ')'
//! ```
//!
//! Evaluation goes through the structured inspector API (symbol lookup,
//! member search, pointer reads); nothing is handed to an external
//! expression evaluator.

use crate::error::{SizeError, SizeResult};
use crate::inspector::Inspector;
use crate::types::{Address, ObjectRef};

/// Parse and evaluate `expression` against `inspector`.
///
/// The returned reference is named after the trimmed expression text.
pub fn evaluate<I>(inspector: &I, expression: &str) -> SizeResult<ObjectRef>
where
    I: Inspector + ?Sized,
{
    let mut parser = Parser {
        inspector,
        text: expression,
        pos: 0,
    };
    let object = parser.expression()?;
    parser.skip_whitespace();
    if parser.pos != expression.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(ObjectRef::new(expression.trim(), object.address, object.ty))
}

struct Parser<'a, I: ?Sized>
{
    inspector: &'a I,
    text: &'a str,
    pos: usize,
}

impl<I> Parser<'_, I>
where
    I: Inspector + ?Sized,
{
    fn expression(&mut self) -> SizeResult<ObjectRef>
    {
        self.skip_whitespace();
        if !self.eat("*") {
            return self.postfix();
        }

        self.skip_whitespace();
        if let Some(type_name) = self.cast_type()? {
            return self.typed_address(&type_name);
        }
        let pointer = self.expression()?;
        self.deref(pointer)
    }

    /// `'(' type-name '*' ')'` right after a dereference, if present.
    fn cast_type(&mut self) -> SizeResult<Option<String>>
    {
        if self.peek() != Some('(') {
            return Ok(None);
        }
        let close = self.matching_paren(self.pos)?;
        let inner = self.text[self.pos + 1..close].trim();
        let Some(pointee) = inner.strip_suffix('*') else {
            return Ok(None);
        };
        self.pos = close + 1;
        Ok(Some(pointee.trim().to_string()))
    }

    fn typed_address(&mut self, type_name: &str) -> SizeResult<ObjectRef>
    {
        let ty = self.inspector.lookup_type(type_name)?;
        self.skip_whitespace();
        let address = self.integer()?;
        Ok(ObjectRef::new(format!("*({type_name}*){address}"), address, ty))
    }

    fn postfix(&mut self) -> SizeResult<ObjectRef>
    {
        let mut object = self.primary()?;
        loop {
            self.skip_whitespace();
            if self.eat("->") {
                let name = self.identifier()?;
                let target = self.deref(object)?;
                object = self.inspector.member(&target, &name)?;
            } else if self.eat(".") {
                let name = self.identifier()?;
                object = self.inspector.member(&object, &name)?;
            } else {
                return Ok(object);
            }
        }
    }

    fn primary(&mut self) -> SizeResult<ObjectRef>
    {
        self.skip_whitespace();
        if self.eat("(") {
            let inner = self.expression()?;
            self.skip_whitespace();
            if !self.eat(")") {
                return Err(self.error("expected ')'"));
            }
            return Ok(inner);
        }

        let mut name = self.identifier()?;
        while self.eat("::") {
            name.push_str("::");
            name.push_str(&self.identifier()?);
        }
        self.inspector.symbol(&name)
    }

    fn deref(&self, pointer: ObjectRef) -> SizeResult<ObjectRef>
    {
        let info = self.inspector.type_info(pointer.ty)?;
        let Some(pointee) = info.pointee else {
            return Err(self.error(format!("'{}' is not a pointer ({})", pointer.name, info.name)));
        };
        let target = self.inspector.read_pointer(pointer.address)?;
        if target.is_null() {
            return Err(self.error(format!("'{}' is a null pointer", pointer.name)));
        }
        Ok(ObjectRef::new(format!("*{}", pointer.name), target, pointee))
    }

    fn identifier(&mut self) -> SizeResult<String>
    {
        self.skip_whitespace();
        let rest = &self.text[self.pos..];
        let len = rest
            .char_indices()
            .take_while(|&(i, c)| c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()))
            .count();
        if len == 0 {
            return Err(self.error("expected identifier"));
        }
        self.pos += len;
        Ok(rest[..len].to_string())
    }

    fn integer(&mut self) -> SizeResult<Address>
    {
        let rest = &self.text[self.pos..];
        let len = rest.chars().take_while(char::is_ascii_alphanumeric).count();
        let literal = &rest[..len];
        let parsed = match literal.strip_prefix("0x").or_else(|| literal.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => literal.parse::<u64>(),
        };
        match parsed {
            Ok(value) => {
                self.pos += len;
                Ok(Address::from(value))
            }
            Err(_) => Err(self.error(format!("expected integer address, found '{literal}'"))),
        }
    }

    fn matching_paren(&self, open: usize) -> SizeResult<usize>
    {
        let mut depth = 0usize;
        for (i, c) in self.text[open..].char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(open + i);
                    }
                }
                _ => {}
            }
        }
        Err(self.error("unbalanced parentheses"))
    }

    fn peek(&self) -> Option<char>
    {
        self.text[self.pos..].chars().next()
    }

    fn eat(&mut self, token: &str) -> bool
    {
        if self.text[self.pos..].starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self)
    {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn error(&self, reason: impl Into<String>) -> SizeError
    {
        SizeError::invalid_expression(self.text, self.pos, reason)
    }
}

//! Content stream parser.
//!
//! Groups tokens into operations: operands are collected until an operator
//! keyword consumes them. Arrays and dictionaries nest through a context
//! stack. Inline images (`BI <dict> ID <data> EI`) become a single `EI`
//! operation with the dictionary and the raw data as operands.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::model::objects::{Operand, Operation};
use crate::parser::lexer::{ContentLexer, Token};

/// Context frame for array/dict construction.
#[derive(Debug)]
enum Context {
    Array(Vec<Operand>),
    Dict(Vec<Operand>),
}

/// Iterator over the operations of a content stream.
///
/// Tokenizer errors and stray delimiters are skipped; operands left without
/// an operator at the end of the stream are dropped.
pub struct ContentParser<'a> {
    lexer: ContentLexer<'a>,
    operands: Vec<Operand>,
    context_stack: Vec<Context>,
    /// Collecting an inline image dictionary
    in_inline_dict: bool,
}

impl<'a> ContentParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            lexer: ContentLexer::new(data),
            operands: Vec::new(),
            context_stack: Vec::new(),
            in_inline_dict: false,
        }
    }

    fn push_operand(&mut self, operand: Operand) {
        match self.context_stack.last_mut() {
            Some(Context::Array(items) | Context::Dict(items)) => items.push(operand),
            None => self.operands.push(operand),
        }
    }

    /// Build dictionary from key-value pairs. Entries without a name key
    /// are dropped.
    fn build_dict(items: Vec<Operand>) -> IndexMap<SmolStr, Operand> {
        let mut dict = IndexMap::new();
        let mut iter = items.into_iter();
        while let Some(key) = iter.next() {
            if let Operand::Name(name) = key
                && let Some(value) = iter.next()
            {
                dict.insert(name, value);
            }
        }
        dict
    }

    fn inline_image(&mut self) -> Operation {
        self.in_inline_dict = false;
        let dict = Self::build_dict(std::mem::take(&mut self.operands));
        let data = self.lexer.read_inline_data();
        Operation::new("EI", vec![Operand::Dict(dict), Operand::Str(data)])
    }
}

impl Iterator for ContentParser<'_> {
    type Item = Operation;

    fn next(&mut self) -> Option<Operation> {
        loop {
            let (pos, token) = match self.lexer.next_token() {
                Some(Ok(t)) => t,
                Some(Err(e)) => {
                    tracing::trace!(error = %e, "content token skipped");
                    continue;
                }
                None => {
                    if !self.operands.is_empty() || !self.context_stack.is_empty() {
                        tracing::trace!(
                            operands = self.operands.len(),
                            "trailing operands without operator dropped"
                        );
                    }
                    return None;
                }
            };

            match token {
                Token::Integer(v) => self.push_operand(Operand::Integer(v)),
                Token::Real(v) => self.push_operand(Operand::Real(v)),
                Token::Bool(v) => self.push_operand(Operand::Bool(v)),
                Token::Null => self.push_operand(Operand::Null),
                Token::Name(n) => self.push_operand(Operand::Name(n)),
                Token::Str(s) => self.push_operand(Operand::Str(s)),
                Token::ArrayStart => self.context_stack.push(Context::Array(Vec::new())),
                Token::DictStart => self.context_stack.push(Context::Dict(Vec::new())),
                Token::ArrayEnd => match self.context_stack.pop() {
                    Some(Context::Array(items)) => self.push_operand(Operand::Array(items)),
                    other => {
                        self.context_stack.extend(other);
                        tracing::trace!(pos, "unbalanced ']' skipped");
                    }
                },
                Token::DictEnd => match self.context_stack.pop() {
                    Some(Context::Dict(items)) => {
                        let dict = Self::build_dict(items);
                        self.push_operand(Operand::Dict(dict));
                    }
                    other => {
                        self.context_stack.extend(other);
                        tracing::trace!(pos, "unbalanced '>>' skipped");
                    }
                },
                Token::Keyword(kw) => {
                    if !self.context_stack.is_empty() {
                        tracing::trace!(pos, keyword = %kw, "keyword inside array skipped");
                        continue;
                    }
                    match kw.as_str() {
                        "BI" => {
                            self.in_inline_dict = true;
                            self.operands.clear();
                        }
                        "ID" if self.in_inline_dict => return Some(self.inline_image()),
                        _ if self.in_inline_dict => {
                            tracing::trace!(pos, keyword = %kw, "keyword in inline image skipped");
                        }
                        _ => {
                            let operands = std::mem::take(&mut self.operands);
                            return Some(Operation::new(kw, operands));
                        }
                    }
                }
            }
        }
    }
}

/// Parses a whole content stream into operations.
pub fn parse_content(data: &[u8]) -> Vec<Operation> {
    ContentParser::new(data).collect()
}

//! Argument parser - Turns a tokenized command tail into typed values

use std::collections::HashMap;

use crate::application::errors::ArgumentError;

/// Parameter type that absorbs surplus tokens when it comes last
pub const STRING_TYPE: &str = "string";

/// A parsed argument
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

/// Converts one token into a value; the error string is the reason shown
/// to the caller
pub type ScalarParser = fn(&str) -> Result<ArgValue, String>;

/// Parsed arguments in parameter order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<ArgValue>,
}

impl Arguments {
    pub fn new(values: Vec<ArgValue>) -> Self {
        Self { values }
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        match self.values.get(index) {
            Some(ArgValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn integer(&self, index: usize) -> Option<i64> {
        match self.values.get(index) {
            Some(ArgValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn boolean(&self, index: usize) -> Option<bool> {
        match self.values.get(index) {
            Some(ArgValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_inner(self) -> Vec<ArgValue> {
        self.values
    }
}

/// Split a command tail on whitespace
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(|s| s.to_string()).collect()
}

/// Typed argument parser with a registry of scalar parsers
pub struct ArgumentParser {
    parsers: HashMap<String, ScalarParser>,
}

impl ArgumentParser {
    /// Parser with `string`, `int`, `float` and `bool` registered
    pub fn new() -> Self {
        let mut parser = Self {
            parsers: HashMap::new(),
        };
        parser.register(STRING_TYPE, |token| Ok(ArgValue::Text(token.to_string())));
        parser.register("int", |token| {
            token
                .parse::<i64>()
                .map(ArgValue::Integer)
                .map_err(|e| e.to_string())
        });
        parser.register("float", |token| {
            token
                .parse::<f64>()
                .map(ArgValue::Float)
                .map_err(|e| e.to_string())
        });
        parser.register("bool", |token| {
            token
                .parse::<bool>()
                .map(ArgValue::Bool)
                .map_err(|e| e.to_string())
        });
        parser
    }

    /// Register (or replace) a scalar parser for a type name
    pub fn register(&mut self, type_name: impl Into<String>, parser: ScalarParser) {
        self.parsers.insert(type_name.into(), parser);
    }

    /// Parse `tokens` against `types`
    ///
    /// Surplus tokens are joined with single spaces into the last parameter,
    /// but only when that parameter is a `string`.
    pub fn parse<S: AsRef<str>>(
        &self,
        tokens: &[String],
        types: &[S],
    ) -> Result<Arguments, ArgumentError> {
        if tokens.len() < types.len() {
            return Err(ArgumentError::Insufficient {
                expected: types.len(),
                got: tokens.len(),
            });
        }

        let mut tokens = tokens.to_vec();
        if tokens.len() > types.len() {
            match types.last().map(|t| t.as_ref()) {
                Some(STRING_TYPE) => {
                    let last = types.len() - 1;
                    let joined = tokens[last..].join(" ");
                    tokens.truncate(last);
                    tokens.push(joined);
                }
                _ => {
                    return Err(ArgumentError::TooMany {
                        expected: types.len(),
                        got: tokens.len(),
                    })
                }
            }
        }

        let mut values = Vec::with_capacity(types.len());
        for (token, ty) in tokens.iter().zip(types) {
            let ty = ty.as_ref();
            let parser = self
                .parsers
                .get(ty)
                .ok_or_else(|| ArgumentError::UnknownType(ty.to_string()))?;
            let value = parser(token).map_err(|reason| ArgumentError::Invalid {
                ty: ty.to_string(),
                token: token.clone(),
                reason,
            })?;
            values.push(value);
        }

        Ok(Arguments::new(values))
    }
}

impl Default for ArgumentParser {
    fn default() -> Self {
        Self::new()
    }
}

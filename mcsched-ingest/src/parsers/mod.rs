//! Parsers for the four whitespace-delimited input files.

pub mod allocation;
pub mod core_config;
pub mod exec_times;
pub mod task_list;

use anyhow::{Result, bail};
use std::str::FromStr;

/// Scanner over a whitespace-delimited number file.
pub(crate) struct TokenReader<'a> {
    tokens: std::str::SplitWhitespace<'a>,
    consumed: usize,
}

impl<'a> TokenReader<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self { tokens: text.split_whitespace(), consumed: 0 }
    }

    pub(crate) fn next<T>(&mut self, what: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let Some(token) = self.tokens.next() else {
            bail!("unexpected end of input while reading {what} (token {})", self.consumed + 1);
        };
        self.consumed += 1;
        match token.parse() {
            Ok(value) => Ok(value),
            Err(err) => bail!("invalid {what} '{token}' (token {}): {err}", self.consumed),
        }
    }

    pub(crate) fn is_exhausted(&mut self) -> bool {
        self.tokens.clone().next().is_none()
    }
}

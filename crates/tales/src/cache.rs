//! A thread-safe cache of parsed expressions, shared between renders.

use crate::ast::Expression;
use crate::error::TalesError;
use crate::parser::parse_expression;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Default)]
pub struct ExpressionCache {
    entries: RwLock<HashMap<String, Arc<Expression>>>,
}

impl ExpressionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the parsed form of `text`, parsing it on first use.
    /// Parse failures are not cached.
    pub fn get_or_parse(&self, text: &str) -> Result<Arc<Expression>, TalesError> {
        if let Some(hit) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(text)
        {
            return Ok(Arc::clone(hit));
        }
        let parsed = Arc::new(parse_expression(text)?);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(entries.entry(text.to_string()).or_insert(parsed)))
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

//! Member resolution for path traversal.
//!
//! Each path segment after the first is looked up on the current value by a
//! [`ValueResolver`], which tries its strategies in order: aliased member,
//! normal member, then indexer. The first strategy that finds something wins.

use crate::error::TalesError;
use crate::value::Value;
use std::fmt;

pub trait MemberStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when this strategy has nothing for `segment`.
    fn resolve(&self, target: &Value, segment: &str) -> Result<Option<Value>, TalesError>;
}

/// Explicitly aliased members of host objects.
#[derive(Debug, Default)]
pub struct AliasedMemberStrategy;

impl MemberStrategy for AliasedMemberStrategy {
    fn name(&self) -> &'static str {
        "aliased-member"
    }

    fn resolve(&self, target: &Value, segment: &str) -> Result<Option<Value>, TalesError> {
        match target {
            Value::Object(obj) => obj.aliased_member(segment),
            _ => Ok(None),
        }
    }
}

/// Named members: host object members and the built-in members of sequences and strings.
#[derive(Debug, Default)]
pub struct NormalMemberStrategy;

impl MemberStrategy for NormalMemberStrategy {
    fn name(&self) -> &'static str {
        "member"
    }

    fn resolve(&self, target: &Value, segment: &str) -> Result<Option<Value>, TalesError> {
        match (target, segment) {
            (Value::Object(obj), _) => obj.member(segment),
            (Value::List(items), "length") => Ok(Some(Value::from(items.len()))),
            (Value::String(s), "length") => Ok(Some(Value::from(s.chars().count()))),
            (Value::Macro(m), "name") => Ok(Some(Value::from(m.name.as_str()))),
            _ => Ok(None),
        }
    }
}

/// Keyed lookup: map keys, numeric list positions and host indexers.
#[derive(Debug, Default)]
pub struct IndexerStrategy;

impl MemberStrategy for IndexerStrategy {
    fn name(&self) -> &'static str {
        "indexer"
    }

    fn resolve(&self, target: &Value, segment: &str) -> Result<Option<Value>, TalesError> {
        match target {
            Value::Map(entries) => Ok(entries.get(segment).cloned()),
            Value::List(items) => Ok(segment
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .cloned()),
            Value::Object(obj) => obj.index(segment),
            _ => Ok(None),
        }
    }
}

pub struct ValueResolver {
    strategies: Vec<Box<dyn MemberStrategy>>,
}

impl Default for ValueResolver {
    fn default() -> Self {
        Self::new(vec![
            Box::new(AliasedMemberStrategy),
            Box::new(NormalMemberStrategy),
            Box::new(IndexerStrategy),
        ])
    }
}

impl fmt::Debug for ValueResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.strategies.iter().map(|s| s.name()))
            .finish()
    }
}

impl ValueResolver {
    pub fn new(strategies: Vec<Box<dyn MemberStrategy>>) -> Self {
        Self { strategies }
    }

    /// Resolves `segment` on `target`, failing when no strategy finds it.
    pub fn resolve(&self, target: &Value, segment: &str) -> Result<Value, TalesError> {
        if matches!(target, Value::Null | Value::Default) {
            return Err(TalesError::Traversal {
                segment: segment.to_string(),
                message: format!("cannot traverse into {}", target.type_name()),
            });
        }
        for strategy in &self.strategies {
            if let Some(found) = strategy.resolve(target, segment)? {
                log::trace!("'{}' resolved by {} strategy", segment, strategy.name());
                return Ok(found);
            }
        }
        Err(TalesError::Traversal {
            segment: segment.to_string(),
            message: format!("no member, alias or key on {} value", target.type_name()),
        })
    }
}

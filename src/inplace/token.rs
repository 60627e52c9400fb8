//! Storage names for mathematical values.

use crate::error::{GraphError, Result};
use crate::graph::Variable;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A mathematical value bound to a named storage location.
///
/// The expression carries the mathematical meaning; the token is the variable
/// name of the buffer holding it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExprToken<V> {
    pub expr: V,
    pub token: String,
}

impl<V> ExprToken<V> {
    pub fn new(expr: V, token: impl Into<String>) -> Self {
        Self {
            expr,
            token: token.into(),
        }
    }

    /// Names starting with `_` were generated for values without a name.
    pub fn is_anonymous(&self) -> bool {
        self.token.starts_with('_')
    }
}

impl<V: Variable> Variable for ExprToken<V> {
    fn name(&self) -> Option<String> {
        Some(self.token.clone())
    }
}

impl<V: fmt::Display> fmt::Display for ExprToken<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.expr, self.token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TokenKey<V> {
    Value(V),
    /// The scratch buffer a copy of `source` writes for `target`.
    Copy { source: V, target: V },
}

/// Per-compilation storage name allocator.
///
/// A value always receives the same name, and a name is never given to two
/// values. On collision the name gets a numeric suffix starting at `_2`.
#[derive(Debug, Clone)]
pub struct Tokenizer<V> {
    cache: HashMap<TokenKey<V>, String>,
    issued: HashSet<String>,
}

impl<V: Variable> Default for Tokenizer<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Variable> Tokenizer<V> {
    pub fn new() -> Self {
        // The empty name is reserved so anonymous values start at `_2`.
        Self {
            cache: HashMap::new(),
            issued: HashSet::from([String::new()]),
        }
    }

    /// The storage name of `value`, derived from its display name.
    pub fn name_of(&mut self, value: &V) -> Result<String> {
        self.allocate(TokenKey::Value(value.clone()), value.name())
    }

    /// The storage name of `value` when the caller has a preferred name.
    pub fn name_of_requested(&mut self, value: &V, requested: &str) -> Result<String> {
        self.allocate(TokenKey::Value(value.clone()), Some(requested.to_string()))
    }

    pub fn token(&mut self, value: &V) -> Result<ExprToken<V>> {
        let name = self.name_of(value)?;
        Ok(ExprToken::new(value.clone(), name))
    }

    /// The name of the scratch buffer that copies `source` on behalf of `target`.
    pub fn name_of_copy(&mut self, source: &V, target: &V, requested: Option<&str>) -> Result<String> {
        let key = TokenKey::Copy {
            source: source.clone(),
            target: target.clone(),
        };
        self.allocate(key, requested.map(str::to_string))
    }

    /// Number of names handed out so far.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn allocate(&mut self, key: TokenKey<V>, requested: Option<String>) -> Result<String> {
        if let Some(name) = self.cache.get(&key) {
            return Ok(name.clone());
        }

        let base = requested.unwrap_or_default();
        let mut name = base.clone();
        if self.issued.contains(&name) {
            let mut id = 2;
            while self.issued.contains(&format!("{}_{}", base, id)) {
                id += 1;
            }
            name = format!("{}_{}", base, id);
        }

        if !self.issued.insert(name.clone()) {
            return Err(GraphError::NameCollision { name });
        }
        self.cache.insert(key, name.clone());
        Ok(name)
    }
}

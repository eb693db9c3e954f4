//! The run's token catalogue.
//!
//! Tokens are the objects agents hold, endorse and value.  The catalogue is
//! fixed at world initialization; `TokenId(i)` indexes `tokens[i]`.

use serde::{Deserialize, Serialize};

use crv_core::TokenId;

/// One token in the catalogue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenSpec {
    pub id:    TokenId,
    /// Category used in offline policy keys (e.g. `"badge"`).
    pub kind:  String,
    pub label: String,
}

/// Ordered catalogue of tokens.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenCatalog {
    tokens: Vec<TokenSpec>,
}

impl TokenCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a token and return its id.
    pub fn add(&mut self, kind: impl Into<String>, label: impl Into<String>) -> TokenId {
        let id = TokenId(self.tokens.len() as u32);
        self.tokens.push(TokenSpec { id, kind: kind.into(), label: label.into() });
        id
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, kind: impl Into<String>, label: impl Into<String>) -> Self {
        self.add(kind, label);
        self
    }

    pub fn get(&self, id: TokenId) -> Option<&TokenSpec> {
        self.tokens.get(id.index())
    }

    #[inline]
    pub fn contains(&self, id: TokenId) -> bool {
        id.index() < self.tokens.len()
    }

    /// Tokens in id order.
    pub fn iter(&self) -> impl Iterator<Item = &TokenSpec> {
        self.tokens.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = TokenId> + '_ {
        self.tokens.iter().map(|t| t.id)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

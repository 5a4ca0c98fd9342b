// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Query language
//!
//! A query is a disjunction of conjunctions over component presence:
//!
//! ```text
//! query  := clause (' | ' clause)*
//! clause := term (' & ' term)*
//! term   := '!'? key
//! ```
//!
//! Text is parsed once into a [`CompiledQuery`] whose clauses and terms are
//! sorted, so two spellings of the same clause/term sets compare equal. The
//! empty string compiles to the empty query, which matches every entity.

use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroUsize;

use lru::LruCache;
use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest::Parser;
use serde::Serialize;
use smallvec::SmallVec;

use crate::component::ComponentBag;
use crate::error::{Result, ZooError};

use self::grammar::{QueryParser, Rule};

mod grammar {
    use pest_derive::Parser;

    #[derive(Parser)]
    #[grammar = "query.pest"]
    pub(super) struct QueryParser;
}

/// One `key` or `!key` term
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Term {
    key: String,
    negated: bool,
}

impl Term {
    pub fn new(key: impl Into<String>, negated: bool) -> Self {
        Self {
            key: key.into(),
            negated,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    fn holds(&self, present: bool) -> bool {
        present != self.negated
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "!{}", self.key)
        } else {
            f.write_str(&self.key)
        }
    }
}

/// AND of terms, sorted and free of duplicates
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Clause {
    terms: SmallVec<[Term; 4]>,
}

impl Clause {
    fn from_terms(mut terms: SmallVec<[Term; 4]>) -> Self {
        terms.sort();
        terms.dedup();
        Self { terms }
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    fn holds_by<P: Fn(&str) -> bool>(&self, has: &P) -> bool {
        self.terms.iter().all(|term| term.holds(has(&term.key)))
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" & ")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

/// Normalized OR-of-ANDs query
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CompiledQuery {
    clauses: Vec<Clause>,
}

impl CompiledQuery {
    /// Query that matches every entity
    pub fn everything() -> Self {
        Self::default()
    }

    fn from_clauses(mut clauses: Vec<Clause>) -> Self {
        // Exact duplicates collapse; `a | a & b` is left alone.
        clauses.sort();
        clauses.dedup();
        Self { clauses }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// True for the empty query
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Does any term mention `key`?
    pub fn references(&self, key: &str) -> bool {
        self.clauses
            .iter()
            .flat_map(|clause| clause.terms.iter())
            .any(|term| term.key == key)
    }

    /// Every key the query mentions
    pub fn keys(&self) -> BTreeSet<&str> {
        self.clauses
            .iter()
            .flat_map(|clause| clause.terms.iter())
            .map(|term| term.key.as_str())
            .collect()
    }

    /// Match against an entity's bag
    pub fn matches(&self, bag: &ComponentBag) -> bool {
        self.matches_by(|key| bag.contains(key))
    }

    /// Match against any presence oracle.
    pub fn matches_by<P: Fn(&str) -> bool>(&self, has: P) -> bool {
        if self.clauses.is_empty() {
            return true;
        }
        self.clauses.iter().any(|clause| clause.holds_by(&has))
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}

/// Parse query text into its normalized form.
pub fn parse_query(text: &str) -> Result<CompiledQuery> {
    let mut pairs = QueryParser::parse(Rule::query, text).map_err(|e| {
        let column = match e.line_col {
            LineColLocation::Pos((_, col)) | LineColLocation::Span((_, col), _) => col,
        };
        ZooError::MalformedQuery {
            system: None,
            query: text.to_string(),
            reason: format!("{} at column {column}", e.variant.message()),
        }
    })?;

    let mut clauses = Vec::new();
    if let Some(query) = pairs.next() {
        for inner in query.into_inner() {
            if inner.as_rule() == Rule::clause {
                clauses.push(parse_clause(inner));
            }
        }
    }

    Ok(CompiledQuery::from_clauses(clauses))
}

fn parse_clause(pair: Pair<Rule>) -> Clause {
    let mut terms = SmallVec::new();
    for term in pair.into_inner() {
        let mut negated = false;
        let mut key = "";
        for part in term.into_inner() {
            match part.as_rule() {
                Rule::negation => negated = true,
                Rule::key => key = part.as_str(),
                _ => {}
            }
        }
        terms.push(Term::new(key, negated));
    }
    Clause::from_terms(terms)
}

/// Query cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryCacheStats {
    pub cached: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

/// LRU of compiled queries keyed by their source text
pub struct QueryCache {
    entries: LruCache<String, CompiledQuery>,
    hits: u64,
    misses: u64,
}

impl QueryCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Compile `text`, reusing an earlier parse of the same string.
    pub fn compile(&mut self, text: &str) -> Result<CompiledQuery> {
        if let Some(query) = self.entries.get(text) {
            self.hits += 1;
            return Ok(query.clone());
        }

        self.misses += 1;
        let query = parse_query(text)?;
        self.entries.put(text.to_string(), query.clone());
        Ok(query)
    }

    pub fn stats(&self) -> QueryCacheStats {
        QueryCacheStats {
            cached: self.entries.len(),
            capacity: self.entries.cap().get(),
            hits: self.hits,
            misses: self.misses,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

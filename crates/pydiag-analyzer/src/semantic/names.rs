//! Flat, scope-insensitive collection of the names a snippet defines.

use std::collections::HashSet;

use pydiag_common::Span;
use tracing::debug;

use crate::ast::{walk, Alias, Ast, ExprContext, ParamKind, Visitor};

use super::builtins::SeedNames;

/// Names known to be defined during one analysis. Only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinedNames {
    names: HashSet<String>,
}

impl DefinedNames {
    pub fn from_seed(seed: &SeedNames) -> Self {
        Self {
            names: seed.iter().map(str::to_string).collect(),
        }
    }

    /// Returns `true` if the name was not known before.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Collects every name a parsed snippet binds anywhere: assignment and loop
/// targets, `def`/`class` names, parameters, imports, `except ... as` names,
/// `match` captures and type parameters.
pub struct NameCollector {
    names: DefinedNames,
}

impl NameCollector {
    pub fn new(seed: &SeedNames) -> Self {
        Self {
            names: DefinedNames::from_seed(seed),
        }
    }

    /// Walk `ast` and return the names found. A walk that stops early still
    /// returns everything gathered up to that point.
    pub fn collect(mut self, ast: &Ast) -> DefinedNames {
        if let Err(err) = walk(ast, &mut self) {
            debug!(error = %err, collected = self.names.len(), "name collection stopped early");
        }
        self.names
    }

    fn add_alias(&mut self, alias: &Alias) {
        if let Some(asname) = &alias.asname {
            self.names.insert(asname.as_str());
        }
    }
}

impl Visitor for NameCollector {
    fn visit_name(&mut self, id: &str, ctx: ExprContext, _span: Span) {
        if ctx == ExprContext::Store {
            self.names.insert(id);
        }
    }

    fn visit_function_def(&mut self, name: &str, _span: Span) {
        self.names.insert(name);
    }

    fn visit_class_def(&mut self, name: &str, _span: Span) {
        self.names.insert(name);
    }

    fn visit_parameter(&mut self, name: &str, _kind: ParamKind) {
        self.names.insert(name);
    }

    fn visit_import(&mut self, names: &[Alias]) {
        for alias in names {
            // `import os.path` binds `os`
            if let Some((top, _)) = alias.name.split_once('.') {
                self.names.insert(top);
            }
            self.names.insert(alias.name.as_str());
            self.add_alias(alias);
        }
    }

    fn visit_import_from(&mut self, _module: Option<&str>, names: &[Alias]) {
        for alias in names.iter().filter(|alias| alias.name != "*") {
            self.names.insert(alias.name.as_str());
            self.add_alias(alias);
        }
    }

    fn visit_except_handler(&mut self, name: &str) {
        self.names.insert(name);
    }

    fn visit_match_capture(&mut self, name: &str) {
        self.names.insert(name);
    }

    fn visit_type_param(&mut self, name: &str) {
        self.names.insert(name);
    }
}

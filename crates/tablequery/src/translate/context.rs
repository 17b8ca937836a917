//! Per-translation state: bound parameters and virtual table nesting.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tablequery_core::{IdAndVersion, ParameterValue};

use crate::ast::Expr;
use crate::error::{TranslateError, TranslateResult};
use crate::naming;

/// Values bound to the `:b{N}` placeholders of a translated statement, in
/// binding order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: Vec<(String, ParameterValue)>,
}

impl Parameters {
    /// Creates an empty binding.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value` to the next placeholder and returns its name.
    pub fn bind(&mut self, value: ParameterValue) -> String {
        let name = naming::bind_name(self.values.len());
        self.values.push((name.clone(), value));
        name
    }

    /// The value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Number of bound values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Placeholder names and values, in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// The binding as a map.
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, ParameterValue> {
        self.values.iter().cloned().collect()
    }
}

impl Serialize for Parameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// State threaded through one translation, including the nested translation
/// of virtual table definitions.
#[derive(Debug)]
pub struct TranslationContext {
    parameters: Parameters,
    virtual_tables: Vec<IdAndVersion>,
    user_id: i64,
}

impl TranslationContext {
    /// Creates the context for a query run by `user_id`.
    #[must_use]
    pub fn new(user_id: i64) -> Self {
        Self { parameters: Parameters::new(), virtual_tables: Vec::new(), user_id }
    }

    /// The id of the user running the query.
    #[must_use]
    pub const fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Binds `value` and returns the placeholder expression.
    pub fn bind(&mut self, value: ParameterValue) -> Expr {
        Expr::Parameter(self.parameters.bind(value))
    }

    /// Records that the definition of a virtual table is being expanded.
    ///
    /// # Errors
    ///
    /// Returns an error if it already is, which means the definitions form a
    /// cycle.
    pub fn enter_virtual_table(&mut self, id: IdAndVersion) -> TranslateResult<()> {
        if self.virtual_tables.contains(&id) {
            let chain: Vec<String> = self.virtual_tables.iter().map(ToString::to_string).collect();
            return Err(TranslateError::Configuration(format!(
                "Virtual table {id} depends on itself: {} -> {id}",
                chain.join(" -> ")
            )));
        }
        self.virtual_tables.push(id);
        Ok(())
    }

    /// Records that the definition most recently entered has been expanded.
    pub fn leave_virtual_table(&mut self) {
        self.virtual_tables.pop();
    }

    /// The values bound so far.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Consumes the context, returning the bound values.
    #[must_use]
    pub fn into_parameters(self) -> Parameters {
        self.parameters
    }
}

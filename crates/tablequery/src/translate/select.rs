//! Output schema of a query.
//!
//! Every select item is described by a [`ColumnModel`] before its names are
//! rewritten: the name the caller sees, the inferred type, and the id of the
//! stored column it reads when there is exactly one.

use tablequery_core::{ColumnId, ColumnModel, ColumnType, SelectColumn};

use crate::ast::{CastTarget, Expr, SelectItem};
use crate::mapper::TableAndColumnMapper;
use crate::schema::SchemaProvider;

use super::types::TypeInference;

/// Describes the select items of one query specification.
pub struct SelectAnalysis<'a> {
    mapper: &'a TableAndColumnMapper,
    provider: &'a dyn SchemaProvider,
}

impl<'a> SelectAnalysis<'a> {
    /// Creates an analysis over the tables bound by `mapper`.
    #[must_use]
    pub fn new(mapper: &'a TableAndColumnMapper, provider: &'a dyn SchemaProvider) -> Self {
        Self { mapper, provider }
    }

    /// The output column of `item`.
    ///
    /// A bare column keeps its id only when it is selected under its own
    /// name. Otherwise the first `CAST(x AS {column id})` in the expression
    /// supplies the id, and an unaliased top-level cast also that column's
    /// name. Sizes are copied from the source column.
    #[must_use]
    pub fn describe(&self, item: &SelectItem) -> ColumnModel {
        let column_type =
            TypeInference::new(self.mapper, self.provider).infer(&item.expr).unwrap_or(ColumnType::String);

        let (name, source) = match (&item.alias, &item.expr) {
            (Some(alias), expr) => (alias.name.clone(), self.cast_source(expr)),
            (None, Expr::Column(column)) => {
                let name = column.unquoted_text();
                let source = self
                    .mapper
                    .resolve(column)
                    .ok()
                    .flatten()
                    .and_then(|r| r.schema_column())
                    .filter(|c| c.model.name() == column.name.name)
                    .map(|c| c.model.clone());
                (name, source)
            }
            (None, Expr::Cast { target: CastTarget::ColumnId(id), .. }) => {
                let source = self.provider.get_column_model(*id);
                let name = source.as_ref().map_or_else(|| item.expr.to_string(), |m| m.name().to_string());
                (name, source)
            }
            (None, expr) => (expr.to_string(), self.cast_source(expr)),
        };

        let mut model = ColumnModel::computed(name, column_type);
        if let Some(source) = source {
            model = model.with_id(source.id());
            if let Some(max_size) = source.max_size() {
                model = model.with_max_size(max_size);
            }
            if let Some(max_list_length) = source.max_list_length() {
                model = model.with_max_list_length(max_list_length);
            }
        }
        model
    }

    /// The column named by the first `CAST` to a column id, in pre-order.
    fn cast_source(&self, expr: &Expr) -> Option<ColumnModel> {
        let mut target: Option<ColumnId> = None;
        expr.walk(&mut |e| {
            if let (None, Expr::Cast { target: CastTarget::ColumnId(id), .. }) = (target, e) {
                target = Some(*id);
            }
        });
        target.and_then(|id| self.provider.get_column_model(id))
    }
}

/// Widens the first part's schema so each position holds the largest value
/// any part can produce there.
#[must_use]
pub fn widen_union(parts: Vec<Vec<ColumnModel>>) -> Vec<ColumnModel> {
    let mut parts = parts.into_iter();
    let Some(first) = parts.next() else {
        return Vec::new();
    };
    parts.fold(first, |widest, part| {
        widest
            .into_iter()
            .enumerate()
            .map(|(index, model)| {
                let other = part.get(index).and_then(ColumnModel::max_size);
                match (model.max_size(), other) {
                    (Some(current), Some(other)) if other > current => model.with_max_size(other),
                    (None, Some(other)) => model.with_max_size(other),
                    _ => model,
                }
            })
            .collect()
    })
}

/// The select columns reported to the caller.
///
/// Ids are only reported when every column has one and rows map one-to-one
/// to stored rows.
#[must_use]
pub fn select_columns(schema: &[ColumnModel], is_aggregated: bool) -> Vec<SelectColumn> {
    let keep_ids = !is_aggregated && schema.iter().all(|m| m.id().is_some());
    schema
        .iter()
        .map(|model| SelectColumn {
            name: model.name().to_string(),
            column_type: model.column_type(),
            id: if keep_ids { model.id() } else { None },
        })
        .collect()
}

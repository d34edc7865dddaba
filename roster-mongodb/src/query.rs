//! Filter translation from the roster query AST to MongoDB query syntax.

use bson::{Bson, Document, doc};

use roster_core::{
    error::StoreError,
    query::{Expr, FieldOp, QueryVisitor},
};

/// Translates filter expressions into MongoDB filter documents.
///
/// `Contains` becomes a case-insensitive regex with the pattern text escaped
/// (the value is user input, not a pattern). `Has` becomes `$eq`: MongoDB
/// equality against an array field matches exact element membership, which is
/// precisely the skill-search semantics.
pub(crate) struct MongoQueryTranslator;

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = StoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$not": self.visit_expr(expr)?,
        })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: { "$exists": should_exist },
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$eq": value },
                FieldOp::Ne => doc! { "$ne": value },
                FieldOp::Gt => doc! { "$gt": value },
                FieldOp::Gte => doc! { "$gte": value },
                FieldOp::Lt => doc! { "$lt": value },
                FieldOp::Lte => doc! { "$lte": value },
                FieldOp::Contains => match value {
                    Bson::String(s) => doc! { "$regex": regex::escape(s), "$options": "i" },
                    _ => return Err(StoreError::Backend("Contains operator requires a string value".to_string())),
                },
                FieldOp::Has => doc! { "$eq": value },
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::query::Filter;

    fn translate(expr: Expr) -> Document {
        MongoQueryTranslator.visit_expr(&expr).unwrap()
    }

    #[test]
    fn eq_translates_to_dollar_eq() {
        let filter = translate(Filter::eq("department", "Engineering"));
        assert_eq!(filter, doc! { "department": { "$eq": "Engineering" } });
    }

    #[test]
    fn salary_bounds_translate_to_range_operators() {
        let filter = translate(Filter::and([
            Filter::gte("salary", 50_000.0),
            Filter::lte("salary", 90_000.0),
        ]));
        assert_eq!(
            filter,
            doc! { "$and": [
                { "salary": { "$gte": 50_000.0 } },
                { "salary": { "$lte": 90_000.0 } },
            ] }
        );
    }

    #[test]
    fn contains_escapes_pattern_and_ignores_case() {
        let filter = translate(Filter::contains("name", "an.na"));
        assert_eq!(
            filter,
            doc! { "name": { "$regex": "an\\.na", "$options": "i" } }
        );
    }

    #[test]
    fn contains_rejects_non_string_values() {
        let result = MongoQueryTranslator.visit_expr(&Filter::contains("name", 42));
        assert!(result.is_err());
    }

    #[test]
    fn has_translates_to_plain_equality() {
        let filter = translate(Filter::has("skills", "Go"));
        assert_eq!(filter, doc! { "skills": { "$eq": "Go" } });
    }

    #[test]
    fn exists_translates_both_ways() {
        assert_eq!(
            translate(Filter::exists("joining_date")),
            doc! { "joining_date": { "$exists": true } }
        );
        assert_eq!(
            translate(Filter::not_exists("joining_date")),
            doc! { "joining_date": { "$exists": false } }
        );
    }
}

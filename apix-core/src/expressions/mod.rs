mod predicate;
mod source;

pub use predicate::{parse_predicate, Clause, CompareOp, Literal, Predicate, PredicateError};
pub use source::{
    parse_source_expr, FieldRef, FormatSegment, FormatString, SourceExpr, SourceExprError,
};

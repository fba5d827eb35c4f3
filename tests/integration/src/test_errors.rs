//! Error reporting.

#[cfg(test)]
mod tests {
    use dynaquery_core::{QueryError, QueryErrorCode};
    use serde_json::{Value, json};

    use crate::{compile_filter, compile_index, post_schema};

    fn nested(combinator: &str, depth: usize) -> Value {
        let mut query = json!({"name": "markets"});
        for _ in 0..depth {
            query = json!({ combinator: query });
        }
        query
    }

    #[test]
    fn test_should_report_enum_membership_by_field() {
        let schema = post_schema();
        let err = compile_filter(&schema, json!({"category__equals": 1})).unwrap_err();
        assert!(err.has_code(QueryErrorCode::EnumMembershipError));
        assert_eq!(
            err.to_json(),
            json!({"Query": {"category": ["1 is not member of finance, politics."]}})
        );
    }

    #[test]
    fn test_should_list_available_paths_for_misspelled_field() {
        let schema = post_schema();
        let err = compile_filter(&schema, json!({"tag.type__equals": "news"})).unwrap_err();
        assert_eq!(err.errors().len(), 1);
        let error = &err.errors()[0];
        assert!(matches!(error, QueryError::FieldNotAvailable { .. }));
        assert_eq!(error.field(), Some("tag.type"));
        assert_eq!(
            error.message(),
            "Parameter tag does not exist. Choose some of available: author, author.karma, \
             category, created_at, labels, name, published, sub_name, tags, tags.*, views"
        );
    }

    #[test]
    fn test_should_hide_denylisted_field() {
        let schema = post_schema();
        let err = compile_filter(&schema, json!({"author.email": "a@b.c"})).unwrap_err();
        assert!(err.has_code(QueryErrorCode::FieldNotAvailable));
        assert!(!err.errors()[0].message().contains("author.email"));
    }

    #[test]
    fn test_should_list_operator_vocabulary() {
        let schema = post_schema();
        let err = compile_filter(&schema, json!({"name__like": "mark"})).unwrap_err();
        assert_eq!(
            err.to_json(),
            json!({"Query": {"name": [
                "Operator like does not exist. Choose some of available: equals, contains, \
                 exists, startswith, gt, lt, gte, lte, is_in"
            ]}})
        );
    }

    #[test]
    fn test_should_aggregate_independent_leaf_errors() {
        let schema = post_schema();
        let err = compile_filter(
            &schema,
            json!({
                "views": "lots",
                "published": "maybe",
                "AND": {"created_at__gt": "last week"},
            }),
        )
        .unwrap_err();
        let fields: Vec<_> = err.errors().iter().filter_map(QueryError::field).collect();
        assert_eq!(fields, vec!["created_at", "published", "views"]);
        assert!(
            err.to_json()["Query"]["created_at"][0]
                .as_str()
                .is_some_and(|m| m.contains("Supported formats are"))
        );
    }

    #[test]
    fn test_should_bound_nesting_depth() {
        let schema = post_schema();
        for combinator in ["AND", "OR"] {
            assert!(compile_filter(&schema, nested(combinator, 10)).is_ok());
            let err = compile_filter(&schema, nested(combinator, 11)).unwrap_err();
            assert!(err.has_code(QueryErrorCode::DepthExceeded));
            assert_eq!(
                err.to_json(),
                json!({"Query": ["Maximal query depth has been reached."]})
            );
        }
    }

    #[test]
    fn test_should_reject_null_for_ordering_operators() {
        let schema = post_schema();
        let err = compile_filter(&schema, json!({"views__gt": null})).unwrap_err();
        assert!(err.has_code(QueryErrorCode::ValueTypeError));
        assert_eq!(err.errors()[0].message(), "null is not valid type of views.");
    }

    #[test]
    fn test_should_fail_index_selection_without_key_predicates() {
        let schema = post_schema();
        let err = compile_index(&schema, json!({"views__gt": 1, "tags.type": "news"})).unwrap_err();
        assert!(err.has_code(QueryErrorCode::IndexNotFound));
        assert_eq!(err.to_json(), json!({"Query": ["Could not find index for query."]}));
    }
}

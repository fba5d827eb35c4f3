//! Index selection and indexed query compilation.

#[cfg(test)]
mod tests {
    use dynaquery_core::{CompilerConfig, QueryErrorCode};
    use dynaquery_model::{
        AttributeDescriptor, AttributeValue, EnumValue, IndexHandle, IndexKind, KeyPair, QueryValue,
        Schema,
    };
    use serde_json::json;

    use crate::{compile_filter, compile_index, compile_index_with, post_schema, sample_items};

    fn lenient() -> CompilerConfig {
        CompilerConfig::builder()
            .raise_on_unavailable_field(false)
            .build()
    }

    #[test]
    fn test_should_select_secondary_index_for_category_and_date() {
        let schema = post_schema();
        let query = compile_index(
            &schema,
            json!({
                "category": "finance",
                "created_at__gte": "2019-01-15",
                "tags.type": "opinion",
            }),
        )
        .unwrap();

        assert_eq!(
            query.index,
            IndexHandle::Index {
                name: "category-created_at".to_owned(),
                kind: IndexKind::Global,
            }
        );
        assert_eq!(
            query.hash_key,
            QueryValue::Enum {
                name: "finance".to_owned(),
                value: EnumValue::Number(1),
            }
        );
        assert_eq!(
            query.range_key_condition.as_ref().map(ToString::to_string).as_deref(),
            Some("created_at >= 2019-01-15T00:00:00.000000+00:00")
        );
        assert_eq!(
            query.filter_condition.as_ref().map(ToString::to_string).as_deref(),
            Some("tags.type = opinion")
        );

        let hits: Vec<_> = sample_items()
            .into_iter()
            .filter(|item| query.matches(item))
            .filter_map(|item| item.get("sub_name").and_then(|v| v.as_s().map(str::to_owned)))
            .collect();
        assert_eq!(hits, vec!["2019-02"]);
    }

    #[test]
    fn test_should_select_table_for_primary_key_equality() {
        let schema = post_schema();
        let query = compile_index(
            &schema,
            json!({"name": "markets", "sub_name": "2019-01", "category": "finance"}),
        )
        .unwrap();
        assert_eq!(query.index, IndexHandle::Table);
        assert_eq!(query.hash_key, QueryValue::String("markets".to_owned()));
        assert_eq!(
            query.range_key_condition.as_ref().map(ToString::to_string).as_deref(),
            Some("sub_name = 2019-01")
        );
        assert_eq!(
            query.filter_condition.as_ref().map(ToString::to_string).as_deref(),
            Some("category = finance")
        );
    }

    #[test]
    fn test_should_keep_groups_in_filter() {
        let schema = post_schema();
        let query = compile_index(
            &schema,
            json!({
                "name": "markets",
                "OR": {"views__gt": 100, "tags.type": "news"},
            }),
        )
        .unwrap();
        assert_eq!(query.index, IndexHandle::Table);
        assert_eq!(query.range_key_condition, None);
        assert_eq!(
            query.filter_condition.as_ref().map(ToString::to_string).as_deref(),
            Some("(tags.type = news OR views > 100)")
        );

        let rendered = query.render();
        assert_eq!(rendered.index_name, None);
        assert_eq!(rendered.key_condition_expression, "#n0 = :v0");
        assert_eq!(
            rendered.filter_expression.as_deref(),
            Some("(#n1.#n2 = :v1 OR #n3 > :v2)")
        );
        assert_eq!(rendered.values[":v0"], AttributeValue::S("markets".to_owned()));
    }

    #[test]
    fn test_should_select_deterministically() {
        let schema = post_schema();
        let body = json!({"category": "politics", "name": "elections", "views__gt": 1});
        let first = compile_index(&schema, body.clone()).unwrap();
        for _ in 0..5 {
            assert_eq!(compile_index(&schema, body.clone()).unwrap(), first);
        }
        // Both keys score 1 on equality; the table key is evaluated first.
        assert_eq!(first.index, IndexHandle::Table);
    }

    #[test]
    fn test_should_drop_unknown_fields_in_lenient_indexed_compile() {
        let schema = post_schema();
        let body = json!({
            "category": "finance",
            "created_at__gte": "2019-01-15",
            "nickname": "bob",
        });

        let err = compile_index(&schema, body.clone()).unwrap_err();
        assert!(err.has_code(QueryErrorCode::FieldNotAvailable));
        assert_eq!(err.errors()[0].field(), Some("nickname"));

        let query = compile_index_with(&schema, lenient(), body).unwrap();
        assert_eq!(query.index.index_name(), Some("category-created_at"));
        assert_eq!(query.filter_condition, None);
        assert!(query.range_key_condition.is_some());
    }

    #[test]
    fn test_should_reject_what_filter_rejects_on_hash_field() {
        let schema = post_schema();
        for body in [
            json!({"name": "markets", "name__bogus": 1}),
            json!({"name": "markets", "name__gt": 5}),
            json!({"name": "markets", "name.first": "x"}),
        ] {
            let filter_err = compile_filter(&schema, body.clone()).unwrap_err();
            let index_err = compile_index(&schema, body.clone()).unwrap_err();
            assert_eq!(index_err, filter_err, "{body}");
        }

        // A valid extra predicate on the hash field leaves the hash equality
        // as the only key condition.
        let query = compile_index(&schema, json!({"name": "markets", "name__startswith": "mar"}))
            .unwrap();
        assert_eq!(query.index, IndexHandle::Table);
        assert_eq!(query.hash_key, QueryValue::String("markets".to_owned()));
        assert_eq!(query.filter_condition, None);
    }

    #[test]
    fn test_should_not_use_denylisted_key_field_for_selection() {
        let schema = Schema::builder(KeyPair::hash_range("name", "sub_name"))
            .attribute("name", AttributeDescriptor::String)
            .attribute("sub_name", AttributeDescriptor::String)
            .attribute(
                "category",
                AttributeDescriptor::enumeration(["finance", "politics"]),
            )
            .attribute("created_at", AttributeDescriptor::Timestamp)
            .global_index(
                "category-created_at",
                KeyPair::hash_range("category", "created_at"),
            )
            .deny("category")
            .build()
            .unwrap();
        let body = json!({
            "category": "finance",
            "created_at__gte": "2019-01-15",
            "name": "markets",
        });

        let err = compile_index(&schema, body.clone()).unwrap_err();
        assert!(err.has_code(QueryErrorCode::FieldNotAvailable));
        assert_eq!(err.errors()[0].field(), Some("category"));

        let query = compile_index_with(&schema, lenient(), body).unwrap();
        assert_eq!(query.index, IndexHandle::Table);
        assert_eq!(query.hash_key, QueryValue::String("markets".to_owned()));
        assert_eq!(query.range_key_condition, None);
        assert_eq!(
            query.filter_condition.as_ref().map(ToString::to_string).as_deref(),
            Some("created_at >= 2019-01-15T00:00:00.000000+00:00")
        );

        let err = compile_index_with(&schema, lenient(), json!({"category": "finance"})).unwrap_err();
        assert!(err.has_code(QueryErrorCode::IndexNotFound));
    }
}

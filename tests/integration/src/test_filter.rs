//! Scan filter compilation.

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use dynaquery_core::{CompilerConfig, Condition, Predicate, QueryCompiler, render};
    use dynaquery_model::{AttributeValue, QueryValue, format_timestamp};
    use serde_json::json;

    use crate::{compile_filter, compile_filter_with, matching, post_schema, query};

    fn timestamp_of(condition: &Condition) -> chrono::DateTime<Utc> {
        match condition {
            Condition::Leaf(leaf) => match &leaf.predicate {
                Predicate::Compare(_, QueryValue::Timestamp(ts))
                | Predicate::Equals(QueryValue::Timestamp(ts)) => *ts,
                other => panic!("unexpected predicate {other:?}"),
            },
            Condition::Group { .. } => panic!("expected a leaf"),
        }
    }

    #[test]
    fn test_should_compile_category_and_topic_query() {
        let schema = post_schema();
        let condition = compile_filter(
            &schema,
            json!({
                "category__equals": "finance",
                "OR": {"tags.type__equals": "news", "tags.topics__contains": ["NYSE"]},
            }),
        )
        .unwrap()
        .unwrap();

        assert_eq!(
            condition.to_string(),
            "(category = finance AND (contains(tags.topics, NYSE) OR tags.type = news))"
        );
        assert_eq!(matching(&condition), vec!["markets/2019-01", "markets/2019-02"]);
    }

    #[test]
    fn test_should_return_no_condition_for_empty_queries() {
        let schema = post_schema();
        assert_eq!(compile_filter(&schema, json!({})).unwrap(), None);
        assert_eq!(compile_filter(&schema, json!({"AND": {}, "OR": []})).unwrap(), None);
        assert_eq!(compile_filter(&schema, json!({"OR": {"AND": {}}})).unwrap(), None);
    }

    #[test]
    fn test_should_filter_on_numbers_and_timestamps() {
        let schema = post_schema();
        let condition = compile_filter(
            &schema,
            json!({"views__gte": "100", "created_at__lt": "2020-01-01"}),
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            condition.to_string(),
            "(created_at < 2020-01-01T00:00:00.000000+00:00 AND views >= 100)"
        );
        assert_eq!(matching(&condition), vec!["markets/2019-02"]);
    }

    #[test]
    fn test_should_filter_on_nested_document_fields() {
        let schema = post_schema();
        let condition = compile_filter(&schema, json!({"author.karma__gt": 3}))
            .unwrap()
            .unwrap();
        assert_eq!(condition.to_string(), "author.karma > 3");

        let starts = compile_filter(&schema, json!({"name__startswith": "mark"}))
            .unwrap()
            .unwrap();
        assert_eq!(matching(&starts), vec!["markets/2019-01", "markets/2019-02"]);
    }

    #[test]
    fn test_should_skip_unknown_fields_in_lenient_mode() {
        let schema = post_schema();
        let config = CompilerConfig::builder()
            .raise_on_unavailable_field(false)
            .build();
        let condition = compile_filter_with(
            &schema,
            config,
            json!({"tag.type": "news", "author.email": "x@y.z", "name": "draft"}),
        )
        .unwrap()
        .unwrap();
        assert_eq!(condition.to_string(), "name = draft");

        // Type errors stay fatal.
        let config = CompilerConfig::builder()
            .raise_on_unavailable_field(false)
            .build();
        assert!(compile_filter_with(&schema, config, json!({"views": "many"})).is_err());
    }

    #[test]
    fn test_should_respect_configured_depth() {
        let schema = post_schema();
        let config = CompilerConfig::builder().max_query_depth(1).build();
        let compiler = QueryCompiler::with_config(&schema, config);
        assert!(
            compiler
                .compile_filter(&query(json!({"OR": {"name": "a"}})))
                .is_ok()
        );
        assert!(
            compiler
                .compile_filter(&query(json!({"OR": {"AND": {"name": "a"}}})))
                .is_err()
        );
    }

    #[test]
    fn test_should_match_string_sets_and_booleans() {
        let schema = post_schema();
        let condition = compile_filter(
            &schema,
            json!({"labels__contains": "rust", "published": "TRUE"}),
        )
        .unwrap()
        .unwrap();
        let mut item = crate::item(&json!({"published": true}));
        item.insert(
            "labels".to_owned(),
            AttributeValue::Ss(vec!["rust".to_owned(), "db".to_owned()]),
        );
        assert!(condition.matches(&item));
    }

    #[test]
    fn test_should_render_filter_expression() {
        let schema = post_schema();
        let condition = compile_filter(
            &schema,
            json!({"category__is_in": ["finance", "politics"], "views__not_lt": 10}),
        )
        .unwrap()
        .unwrap();
        let rendered = render(&condition);
        assert_eq!(
            rendered.expression,
            "((#n0 IN (:v0) OR #n0 IN (:v1)) AND (NOT #n1 < :v2))"
        );
        assert_eq!(rendered.names["#n0"], "category");
        assert_eq!(rendered.values[":v1"], AttributeValue::N("2".to_owned()));
    }

    #[test]
    fn test_should_roundtrip_timestamps_in_every_format() {
        let schema = post_schema();
        let instant = Utc.with_ymd_and_hms(2019, 3, 4, 5, 6, 7).unwrap();
        for text in [
            "2019-03-04T05:06:07+00:00",
            "2019-03-04T07:06:07.000+02:00",
            "2019-03-04T05:06:07Z",
            "2019-03-04T05:06:07.000000",
            "2019-03-04 05:06:07",
        ] {
            let condition = compile_filter(&schema, json!({"created_at": text}))
                .unwrap()
                .unwrap();
            let parsed = timestamp_of(&condition);
            assert_eq!(parsed, instant, "{text}");

            let again = compile_filter(&schema, json!({"created_at": format_timestamp(&parsed)}))
                .unwrap()
                .unwrap();
            assert_eq!(timestamp_of(&again), instant, "{text}");
        }
    }
}

//! Logical equivalences between operator forms, checked against stored items.

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::{compile_filter, matching, post_schema, sample_items};

    fn compiled(query: Value) -> dynaquery_core::Condition {
        let schema = post_schema();
        compile_filter(&schema, query)
            .unwrap()
            .unwrap_or_else(|| panic!("query compiled to no condition"))
    }

    #[test]
    fn test_should_match_not_equals_as_negated_equals() {
        let cases = [
            ("name", json!("markets")),
            ("views", json!(250)),
            ("category", json!("politics")),
            ("tags.type", json!("news")),
            ("created_at", json!("2019-01-01")),
        ];
        for (field, value) in cases {
            let positive = compiled(json!({ field: value.clone() }));
            let negative = compiled(json!({ format!("{field}__not_equals"): value }));
            assert_eq!(negative, positive.clone().negate(), "{field}");
            for item in sample_items() {
                assert_eq!(negative.matches(&item), !positive.matches(&item), "{field}");
            }
        }
    }

    #[test]
    fn test_should_expand_is_in_as_or_of_equals() {
        let is_in = compiled(json!({"name__is_in": ["markets", "draft"]}));
        let ored = compiled(json!({"OR": [{"name": "markets"}, {"name": "draft"}]}));
        assert_eq!(is_in.to_string(), "(name IN (markets) OR name IN (draft))");
        assert_eq!(matching(&is_in), matching(&ored));
        assert_eq!(
            matching(&is_in),
            vec!["markets/2019-01", "markets/2019-02", "draft/0"]
        );
    }

    #[test]
    fn test_should_expand_contains_as_and_of_contains() {
        let listed = compiled(json!({"tags.topics__contains": ["NYSE", "NASDAQ"]}));
        let anded = compiled(json!({"AND": [
            {"tags.topics__contains": "NYSE"},
            {"tags.topics__contains": "NASDAQ"},
        ]}));
        assert_eq!(listed, anded);
        assert_eq!(matching(&listed), vec!["markets/2019-01"]);
    }

    #[test]
    fn test_should_treat_equals_null_as_not_exists() {
        let equals_null = compiled(json!({"category": null}));
        let not_exists = compiled(json!({"category__not_exists": true}));
        assert_eq!(equals_null, not_exists);
        assert_eq!(equals_null.to_string(), "attribute_not_exists(category)");
        assert_eq!(matching(&equals_null), vec!["draft/0"]);

        let not_equals_null = compiled(json!({"category__not_equals": null}));
        assert_eq!(not_equals_null.to_string(), "attribute_exists(category)");
        assert_eq!(matching(&not_equals_null).len(), 3);
    }

    #[test]
    fn test_should_negate_groups_with_de_morgan() {
        let negated = compiled(json!({"name__not_is_in": ["markets", "draft"]}));
        assert_eq!(
            negated.to_string(),
            "((NOT name IN (markets)) AND (NOT name IN (draft)))"
        );
        assert_eq!(matching(&negated), vec!["elections/2020-11"]);
    }
}

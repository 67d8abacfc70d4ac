/// Arrow schema definitions for the tabular reports.
pub mod report {
    use arrow::datatypes::{DataType, Field, Schema};

    /// Schema for `rules.csv`: one row per extracted rule.
    pub fn rules_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("service_name", DataType::Utf8, true),
            Field::new("facility_level", DataType::UInt8, true),
            Field::new("tariff_amount", DataType::UInt64, true),
            Field::new("currency", DataType::Utf8, true),
            Field::new("frequency_limit", DataType::Utf8, true),
            Field::new("inclusion_flag", DataType::Utf8, false),
            Field::new("payment_mechanism", DataType::Utf8, false),
            Field::new("page", DataType::UInt32, false),
            Field::new("evidence_snippet", DataType::Utf8, false),
            Field::new("confidence", DataType::Utf8, false),
        ])
    }

    /// Schema for `contradictions.csv`.
    pub fn contradictions_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("kind", DataType::Utf8, false),
            Field::new("rule_id_a", DataType::Utf8, false),
            Field::new("rule_id_b", DataType::Utf8, false),
            Field::new("description", DataType::Utf8, false),
            Field::new("confidence", DataType::Float32, false),
        ])
    }

    /// Schema for `gaps.csv`. `evidence_pages` is `;`-joined.
    pub fn gaps_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("subtype", DataType::Utf8, false),
            Field::new("name", DataType::Utf8, false),
            Field::new("mention_count", DataType::UInt64, false),
            Field::new("treatment_match_count", DataType::UInt64, false),
            Field::new("evidence_pages", DataType::Utf8, false),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::report;

    #[test]
    fn rules_schema_has_expected_fields() {
        let schema = report::rules_schema();
        assert_eq!(schema.fields().len(), 11);
        assert!(schema.field_with_name("evidence_snippet").is_ok());
        assert!(!schema.field_with_name("page").unwrap().is_nullable());
        assert!(schema.field_with_name("tariff_amount").unwrap().is_nullable());
    }

    #[test]
    fn contradictions_schema_has_expected_fields() {
        let schema = report::contradictions_schema();
        assert_eq!(schema.fields().len(), 6);
        assert!(schema.field_with_name("rule_id_b").is_ok());
    }

    #[test]
    fn gaps_schema_has_expected_fields() {
        let schema = report::gaps_schema();
        assert_eq!(schema.fields().len(), 6);
        assert!(schema.field_with_name("treatment_match_count").is_ok());
    }
}

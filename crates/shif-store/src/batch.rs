//! Conversion of rules, contradictions and gaps into Arrow record batches.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array, StringArray, UInt8Array, UInt32Array, UInt64Array};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use shif_core::{Contradiction, ExtractedRule, Gap, report};

/// Rules sorted by page, then id (discovery order within a page).
pub fn rules_batch(rules: &[ExtractedRule]) -> Result<RecordBatch, ArrowError> {
    let mut sorted: Vec<&ExtractedRule> = rules.iter().collect();
    sorted.sort_by(|a, b| a.page.cmp(&b.page).then_with(|| a.id.cmp(&b.id)));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(sorted.iter().map(|r| r.id.as_str()))),
        Arc::new(StringArray::from(
            sorted
                .iter()
                .map(|r| r.service_name.as_deref())
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt8Array::from(
            sorted.iter().map(|r| r.facility_level).collect::<Vec<_>>(),
        )),
        Arc::new(UInt64Array::from(
            sorted.iter().map(|r| r.amount()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            sorted.iter().map(|r| r.currency()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            sorted
                .iter()
                .map(|r| r.frequency.as_ref().map(|f| f.to_string()))
                .collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from_iter_values(
            sorted.iter().map(|r| r.coverage.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            sorted.iter().map(|r| r.payment.as_str()),
        )),
        Arc::new(UInt32Array::from_iter_values(sorted.iter().map(|r| r.page))),
        Arc::new(StringArray::from_iter_values(
            sorted.iter().map(|r| r.evidence.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            sorted.iter().map(|r| r.confidence.as_str()),
        )),
    ];

    RecordBatch::try_new(Arc::new(report::rules_schema()), columns)
}

pub fn contradictions_batch(contradictions: &[Contradiction]) -> Result<RecordBatch, ArrowError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            contradictions.iter().map(|c| c.id.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            contradictions.iter().map(|c| c.kind.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            contradictions.iter().map(|c| c.rule_a.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            contradictions.iter().map(|c| c.rule_b.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            contradictions.iter().map(|c| c.description.as_str()),
        )),
        Arc::new(Float32Array::from_iter_values(
            contradictions.iter().map(|c| c.confidence),
        )),
    ];

    RecordBatch::try_new(Arc::new(report::contradictions_schema()), columns)
}

pub fn gaps_batch(gaps: &[Gap]) -> Result<RecordBatch, ArrowError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(gaps.iter().map(|g| g.id.as_str()))),
        Arc::new(StringArray::from_iter_values(
            gaps.iter().map(|g| g.subtype.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(gaps.iter().map(|g| g.name.as_str()))),
        Arc::new(UInt64Array::from_iter_values(
            gaps.iter().map(|g| g.mention_count as u64),
        )),
        Arc::new(UInt64Array::from_iter_values(
            gaps.iter().map(|g| g.treatment_match_count as u64),
        )),
        Arc::new(StringArray::from_iter_values(
            gaps.iter().map(|g| g.evidence_pages_joined()),
        )),
    ];

    RecordBatch::try_new(Arc::new(report::gaps_schema()), columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use shif_core::{
        Confidence, Coverage, GapSubtype, PaymentMechanism, RuleSource, Tariff,
    };

    fn rule(id: &str, page: u32, amount: Option<u64>) -> ExtractedRule {
        ExtractedRule {
            id: id.into(),
            service_name: Some("MRI".into()),
            facility_level: Some(5),
            tariff: Some(Tariff {
                currency: "KES".into(),
                amount,
            }),
            frequency: None,
            coverage: Coverage::Included,
            payment: PaymentMechanism::FeeForService,
            page,
            evidence: "MRI KES 15,000".into(),
            confidence: Confidence::High,
            source: RuleSource::Text,
        }
    }

    #[test]
    fn rules_sorted_by_page_then_id() {
        let rules = vec![rule("R0003", 2, Some(1)), rule("R0001", 1, Some(2)), rule("R0002", 1, None)];
        let batch = rules_batch(&rules).unwrap();
        assert_eq!(batch.num_rows(), 3);

        let ids = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(ids.value(0), "R0001");
        assert_eq!(ids.value(1), "R0002");
        assert_eq!(ids.value(2), "R0003");

        let amounts = batch
            .column(3)
            .as_any()
            .downcast_ref::<UInt64Array>()
            .unwrap();
        assert!(amounts.is_null(1), "unknown amount should be null");
    }

    #[test]
    fn empty_inputs_produce_empty_batches() {
        assert_eq!(rules_batch(&[]).unwrap().num_rows(), 0);
        assert_eq!(contradictions_batch(&[]).unwrap().num_rows(), 0);
        assert_eq!(gaps_batch(&[]).unwrap().num_rows(), 0);
    }

    #[test]
    fn gap_pages_joined() {
        let gaps = vec![Gap {
            id: "G0001".into(),
            subtype: GapSubtype::DiseaseTreatmentMismatch,
            name: "Hypertension".into(),
            mention_count: 2,
            treatment_match_count: 0,
            evidence_pages: vec![3, 9],
        }];
        let batch = gaps_batch(&gaps).unwrap();
        let pages = batch
            .column(5)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(pages.value(0), "3;9");
    }
}

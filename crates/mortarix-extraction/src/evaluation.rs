//! Set-based evaluation of extraction output against a labelled ground
//! truth. Names are compared exactly; entity-level fuzziness belongs to
//! the labelling, not to this metric.

use std::collections::HashSet;

/// Precision / recall / F1 over extracted material names.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

pub fn evaluate(truth: &[String], predicted: &[String]) -> EvaluationMetrics {
    let truth: HashSet<&str> = truth.iter().map(String::as_str).collect();
    let predicted: HashSet<&str> = predicted.iter().map(String::as_str).collect();

    let tp = truth.intersection(&predicted).count() as f64;
    let fp = predicted.difference(&truth).count() as f64;
    let fn_ = truth.difference(&predicted).count() as f64;

    let precision = if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 };
    let recall = if tp + fn_ > 0.0 { tp / (tp + fn_) } else { 0.0 };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    EvaluationMetrics { precision, recall, f1 }
}

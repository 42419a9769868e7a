use std::cmp::Ordering;

use super::ProcessingTask;

/// `floor(clamp(completeness*5 + confidence*2 - complexity*2, 1, 5))`
pub fn compute_priority(completeness: f64, confidence: f64, complexity: f64) -> u8 {
    let raw = completeness * 5.0 + confidence * 2.0 - complexity * 2.0;
    if raw.is_nan() {
        return 1;
    }
    raw.clamp(1.0, 5.0).floor() as u8
}

/// Relative-ordering heuristic, not a calibrated measure.
pub fn estimate_complexity(result_count: usize, complexity: f64, confidence: f64) -> f64 {
    result_count as f64 * 0.1 + complexity * 0.7 + confidence * 0.2
}

/// Priority descending, then confidence descending, then creation time
/// ascending. The sort is stable, so fully tied tasks keep emission order.
pub fn sort_task_queue(tasks: &mut [ProcessingTask]) {
    tasks.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| {
                b.metadata
                    .confidence
                    .partial_cmp(&a.metadata.confidence)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{TaskContext, TaskType};
    use chrono::Duration;
    use serde_json::Value;

    fn task(priority: u8, confidence: f64) -> ProcessingTask {
        TaskContext::new("c", "keyword", priority, 0.2, confidence, 0.7).task(
            "keyword-expansion",
            TaskType::Enrichment,
            Value::Null,
            &[],
        )
    }

    #[test]
    fn test_priority_bounds() {
        assert_eq!(compute_priority(0.0, 0.0, 1.0), 1);
        assert_eq!(compute_priority(1.0, 1.0, 0.0), 5);
        assert_eq!(compute_priority(0.5, 0.8, 0.3), 3);
        assert_eq!(compute_priority(f64::NAN, 0.5, 0.5), 1);

        for c in 0..=10 {
            for k in 0..=10 {
                let p = compute_priority(c as f64 / 10.0, 0.5, k as f64 / 10.0);
                assert!((1..=5).contains(&p));
            }
        }
    }

    #[test]
    fn test_complexity_estimate() {
        let c = estimate_complexity(3, 0.5, 0.5);
        assert!((c - (0.3 + 0.35 + 0.1)).abs() < 1e-9);
    }

    #[test]
    fn test_sort_order() {
        let mut tasks = vec![task(2, 0.9), task(4, 0.5), task(4, 0.9), task(1, 1.0)];
        sort_task_queue(&mut tasks);
        let order: Vec<(u8, f64)> = tasks
            .iter()
            .map(|t| (t.priority, t.metadata.confidence))
            .collect();
        assert_eq!(order, vec![(4, 0.9), (4, 0.5), (2, 0.9), (1, 1.0)]);
    }

    #[test]
    fn test_created_at_breaks_ties() {
        let mut later = task(4, 0.8);
        let mut earlier = task(4, 0.8);
        earlier.created_at = later.created_at - Duration::seconds(5);
        later.name = "later".to_string();
        earlier.name = "earlier".to_string();

        let mut tasks = vec![later, earlier];
        sort_task_queue(&mut tasks);
        assert_eq!(tasks[0].name, "earlier");
        assert_eq!(tasks[1].name, "later");
    }
}

//! Result ordering and worst-case-wins state normalization.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use courier_core::model::DeliveryResult;

/// Sort results by task name, keeping the emission order within a task.
pub fn sort_by_task(results: &mut [DeliveryResult]) {
    results.sort_by(|a, b| a.task_name().cmp(b.task_name()));
}

/// Propagate the ERROR state across every result sharing a task name.
///
/// A group of more than one result containing any ERROR entry is re-marked
/// as ERROR in full: a partial per-sink failure reads as a whole-task
/// failure to the consumer. Single-entry groups are left untouched.
pub fn normalize_report_state(results: &mut [DeliveryResult]) {
    let mut group_sizes: HashMap<String, usize> = HashMap::new();
    let mut failed_tasks: HashSet<String> = HashSet::new();

    for result in results.iter() {
        let task = result.task_name().to_string();
        *group_sizes.entry(task.clone()).or_default() += 1;
        if result.report_state().eq_ignore_ascii_case("ERROR") {
            failed_tasks.insert(task);
        }
    }

    for result in results.iter_mut() {
        let task = result.task_name();
        if group_sizes.get(task).copied().unwrap_or(0) > 1 && failed_tasks.contains(task) {
            if !result.report_state().eq_ignore_ascii_case("ERROR") {
                debug!("Task '{task}' has a failed sibling, marking the result as ERROR");
            }
            result.set_report_state("ERROR");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::model::ResultFields;

    fn result(task: &str, state: &str) -> DeliveryResult {
        DeliveryResult::File {
            common: ResultFields {
                task_name: task.to_string(),
                success: state != "ERROR",
                message: String::new(),
                report_name: "r".to_string(),
                report_state: state.to_string(),
            },
            copy_path: None,
        }
    }

    #[test]
    fn test_one_failure_marks_the_whole_group() {
        let mut results = vec![
            result("Task 1", "SUCCESS"),
            result("Task 1", "ERROR"),
            result("Task 1", "SUCCESS"),
        ];

        normalize_report_state(&mut results);

        assert!(results.iter().all(|r| r.report_state() == "ERROR"));
    }

    #[test]
    fn test_single_entry_group_is_left_unchanged() {
        let mut results = vec![result("Task 1", "ERROR"), result("Task 2", "SUCCESS")];

        normalize_report_state(&mut results);

        assert_eq!(results[0].report_state(), "ERROR");
        assert_eq!(results[1].report_state(), "SUCCESS");
    }

    #[test]
    fn test_groups_do_not_bleed_into_each_other() {
        let mut results = vec![
            result("Task 1", "ERROR"),
            result("Task 1", "SUCCESS"),
            result("Task 2", "WARNING"),
            result("Task 2", "SUCCESS"),
        ];

        normalize_report_state(&mut results);

        assert_eq!(results[0].report_state(), "ERROR");
        assert_eq!(results[1].report_state(), "ERROR");
        assert_eq!(results[2].report_state(), "WARNING");
        assert_eq!(results[3].report_state(), "SUCCESS");
    }

    #[test]
    fn test_sort_is_stable_within_a_task() {
        let mut results = vec![
            result("Task 2", "SUCCESS"),
            result("Task 1", "first"),
            result("Task 1", "second"),
        ];

        sort_by_task(&mut results);

        assert_eq!(results[0].task_name(), "Task 1");
        assert_eq!(results[0].report_state(), "first");
        assert_eq!(results[1].report_state(), "second");
        assert_eq!(results[2].task_name(), "Task 2");
    }
}

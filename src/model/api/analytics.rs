use std::{collections::HashMap, hash::Hash};

use serde::{Deserialize, Serialize};

use crate::model::db::issue::{Issue, IssueCategory, IssuePriority, IssueStatus};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount<K> {
    #[serde(rename = "_id")]
    pub key: K,
    pub count: u64,
}

/// Count items by key, largest group first.
fn group_by<T, K, F>(items: &[T], key: F) -> Vec<GroupCount<K>>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let mut counts: HashMap<K, u64> = HashMap::new();
    let mut order = Vec::new();
    for item in items {
        let k = key(item);
        let count = counts.entry(k.clone()).or_insert(0);
        if *count == 0 {
            order.push(k);
        }
        *count += 1;
    }
    let mut groups: Vec<_> = order
        .into_iter()
        .map(|k| GroupCount {
            count: counts[&k],
            key: k,
        })
        .collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostelBlock {
    pub hostel: String,
    pub block: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockStatus {
    pub block: String,
    pub status: IssueStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_issues: u64,
    pub open_issues: u64,
    pub resolved_issues: u64,
    pub resolution_rate: f64,
    pub by_category: Vec<GroupCount<IssueCategory>>,
    pub by_priority: Vec<GroupCount<IssuePriority>>,
    pub by_hostel_block: Vec<GroupCount<HostelBlock>>,
    pub avg_response_time_hours: f64,
    pub avg_resolution_time_hours: f64,
}

fn mean(values: &[i64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<i64>() as f64 / values.len() as f64
    }
}

impl DashboardStats {
    /// Summarise `issues`, which should already be limited to public ones.
    ///
    /// Response time runs from the first history entry to the second;
    /// resolution time from the first to the last, when the last is `Resolved`.
    pub fn from_issues(issues: &[Issue]) -> Self {
        let total_issues = issues.len() as u64;
        let open_issues = issues
            .iter()
            .filter(|issue| IssueStatus::OPEN.contains(&issue.status))
            .count() as u64;
        let resolved_issues = issues
            .iter()
            .filter(|issue| issue.status == IssueStatus::Resolved)
            .count() as u64;
        let resolution_rate = if total_issues > 0 {
            round2(resolved_issues as f64 / total_issues as f64 * 100.0)
        } else {
            0.0
        };

        let mut response_times = Vec::new();
        let mut resolution_times = Vec::new();
        for issue in issues {
            let history = &issue.status_history;
            let (Some(first), Some(last)) = (history.first(), history.last()) else {
                continue;
            };
            if let Some(second) = history.get(1) {
                response_times.push((second.timestamp - first.timestamp).num_milliseconds());
            }
            if last.new_status == IssueStatus::Resolved {
                resolution_times.push((last.timestamp - first.timestamp).num_milliseconds());
            }
        }

        Self {
            total_issues,
            open_issues,
            resolved_issues,
            resolution_rate,
            by_category: group_by(issues, |issue| issue.category),
            by_priority: group_by(issues, |issue| issue.priority),
            by_hostel_block: group_by(issues, |issue| HostelBlock {
                hostel: issue.location.hostel.clone(),
                block: issue.location.block.clone(),
            }),
            avg_response_time_hours: round2(mean(&response_times) / MILLIS_PER_HOUR),
            avg_resolution_time_hours: round2(mean(&resolution_times) / MILLIS_PER_HOUR),
        }
    }
}

/// Public issue counts in one hostel, grouped by block and status.
pub fn hostel_breakdown(issues: &[Issue]) -> Vec<GroupCount<BlockStatus>> {
    group_by(issues, |issue| BlockStatus {
        block: issue.location.block.clone(),
        status: issue.status,
    })
}

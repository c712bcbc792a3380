//! Summary statistics over formed groups.
//!
//! [`GroupStats`] describes one group set (count, sizes, mean).
//! [`HistorySummary`] aggregates across every saved formation.
//!
//! Both are plain derived values: computed in one pass, no side effects, and
//! all-zero on empty input.

use crate::store::HistoryEntry;
use crate::student::Group;
use serde::Serialize;
use std::collections::HashSet;

/// Statistics for a single group set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupStats {
    /// Number of groups
    pub group_count: usize,

    /// Students across all groups
    pub student_count: usize,

    /// Size of the smallest group (0 when there are no groups)
    pub min_group_size: usize,

    /// Size of the largest group (0 when there are no groups)
    pub max_group_size: usize,

    /// Mean group size (0.0 when there are no groups)
    pub mean_group_size: f64,

    /// Group sizes in group order
    pub sizes: Vec<usize>,
}

impl GroupStats {
    /// Compute statistics for a group set.
    pub fn from_groups(groups: &[Group]) -> Self {
        if groups.is_empty() {
            return Self::default();
        }

        let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
        let student_count: usize = sizes.iter().sum();

        Self {
            group_count: groups.len(),
            student_count,
            min_group_size: sizes.iter().copied().min().unwrap_or(0),
            max_group_size: sizes.iter().copied().max().unwrap_or(0),
            mean_group_size: student_count as f64 / groups.len() as f64,
            sizes,
        }
    }

    /// True when every group has the same size.
    pub fn is_uniform(&self) -> bool {
        self.min_group_size == self.max_group_size
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n=== Group Summary ===");
        println!("Groups: {}", self.group_count);
        println!("Students: {}", self.student_count);
        println!("Smallest group: {}", self.min_group_size);
        println!("Largest group: {}", self.max_group_size);
        println!("Mean size: {:.2}", self.mean_group_size);
        println!();
    }

    /// Export statistics as `key=value` lines (for parsing/testing).
    pub fn export_text(&self) -> String {
        let sizes: Vec<String> = self.sizes.iter().map(usize::to_string).collect();
        format!(
            "group_count={}\n\
             student_count={}\n\
             min_group_size={}\n\
             max_group_size={}\n\
             mean_group_size={:.4}\n\
             sizes={}\n",
            self.group_count,
            self.student_count,
            self.min_group_size,
            self.max_group_size,
            self.mean_group_size,
            sizes.join(","),
        )
    }
}

/// Totals across the saved history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    pub formations: usize,
    pub total_groups: usize,
    pub total_students: usize,
    /// Distinct student ids seen in any formation
    pub unique_students: usize,
}

impl HistorySummary {
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        let mut unique: HashSet<&str> = HashSet::new();
        let mut summary = Self {
            formations: entries.len(),
            ..Self::default()
        };

        for entry in entries {
            summary.total_groups += entry.groups.len();
            summary.total_students += entry.original_students.len();
            unique.extend(entry.original_students.iter().map(|s| s.id()));
        }

        summary.unique_students = unique.len();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::student::Student;

    fn group(n: usize, offset: usize) -> Group {
        (0..n)
            .map(|i| Student::new((offset + i).to_string(), "Name").unwrap())
            .collect()
    }

    #[test]
    fn test_empty_stats_are_zero() {
        let stats = GroupStats::from_groups(&[]);
        assert_eq!(stats.group_count, 0);
        assert_eq!(stats.student_count, 0);
        assert_eq!(stats.min_group_size, 0);
        assert_eq!(stats.max_group_size, 0);
        assert_eq!(stats.mean_group_size, 0.0);
        assert!(stats.sizes.is_empty());
    }

    #[test]
    fn test_stats_values() {
        let groups = vec![group(3, 0), group(3, 3), group(4, 6)];
        let stats = GroupStats::from_groups(&groups);

        assert_eq!(stats.group_count, 3);
        assert_eq!(stats.student_count, 10);
        assert_eq!(stats.min_group_size, 3);
        assert_eq!(stats.max_group_size, 4);
        assert!((stats.mean_group_size - 10.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.sizes, vec![3, 3, 4]);
        assert!(!stats.is_uniform());
    }

    #[test]
    fn test_export_text() {
        let stats = GroupStats::from_groups(&[group(2, 0), group(2, 2)]);
        let text = stats.export_text();

        assert!(text.contains("group_count=2"));
        assert!(text.contains("mean_group_size=2.0000"));
        assert!(text.contains("sizes=2,2"));
    }
}

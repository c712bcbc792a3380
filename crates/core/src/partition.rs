//! Group partitioner.
//!
//! Splits a roster into fixed-size groups in three steps:
//!
//! 1. **Ordering** by [`Method`]: input order, a random permutation, or the
//!    balanced interleave of id-sorted students
//! 2. **Chunking** into consecutive groups of `group_size`; the last group
//!    holds the remainder
//! 3. **Redistribution** (optional) of students left alone in a group
//!
//! # Determinism
//!
//! Random ordering draws from a ChaCha8 RNG created for the call. Given a
//! seed, the same roster always yields the same groups. Without a seed the
//! RNG is seeded from OS entropy. No shared generator is read or mutated,
//! so concurrent calls never interfere.

use crate::error::ValidationError;
use crate::student::{Group, GroupSet, Student};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How students are ordered before chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Method {
    /// Uniformly random permutation
    #[default]
    #[serde(rename = "Aleatório")]
    Random,
    /// Input order
    #[serde(rename = "Sequencial")]
    Sequential,
    /// Sorted by id, first half interleaved with second half
    #[serde(rename = "Balanceado")]
    Balanced,
}

impl Method {
    pub const ALL: [Method; 3] = [Method::Random, Method::Sequential, Method::Balanced];

    pub fn label(self) -> &'static str {
        match self {
            Method::Random => "Aleatório",
            Method::Sequential => "Sequencial",
            Method::Balanced => "Balanceado",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything the partitioner needs for one run.
#[derive(Debug, Clone)]
pub struct PartitionRequest {
    pub students: Vec<Student>,
    pub group_size: usize,
    pub method: Method,
    pub redistribute_singles: bool,
    pub allow_larger_groups: bool,
    pub seed: Option<u64>,
}

impl PartitionRequest {
    /// Request with redistribution and larger groups enabled, no seed.
    pub fn new(students: Vec<Student>, group_size: usize, method: Method) -> Self {
        Self {
            students,
            group_size,
            method,
            redistribute_singles: true,
            allow_larger_groups: true,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_redistribution(mut self, redistribute_singles: bool, allow_larger_groups: bool) -> Self {
        self.redistribute_singles = redistribute_singles;
        self.allow_larger_groups = allow_larger_groups;
        self
    }

    /// Check the caller-side preconditions.
    ///
    /// Must pass before [`partition`] is invoked; nothing is clamped.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.group_size < 2 {
            return Err(ValidationError::GroupSizeTooSmall {
                group_size: self.group_size,
            });
        }
        if self.students.len() < self.group_size {
            return Err(ValidationError::NotEnoughStudents {
                group_size: self.group_size,
                students: self.students.len(),
            });
        }
        Ok(())
    }
}

/// Partition the request's students into groups.
///
/// Every input student lands in exactly one group and no group is empty.
/// An empty roster yields no groups. A `group_size` of zero is treated as a
/// caller error and also yields no groups; use
/// [`PartitionRequest::validate`] first.
pub fn partition(request: &PartitionRequest) -> GroupSet {
    if request.students.is_empty() || request.group_size == 0 {
        return Vec::new();
    }

    let ordered = order_students(&request.students, request.method, request.seed);
    let mut groups = chunk(ordered, request.group_size);

    tracing::debug!(
        method = %request.method,
        students = request.students.len(),
        group_size = request.group_size,
        groups = groups.len(),
        "chunked roster"
    );

    if request.redistribute_singles {
        groups = redistribute_singles(groups, request.group_size, request.allow_larger_groups);
    }

    groups
}

/// Apply the ordering step.
pub fn order_students(students: &[Student], method: Method, seed: Option<u64>) -> Vec<Student> {
    match method {
        Method::Sequential => students.to_vec(),
        Method::Random => {
            let mut rng = match seed {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            };
            let mut shuffled = students.to_vec();
            shuffled.shuffle(&mut rng);
            shuffled
        }
        Method::Balanced => balanced_order(students),
    }
}

/// Sort by id, then interleave the first half with the second half.
///
/// With `h = ceil(n / 2)`, position `2k` holds `sorted[k]` and `2k + 1`
/// holds `sorted[k + h]`. For odd `n` the one unpaired student of the first
/// half goes last.
fn balanced_order(students: &[Student]) -> Vec<Student> {
    let mut sorted = students.to_vec();
    // Stable, so students sharing an id keep their input order.
    sorted.sort_by(|a, b| a.id().cmp(b.id()));

    let n = sorted.len();
    let half = n.div_ceil(2);
    let (first, second) = sorted.split_at(half);

    let mut out = Vec::with_capacity(n);
    for (a, b) in first.iter().zip(second) {
        out.push(a.clone());
        out.push(b.clone());
    }
    if n % 2 == 1 {
        out.push(first[half - 1].clone());
    }
    out
}

/// Split into consecutive groups of `size`; the last holds the remainder.
fn chunk(students: Vec<Student>, size: usize) -> GroupSet {
    let mut groups = Vec::with_capacity(students.len().div_ceil(size));
    let mut iter = students.into_iter().peekable();
    while iter.peek().is_some() {
        groups.push(iter.by_ref().take(size).collect());
    }
    groups
}

/// Eliminate singleton groups in one backward sweep.
///
/// Groups are visited from last to first. A group with exactly one student
/// is removed and its student joins the smallest other group (earliest
/// index on ties), as long as larger groups are allowed or that group is
/// still below `group_size`. Otherwise the student is put in a new group
/// appended at the end, which the sweep does not revisit. A lone student
/// with no other group to join stays alone.
///
/// Moving a student only grows a group, so no new singletons appear and a
/// single pass suffices.
pub fn redistribute_singles(mut groups: GroupSet, group_size: usize, allow_larger_groups: bool) -> GroupSet {
    let mut i = groups.len();
    while i > 0 {
        i -= 1;
        if groups[i].len() != 1 {
            continue;
        }

        let single = groups.remove(i);
        let Some(target) = smallest_group(&groups) else {
            groups.push(single);
            continue;
        };

        if allow_larger_groups || groups[target].len() < group_size {
            tracing::debug!(from = i, to = target, "moved lone student");
            groups[target].extend(single);
        } else {
            tracing::debug!(from = i, "no room for lone student; kept in its own group");
            groups.push(single);
        }
    }

    groups
}

/// Index of the first group with the fewest students.
fn smallest_group(groups: &[Group]) -> Option<usize> {
    groups
        .iter()
        .enumerate()
        .min_by_key(|(idx, g)| (g.len(), *idx))
        .map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(ids: &[&str]) -> Vec<Student> {
        ids.iter()
            .map(|id| Student::new(*id, format!("Student {id}")).unwrap())
            .collect()
    }

    fn ids(groups: &GroupSet) -> Vec<Vec<String>> {
        groups
            .iter()
            .map(|g| g.iter().map(|s| s.id().to_string()).collect())
            .collect()
    }

    fn sequential(students: Vec<Student>, size: usize) -> PartitionRequest {
        PartitionRequest::new(students, size, Method::Sequential)
    }

    #[test]
    fn test_empty_input() {
        let req = PartitionRequest::new(Vec::new(), 3, Method::Random);
        assert!(partition(&req).is_empty());
    }

    #[test]
    fn test_sequential_keeps_order() {
        let req = sequential(roster(&["1", "2", "3", "4"]), 2);
        assert_eq!(ids(&partition(&req)), vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn test_chunk_remainder_without_redistribution() {
        let req = sequential(roster(&["1", "2", "3", "4", "5", "6", "7"]), 3).with_redistribution(false, true);
        let groups = partition(&req);

        assert_eq!(groups.len(), 3);
        let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[test]
    fn test_balanced_even() {
        let req = PartitionRequest::new(roster(&["3", "1", "4", "2"]), 2, Method::Balanced).with_redistribution(false, true);
        assert_eq!(ids(&partition(&req)), vec![vec!["1", "3"], vec!["2", "4"]]);
    }

    #[test]
    fn test_balanced_odd_puts_unpaired_last() {
        let order = balanced_order(&roster(&["5", "4", "3", "2", "1"]));
        let got: Vec<&str> = order.iter().map(|s| s.id()).collect();
        assert_eq!(got, vec!["1", "4", "2", "5", "3"]);
    }

    #[test]
    fn test_balanced_sorts_lexicographically() {
        let order = balanced_order(&roster(&["10", "9", "2", "1"]));
        let got: Vec<&str> = order.iter().map(|s| s.id()).collect();
        // "1" < "10" < "2" < "9"
        assert_eq!(got, vec!["1", "2", "10", "9"]);
    }

    #[test]
    fn test_random_seed_is_reproducible() {
        let students = roster(&["1", "2", "3", "4", "5", "6", "7", "8"]);
        let a = partition(&PartitionRequest::new(students.clone(), 3, Method::Random).with_seed(42));
        let b = partition(&PartitionRequest::new(students, 3, Method::Random).with_seed(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_different_seeds_differ() {
        let students = roster(&["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"]);
        let orders: Vec<Vec<Student>> = (0..5)
            .map(|seed| order_students(&students, Method::Random, Some(seed)))
            .collect();
        assert!(orders.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_redistribute_single_into_smallest() {
        let req = sequential(roster(&["1", "2", "3"]), 2);
        assert_eq!(ids(&partition(&req)), vec![vec!["1", "2", "3"]]);
    }

    #[test]
    fn test_redistribute_without_room_keeps_single() {
        let req = sequential(roster(&["1", "2", "3"]), 2).with_redistribution(true, false);
        assert_eq!(ids(&partition(&req)), vec![vec!["1", "2"], vec!["3"]]);
    }

    #[test]
    fn test_redistribute_ties_pick_earliest() {
        let groups = vec![
            roster(&["1", "2", "3"]),
            roster(&["4", "5"]),
            roster(&["6", "7"]),
            roster(&["8"]),
        ];
        let out = redistribute_singles(groups, 3, false);
        assert_eq!(
            ids(&out),
            vec![vec!["1", "2", "3"], vec!["4", "5", "8"], vec!["6", "7"]]
        );
    }

    #[test]
    fn test_redistribute_lone_group_stays() {
        let out = redistribute_singles(vec![roster(&["1"])], 2, true);
        assert_eq!(ids(&out), vec![vec!["1"]]);
    }

    #[test]
    fn test_redistribute_multiple_singles() {
        let groups = vec![roster(&["1"]), roster(&["2", "3"]), roster(&["4"])];
        let out = redistribute_singles(groups, 2, true);
        // The first singleton is still the smallest group when "4" moves.
        assert_eq!(ids(&out), vec![vec!["1", "4"], vec!["2", "3"]]);
    }

    #[test]
    fn test_validate() {
        let ok = sequential(roster(&["1", "2"]), 2);
        assert!(ok.validate().is_ok());

        let small = sequential(roster(&["1", "2"]), 1);
        assert_eq!(small.validate(), Err(ValidationError::GroupSizeTooSmall { group_size: 1 }));

        let short = sequential(roster(&["1", "2"]), 3);
        assert_eq!(
            short.validate(),
            Err(ValidationError::NotEnoughStudents { group_size: 3, students: 2 })
        );
    }

    #[test]
    fn test_method_serde_names() {
        assert_eq!(serde_json::to_string(&Method::Random).unwrap(), "\"Aleatório\"");
        let m: Method = serde_json::from_str("\"Balanceado\"").unwrap();
        assert_eq!(m, Method::Balanced);
    }
}

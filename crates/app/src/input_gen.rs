//! Sample roster generation.
//!
//! When no roster is given, we generate a class of students with
//! enrollment-style ids and random names, so every option can be tried
//! without preparing a file.
//!
//! # Design
//!
//! Generated rosters have:
//! - Unique ids of the form `<year><4-digit sequence>`, in shuffled order
//! - Names drawn from small first-name and surname pools
//!
//! Shuffled ids make the difference between sequential and balanced
//! ordering visible.

use group_former_core::Student;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::io::Write;

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Carla", "Daniel", "Eduarda", "Felipe", "Gabriela", "Heitor", "Isabela", "João",
    "Larissa", "Marcos", "Natália", "Otávio", "Paula", "Rafael", "Sofia", "Tiago", "Vitória", "Yuri",
];

const SURNAMES: &[&str] = &[
    "Almeida", "Barbosa", "Costa", "Dias", "Ferreira", "Gomes", "Lima", "Martins", "Nunes", "Oliveira",
    "Pereira", "Ribeiro", "Santos", "Souza", "Teixeira",
];

const ID_YEAR: u32 = 2024;

/// Generate a sample roster.
///
/// # Arguments
/// - `seed`: random seed for determinism
/// - `count`: number of students
pub fn generate_roster(seed: u64, count: usize) -> Vec<Student> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut sequence: Vec<usize> = (1..=count).collect();
    sequence.shuffle(&mut rng);

    sequence
        .into_iter()
        .filter_map(|n| {
            let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
            let last = SURNAMES[rng.gen_range(0..SURNAMES.len())];
            Student::new(format!("{ID_YEAR}{n:04}"), format!("{first} {last}")).ok()
        })
        .collect()
}

/// Write a generated roster as `id, name` lines.
pub fn write_roster_file(path: &std::path::Path, seed: u64, count: usize) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    for student in generate_roster(seed, count) {
        writeln!(file, "{}", student.display_label())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_roster() {
        let roster = generate_roster(42, 30);
        assert_eq!(roster.len(), 30);

        let ids: HashSet<&str> = roster.iter().map(|s| s.id()).collect();
        assert_eq!(ids.len(), 30);
        assert!(roster.iter().all(|s| s.id().starts_with("2024")));
    }

    #[test]
    fn test_determinism() {
        assert_eq!(generate_roster(12345, 20), generate_roster(12345, 20));
    }

    #[test]
    fn test_different_seeds() {
        assert_ne!(generate_roster(1, 20), generate_roster(2, 20));
    }

    #[test]
    fn test_various_sizes() {
        for size in [0, 1, 2, 10, 100] {
            assert_eq!(generate_roster(999, size).len(), size);
        }
    }

    #[test]
    fn test_written_file_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.txt");

        write_roster_file(&path, 7, 12).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let parsed = group_former_core::normalize::normalize_text(&text);

        assert!(parsed.is_clean());
        assert_eq!(parsed.students, generate_roster(7, 12));
    }
}

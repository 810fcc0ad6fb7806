#![deny(warnings)]

//! Core grading domain for the boundary calculator.
//!
//! This crate defines the serializable grading types used across the
//! workspace, validation helpers to guarantee basic invariants, and the
//! pure boundary-computation algorithms (generic percentile targets and
//! data-driven cohort cutoffs) together with cohort statistics.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// A single grade in a grading standard, e.g. grade 9 "Exceptional".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradeDefinition {
    /// Numerical grade in [0, 9]; 9 is the highest, 0 is ungraded.
    pub numerical_grade: u8,
    /// Display letter, e.g. "9" or "U".
    pub letter_grade: String,
    /// Human-readable description, e.g. "Strong Pass".
    pub description: String,
    /// Percent of candidates expected at or above this grade, in [0, 100].
    pub target_percentile: f64,
}

/// An ordered grading standard, highest grade first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradingStandard {
    /// Standard name, e.g. "GCSE Grades".
    pub name: String,
    /// Grade definitions in descending numerical order.
    pub grades: Vec<GradeDefinition>,
}

/// Boundary calculation mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Cutoffs derived from the standard's percentile targets alone.
    Generic,
    /// Cutoffs derived from an actual cohort of scores.
    DataDriven,
}

/// A contiguous score range mapped to one grade.
///
/// Boundaries are recomputed wholesale on every call and never mutated
/// incrementally. They partition [0, total_marks] in descending grade
/// order: each max_score is the next-higher boundary's min_score - 1,
/// except the top boundary whose max_score is total_marks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradeBoundary {
    /// Numerical grade this band maps to.
    pub numerical_grade: u8,
    /// Display letter for the band.
    pub letter_grade: String,
    /// Lowest score earning this grade (>= 0).
    pub min_score: u32,
    /// Highest score in this band (>= min_score).
    pub max_score: u32,
    /// min_score as a rounded percentage of total marks.
    pub percentage: u32,
    /// Description carried over from the grade definition.
    pub description: String,
    /// Cohort headcount inside the band; present in data-driven mode only.
    pub students_in_grade: Option<u32>,
}

/// Validation errors for grading-standard invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A standard must contain at least one grade.
    #[error("grading standard has no grades")]
    EmptyStandard,
    /// Percentile outside [0, 100].
    #[error("target percentile {0} is out of range [0, 100]")]
    PercentileOutOfRange(f64),
    /// Grades must be listed in strictly descending numerical order.
    #[error("grades are not in descending numerical order")]
    GradeOrder,
    /// Percentiles must strictly decrease with the numerical grade.
    #[error("target percentiles are not strictly decreasing")]
    PercentileOrder,
}

/// Errors produced by boundary computation.
#[derive(Debug, Error, PartialEq)]
pub enum BoundaryError {
    /// Data-driven mode requires at least one score.
    #[error("no student scores provided")]
    NoScores,
    /// Total marks must be strictly positive.
    #[error("total marks must be > 0")]
    InvalidTotalMarks,
}

/// The built-in GCSE 0-9 grading standard.
pub fn default_standard() -> GradingStandard {
    let grades = [
        (9, "9", "Exceptional", 95.0),
        (8, "8", "Excellent", 88.0),
        (7, "7", "Very Good", 78.0),
        (6, "6", "Good", 65.0),
        (5, "5", "Strong Pass", 50.0),
        (4, "4", "Standard Pass", 35.0),
        (3, "3", "Grade 3", 22.0),
        (2, "2", "Grade 2", 12.0),
        (1, "1", "Grade 1", 5.0),
        (0, "U", "Ungraded", 0.0),
    ];
    GradingStandard {
        name: "GCSE Grades".to_string(),
        grades: grades
            .into_iter()
            .map(
                |(numerical_grade, letter, description, target_percentile)| GradeDefinition {
                    numerical_grade,
                    letter_grade: letter.to_string(),
                    description: description.to_string(),
                    target_percentile,
                },
            )
            .collect(),
    }
}

/// Validate a grading standard's shape and ordering invariants.
pub fn validate_standard(standard: &GradingStandard) -> Result<(), ValidationError> {
    if standard.grades.is_empty() {
        return Err(ValidationError::EmptyStandard);
    }
    for g in &standard.grades {
        if !(0.0..=100.0).contains(&g.target_percentile) || !g.target_percentile.is_finite() {
            return Err(ValidationError::PercentileOutOfRange(g.target_percentile));
        }
    }
    for pair in standard.grades.windows(2) {
        if pair[1].numerical_grade >= pair[0].numerical_grade {
            return Err(ValidationError::GradeOrder);
        }
        if pair[1].target_percentile >= pair[0].target_percentile {
            return Err(ValidationError::PercentileOrder);
        }
    }
    Ok(())
}

/// Compute boundaries for the given mode.
///
/// `scores` is consulted only in data-driven mode, where an empty slice is
/// an error the caller resolves (fall back to generic or block the call).
/// The computation is pure: identical inputs yield identical output.
pub fn compute_boundaries(
    mode: Mode,
    total_marks: u32,
    standard: &GradingStandard,
    scores: &[i64],
) -> Result<Vec<GradeBoundary>, BoundaryError> {
    debug!(?mode, total_marks, n_scores = scores.len(), "computing boundaries");
    match mode {
        Mode::Generic => generic_boundaries(total_marks, standard),
        Mode::DataDriven => data_driven_boundaries(scores, total_marks, standard),
    }
}

/// Boundaries from the standard's percentile targets alone.
///
/// For each grade, min_score = round(target_percentile/100 * total_marks);
/// max_score chains down from the previous band (total_marks for the top)
/// and is floored at min_score, so the trailing well-formedness filter
/// never drops a band here.
pub fn generic_boundaries(
    total_marks: u32,
    standard: &GradingStandard,
) -> Result<Vec<GradeBoundary>, BoundaryError> {
    if total_marks == 0 {
        return Err(BoundaryError::InvalidTotalMarks);
    }
    let mut boundaries = Vec::with_capacity(standard.grades.len());
    let mut prev_min: Option<i64> = None;
    for grade in &standard.grades {
        let min = ((grade.target_percentile / 100.0) * f64::from(total_marks)).round() as i64;
        let min = min.max(0);
        let max = match prev_min {
            None => i64::from(total_marks),
            Some(p) => p - 1,
        };
        let max = max.max(min);
        boundaries.push(band(grade, min, max, total_marks, None));
        prev_min = Some(min);
    }
    Ok(retain_well_formed(boundaries))
}

/// Boundaries derived from an actual cohort.
///
/// Scores are ranked descending; each grade's min_score is the score at
/// floor((100 - target_percentile)/100 * count). An index of exactly
/// `count` (the 0th-percentile grade) falls back to 0 so the bottom band
/// always reaches the floor of the score range.
pub fn data_driven_boundaries(
    scores: &[i64],
    total_marks: u32,
    standard: &GradingStandard,
) -> Result<Vec<GradeBoundary>, BoundaryError> {
    if scores.is_empty() {
        return Err(BoundaryError::NoScores);
    }
    if total_marks == 0 {
        return Err(BoundaryError::InvalidTotalMarks);
    }
    let mut sorted = scores.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    let mut boundaries = Vec::with_capacity(standard.grades.len());
    let mut prev_min: Option<i64> = None;
    for grade in &standard.grades {
        let rank_fraction = (100.0 - grade.target_percentile) / 100.0;
        let index = (rank_fraction * sorted.len() as f64).floor() as usize;
        let min = if index < sorted.len() { sorted[index] } else { 0 };
        let max = match prev_min {
            None => i64::from(total_marks),
            Some(p) => p - 1,
        };
        let final_max = max.max(min);
        let students = sorted.iter().filter(|&&s| s >= min && s <= final_max).count() as u32;
        boundaries.push(band(grade, min, final_max, total_marks, Some(students)));
        prev_min = Some(min.max(0));
    }
    Ok(retain_well_formed(boundaries))
}

fn band(
    grade: &GradeDefinition,
    min: i64,
    max: i64,
    total_marks: u32,
    students_in_grade: Option<u32>,
) -> GradeBoundary {
    let percentage = ((min as f64 / f64::from(total_marks)) * 100.0).round().max(0.0) as u32;
    GradeBoundary {
        numerical_grade: grade.numerical_grade,
        letter_grade: grade.letter_grade.clone(),
        min_score: min.max(0) as u32,
        max_score: max.max(0) as u32,
        percentage,
        description: grade.description.clone(),
        students_in_grade,
    }
}

fn retain_well_formed(boundaries: Vec<GradeBoundary>) -> Vec<GradeBoundary> {
    boundaries
        .into_iter()
        .filter(|b| b.max_score >= b.min_score)
        .collect()
}

/// Summary statistics over an actual cohort.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CohortStats {
    /// Number of scores in the cohort.
    pub total_students: u32,
    /// Rounded mean score.
    pub mean_score: i64,
    /// Median score (upper element for even-sized cohorts).
    pub median_score: i64,
    /// Percent of scores at or above the grade-4 cutoff.
    pub pass_rate: u32,
    /// Percent of scores at or above the grade-7 cutoff.
    pub high_achievers: u32,
    /// Percent of scores at or above the grade-8 cutoff.
    pub top_grades: u32,
}

/// Typical national rates shown when no cohort is loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypicalRates {
    pub pass_rate: u32,
    pub high_achievers: u32,
    pub top_grades: u32,
}

/// Typical GCSE outcome rates (grade 4+/7+/8+).
pub fn generic_stats() -> TypicalRates {
    TypicalRates {
        pass_rate: 65,
        high_achievers: 22,
        top_grades: 12,
    }
}

/// Cohort statistics against already-computed boundaries.
///
/// Returns None for an empty cohort.
pub fn cohort_stats(scores: &[i64], boundaries: &[GradeBoundary]) -> Option<CohortStats> {
    if scores.is_empty() {
        return None;
    }
    let mut ascending = scores.to_vec();
    ascending.sort_unstable();
    let n = scores.len();
    let sum: i64 = scores.iter().sum();
    let mean_score = (sum as f64 / n as f64).round() as i64;
    let median_score = ascending[n / 2];
    Some(CohortStats {
        total_students: n as u32,
        mean_score,
        median_score,
        pass_rate: rate_at_or_above(scores, boundary_min(boundaries, "4")),
        high_achievers: rate_at_or_above(scores, boundary_min(boundaries, "7")),
        top_grades: rate_at_or_above(scores, boundary_min(boundaries, "8")),
    })
}

fn boundary_min(boundaries: &[GradeBoundary], letter: &str) -> i64 {
    boundaries
        .iter()
        .find(|b| b.letter_grade == letter)
        .map(|b| i64::from(b.min_score))
        .unwrap_or(0)
}

fn rate_at_or_above(scores: &[i64], cutoff: i64) -> u32 {
    let hits = scores.iter().filter(|&&s| s >= cutoff).count();
    ((hits as f64 / scores.len() as f64) * 100.0).round() as u32
}

/// A reproducible uniform cohort of `count` scores in [0, total_marks].
///
/// The RNG is seeded so demos and tests get identical cohorts for
/// identical seeds.
pub fn synthetic_cohort(count: usize, total_marks: u32, seed: u64) -> Vec<i64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| i64::from(rng.gen_range(0..=total_marks)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SAMPLE: [i64; 30] = [
        95, 89, 87, 84, 82, 78, 76, 73, 71, 68, 65, 62, 58, 55, 52, 48, 45, 42, 38, 35, 32, 28,
        25, 22, 18, 15, 12, 8, 5, 2,
    ];

    #[test]
    fn serde_roundtrip_standard() {
        let std_in = default_standard();
        let s = serde_json::to_string(&std_in).unwrap();
        let back: GradingStandard = serde_json::from_str(&s).unwrap();
        assert_eq!(back, std_in);
        assert_eq!(back.grades.len(), 10);
    }

    #[test]
    fn default_standard_is_valid() {
        validate_standard(&default_standard()).unwrap();
    }

    #[test]
    fn validation_rejects_bad_standards() {
        let empty = GradingStandard {
            name: "Empty".into(),
            grades: vec![],
        };
        assert_eq!(validate_standard(&empty), Err(ValidationError::EmptyStandard));

        let mut out_of_range = default_standard();
        out_of_range.grades[0].target_percentile = 120.0;
        assert_eq!(
            validate_standard(&out_of_range),
            Err(ValidationError::PercentileOutOfRange(120.0))
        );

        let mut bad_grade_order = default_standard();
        bad_grade_order.grades.swap(0, 1);
        assert_eq!(
            validate_standard(&bad_grade_order),
            Err(ValidationError::GradeOrder)
        );

        let mut flat_percentiles = default_standard();
        flat_percentiles.grades[1].target_percentile =
            flat_percentiles.grades[0].target_percentile;
        assert_eq!(
            validate_standard(&flat_percentiles),
            Err(ValidationError::PercentileOrder)
        );
    }

    #[test]
    fn generic_boundaries_over_100_marks() {
        let bs = generic_boundaries(100, &default_standard()).unwrap();
        assert_eq!(bs.len(), 10);
        let ranges: Vec<(u32, u32)> = bs.iter().map(|b| (b.min_score, b.max_score)).collect();
        assert_eq!(
            ranges,
            vec![
                (95, 100),
                (88, 94),
                (78, 87),
                (65, 77),
                (50, 64),
                (35, 49),
                (22, 34),
                (12, 21),
                (5, 11),
                (0, 4),
            ]
        );
        // At 100 total marks the percentage column equals min_score.
        for b in &bs {
            assert_eq!(b.percentage, b.min_score);
            assert_eq!(b.students_in_grade, None);
        }
    }

    #[test]
    fn generic_rejects_zero_total_marks() {
        assert_eq!(
            generic_boundaries(0, &default_standard()),
            Err(BoundaryError::InvalidTotalMarks)
        );
    }

    #[test]
    fn data_driven_rejects_empty_cohort() {
        assert_eq!(
            compute_boundaries(Mode::DataDriven, 100, &default_standard(), &[]),
            Err(BoundaryError::NoScores)
        );
    }

    #[test]
    fn data_driven_sample_cohort() {
        let bs = data_driven_boundaries(&SAMPLE, 100, &default_standard()).unwrap();
        assert_eq!(bs.len(), 10);
        let mins: Vec<u32> = bs.iter().map(|b| b.min_score).collect();
        assert_eq!(mins, vec![89, 84, 76, 65, 48, 35, 22, 12, 5, 0]);
        let students: Vec<u32> = bs.iter().map(|b| b.students_in_grade.unwrap()).collect();
        assert_eq!(students, vec![2, 2, 3, 4, 5, 4, 4, 3, 2, 1]);
        assert_eq!(students.iter().sum::<u32>(), SAMPLE.len() as u32);
        assert_eq!(bs[0].max_score, 100);
    }

    #[test]
    fn data_driven_bottom_band_reaches_zero() {
        // The 0th-percentile grade indexes one past the end and falls back
        // to 0 so the partition covers the whole score range.
        let bs = data_driven_boundaries(&[40, 30, 20], 50, &default_standard()).unwrap();
        assert_eq!(bs.last().unwrap().min_score, 0);
    }

    #[test]
    fn compute_is_idempotent() {
        let std_def = default_standard();
        let a = compute_boundaries(Mode::DataDriven, 100, &std_def, &SAMPLE).unwrap();
        let b = compute_boundaries(Mode::DataDriven, 100, &std_def, &SAMPLE).unwrap();
        assert_eq!(a, b);
        let g1 = compute_boundaries(Mode::Generic, 80, &std_def, &[]).unwrap();
        let g2 = compute_boundaries(Mode::Generic, 80, &std_def, &[]).unwrap();
        assert_eq!(g1, g2);
    }

    #[test]
    fn cohort_stats_sample() {
        let bs = data_driven_boundaries(&SAMPLE, 100, &default_standard()).unwrap();
        let stats = cohort_stats(&SAMPLE, &bs).unwrap();
        assert_eq!(stats.total_students, 30);
        assert_eq!(stats.mean_score, 49);
        assert_eq!(stats.median_score, 52);
        // Cutoffs: 4 at 35, 7 at 76, 8 at 84.
        assert_eq!(stats.pass_rate, 67);
        assert_eq!(stats.high_achievers, 23);
        assert_eq!(stats.top_grades, 13);
    }

    #[test]
    fn cohort_stats_empty_is_none() {
        assert_eq!(cohort_stats(&[], &[]), None);
    }

    #[test]
    fn generic_stats_typical_rates() {
        let rates = generic_stats();
        assert_eq!(rates.pass_rate, 65);
        assert_eq!(rates.high_achievers, 22);
        assert_eq!(rates.top_grades, 12);
    }

    #[test]
    fn synthetic_cohort_is_seeded_and_bounded() {
        let a = synthetic_cohort(50, 100, 42);
        let b = synthetic_cohort(50, 100, 42);
        assert_eq!(a, b);
        assert!(a.iter().all(|&s| (0..=100).contains(&s)));
        let c = synthetic_cohort(50, 100, 43);
        assert_ne!(a, c);
    }

    proptest! {
        #[test]
        fn generic_partitions_score_range(total_marks in 20u32..2000) {
            let bs = generic_boundaries(total_marks, &default_standard()).unwrap();
            prop_assert_eq!(bs.len(), 10);
            prop_assert_eq!(bs[0].max_score, total_marks);
            prop_assert_eq!(bs.last().unwrap().min_score, 0);
            for pair in bs.windows(2) {
                prop_assert_eq!(pair[1].max_score, pair[0].min_score - 1);
            }
            for b in &bs {
                prop_assert!(b.max_score >= b.min_score);
            }
        }

        #[test]
        fn data_driven_counts_every_student_once(
            scores in proptest::collection::btree_set(0i64..=100, 20..100)
        ) {
            let cohort: Vec<i64> = scores.into_iter().collect();
            let bs = data_driven_boundaries(&cohort, 100, &default_standard()).unwrap();
            let counted: u32 = bs.iter().filter_map(|b| b.students_in_grade).sum();
            prop_assert_eq!(counted, cohort.len() as u32);
        }

        #[test]
        fn percentages_stay_in_range(total_marks in 1u32..5000) {
            let bs = generic_boundaries(total_marks, &default_standard()).unwrap();
            for b in &bs {
                prop_assert!(b.percentage <= 100);
            }
        }
    }
}

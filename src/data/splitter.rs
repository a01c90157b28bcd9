// ============================================================
// Data — Train/Validation/Test Splitter
// ============================================================
// Shuffles record positions with a seeded RNG and cuts them
// into three disjoint partitions:
//
//   test  = round(total * test_ratio)
//   val   = round(total * val_ratio)
//   train = everything left
//
// The same seed and ratios always give the same partition.
// Each partition is returned ordered by record id so artifacts
// are stable across runs and easy to diff.
//
// Why shuffle before splitting?
//   Raw files are often ordered by label or by date. Cutting
//   them in file order would put whole classes into one
//   partition. A seeded shuffle gives every partition a
//   representative mix and still repeats exactly across runs.
//
// Why is test cut first?
//   The test partition is the one that must never be touched
//   by fitting. Taking it from the front of the shuffled order
//   keeps its membership independent of `val_ratio`.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom on a
// StdRng seeded from the config.
//
// Reference: rand crate documentation (SliceRandom, SeedableRng)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::record::{Record, Split};

/// Randomly partition `records` into train, validation and test.
///
/// # Arguments
/// * `records`    - All raw records (consumed by this function)
/// * `test_ratio` - Fraction of the total held out for testing
/// * `val_ratio`  - Fraction of the total used for validation
/// * `seed`       - RNG seed; equal seeds give equal splits
pub fn train_val_test_split(
    records:    Vec<Record>,
    test_ratio: f64,
    val_ratio:  f64,
    seed:       u64,
) -> Split {
    let total = records.len();

    let mut order: Vec<usize> = (0..total).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    // Clamp so tiny datasets never over-allocate the held-out sets
    let test_n = ((total as f64) * test_ratio).round() as usize;
    let test_n = test_n.min(total);
    let val_n  = ((total as f64) * val_ratio).round() as usize;
    let val_n  = val_n.min(total - test_n);

    // Tag every position with its destination, then move records out once
    let mut destination = vec![0u8; total];
    for (rank, &pos) in order.iter().enumerate() {
        destination[pos] = if rank < test_n {
            2
        } else if rank < test_n + val_n {
            1
        } else {
            0
        };
    }

    let mut split = Split::default();
    for (record, dest) in records.into_iter().zip(destination) {
        match dest {
            2 => split.test.push(record),
            1 => split.val.push(record),
            _ => split.train.push(record),
        }
    }

    for part in [&mut split.train, &mut split.val, &mut split.test] {
        part.sort_by_key(|r| r.id);
    }

    tracing::debug!(
        "Dataset split: {} train, {} validation, {} test",
        split.train.len(),
        split.val.len(),
        split.test.len(),
    );

    split
}

use serde::{Deserialize, Serialize};

/// Document indices of one cross-validation fold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    pub index: usize,
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partitions `documents` corpus indices into folds.
///
/// * `k > 1`: document `i` is tested in fold `i mod k` and trained on in
///   every other fold.
/// * `k == 1`: a single 90/10 split in corpus order.
/// * `k == 0`: one fold with both partitions empty.
pub fn split(documents: usize, k: usize) -> Vec<Fold> {
    match k {
        0 => vec![Fold {
            index: 0,
            train: Vec::new(),
            test: Vec::new(),
        }],
        1 => {
            let cut = documents * 9 / 10;
            vec![Fold {
                index: 0,
                train: (0..cut).collect(),
                test: (cut..documents).collect(),
            }]
        }
        _ => (0..k)
            .map(|index| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..documents).partition(|document| document % k == index);
                Fold { index, train, test }
            })
            .collect(),
    }
}

//! Norm-library batching (spec §4.7 step 2): partition into 5-7-rule
//! batches, default 6, reused for both the first round and the round-2
//! requeue of failed-batch rules.

use crate::norm::NormRule;

/// Splits `rules` into chunks of `default_size`, then folds a short final
/// chunk (fewer than `min_size` rules) back into the previous one when
/// that doesn't push it over `max_size` — avoiding a trailing batch of
/// one or two rules when the library doesn't divide evenly.
pub fn partition_batches(rules: &[NormRule], min_size: usize, max_size: usize, default_size: usize) -> Vec<Vec<NormRule>> {
    if rules.is_empty() {
        return Vec::new();
    }
    let mut batches: Vec<Vec<NormRule>> = rules.chunks(default_size.max(1)).map(|c| c.to_vec()).collect();

    if batches.len() > 1 {
        let last_len = batches.last().unwrap().len();
        if last_len < min_size {
            let second_last_len = batches[batches.len() - 2].len();
            if second_last_len + last_len <= max_size {
                let last = batches.pop().unwrap();
                batches.last_mut().unwrap().extend(last);
            }
        }
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use terra_core::model::ReviewType;

    fn rules(n: usize) -> Vec<NormRule> {
        (0..n).map(|i| NormRule::new(&format!("N{i}"), "x", ReviewType::Tech)).collect()
    }

    #[test]
    fn even_split_uses_default_size() {
        let batches = partition_batches(&rules(12), 5, 7, 6);
        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![6, 6]);
    }

    #[test]
    fn short_tail_folds_into_previous_batch() {
        let batches = partition_batches(&rules(8), 5, 7, 6);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 8);
    }

    #[test]
    fn short_tail_folds_when_merge_fits_under_max() {
        let batches = partition_batches(&rules(13), 5, 7, 6);
        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![6, 7]);
    }

    #[test]
    fn short_tail_kept_separate_when_merge_would_exceed_max() {
        let batches = partition_batches(&rules(14), 5, 7, 6);
        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![6, 6, 2]);
    }

    #[test]
    fn empty_library_yields_no_batches() {
        assert!(partition_batches(&[], 5, 7, 6).is_empty());
    }
}

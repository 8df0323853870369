use itertools::{EitherOrBoth, Itertools};

#[derive(Debug, Clone, PartialEq)]
pub struct KeyVal<K, V> {
    pub key: K,
    pub val: V,
}

/// Inner join of two sequences that are ordered by key. Returns the
/// keys present on both sides, plus how many entries were only on
/// the left or only on the right side.
pub fn keyval_inner_join_2<K: Ord, V1, V2>(
    a: impl IntoIterator<Item = KeyVal<K, V1>>,
    b: impl IntoIterator<Item = KeyVal<K, V2>>,
) -> (Vec<KeyVal<K, (V1, V2)>>, usize, usize) {
    let mut joined = Vec::new();
    let mut left_only = 0;
    let mut right_only = 0;
    for eob in a
        .into_iter()
        .merge_join_by(b.into_iter(), |a, b| a.key.cmp(&b.key))
    {
        match eob {
            EitherOrBoth::Both(a, b) => joined.push(KeyVal {
                key: a.key,
                val: (a.val, b.val),
            }),
            EitherOrBoth::Left(_) => left_only += 1,
            EitherOrBoth::Right(_) => right_only += 1,
        }
    }
    (joined, left_only, right_only)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kv(key: usize, val: &str) -> KeyVal<usize, &str> {
        KeyVal { key, val }
    }

    #[test]
    fn t_join() {
        let (joined, left_only, right_only) = keyval_inner_join_2(
            [kv(0, "a"), kv(1, "b"), kv(2, "c")],
            [kv(1, "B"), kv(2, "C"), kv(3, "D"), kv(4, "E")],
        );
        assert_eq!(
            joined,
            [
                KeyVal {
                    key: 1,
                    val: ("b", "B")
                },
                KeyVal {
                    key: 2,
                    val: ("c", "C")
                }
            ]
        );
        assert_eq!((left_only, right_only), (1, 2));
    }
}

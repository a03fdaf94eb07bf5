//! Enumeration of order-preserving interleavings.

/// Position of an element in the interleaved sources: `(source, index)`.
pub type Origin = (usize, usize);

/// Every interleaving of sequences with the given `lengths`.
///
/// Each result lists the origin of every element in order; filtering a result
/// to one source yields that source's indices ascending. The enumeration works
/// on a frontier of partial interleavings tagged with one consumption counter
/// per source. Every pass extends each incomplete member by the next element
/// of every source that still has elements left, until no member is
/// incomplete.
///
/// Results are ordered by the source appended first at each step, so
/// `[2, 1]` yields `00 01 10`, `00 10 01`, `10 00 01`.
pub fn interleavings(lengths: &[usize]) -> Vec<Vec<Origin>> {
    let total: usize = lengths.iter().sum();
    let mut frontier: Vec<(Vec<Origin>, Vec<usize>)> =
        vec![(Vec::with_capacity(total), vec![0; lengths.len()])];

    for _ in 0..total {
        let mut next = Vec::with_capacity(frontier.len() * lengths.len());
        for (prefix, counters) in frontier {
            for (source, &len) in lengths.iter().enumerate() {
                if counters[source] < len {
                    let mut extended = prefix.clone();
                    extended.push((source, counters[source]));
                    let mut advanced = counters.clone();
                    advanced[source] += 1;
                    next.push((extended, advanced));
                }
            }
        }
        frontier = next;
    }

    frontier.into_iter().map(|(interleaving, _)| interleaving).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::multinomial;

    #[test]
    fn two_and_one() {
        assert_eq!(
            interleavings(&[2, 1]),
            vec![
                vec![(0, 0), (0, 1), (1, 0)],
                vec![(0, 0), (1, 0), (0, 1)],
                vec![(1, 0), (0, 0), (0, 1)],
            ]
        );
    }

    #[test]
    fn empty_sources_are_identity() {
        assert_eq!(interleavings(&[]), vec![Vec::<Origin>::new()]);
        assert_eq!(interleavings(&[0, 0]), vec![Vec::<Origin>::new()]);
        assert_eq!(interleavings(&[0, 2, 0]), vec![vec![(1, 0), (1, 1)]]);
    }

    #[test]
    fn count_is_multinomial_and_order_is_preserved() {
        for lengths in [vec![1, 1, 1], vec![2, 2], vec![3, 1, 2], vec![4, 0, 1]] {
            let all = interleavings(&lengths);
            assert_eq!(all.len() as u128, multinomial(&lengths).expect("small"));
            for interleaving in &all {
                for (source, &len) in lengths.iter().enumerate() {
                    let picked: Vec<usize> = interleaving
                        .iter()
                        .filter(|(s, _)| *s == source)
                        .map(|(_, i)| *i)
                        .collect();
                    assert_eq!(picked, (0..len).collect::<Vec<_>>());
                }
            }
        }
    }
}

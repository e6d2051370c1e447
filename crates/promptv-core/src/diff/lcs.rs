//! Longest-common-subsequence alignment over lines.
//!
//! The alignment always keeps as many equal lines as possible. Among those
//! alignments, it is built run by run: each equal run is the longest one
//! that can still start the rest of an optimal alignment, with ties going to
//! the earliest position in `a`, then in `b`. Between two runs, deletions
//! come before insertions.

/// One step of an alignment between `a` and `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Equal(usize, usize),
    Delete(usize),
    Insert(usize),
}

/// Suffix tables over `a` and `b`, both indexed `i * width + j`.
struct Tables {
    width: usize,
    /// LCS length of `a[i..]` and `b[j..]`
    lcs: Vec<u32>,
    /// Length of the equal run starting at `a[i]`, `b[j]`
    run: Vec<u32>,
}

impl Tables {
    fn build<T: PartialEq>(a: &[T], b: &[T]) -> Self {
        let (n, m) = (a.len(), b.len());
        let width = m + 1;
        let mut lcs = vec![0u32; (n + 1) * width];
        let mut run = vec![0u32; (n + 1) * width];
        for i in (0..n).rev() {
            for j in (0..m).rev() {
                let at = i * width + j;
                if a[i] == b[j] {
                    run[at] = run[at + width + 1] + 1;
                    lcs[at] = lcs[at + width + 1] + 1;
                } else {
                    lcs[at] = lcs[at + width].max(lcs[at + 1]);
                }
            }
        }
        Self { width, lcs, run }
    }

    /// Start and length of the run that opens the best alignment of
    /// `a[from_i..]` and `b[from_j..]`, or `None` when nothing matches.
    ///
    /// A run at `(i, j)` keeps the alignment optimal exactly when skipping
    /// the lines before it loses nothing, i.e. `lcs[i][j]` still equals the
    /// target. The whole run is then always part of that alignment.
    fn next_run(
        &self,
        from_i: usize,
        from_j: usize,
        n: usize,
        m: usize,
    ) -> Option<(usize, usize, usize)> {
        let target = self.lcs[from_i * self.width + from_j];
        if target == 0 {
            return None;
        }

        let mut best: Option<(usize, usize, usize)> = None;
        for i in from_i..n {
            for j in from_j..m {
                let at = i * self.width + j;
                let len = self.run[at] as usize;
                if len == 0 || self.lcs[at] != target {
                    continue;
                }
                if best.map_or(true, |(_, _, best_len)| len > best_len) {
                    best = Some((i, j, len));
                }
            }
        }
        best
    }
}

pub(crate) fn align<T: PartialEq>(a: &[T], b: &[T]) -> Vec<Step> {
    let (n, m) = (a.len(), b.len());
    let tables = Tables::build(a, b);

    let mut steps = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (0, 0);
    while let Some((start_i, start_j, len)) = tables.next_run(i, j, n, m) {
        steps.extend((i..start_i).map(Step::Delete));
        steps.extend((j..start_j).map(Step::Insert));
        steps.extend((0..len).map(|k| Step::Equal(start_i + k, start_j + k)));
        i = start_i + len;
        j = start_j + len;
    }
    steps.extend((i..n).map(Step::Delete));
    steps.extend((j..m).map(Step::Insert));
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equal_count(steps: &[Step]) -> usize {
        steps
            .iter()
            .filter(|s| matches!(s, Step::Equal(..)))
            .count()
    }

    #[test]
    fn test_identical_inputs_are_all_equal() {
        let a = ["x", "y", "z"];
        let steps = align(&a, &a);
        assert_eq!(steps, vec![Step::Equal(0, 0), Step::Equal(1, 1), Step::Equal(2, 2)]);
    }

    #[test]
    fn test_empty_sides() {
        let empty: [&str; 0] = [];
        assert!(align(&empty, &empty).is_empty());
        assert_eq!(align(&empty, &["a"]), vec![Step::Insert(0)]);
        assert_eq!(align(&["a"], &empty), vec![Step::Delete(0)]);
    }

    #[test]
    fn test_finds_longest_common_subsequence() {
        let a = ["a", "b", "c", "a", "b", "b", "a"];
        let b = ["c", "b", "a", "b", "a", "c"];
        assert_eq!(equal_count(&align(&a, &b)), 4);
    }

    #[test]
    fn test_longer_first_run_beats_earlier_match() {
        // Matching the leading "A" would leave a first run of one line.
        let steps = align(&["A", "C", "A", "B"], &["A", "B"]);
        assert_eq!(
            steps,
            vec![Step::Delete(0), Step::Delete(1), Step::Equal(2, 0), Step::Equal(3, 1)]
        );
    }

    #[test]
    fn test_fewest_edits_beat_a_longer_block() {
        // "k" is the longest block, but "m" and "n" together keep more lines.
        let a = ["k1", "k2", "k3", "m1", "m2", "z", "n1", "n2"];
        let b = ["m1", "m2", "w", "n1", "n2", "k1", "k2", "k3"];
        let steps = align(&a, &b);
        assert_eq!(equal_count(&steps), 4);
        assert_eq!(steps[0], Step::Delete(0));
        assert!(steps.contains(&Step::Equal(3, 0)));
        assert!(steps.contains(&Step::Equal(7, 4)));
    }

    #[test]
    fn test_equal_runs_tie_to_earliest_position() {
        let steps = align(&["x"], &["x", "x"]);
        assert_eq!(steps, vec![Step::Equal(0, 0), Step::Insert(1)]);

        let steps = align(&["a", "b", "c", "d"], &["c", "d", "a", "b"]);
        assert_eq!(
            steps,
            vec![
                Step::Insert(0),
                Step::Insert(1),
                Step::Equal(0, 2),
                Step::Equal(1, 3),
                Step::Delete(2),
                Step::Delete(3),
            ]
        );
    }

    #[test]
    fn test_delete_before_insert_between_runs() {
        assert_eq!(align(&["a"], &["b"]), vec![Step::Delete(0), Step::Insert(0)]);

        let steps = align(&["s", "x", "e"], &["s", "y", "e"]);
        assert_eq!(
            steps,
            vec![Step::Equal(0, 0), Step::Delete(1), Step::Insert(1), Step::Equal(2, 2)]
        );
    }
}

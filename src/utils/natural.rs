//! Digit-aware name ordering for MLS symbols.

use std::cmp::Ordering;

/// Compare two names so that embedded decimal runs sort numerically.
///
/// `c2` sorts before `c10`; names without digits compare like `str::cmp`.
/// Leading zeros break ties so the ordering stays total (`c01` after `c1`).
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let start_a = i;
            let start_b = j;
            while i < a.len() && a[i].is_ascii_digit() {
                i += 1;
            }
            while j < b.len() && b[j].is_ascii_digit() {
                j += 1;
            }
            let run_a = trim_zeros(&a[start_a..i]);
            let run_b = trim_zeros(&b[start_b..j]);
            let ord = run_a
                .len()
                .cmp(&run_b.len())
                .then_with(|| run_a.cmp(run_b))
                .then_with(|| (i - start_a).cmp(&(j - start_b)));
            if ord != Ordering::Equal {
                return ord;
            }
        } else {
            let ord = a[i].cmp(&b[j]);
            if ord != Ordering::Equal {
                return ord;
            }
            i += 1;
            j += 1;
        }
    }

    (a.len() - i).cmp(&(b.len() - j))
}

fn trim_zeros(run: &[u8]) -> &[u8] {
    let first = run.iter().position(|&d| d != b'0').unwrap_or(run.len());
    &run[first..]
}

/// Collect names into a vector in natural order.
pub fn sorted_natural<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = names.into_iter().map(Into::into).collect();
    out.sort_by(|a, b| natural_cmp(a, b));
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_runs() {
        assert_eq!(natural_cmp("c2", "c10"), Ordering::Less);
        assert_eq!(natural_cmp("c10", "c2"), Ordering::Greater);
        assert_eq!(natural_cmp("s0", "s0"), Ordering::Equal);
        assert_eq!(natural_cmp("s9", "t0"), Ordering::Less);
    }

    #[test]
    fn test_prefix_and_zeros() {
        assert_eq!(natural_cmp("c1", "c1a"), Ordering::Less);
        assert_eq!(natural_cmp("c1", "c01"), Ordering::Less);
        assert_eq!(natural_cmp("c01", "c1"), Ordering::Greater);
    }

    #[test]
    fn test_sorted_natural_dedups() {
        let sorted = sorted_natural(["c10", "c2", "c1", "c2"]);
        assert_eq!(sorted, vec!["c1", "c2", "c10"]);
    }
}

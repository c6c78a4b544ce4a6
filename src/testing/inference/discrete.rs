use crate::testing::{Alternative, TestResult};
use anyhow::anyhow;
use ndarray::{Array2, ArrayView2, arr2};
use statrs::distribution::{Discrete, DiscreteCDF, Hypergeometric};

/// Relative tolerance used when collecting "as extreme" tables for the two-sided test.
const PMF_TOLERANCE: f64 = 1.0 + 1e-7;

/// Build a 2x2 contingency table from its four cells, row-major.
pub fn contingency_table(a: u64, b: u64, c: u64, d: u64) -> Array2<u64> {
    arr2(&[[a, b], [c, d]])
}

/// Performs Fisher's exact test on a 2x2 contingency table
///
/// Cell `[0][0]` is the tested count. Under the null hypothesis it follows a
/// hypergeometric distribution with the table margins fixed:
/// population = table total, successes = first row total, draws = first column total.
///
/// The statistic is the sample odds ratio `(a * d) / (b * c)`.
pub fn fisher_exact_test(
    table: ArrayView2<u64>,
    alternative: Alternative,
) -> anyhow::Result<TestResult<f64>> {
    if table.shape() != [2, 2] {
        return Err(anyhow!(
            "Fisher's exact test requires a 2x2 table, got shape {:?}",
            table.shape()
        ));
    }

    let (a, b, c, d) = (table[[0, 0]], table[[0, 1]], table[[1, 0]], table[[1, 1]]);
    let odds_ratio = odds_ratio(a, b, c, d);

    let total = a + b + c + d;
    if total == 0 {
        return Ok(TestResult::new(odds_ratio, 1.0));
    }

    let row1 = a + b;
    let col1 = a + c;
    let hyper = Hypergeometric::new(total, row1, col1)
        .map_err(|err| anyhow!("Invalid contingency table margins: {}", err))?;

    let p_value = match alternative {
        // P(X >= a); sf(x) is P(X > x)
        Alternative::Greater => {
            if a == 0 {
                1.0
            } else {
                hyper.sf(a - 1)
            }
        }
        Alternative::Less => hyper.cdf(a),
        Alternative::TwoSided => {
            let lower = (row1 + col1).saturating_sub(total);
            let upper = row1.min(col1);
            let observed = hyper.pmf(a) * PMF_TOLERANCE;
            (lower..=upper)
                .map(|x| hyper.pmf(x))
                .filter(|&pmf| pmf <= observed)
                .sum()
        }
    };

    Ok(TestResult::new(odds_ratio, p_value.clamp(0.0, 1.0)))
}

fn odds_ratio(a: u64, b: u64, c: u64, d: u64) -> f64 {
    let numerator = a as f64 * d as f64;
    let denominator = b as f64 * c as f64;

    if denominator == 0.0 {
        if numerator == 0.0 { f64::NAN } else { f64::INFINITY }
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_contingency_table_is_row_major() {
        let table = contingency_table(1, 2, 3, 4);
        assert_eq!(table.shape(), &[2, 2]);
        assert_eq!(table[[0, 1]], 2);
        assert_eq!(table[[1, 0]], 3);
    }

    #[test]
    fn test_fisher_greater_matches_reference() {
        // scipy.stats.fisher_exact([[3, 1], [1, 3]], alternative='greater') -> 0.24285714...
        let table = contingency_table(3, 1, 1, 3);
        let result = fisher_exact_test(table.view(), Alternative::Greater).unwrap();
        assert_relative_eq!(result.p_value, 17.0 / 70.0, epsilon = 1e-10);
        assert_relative_eq!(result.statistic, 9.0, epsilon = 1e-10);
    }

    #[test]
    fn test_fisher_less_and_two_sided() {
        let table = contingency_table(3, 1, 1, 3);
        let less = fisher_exact_test(table.view(), Alternative::Less).unwrap();
        assert_relative_eq!(less.p_value, 69.0 / 70.0, epsilon = 1e-10);

        let two_sided = fisher_exact_test(table.view(), Alternative::TwoSided).unwrap();
        assert_relative_eq!(two_sided.p_value, 34.0 / 70.0, epsilon = 1e-10);
    }

    #[test]
    fn test_fisher_zero_overlap_is_not_enriched() {
        let table = contingency_table(0, 5, 10, 985);
        let result = fisher_exact_test(table.view(), Alternative::Greater).unwrap();
        assert_relative_eq!(result.p_value, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fisher_strong_enrichment() {
        let table = contingency_table(10, 0, 0, 990);
        let result = fisher_exact_test(table.view(), Alternative::Greater).unwrap();
        assert!(result.p_value < 1e-20);
        assert!(result.statistic.is_infinite());
    }

    #[test]
    fn test_fisher_rejects_bad_shape() {
        let table = Array2::<u64>::zeros((3, 2));
        assert!(fisher_exact_test(table.view(), Alternative::Greater).is_err());
    }

    #[test]
    fn test_empty_table() {
        let table = contingency_table(0, 0, 0, 0);
        let result = fisher_exact_test(table.view(), Alternative::Greater).unwrap();
        assert_eq!(result.p_value, 1.0);
        assert!(result.statistic.is_nan());
    }
}

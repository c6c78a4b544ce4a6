use num_traits::Float;

pub mod correction;
pub mod inference;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alternative {
    TwoSided,
    Less,
    Greater,
}

#[derive(Debug, Clone)]
pub struct TestResult<T> {
    /// The test statistic value (e.g., odds ratio)
    pub statistic: T,
    /// The p-value of the test
    pub p_value: T,
}

impl<T> TestResult<T>
where
    T: Float,
{
    pub fn new(statistic: T, p_value: T) -> Self {
        TestResult { statistic, p_value }
    }

    /// Check if the result is statistically significant at the given threshold
    pub fn is_significant(&self, alpha: T) -> bool {
        self.p_value < alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_significance() {
        let result = TestResult::new(2.5, 0.01);
        assert!(result.is_significant(0.05));
        assert!(!result.is_significant(0.01));
    }
}

//! Mapping between design order and evaluation order.
//!
//! Stations are designed hub to tip and evaluated tip to hub: design index
//! `i` is evaluation index `N − 1 − i`.

use crate::error::{SolverError, SolverResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StationOrdering {
    count: usize,
}

impl StationOrdering {
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn design_to_evaluation(&self, design_index: usize) -> SolverResult<usize> {
        self.mirror(design_index)
    }

    pub fn evaluation_to_design(&self, evaluation_index: usize) -> SolverResult<usize> {
        self.mirror(evaluation_index)
    }

    /// Design indices listed in evaluation order.
    pub fn evaluation_sequence(&self) -> Vec<usize> {
        (0..self.count).rev().collect()
    }

    fn mirror(&self, index: usize) -> SolverResult<usize> {
        if index >= self.count {
            return Err(SolverError::InvalidArg {
                what: "station index out of range",
            });
        }
        Ok(self.count - 1 - index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverses_design_order() {
        let ordering = StationOrdering::new(5);
        assert_eq!(ordering.design_to_evaluation(0).unwrap(), 4);
        assert_eq!(ordering.design_to_evaluation(4).unwrap(), 0);
        assert_eq!(ordering.evaluation_to_design(1).unwrap(), 3);
        assert_eq!(ordering.evaluation_sequence(), vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn round_trips_every_index() {
        let ordering = StationOrdering::new(7);
        for i in 0..7 {
            let j = ordering.design_to_evaluation(i).unwrap();
            assert_eq!(ordering.evaluation_to_design(j).unwrap(), i);
            assert_eq!(ordering.evaluation_sequence()[j], i);
        }
    }

    #[test]
    fn rejects_out_of_range() {
        let ordering = StationOrdering::new(3);
        assert!(ordering.design_to_evaluation(3).is_err());
        assert!(StationOrdering::new(0).evaluation_to_design(0).is_err());
    }
}

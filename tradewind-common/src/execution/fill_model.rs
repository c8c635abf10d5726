//! The probabilistic fill model for the simulated venue.
//!
//! Two independent Bernoulli draws shape each triggered fill:
//!
//! - `prob_fill_at_limit`: does a triggered passive order fill at its own
//!   price, or slip one tick in the adverse direction?
//! - `prob_slippage`: does an aggressive fill (market, triggered stop)
//!   suffer one tick of adverse slippage?
//!
//! The model is seeded: identical seeds produce identical draw sequences,
//! which is what makes backtests replayable. An optional scripted queue of
//! partial-fill quantities simulates thin liquidity; an entry of zero means
//! the trigger yields no fill at all.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{require, TradingError};
use crate::types::Quantity;

#[derive(Debug, Clone)]
pub struct FillModel {
    prob_fill_at_limit: f64,
    prob_slippage: f64,
    seed: u64,
    rng: StdRng,
    partial_quantities: VecDeque<Quantity>,
    scripted_partials: Vec<Quantity>,
}

impl FillModel {
    pub fn new(
        prob_fill_at_limit: f64,
        prob_slippage: f64,
        seed: u64,
    ) -> Result<Self, TradingError> {
        require(
            (0.0..=1.0).contains(&prob_fill_at_limit),
            "prob_fill_at_limit must be within [0, 1]",
        )?;
        require(
            (0.0..=1.0).contains(&prob_slippage),
            "prob_slippage must be within [0, 1]",
        )?;
        Ok(Self {
            prob_fill_at_limit,
            prob_slippage,
            seed,
            rng: StdRng::seed_from_u64(seed),
            partial_quantities: VecDeque::new(),
            scripted_partials: Vec::new(),
        })
    }

    /// Always fill at the passive price, never slip.
    pub fn deterministic_fill(seed: u64) -> Self {
        Self::new(1.0, 0.0, seed).expect("probabilities are in range")
    }

    /// Script per-trigger fill quantities; a zero entry means no fill for
    /// that trigger. Once the script is exhausted, triggers fill in full.
    pub fn with_partial_fills(mut self, quantities: Vec<Quantity>) -> Self {
        self.partial_quantities = quantities.iter().cloned().collect();
        self.scripted_partials = quantities;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draw: does this passive order fill at its own price?
    pub fn is_filled_at_limit(&mut self) -> bool {
        self.rng.gen_bool(self.prob_fill_at_limit)
    }

    /// Draw: does this aggressive fill slip one tick?
    pub fn is_slipped(&mut self) -> bool {
        self.rng.gen_bool(self.prob_slippage)
    }

    /// The scripted quantity for the next trigger, if any remain.
    pub fn next_partial_quantity(&mut self) -> Option<Quantity> {
        self.partial_quantities.pop_front()
    }

    /// Restore the draw sequence and the scripted quantities.
    pub fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
        self.partial_quantities = self.scripted_partials.iter().cloned().collect();
    }
}

impl Default for FillModel {
    fn default() -> Self {
        Self::deterministic_fill(42)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_model_always_fills_at_limit() {
        let mut model = FillModel::deterministic_fill(1);
        for _ in 0..100 {
            assert!(model.is_filled_at_limit());
            assert!(!model.is_slipped());
        }
    }

    #[test]
    fn identical_seeds_replay_identically() {
        let mut a = FillModel::new(0.5, 0.3, 7).unwrap();
        let mut b = FillModel::new(0.5, 0.3, 7).unwrap();
        for _ in 0..1000 {
            assert_eq!(a.is_filled_at_limit(), b.is_filled_at_limit());
            assert_eq!(a.is_slipped(), b.is_slipped());
        }
    }

    #[test]
    fn reset_restores_the_sequence() {
        let mut model = FillModel::new(0.5, 0.5, 9).unwrap();
        let first: Vec<bool> = (0..50).map(|_| model.is_slipped()).collect();
        model.reset();
        let replay: Vec<bool> = (0..50).map(|_| model.is_slipped()).collect();
        assert_eq!(first, replay);
    }

    #[test]
    fn scripted_partials_drain_then_fall_back_to_full() {
        let mut model = FillModel::deterministic_fill(1)
            .with_partial_fills(vec![Quantity::from_units(40), Quantity::zero(0)]);
        assert_eq!(model.next_partial_quantity(), Some(Quantity::from_units(40)));
        assert_eq!(model.next_partial_quantity(), Some(Quantity::zero(0)));
        assert_eq!(model.next_partial_quantity(), None);

        model.reset();
        assert_eq!(model.next_partial_quantity(), Some(Quantity::from_units(40)));
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        assert!(FillModel::new(1.5, 0.0, 1).is_err());
        assert!(FillModel::new(0.5, -0.1, 1).is_err());
    }
}

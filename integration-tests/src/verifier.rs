//! Database invariant verification, run after every scenario.

use rust_decimal::Decimal;
use tradewind_common::database::ExecutionDatabase;
use tradewind_common::orders::OrderStatus;

/// Panics if any execution database invariant is violated:
///
/// 1. Every order in the working set is in the WORKING state.
/// 2. Every order in the completed set is in a terminal state.
/// 3. Open positions have positive quantity; closed positions have zero
///    quantity and a close timestamp.
/// 4. An order indexed to a position shares that position's strategy.
/// 5. A position's applied fill quantities sum to its cumulative volume.
pub fn verify_invariants(db: &dyn ExecutionDatabase) {
    for (order_id, order) in db.get_orders_working(None) {
        assert_eq!(
            order.status(),
            OrderStatus::Working,
            "working-set order {order_id} is in state {}",
            order.status()
        );
    }

    for (order_id, order) in db.get_orders_completed(None) {
        assert!(
            order.status().is_completed(),
            "completed-set order {order_id} is in state {}",
            order.status()
        );
    }

    for (position_id, position) in db.get_positions_open(None) {
        assert!(
            position.quantity().as_decimal() > Decimal::ZERO,
            "open position {position_id} has non-positive quantity"
        );
    }
    for (position_id, position) in db.get_positions_closed(None) {
        assert!(
            position.quantity().is_zero(),
            "closed position {position_id} has residual quantity"
        );
        assert!(
            position.closed_time().is_some(),
            "closed position {position_id} has no closed time"
        );
    }

    for order_id in db.get_order_ids() {
        if let Some(position_id) = db.get_position_id(&order_id) {
            let order_strategy = db.get_strategy_for_order(&order_id);
            let position_strategy = db.get_strategy_for_position(&position_id);
            assert_eq!(
                order_strategy, position_strategy,
                "order {order_id} and position {position_id} disagree on strategy"
            );
        }
    }

    for (position_id, position) in db.get_positions(None) {
        let fill_sum: Decimal = position
            .events()
            .iter()
            .filter_map(|event| event.as_fill())
            .map(|fill| fill.quantity.as_decimal())
            .sum();
        assert_eq!(
            fill_sum,
            position.cumulative_volume(),
            "position {position_id} fill volume mismatch"
        );
    }
}

//! Ledger consistency tests
//!
//! Property-based and unit tests for the stock/movement invariants:
//! - stock equals the signed sum of active movement quantities
//! - no sequence of successful operations leaves stock negative
//! - voiding is irreversible and repeat attempts change nothing

use proptest::prelude::*;

// ============================================================================
// Ledger model
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone)]
struct Movement {
    product: usize,
    quantity: i64, // signed: + inbound, - outbound
    kind: Kind,
    active: bool,
}

/// In-memory ledger applying the same arithmetic as the service layer.
/// Failed operations leave the ledger untouched, mirroring transaction
/// rollback.
#[derive(Debug, Default)]
struct Ledger {
    stocks: Vec<i64>,
    movements: Vec<Movement>,
}

impl Ledger {
    fn with_products(n: usize) -> Self {
        Ledger {
            stocks: vec![0; n],
            movements: Vec::new(),
        }
    }

    fn record(&mut self, product: usize, kind: Kind, magnitude: i64) -> Result<usize, ()> {
        assert!(magnitude > 0);
        let stock = self.stocks[product];
        let new_stock = match kind {
            Kind::Inbound => stock + magnitude,
            Kind::Outbound => {
                if stock < magnitude {
                    return Err(());
                }
                stock - magnitude
            }
        };
        self.stocks[product] = new_stock;
        self.movements.push(Movement {
            product,
            quantity: match kind {
                Kind::Inbound => magnitude,
                Kind::Outbound => -magnitude,
            },
            kind,
            active: true,
        });
        Ok(self.movements.len() - 1)
    }

    fn void(&mut self, id: usize) -> Result<(), ()> {
        let m = self.movements[id].clone();
        if !m.active {
            return Err(());
        }
        let stock = self.stocks[m.product];
        let magnitude = m.quantity.abs();
        let new_stock = match m.kind {
            Kind::Inbound => {
                if stock < magnitude {
                    return Err(());
                }
                stock - magnitude
            }
            Kind::Outbound => stock + magnitude,
        };
        self.stocks[m.product] = new_stock;
        self.movements[id].active = false;
        Ok(())
    }

    fn edit_quantity(&mut self, id: usize, new_magnitude: i64) -> Result<(), ()> {
        assert!(new_magnitude > 0);
        let m = self.movements[id].clone();
        if !m.active {
            return Err(());
        }
        let stock = self.stocks[m.product];
        let delta = new_magnitude - m.quantity.abs();
        let new_stock = match m.kind {
            Kind::Inbound => {
                if delta < 0 && stock < -delta {
                    return Err(());
                }
                stock + delta
            }
            Kind::Outbound => {
                if delta > 0 && stock < delta {
                    return Err(());
                }
                stock - delta
            }
        };
        self.stocks[m.product] = new_stock;
        self.movements[id].quantity = match m.kind {
            Kind::Inbound => new_magnitude,
            Kind::Outbound => -new_magnitude,
        };
        Ok(())
    }

    fn reassign(&mut self, id: usize, new_product: usize, new_magnitude: i64) -> Result<(), ()> {
        assert!(new_magnitude > 0);
        let m = self.movements[id].clone();
        if !m.active {
            return Err(());
        }
        let magnitude = m.quantity.abs();

        // Phase 1: reverse on the current product
        let reversed = match m.kind {
            Kind::Inbound => {
                let stock = self.stocks[m.product];
                if stock < magnitude {
                    return Err(());
                }
                stock - magnitude
            }
            Kind::Outbound => self.stocks[m.product] + magnitude,
        };

        // Phase 2: apply to the new product (which may be the same row)
        let base = if new_product == m.product {
            reversed
        } else {
            self.stocks[new_product]
        };
        let applied = match m.kind {
            Kind::Inbound => base + new_magnitude,
            Kind::Outbound => {
                if base < new_magnitude {
                    return Err(());
                }
                base - new_magnitude
            }
        };

        self.stocks[m.product] = reversed;
        self.stocks[new_product] = applied;
        self.movements[id].product = new_product;
        self.movements[id].quantity = match m.kind {
            Kind::Inbound => new_magnitude,
            Kind::Outbound => -new_magnitude,
        };
        Ok(())
    }

    /// Signed sum of active movement quantities per product
    fn active_sums(&self) -> Vec<i64> {
        let mut sums = vec![0; self.stocks.len()];
        for m in &self.movements {
            if m.active {
                sums[m.product] += m.quantity;
            }
        }
        sums
    }

    fn assert_consistent(&self) {
        assert_eq!(self.stocks, self.active_sums(), "stock out of sync with ledger");
        for (i, s) in self.stocks.iter().enumerate() {
            assert!(*s >= 0, "product {} has negative stock {}", i, s);
        }
    }
}

// ============================================================================
// Unit tests (scenarios)
// ============================================================================

#[test]
fn inbound_then_outbound_tracks_stock() {
    let mut ledger = Ledger::with_products(1);
    ledger.record(0, Kind::Inbound, 50).unwrap();
    assert_eq!(ledger.stocks[0], 50);
    ledger.record(0, Kind::Outbound, 20).unwrap();
    assert_eq!(ledger.stocks[0], 30);
    ledger.assert_consistent();
}

#[test]
fn voiding_partially_consumed_inbound_fails() {
    // stock 0 -> +50 -> -20 leaves 30; voiding the inbound needs 50
    let mut ledger = Ledger::with_products(1);
    let inbound = ledger.record(0, Kind::Inbound, 50).unwrap();
    ledger.record(0, Kind::Outbound, 20).unwrap();

    assert!(ledger.void(inbound).is_err());
    assert_eq!(ledger.stocks[0], 30);
    assert!(ledger.movements[inbound].active);
    ledger.assert_consistent();
}

#[test]
fn outbound_beyond_stock_fails_and_leaves_stock() {
    let mut ledger = Ledger::with_products(1);
    ledger.record(0, Kind::Inbound, 10).unwrap();

    assert!(ledger.record(0, Kind::Outbound, 15).is_err());
    assert_eq!(ledger.stocks[0], 10);
    ledger.assert_consistent();
}

#[test]
fn inbound_void_round_trip_restores_stock() {
    let mut ledger = Ledger::with_products(1);
    ledger.record(0, Kind::Inbound, 7).unwrap();
    let before = ledger.stocks[0];

    let id = ledger.record(0, Kind::Inbound, 10).unwrap();
    ledger.void(id).unwrap();

    assert_eq!(ledger.stocks[0], before);
    ledger.assert_consistent();
}

#[test]
fn editing_inbound_down_applies_negative_delta() {
    // Inbound of 20 with full headroom: editing to 5 removes 15
    let mut ledger = Ledger::with_products(1);
    let id = ledger.record(0, Kind::Inbound, 20).unwrap();

    ledger.edit_quantity(id, 5).unwrap();
    assert_eq!(ledger.stocks[0], 5);
    ledger.assert_consistent();

    // Without headroom the same edit fails
    let mut ledger = Ledger::with_products(1);
    let id = ledger.record(0, Kind::Inbound, 20).unwrap();
    ledger.record(0, Kind::Outbound, 10).unwrap(); // stock 10 < 15
    assert!(ledger.edit_quantity(id, 5).is_err());
    assert_eq!(ledger.stocks[0], 10);
    ledger.assert_consistent();
}

#[test]
fn reassigning_outbound_moves_effect_between_products() {
    let mut ledger = Ledger::with_products(2);
    ledger.record(0, Kind::Inbound, 10).unwrap();
    ledger.record(1, Kind::Inbound, 8).unwrap();
    let id = ledger.record(0, Kind::Outbound, 8).unwrap();
    assert_eq!(ledger.stocks[0], 2);

    ledger.reassign(id, 1, 8).unwrap();
    assert_eq!(ledger.stocks[0], 10); // reversal returned 8
    assert_eq!(ledger.stocks[1], 0); // reapplied against p2
    ledger.assert_consistent();
}

#[test]
fn reassigning_outbound_fails_when_target_is_short() {
    let mut ledger = Ledger::with_products(2);
    ledger.record(0, Kind::Inbound, 10).unwrap();
    ledger.record(1, Kind::Inbound, 5).unwrap();
    let id = ledger.record(0, Kind::Outbound, 8).unwrap();

    assert!(ledger.reassign(id, 1, 8).is_err());
    // Rolled back: nothing moved
    assert_eq!(ledger.stocks[0], 2);
    assert_eq!(ledger.stocks[1], 5);
    ledger.assert_consistent();
}

#[test]
fn voided_movement_rejects_all_further_edits() {
    let mut ledger = Ledger::with_products(2);
    let id = ledger.record(0, Kind::Inbound, 10).unwrap();
    ledger.void(id).unwrap();
    let stock = ledger.stocks.clone();

    assert!(ledger.void(id).is_err());
    assert!(ledger.edit_quantity(id, 5).is_err());
    assert!(ledger.reassign(id, 1, 5).is_err());

    assert_eq!(ledger.stocks, stock);
    ledger.assert_consistent();
}

#[test]
fn reassigning_to_the_same_product_reapplies_in_place() {
    let mut ledger = Ledger::with_products(1);
    let id = ledger.record(0, Kind::Inbound, 10).unwrap();

    ledger.reassign(id, 0, 4).unwrap();
    assert_eq!(ledger.stocks[0], 4);
    ledger.assert_consistent();
}

// ============================================================================
// Property tests
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Inbound { product: usize, magnitude: i64 },
    Outbound { product: usize, magnitude: i64 },
    Void { movement: usize },
    EditQuantity { movement: usize, magnitude: i64 },
    Reassign { movement: usize, product: usize, magnitude: i64 },
}

const PRODUCTS: usize = 3;

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..PRODUCTS, 1..100i64).prop_map(|(product, magnitude)| Op::Inbound { product, magnitude }),
        (0..PRODUCTS, 1..100i64)
            .prop_map(|(product, magnitude)| Op::Outbound { product, magnitude }),
        (0..64usize).prop_map(|movement| Op::Void { movement }),
        (0..64usize, 1..100i64)
            .prop_map(|(movement, magnitude)| Op::EditQuantity { movement, magnitude }),
        (0..64usize, 0..PRODUCTS, 1..100i64).prop_map(|(movement, product, magnitude)| {
            Op::Reassign { movement, product, magnitude }
        }),
    ]
}

proptest! {
    /// After any sequence of operations (successful or rejected), every
    /// product's stock equals the signed sum of its active movements and is
    /// never negative.
    #[test]
    fn stock_always_matches_active_ledger(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut ledger = Ledger::with_products(PRODUCTS);

        for op in ops {
            match op {
                Op::Inbound { product, magnitude } => {
                    let _ = ledger.record(product, Kind::Inbound, magnitude);
                }
                Op::Outbound { product, magnitude } => {
                    let _ = ledger.record(product, Kind::Outbound, magnitude);
                }
                Op::Void { movement } => {
                    if movement < ledger.movements.len() {
                        let _ = ledger.void(movement);
                    }
                }
                Op::EditQuantity { movement, magnitude } => {
                    if movement < ledger.movements.len() {
                        let _ = ledger.edit_quantity(movement, magnitude);
                    }
                }
                Op::Reassign { movement, product, magnitude } => {
                    if movement < ledger.movements.len() {
                        let _ = ledger.reassign(movement, product, magnitude);
                    }
                }
            }

            ledger.assert_consistent();
        }
    }

    /// Recording an inbound and voiding it restores the exact prior stock.
    #[test]
    fn inbound_void_round_trip(initial in 0..1000i64, magnitude in 1..100i64) {
        let mut ledger = Ledger::with_products(1);
        if initial > 0 {
            ledger.record(0, Kind::Inbound, initial).unwrap();
        }

        let id = ledger.record(0, Kind::Inbound, magnitude).unwrap();
        ledger.void(id).unwrap();

        prop_assert_eq!(ledger.stocks[0], initial);
    }

    /// A voided movement never changes stock again, however it is attacked.
    #[test]
    fn void_is_terminal(magnitude in 1..100i64, new_magnitude in 1..100i64) {
        let mut ledger = Ledger::with_products(2);
        let id = ledger.record(0, Kind::Inbound, magnitude).unwrap();
        ledger.void(id).unwrap();
        let stocks = ledger.stocks.clone();

        prop_assert!(ledger.void(id).is_err());
        prop_assert!(ledger.edit_quantity(id, new_magnitude).is_err());
        prop_assert!(ledger.reassign(id, 1, new_magnitude).is_err());
        prop_assert_eq!(ledger.stocks, stocks);
    }
}

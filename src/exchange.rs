use serde::Serialize;

use crate::balance::round_to_2_decimals;
use crate::schemas::{UserBalance, UserId};

#[derive(Clone, Debug)]
struct PersonalBalance {
    id: UserId,
    balance: f64,
}

/// A suggested transfer: `from` pays `to`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Settlement {
    pub from: UserId,
    pub to: UserId,
    pub amount: f64,
}

const CENT: f64 = 0.005;

/// Tries to settle every balance with as few transfers as possible. The
/// biggest debtor always pays the biggest creditor.
pub fn settle(balances: &[UserBalance]) -> Vec<Settlement> {
    // Divide people into payers and receivers
    let mut payers = Vec::new();
    let mut receivers = Vec::new();
    for user in balances {
        if !user.balance.is_finite() {
            tracing::warn!(user_id = user.id, "skipping non-finite balance");
            continue;
        }
        let person = PersonalBalance {
            id: user.id,
            balance: user.balance.abs(),
        };
        if user.balance <= -CENT {
            payers.push(person);
        } else if user.balance >= CENT {
            receivers.push(person);
        }
    }
    sort_for_popping(&mut payers);
    sort_for_popping(&mut receivers);

    let mut settlements = Vec::new();
    while let (Some(payer), Some(receiver)) = (payers.last_mut(), receivers.last_mut()) {
        let amount = payer.balance.min(receiver.balance);
        settlements.push(Settlement {
            from: payer.id,
            to: receiver.id,
            amount: round_to_2_decimals(amount),
        });
        payer.balance = round_to_2_decimals(payer.balance - amount);
        receiver.balance = round_to_2_decimals(receiver.balance - amount);

        // NaN counts as settled so the loop always shrinks
        let payer_done = payer.balance.is_nan() || payer.balance < CENT;
        let receiver_done = receiver.balance.is_nan() || receiver.balance < CENT;
        if payer_done {
            payers.pop();
        }
        if receiver_done {
            receivers.pop();
        }
        // the partially settled side may no longer be the largest
        if !payer_done {
            sort_for_popping(&mut payers);
        }
        if !receiver_done {
            sort_for_popping(&mut receivers);
        }
    }
    settlements
}

// Largest balance last; among equals the lowest id is last.
fn sort_for_popping(people: &mut [PersonalBalance]) {
    people.sort_by(|a, b| {
        a.balance
            .total_cmp(&b.balance)
            .then_with(|| b.id.cmp(&a.id))
    });
}

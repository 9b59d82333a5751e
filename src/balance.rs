use std::collections::HashMap;

use crate::schemas::{Expense, User, UserBalance, UserId};

type Balance = HashMap<UserId, f64>;

/// Net position of every user in `users`, in the same order.
///
/// Balances are accumulated for whatever ids the expenses mention, then only
/// the known users are read back out, so payers and participants that no
/// longer exist are dropped silently.
pub fn compute_balances(users: &[User], expenses: &[Expense]) -> Vec<UserBalance> {
    let mut balance: Balance = users.iter().map(|user| (user.id, 0.0)).collect();

    for expense in expenses {
        let participants: Vec<UserId> = expense
            .participants
            .iter()
            .copied()
            .filter(|id| *id != 0)
            .collect();
        if participants.is_empty() {
            continue;
        }
        let share = expense.amount / participants.len() as f64;
        for participant in participants {
            if participant == expense.payer_id {
                continue;
            }
            *balance.entry(participant).or_insert(0.0) -= share;
            *balance.entry(expense.payer_id).or_insert(0.0) += share;
        }
    }

    users
        .iter()
        .map(|user| UserBalance {
            id: user.id,
            name: user.name.clone(),
            balance: round_to_2_decimals(balance.get(&user.id).copied().unwrap_or(0.0)),
        })
        .collect()
}

pub(crate) fn round_to_2_decimals(n: f64) -> f64 {
    let scaled = n * 100.0;
    // too large to carry cents anyway
    if !scaled.is_finite() {
        return n;
    }
    let rounded = scaled.round() / 100.0;
    // avoid serializing "-0.0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

//! Persistence for users and expenses.

use async_trait::async_trait;

use crate::error::Result;
use crate::schemas::{Expense, ExpenseDraft, ExpenseId, User, UserId};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Users and expenses read as one consistent view.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    /// Ordered by id ascending.
    pub users: Vec<User>,
    /// Newest first.
    pub expenses: Vec<Expense>,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Stores a user under the smallest positive id not already taken.
    async fn create_user(&self, name: String) -> Result<User>;

    /// Returns whether a user was removed. Expenses are left alone.
    async fn delete_user(&self, id: UserId) -> Result<bool>;

    async fn list_users(&self) -> Result<Vec<User>>;

    async fn create_expense(&self, draft: ExpenseDraft) -> Result<Expense>;

    /// Returns whether an expense was removed.
    async fn delete_expense(&self, id: ExpenseId) -> Result<bool>;

    async fn list_expenses(&self) -> Result<Vec<Expense>>;

    async fn snapshot(&self) -> Result<Snapshot>;
}

/// Newest first, highest id first among expenses created at the same instant.
pub(crate) fn sort_newest_first(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

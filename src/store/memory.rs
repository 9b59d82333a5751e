use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{sort_newest_first, LedgerStore, Snapshot};
use crate::error::Result;
use crate::ids::next_user_id;
use crate::schemas::{Expense, ExpenseDraft, ExpenseId, User, UserId};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    expenses: Vec<Expense>,
    last_expense_id: ExpenseId,
}

/// Keeps everything in process memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn create_user(&self, name: String) -> Result<User> {
        let mut tables = self.tables.write().await;
        let id = next_user_id(tables.users.keys().copied());
        let user = User { id, name };
        tables.users.insert(id, user.clone());
        tracing::debug!(user_id = id, "user created");
        Ok(user)
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        Ok(self.tables.write().await.users.remove(&id).is_some())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn create_expense(&self, draft: ExpenseDraft) -> Result<Expense> {
        let mut tables = self.tables.write().await;
        tables.last_expense_id += 1;
        let expense = draft.into_expense(tables.last_expense_id, Utc::now());
        tables.expenses.push(expense.clone());
        tracing::debug!(expense_id = expense.id, "expense created");
        Ok(expense)
    }

    async fn delete_expense(&self, id: ExpenseId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.expenses.len();
        tables.expenses.retain(|expense| expense.id != id);
        Ok(tables.expenses.len() != before)
    }

    async fn list_expenses(&self) -> Result<Vec<Expense>> {
        let mut expenses = self.tables.read().await.expenses.clone();
        sort_newest_first(&mut expenses);
        Ok(expenses)
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let tables = self.tables.read().await;
        let users = tables.users.values().cloned().collect();
        let mut expenses = tables.expenses.clone();
        drop(tables);
        sort_newest_first(&mut expenses);
        Ok(Snapshot { users, expenses })
    }
}

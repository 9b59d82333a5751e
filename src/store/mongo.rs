use async_trait::async_trait;
use bson::doc;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    options::{
        FindOneAndUpdateOptions, FindOptions, IndexOptions, ReadConcern, ReturnDocument,
        TransactionOptions,
    },
    Client, Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};

use super::{LedgerStore, Snapshot};
use crate::error::{LedgerError, Result};
use crate::ids::next_user_id;
use crate::schemas::{Expense, ExpenseDraft, ExpenseId, User, UserId};

const USERS: &str = "Users";
const EXPENSES: &str = "Expenses";
const COUNTERS: &str = "Counters";
const EXPENSE_COUNTER: &str = "expenses";

/// Expense as stored in MongoDB: participants as a real array and the
/// timestamp as a BSON date.
#[derive(Clone, Debug, Deserialize, Serialize)]
struct ExpenseDocument {
    id: ExpenseId,
    payer_id: UserId,
    amount: f64,
    description: String,
    participants: Vec<UserId>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

impl From<ExpenseDocument> for Expense {
    fn from(document: ExpenseDocument) -> Self {
        Expense {
            id: document.id,
            payer_id: document.payer_id,
            amount: document.amount,
            description: document.description,
            participants: document.participants,
            created_at: document.created_at,
        }
    }
}

impl From<&Expense> for ExpenseDocument {
    fn from(expense: &Expense) -> Self {
        ExpenseDocument {
            id: expense.id,
            payer_id: expense.payer_id,
            amount: expense.amount,
            description: expense.description.clone(),
            participants: expense.participants.clone(),
            created_at: expense.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Counter {
    seq: i64,
}

pub struct MongoStore {
    client: Client,
    database: Database,
    snapshot_reads: bool,
}

impl MongoStore {
    /// Connects and makes sure the unique id indexes exist.
    ///
    /// With `snapshot_reads` the summary reads users and expenses inside a
    /// transaction, which needs a replica set or a sharded cluster.
    pub async fn connect(uri: &str, database: &str, snapshot_reads: bool) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        let database = client.database(database);
        let store = Self {
            client,
            database,
            snapshot_reads,
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<()> {
        let unique = IndexOptions::builder().unique(true).build();
        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "id": 1 })
                    .options(unique.clone())
                    .build(),
                None,
            )
            .await?;
        self.expenses()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "id": 1 })
                    .options(unique)
                    .build(),
                None,
            )
            .await?;
        Ok(())
    }

    fn users(&self) -> Collection<User> {
        self.database.collection(USERS)
    }

    fn expenses(&self) -> Collection<ExpenseDocument> {
        self.database.collection(EXPENSES)
    }

    fn counters(&self) -> Collection<Counter> {
        self.database.collection(COUNTERS)
    }

    async fn next_expense_id(&self) -> Result<ExpenseId> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let counter = self
            .counters()
            .find_one_and_update(
                doc! { "_id": EXPENSE_COUNTER },
                doc! { "$inc": { "seq": 1_i64 } },
                options,
            )
            .await?;
        counter
            .map(|counter| counter.seq)
            .ok_or_else(|| LedgerError::Storage("expense counter was not created".to_string()))
    }
}

fn users_by_id() -> FindOptions {
    FindOptions::builder().sort(doc! { "id": 1 }).build()
}

fn expenses_newest_first() -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "created_at": -1, "id": -1 })
        .build()
}

#[async_trait]
impl LedgerStore for MongoStore {
    async fn create_user(&self, name: String) -> Result<User> {
        let existing: Vec<User> = self
            .users()
            .find(None, users_by_id())
            .await?
            .try_collect()
            .await?;
        let user = User {
            id: next_user_id(existing.iter().map(|user| user.id)),
            name,
        };
        // the unique index turns a racing duplicate into a storage error
        self.users().insert_one(&user, None).await?;
        tracing::debug!(user_id = user.id, "user created");
        Ok(user)
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        let result = self.users().delete_one(doc! { "id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self
            .users()
            .find(None, users_by_id())
            .await?
            .try_collect()
            .await?)
    }

    async fn create_expense(&self, draft: ExpenseDraft) -> Result<Expense> {
        let id = self.next_expense_id().await?;
        let expense = draft.into_expense(id, Utc::now());
        self.expenses()
            .insert_one(ExpenseDocument::from(&expense), None)
            .await?;
        tracing::debug!(expense_id = id, "expense created");
        Ok(expense)
    }

    async fn delete_expense(&self, id: ExpenseId) -> Result<bool> {
        let result = self.expenses().delete_one(doc! { "id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_expenses(&self) -> Result<Vec<Expense>> {
        let documents: Vec<ExpenseDocument> = self
            .expenses()
            .find(None, expenses_newest_first())
            .await?
            .try_collect()
            .await?;
        Ok(documents.into_iter().map(Expense::from).collect())
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        if !self.snapshot_reads {
            return Ok(Snapshot {
                users: self.list_users().await?,
                expenses: self.list_expenses().await?,
            });
        }

        let mut session = self.client.start_session(None).await?;
        let options = TransactionOptions::builder()
            .read_concern(ReadConcern::snapshot())
            .build();
        session.start_transaction(options).await?;

        let mut cursor = self
            .users()
            .find_with_session(None, users_by_id(), &mut session)
            .await?;
        let users: Vec<User> = cursor.stream(&mut session).try_collect().await?;

        let mut cursor = self
            .expenses()
            .find_with_session(None, expenses_newest_first(), &mut session)
            .await?;
        let documents: Vec<ExpenseDocument> = cursor.stream(&mut session).try_collect().await?;

        session.commit_transaction().await?;
        Ok(Snapshot {
            users,
            expenses: documents.into_iter().map(Expense::from).collect(),
        })
    }
}

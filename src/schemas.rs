use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{LedgerError, Result};

pub type UserId = i64;
pub type ExpenseId = i64;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub payer_id: UserId,
    pub amount: f64,
    pub description: String,
    #[serde(with = "participant_list")]
    pub participants: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserBalance {
    pub id: UserId,
    pub name: String,
    pub balance: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub users: Vec<UserBalance>,
    pub expenses: Vec<Expense>,
}

/// Body of `POST /api/users`.
#[derive(Debug, Default, Deserialize)]
pub struct NewUser {
    pub name: Option<String>,
}

impl NewUser {
    pub fn into_name(self) -> Result<String> {
        match self.name {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(LedgerError::validation("name required")),
        }
    }
}

/// Body of `POST /api/expenses`. Every field is optional here so that a
/// missing one is reported as a validation error rather than a parse error.
#[derive(Debug, Default, Deserialize)]
pub struct NewExpense {
    pub payer_id: Option<UserId>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "participant_list::deserialize_optional")]
    pub participants: Option<Vec<UserId>>,
}

/// Largest accepted amount. Balances are kept in cents as `f64`, which stays
/// exact well past this and never overflows when summed.
pub const MAX_AMOUNT: f64 = 1e13;

/// A validated expense waiting for an id and a timestamp from the store.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseDraft {
    payer_id: UserId,
    amount: f64,
    description: String,
    participants: Vec<UserId>,
}

impl ExpenseDraft {
    pub fn new(
        payer_id: UserId,
        amount: f64,
        description: impl Into<String>,
        participants: Vec<UserId>,
    ) -> Result<Self> {
        if payer_id == 0 || !amount.is_finite() || amount <= 0.0 || participants.is_empty() {
            return Err(LedgerError::validation("missing fields"));
        }
        if amount > MAX_AMOUNT {
            return Err(LedgerError::validation(format!(
                "amount must not exceed {MAX_AMOUNT}"
            )));
        }
        Ok(Self {
            payer_id,
            amount,
            description: description.into(),
            participants,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn participants(&self) -> &[UserId] {
        &self.participants
    }

    pub fn into_expense(self, id: ExpenseId, created_at: DateTime<Utc>) -> Expense {
        Expense {
            id,
            payer_id: self.payer_id,
            amount: self.amount,
            description: self.description,
            participants: self.participants,
            created_at,
        }
    }
}

impl TryFrom<NewExpense> for ExpenseDraft {
    type Error = LedgerError;

    fn try_from(body: NewExpense) -> Result<Self> {
        match (body.payer_id, body.amount, body.participants) {
            (Some(payer_id), Some(amount), Some(participants)) => ExpenseDraft::new(
                payer_id,
                amount,
                body.description.unwrap_or_default(),
                participants,
            ),
            _ => Err(LedgerError::validation("missing fields")),
        }
    }
}

/// Participants travel as a comma-joined string of ids ("1,2,3"). Incoming
/// bodies may also send a plain JSON array.
pub mod participant_list {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        List(Vec<UserId>),
        Joined(String),
    }

    impl From<Wire> for Vec<UserId> {
        fn from(wire: Wire) -> Self {
            match wire {
                Wire::List(ids) => ids,
                Wire::Joined(joined) => parse(&joined),
            }
        }
    }

    /// Pieces that are not integers become 0, which the balance engine ignores.
    pub fn parse(joined: &str) -> Vec<UserId> {
        if joined.is_empty() {
            return vec![];
        }
        joined
            .split(',')
            .map(|piece| piece.trim().parse().unwrap_or(0))
            .collect()
    }

    pub fn join(ids: &[UserId]) -> String {
        ids.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn serialize<S: Serializer>(
        ids: &[UserId],
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&join(ids))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Vec<UserId>, D::Error> {
        Wire::deserialize(deserializer).map(Vec::from)
    }

    pub fn deserialize_optional<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<Vec<UserId>>, D::Error> {
        Ok(Option::<Wire>::deserialize(deserializer)?.map(Vec::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: serde_json::Value) -> NewExpense {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(NewUser { name: None }.into_name().is_err());
        assert!(NewUser {
            name: Some(String::new())
        }
        .into_name()
        .is_err());

        let named = NewUser {
            name: Some("Ana".into()),
        };
        assert_eq!(named.into_name().unwrap(), "Ana");
    }

    #[test]
    fn draft_requires_payer_amount_and_participants() {
        let missing_payer = body(json!({ "amount": 10.0, "participants": [1] }));
        assert!(ExpenseDraft::try_from(missing_payer).is_err());

        let zero_payer = body(json!({ "payer_id": 0, "amount": 10.0, "participants": [1] }));
        assert!(ExpenseDraft::try_from(zero_payer).is_err());

        let negative = body(json!({ "payer_id": 1, "amount": -5.0, "participants": [1] }));
        assert!(ExpenseDraft::try_from(negative).is_err());

        let zero_amount = body(json!({ "payer_id": 1, "amount": 0, "participants": [1] }));
        assert!(ExpenseDraft::try_from(zero_amount).is_err());

        let no_participants = body(json!({ "payer_id": 1, "amount": 5.0, "participants": [] }));
        assert!(ExpenseDraft::try_from(no_participants).is_err());
    }

    #[test]
    fn oversized_amount_is_rejected() {
        assert!(ExpenseDraft::new(1, MAX_AMOUNT, "", vec![2]).is_ok());
        assert!(ExpenseDraft::new(1, MAX_AMOUNT * 1.5, "", vec![2]).is_err());
        assert!(ExpenseDraft::new(1, 1e307, "", vec![2]).is_err());
        assert!(ExpenseDraft::new(1, f64::INFINITY, "", vec![2]).is_err());
    }

    #[test]
    fn draft_defaults_description_and_keeps_duplicates() {
        let draft = ExpenseDraft::try_from(body(json!({
            "payer_id": 1,
            "amount": 12.5,
            "participants": [2, 2, 3]
        })))
        .unwrap();
        assert_eq!(draft.description(), "");
        assert_eq!(draft.participants(), &[2, 2, 3]);
    }

    #[test]
    fn participants_accept_joined_string() {
        let draft = ExpenseDraft::try_from(body(json!({
            "payer_id": 1,
            "amount": 3.0,
            "participants": "1,x,3"
        })))
        .unwrap();
        assert_eq!(draft.participants(), &[1, 0, 3]);
    }

    #[test]
    fn expense_serializes_participants_joined() {
        let expense = ExpenseDraft::new(1, 9.0, "pizza", vec![1, 2, 3])
            .unwrap()
            .into_expense(7, Utc::now());
        let value = serde_json::to_value(&expense).unwrap();
        assert_eq!(value["participants"], json!("1,2,3"));
        assert_eq!(value["id"], json!(7));
        assert_eq!(value["description"], json!("pizza"));

        let back: Expense = serde_json::from_value(value).unwrap();
        assert_eq!(back.participants, vec![1, 2, 3]);
    }
}

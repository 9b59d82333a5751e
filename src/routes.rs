use actix_web::{delete, error, get, post, web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::balance::compute_balances;
use crate::error::Result;
use crate::exchange::settle;
use crate::schemas::{ExpenseDraft, ExpenseId, NewExpense, NewUser, Summary, UserId};
use crate::store::LedgerStore;

type Store = web::Data<dyn LedgerStore>;

/// Registers every `/api` route plus JSON bodies for extractor failures.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .service(
            web::scope("/api")
                .service(list_users)
                .service(add_user)
                .service(remove_user)
                .service(list_expenses)
                .service(add_expense)
                .service(remove_expense)
                .service(get_summary)
                .service(get_settlements),
        );
}

fn bad_request(message: String) -> actix_web::Error {
    error::InternalError::from_response(
        message.clone(),
        HttpResponse::BadRequest().json(json!({ "error": message })),
    )
    .into()
}

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    bad_request(err.to_string())
}

fn path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    bad_request(err.to_string())
}

fn ok() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "ok": true }))
}

#[get("/users")]
async fn list_users(store: Store) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(store.list_users().await?))
}

#[post("/users")]
async fn add_user(store: Store, body: web::Json<NewUser>) -> Result<HttpResponse> {
    let name = body.into_inner().into_name()?;
    let user = store.create_user(name).await?;
    tracing::info!(user_id = user.id, "user added");
    Ok(HttpResponse::Ok().json(user))
}

#[delete("/users/{id}")]
async fn remove_user(store: Store, id: web::Path<UserId>) -> Result<HttpResponse> {
    let id = id.into_inner();
    if !store.delete_user(id).await? {
        tracing::debug!(user_id = id, "delete of unknown user ignored");
    }
    Ok(ok())
}

#[get("/expenses")]
async fn list_expenses(store: Store) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(store.list_expenses().await?))
}

#[post("/expenses")]
async fn add_expense(store: Store, body: web::Json<NewExpense>) -> Result<HttpResponse> {
    let draft = ExpenseDraft::try_from(body.into_inner())?;
    let expense = store.create_expense(draft).await?;
    tracing::info!(
        expense_id = expense.id,
        payer_id = expense.payer_id,
        amount = expense.amount,
        "expense added"
    );
    Ok(HttpResponse::Ok().json(expense))
}

#[delete("/expenses/{id}")]
async fn remove_expense(store: Store, id: web::Path<ExpenseId>) -> Result<HttpResponse> {
    let id = id.into_inner();
    if !store.delete_expense(id).await? {
        tracing::debug!(expense_id = id, "delete of unknown expense ignored");
    }
    Ok(ok())
}

#[get("/summary")]
async fn get_summary(store: Store) -> Result<HttpResponse> {
    let snapshot = store.snapshot().await?;
    let users = compute_balances(&snapshot.users, &snapshot.expenses);
    Ok(HttpResponse::Ok().json(Summary {
        users,
        expenses: snapshot.expenses,
    }))
}

#[get("/settlements")]
async fn get_settlements(store: Store) -> Result<HttpResponse> {
    let snapshot = store.snapshot().await?;
    let balances = compute_balances(&snapshot.users, &snapshot.expenses);
    Ok(HttpResponse::Ok().json(settle(&balances)))
}

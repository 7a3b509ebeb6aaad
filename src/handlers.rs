use crate::dashboard::{ctr_view, domains_view, earnings_view, summary_view};
use crate::errors::AppError;
use crate::models::{
    Account, ConnectResponse, CtrView, DeleteResponse, DomainsSource, EarningsSource,
    MultiAccountSummary, NewAccount, UploadResponse, ValidateResponse, ViewQuery, ALL_ACCOUNTS,
};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::Html,
    Json,
};
use tracing::info;

pub async fn index() -> Html<&'static str> {
    Html(render_index())
}

pub async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<Account>>, AppError> {
    Ok(Json(state.client.list_accounts().await?))
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(account_key): Path<String>,
) -> Result<Json<Account>, AppError> {
    Ok(Json(state.client.get_account(&account_key).await?))
}

pub async fn get_earnings(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<EarningsSource>, AppError> {
    let account = resolve_account(&state, &query).await?;
    let view = earnings_view(&state, &account, &query.date_query()).await?;
    Ok(Json(view))
}

pub async fn get_domains(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<DomainsSource>, AppError> {
    let account = resolve_account(&state, &query).await?;
    let view = domains_view(&state, &account, query.domain_filter(), &query.date_query()).await?;
    Ok(Json(view))
}

pub async fn get_ctr(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<CtrView>, AppError> {
    let account = resolve_account(&state, &query).await?;
    Ok(Json(ctr_view(&state, &account, &query.date_query()).await?))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<MultiAccountSummary>, AppError> {
    Ok(Json(summary_view(&state, &query.date_query()).await?))
}

pub async fn upload_account(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut account = NewAccount::default();
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("credentials.json").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::bad_request(e.to_string()))?;
            file = Some((file_name, bytes.to_vec()));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::bad_request(e.to_string()))?;
        match name.as_str() {
            "account_key" => account.account_key = value.trim().to_string(),
            "display_name" => account.display_name = value.trim().to_string(),
            "account_id" => account.account_id = Some(value),
            "description" => account.description = Some(value),
            "website_url" => account.website_url = Some(value),
            "category" => account.category = Some(value),
            _ => {}
        }
    }

    let Some((file_name, contents)) = file else {
        return Err(AppError::bad_request("a credentials file is required"));
    };

    let key = account.account_key.clone();
    let response = state.client.upload_account(account, file_name, contents).await?;
    info!(account = %key, success = response.success, "uploaded account credentials");
    Ok(Json(response))
}

pub async fn connect_account(
    State(state): State<AppState>,
    Path(account_key): Path<String>,
) -> Result<Json<ConnectResponse>, AppError> {
    Ok(Json(state.client.connect_account(&account_key).await?))
}

pub async fn validate_account(
    State(state): State<AppState>,
    Path(account_key): Path<String>,
) -> Result<Json<ValidateResponse>, AppError> {
    Ok(Json(state.client.validate_account(&account_key).await?))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(account_key): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let response = state.client.delete_account(&account_key).await?;
    info!(account = %account_key, "removed account");
    Ok(Json(response))
}

/// Explicit selection wins; otherwise the first active account, then `all`.
async fn resolve_account(state: &AppState, query: &ViewQuery) -> Result<String, AppError> {
    if let Some(account) = query.account.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        return Ok(account.to_string());
    }
    let first_active = state
        .client
        .active_account_keys()
        .await?
        .into_iter()
        .next();
    Ok(first_active.unwrap_or_else(|| ALL_ACCOUNTS.to_string()))
}

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::application::{AppError, WalletService};
use crate::domain::{Amount, Wallet, WalletId};
use crate::storage::WalletStore;

use super::ApiError;

/// Body of `POST /api/v1/wallets/:wallet_id`.
#[derive(Debug, Deserialize)]
pub struct OperationBody {
    pub operation_type: String,
    pub amount: Amount,
}

fn parse_wallet_id(raw: &str) -> Result<WalletId, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidWalletId(raw.to_string()))
}

pub async fn health_check<S: WalletStore>(
    State(service): State<WalletService<S>>,
) -> (StatusCode, &'static str) {
    match service.health_check().await {
        Ok(()) => (StatusCode::OK, "OK\n"),
        Err(err) => {
            error!(error = %err, "database health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database health check failed\n",
            )
        }
    }
}

pub async fn create_wallet<S: WalletStore>(
    State(service): State<WalletService<S>>,
) -> Result<(StatusCode, String), ApiError> {
    let wallet = service.create_wallet().await?;
    Ok((StatusCode::CREATED, format!("{}\n", wallet.id)))
}

pub async fn list_wallets<S: WalletStore>(
    State(service): State<WalletService<S>>,
) -> Result<Json<Vec<Wallet>>, ApiError> {
    Ok(Json(service.list_wallets().await?))
}

pub async fn get_balance<S: WalletStore>(
    State(service): State<WalletService<S>>,
    Path(wallet_id): Path<String>,
) -> Result<String, ApiError> {
    let wallet_id = parse_wallet_id(&wallet_id)?;
    let balance = service.get_balance(wallet_id).await?;
    Ok(format!("{}\n", balance))
}

pub async fn apply_operation<S: WalletStore>(
    State(service): State<WalletService<S>>,
    Path(wallet_id): Path<String>,
    body: Result<Json<OperationBody>, JsonRejection>,
) -> Result<String, ApiError> {
    let wallet_id = parse_wallet_id(&wallet_id)?;
    let Json(body) = body.map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))?;

    let balance = service
        .apply_operation(wallet_id, &body.operation_type, body.amount)
        .await?;
    Ok(format!("{}\n", balance))
}

pub async fn delete_wallet<S: WalletStore>(
    State(service): State<WalletService<S>>,
    Path(wallet_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let wallet_id = parse_wallet_id(&wallet_id)?;
    service.delete_wallet(wallet_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

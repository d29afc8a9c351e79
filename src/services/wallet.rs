use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::{transactions, wallet};
use crate::repositories::{transactions::TransactionRepository, wallet::WalletRepository};

const TRANSACTION_PAGE_SIZE: i64 = 50;

pub enum WalletRequest {
    GetWallet {
        user_id: String,
        response: oneshot::Sender<Result<Option<wallet::Wallet>, ServiceError>>,
    },
    GetTransactions {
        user_id: String,
        response: oneshot::Sender<Result<Vec<transactions::Transaction>, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct WalletRequestHandler {
    wallet_repository: WalletRepository,
    transaction_repository: TransactionRepository,
}

impl WalletRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        let wallet_repository = WalletRepository::new(sql_conn.clone());
        let transaction_repository = TransactionRepository::new(sql_conn);

        WalletRequestHandler {
            wallet_repository,
            transaction_repository,
        }
    }

    async fn get_wallet(&self, user_id: &str) -> Result<Option<wallet::Wallet>, ServiceError> {
        self.wallet_repository
            .get_wallet(user_id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn get_transactions(
        &self,
        user_id: &str,
    ) -> Result<Vec<transactions::Transaction>, ServiceError> {
        self.transaction_repository
            .list_transactions(user_id, TRANSACTION_PAGE_SIZE)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }
}

#[async_trait]
impl RequestHandler<WalletRequest> for WalletRequestHandler {
    async fn handle_request(&self, request: WalletRequest) {
        match request {
            WalletRequest::GetWallet { user_id, response } => {
                let wallet = self.get_wallet(&user_id).await;
                let _ = response.send(wallet);
            }
            WalletRequest::GetTransactions { user_id, response } => {
                let transactions = self.get_transactions(&user_id).await;
                let _ = response.send(transactions);
            }
        }
    }
}

pub struct WalletService;

impl WalletService {
    pub fn new() -> Self {
        WalletService {}
    }
}

#[async_trait]
impl Service<WalletRequest, WalletRequestHandler> for WalletService {}

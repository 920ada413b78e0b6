//! Horizon REST client
//!
//! Talks to a Horizon server for account lookups, transaction submission and
//! history. Network-level failures and ledger rejections are kept apart so the
//! payment flow can tell a flaky connection from a refused transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::traits::{AccountInfo, LedgerApi, SignedEnvelope, SubmitResponse, TransactionRecord};
use crate::core::config::WalletConfig;
use crate::core::domain::AccountId;
use crate::core::errors::WalletError;

/// Horizon never returns more than this many records per page.
pub const MAX_PAGE_LIMIT: u32 = 200;

#[derive(Debug, Deserialize)]
struct AccountResponse {
    account_id: String,
    sequence: String,
    #[serde(default)]
    balances: Vec<BalanceLine>,
}

#[derive(Debug, Deserialize)]
struct BalanceLine {
    balance: String,
    asset_type: String,
}

#[derive(Debug, Deserialize)]
struct SubmitSuccess {
    hash: String,
    #[serde(default)]
    ledger: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct Problem {
    #[serde(rename = "type", default)]
    problem_type: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: String,
    #[serde(default)]
    extras: Option<ProblemExtras>,
}

#[derive(Debug, Deserialize)]
struct ProblemExtras {
    #[serde(default)]
    result_codes: Option<ResultCodes>,
}

#[derive(Debug, Deserialize)]
struct ResultCodes {
    transaction: String,
    #[serde(default)]
    operations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(rename = "_embedded")]
    embedded: Embedded<T>,
}

#[derive(Debug, Deserialize)]
struct Embedded<T> {
    records: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TransactionResource {
    hash: String,
    ledger: u32,
    created_at: DateTime<Utc>,
    source_account: String,
    fee_charged: Value,
    operation_count: u32,
    successful: bool,
    #[serde(default)]
    memo_type: Option<String>,
    #[serde(default)]
    memo: Option<String>,
}

impl From<TransactionResource> for TransactionRecord {
    fn from(r: TransactionResource) -> Self {
        let fee_charged = match r.fee_charged {
            Value::String(s) => s,
            other => other.to_string(),
        };
        let memo = match r.memo_type.as_deref() {
            Some("none") | None => None,
            _ => r.memo,
        };
        TransactionRecord {
            hash: r.hash,
            ledger: r.ledger,
            created_at: r.created_at,
            source_account: r.source_account,
            fee_charged,
            operation_count: r.operation_count,
            successful: r.successful,
            memo,
        }
    }
}

/// Horizon client
#[derive(Debug, Clone)]
pub struct HorizonClient {
    base_url: String,
    http_client: HttpClient,
}

impl HorizonClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WalletError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|e| {
            WalletError::ConfigError(format!("Invalid Horizon URL '{}': {}", base_url, e))
        })?;

        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WalletError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        info!(url = %base_url, "Using Horizon server");
        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn from_config(config: &WalletConfig) -> Result<Self, WalletError> {
        Self::new(
            config.network.horizon_url(),
            Duration::from_secs(config.client.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_problem(response: reqwest::Response) -> Problem {
        let status = response.status();
        match response.json::<Problem>().await {
            Ok(problem) => problem,
            Err(_) => Problem {
                title: status.to_string(),
                ..Default::default()
            },
        }
    }

    fn transport_error(status: StatusCode, problem: &Problem) -> WalletError {
        let message = if problem.detail.is_empty() {
            format!("Horizon returned {} {}", status.as_u16(), problem.title)
        } else {
            format!(
                "Horizon returned {} {}: {}",
                status.as_u16(),
                problem.title,
                problem.detail
            )
        };
        if status == StatusCode::GATEWAY_TIMEOUT || problem.problem_type.ends_with("/timeout") {
            WalletError::TimeoutError(message)
        } else {
            WalletError::NetworkError(message)
        }
    }
}

#[async_trait]
impl LedgerApi for HorizonClient {
    async fn load_account(&self, account: &AccountId) -> Result<AccountInfo, WalletError> {
        let url = format!("{}/accounts/{}", self.base_url, account);
        debug!(account = %account, "Loading account");

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(WalletError::NotFoundError(format!(
                "account {} does not exist on this network",
                account
            )));
        }
        if !status.is_success() {
            let problem = Self::read_problem(response).await;
            return Err(Self::transport_error(status, &problem));
        }

        let body: AccountResponse = response.json().await?;
        let sequence = body.sequence.parse::<i64>().map_err(|e| {
            WalletError::SerializationError(format!("bad sequence '{}': {}", body.sequence, e))
        })?;
        let native_balance = body
            .balances
            .iter()
            .find(|b| b.asset_type == "native")
            .map(|b| b.balance.clone())
            .unwrap_or_else(|| "0.0000000".to_string());

        Ok(AccountInfo {
            account_id: body.account_id,
            sequence,
            native_balance,
        })
    }

    async fn submit_transaction(
        &self,
        envelope: &SignedEnvelope,
    ) -> Result<SubmitResponse, WalletError> {
        let url = format!("{}/transactions", self.base_url);
        info!(hash = %envelope.hash, "Submitting transaction");

        let response = self
            .http_client
            .post(&url)
            .form(&[("tx", envelope.xdr.as_str())])
            .send()
            .await?;
        let status = response.status();

        if status.is_success() {
            // the ledger took it; an unreadable body must not look like a retryable failure
            let body = match response.json::<SubmitSuccess>().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(hash = %envelope.hash, error = %e, "Accepted, but response body was unreadable");
                    SubmitSuccess {
                        hash: envelope.hash.clone(),
                        ledger: None,
                    }
                }
            };
            info!(hash = %body.hash, ledger = ?body.ledger, "✅ Transaction accepted");
            return Ok(SubmitResponse {
                hash: body.hash,
                ledger: body.ledger,
            });
        }

        let problem = Self::read_problem(response).await;
        if status == StatusCode::BAD_REQUEST {
            let (result_code, operation_codes) =
                match problem.extras.and_then(|extras| extras.result_codes) {
                    Some(codes) => (codes.transaction, codes.operations),
                    None => {
                        let kind = problem
                            .problem_type
                            .rsplit('/')
                            .next()
                            .filter(|s| !s.is_empty())
                            .unwrap_or("bad_request")
                            .to_string();
                        (kind, Vec::new())
                    }
                };
            warn!(
                hash = %envelope.hash,
                result_code = %result_code,
                operations = ?operation_codes,
                "Transaction rejected by ledger"
            );
            return Err(WalletError::TransactionRejected {
                result_code,
                operation_codes,
            });
        }

        warn!(hash = %envelope.hash, status = status.as_u16(), "Submission failed");
        Err(Self::transport_error(status, &problem))
    }

    async fn list_transactions(
        &self,
        account: &AccountId,
        limit: u32,
    ) -> Result<Vec<TransactionRecord>, WalletError> {
        let limit = limit.clamp(1, MAX_PAGE_LIMIT);
        let url = format!("{}/accounts/{}/transactions", self.base_url, account);
        debug!(account = %account, limit, "Fetching transaction history");

        let response = self
            .http_client
            .get(&url)
            .query(&[("limit", limit.to_string()), ("order", "desc".to_string())])
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            // unfunded accounts simply have no history
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let problem = Self::read_problem(response).await;
            return Err(Self::transport_error(status, &problem));
        }

        let page: Page<TransactionResource> = response.json().await?;
        let records: Vec<TransactionRecord> = page
            .embedded
            .records
            .into_iter()
            .map(TransactionRecord::from)
            .collect();
        debug!(count = records.len(), "Fetched transaction history");
        Ok(records)
    }
}

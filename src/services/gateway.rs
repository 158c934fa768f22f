// src/services/gateway.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// Falhas da função remota. O texto da resposta sobe sem tradução.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("Resposta inesperada: {0}")]
    Decode(String),
}

/// Cliente com login próprio: a função remota grava a linha do cliente
/// e a identidade de autenticação no mesmo passo.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerAccount {
    pub company_id: Uuid,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOperatorAccount {
    pub company_id: Uuid,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

/// Linha criada pela função remota (`id`) e a identidade vinculada.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAccount {
    pub id: Uuid,
    pub profile_id: Uuid,
}

/// Funções privilegiadas executadas fora deste serviço. Cada chamada cria
/// a linha de domínio e o login juntos; não há escrita local complementar.
#[async_trait]
pub trait FunctionGateway: Send + Sync {
    async fn create_customer_account(
        &self,
        request: &CreateCustomerAccount,
    ) -> Result<CreatedAccount, GatewayError>;

    async fn create_operator_account(
        &self,
        request: &CreateOperatorAccount,
    ) -> Result<CreatedAccount, GatewayError>;
}

#[derive(Clone)]
pub struct HttpFunctionGateway {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl HttpFunctionGateway {
    pub fn new(base_url: &str, service_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        })
    }

    async fn invoke<T: Serialize + Sync>(
        &self,
        function: &str,
        body: &T,
    ) -> Result<CreatedAccount, GatewayError> {
        let url = format!("{}/{}", self.base_url, function);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(function, status = status.as_u16(), "Função remota falhou: {}", message);
            return Err(GatewayError::Remote { status: status.as_u16(), message });
        }

        response
            .json::<CreatedAccount>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl FunctionGateway for HttpFunctionGateway {
    async fn create_customer_account(
        &self,
        request: &CreateCustomerAccount,
    ) -> Result<CreatedAccount, GatewayError> {
        self.invoke("create-customer", request).await
    }

    async fn create_operator_account(
        &self,
        request: &CreateOperatorAccount,
    ) -> Result<CreatedAccount, GatewayError> {
        self.invoke("create-operator", request).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Gateway em memória: registra chamadas, guarda os clientes criados
    /// e falha para e-mails marcados.
    #[derive(Default)]
    pub struct RecordingGateway {
        pub calls: Mutex<Vec<String>>,
        pub created: Mutex<Vec<CreateCustomerAccount>>,
        pub reject_emails: Vec<String>,
    }

    impl RecordingGateway {
        pub fn rejecting(emails: &[&str]) -> Self {
            Self {
                reject_emails: emails.iter().map(|e| e.to_string()).collect(),
                ..Default::default()
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn created_customers(&self) -> Vec<CreateCustomerAccount> {
            self.created.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FunctionGateway for RecordingGateway {
        async fn create_customer_account(
            &self,
            request: &CreateCustomerAccount,
        ) -> Result<CreatedAccount, GatewayError> {
            self.calls.lock().unwrap().push(request.email.clone());
            if self.reject_emails.contains(&request.email) {
                return Err(GatewayError::Remote {
                    status: 422,
                    message: format!("User already registered: {}", request.email),
                });
            }
            self.created.lock().unwrap().push(request.clone());
            Ok(CreatedAccount { id: Uuid::new_v4(), profile_id: Uuid::new_v4() })
        }

        async fn create_operator_account(
            &self,
            request: &CreateOperatorAccount,
        ) -> Result<CreatedAccount, GatewayError> {
            self.calls.lock().unwrap().push(request.email.clone());
            Ok(CreatedAccount { id: Uuid::new_v4(), profile_id: Uuid::new_v4() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_displays_raw_body() {
        let err = GatewayError::Remote { status: 400, message: "email already exists".into() };
        assert_eq!(err.to_string(), "email already exists");
    }

    #[test]
    fn created_account_reads_row_and_identity() {
        let body = r#"{"id":"7b1c6c52-4f64-4a53-9d1e-0c6a1f1f2b10","profileId":"0f0b6c1e-2a4d-4b8e-9d61-1c1b5e7f3a22"}"#;
        let created: CreatedAccount = serde_json::from_str(body).unwrap();
        assert_eq!(created.id.to_string(), "7b1c6c52-4f64-4a53-9d1e-0c6a1f1f2b10");
        assert_eq!(created.profile_id.to_string(), "0f0b6c1e-2a4d-4b8e-9d61-1c1b5e7f3a22");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let gw = HttpFunctionGateway::new("https://fn.example.com/functions/v1/", "k", Duration::from_secs(1)).unwrap();
        assert_eq!(gw.base_url, "https://fn.example.com/functions/v1");
    }
}

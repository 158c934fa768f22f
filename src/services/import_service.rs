// src/services/import_service.rs

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, i18n::I18nStore},
    models::{
        import::{ImportRow, ImportSummary, RowOutcome},
        subscription::{EffectiveLimit, ResourceKind},
    },
    services::{
        gateway::{CreateCustomerAccount, FunctionGateway},
        subscription_service::{check_capacity, SubscriptionService},
    },
};

// Campos da planilha, na ordem das chaves de tradução `import.*`
const FIELDS: [&str; 5] = ["full_name", "company_name", "email", "phone", "password"];
const REQUIRED: [&str; 4] = ["full_name", "company_name", "email", "password"];

/// Posição de cada campo no cabeçalho.
struct ColumnMap {
    positions: [Option<usize>; 5],
}

impl ColumnMap {
    fn resolve(headers: &csv::StringRecord, i18n: &I18nStore) -> Self {
        let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let positions = FIELDS.map(|field| {
            let mut labels: Vec<String> = i18n
                .labels_for(&format!("import.{}", field))
                .into_iter()
                .map(|l| l.trim().to_lowercase())
                .collect();
            labels.push(field.to_string());
            normalized.iter().position(|h| labels.contains(h))
        });
        Self { positions }
    }

    fn index_of(&self, field: &str) -> Option<usize> {
        FIELDS.iter().position(|f| *f == field).and_then(|i| self.positions[i])
    }

    fn value(&self, record: &csv::StringRecord, field: &str) -> Option<String> {
        self.index_of(field)
            .and_then(|i| record.get(i))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Lê a planilha (CSV) e classifica cada linha. Cabeçalho sem uma coluna
/// obrigatória invalida o arquivo inteiro.
pub fn parse_rows(bytes: &[u8], i18n: &I18nStore, lang: &str) -> Result<Vec<RowOutcome>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| AppError::ImportFormat(e.to_string()))?
        .clone();
    let columns = ColumnMap::resolve(&headers, i18n);

    let missing: Vec<String> = REQUIRED
        .iter()
        .filter(|f| columns.index_of(f).is_none())
        .map(|f| i18n.translate(lang, &format!("import.{}", f), &[]))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::ImportFormat(missing.join(", ")));
    }

    let mut outcomes = Vec::new();
    for (index, record) in reader.records().enumerate() {
        // Linha 1 é o cabeçalho
        let line = index + 2;
        let record = record.map_err(|e| AppError::ImportFormat(e.to_string()))?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }

        let absent = REQUIRED.iter().find(|f| columns.value(&record, f).is_none());
        let outcome = match absent {
            Some(field) => RowOutcome::Invalid {
                line,
                reason: i18n.translate(
                    lang,
                    "import.missing_field",
                    &[
                        ("line", line.to_string()),
                        ("field", i18n.translate(lang, &format!("import.{}", field), &[])),
                    ],
                ),
            },
            None => RowOutcome::Valid(ImportRow {
                line,
                full_name: columns.value(&record, "full_name").unwrap_or_default(),
                company_name: columns.value(&record, "company_name").unwrap_or_default(),
                email: columns.value(&record, "email").unwrap_or_default(),
                phone: columns.value(&record, "phone"),
                password: columns.value(&record, "password").unwrap_or_default(),
            }),
        };
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

/// Checa a capacidade antes de qualquer envio e então envia as linhas
/// válidas uma a uma. Cada envio cria cliente e login na função remota;
/// falhas individuais não interrompem o lote.
pub async fn run_import(
    gateway: &dyn FunctionGateway,
    company_id: Uuid,
    limit: &EffectiveLimit,
    current: i64,
    outcomes: Vec<RowOutcome>,
) -> Result<ImportSummary, AppError> {
    let valid = outcomes.iter().filter(|o| matches!(o, RowOutcome::Valid(_))).count() as i64;

    // 1. Pré-checagem: nada é enviado se o lote estoura o plano
    check_capacity(limit, current, valid)?;

    let mut summary = ImportSummary { total_rows: outcomes.len(), ..Default::default() };

    // 2. Envio sequencial
    for outcome in outcomes {
        let row = match outcome {
            RowOutcome::Valid(row) => row,
            RowOutcome::Invalid { reason, .. } => {
                summary.record_failure(reason);
                continue;
            }
        };

        let line = row.line;
        let request = CreateCustomerAccount {
            company_id,
            email: row.email,
            password: row.password,
            full_name: row.full_name,
            company_name: Some(row.company_name),
            phone: row.phone,
            address: None,
        };

        // Erros remotos entram no resumo com o texto original
        match gateway.create_customer_account(&request).await {
            Ok(_) => summary.created += 1,
            Err(e) => summary.record_failure(format!("#{}: {}", line, e)),
        }
    }

    Ok(summary)
}

#[derive(Clone)]
pub struct ImportService {
    pool: PgPool,
    subscriptions: SubscriptionService,
    gateway: Arc<dyn FunctionGateway>,
    i18n: I18nStore,
}

impl ImportService {
    pub fn new(
        pool: PgPool,
        subscriptions: SubscriptionService,
        gateway: Arc<dyn FunctionGateway>,
        i18n: I18nStore,
    ) -> Self {
        Self { pool, subscriptions, gateway, i18n }
    }

    pub async fn import_customers(&self, company_id: Uuid, bytes: &[u8], lang: &str) -> Result<ImportSummary, AppError> {
        let outcomes = parse_rows(bytes, &self.i18n, lang)?;

        let (limit, current) = {
            let mut conn = self.pool.acquire().await?;
            let limit = self.subscriptions.effective_limit(&mut *conn, company_id, ResourceKind::Customers).await?;
            let current = self.subscriptions.usage(&mut *conn, company_id, ResourceKind::Customers).await?;
            (limit, current)
        };

        let summary = run_import(self.gateway.as_ref(), company_id, &limit, current, outcomes).await?;

        tracing::info!(
            %company_id,
            total = summary.total_rows,
            created = summary.created,
            failed = summary.failed,
            "Importação de clientes concluída"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::gateway::testing::RecordingGateway;

    fn store() -> I18nStore {
        I18nStore::load().unwrap()
    }

    fn sheet(rows: usize) -> String {
        let mut csv = String::from("Full Name,Company Name,Email,Phone,Password\n");
        for i in 0..rows {
            csv.push_str(&format!("Cliente {i},Empresa {i},c{i}@example.com,,segredo{i}\n"));
        }
        csv
    }

    fn limit_of(value: i64) -> EffectiveLimit {
        EffectiveLimit { resource: ResourceKind::Customers, limit: value, source: crate::models::subscription::LimitSource::Plan }
    }

    #[test]
    fn accepts_localized_headers() {
        let csv = "Nome Completo,Nome da Empresa,E-mail,Senha\nMaria,Padaria,maria@example.com,abc123\n";
        let rows = parse_rows(csv.as_bytes(), &store(), "pt").unwrap();
        match &rows[0] {
            RowOutcome::Valid(row) => {
                assert_eq!(row.full_name, "Maria");
                assert_eq!(row.line, 2);
                assert_eq!(row.phone, None);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn missing_required_column_rejects_file() {
        let csv = "Full Name,Email\nAna,ana@example.com\n";
        assert!(matches!(parse_rows(csv.as_bytes(), &store(), "en"), Err(AppError::ImportFormat(_))));
    }

    #[test]
    fn blank_required_cell_marks_row_invalid() {
        let csv = "Full Name,Company Name,Email,Password\nAna,,ana@example.com,123456\n";
        let rows = parse_rows(csv.as_bytes(), &store(), "en").unwrap();
        assert!(matches!(&rows[0], RowOutcome::Invalid { line: 2, .. }));
    }

    #[tokio::test]
    async fn over_limit_import_submits_nothing() {
        // 12 linhas, uso 8, teto 10
        let rows = parse_rows(sheet(12).as_bytes(), &store(), "en").unwrap();
        let gateway = RecordingGateway::default();

        let result = run_import(&gateway, Uuid::new_v4(), &limit_of(10), 8, rows).await;

        assert!(matches!(result, Err(AppError::LimitExceeded { current: 8, requested: 12, limit: 10, .. })));
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn partial_failures_are_summarized() {
        let rows = parse_rows(sheet(3).as_bytes(), &store(), "en").unwrap();
        let gateway = RecordingGateway::rejecting(&["c1@example.com"]);

        let summary = run_import(&gateway, Uuid::new_v4(), &limit_of(10), 0, rows)
            .await
            .unwrap();

        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.created, 2);
        assert_eq!(summary.failed, 1);
        assert!(summary.errors[0].contains("User already registered"));
        assert_eq!(gateway.call_count(), 3);
    }

    #[tokio::test]
    async fn created_count_matches_rows_written_remotely() {
        let rows = parse_rows(sheet(4).as_bytes(), &store(), "en").unwrap();
        let gateway = RecordingGateway::rejecting(&["c0@example.com", "c3@example.com"]);
        let company_id = Uuid::new_v4();

        let summary = run_import(&gateway, company_id, &limit_of(10), 0, rows).await.unwrap();

        // Só conta como criado o que a função remota gravou
        let written = gateway.created_customers();
        assert_eq!(summary.created, written.len());
        assert_eq!(summary.failed, 2);
        assert!(written.iter().all(|c| c.company_id == company_id));
        assert_eq!(written[0].email, "c1@example.com");
        assert_eq!(written[0].company_name.as_deref(), Some("Empresa 1"));
    }

    #[tokio::test]
    async fn error_samples_are_capped() {
        let mut csv = String::from("Full Name,Company Name,Email,Password\n");
        for _ in 0..8 {
            csv.push_str("Sem Email,Empresa,,x\n");
        }
        let rows = parse_rows(csv.as_bytes(), &store(), "en").unwrap();
        let gateway = RecordingGateway::default();

        let summary = run_import(&gateway, Uuid::new_v4(), &limit_of(3), 0, rows)
            .await
            .unwrap();

        assert_eq!(summary.failed, 8);
        assert_eq!(summary.errors.len(), crate::models::import::MAX_ERROR_SAMPLES);
        assert_eq!(gateway.call_count(), 0);
    }
}

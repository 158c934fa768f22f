// src/models/import.rs

use serde::Serialize;
use utoipa::ToSchema;

/// Máximo de mensagens de erro devolvidas no resumo.
pub const MAX_ERROR_SAMPLES: usize = 5;

/// Linha da planilha já validada: todos os obrigatórios presentes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub line: usize,
    pub full_name: String,
    pub company_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
}

/// Resultado da leitura de uma linha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Valid(ImportRow),
    Invalid { line: usize, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub total_rows: usize,
    pub created: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl ImportSummary {
    pub fn record_failure(&mut self, message: String) {
        self.failed += 1;
        if self.errors.len() < MAX_ERROR_SAMPLES {
            self.errors.push(message);
        }
    }
}

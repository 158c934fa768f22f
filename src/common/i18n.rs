// src/common/i18n.rs

use std::collections::HashMap;
use std::sync::Arc;

// Dicionários embutidos no binário (um arquivo JSON plano por idioma)
const EN: &str = include_str!("../../locales/en.json");
const PT: &str = include_str!("../../locales/pt.json");
const AR: &str = include_str!("../../locales/ar.json");

pub const DEFAULT_LANG: &str = "en";

/// Dicionário de mensagens por idioma. Passado explicitamente pelo `AppState`.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: Arc<HashMap<String, HashMap<String, String>>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut messages = HashMap::new();
        for (lang, raw) in [("en", EN), ("pt", PT), ("ar", AR)] {
            let dict: HashMap<String, String> = serde_json::from_str(raw)
                .map_err(|e| anyhow::anyhow!("Dicionário '{}' inválido: {}", lang, e))?;
            messages.insert(lang.to_string(), dict);
        }
        Ok(Self { messages: Arc::new(messages) })
    }

    pub fn supports(&self, lang: &str) -> bool {
        self.messages.contains_key(lang)
    }

    /// Traduz uma chave, substituindo `{param}` pelos valores informados.
    /// Cai para o inglês e, por fim, para a própria chave.
    pub fn translate(&self, lang: &str, key: &str, params: &[(&str, String)]) -> String {
        let template = self
            .messages
            .get(lang)
            .and_then(|dict| dict.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|dict| dict.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string());

        params.iter().fold(template, |acc, (name, value)| {
            acc.replace(&format!("{{{}}}", name), value)
        })
    }

    /// Rótulo de coluna aceito na importação, em todos os idiomas conhecidos.
    pub fn labels_for(&self, key: &str) -> Vec<String> {
        self.messages
            .values()
            .filter_map(|dict| dict.get(key).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_with_params() {
        let store = I18nStore::load().unwrap();
        let msg = store.translate(
            "en",
            "error.limit_exceeded",
            &[
                ("resource", "customers".into()),
                ("limit", "10".into()),
                ("current", "8".into()),
                ("requested", "12".into()),
            ],
        );
        assert!(msg.contains("customers"));
        assert!(msg.contains("10"));
        assert!(!msg.contains("{limit}"));
    }

    #[test]
    fn falls_back_to_english_then_key() {
        let store = I18nStore::load().unwrap();
        let en = store.translate("en", "error.invalid_token", &[]);
        assert_eq!(store.translate("xx", "error.invalid_token", &[]), en);
        assert_eq!(store.translate("pt", "no.such.key", &[]), "no.such.key");
    }

    #[test]
    fn every_dictionary_has_the_english_keys() {
        let store = I18nStore::load().unwrap();
        let en = &store.messages["en"];
        for lang in ["pt", "ar"] {
            for key in en.keys() {
                assert!(store.messages[lang].contains_key(key), "{} sem a chave {}", lang, key);
            }
        }
    }
}

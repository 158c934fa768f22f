// src/middleware/i18n.rs

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts, HeaderMap};

use crate::common::i18n::{I18nStore, DEFAULT_LANG};
use crate::config::AppState;

// Idioma da requisição, já restrito aos dicionários disponíveis
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl Locale {
    /// Primeiro idioma do `Accept-Language` que tenha dicionário ("pt-BR" -> "pt").
    pub fn from_headers(headers: &HeaderMap, store: &I18nStore) -> Self {
        let lang = headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| {
                accept_language::parse(raw)
                    .into_iter()
                    .map(|tag| tag.split('-').next().unwrap_or(&tag).to_lowercase())
                    .find(|lang| store.supports(lang))
            })
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Locale(lang)
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        Ok(Locale::from_headers(&parts.headers, &app_state.i18n_store))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn picks_first_supported_language() {
        let store = I18nStore::load().unwrap();
        assert_eq!(Locale::from_headers(&headers("pt-BR,en;q=0.8"), &store).0, "pt");
        assert_eq!(Locale::from_headers(&headers("fr-FR,ar;q=0.5"), &store).0, "ar");
        assert_eq!(Locale::from_headers(&headers("de"), &store).0, "en");
        assert_eq!(Locale::from_headers(&HeaderMap::new(), &store).0, "en");
    }
}

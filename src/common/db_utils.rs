// src/common/db_utils.rs

use crate::common::error::AppError;

/// Converte violação de chave única em `Conflict`; o resto segue como erro de banco.
pub(crate) fn map_unique_violation(e: sqlx::Error, message: impl Into<String>) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Conflict(message.into());
        }
    }
    e.into()
}

/// Escapa `%`, `_` e `\` para usar texto do usuário dentro de um ILIKE.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(escape_like("100%_nps\\"), "100\\%\\_nps\\\\");
        assert_eq!(escape_like("Clima"), "Clima");
    }
}

// src/common/patch.rs
//
// Campos anuláveis em payloads de atualização parcial:
// ausente = mantém, `null` = limpa, valor = substitui.

use serde::{Deserialize, Deserializer};

/// Usar com `#[serde(default, deserialize_with = "crate::common::patch::nullable")]`
/// em um campo `Option<Option<T>>`. O `default` cobre o campo ausente.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "super::nullable")]
        note: Option<Option<String>>,
    }

    #[test]
    fn absent_null_and_value_are_distinct() {
        let absent: Patch = serde_json::from_value(json!({})).unwrap();
        let cleared: Patch = serde_json::from_value(json!({ "note": null })).unwrap();
        let set: Patch = serde_json::from_value(json!({ "note": "oi" })).unwrap();

        assert_eq!(absent.note, None);
        assert_eq!(cleared.note, Some(None));
        assert_eq!(set.note, Some(Some("oi".to_string())));
    }
}

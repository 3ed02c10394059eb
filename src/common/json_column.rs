// src/common/json_column.rs
//
// Codec das colunas JSONB de configuração (options das perguntas, settings da
// pesquisa). O valor é gravado uma vez como JSONB e lido uma vez; nunca passa
// por `to_string` antes do bind. O valor das respostas não usa este tipo: ele
// é livre e volta exatamente como foi enviado.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef},
    Decode, Encode, Postgres, Type,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct JsonColumn(pub Value);

impl JsonColumn {
    /// Normaliza um valor vindo do cliente ou do banco.
    ///
    /// Uma string cujo conteúdo é um objeto/array JSON é o artefato de
    /// "double-encoding" (stringify antes de gravar como JSON). Ela é
    /// desembrulhada uma única vez; qualquer outra string continua string.
    pub fn normalize(value: Value) -> Self {
        if let Value::String(raw) = &value {
            if let Ok(inner @ (Value::Object(_) | Value::Array(_))) = serde_json::from_str::<Value>(raw) {
                return JsonColumn(inner);
            }
        }
        JsonColumn(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for JsonColumn {
    fn from(value: Value) -> Self {
        JsonColumn::normalize(value)
    }
}

impl<'de> Deserialize<'de> for JsonColumn {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(JsonColumn::normalize)
    }
}

impl Type<Postgres> for JsonColumn {
    fn type_info() -> PgTypeInfo {
        <Value as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <Value as Type<Postgres>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Postgres> for JsonColumn {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        <Value as Encode<'q, Postgres>>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> Decode<'r, Postgres> for JsonColumn {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let raw = <Value as Decode<'r, Postgres>>::decode(value)?;
        Ok(JsonColumn::normalize(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_values_pass_through_untouched() {
        let options = json!({ "choices": ["Sim", "Não"], "scale": { "min": 0, "max": 10 } });
        assert_eq!(JsonColumn::normalize(options.clone()).into_value(), options);

        let list = json!([{ "label": "A" }, { "label": "B" }]);
        assert_eq!(JsonColumn::normalize(list.clone()).into_value(), list);
    }

    #[test]
    fn double_encoded_payload_is_unwrapped_once() {
        let options = json!({ "choices": ["a", "b"] });
        let double = Value::String(options.to_string());

        let decoded = JsonColumn::normalize(double).into_value();
        assert_eq!(decoded, options);
        assert!(!decoded.is_string());
    }

    #[test]
    fn plain_strings_and_scalars_stay_as_they_are() {
        assert_eq!(JsonColumn::normalize(json!("texto livre")).into_value(), json!("texto livre"));
        assert_eq!(JsonColumn::normalize(json!("42")).into_value(), json!("42"));
        assert_eq!(JsonColumn::normalize(json!(7)).into_value(), json!(7));
    }

    #[test]
    fn deserialize_goes_through_the_same_codec() {
        let parsed: JsonColumn = serde_json::from_str(r#""[1,2,3]""#).unwrap();
        assert_eq!(parsed.into_value(), json!([1, 2, 3]));

        let roundtrip = serde_json::to_value(JsonColumn(json!({ "a": [1] }))).unwrap();
        assert_eq!(roundtrip, json!({ "a": [1] }));
    }
}

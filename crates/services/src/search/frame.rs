//! Tabular search results in the columnar "data frame" JSON layout:
//!
//! ```json
//! {"schema":{"name":"...","fields":[{"name":"...","type":"..."}]},"data":{"values":[[...]]}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "FrameJson", try_from = "FrameJson")]
pub struct Frame {
    pub name: String,
    pub meta: Option<Value>,
    pub fields: Vec<Field>,
    /// Schema keys this type does not model (`refId`, ...), relayed as received.
    pub schema_extra: Map<String, Value>,
    /// Data keys besides `values` (`nanos`, ...), relayed as received.
    pub data_extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: String,
    pub config: Option<Value>,
    pub values: Vec<Value>,
    /// Field schema keys such as `labels` or `typeInfo`.
    pub extra: Map<String, Value>,
}

impl Frame {
    /// A frame with a name and no columns.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meta: None,
            fields: Vec::new(),
            schema_extra: Map::new(),
            data_extra: Map::new(),
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
}

impl Field {
    pub fn new(
        name: impl Into<String>,
        field_type: impl Into<String>,
        values: Vec<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            config: None,
            values,
            extra: Map::new(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct FrameJson {
    schema: SchemaJson,
    #[serde(default)]
    data: DataJson,
}

#[derive(Serialize, Deserialize)]
struct SchemaJson {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    meta: Option<Value>,
    #[serde(default)]
    fields: Vec<FieldSchemaJson>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize)]
struct FieldSchemaJson {
    name: String,
    #[serde(rename = "type", default)]
    field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Default)]
struct DataJson {
    #[serde(default)]
    values: Vec<Vec<Value>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<Frame> for FrameJson {
    fn from(frame: Frame) -> Self {
        let (fields, values) = frame
            .fields
            .into_iter()
            .map(|f| {
                (
                    FieldSchemaJson {
                        name: f.name,
                        field_type: f.field_type,
                        config: f.config,
                        extra: f.extra,
                    },
                    f.values,
                )
            })
            .unzip();

        FrameJson {
            schema: SchemaJson {
                name: frame.name,
                meta: frame.meta,
                fields,
                extra: frame.schema_extra,
            },
            data: DataJson {
                values,
                extra: frame.data_extra,
            },
        }
    }
}

impl TryFrom<FrameJson> for Frame {
    type Error = String;

    fn try_from(json: FrameJson) -> Result<Self, Self::Error> {
        let FrameJson { schema, data } = json;
        let DataJson {
            mut values,
            extra: data_extra,
        } = data;

        // A schema-only frame carries no data block at all.
        if values.is_empty() {
            values = vec![Vec::new(); schema.fields.len()];
        }
        if values.len() != schema.fields.len() {
            return Err(format!(
                "frame has {} fields but {} value columns",
                schema.fields.len(),
                values.len()
            ));
        }

        let fields = schema
            .fields
            .into_iter()
            .zip(values)
            .map(|(f, values)| Field {
                name: f.name,
                field_type: f.field_type,
                config: f.config,
                values,
                extra: f.extra,
            })
            .collect();

        Ok(Frame {
            name: schema.name,
            meta: schema.meta,
            fields,
            schema_extra: schema.extra,
            data_extra,
        })
    }
}

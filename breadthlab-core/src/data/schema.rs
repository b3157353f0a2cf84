use polars::prelude::*;

/// Column kinds accepted by the frame adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// `Date`, or a `Datetime` that is truncated to its calendar date.
    Date,
    /// Any 32/64-bit integer or float column; read as `f64`.
    Number,
    Text,
}

impl ColumnKind {
    fn accepts(&self, dtype: &DataType) -> bool {
        match self {
            ColumnKind::Date => matches!(dtype, DataType::Date | DataType::Datetime(_, _)),
            ColumnKind::Number => matches!(
                dtype,
                DataType::Float32
                    | DataType::Float64
                    | DataType::Int32
                    | DataType::Int64
                    | DataType::UInt32
                    | DataType::UInt64
            ),
            ColumnKind::Text => matches!(dtype, DataType::String),
        }
    }

    fn canonical(&self) -> DataType {
        match self {
            ColumnKind::Date => DataType::Date,
            ColumnKind::Number => DataType::Float64,
            ColumnKind::Text => DataType::String,
        }
    }
}

/// Expected schema for the index series frame.
pub struct IndexSchema;

/// Expected schema for the stock panel frame.
pub struct PanelSchema;

impl IndexSchema {
    pub const COLUMNS: [(&'static str, ColumnKind); 2] =
        [("date", ColumnKind::Date), ("close", ColumnKind::Number)];

    /// Canonical schema of a clean index frame.
    pub fn schema() -> Schema {
        canonical_schema(&Self::COLUMNS)
    }

    pub fn validate(df: &DataFrame) -> Result<(), SchemaError> {
        validate_columns(df, &Self::COLUMNS)
    }
}

impl PanelSchema {
    pub const COLUMNS: [(&'static str, ColumnKind); 4] = [
        ("ticker", ColumnKind::Text),
        ("date", ColumnKind::Date),
        ("close", ColumnKind::Number),
        ("volume", ColumnKind::Number),
    ];

    /// Canonical schema of a clean panel frame.
    pub fn schema() -> Schema {
        canonical_schema(&Self::COLUMNS)
    }

    pub fn validate(df: &DataFrame) -> Result<(), SchemaError> {
        validate_columns(df, &Self::COLUMNS)
    }
}

fn canonical_schema(columns: &[(&'static str, ColumnKind)]) -> Schema {
    Schema::from_iter(
        columns
            .iter()
            .map(|(name, kind)| Field::new((*name).into(), kind.canonical())),
    )
}

fn validate_columns(
    df: &DataFrame,
    columns: &[(&'static str, ColumnKind)],
) -> Result<(), SchemaError> {
    let actual = df.schema();

    for (name, kind) in columns {
        let dtype = actual
            .get(name)
            .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))?;
        if !kind.accepts(dtype) {
            return Err(SchemaError::TypeMismatch {
                column: name.to_string(),
                expected: kind.canonical(),
                actual: dtype.clone(),
            });
        }
        let nulls = df.column(name)?.null_count();
        if nulls > 0 {
            return Err(SchemaError::NullValue {
                column: name.to_string(),
                count: nulls,
            });
        }
    }

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },

    #[error("Column {column} has {count} null values")]
    NullValue { column: String, count: usize },

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

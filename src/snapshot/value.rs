/// A captured local-variable value. The engine models the handful of types
/// it can preview; everything else is opaque and carries only its type name.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalValue {
    Int(i64),
    Float(f64),
    Str(String),
    Tensor {
        dtype: String,
        shape: Vec<usize>,
        values: Vec<f64>,
    },
    Opaque {
        type_name: String,
    },
}

const STR_PREVIEW_LIMIT: usize = 40;

impl LocalValue {
    pub fn type_tag(&self) -> &str {
        match self {
            LocalValue::Int(_) => "int",
            LocalValue::Float(_) => "float",
            LocalValue::Str(_) => "str",
            LocalValue::Tensor { .. } => "tensor",
            LocalValue::Opaque { type_name } => type_name,
        }
    }

    pub fn is_tensor(&self) -> bool {
        matches!(self, LocalValue::Tensor { .. })
    }

    /// Short preview for the locals summary; `None` for opaque values.
    pub fn preview(&self) -> Option<String> {
        match self {
            LocalValue::Int(v) => Some(format!("{}", v)),
            LocalValue::Float(v) => {
                if v.abs() > 1e-2 {
                    Some(format!("{:.3}", v))
                } else {
                    Some(format!("{:.3e}", v))
                }
            }
            LocalValue::Str(s) => {
                if s.chars().count() > STR_PREVIEW_LIMIT {
                    let head: String = s.chars().take(STR_PREVIEW_LIMIT).collect();
                    Some(format!("\"{}...\"", head))
                } else {
                    Some(format!("\"{}\"", s))
                }
            }
            LocalValue::Tensor { dtype, shape, .. } => {
                Some(format!("{}-{}", format_shape(shape), dtype))
            }
            LocalValue::Opaque { .. } => None,
        }
    }

    /// Untruncated form for value queries.
    pub fn formatted(&self) -> Option<String> {
        match self {
            LocalValue::Str(s) => Some(format!("\"{}\"", s)),
            LocalValue::Opaque { .. } => None,
            other => other.preview(),
        }
    }
}

pub fn format_shape(shape: &[usize]) -> String {
    let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
    format!("({})", dims.join(", "))
}

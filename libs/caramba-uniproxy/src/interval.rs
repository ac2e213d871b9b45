use serde_json::Value;
use std::time::Duration;
use tracing::warn;

/// Shapes the panel uses for `push_interval` / `pull_interval`.
#[derive(Debug, Clone, PartialEq)]
pub enum IntervalValue {
    Int(i64),
    Float(f64),
    Str(String),
    Missing,
}

impl From<&Value> for IntervalValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    IntervalValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    IntervalValue::Int(i64::try_from(u).unwrap_or(i64::MAX))
                } else {
                    IntervalValue::Float(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => IntervalValue::Str(s.clone()),
            Value::Null => IntervalValue::Missing,
            other => {
                warn!("Unsupported interval value {}, using 0s", other);
                IntervalValue::Missing
            }
        }
    }
}

impl IntervalValue {
    /// Whole seconds; negative or unparseable input yields zero.
    pub fn to_duration(&self) -> Duration {
        let secs = match self {
            IntervalValue::Int(i) => *i,
            IntervalValue::Float(f) if f.is_finite() => f.trunc() as i64,
            IntervalValue::Float(_) => 0,
            IntervalValue::Str(s) => match s.parse::<i64>() {
                Ok(i) => i,
                Err(e) => {
                    warn!("Invalid interval string {:?}: {}, using 0s", s, e);
                    0
                }
            },
            IntervalValue::Missing => 0,
        };
        Duration::from_secs(secs.max(0) as u64)
    }
}

pub fn interval_to_duration(value: &Value) -> Duration {
    IntervalValue::from(value).to_duration()
}

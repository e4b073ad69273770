//! Adapters that turn plain closures and constants into Jobs.

use async_trait::async_trait;
use genoflow_core::{JobResult, TypeTag, Value};

use super::{Inputs, Job, JobContext};

/// Job backed by a pure, fallible closure over the input tuple.
///
/// ```
/// use genoflow_core::{TypeTag, Value};
/// use genoflow_runtime::job::FnJob;
///
/// let concat = FnJob::new(
///     "concat",
///     vec![TypeTag::String, TypeTag::String],
///     TypeTag::String,
///     |inputs: &[Value]| {
///         let a = inputs[0].as_str().unwrap_or_default();
///         let b = inputs[1].as_str().unwrap_or_default();
///         Ok(Value::from(format!("{a}{b}")))
///     },
/// );
/// # let _ = concat;
/// ```
pub struct FnJob<F> {
    name: String,
    inputs: Vec<TypeTag>,
    output: TypeTag,
    func: F,
}

impl<F> FnJob<F>
where
    F: Fn(&[Value]) -> JobResult<Value> + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, inputs: Vec<TypeTag>, output: TypeTag, func: F) -> Self {
        Self {
            name: name.into(),
            inputs,
            output,
            func,
        }
    }
}

#[async_trait]
impl<F> Job for FnJob<F>
where
    F: Fn(&[Value]) -> JobResult<Value> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn input_types(&self) -> &[TypeTag] {
        &self.inputs
    }

    fn output_type(&self) -> &TypeTag {
        &self.output
    }

    async fn execute(&self, _ctx: JobContext<'_>, inputs: Inputs) -> JobResult<Value> {
        (self.func)(inputs.as_slice())
    }
}

/// Zero-arity Job that always produces the same value.
pub struct ConstJob {
    name: String,
    output: TypeTag,
    value: Value,
}

impl ConstJob {
    pub fn new(name: impl Into<String>, output: TypeTag, value: Value) -> Self {
        Self {
            name: name.into(),
            output,
            value,
        }
    }
}

#[async_trait]
impl Job for ConstJob {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_types(&self) -> &[TypeTag] {
        &[]
    }

    fn output_type(&self) -> &TypeTag {
        &self.output
    }

    async fn execute(&self, _ctx: JobContext<'_>, _inputs: Inputs) -> JobResult<Value> {
        Ok(self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genoflow_core::JobError;

    #[test]
    fn test_fn_job_signature() {
        let job = FnJob::new(
            "mean",
            vec![TypeTag::array_of(TypeTag::Number)],
            TypeTag::Float,
            |inputs: &[Value]| {
                let items = inputs[0]
                    .as_array()
                    .ok_or_else(|| JobError::failed("expected array"))?;
                let sum: f64 = items.iter().filter_map(Value::as_f64).sum();
                Ok(Value::from(sum / items.len().max(1) as f64))
            },
        );
        assert_eq!(job.name(), "mean");
        assert_eq!(job.arity(), 1);
        assert_eq!(job.output_type(), &TypeTag::Float);
    }

    #[test]
    fn test_const_job_signature() {
        let job = ConstJob::new("reference", TypeTag::String, Value::from("hg38"));
        assert_eq!(job.arity(), 0);
        assert_eq!(job.output_type(), &TypeTag::String);
    }
}

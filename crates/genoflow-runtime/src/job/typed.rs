//! Fixed-arity adapters with input and output types inferred from Rust types.

use std::marker::PhantomData;

use async_trait::async_trait;
use genoflow_core::{JobResult, TypeTag, Value};

use super::{Inputs, Job, JobContext};

/// Rust types that map onto a [`TypeTag`] and convert to and from [`Value`].
pub trait TypedValue: Sized + Send + 'static {
    /// Declared type for this Rust type.
    fn type_tag() -> TypeTag;

    /// Convert from a token value, `None` if it does not fit.
    fn from_value(value: &Value) -> Option<Self>;

    /// Convert into a token value.
    fn into_value(self) -> Value;
}

impl TypedValue for i64 {
    fn type_tag() -> TypeTag {
        TypeTag::Integer
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }

    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl TypedValue for f64 {
    fn type_tag() -> TypeTag {
        TypeTag::Float
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }

    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl TypedValue for bool {
    fn type_tag() -> TypeTag {
        TypeTag::Bool
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }

    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl TypedValue for String {
    fn type_tag() -> TypeTag {
        TypeTag::String
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }

    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl TypedValue for Value {
    fn type_tag() -> TypeTag {
        TypeTag::Any
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }

    fn into_value(self) -> Value {
        self
    }
}

impl<T: TypedValue> TypedValue for Vec<T> {
    fn type_tag() -> TypeTag {
        TypeTag::array_of(T::type_tag())
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_array()?.iter().map(T::from_value).collect()
    }

    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(TypedValue::into_value).collect())
    }
}

/// One-input Job over a typed pure function.
///
/// ```
/// use genoflow_runtime::job::{Job, UnaryJob};
///
/// let inc = UnaryJob::new("+1", |x: i64| x + 1);
/// assert_eq!(inc.arity(), 1);
/// ```
pub struct UnaryJob<A, R, F> {
    name: String,
    inputs: [TypeTag; 1],
    output: TypeTag,
    func: F,
    _marker: PhantomData<fn(A) -> R>,
}

impl<A, R, F> UnaryJob<A, R, F>
where
    A: TypedValue,
    R: TypedValue,
    F: Fn(A) -> R + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            inputs: [A::type_tag()],
            output: R::type_tag(),
            func,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<A, R, F> Job for UnaryJob<A, R, F>
where
    A: TypedValue,
    R: TypedValue,
    F: Fn(A) -> R + Send + Sync + 'static,
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
        let a = inputs.typed::<A>(0)?;
        Ok((self.func)(a).into_value())
    }
}

/// Two-input Job over a typed pure function.
pub struct BinaryJob<A, B, R, F> {
    name: String,
    inputs: [TypeTag; 2],
    output: TypeTag,
    func: F,
    _marker: PhantomData<fn(A, B) -> R>,
}

impl<A, B, R, F> BinaryJob<A, B, R, F>
where
    A: TypedValue,
    B: TypedValue,
    R: TypedValue,
    F: Fn(A, B) -> R + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            inputs: [A::type_tag(), B::type_tag()],
            output: R::type_tag(),
            func,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<A, B, R, F> Job for BinaryJob<A, B, R, F>
where
    A: TypedValue,
    B: TypedValue,
    R: TypedValue,
    F: Fn(A, B) -> R + Send + Sync + 'static,
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
        let a = inputs.typed::<A>(0)?;
        let b = inputs.typed::<B>(1)?;
        Ok((self.func)(a, b).into_value())
    }
}

use serde_json::{Map, Value};

mod document;
mod key;

pub use document::{Document, OperationKind};
pub use key::CacheKey;

/// Variables supplied with an operation
pub type Variables = Map<String, Value>;

/// Per-request context travelling with an operation
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    /// Predicted mutation result to apply before the network round-trip
    pub optimistic_response: Option<Value>,

    /// Free-form values for other links in the pipeline
    pub extensions: Map<String, Value>,
}

impl OperationContext {
    /// A `null` prediction does not make the operation optimistic
    pub fn is_optimistic(&self) -> bool {
        matches!(self.optimistic_response, Some(ref prediction) if !prediction.is_null())
    }
}

/// A query or mutation request flowing through the pipeline
#[derive(Debug, Clone)]
pub struct Operation {
    pub document: Document,
    pub variables: Variables,
    pub context: OperationContext,
}

impl Operation {
    /// Create an operation with no variables and an empty context
    pub fn new(document: Document) -> Self {
        Self {
            document,
            variables: Variables::new(),
            context: OperationContext::default(),
        }
    }

    /// Set the variables from a JSON object; other values clear them
    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = match variables {
            Value::Object(map) => map,
            _ => Variables::new(),
        };
        self
    }

    /// Attach an optimistic prediction of the mutation's `data`
    pub fn with_optimistic_response(mut self, prediction: Value) -> Self {
        self.context.optimistic_response = Some(prediction);
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.document.kind()
    }

    /// Declared operation name, `""` when anonymous
    pub fn name(&self) -> &str {
        self.document.name()
    }

    /// Cache key addressing this operation's result
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.document.clone(), self.variables.clone())
    }
}

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Semantic type of a registered parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Text,
    Boolean,
    Double,
    Integer,
    Long,
}

/// A concrete parameter value carried by a generation request.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Bool(bool),
    Double(f64),
    Int(i64),
}

impl ParamValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Double(value) => Some(*value),
            ParamValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Projects the value into the JSON representation used for node inputs.
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Text(text) => Value::from(text.clone()),
            ParamValue::Bool(flag) => Value::from(*flag),
            ParamValue::Double(value) => Value::from(*value),
            ParamValue::Int(value) => Value::from(*value),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(text) => write!(f, "{}", text),
            ParamValue::Bool(flag) => write!(f, "{}", flag),
            ParamValue::Double(value) => write!(f, "{}", value),
            ParamValue::Int(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Double(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

/// Hint for how the host UI should render a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewHint {
    #[default]
    Normal,
    /// Multi-line prompt-style text box.
    Prompt,
    Slider,
    Seed,
}

/// Source of the enumerated choices offered for a parameter.
#[derive(Clone)]
pub enum ValueSource {
    Static(Vec<String>),
    /// Computed at query time, e.g. from the dynamic model registry.
    Dynamic(Arc<dyn Fn() -> Vec<String> + Send + Sync>),
}

impl ValueSource {
    pub fn resolve(&self) -> Vec<String> {
        match self {
            ValueSource::Static(choices) => choices.clone(),
            ValueSource::Dynamic(provider) => provider(),
        }
    }
}

impl fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Static(choices) => f.debug_tuple("Static").field(choices).finish(),
            ValueSource::Dynamic(_) => f.debug_tuple("Dynamic").field(&"..").finish(),
        }
    }
}

/// A named container of parameters with shared display and gating behavior.
#[derive(Debug, Clone)]
pub struct ParamGroup {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Whether the group renders with an enable/disable toggle.
    pub toggles: bool,
    /// Whether the group starts expanded in the UI.
    pub open: bool,
    pub advanced: bool,
    pub order_priority: f64,
    /// Backend capability required for the group to be shown at all.
    pub feature_flag: Option<String>,
}

/// Declaration of a single user-adjustable parameter.
///
/// Created once at plugin initialization and immutable thereafter; requests
/// read values by id, falling back to `default` when the user left the
/// parameter untouched.
#[derive(Debug, Clone)]
pub struct ParamDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: ParamKind,
    pub default: ParamValue,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub values: Option<ValueSource>,
    pub group: Option<String>,
    pub feature_flag: Option<String>,
    pub view: ViewHint,
    pub order_priority: f64,
    /// Toggleable parameters can be absent from a request entirely.
    pub toggleable: bool,
    /// Omit from recorded metadata when left at the default.
    pub ignore_if_default: bool,
    pub advanced: bool,
}

impl ParamDefinition {
    fn base(
        id: &str,
        name: &str,
        description: &str,
        kind: ParamKind,
        default: ParamValue,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            kind,
            default,
            min: None,
            max: None,
            step: None,
            values: None,
            group: None,
            feature_flag: None,
            view: ViewHint::Normal,
            order_priority: 0.0,
            toggleable: false,
            ignore_if_default: false,
            advanced: false,
        }
    }

    pub fn text(id: &str, name: &str, description: &str) -> Self {
        Self::base(id, name, description, ParamKind::Text, ParamValue::Text(String::new()))
    }

    pub fn boolean(id: &str, name: &str, description: &str, default: bool) -> Self {
        Self::base(id, name, description, ParamKind::Boolean, ParamValue::Bool(default))
    }

    pub fn double(id: &str, name: &str, description: &str, default: f64) -> Self {
        Self::base(id, name, description, ParamKind::Double, ParamValue::Double(default))
    }

    pub fn integer(id: &str, name: &str, description: &str, default: i64) -> Self {
        Self::base(id, name, description, ParamKind::Integer, ParamValue::Int(default))
    }

    pub fn long(id: &str, name: &str, description: &str, default: i64) -> Self {
        Self::base(id, name, description, ParamKind::Long, ParamValue::Int(default))
    }

    pub fn with_default(mut self, default: impl Into<ParamValue>) -> Self {
        self.default = default.into();
        self
    }

    pub fn with_range(mut self, min: f64, max: f64, step: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self.step = Some(step);
        self
    }

    pub fn with_values(mut self, choices: &[&str]) -> Self {
        self.values = Some(ValueSource::Static(
            choices.iter().map(|c| (*c).to_string()).collect(),
        ));
        self
    }

    pub fn with_dynamic_values(
        mut self,
        provider: impl Fn() -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        self.values = Some(ValueSource::Dynamic(Arc::new(provider)));
        self
    }

    pub fn in_group(mut self, group_id: &str) -> Self {
        self.group = Some(group_id.to_string());
        self
    }

    pub fn with_feature_flag(mut self, flag: &str) -> Self {
        self.feature_flag = Some(flag.to_string());
        self
    }

    pub fn with_view(mut self, view: ViewHint) -> Self {
        self.view = view;
        self
    }

    pub fn with_order(mut self, priority: f64) -> Self {
        self.order_priority = priority;
        self
    }

    pub fn toggleable(mut self) -> Self {
        self.toggleable = true;
        self
    }

    pub fn ignore_if_default(mut self) -> Self {
        self.ignore_if_default = true;
        self
    }

    pub fn advanced(mut self) -> Self {
        self.advanced = true;
        self
    }

    /// The current enumerated choices, when the parameter has any.
    pub fn choices(&self) -> Option<Vec<String>> {
        self.values.as_ref().map(ValueSource::resolve)
    }
}

use glam::{DMat4, Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Token,
    TokenArray,
    Asset,
    Float,
    Float2,
    Float3,
    Color3f,
    Matrix4d,
    Point3fArray,
    IntArray,
    TexCoord2fArray,
}

impl ValueType {
    pub fn usda_name(self) -> &'static str {
        match self {
            ValueType::Token => "token",
            ValueType::TokenArray => "token[]",
            ValueType::Asset => "asset",
            ValueType::Float => "float",
            ValueType::Float2 => "float2",
            ValueType::Float3 => "float3",
            ValueType::Color3f => "color3f",
            ValueType::Matrix4d => "matrix4d",
            ValueType::Point3fArray => "point3f[]",
            ValueType::IntArray => "int[]",
            ValueType::TexCoord2fArray => "texCoord2f[]",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Token(String),
    TokenArray(Vec<String>),
    Asset(String),
    Float(f32),
    Float2(Vec2),
    Float3(Vec3),
    Color3f(Vec3),
    Matrix4d(DMat4),
    Point3fArray(Vec<Vec3>),
    IntArray(Vec<i32>),
    TexCoord2fArray(Vec<Vec2>),
}

impl Value {
    pub fn token(token: impl Into<String>) -> Self {
        Value::Token(token.into())
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Token(_) => ValueType::Token,
            Value::TokenArray(_) => ValueType::TokenArray,
            Value::Asset(_) => ValueType::Asset,
            Value::Float(_) => ValueType::Float,
            Value::Float2(_) => ValueType::Float2,
            Value::Float3(_) => ValueType::Float3,
            Value::Color3f(_) => ValueType::Color3f,
            Value::Matrix4d(_) => ValueType::Matrix4d,
            Value::Point3fArray(_) => ValueType::Point3fArray,
            Value::IntArray(_) => ValueType::IntArray,
            Value::TexCoord2fArray(_) => ValueType::TexCoord2fArray,
        }
    }

    pub fn as_token(&self) -> Option<&str> {
        match self {
            Value::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn as_float3(&self) -> Option<Vec3> {
        match self {
            Value::Float3(value) | Value::Color3f(value) => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variability {
    Varying,
    Uniform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Constant,
    Vertex,
    FaceVarying,
}

impl Interpolation {
    pub fn token(self) -> &'static str {
        match self {
            Interpolation::Constant => "constant",
            Interpolation::Vertex => "vertex",
            Interpolation::FaceVarying => "faceVarying",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSample {
    pub time: f64,
    pub value: Value,
}

/// A typed property with an optional default value and time samples.
///
/// Samples are kept ordered by time. Writing a time that already has a
/// sample replaces it; out-of-order writes are accepted and end up in time
/// order, which is how the consuming format stores them.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub value_type: ValueType,
    pub variability: Variability,
    pub interpolation: Option<Interpolation>,
    pub connection: Option<String>,
    default: Option<Value>,
    samples: Vec<TimeSample>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            variability: Variability::Varying,
            interpolation: None,
            connection: None,
            default: None,
            samples: Vec::new(),
        }
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn samples(&self) -> &[TimeSample] {
        &self.samples
    }

    pub fn sample_times(&self) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.time).collect()
    }

    pub fn is_time_sampled(&self) -> bool {
        !self.samples.is_empty()
    }

    pub(crate) fn set_default(&mut self, value: Value) {
        self.default = Some(value);
    }

    pub(crate) fn insert_sample(&mut self, time: f64, value: Value) {
        let index = self.samples.partition_point(|sample| sample.time < time);
        match self.samples.get_mut(index) {
            Some(existing) if existing.time == time => existing.value = value,
            _ => self.samples.insert(index, TimeSample { time, value }),
        }
    }

    /// Value in effect at `time`: the last sample at or before it (held),
    /// the first sample before any, or the default when never sampled.
    pub fn value_at(&self, time: f64) -> Option<&Value> {
        if self.samples.is_empty() {
            return self.default.as_ref();
        }

        let next = self.samples.partition_point(|sample| sample.time <= time);
        let index = next.saturating_sub(1);
        Some(&self.samples[index].value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visibility() -> Attribute {
        Attribute::new("visibility", ValueType::Token)
    }

    #[test]
    fn samples_are_held_between_keys() {
        let mut attribute = visibility();
        attribute.insert_sample(1.0, Value::token("invisible"));
        attribute.insert_sample(10.0, Value::token("inherited"));

        let at = |time| attribute.value_at(time).and_then(Value::as_token);
        assert_eq!(at(0.0), Some("invisible"));
        assert_eq!(at(5.0), Some("invisible"));
        assert_eq!(at(10.0), Some("inherited"));
        assert_eq!(at(99.0), Some("inherited"));
    }

    #[test]
    fn writing_an_existing_time_replaces_the_sample() {
        let mut attribute = visibility();
        attribute.insert_sample(0.0, Value::token("invisible"));
        attribute.insert_sample(0.0, Value::token("inherited"));
        assert_eq!(attribute.samples().len(), 1);
        assert_eq!(
            attribute.value_at(0.0).and_then(Value::as_token),
            Some("inherited")
        );
    }

    #[test]
    fn late_samples_are_stored_in_time_order() {
        let mut attribute = Attribute::new("xformOp:scale", ValueType::Float3);
        attribute.insert_sample(5.0, Value::Float3(Vec3::ONE));
        attribute.insert_sample(2.0, Value::Float3(Vec3::ZERO));
        assert_eq!(attribute.sample_times(), vec![2.0, 5.0]);
    }

    #[test]
    fn unsampled_attribute_reads_its_default() {
        let mut attribute = Attribute::new("inputs:opacity", ValueType::Float);
        assert_eq!(attribute.value_at(3.0), None);
        attribute.set_default(Value::Float(0.5));
        assert_eq!(attribute.value_at(3.0), Some(&Value::Float(0.5)));
    }
}

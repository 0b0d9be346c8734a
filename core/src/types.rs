//! Domain types shared by the encoder, the interpreter and the client.
//!
//! # Design
//! Parameter values are a closed set of variants. Collections hold `Scalar`
//! elements only, so a nested collection cannot be built through the typed
//! API; the dynamic `serde_json::Value` entry point in `encoder` reports it as
//! an `EncodingError` instead.
//!
//! Decoded rows keep their columns in document order. Everything is text: the
//! service returns no type information worth trusting.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Wrapper for values that may carry secrets or large raw payloads.
///
/// `Debug` and `Display` never print the inner value, so an error or request
/// can be handed to a logger as-is. Call `expose` to opt in to the contents.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Redacted<T>(T);

impl<T> Redacted<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Redacted<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> fmt::Debug for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

impl<T> fmt::Display for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

// ---------------------------------------------------------------------------
// Parameter values
// ---------------------------------------------------------------------------

/// A single non-collection parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Build a `Text` scalar from anything with a textual representation.
    pub fn text(value: impl fmt::Display) -> Self {
        Scalar::Text(value.to_string())
    }
}

/// A value for one MWS call parameter.
///
/// Collections are one level deep: `Sequence` encodes as `a,b,c` and
/// `Mapping` as `k=v;k=v`, keeping insertion order.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Scalar(Scalar),
    Sequence(Vec<Scalar>),
    Mapping(Vec<(String, Scalar)>),
}

impl ParameterValue {
    pub fn null() -> Self {
        ParameterValue::Scalar(Scalar::Null)
    }

    /// Build a `Mapping` from key/value pairs, preserving their order.
    pub fn mapping<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Scalar>,
        I: IntoIterator<Item = (K, V)>,
    {
        ParameterValue::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_keyed(&self) -> bool {
        matches!(self, ParameterValue::Mapping(_))
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ParameterValue::Scalar(_) => "scalar",
            ParameterValue::Sequence(_) => "sequence",
            ParameterValue::Mapping(_) => "mapping",
        }
    }
}

macro_rules! impl_scalar_from {
    ($($ty:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from($v: $ty) -> Self {
                    $body
                }
            }

            impl From<$ty> for ParameterValue {
                fn from(value: $ty) -> Self {
                    ParameterValue::Scalar(Scalar::from(value))
                }
            }
        )*
    };
}

impl_scalar_from! {
    bool => |v| Scalar::Bool(v),
    i8 => |v| Scalar::Integer(v.into()),
    i16 => |v| Scalar::Integer(v.into()),
    i32 => |v| Scalar::Integer(v.into()),
    i64 => |v| Scalar::Integer(v),
    u8 => |v| Scalar::Integer(v.into()),
    u16 => |v| Scalar::Integer(v.into()),
    u32 => |v| Scalar::Integer(v.into()),
    f32 => |v| Scalar::Float(v.into()),
    f64 => |v| Scalar::Float(v),
    &str => |v| Scalar::Text(v.to_string()),
    String => |v| Scalar::Text(v),
    &String => |v| Scalar::Text(v.clone()),
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for ParameterValue {
    fn from(value: Option<T>) -> Self {
        ParameterValue::Scalar(value.into())
    }
}

impl From<Scalar> for ParameterValue {
    fn from(value: Scalar) -> Self {
        ParameterValue::Scalar(value)
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for ParameterValue {
    fn from(values: Vec<T>) -> Self {
        ParameterValue::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Scalar>, const N: usize> From<[(K, V); N]> for ParameterValue {
    fn from(entries: [(K, V); N]) -> Self {
        ParameterValue::mapping(entries)
    }
}

/// Caller parameters for one call, in insertion order with unique keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    entries: Vec<(String, ParameterValue)>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an earlier value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParameterValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style `insert`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<ParameterValue>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Parameters::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Username and password sent with every call as `SessionToken`.
///
/// Held as a single optional value on the client, so a username without a
/// password cannot exist.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: Redacted<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Redacted::new(password.into()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// `<username>;<password>`, recomputed on every call.
    pub fn session_token(&self) -> Redacted<String> {
        Redacted::new(format!("{};{}", self.username, self.password.expose()))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Response data
// ---------------------------------------------------------------------------

/// One decoded record: column name to text value, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `column`. A repeated column keeps its first position.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.columns.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.set(k, v);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in &self.columns {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Decoded response: rows sharing one ordered set of column names.
pub type ResponseTable = Vec<Row>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacted_hides_value_in_debug_and_display() {
        let secret = Redacted::new("hunter2".to_string());
        assert_eq!(format!("{secret:?}"), "[redacted]");
        assert_eq!(secret.to_string(), "[redacted]");
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn credentials_debug_omits_password() {
        let creds = Credentials::new("alice", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn session_token_joins_with_semicolon() {
        let creds = Credentials::new("alice", "hunter2");
        assert_eq!(creds.session_token().expose(), "alice;hunter2");
    }

    #[test]
    fn parameters_insert_replaces_in_place() {
        let mut params = Parameters::new();
        params.insert("a", 1);
        params.insert("b", 2);
        params.insert("a", 3);
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(params.get("a"), Some(&ParameterValue::from(3)));
    }

    #[test]
    fn conversions_pick_expected_variants() {
        assert_eq!(ParameterValue::from(None::<i32>), ParameterValue::null());
        assert_eq!(
            ParameterValue::from(vec!["a", "b"]),
            ParameterValue::Sequence(vec![Scalar::text("a"), Scalar::text("b")])
        );
        assert_eq!(
            ParameterValue::from([("x", 1)]),
            ParameterValue::Mapping(vec![("x".to_string(), Scalar::Integer(1))])
        );
        assert!(ParameterValue::from([("x", 1)]).is_keyed());
        assert!(!ParameterValue::from(Vec::<i32>::new()).is_keyed());
    }

    #[test]
    fn row_set_keeps_first_position() {
        let mut row = Row::new();
        row.set("A", "1");
        row.set("B", "2");
        row.set("A", "3");
        assert_eq!(row.column_names().collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(row.get("A"), Some("3"));
    }

    #[test]
    fn row_serializes_as_object() {
        let row: Row = [("A", "1"), ("B", "x")].into_iter().collect();
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"A":"1","B":"x"}"#);
    }
}

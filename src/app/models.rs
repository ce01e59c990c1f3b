//! Data models for loaded databanks
//!
//! This module contains the in-memory representation of a databank: named
//! entries that are either date-indexed series or typed numeric arrays, the
//! column-major n-dimensional array they are stored in, and the ordered
//! collection that owns them.

use crate::app::services::dates::{self, Frequency, Serial};
use crate::{Error, Result};
use num_complex::{Complex, Complex64};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// N-dimensional Array
// =============================================================================

/// Dense n-dimensional array stored in column-major order
///
/// The first index varies fastest. A 2-D array of shape `[rows, cols]` is
/// therefore a sequence of columns, which is how data columns are laid out
/// in the source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdArray<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T> NdArray<T> {
    /// Build an array from column-major data
    pub fn from_shape_vec(shape: Vec<usize>, data: Vec<T>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::shape_mismatch(&shape, data.len()));
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Elements in column-major order
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Element at a multi-index
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        self.offset(index).map(|offset| &self.data[offset])
    }

    /// Column `j` when the array is viewed as `[shape[0], product(shape[1..])]`
    pub fn column(&self, j: usize) -> Option<&[T]> {
        let rows = self.shape.first().copied().unwrap_or(0);
        let start = j.checked_mul(rows)?;
        self.data.get(start..start + rows)
    }

    /// Same elements under a new shape
    pub fn reshape(self, shape: Vec<usize>) -> Result<Self> {
        Self::from_shape_vec(shape, self.data)
    }

    /// Element-wise conversion
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> NdArray<U> {
        NdArray {
            shape: self.shape.clone(),
            data: self.data.iter().map(f).collect(),
        }
    }

    fn offset(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut offset = 0;
        let mut stride = 1;
        for (&i, &extent) in index.iter().zip(&self.shape) {
            if i >= extent {
                return None;
            }
            offset += i * stride;
            stride *= extent;
        }
        Some(offset)
    }
}

impl<T: Clone> NdArray<T> {
    /// Array of the given shape with every element set to `value`
    pub fn filled(shape: Vec<usize>, value: T) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![value; len],
        }
    }
}

// =============================================================================
// Series
// =============================================================================

/// Values of a series: real unless some observed value has an imaginary part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "lowercase")]
pub enum SeriesData {
    Real(NdArray<f64>),
    Complex(NdArray<Complex64>),
}

impl SeriesData {
    pub fn shape(&self) -> &[usize] {
        match self {
            SeriesData::Real(values) => values.shape(),
            SeriesData::Complex(values) => values.shape(),
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, SeriesData::Complex(_))
    }

    /// Element at a multi-index, widened to complex
    pub fn get(&self, index: &[usize]) -> Option<Complex64> {
        match self {
            SeriesData::Real(values) => values.get(index).map(|v| Complex64::new(*v, 0.0)),
            SeriesData::Complex(values) => values.get(index).copied(),
        }
    }
}

/// Date-indexed array with one row per period from `start` onwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Frequency of the date axis; `None` when no date was ever observed
    pub frequency: Option<Frequency>,

    /// Serial date of the first row; `None` for an empty placeholder
    pub start: Option<Serial>,

    /// Values of shape `[periods, trailing...]`
    pub data: SeriesData,

    /// Per-column comments, shaped like the trailing dimensions
    pub comments: NdArray<String>,

    /// Per-column user data fields, each shaped like the trailing dimensions
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub user_data: BTreeMap<String, NdArray<String>>,
}

impl Series {
    /// Empty series with the given trailing dimensions and no anchor date
    pub fn placeholder(trailing: Vec<usize>, comments: NdArray<String>) -> Self {
        let mut shape = vec![0];
        shape.extend(trailing);
        Self {
            frequency: None,
            start: None,
            data: SeriesData::Real(NdArray::filled(shape, f64::NAN)),
            comments,
            user_data: BTreeMap::new(),
        }
    }

    /// Number of periods (rows)
    pub fn n_periods(&self) -> usize {
        self.data.shape().first().copied().unwrap_or(0)
    }

    /// Trailing dimensions (everything after the period axis)
    pub fn trailing_shape(&self) -> &[usize] {
        self.data.shape().get(1..).unwrap_or(&[])
    }

    /// Number of columns in the trailing dimensions
    pub fn n_columns(&self) -> usize {
        self.trailing_shape().iter().product()
    }

    /// Serial date of the last row
    pub fn end(&self) -> Option<Serial> {
        let n = self.n_periods();
        match self.start {
            Some(start) if n > 0 => Some(start + n as i64 - 1),
            _ => None,
        }
    }

    pub fn is_complex(&self) -> bool {
        self.data.is_complex()
    }

    /// Value at a serial date in the given flattened trailing column
    pub fn value_at(&self, date: Serial, column: usize) -> Option<Complex64> {
        let start = self.start?;
        let row = usize::try_from(date - start).ok()?;
        if row >= self.n_periods() || column >= self.n_columns() {
            return None;
        }
        let offset = row + column * self.n_periods();
        match &self.data {
            SeriesData::Real(values) => values.as_slice().get(offset).map(|v| Complex64::new(*v, 0.0)),
            SeriesData::Complex(values) => values.as_slice().get(offset).copied(),
        }
    }

    /// Real part of [`Series::value_at`]
    pub fn real_value_at(&self, date: Serial, column: usize) -> Option<f64> {
        self.value_at(date, column).map(|v| v.re)
    }

    /// Date range as text, e.g. `2000Q1:2004Q4`
    pub fn range_label(&self) -> String {
        match (self.frequency, self.start, self.end()) {
            (Some(freq), Some(start), Some(end)) => format!(
                "{}:{}",
                dates::format_serial(freq, start),
                dates::format_serial(freq, end)
            ),
            _ => "empty".to_string(),
        }
    }
}

// =============================================================================
// Typed Arrays
// =============================================================================

/// Numeric types a non-series entry can be coerced to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericType {
    Int32,
    Int64,
    Float32,
    Float64,
    Complex64,
    Complex128,
}

impl NumericType {
    /// Identifiers accepted in class annotations
    const LOOKUP: &'static [(&'static str, NumericType)] = &[
        ("int32", NumericType::Int32),
        ("int64", NumericType::Int64),
        ("single", NumericType::Float32),
        ("float32", NumericType::Float32),
        ("double", NumericType::Float64),
        ("float64", NumericType::Float64),
        ("complex64", NumericType::Complex64),
        ("complex128", NumericType::Complex128),
    ];

    /// Resolve a class identifier (case-insensitive)
    pub fn lookup(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::LOOKUP
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, ty)| *ty)
    }

    pub fn name(self) -> &'static str {
        match self {
            NumericType::Int32 => "int32",
            NumericType::Int64 => "int64",
            NumericType::Float32 => "float32",
            NumericType::Float64 => "float64",
            NumericType::Complex64 => "complex64",
            NumericType::Complex128 => "complex128",
        }
    }

    /// Convert parsed values to this type
    ///
    /// Real targets keep the real part. Integer targets round to nearest and
    /// saturate; NaN becomes zero.
    pub fn coerce(self, values: &NdArray<Complex64>) -> TypedArray {
        match self {
            NumericType::Int32 => TypedArray::Int32(values.map(|v| v.re.round() as i32)),
            NumericType::Int64 => TypedArray::Int64(values.map(|v| v.re.round() as i64)),
            NumericType::Float32 => TypedArray::Float32(values.map(|v| v.re as f32)),
            NumericType::Float64 => TypedArray::Float64(values.map(|v| v.re)),
            NumericType::Complex64 => {
                TypedArray::Complex64(values.map(|v| Complex::new(v.re as f32, v.im as f32)))
            }
            NumericType::Complex128 => TypedArray::Complex128(values.clone()),
        }
    }
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Plain numeric array of a declared type and shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum TypedArray {
    Int32(NdArray<i32>),
    Int64(NdArray<i64>),
    Float32(NdArray<f32>),
    Float64(NdArray<f64>),
    Complex64(NdArray<Complex<f32>>),
    Complex128(NdArray<Complex64>),
}

impl TypedArray {
    pub fn numeric_type(&self) -> NumericType {
        match self {
            TypedArray::Int32(_) => NumericType::Int32,
            TypedArray::Int64(_) => NumericType::Int64,
            TypedArray::Float32(_) => NumericType::Float32,
            TypedArray::Float64(_) => NumericType::Float64,
            TypedArray::Complex64(_) => NumericType::Complex64,
            TypedArray::Complex128(_) => NumericType::Complex128,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            TypedArray::Int32(a) => a.shape(),
            TypedArray::Int64(a) => a.shape(),
            TypedArray::Float32(a) => a.shape(),
            TypedArray::Float64(a) => a.shape(),
            TypedArray::Complex64(a) => a.shape(),
            TypedArray::Complex128(a) => a.shape(),
        }
    }
}

// =============================================================================
// Entries and Database
// =============================================================================

/// One named item of a databank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entry {
    Series(Series),
    Array(TypedArray),
}

impl Entry {
    pub fn as_series(&self) -> Option<&Series> {
        match self {
            Entry::Series(series) => Some(series),
            Entry::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&TypedArray> {
        match self {
            Entry::Array(array) => Some(array),
            Entry::Series(_) => None,
        }
    }

    /// Full shape, including the period axis for series
    pub fn shape(&self) -> &[usize] {
        match self {
            Entry::Series(series) => series.data.shape(),
            Entry::Array(array) => array.shape(),
        }
    }

    /// Short description of the entry kind, e.g. `series` or `int32`
    pub fn kind_label(&self) -> String {
        match self {
            Entry::Series(series) if series.is_complex() => "complex series".to_string(),
            Entry::Series(_) => "series".to_string(),
            Entry::Array(array) => array.numeric_type().to_string(),
        }
    }
}

/// File-level user data value and the field it is stored under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub field: String,
    pub value: serde_json::Value,
}

/// Named entries in insertion order, plus optional file-level user data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Database {
    entries: IndexMap<String, Entry>,
    user_data: Option<UserData>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing (in place) any entry with the same name
    pub fn insert(&mut self, name: impl Into<String>, entry: Entry) -> Option<Entry> {
        self.entries.insert(name.into(), entry)
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// Series entry by name
    pub fn series(&self, name: &str) -> Option<&Series> {
        self.get(name).and_then(Entry::as_series)
    }

    /// Typed array entry by name
    pub fn array(&self, name: &str) -> Option<&TypedArray> {
        self.get(name).and_then(Entry::as_array)
    }

    /// Remove an entry, keeping the order of the others
    pub fn remove(&mut self, name: &str) -> Option<Entry> {
        self.entries.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entry names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn user_data(&self) -> Option<&UserData> {
        self.user_data.as_ref()
    }

    pub fn set_user_data(&mut self, user_data: UserData) {
        self.user_data = Some(user_data);
    }

    /// Fold another database into this one; its entries win on collision
    pub fn merge(&mut self, other: Database) {
        let Database { entries, user_data } = other;
        self.entries.extend(entries);
        if user_data.is_some() {
            self.user_data = user_data;
        }
    }
}

impl Serialize for Database {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let extra = usize::from(self.user_data.is_some());
        let mut map = serializer.serialize_map(Some(self.len() + extra))?;
        for (name, entry) in self.iter() {
            map.serialize_entry(name, entry)?;
        }
        if let Some(user_data) = &self.user_data {
            map.serialize_entry(&user_data.field, &user_data.value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real_series(start: Serial, values: Vec<f64>) -> Series {
        let n = values.len();
        Series {
            frequency: Some(Frequency::Quarterly),
            start: Some(start),
            data: SeriesData::Real(NdArray::from_shape_vec(vec![n, 1], values).unwrap()),
            comments: NdArray::filled(vec![1], String::new()),
            user_data: BTreeMap::new(),
        }
    }

    #[test]
    fn test_ndarray_column_major_indexing() {
        let array = NdArray::from_shape_vec(vec![2, 3], vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(array.get(&[0, 0]), Some(&1));
        assert_eq!(array.get(&[1, 0]), Some(&2));
        assert_eq!(array.get(&[0, 2]), Some(&5));
        assert_eq!(array.get(&[2, 0]), None);
        assert_eq!(array.column(1), Some(&[3, 4][..]));
    }

    #[test]
    fn test_ndarray_shape_mismatch() {
        let err = NdArray::from_shape_vec(vec![2, 2], vec![1.0; 3]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { expected: 4, actual: 3, .. }));

        let array = NdArray::from_shape_vec(vec![6], (0..6).collect()).unwrap();
        let reshaped = array.reshape(vec![1, 2, 3]).unwrap();
        assert_eq!(reshaped.get(&[0, 1, 2]), Some(&5));
    }

    #[test]
    fn test_series_dates() {
        let series = real_series(8000, vec![1.0, 2.0, 3.0]);
        assert_eq!(series.n_periods(), 3);
        assert_eq!(series.end(), Some(8002));
        assert_eq!(series.real_value_at(8001, 0), Some(2.0));
        assert_eq!(series.real_value_at(8003, 0), None);
        assert_eq!(series.real_value_at(7999, 0), None);
        assert_eq!(series.range_label(), "2000Q1:2000Q3");
    }

    #[test]
    fn test_placeholder_series() {
        let series = Series::placeholder(vec![2, 3], NdArray::filled(vec![2, 3], String::new()));
        assert_eq!(series.n_periods(), 0);
        assert_eq!(series.trailing_shape(), &[2, 3]);
        assert_eq!(series.start, None);
        assert_eq!(series.end(), None);
        assert_eq!(series.range_label(), "empty");
    }

    #[test]
    fn test_numeric_type_lookup_and_coercion() {
        assert_eq!(NumericType::lookup("DOUBLE"), Some(NumericType::Float64));
        assert_eq!(NumericType::lookup("single"), Some(NumericType::Float32));
        assert_eq!(NumericType::lookup("uint8"), None);

        let values = NdArray::from_shape_vec(
            vec![3, 1],
            vec![
                Complex64::new(1.6, 0.0),
                Complex64::new(f64::NAN, 0.0),
                Complex64::new(1e20, 0.0),
            ],
        )
        .unwrap();
        match NumericType::Int32.coerce(&values) {
            TypedArray::Int32(ints) => assert_eq!(ints.as_slice(), &[2, 0, i32::MAX]),
            other => panic!("unexpected coercion result: {:?}", other),
        }
    }

    #[test]
    fn test_database_order_and_merge() {
        let mut db = Database::new();
        db.insert("b", Entry::Series(real_series(0, vec![1.0])));
        db.insert("a", Entry::Series(real_series(0, vec![2.0])));

        let mut other = Database::new();
        other.insert("b", Entry::Series(real_series(0, vec![9.0])));
        other.insert("c", Entry::Series(real_series(0, vec![3.0])));
        db.merge(other);

        assert_eq!(db.names(), &["b", "a", "c"]);
        assert_eq!(db.series("b").unwrap().real_value_at(0, 0), Some(9.0));
        assert!(db.remove("a").is_some());
        assert_eq!(db.names(), &["b", "c"]);
    }

    #[test]
    fn test_database_remove_keeps_column_order() {
        let mut db = Database::new();
        for (name, value) in [("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)] {
            db.insert(name, Entry::Series(real_series(0, vec![value])));
        }

        assert!(db.remove("b").is_some());
        assert!(db.remove("missing").is_none());
        assert_eq!(db.names(), &["a", "c", "d"]);

        db.insert("b", Entry::Series(real_series(0, vec![5.0])));
        db.insert("c", Entry::Series(real_series(0, vec![6.0])));
        assert_eq!(db.names(), &["a", "c", "d", "b"]);
        assert_eq!(db.series("c").unwrap().real_value_at(0, 0), Some(6.0));
        assert_eq!(db.len(), 4);
    }

    #[test]
    fn test_database_serialization_keeps_order() {
        let mut db = Database::new();
        db.insert("z", Entry::Series(real_series(0, vec![1.0])));
        db.insert("y", Entry::Series(real_series(0, vec![2.0])));
        db.set_user_data(UserData {
            field: "Info".to_string(),
            value: serde_json::json!({"source": "test"}),
        });

        let json = serde_json::to_string(&db).unwrap();
        let z = json.find("\"z\"").unwrap();
        let y = json.find("\"y\"").unwrap();
        assert!(z < y);
        assert!(json.contains("\"Info\""));
    }
}

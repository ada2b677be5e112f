/// Property value borrowed from a cursor row or a caller buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PropValue<'a> {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// String slice reference.
    Str(&'a str),
    /// Byte slice reference.
    Bytes(&'a [u8]),
    /// Date value represented as Unix timestamp (days since epoch).
    Date(i64),
    /// DateTime value represented as Unix timestamp (milliseconds since epoch).
    DateTime(i64),
}

impl PropValue<'_> {
    /// Copies the value out of the borrowed storage.
    pub fn to_owned_value(&self) -> PropValueOwned {
        match *self {
            PropValue::Null => PropValueOwned::Null,
            PropValue::Bool(v) => PropValueOwned::Bool(v),
            PropValue::Int(v) => PropValueOwned::Int(v),
            PropValue::Float(v) => PropValueOwned::Float(v),
            PropValue::Str(v) => PropValueOwned::Str(v.to_owned()),
            PropValue::Bytes(v) => PropValueOwned::Bytes(v.to_vec()),
            PropValue::Date(v) => PropValueOwned::Date(v),
            PropValue::DateTime(v) => PropValueOwned::DateTime(v),
        }
    }
}

/// Property value with owned data.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValueOwned {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// Owned string.
    Str(String),
    /// Owned byte vector.
    Bytes(Vec<u8>),
    /// Date value represented as Unix timestamp (days since epoch).
    Date(i64),
    /// DateTime value represented as Unix timestamp (milliseconds since epoch).
    DateTime(i64),
}

impl PropValueOwned {
    /// Borrows the owned value.
    pub fn as_value(&self) -> PropValue<'_> {
        match self {
            PropValueOwned::Null => PropValue::Null,
            PropValueOwned::Bool(v) => PropValue::Bool(*v),
            PropValueOwned::Int(v) => PropValue::Int(*v),
            PropValueOwned::Float(v) => PropValue::Float(*v),
            PropValueOwned::Str(v) => PropValue::Str(v),
            PropValueOwned::Bytes(v) => PropValue::Bytes(v),
            PropValueOwned::Date(v) => PropValue::Date(*v),
            PropValueOwned::DateTime(v) => PropValue::DateTime(*v),
        }
    }
}

use crate::interpreter::JsObjectData;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Debug)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Object(JsObject),
}

// UTF-16 code unit string, ES3 §8.4
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JsString {
    pub code_units: Vec<u16>,
}

impl JsString {
    pub fn from_str(s: &str) -> Self {
        Self {
            code_units: s.encode_utf16().collect(),
        }
    }

    pub fn from_code_units(code_units: Vec<u16>) -> Self {
        Self { code_units }
    }

    pub fn is_empty(&self) -> bool {
        self.code_units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.code_units.len()
    }

    pub fn to_rust_string(&self) -> String {
        String::from_utf16_lossy(&self.code_units)
    }

    pub fn code_unit_at(&self, index: usize) -> Option<u16> {
        self.code_units.get(index).copied()
    }

    pub fn concat(&self, other: &JsString) -> JsString {
        let mut code_units = Vec::with_capacity(self.len() + other.len());
        code_units.extend_from_slice(&self.code_units);
        code_units.extend_from_slice(&other.code_units);
        JsString { code_units }
    }

    pub fn index_of(&self, search: &JsString, from: usize) -> Option<usize> {
        let s_len = self.code_units.len();
        let search_len = search.code_units.len();
        if search_len == 0 {
            return if from <= s_len { Some(from) } else { None };
        }
        if from + search_len > s_len {
            return None;
        }
        (from..=(s_len - search_len))
            .find(|&i| self.code_units[i..i + search_len] == search.code_units[..])
    }

    pub fn slice_utf16(&self, start: usize, end: usize) -> JsString {
        let s = start.min(self.code_units.len());
        let e = end.min(self.code_units.len());
        if s >= e {
            return JsString::default();
        }
        JsString {
            code_units: self.code_units[s..e].to_vec(),
        }
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString::from_str(s)
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        JsString::from_str(&s)
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rust_string())
    }
}

/// Shared handle to a heap object. Equality is identity.
#[derive(Clone)]
pub struct JsObject(Rc<RefCell<JsObjectData>>);

impl JsObject {
    pub fn new(data: JsObjectData) -> Self {
        JsObject(Rc::new(RefCell::new(data)))
    }

    pub fn borrow(&self) -> Ref<'_, JsObjectData> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, JsObjectData> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &JsObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_callable(&self) -> bool {
        self.0.borrow().callable.is_some()
    }

    pub fn class_name(&self) -> &'static str {
        self.0.borrow().class_name
    }
}

impl fmt::Debug for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Objects are routinely cyclic; never recurse into properties.
        match self.0.try_borrow() {
            Ok(data) => write!(f, "JsObject({})", data.class_name),
            Err(_) => write!(f, "JsObject(<borrowed>)"),
        }
    }
}

impl JsValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JsValue::Null)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, JsValue::Boolean(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, JsValue::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, JsValue::String(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsValue::Object(_))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, JsValue::Undefined | JsValue::Null)
    }

    pub fn as_object(&self) -> Option<&JsObject> {
        match self {
            JsValue::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn from_str(s: &str) -> JsValue {
        JsValue::String(JsString::from_str(s))
    }
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Boolean(b)
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        JsValue::Number(n)
    }
}

impl From<JsString> for JsValue {
    fn from(s: JsString) -> Self {
        JsValue::String(s)
    }
}

impl From<JsObject> for JsValue {
    fn from(o: JsObject) -> Self {
        JsValue::Object(o)
    }
}

// ES3 §11.5–11.10 numeric operators
pub mod number_ops {
    pub fn unary_minus(x: f64) -> f64 {
        if x.is_nan() { f64::NAN } else { -x }
    }

    pub fn bitwise_not(x: f64) -> f64 {
        let n = to_int32(x);
        f64::from(!n)
    }

    pub fn multiply(x: f64, y: f64) -> f64 {
        x * y
    }

    pub fn divide(x: f64, y: f64) -> f64 {
        x / y
    }

    pub fn remainder(x: f64, y: f64) -> f64 {
        // IEEE 754 truncating remainder, sign of the dividend
        x % y
    }

    pub fn add(x: f64, y: f64) -> f64 {
        x + y
    }

    pub fn subtract(x: f64, y: f64) -> f64 {
        x - y
    }

    pub fn left_shift(x: f64, y: f64) -> f64 {
        let lnum = to_int32(x);
        let shift = to_uint32(y) & 0x1F;
        f64::from(lnum.wrapping_shl(shift))
    }

    pub fn signed_right_shift(x: f64, y: f64) -> f64 {
        let lnum = to_int32(x);
        let shift = to_uint32(y) & 0x1F;
        f64::from(lnum.wrapping_shr(shift))
    }

    pub fn unsigned_right_shift(x: f64, y: f64) -> f64 {
        let lnum = to_uint32(x);
        let shift = to_uint32(y) & 0x1F;
        f64::from(lnum.wrapping_shr(shift))
    }

    /// `None` is the "undefined" outcome of the abstract comparison.
    pub fn less_than(x: f64, y: f64) -> Option<bool> {
        if x.is_nan() || y.is_nan() {
            None
        } else {
            Some(x < y)
        }
    }

    pub fn equal(x: f64, y: f64) -> bool {
        if x.is_nan() || y.is_nan() {
            return false;
        }
        x == y
    }

    pub fn bitwise_and(x: f64, y: f64) -> f64 {
        f64::from(to_int32(x) & to_int32(y))
    }

    pub fn bitwise_xor(x: f64, y: f64) -> f64 {
        f64::from(to_int32(x) ^ to_int32(y))
    }

    pub fn bitwise_or(x: f64, y: f64) -> f64 {
        f64::from(to_int32(x) | to_int32(y))
    }

    pub fn to_string(x: f64) -> String {
        if x.is_nan() {
            return "NaN".to_string();
        }
        if x == 0.0 {
            return "0".to_string();
        }
        if x.is_infinite() {
            return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
        }
        let mut buf = ryu_js::Buffer::new();
        buf.format(x).to_string()
    }

    // ES3 §9.5 ToInt32
    pub fn to_int32(x: f64) -> i32 {
        to_uint32(x) as i32
    }

    // ES3 §9.6 ToUint32
    pub fn to_uint32(x: f64) -> u32 {
        if x.is_nan() || x.is_infinite() || x == 0.0 {
            return 0;
        }
        const TWO_32: f64 = 4_294_967_296.0;
        let m = x.trunc() % TWO_32;
        let m = if m < 0.0 { m + TWO_32 } else { m };
        m as u32
    }

    /// Integral values in the array-index range print without a fraction, so
    /// this is the canonical property key for a numeric subscript.
    pub fn as_array_index(x: f64) -> Option<u32> {
        if x >= 0.0 && x < 4_294_967_295.0 && x.fract() == 0.0 {
            Some(x as u32)
        } else {
            None
        }
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Boolean(b) => write!(f, "{b}"),
            JsValue::Number(n) => write!(f, "{}", number_ops::to_string(*n)),
            JsValue::String(s) => write!(f, "{s}"),
            JsValue::Object(o) => write!(f, "[object {}]", o.class_name()),
        }
    }
}

use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Error,
    Eval,
    Range,
    Reference,
    Syntax,
    Type,
    URI,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Error,
        ErrorKind::Eval,
        ErrorKind::Range,
        ErrorKind::Reference,
        ErrorKind::Syntax,
        ErrorKind::Type,
        ErrorKind::URI,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::Eval => "EvalError",
            ErrorKind::Range => "RangeError",
            ErrorKind::Reference => "ReferenceError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Type => "TypeError",
            ErrorKind::URI => "URIError",
        }
    }
}

impl Interpreter {
    pub fn create_error(&mut self, kind: ErrorKind, message: &str) -> JsValue {
        let proto = self.error_prototype(kind);
        let mut data = JsObjectData::new("Error", Some(proto));
        if !message.is_empty() {
            data.insert_builtin("message", JsValue::from_str(message));
        }
        JsValue::Object(JsObject::new(data))
    }

    pub fn throw_error<T>(&mut self, kind: ErrorKind, message: impl AsRef<str>) -> JsResult<T> {
        Err(self.create_error(kind, message.as_ref()))
    }

    pub(crate) fn throw_completion(&mut self, kind: ErrorKind, message: impl AsRef<str>) -> Completion {
        Completion::Throw(self.create_error(kind, message.as_ref()))
    }

    /// `Value undefined (result of expression a.b) is not object.`
    pub(crate) fn not_an_object<T>(&mut self, value: &JsValue, expr: &Expr) -> JsResult<T> {
        let message = format!("Value {value} (result of expression {expr}) is not object.");
        self.throw_error(ErrorKind::Type, message)
    }

    pub(crate) fn not_callable<T>(&mut self, value: &JsValue, expr: &dyn fmt::Display) -> JsResult<T> {
        let message = match value {
            JsValue::Object(_) => {
                format!("Object {value} (result of expression {expr}) does not allow calls.")
            }
            _ => format!("Value {value} (result of expression {expr}) is not object."),
        };
        self.throw_error(ErrorKind::Type, message)
    }

    pub(crate) fn undefined_variable<T>(&mut self, ident: &Identifier) -> JsResult<T> {
        self.throw_error(ErrorKind::Reference, format!("Can't find variable: {ident}"))
    }

    /// Tags an error leaving `loc` with where it happened, unless an inner
    /// statement already did.
    pub(crate) fn attach_exception_details(&self, value: &JsValue, loc: &StatementLoc) {
        let JsValue::Object(obj) = value else {
            return;
        };
        let mut data = obj.borrow_mut();
        if data.class_name != "Error" || data.has_property("line") {
            return;
        }
        data.insert_builtin("line", JsValue::Number(f64::from(loc.first_line)));
        data.insert_builtin("sourceId", JsValue::Number(f64::from(loc.source_id.0)));
        if let Some(url) = &self.config.source_url {
            data.insert_builtin("sourceURL", JsValue::from_str(url));
        }
    }

    /// `Name: message` for error objects, ToString for everything else.
    pub fn describe_exception(&mut self, value: &JsValue) -> String {
        if let JsValue::Object(obj) = value
            && obj.class_name() == "Error"
        {
            let (name, message) = {
                let data = obj.borrow();
                (data.get_property("name"), data.get_property("message"))
            };
            let name = helpers::primitive_to_string(&name).to_rust_string();
            let message = helpers::primitive_to_string(&message).to_rust_string();
            return if message.is_empty() {
                name
            } else {
                format!("{name}: {message}")
            };
        }
        match self.to_js_string(value) {
            Ok(s) => s.to_rust_string(),
            Err(_) => value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_objects_inherit_name() {
        let mut interp = Interpreter::new(EngineConfig::default());
        let err = interp.create_error(ErrorKind::Type, "boom");
        assert_eq!(interp.describe_exception(&err), "TypeError: boom");
        let bare = interp.create_error(ErrorKind::Range, "");
        assert_eq!(interp.describe_exception(&bare), "RangeError");
    }

    #[test]
    fn exception_details_attach_once() {
        let mut interp = Interpreter::new(EngineConfig::default());
        let err = interp.create_error(ErrorKind::Error, "x");
        let inner = StatementLoc {
            first_line: 3,
            last_line: 3,
            source_id: SourceId(7),
        };
        let outer = StatementLoc {
            first_line: 1,
            last_line: 5,
            source_id: SourceId(7),
        };
        interp.attach_exception_details(&err, &inner);
        interp.attach_exception_details(&err, &outer);
        let obj = err.as_object().map(|o| o.borrow().get_property("line"));
        assert!(matches!(obj, Some(JsValue::Number(n)) if n == 3.0));
    }

    #[test]
    fn plain_objects_are_not_tagged() {
        let interp = Interpreter::new(EngineConfig::default());
        let thrown = JsValue::Object(interp.new_object());
        interp.attach_exception_details(&thrown, &StatementLoc::default());
        let tagged = thrown.as_object().is_some_and(|o| o.borrow().has_own_property("line"));
        assert!(!tagged);
    }
}

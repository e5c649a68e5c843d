pub(crate) mod regexp;

use super::*;

pub(crate) fn arg(args: &[JsValue], index: usize) -> JsValue {
    args.get(index).cloned().unwrap_or(JsValue::Undefined)
}

/// `this` for a generic method: natives see the global object in place of
/// null or undefined.
fn this_object(interp: &mut Interpreter, this: &JsValue) -> JsResult<JsObject> {
    if this.is_nullish() {
        return Ok(interp.global_object.clone());
    }
    interp.to_object(this)
}

pub(crate) fn this_to_string(interp: &mut Interpreter, this: &JsValue) -> JsResult<JsString> {
    if this.is_nullish() {
        let global = JsValue::Object(interp.global_object.clone());
        return interp.to_js_string(&global);
    }
    interp.to_js_string(this)
}

/// The primitive behind `this` for the non-generic `toString`/`valueOf`
/// of the wrapper classes.
fn this_primitive(
    interp: &mut Interpreter,
    this: &JsValue,
    class_name: &str,
    method: &str,
) -> JsResult<JsValue> {
    let matches_class = |v: &JsValue| match (class_name, v) {
        ("Boolean", JsValue::Boolean(_))
        | ("Number", JsValue::Number(_))
        | ("String", JsValue::String(_)) => true,
        _ => false,
    };
    if matches_class(this) {
        return Ok(this.clone());
    }
    if let JsValue::Object(obj) = this
        && obj.class_name() == class_name
        && let Some(value) = obj.borrow().primitive_value()
        && matches_class(value)
    {
        return Ok(value.clone());
    }
    interp.throw_error(
        ErrorKind::Type,
        format!("{class_name}.prototype.{method} called on an incompatible object."),
    )
}

// §15.8.2.13 with the IEEE cases Rust's powf answers differently
fn math_pow(x: f64, y: f64) -> f64 {
    if y.is_nan() || (x.abs() == 1.0 && y.is_infinite()) {
        return f64::NAN;
    }
    x.powf(y)
}

fn number_to_radix(n: f64, radix: u32) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity".into() } else { "-Infinity".into() };
    }
    let base = f64::from(radix);
    let mut int_part = n.abs().trunc();
    let mut fraction = n.abs() - int_part;
    let mut digits = Vec::new();
    while int_part >= 1.0 {
        let digit = (int_part % base) as u32;
        digits.push(char::from_digit(digit, radix).unwrap_or('0'));
        int_part = (int_part / base).trunc();
    }
    if digits.is_empty() {
        digits.push('0');
    }
    if n < 0.0 {
        digits.push('-');
    }
    let mut out: String = digits.iter().rev().collect();
    if fraction > 0.0 {
        out.push('.');
        for _ in 0..20 {
            fraction *= base;
            let digit = fraction.trunc();
            out.push(char::from_digit(digit as u32, radix).unwrap_or('0'));
            fraction -= digit;
            if fraction == 0.0 {
                break;
            }
        }
    }
    out
}

impl Interpreter {
    /// Defines a native method on `target`, hidden from enumeration.
    pub(crate) fn native_method<F>(&self, target: &JsObject, name: &str, arity: usize, f: F)
    where
        F: Fn(&mut Interpreter, &JsValue, &[JsValue]) -> JsResult<JsValue> + 'static,
    {
        let func = self.create_function(JsFunction::native(name, arity, f));
        target
            .borrow_mut()
            .insert_builtin(name, JsValue::Object(func));
    }

    /// Links a constructor with its prototype and binds it as a global.
    pub(crate) fn install_constructor(
        &mut self,
        name: &str,
        func: JsFunction,
        prototype: &JsObject,
    ) -> JsObject {
        let ctor = self.create_function(func);
        ctor.borrow_mut().insert_property(
            "prototype".into(),
            JsValue::Object(prototype.clone()),
            Attributes::FROZEN,
        );
        prototype
            .borrow_mut()
            .insert_builtin("constructor", JsValue::Object(ctor.clone()));
        self.global_object
            .borrow_mut()
            .insert_builtin(name, JsValue::Object(ctor.clone()));
        ctor
    }

    pub(crate) fn setup_globals(&mut self) {
        self.setup_object();
        self.setup_function();
        self.setup_errors();
        self.setup_array();
        self.setup_string();
        self.setup_number();
        self.setup_boolean();
        self.setup_math();
        self.setup_regexp();

        let mut global = self.global_object.borrow_mut();
        for (name, value) in [
            ("NaN", JsValue::Number(f64::NAN)),
            ("Infinity", JsValue::Number(f64::INFINITY)),
            ("undefined", JsValue::Undefined),
        ] {
            global.insert_property(name.into(), value, Attributes::FROZEN);
        }
        drop(global);
        debug!("global object ready");
    }

    fn setup_object(&mut self) {
        let proto = self.object_prototype.clone();
        self.native_method(&proto, "toString", 0, |interp, this, _args| {
            let obj = this_object(interp, this)?;
            Ok(JsValue::from_str(&format!("[object {}]", obj.class_name())))
        });
        self.native_method(&proto, "valueOf", 0, |interp, this, _args| {
            this_object(interp, this).map(JsValue::Object)
        });
        self.native_method(&proto, "hasOwnProperty", 1, |interp, this, args| {
            let obj = this_object(interp, this)?;
            let key = interp.to_property_key(&arg(args, 0))?;
            let own = obj.borrow().has_own_property(&key);
            Ok(JsValue::Boolean(own))
        });

        let object_ctor = |interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]| {
            let value = arg(args, 0);
            if value.is_nullish() {
                return Ok(JsValue::Object(interp.new_object()));
            }
            interp.to_object(&value).map(JsValue::Object)
        };
        self.install_constructor(
            "Object",
            JsFunction::native_constructor("Object", 1, object_ctor, object_ctor),
            &proto,
        );
    }

    fn setup_function(&mut self) {
        let proto = self.function_prototype.clone();
        self.native_method(&proto, "toString", 0, |interp, this, _args| {
            let callable = this.as_object().and_then(|obj| obj.borrow().callable.clone());
            match callable {
                Some(JsFunction::User { def, .. }) => Ok(JsValue::from_str(&def.to_string())),
                Some(JsFunction::Native { name, .. }) => Ok(JsValue::from_str(&format!(
                    "function {name}() {{\n    [native code]\n}}"
                ))),
                None => interp.throw_error(
                    ErrorKind::Type,
                    "Function.prototype.toString called on a non-function.",
                ),
            }
        });
        self.native_method(&proto, "call", 1, |interp, this, args| {
            let this_arg = arg(args, 0);
            let rest = args.get(1..).unwrap_or(&[]);
            interp.call(this, this_arg, rest)
        });
        self.native_method(&proto, "apply", 2, |interp, this, args| {
            let this_arg = arg(args, 0);
            let list = match arg(args, 1) {
                JsValue::Undefined | JsValue::Null => Vec::new(),
                JsValue::Object(obj) if matches!(obj.class_name(), "Array" | "Arguments") => {
                    let len = interp.array_like_length(&obj)?;
                    (0..len).map(|i| interp.get(&obj, &i.to_string())).collect()
                }
                _ => {
                    return interp.throw_error(
                        ErrorKind::Type,
                        "Function.prototype.apply: second argument must be an array.",
                    );
                }
            };
            interp.call(this, this_arg, &list)
        });

        let function_ctor = |interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]| {
            let mut params = Vec::new();
            for value in args.iter().take(args.len().saturating_sub(1)) {
                params.push(interp.to_js_string(value)?.to_rust_string());
            }
            let body = match args.last() {
                Some(value) => interp.to_js_string(value)?.to_rust_string(),
                None => String::new(),
            };
            let source = format!("function anonymous({}) {{\n{body}\n}}", params.join(","));
            let source_id = SourceId(interp.next_source_id);
            interp.next_source_id += 1;
            let program = match interp.parse(&source, source_id) {
                Ok(program) => program,
                Err(e) => return interp.throw_error(ErrorKind::Syntax, e.message),
            };
            let def = match (program.body.len(), program.body.first()) {
                (
                    1,
                    Some(Statement {
                        kind: StatementKind::FuncDecl(def),
                        ..
                    }),
                ) => def.clone(),
                _ => {
                    return interp
                        .throw_error(ErrorKind::Syntax, "Invalid function body.");
                }
            };
            let func = interp.create_function(JsFunction::User {
                def,
                scope: interp.global_env.clone(),
            });
            Ok(JsValue::Object(func))
        };
        self.install_constructor(
            "Function",
            JsFunction::native_constructor("Function", 1, function_ctor, function_ctor),
            &proto,
        );
    }

    fn setup_errors(&mut self) {
        let base = JsObject::new(JsObjectData::new("Error", Some(self.object_prototype.clone())));
        self.native_method(&base, "toString", 0, |interp, this, _args| {
            let obj = this_object(interp, this)?;
            let name = interp.get(&obj, "name");
            let name = interp.to_js_string(&name)?;
            let message = interp.get(&obj, "message");
            let message = interp.to_js_string(&message)?;
            if message.is_empty() {
                return Ok(JsValue::String(name));
            }
            Ok(JsValue::from_str(&format!("{name}: {message}")))
        });

        for kind in ErrorKind::ALL {
            let proto = match kind {
                ErrorKind::Error => base.clone(),
                _ => JsObject::new(JsObjectData::new("Error", Some(base.clone()))),
            };
            {
                let mut data = proto.borrow_mut();
                data.insert_builtin("name", JsValue::from_str(kind.name()));
                data.insert_builtin("message", JsValue::from_str(""));
            }
            self.error_prototypes.insert(kind, proto.clone());

            let create = move |interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]| {
                let message = match args.first() {
                    None | Some(JsValue::Undefined) => String::new(),
                    Some(value) => interp.to_js_string(value)?.to_rust_string(),
                };
                Ok(interp.create_error(kind, &message))
            };
            self.install_constructor(
                kind.name(),
                JsFunction::native_constructor(kind.name(), 1, create, create),
                &proto,
            );
        }
    }

    fn setup_array(&mut self) {
        let proto = self.array_prototype.clone();

        fn join(interp: &mut Interpreter, this: &JsValue, separator: &JsValue) -> JsResult<JsValue> {
            let obj = this_object(interp, this)?;
            let separator = match separator {
                JsValue::Undefined => JsString::from_str(","),
                other => interp.to_js_string(other)?,
            };
            let len = interp.array_like_length(&obj)?;
            let mut out: Vec<u16> = Vec::new();
            for i in 0..len {
                if i > 0 {
                    out.extend_from_slice(&separator.code_units);
                }
                let element = interp.get(&obj, &i.to_string());
                if !element.is_nullish() {
                    out.extend_from_slice(&interp.to_js_string(&element)?.code_units);
                }
            }
            Ok(JsValue::String(JsString::from_code_units(out)))
        }

        self.native_method(&proto, "join", 1, |interp, this, args| {
            join(interp, this, &arg(args, 0))
        });
        self.native_method(&proto, "toString", 0, |interp, this, _args| {
            join(interp, this, &JsValue::Undefined)
        });
        self.native_method(&proto, "push", 1, |interp, this, args| {
            let obj = this_object(interp, this)?;
            let len = interp.array_like_length(&obj)?;
            let mut next = f64::from(len);
            for value in args {
                interp.put(&obj, &number_ops::to_string(next), value.clone())?;
                next += 1.0;
            }
            interp.put(&obj, "length", JsValue::Number(next))?;
            Ok(JsValue::Number(next))
        });
        self.native_method(&proto, "pop", 0, |interp, this, _args| {
            let obj = this_object(interp, this)?;
            let len = interp.array_like_length(&obj)?;
            if len == 0 {
                interp.put(&obj, "length", JsValue::Number(0.0))?;
                return Ok(JsValue::Undefined);
            }
            let key = (len - 1).to_string();
            let value = interp.get(&obj, &key);
            interp.delete_property(&obj, &key);
            interp.put(&obj, "length", JsValue::Number(f64::from(len - 1)))?;
            Ok(value)
        });

        let array_ctor = |interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]| {
            if let [JsValue::Number(n)] = args {
                let len = number_ops::to_uint32(*n);
                if f64::from(len) != *n {
                    return interp.throw_error(ErrorKind::Range, "Invalid array length");
                }
                let array = interp.new_array(Vec::new());
                interp.put(&array, "length", JsValue::Number(*n))?;
                return Ok(JsValue::Object(array));
            }
            Ok(JsValue::Object(interp.new_array(args.to_vec())))
        };
        self.install_constructor(
            "Array",
            JsFunction::native_constructor("Array", 1, array_ctor, array_ctor),
            &proto,
        );
    }

    fn setup_string(&mut self) {
        let proto = self.string_prototype.clone();

        self.native_method(&proto, "toString", 0, |interp, this, _args| {
            this_primitive(interp, this, "String", "toString")
        });
        self.native_method(&proto, "valueOf", 0, |interp, this, _args| {
            this_primitive(interp, this, "String", "valueOf")
        });
        self.native_method(&proto, "charAt", 1, |interp, this, args| {
            let s = this_to_string(interp, this)?;
            let pos = helpers::to_integer(interp.to_number(&arg(args, 0))?);
            if pos < 0.0 || pos >= s.len() as f64 {
                return Ok(JsValue::from_str(""));
            }
            let pos = pos as usize;
            Ok(JsValue::String(s.slice_utf16(pos, pos + 1)))
        });
        self.native_method(&proto, "charCodeAt", 1, |interp, this, args| {
            let s = this_to_string(interp, this)?;
            let pos = helpers::to_integer(interp.to_number(&arg(args, 0))?);
            if pos < 0.0 || pos >= s.len() as f64 {
                return Ok(JsValue::Number(f64::NAN));
            }
            let unit = s.code_unit_at(pos as usize).map_or(f64::NAN, f64::from);
            Ok(JsValue::Number(unit))
        });
        self.native_method(&proto, "indexOf", 1, |interp, this, args| {
            let s = this_to_string(interp, this)?;
            let search = interp.to_js_string(&arg(args, 0))?;
            let pos = helpers::to_integer(interp.to_number(&arg(args, 1))?);
            let start = pos.clamp(0.0, s.len() as f64) as usize;
            Ok(JsValue::Number(
                s.index_of(&search, start).map_or(-1.0, |i| i as f64),
            ))
        });
        self.native_method(&proto, "substring", 2, |interp, this, args| {
            let s = this_to_string(interp, this)?;
            let len = s.len() as f64;
            let start = helpers::to_integer(interp.to_number(&arg(args, 0))?);
            let end = match arg(args, 1) {
                JsValue::Undefined => len,
                value => helpers::to_integer(interp.to_number(&value)?),
            };
            let start = start.clamp(0.0, len) as usize;
            let end = end.clamp(0.0, len) as usize;
            Ok(JsValue::String(s.slice_utf16(start.min(end), start.max(end))))
        });

        self.install_constructor(
            "String",
            JsFunction::native_constructor(
                "String",
                1,
                |interp, _this, args| match args.first() {
                    Some(value) => interp.to_js_string(value).map(JsValue::String),
                    None => Ok(JsValue::from_str("")),
                },
                |interp, _this, args| {
                    let s = match args.first() {
                        Some(value) => interp.to_js_string(value)?,
                        None => JsString::default(),
                    };
                    Ok(interp
                        .wrap_primitive(&JsValue::String(s))
                        .map_or(JsValue::Undefined, JsValue::Object))
                },
            ),
            &proto,
        );
    }

    fn setup_number(&mut self) {
        let proto = self.number_prototype.clone();

        self.native_method(&proto, "toString", 1, |interp, this, args| {
            let JsValue::Number(n) = this_primitive(interp, this, "Number", "toString")? else {
                return Ok(JsValue::Undefined);
            };
            let radix = match arg(args, 0) {
                JsValue::Undefined => 10.0,
                value => helpers::to_integer(interp.to_number(&value)?),
            };
            if radix == 10.0 {
                return Ok(JsValue::from_str(&number_ops::to_string(n)));
            }
            if !(2.0..=36.0).contains(&radix) {
                return interp.throw_error(ErrorKind::Range, "toString() radix argument must be between 2 and 36");
            }
            Ok(JsValue::from_str(&number_to_radix(n, radix as u32)))
        });
        self.native_method(&proto, "valueOf", 0, |interp, this, _args| {
            this_primitive(interp, this, "Number", "valueOf")
        });

        let ctor = self.install_constructor(
            "Number",
            JsFunction::native_constructor(
                "Number",
                1,
                |interp, _this, args| match args.first() {
                    Some(value) => interp.to_number(value).map(JsValue::Number),
                    None => Ok(JsValue::Number(0.0)),
                },
                |interp, _this, args| {
                    let n = match args.first() {
                        Some(value) => interp.to_number(value)?,
                        None => 0.0,
                    };
                    Ok(interp
                        .wrap_primitive(&JsValue::Number(n))
                        .map_or(JsValue::Undefined, JsValue::Object))
                },
            ),
            &proto,
        );
        let mut data = ctor.borrow_mut();
        for (name, value) in [
            ("MAX_VALUE", f64::MAX),
            ("MIN_VALUE", 5e-324),
            ("NaN", f64::NAN),
            ("NEGATIVE_INFINITY", f64::NEG_INFINITY),
            ("POSITIVE_INFINITY", f64::INFINITY),
        ] {
            data.insert_property(name.into(), JsValue::Number(value), Attributes::FROZEN);
        }
    }

    fn setup_boolean(&mut self) {
        let proto = self.boolean_prototype.clone();

        self.native_method(&proto, "toString", 0, |interp, this, _args| {
            let value = this_primitive(interp, this, "Boolean", "toString")?;
            Ok(JsValue::from_str(if helpers::to_boolean(&value) { "true" } else { "false" }))
        });
        self.native_method(&proto, "valueOf", 0, |interp, this, _args| {
            this_primitive(interp, this, "Boolean", "valueOf")
        });

        self.install_constructor(
            "Boolean",
            JsFunction::native_constructor(
                "Boolean",
                1,
                |_interp, _this, args| Ok(JsValue::Boolean(helpers::to_boolean(&arg(args, 0)))),
                |interp, _this, args| {
                    let b = JsValue::Boolean(helpers::to_boolean(&arg(args, 0)));
                    Ok(interp.wrap_primitive(&b).map_or(JsValue::Undefined, JsValue::Object))
                },
            ),
            &proto,
        );
    }

    fn setup_math(&mut self) {
        let math = JsObject::new(JsObjectData::new("Math", Some(self.object_prototype.clone())));
        {
            let mut data = math.borrow_mut();
            data.insert_property("PI".into(), JsValue::Number(std::f64::consts::PI), Attributes::FROZEN);
            data.insert_property("E".into(), JsValue::Number(std::f64::consts::E), Attributes::FROZEN);
        }

        let unary: [(&str, fn(f64) -> f64); 4] = [
            ("abs", f64::abs),
            ("floor", f64::floor),
            ("ceil", f64::ceil),
            ("sqrt", f64::sqrt),
        ];
        for (name, op) in unary {
            self.native_method(&math, name, 1, move |interp, _this, args| {
                let x = interp.to_number(&arg(args, 0))?;
                Ok(JsValue::Number(op(x)))
            });
        }
        self.native_method(&math, "pow", 2, |interp, _this, args| {
            let x = interp.to_number(&arg(args, 0))?;
            let y = interp.to_number(&arg(args, 1))?;
            Ok(JsValue::Number(math_pow(x, y)))
        });
        self.native_method(&math, "max", 2, |interp, _this, args| {
            let mut result = f64::NEG_INFINITY;
            for value in args {
                let n = interp.to_number(value)?;
                if n.is_nan() {
                    return Ok(JsValue::Number(f64::NAN));
                }
                result = result.max(n);
            }
            Ok(JsValue::Number(result))
        });
        self.native_method(&math, "min", 2, |interp, _this, args| {
            let mut result = f64::INFINITY;
            for value in args {
                let n = interp.to_number(value)?;
                if n.is_nan() {
                    return Ok(JsValue::Number(f64::NAN));
                }
                result = result.min(n);
            }
            Ok(JsValue::Number(result))
        });

        self.global_object
            .borrow_mut()
            .insert_builtin("Math", JsValue::Object(math));
    }
}

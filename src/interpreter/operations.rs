use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreferredType {
    Number,
    String,
}

impl Interpreter {
    pub fn new_object(&self) -> JsObject {
        JsObject::new(JsObjectData::new(
            "Object",
            Some(self.object_prototype.clone()),
        ))
    }

    pub fn new_array(&self, values: Vec<JsValue>) -> JsObject {
        let mut data = JsObjectData::new("Array", Some(self.array_prototype.clone()));
        let len = values.len();
        for (i, v) in values.into_iter().enumerate() {
            data.insert_value(i.to_string(), v);
        }
        data.insert_property("length".into(), JsValue::Number(len as f64), Attributes::PERMANENT);
        JsObject::new(data)
    }

    /// Wraps a function in a Function object. User functions get a fresh
    /// `prototype` object whose `constructor` points back.
    pub fn create_function(&self, func: JsFunction) -> JsObject {
        let is_user = matches!(func, JsFunction::User { .. });
        let mut data = JsObjectData::new("Function", Some(self.function_prototype.clone()));
        data.insert_property(
            "length".into(),
            JsValue::Number(func.arity() as f64),
            Attributes::FROZEN,
        );
        data.callable = Some(func);
        let obj = JsObject::new(data);
        if is_user {
            let proto = self.new_object();
            proto
                .borrow_mut()
                .insert_builtin("constructor", JsValue::Object(obj.clone()));
            obj.borrow_mut().insert_property(
                "prototype".into(),
                JsValue::Object(proto),
                Attributes::DONT_DELETE,
            );
        }
        obj
    }

    pub(crate) fn wrap_primitive(&self, value: &JsValue) -> Option<JsObject> {
        let (class_name, proto) = match value {
            JsValue::Boolean(_) => ("Boolean", &self.boolean_prototype),
            JsValue::Number(_) => ("Number", &self.number_prototype),
            JsValue::String(_) => ("String", &self.string_prototype),
            _ => return None,
        };
        let mut data = JsObjectData::new(class_name, Some(proto.clone()));
        if let JsValue::String(s) = value {
            data.insert_property("length".into(), JsValue::Number(s.len() as f64), Attributes::FROZEN);
        }
        data.slot = InternalSlot::Primitive(value.clone());
        Some(JsObject::new(data))
    }

    // §9.1 ToPrimitive
    pub fn to_primitive(&mut self, value: &JsValue, hint: PreferredType) -> JsResult<JsValue> {
        let JsValue::Object(obj) = value else {
            return Ok(value.clone());
        };
        let order = match hint {
            PreferredType::String => ["toString", "valueOf"],
            PreferredType::Number => ["valueOf", "toString"],
        };
        for name in order {
            let method = self.get(obj, name);
            if method.as_object().is_some_and(JsObject::is_callable) {
                let result = self.call(&method, value.clone(), &[])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
        self.throw_error(ErrorKind::Type, "No default value")
    }

    // §9.3 ToNumber
    pub fn to_number(&mut self, value: &JsValue) -> JsResult<f64> {
        match value {
            JsValue::Object(_) => {
                let prim = self.to_primitive(value, PreferredType::Number)?;
                Ok(helpers::to_number(&prim))
            }
            other => Ok(helpers::to_number(other)),
        }
    }

    pub fn to_int32(&mut self, value: &JsValue) -> JsResult<i32> {
        Ok(number_ops::to_int32(self.to_number(value)?))
    }

    pub fn to_uint32(&mut self, value: &JsValue) -> JsResult<u32> {
        Ok(number_ops::to_uint32(self.to_number(value)?))
    }

    // §9.8 ToString
    pub fn to_js_string(&mut self, value: &JsValue) -> JsResult<JsString> {
        match value {
            JsValue::Object(_) => {
                let prim = self.to_primitive(value, PreferredType::String)?;
                Ok(helpers::primitive_to_string(&prim))
            }
            other => Ok(helpers::primitive_to_string(other)),
        }
    }

    pub fn to_property_key(&mut self, value: &JsValue) -> JsResult<String> {
        match value {
            JsValue::String(s) => Ok(s.to_rust_string()),
            JsValue::Number(n) => Ok(number_ops::to_string(*n)),
            other => Ok(self.to_js_string(other)?.to_rust_string()),
        }
    }

    // §9.9 ToObject
    pub fn to_object(&mut self, value: &JsValue) -> JsResult<JsObject> {
        match value {
            JsValue::Object(o) => Ok(o.clone()),
            JsValue::Undefined | JsValue::Null => {
                self.throw_error(ErrorKind::Type, format!("Value {value} is not object."))
            }
            prim => match self.wrap_primitive(prim) {
                Some(obj) => Ok(obj),
                None => self.throw_error(ErrorKind::Type, format!("Value {value} is not object.")),
            },
        }
    }

    /// [[Get]], with the RegExp constructor's last-match properties read
    /// live from the realm and `arguments` indices read from their
    /// parameters.
    pub fn get(&self, obj: &JsObject, key: &str) -> JsValue {
        let data = obj.borrow();
        let live = match &data.slot {
            InternalSlot::RegExpStatics => self.regexp_statics.property(key),
            InternalSlot::Arguments(map) => map.read(key),
            _ => None,
        };
        live.unwrap_or_else(|| data.get_property(key))
    }

    /// [[Put]], keeping array lengths in step with their indices.
    pub fn put(&mut self, obj: &JsObject, key: &str, value: JsValue) -> JsResult<()> {
        let (class_name, is_statics, linked) = {
            let data = obj.borrow();
            let linked = match &data.slot {
                InternalSlot::Arguments(map) => map
                    .param_for(key)
                    .map(|param| (map.activation.clone(), param.clone())),
                _ => None,
            };
            (data.class_name, matches!(data.slot, InternalSlot::RegExpStatics), linked)
        };
        if let Some((activation, param)) = linked {
            activation.borrow_mut().set(param.as_str(), value.clone());
        }
        if is_statics {
            match key {
                "input" | "$_" => {
                    self.regexp_statics.input = self.to_js_string(&value)?;
                    return Ok(());
                }
                "multiline" | "$*" => {
                    self.regexp_statics.multiline = helpers::to_boolean(&value);
                    return Ok(());
                }
                _ => {}
            }
        }
        if class_name == "Array" {
            if key == "length" {
                let n = self.to_number(&value)?;
                let len = number_ops::to_uint32(n);
                if f64::from(len) != n {
                    return self.throw_error(ErrorKind::Range, "Invalid array length");
                }
                set_array_length(obj, len);
                return Ok(());
            }
            if let Some(index) = helpers::array_index(key) {
                let mut data = obj.borrow_mut();
                if !data.can_put(key) {
                    return Ok(());
                }
                data.put(key, value);
                if index >= data.array_length()
                    && let Some(length) = data.properties.get_mut("length")
                {
                    length.value = JsValue::Number(f64::from(index) + 1.0);
                }
                return Ok(());
            }
        }
        obj.borrow_mut().put(key, value);
        Ok(())
    }

    pub fn delete_property(&mut self, obj: &JsObject, key: &str) -> bool {
        let mut data = obj.borrow_mut();
        let deleted = data.delete(key);
        if deleted && let InternalSlot::Arguments(map) = &mut data.slot {
            map.unlink(key);
        }
        deleted
    }

    pub fn has_property(&self, obj: &JsObject, key: &str) -> bool {
        obj.borrow().has_property(key)
    }

    fn enter_call(&mut self) -> JsResult<()> {
        if self.call_depth >= self.config.max_call_depth {
            return self.throw_error(ErrorKind::Range, "Maximum call stack size exceeded.");
        }
        self.call_depth += 1;
        Ok(())
    }

    /// [[Call]]. Callers that can name the callee expression check
    /// callability themselves to produce a better message.
    pub fn call(&mut self, func: &JsValue, this: JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        let Some(obj) = func.as_object() else {
            return self.throw_error(ErrorKind::Type, format!("Value {func} is not a function."));
        };
        let Some(callable) = obj.borrow().callable.clone() else {
            return self.throw_error(ErrorKind::Type, format!("Object {func} does not allow calls."));
        };
        self.enter_call()?;
        let result = match &callable {
            JsFunction::User { def, scope } => self.call_user(def, scope, obj, this, args),
            JsFunction::Native { call, .. } => call(self, &this, args),
        };
        self.call_depth -= 1;
        result
    }

    /// [[Construct]].
    pub fn construct(&mut self, func: &JsObject, args: &[JsValue]) -> JsResult<JsValue> {
        let Some(callable) = func.borrow().callable.clone() else {
            return self.throw_error(ErrorKind::Type, "Object is not a constructor.");
        };
        self.enter_call()?;
        let result = match &callable {
            JsFunction::User { def, scope } => {
                let proto = match self.get(func, "prototype") {
                    JsValue::Object(p) => p,
                    _ => self.object_prototype.clone(),
                };
                let instance = JsObject::new(JsObjectData::new("Object", Some(proto)));
                let this = JsValue::Object(instance.clone());
                match self.call_user(def, scope, func, this, args) {
                    Ok(JsValue::Object(returned)) => Ok(JsValue::Object(returned)),
                    Ok(_) => Ok(JsValue::Object(instance)),
                    Err(e) => Err(e),
                }
            }
            JsFunction::Native {
                construct: Some(construct),
                ..
            } => construct(self, &JsValue::Undefined, args),
            JsFunction::Native { name, .. } => {
                let message = format!("{name} is not a constructor.");
                self.throw_error(ErrorKind::Type, message)
            }
        };
        self.call_depth -= 1;
        result
    }

    #[tracing::instrument(level = "debug", skip_all, fields(function = def.name.as_ref().map(Identifier::as_str)))]
    fn call_user(
        &mut self,
        def: &Rc<FunctionDef>,
        scope: &EnvRef,
        callee: &JsObject,
        this: JsValue,
        args: &[JsValue],
    ) -> JsResult<JsValue> {
        let this_value = match this {
            JsValue::Undefined | JsValue::Null => JsValue::Object(self.global_object.clone()),
            JsValue::Object(o) => JsValue::Object(o),
            prim => JsValue::Object(self.to_object(&prim)?),
        };
        let activation = Environment::new(Some(scope.clone()));
        let arguments = self.create_arguments_object(callee, args, &activation, def);
        {
            let mut env = activation.borrow_mut();
            env.initialize(
                &Identifier::new("arguments"),
                JsValue::Object(arguments),
                Attributes::DONT_DELETE,
            );
            for (i, param) in def.params.iter().enumerate() {
                let value = args.get(i).cloned().unwrap_or(JsValue::Undefined);
                env.initialize(param, value, Attributes::DONT_DELETE);
            }
        }

        let saved = std::mem::replace(&mut self.ctx, ExecContext::new(activation, this_value));
        self.process_func_decls(&def.body);
        self.process_var_decls(&def.body);
        let completion = self.exec_source_elements(&def.body);
        self.ctx = saved;

        match completion {
            Completion::Return(v) => Ok(v),
            Completion::Throw(e) => Err(e),
            _ => Ok(JsValue::Undefined),
        }
    }

    fn create_arguments_object(
        &self,
        callee: &JsObject,
        args: &[JsValue],
        activation: &EnvRef,
        def: &FunctionDef,
    ) -> JsObject {
        let mut data = JsObjectData::new("Arguments", Some(self.object_prototype.clone()));
        data.insert_builtin("callee", JsValue::Object(callee.clone()));
        data.insert_builtin("length", JsValue::Number(args.len() as f64));
        for (i, arg) in args.iter().enumerate() {
            data.insert_builtin(i.to_string(), arg.clone());
        }
        data.slot = InternalSlot::Arguments(ArgumentsMap {
            activation: activation.clone(),
            params: def.params.iter().take(args.len()).cloned().map(Some).collect(),
        });
        JsObject::new(data)
    }

    // §11.9.3 with the object cases resolved through ToPrimitive
    pub(crate) fn loose_equals(&mut self, left: &JsValue, right: &JsValue) -> JsResult<bool> {
        match (left, right) {
            (JsValue::Object(a), JsValue::Object(b)) => Ok(a.ptr_eq(b)),
            (JsValue::Object(_), other) if !other.is_nullish() => {
                let prim = self.to_primitive(left, PreferredType::Number)?;
                Ok(helpers::abstract_equality(&prim, right))
            }
            (other, JsValue::Object(_)) if !other.is_nullish() => {
                let prim = self.to_primitive(right, PreferredType::Number)?;
                Ok(helpers::abstract_equality(left, &prim))
            }
            _ => Ok(helpers::abstract_equality(left, right)),
        }
    }

    /// `x < y`, converting `x` first.
    pub(crate) fn compare(&mut self, x: &JsValue, y: &JsValue) -> JsResult<Option<bool>> {
        let px = self.to_primitive(x, PreferredType::Number)?;
        let py = self.to_primitive(y, PreferredType::Number)?;
        Ok(helpers::abstract_relational(&px, &py))
    }

    // §15.3.5.3 [[HasInstance]]
    pub(crate) fn has_instance(&mut self, func: &JsObject, value: &JsValue) -> JsResult<bool> {
        let JsValue::Object(obj) = value else {
            return Ok(false);
        };
        let JsValue::Object(proto) = self.get(func, "prototype") else {
            return self.throw_error(
                ErrorKind::Type,
                "instanceof called on an object with an invalid prototype property.",
            );
        };
        let mut current = obj.borrow().prototype.clone();
        while let Some(p) = current {
            if p.ptr_eq(&proto) {
                return Ok(true);
            }
            current = p.borrow().prototype.clone();
        }
        Ok(false)
    }

    pub(crate) fn array_like_length(&mut self, obj: &JsObject) -> JsResult<u32> {
        let len = self.get(obj, "length");
        self.to_uint32(&len)
    }
}

/// Truncates or extends an array. Indices that can't be deleted survive.
fn set_array_length(obj: &JsObject, len: u32) {
    let mut data = obj.borrow_mut();
    if len < data.array_length() {
        let doomed: Vec<String> = data
            .property_order
            .iter()
            .filter(|k| helpers::array_index(k).is_some_and(|i| i >= len))
            .cloned()
            .collect();
        for key in doomed {
            data.delete(&key);
        }
    }
    if let Some(length) = data.properties.get_mut("length") {
        length.value = JsValue::Number(f64::from(len));
    }
}

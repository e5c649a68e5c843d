use super::*;

/// A storage slot resolved once and then read and/or written.
enum Target {
    Binding(EnvRef, Identifier),
    Property(JsObject, String),
    Unresolved(Identifier),
}

/// Source text of a split member expression, for diagnostics.
enum Member<'a> {
    Dot(&'a Expr, &'a Identifier),
    Bracket(&'a Expr, &'a Expr),
}

impl fmt::Display for Member<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Dot(base, ident) => write!(f, "{base}.{ident}"),
            Member::Bracket(base, subscript) => write!(f, "{base}[{subscript}]"),
        }
    }
}

impl Interpreter {
    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> JsResult<JsValue> {
        match &expr.kind {
            ExprKind::Null => Ok(JsValue::Null),
            ExprKind::Boolean(b) => Ok(JsValue::Boolean(*b)),
            ExprKind::Number(n) => Ok(JsValue::Number(*n)),
            ExprKind::String(s) => Ok(JsValue::String(s.clone())),
            ExprKind::RegExp { pattern, flags } => {
                self.new_regexp(pattern, flags).map(JsValue::Object)
            }
            ExprKind::This => Ok(self.ctx.this_value.clone()),
            ExprKind::Resolve(ident) => self.lookup(ident),
            ExprKind::Group(inner) => self.eval_expr(inner),
            ExprKind::Array {
                elements,
                trailing_elision,
            } => self.eval_array_literal(elements, *trailing_elision),
            ExprKind::Object(properties) => self.eval_object_literal(properties),
            ExprKind::FuncExpr(def) => Ok(self.eval_function_expr(def)),

            ExprKind::BracketAccessor { base, subscript } => {
                let (obj, key) = self.eval_bracket(base, subscript)?;
                Ok(self.get(&obj, &key))
            }
            ExprKind::DotAccessor { base, ident } => {
                let obj = self.eval_base(base)?;
                Ok(self.get(&obj, ident.as_str()))
            }

            ExprKind::New { callee, args } => self.eval_new(callee, args.as_ref()),
            ExprKind::FunctionCallValue { callee, args } => {
                let func = self.eval_expr(callee)?;
                self.check_callable(&func, callee.as_ref())?;
                let args = self.eval_args(args)?;
                let this = JsValue::Object(self.global_object.clone());
                self.call(&func, this, &args)
            }
            ExprKind::FunctionCallResolve { ident, args } => self.eval_call_resolve(ident, args),
            ExprKind::FunctionCallBracket {
                base,
                subscript,
                args,
                ..
            } => {
                let (obj, key) = self.eval_bracket(base, subscript)?;
                let func = self.get(&obj, &key);
                self.check_callable(&func, &Member::Bracket(base, subscript))?;
                let args = self.eval_args(args)?;
                self.call(&func, JsValue::Object(obj), &args)
            }
            ExprKind::FunctionCallDot {
                base, ident, args, ..
            } => {
                let obj = self.eval_base(base)?;
                let func = self.get(&obj, ident.as_str());
                self.check_callable(&func, &Member::Dot(base, ident))?;
                let args = self.eval_args(args)?;
                self.call(&func, JsValue::Object(obj), &args)
            }

            ExprKind::PostfixResolve { ident, op } => {
                let target = self.resolve_target(ident);
                self.eval_update(target, *op, false)
            }
            ExprKind::PostfixBracket {
                base,
                subscript,
                op,
            } => {
                let (obj, key) = self.eval_bracket(base, subscript)?;
                self.eval_update(Target::Property(obj, key), *op, false)
            }
            ExprKind::PostfixDot { base, ident, op } => {
                let obj = self.eval_base(base)?;
                self.eval_update(Target::Property(obj, ident.to_string()), *op, false)
            }
            ExprKind::PrefixResolve { ident, op } => {
                let target = self.resolve_target(ident);
                self.eval_update(target, *op, true)
            }
            ExprKind::PrefixBracket {
                base,
                subscript,
                op,
            } => {
                let (obj, key) = self.eval_bracket(base, subscript)?;
                self.eval_update(Target::Property(obj, key), *op, true)
            }
            ExprKind::PrefixDot { base, ident, op } => {
                let obj = self.eval_base(base)?;
                self.eval_update(Target::Property(obj, ident.to_string()), *op, true)
            }

            ExprKind::DeleteResolve(ident) => Ok(JsValue::Boolean(self.delete_identifier(ident))),
            ExprKind::DeleteBracket { base, subscript } => {
                let (obj, key) = self.eval_bracket(base, subscript)?;
                Ok(JsValue::Boolean(self.delete_property(&obj, &key)))
            }
            ExprKind::DeleteDot { base, ident } => {
                let obj = self.eval_base(base)?;
                Ok(JsValue::Boolean(self.delete_property(&obj, ident.as_str())))
            }
            ExprKind::DeleteValue(inner) => {
                self.eval_expr(inner)?;
                Ok(JsValue::Boolean(true))
            }
            ExprKind::Void(inner) => {
                self.eval_expr(inner)?;
                Ok(JsValue::Undefined)
            }
            ExprKind::TypeOfResolve(ident) => {
                // An undeclared name is "undefined", not a ReferenceError.
                if find_binding(&self.ctx.scope, ident.as_str()).is_none() {
                    return Ok(JsValue::from_str("undefined"));
                }
                let value = self.lookup(ident)?;
                Ok(JsValue::from_str(helpers::typeof_val(&value)))
            }
            ExprKind::TypeOfValue(inner) => {
                let value = self.eval_expr(inner)?;
                Ok(JsValue::from_str(helpers::typeof_val(&value)))
            }

            ExprKind::UnaryPlus(inner) => {
                let value = self.eval_expr(inner)?;
                Ok(JsValue::Number(self.to_number(&value)?))
            }
            ExprKind::Negate(inner) => {
                let value = self.eval_expr(inner)?;
                let n = self.to_number(&value)?;
                Ok(JsValue::Number(number_ops::unary_minus(n)))
            }
            ExprKind::BitwiseNot(inner) => {
                let value = self.eval_expr(inner)?;
                let n = self.to_number(&value)?;
                Ok(JsValue::Number(number_ops::bitwise_not(n)))
            }
            ExprKind::LogicalNot(inner) => {
                let value = self.eval_expr(inner)?;
                Ok(JsValue::Boolean(!helpers::to_boolean(&value)))
            }

            ExprKind::Mult { op, left, right } => {
                let (l, r) = self.eval_operands(left, right)?;
                self.mult_op(*op, &l, &r)
            }
            ExprKind::Add { op, left, right } => {
                let (l, r) = self.eval_operands(left, right)?;
                self.add_op(*op, &l, &r)
            }
            ExprKind::Shift { op, left, right } => {
                let (l, r) = self.eval_operands(left, right)?;
                self.shift_op(*op, &l, &r)
            }
            ExprKind::BitOper { op, left, right } => {
                let (l, r) = self.eval_operands(left, right)?;
                self.bit_op(*op, &l, &r)
            }
            ExprKind::Relational { op, left, right } => {
                let (l, r) = self.eval_operands(left, right)?;
                self.relational_op(*op, &l, &r, right)
            }
            ExprKind::Equal { op, left, right } => {
                let (l, r) = self.eval_operands(left, right)?;
                let result = match op {
                    EqualityOp::Eq => self.loose_equals(&l, &r)?,
                    EqualityOp::NotEq => !self.loose_equals(&l, &r)?,
                    EqualityOp::StrictEq => helpers::strict_equality(&l, &r),
                    EqualityOp::StrictNotEq => !helpers::strict_equality(&l, &r),
                };
                Ok(JsValue::Boolean(result))
            }
            ExprKind::BinaryLogical { op, left, right } => {
                let l = self.eval_expr(left)?;
                let decided = match op {
                    LogicalOp::And => !helpers::to_boolean(&l),
                    LogicalOp::Or => helpers::to_boolean(&l),
                };
                if decided { Ok(l) } else { self.eval_expr(right) }
            }
            ExprKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                let cond = self.eval_expr(condition)?;
                if helpers::to_boolean(&cond) {
                    self.eval_expr(then_expr)
                } else {
                    self.eval_expr(else_expr)
                }
            }

            ExprKind::AssignResolve { ident, op, value } => {
                let target = self.resolve_target(ident);
                self.eval_assign(target, *op, value)
            }
            ExprKind::AssignBracket {
                base,
                subscript,
                op,
                value,
            } => {
                let (obj, key) = self.eval_bracket(base, subscript)?;
                self.eval_assign(Target::Property(obj, key), *op, value)
            }
            ExprKind::AssignDot {
                base,
                ident,
                op,
                value,
            } => {
                let obj = self.eval_base(base)?;
                self.eval_assign(Target::Property(obj, ident.to_string()), *op, value)
            }
            ExprKind::Comma { left, right } => {
                self.eval_expr(left)?;
                self.eval_expr(right)
            }
        }
    }

    fn eval_operands(&mut self, left: &Expr, right: &Expr) -> JsResult<(JsValue, JsValue)> {
        let l = self.eval_expr(left)?;
        let r = self.eval_expr(right)?;
        Ok((l, r))
    }

    fn eval_args(&mut self, args: &Arguments) -> JsResult<Vec<JsValue>> {
        args.iter().map(|arg| self.eval_expr(arg)).collect()
    }

    fn lookup(&mut self, ident: &Identifier) -> JsResult<JsValue> {
        match find_binding(&self.ctx.scope, ident.as_str()) {
            Some(ScopeHit::Declarative(env)) => {
                Ok(env.borrow().get(ident.as_str()).unwrap_or(JsValue::Undefined))
            }
            Some(ScopeHit::Object(obj)) => Ok(self.get(&obj, ident.as_str())),
            None => self.undefined_variable(ident),
        }
    }

    /// Evaluates a member base and converts it, naming the base expression
    /// when it is null or undefined.
    fn eval_base(&mut self, base: &Expr) -> JsResult<JsObject> {
        let value = self.eval_expr(base)?;
        if value.is_nullish() {
            return self.not_an_object(&value, base);
        }
        self.to_object(&value)
    }

    /// Base, then subscript, then the conversions of each.
    fn eval_bracket(&mut self, base: &Expr, subscript: &Expr) -> JsResult<(JsObject, String)> {
        let base_value = self.eval_expr(base)?;
        let subscript_value = self.eval_expr(subscript)?;
        if base_value.is_nullish() {
            return self.not_an_object(&base_value, base);
        }
        let obj = self.to_object(&base_value)?;
        let key = self.to_property_key(&subscript_value)?;
        Ok((obj, key))
    }

    fn resolve_target(&self, ident: &Identifier) -> Target {
        match find_binding(&self.ctx.scope, ident.as_str()) {
            Some(ScopeHit::Declarative(env)) => Target::Binding(env, ident.clone()),
            Some(ScopeHit::Object(obj)) => Target::Property(obj, ident.to_string()),
            None => Target::Unresolved(ident.clone()),
        }
    }

    fn read_target(&mut self, target: &Target) -> JsResult<JsValue> {
        match target {
            Target::Binding(env, name) => {
                Ok(env.borrow().get(name.as_str()).unwrap_or(JsValue::Undefined))
            }
            Target::Property(obj, key) => Ok(self.get(obj, key)),
            Target::Unresolved(name) => self.undefined_variable(name),
        }
    }

    /// Unresolved names become deletable properties of the global object.
    fn write_target(&mut self, target: &Target, value: JsValue) -> JsResult<()> {
        match target {
            Target::Binding(env, name) => {
                env.borrow_mut().set(name.as_str(), value);
                Ok(())
            }
            Target::Property(obj, key) => self.put(obj, key, value),
            Target::Unresolved(name) => {
                let global = self.global_object.clone();
                self.put(&global, name.as_str(), value)
            }
        }
    }

    pub(crate) fn assign_identifier(&mut self, ident: &Identifier, value: JsValue) -> JsResult<()> {
        let target = self.resolve_target(ident);
        self.write_target(&target, value)
    }

    /// Assigns through a location expression, as the target of a for-in.
    pub(crate) fn assign_to_location(&mut self, expr: &Expr, value: JsValue) -> JsResult<()> {
        match &expr.innermost().kind {
            ExprKind::Resolve(ident) => self.assign_identifier(ident, value),
            ExprKind::BracketAccessor { base, subscript } => {
                let (obj, key) = self.eval_bracket(base, subscript)?;
                self.put(&obj, &key, value)
            }
            ExprKind::DotAccessor { base, ident } => {
                let obj = self.eval_base(base)?;
                self.put(&obj, ident.as_str(), value)
            }
            _ => {
                debug_assert!(false, "for-in target is not a location");
                self.throw_error(ErrorKind::Syntax, "Left side of for-in statement is not a reference.")
            }
        }
    }

    fn eval_update(&mut self, target: Target, op: UpdateOp, prefix: bool) -> JsResult<JsValue> {
        let old = self.read_target(&target)?;
        let old = self.to_number(&old)?;
        let new = match op {
            UpdateOp::Increment => old + 1.0,
            UpdateOp::Decrement => old - 1.0,
        };
        self.write_target(&target, JsValue::Number(new))?;
        Ok(JsValue::Number(if prefix { new } else { old }))
    }

    /// One read (compound forms only), one evaluation of the right-hand
    /// side, one write.
    fn eval_assign(&mut self, target: Target, op: AssignOp, value: &Expr) -> JsResult<JsValue> {
        let result = if op == AssignOp::Assign {
            self.eval_expr(value)?
        } else {
            let old = self.read_target(&target)?;
            let rhs = self.eval_expr(value)?;
            self.apply_assign_op(op, &old, &rhs)?
        };
        self.write_target(&target, result.clone())?;
        Ok(result)
    }

    fn apply_assign_op(&mut self, op: AssignOp, old: &JsValue, rhs: &JsValue) -> JsResult<JsValue> {
        match op {
            AssignOp::Assign => Ok(rhs.clone()),
            AssignOp::AddAssign => self.add_op(AddOp::Add, old, rhs),
            AssignOp::SubAssign => self.add_op(AddOp::Sub, old, rhs),
            AssignOp::MulAssign => self.mult_op(MultOp::Mul, old, rhs),
            AssignOp::DivAssign => self.mult_op(MultOp::Div, old, rhs),
            AssignOp::ModAssign => self.mult_op(MultOp::Mod, old, rhs),
            AssignOp::LShiftAssign => self.shift_op(ShiftOp::LShift, old, rhs),
            AssignOp::RShiftAssign => self.shift_op(ShiftOp::RShift, old, rhs),
            AssignOp::URShiftAssign => self.shift_op(ShiftOp::URShift, old, rhs),
            AssignOp::BitAndAssign => self.bit_op(BitOp::And, old, rhs),
            AssignOp::BitXorAssign => self.bit_op(BitOp::Xor, old, rhs),
            AssignOp::BitOrAssign => self.bit_op(BitOp::Or, old, rhs),
        }
    }

    fn numbers(&mut self, l: &JsValue, r: &JsValue) -> JsResult<(f64, f64)> {
        let a = self.to_number(l)?;
        let b = self.to_number(r)?;
        Ok((a, b))
    }

    fn mult_op(&mut self, op: MultOp, l: &JsValue, r: &JsValue) -> JsResult<JsValue> {
        let (a, b) = self.numbers(l, r)?;
        let n = match op {
            MultOp::Mul => number_ops::multiply(a, b),
            MultOp::Div => number_ops::divide(a, b),
            MultOp::Mod => number_ops::remainder(a, b),
        };
        Ok(JsValue::Number(n))
    }

    // §11.6.1: concatenation wins if either primitive is a string
    fn add_op(&mut self, op: AddOp, l: &JsValue, r: &JsValue) -> JsResult<JsValue> {
        if op == AddOp::Sub {
            let (a, b) = self.numbers(l, r)?;
            return Ok(JsValue::Number(number_ops::subtract(a, b)));
        }
        let lp = self.to_primitive(l, PreferredType::Number)?;
        let rp = self.to_primitive(r, PreferredType::Number)?;
        if lp.is_string() || rp.is_string() {
            let ls = helpers::primitive_to_string(&lp);
            let rs = helpers::primitive_to_string(&rp);
            return Ok(JsValue::String(ls.concat(&rs)));
        }
        Ok(JsValue::Number(number_ops::add(
            helpers::to_number(&lp),
            helpers::to_number(&rp),
        )))
    }

    fn shift_op(&mut self, op: ShiftOp, l: &JsValue, r: &JsValue) -> JsResult<JsValue> {
        let (a, b) = self.numbers(l, r)?;
        let n = match op {
            ShiftOp::LShift => number_ops::left_shift(a, b),
            ShiftOp::RShift => number_ops::signed_right_shift(a, b),
            ShiftOp::URShift => number_ops::unsigned_right_shift(a, b),
        };
        Ok(JsValue::Number(n))
    }

    fn bit_op(&mut self, op: BitOp, l: &JsValue, r: &JsValue) -> JsResult<JsValue> {
        let (a, b) = self.numbers(l, r)?;
        let n = match op {
            BitOp::And => number_ops::bitwise_and(a, b),
            BitOp::Xor => number_ops::bitwise_xor(a, b),
            BitOp::Or => number_ops::bitwise_or(a, b),
        };
        Ok(JsValue::Number(n))
    }

    fn relational_op(
        &mut self,
        op: RelationalOp,
        l: &JsValue,
        r: &JsValue,
        right: &Expr,
    ) -> JsResult<JsValue> {
        let result = match op {
            RelationalOp::Lt => self.compare(l, r)? == Some(true),
            RelationalOp::Gt => self.compare(r, l)? == Some(true),
            RelationalOp::LtEq => self.compare(r, l)? == Some(false),
            RelationalOp::GtEq => self.compare(l, r)? == Some(false),
            RelationalOp::In => {
                let Some(obj) = r.as_object() else {
                    let message = format!(
                        "Value {r} (result of expression {right}) is not an object. Cannot be used with IN expression."
                    );
                    return self.throw_error(ErrorKind::Type, message);
                };
                let key = self.to_property_key(l)?;
                self.has_property(obj, &key)
            }
            RelationalOp::InstanceOf => {
                let Some(obj) = r.as_object() else {
                    let message = format!(
                        "Value {r} (result of expression {right}) is not an object. Cannot be used with instanceof operator."
                    );
                    return self.throw_error(ErrorKind::Type, message);
                };
                if !obj.is_callable() {
                    let message = format!(
                        "Object {r} (result of expression {right}) does not implement hasInstance. Cannot be used with instanceof operator."
                    );
                    return self.throw_error(ErrorKind::Type, message);
                }
                self.has_instance(obj, l)?
            }
        };
        Ok(JsValue::Boolean(result))
    }

    fn check_callable(&mut self, value: &JsValue, expr: &dyn fmt::Display) -> JsResult<()> {
        if value.as_object().is_some_and(JsObject::is_callable) {
            return Ok(());
        }
        self.not_callable(value, expr)
    }

    /// `this` is the `with` object when the name was found in one, the
    /// global object otherwise.
    fn eval_call_resolve(&mut self, ident: &Identifier, args: &Arguments) -> JsResult<JsValue> {
        let (func, this) = match find_binding(&self.ctx.scope, ident.as_str()) {
            Some(ScopeHit::Declarative(env)) => {
                let func = env.borrow().get(ident.as_str()).unwrap_or(JsValue::Undefined);
                (func, JsValue::Object(self.global_object.clone()))
            }
            Some(ScopeHit::Object(obj)) => (self.get(&obj, ident.as_str()), JsValue::Object(obj)),
            None => return self.undefined_variable(ident),
        };
        self.check_callable(&func, ident)?;
        let args = self.eval_args(args)?;
        self.call(&func, this, &args)
    }

    fn eval_new(&mut self, callee: &Expr, args: Option<&Arguments>) -> JsResult<JsValue> {
        let func = self.eval_expr(callee)?;
        let args = match args {
            Some(args) => self.eval_args(args)?,
            None => Vec::new(),
        };
        let Some(obj) = func.as_object() else {
            let message = format!(
                "Value {func} (result of expression {callee}) is not an object. Cannot be used with new."
            );
            return self.throw_error(ErrorKind::Type, message);
        };
        let constructible = obj
            .borrow()
            .callable
            .as_ref()
            .is_some_and(JsFunction::is_constructor);
        if !constructible {
            let message = format!(
                "Object {func} (result of expression {callee}) is not a constructor. Cannot be used with new."
            );
            return self.throw_error(ErrorKind::Type, message);
        }
        self.construct(obj, &args)
    }

    fn delete_identifier(&mut self, ident: &Identifier) -> bool {
        match find_binding(&self.ctx.scope, ident.as_str()) {
            None => true,
            Some(ScopeHit::Object(obj)) => self.delete_property(&obj, ident.as_str()),
            Some(ScopeHit::Declarative(env)) => {
                let mut env = env.borrow_mut();
                let deletable = env
                    .bindings
                    .get(ident.as_str())
                    .is_some_and(|b| !b.attributes.contains(Attributes::DONT_DELETE));
                if deletable {
                    env.bindings.remove(ident.as_str());
                }
                deletable
            }
        }
    }

    /// A named function expression sees its own name in an intermediate
    /// scope that nothing else can reach.
    fn eval_function_expr(&mut self, def: &Rc<FunctionDef>) -> JsValue {
        let Some(name) = &def.name else {
            let func = self.create_function(JsFunction::User {
                def: def.clone(),
                scope: self.ctx.scope.clone(),
            });
            return JsValue::Object(func);
        };
        let scope = Environment::new(Some(self.ctx.scope.clone()));
        let func = self.create_function(JsFunction::User {
            def: def.clone(),
            scope: scope.clone(),
        });
        scope.borrow_mut().initialize(
            name,
            JsValue::Object(func.clone()),
            Attributes::READ_ONLY | Attributes::DONT_DELETE,
        );
        JsValue::Object(func)
    }

    fn eval_array_literal(&mut self, elements: &NodeList<Element>, trailing_elision: u32) -> JsResult<JsValue> {
        let array = self.new_array(Vec::new());
        let mut index: u32 = 0;
        for element in elements {
            index += element.elision;
            let value = self.eval_expr(&element.value)?;
            array.borrow_mut().insert_value(index.to_string(), value);
            index += 1;
        }
        let length = JsValue::Number(f64::from(index + trailing_elision));
        self.put(&array, "length", length)?;
        Ok(JsValue::Object(array))
    }

    fn eval_object_literal(&mut self, properties: &NodeList<PropertyValue>) -> JsResult<JsValue> {
        let obj = self.new_object();
        for property in properties {
            let value = self.eval_expr(&property.value)?;
            let key = property.name.to_key().to_rust_string();
            self.put(&obj, &key, value)?;
        }
        Ok(JsValue::Object(obj))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn eval(src: &str) -> JsValue {
        let mut interp = Interpreter::new(EngineConfig::default());
        interp.eval_source(src).unwrap()
    }

    fn eval_str(src: &str) -> String {
        match eval(src) {
            JsValue::String(s) => s.to_rust_string(),
            other => panic!("expected a string from {src:?}, got {other:?}"),
        }
    }

    fn eval_num(src: &str) -> f64 {
        match eval(src) {
            JsValue::Number(n) => n,
            other => panic!("expected a number from {src:?}, got {other:?}"),
        }
    }

    fn eval_err(src: &str) -> String {
        let mut interp = Interpreter::new(EngineConfig::default());
        match interp.eval_source(src) {
            Err(crate::error::EngineError::Uncaught { message, .. }) => message,
            other => panic!("expected an uncaught exception from {src:?}, got {other:?}"),
        }
    }

    #[test]
    fn compound_assignment_reads_and_writes_once() {
        let src = "
            var log = '';
            var o = { v: 1 };
            function base() { log += 'b'; return o; }
            function key() { log += 'k'; return 'v'; }
            function rhs() { log += 'r'; return 2; }
            base()[key()] += rhs();
            ((base()).v) *= rhs();
            log + ':' + o.v";
        assert_eq!(eval_str(src), "bkrbr:6");
    }

    #[test]
    fn compound_assignment_through_getter_like_valueof() {
        let src = "
            var reads = 0;
            var o = { valueOf: function () { reads++; return 10; } };
            var x = o;
            x -= 3;
            reads * 100 + x";
        assert_eq!(eval_num(src), 107.0);
    }

    #[test]
    fn logical_operators_short_circuit() {
        let src = "
            var hits = 0;
            function bump() { hits++; return true; }
            var a = false && bump();
            var b = true || bump();
            var c = 0 || 'fallback';
            hits + ':' + a + ':' + b + ':' + c";
        assert_eq!(eval_str(src), "0:false:true:fallback");
    }

    #[test]
    fn hoisted_var_reads_as_undefined() {
        let src = "
            function f() { var seen = typeof x + ':' + x; if (false) { var x = 1; } return seen; }
            f()";
        assert_eq!(eval_str(src), "undefined:undefined");
    }

    #[test]
    fn function_declarations_are_callable_before_they_appear() {
        assert_eq!(eval_num("f(); function f() { return 7; } f()"), 7.0);
        assert_eq!(eval_num("function g() { return 1; } function g() { return 2; } g()"), 2.0);
    }

    #[test]
    fn undeclared_read_is_reference_error() {
        assert_eq!(eval_err("nope + 1"), "ReferenceError: Can't find variable: nope");
        assert_eq!(eval_str("typeof nope"), "undefined");
    }

    #[test]
    fn member_of_undefined_names_the_expression() {
        assert_eq!(
            eval_err("var a = {}; a.b.c"),
            "TypeError: Value undefined (result of expression a.b) is not object."
        );
    }

    #[test]
    fn calling_a_non_function_names_the_callee() {
        assert_eq!(
            eval_err("var f = {}; f()"),
            "TypeError: Object [object Object] (result of expression f) does not allow calls."
        );
        assert_eq!(
            eval_err("var o = { m: 1 }; o.m()"),
            "TypeError: Value 1 (result of expression o.m) is not object."
        );
    }

    #[test]
    fn assignment_to_undeclared_creates_deletable_global() {
        assert_eq!(eval_str("g = 1; var d = delete g; d + ':' + typeof g"), "true:undefined");
        assert_eq!(eval_str("var v = 1; (delete v) + ':' + v"), "false:1");
    }

    #[test]
    fn this_in_method_and_plain_calls() {
        let src = "
            var o = { who: 'o', m: function () { return this.who; } };
            var who = 'global';
            var m = o.m;
            o.m() + ',' + m() + ',' + o['m']()";
        assert_eq!(eval_str(src), "o,global,o");
    }

    #[test]
    fn with_object_is_this_for_resolved_calls() {
        let src = "var o = { f: function () { return this === o; } }; with (o) { f(); }";
        assert!(matches!(eval(src), JsValue::Boolean(true)));
    }

    #[test]
    fn new_uses_prototype_and_returned_objects() {
        let src = "
            function P(x) { this.x = x; }
            P.prototype.twice = function () { return this.x * 2; };
            function Q() { this.lost = true; return { kept: 1 }; }
            var p = new P(4);
            p.twice() + (p instanceof P ? 10 : 0) + new Q().kept + (new Q().lost ? 100 : 0)";
        assert_eq!(eval_num(src), 19.0);
    }

    #[test]
    fn new_on_non_constructor_is_type_error() {
        assert_eq!(
            eval_err("new 5"),
            "TypeError: Value 5 (result of expression 5) is not an object. Cannot be used with new."
        );
        assert!(eval_err("new Math.abs(1)").starts_with("TypeError: Object "));
    }

    #[test]
    fn arguments_object_and_missing_params() {
        let src = "function f(a, b) { return arguments.length + ':' + typeof b + ':' + arguments[0]; } f('x')";
        assert_eq!(eval_str(src), "1:undefined:x");
    }

    #[test]
    fn closures_capture_their_scope() {
        let src = "
            function counter() { var n = 0; return function () { return ++n; }; }
            var c = counter(); c(); c();
            c()";
        assert_eq!(eval_num(src), 3.0);
    }

    #[test]
    fn named_function_expression_sees_itself() {
        let src = "var f = function fact(n) { return n <= 1 ? 1 : n * fact(n - 1); }; f(5) + ':' + typeof fact";
        assert_eq!(eval_str(src), "120:undefined");
    }

    #[test]
    fn array_literal_holes_and_length() {
        assert_eq!(eval_num("[1,,3].length"), 3.0);
        assert_eq!(eval_num("[,,].length"), 2.0);
        assert_eq!(eval_str("var a = [1,,3]; (1 in a) + ':' + (2 in a)"), "false:true");
    }

    #[test]
    fn postfix_and_prefix_results() {
        assert_eq!(eval_str("var i = 5; var a = i++; var b = ++i; a + ',' + b + ',' + i"), "5,7,7");
        assert_eq!(eval_num("var o = { n: '4' }; o.n--; o.n"), 3.0);
    }

    #[test]
    fn operator_coercions() {
        assert_eq!(eval_str("1 + '2'"), "12");
        assert_eq!(eval_num("'6' * '7'"), 42.0);
        assert_eq!(eval_num("'3' - 1"), 2.0);
        assert!(matches!(eval("'10' < '9'"), JsValue::Boolean(true)));
        assert!(matches!(eval("10 < '9'"), JsValue::Boolean(false)));
        assert!(matches!(eval("null == undefined"), JsValue::Boolean(true)));
        assert!(matches!(eval("NaN <= NaN"), JsValue::Boolean(false)));
        assert_eq!(eval_num("-1 >>> 28"), 15.0);
        assert_eq!(eval_num("7 % -3"), 1.0);
    }

    #[test]
    fn object_equality_uses_to_primitive() {
        assert!(matches!(eval("var o = { valueOf: function () { return 3; } }; o == 3"), JsValue::Boolean(true)));
        assert!(matches!(eval("({}) == ({})"), JsValue::Boolean(false)));
    }

    #[test]
    fn in_requires_an_object() {
        assert!(eval_err("'x' in 'xyz'").starts_with("TypeError: Value xyz (result of expression \"xyz\")"));
        assert!(matches!(eval("'length' in []"), JsValue::Boolean(true)));
    }

    #[test]
    fn comma_and_void() {
        assert_eq!(eval_num("var x = (1, 2, 3); x"), 3.0);
        assert!(matches!(eval("void 0"), JsValue::Undefined));
    }

    #[test]
    fn recursion_limit_throws_range_error() {
        let mut interp = Interpreter::new(EngineConfig {
            max_call_depth: 25,
            ..EngineConfig::default()
        });
        let result = interp.eval_source("function f() { return f(); } f()");
        assert!(matches!(
            result,
            Err(crate::error::EngineError::Uncaught { ref message, .. })
                if message == "RangeError: Maximum call stack size exceeded."
        ));
    }
}

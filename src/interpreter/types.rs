use super::*;
use crate::interpreter::builtins::regexp::RegExpData;

pub type JsResult<T> = Result<T, JsValue>;

/// Outcome of executing a statement.
#[derive(Clone, Debug)]
pub enum Completion {
    /// `None` is the empty value: it never replaces the value of an
    /// enclosing statement list.
    Normal(Option<JsValue>),
    Return(JsValue),
    Throw(JsValue),
    Break(Option<Identifier>),
    Continue(Option<Identifier>),
}

impl Completion {
    pub fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }

    /// The value carried by a normal or return completion.
    pub fn value(&self) -> Option<&JsValue> {
        match self {
            Completion::Normal(v) => v.as_ref(),
            Completion::Return(v) | Completion::Throw(v) => Some(v),
            Completion::Break(_) | Completion::Continue(_) => None,
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Attributes: u8 {
        const READ_ONLY = 1 << 0;
        const DONT_ENUM = 1 << 1;
        const DONT_DELETE = 1 << 2;
    }
}

impl Attributes {
    /// Attributes of builtin methods and prototype links.
    pub const HIDDEN: Attributes = Attributes::DONT_ENUM;
    pub const PERMANENT: Attributes = Attributes::DONT_ENUM.union(Attributes::DONT_DELETE);
    pub const FROZEN: Attributes = Attributes::PERMANENT.union(Attributes::READ_ONLY);
}

#[derive(Clone, Debug)]
pub struct Property {
    pub value: JsValue,
    pub attributes: Attributes,
}

impl Property {
    pub fn new(value: JsValue, attributes: Attributes) -> Self {
        Property { value, attributes }
    }
}

pub type NativeFn = Rc<dyn Fn(&mut Interpreter, &JsValue, &[JsValue]) -> JsResult<JsValue>>;

pub enum JsFunction {
    User {
        def: Rc<FunctionDef>,
        scope: EnvRef,
    },
    Native {
        name: String,
        arity: usize,
        call: NativeFn,
        /// Called with `this` undefined when the function is used with `new`.
        construct: Option<NativeFn>,
    },
}

impl JsFunction {
    pub fn native<F>(name: &str, arity: usize, f: F) -> Self
    where
        F: Fn(&mut Interpreter, &JsValue, &[JsValue]) -> JsResult<JsValue> + 'static,
    {
        JsFunction::Native {
            name: name.to_string(),
            arity,
            call: Rc::new(f),
            construct: None,
        }
    }

    pub fn native_constructor<F, C>(name: &str, arity: usize, call: F, construct: C) -> Self
    where
        F: Fn(&mut Interpreter, &JsValue, &[JsValue]) -> JsResult<JsValue> + 'static,
        C: Fn(&mut Interpreter, &JsValue, &[JsValue]) -> JsResult<JsValue> + 'static,
    {
        JsFunction::Native {
            name: name.to_string(),
            arity,
            call: Rc::new(call),
            construct: Some(Rc::new(construct)),
        }
    }

    pub fn is_constructor(&self) -> bool {
        match self {
            JsFunction::User { .. } => true,
            JsFunction::Native { construct, .. } => construct.is_some(),
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            JsFunction::User { def, .. } => def.params.len(),
            JsFunction::Native { arity, .. } => *arity,
        }
    }
}

impl Clone for JsFunction {
    fn clone(&self) -> Self {
        match self {
            JsFunction::User { def, scope } => JsFunction::User {
                def: def.clone(),
                scope: scope.clone(),
            },
            JsFunction::Native {
                name,
                arity,
                call,
                construct,
            } => JsFunction::Native {
                name: name.clone(),
                arity: *arity,
                call: call.clone(),
                construct: construct.clone(),
            },
        }
    }
}

impl std::fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsFunction::User { def, .. } => match &def.name {
                Some(name) => write!(f, "JsFunction::User({name})"),
                None => write!(f, "JsFunction::User(<anonymous>)"),
            },
            JsFunction::Native { name, .. } => write!(f, "JsFunction::Native({name})"),
        }
    }
}

/// Per-class state that isn't a property.
#[derive(Clone, Debug, Default)]
pub enum InternalSlot {
    #[default]
    None,
    /// Boolean, Number and String wrappers.
    Primitive(JsValue),
    RegExp(RegExpData),
    /// The RegExp constructor, whose last-match properties are read from
    /// the interpreter on access.
    RegExpStatics,
    Arguments(ArgumentsMap),
}

/// Ties the leading indices of an `arguments` object to the formal
/// parameters they were passed as (§10.1.8). A deleted index is unlinked.
#[derive(Clone, Debug)]
pub struct ArgumentsMap {
    pub(crate) activation: EnvRef,
    pub(crate) params: Vec<Option<Identifier>>,
}

impl ArgumentsMap {
    pub(crate) fn param_for(&self, key: &str) -> Option<&Identifier> {
        let index = helpers::array_index(key)?;
        self.params.get(usize::try_from(index).ok()?)?.as_ref()
    }

    pub(crate) fn unlink(&mut self, key: &str) {
        if let Some(index) = helpers::array_index(key)
            && let Some(slot) = self.params.get_mut(index as usize)
        {
            *slot = None;
        }
    }

    pub(crate) fn read(&self, key: &str) -> Option<JsValue> {
        let param = self.param_for(key)?;
        self.activation.borrow().get(param.as_str())
    }
}

#[derive(Debug)]
pub struct JsObjectData {
    pub class_name: &'static str,
    pub(crate) properties: FxHashMap<String, Property>,
    pub(crate) property_order: Vec<String>,
    pub prototype: Option<JsObject>,
    pub callable: Option<JsFunction>,
    pub slot: InternalSlot,
}

impl JsObjectData {
    pub fn new(class_name: &'static str, prototype: Option<JsObject>) -> Self {
        JsObjectData {
            class_name,
            properties: FxHashMap::default(),
            property_order: Vec::new(),
            prototype,
            callable: None,
            slot: InternalSlot::None,
        }
    }

    pub fn has_own_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn has_property(&self, key: &str) -> bool {
        if self.properties.contains_key(key) {
            return true;
        }
        let mut proto = self.prototype.clone();
        while let Some(p) = proto {
            let data = p.borrow();
            if data.properties.contains_key(key) {
                return true;
            }
            proto = data.prototype.clone();
        }
        false
    }

    /// Plain [[Get]]: own properties, then the prototype chain.
    pub fn get_property(&self, key: &str) -> JsValue {
        if let Some(prop) = self.properties.get(key) {
            return prop.value.clone();
        }
        let mut proto = self.prototype.clone();
        while let Some(p) = proto {
            let data = p.borrow();
            if let Some(prop) = data.properties.get(key) {
                return prop.value.clone();
            }
            proto = data.prototype.clone();
        }
        JsValue::Undefined
    }

    /// Defines or overwrites an own property regardless of its attributes.
    pub fn insert_property(&mut self, key: String, value: JsValue, attributes: Attributes) {
        if !self.properties.contains_key(&key) {
            self.property_order.push(key.clone());
        }
        self.properties.insert(key, Property::new(value, attributes));
    }

    pub fn insert_value(&mut self, key: impl Into<String>, value: JsValue) {
        self.insert_property(key.into(), value, Attributes::empty());
    }

    pub fn insert_builtin(&mut self, key: impl Into<String>, value: JsValue) {
        self.insert_property(key.into(), value, Attributes::HIDDEN);
    }

    /// [[CanPut]] over the chain: a read-only property anywhere shadows writes.
    pub fn can_put(&self, key: &str) -> bool {
        if let Some(prop) = self.properties.get(key) {
            return !prop.attributes.contains(Attributes::READ_ONLY);
        }
        let mut proto = self.prototype.clone();
        while let Some(p) = proto {
            let data = p.borrow();
            if let Some(prop) = data.properties.get(key) {
                return !prop.attributes.contains(Attributes::READ_ONLY);
            }
            proto = data.prototype.clone();
        }
        true
    }

    /// [[Put]]: writes to read-only properties are silently dropped, and a
    /// new property is created enumerable and deletable.
    pub fn put(&mut self, key: &str, value: JsValue) {
        if !self.can_put(key) {
            return;
        }
        if let Some(prop) = self.properties.get_mut(key) {
            prop.value = value;
        } else {
            self.insert_property(key.to_string(), value, Attributes::empty());
        }
    }

    pub fn delete(&mut self, key: &str) -> bool {
        match self.properties.get(key) {
            None => true,
            Some(prop) if prop.attributes.contains(Attributes::DONT_DELETE) => false,
            Some(_) => {
                self.properties.remove(key);
                self.property_order.retain(|k| k != key);
                true
            }
        }
    }

    pub fn enumerable_keys(&self) -> Vec<String> {
        self.property_order
            .iter()
            .filter(|k| {
                self.properties
                    .get(k.as_str())
                    .is_some_and(|p| !p.attributes.contains(Attributes::DONT_ENUM))
            })
            .cloned()
            .collect()
    }

    /// Own enumerable keys in insertion order, then inherited ones not
    /// shadowed by anything nearer (enumerable or not).
    pub fn enumerable_keys_with_proto(&self) -> Vec<String> {
        let mut seen: FxHashSet<String> = self.property_order.iter().cloned().collect();
        let mut keys = self.enumerable_keys();
        let mut proto = self.prototype.clone();
        while let Some(p) = proto {
            let data = p.borrow();
            for key in &data.property_order {
                if seen.insert(key.clone())
                    && data
                        .properties
                        .get(key)
                        .is_some_and(|prop| !prop.attributes.contains(Attributes::DONT_ENUM))
                {
                    keys.push(key.clone());
                }
            }
            proto = data.prototype.clone();
        }
        keys
    }

    pub fn primitive_value(&self) -> Option<&JsValue> {
        match &self.slot {
            InternalSlot::Primitive(v) => Some(v),
            _ => None,
        }
    }

    pub fn array_length(&self) -> u32 {
        match self.properties.get("length").map(|p| &p.value) {
            Some(JsValue::Number(n)) => number_ops::to_uint32(*n),
            _ => 0,
        }
    }
}

pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Clone, Debug)]
pub struct Binding {
    pub value: JsValue,
    pub attributes: Attributes,
}

/// One link of the scope chain. An environment either holds its own
/// bindings or is backed by an object (the global object, or the operand
/// of a `with` statement).
#[derive(Debug, Default)]
pub struct Environment {
    pub(crate) bindings: FxHashMap<Identifier, Binding>,
    pub(crate) with_object: Option<JsObject>,
    pub(crate) parent: Option<EnvRef>,
}

/// Where an identifier was found on the scope chain.
pub(crate) enum ScopeHit {
    Declarative(EnvRef),
    Object(JsObject),
}

impl Environment {
    pub fn new(parent: Option<EnvRef>) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            bindings: FxHashMap::default(),
            with_object: None,
            parent,
        }))
    }

    pub fn new_object(object: JsObject, parent: Option<EnvRef>) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            bindings: FxHashMap::default(),
            with_object: Some(object),
            parent,
        }))
    }

    /// Registers `name` unless already bound here; never overwrites.
    pub fn declare(&mut self, name: &Identifier, attributes: Attributes) {
        if let Some(object) = &self.with_object {
            let mut data = object.borrow_mut();
            if !data.has_own_property(name.as_str()) {
                data.insert_property(name.to_string(), JsValue::Undefined, attributes);
            }
            return;
        }
        self.bindings.entry(name.clone()).or_insert(Binding {
            value: JsValue::Undefined,
            attributes,
        });
    }

    /// Writes `name` here, bypassing read-only. Used by declarations.
    pub fn initialize(&mut self, name: &Identifier, value: JsValue, attributes: Attributes) {
        if let Some(object) = &self.with_object {
            object
                .borrow_mut()
                .insert_property(name.to_string(), value, attributes);
            return;
        }
        self.bindings.insert(name.clone(), Binding { value, attributes });
    }

    /// Assigns an existing declarative binding; read-only ones are left alone.
    pub fn set(&mut self, name: &str, value: JsValue) {
        if let Some(binding) = self.bindings.get_mut(name)
            && !binding.attributes.contains(Attributes::READ_ONLY)
        {
            binding.value = value;
        }
    }

    pub fn get(&self, name: &str) -> Option<JsValue> {
        self.bindings.get(name).map(|b| b.value.clone())
    }
}

/// Walks the scope chain from `env` outwards.
pub(crate) fn find_binding(env: &EnvRef, name: &str) -> Option<ScopeHit> {
    let mut current = Some(env.clone());
    while let Some(scope) = current {
        let next = {
            let s = scope.borrow();
            if let Some(object) = &s.with_object {
                if object.borrow().has_property(name) {
                    return Some(ScopeHit::Object(object.clone()));
                }
            } else if s.bindings.contains_key(name) {
                return Some(ScopeHit::Declarative(scope.clone()));
            }
            s.parent.clone()
        };
        current = next;
    }
    None
}

/// The state a running statement executes against.
#[derive(Clone, Debug)]
pub struct ExecContext {
    pub scope: EnvRef,
    /// Receives `var` and function declarations: the activation of the
    /// running function, or the global environment.
    pub variable_env: EnvRef,
    pub this_value: JsValue,
    /// Labels of the statements enclosing the running one, innermost last.
    pub labels: Vec<Identifier>,
}

impl ExecContext {
    pub fn new(scope: EnvRef, this_value: JsValue) -> Self {
        ExecContext {
            variable_env: scope.clone(),
            scope,
            this_value,
            labels: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> JsObjectData {
        JsObjectData::new("Object", None)
    }

    #[test]
    fn read_only_properties_ignore_put() {
        let mut obj = plain();
        obj.insert_property("x".into(), JsValue::Number(1.0), Attributes::READ_ONLY);
        obj.put("x", JsValue::Number(2.0));
        assert!(matches!(obj.get_property("x"), JsValue::Number(n) if n == 1.0));
    }

    #[test]
    fn dont_delete_survives_delete() {
        let mut obj = plain();
        obj.insert_property("x".into(), JsValue::Null, Attributes::DONT_DELETE);
        obj.insert_value("y", JsValue::Null);
        assert!(!obj.delete("x"));
        assert!(obj.delete("y"));
        assert!(obj.delete("missing"));
        assert!(obj.has_own_property("x"));
        assert_eq!(obj.property_order, vec!["x".to_string()]);
    }

    #[test]
    fn enumeration_respects_insertion_and_shadowing() {
        let proto = JsObject::new(plain());
        {
            let mut p = proto.borrow_mut();
            p.insert_value("inherited", JsValue::Null);
            p.insert_value("shadowed", JsValue::Null);
            p.insert_builtin("hidden", JsValue::Null);
        }
        let mut obj = JsObjectData::new("Object", Some(proto));
        obj.insert_value("b", JsValue::Null);
        obj.insert_value("a", JsValue::Null);
        obj.insert_builtin("shadowed", JsValue::Null);
        assert_eq!(obj.enumerable_keys_with_proto(), vec!["b", "a", "inherited"]);
    }

    #[test]
    fn inherited_read_only_blocks_put() {
        let proto = JsObject::new(plain());
        proto
            .borrow_mut()
            .insert_property("k".into(), JsValue::Null, Attributes::READ_ONLY);
        let mut obj = JsObjectData::new("Object", Some(proto));
        obj.put("k", JsValue::Number(1.0));
        assert!(!obj.has_own_property("k"));
    }

    #[test]
    fn scope_chain_resolution() {
        let global = Environment::new(None);
        global
            .borrow_mut()
            .declare(&Identifier::new("g"), Attributes::DONT_DELETE);
        let object = JsObject::new(plain());
        object.borrow_mut().insert_value("w", JsValue::Null);
        let with_env = Environment::new_object(object, Some(global.clone()));
        let inner = Environment::new(Some(with_env));

        assert!(matches!(find_binding(&inner, "w"), Some(ScopeHit::Object(_))));
        assert!(matches!(find_binding(&inner, "g"), Some(ScopeHit::Declarative(e)) if Rc::ptr_eq(&e, &global)));
        assert!(find_binding(&inner, "nope").is_none());
    }

    #[test]
    fn declare_does_not_overwrite() {
        let env = Environment::new(None);
        let x = Identifier::new("x");
        env.borrow_mut()
            .initialize(&x, JsValue::Number(3.0), Attributes::DONT_DELETE);
        env.borrow_mut().declare(&x, Attributes::DONT_DELETE);
        assert!(matches!(env.borrow().get("x"), Some(JsValue::Number(n)) if n == 3.0));
    }

    #[test]
    fn const_binding_is_read_only() {
        let env = Environment::new(None);
        let c = Identifier::new("c");
        env.borrow_mut()
            .initialize(&c, JsValue::Number(1.0), Attributes::READ_ONLY | Attributes::DONT_DELETE);
        env.borrow_mut().set("c", JsValue::Number(2.0));
        assert!(matches!(env.borrow().get("c"), Some(JsValue::Number(n)) if n == 1.0));
    }
}

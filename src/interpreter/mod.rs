use crate::ast::*;
use crate::error::EngineError;
use crate::parser::{ParseError, Parser};
use crate::types::{JsObject, JsString, JsValue, number_ops};
use bitflags::bitflags;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

mod types;
pub use types::*;

mod helpers;
mod errors;
pub use errors::ErrorKind;
mod operations;
pub use operations::PreferredType;
mod hoist;
mod exec;
mod eval;
pub(crate) mod builtins;
pub use builtins::regexp::{
    CompiledPattern, FancyRegexEngine, RegExpData, RegExpFlags, RegExpStatics, RegexEngine,
    RegexMatch,
};

/// Host-tunable limits and metadata.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Nested calls allowed before a RangeError is thrown.
    pub max_call_depth: usize,
    /// Recorded as `sourceURL` on errors thrown by scripts.
    pub source_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_call_depth: 100,
            source_url: None,
        }
    }
}

pub struct Interpreter {
    config: EngineConfig,
    global_object: JsObject,
    global_env: EnvRef,
    ctx: ExecContext,
    object_prototype: JsObject,
    function_prototype: JsObject,
    array_prototype: JsObject,
    string_prototype: JsObject,
    number_prototype: JsObject,
    boolean_prototype: JsObject,
    regexp_prototype: JsObject,
    error_prototypes: FxHashMap<ErrorKind, JsObject>,
    regex_engine: Rc<dyn RegexEngine>,
    regexp_statics: RegExpStatics,
    call_depth: usize,
    next_source_id: u32,
}

impl Interpreter {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_regex_engine(config, Rc::new(FancyRegexEngine))
    }

    /// Builds a realm whose RegExp objects compile through `engine`.
    pub fn with_regex_engine(config: EngineConfig, engine: Rc<dyn RegexEngine>) -> Self {
        let object_prototype = JsObject::new(JsObjectData::new("Object", None));
        let derived = |class_name: &'static str, slot: InternalSlot| {
            let mut data = JsObjectData::new(class_name, Some(object_prototype.clone()));
            data.slot = slot;
            JsObject::new(data)
        };

        let function_prototype = derived("Function", InternalSlot::None);
        function_prototype.borrow_mut().callable =
            Some(JsFunction::native("", 0, |_, _, _| Ok(JsValue::Undefined)));
        let array_prototype = derived("Array", InternalSlot::None);
        array_prototype.borrow_mut().insert_property(
            "length".into(),
            JsValue::Number(0.0),
            Attributes::PERMANENT,
        );
        let string_prototype = derived(
            "String",
            InternalSlot::Primitive(JsValue::from_str("")),
        );
        let number_prototype = derived("Number", InternalSlot::Primitive(JsValue::Number(0.0)));
        let boolean_prototype =
            derived("Boolean", InternalSlot::Primitive(JsValue::Boolean(false)));
        let regexp_prototype = derived("Object", InternalSlot::None);

        let global_object = derived("Object", InternalSlot::None);
        let global_env = Environment::new_object(global_object.clone(), None);
        let ctx = ExecContext::new(global_env.clone(), JsValue::Object(global_object.clone()));

        let mut interp = Interpreter {
            config,
            global_object,
            global_env,
            ctx,
            object_prototype,
            function_prototype,
            array_prototype,
            string_prototype,
            number_prototype,
            boolean_prototype,
            regexp_prototype,
            error_prototypes: FxHashMap::default(),
            regex_engine: engine,
            regexp_statics: RegExpStatics::default(),
            call_depth: 0,
            next_source_id: 0,
        };
        interp.setup_globals();
        interp
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn global_object(&self) -> &JsObject {
        &self.global_object
    }

    fn error_prototype(&self, kind: ErrorKind) -> JsObject {
        self.error_prototypes
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| self.object_prototype.clone())
    }

    /// Installs a host function as a global, hidden from enumeration.
    pub fn define_global(&mut self, name: &str, func: JsFunction) {
        let func = self.create_function(func);
        self.global_object
            .borrow_mut()
            .insert_builtin(name, JsValue::Object(func));
    }

    pub fn parse(&self, source: &str, source_id: SourceId) -> Result<Program, ParseError> {
        Parser::new(source, source_id)?.parse_program()
    }

    /// Runs a parsed program in the global context: function declarations
    /// first, then `var` bindings, then the statements. Host natives may
    /// call this re-entrantly; the caller's context and call depth are
    /// restored on return.
    #[tracing::instrument(level = "debug", skip_all, fields(source_id = program.source_id.0))]
    pub fn run_program(&mut self, program: &Program) -> Completion {
        let global_ctx = ExecContext::new(
            self.global_env.clone(),
            JsValue::Object(self.global_object.clone()),
        );
        let saved_ctx = std::mem::replace(&mut self.ctx, global_ctx);
        let saved_depth = self.call_depth;
        self.process_func_decls(&program.body);
        self.process_var_decls(&program.body);
        let completion = self.exec_source_elements(&program.body);
        self.ctx = saved_ctx;
        self.call_depth = saved_depth;
        if let Completion::Throw(exception) = &completion {
            let message = self.describe_exception(exception);
            debug!(%message, "uncaught exception");
        }
        completion
    }

    /// Parses and runs `source` as a new compilation unit, yielding the
    /// value of its last value-producing statement.
    pub fn eval_source(&mut self, source: &str) -> Result<JsValue, EngineError> {
        let source_id = SourceId(self.next_source_id);
        self.next_source_id += 1;
        let program = self.parse(source, source_id)?;
        match self.run_program(&program) {
            Completion::Throw(exception) => {
                let line = exception.as_object().and_then(|obj| {
                    match obj.borrow().get_property("line") {
                        JsValue::Number(n) => Some(n as u32),
                        _ => None,
                    }
                });
                Err(EngineError::Uncaught {
                    message: self.describe_exception(&exception),
                    line,
                })
            }
            completion => Ok(completion.value().cloned().unwrap_or(JsValue::Undefined)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globals_live_on_the_global_object() {
        let mut interp = Interpreter::new(EngineConfig::default());
        interp.eval_source("var a = 1; function f() {}").unwrap();
        let global = interp.global_object().clone();
        assert!(global.borrow().has_own_property("a"));
        assert!(global.borrow().has_own_property("f"));
        assert!(matches!(
            interp.eval_source("this.a").unwrap(),
            JsValue::Number(n) if n == 1.0
        ));
    }

    #[test]
    fn sources_share_one_realm() {
        let mut interp = Interpreter::new(EngineConfig::default());
        interp.eval_source("var counter = 41;").unwrap();
        assert!(matches!(
            interp.eval_source("++counter").unwrap(),
            JsValue::Number(n) if n == 42.0
        ));
    }

    #[test]
    fn parse_errors_surface_as_engine_errors() {
        let mut interp = Interpreter::new(EngineConfig::default());
        assert!(matches!(
            interp.eval_source("var = ;"),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn uncaught_errors_carry_their_line() {
        let mut interp = Interpreter::new(EngineConfig::default());
        let err = interp.eval_source("var x = 1;\nthrow new TypeError('bad');").unwrap_err();
        match err {
            EngineError::Uncaught { message, line } => {
                assert_eq!(message, "TypeError: bad");
                assert_eq!(line, Some(2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn source_url_is_recorded() {
        let mut interp = Interpreter::new(EngineConfig {
            source_url: Some("file:///t.js".into()),
            ..EngineConfig::default()
        });
        let url = interp
            .eval_source("var u; try { null.x; } catch (e) { u = e.sourceURL; } u")
            .unwrap();
        assert!(matches!(url, JsValue::String(s) if s.to_rust_string() == "file:///t.js"));
    }

    #[test]
    fn host_functions_are_callable() {
        let mut interp = Interpreter::new(EngineConfig::default());
        interp.define_global(
            "twice",
            JsFunction::native("twice", 1, |interp, _this, args| {
                let n = interp.to_number(args.first().unwrap_or(&JsValue::Undefined))?;
                Ok(JsValue::Number(n * 2.0))
            }),
        );
        assert!(matches!(
            interp.eval_source("twice('21')").unwrap(),
            JsValue::Number(n) if n == 42.0
        ));
    }
}

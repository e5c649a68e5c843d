use kjs_walk::ast::SourceId;
use kjs_walk::{Completion, EngineConfig, EngineError, Interpreter, JsFunction, JsValue};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

fn interp() -> Interpreter {
    Interpreter::new(EngineConfig::default())
}

fn as_string(value: JsValue) -> String {
    match value {
        JsValue::String(s) => s.to_rust_string(),
        other => panic!("expected a string, got {other:?}"),
    }
}

#[test]
fn streamed_source_is_a_fixed_point() {
    let src = r#"
        function outer(a, b) {
            var re = /x+/gi, s = "q\"uote\n";
            for (var k in a) if (k) continue; else break;
            lbl: while (b--) { (a.f)(1, [1, , 2]); b += { p: 1, 'q r': 2 }.p; }
            switch (a) { case 1: break; default: ; }
            try { throw a ? b : -b; } catch (e) { return typeof e; } finally { a = (1 + 2) * 3; }
        }
    "#;
    let rt = interp();
    let first = rt.parse(src, SourceId(0)).unwrap().to_string();
    let second = rt.parse(&first, SourceId(1)).unwrap().to_string();
    assert_eq!(first, second);
    assert!(first.contains("(a.f)(1, "));
    assert!(first.contains("(1 + 2) * 3"));
}

#[test]
fn function_to_string_round_trips_through_the_parser() {
    let mut rt = interp();
    let text = as_string(
        rt.eval_source("function sq(n) { if (n) return n*n; } sq.toString()")
            .unwrap(),
    );
    assert_eq!(text, "function sq(n) {\n  if (n) return n * n;\n}");
    let again = as_string(rt.eval_source(&format!("({text}).toString()")).unwrap());
    assert_eq!(again, text);
}

#[test]
fn declarations_can_be_registered_before_running() {
    let mut rt = interp();
    let program = rt
        .parse("var early; function helper() { return 7; }", SourceId(0))
        .unwrap();
    rt.process_var_decls(&program.body);
    rt.process_func_decls(&program.body);
    let global = rt.global_object().clone();
    assert!(global.borrow().has_own_property("early"));
    assert!(global.borrow().get_property("helper").is_object());
    assert!(matches!(
        rt.eval_source("helper()").unwrap(),
        JsValue::Number(n) if n == 7.0
    ));
}

#[test]
fn uncaught_exceptions_carry_details() {
    let mut rt = interp();
    match rt.eval_source("var a = 1;\n\nundefinedThing();") {
        Err(EngineError::Uncaught { message, line }) => {
            assert_eq!(message, "ReferenceError: Can't find variable: undefinedThing");
            assert_eq!(line, Some(3));
        }
        other => panic!("unexpected {other:?}"),
    }

    match rt.eval_source("throw 'plain';") {
        Err(EngineError::Uncaught { message, line }) => {
            assert_eq!(message, "plain");
            assert_eq!(line, None);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn details_attach_at_the_innermost_statement() {
    let mut rt = interp();
    let src = "function boom() {\n  null.x;\n}\ntry {\n  boom();\n} catch (e) { e.line + ':' + e.sourceId }";
    assert_eq!(as_string(rt.eval_source(src).unwrap()), "2:0");
}

#[test]
fn parse_errors_are_static() {
    let mut rt = interp();
    for (src, fragment) in [
        ("1 = 2;", "Left side of assignment is not a reference."),
        ("a: a: ;", "Duplicate label a"),
        ("while (1) { continue nope; }", "Label nope not found"),
    ] {
        match rt.eval_source(src) {
            Err(EngineError::Parse(e)) => {
                assert!(e.to_string().contains(fragment), "{src}: {e}");
            }
            other => panic!("{src}: unexpected {other:?}"),
        }
    }
}

#[test]
fn call_depth_comes_from_the_config() {
    let mut rt = Interpreter::new(EngineConfig {
        max_call_depth: 10,
        ..EngineConfig::default()
    });
    let src = "function down(n) { return n ? down(n - 1) : 0; } down(5)";
    assert!(rt.eval_source(src).is_ok());
    match rt.eval_source("down(50)") {
        Err(EngineError::Uncaught { message, .. }) => {
            assert_eq!(message, "RangeError: Maximum call stack size exceeded.");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(rt.eval_source("down(3)").is_ok());
}

#[test]
fn host_natives_see_arguments_and_this() {
    let mut rt = interp();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    rt.define_global(
        "record",
        JsFunction::native("record", 1, move |interp, _this, args| {
            for value in args {
                let s = interp.to_js_string(value)?.to_rust_string();
                sink.borrow_mut().push(s);
            }
            Ok(JsValue::Undefined)
        }),
    );
    rt.eval_source("record(1, 'two', [3, 4]); for (var i = 0; i < 2; i++) record(i);")
        .unwrap();
    assert_eq!(*seen.borrow(), vec!["1", "two", "3,4", "0", "1"]);
    assert!(!rt
        .global_object()
        .borrow()
        .enumerable_keys()
        .contains(&"record".to_string()));
}

#[test]
fn run_program_reports_throw_completions() {
    let mut rt = interp();
    let program = rt.parse("throw new RangeError('r');", SourceId(4)).unwrap();
    let completion = rt.run_program(&program);
    let Completion::Throw(value) = completion else {
        panic!("expected a throw, got {completion:?}");
    };
    assert_eq!(rt.describe_exception(&value), "RangeError: r");
    let source_id = value.as_object().unwrap().borrow().get_property("sourceId");
    assert!(matches!(source_id, JsValue::Number(n) if n == 4.0));
}

#[test]
fn host_natives_can_reenter_eval_source() {
    let mut rt = interp();
    rt.define_global(
        "load",
        JsFunction::native("load", 1, |interp, _this, args| {
            let src = interp
                .to_js_string(args.first().unwrap_or(&JsValue::Undefined))?
                .to_rust_string();
            interp
                .eval_source(&src)
                .map_err(|e| JsValue::from_str(&e.to_string()))
        }),
    );
    assert_eq!(as_string(rt.eval_source("load('1'); 'ok'").unwrap()), "ok");
    let src = "function f() { var local = 'inner'; load('1'); return typeof local; } f()";
    assert_eq!(as_string(rt.eval_source(src).unwrap()), "string");
    assert_eq!(
        as_string(rt.eval_source("load('var loaded = 3'); typeof loaded").unwrap()),
        "number"
    );

    let mut shallow = Interpreter::new(EngineConfig {
        max_call_depth: 10,
        ..EngineConfig::default()
    });
    shallow.define_global(
        "load",
        JsFunction::native("load", 1, |interp, _this, args| {
            let src = interp
                .to_js_string(args.first().unwrap_or(&JsValue::Undefined))?
                .to_rust_string();
            interp
                .eval_source(&src)
                .map_err(|e| JsValue::from_str(&e.to_string()))
        }),
    );
    let nested = "function down(n) { return n ? down(n - 1) : load('2'); } down(5)";
    assert!(matches!(shallow.eval_source(nested).unwrap(), JsValue::Number(n) if n == 2.0));
    assert!(shallow.eval_source("down(3)").is_ok());
}

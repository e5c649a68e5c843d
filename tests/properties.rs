use kjs_walk::{Completion, EngineConfig, Interpreter, JsValue};
use pretty_assertions::assert_eq;

fn run(src: &str) -> JsValue {
    let mut interp = Interpreter::new(EngineConfig::default());
    match interp.eval_source(src) {
        Ok(value) => value,
        Err(e) => panic!("{src:?} failed: {e}"),
    }
}

fn run_str(src: &str) -> String {
    match run(src) {
        JsValue::String(s) => s.to_rust_string(),
        other => panic!("expected a string from {src:?}, got {other:?}"),
    }
}

fn run_num(src: &str) -> f64 {
    match run(src) {
        JsValue::Number(n) => n,
        other => panic!("expected a number from {src:?}, got {other:?}"),
    }
}

#[test]
fn sibling_lists_keep_source_order() {
    let src = r#"
        var log = '';
        function t(x) { log += x; return x; }
        var a = [t(1), t(2), , t(3)];
        function f(p, q, r) { return '' + p + q + r; }
        f(t(4), t(5), t(6));
        var v1 = t(7), v2 = t(8);
        var o = { z: t(9), a: 0, m: 0 };
        var keys = '';
        for (var k in o) keys += k;
        switch (2) { case t('a'): case t('b'): case 2: break; }
        log + '|' + keys + '|' + a.length + '|' + f.length"#;
    assert_eq!(run_str(src), "123456789ab|zam|4|3");
}

#[test]
fn compound_assignment_reads_once_evaluates_once_writes_once() {
    let src = r#"
        var log = '';
        var store = { _v: 10 };
        var target = {};
        function obj() { log += 'o'; return target; }
        function key() { log += 'k'; return 'p'; }
        function rhs() { log += 'r'; return 5; }
        target.p = { valueOf: function () { log += 'v'; return 1; } };
        obj()[key()] += rhs();
        log + ':' + target.p"#;
    assert_eq!(run_str(src), "okrv:6");

    let parens = r#"
        var log = '';
        var o = { n: 2 };
        function side() { log += 's'; return 3; }
        ((o).n) *= side();
        (((o.n))) -= side();
        log + ':' + o.n"#;
    assert_eq!(run_str(parens), "ss:3");

    let ident = r#"
        var count = 0;
        var x = { valueOf: function () { count++; return 4; } };
        x <<= 1;
        count + ':' + x"#;
    assert_eq!(run_str(ident), "1:8");
}

#[test]
fn finally_return_overrides_throw() {
    let src = r#"
        function f() {
            try { throw new Error('A'); } finally { return 'B'; }
        }
        f()"#;
    assert_eq!(run_str(src), "B");

    let mut interp = Interpreter::new(EngineConfig::default());
    let program = interp
        .parse(
            "function g() { try { throw 1; } finally { return 2; } } g();",
            kjs_walk::ast::SourceId(0),
        )
        .unwrap();
    assert!(matches!(
        interp.run_program(&program),
        Completion::Normal(Some(JsValue::Number(n))) if n == 2.0
    ));
}

#[test]
fn continue_skips_one_iteration() {
    let src = "var sum = 0; for (var i = 0; i < 3; i++) { if (i == 1) continue; sum += i; } sum";
    assert_eq!(run_num(src), 2.0);
}

#[test]
fn labeled_break_leaves_the_outer_loop() {
    let src = r#"
        var trips = 0;
        outer: for (var i = 0; i < 5; i++) {
            for (var j = 0; j < 5; j++) {
                trips++;
                break outer;
            }
            trips += 100;
        }
        trips + ':' + i + ':' + j"#;
    assert_eq!(run_str(src), "1:0:0");

    let mut interp = Interpreter::new(EngineConfig::default());
    let program = interp
        .parse("a: { for (;;) { break a; } }", kjs_walk::ast::SourceId(0))
        .unwrap();
    assert!(matches!(interp.run_program(&program), Completion::Normal(_)));
}

#[test]
fn hoisted_vars_read_as_undefined() {
    let src = r#"
        function f() {
            var seen = typeof x + ':' + (x === undefined);
            if (false) { var x = 1; }
            return seen;
        }
        f()"#;
    assert_eq!(run_str(src), "undefined:true");
    assert_eq!(run_str("var r = g(); function g() { return 'early'; } r"), "early");
}

#[test]
fn switch_falls_through_after_a_match() {
    let src = r#"
        var out = '';
        switch (1) {
            case 1: out += 'one';
            case 2: out += 'two';
            case 3: out += 'three'; break;
            case 4: out += 'four';
        }
        out"#;
    assert_eq!(run_str(src), "onetwothree");
}

#[test]
fn switch_with_default_before_cases() {
    let run_case = |n: u32| {
        run_str(&format!(
            "var out = ''; switch ({n}) {{ case 1: out += 'a'; default: out += 'd'; case 2: out += 'b'; case 3: out += 'c'; }} out"
        ))
    };
    assert_eq!(run_case(1), "adbc");
    assert_eq!(run_case(2), "bc");
    assert_eq!(run_case(3), "c");
    assert_eq!(run_case(9), "dbc");
}

#[test]
fn logical_operators_short_circuit() {
    let src = r#"
        var hits = 0;
        function bump() { hits++; return true; }
        var a = false && bump();
        var b = true || bump();
        var c = 0 && bump();
        var d = 'x' || bump();
        var e = true && bump();
        hits + ':' + a + ':' + b + ':' + c + ':' + d + ':' + e"#;
    assert_eq!(run_str(src), "1:false:true:0:x:true");
}

#[test]
fn regexp_last_match_state_tracks_the_realm() {
    let src = r#"
        /(\d+)-(\d+)/.exec('tel 12-34 end');
        var first = RegExp.$1 + ',' + RegExp.$2 + ',' + RegExp.lastMatch;
        'zzz'.match(/q/);
        first + '|' + RegExp.$1 + '|' + RegExp.leftContext + '|' + RegExp.rightContext"#;
    assert_eq!(run_str(src), "12,34,12-34|12|tel | end");

    let mut other = Interpreter::new(EngineConfig::default());
    assert_eq!(
        match other.eval_source("RegExp.lastMatch").unwrap() {
            JsValue::String(s) => s.to_rust_string(),
            v => panic!("unexpected {v:?}"),
        },
        ""
    );
}

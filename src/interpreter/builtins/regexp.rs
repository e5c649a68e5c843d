use super::*;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct RegExpFlags: u8 {
        const GLOBAL = 1 << 0;
        const IGNORE_CASE = 1 << 1;
        const MULTILINE = 1 << 2;
    }
}

impl RegExpFlags {
    /// `None` for an unknown or repeated flag.
    pub fn parse(flags: &str) -> Option<RegExpFlags> {
        let mut parsed = RegExpFlags::empty();
        for c in flags.chars() {
            let flag = match c {
                'g' => RegExpFlags::GLOBAL,
                'i' => RegExpFlags::IGNORE_CASE,
                'm' => RegExpFlags::MULTILINE,
                _ => return None,
            };
            if parsed.contains(flag) {
                return None;
            }
            parsed |= flag;
        }
        Some(parsed)
    }
}

impl fmt::Display for RegExpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, c) in [
            (RegExpFlags::GLOBAL, 'g'),
            (RegExpFlags::IGNORE_CASE, 'i'),
            (RegExpFlags::MULTILINE, 'm'),
        ] {
            if self.contains(flag) {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

/// A successful match. All offsets count UTF-16 code units.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegexMatch {
    pub index: usize,
    pub length: usize,
    /// One entry per subpattern; `None` when the group did not take part.
    pub captures: Vec<Option<(usize, usize)>>,
}

impl RegexMatch {
    pub fn end(&self) -> usize {
        self.index + self.length
    }
}

pub trait CompiledPattern: fmt::Debug {
    /// First match starting at or after `start`.
    fn match_at(&self, input: &JsString, start: usize) -> Option<RegexMatch>;
}

/// Compiles ES3 pattern source. Hosts can supply their own.
pub trait RegexEngine {
    fn compile(&self, pattern: &str, flags: RegExpFlags) -> Result<Box<dyn CompiledPattern>, String>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FancyRegexEngine;

impl RegexEngine for FancyRegexEngine {
    fn compile(&self, pattern: &str, flags: RegExpFlags) -> Result<Box<dyn CompiledPattern>, String> {
        let translated = translate_pattern(pattern, flags);
        let regex = fancy_regex::Regex::new(&translated).map_err(|e| e.to_string())?;
        Ok(Box::new(FancyPattern { regex }))
    }
}

#[derive(Debug)]
struct FancyPattern {
    regex: fancy_regex::Regex,
}

impl CompiledPattern for FancyPattern {
    fn match_at(&self, input: &JsString, start: usize) -> Option<RegexMatch> {
        let text = Utf16Text::new(input);
        let from = *text.byte_at_unit.get(start)?;
        let caps = self.regex.captures_from_pos(&text.text, from).ok()??;
        let whole = caps.get(0)?;
        let index = text.unit_at_byte[whole.start()];
        let captures = (1..caps.len())
            .map(|i| {
                caps.get(i)
                    .map(|m| (text.unit_at_byte[m.start()], text.unit_at_byte[m.end()]))
            })
            .collect();
        Some(RegexMatch {
            index,
            length: text.unit_at_byte[whole.end()] - index,
            captures,
        })
    }
}

/// UTF-8 view of a UTF-16 string with offset maps in both directions.
/// Lone surrogates become U+FFFD, one code unit wide.
struct Utf16Text {
    text: String,
    byte_at_unit: Vec<usize>,
    unit_at_byte: Vec<usize>,
}

impl Utf16Text {
    fn new(input: &JsString) -> Self {
        let mut text = String::with_capacity(input.len());
        let mut byte_at_unit = Vec::with_capacity(input.len() + 1);
        let mut unit_at_byte = Vec::with_capacity(input.len() + 1);
        for decoded in char::decode_utf16(input.code_units.iter().copied()) {
            let (c, units) = match decoded {
                Ok(c) => (c, c.len_utf16()),
                Err(_) => (char::REPLACEMENT_CHARACTER, 1),
            };
            let unit = byte_at_unit.len();
            byte_at_unit.extend(std::iter::repeat_n(text.len(), units));
            unit_at_byte.extend(std::iter::repeat_n(unit, c.len_utf8()));
            text.push(c);
        }
        byte_at_unit.push(text.len());
        unit_at_byte.push(input.len());
        Utf16Text {
            text,
            byte_at_unit,
            unit_at_byte,
        }
    }
}

fn push_hex(out: &mut String, c: char) {
    out.push_str(&format!("\\x{{{:X}}}", u32::from(c)));
}

fn push_literal(out: &mut String, c: char) {
    if c.is_alphanumeric() || c == '_' || c == ' ' {
        out.push(c);
    } else {
        push_hex(out, c);
    }
}

fn hex_value(chars: &[char]) -> Option<u32> {
    let digits: String = chars.iter().collect();
    if chars.iter().all(char::is_ascii_hexdigit) {
        u32::from_str_radix(&digits, 16).ok()
    } else {
        None
    }
}

/// `{n}`, `{n,}` or `{n,m}` at `i`.
fn starts_quantifier(chars: &[char], i: usize) -> bool {
    let mut j = i + 1;
    let digits_from = j;
    while chars.get(j).is_some_and(char::is_ascii_digit) {
        j += 1;
    }
    if j == digits_from {
        return false;
    }
    if chars.get(j) == Some(&',') {
        j += 1;
        while chars.get(j).is_some_and(char::is_ascii_digit) {
            j += 1;
        }
    }
    chars.get(j) == Some(&'}')
}

/// Rewrites ES3 pattern syntax into the dialect `fancy-regex` accepts.
fn translate_pattern(source: &str, flags: RegExpFlags) -> String {
    let mut out = String::with_capacity(source.len() + 8);
    if flags.contains(RegExpFlags::IGNORE_CASE) {
        out.push_str("(?i)");
    }
    if flags.contains(RegExpFlags::MULTILINE) {
        out.push_str("(?m)");
    }

    let chars: Vec<char> = source.chars().collect();
    let mut in_class = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            i = translate_escape(&chars, i, in_class, &mut out);
            continue;
        }
        if in_class {
            match c {
                ']' => {
                    in_class = false;
                    out.push(']');
                }
                '[' | '&' | '~' => push_hex(&mut out, c),
                _ => out.push(c),
            }
            i += 1;
            continue;
        }
        match c {
            '[' if chars.get(i + 1) == Some(&']') => {
                out.push_str("(?!)");
                i += 2;
                continue;
            }
            '[' if chars.get(i + 1) == Some(&'^') && chars.get(i + 2) == Some(&']') => {
                out.push_str(r"[\s\S]");
                i += 3;
                continue;
            }
            '[' => {
                in_class = true;
                out.push('[');
                if chars.get(i + 1) == Some(&'^') {
                    out.push('^');
                    i += 1;
                }
            }
            '.' => out.push_str(r"[^\n\r\x{2028}\x{2029}]"),
            '{' if starts_quantifier(&chars, i) => {
                while i < chars.len() && chars[i] != '}' {
                    out.push(chars[i]);
                    i += 1;
                }
                out.push('}');
            }
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            _ => out.push(c),
        }
        i += 1;
    }
    out
}

/// Translates the escape at `chars[i]` and returns the index after it.
fn translate_escape(chars: &[char], i: usize, in_class: bool, out: &mut String) -> usize {
    let Some(&next) = chars.get(i + 1) else {
        out.push_str(r"\\");
        return i + 1;
    };
    match next {
        'd' if in_class => out.push_str("0-9"),
        'd' => out.push_str("[0-9]"),
        'D' if !in_class => out.push_str("[^0-9]"),
        'w' if in_class => out.push_str("A-Za-z0-9_"),
        'w' => out.push_str("[A-Za-z0-9_]"),
        'W' if !in_class => out.push_str("[^A-Za-z0-9_]"),
        'D' | 'W' | 's' | 'S' | 'n' | 'r' | 't' => {
            out.push('\\');
            out.push(next);
        }
        'b' if in_class => push_hex(out, '\u{8}'),
        'b' | 'B' => {
            out.push('\\');
            out.push(next);
        }
        'f' => push_hex(out, '\u{C}'),
        'v' => push_hex(out, '\u{B}'),
        'c' => match chars.get(i + 2) {
            Some(letter) if letter.is_ascii_alphabetic() => {
                push_hex(out, char::from(*letter as u8 % 32));
                return i + 3;
            }
            _ => {
                out.push_str(r"\\c");
            }
        },
        'x' | 'u' => {
            let width = if next == 'x' { 2 } else { 4 };
            let digits = chars.get(i + 2..i + 2 + width);
            match digits.and_then(hex_value) {
                Some(cp) => {
                    let c = char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER);
                    push_hex(out, c);
                    return i + 2 + width;
                }
                None => out.push(next),
            }
        }
        '0'..='7' if in_class || next == '0' => {
            let mut j = i + 1;
            let mut value = 0u32;
            while j < chars.len() && j < i + 4 && ('0'..='7').contains(&chars[j]) {
                value = value * 8 + chars[j].to_digit(8).unwrap_or(0);
                j += 1;
            }
            push_hex(out, char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
            return j;
        }
        '1'..='9' => {
            let mut j = i + 1;
            out.push('\\');
            while j < chars.len() && chars[j].is_ascii_digit() {
                out.push(chars[j]);
                j += 1;
            }
            return j;
        }
        _ => push_literal(out, next),
    }
    i + 2
}

/// The RegExp constructor's view of the last successful match.
#[derive(Clone, Debug, Default)]
pub struct RegExpStatics {
    pub input: JsString,
    pub multiline: bool,
    /// Index 0 is the whole match.
    captures: Vec<Option<(usize, usize)>>,
}

impl RegExpStatics {
    pub fn record(&mut self, input: &JsString, m: &RegexMatch) {
        self.input = input.clone();
        self.captures.clear();
        self.captures.push(Some((m.index, m.end())));
        self.captures.extend(m.captures.iter().copied());
    }

    fn group(&self, i: usize) -> JsValue {
        let text = match self.captures.get(i) {
            Some(Some((start, end))) => self.input.slice_utf16(*start, *end),
            _ => JsString::default(),
        };
        JsValue::String(text)
    }

    /// The value of a last-match property, or `None` if `key` isn't one.
    pub fn property(&self, key: &str) -> Option<JsValue> {
        let whole = self.captures.first().copied().flatten();
        let value = match key {
            "input" | "$_" => JsValue::String(self.input.clone()),
            "multiline" | "$*" => JsValue::Boolean(self.multiline),
            "lastMatch" | "$&" => self.group(0),
            "lastParen" | "$+" => match self.captures.len() {
                0 | 1 => JsValue::String(JsString::default()),
                n => self.group(n - 1),
            },
            "leftContext" | "$`" => JsValue::String(match whole {
                Some((start, _)) => self.input.slice_utf16(0, start),
                None => JsString::default(),
            }),
            "rightContext" | "$'" => JsValue::String(match whole {
                Some((_, end)) => self.input.slice_utf16(end, self.input.len()),
                None => JsString::default(),
            }),
            _ => {
                let digit = key.strip_prefix('$')?.parse::<usize>().ok()?;
                if !(1..=9).contains(&digit) || key.len() != 2 {
                    return None;
                }
                self.group(digit)
            }
        };
        Some(value)
    }
}

const STATIC_NAMES: [&str; 21] = [
    "input", "$_", "multiline", "$*", "lastMatch", "$&", "lastParen", "$+", "leftContext", "$`",
    "rightContext", "$'", "$1", "$2", "$3", "$4", "$5", "$6", "$7", "$8", "$9",
];

#[derive(Clone, Debug)]
pub struct RegExpData {
    pub source: String,
    pub flags: RegExpFlags,
    pub pattern: Rc<dyn CompiledPattern>,
}

fn regexp_data(value: &JsValue) -> Option<(JsObject, RegExpData)> {
    let obj = value.as_object()?;
    match &obj.borrow().slot {
        InternalSlot::RegExp(data) => Some((obj.clone(), data.clone())),
        _ => None,
    }
}

fn install_instance_properties(obj: &mut JsObjectData, data: &RegExpData) {
    for (key, value) in [
        ("source", JsValue::from_str(&data.source)),
        ("global", JsValue::Boolean(data.flags.contains(RegExpFlags::GLOBAL))),
        ("ignoreCase", JsValue::Boolean(data.flags.contains(RegExpFlags::IGNORE_CASE))),
        ("multiline", JsValue::Boolean(data.flags.contains(RegExpFlags::MULTILINE))),
    ] {
        obj.insert_property(key.into(), value, Attributes::FROZEN);
    }
    obj.insert_property("lastIndex".into(), JsValue::Number(0.0), Attributes::PERMANENT);
}

fn string_arg(interp: &mut Interpreter, value: &JsValue) -> JsResult<String> {
    if value.is_undefined() {
        return Ok(String::new());
    }
    Ok(interp.to_js_string(value)?.to_rust_string())
}

fn regexp_constructor(interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
    let pattern = arg(args, 0);
    let flags = arg(args, 1);
    if regexp_data(&pattern).is_some() {
        if !flags.is_undefined() {
            return interp.throw_error(
                ErrorKind::Type,
                "Cannot supply flags when constructing one RegExp from another.",
            );
        }
        return Ok(pattern);
    }
    let pattern = string_arg(interp, &pattern)?;
    let flags = string_arg(interp, &flags)?;
    interp.new_regexp(&pattern, &flags).map(JsValue::Object)
}

/// Code units of `template` with `$` substitutions expanded for `m`.
fn expand_template(template: &JsString, input: &JsString, m: &RegexMatch, out: &mut Vec<u16>) {
    let units = &template.code_units;
    let digit = |i: usize| {
        units
            .get(i)
            .and_then(|&u| char::from_u32(u32::from(u)))
            .and_then(|c| c.to_digit(10))
            .map(|d| d as usize)
    };
    let capture = |n: usize, out: &mut Vec<u16>| {
        if let Some(Some((start, end))) = m.captures.get(n - 1) {
            out.extend_from_slice(&input.code_units[*start..*end]);
        }
    };
    let mut i = 0;
    while i < units.len() {
        if units[i] != u16::from(b'$') || i + 1 == units.len() {
            out.push(units[i]);
            i += 1;
            continue;
        }
        match units[i + 1] {
            0x24 => out.push(0x24),
            0x26 => out.extend_from_slice(&input.code_units[m.index..m.end()]),
            0x60 => out.extend_from_slice(&input.code_units[..m.index]),
            0x27 => out.extend_from_slice(&input.code_units[m.end()..]),
            _ => match digit(i + 1) {
                Some(d1) => {
                    let two = digit(i + 2).map(|d2| d1 * 10 + d2);
                    if let Some(nn) = two.filter(|nn| (1..=m.captures.len()).contains(nn)) {
                        capture(nn, out);
                        i += 3;
                        continue;
                    }
                    if (1..=m.captures.len()).contains(&d1) {
                        capture(d1, out);
                    } else {
                        out.extend_from_slice(&units[i..i + 2]);
                    }
                }
                None => {
                    out.push(units[i]);
                    i += 1;
                    continue;
                }
            },
        }
        i += 2;
    }
}

impl Interpreter {
    /// A fresh RegExp object. Literals get one per evaluation.
    pub(crate) fn new_regexp(&mut self, pattern: &str, flags: &str) -> JsResult<JsObject> {
        let data = self.compile_regexp(pattern, flags)?;
        let mut obj = JsObjectData::new("RegExp", Some(self.regexp_prototype.clone()));
        install_instance_properties(&mut obj, &data);
        obj.slot = InternalSlot::RegExp(data);
        Ok(JsObject::new(obj))
    }

    fn compile_regexp(&mut self, pattern: &str, flags: &str) -> JsResult<RegExpData> {
        let Some(parsed) = RegExpFlags::parse(flags) else {
            return self.throw_error(
                ErrorKind::Syntax,
                format!("Invalid regular expression: invalid flags '{flags}'"),
            );
        };
        match self.regex_engine.compile(pattern, parsed) {
            Ok(compiled) => Ok(RegExpData {
                source: pattern.to_string(),
                flags: parsed,
                pattern: Rc::from(compiled),
            }),
            Err(reason) => self.throw_error(
                ErrorKind::Syntax,
                format!("Invalid regular expression: {reason}"),
            ),
        }
    }

    /// Runs the pattern once, recording a success in the last-match state.
    fn regex_match(&mut self, data: &RegExpData, input: &JsString, start: usize) -> Option<RegexMatch> {
        if start > input.len() {
            return None;
        }
        let found = data.pattern.match_at(input, start)?;
        trace!(source = %data.source, index = found.index, "regexp match");
        self.regexp_statics.record(input, &found);
        Some(found)
    }

    /// One step of `exec`: honours and updates `lastIndex` for global
    /// patterns, always starts at 0 otherwise.
    fn regexp_step(&mut self, obj: &JsObject, data: &RegExpData, input: &JsString) -> JsResult<Option<RegexMatch>> {
        let global = data.flags.contains(RegExpFlags::GLOBAL);
        let mut start = 0;
        if global {
            let last = self.get(obj, "lastIndex");
            let last = helpers::to_integer(self.to_number(&last)?);
            if last < 0.0 || last > input.len() as f64 {
                self.put(obj, "lastIndex", JsValue::Number(0.0))?;
                return Ok(None);
            }
            start = last as usize;
        }
        let found = self.regex_match(data, input, start);
        if global {
            let next = found.as_ref().map_or(0, RegexMatch::end);
            self.put(obj, "lastIndex", JsValue::Number(next as f64))?;
        }
        Ok(found)
    }

    fn match_array(&self, input: &JsString, m: &RegexMatch) -> JsObject {
        let mut values = vec![JsValue::String(input.slice_utf16(m.index, m.end()))];
        values.extend(m.captures.iter().map(|capture| match capture {
            Some((start, end)) => JsValue::String(input.slice_utf16(*start, *end)),
            None => JsValue::Undefined,
        }));
        let array = self.new_array(values);
        {
            let mut data = array.borrow_mut();
            data.insert_value("index", JsValue::Number(m.index as f64));
            data.insert_value("input", JsValue::String(input.clone()));
        }
        array
    }

    fn this_regexp(&mut self, this: &JsValue, method: &str) -> JsResult<(JsObject, RegExpData)> {
        match regexp_data(this) {
            Some(found) => Ok(found),
            None => self.throw_error(
                ErrorKind::Type,
                format!("RegExp.prototype.{method} called on an object that is not a RegExp."),
            ),
        }
    }

    /// The subject of `exec`/`test`; with no argument, `RegExp.input`.
    fn exec_input(&mut self, args: &[JsValue]) -> JsResult<JsString> {
        match args.first() {
            Some(value) => self.to_js_string(value),
            None => Ok(self.regexp_statics.input.clone()),
        }
    }

    /// The pattern argument to `match` and `search`, converted as
    /// `new RegExp(arg)` when it isn't one already.
    fn coerce_regexp(&mut self, value: &JsValue) -> JsResult<(JsObject, RegExpData)> {
        if let Some(found) = regexp_data(value) {
            return Ok(found);
        }
        let pattern = string_arg(self, value)?;
        let obj = self.new_regexp(&pattern, "")?;
        let value = JsValue::Object(obj);
        self.this_regexp(&value, "match")
    }

    /// Every match of a global pattern from the start of `input`, stepping
    /// past empty matches. `lastIndex` is left at 0.
    fn all_matches(&mut self, obj: &JsObject, data: &RegExpData, input: &JsString) -> JsResult<Vec<RegexMatch>> {
        let mut found = Vec::new();
        let mut start = 0;
        while let Some(m) = self.regex_match(data, input, start) {
            start = if m.length == 0 { m.end() + 1 } else { m.end() };
            found.push(m);
        }
        self.put(obj, "lastIndex", JsValue::Number(0.0))?;
        Ok(found)
    }

    pub(crate) fn setup_regexp(&mut self) {
        let proto = self.regexp_prototype.clone();

        self.native_method(&proto, "exec", 1, |interp, this, args| {
            let (obj, data) = interp.this_regexp(this, "exec")?;
            let input = interp.exec_input(args)?;
            Ok(match interp.regexp_step(&obj, &data, &input)? {
                Some(m) => JsValue::Object(interp.match_array(&input, &m)),
                None => JsValue::Null,
            })
        });
        self.native_method(&proto, "test", 1, |interp, this, args| {
            let (obj, data) = interp.this_regexp(this, "test")?;
            let input = interp.exec_input(args)?;
            Ok(JsValue::Boolean(interp.regexp_step(&obj, &data, &input)?.is_some()))
        });
        self.native_method(&proto, "toString", 0, |interp, this, _args| {
            if let JsValue::Object(obj) = this
                && obj.ptr_eq(&interp.regexp_prototype)
            {
                return Ok(JsValue::from_str("//"));
            }
            let (_, data) = interp.this_regexp(this, "toString")?;
            Ok(JsValue::from_str(&format!("/{}/{}", data.source, data.flags)))
        });
        self.native_method(&proto, "compile", 2, |interp, this, args| {
            let (obj, _) = interp.this_regexp(this, "compile")?;
            let pattern = arg(args, 0);
            let flags = arg(args, 1);
            let data = match regexp_data(&pattern) {
                Some(_) if !flags.is_undefined() => {
                    return interp.throw_error(
                        ErrorKind::Type,
                        "Cannot supply flags when constructing one RegExp from another.",
                    );
                }
                Some((_, data)) => data,
                None => {
                    let pattern = string_arg(interp, &pattern)?;
                    let flags = string_arg(interp, &flags)?;
                    interp.compile_regexp(&pattern, &flags)?
                }
            };
            let mut target = obj.borrow_mut();
            install_instance_properties(&mut target, &data);
            target.slot = InternalSlot::RegExp(data);
            Ok(JsValue::Undefined)
        });

        let ctor = self.install_constructor(
            "RegExp",
            JsFunction::native_constructor("RegExp", 2, regexp_constructor, regexp_constructor),
            &proto,
        );
        let mut data = ctor.borrow_mut();
        data.slot = InternalSlot::RegExpStatics;
        for name in STATIC_NAMES {
            let attributes = match name {
                "input" | "$_" | "multiline" | "$*" => Attributes::PERMANENT,
                _ => Attributes::FROZEN,
            };
            data.insert_property(name.into(), JsValue::Undefined, attributes);
        }
        drop(data);

        self.setup_string_regexp_methods();
    }

    fn setup_string_regexp_methods(&mut self) {
        let proto = self.string_prototype.clone();

        self.native_method(&proto, "match", 1, |interp, this, args| {
            let input = this_to_string(interp, this)?;
            let (obj, data) = interp.coerce_regexp(&arg(args, 0))?;
            if !data.flags.contains(RegExpFlags::GLOBAL) {
                return Ok(match interp.regexp_step(&obj, &data, &input)? {
                    Some(m) => JsValue::Object(interp.match_array(&input, &m)),
                    None => JsValue::Null,
                });
            }
            let matches = interp.all_matches(&obj, &data, &input)?;
            if matches.is_empty() {
                return Ok(JsValue::Null);
            }
            let values = matches
                .iter()
                .map(|m| JsValue::String(input.slice_utf16(m.index, m.end())))
                .collect();
            Ok(JsValue::Object(interp.new_array(values)))
        });

        self.native_method(&proto, "search", 1, |interp, this, args| {
            let input = this_to_string(interp, this)?;
            let (_, data) = interp.coerce_regexp(&arg(args, 0))?;
            Ok(JsValue::Number(match interp.regex_match(&data, &input, 0) {
                Some(m) => m.index as f64,
                None => -1.0,
            }))
        });

        self.native_method(&proto, "replace", 2, |interp, this, args| {
            let input = this_to_string(interp, this)?;
            let search = arg(args, 0);
            let replacement = arg(args, 1);
            let matches = match regexp_data(&search) {
                Some((obj, data)) if data.flags.contains(RegExpFlags::GLOBAL) => {
                    interp.all_matches(&obj, &data, &input)?
                }
                Some((_, data)) => interp.regex_match(&data, &input, 0).into_iter().collect(),
                None => {
                    let needle = interp.to_js_string(&search)?;
                    input
                        .index_of(&needle, 0)
                        .map(|index| RegexMatch {
                            index,
                            length: needle.len(),
                            captures: Vec::new(),
                        })
                        .into_iter()
                        .collect()
                }
            };

            let template = match &replacement {
                JsValue::Object(obj) if obj.is_callable() => None,
                other => Some(interp.to_js_string(other)?),
            };
            let mut out = Vec::with_capacity(input.len());
            let mut copied = 0;
            for m in &matches {
                out.extend_from_slice(&input.code_units[copied..m.index]);
                match &template {
                    Some(template) => expand_template(template, &input, m, &mut out),
                    None => {
                        let mut call_args = vec![JsValue::String(input.slice_utf16(m.index, m.end()))];
                        call_args.extend(m.captures.iter().map(|capture| match capture {
                            Some((start, end)) => JsValue::String(input.slice_utf16(*start, *end)),
                            None => JsValue::Undefined,
                        }));
                        call_args.push(JsValue::Number(m.index as f64));
                        call_args.push(JsValue::String(input.clone()));
                        let result = interp.call(&replacement, JsValue::Undefined, &call_args)?;
                        out.extend_from_slice(&interp.to_js_string(&result)?.code_units);
                    }
                }
                copied = m.end();
            }
            out.extend_from_slice(&input.code_units[copied..]);
            Ok(JsValue::String(JsString::from_code_units(out)))
        });
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

    fn matcher(pattern: &str, flags: &str) -> Box<dyn CompiledPattern> {
        FancyRegexEngine
            .compile(pattern, RegExpFlags::parse(flags).unwrap())
            .unwrap()
    }

    #[test]
    fn flags_parse_and_print_in_canonical_order() {
        let flags = RegExpFlags::parse("mig").unwrap();
        assert_eq!(flags.to_string(), "gim");
        assert_eq!(RegExpFlags::parse("gg"), None);
        assert_eq!(RegExpFlags::parse("y"), None);
    }

    #[test]
    fn translation_of_es3_only_syntax() {
        assert_eq!(translate_pattern("a{", RegExpFlags::empty()), r"a\{");
        assert_eq!(translate_pattern("a{2,3}", RegExpFlags::empty()), "a{2,3}");
        assert_eq!(translate_pattern("[]", RegExpFlags::empty()), "(?!)");
        assert_eq!(translate_pattern("[^]", RegExpFlags::empty()), r"[\s\S]");
        assert_eq!(translate_pattern(r"\d", RegExpFlags::IGNORE_CASE), "(?i)[0-9]");
        assert_eq!(translate_pattern(r"\u0041\/", RegExpFlags::empty()), r"\x{41}\x{2F}");
    }

    #[test]
    fn offsets_are_utf16_positions() {
        let input = JsString::from_str("\u{1F600}é-x");
        let m = matcher("x", "").match_at(&input, 0).unwrap();
        assert_eq!((m.index, m.length), (4, 1));
        assert!(matcher("x", "").match_at(&input, 5).is_none());
    }

    #[test]
    fn unmatched_groups_have_no_offsets() {
        let m = matcher("(a)|(b)", "").match_at(&JsString::from_str("b"), 0).unwrap();
        assert_eq!(m.captures, vec![None, Some((0, 1))]);
    }

    #[test]
    fn dot_excludes_line_terminators() {
        let p = matcher("a.b", "");
        assert!(p.match_at(&JsString::from_str("a\nb"), 0).is_none());
        assert!(p.match_at(&JsString::from_str("a-b"), 0).is_some());
    }

    #[test]
    fn exec_builds_match_array() {
        let src = "var m = /(\\d+)-(x)?/.exec('ab12-c'); m.index + ':' + m[0] + ':' + m[1] + ':' + typeof m[2] + ':' + m.input";
        assert_eq!(eval_str(src), "2:12-:12:undefined:ab12-c");
    }

    #[test]
    fn global_exec_walks_last_index() {
        let src = "
            var re = /o/g, s = 'foo', seen = '';
            while (re.exec(s)) { seen += re.lastIndex + ','; }
            seen + re.lastIndex";
        assert_eq!(eval_str(src), "2,3,0");
    }

    #[test]
    fn out_of_range_last_index_resets() {
        let src = "var re = /a/g; re.lastIndex = 10; var r = re.test('aaa'); r + ':' + re.lastIndex";
        assert_eq!(eval_str(src), "false:0");
    }

    #[test]
    fn non_global_ignores_last_index() {
        let src = "var re = /a/; re.lastIndex = 2; re.exec('abca').index + ':' + re.lastIndex";
        assert_eq!(eval_str(src), "0:2");
    }

    #[test]
    fn statics_follow_last_successful_match() {
        let src = "
            /(b)(c)/.exec('abcd');
            /zzz/.exec('no match here');
            RegExp.$1 + RegExp.$2 + '|' + RegExp.lastMatch + '|' + RegExp.leftContext + '|' + RegExp.rightContext + '|' + RegExp.lastParen + '|' + RegExp.$3 + '|'";
        assert_eq!(eval_str(src), "bc|bc|a|d|c||");
    }

    #[test]
    fn statics_are_permanent() {
        assert_eq!(eval_str("(delete RegExp.$1) + ':' + (delete RegExp.input)"), "false:false");
        assert_eq!(eval_str("RegExp.input = 'typed'; RegExp['$_']"), "typed");
        assert_eq!(eval_str("RegExp.lastMatch = 'x'; 'q' + RegExp.lastMatch"), "q");
    }

    #[test]
    fn constructor_identity_and_flag_errors() {
        assert!(matches!(eval("var r = /a/; RegExp(r) === r"), JsValue::Boolean(true)));
        let mut interp = Interpreter::new(EngineConfig::default());
        let err = interp.eval_source("new RegExp(/a/, 'g')").unwrap_err();
        assert!(err.to_string().contains("TypeError: Cannot supply flags"));
        let err = interp.eval_source("new RegExp('(')").unwrap_err();
        assert!(err.to_string().contains("SyntaxError: Invalid regular expression: "));
    }

    #[test]
    fn to_string_and_instance_properties() {
        assert_eq!(eval_str("new RegExp('a/b', 'mgi').toString()"), "/a/b/gim");
        assert_eq!(
            eval_str("var r = /x/g; r.global = false; r.source = 'y'; r.global + r.source"),
            "truex"
        );
    }

    #[test]
    fn compile_replaces_pattern_and_resets_last_index() {
        let src = "var r = /a/g; r.test('aa'); r.compile('b', 'i'); r.lastIndex + ':' + r.test('B') + ':' + r.global";
        assert_eq!(eval_str(src), "0:true:false");
    }

    #[test]
    fn string_match_global_and_single() {
        assert_eq!(eval_str("'a1b22c333'.match(/\\d+/g).join(',')"), "1,22,333");
        assert_eq!(eval_str("'xyz'.match('y').index + ''"), "1");
        assert!(matches!(eval("'abc'.match(/q/g)"), JsValue::Null));
    }

    #[test]
    fn string_replace_templates() {
        assert_eq!(eval_str("'john smith'.replace(/(\\w+) (\\w+)/, '$2, $1')"), "smith, john");
        assert_eq!(eval_str("'aaa'.replace(/a/g, '[$&]')"), "[a][a][a]");
        assert_eq!(eval_str("'abc'.replace('b', '$`$\\'$$')"), "aac$c");
        assert_eq!(eval_str("'ab'.replace(/(a)/, '$9$1')"), "$9ab");
    }

    #[test]
    fn string_replace_with_function() {
        let src = "'a1b2'.replace(/(\\d)/g, function (m, d, at) { return '<' + d * 2 + '@' + at + '>'; })";
        assert_eq!(eval_str(src), "a<2@1>b<4@3>");
    }

    #[test]
    fn empty_global_matches_advance() {
        assert_eq!(eval_str("'abc'.replace(/x*/g, '-')"), "-a-b-c-");
    }

    #[test]
    fn search_reports_index_and_updates_statics() {
        assert_eq!(eval_str("'hello'.search(/l+/) + ':' + RegExp.lastMatch"), "2:ll");
        assert_eq!(eval_str("'hello'.search('q') + ''"), "-1");
    }
}

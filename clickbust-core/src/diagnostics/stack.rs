//! Call-chain rendering.
//!
//! Frames are recorded explicitly in a [`CallChain`] at the point of failure
//! rather than discovered by walking the runtime stack. [`StackSerializer`]
//! renders a chain one line per frame:
//!
//! ```text
//! onClick(object, 12, 40)
//! dispatch(click, [fn])
//! [end]
//! ```
//!
//! The walk stops after [`MAX_STACK_DEPTH`] frames, at the first function seen
//! twice, or at the end of the chain. A frame whose caller cannot be read is
//! rendered as a marker instead of failing the whole walk.

use std::collections::HashMap;

use super::error::StackAccessError;

/// Frames rendered before the walk gives up.
pub const MAX_STACK_DEPTH: usize = 50;

/// Rendered arguments longer than this are truncated.
pub const MAX_ARG_CHARS: usize = 40;

/// Emitted when the frame limit is reached.
pub const LONG_STACK_MARKER: &str = "[...long stack...]";
/// Emitted when a function appears twice in the chain.
pub const CIRCULAR_MARKER: &str = "[...circular reference...]";
/// Emitted when the chain ends normally.
pub const END_MARKER: &str = "[end]";
/// Emitted when a frame's caller cannot be read.
pub const INACCESSIBLE_MARKER: &str = "[exception trying to get caller]";

const ANONYMOUS: &str = "[Anonymous]";
const ANONYMOUS_ARG: &str = "[fn]";

/// Identity of a function recorded in a [`CallChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(usize);

/// Index of a frame in a [`CallChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(usize);

/// An argument value as seen by the frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// A non-null object.
    Object,
    /// The null reference.
    Null,
    /// The missing value.
    Undefined,
    /// A string.
    Str(String),
    /// A number.
    Number(f64),
    /// A boolean.
    Bool(bool),
    /// A function recorded in the same chain.
    Function(FunctionId),
}

/// Link from a frame to whoever called it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    /// Called from another recorded frame.
    Frame(FrameId),
    /// Outermost frame.
    End,
    /// The environment does not allow reading the caller.
    Restricted,
}

#[derive(Debug, Clone)]
struct FunctionDef {
    source: String,
}

#[derive(Debug, Clone)]
struct Frame {
    function: FunctionId,
    arguments: Vec<ArgValue>,
    caller: Caller,
}

/// Recorded functions and frames.
#[derive(Debug, Clone, Default)]
pub struct CallChain {
    functions: Vec<FunctionDef>,
    frames: Vec<Frame>,
}

impl CallChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a function by its textual form, e.g. `function onClick(e) {..}`.
    pub fn define_function(&mut self, source: impl Into<String>) -> FunctionId {
        self.functions.push(FunctionDef {
            source: source.into(),
        });
        FunctionId(self.functions.len() - 1)
    }

    /// Record a frame of `function`. Frames start with [`Caller::End`].
    pub fn push_frame(&mut self, function: FunctionId, arguments: Vec<ArgValue>) -> FrameId {
        self.frames.push(Frame {
            function,
            arguments,
            caller: Caller::End,
        });
        FrameId(self.frames.len() - 1)
    }

    /// Link a frame to its caller.
    pub fn set_caller(&mut self, frame: FrameId, caller: Caller) {
        if let Some(entry) = self.frames.get_mut(frame.0) {
            entry.caller = caller;
        }
    }

    /// Record a frame and make it the caller of `callee`.
    pub fn push_caller(
        &mut self,
        callee: FrameId,
        function: FunctionId,
        arguments: Vec<ArgValue>,
    ) -> FrameId {
        let frame = self.push_frame(function, arguments);
        self.set_caller(callee, Caller::Frame(frame));
        frame
    }

    /// Number of recorded frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frames are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Read the caller of a frame.
    ///
    /// # Errors
    ///
    /// Returns [`StackAccessError`] when the caller is restricted.
    pub fn caller_of(&self, frame: FrameId) -> Result<Option<FrameId>, StackAccessError> {
        match self.frames.get(frame.0).map(|f| f.caller) {
            Some(Caller::Frame(next)) => Ok(Some(next)),
            Some(Caller::End) | None => Ok(None),
            Some(Caller::Restricted) => Err(StackAccessError { frame: frame.0 }),
        }
    }

    fn source(&self, function: FunctionId) -> Option<&str> {
        self.functions.get(function.0).map(|f| f.source.as_str())
    }
}

/// Renders call chains, caching function names.
#[derive(Debug, Clone, Default)]
pub struct StackSerializer {
    names: HashMap<FunctionId, Option<String>>,
}

impl StackSerializer {
    /// Create a serializer with an empty name cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Give a function an explicit name, overriding its textual form.
    pub fn register_name(&mut self, function: FunctionId, name: impl Into<String>) {
        self.names.insert(function, Some(name.into()));
    }

    /// Render the chain starting at `start`.
    pub fn serialize(&mut self, chain: &CallChain, start: FrameId) -> String {
        let mut visited = Vec::new();
        self.serialize_with(chain, Some(start), &mut visited)
    }

    /// Render the chain starting at `start`, sharing a visited set with the
    /// caller.
    ///
    /// Functions already in `visited` are treated as a cycle. Every rendered
    /// function is added to it.
    pub fn serialize_with(
        &mut self,
        chain: &CallChain,
        start: Option<FrameId>,
        visited: &mut Vec<FunctionId>,
    ) -> String {
        let mut out = String::new();
        let mut current = start;
        loop {
            let Some(frame_id) = current else {
                out.push_str(END_MARKER);
                out.push('\n');
                break;
            };
            let Some(frame) = chain.frames.get(frame_id.0) else {
                out.push_str(END_MARKER);
                out.push('\n');
                break;
            };
            if visited.contains(&frame.function) {
                out.push_str(CIRCULAR_MARKER);
                out.push('\n');
                break;
            }
            if visited.len() >= MAX_STACK_DEPTH {
                out.push_str(LONG_STACK_MARKER);
                out.push('\n');
                break;
            }

            let name = self
                .function_name(chain, frame.function)
                .unwrap_or_else(|| ANONYMOUS.to_string());
            let args: Vec<String> = frame
                .arguments
                .iter()
                .map(|arg| truncate(&self.describe_arg(chain, arg)))
                .collect();
            out.push_str(&name);
            out.push('(');
            out.push_str(&args.join(", "));
            out.push_str(")\n");
            visited.push(frame.function);

            current = match chain.caller_of(frame_id) {
                Ok(next) => next,
                Err(err) => {
                    tracing::trace!(frame = err.frame, "caller not accessible");
                    out.push_str(INACCESSIBLE_MARKER);
                    out.push('\n');
                    break;
                }
            };
        }
        out
    }

    /// Name of a function: registered name, else parsed from its source.
    pub fn function_name(&mut self, chain: &CallChain, function: FunctionId) -> Option<String> {
        self.names
            .entry(function)
            .or_insert_with(|| chain.source(function).and_then(parse_function_name))
            .clone()
    }

    fn describe_arg(&mut self, chain: &CallChain, arg: &ArgValue) -> String {
        match arg {
            ArgValue::Object => "object".to_string(),
            ArgValue::Null => "null".to_string(),
            ArgValue::Undefined => "undefined".to_string(),
            ArgValue::Str(s) => s.clone(),
            ArgValue::Number(n) => format_number(*n),
            ArgValue::Bool(b) => b.to_string(),
            ArgValue::Function(f) => self
                .function_name(chain, *f)
                .unwrap_or_else(|| ANONYMOUS_ARG.to_string()),
        }
    }
}

/// Parse `NAME` out of `function NAME(...)`.
#[must_use]
pub fn parse_function_name(source: &str) -> Option<String> {
    let start = source.find("function ")? + "function ".len();
    let rest = &source[start..];
    let end = rest.find('(').unwrap_or(rest.len());
    let name = rest[..end].trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_ARG_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)] // Integral values only
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(rendered: &str) -> Vec<&str> {
        rendered.lines().collect()
    }

    #[test]
    fn renders_frames_and_end_marker() {
        let mut chain = CallChain::new();
        let handler = chain.define_function("function onClick(e) { bust(e); }");
        let dispatch = chain.define_function("function dispatch(type, fn) {}");
        let top = chain.push_frame(
            handler,
            vec![ArgValue::Object, ArgValue::Number(12.0), ArgValue::Number(2.5)],
        );
        chain.push_caller(
            top,
            dispatch,
            vec![ArgValue::Str("click".into()), ArgValue::Function(handler)],
        );

        let rendered = StackSerializer::new().serialize(&chain, top);
        assert_eq!(
            lines(&rendered),
            vec!["onClick(object, 12, 2.5)", "dispatch(click, onClick)", "[end]"]
        );
    }

    #[test]
    fn argument_kinds_render_by_kind() {
        let mut chain = CallChain::new();
        let anon = chain.define_function("function (x) {}");
        let f = chain.define_function("function f() {}");
        let top = chain.push_frame(
            f,
            vec![
                ArgValue::Null,
                ArgValue::Undefined,
                ArgValue::Bool(true),
                ArgValue::Bool(false),
                ArgValue::Function(anon),
                ArgValue::Number(f64::NAN),
                ArgValue::Number(f64::NEG_INFINITY),
            ],
        );
        let rendered = StackSerializer::new().serialize(&chain, top);
        assert_eq!(
            lines(&rendered)[0],
            "f(null, undefined, true, false, [fn], NaN, -Infinity)"
        );
    }

    #[test]
    fn long_strings_are_truncated() {
        let mut chain = CallChain::new();
        let f = chain.define_function("function log(msg) {}");
        let long = "a".repeat(45);
        let exact = "b".repeat(40);
        let top = chain.push_frame(f, vec![ArgValue::Str(long), ArgValue::Str(exact.clone())]);
        let rendered = StackSerializer::new().serialize(&chain, top);
        assert_eq!(
            lines(&rendered)[0],
            format!("log({}..., {exact})", "a".repeat(40))
        );
    }

    #[test]
    fn anonymous_frames_are_labelled() {
        let mut chain = CallChain::new();
        let f = chain.define_function("function(){}");
        let top = chain.push_frame(f, vec![]);
        assert_eq!(
            StackSerializer::new().serialize(&chain, top),
            "[Anonymous]()\n[end]\n"
        );
    }

    #[test]
    fn registered_names_win_over_source() {
        let mut chain = CallChain::new();
        let f = chain.define_function("function (){}");
        let top = chain.push_frame(f, vec![]);
        let mut serializer = StackSerializer::new();
        serializer.register_name(f, "Buster.onClick");
        assert!(serializer
            .serialize(&chain, top)
            .starts_with("Buster.onClick()\n"));
    }

    #[test]
    fn circular_chain_stops_with_one_marker() {
        let mut chain = CallChain::new();
        let a = chain.define_function("function a() {}");
        let b = chain.define_function("function b() {}");
        let fa = chain.push_frame(a, vec![]);
        let fb = chain.push_caller(fa, b, vec![]);
        chain.set_caller(fb, Caller::Frame(fa));

        let rendered = StackSerializer::new().serialize(&chain, fa);
        assert_eq!(lines(&rendered), vec!["a()", "b()", CIRCULAR_MARKER]);
        assert_eq!(rendered.matches(CIRCULAR_MARKER).count(), 1);
    }

    #[test]
    fn recursion_is_reported_as_circular() {
        let mut chain = CallChain::new();
        let fact = chain.define_function("function fact(n) {}");
        let inner = chain.push_frame(fact, vec![ArgValue::Number(1.0)]);
        chain.push_caller(inner, fact, vec![ArgValue::Number(2.0)]);
        let rendered = StackSerializer::new().serialize(&chain, inner);
        assert_eq!(lines(&rendered), vec!["fact(1)", CIRCULAR_MARKER]);
    }

    #[test]
    fn deep_chains_stop_at_depth_limit() {
        let mut chain = CallChain::new();
        let first = chain.define_function("function f0() {}");
        let top = chain.push_frame(first, vec![]);
        let mut callee = top;
        for i in 1..80 {
            let f = chain.define_function(format!("function f{i}() {{}}"));
            callee = chain.push_caller(callee, f, vec![]);
        }
        let rendered = StackSerializer::new().serialize(&chain, top);
        let rendered_lines = lines(&rendered);
        assert_eq!(rendered_lines.len(), MAX_STACK_DEPTH + 1);
        assert_eq!(rendered_lines[MAX_STACK_DEPTH - 1], "f49()");
        assert_eq!(rendered_lines[MAX_STACK_DEPTH], LONG_STACK_MARKER);
    }

    #[test]
    fn restricted_caller_becomes_marker() {
        let mut chain = CallChain::new();
        let f = chain.define_function("function strict() {}");
        let top = chain.push_frame(f, vec![]);
        chain.set_caller(top, Caller::Restricted);
        assert!(chain.caller_of(top).is_err());
        assert_eq!(
            StackSerializer::new().serialize(&chain, top),
            format!("strict()\n{INACCESSIBLE_MARKER}\n")
        );
    }

    #[test]
    fn shared_visited_set_detects_cross_walk_cycles() {
        let mut chain = CallChain::new();
        let f = chain.define_function("function seen() {}");
        let top = chain.push_frame(f, vec![]);
        let mut visited = vec![f];
        let rendered = StackSerializer::new().serialize_with(&chain, Some(top), &mut visited);
        assert_eq!(rendered, format!("{CIRCULAR_MARKER}\n"));
    }

    #[test]
    fn parse_function_name_variants() {
        assert_eq!(parse_function_name("function go(a) {}"), Some("go".to_string()));
        assert_eq!(parse_function_name("function go (a) {}"), Some("go".to_string()));
        assert_eq!(parse_function_name("function (a) {}"), None);
        assert_eq!(parse_function_name("() => 1"), None);
    }

    #[test]
    fn names_are_cached_per_function() {
        let mut chain = CallChain::new();
        let f = chain.define_function("function cached() {}");
        let mut serializer = StackSerializer::new();
        assert_eq!(serializer.function_name(&chain, f).as_deref(), Some("cached"));
        chain.functions[f.0].source = "function renamed() {}".to_string();
        assert_eq!(serializer.function_name(&chain, f).as_deref(), Some("cached"));
    }
}

//! Builtin functions and builtin modules.
//!
//! A builtin receives already-evaluated arguments and validates its own
//! count and types. The evaluator only supplies the call context, which for
//! now carries the collected output sink.

use rustc_hash::FxHashMap;

use crate::runtime::{Primitive, RuntimeError};

pub struct CallContext<'a> {
    pub output: &'a mut Vec<String>,
}

type Handler = fn(&mut CallContext, &[Primitive]) -> Result<Option<Primitive>, RuntimeError>;

pub struct Builtin {
    pub name: &'static str,
    pub params: &'static [&'static str],
    pub variadic: bool,
    pub handler: Handler,
}

static GLOBALS: &[Builtin] = &[
    Builtin {
        name: "print",
        params: &[],
        variadic: true,
        handler: print,
    },
    Builtin {
        name: "len",
        params: &["value"],
        variadic: false,
        handler: len,
    },
    Builtin {
        name: "str",
        params: &["value"],
        variadic: false,
        handler: stringify,
    },
    Builtin {
        name: "type",
        params: &["value"],
        variadic: false,
        handler: type_name,
    },
];

static MATH: &[Builtin] = &[
    Builtin {
        name: "abs",
        params: &["value"],
        variadic: false,
        handler: abs,
    },
    Builtin {
        name: "min",
        params: &["a", "b"],
        variadic: true,
        handler: min,
    },
    Builtin {
        name: "max",
        params: &["a", "b"],
        variadic: true,
        handler: max,
    },
];

/// The unqualified builtins every module sees.
pub fn globals() -> FxHashMap<String, &'static Builtin> {
    registry(GLOBALS)
}

/// The function table of a builtin module, if `name` is one.
pub fn module(name: &str) -> Option<FxHashMap<String, &'static Builtin>> {
    match name {
        "math" => Some(registry(MATH)),
        _ => None,
    }
}

fn registry(builtins: &'static [Builtin]) -> FxHashMap<String, &'static Builtin> {
    builtins
        .iter()
        .map(|builtin| (builtin.name.to_string(), builtin))
        .collect()
}

fn expect_exact(
    name: &'static str,
    expected: usize,
    args: &[Primitive],
) -> Result<(), RuntimeError> {
    if args.len() != expected {
        return Err(RuntimeError::FunctionArity {
            name,
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn expect_at_least(
    name: &'static str,
    expected: usize,
    args: &[Primitive],
) -> Result<(), RuntimeError> {
    if args.len() < expected {
        return Err(RuntimeError::FunctionArity {
            name,
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn print(context: &mut CallContext, args: &[Primitive]) -> Result<Option<Primitive>, RuntimeError> {
    let line = args
        .iter()
        .map(Primitive::to_output)
        .collect::<Vec<_>>()
        .join(" ");
    context.output.push(line);
    Ok(None)
}

fn len(_context: &mut CallContext, args: &[Primitive]) -> Result<Option<Primitive>, RuntimeError> {
    expect_exact("len", 1, args)?;
    Ok(Some(Primitive::Integer(args[0].len()? as i64)))
}

fn stringify(
    _context: &mut CallContext,
    args: &[Primitive],
) -> Result<Option<Primitive>, RuntimeError> {
    expect_exact("str", 1, args)?;
    Ok(Some(Primitive::string(args[0].to_output())))
}

fn type_name(
    _context: &mut CallContext,
    args: &[Primitive],
) -> Result<Option<Primitive>, RuntimeError> {
    expect_exact("type", 1, args)?;
    Ok(Some(Primitive::string(args[0].type_name())))
}

fn abs(_context: &mut CallContext, args: &[Primitive]) -> Result<Option<Primitive>, RuntimeError> {
    expect_exact("abs", 1, args)?;
    let value = match &args[0] {
        Primitive::Integer(value) => Primitive::Integer(
            value
                .checked_abs()
                .ok_or(RuntimeError::IntegerOverflow { operation: "abs" })?,
        ),
        Primitive::Double(value) => Primitive::Double(value.abs()),
        other => {
            return Err(RuntimeError::InvalidArgument {
                name: "abs",
                message: format!("expected a number, got '{}'", other.type_name()),
            });
        }
    };
    Ok(Some(value))
}

fn min(_context: &mut CallContext, args: &[Primitive]) -> Result<Option<Primitive>, RuntimeError> {
    expect_at_least("min", 2, args)?;
    pick(args, std::cmp::Ordering::Less)
}

fn max(_context: &mut CallContext, args: &[Primitive]) -> Result<Option<Primitive>, RuntimeError> {
    expect_at_least("max", 2, args)?;
    pick(args, std::cmp::Ordering::Greater)
}

fn pick(
    args: &[Primitive],
    wanted: std::cmp::Ordering,
) -> Result<Option<Primitive>, RuntimeError> {
    let mut best = args[0].clone();
    for candidate in &args[1..] {
        if candidate.compare(&best)? == wanted {
            best = candidate.clone();
        }
    }
    Ok(Some(best))
}

//! The XPath 1.0 core function library.

use crate::ast::Expr;
use crate::error::{Result, XPathError};
use crate::eval::{Context, Evaluator};
use crate::value::{Value, string_to_number, string_value};
use tei_xml::{NodeKind, NodeRef, XML_NAMESPACE};

fn arity(name: &str, found: usize, min: usize, max: Option<usize>, expected: &'static str) -> Result<()> {
    if found < min || max.is_some_and(|max| found > max) {
        return Err(XPathError::ArgumentCount {
            name: name.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

/// XPath `round()`: halves go towards positive infinity, `-0.5..0` rounds to `-0`.
pub fn xpath_round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        n
    } else if (-0.5..0.0).contains(&n) {
        -0.0
    } else {
        (n + 0.5).floor()
    }
}

/// XPath `substring()` over characters, with its rounding rules.
fn substring(s: &str, start: f64, length: Option<f64>) -> String {
    let start = xpath_round(start);
    let end = length.map(|len| start + xpath_round(len));
    s.chars()
        .enumerate()
        .filter(|&(i, _)| {
            let p = (i + 1) as f64;
            p >= start && end.is_none_or(|end| p < end)
        })
        .map(|(_, c)| c)
        .collect()
}

fn translate(s: &str, from: &str, to: &str) -> String {
    let from: Vec<char> = from.chars().collect();
    let to: Vec<char> = to.chars().collect();
    s.chars()
        .filter_map(|c| match from.iter().position(|&f| f == c) {
            Some(i) => to.get(i).copied(),
            None => Some(c),
        })
        .collect()
}

pub(crate) fn call(ev: &Evaluator<'_>, name: &str, args: &[Expr], ctx: &Context) -> Result<Value> {
    let doc = ev.doc;
    let n = args.len();
    let eval = |i: usize| ev.eval(&args[i], ctx);
    let string_arg = |i: usize| -> Result<String> { Ok(eval(i)?.to_string_value(doc)) };
    let number_arg = |i: usize| -> Result<f64> { Ok(eval(i)?.to_number(doc)) };
    // Optional node-set argument, defaulting to the context node
    let first_node = |fname: &str| -> Result<Option<NodeRef>> {
        arity(fname, n, 0, Some(1), "0 or 1")?;
        if n == 0 {
            return Ok(Some(ctx.node));
        }
        Ok(eval(0)?.into_node_set()?.first().copied())
    };
    // Optional string argument, defaulting to the context node's string-value
    let string_or_context = |fname: &str| -> Result<String> {
        arity(fname, n, 0, Some(1), "0 or 1")?;
        if n == 0 {
            Ok(string_value(doc, ctx.node))
        } else {
            string_arg(0)
        }
    };

    let value = match name {
        "last" => {
            arity(name, n, 0, Some(0), "0")?;
            Value::Number(ctx.size as f64)
        }
        "position" => {
            arity(name, n, 0, Some(0), "0")?;
            Value::Number(ctx.position as f64)
        }
        "count" => {
            arity(name, n, 1, Some(1), "1")?;
            Value::Number(eval(0)?.into_node_set()?.len() as f64)
        }
        "name" | "local-name" | "namespace-uri" => {
            let node = first_node(name)?;
            let text = node.map(|node| {
                let qname = match node {
                    NodeRef::Attribute { owner, index } => doc.attributes(owner).get(index).map(|a| &a.name),
                    NodeRef::Node(id) => doc.name(id),
                };
                match (name, qname, node) {
                    ("name", Some(q), _) => q.qualified().into_owned(),
                    ("local-name", Some(q), _) => q.local.clone(),
                    ("namespace-uri", Some(q), _) => q.namespace.clone().unwrap_or_default(),
                    ("name" | "local-name", None, NodeRef::Node(id)) => match doc.kind(id) {
                        NodeKind::ProcessingInstruction { target, .. } => target.clone(),
                        _ => String::new(),
                    },
                    _ => String::new(),
                }
            });
            Value::String(text.unwrap_or_default())
        }
        "string" => Value::String(string_or_context(name)?),
        "concat" => {
            arity(name, n, 2, None, "at least 2")?;
            let mut out = String::new();
            for i in 0..n {
                out.push_str(&string_arg(i)?);
            }
            Value::String(out)
        }
        "starts-with" | "contains" | "substring-before" | "substring-after" => {
            arity(name, n, 2, Some(2), "2")?;
            let s = string_arg(0)?;
            let pattern = string_arg(1)?;
            match name {
                "starts-with" => Value::Boolean(s.starts_with(&pattern)),
                "contains" => Value::Boolean(s.contains(&pattern)),
                "substring-before" => Value::String(
                    s.split_once(pattern.as_str())
                        .map(|(before, _)| before.to_string())
                        .unwrap_or_default(),
                ),
                _ => Value::String(
                    s.split_once(pattern.as_str())
                        .map(|(_, after)| after.to_string())
                        .unwrap_or_default(),
                ),
            }
        }
        "substring" => {
            arity(name, n, 2, Some(3), "2 or 3")?;
            let s = string_arg(0)?;
            let start = number_arg(1)?;
            let length = if n == 3 { Some(number_arg(2)?) } else { None };
            Value::String(substring(&s, start, length))
        }
        "string-length" => Value::Number(string_or_context(name)?.chars().count() as f64),
        "normalize-space" => Value::String(
            string_or_context(name)?
                .split_ascii_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
        ),
        "translate" => {
            arity(name, n, 3, Some(3), "3")?;
            Value::String(translate(&string_arg(0)?, &string_arg(1)?, &string_arg(2)?))
        }
        "boolean" => {
            arity(name, n, 1, Some(1), "1")?;
            Value::Boolean(eval(0)?.to_boolean())
        }
        "not" => {
            arity(name, n, 1, Some(1), "1")?;
            Value::Boolean(!eval(0)?.to_boolean())
        }
        "true" | "false" => {
            arity(name, n, 0, Some(0), "0")?;
            Value::Boolean(name == "true")
        }
        "lang" => {
            arity(name, n, 1, Some(1), "1")?;
            let wanted = string_arg(0)?.to_ascii_lowercase();
            let start = ctx.node.node();
            let declared = std::iter::once(start)
                .chain(doc.ancestors(start))
                .find_map(|id| {
                    doc.attributes(id).iter().find(|a| {
                        a.name.local == "lang" && a.name.namespace.as_deref() == Some(XML_NAMESPACE)
                    })
                })
                .map(|a| a.value.to_ascii_lowercase());
            Value::Boolean(declared.is_some_and(|lang| {
                lang == wanted
                    || lang
                        .strip_prefix(wanted.as_str())
                        .is_some_and(|rest| rest.starts_with('-'))
            }))
        }
        "number" => {
            arity(name, n, 0, Some(1), "0 or 1")?;
            if n == 0 {
                Value::Number(string_to_number(&string_value(doc, ctx.node)))
            } else {
                Value::Number(number_arg(0)?)
            }
        }
        "sum" => {
            arity(name, n, 1, Some(1), "1")?;
            let nodes = eval(0)?.into_node_set()?;
            Value::Number(
                nodes
                    .iter()
                    .map(|&node| string_to_number(&string_value(doc, node)))
                    .sum(),
            )
        }
        "floor" | "ceiling" | "round" => {
            arity(name, n, 1, Some(1), "1")?;
            let x = number_arg(0)?;
            Value::Number(match name {
                "floor" => x.floor(),
                "ceiling" => x.ceil(),
                _ => xpath_round(x),
            })
        }
        _ => return Err(XPathError::UnknownFunction(name.to_string())),
    };
    Ok(value)
}

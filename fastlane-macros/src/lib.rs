//! Procedural macros for the `fastlane` runtime.
//!
//! - `#[fastlane::main]` turns an `async fn main` into a synchronous one
//!   that drives its body on a fresh runtime.
//! - `#[fastlane::test]` does the same for `async` test functions.
//! - `fastlane::join!` polls several futures concurrently inside the
//!   current task and returns their outputs as a tuple.

mod utils;

use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Waits on several futures at once, returning their outputs in argument
/// order.
///
/// Every future is polled on each wake-up until it completes, all from the
/// calling task.
#[proc_macro]
pub fn join(input: TokenStream) -> TokenStream {
    let args = utils::split_args(input);

    let source = match args.len() {
        0 => "()".to_string(),
        1 => format!("{{ ({}).await }}", utils::tokens_to_string(&args[0])),
        _ => join_source(&args),
    };

    parse_or_error("join", &source)
}

fn join_source(args: &[Vec<TokenTree>]) -> String {
    let count = args.len();
    let mut out = String::from("{\n    use ::std::future::Future as _;\n    use ::std::task::Poll;\n");

    for (i, expr) in args.iter().enumerate() {
        out.push_str(&format!(
            "    let mut __join{i} = ::std::boxed::Box::pin({});\n    let mut __out{i} = ::std::option::Option::None;\n",
            utils::tokens_to_string(expr)
        ));
    }

    out.push_str("    ::std::future::poll_fn(move |cx| {\n");

    for i in 0..count {
        out.push_str(&format!(
            "        if __out{i}.is_none() {{\n\
                         if let Poll::Ready(value) = __join{i}.as_mut().poll(cx) {{\n\
                             __out{i} = ::std::option::Option::Some(value);\n\
                         }}\n\
                     }}\n"
        ));
    }

    let pending = (0..count)
        .map(|i| format!("__out{i}.is_none()"))
        .collect::<Vec<_>>()
        .join(" || ");

    let outputs = (0..count)
        .map(|i| format!("__out{i}.take().unwrap()"))
        .collect::<Vec<_>>()
        .join(", ");

    out.push_str(&format!(
        "        if {pending} {{\n            return Poll::Pending;\n        }}\n        Poll::Ready(({outputs},))\n    }}).await\n}}\n"
    ));

    out
}

/// Runs an `async fn main` on a fresh runtime.
///
/// Accepts `task_capacity = N` and `event_interval = N` to tune the
/// runtime.
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let builder = match utils::builder_source(attr) {
        Ok(builder) => builder,
        Err(err) => return compile_error(&err),
    };

    wrap_async_fn(item, &builder, false)
}

/// Runs an `async` test function on a fresh runtime.
///
/// Accepts the same arguments as `#[fastlane::main]`.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let builder = match utils::builder_source(attr) {
        Ok(builder) => builder,
        Err(err) => return compile_error(&err),
    };

    wrap_async_fn(item, &builder, true)
}

/// Drops the `async` keyword from `item` and replaces its body with a
/// `block_on` call on a runtime built by `builder`.
fn wrap_async_fn(item: TokenStream, builder: &str, is_test: bool) -> TokenStream {
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    let Some(body_pos) = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
    else {
        return compile_error("expected a function body");
    };

    let Some(async_pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    else {
        return compile_error("the function must be `async`");
    };

    let TokenTree::Group(body) = &tokens[body_pos] else {
        return compile_error("expected a function body");
    };

    let source = format!(
        "{{\n    let runtime = {builder};\n    runtime.block_on(async move {{ {} }})\n}}",
        body.stream()
    );

    let Ok(stream) = source.parse::<TokenStream>() else {
        return compile_error("failed to expand the function body");
    };

    tokens[body_pos] = TokenTree::Group(Group::new(Delimiter::Brace, stream));
    tokens.remove(async_pos);

    let mut result = TokenStream::new();

    if is_test {
        if let Ok(attr) = "#[::core::prelude::v1::test]".parse::<TokenStream>() {
            result.extend(attr);
        }
    }

    result.extend(tokens);
    result
}

fn parse_or_error(name: &str, source: &str) -> TokenStream {
    match source.parse::<TokenStream>() {
        Ok(stream) => stream,
        Err(err) => compile_error(&format!("{name} macro error: {err}")),
    }
}

fn compile_error(message: &str) -> TokenStream {
    format!("::core::compile_error!({message:?});")
        .parse()
        .unwrap_or_default()
}

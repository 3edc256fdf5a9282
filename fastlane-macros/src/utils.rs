use proc_macro::{TokenStream, TokenTree};

/// Splits a `TokenStream` into comma-separated arguments.
///
/// Only top-level commas separate arguments; commas nested inside groups
/// belong to their group. A trailing comma is ignored.
pub(crate) fn split_args(input: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut args = Vec::new();
    let mut current = Vec::new();

    for token in input {
        match &token {
            TokenTree::Punct(p) if p.as_char() == ',' => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(token),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// Converts a slice of tokens back into Rust source.
pub(crate) fn tokens_to_string(tokens: &[TokenTree]) -> String {
    tokens.iter().cloned().collect::<TokenStream>().to_string()
}

/// Builds the `RuntimeBuilder` expression for the attribute arguments
/// `task_capacity = N` and `event_interval = N`.
pub(crate) fn builder_source(attr: TokenStream) -> Result<String, String> {
    let mut builder = String::from("::fastlane::RuntimeBuilder::new()");

    for arg in split_args(attr) {
        let text = tokens_to_string(&arg);

        let Some((key, value)) = text.split_once('=') else {
            return Err(format!("expected `key = value`, found `{text}`"));
        };

        let key = key.trim();
        let value = value.trim();

        let Ok(n) = value.parse::<usize>() else {
            return Err(format!("`{key}` expects a positive integer, found `{value}`"));
        };

        if n == 0 {
            return Err(format!("`{key}` must be greater than zero"));
        }

        match key {
            "task_capacity" | "event_interval" => builder.push_str(&format!(".{key}({n})")),
            _ => {
                return Err(format!(
                    "unknown argument `{key}`, expected `task_capacity` or `event_interval`"
                ));
            }
        }
    }

    builder.push_str(".build()");
    Ok(builder)
}

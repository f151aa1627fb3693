//! Reduction of full function signatures to qualified function names, used by
//! the `%c` template marker.

/// Operator names ending in characters that would otherwise be read as
/// argument-list or template delimiters. Longest suffixes first.
const OPERATOR_SUFFIXES: [&str; 11] = [
    "<<=", ">>=", "<=>", "()", "<=", ">=", "<<", ">>", "->", "<", ">",
];

/// Strips return type, argument list and template arguments from a function
/// signature, keeping the namespace/class qualified name:
/// `void Foo::bar(int, int) const` becomes `Foo::bar`.
///
/// Best effort: the input is returned unchanged when it has no argument list
/// or when its brackets do not balance.
pub fn strip_function_name(signature: &str) -> String {
    cleanup(signature).unwrap_or_else(|| signature.to_string())
}

fn cleanup(signature: &str) -> Option<String> {
    let mut info = strip_instantiation_suffix(signature).replace("operator ", "operator");
    remove_argument_list(&mut info)?;
    let start = name_start(&info)?;
    let name = info[start..].trim_start_matches(['*', '&']);
    let operator = operator_suffix(name).map_or(0, |suffix| "operator".len() + suffix.len());
    let (qualified, operator) = name.split_at(name.len() - operator);
    Some(collapse_template_arguments(qualified) + operator)
}

/// The symbol of an operator name ending `info`, such as `<<` in `operator<<`.
fn operator_suffix(info: &str) -> Option<&'static str> {
    OPERATOR_SUFFIXES
        .iter()
        .find(|suffix| info.ends_with(&format!("operator{suffix}")))
        .copied()
}

/// Drops a trailing `[with T = ...]` block.
fn strip_instantiation_suffix(signature: &str) -> &str {
    let trimmed = signature.trim_end();
    if !trimmed.ends_with(']') {
        return trimmed;
    }
    match matching_open(trimmed.as_bytes(), trimmed.len() - 1, b'[', b']') {
        Some(open) => trimmed[..open].trim_end(),
        None => trimmed,
    }
}

/// Truncates `info` right before its outermost argument list.
fn remove_argument_list(info: &mut String) -> Option<()> {
    loop {
        let close = info.rfind(')')?;
        let open = matching_open(info.as_bytes(), close, b'(', b')')?;
        info.truncate(open);
        if !info.ends_with(')') || info.ends_with("operator()") {
            return Some(());
        }
        // a function returning a function pointer: `void (*make(int))(char)`
        // leaves `void (*make(int))`, so unwrap the outer parentheses and retry
        let inner_open = info.find('(')?;
        info.truncate(info.len() - 1);
        info.replace_range(..=inner_open, "");
    }
}

/// Byte index of the first character of the function name.
fn name_start(info: &str) -> Option<usize> {
    let bytes = info.as_bytes();
    let skip = operator_suffix(info).map_or(0, str::len);

    let mut parens = 0i32;
    let mut templates = 0i32;
    for idx in (0..bytes.len() - skip.min(bytes.len())).rev() {
        match bytes[idx] {
            b')' => parens += 1,
            b'(' => parens -= 1,
            b'>' => templates += 1,
            b'<' => templates -= 1,
            b' ' if parens == 0 && templates == 0 => return Some(idx + 1),
            _ => {}
        }
        if parens < 0 || templates < 0 {
            return None;
        }
    }
    Some(0)
}

/// Removes every `<...>` group, innermost last.
fn collapse_template_arguments(name: &str) -> String {
    let mut name = name.to_string();
    while name.contains('<') {
        let Some(close) = name.rfind('>') else {
            break;
        };
        let Some(open) = matching_open(name.as_bytes(), close, b'<', b'>') else {
            break;
        };
        name.replace_range(open..=close, "");
    }
    name
}

/// Finds the opening bracket matching the closing one at `close`.
fn matching_open(bytes: &[u8], close: usize, open: u8, closing: u8) -> Option<usize> {
    let mut depth = 1usize;
    for idx in (0..close).rev() {
        if bytes[idx] == closing {
            depth += 1;
        } else if bytes[idx] == open {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_return_type_and_arguments() {
        assert_eq!(strip_function_name("void Foo::bar(int, int) const"), "Foo::bar");
        assert_eq!(strip_function_name("int main(int, char**)"), "main");
        assert_eq!(
            strip_function_name("static QString* ns::Widget::name(const QList<int>&)"),
            "ns::Widget::name"
        );
    }

    #[test]
    fn test_collapses_template_arguments() {
        assert_eq!(
            strip_function_name("T ns::Box<T>::get(std::map<int, T>) [with T = int]"),
            "ns::Box::get"
        );
        assert_eq!(
            strip_function_name("void run<Outer<Inner> >(int)"),
            "run"
        );
    }

    #[test]
    fn test_operator_names_are_kept() {
        assert_eq!(
            strip_function_name("bool Foo::operator<(const Foo&) const"),
            "Foo::operator<"
        );
        assert_eq!(
            strip_function_name("bool Foo::operator >=(const Foo&) const"),
            "Foo::operator>="
        );
        assert_eq!(strip_function_name("void Foo::operator()(int)"), "Foo::operator()");
        assert_eq!(
            strip_function_name("Stream& Stream::operator<<(int)"),
            "Stream::operator<<"
        );
    }

    #[test]
    fn test_operator_of_class_template() {
        assert_eq!(
            strip_function_name("bool ns::Box<int>::operator>(const Box&)"),
            "ns::Box::operator>"
        );
        assert_eq!(
            strip_function_name("bool ns::Box<T>::operator<=(const Box<T>&) [with T = int]"),
            "ns::Box::operator<="
        );
        assert_eq!(
            strip_function_name("void Call<A<B> >::operator()(int)"),
            "Call::operator()"
        );
    }

    #[test]
    fn test_function_pointer_return_type() {
        assert_eq!(strip_function_name("void (*make(int))(char)"), "make");
    }

    #[test]
    fn test_unparseable_input_is_returned_unchanged() {
        assert_eq!(strip_function_name("my_crate::net::connect"), "my_crate::net::connect");
        assert_eq!(strip_function_name("broken)"), "broken)");
        assert_eq!(strip_function_name(""), "");
        assert_eq!(strip_function_name("a<b(int)"), "a<b(int)");
    }
}

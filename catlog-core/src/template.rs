use std::{
    borrow::Cow,
    fmt::{self, Write},
    sync::{PoisonError, RwLock},
};

use crate::{
    record::Record,
    signature::strip_function_name,
    timestamp::{DEFAULT_TIMESTAMP_PATTERN, format_timestamp},
};

/// Template used by every sink unless told otherwise.
pub const DEFAULT_TEMPLATE: &str = "%t{yyyy-MM-ddTHH:mm:ss.zzz} [%-7l] <%c> %m\n";

const MARKER: char = '%';

#[derive(Debug, Clone, PartialEq, Eq)]
enum Field {
    Timestamp(Option<String>),
    Level,
    LevelUpper,
    FullPath,
    FileName,
    Line,
    Function,
    StrippedFunction,
    Message,
    Percent,
    Unknown(char),
}

impl Field {
    fn resolve<'a>(&self, record: &Record<'a>) -> Cow<'a, str> {
        match self {
            Field::Timestamp(pattern) => Cow::Owned(format_timestamp(
                &record.timestamp(),
                pattern.as_deref().unwrap_or(DEFAULT_TIMESTAMP_PATTERN),
            )),
            Field::Level => Cow::Borrowed(record.level().as_str()),
            Field::LevelUpper => Cow::Owned(record.level().as_str().to_uppercase()),
            Field::FullPath => Cow::Borrowed(record.file()),
            Field::FileName => Cow::Borrowed(record.file().rsplit('/').next().unwrap_or_default()),
            Field::Line => Cow::Owned(record.line().to_string()),
            Field::Function => Cow::Borrowed(record.function()),
            Field::StrippedFunction => Cow::Owned(strip_function_name(record.function())),
            Field::Message => Cow::Borrowed(record.message()),
            Field::Percent => Cow::Borrowed("%"),
            Field::Unknown(command) => Cow::Owned(format!("{MARKER}{command}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Marker { field: Field, width: i32 },
}

#[derive(Debug)]
struct Compiled {
    source: String,
    tokens: Vec<Token>,
}

impl Compiled {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            tokens: compile(source),
        }
    }
}

/// A compiled format template turning records into text.
///
/// Markers start with `%`, accept an optional field width (`%-7l` pads the
/// level to seven columns, left-justified) and select a record field:
///
/// | marker | output |
/// |--------|--------|
/// | `%t`, `%t{pattern}` | timestamp, see [`crate::format_timestamp`] |
/// | `%l` / `%L` | level name / upper-cased level name |
/// | `%F` / `%f` | source file path / file name without directories |
/// | `%i` | source line |
/// | `%C` / `%c` | raw function signature / stripped function name |
/// | `%m` | message |
/// | `%%` | a literal `%` |
///
/// Malformed markers never fail: unknown commands and a trailing `%` are
/// copied as-is, an unterminated `%t{` uses the default timestamp pattern.
#[derive(Debug)]
pub struct Template {
    compiled: RwLock<Compiled>,
}

impl Default for Template {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl Clone for Template {
    fn clone(&self) -> Self {
        Self::new(&self.source())
    }
}

impl Template {
    pub fn new(source: &str) -> Self {
        Self {
            compiled: RwLock::new(Compiled::new(source)),
        }
    }

    /// Replaces the template text. Renders in progress finish with the previous template.
    pub fn set(&self, source: &str) {
        let compiled = Compiled::new(source);
        *self.compiled.write().unwrap_or_else(PoisonError::into_inner) = compiled;
    }

    pub fn source(&self) -> String {
        self.compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .source
            .clone()
    }

    pub fn render(&self, record: &Record<'_>) -> String {
        let compiled = self.compiled.read().unwrap_or_else(PoisonError::into_inner);
        let mut out = String::with_capacity(compiled.source.len() + record.message().len());
        for token in &compiled.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Marker { field, width } => {
                    // writing into a String cannot fail
                    let _ = pad_into(&mut out, &field.resolve(record), *width);
                }
            }
        }
        out
    }
}

fn pad_into(out: &mut String, chunk: &str, width: i32) -> fmt::Result {
    let columns = width.unsigned_abs() as usize;
    if width < 0 {
        write!(out, "{chunk:<columns$}")
    } else {
        write!(out, "{chunk:>columns$}")
    }
}

fn compile(source: &str) -> Vec<Token> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c != MARKER || i + 1 == chars.len() {
            literal.push(c);
            i += 1;
            continue;
        }

        let marker_start = i;
        i += 1;
        let mut width = 0;
        if chars[i].is_ascii_digit() || chars[i] == '-' {
            let mut end = i + 1;
            while end < chars.len() && chars[end].is_ascii_digit() {
                end += 1;
            }
            width = chars[i..end]
                .iter()
                .collect::<String>()
                .parse()
                .unwrap_or(0);
            i = end;
            if i == chars.len() {
                literal.extend(&chars[marker_start..]);
                break;
            }
        }

        let field = match chars[i] {
            't' => match timestamp_pattern(&chars, i) {
                Some((pattern, close)) => {
                    i = close;
                    Field::Timestamp((!pattern.is_empty()).then_some(pattern))
                }
                None => Field::Timestamp(None),
            },
            'l' => Field::Level,
            'L' => Field::LevelUpper,
            'F' => Field::FullPath,
            'f' => Field::FileName,
            'i' => Field::Line,
            'C' => Field::Function,
            'c' => Field::StrippedFunction,
            'm' => Field::Message,
            MARKER => Field::Percent,
            other => Field::Unknown(other),
        };
        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }
        tokens.push(Token::Marker { field, width });
        i += 1;
    }
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}

/// Reads `{pattern}` following the `t` command at `command`. Returns the
/// pattern and the index of the closing brace.
fn timestamp_pattern(chars: &[char], command: usize) -> Option<(String, usize)> {
    if chars.get(command + 1) != Some(&'{') {
        return None;
    }
    let open = command + 1;
    let close = open + chars[open..].iter().position(|&c| c == '}')?;
    Some((chars[open + 1..close].iter().collect(), close))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{level::Level, record::Location};
    use chrono::{DateTime, Local, TimeZone};
    use std::{sync::Arc, thread};

    fn timestamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 2, 9, 30, 15).unwrap()
    }

    fn record<'a>(level: Level, function: &'a str, message: &'a str) -> Record<'a> {
        Record::new(level, Location::new("src/net/socket.rs", 42, function), message)
            .at(timestamp())
    }

    #[test]
    fn test_render_with_custom_timestamp_and_padding() {
        let template = Template::new("%t{yyyy-MM-dd} [%-7l] <%c> %m");
        let record = record(Level::Warning, "void Foo::bar(int, int) const", "oops");
        assert_eq!(template.render(&record), "2024-01-02 [Warning] <Foo::bar> oops");

        let record = self::record(Level::Info, "void Foo::bar(int, int) const", "oops");
        assert_eq!(template.render(&record), "2024-01-02 [Info   ] <Foo::bar> oops");
    }

    #[test]
    fn test_render_is_deterministic() {
        let template = Template::default();
        let record = record(Level::Error, "my_crate::run", "boom");
        let first = template.render(&record);
        assert_eq!(first, template.render(&record));
        assert_eq!(first, "2024-01-02T09:30:15.000 [Error  ] <my_crate::run> boom\n");
    }

    #[test]
    fn test_all_fields() {
        let template = Template::new("%L|%F|%f|%i|%C|%%|%t");
        let record = record(Level::Debug, "int main(int, char**)", "");
        assert_eq!(
            template.render(&record),
            "DEBUG|src/net/socket.rs|socket.rs|42|int main(int, char**)|%|09:30:15.000"
        );
    }

    #[test]
    fn test_right_justified_width() {
        let template = Template::new("[%7l][%3i][%-5m]");
        let record = record(Level::Info, "f", "hi");
        assert_eq!(template.render(&record), "[   Info][ 42][hi   ]");
    }

    #[test]
    fn test_malformed_markers_degrade_to_literals() {
        let record = record(Level::Info, "f", "msg");
        assert_eq!(Template::new("%z").render(&record), "%z");
        assert_eq!(Template::new("%4z|").render(&record), "  %z|");
        assert_eq!(Template::new("100%").render(&record), "100%");
        assert_eq!(Template::new("%m %-").render(&record), "msg %-");
        assert_eq!(Template::new("%m %12").render(&record), "msg %12");
        assert_eq!(Template::new("%-m").render(&record), "msg");
    }

    #[test]
    fn test_unterminated_timestamp_pattern_uses_default() {
        let record = record(Level::Info, "f", "msg");
        assert_eq!(
            Template::new("%t{yyyy %m").render(&record),
            "09:30:15.000{yyyy msg"
        );
        assert_eq!(Template::new("%t{}").render(&record), "09:30:15.000");
    }

    #[test]
    fn test_set_replaces_template() {
        let template = Template::new("%m");
        template.set("<%l> %m");
        assert_eq!(template.source(), "<%l> %m");
        let record = record(Level::Fatal, "f", "bye");
        assert_eq!(template.render(&record), "<Fatal> bye");
        assert_eq!(template.clone().render(&record), "<Fatal> bye");
    }

    #[test]
    fn test_concurrent_render_and_set() {
        let template = Arc::new(Template::new("%l %m"));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let template = Arc::clone(&template);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let message = format!("thread {i}");
                        let record = record(Level::Info, "f", &message);
                        let line = template.render(&record);
                        assert!(line == format!("Info {message}") || line == message);
                    }
                })
            })
            .collect();
        template.set("%m");
        for h in handles {
            h.join().unwrap();
        }
    }
}

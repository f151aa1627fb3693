/// Path of the enclosing function, e.g. `my_crate::net::connect`.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        name.strip_suffix("::f").unwrap_or(name)
    }};
}

/// [`Location`](crate::Location) of the call site.
#[macro_export]
macro_rules! location {
    () => {
        $crate::Location::new(::std::file!(), ::std::line!(), $crate::function_name!())
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __write {
    ($level:expr, $category:expr, $($arg:tt)+) => {
        $crate::logger().write(
            $level,
            $crate::location!(),
            $category,
            &::std::format!($($arg)+),
        )
    };
}

/// Writes a trace record: `trace!("x = {x}")` or `trace!(category: "net", "x = {x}")`.
#[macro_export]
macro_rules! trace {
    (category: $category:expr, $($arg:tt)+) => {
        $crate::__write!($crate::Level::Trace, ::std::option::Option::Some($category), $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__write!($crate::Level::Trace, ::std::option::Option::None, $($arg)+)
    };
}

/// Writes a debug record, see [`trace!`].
#[macro_export]
macro_rules! debug {
    (category: $category:expr, $($arg:tt)+) => {
        $crate::__write!($crate::Level::Debug, ::std::option::Option::Some($category), $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__write!($crate::Level::Debug, ::std::option::Option::None, $($arg)+)
    };
}

/// Writes an info record, see [`trace!`].
#[macro_export]
macro_rules! info {
    (category: $category:expr, $($arg:tt)+) => {
        $crate::__write!($crate::Level::Info, ::std::option::Option::Some($category), $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__write!($crate::Level::Info, ::std::option::Option::None, $($arg)+)
    };
}

/// Writes a warning record, see [`trace!`].
#[macro_export]
macro_rules! warning {
    (category: $category:expr, $($arg:tt)+) => {
        $crate::__write!($crate::Level::Warning, ::std::option::Option::Some($category), $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__write!($crate::Level::Warning, ::std::option::Option::None, $($arg)+)
    };
}

/// Writes an error record, see [`trace!`].
#[macro_export]
macro_rules! error {
    (category: $category:expr, $($arg:tt)+) => {
        $crate::__write!($crate::Level::Error, ::std::option::Option::Some($category), $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__write!($crate::Level::Error, ::std::option::Option::None, $($arg)+)
    };
}

/// Writes a fatal record and aborts the process, see [`trace!`].
#[macro_export]
macro_rules! fatal {
    (category: $category:expr, $($arg:tt)+) => {
        $crate::__write!($crate::Level::Fatal, ::std::option::Option::Some($category), $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__write!($crate::Level::Fatal, ::std::option::Option::None, $($arg)+)
    };
}

/// Writes a fatal record naming the condition when it does not hold.
#[macro_export]
macro_rules! log_assert {
    ($condition:expr $(,)?) => {
        $crate::logger().assert($condition, $crate::location!(), ::std::stringify!($condition))
    };
}

/// Opens a [`LogStream`](crate::LogStream) on the process-wide logger.
#[macro_export]
macro_rules! log_stream {
    ($level:expr) => {
        $crate::logger().stream($level, $crate::location!())
    };
}

/// Measures until the end of the scope: `let _timer = log_time!(Level::Debug, "load");`
#[macro_export]
macro_rules! log_time {
    ($level:expr) => {
        $crate::TimingGuard::new($crate::logger(), $level, $crate::location!(), ::std::option::Option::None)
    };
    ($level:expr, $block:expr) => {
        $crate::TimingGuard::new(
            $crate::logger(),
            $level,
            $crate::location!(),
            ::std::option::Option::Some($block),
        )
    };
}

//! Date/time patterns used by the `%t{...}` template marker.
//!
//! Letters repeat to pick a representation (`d`, `dd`, `ddd`, `dddd`), text in
//! single quotes is copied verbatim and `''` yields one quote. Any character
//! that is not part of a pattern letter is copied as-is.

use std::fmt::Write;

use chrono::{DateTime, Datelike, Local, Timelike};

/// Pattern used by `%t` without a sub-pattern, and by unterminated `%t{`.
pub const DEFAULT_TIMESTAMP_PATTERN: &str = "HH:mm:ss.zzz";

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Renders `timestamp` according to `pattern`.
pub fn format_timestamp(timestamp: &DateTime<Local>, pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let twelve_hour = has_am_pm_marker(&chars);
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            i = copy_quoted(&chars, i, &mut out);
            continue;
        }
        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        i += write_field(timestamp, c, run, &chars[i..], twelve_hour, &mut out);
    }
    out
}

/// Writes the field starting with `c` and returns how many characters it consumed.
fn write_field(
    ts: &DateTime<Local>,
    c: char,
    run: usize,
    rest: &[char],
    twelve_hour: bool,
    out: &mut String,
) -> usize {
    // `write!` into a String cannot fail
    match c {
        'y' if run >= 4 => {
            let _ = write!(out, "{:04}", ts.year());
            4
        }
        'y' if run >= 2 => {
            let _ = write!(out, "{:02}", ts.year().rem_euclid(100));
            2
        }
        'M' => {
            let month = ts.month() as usize;
            match run {
                1 => {
                    let _ = write!(out, "{month}");
                }
                2 => {
                    let _ = write!(out, "{month:02}");
                }
                3 => out.push_str(&MONTHS[month - 1][..3]),
                _ => out.push_str(MONTHS[month - 1]),
            }
            run.min(4)
        }
        'd' => {
            let weekday = ts.weekday().num_days_from_monday() as usize;
            match run {
                1 => {
                    let _ = write!(out, "{}", ts.day());
                }
                2 => {
                    let _ = write!(out, "{:02}", ts.day());
                }
                3 => out.push_str(&WEEKDAYS[weekday][..3]),
                _ => out.push_str(WEEKDAYS[weekday]),
            }
            run.min(4)
        }
        'H' | 'h' => {
            let hour = if c == 'h' && twelve_hour {
                ts.hour12().1
            } else {
                ts.hour()
            };
            write_number(out, hour, run)
        }
        'm' => write_number(out, ts.minute(), run),
        's' => write_number(out, ts.second(), run),
        'z' => {
            let millis = ts.timestamp_subsec_millis().min(999);
            if run >= 3 {
                let _ = write!(out, "{millis:03}");
                3
            } else {
                let _ = write!(out, "{millis}");
                1
            }
        }
        'A' | 'a' => {
            let pm = ts.hour12().0;
            let text = match (c, pm) {
                ('A', false) => "AM",
                ('A', true) => "PM",
                (_, false) => "am",
                (_, true) => "pm",
            };
            out.push_str(text);
            match rest.get(1) {
                Some('P') if c == 'A' => 2,
                Some('p') if c == 'a' => 2,
                _ => 1,
            }
        }
        't' => {
            let _ = write!(out, "{}", ts.format("%:z"));
            1
        }
        _ => {
            out.push(c);
            1
        }
    }
}

fn write_number(out: &mut String, value: u32, run: usize) -> usize {
    if run >= 2 {
        let _ = write!(out, "{value:02}");
        2
    } else {
        let _ = write!(out, "{value}");
        1
    }
}

/// Copies a quoted section starting at `start` and returns the index after it.
fn copy_quoted(chars: &[char], start: usize, out: &mut String) -> usize {
    if chars.get(start + 1) == Some(&'\'') {
        out.push('\'');
        return start + 2;
    }
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            return i + 1;
        }
        out.push(chars[i]);
        i += 1;
    }
    i
}

fn has_am_pm_marker(chars: &[char]) -> bool {
    let mut quoted = false;
    for &c in chars {
        match c {
            '\'' => quoted = !quoted,
            'A' | 'a' if !quoted => return true,
            _ => {}
        }
    }
    false
}

//! The built-in function library.
//!
//! Every implementation is defensive: an absent or mistyped slot degrades to
//! `""` or `0` instead of failing. `read` is the one function that reports
//! problems, and it does so inside its result text.

use std::{
    fmt::{Display, Write as _},
    fs, iter, mem,
};

use chrono::{
    DateTime, FixedOffset, Local, TimeZone, Utc,
    format::{Item, StrftimeItems},
};
use chrono_tz::Tz;
use regex::Regex;
use tracing::debug;

use crate::{
    CallContext, Direction, Value, disk,
    registry::{Handler, Params},
    signature::Flags,
    value::parse_leading_number,
};

/// Pattern used by `time()` without a format argument.
pub const DEFAULT_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// Widest field `pad()` will produce, in characters.
const MAX_PAD_WIDTH: i64 = u16::MAX as i64;

/// Most fractional digits `str()` will print.
const MAX_DECIMALS: f64 = 17.0;

/// The built-in handler table.
pub const HANDLERS: &[Handler] = &[
    Handler {
        name: "mid",
        parameters: "SNN",
        flags: Flags::DETERMINISTIC,
        function: mid,
    },
    Handler {
        name: "replace",
        parameters: "SSS",
        flags: Flags::DETERMINISTIC,
        function: replace,
    },
    Handler {
        name: "pad",
        parameters: "SNs",
        flags: Flags::DETERMINISTIC,
        function: pad,
    },
    Handler {
        name: "extract",
        parameters: "SS",
        flags: Flags::DETERMINISTIC,
        function: extract,
    },
    Handler {
        name: "time",
        parameters: "ss",
        flags: Flags::NONE,
        function: time,
    },
    Handler {
        name: "disk",
        parameters: "SS",
        flags: Flags::NUMERIC,
        function: disk_usage,
    },
    Handler {
        name: "ActiveWin",
        parameters: "",
        flags: Flags::NONE,
        function: active_window,
    },
    Handler {
        name: "min",
        parameters: "NN",
        flags: Flags::DETERMINISTIC_NUMERIC,
        function: min,
    },
    Handler {
        name: "max",
        parameters: "NN",
        flags: Flags::DETERMINISTIC_NUMERIC,
        function: max,
    },
    Handler {
        name: "str",
        parameters: "Nn",
        flags: Flags::DETERMINISTIC,
        function: num_to_str,
    },
    Handler {
        name: "val",
        parameters: "S",
        flags: Flags::DETERMINISTIC_NUMERIC,
        function: val,
    },
    Handler {
        name: "upper",
        parameters: "S",
        flags: Flags::DETERMINISTIC,
        function: upper,
    },
    Handler {
        name: "lower",
        parameters: "S",
        flags: Flags::DETERMINISTIC,
        function: lower,
    },
    Handler {
        name: "gtkevent",
        parameters: "S",
        flags: Flags::NUMERIC,
        function: pointer_fraction,
    },
    Handler {
        name: "widgetid",
        parameters: "",
        flags: Flags::NONE,
        function: widget_id,
    },
    Handler {
        name: "windowinfo",
        parameters: "S",
        flags: Flags::NONE,
        function: window_info,
    },
    Handler {
        name: "escape",
        parameters: "S",
        flags: Flags::DETERMINISTIC,
        function: escape,
    },
    Handler {
        name: "read",
        parameters: "S",
        flags: Flags::NONE,
        function: read,
    },
];

/// Empty string result.
fn empty() -> Value {
    Value::Str(String::new())
}

/// `mid(text, start, end)`: characters `start..=end`. Negative offsets count
/// from the end; both are clamped into the string and swapped when reversed.
pub fn mid(p: &Params<'_>, _ctx: &CallContext<'_>) -> Value {
    let (Some(text), Some(a), Some(b)) = (p.str(0), p.num(1), p.num(2)) else {
        return empty();
    };
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return empty();
    }
    let len = chars.len() as i64;
    let clamp = |v: f64| {
        let mut i = v as i64;
        if i < 0 {
            i += len;
        }
        i.clamp(0, len - 1) as usize
    };
    let (mut start, mut end) = (clamp(a), clamp(b));
    if start > end {
        mem::swap(&mut start, &mut end);
    }
    Value::Str(chars[start..=end].iter().collect())
}

/// `replace(text, old, new)`: every occurrence of `old` replaced by `new`.
pub fn replace(p: &Params<'_>, _ctx: &CallContext<'_>) -> Value {
    let (Some(text), Some(old), Some(new)) = (p.str(0), p.str(1), p.str(2)) else {
        return empty();
    };
    if old.is_empty() {
        return Value::from(text);
    }
    Value::Str(text.replace(old, new))
}

/// `pad(text, width[, fill])`: positive widths pad on the left, negative on
/// the right. Never truncates. The width is clamped to `MAX_PAD_WIDTH`.
pub fn pad(p: &Params<'_>, _ctx: &CallContext<'_>) -> Value {
    let (Some(text), Some(width)) = (p.str(0), p.num(1)) else {
        return empty();
    };
    let fill = p.str(2).and_then(|s| s.chars().next()).unwrap_or(' ');
    let width = (width as i64).clamp(-MAX_PAD_WIDTH, MAX_PAD_WIDTH);
    let len = text.chars().count();
    let target = (width.unsigned_abs() as usize).max(len);
    let padding: String = iter::repeat_n(fill, target - len).collect();
    if width >= 0 {
        Value::Str(padding + text)
    } else {
        Value::Str(format!("{}{}", text, padding))
    }
}

/// `extract(text, pattern)`: first capture group of the first match.
pub fn extract(p: &Params<'_>, _ctx: &CallContext<'_>) -> Value {
    let (Some(text), Some(pattern)) = (p.str(0), p.str(1)) else {
        return empty();
    };
    let re = match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => {
            debug!(pattern, error = %e, "extract: invalid pattern");
            return empty();
        }
    };
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map_or_else(empty, |m| Value::from(m.as_str()))
}

/// `time([format[, zone]])`: current time formatted with strftime directives.
///
/// Without a zone the local time is used. A zone is an IANA name or a fixed
/// offset such as `+02:00`; anything else falls back to UTC.
pub fn time(p: &Params<'_>, _ctx: &CallContext<'_>) -> Value {
    let format = p.str(0).unwrap_or(DEFAULT_TIME_FORMAT);
    let text = match p.str(1) {
        None => format_time(&Local::now(), format),
        Some(zone) => {
            if let Ok(tz) = zone.parse::<Tz>() {
                format_time(&Utc::now().with_timezone(&tz), format)
            } else if let Ok(offset) = zone.parse::<FixedOffset>() {
                format_time(&Utc::now().with_timezone(&offset), format)
            } else {
                debug!(zone, "time: unknown zone, using UTC");
                format_time(&Utc::now(), format)
            }
        }
    };
    Value::Str(text)
}

/// Format `t` with `pattern`, or `""` when the pattern is malformed.
fn format_time<Z: TimeZone>(t: &DateTime<Z>, pattern: &str) -> String
where
    Z::Offset: Display,
{
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        debug!(pattern, "time: invalid format");
        return String::new();
    }
    let mut out = String::new();
    if write!(out, "{}", t.format_with_items(items.iter())).is_err() {
        return String::new();
    }
    out
}

/// `disk(path, selector)`: filesystem size or usage; 0 when unavailable.
pub fn disk_usage(p: &Params<'_>, _ctx: &CallContext<'_>) -> Value {
    let (Some(path), Some(selector)) = (p.str(0), p.str(1)) else {
        return Value::Num(0.0);
    };
    let result = disk::stat(path).map_or(0.0, |stats| stats.select(selector));
    Value::Num(result)
}

/// `ActiveWin()`: title of the active window.
pub fn active_window(_p: &Params<'_>, ctx: &CallContext<'_>) -> Value {
    Value::Str(ctx.host.active_window().unwrap_or_default())
}

/// `min(a, b)`.
pub fn min(p: &Params<'_>, _ctx: &CallContext<'_>) -> Value {
    match (p.num(0), p.num(1)) {
        (Some(a), Some(b)) => Value::Num(a.min(b)),
        _ => Value::Num(0.0),
    }
}

/// `max(a, b)`.
pub fn max(p: &Params<'_>, _ctx: &CallContext<'_>) -> Value {
    match (p.num(0), p.num(1)) {
        (Some(a), Some(b)) => Value::Num(a.max(b)),
        _ => Value::Num(0.0),
    }
}

/// `str(number[, decimals])`: fixed-point text; decimals default to 0 and are
/// clamped to `MAX_DECIMALS`.
pub fn num_to_str(p: &Params<'_>, _ctx: &CallContext<'_>) -> Value {
    let Some(v) = p.num(0) else {
        return empty();
    };
    let decimals = p.num(1).map_or(0, |d| d.clamp(0.0, MAX_DECIMALS) as usize);
    Value::Str(format!("{:.*}", decimals, v))
}

/// `val(text)`: numeric prefix of `text`.
pub fn val(p: &Params<'_>, _ctx: &CallContext<'_>) -> Value {
    Value::Num(p.str(0).map_or(0.0, parse_leading_number))
}

/// `upper(text)`: ASCII upper case.
pub fn upper(p: &Params<'_>, _ctx: &CallContext<'_>) -> Value {
    p.str(0).map_or_else(empty, |s| Value::Str(s.to_ascii_uppercase()))
}

/// `lower(text)`: ASCII lower case.
pub fn lower(p: &Params<'_>, _ctx: &CallContext<'_>) -> Value {
    p.str(0).map_or_else(empty, |s| Value::Str(s.to_ascii_lowercase()))
}

/// `gtkevent(axis)`: pointer position as a fraction of the widget's content
/// box. `axis` is `x`, `y`, or `dir` for the widget's growth direction.
pub fn pointer_fraction(p: &Params<'_>, ctx: &CallContext<'_>) -> Value {
    let zero = Value::Num(0.0);
    let (Some(axis), Some(widget), Some(event)) = (p.str(0), ctx.widget, ctx.event) else {
        return zero;
    };
    let direction = if axis.eq_ignore_ascii_case("x") {
        Direction::Right
    } else if axis.eq_ignore_ascii_case("y") {
        Direction::Bottom
    } else if axis.eq_ignore_ascii_case("dir") {
        widget.direction()
    } else {
        return zero;
    };
    let Some(geometry) = widget.geometry() else {
        return zero;
    };

    let (offset, extent) = if direction.is_horizontal() {
        (event.x - geometry.insets.left, geometry.content_width())
    } else {
        (event.y - geometry.insets.top, geometry.content_height())
    };
    if extent <= 0.0 {
        return zero;
    }
    let fraction = (offset / extent).clamp(0.0, 1.0);
    Value::Num(if direction.is_reversed() {
        1.0 - fraction
    } else {
        fraction
    })
}

/// `widgetid()`: id of the calling widget.
pub fn widget_id(_p: &Params<'_>, ctx: &CallContext<'_>) -> Value {
    Value::from(ctx.widget.and_then(|w| w.id()).unwrap_or_default())
}

/// `windowinfo(field)`: a property of the window behind the calling widget.
/// Flags render as `1` or `0`.
pub fn window_info(p: &Params<'_>, ctx: &CallContext<'_>) -> Value {
    let (Some(field), Some(win)) = (p.str(0), ctx.widget.and_then(|w| w.window())) else {
        return empty();
    };
    let flag = |b: bool| Value::from(if b { "1" } else { "0" });
    match field.to_ascii_lowercase().as_str() {
        "appid" => Value::from(win.appid.as_str()),
        "title" => Value::from(win.title.as_str()),
        "minimized" => flag(win.minimized),
        "maximized" => flag(win.maximized),
        "fullscreen" => flag(win.fullscreen),
        "focused" => flag(win.focused),
        _ => empty(),
    }
}

/// `escape(text)`: markup escaping of `& < > ' "`.
pub fn escape(p: &Params<'_>, _ctx: &CallContext<'_>) -> Value {
    let Some(text) = p.str(0) else {
        return empty();
    };
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    Value::Str(out)
}

/// `read(name)`: contents of a file found on the configuration search path.
///
/// Failures are reported as text in the result.
pub fn read(p: &Params<'_>, ctx: &CallContext<'_>) -> Value {
    let Some(name) = p.str(0) else {
        return empty();
    };
    let Some(path) = ctx.host.resolve_file(name) else {
        return Value::Str(format!("Read: file not found '{}'", name));
    };
    match fs::read(&path) {
        Ok(bytes) => Value::Str(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "read failed");
            Value::Str(format!("Read: can't open file '{}'", path.display()))
        }
    }
}

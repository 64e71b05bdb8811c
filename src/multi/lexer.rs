// src/multi/lexer.rs

//! MULTI markup lexer.
//! Splits text into literal spans and bracketed tags, then decodes each tag's
//! parameters and calls the matching `MultiSink` method.

use log::{debug, trace, warn};

use super::{ColorTag, MultiSink, OverLimitMode};

const TAG_OPEN: char = '[';
const TAG_CLOSE: char = ']';

/// Drives `sink` with the contents of `markup`.
///
/// `[[` and `]]` are literal brackets and a lone `]` is literal text. Tags
/// that are unknown, malformed, or unterminated go to `unsupported_tag`
/// verbatim, brackets included.
pub fn parse(markup: &str, sink: &mut dyn MultiSink) {
    let mut span = String::new();
    let mut chars = markup.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            TAG_OPEN => {
                if let Some(&(_, TAG_OPEN)) = chars.peek() {
                    chars.next();
                    span.push(TAG_OPEN);
                    continue;
                }
                flush_span(&mut span, sink);
                let body_start = i + c.len_utf8();
                match markup[body_start..].find(TAG_CLOSE) {
                    Some(len) => {
                        let body = &markup[body_start..body_start + len];
                        let raw = &markup[i..body_start + len + 1];
                        dispatch_tag(body, raw, sink);
                        // Skip the tag body and closing bracket.
                        while let Some(&(j, _)) = chars.peek() {
                            if j > body_start + len {
                                break;
                            }
                            chars.next();
                        }
                    }
                    None => {
                        warn!("Unterminated tag: '{}'", &markup[i..]);
                        sink.unsupported_tag(&markup[i..]);
                        return;
                    }
                }
            }
            TAG_CLOSE => {
                if let Some(&(_, TAG_CLOSE)) = chars.peek() {
                    chars.next();
                }
                span.push(TAG_CLOSE);
            }
            _ => span.push(c),
        }
    }
    flush_span(&mut span, sink);
}

fn flush_span(span: &mut String, sink: &mut dyn MultiSink) {
    if !span.is_empty() {
        sink.add_span(span);
        span.clear();
    }
}

fn parse_int(s: &str) -> Option<i32> {
    s.parse::<i32>().ok()
}

/// Empty string means "absent"; anything else must be an integer.
fn parse_opt_int(s: &str) -> Result<Option<i32>, ()> {
    if s.is_empty() {
        Ok(None)
    } else {
        parse_int(s).map(Some).ok_or(())
    }
}

fn parse_ints(s: &str) -> Option<Vec<i32>> {
    s.split(',').map(parse_int).collect()
}

fn opt_str(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.is_empty())
}

/// Parameter text after a leading comma, split on commas.
fn comma_args(rest: &str) -> Option<Vec<String>> {
    if rest.is_empty() {
        return Some(Vec::new());
    }
    let rest = rest.strip_prefix(',')?;
    Some(rest.split(',').map(str::to_string).collect())
}

/// Tag body with a (case-insensitively matched) prefix removed.
fn after<'a>(body: &'a str, prefix: &str) -> &'a str {
    &body[prefix.len()..]
}

fn dispatch_tag(body: &str, raw: &str, sink: &mut dyn MultiSink) {
    trace!("Tag: '{}'", raw);
    if !decode_tag(body, sink) {
        debug!("Unsupported tag: '{}'", raw);
        sink.unsupported_tag(raw);
    }
}

/// Returns false if the tag is not recognized or its parameters are malformed.
fn decode_tag(body: &str, sink: &mut dyn MultiSink) -> bool {
    let lower = body.to_ascii_lowercase();
    // Parameters keep their original case; ids are matched case-insensitively.
    let rest_of = |prefix: &str| after(body, prefix);

    if lower == "/sc" {
        sink.set_char_spacing(None);
        return true;
    }
    if lower.starts_with("captime") {
        let Some(args) = comma_args(rest_of("captime")) else { return false };
        let get = |i: usize| opt_str(args.get(i).map(String::as_str));
        sink.add_cap_time(get(0), get(1), get(2));
        return true;
    }
    if lower.starts_with("capresponse") {
        let Some(args) = comma_args(rest_of("capresponse")) else { return false };
        sink.add_cap_response(&args);
        return true;
    }
    if lower.starts_with("capurgency") {
        let Some(args) = comma_args(rest_of("capurgency")) else { return false };
        sink.add_cap_urgency(&args);
        return true;
    }
    if lower.starts_with("slow") {
        let args: Vec<&str> = rest_of("slow").split(',').collect();
        let (speed, dist) = match (args.first().and_then(|s| parse_int(s)), args.get(1).and_then(|s| parse_int(s))) {
            (Some(s), Some(d)) => (s, d),
            _ => return false,
        };
        if args.len() > 3 {
            return false;
        }
        sink.add_slow_warning(speed, dist, opt_str(args.get(2).copied()));
        return true;
    }
    if lower.starts_with("feed") {
        sink.add_feed(rest_of("feed"));
        return true;
    }
    if lower.starts_with("loc") {
        sink.add_locator(rest_of("loc"));
        return true;
    }
    if lower.starts_with("vsa") {
        if lower != "vsa" {
            return false;
        }
        sink.add_speed_advisory();
        return true;
    }
    if lower.len() >= 2 && lower.is_char_boundary(2) {
        let rest = &body[2..];
        match &lower[..2] {
            "cb" => return parse_opt_int(rest).map(|v| sink.set_color_background(v)).is_ok(),
            "pb" | "cf" => {
                let color = if rest.is_empty() {
                    None
                } else {
                    match parse_ints(rest).as_deref().and_then(ColorTag::from_values) {
                        Some(c) => Some(c),
                        None => return false,
                    }
                };
                if &lower[..2] == "pb" {
                    sink.set_page_background(color);
                } else {
                    sink.set_color_foreground(color);
                }
                return true;
            }
            "cr" => {
                return match parse_ints(rest).as_deref() {
                    Some([x, y, w, h, n]) => {
                        sink.add_color_rectangle(*x, *y, *w, *h, ColorTag::Single(*n));
                        true
                    }
                    Some([x, y, w, h, r, g, b]) => {
                        sink.add_color_rectangle(*x, *y, *w, *h, ColorTag::Rgb(*r, *g, *b));
                        true
                    }
                    _ => false,
                };
            }
            "fo" => {
                if rest.is_empty() {
                    sink.set_font(None, None);
                    return true;
                }
                let mut parts = rest.splitn(2, ',');
                let Some(num) = parts.next().and_then(parse_int) else { return false };
                sink.set_font(Some(num), opt_str(parts.next()));
                return true;
            }
            "jl" => return parse_opt_int(rest).map(|v| sink.set_justification_line(v)).is_ok(),
            "jp" => return parse_opt_int(rest).map(|v| sink.set_justification_page(v)).is_ok(),
            "nl" => return parse_opt_int(rest).map(|v| sink.add_line(v)).is_ok(),
            "np" => {
                if !rest.is_empty() {
                    return false;
                }
                sink.add_page();
                return true;
            }
            "pt" => {
                let lower_rest = &lower[2..];
                let (on, off) = match lower_rest.find('o') {
                    Some(p) => (&rest[..p], &rest[p + 1..]),
                    None => (rest, ""),
                };
                return match (parse_opt_int(on), parse_opt_int(off)) {
                    (Ok(on), Ok(off)) => {
                        sink.set_page_times(on, off);
                        true
                    }
                    _ => false,
                };
            }
            "sc" => {
                return match parse_int(rest) {
                    Some(n) => {
                        sink.set_char_spacing(Some(n));
                        true
                    }
                    None => false,
                };
            }
            "tr" => {
                return match parse_ints(rest).as_deref() {
                    Some([x, y, w, h]) => {
                        sink.set_text_rectangle(*x, *y, *w, *h);
                        true
                    }
                    _ => false,
                };
            }
            "tt" => {
                let mut parts = rest.splitn(3, ',');
                let sid = parts.next().unwrap_or("");
                if sid.is_empty() {
                    return false;
                }
                let mode = match opt_str(parts.next()) {
                    None => None,
                    Some(m) => match OverLimitMode::parse(&m.to_ascii_lowercase()) {
                        Some(m) => Some(m),
                        None => return false,
                    },
                };
                sink.add_travel_time(sid, mode, opt_str(parts.next()));
                return true;
            }
            "tz" => {
                let mut parts = rest.split(',');
                let mode = parts.next().unwrap_or("");
                if mode.is_empty() {
                    return false;
                }
                let zones: Vec<String> = parts.map(str::to_string).collect();
                sink.add_tolling(mode, &zones);
                return true;
            }
            "pa" => {
                let mut parts = rest.splitn(3, ',');
                let pid = parts.next().unwrap_or("");
                if pid.is_empty() {
                    return false;
                }
                let low = opt_str(parts.next());
                sink.add_parking(pid, low, opt_str(parts.next()));
                return true;
            }
            _ => {}
        }
    }
    if lower.starts_with('g') {
        let rest = &body[1..];
        let parts: Vec<&str> = rest.split(',').collect();
        let Some(num) = parts.first().and_then(|s| parse_int(s)) else { return false };
        return match parts.len() {
            1 => {
                sink.add_graphic(num, None, None, None);
                true
            }
            3 | 4 => match (parse_int(parts[1]), parse_int(parts[2])) {
                (Some(x), Some(y)) => {
                    sink.add_graphic(num, Some(x), Some(y), opt_str(parts.get(3).copied()));
                    true
                }
                _ => false,
            },
            _ => false,
        };
    }
    false
}

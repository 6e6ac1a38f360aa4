use std::env;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Cuts `s` to at most `width` terminal columns, ending in `...` when cut.
pub fn truncate(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    let (budget, ellipsis) = if width <= 3 { (width, "") } else { (width - 3, "...") };
    let mut out = String::with_capacity(budget + ellipsis.len());
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str(ellipsis);
    out
}

pub fn pad<S: AsRef<str>>(s: S, pad: usize) -> String {
    let s = s.as_ref();
    let mut out = String::with_capacity(s.len() + pad * 2);
    out.push_str(&" ".repeat(pad));
    out.push_str(s);
    out.push_str(&" ".repeat(pad));
    out
}

pub fn env_u64(name: &str) -> Option<u64> {
    let raw = env::var(name).ok()?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(env = name, value = %raw, "ignoring invalid numeric setting");
            None
        }
    }
}

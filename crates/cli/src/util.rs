use unicode_width::UnicodeWidthStr;

/// Display width of a string, accounting for accents and double-width glyphs.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate a string to fit within `width` display columns, adding ".." if truncated.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s
            .chars()
            .take_while(|ch| unicode_width::UnicodeWidthChar::width(*ch).unwrap_or(0) <= width)
            .take(1)
            .collect();
    }

    let budget = width - 2;
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        out.push(ch);
    }
    out.push_str("..");
    out
}

/// Pad or truncate a string to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let cut = truncate_display(s, width);
    let sw = display_width(&cut);
    format!("{}{}", cut, " ".repeat(width.saturating_sub(sw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_width_accents() {
        assert_eq!(display_width("Miércoles"), 9);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn truncate_long_text() {
        assert_eq!(truncate_display("No tenía dinero", 8), "No ten..");
        assert_eq!(truncate_display("Cobro", 8), "Cobro");
        assert_eq!(truncate_display("Cobro", 2), "C");
    }

    #[test]
    fn pad_to_width() {
        assert_eq!(pad_right("Sábado", 8), "Sábado  ");
        assert_eq!(pad_right("Difirió el pago", 6), "Difi..");
        assert_eq!(display_width(&pad_right("Difirió el pago", 6)), 6);
    }
}

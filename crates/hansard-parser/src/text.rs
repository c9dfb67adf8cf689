use std::sync::LazyLock;

use regex::Regex;

static RE_COLUMN_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d{1,2}\s+[a-z]{3,9}\.?\s+\d{4}\s*:\s*Column\s+\d+[A-Z]*(?:\s*-\s*\d+[A-Z]*)?")
        .expect("invalid regex: column heading")
});

// Windows-1252 text that was decoded as UTF-8 bytes, then re-encoded.
const MOJIBAKE: &[(&str, &str)] = &[
    ("\u{e2}\u{80}\u{99}", "\u{2019}"),
    ("\u{e2}\u{80}\u{98}", "\u{2018}"),
    ("\u{e2}\u{80}\u{9c}", "\u{201c}"),
    ("\u{e2}\u{80}\u{9d}", "\u{201d}"),
    ("\u{e2}\u{80}\u{93}", "\u{2013}"),
    ("\u{e2}\u{80}\u{94}", "\u{2014}"),
    ("\u{e2}\u{20ac}\u{2122}", "\u{2019}"),
    ("\u{e2}\u{20ac}\u{02dc}", "\u{2018}"),
    ("\u{e2}\u{20ac}\u{0153}", "\u{201c}"),
    ("\u{e2}\u{20ac}\u{201c}", "\u{2013}"),
    ("\u{e2}\u{20ac}\u{201d}", "\u{2014}"),
    ("\u{c2}\u{a3}", "\u{a3}"),
    ("\u{c2}\u{a0}", " "),
];

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Repairs smart quotes and dashes that legacy pages carry as mojibake or as
/// raw C1 control characters.
pub fn fix_encoding(text: &str) -> String {
    let mut fixed = text.to_string();
    for (broken, good) in MOJIBAKE {
        if fixed.contains(broken) {
            fixed = fixed.replace(broken, good);
        }
    }

    fixed
        .chars()
        .map(|c| match c {
            '\u{91}' => '\u{2018}',
            '\u{92}' => '\u{2019}',
            '\u{93}' => '\u{201c}',
            '\u{94}' => '\u{201d}',
            '\u{96}' => '\u{2013}',
            '\u{97}' => '\u{2014}',
            '\u{a0}' => ' ',
            other => other,
        })
        .collect()
}

/// Removes running "19 Jul 2011 : Column 831" headers left inside the body text.
pub fn strip_column_headings(text: &str) -> String {
    RE_COLUMN_HEADING.replace_all(text, " ").into_owned()
}

/// Full cleaning pipeline applied to every piece of node text.
pub fn clean(text: &str) -> String {
    normalize_whitespace(&strip_column_headings(&fix_encoding(text)))
}

/// Escapes bare ampersands so the fragment can be re-emitted as markup.
/// Existing entities (`&amp;`, `&#163;`, `&pound;`) are left alone.
pub fn merge_entities(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        let entity_len = tail
            .find(';')
            .filter(|&end| end > 0 && end <= 10)
            .filter(|&end| {
                let name = &tail[..end];
                match name.strip_prefix('#') {
                    Some(num) => {
                        let num = num.strip_prefix(['x', 'X']).unwrap_or(num);
                        !num.is_empty() && num.chars().all(|c| c.is_ascii_hexdigit())
                    }
                    None => name.chars().all(|c| c.is_ascii_alphanumeric()),
                }
            });

        match entity_len {
            Some(_) => out.push('&'),
            None => out.push_str("&amp;"),
        }
        rest = tail;
    }
    out.push_str(rest);

    fix_encoding(&out)
}

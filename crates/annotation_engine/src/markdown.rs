//! Inline markdown to styled text
//!
//! Supports `***bold italic***`, `**bold**`, `*italic*` and `~~strike~~`,
//! paired on a single line. Each input line becomes one unit of output.
//! Delimiters that do not pair up are kept as literal text, and a backslash
//! escapes `*`, `~` and itself.

use doc_model::{StyledText, TextStyle};

/// Render markdown text into lines of styled fragments
pub fn render(text: &str) -> Vec<Vec<StyledText>> {
    text.split('\n')
        .map(|line| {
            let chars: Vec<char> = line.chars().filter(|c| *c != '\r').collect();
            let mut out = Vec::new();
            parse_inline(&chars, TextStyle::plain(), &mut out);
            out
        })
        .collect()
}

/// Rendered text without styling, lines joined with newlines
pub fn plain_text(lines: &[Vec<StyledText>]) -> String {
    lines
        .iter()
        .map(|line| line.iter().map(|s| s.text.as_str()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_escapable(c: char) -> bool {
    matches!(c, '*' | '~' | '\\')
}

fn push(out: &mut Vec<StyledText>, text: &str, style: TextStyle) {
    if text.is_empty() {
        return;
    }
    match out.last_mut() {
        Some(last) if last.style == style => last.text.push_str(text),
        _ => out.push(StyledText::new(text, style)),
    }
}

fn run_length(chars: &[char], at: usize) -> usize {
    let delim = chars[at];
    chars[at..].iter().take_while(|c| **c == delim).count()
}

fn combine(base: TextStyle, delim: char, len: usize) -> TextStyle {
    let mut style = base;
    match (delim, len) {
        ('~', _) => style.strike = true,
        (_, 3) => {
            style.bold = true;
            style.italic = true;
        }
        (_, 2) => style.bold = true,
        _ => style.italic = true,
    }
    style
}

fn valid_content(content: &[char]) -> bool {
    match (content.first(), content.last()) {
        (Some(first), Some(last)) => !first.is_whitespace() && !last.is_whitespace(),
        _ => false,
    }
}

/// Position of a closing run for an opener of `len` delimiters ending at
/// `from`. Runs of exactly `len` are preferred over longer ones.
fn find_closer(chars: &[char], from: usize, delim: char, len: usize) -> Option<usize> {
    for exact in [true, false] {
        let mut j = from;
        while j < chars.len() {
            let c = chars[j];
            if c == '\\' && chars.get(j + 1).copied().map(is_escapable).unwrap_or(false) {
                j += 2;
                continue;
            }
            if c != delim {
                j += 1;
                continue;
            }
            let run = run_length(chars, j);
            let fits = if exact { run == len } else { run > len };
            if fits && valid_content(&chars[from..j]) {
                return Some(j);
            }
            j += run;
        }
    }
    None
}

/// Whether content that starts with `leading` unpaired delimiters closes
/// them itself
fn pairs_within(content: &[char], delim: char, leading: usize) -> bool {
    [3, 2, 1]
        .into_iter()
        .filter(|l| *l <= leading)
        .any(|l| find_closer(content, l, delim, l).is_some())
}

fn parse_inline(chars: &[char], style: TextStyle, out: &mut Vec<StyledText>) {
    let mut literal = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && chars.get(i + 1).copied().map(is_escapable).unwrap_or(false) {
            literal.push(chars[i + 1]);
            i += 2;
            continue;
        }
        if c != '*' && c != '~' {
            literal.push(c);
            i += 1;
            continue;
        }

        let run = run_length(chars, i);
        let lengths: &[usize] = if c == '~' { &[2] } else { &[3, 2, 1] };
        let mut matched = None;
        for &len in lengths.iter().filter(|l| **l <= run) {
            let Some(close) = find_closer(chars, i + len, c, len) else {
                continue;
            };
            let content = &chars[i + len..close];
            let leading = run - len;
            if leading > 0 && (c == '~' || !pairs_within(content, c, leading)) {
                continue;
            }
            matched = Some((len, close));
            break;
        }

        match matched {
            Some((len, close)) => {
                push(out, &literal, style);
                literal.clear();
                parse_inline(&chars[i + len..close], combine(style, c, len), out);
                i = close + len;
            }
            None => {
                literal.extend(std::iter::repeat(c).take(run));
                i += run;
            }
        }
    }
    push(out, &literal, style);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> Vec<StyledText> {
        let mut lines = render(text);
        assert_eq!(lines.len(), 1);
        lines.remove(0)
    }

    fn s(text: &str, style: TextStyle) -> StyledText {
        StyledText::new(text, style)
    }

    #[test]
    fn test_bold_and_italic() {
        assert_eq!(
            line("**bold** and *italic*"),
            vec![
                s("bold", TextStyle::bold()),
                s(" and ", TextStyle::plain()),
                s("italic", TextStyle::italic()),
            ]
        );
    }

    #[test]
    fn test_triple_has_priority() {
        assert_eq!(line("***both***"), vec![s("both", TextStyle::bold_italic())]);
    }

    #[test]
    fn test_strike() {
        assert_eq!(
            line("keep ~~drop~~"),
            vec![s("keep ", TextStyle::plain()), s("drop", TextStyle::strike())]
        );
    }

    #[test]
    fn test_nested_bold_in_italic() {
        let bold_italic = TextStyle::bold_italic();
        assert_eq!(
            line("***a** b*"),
            vec![s("a", bold_italic), s(" b", TextStyle::italic())]
        );
    }

    #[test]
    fn test_unbalanced_delimiters_are_literal() {
        assert_eq!(line("2 * 3 = 6"), vec![s("2 * 3 = 6", TextStyle::plain())]);
        assert_eq!(line("**open"), vec![s("**open", TextStyle::plain())]);
        assert_eq!(line("a ~ b"), vec![s("a ~ b", TextStyle::plain())]);
        assert_eq!(line("** spaced **"), vec![s("** spaced **", TextStyle::plain())]);
    }

    #[test]
    fn test_escapes() {
        assert_eq!(line(r"\*not italic\*"), vec![s("*not italic*", TextStyle::plain())]);
        assert_eq!(line(r"a \\ b"), vec![s(r"a \ b", TextStyle::plain())]);
        assert_eq!(line(r"c:\path"), vec![s(r"c:\path", TextStyle::plain())]);
    }

    #[test]
    fn test_lines() {
        let lines = render("first **line**\r\nsecond\n\nfourth");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], vec![s("first ", TextStyle::plain()), s("line", TextStyle::bold())]);
        assert_eq!(lines[1], vec![s("second", TextStyle::plain())]);
        assert!(lines[2].is_empty());
        assert_eq!(plain_text(&lines), "first line\nsecond\n\nfourth");
    }

    #[test]
    fn test_pairs_do_not_cross_lines() {
        let lines = render("*one\ntwo*");
        assert_eq!(lines[0], vec![s("*one", TextStyle::plain())]);
        assert_eq!(lines[1], vec![s("two*", TextStyle::plain())]);
    }

    #[test]
    fn test_empty_spans_are_dropped() {
        assert_eq!(line("****"), vec![s("****", TextStyle::plain())]);
        assert!(line("").is_empty());
    }
}

//! Chunky glyph rendering for the scoreboard banner.

use std::collections::HashMap;

use once_cell::sync::Lazy;

const FONT_HEIGHT: usize = 5;
const FILL_CHAR: char = '█';

type Glyph = [&'static str; FONT_HEIGHT];

static GLYPHS: Lazy<HashMap<char, Glyph>> = Lazy::new(|| {
    HashMap::from([
        ('0', [" 111 ", "1   1", "1   1", "1   1", " 111 "]),
        ('1', ["  1  ", " 11  ", "  1  ", "  1  ", " 111 "]),
        ('2', [" 111 ", "    1", " 111 ", "1    ", "11111"]),
        ('3', ["1111 ", "    1", " 111 ", "    1", "1111 "]),
        ('4', ["1  1 ", "1  1 ", "11111", "   1 ", "   1 "]),
        ('5', ["11111", "1    ", "1111 ", "    1", "1111 "]),
        ('6', [" 111 ", "1    ", "1111 ", "1   1", " 111 "]),
        ('7', ["11111", "    1", "   1 ", "  1  ", "  1  "]),
        ('8', [" 111 ", "1   1", " 111 ", "1   1", " 111 "]),
        ('9', [" 111 ", "1   1", " 1111", "    1", " 111 "]),
        (':', ["     ", "  1  ", "     ", "  1  ", "     "]),
        ('-', ["     ", "     ", "11111", "     ", "     "]),
        (' ', ["     ", "     ", "     ", "     ", "     "]),
        ('?', [" 111 ", "    1", "  11 ", "     ", "  1  "]),
    ])
});

/// Render text as block-character lines. Unknown characters fall back
/// to `?`.
pub fn render(text: &str) -> Vec<String> {
    let mut lines = vec![String::new(); FONT_HEIGHT];
    for (position, ch) in text.chars().enumerate() {
        let glyph = GLYPHS.get(&ch).or_else(|| GLYPHS.get(&'?')).unwrap();
        for (row, pattern) in glyph.iter().enumerate() {
            if position > 0 {
                lines[row].push_str("  ");
            }
            for cell in pattern.chars() {
                // Double width keeps the aspect ratio roughly square.
                let paint = if cell == '1' { FILL_CHAR } else { ' ' };
                lines[row].push(paint);
                lines[row].push(paint);
            }
        }
    }
    lines
        .into_iter()
        .map(|line| line.trim_end().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_expected_line_count() {
        let lines = render("152:0");
        assert_eq!(lines.len(), FONT_HEIGHT);
        assert!(lines.iter().any(|line| line.contains(FILL_CHAR)));
    }

    #[test]
    fn unknown_characters_fall_back() {
        assert_eq!(render("x").len(), FONT_HEIGHT);
    }
}

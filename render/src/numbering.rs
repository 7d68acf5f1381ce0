//! Column-number substitution for template output.
//!
//! The template renderer does not know a column's position in its table, so
//! it writes `TTYPE#`, `TFORM#` and friends. [`number_columns`] replaces the
//! placeholder with a running index that restarts at every `XTENSION` card.

/// Placeholder written in column keywords.
pub const COLUMN_PLACEHOLDER: char = '#';

/// Column keywords that carry the placeholder.
pub const COLUMN_KEYWORDS: [&str; 6] = ["TTYPE", "TFORM", "TUNIT", "TUCD", "TDIM", "TDISP"];

const KEY_FIELD: usize = 8;

/// Iterator adapter returned by [`number_columns`].
#[derive(Debug, Clone)]
pub struct NumberColumns<I> {
    lines: I,
    base: usize,
    seen: usize,
}

/// Replaces column placeholders with `base`, `base + 1`, ... per table.
///
/// Each `TTYPE#` card starts a new column; the other column keywords take the
/// number of the column they follow.
///
/// # Examples
///
/// ```
/// use fits_schema_render::number_columns;
///
/// let lines = vec![
///     "XTENSION= 'BINTABLE'".to_string(),
///     "TTYPE#  = 'time'".to_string(),
///     "TFORM#  = 'D'".to_string(),
///     "TTYPE#  = 'energy'".to_string(),
/// ];
/// let numbered: Vec<String> = number_columns(lines, 1).collect();
/// assert_eq!(numbered[1], "TTYPE1  = 'time'");
/// assert_eq!(numbered[2], "TFORM1  = 'D'");
/// assert_eq!(numbered[3], "TTYPE2  = 'energy'");
/// ```
pub fn number_columns<I>(lines: I, base: usize) -> NumberColumns<I::IntoIter>
where
    I: IntoIterator<Item = String>,
{
    NumberColumns {
        lines: lines.into_iter(),
        base,
        seen: 0,
    }
}

/// Splits a placeholder card into its keyword stem and the text after the
/// keyword field.
fn placeholder_key(line: &str) -> Option<(&str, &str)> {
    if !line.is_char_boundary(KEY_FIELD) {
        return None;
    }
    let (field, rest) = line.split_at(KEY_FIELD);
    let stem = field.trim_end().strip_suffix(COLUMN_PLACEHOLDER)?;
    COLUMN_KEYWORDS
        .contains(&stem)
        .then_some((stem, rest))
}

impl<I: Iterator<Item = String>> Iterator for NumberColumns<I> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let line = self.lines.next()?;
        if line.starts_with("XTENSION") {
            self.seen = 0;
            return Some(line);
        }
        let Some((stem, rest)) = placeholder_key(&line) else {
            return Some(line);
        };
        if stem == "TTYPE" {
            self.seen += 1;
        }
        let index = self.base + self.seen.saturating_sub(1);
        let key = format!("{stem}{index}");
        Some(format!("{key:<8}{rest}"))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.lines.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_counter_restarts_per_table() {
        let input = lines(&[
            "XTENSION= 'BINTABLE'",
            "TTYPE#  = 'a'",
            "TTYPE#  = 'b'",
            "XTENSION= 'BINTABLE'",
            "TTYPE#  = 'c'",
            "TUNIT#  = 'deg'",
        ]);
        let out: Vec<_> = number_columns(input, 1).collect();
        assert_eq!(out[1], "TTYPE1  = 'a'");
        assert_eq!(out[2], "TTYPE2  = 'b'");
        assert_eq!(out[4], "TTYPE1  = 'c'");
        assert_eq!(out[5], "TUNIT1  = 'deg'");
    }

    #[test]
    fn test_zero_base() {
        let input = lines(&["TTYPE#  = 'a'", "TDISP#  = 'F8.3'"]);
        let out: Vec<_> = number_columns(input, 0).collect();
        assert_eq!(out, vec!["TTYPE0  = 'a'", "TDISP0  = 'F8.3'"]);
    }

    #[test]
    fn test_equals_sign_stays_aligned() {
        let mut input = vec!["XTENSION= 'BINTABLE'".to_string()];
        input.extend((0..12).map(|i| format!("TTYPE#  = 'c{i}'")));
        let out: Vec<_> = number_columns(input, 1).collect();
        assert_eq!(out[12], "TTYPE12 = 'c11'");
        assert!(out.iter().skip(1).all(|l| &l[8..9] == "="));
    }

    #[test]
    fn test_other_lines_untouched() {
        let input = lines(&["", "/ # comment", "OBS_ID  = 1", "TTYPE#"]);
        let out: Vec<_> = number_columns(input.clone(), 1).collect();
        assert_eq!(out, input);
    }
}

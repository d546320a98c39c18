use chrono::NaiveDate;

/// Fold Spanish/Latin accents to their ASCII base letter. Other characters
/// pass through unchanged.
pub fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'Á' | 'À' | 'Ä' | 'Â' => 'A',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'É' | 'È' | 'Ë' | 'Ê' => 'E',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
            'ñ' => 'n',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}

/// Accent-folded, lowercased, whitespace-collapsed text with trailing
/// punctuation removed. Used as the comparison key for dedup.
pub fn normalize_text(text: &str) -> String {
    let folded = fold_accents(text).to_lowercase();
    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?'))
        .trim()
        .to_string()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

const STOPWORDS: &[&str] = &[
    "de", "del", "la", "las", "el", "los", "por", "para", "con", "sin", "en", "y", "o", "a",
    "no", "un", "una", "al", "especificado", "especificada", "otros", "otras", "tipo",
];

/// Content words of at least four letters, accent-folded and lowercased.
pub fn significant_words(text: &str) -> Vec<String> {
    normalize_text(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 4 && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d", "%d.%m.%Y"];

/// Parse a date in any of the layouts extraction commonly produces.
/// A trailing time component after an ISO date is ignored.
pub fn parse_date_lenient(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }
    // "2024-03-01T10:00:00" / "2024-03-01 10:00"
    trimmed
        .get(..10)
        .filter(|_| trimmed.len() > 10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
}

/// True only for the exact `YYYY-MM-DD` layout of a real calendar date.
pub fn is_iso_date(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
}

pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_spanish_accents() {
        assert_eq!(fold_accents("Audiometría Tonal"), "Audiometria Tonal");
        assert_eq!(fold_accents("NIÑO"), "NINO");
    }

    #[test]
    fn normalize_text_collapses_and_trims() {
        assert_eq!(
            normalize_text("  Hipoacusia   Neurosensorial Bilateral. "),
            "hipoacusia neurosensorial bilateral"
        );
    }

    #[test]
    fn significant_words_skip_stopwords() {
        assert_eq!(
            significant_words("Hipoacusia de tipo neurosensorial"),
            vec!["hipoacusia", "neurosensorial"]
        );
    }

    #[test]
    fn parses_common_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        for raw in ["2024-03-15", "15/03/2024", "15-03-2024", "2024/03/15", "2024-03-15T08:30:00"] {
            assert_eq!(parse_date_lenient(raw), Some(expected), "{raw}");
        }
        assert_eq!(parse_date_lenient("marzo 2024"), None);
        assert_eq!(parse_date_lenient(""), None);
    }

    #[test]
    fn iso_detection() {
        assert!(is_iso_date("2024-03-15"));
        assert!(!is_iso_date("15/03/2024"));
        assert!(!is_iso_date("2024-02-30"));
    }
}

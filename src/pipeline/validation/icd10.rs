use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Alert, AlertSeverity, AlertType, Diagnosis};

static RE_ICD10: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]\d{2}(?:\.\d)?$").unwrap());

/// Highest category number per chapter letter. `U` (provisional codes) is
/// not an accepted chapter.
fn chapter_max(letter: char) -> Option<u32> {
    match letter {
        'C' => Some(97),
        'D' => Some(89),
        'E' => Some(90),
        'H' => Some(95),
        'K' => Some(93),
        'P' => Some(96),
        'T' | 'Y' => Some(98),
        'A' | 'B' | 'F' | 'G' | 'I' | 'J' | 'L' | 'M' | 'N' | 'O' | 'Q' | 'R' | 'S' | 'V'
        | 'W' | 'X' | 'Z' => Some(99),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Icd10Problem {
    Missing,
    Malformed,
    UnknownChapter(char),
    OutOfRange { chapter: char, number: u32, max: u32 },
}

impl std::fmt::Display for Icd10Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "código ausente"),
            Self::Malformed => write!(f, "formato esperado letra + 2 dígitos [+ '.' + 1 dígito]"),
            Self::UnknownChapter(c) => write!(f, "capítulo '{c}' inexistente"),
            Self::OutOfRange {
                chapter,
                number,
                max,
            } => write!(f, "{chapter}{number:02} fuera del rango {chapter}00-{chapter}{max}"),
        }
    }
}

/// Check one code. Three-character codes without a subcategory ("N80") are valid.
pub fn check_icd10(code: &str) -> Result<(), Icd10Problem> {
    if code.trim().is_empty() {
        return Err(Icd10Problem::Missing);
    }
    if !RE_ICD10.is_match(code) {
        return Err(Icd10Problem::Malformed);
    }
    let mut chars = code.chars();
    let chapter = chars.next().ok_or(Icd10Problem::Malformed)?;
    let number: u32 = code
        .get(1..3)
        .and_then(|n| n.parse().ok())
        .ok_or(Icd10Problem::Malformed)?;
    let max = chapter_max(chapter).ok_or(Icd10Problem::UnknownChapter(chapter))?;
    if number > max {
        return Err(Icd10Problem::OutOfRange {
            chapter,
            number,
            max,
        });
    }
    Ok(())
}

/// One `formato_incorrecto` alert per malformed code. Diagnoses are never dropped here.
pub fn validate_icd10_codes(diagnoses: &[Diagnosis]) -> Vec<Alert> {
    diagnoses
        .iter()
        .enumerate()
        .filter_map(|(i, dx)| {
            check_icd10(&dx.icd10_code).err().map(|problem| {
                Alert::new(
                    AlertType::FormatIncorrect,
                    AlertSeverity::High,
                    format!("diagnoses[{i}].icd10Code"),
                    format!("Código CIE-10 inválido '{}': {problem}", dx.icd10_code),
                )
                .with_action("Corregir el código CIE-10 manualmente")
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_codes() {
        for code in ["H90.3", "N80", "J45.9", "M54.5", "Z00.0", "C97"] {
            assert_eq!(check_icd10(code), Ok(()), "{code}");
        }
    }

    #[test]
    fn malformed_codes() {
        assert_eq!(check_icd10("H9"), Err(Icd10Problem::Malformed));
        assert_eq!(check_icd10("H90.34"), Err(Icd10Problem::Malformed));
        assert_eq!(check_icd10("90.3"), Err(Icd10Problem::Malformed));
        assert_eq!(check_icd10("h90.3"), Err(Icd10Problem::Malformed));
        assert_eq!(check_icd10(""), Err(Icd10Problem::Missing));
    }

    #[test]
    fn chapter_ranges() {
        assert_eq!(
            check_icd10("H96"),
            Err(Icd10Problem::OutOfRange {
                chapter: 'H',
                number: 96,
                max: 95
            })
        );
        assert!(check_icd10("C98.1").is_err());
        assert!(check_icd10("D90").is_err());
        assert_eq!(check_icd10("U07.1"), Err(Icd10Problem::UnknownChapter('U')));
    }

    #[test]
    fn alerts_point_at_offending_index() {
        let diagnoses = vec![
            Diagnosis {
                icd10_code: "H90.3".into(),
                description: "Hipoacusia".into(),
                category: None,
                work_related: true,
                confidence: 0.95,
            },
            Diagnosis {
                icd10_code: "H96".into(),
                description: "Código inexistente".into(),
                category: None,
                work_related: false,
                confidence: 0.9,
            },
        ];
        let alerts = validate_icd10_codes(&diagnoses);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].field, "diagnoses[1].icd10Code");
        assert_eq!(alerts[0].alert_type, AlertType::FormatIncorrect);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
    }
}

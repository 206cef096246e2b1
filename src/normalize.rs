//! File name normalization.
//!
//! Turns arbitrary file and folder names into filesystem-safe names: runs of
//! punctuation become underscores and Cyrillic (including Ukrainian) letters are
//! transliterated to Latin.
//!
//! ```
//! use dirsort::normalize::normalize;
//!
//! assert_eq!(normalize("Фото (літо)"), "Foto _lito_");
//! ```

use regex::Regex;
use std::sync::LazyLock;

/// Matches maximal runs of characters that are neither letters, digits,
/// underscores nor whitespace.
///
/// `\w` is spelled out because the regex crate also counts combining marks and
/// connector punctuation as word characters. Those must be replaced too, or a
/// decomposed name such as "и\u{306}" keeps its non-ASCII accent.
static PUNCTUATION_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\p{L}\p{N}_\s]+").expect("punctuation pattern is valid")
});

/// Normalizes a name.
///
/// Punctuation is replaced first, one underscore per replaced character, and
/// only then is the transliteration table applied. Characters outside the
/// table pass through unchanged.
pub fn normalize(name: &str) -> String {
    let underscored = PUNCTUATION_RUN.replace_all(name, |caps: &regex::Captures| {
        "_".repeat(caps[0].chars().count())
    });

    let mut out = String::with_capacity(underscored.len());
    for ch in underscored.chars() {
        match transliterate(ch) {
            Some(latin) => out.push_str(latin),
            None => out.push(ch),
        }
    }
    out
}

/// Splits a file name into stem and extension.
///
/// The extension starts at the last dot, provided that dot is neither the first
/// nor the last character of the name. Otherwise the whole name is the stem and
/// the extension is empty. The returned extension keeps its leading dot.
///
/// ```
/// use dirsort::normalize::split_name;
///
/// assert_eq!(split_name("backup.tar.gz"), ("backup.tar", ".gz"));
/// assert_eq!(split_name(".bashrc"), (".bashrc", ""));
/// assert_eq!(split_name("trailing."), ("trailing.", ""));
/// ```
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx < name.len() - 1 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Normalizes a file stem or folder name that must not end up empty.
///
/// Names made only of hard and soft signs transliterate to nothing; they become
/// a single underscore instead, so `Ъ.zip` does not turn into the dotfile `.zip`.
pub fn normalize_stem(stem: &str) -> String {
    let normalized = normalize(stem);
    if normalized.is_empty() {
        "_".to_string()
    } else {
        normalized
    }
}

/// Normalizes the stem of a file name and keeps its extension verbatim.
pub fn normalize_file_name(name: &str) -> String {
    let (stem, extension) = split_name(name);
    format!("{}{}", normalize_stem(stem), extension)
}

fn transliterate(ch: char) -> Option<&'static str> {
    let latin = match ch {
        'а' => "a",
        'А' => "A",
        'б' => "b",
        'Б' => "B",
        'в' => "v",
        'В' => "V",
        'г' => "g",
        'Г' => "G",
        'д' => "d",
        'Д' => "D",
        'е' | 'ё' => "e",
        'Е' | 'Ё' => "E",
        'ж' => "j",
        'Ж' => "J",
        'з' => "z",
        'З' => "Z",
        'и' => "i",
        'И' => "I",
        'й' => "j",
        'Й' => "J",
        'к' => "k",
        'К' => "K",
        'л' => "l",
        'Л' => "L",
        'м' => "m",
        'М' => "M",
        'н' => "n",
        'Н' => "N",
        'о' => "o",
        'О' => "O",
        'п' => "p",
        'П' => "P",
        'р' => "r",
        'Р' => "R",
        'с' => "s",
        'С' => "S",
        'т' => "t",
        'Т' => "T",
        'у' => "u",
        'У' => "U",
        'ф' => "f",
        'Ф' => "F",
        'х' => "h",
        'Х' => "H",
        'ц' => "ts",
        'Ц' => "TS",
        'ч' => "ch",
        'Ч' => "CH",
        'ш' => "sh",
        'Ш' => "SH",
        'щ' => "sch",
        'Щ' => "SCH",
        'ъ' | 'Ъ' | 'ь' | 'Ь' => "",
        'ы' => "y",
        'Ы' => "Y",
        'э' => "e",
        'Э' => "E",
        'ю' => "yu",
        'Ю' => "YU",
        'я' => "ya",
        'Я' => "YA",
        // Ukrainian
        'є' => "je",
        'Є' => "JE",
        'і' => "i",
        'І' => "I",
        'ї' => "ji",
        'Ї' => "JI",
        'ґ' => "g",
        'Ґ' => "G",
        _ => return None,
    };
    Some(latin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_name_unchanged() {
        assert_eq!(normalize("holiday photo 2023"), "holiday photo 2023");
    }

    #[test]
    fn test_punctuation_run_keeps_length() {
        assert_eq!(normalize("a!!!b"), "a___b");
        assert_eq!(normalize("???"), "___");
        assert_eq!(normalize("x-y.z"), "x_y_z");
    }

    #[test]
    fn test_underscore_is_a_word_character() {
        assert_eq!(normalize("snake_case"), "snake_case");
    }

    #[test]
    fn test_transliterates_russian() {
        assert_eq!(normalize("Щука и ёж"), "SCHuka i ej");
        assert_eq!(normalize("цветы"), "tsvety");
    }

    #[test]
    fn test_transliterates_ukrainian() {
        assert_eq!(normalize("Їжак"), "JIjak");
        assert_eq!(normalize("ґанок"), "ganok");
        assert_eq!(normalize("Європа"), "JEvropa");
        assert_eq!(normalize("Іван"), "Ivan");
    }

    #[test]
    fn test_soft_and_hard_signs_removed() {
        assert_eq!(normalize("подъезд"), "podezd");
        assert_eq!(normalize("ДЕНЬ"), "DEN");
    }

    #[test]
    fn test_punctuation_replaced_before_transliteration() {
        assert_eq!(normalize("Фото (1)"), "Foto _1_");
    }

    #[test]
    fn test_combining_marks_replaced() {
        // "й" stored decomposed, as macOS file systems do.
        let out = normalize("\u{438}\u{306}");
        assert_eq!(out, "i_");
        assert!(out.is_ascii());
        assert_eq!(normalize("Мо\u{439}"), "Moj");
    }

    #[test]
    fn test_connector_punctuation_replaced() {
        assert_eq!(normalize("a\u{203F}b"), "a_b");
        assert_eq!(normalize("a\u{2040}\u{2054}b"), "a__b");
    }

    #[test]
    fn test_normalize_stem_never_empty() {
        assert_eq!(normalize_stem("Ъ"), "_");
        assert_eq!(normalize_stem("ьЬъ"), "_");
        assert_eq!(normalize_stem("день"), "den");
    }

    #[test]
    fn test_untabled_letters_pass_through() {
        assert_eq!(normalize("café"), "café");
    }

    #[test]
    fn test_output_is_ascii() {
        let inputs = [
            "Привіт, світ!",
            "Щ Ш Ч Ц",
            "звіт №5 (фінал)",
            "ъьЪЬ",
            "plain ascii",
        ];
        for input in inputs {
            let out = normalize(input);
            assert!(out.is_ascii(), "{out:?} should be ascii");
            assert!(out.chars().count() <= input.chars().count() * 3);
        }
        // Single-letter transliterations never grow the name.
        let out = normalize("Дом, милый дом");
        assert!(out.len() <= "Дом, милый дом".chars().count());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "Фото (літо) 2023!",
            "???",
            "report.final",
            "Щастя & радість",
            "already_clean name",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("photo.JPG"), ("photo", ".JPG"));
        assert_eq!(split_name("README"), ("README", ""));
        assert_eq!(split_name(".gitignore"), (".gitignore", ""));
        assert_eq!(split_name("a.b.c"), ("a.b", ".c"));
    }

    #[test]
    fn test_normalize_file_name_keeps_extension() {
        assert_eq!(normalize_file_name("Звіт (копія).PDF"), "Zvit _kopiya_.PDF");
        assert_eq!(normalize_file_name("???.xyz"), "___.xyz");
        assert_eq!(normalize_file_name(".bashrc"), "_bashrc");
        assert_eq!(normalize_file_name("Ъ.zip"), "_.zip");
        assert_eq!(normalize_file_name("ьЬ.txt"), "_.txt");
    }
}

// Rule stage of the gibberish classifier — cheap, deterministic checks that
// catch keyboard-mashing and repeated-character spam before any statistical
// or ML work runs.

const KEYBOARD_ROWS: [&str; 6] = [
    "qwertyuiop",
    "asdfghjkl",
    "zxcvbnm",
    "poiuytrewq",
    "lkjhgfdsa",
    "mnbvcxz",
];
const KEYBOARD_RUN_LEN: usize = 5;
const SAME_CHAR_RUN_LEN: usize = 5;
const MIN_LENGTH_FOR_VOWEL_CHECK: usize = 8;
const LOW_VOWEL_RATIO: f64 = 0.1;

pub fn check(text: &str, consonant_run_threshold: f64) -> Option<String> {
    let lower = text.to_lowercase();
    let letters: Vec<char> = lower.chars().filter(|c| c.is_ascii_alphabetic()).collect();

    if letters.is_empty() {
        return None;
    }

    if let Some(run) = longest_same_char_run(&letters) {
        if run >= SAME_CHAR_RUN_LEN {
            return Some(format!("repeated character run of length {run}"));
        }
    }

    if has_keyboard_row_pattern(&lower) {
        return Some("keyboard-row pattern".to_string());
    }

    if letters.len() > MIN_LENGTH_FOR_VOWEL_CHECK {
        let ratio = longest_consonant_run_ratio(&letters);
        if ratio >= consonant_run_threshold {
            return Some(format!("consonant-run ratio {ratio:.2} >= threshold"));
        }

        let vowel_ratio = vowel_ratio(&letters);
        if vowel_ratio < LOW_VOWEL_RATIO {
            return Some(format!("vowel ratio {vowel_ratio:.2} below threshold"));
        }
    }

    None
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn longest_same_char_run(letters: &[char]) -> Option<usize> {
    let mut best = 1;
    let mut current = 1;
    for window in letters.windows(2) {
        if window[0] == window[1] {
            current += 1;
            best = best.max(current);
        } else {
            current = 1;
        }
    }
    if letters.len() >= 2 {
        Some(best)
    } else {
        None
    }
}

fn longest_consonant_run_ratio(letters: &[char]) -> f64 {
    let mut best = 0usize;
    let mut current = 0usize;
    for &c in letters {
        if is_vowel(c) {
            current = 0;
        } else {
            current += 1;
            best = best.max(current);
        }
    }
    best as f64 / letters.len() as f64
}

fn vowel_ratio(letters: &[char]) -> f64 {
    let vowels = letters.iter().filter(|c| is_vowel(**c)).count();
    vowels as f64 / letters.len() as f64
}

fn has_keyboard_row_pattern(lower: &str) -> bool {
    let condensed: String = lower.chars().filter(|c| !c.is_whitespace()).collect();
    KEYBOARD_ROWS.iter().any(|row| {
        row.as_bytes()
            .windows(KEYBOARD_RUN_LEN)
            .any(|window| condensed.contains(std::str::from_utf8(window).unwrap()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_prose_passes() {
        assert!(check("This was a genuinely thoughtful and well-argued post.", 0.85).is_none());
    }

    #[test]
    fn keyboard_mash_is_flagged() {
        assert!(check("asdfghjkl asdfghjkl", 0.85).is_some());
    }

    #[test]
    fn repeated_character_is_flagged() {
        assert!(check("aaaaaaaaaa this is spam", 0.85).is_some());
    }

    #[test]
    fn consonant_run_is_flagged() {
        assert!(check("xkcdvbnmqwrt", 0.85).is_some());
    }

    #[test]
    fn low_vowel_ratio_with_length_is_flagged() {
        assert!(check("bcdfghjklmnpqrst", 0.85).is_some());
    }

    #[test]
    fn short_text_skips_vowel_check() {
        assert!(check("hmm", 0.85).is_none());
    }
}

//! Double metaphone phonetic codes.
//!
//! Encodes how a name sounds rather than how it is spelled, producing a
//! primary code and, for ambiguous spellings, a secondary one. Two names
//! are phonetically equal when their code sets intersect — "sheekago"
//! and "Chicago" both encode to `XKK`.

use crate::normalize::fold_diacritic;

const MAX_CODE_LEN: usize = 4;

/// Primary and optional secondary metaphone code of one string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneticCode {
    pub primary: String,
    pub secondary: Option<String>,
}

impl PhoneticCode {
    /// Phonetic equality: any non-empty code shared between the two.
    pub fn matches(&self, other: &PhoneticCode) -> bool {
        self.codes().any(|a| other.codes().any(|b| a == b))
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str())
            .chain(self.secondary.as_deref())
            .filter(|code| !code.is_empty())
    }
}

/// Compute the double metaphone code of `input`.
pub fn double_metaphone(input: &str) -> PhoneticCode {
    let word: Vec<char> = input
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_diacritic)
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let mut enc = Encoder::new(word);
    enc.run();
    enc.finish()
}

struct Encoder {
    word: Vec<char>,
    primary: String,
    secondary: String,
    slavo_germanic: bool,
}

impl Encoder {
    fn new(word: Vec<char>) -> Self {
        let text: String = word.iter().collect();
        let slavo_germanic =
            text.contains('W') || text.contains('K') || text.contains("CZ") || text.contains("WITZ");
        Self { word, primary: String::new(), secondary: String::new(), slavo_germanic }
    }

    fn at(&self, i: isize) -> char {
        if i < 0 {
            return '\0';
        }
        self.word.get(i as usize).copied().unwrap_or('\0')
    }

    fn is_vowel(&self, i: isize) -> bool {
        matches!(self.at(i), 'A' | 'E' | 'I' | 'O' | 'U' | 'Y')
    }

    fn string_at(&self, start: isize, length: usize, patterns: &[&str]) -> bool {
        if start < 0 {
            return false;
        }
        let start = start as usize;
        if start + length > self.word.len() {
            return false;
        }
        let window: String = self.word[start..start + length].iter().collect();
        patterns.iter().any(|p| *p == window)
    }

    fn add(&mut self, primary: &str, secondary: &str) {
        self.primary.push_str(primary);
        self.secondary.push_str(secondary);
    }

    fn add_both(&mut self, code: &str) {
        self.add(code, code);
    }

    fn last(&self) -> isize {
        self.word.len() as isize - 1
    }

    fn finish(mut self) -> PhoneticCode {
        self.primary.truncate(MAX_CODE_LEN);
        self.secondary.truncate(MAX_CODE_LEN);
        let secondary = if self.secondary.is_empty() || self.secondary == self.primary {
            None
        } else {
            Some(self.secondary)
        };
        PhoneticCode { primary: self.primary, secondary }
    }

    fn run(&mut self) {
        let len = self.word.len() as isize;
        let mut current: isize = 0;

        // Silent leading consonant pairs.
        if self.string_at(0, 2, &["GN", "KN", "PN", "WR", "PS"]) {
            current += 1;
        }
        // Initial X sounds like S (Xavier).
        if self.at(0) == 'X' {
            self.add_both("S");
            current += 1;
        }

        while (self.primary.len() < MAX_CODE_LEN || self.secondary.len() < MAX_CODE_LEN)
            && current < len
        {
            current = match self.at(current) {
                'A' | 'E' | 'I' | 'O' | 'U' | 'Y' => {
                    if current == 0 {
                        self.add_both("A");
                    }
                    current + 1
                }
                'B' => {
                    self.add_both("P");
                    current + if self.at(current + 1) == 'B' { 2 } else { 1 }
                }
                'C' => self.consume_c(current),
                'D' => {
                    if self.string_at(current, 2, &["DG"]) {
                        if self.string_at(current + 2, 1, &["I", "E", "Y"]) {
                            self.add_both("J");
                            current + 3
                        } else {
                            self.add_both("TK");
                            current + 2
                        }
                    } else {
                        self.add_both("T");
                        current + if self.string_at(current + 1, 1, &["D", "T"]) { 2 } else { 1 }
                    }
                }
                'F' => {
                    self.add_both("F");
                    current + if self.at(current + 1) == 'F' { 2 } else { 1 }
                }
                'G' => self.consume_g(current),
                'H' => {
                    // Only kept between vowels or at a vowel-leading start.
                    if (current == 0 || self.is_vowel(current - 1)) && self.is_vowel(current + 1) {
                        self.add_both("H");
                        current + 2
                    } else {
                        current + 1
                    }
                }
                'J' => self.consume_j(current),
                'K' => {
                    self.add_both("K");
                    current + if self.at(current + 1) == 'K' { 2 } else { 1 }
                }
                'L' => {
                    if self.at(current + 1) == 'L' {
                        // Spanish-style endings (cabrillo, gallegos).
                        let len3 = current == len - 3
                            && self.string_at(current - 1, 4, &["ILLO", "ILLA", "ALLE"]);
                        let alle = (self.string_at(self.last() - 1, 2, &["AS", "OS"])
                            || self.string_at(self.last(), 1, &["A", "O"]))
                            && self.string_at(current - 1, 4, &["ALLE"]);
                        if len3 || alle {
                            self.add("L", "");
                        } else {
                            self.add_both("L");
                        }
                        current + 2
                    } else {
                        self.add_both("L");
                        current + 1
                    }
                }
                'M' => {
                    self.add_both("M");
                    let silent_b = self.string_at(current - 1, 3, &["UMB"])
                        && (current + 1 == self.last()
                            || self.string_at(current + 2, 2, &["ER"]));
                    current + if silent_b || self.at(current + 1) == 'M' { 2 } else { 1 }
                }
                'N' => {
                    self.add_both("N");
                    current + if self.at(current + 1) == 'N' { 2 } else { 1 }
                }
                'P' => {
                    if self.at(current + 1) == 'H' {
                        self.add_both("F");
                        current + 2
                    } else {
                        self.add_both("P");
                        current + if self.string_at(current + 1, 1, &["P", "B"]) { 2 } else { 1 }
                    }
                }
                'Q' => {
                    self.add_both("K");
                    current + if self.at(current + 1) == 'Q' { 2 } else { 1 }
                }
                'R' => {
                    // French final -ier is usually silent.
                    if current == self.last()
                        && !self.slavo_germanic
                        && self.string_at(current - 2, 2, &["IE"])
                        && !self.string_at(current - 4, 2, &["ME", "MA"])
                    {
                        self.add("", "R");
                    } else {
                        self.add_both("R");
                    }
                    current + if self.at(current + 1) == 'R' { 2 } else { 1 }
                }
                'S' => self.consume_s(current),
                'T' => self.consume_t(current),
                'V' => {
                    self.add_both("F");
                    current + if self.at(current + 1) == 'V' { 2 } else { 1 }
                }
                'W' => self.consume_w(current),
                'X' => {
                    let silent_final = current == self.last()
                        && (self.string_at(current - 3, 3, &["IAU", "EAU"])
                            || self.string_at(current - 2, 2, &["AU", "OU"]));
                    if !silent_final {
                        self.add_both("KS");
                    }
                    current + if self.string_at(current + 1, 1, &["C", "X"]) { 2 } else { 1 }
                }
                'Z' => {
                    if self.at(current + 1) == 'H' {
                        self.add_both("J");
                        current + 2
                    } else {
                        if self.string_at(current + 1, 2, &["ZO", "ZI", "ZA"])
                            || (self.slavo_germanic && current > 0 && self.at(current - 1) != 'T')
                        {
                            self.add("S", "TS");
                        } else {
                            self.add_both("S");
                        }
                        current + if self.at(current + 1) == 'Z' { 2 } else { 1 }
                    }
                }
                _ => current + 1,
            };
        }
    }

    fn consume_c(&mut self, current: isize) -> isize {
        // Germanic -ACH- (macher, bacher).
        if current > 1
            && !self.is_vowel(current - 2)
            && self.string_at(current - 1, 3, &["ACH"])
            && self.at(current + 2) != 'I'
            && (self.at(current + 2) != 'E'
                || self.string_at(current - 2, 6, &["BACHER", "MACHER"]))
        {
            self.add_both("K");
            return current + 2;
        }
        if current == 0 && self.string_at(current, 6, &["CAESAR"]) {
            self.add_both("S");
            return current + 2;
        }
        if self.string_at(current, 4, &["CHIA"]) {
            self.add_both("K");
            return current + 2;
        }
        if self.string_at(current, 2, &["CH"]) {
            if current > 0 && self.string_at(current, 4, &["CHAE"]) {
                self.add("K", "X");
                return current + 2;
            }
            // Greek roots: chorus, chymera, charisma.
            if current == 0
                && (self.string_at(1, 5, &["HARAC", "HARIS"])
                    || self.string_at(1, 3, &["HOR", "HYM", "HIA", "HEM"]))
                && !self.string_at(0, 5, &["CHORE"])
            {
                self.add_both("K");
                return current + 2;
            }
            let germanic = self.string_at(0, 3, &["SCH"])
                || self.string_at(current - 2, 6, &["ORCHES", "ARCHIT", "ORCHID"])
                || self.string_at(current + 2, 1, &["T", "S"])
                || ((self.string_at(current - 1, 1, &["A", "O", "U", "E"]) || current == 0)
                    && self.string_at(current + 2, 1, &["L", "R", "N", "M", "B", "H", "F", "V", "W"]));
            if germanic {
                self.add_both("K");
            } else if current > 0 {
                if self.string_at(0, 2, &["MC"]) {
                    self.add_both("K");
                } else {
                    self.add("X", "K");
                }
            } else {
                self.add_both("X");
            }
            return current + 2;
        }
        if self.string_at(current, 2, &["CZ"]) && !self.string_at(current - 2, 4, &["WICZ"]) {
            self.add("S", "X");
            return current + 2;
        }
        if self.string_at(current + 1, 3, &["CIA"]) {
            self.add_both("X");
            return current + 3;
        }
        if self.string_at(current, 2, &["CC"]) && !(current == 1 && self.at(0) == 'M') {
            if self.string_at(current + 2, 1, &["I", "E", "H"])
                && !self.string_at(current + 2, 2, &["HU"])
            {
                if (current == 1 && self.at(0) == 'A')
                    || self.string_at(current - 1, 5, &["UCCEE", "UCCES"])
                {
                    self.add_both("KS");
                } else {
                    self.add_both("X");
                }
                return current + 3;
            }
            self.add_both("K");
            return current + 2;
        }
        if self.string_at(current, 2, &["CK", "CG", "CQ"]) {
            self.add_both("K");
            return current + 2;
        }
        if self.string_at(current, 2, &["CI", "CE", "CY"]) {
            if self.string_at(current, 3, &["CIO", "CIE", "CIA"]) {
                self.add("S", "X");
            } else {
                self.add_both("S");
            }
            return current + 2;
        }
        self.add_both("K");
        if self.string_at(current + 1, 1, &["C", "K", "Q"])
            && !self.string_at(current + 1, 2, &["CE", "CI"])
        {
            current + 2
        } else {
            current + 1
        }
    }

    fn consume_g(&mut self, current: isize) -> isize {
        if self.at(current + 1) == 'H' {
            if current > 0 && !self.is_vowel(current - 1) {
                self.add_both("K");
                return current + 2;
            }
            if current == 0 {
                if self.at(current + 2) == 'I' {
                    self.add_both("J");
                } else {
                    self.add_both("K");
                }
                return current + 2;
            }
            // Silent in -ough-, -aught-, etc.
            if (current > 1 && self.string_at(current - 2, 1, &["B", "H", "D"]))
                || (current > 2 && self.string_at(current - 3, 1, &["B", "H", "D"]))
                || (current > 3 && self.string_at(current - 4, 1, &["B", "H"]))
            {
                return current + 2;
            }
            if current > 2
                && self.at(current - 1) == 'U'
                && self.string_at(current - 3, 1, &["C", "G", "L", "R", "T"])
            {
                self.add_both("F"); // laugh, cough
            } else if current > 0 && self.at(current - 1) != 'I' {
                self.add_both("K");
            }
            return current + 2;
        }
        if self.at(current + 1) == 'N' {
            if current == 1 && self.is_vowel(0) && !self.slavo_germanic {
                self.add("KN", "N");
            } else if !self.string_at(current + 2, 2, &["EY"])
                && self.at(current + 1) != 'Y'
                && !self.slavo_germanic
            {
                self.add("N", "KN");
            } else {
                self.add_both("KN");
            }
            return current + 2;
        }
        if self.string_at(current + 1, 2, &["LI"]) && !self.slavo_germanic {
            self.add("KL", "L");
            return current + 2;
        }
        if current == 0
            && (self.at(current + 1) == 'Y'
                || self.string_at(
                    current + 1,
                    2,
                    &["ES", "EP", "EB", "EL", "EY", "IB", "IL", "IN", "IE", "EI", "ER"],
                ))
        {
            self.add("K", "J");
            return current + 2;
        }
        if (self.string_at(current + 1, 2, &["ER"]) || self.at(current + 1) == 'Y')
            && !self.string_at(0, 6, &["DANGER", "RANGER", "MANGER"])
            && !self.string_at(current - 1, 1, &["E", "I"])
            && !self.string_at(current - 1, 3, &["RGY", "OGY"])
        {
            self.add("K", "J");
            return current + 2;
        }
        if self.string_at(current + 1, 1, &["E", "I", "Y"])
            || self.string_at(current - 1, 4, &["AGGI", "OGGI"])
        {
            if self.string_at(0, 3, &["SCH"]) || self.string_at(current + 1, 2, &["ET"]) {
                self.add_both("K");
            } else {
                self.add("J", "K");
            }
            return current + 2;
        }
        self.add_both("K");
        current + if self.at(current + 1) == 'G' { 2 } else { 1 }
    }

    fn consume_j(&mut self, current: isize) -> isize {
        if self.string_at(current, 4, &["JOSE"]) {
            self.add_both("H");
            return current + 1;
        }
        if current == 0 {
            self.add("J", "A");
        } else if self.is_vowel(current - 1)
            && !self.slavo_germanic
            && matches!(self.at(current + 1), 'A' | 'O')
        {
            self.add("J", "H");
        } else if current == self.last() {
            self.add("J", "");
        } else if !self.string_at(current + 1, 1, &["L", "T", "K", "S", "N", "M", "B", "Z"])
            && !self.string_at(current - 1, 1, &["S", "K", "L"])
        {
            self.add_both("J");
        }
        current + if self.at(current + 1) == 'J' { 2 } else { 1 }
    }

    fn consume_s(&mut self, current: isize) -> isize {
        // Silent as in island, isle.
        if self.string_at(current - 1, 3, &["ISL", "YSL"]) {
            return current + 1;
        }
        if current == 0 && self.string_at(current, 5, &["SUGAR"]) {
            self.add("X", "S");
            return current + 1;
        }
        if self.string_at(current, 2, &["SH"]) {
            if self.string_at(current + 1, 4, &["HEIM", "HOEK", "HOLM", "HOLZ"]) {
                self.add_both("S");
            } else {
                self.add_both("X");
            }
            return current + 2;
        }
        if self.string_at(current, 3, &["SIO", "SIA"]) || self.string_at(current, 4, &["SIAN"]) {
            if self.slavo_germanic {
                self.add_both("S");
            } else {
                self.add("S", "X");
            }
            return current + 3;
        }
        if (current == 0 && self.string_at(current + 1, 1, &["M", "N", "L", "W"]))
            || self.string_at(current + 1, 1, &["Z"])
        {
            self.add("S", "X");
            return current + if self.at(current + 1) == 'Z' { 2 } else { 1 };
        }
        if self.string_at(current, 2, &["SC"]) {
            if self.at(current + 2) == 'H' {
                if self.string_at(current + 3, 2, &["OO", "ER", "EN", "UY", "ED", "EM"]) {
                    if self.string_at(current + 3, 2, &["ER", "EN"]) {
                        self.add("X", "SK");
                    } else {
                        self.add_both("SK");
                    }
                } else if current == 0 && !self.is_vowel(3) && self.at(3) != 'W' {
                    self.add("X", "S");
                } else {
                    self.add_both("X");
                }
                return current + 3;
            }
            if self.string_at(current + 2, 1, &["I", "E", "Y"]) {
                self.add_both("S");
            } else {
                self.add_both("SK");
            }
            return current + 3;
        }
        // French final -ais, -ois.
        if current == self.last() && self.string_at(current - 2, 2, &["AI", "OI"]) {
            self.add("", "S");
        } else {
            self.add_both("S");
        }
        current + if self.string_at(current + 1, 1, &["S", "Z"]) { 2 } else { 1 }
    }

    fn consume_t(&mut self, current: isize) -> isize {
        if self.string_at(current, 4, &["TION"]) {
            self.add_both("X");
            return current + 3;
        }
        if self.string_at(current, 3, &["TIA", "TCH"]) {
            self.add_both("X");
            return current + 3;
        }
        if self.string_at(current, 2, &["TH"]) || self.string_at(current, 3, &["TTH"]) {
            if self.string_at(current + 2, 2, &["OM", "AM"]) || self.string_at(0, 3, &["SCH"]) {
                self.add_both("T"); // thomas
            } else {
                self.add("0", "T");
            }
            return current + 2;
        }
        self.add_both("T");
        current + if self.string_at(current + 1, 1, &["T", "D"]) { 2 } else { 1 }
    }

    fn consume_w(&mut self, current: isize) -> isize {
        if self.string_at(current, 2, &["WR"]) {
            self.add_both("R");
            return current + 2;
        }
        if current == 0 && (self.is_vowel(current + 1) || self.string_at(current, 2, &["WH"])) {
            if self.is_vowel(current + 1) {
                self.add("A", "F");
            } else {
                self.add_both("A");
            }
        }
        if (current == self.last() && self.is_vowel(current - 1))
            || self.string_at(current - 1, 5, &["EWSKI", "EWSKY", "OWSKI", "OWSKY"])
            || self.string_at(0, 3, &["SCH"])
        {
            self.add("", "F");
            return current + 1;
        }
        if self.string_at(current, 4, &["WICZ", "WITZ"]) {
            self.add("TS", "FX");
            return current + 4;
        }
        current + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chicago_and_sheekago_sound_alike() {
        let chicago = double_metaphone("Chicago");
        let sheekago = double_metaphone("sheekago");
        assert_eq!(chicago.primary, "XKK");
        assert_eq!(chicago.secondary, None);
        assert_eq!(sheekago.primary, "XKK");
        assert!(chicago.matches(&sheekago));
    }

    #[test]
    fn test_smith_smyth() {
        let smith = double_metaphone("Smith");
        let smyth = double_metaphone("Smyth");
        assert_eq!(smith.primary, "SM0");
        assert_eq!(smith.secondary.as_deref(), Some("XMT"));
        assert!(smith.matches(&smyth));
    }

    #[test]
    fn test_paris() {
        let code = double_metaphone("Paris");
        assert_eq!(code.primary, "PRS");
        assert_eq!(code.secondary, None);
    }

    #[test]
    fn test_accents_fold_before_encoding() {
        assert!(double_metaphone("Orléans").matches(&double_metaphone("Orleans")));
    }

    #[test]
    fn test_unrelated_names_do_not_match() {
        assert!(!double_metaphone("Paris").matches(&double_metaphone("Tokyo")));
    }

    #[test]
    fn test_empty_input_matches_nothing() {
        let empty = double_metaphone("");
        assert_eq!(empty.primary, "");
        assert!(!empty.matches(&empty));
        assert!(!empty.matches(&double_metaphone("Paris")));
    }

    #[test]
    fn test_code_caps_at_four() {
        let code = double_metaphone("Castelnaudary");
        assert!(code.primary.len() <= 4);
    }
}

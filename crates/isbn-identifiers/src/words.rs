//! Recover ISBNs spelled out in running text
//!
//! Handles spoken-style references such as "nine seven eight zero three ..."
//! as well as numerals split across words ("978 0 306 40615 7"). Digits are
//! collected into a window of at most 13; any word that is not a numeral
//! resets it, so there is no gap-tolerant matching. The window is checked
//! as an ISBN-10 when it reaches ten digits and as an ISBN-13 from thirteen
//! on, so the tail of a longer digit run is never reported.

use std::collections::VecDeque;
use std::str::Chars;

use crate::codec;
use crate::identifier::Identifier;

const MAX_WINDOW: usize = 13;
const ISBN10_LEN: usize = 10;

/// What a single word contributes to the digit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordClass<'a> {
    /// One spelled-out digit or the check symbol `X`
    Symbol(char),
    /// A run of numerals, possibly ending in `X`
    Numerals(&'a str),
    /// Anything else, including separator words
    Break,
}

fn classify(word: &str) -> WordClass<'_> {
    let symbol = match word.to_ascii_lowercase().as_str() {
        "zero" | "oh" | "nought" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "x" | "ex" => 'X',
        // Separator words end a candidate like any other word
        "dash" | "hyphen" | "point" | "dot" | "comma" | "slash" | "and" => return WordClass::Break,
        _ => return numerals(word),
    };
    WordClass::Symbol(symbol)
}

fn numerals(word: &str) -> WordClass<'_> {
    let body = word
        .strip_suffix('X')
        .or_else(|| word.strip_suffix('x'))
        .unwrap_or(word);
    if !body.is_empty() && body.chars().all(|c| c.is_ascii_digit()) {
        WordClass::Numerals(word)
    } else {
        WordClass::Break
    }
}

/// Lazy iterator over the identifiers found in a text.
///
/// Cloning the extractor restarts scanning from the clone's position;
/// [`extract_from_words`] always starts from the beginning of the text.
#[derive(Debug, Clone)]
pub struct WordExtractor<'a> {
    rest: &'a str,
    pending: Chars<'a>,
    window: VecDeque<char>,
    finished: bool,
}

/// Scan `text` for identifiers written as number words or numerals.
pub fn extract_from_words(text: &str) -> WordExtractor<'_> {
    WordExtractor::new(text)
}

impl<'a> WordExtractor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            rest: text,
            pending: "".chars(),
            window: VecDeque::with_capacity(MAX_WINDOW),
            finished: false,
        }
    }

    fn next_word(&mut self) -> Option<&'a str> {
        let start = self.rest.find(|c: char| c.is_alphanumeric())?;
        let tail = &self.rest[start..];
        let end = tail
            .find(|c: char| !c.is_alphanumeric())
            .unwrap_or(tail.len());
        self.rest = &tail[end..];
        Some(&tail[..end])
    }

    /// Push one symbol; returns an identifier when the window completes one.
    ///
    /// The window is tested once as an ISBN-10 when it reaches ten symbols
    /// and as an ISBN-13 on every push once it holds thirteen.
    fn push(&mut self, symbol: char) -> Option<Identifier> {
        if self.window.len() == MAX_WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(symbol);

        let found = match self.window.len() {
            ISBN10_LEN => self.candidate(),
            // Plain EAN-13s are not book identifiers
            MAX_WINDOW => self.candidate().filter(Identifier::is_bookland),
            _ => None,
        };
        if found.is_some() || symbol == 'X' {
            // X can only ever close an ISBN-10
            self.window.clear();
        }
        found
    }

    fn candidate(&self) -> Option<Identifier> {
        let candidate: String = self.window.iter().collect();
        codec::validate(&candidate).ok()
    }
}

impl Iterator for WordExtractor<'_> {
    type Item = Identifier;

    fn next(&mut self) -> Option<Identifier> {
        if self.finished {
            return None;
        }
        loop {
            if let Some(c) = self.pending.next() {
                let symbol = if c == 'x' { 'X' } else { c };
                if let Some(id) = self.push(symbol) {
                    return Some(id);
                }
                continue;
            }

            let Some(word) = self.next_word() else {
                self.finished = true;
                self.window.clear();
                return None;
            };

            match classify(word) {
                WordClass::Symbol(symbol) => {
                    if let Some(id) = self.push(symbol) {
                        return Some(id);
                    }
                }
                WordClass::Numerals(digits) => self.pending = digits.chars(),
                WordClass::Break => self.window.clear(),
            }
        }
    }
}

impl std::iter::FusedIterator for WordExtractor<'_> {}

use std::str::CharIndices;

use tantivy::tokenizer::{LowerCaser, TextAnalyzer, Token, TokenStream, Tokenizer};

/// Single-character tokens carry no signal for ranking.
const MIN_TOKEN_CHARS: usize = 2;

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Emits maximal runs of word characters (alphanumerics and `_`), so
/// `snake_case` and `e_mail` stay whole.
#[derive(Clone, Default)]
pub struct WordTokenizer {
    token: Token,
}

pub struct WordTokenStream<'a> {
    text: &'a str,
    chars: CharIndices<'a>,
    token: &'a mut Token,
}

impl Tokenizer for WordTokenizer {
    type TokenStream<'a> = WordTokenStream<'a>;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> WordTokenStream<'a> {
        self.token = Token::default();
        WordTokenStream { text, chars: text.char_indices(), token: &mut self.token }
    }
}

impl WordTokenStream<'_> {
    fn word_end(&mut self) -> usize {
        (&mut self.chars)
            .find(|&(_, c)| !is_word_char(c))
            .map_or(self.text.len(), |(offset, _)| offset)
    }
}

impl TokenStream for WordTokenStream<'_> {
    fn advance(&mut self) -> bool {
        self.token.text.clear();
        self.token.position = self.token.position.wrapping_add(1);
        while let Some((start, c)) = self.chars.next() {
            if is_word_char(c) {
                let end = self.word_end();
                self.token.offset_from = start;
                self.token.offset_to = end;
                self.token.text.push_str(&self.text[start..end]);
                return true;
            }
        }
        false
    }

    fn token(&self) -> &Token { self.token }
    fn token_mut(&mut self) -> &mut Token { self.token }
}

/// Word runs, lowercased.
pub fn build_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(WordTokenizer::default()).filter(LowerCaser).build()
}

pub fn tokenize_with(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
    let mut stream = analyzer.token_stream(text);
    let mut tokens = Vec::new();
    while stream.advance() {
        let token = &stream.token().text;
        if token.chars().count() >= MIN_TOKEN_CHARS { tokens.push(token.clone()); }
    }
    tokens
}

pub fn tokenize(text: &str) -> Vec<String> {
    tokenize_with(&mut build_analyzer(), text)
}

//! Strategy list parser.
//!
//! Grammar:
//!
//! ```text
//! list     := strategy ( ',' strategy )*
//! strategy := NAME [ '(' number ( ',' number )* ')' ]
//! NAME     := MA_CROSSOVER | RSI | BOLLINGER | SIGNAL_COLUMN   (case-insensitive)
//! ```
//!
//! Omitted parameters take the strategy defaults.

use crate::domain::error::ParseError;
use crate::domain::strategy::Strategy;

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn error(&self, message: impl Into<String>, position: usize) -> ParseError {
        ParseError {
            message: message.into(),
            position,
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(self.error(format!("expected '{}', found '{}'", expected, ch), self.pos)),
            None => Err(self.error(format!("expected '{}', found end of input", expected), self.pos)),
        }
    }

    fn parse_word(&mut self) -> String {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut has_dot = false;
        let mut digits = 0;

        if self.peek() == Some('-') {
            self.advance();
        }

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(self.error("expected number", start));
        }

        let num_str = &self.input[start..self.pos];
        num_str
            .parse::<f64>()
            .map_err(|_| self.error(format!("invalid number: {}", num_str), start))
    }

    /// Optional parenthesized argument list, each with its start offset.
    fn parse_args(&mut self) -> Result<Vec<(f64, usize)>, ParseError> {
        self.skip_whitespace();
        if self.peek() != Some('(') {
            return Ok(vec![]);
        }
        self.advance();

        let mut args = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.advance();
            return Ok(args);
        }

        loop {
            self.skip_whitespace();
            let position = self.pos;
            args.push((self.parse_number()?, position));
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.advance();
                }
                _ => break,
            }
        }
        self.expect_char(')')?;
        Ok(args)
    }

    fn parse_strategy(&mut self) -> Result<Strategy, ParseError> {
        self.skip_whitespace();
        let name_pos = self.pos;
        let name = self.parse_word();
        if name.is_empty() {
            let found = self
                .peek()
                .map(|c| format!("'{}'", c))
                .unwrap_or_else(|| "end of input".to_string());
            return Err(self.error(format!("expected strategy name, found {}", found), name_pos));
        }

        let args_pos = self.pos;
        let args = self.parse_args()?;

        match name.to_uppercase().as_str() {
            "MA_CROSSOVER" | "MA" => {
                let (short_period, long_period) = match args.as_slice() {
                    [] => (10, 50),
                    [short, long] => (self.period(*short)?, self.period(*long)?),
                    _ => return Err(self.arity(&name, "0 or 2", args_pos)),
                };
                if short_period >= long_period {
                    return Err(self.error(
                        "short period must be less than long period",
                        args_pos,
                    ));
                }
                Ok(Strategy::MaCrossover {
                    short_period,
                    long_period,
                })
            }
            "RSI" => {
                let (period, oversold, overbought) = match args.as_slice() {
                    [] => (14, 30.0, 70.0),
                    [period] => (self.period(*period)?, 30.0, 70.0),
                    [period, low, high] => (self.period(*period)?, low.0, high.0),
                    _ => return Err(self.arity(&name, "0, 1 or 3", args_pos)),
                };
                if !(0.0..=100.0).contains(&oversold)
                    || !(0.0..=100.0).contains(&overbought)
                    || oversold >= overbought
                {
                    return Err(self.error(
                        "RSI thresholds must satisfy 0 <= oversold < overbought <= 100",
                        args_pos,
                    ));
                }
                Ok(Strategy::RsiMeanReversion {
                    period,
                    oversold,
                    overbought,
                })
            }
            "BOLLINGER" | "BB" => {
                let (period, std_dev) = match args.as_slice() {
                    [] => (20, 2.0),
                    [period] => (self.period(*period)?, 2.0),
                    [period, mult] => (self.period(*period)?, mult.0),
                    _ => return Err(self.arity(&name, "0, 1 or 2", args_pos)),
                };
                if period < 2 {
                    return Err(self.error("Bollinger period must be at least 2", args_pos));
                }
                if std_dev <= 0.0 {
                    return Err(self.error("Bollinger multiplier must be positive", args_pos));
                }
                Ok(Strategy::BollingerBreakout { period, std_dev })
            }
            "SIGNAL_COLUMN" | "SIGNALS" => {
                if !args.is_empty() {
                    return Err(self.arity(&name, "0", args_pos));
                }
                Ok(Strategy::SignalColumn)
            }
            _ => Err(self.error(format!("unknown strategy '{}'", name), name_pos)),
        }
    }

    fn period(&self, (value, position): (f64, usize)) -> Result<usize, ParseError> {
        if value < 1.0 || value.fract() != 0.0 {
            return Err(self.error(
                format!("period must be a positive integer, found {}", value),
                position,
            ));
        }
        Ok(value as usize)
    }

    fn arity(&self, name: &str, expected: &str, position: usize) -> ParseError {
        self.error(
            format!("{} takes {} parameters", name.to_uppercase(), expected),
            position,
        )
    }

    fn parse_list(&mut self) -> Result<Vec<Strategy>, ParseError> {
        let mut strategies = vec![self.parse_strategy()?];
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.advance();
                    strategies.push(self.parse_strategy()?);
                }
                None => return Ok(strategies),
                Some(ch) => {
                    return Err(self.error(format!("unexpected '{}'", ch), self.pos));
                }
            }
        }
    }
}

/// Parse a single strategy, e.g. `RSI(14, 30, 70)`.
pub fn parse(input: &str) -> Result<Strategy, ParseError> {
    let mut parser = Parser::new(input);
    let strategy = parser.parse_strategy()?;
    parser.skip_whitespace();
    if let Some(ch) = parser.peek() {
        return Err(parser.error(format!("unexpected '{}'", ch), parser.pos));
    }
    Ok(strategy)
}

/// Parse a comma-separated strategy list, e.g. `MA_CROSSOVER(5,20), BOLLINGER`.
pub fn parse_list(input: &str) -> Result<Vec<Strategy>, ParseError> {
    Parser::new(input).parse_list()
}

//! Keypad calculator with chained, left-to-right evaluation.
//!
//! The calculator is a pure reducer: every keystroke is a [`Key`] and
//! [`transition`] maps the previous [`CalculatorState`] to the next one.
//! [`Calculator`] wraps the reducer for callers that prefer to hold mutable
//! state and press keys one at a time.

use anyhow::{Result, anyhow};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    /// Glyph used when rendering the expression.
    pub fn glyph(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '×',
            Operator::Divide => '÷',
        }
    }

    /// Applies the operator. Dividing by zero yields zero.
    pub fn apply(&self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Operator::Add => lhs + rhs,
            Operator::Subtract => lhs - rhs,
            Operator::Multiply => lhs * rhs,
            Operator::Divide => {
                if rhs != 0.0 {
                    lhs / rhs
                } else {
                    0.0
                }
            }
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

impl TryFrom<char> for Operator {
    type Error = anyhow::Error;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            '+' => Ok(Operator::Add),
            '-' => Ok(Operator::Subtract),
            '*' | 'x' | 'X' | '×' => Ok(Operator::Multiply),
            '/' | '÷' => Ok(Operator::Divide),
            _ => Err(anyhow!("Invalid operator: {}", c)),
        }
    }
}

/// A single keypad event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit(u8),
    Decimal,
    Backspace,
    Clear,
    Operator(Operator),
    Equals,
}

impl TryFrom<char> for Key {
    type Error = anyhow::Error;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            '0'..='9' => Ok(Key::Digit(c as u8 - b'0')),
            '.' => Ok(Key::Decimal),
            '<' => Ok(Key::Backspace),
            'c' | 'C' => Ok(Key::Clear),
            '=' => Ok(Key::Equals),
            other => Operator::try_from(other)
                .map(Key::Operator)
                .map_err(|_| anyhow!("Invalid key: {}", c)),
        }
    }
}

/// A sequence of keystrokes, e.g. `"5+3+2="`. Whitespace is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySequence(pub Vec<Key>);

impl FromStr for KeySequence {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .map(Key::try_from)
            .collect::<Result<Vec<_>>>()
            .map(KeySequence)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculatorState {
    /// Number being typed. Never empty.
    pub input_value: String,
    /// Left operand captured by an operator press; `None` means nothing is pending.
    pub previous_value: Option<String>,
    pub operator: Option<Operator>,
    /// Set right after an operator or equals press, before the next digit.
    pub waiting_for_new_number: bool,
}

impl Default for CalculatorState {
    fn default() -> Self {
        CalculatorState {
            input_value: "0".to_string(),
            previous_value: None,
            operator: None,
            waiting_for_new_number: false,
        }
    }
}

/// Lenient float parsing: anything unparsable (a lone `.`, `-`, empty) is `0`.
pub fn parse_operand(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Rounds half away from zero at the eighth decimal place.
fn round_to_8_places(value: f64) -> f64 {
    // Exact ties are precisely the odd multiples of 2^-9.
    let ticks = value * 512.0;
    if ticks.fract() == 0.0 && ticks % 2.0 != 0.0 {
        return (value * 1e8).round() / 1e8;
    }
    format!("{value:.8}").parse::<f64>().unwrap_or(0.0)
}

/// Rounds to 8 decimal places and renders without trailing zero noise,
/// so `0.1 + 0.2` becomes `"0.3"` rather than `"0.30000000000000004"`.
pub fn normalize_result(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = round_to_8_places(value);
    if rounded == 0.0 {
        // Avoid rendering negative zero.
        return "0".to_string();
    }
    rounded.to_string()
}

impl CalculatorState {
    fn pending(&self) -> Option<(&str, Operator)> {
        match (&self.previous_value, self.operator) {
            (Some(prev), Some(op)) => Some((prev.as_str(), op)),
            _ => None,
        }
    }

    fn resolve(previous: &str, op: Operator, input: &str) -> String {
        normalize_result(op.apply(parse_operand(previous), parse_operand(input)))
    }

    /// Expression as typed so far, e.g. `12+3` or `12×` while waiting.
    pub fn display_expression(&self) -> String {
        match self.pending() {
            Some((prev, op)) if self.waiting_for_new_number => format!("{prev}{op}"),
            Some((prev, op)) => format!("{prev}{op}{}", self.input_value),
            None => self.input_value.clone(),
        }
    }

    /// The value the pending operation would produce if resolved now.
    pub fn effective_value(&self) -> String {
        match self.pending() {
            Some((prev, _)) if self.waiting_for_new_number => prev.to_string(),
            Some((prev, op)) => Self::resolve(prev, op, &self.input_value),
            None => self.input_value.clone(),
        }
    }

    /// Resolves any pending operation and returns the resulting state along
    /// with the final value. Without a pending operation the state is
    /// unchanged and the current input is returned.
    pub fn complete_pending(self) -> (CalculatorState, String) {
        match self.pending() {
            Some((prev, op)) => {
                let result = Self::resolve(prev, op, &self.input_value);
                let next = CalculatorState {
                    input_value: result.clone(),
                    previous_value: None,
                    operator: None,
                    waiting_for_new_number: true,
                };
                (next, result)
            }
            None => {
                let value = self.input_value.clone();
                (self, value)
            }
        }
    }
}

/// Computes the state that follows `key`.
pub fn transition(state: CalculatorState, key: Key) -> CalculatorState {
    match key {
        Key::Digit(d) => {
            let Some(digit) = char::from_digit(u32::from(d), 10) else {
                return state;
            };
            if state.waiting_for_new_number {
                CalculatorState {
                    input_value: digit.to_string(),
                    waiting_for_new_number: false,
                    ..state
                }
            } else if state.input_value == "0" {
                CalculatorState {
                    input_value: digit.to_string(),
                    ..state
                }
            } else {
                let mut input_value = state.input_value;
                input_value.push(digit);
                CalculatorState {
                    input_value,
                    ..state
                }
            }
        }
        Key::Decimal => {
            if state.waiting_for_new_number {
                CalculatorState {
                    input_value: "0.".to_string(),
                    waiting_for_new_number: false,
                    ..state
                }
            } else if state.input_value.contains('.') {
                state
            } else {
                let mut input_value = state.input_value;
                input_value.push('.');
                CalculatorState {
                    input_value,
                    ..state
                }
            }
        }
        Key::Backspace => {
            let mut input_value = state.input_value;
            input_value.pop();
            if input_value.is_empty() {
                input_value.push('0');
            }
            CalculatorState {
                input_value,
                ..state
            }
        }
        Key::Clear => CalculatorState::default(),
        Key::Operator(op) => {
            let folded = match state.pending() {
                Some((prev, pending_op)) if !state.waiting_for_new_number => {
                    Some(CalculatorState::resolve(prev, pending_op, &state.input_value))
                }
                _ => None,
            };
            match folded {
                Some(result) => CalculatorState {
                    input_value: result.clone(),
                    previous_value: Some(result),
                    operator: Some(op),
                    waiting_for_new_number: true,
                },
                None => CalculatorState {
                    previous_value: Some(state.input_value.clone()),
                    operator: Some(op),
                    waiting_for_new_number: true,
                    ..state
                },
            }
        }
        Key::Equals => {
            if state.pending().is_none() {
                return state;
            }
            state.complete_pending().0
        }
    }
}

/// Stateful front end over [`transition`].
#[derive(Debug, Clone, Default)]
pub struct Calculator {
    state: CalculatorState,
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CalculatorState {
        &self.state
    }

    pub fn press(&mut self, key: Key) {
        let state = std::mem::take(&mut self.state);
        self.state = transition(state, key);
    }

    pub fn press_all(&mut self, keys: &KeySequence) {
        for key in &keys.0 {
            self.press(*key);
        }
    }

    pub fn press_digit(&mut self, digit: u8) {
        self.press(Key::Digit(digit));
    }

    pub fn press_decimal(&mut self) {
        self.press(Key::Decimal);
    }

    pub fn press_backspace(&mut self) {
        self.press(Key::Backspace);
    }

    pub fn press_clear(&mut self) {
        self.press(Key::Clear);
    }

    pub fn press_operator(&mut self, op: Operator) {
        self.press(Key::Operator(op));
    }

    pub fn press_equals(&mut self) {
        self.press(Key::Equals);
    }

    /// Same resolution as equals, but hands the final value back to the caller.
    pub fn complete_pending_calculation(&mut self) -> String {
        let state = std::mem::take(&mut self.state);
        let (next, value) = state.complete_pending();
        self.state = next;
        value
    }

    pub fn input_value(&self) -> &str {
        &self.state.input_value
    }

    pub fn display_expression(&self) -> String {
        self.state.display_expression()
    }

    pub fn effective_value(&self) -> String {
        self.state.effective_value()
    }
}

//! The record a `repeat` directive exposes for each iteration under `repeat/<name>`.

use crate::error::TalesError;
use crate::value::{TalesObject, Value};
use zpt_dom::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub struct RepetitionInfo {
    pub name: String,
    pub index: usize,
    pub count: usize,
    pub item: Value,
    /// The cloned element this iteration renders into.
    pub element: Option<NodeId>,
}

impl RepetitionInfo {
    pub fn new(name: impl Into<String>, index: usize, count: usize, item: Value) -> Self {
        Self {
            name: name.into(),
            index,
            count,
            item,
            element: None,
        }
    }

    pub fn with_element(mut self, element: NodeId) -> Self {
        self.element = Some(element);
        self
    }

    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// `a` for the first item, `z` for the 26th, then `aa`, `ab` and so on.
    pub fn letter(&self) -> String {
        let mut n = self.index + 1;
        let mut letters = Vec::new();
        while n > 0 {
            n -= 1;
            letters.push(char::from(b'a' + (n % 26) as u8));
            n /= 26;
        }
        letters.iter().rev().collect()
    }

    /// Upper-case roman numeral of `number()`. Falls back to digits outside 1..=3999.
    pub fn roman(&self) -> String {
        to_roman(self.number())
    }
}

fn to_roman(number: usize) -> String {
    const NUMERALS: [(usize, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    if number == 0 || number > 3999 {
        return number.to_string();
    }
    let mut remaining = number;
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while remaining >= value {
            out.push_str(numeral);
            remaining -= value;
        }
    }
    out
}

impl TalesObject for RepetitionInfo {
    fn member(&self, name: &str) -> Result<Option<Value>, TalesError> {
        let found = match name {
            "index" => Value::from(self.index),
            "number" => Value::from(self.number()),
            "even" => Value::Bool(self.index % 2 == 0),
            "odd" => Value::Bool(self.index % 2 != 0),
            "start" => Value::Bool(self.index == 0),
            "end" => Value::Bool(self.index + 1 == self.count),
            "length" => Value::from(self.count),
            "letter" => Value::from(self.letter()),
            "Letter" => Value::from(self.letter().to_uppercase()),
            "roman" => Value::from(self.roman().to_lowercase()),
            "Roman" => Value::from(self.roman()),
            "name" => Value::from(self.name.as_str()),
            "item" => self.item.clone(),
            _ => return Ok(None),
        };
        Ok(Some(found))
    }

    fn to_text(&self) -> String {
        self.number().to_string()
    }

    fn type_name(&self) -> &str {
        "repetition"
    }
}

//! Render context exposed to check message templates

use std::collections::BTreeSet;

use super::template::TemplateHelpers;
use crate::error::TemplateError;
use crate::units::Unit;

/// Snapshot of a check's observations, borrowed for rendering
pub struct CheckContext<'a> {
    pub items: &'a BTreeSet<String>,
    pub count: i64,
    pub value: f32,
    pub unit: Unit,
}

impl CheckContext<'_> {
    /// `"1 node"`, `"3 nodes"`
    pub fn items(&self, singular: &str) -> String {
        plural(self.items.len() as i64, singular)
    }

    /// `"1 instance is"`, `"2 instances are"`
    pub fn items_with_to_be(&self, singular: &str) -> String {
        let verb = if self.items.len() > 1 { "are" } else { "is" };
        format!("{} {}", self.items(singular), verb)
    }

    /// `"1 replica has"`, `"2 replicas have"`
    pub fn items_with_have(&self, singular: &str) -> String {
        let verb = if self.items.len() > 1 { "have" } else { "has" };
        format!("{} {}", self.items(singular), verb)
    }

    pub fn count(&self, singular: &str) -> String {
        plural(self.count, singular)
    }

    pub fn value(&self) -> String {
        self.unit.format_value(self.value)
    }
}

impl TemplateHelpers for CheckContext<'_> {
    fn call(&self, helper: &str, args: &[String]) -> Result<String, TemplateError> {
        let noun = || match args {
            [noun] => Ok(noun.as_str()),
            _ => Err(TemplateError::Arity {
                helper: helper.to_string(),
                want: 1,
                got: args.len(),
            }),
        };
        match helper {
            "Items" => Ok(self.items(noun()?)),
            "ItemsWithToBe" => Ok(self.items_with_to_be(noun()?)),
            "ItemsWithHave" => Ok(self.items_with_have(noun()?)),
            "Count" => Ok(self.count(noun()?)),
            "Value" if args.is_empty() => Ok(self.value()),
            "Value" => Err(TemplateError::Arity {
                helper: helper.to_string(),
                want: 0,
                got: args.len(),
            }),
            other => Err(TemplateError::UnknownHelper(other.to_string())),
        }
    }
}

/// Quantity followed by the noun, pluralized unless the quantity is one
pub fn plural(quantity: i64, singular: &str) -> String {
    if quantity == 1 {
        format!("{} {}", quantity, singular)
    } else {
        format!("{} {}", quantity, plural_word(singular))
    }
}

/// English plural of a noun phrase; only the last word changes
pub fn plural_word(singular: &str) -> String {
    let split = singular.rfind(' ').map(|i| i + 1).unwrap_or(0);
    let (head, last) = singular.split_at(split);
    if last.is_empty() {
        return singular.to_string();
    }

    let lower = last.to_lowercase();
    let plural = if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        format!("{}es", last)
    } else if lower.ends_with('y') && !ends_with_vowel_y(&lower) {
        format!("{}ies", &last[..last.len() - 1])
    } else {
        format!("{}s", last)
    };
    format!("{}{}", head, plural)
}

fn ends_with_vowel_y(word: &str) -> bool {
    let mut chars = word.chars().rev().skip(1);
    matches!(chars.next(), Some('a' | 'e' | 'i' | 'o' | 'u'))
}

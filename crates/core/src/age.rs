use crate::error::AgeInputError;
use crate::models::AgeCategory;

pub const MIN_AGE: i64 = 0;
pub const MAX_AGE: i64 = 120;
pub const GUARDIAN_AGE_THRESHOLD: u8 = 18;

// callers validate first; anything past 17 lands in the adult bracket
pub fn classify(age: u8) -> AgeCategory {
    match age {
        0..=3 => AgeCategory::Infant,
        4..=9 => AgeCategory::Child,
        10..=12 => AgeCategory::PreTeen,
        13..=17 => AgeCategory::Teen,
        _ => AgeCategory::Adult,
    }
}

pub fn needs_guardian_verification(age: u8) -> bool {
    age < GUARDIAN_AGE_THRESHOLD
}

pub fn is_valid_age(age: i64) -> bool {
    (MIN_AGE..=MAX_AGE).contains(&age)
}

// trimmed base-10 integer only; fractions and trailing text are rejected
pub fn parse_age(input: &str) -> Result<u8, AgeInputError> {
    let value = input
        .trim()
        .parse::<i64>()
        .map_err(|_| AgeInputError::NotAnInteger)?;

    if !is_valid_age(value) {
        return Err(AgeInputError::OutOfRange(value));
    }

    u8::try_from(value).map_err(|_| AgeInputError::OutOfRange(value))
}

//! Field rules for incoming people and films. Every violation is an
//! `InvalidArgument`.
//!
//! Per-field rules are declared on the models with `#[derive(Validate)]`;
//! the functions here add the checks that depend on the current date.

use crate::error::{Error, Result};
use crate::model::{Film, Person};
use chrono::NaiveDate;
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

pub const EARLIEST_RELEASE_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1895, 12, 28) {
    Some(date) => date,
    None => panic!("invalid earliest release date"),
};

type Rule = std::result::Result<(), ValidationError>;

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn is_blank(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

fn broken(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

pub fn not_blank(value: &str) -> Rule {
    if is_blank(value) {
        return Err(broken("blank", "must not be blank"));
    }
    Ok(())
}

pub fn login(value: &str) -> Rule {
    not_blank(value)?;
    if value.chars().any(char::is_whitespace) {
        return Err(broken("whitespace", "must not contain whitespace"));
    }
    Ok(())
}

pub fn not_before_first_screening(date: &NaiveDate) -> Rule {
    if *date < EARLIEST_RELEASE_DATE {
        return Err(broken("too_early", "must not be before 1895-12-28"));
    }
    Ok(())
}

fn invalid(errors: ValidationErrors) -> Error {
    Error::InvalidArgument(errors.to_string())
}

pub fn person(person: &Person, today: NaiveDate) -> Result<()> {
    person.validate().map_err(invalid)?;
    if person.birth_date > today {
        return Err(Error::InvalidArgument(format!(
            "birth date {} is in the future",
            person.birth_date
        )));
    }
    Ok(())
}

pub fn film(film: &Film, today: NaiveDate) -> Result<()> {
    film.validate().map_err(invalid)?;
    if film.release_date > today {
        return Err(Error::InvalidArgument(format!(
            "release date {} is in the future",
            film.release_date
        )));
    }
    Ok(())
}

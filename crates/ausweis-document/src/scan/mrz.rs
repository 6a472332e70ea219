// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Machine-readable zone parsing — turns recognised card text into `IdFields`.
//
// Supports the two layouts found on identity documents:
//
// - TD1 (ID cards): 3 lines of 30 characters
// - TD3 (passports): 2 lines of 44 characters
//
// Check digits are not verified.

use ausweis_core::IdFields;
use chrono::{Datelike, Local, NaiveDate};
use tracing::debug;

const TD1_LINE: usize = 30;
const TD3_LINE: usize = 44;

/// MRZ layout detected in a block of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MrzFormat {
    Td1,
    Td3,
}

/// Parse the MRZ in `text`, using today's date to place two-digit birth years.
pub fn parse_mrz(text: &str) -> Option<IdFields> {
    parse_mrz_at(text, Local::now().date_naive())
}

/// Parse the MRZ in `text`; birth years later than `today` fall into the
/// previous century.
pub fn parse_mrz_at(text: &str, today: NaiveDate) -> Option<IdFields> {
    let (format, lines) = find_mrz_lines(text)?;
    debug!(?format, "MRZ lines located");
    let fields = match format {
        MrzFormat::Td1 => parse_td1(&lines, today),
        MrzFormat::Td3 => parse_td3(&lines, today),
    };
    Some(fields)
}

/// Normalise OCR output into MRZ character lines and pick the trailing block
/// that matches a known layout. Lines within one character of the expected
/// length are padded or truncated.
pub fn find_mrz_lines(text: &str) -> Option<(MrzFormat, Vec<String>)> {
    let lines: Vec<String> = text
        .lines()
        .map(normalise_line)
        .filter(|line| line.len() >= TD1_LINE - 2 && line.contains('<'))
        .collect();

    let fits = |line: &String, width: usize| line.len().abs_diff(width) <= 1;

    if lines.len() >= 3 {
        let tail = &lines[lines.len() - 3..];
        if tail.iter().all(|line| fits(line, TD1_LINE)) {
            return Some((MrzFormat::Td1, tail.iter().map(|l| fixed_width(l, TD1_LINE)).collect()));
        }
    }
    if lines.len() >= 2 {
        let tail = &lines[lines.len() - 2..];
        if tail.iter().all(|line| fits(line, TD3_LINE)) {
            return Some((MrzFormat::Td3, tail.iter().map(|l| fixed_width(l, TD3_LINE)).collect()));
        }
    }
    None
}

fn normalise_line(line: &str) -> String {
    line.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '«' | '‹' | '(' | '[' | '{' => '<',
            other => other.to_ascii_uppercase(),
        })
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '<')
        .collect()
}

fn fixed_width(line: &str, width: usize) -> String {
    let mut out: String = line.chars().take(width).collect();
    while out.len() < width {
        out.push('<');
    }
    out
}

fn parse_td1(lines: &[String], today: NaiveDate) -> IdFields {
    let (l1, l2, l3) = (&lines[0], &lines[1], &lines[2]);
    IdFields {
        id_type: text_field(&l1[0..2]),
        country: text_field(&l1[2..5]),
        national_number: digits(&l1[15..30]),
        date_of_birth: birth_date(&l2[0..6], today),
        sex: sex(&l2[7..8]),
        expiration_date: expiry_date(&l2[8..14]),
        full_name: full_name(l3),
    }
}

fn parse_td3(lines: &[String], today: NaiveDate) -> IdFields {
    let (l1, l2) = (&lines[0], &lines[1]);
    IdFields {
        id_type: text_field(&l1[0..2]),
        country: text_field(&l1[2..5]),
        full_name: full_name(&l1[5..44]),
        date_of_birth: birth_date(&l2[13..19], today),
        sex: sex(&l2[20..21]),
        expiration_date: expiry_date(&l2[21..27]),
        national_number: digits(&l2[28..42]),
    }
}

/// Strip `<` filler; `None` if nothing is left.
fn text_field(raw: &str) -> Option<String> {
    let value = raw.replace('<', " ").trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// Keep only the digits of an optional-data field.
fn digits(raw: &str) -> Option<String> {
    let value: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    (!value.is_empty()).then_some(value)
}

fn sex(raw: &str) -> Option<String> {
    match raw {
        "M" | "F" => Some(raw.to_string()),
        "<" | "X" => Some("X".to_string()),
        _ => None,
    }
}

/// `SURNAME<<GIVEN<NAMES` as "GIVEN NAMES SURNAME".
fn full_name(raw: &str) -> Option<String> {
    let (surname, given) = match raw.split_once("<<") {
        Some((surname, given)) => (surname, given),
        None => (raw, ""),
    };
    let surname = surname.replace('<', " ");
    let given = given.replace('<', " ");
    let name = format!("{} {}", given.trim(), surname.trim())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!name.is_empty()).then_some(name)
}

/// Map letters OCR commonly confuses with digits back to digits.
fn repair_digits(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            'O' | 'Q' | 'D' => '0',
            'I' | 'L' => '1',
            'Z' => '2',
            'S' => '5',
            'G' => '6',
            'B' => '8',
            other => other,
        })
        .collect()
}

fn split_date(raw: &str) -> Option<(i32, u32, u32)> {
    let repaired = repair_digits(raw);
    if repaired.len() != 6 || !repaired.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let yy = repaired[0..2].parse().ok()?;
    let mm = repaired[2..4].parse().ok()?;
    let dd = repaired[4..6].parse().ok()?;
    Some((yy, mm, dd))
}

fn birth_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let (yy, mm, dd) = split_date(raw)?;
    let current_yy = today.year() % 100;
    let century = if yy > current_yy { 1900 } else { 2000 };
    NaiveDate::from_ymd_opt(century + yy, mm, dd)
}

fn expiry_date(raw: &str) -> Option<NaiveDate> {
    let (yy, mm, dd) = split_date(raw)?;
    NaiveDate::from_ymd_opt(2000 + yy, mm, dd)
}

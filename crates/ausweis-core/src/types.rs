// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Ausweis.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A corner position in image coordinates (x, y).
pub type Corner = (f32, f32);

/// Four card corners in canonical order.
///
/// The rectifier relies on this order: swapping corners mirrors or rotates
/// the output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub top_left: Corner,
    pub top_right: Corner,
    pub bottom_right: Corner,
    pub bottom_left: Corner,
}

impl Quad {
    /// Corners as `[top_left, top_right, bottom_right, bottom_left]`.
    pub fn to_array(&self) -> [Corner; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }

    /// The longer of the top and bottom edges.
    pub fn width(&self) -> f32 {
        distance(self.top_left, self.top_right).max(distance(self.bottom_left, self.bottom_right))
    }

    /// The longer of the left and right edges.
    pub fn height(&self) -> f32 {
        distance(self.top_left, self.bottom_left).max(distance(self.top_right, self.bottom_right))
    }

    /// Enclosed area (shoelace formula).
    pub fn area(&self) -> f32 {
        let corners = self.to_array();
        let mut area = 0.0f32;
        for i in 0..4 {
            let j = (i + 1) % 4;
            area += corners[i].0 * corners[j].1;
            area -= corners[j].0 * corners[i].1;
        }
        area.abs() / 2.0
    }
}

/// Euclidean distance between two corners.
pub fn distance(a: Corner, b: Corner) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Fields read from the machine-readable zone of an identity document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdFields {
    /// Issuing state code with `<` filler stripped (e.g. "UTO", "D").
    pub country: Option<String>,
    /// Document code ("ID", "I", "P", ...).
    pub id_type: Option<String>,
    /// Digits of the national identification number.
    pub national_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    /// Given names followed by the surname.
    pub full_name: Option<String>,
    pub sex: Option<String>,
}

impl IdFields {
    /// The subset of fields returned to API clients.
    pub fn summary(&self) -> IdSummary {
        IdSummary {
            id_number: self.national_number.clone(),
            nationality: self.country.clone(),
            full_name: self.full_name.clone(),
        }
    }
}

/// Response projection of [`IdFields`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSummary {
    pub id_number: Option<String>,
    pub nationality: Option<String>,
    pub full_name: Option<String>,
}

//! Physical unit parsing and normalization.
//!
//! Unit strings are parsed into a list of `(symbol, power)` factors over a
//! fixed table of recognized units, optionally carrying an SI prefix. Two
//! textual forms are produced from the parsed value:
//!
//! - the canonical form ([`Unit`]'s `Display`), e.g. `1 / (cm2 s)`;
//! - the FITS form ([`Unit::to_fits_string`]), e.g. `cm-2 s-1`.
//!
//! # Examples
//!
//! ```
//! use fits_schema_core::Unit;
//!
//! let unit = Unit::parse("TeV").unwrap();
//! assert_eq!(unit.to_string(), "TeV");
//! assert_eq!(unit.physical_type(), Some("energy"));
//!
//! let flux = Unit::parse("cm-2 s-1 TeV-1").unwrap();
//! assert_eq!(flux.to_fits_string(), "cm-2 s-1 TeV-1");
//!
//! assert!(Unit::parse("bogus-unit").is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validate::SchemaError;

/// Exponents over length, mass, time, current, temperature, amount,
/// luminous intensity, plane angle and counts.
type Dimensions = [i32; 9];

const LENGTH: usize = 0;
const MASS: usize = 1;
const TIME: usize = 2;
const CURRENT: usize = 3;
const TEMPERATURE: usize = 4;
const AMOUNT: usize = 5;
const LUMINOUS: usize = 6;
const ANGLE: usize = 7;
const COUNT: usize = 8;

const fn dims(pairs: &[(usize, i32)]) -> Dimensions {
    let mut out = [0; 9];
    let mut i = 0;
    while i < pairs.len() {
        out[pairs[i].0] = pairs[i].1;
        i += 1;
    }
    out
}

const ENERGY: Dimensions = dims(&[(LENGTH, 2), (MASS, 1), (TIME, -2)]);

struct UnitDef {
    aliases: &'static [&'static str],
    symbol: &'static str,
    fits: &'static str,
    dims: Dimensions,
    prefixable: bool,
}

const fn def(
    aliases: &'static [&'static str],
    symbol: &'static str,
    fits: &'static str,
    dims: Dimensions,
    prefixable: bool,
) -> UnitDef {
    UnitDef {
        aliases,
        symbol,
        fits,
        dims,
        prefixable,
    }
}

static UNITS: &[UnitDef] = &[
    def(&["m", "meter", "metre"], "m", "m", dims(&[(LENGTH, 1)]), true),
    def(&["g", "gram"], "g", "g", dims(&[(MASS, 1)]), true),
    def(&["s", "second", "sec"], "s", "s", dims(&[(TIME, 1)]), true),
    def(&["A", "ampere"], "A", "A", dims(&[(CURRENT, 1)]), true),
    def(&["K", "kelvin"], "K", "K", dims(&[(TEMPERATURE, 1)]), true),
    def(&["mol", "mole"], "mol", "mol", dims(&[(AMOUNT, 1)]), true),
    def(&["cd", "candela"], "cd", "cd", dims(&[(LUMINOUS, 1)]), true),
    def(&["rad", "radian"], "rad", "rad", dims(&[(ANGLE, 1)]), true),
    def(&["sr", "steradian"], "sr", "sr", dims(&[(ANGLE, 2)]), true),
    def(&["deg", "degree"], "deg", "deg", dims(&[(ANGLE, 1)]), false),
    def(&["arcmin", "arcminute"], "arcmin", "arcmin", dims(&[(ANGLE, 1)]), false),
    def(&["arcsec", "arcsecond"], "arcsec", "arcsec", dims(&[(ANGLE, 1)]), false),
    def(&["mas"], "mas", "mas", dims(&[(ANGLE, 1)]), false),
    def(&["Hz", "hertz"], "Hz", "Hz", dims(&[(TIME, -1)]), true),
    def(&["N", "newton"], "N", "N", dims(&[(LENGTH, 1), (MASS, 1), (TIME, -2)]), true),
    def(&["J", "joule"], "J", "J", ENERGY, true),
    def(&["W", "watt"], "W", "W", dims(&[(LENGTH, 2), (MASS, 1), (TIME, -3)]), true),
    def(&["Pa", "pascal"], "Pa", "Pa", dims(&[(LENGTH, -1), (MASS, 1), (TIME, -2)]), true),
    def(&["C", "coulomb"], "C", "C", dims(&[(TIME, 1), (CURRENT, 1)]), true),
    def(
        &["V", "volt"],
        "V",
        "V",
        dims(&[(LENGTH, 2), (MASS, 1), (TIME, -3), (CURRENT, -1)]),
        true,
    ),
    def(
        &["Ohm", "ohm"],
        "Ohm",
        "Ohm",
        dims(&[(LENGTH, 2), (MASS, 1), (TIME, -3), (CURRENT, -2)]),
        true,
    ),
    def(&["T", "tesla"], "T", "T", dims(&[(MASS, 1), (TIME, -2), (CURRENT, -1)]), true),
    def(&["G", "gauss"], "G", "G", dims(&[(MASS, 1), (TIME, -2), (CURRENT, -1)]), false),
    def(&["eV", "electronvolt"], "eV", "eV", ENERGY, true),
    def(&["erg"], "erg", "erg", ENERGY, false),
    def(&["Jy", "jansky"], "Jy", "Jy", dims(&[(MASS, 1), (TIME, -2)]), true),
    def(&["min", "minute"], "min", "min", dims(&[(TIME, 1)]), false),
    def(&["h", "hour", "hr"], "h", "h", dims(&[(TIME, 1)]), false),
    def(&["d", "day"], "d", "d", dims(&[(TIME, 1)]), false),
    def(&["yr", "year"], "yr", "yr", dims(&[(TIME, 1)]), true),
    def(&["pc", "parsec"], "pc", "pc", dims(&[(LENGTH, 1)]), true),
    def(&["AU", "au"], "AU", "AU", dims(&[(LENGTH, 1)]), false),
    def(&["lyr", "lightyear"], "lyr", "lyr", dims(&[(LENGTH, 1)]), false),
    def(&["Angstrom", "angstrom", "AA"], "Angstrom", "Angstrom", dims(&[(LENGTH, 1)]), false),
    def(&["solMass", "M_sun"], "solMass", "solMass", dims(&[(MASS, 1)]), false),
    def(&["solRad", "R_sun"], "solRad", "solRad", dims(&[(LENGTH, 1)]), false),
    def(
        &["solLum", "L_sun"],
        "solLum",
        "solLum",
        dims(&[(LENGTH, 2), (MASS, 1), (TIME, -3)]),
        false,
    ),
    def(&["ct", "count"], "ct", "count", dims(&[(COUNT, 1)]), false),
    def(&["ph", "photon"], "ph", "photon", dims(&[(COUNT, 1)]), false),
];

/// SI prefixes, two-letter `da` first so it wins over `d`.
static PREFIXES: &[&str] = &[
    "da", "Y", "Z", "E", "P", "T", "G", "M", "k", "h", "d", "c", "m", "u", "µ", "n", "p", "f",
    "a", "z", "y",
];

static PHYSICAL_TYPES: &[(Dimensions, &str)] = &[
    ([0; 9], "dimensionless"),
    (dims(&[(LENGTH, 1)]), "length"),
    (dims(&[(MASS, 1)]), "mass"),
    (dims(&[(TIME, 1)]), "time"),
    (dims(&[(CURRENT, 1)]), "electrical current"),
    (dims(&[(TEMPERATURE, 1)]), "temperature"),
    (dims(&[(AMOUNT, 1)]), "amount of substance"),
    (dims(&[(LUMINOUS, 1)]), "luminous intensity"),
    (dims(&[(ANGLE, 1)]), "angle"),
    (dims(&[(ANGLE, 2)]), "solid angle"),
    (dims(&[(COUNT, 1)]), "count"),
    (dims(&[(LENGTH, 2)]), "area"),
    (dims(&[(LENGTH, 3)]), "volume"),
    (dims(&[(TIME, -1)]), "frequency"),
    (dims(&[(LENGTH, 1), (TIME, -1)]), "speed"),
    (dims(&[(LENGTH, 1), (TIME, -2)]), "acceleration"),
    (dims(&[(LENGTH, 1), (MASS, 1), (TIME, -2)]), "force"),
    (ENERGY, "energy"),
    (dims(&[(LENGTH, 2), (MASS, 1), (TIME, -3)]), "power"),
    (dims(&[(LENGTH, -1), (MASS, 1), (TIME, -2)]), "pressure"),
    (dims(&[(MASS, 1), (TIME, -3)]), "energy flux"),
    (dims(&[(MASS, 1), (TIME, -2)]), "spectral flux density"),
    (dims(&[(TIME, 1), (CURRENT, 1)]), "electrical charge"),
    (
        dims(&[(LENGTH, 2), (MASS, 1), (TIME, -3), (CURRENT, -1)]),
        "electrical potential",
    ),
    (
        dims(&[(LENGTH, 2), (MASS, 1), (TIME, -3), (CURRENT, -2)]),
        "electrical resistance",
    ),
    (dims(&[(MASS, 1), (TIME, -2), (CURRENT, -1)]), "magnetic flux density"),
    (dims(&[(ANGLE, 1), (TIME, -1)]), "angular speed"),
];

/// One `symbol^power` term of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFactor {
    /// Canonical symbol including any SI prefix (e.g. `TeV`).
    pub symbol: String,
    /// FITS spelling of the same symbol (e.g. `count` for `ct`).
    pub fits_symbol: String,
    /// Non-zero integer exponent.
    pub power: i32,
}

/// A parsed, recognized physical unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Unit {
    factors: Vec<UnitFactor>,
    dims: Dimensions,
}

impl Unit {
    /// Parses a unit string.
    ///
    /// Factors may be separated by whitespace, `*` or `.`; powers are written
    /// as trailing integers (`cm2`, `s-1`), `**n` or `^n`; `/` divides by the
    /// next factor or parenthesized group. A leading `u.` on a single name is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidUnit`] for unknown unit names, malformed
    /// syntax, scale factors other than `1`, or empty input.
    pub fn parse(raw: &str) -> Result<Self, SchemaError> {
        let trimmed = raw.trim();
        let source = trimmed.strip_prefix("u.").unwrap_or(trimmed);
        if source.is_empty() {
            return Err(invalid(raw, "empty unit string"));
        }

        let mut parser = Parser {
            chars: source.chars().collect(),
            pos: 0,
        };
        let terms = parser.expression().map_err(|reason| invalid(raw, &reason))?;

        let mut factors: Vec<UnitFactor> = Vec::new();
        let mut total: Dimensions = [0; 9];
        for (name, power) in terms {
            let (def, prefix) =
                lookup(&name).ok_or_else(|| invalid(raw, &format!("unknown unit '{name}'")))?;
            for (slot, exponent) in total.iter_mut().zip(def.dims.iter()) {
                let sum = exponent
                    .checked_mul(power)
                    .and_then(|scaled| slot.checked_add(scaled))
                    .ok_or_else(|| invalid(raw, "power out of range"))?;
                *slot = sum;
            }
            let symbol = format!("{prefix}{}", def.symbol);
            match factors.iter_mut().find(|f| f.symbol == symbol) {
                Some(existing) => {
                    existing.power = existing
                        .power
                        .checked_add(power)
                        .ok_or_else(|| invalid(raw, "power out of range"))?;
                }
                None => factors.push(UnitFactor {
                    fits_symbol: format!("{prefix}{}", def.fits),
                    symbol,
                    power,
                }),
            }
        }
        factors.retain(|f| f.power != 0);

        Ok(Self {
            factors,
            dims: total,
        })
    }

    /// Factors in first-appearance order with zero powers removed.
    pub fn factors(&self) -> &[UnitFactor] {
        &self.factors
    }

    /// Renders the unit the way FITS `TUNITn` cards spell it.
    pub fn to_fits_string(&self) -> String {
        self.factors
            .iter()
            .map(|f| match f.power {
                1 => f.fits_symbol.clone(),
                p => format!("{}{p}", f.fits_symbol),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Name of the physical quantity this unit measures, if it is a
    /// well-known one.
    pub fn physical_type(&self) -> Option<&'static str> {
        PHYSICAL_TYPES
            .iter()
            .find(|(d, _)| *d == self.dims)
            .map(|(_, name)| *name)
    }

    /// Returns `true` if both units measure the same physical quantity.
    pub fn is_convertible_to(&self, other: &Unit) -> bool {
        self.dims == other.dims
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut numerator: Vec<&UnitFactor> = self.factors.iter().filter(|u| u.power > 0).collect();
        let mut denominator: Vec<&UnitFactor> =
            self.factors.iter().filter(|u| u.power < 0).collect();
        numerator.sort_by_key(|u| std::cmp::Reverse(u.power));
        denominator.sort_by_key(|u| u.power);

        let join = |terms: &[&UnitFactor]| {
            terms
                .iter()
                .map(|u| match u.power.abs() {
                    1 => u.symbol.clone(),
                    p => format!("{}{p}", u.symbol),
                })
                .collect::<Vec<_>>()
                .join(" ")
        };

        let top = join(&numerator);
        match denominator.len() {
            0 => write!(f, "{top}"),
            n => {
                let top = if top.is_empty() { "1".to_string() } else { top };
                if n == 1 {
                    write!(f, "{top} / {}", join(&denominator))
                } else {
                    write!(f, "{top} / ({})", join(&denominator))
                }
            }
        }
    }
}

impl std::str::FromStr for Unit {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Unit {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.to_string()
    }
}

fn invalid(unit: &str, reason: &str) -> SchemaError {
    SchemaError::InvalidUnit {
        unit: unit.to_string(),
        reason: reason.to_string(),
    }
}

fn lookup(name: &str) -> Option<(&'static UnitDef, &'static str)> {
    if let Some(def) = UNITS.iter().find(|d| d.aliases.contains(&name)) {
        return Some((def, ""));
    }
    PREFIXES.iter().find_map(|prefix| {
        let rest = name.strip_prefix(prefix)?;
        let def = UNITS
            .iter()
            .find(|d| d.prefixable && d.symbol == rest)?;
        // Normalize the micro sign to the ASCII spelling.
        let prefix: &'static str = if *prefix == "µ" { "u" } else { *prefix };
        Some((def, prefix))
    })
}

/// Recursive-descent parser producing `(name, power)` terms.
struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn expression(&mut self) -> Result<Vec<(String, i32)>, String> {
        let mut terms = Vec::new();
        self.product(&mut terms, 1)?;
        loop {
            self.skip_whitespace();
            if !self.eat('/') {
                break;
            }
            self.skip_whitespace();
            self.factor(&mut terms, -1)?;
        }
        self.skip_whitespace();
        match self.peek() {
            None => Ok(terms),
            Some(c) => Err(format!("unexpected character '{c}'")),
        }
    }

    fn product(&mut self, terms: &mut Vec<(String, i32)>, sign: i32) -> Result<(), String> {
        self.factor(terms, sign)?;
        loop {
            let start = self.pos;
            self.skip_whitespace();
            if self.peek() == Some('*') && self.peek_at(1) != Some('*') {
                self.pos += 1;
            } else if self.peek() == Some('.') {
                self.pos += 1;
            }
            self.skip_whitespace();
            match self.peek() {
                Some(c) if is_name_char(c) || c == '(' || c.is_ascii_digit() => {
                    self.factor(terms, sign)?;
                }
                _ => {
                    self.pos = start;
                    return Ok(());
                }
            }
        }
    }

    fn factor(&mut self, terms: &mut Vec<(String, i32)>, sign: i32) -> Result<(), String> {
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                self.skip_whitespace();
                self.product(terms, sign)?;
                self.skip_whitespace();
                if !self.eat(')') {
                    return Err("unbalanced parenthesis".to_string());
                }
                Ok(())
            }
            Some(c) if c.is_ascii_digit() => {
                let value = self.integer()?;
                if value != 1 {
                    return Err(format!("scale factor {value} is not supported"));
                }
                Ok(())
            }
            Some(c) if is_name_char(c) => {
                let start = self.pos;
                while self.peek().is_some_and(is_name_char) {
                    self.pos += 1;
                }
                let name: String = self.chars[start..self.pos].iter().collect();
                let power = self
                    .power()?
                    .checked_mul(sign)
                    .ok_or_else(|| "power out of range".to_string())?;
                terms.push((name, power));
                Ok(())
            }
            Some(c) => Err(format!("unexpected character '{c}'")),
            None => Err("unexpected end of unit string".to_string()),
        }
    }

    fn power(&mut self) -> Result<i32, String> {
        if self.peek() == Some('*') && self.peek_at(1) == Some('*') {
            self.pos += 2;
            return self.bracketed_integer();
        }
        if self.eat('^') {
            return self.bracketed_integer();
        }
        match self.peek() {
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' => self.integer(),
            _ => Ok(1),
        }
    }

    fn bracketed_integer(&mut self) -> Result<i32, String> {
        if self.eat('(') {
            let value = self.integer()?;
            if !self.eat(')') {
                return Err("unbalanced parenthesis in power".to_string());
            }
            Ok(value)
        } else {
            self.integer()
        }
    }

    fn integer(&mut self) -> Result<i32, String> {
        let start = self.pos;
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<i32>()
            .map_err(|_| format!("invalid power '{text}'"))
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == 'µ'
}

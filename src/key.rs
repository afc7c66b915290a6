//! CDE key and its canonical string codec
//!
//! Registry files index records by a string form of the
//! (structure, measure, unit) triple:
//!
//! ```text
//! KWYK(structure='Left-Hippocampus', measure='number_voxels', unit='voxels')
//! ```
//!
//! [`CdeKey::format`] always writes the fields in that order. [`CdeKey::parse`]
//! accepts them in any order, so two documents that differ only in field
//! ordering resolve to the same key.

use crate::errors::{CdeError, CdeResult};
use crate::types::{Measure, StatsRow, Unit};
use std::iter::Peekable;
use std::str::CharIndices;

/// Tag that opens every serialized key
pub const KEY_TAG: &str = "KWYK";

/// Canonical registry lookup key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CdeKey {
    pub structure: String,
    pub measure: Measure,
    pub unit: Unit,
}

impl CdeKey {
    pub fn new(structure: impl Into<String>, measure: Measure) -> Self {
        Self {
            structure: structure.into(),
            measure,
            unit: measure.unit(),
        }
    }

    /// Human readable label used for new records
    pub fn label(&self) -> String {
        format!("{} {} ({})", self.structure, self.measure, self.unit)
    }

    /// Canonical string form
    pub fn format(&self) -> String {
        format!(
            "{}(structure={}, measure={}, unit={})",
            KEY_TAG,
            quote(&self.structure),
            quote(self.measure.as_str()),
            quote(self.unit.as_str())
        )
    }

    /// Decode a string produced by [`CdeKey::format`]
    pub fn parse(input: &str) -> CdeResult<Self> {
        KeyParser::new(input).parse()
    }
}

impl std::fmt::Display for CdeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format())
    }
}

impl std::str::FromStr for CdeKey {
    type Err = CdeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CdeKey::parse(s)
    }
}

/// Build the voxel-count and volume keys for one stats row
pub fn keys_for_row(row: &StatsRow) -> [CdeKey; 2] {
    [
        CdeKey::new(row.label.clone(), Measure::NumberVoxels),
        CdeKey::new(row.label.clone(), Measure::VolInMm3),
    ]
}

/// Quote a string the way the registry files always have: single quotes,
/// switching to double quotes when that avoids escaping.
fn quote(value: &str) -> String {
    let q = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(value.len() + 2);
    out.push(q);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == q => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(q);
    out
}

struct KeyParser<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> KeyParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn error(&self, reason: impl Into<String>) -> CdeError {
        CdeError::malformed(self.input, reason)
    }

    fn parse(mut self) -> CdeResult<CdeKey> {
        self.skip_ws();
        let tag = self.ident();
        if tag != KEY_TAG {
            return Err(self.error(format!("expected tag {}", KEY_TAG)));
        }
        self.expect('(')?;

        let mut structure: Option<String> = None;
        let mut measure: Option<String> = None;
        let mut unit: Option<String> = None;

        loop {
            self.skip_ws();
            let name = self.ident();
            if name.is_empty() {
                return Err(self.error("expected field name"));
            }
            self.skip_ws();
            self.expect('=')?;
            self.skip_ws();
            let value = self.string()?;

            let slot = match name.as_str() {
                "structure" => &mut structure,
                "measure" => &mut measure,
                "unit" => &mut unit,
                other => return Err(self.error(format!("unknown field '{}'", other))),
            };
            if slot.replace(value).is_some() {
                return Err(self.error(format!("duplicate field '{}'", name)));
            }

            self.skip_ws();
            match self.chars.next() {
                Some((_, ',')) => continue,
                Some((_, ')')) => break,
                Some((_, c)) => return Err(self.error(format!("unexpected '{}'", c))),
                None => return Err(self.error("unterminated key")),
            }
        }

        self.skip_ws();
        if self.chars.peek().is_some() {
            return Err(self.error("trailing characters after key"));
        }

        let structure = structure.ok_or_else(|| self.error("missing field 'structure'"))?;
        if structure.is_empty() {
            return Err(self.error("empty structure"));
        }
        let measure = measure
            .ok_or_else(|| self.error("missing field 'measure'"))?
            .parse::<Measure>()
            .map_err(|e| self.error(e))?;
        let unit = unit
            .ok_or_else(|| self.error("missing field 'unit'"))?
            .parse::<Unit>()
            .map_err(|e| self.error(e))?;

        Ok(CdeKey {
            structure,
            measure,
            unit,
        })
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                out.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        out
    }

    fn expect(&mut self, want: char) -> CdeResult<()> {
        match self.chars.next() {
            Some((_, c)) if c == want => Ok(()),
            Some((i, c)) => Err(self.error(format!("expected '{}' at {}, found '{}'", want, i, c))),
            None => Err(self.error(format!("expected '{}', found end of input", want))),
        }
    }

    fn string(&mut self) -> CdeResult<String> {
        let q = match self.chars.next() {
            Some((_, c @ ('\'' | '"'))) => c,
            _ => return Err(self.error("expected quoted string")),
        };

        let mut out = String::new();
        loop {
            match self.chars.next() {
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, c @ ('\\' | '\'' | '"'))) => out.push(c),
                    Some((_, c)) => {
                        return Err(self.error(format!("unsupported escape '\\{}'", c)))
                    }
                    None => return Err(self.error("unterminated escape")),
                },
                Some((_, c)) if c == q => return Ok(out),
                Some((_, c)) => out.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StructuralIndex;

    #[test]
    fn test_format_canonical() {
        let key = CdeKey::new("Left-Hippocampus", Measure::NumberVoxels);
        assert_eq!(
            key.format(),
            "KWYK(structure='Left-Hippocampus', measure='number_voxels', unit='voxels')"
        );
    }

    #[test]
    fn test_parse_any_field_order() {
        let a = CdeKey::parse("KWYK(unit='mm^3', structure='Brain-Stem', measure='vol_inmm3')")
            .unwrap();
        let b = CdeKey::parse("KWYK(structure='Brain-Stem', measure='vol_inmm3', unit='mm^3')")
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.format(), b.format());
    }

    #[test]
    fn test_parse_double_quotes_and_escapes() {
        let key = CdeKey::parse(r#"KWYK(structure="Rater's ROI", measure='vol_inmm3', unit='mm^3')"#)
            .unwrap();
        assert_eq!(key.structure, "Rater's ROI");
        assert_eq!(
            key.format(),
            r#"KWYK(structure="Rater's ROI", measure='vol_inmm3', unit='mm^3')"#
        );

        let key = CdeKey::new("a'b\"c\\d", Measure::NumberVoxels);
        assert_eq!(CdeKey::parse(&key.format()).unwrap(), key);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "",
            "count",
            "KWYK(structure='X', measure='number_voxels')",
            "KWYK(structure='X', measure='number_voxels', unit='voxels', extra='1')",
            "KWYK(structure='X', structure='Y', measure='number_voxels', unit='voxels')",
            "KWYK(structure='X', measure='surface', unit='voxels')",
            "KWYK(structure='X', measure='number_voxels', unit='voxels') tail",
            "KWYK(structure='X, measure='number_voxels', unit='voxels')",
            "FS(structure='X', measure='number_voxels', unit='voxels')",
            "KWYK(structure='', measure='number_voxels', unit='voxels')",
        ] {
            let err = CdeKey::parse(bad).unwrap_err();
            assert!(
                matches!(err, CdeError::MalformedKey { .. }),
                "expected malformed key for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_keys_for_row() {
        let row = StatsRow {
            label: "Left-Hippocampus".to_string(),
            kwyk_index: StructuralIndex::Int(17),
            number_voxels: "4123".to_string(),
            vol_inmm3: "3987.5".to_string(),
        };
        let [vox, vol] = keys_for_row(&row);
        assert_eq!(vox.measure, Measure::NumberVoxels);
        assert_eq!(vox.unit, Unit::Voxels);
        assert_eq!(vol.measure, Measure::VolInMm3);
        assert_eq!(vol.unit, Unit::CubicMillimeters);
        assert_eq!(vol.label(), "Left-Hippocampus vol_inmm3 (mm^3)");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn measure_strategy() -> impl Strategy<Value = Measure> {
            prop_oneof![Just(Measure::NumberVoxels), Just(Measure::VolInMm3)]
        }

        fn unit_strategy() -> impl Strategy<Value = Unit> {
            prop_oneof![Just(Unit::Voxels), Just(Unit::CubicMillimeters)]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(256))]

            /// Decoding the serialized form yields the same triple
            #[test]
            fn prop_key_roundtrip(
                structure in "\\PC{1,40}",
                measure in measure_strategy(),
                unit in unit_strategy(),
            ) {
                let key = CdeKey { structure, measure, unit };
                let decoded = CdeKey::parse(&key.format()).unwrap();
                prop_assert_eq!(decoded, key);
            }

            /// Quotes, backslashes and whitespace survive the codec
            #[test]
            fn prop_key_roundtrip_special_chars(
                structure in "[a-zA-Z'\"\\\\ \t\n(),=-]{1,24}",
                measure in measure_strategy(),
            ) {
                let key = CdeKey::new(structure, measure);
                prop_assert_eq!(CdeKey::parse(&key.format()).unwrap(), key);
            }
        }
    }
}

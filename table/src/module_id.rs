use std::fmt;

/// Integer id of a co-expression module.
///
/// Ids come from the raw text of the query column. Spreadsheets store them as
/// floats, so an integral float literal like `"3.0"` coerces to `3` as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(i64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not an integer module id")]
pub struct ModuleIdError(pub String);

impl ModuleId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// Convert a raw cell value to a module id.
    pub fn coerce(raw: &str) -> Result<Self, ModuleIdError> {
        let trimmed = raw.trim();
        if let Ok(id) = trimmed.parse::<i64>() {
            return Ok(Self(id));
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Ok(Self(f as i64))
            }
            _ => Err(ModuleIdError(raw.to_owned())),
        }
    }

    /// Match a worksheet name like `module_3`, `Module 3` or `3` to a module id.
    pub fn from_sheet_name(name: &str) -> Option<Self> {
        let name = name.trim();
        let rest = match name.get(..6) {
            Some(prefix) if prefix.eq_ignore_ascii_case("module") => &name[6..],
            _ => name,
        };
        let rest = rest.trim_start_matches(['_', '-', ' ']);
        Self::coerce(rest).ok()
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_integers_and_integral_floats() {
        assert_eq!(ModuleId::coerce("3"), Ok(ModuleId::new(3)));
        assert_eq!(ModuleId::coerce(" 12 "), Ok(ModuleId::new(12)));
        assert_eq!(ModuleId::coerce("4.0"), Ok(ModuleId::new(4)));
        assert_eq!(ModuleId::coerce("-2"), Ok(ModuleId::new(-2)));
    }

    #[test]
    fn test_coerce_rejects_non_integers() {
        for raw in ["abc", "1.5", "", "NaN", "inf", "GO:0008150"] {
            assert_eq!(
                ModuleId::coerce(raw),
                Err(ModuleIdError(raw.to_owned())),
                "{raw:?} should not coerce"
            );
        }
    }

    #[test]
    fn test_sheet_names() {
        assert_eq!(ModuleId::from_sheet_name("module_3"), Some(ModuleId::new(3)));
        assert_eq!(ModuleId::from_sheet_name("Module 7"), Some(ModuleId::new(7)));
        assert_eq!(ModuleId::from_sheet_name("MODULE-1"), Some(ModuleId::new(1)));
        assert_eq!(ModuleId::from_sheet_name("5"), Some(ModuleId::new(5)));
        assert_eq!(ModuleId::from_sheet_name("Summary"), None);
        assert_eq!(ModuleId::from_sheet_name("module"), None);
    }
}

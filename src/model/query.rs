use std::fmt;

/// A single-condition query in the service's query syntax, e.g. `(FormattedID = 1234)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereClause {
    pub field: String,
    pub operator: String,
    pub value: String,
}

impl WhereClause {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: "=".to_string(),
            value: value.into(),
        }
    }
}

impl fmt::Display for WhereClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values with spaces must be quoted
        if self.value.contains(char::is_whitespace) {
            write!(f, "({} {} \"{}\")", self.field, self.operator, self.value)
        } else {
            write!(f, "({} {} {})", self.field, self.operator, self.value)
        }
    }
}

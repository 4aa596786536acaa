/*!
 * Filter predicates for translatable queries.
 *
 * `Q` is a small boolean predicate tree in the spirit of ORM lookup
 * expressions: `Q::new("countries__name__icontains", "ger")` walks the
 * `countries` relation and matches `name` case-insensitively. Predicates
 * combine with `&`, `|` and `!`.
 */

use std::ops::{BitAnd, BitOr, Not};

use crate::database::TranslationRecord;

/// How a stored value is compared with the predicate value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Equal
    Exact,
    /// Equal, ignoring case
    IExact,
    /// Substring
    Contains,
    /// Substring, ignoring case
    IContains,
    /// Prefix
    StartsWith,
    /// Prefix, ignoring case
    IStartsWith,
    /// Suffix
    EndsWith,
    /// Suffix, ignoring case
    IEndsWith,
}

impl Lookup {
    /// Parse a lookup suffix such as `icontains`
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "exact" => Some(Self::Exact),
            "iexact" => Some(Self::IExact),
            "contains" => Some(Self::Contains),
            "icontains" => Some(Self::IContains),
            "startswith" => Some(Self::StartsWith),
            "istartswith" => Some(Self::IStartsWith),
            "endswith" => Some(Self::EndsWith),
            "iendswith" => Some(Self::IEndsWith),
            _ => None,
        }
    }

    /// Compare a stored value with the predicate value
    pub fn matches(&self, stored: &str, value: &str) -> bool {
        match self {
            Self::Exact => stored == value,
            Self::IExact => stored.to_lowercase() == value.to_lowercase(),
            Self::Contains => stored.contains(value),
            Self::IContains => stored.to_lowercase().contains(&value.to_lowercase()),
            Self::StartsWith => stored.starts_with(value),
            Self::IStartsWith => stored.to_lowercase().starts_with(&value.to_lowercase()),
            Self::EndsWith => stored.ends_with(value),
            Self::IEndsWith => stored.to_lowercase().ends_with(&value.to_lowercase()),
        }
    }
}

/// Predicate tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Q {
    /// Compare a field, possibly reached through relations, with a value
    Field {
        /// Relation names followed by the field name
        path: Vec<String>,
        /// Comparison
        lookup: Lookup,
        /// Value compared with
        value: String,
    },
    /// Match a translation row: same field, one of the languages, matching text
    Translated {
        /// Relations walked to reach the owner of the translations
        relations: Vec<String>,
        /// Translated field
        field: String,
        /// Accepted languages
        languages: Vec<String>,
        /// Comparison applied to the translated text
        lookup: Lookup,
        /// Value compared with
        value: String,
    },
    /// All must hold
    And(Vec<Q>),
    /// Any must hold
    Or(Vec<Q>),
    /// Must not hold
    Not(Box<Q>),
}

impl Q {
    /// Build a field predicate from a lookup key such as `name__icontains`
    ///
    /// Without a lookup suffix the comparison is exact.
    pub fn new(key: &str, value: impl Into<String>) -> Self {
        let mut path: Vec<String> = crate::model::meta::split_path(key)
            .into_iter()
            .map(str::to_string)
            .collect();

        let lookup = match path.last().and_then(|last| Lookup::from_suffix(last)) {
            Some(lookup) if path.len() > 1 => {
                path.pop();
                lookup
            }
            _ => Lookup::Exact,
        };

        Self::Field {
            path,
            lookup,
            value: value.into(),
        }
    }

    /// Rebuild the tree, replacing every field leaf with `f(leaf)`
    pub fn try_map_fields<E>(&self, f: &mut impl FnMut(&Q) -> Result<Q, E>) -> Result<Q, E> {
        match self {
            Self::Field { .. } => f(self),
            Self::Translated { .. } => Ok(self.clone()),
            Self::And(children) => Ok(Self::And(
                children
                    .iter()
                    .map(|c| c.try_map_fields(f))
                    .collect::<Result<_, E>>()?,
            )),
            Self::Or(children) => Ok(Self::Or(
                children
                    .iter()
                    .map(|c| c.try_map_fields(f))
                    .collect::<Result<_, E>>()?,
            )),
            Self::Not(child) => Ok(Self::Not(Box::new(child.try_map_fields(f)?))),
        }
    }

    /// Whether the tree matches translation rows of the filtered model itself
    pub fn joins_own_translations(&self) -> bool {
        match self {
            Self::Field { .. } => false,
            Self::Translated { relations, .. } => relations.is_empty(),
            Self::And(children) | Self::Or(children) => {
                children.iter().any(Q::joins_own_translations)
            }
            Self::Not(child) => child.joins_own_translations(),
        }
    }

    /// Whether a match is repeated once per matching translation row
    ///
    /// Only own-translation leaves outside any negation join rows; a negated
    /// one asks whether no row matches.
    pub fn repeats_per_translation(&self) -> bool {
        match self {
            Self::Field { .. } | Self::Not(_) => false,
            Self::Translated { relations, .. } => relations.is_empty(),
            Self::And(children) | Self::Or(children) => {
                children.iter().any(Q::repeats_per_translation)
            }
        }
    }

    /// Whether a translation row satisfies a `Translated` leaf
    pub(crate) fn row_matches(
        record: &TranslationRecord,
        field: &str,
        languages: &[String],
        lookup: Lookup,
        value: &str,
    ) -> bool {
        record.field == field
            && languages.iter().any(|l| *l == record.language)
            && lookup.matches(&record.text, value)
    }
}

impl BitAnd for Q {
    type Output = Q;

    fn bitand(self, rhs: Q) -> Q {
        match self {
            Q::And(mut children) => {
                children.push(rhs);
                Q::And(children)
            }
            other => Q::And(vec![other, rhs]),
        }
    }
}

impl BitOr for Q {
    type Output = Q;

    fn bitor(self, rhs: Q) -> Q {
        match self {
            Q::Or(mut children) => {
                children.push(rhs);
                Q::Or(children)
            }
            other => Q::Or(vec![other, rhs]),
        }
    }
}

impl Not for Q {
    type Output = Q;

    fn not(self) -> Q {
        Q::Not(Box::new(self))
    }
}

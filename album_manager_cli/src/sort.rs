use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::Album;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Title,
    Artist,
    Year,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "title" => Ok(SortField::Title),
            "artist" => Ok(SortField::Artist),
            "year" | "release-year" => Ok(SortField::Year),
            other => Err(format!("cannot sort by '{}', use title, artist or year", other)),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortField::Title => "title",
            SortField::Artist => "artist",
            SortField::Year => "year",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlbumSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl AlbumSort {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Clicking the active column flips the direction; a new column starts ascending.
    pub fn toggle(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = SortDirection::Ascending;
        }
    }

    /// Stable sort. Text compares case-insensitively; albums without a year
    /// go last in either direction.
    pub fn apply(&self, albums: &mut [Album]) {
        albums.sort_by(|a, b| self.compare(a, b));
    }

    fn compare(&self, a: &Album, b: &Album) -> Ordering {
        let directed = |ord: Ordering| match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        };
        match self.field {
            SortField::Title => directed(cmp_text(&a.title, &b.title)),
            SortField::Artist => directed(cmp_text(&a.artist, &b.artist)),
            SortField::Year => match (a.release_year, b.release_year) {
                (Some(x), Some(y)) => directed(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }
}

impl fmt::Display for AlbumSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction.arrow())
    }
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

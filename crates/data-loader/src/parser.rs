//! Parser for the catalog and rating data files.
//!
//! - movies.dat: movieId::title::genres::year::popularity::runtime
//! - ratings.dat: userId::movieId::stars::tags::timestamp
//!
//! Optional numeric fields may be left empty. Genres are pipe-separated and tags
//! comma-separated; both are normalized on ingestion.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::str::{FromStr, Split};

const MOVIES_FILE: &str = "movies.dat";
const RATINGS_FILE: &str = "ratings.dat";

/// Read a file as lines, falling back to ISO-8859-1 when it is not valid UTF-8.
///
/// Exported catalogs from older tools are frequently Latin-1; every byte of that
/// encoding maps directly onto a Unicode code point.
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;

    let content = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    };

    Ok(content.lines().map(|s| s.to_string()).collect())
}

/// Cursor over the `::`-separated fields of one line
struct Fields<'a> {
    parts: Split<'a, &'static str>,
    file: &'static str,
    line: usize,
}

impl<'a> Fields<'a> {
    fn new(line_text: &'a str, file: &'static str, line: usize) -> Self {
        Self {
            parts: line_text.split("::"),
            file,
            line,
        }
    }

    fn error(&self, reason: String) -> DataLoadError {
        DataLoadError::ParseError {
            file: self.file.to_string(),
            line: self.line,
            reason,
        }
    }

    /// Next raw field, failing if the line ran out
    fn required(&mut self, name: &str) -> Result<&'a str> {
        match self.parts.next() {
            Some(field) => Ok(field.trim()),
            None => Err(self.error(format!("Missing {}", name))),
        }
    }

    /// Next field parsed as `T`
    fn parse<T>(&mut self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.required(name)?;
        raw.parse()
            .map_err(|e| self.error(format!("Invalid {}: {}", name, e)))
    }

    /// Next field parsed as `T`; an empty or absent field is `None`
    fn optional<T>(&mut self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.parts.next().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|e| self.error(format!("Invalid {}: {}", name, e))),
        }
    }
}

/// Parse the movies.dat file
pub fn parse_movies(path: &Path) -> Result<Vec<MovieRecord>> {
    let lines = read_lines(path)?;
    let mut movies = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }
        movies.push(parse_movie_line(line_trimmed, idx + 1)?);
    }
    Ok(movies)
}

fn parse_movie_line(line: &str, line_no: usize) -> Result<MovieRecord> {
    let mut fields = Fields::new(line, MOVIES_FILE, line_no);

    let id = fields.required("movieId")?;
    if id.is_empty() {
        return Err(fields.error("Empty movieId".to_string()));
    }
    let title = fields.required("title")?;
    let genres = fields.required("genres")?;
    let year = fields
        .optional::<i32>("year")?
        .or_else(|| extract_year_from_title(title));
    let popularity = fields.optional::<f64>("popularity")?;
    let runtime = fields.optional::<u32>("runtime")?;

    if let Some(p) = popularity {
        if !p.is_finite() || p < 0.0 {
            return Err(DataLoadError::InvalidValue {
                field: "popularity".to_string(),
                value: p.to_string(),
            });
        }
    }

    Ok(MovieRecord {
        year,
        popularity,
        runtime,
        ..MovieRecord::new(id, title, genres.split('|'))
    })
}

/// Parse the ratings.dat file into (user, rating) pairs in file order
pub fn parse_ratings(path: &Path) -> Result<Vec<(UserId, RatingRecord)>> {
    let lines = read_lines(path)?;
    let mut ratings = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }
        ratings.push(parse_rating_line(line_trimmed, idx + 1)?);
    }
    Ok(ratings)
}

fn parse_rating_line(line: &str, line_no: usize) -> Result<(UserId, RatingRecord)> {
    let mut fields = Fields::new(line, RATINGS_FILE, line_no);

    let user_id: UserId = fields.parse("userId")?;
    let movie_id = fields.required("movieId")?;
    let stars: f64 = fields.parse("stars")?;
    let tags = fields.required("tags")?;
    let timestamp: i64 = fields.parse("timestamp")?;

    let rating = RatingRecord::new(movie_id, stars, timestamp).with_tags(tags.split(','));
    if !rating.has_valid_stars() {
        return Err(DataLoadError::InvalidValue {
            field: "stars".to_string(),
            value: stars.to_string(),
        });
    }
    Ok((user_id, rating))
}

/// Extract year from movie title
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
fn extract_year_from_title(title: &str) -> Option<i32> {
    let start = title.rfind('(')?;
    let end = title.rfind(')')?;
    if start < end {
        let year_str = &title[start + 1..end];
        if year_str.len() == 4 {
            return year_str.parse().ok();
        }
    }
    None
}

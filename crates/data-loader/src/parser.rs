//! Parser for catalog snapshot files.
//!
//! Every file is UTF-8, one record per line, fields separated by `::`.
//! Blank lines are skipped.
//!
//! - actors.dat / directors.dat: id::first_name::last_name
//! - movies.dat: id::title::GENRE::release_date::duration_minutes::poster
//! - tv_shows.dat: id::title::GENRE::start_date::end_date::poster (end may be empty)
//! - seasons.dat: id::show_id::number::title::air_date
//! - episodes.dat: id::season_id::episode_number::title::air_date::duration_minutes::description
//! - movie_ratings.dat / episode_ratings.dat: id::content_id::rating
//! - movie_actors.dat, movie_directors.dat, episode_actors.dat,
//!   episode_directors.dat: content_id::person_id
//!
//! Rating values are parsed as plain integers and are NOT range-checked
//! here; range problems are reported by readers, not by the loader.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::str::{FromStr, Split};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Read a file into trimmed, non-empty lines paired with 1-based line numbers
fn read_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;

    Ok(content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim().to_string()))
        .filter(|(_, line)| !line.is_empty())
        .collect())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Cursor over the `::`-separated fields of one line.
///
/// Every accessor names the field it expects so a short or malformed line
/// produces a ParseError pointing at the exact field.
struct Fields<'a> {
    parts: Split<'a, &'static str>,
    file: &'a str,
    line: usize,
}

impl<'a> Fields<'a> {
    fn new(raw: &'a str, file: &'a str, line: usize) -> Self {
        Self {
            parts: raw.split("::"),
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

    fn text(&mut self, name: &str) -> Result<&'a str> {
        match self.parts.next() {
            Some(value) => Ok(value),
            None => Err(self.error(format!("Missing {}", name))),
        }
    }

    fn parse<T>(&mut self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.text(name)?;
        raw.trim()
            .parse()
            .map_err(|e| self.error(format!("Invalid {}: {}", name, e)))
    }

    fn date(&mut self, name: &str) -> Result<NaiveDate> {
        let raw = self.text(name)?;
        parse_date(raw).map_err(|e| self.error(format!("Invalid {}: {}", name, e)))
    }

    fn optional_date(&mut self, name: &str) -> Result<Option<NaiveDate>> {
        let raw = self.text(name)?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        parse_date(raw)
            .map(Some)
            .map_err(|e| self.error(format!("Invalid {}: {}", name, e)))
    }

    fn genre(&mut self) -> Result<Genre> {
        let raw = self.text("genre")?;
        parse_genre(raw)
    }

    /// Whatever is left of the line, separators included
    fn rest(&mut self) -> String {
        self.parts.by_ref().collect::<Vec<_>>().join("::")
    }
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
}

/// Parse a genre storage code
///
/// Example: "SCI_FI" -> Ok(Genre::SciFi)
pub fn parse_genre(s: &str) -> Result<Genre> {
    let code = s.trim();
    Genre::ALL
        .iter()
        .copied()
        .find(|genre| genre.code() == code)
        .ok_or_else(|| DataLoadError::InvalidValue {
            field: "genre".to_string(),
            value: s.to_string(),
        })
}

/// Apply `parse_line` to every line of a file
fn parse_file<T>(
    path: &Path,
    mut parse_line: impl FnMut(&mut Fields<'_>) -> Result<T>,
) -> Result<Vec<T>> {
    let file = file_name(path);
    let lines = read_lines(path)?;
    let mut records = Vec::with_capacity(lines.len());

    for (line_no, line) in &lines {
        let mut fields = Fields::new(line, &file, *line_no);
        records.push(parse_line(&mut fields)?);
    }

    Ok(records)
}

/// Parse actors.dat
pub fn parse_actors(path: &Path) -> Result<Vec<Actor>> {
    parse_file(path, |f| {
        Ok(Actor {
            id: f.parse("actorId")?,
            person: Person::new(f.text("first_name")?, f.text("last_name")?),
        })
    })
}

/// Parse directors.dat
pub fn parse_directors(path: &Path) -> Result<Vec<Director>> {
    parse_file(path, |f| {
        Ok(Director {
            id: f.parse("directorId")?,
            person: Person::new(f.text("first_name")?, f.text("last_name")?),
        })
    })
}

/// Parse movies.dat
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    parse_file(path, |f| {
        Ok(Movie {
            id: f.parse("movieId")?,
            title: f.text("title")?.to_string(),
            genre: f.genre()?,
            release_date: f.date("release_date")?,
            duration_minutes: f.parse("duration")?,
            poster: f.text("poster")?.to_string(),
        })
    })
}

/// Parse tv_shows.dat
pub fn parse_shows(path: &Path) -> Result<Vec<TvShow>> {
    parse_file(path, |f| {
        Ok(TvShow {
            id: f.parse("showId")?,
            title: f.text("title")?.to_string(),
            genre: f.genre()?,
            start_date: f.date("start_date")?,
            end_date: f.optional_date("end_date")?,
            poster: f.text("poster")?.to_string(),
        })
    })
}

/// Parse seasons.dat
pub fn parse_seasons(path: &Path) -> Result<Vec<Season>> {
    parse_file(path, |f| {
        Ok(Season {
            id: f.parse("seasonId")?,
            show_id: f.parse("showId")?,
            number: f.parse("number")?,
            title: f.text("title")?.to_string(),
            air_date: f.date("air_date")?,
        })
    })
}

/// Parse episodes.dat
///
/// The description is the last field and may itself contain `::`.
pub fn parse_episodes(path: &Path) -> Result<Vec<Episode>> {
    parse_file(path, |f| {
        Ok(Episode {
            id: f.parse("episodeId")?,
            season_id: f.parse("seasonId")?,
            episode_number: f.parse("episode_number")?,
            title: f.text("title")?.to_string(),
            air_date: f.date("air_date")?,
            duration_minutes: f.parse("duration")?,
            description: f.rest(),
        })
    })
}

/// Parse movie_ratings.dat
pub fn parse_movie_ratings(path: &Path) -> Result<Vec<MovieRating>> {
    parse_file(path, |f| {
        Ok(MovieRating {
            id: f.parse("ratingId")?,
            movie_id: f.parse("movieId")?,
            rating: f.parse("rating")?,
        })
    })
}

/// Parse episode_ratings.dat
pub fn parse_episode_ratings(path: &Path) -> Result<Vec<EpisodeRating>> {
    parse_file(path, |f| {
        Ok(EpisodeRating {
            id: f.parse("ratingId")?,
            episode_id: f.parse("episodeId")?,
            rating: f.parse("rating")?,
        })
    })
}

/// Parse a two-column link file (content_id::person_id)
pub fn parse_links<A, B>(path: &Path) -> Result<Vec<(A, B)>>
where
    A: FromStr,
    A::Err: std::fmt::Display,
    B: FromStr,
    B::Err: std::fmt::Display,
{
    parse_file(path, |f| Ok((f.parse("contentId")?, f.parse("personId")?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_genre() {
        assert_eq!(parse_genre("SCI_FI").unwrap(), Genre::SciFi);
        assert_eq!(parse_genre("TALK").unwrap(), Genre::Talk);
        assert!(parse_genre("Sci-Fi").is_err());
    }

    #[test]
    fn test_parse_movies() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "movies.dat",
            "1::The Long Night::DRAMA::2001-05-04::121::posters/movies/1.jpg\n\n",
        );

        let movies = parse_movies(&path).unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].id, MovieId(1));
        assert_eq!(movies[0].genre, Genre::Drama);
        assert_eq!(
            movies[0].release_date,
            NaiveDate::from_ymd_opt(2001, 5, 4).unwrap()
        );
        assert_eq!(movies[0].duration_minutes, 121);
    }

    #[test]
    fn test_parse_show_without_end_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "tv_shows.dat",
            "7::Harbor Lights::SOAP::2010-01-01::::p.jpg\n",
        );

        let shows = parse_shows(&path).unwrap();
        assert_eq!(shows[0].end_date, None);
        assert_eq!(shows[0].genre, Genre::Soap);
    }

    #[test]
    fn test_episode_description_keeps_separators() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "episodes.dat",
            "3::2::1::Pilot::2010-01-08::44::Part one :: the arrival\n",
        );

        let episodes = parse_episodes(&path).unwrap();
        assert_eq!(episodes[0].description, "Part one :: the arrival");
        assert_eq!(episodes[0].season_id, SeasonId(2));
    }

    #[test]
    fn test_out_of_range_rating_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "movie_ratings.dat", "1::1::5\n2::1::9\n");

        let ratings = parse_movie_ratings(&path).unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[1].rating, 9);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "actors.dat", "1::Ada::Lovelace\nx::Bad::Id\n");

        match parse_actors(&path) {
            Err(DataLoadError::ParseError { file, line, .. }) => {
                assert_eq!(file, "actors.dat");
                assert_eq!(line, 2);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = parse_actors(&dir.path().join("actors.dat"));
        assert!(matches!(result, Err(DataLoadError::FileNotFound { .. })));
    }

    #[test]
    fn test_parse_links() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "movie_actors.dat", "1::10\n1::11\n");

        let links: Vec<(MovieId, ActorId)> = parse_links(&path).unwrap();
        assert_eq!(links, vec![(MovieId(1), ActorId(10)), (MovieId(1), ActorId(11))]);
    }
}

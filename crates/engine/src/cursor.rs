//! Explicit cursor over a repository's primary namespace
//!
//! A `RecordCursor` remembers the key it is positioned on, so repeated
//! `move_next`/`move_prev` calls walk the namespace in primary key order.
//! Each step is a single engine seek relative to that key.

use strata_core::{key_of, Entry, ReadTransaction, Record, Result, Seek};

use crate::repository::IndexedRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Position {
    /// Not yet moved: `move_next` starts at the first record, `move_prev` at the last
    Unpositioned,
    At(Vec<u8>),
    BeforeStart,
    AfterEnd,
}

/// Stateful cursor bound to one transaction
///
/// Also an [`Iterator`] over the remaining records in ascending key order.
/// A record that fails to decode is yielded as an `Err`, and iteration
/// continues with the next key.
pub struct RecordCursor<'tx, 'r, R: Record, T: ReadTransaction + ?Sized> {
    repo: &'r IndexedRepository<R>,
    tx: &'tx T,
    position: Position,
}

impl<'tx, 'r, R: Record, T: ReadTransaction + ?Sized> RecordCursor<'tx, 'r, R, T> {
    pub(crate) fn new(repo: &'r IndexedRepository<R>, tx: &'tx T) -> Self {
        Self {
            repo,
            tx,
            position: Position::Unpositioned,
        }
    }

    /// Move to the first record
    pub fn first(&mut self) -> Result<Option<R>> {
        self.step(Seek::First, Position::AfterEnd)
    }

    /// Move to the last record
    pub fn last(&mut self) -> Result<Option<R>> {
        self.step(Seek::Last, Position::BeforeStart)
    }

    /// Move to the following record
    ///
    /// Returns `None` once past the last record; stays past the end until
    /// moved backwards or repositioned.
    pub fn move_next(&mut self) -> Result<Option<R>> {
        match std::mem::replace(&mut self.position, Position::Unpositioned) {
            Position::Unpositioned | Position::BeforeStart => self.first(),
            Position::At(key) => self.step(Seek::After(&key), Position::AfterEnd),
            Position::AfterEnd => {
                self.position = Position::AfterEnd;
                Ok(None)
            }
        }
    }

    /// Move to the preceding record
    ///
    /// Returns `None` once before the first record.
    pub fn move_prev(&mut self) -> Result<Option<R>> {
        match std::mem::replace(&mut self.position, Position::Unpositioned) {
            Position::Unpositioned | Position::AfterEnd => self.last(),
            Position::At(key) => self.step(Seek::Before(&key), Position::BeforeStart),
            Position::BeforeStart => {
                self.position = Position::BeforeStart;
                Ok(None)
            }
        }
    }

    /// Move to the record with identifier `id`, or the next one after it
    pub fn seek(&mut self, id: R::Id) -> Result<Option<R>> {
        let key = key_of(id);
        self.step(Seek::AtOrAfter(&key), Position::AfterEnd)
    }

    /// Primary key of the current record, if positioned on one
    pub fn key(&self) -> Option<&[u8]> {
        match &self.position {
            Position::At(key) => Some(key),
            _ => None,
        }
    }

    fn step(&mut self, seek: Seek<'_>, exhausted: Position) -> Result<Option<R>> {
        let entry: Option<Entry> = match self.repo.seek_entry(self.tx, seek) {
            Ok(entry) => entry,
            Err(e) => {
                self.position = exhausted;
                return Err(e);
            }
        };
        match entry {
            Some((key, value)) => {
                self.position = Position::At(key);
                self.repo.decode(&value).map(Some)
            }
            None => {
                self.position = exhausted;
                Ok(None)
            }
        }
    }
}

impl<R: Record, T: ReadTransaction + ?Sized> Iterator for RecordCursor<'_, '_, R, T> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        self.move_next().transpose()
    }
}

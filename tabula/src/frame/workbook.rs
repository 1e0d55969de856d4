//! Workbook: a name-unique collection of frames
//!
//! The workbook owns its frames by value and is the lookup surface for
//! cross-table symbol resolution (`dataframes['other']['column']`).

use super::address::WorkbookRef;
use super::Frame;
use crate::formula::Compiled;
use crate::value::Value;
use crate::{TabulaError, TabulaResult};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug)]
pub struct Workbook {
    entries: Vec<(String, Frame)>,
    index: HashMap<String, usize>,
}

impl Workbook {
    /// Build a workbook from named frames. Names must be unique;
    /// membership is fixed at construction.
    pub fn from_frames(frames: Vec<(String, Frame)>) -> TabulaResult<Workbook> {
        let mut index = HashMap::new();
        for (position, (name, _)) in frames.iter().enumerate() {
            if index.insert(name.clone(), position).is_some() {
                return Err(TabulaError::Configuration(format!(
                    "duplicate table name `{}`",
                    name
                )));
            }
        }
        debug!(tables = frames.len(), "workbook built");
        Ok(Workbook {
            entries: frames,
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Frame> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Frame)> {
        self.entries
            .iter()
            .map(|(name, frame)| (name.as_str(), frame))
    }

    /// Value snapshots of every table, in insertion order.
    pub fn values(&self) -> TabulaResult<Vec<(String, Vec<Vec<Value>>)>> {
        self.entries
            .iter()
            .map(|(name, frame)| Ok((name.clone(), frame.values_with(Some(self))?)))
            .collect()
    }

    /// Formula snapshots of every table, in insertion order.
    pub fn formula_rows(&self) -> TabulaResult<Vec<(String, Vec<Vec<Compiled>>)>> {
        self.entries
            .iter()
            .map(|(name, frame)| Ok((name.clone(), frame.formula_rows_with(Some(self))?)))
            .collect()
    }

    /// Addressing snapshot for cross-sheet reference resolution.
    pub(crate) fn reference(&self) -> WorkbookRef {
        WorkbookRef::new(
            self.entries
                .iter()
                .map(|(name, frame)| (name.clone(), frame.layout()))
                .collect(),
        )
    }
}

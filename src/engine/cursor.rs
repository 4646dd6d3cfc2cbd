//! Server-side scan cursors
//!
//! A cursor holds the snapshot taken when the scan was opened and hands it
//! out in pages. It is dropped as soon as its last page is served.

use std::collections::{HashMap, VecDeque};

use crate::protocol::{ScanPage, ScannerId};
use crate::row::Row;
use crate::status::Status;

struct Cursor {
    rows: VecDeque<Row>,
    batch_size: usize,
}

impl Cursor {
    fn next_page(&mut self) -> Vec<Row> {
        let n = self.batch_size.min(self.rows.len());
        self.rows.drain(..n).collect()
    }
}

#[derive(Default)]
pub(super) struct CursorRegistry {
    next_id: u64,
    open: HashMap<ScannerId, Cursor>,
}

impl CursorRegistry {
    /// Register a snapshot and serve its first page
    pub(super) fn open(&mut self, rows: Vec<Row>, batch_size: usize) -> ScanPage {
        let mut cursor = Cursor {
            rows: rows.into(),
            batch_size: batch_size.max(1),
        };
        let first = cursor.next_page();
        if cursor.rows.is_empty() {
            return ScanPage {
                scanner_id: None,
                rows: first,
                has_more: false,
            };
        }

        self.next_id += 1;
        let scanner_id = ScannerId(self.next_id);
        self.open.insert(scanner_id, cursor);
        ScanPage {
            scanner_id: Some(scanner_id),
            rows: first,
            has_more: true,
        }
    }

    pub(super) fn next(&mut self, scanner_id: ScannerId) -> Result<ScanPage, Status> {
        let cursor = self
            .open
            .get_mut(&scanner_id)
            .ok_or_else(|| Status::not_found(format!("{} not found", scanner_id)))?;
        let rows = cursor.next_page();
        if cursor.rows.is_empty() {
            self.open.remove(&scanner_id);
            return Ok(ScanPage {
                scanner_id: None,
                rows,
                has_more: false,
            });
        }
        Ok(ScanPage {
            scanner_id: Some(scanner_id),
            rows,
            has_more: true,
        })
    }

    pub(super) fn close(&mut self, scanner_id: ScannerId) -> Result<(), Status> {
        self.open
            .remove(&scanner_id)
            .map(|_| ())
            .ok_or_else(|| Status::not_found(format!("{} not found", scanner_id)))
    }

    /// Forget every cursor; returns how many were open
    pub(super) fn clear(&mut self) -> usize {
        let count = self.open.len();
        self.open.clear();
        count
    }

    pub(super) fn len(&self) -> usize {
        self.open.len()
    }
}
